use std::fs;
use std::io::{self, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use brainfuck::cli_util::print_error;
use brainfuck::config::Settings;
use brainfuck::{Session, StepControl};
use clap::Args;

use super::LimitArgs;

#[derive(Args, Debug)]
#[command(disable_help_flag = true)]
pub struct RunArgs {
    /// Print a step-by-step table of operations instead of performing I/O
    #[arg(short = 'd', long = "debug")]
    pub debug: bool,

    /// Read Brainfuck code from PATH instead of positional "<code>"
    #[arg(short = 'f', long = "file")]
    pub file: Option<String>,

    /// Concatenated Brainfuck code parts
    #[arg(value_name = "code", trailing_var_arg = true, allow_hyphen_values = true)]
    pub code: Vec<String>,

    #[command(flatten)]
    pub limits: LimitArgs,

    /// Show this help
    #[arg(short = 'h', long = "help", action = clap::ArgAction::SetTrue)]
    pub help: bool,
}

pub fn run(program: &str, args: RunArgs) -> i32 {
    if args.help {
        usage_and_exit(program, 0);
    }

    let RunArgs { debug, file, code, limits, .. } = args;

    if file.is_none() && code.is_empty() {
        usage_and_exit(program, 2);
    }

    if file.is_some() && !code.is_empty() {
        eprintln!("{program}: cannot use positional code together with --file");
        usage_and_exit(program, 2);
    }

    let code_str = if let Some(path) = file {
        match fs::read_to_string(&path) {
            Ok(s) => s,
            Err(e) => {
                eprintln!("{program}: failed to read code file as UTF-8: {e}");
                let _ = io::stderr().flush();
                return 1;
            }
        }
    } else {
        code.join("")
    };

    // Resolve limits: flags -> env -> config file -> defaults
    let mut settings = Settings::load();
    limits.apply(&mut settings);

    // First Ctrl+C cancels the program cooperatively; a second one (e.g. while
    // blocked reading input) exits at once.
    let cancel = Arc::new(AtomicBool::new(false));
    let flag = cancel.clone();
    if let Err(e) = ctrlc::set_handler(move || {
        if flag.swap(true, Ordering::Relaxed) {
            let _ = io::stdout().flush();
            std::process::exit(1);
        }
    }) {
        eprintln!("{program}: failed to set ctrl+c handler: {e}");
        let _ = io::stderr().flush();
        return 1;
    }

    let mut control = StepControl::new(settings.max_steps, cancel);
    if let Some(ms) = settings.timeout_ms {
        control = control.with_timeout(Duration::from_millis(ms));
    }

    let mut session = Session::new(settings.tape_size).with_eof(settings.eof);
    // Unlocked handle: the ctrl+c handler must be able to flush it.
    let mut stdout = io::stdout();
    let result = if debug {
        session.run_debug(&code_str, &mut stdout, &control)
    } else {
        session.run(&code_str, &mut io::stdin().lock(), &mut stdout, &control)
    };

    let exit_code = match result {
        Ok(_) => 0,
        Err(err) => {
            print_error(Some(program), &code_str, &err, settings.timeout_ms);
            1
        }
    };

    // For readability, ensure output ends with a newline
    let _ = writeln!(stdout);
    let _ = stdout.flush();
    exit_code
}

fn usage_and_exit(program: &str, code: i32) -> ! {
    eprintln!(
        r#"Usage:
  {0} run [OPTIONS] "<code>"
  {0} run [OPTIONS] --file <PATH>

Options:
  --file,  -f <PATH>  Read Brainfuck code from PATH instead of positional "<code>"
  --debug, -d         Print a step-by-step table of operations instead of performing I/O
  --timeout <MS>      Abort after MS milliseconds of wall-clock time (0 = none)
  --max-steps <N>     Abort after N instructions (0 = none)
  --tape-size <N>     Number of tape cells (default 30000)
  --eof <POLICY>      Cell value stored by `,` at end of input: zero (default), unchanged, max
  --help,  -h         Show this help

Notes:
- Characters outside of Brainfuck's ><+-.,[] are comments.
- Input (`,`) reads a single byte from stdin.
- Moving the pointer off either end of the tape is an error.
- Limits fall back to BF_TIMEOUT_MS, BF_MAX_STEPS, BF_TAPE_SIZE and BF_EOF,
  then to the [interpreter] section of the config file.

Examples:
- Load Brainfuck code from a file:
    {0} run --file ./program.bf
- Read bytes from a file as stdin (`,` will consume file input):
    {0} run ",[.,]" < input.txt
"#,
        program
    );
    let _ = io::stderr().flush();
    std::process::exit(code);
}
