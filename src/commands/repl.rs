use std::env;
use std::io::{self, IsTerminal, Write};
use std::sync::atomic::Ordering;

use brainfuck::config::Settings;
use brainfuck::repl::{repl_loop, select_mode, ModeFlagOverride, Repl, ReplMode, HELP};
use clap::Args;

use super::LimitArgs;

#[derive(Args, Debug, Default)]
#[command(disable_help_flag = true)]
pub struct ReplArgs {
    /// Force non-interactive bare mode
    #[arg(long = "bare", conflicts_with = "editor")]
    pub bare: bool,

    /// Force interactive mode (errors if stdin is not a TTY)
    #[arg(long = "editor", conflicts_with = "bare")]
    pub editor: bool,

    /// Start every submission with a zeroed tape
    #[arg(long = "fresh")]
    pub fresh: bool,

    #[command(flatten)]
    pub limits: LimitArgs,

    /// Show this help
    #[arg(short = 'h', long = "help", action = clap::ArgAction::SetTrue)]
    pub help: bool,
}

impl ReplArgs {
    fn mode_flag(&self) -> ModeFlagOverride {
        if self.bare {
            ModeFlagOverride::Bare
        } else if self.editor {
            ModeFlagOverride::Editor
        } else {
            ModeFlagOverride::None
        }
    }
}

// Public entry point for the REPL from main.rs
pub fn run(program: &str, args: ReplArgs) -> i32 {
    if args.help {
        usage_and_exit(program, 0);
    }

    // Determine mode: flags -> env -> auto-detect via is_terminal()
    let env_mode = env::var("BF_REPL_MODE").ok();
    let mode = match select_mode(args.mode_flag(), env_mode.as_deref(), io::stdin().is_terminal()) {
        Ok(m) => m,
        Err(msg) => {
            eprintln!("{program}: {msg}");
            let _ = io::stderr().flush();
            return 1;
        }
    };

    let mut settings = Settings::load();
    args.limits.apply(&mut settings);
    if args.fresh {
        settings.fresh_session = true;
    }

    let mut repl = Repl::new(&settings).with_styled_errors(io::stderr().is_terminal());
    let once = env::var("BF_REPL_ONCE").ok().as_deref() == Some("1");

    // Ctrl+C cancels a running program; at the prompt it flushes and exits 0.
    let running = repl.running_flag();
    let cancel = repl.cancel_flag();
    if let Err(e) = ctrlc::set_handler(move || {
        if running.load(Ordering::Relaxed) {
            cancel.store(true, Ordering::Relaxed);
            return;
        }
        let _ = io::stdout().flush();
        let _ = io::stderr().flush();
        std::process::exit(0);
    }) {
        eprintln!("{program}: failed to set ctrl+c handler: {e}");
        let _ = io::stderr().flush();
        return 1;
    }

    match mode {
        ReplMode::Editor => {
            // Print banners/prompts only if stderr is a TTY
            if io::stderr().is_terminal() {
                eprintln!("Brainfuck REPL (interactive editor mode)");
                eprintln!("Ctrl+d/Ctrl+z Enter (Windows) executes the current buffer. Type :help for commands, ctrl+c to exit");
                let _ = io::stderr().flush();
            }

            if let Err(e) = repl_loop(&mut repl, &settings.colors, once) {
                eprintln!("{program}: REPL error: {e}");
                let _ = io::stderr().flush();
                return 1;
            }
            0
        }
        ReplMode::Bare => {
            // stdout/stderr stay unlocked so the ctrl+c handler can flush them.
            let stdin = io::stdin().lock();
            let mut stdout = io::stdout();
            let mut stderr = io::stderr();
            match repl.run_bare(stdin, &mut stdout, &mut stderr, once) {
                Ok(()) => 0,
                Err(e) => {
                    let _ = writeln!(stderr, "{program}: REPL error: {e}");
                    let _ = stderr.flush();
                    1
                }
            }
        }
    }
}

fn usage_and_exit(program: &str, code: i32) -> ! {
    eprintln!(
        r#"Usage:
  {0} repl [OPTIONS]   # Start a Brainfuck REPL (read-eval-print loop)

Options:
  --help,   -h        Show this help
  --bare              Force non-interactive bare mode
  --editor            Force interactive editor mode (errors if stdin is not a TTY)
  --fresh             Start every submission with a zeroed tape
  --timeout <MS>      Abort a submission after MS milliseconds (0 = none)
  --max-steps <N>     Abort a submission after N instructions (0 = none)
  --tape-size <N>     Number of tape cells (default 30000)
  --eof <POLICY>      Cell value stored by `,` at end of input: zero (default), unchanged, max

Description:
  Starts a REPL where you can enter Brainfuck code and execute it live.
  The tape and data pointer carry over from one submission to the next.

{1}
Notes:
    - Non-Brainfuck characters are comments; a submission with no instructions is ignored.
    - Ctrl+D executes the current buffer on *nix/macOS.
    - Ctrl+Z and Enter will execute the current buffer on Windows.
    - Ctrl+C stops a running program, or exits the REPL at the prompt.
    - The REPL will print a newline after each execution for readability.
    - The REPL will exit after a single execution if the environment variable `BF_REPL_ONCE` is set to `1`.
    - Mode selection:
        * Flags: --bare|--editor override environment and auto-detection.
        * Env: BF_REPL_MODE=bare|editor overrides auto-detection.
        * Auto-detect: if stdin is a TTY, starts in interactive editor mode; otherwise, bare mode.
        * Bare mode reads stdin to EOF; lines starting with ":" are meta commands.
        * Prompts/banners suppressed if stderr is not a TTY.
"#,
        program, HELP
    );
    let _ = io::stderr().flush();
    std::process::exit(code);
}
