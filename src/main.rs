use std::env;
use std::io::{self, Write};
use std::path::Path;

use clap::{Parser, Subcommand};

mod commands;

use commands::repl::ReplArgs;
use commands::run::RunArgs;

fn print_top_usage_and_exit(program: &str, code: i32) -> ! {
    eprintln!(
        r#"Usage:
  {0} run  [OPTIONS] "<code>"       # Run Brainfuck code (args are concatenated)
  {0} run  [OPTIONS] --file <PATH>  # Run Brainfuck code loaded from file
  {0} repl [OPTIONS]                # Start a Brainfuck REPL (read-eval-print loop)
  {0}                               # Same as `{0} repl`

Run "{0} <subcommand> --help" for more info.
"#,
        program
    );
    let _ = io::stderr().flush();
    std::process::exit(code);
}

#[derive(Parser, Debug)]
#[command(name = "brainfuck", disable_help_flag = true, disable_help_subcommand = true)]
struct Cli {
    /// Show this help
    #[arg(short = 'h', long = "help", action = clap::ArgAction::SetTrue)]
    help: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    Run(RunArgs),
    Repl(ReplArgs),
}

fn main() {
    // Program name for diagnostics, without the directory part
    let program = env::args()
        .next()
        .as_deref()
        .and_then(|arg0| Path::new(arg0).file_stem())
        .and_then(|stem| stem.to_str())
        .map(String::from)
        .unwrap_or_else(|| String::from("brainfuck"));

    let cli = Cli::parse();

    if cli.help {
        print_top_usage_and_exit(&program, 0);
    }

    let code = match cli.command {
        Some(Command::Run(args)) => commands::run::run(&program, args),
        Some(Command::Repl(args)) => commands::repl::run(&program, args),
        None => commands::repl::run(&program, ReplArgs::default()),
    };

    std::process::exit(code);
}
