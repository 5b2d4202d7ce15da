use assert_cmd::Command;
use predicates::prelude::*;
use std::time::Duration;

fn make_cmd() -> Command {
    let mut cmd = Command::cargo_bin("brainfuck").expect("brainfuck binary");
    cmd.timeout(Duration::from_secs(5))
        .env("BF_CONFIG", "/nonexistent/brainfuck.toml")
        .env_remove("BF_REPL_MODE")
        .env_remove("BF_REPL_ONCE")
        .env_remove("BF_MAX_STEPS")
        .env_remove("BF_TIMEOUT_MS")
        .env_remove("BF_TAPE_SIZE")
        .env_remove("BF_EOF");
    cmd
}

// 65 '+' then '.'
fn print_a() -> String {
    format!("{}.", "+".repeat(65))
}

#[test]
fn empty_input_exits_clean_and_quiet() {
    // Piped stdin selects bare mode, which prints no prompt or banner.
    make_cmd()
        .write_stdin("")
        .assert()
        .success()
        .stdout(predicate::str::is_empty())
        .stderr(predicate::str::is_empty());
}

#[test]
fn valid_program_outputs_then_newline() {
    make_cmd()
        .write_stdin(print_a())
        .assert()
        .success()
        .stdout("A\n")
        .stderr(predicate::str::is_empty());
}

#[test]
fn repl_subcommand_matches_default() {
    make_cmd()
        .arg("repl")
        .write_stdin("+++.")
        .assert()
        .success()
        .stdout(predicate::str::starts_with("\u{3}"));
}

#[test]
fn multiline_program_is_one_submission() {
    make_cmd()
        .write_stdin("+++\n>++\n<.\n")
        .assert()
        .success()
        .stdout("\u{3}\n");
}

#[test]
fn invalid_program_reports_error_and_exits_clean() {
    make_cmd()
        .write_stdin("]")
        .assert()
        .success()
        .stderr(predicate::str::contains("Parse error: unmatched bracket ']' at position 0"))
        .stdout("\n");
}

#[test]
fn once_hook_stops_after_first_execution() {
    make_cmd()
        .env("BF_REPL_ONCE", "1")
        .write_stdin("+++.\n:reset\n++.\n")
        .assert()
        .success()
        .stdout("\u{3}\n")
        .stderr(predicate::str::contains("session reset").not());
}

#[test]
fn meta_exit_exits_code_0_and_no_stdout() {
    make_cmd()
        .write_stdin(":exit\n+++.\n")
        .assert()
        .code(0)
        .stdout(predicate::str::is_empty());
}

#[test]
fn meta_help_prints_to_stderr_not_stdout() {
    make_cmd()
        .write_stdin(":help\n:quit\n")
        .assert()
        .success()
        .stdout(predicate::str::is_empty())
        .stderr(predicate::str::contains(":reset").and(predicate::str::contains(":tape")));
}

#[test]
fn unknown_meta_command_is_reported() {
    make_cmd()
        .write_stdin(":frobnicate\n")
        .assert()
        .success()
        .stderr(predicate::str::contains("unknown command ':frobnicate'"));
}

#[test]
fn state_persists_between_submissions() {
    // The second submission prints the cell the first one left at 3.
    make_cmd()
        .write_stdin("+++\n:tape\n.\n")
        .assert()
        .success()
        .stdout("\n\u{3}\n")
        .stderr(predicate::str::contains("ptr=0 cell=3"));
}

#[test]
fn reset_zeroes_the_session() {
    make_cmd()
        .write_stdin("+++>+\n:reset\n:tape\n")
        .assert()
        .success()
        .stderr(predicate::str::contains("session reset").and(predicate::str::contains("ptr=0 cell=0")));
}

#[test]
fn fresh_flag_resets_before_each_submission() {
    make_cmd()
        .args(["repl", "--fresh"])
        .write_stdin("+++\n:tape\n.\n")
        .assert()
        .success()
        .stdout("\n\u{0}\n");
}

#[test]
fn errors_do_not_end_the_loop() {
    make_cmd()
        .write_stdin("<\n:tape\n+.\n")
        .assert()
        .success()
        .stderr(predicate::str::contains("pointer out of bounds"))
        .stdout("\n\u{1}\n");
}

#[test]
fn step_limit_aborts_submission_on_stderr() {
    make_cmd()
        .env("BF_MAX_STEPS", "50")
        .write_stdin("+[]")
        .assert()
        .success()
        .stderr(predicate::str::contains("step limit exceeded (50)"))
        .stdout(predicate::str::contains("Execution aborted").not());
}

#[test]
fn timeout_aborts_submission_on_stderr() {
    make_cmd()
        .env("BF_TIMEOUT_MS", "100")
        .write_stdin("+[]")
        .assert()
        .success()
        .stderr(predicate::str::contains("Execution aborted").and(predicate::str::contains("timeout")))
        .stdout(predicate::str::contains("Execution aborted").not());
}

#[test]
fn forced_editor_on_non_tty_errors() {
    make_cmd()
        .args(["repl", "--editor"])
        .write_stdin("+++.")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("stdin is not a TTY"));
}

#[test]
fn env_editor_on_non_tty_errors() {
    make_cmd()
        .env("BF_REPL_MODE", "editor")
        .write_stdin("+++.")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("stdin is not a TTY"));
}

#[test]
fn bare_flag_overrides_env() {
    make_cmd()
        .env("BF_REPL_MODE", "editor")
        .args(["repl", "--bare"])
        .write_stdin("+++.")
        .assert()
        .success()
        .stdout(predicate::str::contains("\u{3}"));
}

#[test]
fn invalid_env_mode_is_rejected() {
    make_cmd()
        .env("BF_REPL_MODE", "vim")
        .write_stdin("+++.")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("invalid BF_REPL_MODE"));
}

#[test]
fn runs_are_independent_processes() {
    let program = print_a();
    let out1 = make_cmd().write_stdin(program.clone()).assert().success().get_output().stdout.clone();
    let out2 = make_cmd().write_stdin(program).assert().success().get_output().stdout.clone();
    assert_eq!(out1, b"A\n");
    assert_eq!(out1, out2);
}
