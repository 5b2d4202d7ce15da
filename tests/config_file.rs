use assert_cmd::Command;
use predicates::prelude::*;
use std::io::Write;
use std::time::Duration;

fn cargo_bin_with_config(content: &str) -> (Command, tempfile::NamedTempFile) {
    let mut tf = tempfile::NamedTempFile::new().expect("tempfile");
    write!(tf, "{}", content).unwrap();

    let mut cmd = Command::cargo_bin("brainfuck").unwrap();
    cmd.timeout(Duration::from_secs(5))
        .env("BF_CONFIG", tf.path())
        .env_remove("BF_REPL_MODE")
        .env_remove("BF_REPL_ONCE")
        .env_remove("BF_MAX_STEPS")
        .env_remove("BF_TIMEOUT_MS")
        .env_remove("BF_TAPE_SIZE")
        .env_remove("BF_EOF");
    (cmd, tf)
}

#[test]
fn step_limit_from_config_file() {
    let (mut cmd, _tf) = cargo_bin_with_config("[interpreter]\nmax_steps = 40\n");
    cmd.args(["run", "+[]"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("step limit exceeded (40)"));
}

#[test]
fn env_beats_config_file() {
    let (mut cmd, _tf) = cargo_bin_with_config("[interpreter]\nmax_steps = 40\n");
    cmd.env("BF_MAX_STEPS", "60")
        .args(["run", "+[]"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("step limit exceeded (60)"));
}

#[test]
fn tape_size_and_eof_from_config_file() {
    let (mut cmd, _tf) = cargo_bin_with_config(
        "# small tape\n[interpreter]\ntape_size = 3\neof = \"unchanged\"\n\n[colors]\nop_inc = \"#ff0000\"\n",
    );
    cmd.args(["run", "++,.>>>"])
        .write_stdin("")
        .assert()
        .code(1)
        .stdout(predicate::str::starts_with("\u{2}"))
        .stderr(predicate::str::contains("pointer out of bounds (ptr=2, op=>)"));
}

#[test]
fn fresh_session_from_config_file() {
    let (mut cmd, _tf) = cargo_bin_with_config("[interpreter]\nsession = \"fresh\"\n");
    cmd.write_stdin("+++\n:tape\n.\n")
        .assert()
        .success()
        .stdout("\n\u{0}\n");
}

#[test]
fn broken_values_fall_back_to_defaults() {
    let (mut cmd, _tf) = cargo_bin_with_config("[interpreter]\nmax_steps = lots\ntape_size = -1\n");
    cmd.args(["run", "+++."])
        .assert()
        .success()
        .stdout("\u{3}\n");
}
