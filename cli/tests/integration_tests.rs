use std::process::{Command, Output};

fn run_demo(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_flagtree-demo"))
        .args(args)
        .env_remove("RUST_LOG")
        .output()
        .expect("failed to run flagtree-demo")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

#[test]
fn no_arguments_runs_default_command() {
    let out = run_demo(&[]);
    assert!(out.status.success());
    assert_eq!(stdout(&out), format!("flagtree-demo {}\n", env!("CARGO_PKG_VERSION")));
}

#[test]
fn root_help_flag_alone_is_a_plain_switch() {
    let out = run_demo(&["--help"]);
    assert!(out.status.success(), "stderr: {}", stderr(&out));
    assert!(stdout(&out).is_empty());
}

#[test]
fn math_help_lists_subcommands() {
    let out = run_demo(&["math", "--help"]);
    assert!(out.status.success());
    let text = stdout(&out);
    assert!(text.starts_with("flagtree-demo math\n\nArithmetic on flag values\n"));
    assert!(text.contains("Commands:\n\n"));
    assert!(text.contains("  sum Add numbers together\n"));
    assert!(text.contains("  -verbose Show the whole sum\n"));
}

#[test]
fn sum_takes_prefixed_integers() {
    let out = run_demo(&["math", "sum", "-n", "0x10", "-n=0b11"]);
    assert!(out.status.success(), "stderr: {}", stderr(&out));
    assert_eq!(stdout(&out), "19\n");
}

#[test]
fn subcommand_without_arguments_shows_help() {
    let out = run_demo(&["greet"]);
    assert!(out.status.success());
    let text = stdout(&out);
    assert!(text.starts_with("flagtree-demo greet\n"));
    assert!(text.contains("  -help Get help on the 'flagtree-demo greet' command.\n"));
    assert!(text.contains("  -times How many greetings\n"));
    assert!(text.contains("  -upper Print in upper case\n"));
}

#[test]
fn greet_binds_struct_fields() {
    let out = run_demo(&["greet", "Hi", "--name=Ann", "--times", "2", "--upper"]);
    assert!(out.status.success(), "stderr: {}", stderr(&out));
    assert_eq!(stdout(&out), "HI, ANN!\nHI, ANN!\n");
}

#[test]
fn greet_uses_declared_default() {
    let out = run_demo(&["greet", "-name", "Bob", "-prefix=> "]);
    assert!(out.status.success(), "stderr: {}", stderr(&out));
    assert_eq!(stdout(&out), "> Hello, Bob!\n");
}

#[test]
fn validation_failures_exit_nonzero() {
    let out = run_demo(&["greet", "--name=R2D2", "--times=9"]);
    assert_eq!(out.status.code(), Some(1));
    let err = stderr(&out);
    assert!(err.contains("error: name: must be a plain word\n"), "stderr: {err}");
    assert!(err.contains("times: must be between 1 and 5\n"), "stderr: {err}");
    assert!(err.contains("See 'flagtree-demo greet --help' for usage"));
    assert!(stdout(&out).is_empty());
}

#[test]
fn repeated_flags_accumulate_with_inherited_switch() {
    let out = run_demo(&["math", "sum", "-n=1", "--verbose", "-n", "2", "--n=3"]);
    assert!(out.status.success(), "stderr: {}", stderr(&out));
    assert_eq!(stdout(&out), "1 + 2 + 3 = 6\n");
}

#[test]
fn missing_required_slice_uses_custom_message() {
    let out = run_demo(&["math", "sum", "--scale=2"]);
    assert_eq!(out.status.code(), Some(1));
    assert!(stderr(&out).contains("error: n: at least one -n is needed"));
}

#[test]
fn unknown_flag_is_reported() {
    let out = run_demo(&["check", "--bogus"]);
    assert_eq!(out.status.code(), Some(1));
    assert!(stderr(&out).contains("flag provided but not defined: -bogus"));
}

#[test]
fn check_accepts_valid_contact() {
    let out = run_demo(&["check", "--email=ann@example.com", "--site=https://example.com", "--level=warn"]);
    assert!(out.status.success(), "stderr: {}", stderr(&out));
    assert_eq!(stdout(&out), "ok: ann@example.com https://example.com warn\n");
}

#[test]
fn action_error_is_printed_verbatim() {
    let out = run_demo(&["fail"]);
    assert_eq!(out.status.code(), Some(1));
    assert_eq!(stderr(&out), "error: action failed on purpose\n");
}
