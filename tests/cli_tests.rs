use std::path::PathBuf;
use std::process::{Command, Output};

fn fixture_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("fixtures")
        .join(name)
}

fn run_cli(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_ember-lox"))
        .args(args)
        .output()
        .expect("run ember-lox")
}

/// Write a scratch .lox file and run it, returning the process output.
fn run_source(name: &str, source: &str) -> Output {
    let path = std::env::temp_dir().join(format!("ember-lox-test-{name}.lox"));
    std::fs::write(&path, source).expect("write scratch source");
    let output = run_cli(&[path.to_str().expect("utf-8 path")]);
    let _ = std::fs::remove_file(&path);
    output
}

fn stdout_of(output: &Output) -> String {
    String::from_utf8(output.stdout.clone()).expect("stdout is valid UTF-8")
}

fn stderr_of(output: &Output) -> String {
    String::from_utf8(output.stderr.clone()).expect("stderr is valid UTF-8")
}

#[test]
fn run_fixture_file_prints_expected_output() {
    let output = run_cli(&[fixture_path("arithmetic.lox").to_str().expect("path")]);
    assert_eq!(output.status.code(), Some(0));
    assert_eq!(
        stdout_of(&output),
        include_str!("../fixtures/arithmetic.expected")
    );
}

#[test]
fn runtime_error_exits_70() {
    let output = run_source("negate-string", "print -\"a\";");
    assert_eq!(output.status.code(), Some(70));
    let stderr = stderr_of(&output);
    assert!(stderr.contains("Operand must be a number."), "{stderr}");
    assert!(stderr.contains("[line 1] in script"), "{stderr}");
    assert_eq!(stdout_of(&output), "");
}

#[test]
fn nil_arithmetic_exits_70() {
    let output = run_source("nil-add", "var a; a = a + 1;");
    assert_eq!(output.status.code(), Some(70));
    assert!(stderr_of(&output).contains("Operands must be two numbers or two strings."));
}

#[test]
fn compile_error_exits_65() {
    let output = run_source("own-init", "{ var a = a; }");
    assert_eq!(output.status.code(), Some(65));
    assert!(
        stderr_of(&output).contains("Cannot read local variable in its own initializer.")
    );
}

#[test]
fn output_before_runtime_error_is_flushed() {
    let output = run_source("partial", "print \"before\";\nprint -\"a\";");
    assert_eq!(output.status.code(), Some(70));
    assert_eq!(stdout_of(&output), "before\n");
    assert!(stderr_of(&output).contains("[line 2] in script"));
}

#[test]
fn missing_file_exits_74() {
    let output = run_cli(&["does-not-exist.lox"]);
    assert_eq!(output.status.code(), Some(74));
    assert!(!stderr_of(&output).is_empty());
}

#[test]
fn extra_arguments_exit_64() {
    let output = run_cli(&["one.lox", "two.lox"]);
    assert_eq!(output.status.code(), Some(64));
    assert!(!stderr_of(&output).is_empty());
}

#[test]
fn unknown_flag_exits_64() {
    let output = run_cli(&["--no-such-flag"]);
    assert_eq!(output.status.code(), Some(64));
}

#[test]
fn help_exits_zero() {
    let output = run_cli(&["--help"]);
    assert_eq!(output.status.code(), Some(0));
    assert!(stdout_of(&output).contains("ember-lox"));
}

#[test]
fn dump_tokens_lists_the_stream() {
    let output = run_cli(&[
        "--dump-tokens",
        fixture_path("hello.lox").to_str().expect("path"),
    ]);
    assert_eq!(output.status.code(), Some(0));
    let stdout = stdout_of(&output);
    assert!(stdout.contains("Print"), "{stdout}");
    assert!(stdout.contains("String"), "{stdout}");
    assert!(stdout.contains("Eof"), "{stdout}");
}

#[test]
fn dump_tokens_with_lex_error_exits_65() {
    let path = std::env::temp_dir().join("ember-lox-test-dump-err.lox");
    std::fs::write(&path, "var x = @;").expect("write scratch source");
    let output = run_cli(&["--dump-tokens", path.to_str().expect("utf-8 path")]);
    let _ = std::fs::remove_file(&path);
    assert_eq!(output.status.code(), Some(65));
    // The bad token still appears in the dumped stream.
    assert!(stdout_of(&output).contains("Unexpected character."));
}

#[test]
fn disassemble_prints_the_chunk() {
    let output = run_cli(&[
        "--disassemble",
        fixture_path("hello.lox").to_str().expect("path"),
    ]);
    assert_eq!(output.status.code(), Some(0));
    let stdout = stdout_of(&output);
    assert!(stdout.contains("Constant"), "{stdout}");
    assert!(stdout.contains("Add"), "{stdout}");
    assert!(stdout.contains("Print"), "{stdout}");
    assert!(stdout.contains("Return"), "{stdout}");
}

#[test]
fn trace_writes_instructions_to_stderr() {
    let path = std::env::temp_dir().join("ember-lox-test-trace.lox");
    std::fs::write(&path, "print 1 + 2;").expect("write scratch source");
    let output = run_cli(&["--trace", path.to_str().expect("utf-8 path")]);
    let _ = std::fs::remove_file(&path);
    assert_eq!(output.status.code(), Some(0));
    assert_eq!(stdout_of(&output), "3\n");
    let stderr = stderr_of(&output);
    assert!(stderr.contains("Add"), "{stderr}");
    assert!(stderr.contains("[ 1 ]"), "{stderr}");
}
