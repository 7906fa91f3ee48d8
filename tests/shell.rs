use std::fs;
use std::io::Write;
use std::process::{Command, Output, Stdio};

use pretty_assertions::assert_eq;
use tempfile::TempDir;

fn psh(script: &str, envs: &[(&str, &str)]) -> Output {
	let mut child = Command::new(env!("CARGO_BIN_EXE_psh"))
		.envs(envs.iter().cloned())
		.env_remove("RUST_LOG")
		.stdin(Stdio::piped())
		.stdout(Stdio::piped())
		.stderr(Stdio::piped())
		.spawn()
		.unwrap();
	child.stdin.take().unwrap().write_all(script.as_bytes()).unwrap();
	child.wait_with_output().unwrap()
}

fn stdout(o: &Output) -> String {
	String::from_utf8_lossy(&o.stdout).into_owned()
}

fn stderr(o: &Output) -> String {
	String::from_utf8_lossy(&o.stderr).into_owned()
}

#[test]
fn prompt_and_clean_exit_at_end_of_input() {
	let o = psh("", &[]);
	assert_eq!(stdout(&o), "psh> ");
	assert_eq!(o.status.code(), Some(0));

	let o = psh("", &[("PSH_PROMPT", "$ ")]);
	assert_eq!(stdout(&o), "$ ");
}

#[test]
fn pipeline_writes_to_the_shell_stdout() {
	let o = psh("echo hello world | tr a-z A-Z\n", &[]);
	assert!(stdout(&o).contains("HELLO WORLD\n"), "{}", stdout(&o));
	assert_eq!(o.status.code(), Some(0));
}

#[test]
fn input_redirection_reaches_the_shell_stdout() {
	let dir = TempDir::new().unwrap();
	let input = dir.path().join("in");
	fs::write(&input, "line one\nline two\n").unwrap();
	let o = psh(&format!("cat < {}\n", input.display()), &[]);
	assert_eq!(stdout(&o), "psh> line one\nline two\npsh> ");
}

#[test]
fn parse_errors_are_reported_and_the_loop_goes_on() {
	let o = psh("ls |\necho after\n", &[]);
	assert!(stderr(&o).contains("could not parse ls |"), "{}", stderr(&o));
	assert!(stdout(&o).contains("after\n"));
	assert_eq!(o.status.code(), Some(0));
}

#[test]
fn exit_stops_reading() {
	let o = psh("echo before\nexit\necho never\n", &[]);
	assert!(stdout(&o).contains("before\n"));
	assert!(!stdout(&o).contains("never"));
	assert_eq!(o.status.code(), Some(0));
}

#[test]
fn cd_failure_is_reported() {
	let o = psh("cd /psh-test/does/not/exist\necho still here\n", &[]);
	assert!(stderr(&o).contains("could not cd to /psh-test/does/not/exist"), "{}", stderr(&o));
	assert!(stdout(&o).contains("still here\n"));
}

#[test]
fn cd_changes_where_later_stages_run() {
	let dir = TempDir::new().unwrap();
	fs::write(dir.path().join("marker-file"), "").unwrap();
	let o = psh(&format!("cd {}\nls\n", dir.path().display()), &[]);
	assert!(stdout(&o).contains("marker-file\n"), "{}", stdout(&o));
}

#[test]
fn unknown_program_is_reported() {
	let o = psh("psh-test-no-such-program\n", &[]);
	assert!(stderr(&o).contains("could not execute psh-test-no-such-program"), "{}", stderr(&o));
	assert_eq!(o.status.code(), Some(0));
}

#[test]
fn depth_limit_comes_from_the_environment() {
	let o = psh("echo a | cat | cat\necho ok\n", &[("PSH_MAX_PIPELINE", "2")]);
	assert!(stderr(&o).contains("pipeline has 3 stages, the limit is 2"), "{}", stderr(&o));
	assert!(!stdout(&o).contains("a\n"));
	assert!(stdout(&o).contains("ok\n"));
}

#[test]
fn invalid_configuration_exits_2() {
	let o = psh("echo never\n", &[("PSH_MAX_PIPELINE", "0")]);
	assert_eq!(o.status.code(), Some(2));
	assert!(stderr(&o).contains("invalid maximum pipeline depth"));
	assert!(!stdout(&o).contains("never"));
}

#[test]
fn background_job_does_not_hold_the_prompt() {
	let dir = TempDir::new().unwrap();
	let out = dir.path().join("out");
	let o = psh(&format!("sleep 0.2 &\necho foreground > {}\n", out.display()), &[]);
	assert_eq!(o.status.code(), Some(0));
	assert_eq!(fs::read_to_string(&out).unwrap(), "foreground\n");
}
