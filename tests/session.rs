//! Drives the built shell through its stdin, one scripted session per test.

use std::fs;
use std::io::Write;
use std::path::Path;
use std::process::{Command, Stdio};

struct Session {
	stdout: String,
	stderr: String,
}

fn run(dir: &Path, input: &str) -> Session {
	let mut child = Command::new(env!("CARGO_BIN_EXE_minish"))
		.current_dir(dir)
		.env("HOME", dir)
		.env("MINISH_LOG", "off")
		.env_remove("MINISH_CONFIG")
		.stdin(Stdio::piped())
		.stdout(Stdio::piped())
		.stderr(Stdio::piped())
		.spawn()
		.unwrap();
	child.stdin.take().unwrap().write_all(input.as_bytes()).unwrap();
	let out = child.wait_with_output().unwrap();
	assert!(out.status.success(), "shell exited with {:?}", out.status);
	Session {
		stdout: String::from_utf8_lossy(&out.stdout).into_owned(),
		stderr: String::from_utf8_lossy(&out.stderr).into_owned(),
	}
}

#[test]
fn banner_and_prompt() {
	let dir = tempfile::tempdir().unwrap();
	let s = run(dir.path(), "exit\n");
	assert!(s.stdout.starts_with("minish\n"), "{:?}", s.stdout);
	assert!(s.stdout.contains("\n:>"));
}

#[test]
fn end_of_input_ends_the_loop() {
	let dir = tempfile::tempdir().unwrap();
	let s = run(dir.path(), "echo still here\n");
	assert!(s.stdout.contains("still here\n"));
}

#[test]
fn pipeline_output_reaches_stdout() {
	let dir = tempfile::tempdir().unwrap();
	let s = run(dir.path(), "echo hello | cat\nexit\n");
	assert!(s.stdout.contains("hello\n"), "{:?}", s.stdout);
}

#[test]
fn truncate_then_cat() {
	let dir = tempfile::tempdir().unwrap();
	let s = run(dir.path(), "echo hello > out.txt\ncat out.txt\nexit\n");
	assert_eq!(fs::read_to_string(dir.path().join("out.txt")).unwrap(), "hello\n");
	assert!(s.stdout.contains("hello\n"));
}

#[test]
fn input_redirect() {
	let dir = tempfile::tempdir().unwrap();
	fs::write(dir.path().join("in.txt"), "from a file\n").unwrap();
	let s = run(dir.path(), "cat < in.txt\nexit\n");
	assert!(s.stdout.contains("from a file\n"));
}

#[test]
fn cd_failure_is_reported_and_cwd_kept() {
	let dir = tempfile::tempdir().unwrap();
	let s = run(dir.path(), "cd /minish/no/such/dir\npwd\nexit\n");
	assert!(s.stdout.contains("Failed to change to /minish/no/such/dir\n"));
	let here = dir.path().canonicalize().unwrap();
	assert!(s.stdout.contains(&format!("{}\n", here.display())), "{:?}", s.stdout);
}

#[test]
fn cd_rejoins_words() {
	let dir = tempfile::tempdir().unwrap();
	fs::create_dir(dir.path().join("my dir")).unwrap();
	let s = run(dir.path(), "cd my dir\npwd\nexit\n");
	assert!(s.stdout.contains("/my dir\n"), "{:?}", s.stdout);
}

#[test]
fn pipeline_reports_missing_command_on_stdout() {
	let dir = tempfile::tempdir().unwrap();
	let s = run(dir.path(), "minish-test-no-such-program | cat\nexit\n");
	assert!(s.stdout.contains("command not found\n"));
}

#[test]
fn plain_missing_command_is_silent() {
	let dir = tempfile::tempdir().unwrap();
	let s = run(dir.path(), "minish-test-no-such-program\nexit\n");
	assert!(!s.stdout.contains("command not found"));
	assert_eq!(s.stderr, "");
}

#[test]
fn capacity_error_is_reported_and_loop_continues() {
	let dir = tempfile::tempdir().unwrap();
	let s = run(dir.path(), "echo a b c d e f\necho after\nexit\n");
	assert!(s.stderr.contains("minish: too many words (limit 5)"), "{:?}", s.stderr);
	assert!(s.stdout.contains("after\n"));
}

#[test]
fn lines_after_exit_are_not_run() {
	let dir = tempfile::tempdir().unwrap();
	run(dir.path(), "exit\necho hi > later.txt\n");
	assert!(!dir.path().join("later.txt").exists());
}

#[test]
fn user_config_overlay_is_applied() {
	let dir = tempfile::tempdir().unwrap();
	let conf = dir.path().join(".config/minish");
	fs::create_dir_all(&conf).unwrap();
	fs::write(conf.join("config.toml"), "[shell]\nbanner = \"hi there\"\nexit_sentinel = \"quit\"\n").unwrap();
	let s = run(dir.path(), "quit\necho hi > later.txt\n");
	assert!(s.stdout.starts_with("hi there\n"));
	assert!(!dir.path().join("later.txt").exists());
}
