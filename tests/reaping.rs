//! Kept in its own binary: `reap` waits on any child, so it must not race
//! tests that fork and wait for their own.

use std::thread;
use std::time::Duration;

use nix::sys::wait::WaitStatus;

use minish::eval::execute_background;
use minish::job::{BackgroundJobs, Untracked};
use minish::types::CommandSpec;

#[test]
fn finished_background_child_is_reaped_once() {
	let mut jobs = Untracked::default();
	let command = CommandSpec::new(vec!["true".to_string()]);
	let pid = execute_background(&command, &mut jobs).unwrap();

	let mut reaped = vec![];
	for _ in 0 .. 50 {
		thread::sleep(Duration::from_millis(20));
		reaped = jobs.reap();
		if !reaped.is_empty() {
			break;
		}
	}
	assert_eq!(reaped, vec![WaitStatus::Exited(pid, 0)]);
	assert!(jobs.reap().is_empty());
}
