use log::{debug, info, warn};
use nix::errno::Errno;
use nix::sys::wait::{self, WaitPidFlag, WaitStatus};
use nix::unistd::{self, Pid};

use crate::types::CommandSpec;

pub trait WaitStatusExt {
	fn get_pid(self) -> Option<Pid>;
	/// Shell-style status: exit code, or 128 + signal number.
	fn code(self) -> Option<i32>;
}

impl WaitStatusExt for WaitStatus {
	fn get_pid(self) -> Option<Pid> {
		match self {
			WaitStatus::Exited(pid, ..) => Some(pid),
			WaitStatus::Signaled(pid, ..) => Some(pid),
			WaitStatus::Stopped(pid, ..) => Some(pid),
			#[cfg(any(target_os = "linux", target_os = "android"))]
			WaitStatus::PtraceEvent(pid, ..) => Some(pid),
			#[cfg(any(target_os = "linux", target_os = "android"))]
			WaitStatus::PtraceSyscall(pid) => Some(pid),
			WaitStatus::Continued(pid) => Some(pid),
			WaitStatus::StillAlive => None,
		}
	}

	fn code(self) -> Option<i32> {
		match self {
			WaitStatus::Exited(_, code) => Some(code),
			WaitStatus::Signaled(_, sig, _) => Some(128 + sig as i32),
			_ => None,
		}
	}
}

fn wait_for(pid: Pid) -> nix::Result<WaitStatus> {
	loop {
		match wait::waitpid(pid, None) {
			Err(Errno::EINTR) => continue,
			r => return r,
		}
	}
}

/// The children forked for one line, in fork order.
#[derive(Debug, Default)]
pub struct ChildSet {
	pids: Vec<Pid>,
}

impl ChildSet {
	pub fn new(size_hint: usize) -> ChildSet {
		ChildSet { pids: Vec::with_capacity(size_hint) }
	}

	pub fn push_fork(&mut self) -> nix::Result<unistd::ForkResult> {
		// The child only remaps descriptors, execs, or _exits.
		let r = unsafe { unistd::fork() }?;
		if let unistd::ForkResult::Parent { child } = r {
			self.pids.push(child);
		}
		Ok(r)
	}

	pub fn pids(&self) -> &[Pid] {
		&self.pids
	}

	/// Block until every child has terminated. Each pid is waited on by
	/// itself, so the order in which they finish does not matter and no
	/// unrelated child is reaped.
	pub fn wait_all(self) -> nix::Result<Vec<WaitStatus>> {
		let mut statuses = Vec::with_capacity(self.pids.len());
		let mut first_err = None;
		for pid in self.pids {
			match wait_for(pid) {
				Ok(status) => statuses.push(status),
				Err(e) => {
					warn!("waitpid {}: {}", pid, e);
					first_err.get_or_insert(e);
				},
			}
		}
		match first_err {
			Some(e) => Err(e),
			None => Ok(statuses),
		}
	}

	/// Give up the children without waiting; someone else reaps them.
	pub fn detach(self) {
		debug!("detached {:?}", self.pids);
	}
}

/// Where background launches are handed after fork.
pub trait BackgroundJobs {
	fn launched(&mut self, pid: Pid, command: &CommandSpec);
	/// Collect finished background children without blocking.
	fn reap(&mut self) -> Vec<WaitStatus>;
}

/// Fire and forget: no job table, finished children are only reaped.
#[derive(Debug, Default)]
pub struct Untracked {
	launched: usize,
}

impl BackgroundJobs for Untracked {
	fn launched(&mut self, pid: Pid, command: &CommandSpec) {
		self.launched += 1;
		info!("background [{}] {}", pid, command);
	}

	fn reap(&mut self) -> Vec<WaitStatus> {
		let mut reaped = vec![];
		if self.launched == 0 {
			return reaped;
		}
		loop {
			match wait::waitpid(Pid::from_raw(-1), Some(WaitPidFlag::WNOHANG)) {
				Ok(WaitStatus::StillAlive) => break,
				Ok(status) => reaped.push(status),
				Err(Errno::EINTR) => continue,
				// ECHILD: nothing left to reap
				Err(_) => break,
			}
		}
		reaped
	}
}
