//! Descriptor remapping applied inside a forked child before exec.
//!
//! Each child gets a [`DescriptorPlan`]: an ordered list of `dup2`/`close`
//! steps. Keeping the plan as data lets the pipe discipline (a reader must
//! not hold the write end, a writer must not hold the read end) be checked
//! without forking.

use std::os::unix::io::RawFd;

use nix::fcntl::{self, FcntlArg, FdFlag, OFlag};
use nix::unistd;

use crate::types::RedirectType;

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Step {
	Close(RawFd),
	Dup2 { from: RawFd, to: RawFd },
	/// Clear `FD_CLOEXEC` so the descriptor survives exec.
	Inherit(RawFd),
}

#[derive(Debug, Default, PartialEq, Eq, Clone)]
pub struct DescriptorPlan {
	steps: Vec<Step>,
}

impl DescriptorPlan {
	pub fn new() -> DescriptorPlan {
		DescriptorPlan { steps: vec![] }
	}

	pub fn close(mut self, fd: RawFd) -> DescriptorPlan {
		self.steps.push(Step::Close(fd));
		self
	}

	pub fn dup2(mut self, from: RawFd, to: RawFd) -> DescriptorPlan {
		self.steps.push(Step::Dup2 { from: from, to: to });
		self
	}

	pub fn inherit(mut self, fd: RawFd) -> DescriptorPlan {
		self.steps.push(Step::Inherit(fd));
		self
	}

	/// Make `to` refer to what `fd` refers to, then drop `fd`.
	pub fn replace(self, fd: RawFd, to: RawFd) -> DescriptorPlan {
		// already in place, but possibly opened close-on-exec
		if fd == to {
			self.inherit(fd)
		} else {
			self.dup2(fd, to).close(fd)
		}
	}

	/// Left side of a pipe: stdout becomes the write end.
	pub fn pipe_writer(read: RawFd, write: RawFd) -> DescriptorPlan {
		DescriptorPlan::new().close(read).replace(write, libc::STDOUT_FILENO)
	}

	/// Right side of a pipe: stdin becomes the read end.
	pub fn pipe_reader(read: RawFd, write: RawFd) -> DescriptorPlan {
		DescriptorPlan::new().close(write).replace(read, libc::STDIN_FILENO)
	}

	/// A freshly opened file takes over stdin or stdout.
	pub fn file(opened: RawFd, typ: RedirectType) -> DescriptorPlan {
		DescriptorPlan::new().replace(opened, typ.std_fd())
	}

	pub fn steps(&self) -> &[Step] {
		&self.steps
	}

	/// Run the plan against `open` (slot -> description) without touching
	/// real descriptors. Returns which description each surviving slot holds.
	#[cfg(test)]
	pub(crate) fn simulate(&self, open: &[RawFd]) -> std::collections::BTreeMap<RawFd, RawFd> {
		let mut slots: std::collections::BTreeMap<RawFd, RawFd> = open.iter().map(|&fd| (fd, fd)).collect();
		for step in &self.steps {
			match *step {
				Step::Close(fd) => { slots.remove(&fd); },
				Step::Dup2 { from, to } => {
					if let Some(&desc) = slots.get(&from) {
						slots.insert(to, desc);
					}
				},
				Step::Inherit(_) => {},
			}
		}
		slots
	}

	pub fn apply(&self) -> nix::Result<()> {
		for step in &self.steps {
			match *step {
				Step::Close(fd) => unistd::close(fd)?,
				Step::Dup2 { from, to } => { unistd::dup2(from, to)?; },
				Step::Inherit(fd) => { fcntl::fcntl(fd, FcntlArg::F_SETFD(FdFlag::empty()))?; },
			}
		}
		Ok(())
	}
}

/// `open(2)` flags for a redirection target. Append deliberately has no
/// `O_CREAT`: appending needs an existing file.
pub fn open_flags(typ: RedirectType) -> OFlag {
	match typ {
		RedirectType::Input => OFlag::O_RDONLY,
		RedirectType::Output => OFlag::O_CREAT | OFlag::O_WRONLY | OFlag::O_TRUNC,
		RedirectType::Append => OFlag::O_WRONLY | OFlag::O_APPEND,
	}
}
