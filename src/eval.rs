use log::{debug, error};
use std::ffi::{CStr, CString};
use std::os::fd::{AsRawFd, BorrowedFd};
use std::os::unix::ffi::OsStrExt;
use std::os::unix::io::RawFd;
use std::{error, ffi, fmt, io};

use nix::fcntl::{self, OFlag};
use nix::sys::signal::{self, SigHandler, Signal};
use nix::sys::stat;
use nix::sys::wait::WaitStatus;
use nix::unistd::{self, ForkResult, Pid};

use crate::builtin::{self, BuiltinError};
use crate::classify::{self, ClassifyError};
use crate::global;
use crate::job::{BackgroundJobs, ChildSet, WaitStatusExt};
use crate::parser::{self, ParseError};
use crate::redirect::{self, DescriptorPlan};
use crate::types::*;

const EXEC_FAILED: i32 = 127;
const COMMAND_NOT_FOUND: &[u8] = b"command not found\n";

#[derive(Debug)]
pub enum ExecError {
	NixError(nix::Error),
	IoError(io::Error),
	NulError(ffi::NulError),
}
impl From<nix::Error> for ExecError {
	fn from(e: nix::Error) -> ExecError {
		ExecError::NixError(e)
	}
}
impl From<io::Error> for ExecError {
	fn from(e: io::Error) -> ExecError {
		ExecError::IoError(e)
	}
}
impl From<ffi::NulError> for ExecError {
	fn from(e: ffi::NulError) -> ExecError {
		ExecError::NulError(e)
	}
}
impl fmt::Display for ExecError {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		match *self {
			ExecError::NixError(ref e) => write!(f, "Nix error: {}", e),
			ExecError::IoError(ref e) => write!(f, "IO error: {}", e),
			ExecError::NulError(ref e) => write!(f, "Nul char error: {}", e),
		}
	}
}
impl error::Error for ExecError {
	fn source(&self) -> Option<&(dyn error::Error + 'static)> {
		match *self {
			ExecError::NixError(ref e) => Some(e),
			ExecError::IoError(ref e) => Some(e),
			ExecError::NulError(ref e) => Some(e),
		}
	}
}

/// Anything that can go wrong with one line.
#[derive(Debug)]
pub enum ShellError {
	Parse(ParseError),
	Classify(ClassifyError),
	Exec(ExecError),
	Builtin(BuiltinError),
}
impl From<ParseError> for ShellError {
	fn from(e: ParseError) -> ShellError {
		ShellError::Parse(e)
	}
}
impl From<ClassifyError> for ShellError {
	fn from(e: ClassifyError) -> ShellError {
		ShellError::Classify(e)
	}
}
impl From<ExecError> for ShellError {
	fn from(e: ExecError) -> ShellError {
		ShellError::Exec(e)
	}
}
impl From<BuiltinError> for ShellError {
	fn from(e: BuiltinError) -> ShellError {
		ShellError::Builtin(e)
	}
}
impl fmt::Display for ShellError {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		match *self {
			ShellError::Parse(ref e) => e.fmt(f),
			ShellError::Classify(ref e) => e.fmt(f),
			ShellError::Exec(ref e) => e.fmt(f),
			ShellError::Builtin(ref e) => e.fmt(f),
		}
	}
}
impl error::Error for ShellError {
	fn source(&self) -> Option<&(dyn error::Error + 'static)> {
		match *self {
			ShellError::Parse(ref e) => Some(e),
			ShellError::Classify(ref e) => Some(e),
			ShellError::Exec(ref e) => Some(e),
			ShellError::Builtin(ref e) => Some(e),
		}
	}
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Outcome { Continue, Exit }

// Child side: runs between fork and exec.

#[derive(Clone, Copy)]
enum OnExecFailure { Silent, Report }

fn child_write(fd: RawFd, msg: &[u8]) {
	let fd = unsafe { BorrowedFd::borrow_raw(fd) };
	let _ = unistd::write(fd, msg);
}

fn exit_child(status: i32) -> ! {
	unsafe { libc::_exit(status) }
}

// The Rust runtime ignores SIGPIPE, and an ignored signal survives exec.
fn restore_sigpipe() {
	let _ = unsafe { signal::signal(Signal::SIGPIPE, SigHandler::SigDfl) };
}

/// Replace the child's image with `argv`. Only returns into `_exit`.
fn exec_command(argv: &[CString], on_failure: OnExecFailure) -> ! {
	restore_sigpipe();
	let _ = unistd::execvp(&argv[0], argv);
	if let OnExecFailure::Report = on_failure {
		child_write(libc::STDOUT_FILENO, COMMAND_NOT_FOUND);
	}
	exit_child(EXEC_FAILED)
}

fn redirect_child(typ: RedirectType, target: &CStr, argv: &[CString]) -> ! {
	let std_fd = typ.std_fd();
	// kept out of the exec'd program by CLOEXEC
	let saved = fcntl::fcntl(std_fd, fcntl::FcntlArg::F_DUPFD_CLOEXEC(3)).ok();
	let mode = stat::Mode::from_bits_truncate(0o666);
	let fd = match fcntl::open(target, redirect::open_flags(typ), mode) {
		Ok(fd) => fd,
		Err(e) => {
			let msg = format!("minish: {}: {}\n", target.to_string_lossy(), e.desc());
			child_write(libc::STDERR_FILENO, msg.as_bytes());
			exit_child(1)
		},
	};
	if DescriptorPlan::file(fd, typ).apply().is_err() {
		exit_child(1);
	}
	restore_sigpipe();
	let _ = unistd::execvp(&argv[0], argv);
	if let Some(saved) = saved {
		let _ = unistd::dup2(saved, std_fd);
	}
	exit_child(EXEC_FAILED)
}

// Parent side.

fn log_status(what: &dyn fmt::Display, status: &WaitStatus) {
	match status.code() {
		Some(code) => debug!("{}: exit {}", what, code),
		None => debug!("{}: {:?}", what, status),
	}
}

fn single(statuses: Vec<WaitStatus>) -> WaitStatus {
	statuses.into_iter().next().unwrap_or(WaitStatus::StillAlive)
}

/// Run `spec` and block until it terminates.
pub fn execute_plain(spec: &CommandSpec) -> Result<WaitStatus, ExecError> {
	let argv = spec.argv()?;
	let mut children = ChildSet::new(1);
	if let ForkResult::Child = children.push_fork()? {
		exec_command(&argv, OnExecFailure::Silent);
	}
	let status = single(children.wait_all()?);
	log_status(spec, &status);
	Ok(status)
}

/// Run a command with stdin or stdout taken from a file, and wait for it.
/// An unopenable target is reported by the child, which then exits 1.
pub fn execute_redirected(spec: &RedirectionSpec) -> Result<WaitStatus, ExecError> {
	let argv = spec.command.argv()?;
	let target = CString::new(spec.target_path().as_os_str().as_bytes())?;
	let mut children = ChildSet::new(1);
	if let ForkResult::Child = children.push_fork()? {
		redirect_child(spec.typ, &target, &argv);
	}
	let status = single(children.wait_all()?);
	log_status(spec, &status);
	Ok(status)
}

/// Run `inner | outer` and wait for both sides.
pub fn execute_pipeline(inner: &CommandSpec, outer: &CommandSpec) -> Result<(WaitStatus, WaitStatus), ExecError> {
	let inner_argv = inner.argv()?;
	let outer_argv = outer.argv()?;

	let (pipe_read, pipe_write) = unistd::pipe2(OFlag::O_CLOEXEC)?;
	let (r, w) = (pipe_read.as_raw_fd(), pipe_write.as_raw_fd());

	let mut children = ChildSet::new(2);
	let stages = [
		(&inner_argv, DescriptorPlan::pipe_writer(r, w)),
		(&outer_argv, DescriptorPlan::pipe_reader(r, w)),
	];
	let mut fork_err = None;
	for (argv, plan) in stages.iter() {
		match children.push_fork() {
			Ok(ForkResult::Child) => {
				if plan.apply().is_err() {
					exit_child(1);
				}
				exec_command(argv, OnExecFailure::Report);
			},
			Ok(ForkResult::Parent { .. }) => {},
			Err(e) => {
				error!("fork: {}", e);
				fork_err = Some(e);
				break;
			},
		}
	}

	// the reader only sees end-of-stream once no one holds the write end
	drop(pipe_read);
	drop(pipe_write);

	let pids = children.pids().to_vec();
	let statuses = children.wait_all()?;
	if let Some(e) = fork_err {
		return Err(e.into());
	}
	for (status, pid) in statuses.iter().zip(pids) {
		log_status(&pid, status);
	}
	let mut it = statuses.into_iter();
	match (it.next(), it.next()) {
		(Some(a), Some(b)) => Ok((a, b)),
		_ => Err(ExecError::NixError(nix::Error::ECHILD)),
	}
}

/// Start `spec` without waiting for it; the pid goes to `jobs`.
pub fn execute_background(spec: &CommandSpec, jobs: &mut dyn BackgroundJobs) -> Result<Pid, ExecError> {
	let argv = spec.argv()?;
	let mut children = ChildSet::new(1);
	match children.push_fork()? {
		ForkResult::Child => exec_command(&argv, OnExecFailure::Silent),
		ForkResult::Parent { child } => {
			children.detach();
			jobs.launched(child, spec);
			Ok(child)
		},
	}
}

/// Tokenize, classify and run one raw input line.
pub fn eval_line(state: &mut global::State, line: &[u8]) -> Result<Outcome, ShellError> {
	let raw = line.strip_suffix(b"\n").unwrap_or(line);
	if raw == state.config.shell.exit_sentinel.as_bytes() {
		return Ok(Outcome::Exit);
	}

	let split = parser::split_line(line, &state.config.limits)?;
	let mode = classify::classify(split, &state.config.limits)?;
	debug!("mode {}: {:?}", mode.name(), mode);

	match mode {
		Mode::Empty => {},
		Mode::ChangeDirectory(tokens) => {
			let name = tokens.get(0).unwrap_or("cd");
			if let Some(func) = builtin::match_builtin(name) {
				if let Err(e) = func(state, &tokens) {
					println!("{}", e);
					debug!("cd: {:?}", e);
				}
			}
		},
		Mode::Plain(spec) => { execute_plain(&spec)?; },
		Mode::Redirect(spec) => { execute_redirected(&spec)?; },
		Mode::Pipeline { inner, outer } => { execute_pipeline(&inner, &outer)?; },
		Mode::Background(spec) => { execute_background(&spec, state.jobs.as_mut())?; },
	}
	Ok(Outcome::Continue)
}
