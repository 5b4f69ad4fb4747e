use std::ffi::{CString, NulError};
use std::fmt;
use std::path::Path;

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum RedirectType { Input, Output, Append }

impl RedirectType {
	pub fn from_operator(token: &str) -> Option<RedirectType> {
		match token {
			"<" => Some(RedirectType::Input),
			">" => Some(RedirectType::Output),
			">>" => Some(RedirectType::Append),
			_ => None,
		}
	}

	/// The standard descriptor this redirection replaces.
	pub fn std_fd(self) -> i32 {
		match self {
			RedirectType::Input => libc::STDIN_FILENO,
			RedirectType::Output | RedirectType::Append => libc::STDOUT_FILENO,
		}
	}
}

/// Whitespace-separated words of one input line, in order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TokenSequence {
	tokens: Vec<String>,
}

impl TokenSequence {
	pub fn new(tokens: Vec<String>) -> TokenSequence {
		TokenSequence { tokens: tokens }
	}

	pub fn len(&self) -> usize {
		self.tokens.len()
	}

	pub fn is_empty(&self) -> bool {
		self.tokens.is_empty()
	}

	pub fn get(&self, i: usize) -> Option<&str> {
		self.tokens.get(i).map(|s| s.as_str())
	}

	pub fn as_slice(&self) -> &[String] {
		&self.tokens
	}
}

/// Position of the line's pipe or background token, if any.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Marker {
	None,
	Pipe(usize),
	Background(usize),
}

impl Marker {
	/// Signed form: pipe index, negated background index, or 0.
	pub fn as_signed(self) -> isize {
		match self {
			Marker::None => 0,
			Marker::Pipe(i) => i as isize,
			Marker::Background(i) => -(i as isize),
		}
	}
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SplitResult {
	pub tokens: TokenSequence,
	pub marker: Marker,
}

/// Program name followed by its arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
	args: Vec<String>,
}

impl CommandSpec {
	/// `args` must hold at least the program name.
	pub fn new(args: Vec<String>) -> CommandSpec {
		debug_assert!(!args.is_empty());
		CommandSpec { args: args }
	}

	pub fn from_tokens(tokens: &[String]) -> CommandSpec {
		CommandSpec::new(tokens.to_vec())
	}

	pub fn program(&self) -> &str {
		&self.args[0]
	}

	pub fn args(&self) -> &[String] {
		&self.args
	}

	pub fn argv(&self) -> Result<Vec<CString>, NulError> {
		self.args.iter().map(|s| CString::new(s.as_bytes())).collect()
	}
}

impl fmt::Display for CommandSpec {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		write!(f, "{}", self.args.join(" "))
	}
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RedirectionSpec {
	pub command: CommandSpec,
	pub target: String,
	pub typ: RedirectType,
}

impl RedirectionSpec {
	pub fn target_path(&self) -> &Path {
		Path::new(&self.target)
	}
}

impl fmt::Display for RedirectionSpec {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		let op = match self.typ {
			RedirectType::Input => "<",
			RedirectType::Output => ">",
			RedirectType::Append => ">>",
		};
		write!(f, "{} {} {}", self.command, op, self.target)
	}
}

/// What one line asks the engine to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mode {
	Empty,
	ChangeDirectory(TokenSequence),
	Plain(CommandSpec),
	Redirect(RedirectionSpec),
	Pipeline { inner: CommandSpec, outer: CommandSpec },
	Background(CommandSpec),
}

impl Mode {
	pub fn name(&self) -> &'static str {
		match *self {
			Mode::Empty => "empty",
			Mode::ChangeDirectory(..) => "cd",
			Mode::Plain(..) => "plain",
			Mode::Redirect(RedirectionSpec { typ: RedirectType::Input, .. }) => "input-redirect",
			Mode::Redirect(RedirectionSpec { typ: RedirectType::Output, .. }) => "truncate-redirect",
			Mode::Redirect(RedirectionSpec { typ: RedirectType::Append, .. }) => "append-redirect",
			Mode::Pipeline { .. } => "pipeline",
			Mode::Background(..) => "background",
		}
	}
}
