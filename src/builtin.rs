use log::debug;
use std::path::PathBuf;
use std::{env, fmt, io};

use crate::global;
use crate::types::TokenSequence;

#[derive(Debug)]
pub enum BuiltinError {
	ChangeDirectory { path: String, source: io::Error },
}

impl fmt::Display for BuiltinError {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		match *self {
			BuiltinError::ChangeDirectory { ref path, .. } => write!(f, "Failed to change to {}", path),
		}
	}
}

impl std::error::Error for BuiltinError {
	fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
		match *self {
			BuiltinError::ChangeDirectory { ref source, .. } => Some(source),
		}
	}
}

/// Join every word after `cd` with single spaces and make that the working
/// directory. `cd my dir` therefore means the directory `my dir`.
pub fn change_directory(tokens: &TokenSequence) -> Result<PathBuf, BuiltinError> {
	let path = tokens.as_slice().get(1 ..).unwrap_or(&[]).join(" ");
	match env::set_current_dir(&path) {
		Ok(()) => Ok(PathBuf::from(path)),
		Err(e) => Err(BuiltinError::ChangeDirectory { path: path, source: e }),
	}
}

pub fn builtin_cd(_: &mut global::State, tokens: &TokenSequence) -> Result<(), BuiltinError> {
	let path = change_directory(tokens)?;
	debug!("cd {}", path.display());
	Ok(())
}

pub type Builtin = fn(&mut global::State, &TokenSequence) -> Result<(), BuiltinError>;

pub fn match_builtin(name: &str) -> Option<Builtin> {
	match name {
		"cd" => Some(builtin_cd),
		_ => None,
	}
}
