//! Mode selection for one tokenized line.
//!
//! `cd` is recognised by name before anything else. Otherwise the marker
//! decides between pipeline and background, and failing both, a `>>`, `>`
//! or `<` in the second or third slot selects a redirection. Operators found
//! anywhere else stay ordinary arguments of a plain command.

use std::fmt;

use crate::config::Limits;
use crate::types::*;

#[derive(Debug, PartialEq, Eq, Clone)]
pub enum ClassifyError {
	StageTooLong { side: &'static str, len: usize, max: usize },
	BackgroundTooLong { len: usize, max: usize },
	EmptyStage { side: &'static str },
}

impl fmt::Display for ClassifyError {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		match *self {
			ClassifyError::StageTooLong { side, len, max } =>
				write!(f, "{} side of pipe has {} words (limit {})", side, len, max),
			ClassifyError::BackgroundTooLong { len, max } =>
				write!(f, "background command has {} words (limit {})", len, max),
			ClassifyError::EmptyStage { side } => write!(f, "missing command on {} side of pipe", side),
		}
	}
}

impl std::error::Error for ClassifyError {}

// Checked in this order; the first hit wins.
const REDIRECT_SLOTS: [(&str, usize); 6] = [
	(">>", 1), (">>", 2),
	(">", 1), (">", 2),
	("<", 2), ("<", 1),
];

fn stage(tokens: &[String], side: &'static str, max: usize) -> Result<CommandSpec, ClassifyError> {
	if tokens.is_empty() {
		return Err(ClassifyError::EmptyStage { side: side });
	}
	if tokens.len() > max {
		return Err(ClassifyError::StageTooLong { side: side, len: tokens.len(), max: max });
	}
	Ok(CommandSpec::from_tokens(tokens))
}

fn find_redirect(tokens: &TokenSequence) -> Option<RedirectionSpec> {
	let words = tokens.as_slice();
	for &(op, at) in REDIRECT_SLOTS.iter() {
		if tokens.get(at) != Some(op) {
			continue;
		}
		// without a target the operator is left for the program to see
		let target = match tokens.get(at + 1) {
			Some(t) => t,
			None => { continue; },
		};
		let typ = RedirectType::from_operator(op)?;
		return Some(RedirectionSpec {
			command: CommandSpec::from_tokens(&words[.. at]),
			target: target.to_owned(),
			typ: typ,
		});
	}
	None
}

pub fn classify(split: SplitResult, limits: &Limits) -> Result<Mode, ClassifyError> {
	let SplitResult { tokens, marker } = split;

	if tokens.is_empty() {
		return Ok(Mode::Empty);
	}
	if tokens.get(0) == Some("cd") {
		return Ok(Mode::ChangeDirectory(tokens));
	}

	let words = tokens.as_slice();

	match marker {
		Marker::Pipe(k) => {
			let inner = stage(&words[.. k], "left", limits.max_stage_tokens)?;
			let outer = stage(&words[k + 1 ..], "right", limits.max_stage_tokens)?;
			Ok(Mode::Pipeline { inner: inner, outer: outer })
		},
		Marker::Background(k) => {
			if k > limits.max_background_tokens {
				return Err(ClassifyError::BackgroundTooLong { len: k, max: limits.max_background_tokens });
			}
			Ok(Mode::Background(CommandSpec::from_tokens(&words[.. k])))
		},
		Marker::None => match find_redirect(&tokens) {
			Some(spec) => Ok(Mode::Redirect(spec)),
			None => Ok(Mode::Plain(CommandSpec::from_tokens(words))),
		},
	}
}
