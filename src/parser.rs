use std::fmt;

use crate::config::Limits;
use crate::types::*;

#[derive(Debug, PartialEq, Eq, Clone)]
pub enum ParseError {
	/// `len` is the raw line including its trailing newline, so at most
	/// `max - 1` bytes of command text fit when the line ends in `\n`.
	LineTooLong { len: usize, max: usize },
	TooManyTokens { max: usize },
}

impl fmt::Display for ParseError {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		match *self {
			ParseError::LineTooLong { len, max } => write!(f, "line too long ({} bytes, limit {})", len, max),
			ParseError::TooManyTokens { max } => write!(f, "too many words (limit {})", max),
		}
	}
}

impl std::error::Error for ParseError {}

type ParseResult<T> = Result<T, ParseError>;

struct Parser<'a> {
	line: &'a [u8],
	i: usize,
}

impl<'a> Parser<'a> {
	fn proceed_while<F>(&mut self, f: F) where F: Fn(u8) -> bool {
		while let Some(c) = self.line.get(self.i) {
			if !f(*c) { break; }
			self.i += 1;
		}
	}

	fn is_whitespace(c: u8) -> bool {
		matches!(c, b' ' | b'\t' | b'\r' | b'\n')
	}

	fn is_letter(c: u8) -> bool {
		!Parser::is_whitespace(c)
	}

	fn skip_whitespaces(&mut self) {
		self.proceed_while(Parser::is_whitespace);
	}

	fn read_word(&mut self) -> &'a [u8] {
		let orig = self.i;
		self.proceed_while(Parser::is_letter);
		&self.line[orig .. self.i]
	}

	fn parse_tokens(&mut self, max_tokens: usize) -> ParseResult<SplitResult> {
		let mut tokens: Vec<String> = vec![];
		let mut marker = Marker::None;

		loop {
			self.skip_whitespaces();
			let word = self.read_word();
			if word.is_empty() {
				break;
			}
			if tokens.len() == max_tokens {
				return Err(ParseError::TooManyTokens { max: max_tokens });
			}
			// index 0 has no signed encoding, so an operator there is just a word
			let i = tokens.len();
			if marker == Marker::None && i > 0 {
				match word {
					b"|" => { marker = Marker::Pipe(i); },
					b"&" => { marker = Marker::Background(i); },
					_ => {},
				}
			}
			tokens.push(String::from_utf8_lossy(word).into_owned());
		}

		Ok(SplitResult { tokens: TokenSequence::new(tokens), marker: marker })
	}
}

/// Cut `line` into tokens and locate its first pipe or background token.
pub fn split_line(line: &[u8], limits: &Limits) -> ParseResult<SplitResult> {
	if line.len() > limits.max_line_bytes {
		return Err(ParseError::LineTooLong { len: line.len(), max: limits.max_line_bytes });
	}
	let mut parser = Parser { line: line, i: 0 };
	parser.parse_tokens(limits.max_tokens)
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::config::Config;

	fn limits() -> Limits {
		Config::default_config().limits
	}

	fn words(split: &SplitResult) -> Vec<&str> {
		split.tokens.as_slice().iter().map(|s| s.as_str()).collect()
	}

	#[test]
	fn empty_and_blank_lines() {
		for line in [&b""[..], &b"\n"[..], &b"   \t \n"[..]] {
			let split = split_line(line, &limits()).unwrap();
			assert!(split.tokens.is_empty());
			assert_eq!(split.marker, Marker::None);
			assert_eq!(split.marker.as_signed(), 0);
		}
	}

	#[test]
	fn splits_on_runs_of_whitespace() {
		let split = split_line(b"  ls\t-l   /tmp \n", &limits()).unwrap();
		assert_eq!(words(&split), ["ls", "-l", "/tmp"]);
		assert_eq!(split.marker, Marker::None);
	}

	#[test]
	fn pipe_marker_is_positive_index() {
		let split = split_line(b"cat f.txt | grep x\n", &limits()).unwrap();
		assert_eq!(split.marker, Marker::Pipe(2));
		assert_eq!(split.marker.as_signed(), 2);
	}

	#[test]
	fn background_marker_is_negated_index() {
		let split = split_line(b"sleep 10 &\n", &limits()).unwrap();
		assert_eq!(split.marker, Marker::Background(2));
		assert_eq!(split.marker.as_signed(), -2);
	}

	#[test]
	fn first_operator_wins() {
		let split = split_line(b"a | b | c", &Limits { max_tokens: 8, ..limits() }).unwrap();
		assert_eq!(split.marker, Marker::Pipe(1));
		let split = split_line(b"a & b |", &limits()).unwrap();
		assert_eq!(split.marker, Marker::Background(1));
	}

	#[test]
	fn operator_at_start_is_not_a_marker() {
		let split = split_line(b"| cat", &limits()).unwrap();
		assert_eq!(split.marker, Marker::None);
		assert_eq!(words(&split), ["|", "cat"]);
	}

	#[test]
	fn operators_must_stand_alone() {
		let split = split_line(b"echo a|b", &limits()).unwrap();
		assert_eq!(split.marker, Marker::None);
		assert_eq!(words(&split), ["echo", "a|b"]);
	}

	#[test]
	fn redirection_tokens_are_plain_words() {
		let split = split_line(b"echo hi >> log.txt", &limits()).unwrap();
		assert_eq!(words(&split), ["echo", "hi", ">>", "log.txt"]);
		assert_eq!(split.marker, Marker::None);
	}

	#[test]
	fn too_many_tokens_is_an_error() {
		assert_eq!(split_line(b"a b c d e f", &limits()), Err(ParseError::TooManyTokens { max: 5 }));
		assert!(split_line(b"a b c d e", &limits()).is_ok());
	}

	#[test]
	fn long_line_is_an_error() {
		let line = vec![b'x'; 2049];
		assert_eq!(split_line(&line, &limits()), Err(ParseError::LineTooLong { len: 2049, max: 2048 }));
	}

	#[test]
	fn line_limit_counts_the_newline() {
		let mut line = vec![b'x'; 2048];
		line.push(b'\n');
		assert_eq!(split_line(&line, &limits()), Err(ParseError::LineTooLong { len: 2049, max: 2048 }));

		let mut line = vec![b'x'; 2047];
		line.push(b'\n');
		assert_eq!(split_line(&line, &limits()).unwrap().tokens.len(), 1);
	}

	#[test]
	fn invalid_utf8_is_replaced() {
		let split = split_line(b"echo \xff", &limits()).unwrap();
		assert_eq!(words(&split), ["echo", "\u{fffd}"]);
	}
}
