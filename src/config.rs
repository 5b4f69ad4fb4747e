use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::{env, fmt, fs, io};

/// Embedded default configuration.
const DEFAULT_CONFIG: &str = include_str!("../config.default.toml");

const CONFIG_ENV: &str = "MINISH_CONFIG";

// ── Final (merged) config types ──

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct Config {
	pub shell: ShellConfig,
	pub limits: Limits,
	pub log: LogConfig,
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct ShellConfig {
	pub banner: String,
	pub prompt: String,
	/// A line equal to this (newline stripped) ends the read loop.
	pub exit_sentinel: String,
}

/// Capacity bounds applied to every input line.
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
pub struct Limits {
	pub max_line_bytes: usize,
	pub max_tokens: usize,
	/// Tokens allowed on either side of a pipe.
	pub max_stage_tokens: usize,
	/// Tokens allowed before a trailing `&`.
	pub max_background_tokens: usize,
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct LogConfig {
	pub level: String,
	#[serde(default)]
	pub file: Option<PathBuf>,
}

// ── Overlay types: every field optional, scalars override ──

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigOverlay {
	#[serde(default)]
	shell: ShellOverlay,
	#[serde(default)]
	limits: LimitsOverlay,
	#[serde(default)]
	log: LogOverlay,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ShellOverlay {
	banner: Option<String>,
	prompt: Option<String>,
	exit_sentinel: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct LimitsOverlay {
	max_line_bytes: Option<usize>,
	max_tokens: Option<usize>,
	max_stage_tokens: Option<usize>,
	max_background_tokens: Option<usize>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct LogOverlay {
	level: Option<String>,
	file: Option<PathBuf>,
}

#[derive(Debug)]
pub enum ConfigError {
	Io(PathBuf, io::Error),
	Parse(PathBuf, toml::de::Error),
}

impl fmt::Display for ConfigError {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		match *self {
			ConfigError::Io(ref path, ref e) => write!(f, "{}: {}", path.display(), e),
			ConfigError::Parse(ref path, ref e) => write!(f, "{}: {}", path.display(), e),
		}
	}
}

impl std::error::Error for ConfigError {
	fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
		match *self {
			ConfigError::Io(_, ref e) => Some(e),
			ConfigError::Parse(_, ref e) => Some(e),
		}
	}
}

impl Default for Config {
	fn default() -> Config {
		Config::default_config()
	}
}

impl Config {
	/// Load the embedded default configuration.
	pub fn default_config() -> Config {
		toml::from_str(DEFAULT_CONFIG).expect("embedded default config must parse")
	}

	/// Defaults, then the first overlay found among `$MINISH_CONFIG` and
	/// `~/.config/minish/config.toml`. A broken overlay is reported and skipped.
	pub fn load() -> Config {
		let mut config = Config::default_config();
		if let Some(path) = Config::overlay_path() {
			match Config::read_overlay(&path) {
				Ok(overlay) => config.apply_overlay(overlay),
				Err(e) => eprintln!("minish: config: {}", e),
			}
		}
		config
	}

	/// Defaults merged with the overlay text in `content`.
	pub fn from_overlay_str(content: &str) -> Result<Config, toml::de::Error> {
		let overlay: ConfigOverlay = toml::from_str(content)?;
		let mut config = Config::default_config();
		config.apply_overlay(overlay);
		Ok(config)
	}

	fn overlay_path() -> Option<PathBuf> {
		if let Some(path) = env::var_os(CONFIG_ENV) {
			return Some(PathBuf::from(path));
		}
		let home = env::var_os("HOME")?;
		let path = Path::new(&home).join(".config/minish/config.toml");
		if path.is_file() { Some(path) } else { None }
	}

	fn read_overlay(path: &Path) -> Result<ConfigOverlay, ConfigError> {
		let content = fs::read_to_string(path).map_err(|e| ConfigError::Io(path.to_owned(), e))?;
		toml::from_str(&content).map_err(|e| ConfigError::Parse(path.to_owned(), e))
	}

	fn apply_overlay(&mut self, overlay: ConfigOverlay) {
		let s = overlay.shell;
		if let Some(v) = s.banner { self.shell.banner = v; }
		if let Some(v) = s.prompt { self.shell.prompt = v; }
		if let Some(v) = s.exit_sentinel { self.shell.exit_sentinel = v; }

		let l = overlay.limits;
		if let Some(v) = l.max_line_bytes { self.limits.max_line_bytes = v; }
		if let Some(v) = l.max_tokens { self.limits.max_tokens = v; }
		if let Some(v) = l.max_stage_tokens { self.limits.max_stage_tokens = v; }
		if let Some(v) = l.max_background_tokens { self.limits.max_background_tokens = v; }

		let g = overlay.log;
		if let Some(v) = g.level { self.log.level = v; }
		if g.file.is_some() { self.log.file = g.file; }
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn embedded_defaults_parse() {
		let config = Config::default_config();
		assert_eq!(config.shell.prompt, "\n:>");
		assert_eq!(config.shell.exit_sentinel, "exit");
		assert_eq!(config.limits, Limits {
			max_line_bytes: 2048,
			max_tokens: 5,
			max_stage_tokens: 3,
			max_background_tokens: 4,
		});
		assert_eq!(config.log.level, "warn");
		assert_eq!(config.log.file, None);
	}

	#[test]
	fn overlay_overrides_only_given_scalars() {
		let config = Config::from_overlay_str("[limits]\nmax_tokens = 16\n\n[log]\nlevel = \"debug\"\n").unwrap();
		assert_eq!(config.limits.max_tokens, 16);
		assert_eq!(config.limits.max_line_bytes, 2048);
		assert_eq!(config.log.level, "debug");
		assert_eq!(config.shell.banner, "minish");
	}

	#[test]
	fn empty_overlay_is_defaults() {
		assert_eq!(Config::from_overlay_str("").unwrap(), Config::default_config());
	}

	#[test]
	fn unknown_key_is_rejected() {
		assert!(Config::from_overlay_str("[limits]\nmax_pipes = 2\n").is_err());
	}
}
