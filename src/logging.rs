use log::LevelFilter;
use simplelog::{ColorChoice, ConfigBuilder, TermLogger, TerminalMode, WriteLogger};
use std::env;
use std::fs::OpenOptions;

use crate::config::LogConfig;

/// Overrides `log.level` from the config file.
const LOG_ENV: &str = "MINISH_LOG";

pub fn parse_level(s: &str) -> Option<LevelFilter> {
	s.trim().parse().ok()
}

fn level_for(config: &LogConfig) -> LevelFilter {
	env::var(LOG_ENV).ok()
		.and_then(|s| parse_level(&s))
		.or_else(|| parse_level(&config.level))
		.unwrap_or(LevelFilter::Warn)
}

/// Install the process-wide logger: appended to `log.file` when one is
/// configured and can be opened, stderr otherwise. Best-effort; a second
/// call is a no-op.
pub fn init(config: &LogConfig) {
	let level = level_for(config);
	let log_config = ConfigBuilder::new()
		.set_thread_level(LevelFilter::Off)
		.set_target_level(LevelFilter::Off)
		.build();

	if let Some(ref path) = config.file {
		match OpenOptions::new().create(true).append(true).open(path) {
			Ok(file) => {
				let _ = WriteLogger::init(level, log_config, file);
				return;
			},
			Err(e) => eprintln!("minish: log file {}: {}", path.display(), e),
		}
	}
	let _ = TermLogger::init(level, log_config, TerminalMode::Stderr, ColorChoice::Auto);
}
