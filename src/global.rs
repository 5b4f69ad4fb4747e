use crate::config::Config;
use crate::job::{BackgroundJobs, Untracked};

pub struct State {
	pub config: Config,
	pub jobs: Box<dyn BackgroundJobs>,
}

impl State {
	pub fn new(config: Config) -> State {
		State::with_jobs(config, Box::new(Untracked::default()))
	}

	pub fn with_jobs(config: Config, jobs: Box<dyn BackgroundJobs>) -> State {
		State { config: config, jobs: jobs }
	}
}
