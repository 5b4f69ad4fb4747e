use log::{debug, error, info};
use std::io;
use io::BufRead;
use io::Write;

use minish::config::Config;
use minish::job::WaitStatusExt;
use minish::{eval_line, logging, Outcome, State};

fn main() {
	let config = Config::load();
	logging::init(&config.log);
	let mut state = State::new(config);

	let mut stdout = io::stdout();
	let stdin = io::stdin();
	let mut stdin_locked = stdin.lock();
	println!("{}", state.config.shell.banner);
	loop {
		for status in state.jobs.reap() {
			match (status.get_pid(), status.code()) {
				(Some(pid), Some(code)) => info!("background [{}] done, exit {}", pid, code),
				_ => debug!("background {:?}", status),
			}
		}
		let _ = stdout.write_all(state.config.shell.prompt.as_bytes());
		let _ = stdout.flush();

		let mut line: Vec<u8> = vec![];
		match stdin_locked.read_until(b'\n', &mut line) {
			Ok(0) => { break; },
			Ok(_) => {},
			Err(e) => {
				error!("read: {}", e);
				break;
			},
		}

		match eval_line(&mut state, &line) {
			Ok(Outcome::Exit) => { break; },
			Ok(Outcome::Continue) => {},
			Err(e) => {
				debug!("{:?}", e);
				let _ = stdout.flush();
				eprintln!("minish: {}", e);
			},
		}
	}
}
