mod builtin;
mod error;
mod eval;
mod fd;
mod global;
mod job;
mod launcher;
mod line;
mod parser;
mod types;


use std::process;

use log::{debug, warn};
use nix::sys::signal::{signal, SigHandler, Signal};

use builtin::Flow;
use global::{Config, State};
use line::{LineSource, StdinLines};

fn handle_line(state: &mut State, line: &[u8]) -> Flow {
	if line.is_empty() {
		return Flow::Continue;
	}
	state.history.add(line);
	match parser::parse(line) {
		Ok(pipeline) => {
			let report = eval::run(state, &pipeline);
			debug!("pipeline done: aborted={}, job={:?}", report.aborted, report.job_number);
			report.flow
		},
		Err(e) => {
			eprintln!("psh: could not parse {}: {}", String::from_utf8_lossy(line), e);
			Flow::Continue
		},
	}
}

/// The read loop. Returns the shell's exit status.
fn repl<L: LineSource>(state: &mut State, lines: &mut L) -> i32 {
	let mut status = 0;
	let mut flow = Flow::Continue;
	while flow == Flow::Continue {
		flow = match lines.read_line() {
			Ok(Some(line)) => handle_line(state, &line),
			Ok(None) => Flow::Exit,
			Err(e) => {
				eprintln!("psh: {}", e);
				status = 1;
				Flow::Exit
			},
		};

		// no zombies escape
		for pr in state.job_set.reap() {
			debug!("reaped pid={} with {:?}", pr.pid, pr.status);
		}
	}
	debug!("{} line(s) in history", state.history.entries().len());
	if !state.job_set.is_empty() {
		debug!("leaving {} background job(s) behind", state.job_set.len());
	}
	status
}

fn main() {
	env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

	let config = match Config::from_env() {
		Ok(config) => config,
		Err(e) => {
			eprintln!("psh: {}", e);
			process::exit(2);
		},
	};

	// ^C belongs to the foreground stages, never to the shell.
	if let Err(e) = unsafe { signal(Signal::SIGINT, SigHandler::SigIgn) } {
		warn!("could not ignore SIGINT: {}", e);
	}

	let mut lines = StdinLines::new(&config.prompt);
	let mut state = State::new(config);
	process::exit(repl(&mut state, &mut lines));
}
