use std::fs;
use std::os::unix::fs::OpenOptionsExt;
use std::path::Path;

use log::{debug, info, warn};
use nix::fcntl::OFlag;
use nix::unistd;

use crate::builtin::{self, Flow};
use crate::error::ExecError;
use crate::fd::Fd;
use crate::global::State;
use crate::job::{JobBuilder, Process, WaitStatusExt};
use crate::launcher::{self, LaunchConfig, StageIo};
use crate::types::{Pipeline, Redirect, RedirectType};

/// Mode for files created by output redirection: rw-r--r--.
pub const DEFAULT_MODE: u32 = 0o644;

/// What happened to one pipeline.
#[derive(Debug)]
pub struct Report {
	pub flow: Flow,
	/// Forked stages in launch order. Statuses are final for a foreground
	/// pipeline and `StillAlive` otherwise.
	pub processes: Vec<Process>,
	/// Set when the stages were handed to the job set instead of waited on.
	pub job_number: Option<usize>,
	/// Construction stopped early on an error.
	pub aborted: bool,
}

fn open_input(path: Option<&Path>) -> Result<Fd, ExecError> {
	let path = match path {
		Some(path) => path,
		None => return Ok(Fd::stdin()),
	};
	fs::OpenOptions::new()
		.read(true)
		.open(path)
		.map(Fd::from)
		.map_err(|e| ExecError::Redirect { path: path.to_owned(), write: false, source: e })
}

fn open_output(redirect: Option<&Redirect>) -> Result<Fd, ExecError> {
	let redirect = match redirect {
		Some(redirect) => redirect,
		None => return Ok(Fd::stdout()),
	};
	let mut oopt = fs::OpenOptions::new();
	let _ = match redirect.typ {
		RedirectType::Output => oopt.write(true).truncate(true),
		RedirectType::Append => oopt.append(true),
	};
	oopt.create(true)
		.mode(DEFAULT_MODE)
		.open(&redirect.target)
		.map(Fd::from)
		.map_err(|e| ExecError::Redirect { path: redirect.target.clone(), write: true, source: e })
}

fn open_pipe() -> Result<(Fd, Fd), ExecError> {
	let (read, write) = unistd::pipe2(OFlag::O_CLOEXEC).map_err(ExecError::Pipe)?;
	Ok((Fd::from(read), Fd::from(write)))
}

/// Launches every stage left to right. Built-ins run here; `exit` is
/// recorded in `flow`. Every `Fd` still held is closed on drop, whether the
/// loop finishes or bails out.
fn spawn_stages(pipeline: &Pipeline, max: usize, job_builder: &mut JobBuilder, flow: &mut Flow) -> Result<(), ExecError> {
	let count = pipeline.stage_count();
	if count > max {
		return Err(ExecError::TooDeep { stages: count, max: max });
	}

	let mut input = open_input(pipeline.input.as_deref())?;
	let mut output = open_output(pipeline.output.as_ref())?;
	debug!("pipeline: stdin={}, stdout={}, count={}", input.raw(), output.raw(), count);

	let order = pipeline.execution_order();
	let config = LaunchConfig::for_pipeline(pipeline.is_background);

	let mut previous_read_end = input.take();
	let mut previous_write_end = Fd::none();
	for (i, stage) in order.iter().enumerate() {
		let (next_read_end, mut next_write_end) = if i == count - 1 {
			(Fd::none(), output.take())
		} else {
			open_pipe()?
		};
		debug!("stage {}: previous=({}, {}), next=({}, {}), name={:?}", i,
		       previous_read_end.raw(), previous_write_end.raw(),
		       next_read_end.raw(), next_write_end.raw(), stage.name());

		if let Some(func) = builtin::match_builtin(stage.name()) {
			if func(stage.argv()) == Flow::Exit {
				*flow = Flow::Exit;
			}
			// Nothing writes into the next stage: it reads end-of-stream.
			next_write_end.close();
		} else {
			let io = StageIo {
				prev_read: &previous_read_end,
				prev_write: &previous_write_end,
				next_read: &next_read_end,
				next_write: &next_write_end,
			};
			let pid = launcher::launch(stage.argv(), &io, config)?;
			job_builder.push(pid)?;
		}

		previous_read_end.close();
		previous_write_end.close();
		previous_read_end = next_read_end;
		previous_write_end = next_write_end;
	}
	Ok(())
}

/// Runs one pipeline: launch, then wait (foreground) or register with the
/// job set (background).
///
/// When construction is aborted by a pipe or fork failure, stages already
/// started keep running. They are not killed and not waited on here; they
/// go to the job set so the reap sweep collects them.
pub fn run(state: &mut State, pipeline: &Pipeline) -> Report {
	let max = state.config.max_pipeline;
	let mut flow = Flow::Continue;
	let mut job_builder = JobBuilder::new(max);
	let result = spawn_stages(pipeline, max, &mut job_builder, &mut flow);
	let mut job = job_builder.build();

	let mut report = Report { flow: flow, processes: vec![], job_number: None, aborted: result.is_err() };
	match result {
		Err(e) => {
			eprintln!("psh: {}", e);
			if !job.processes.is_empty() {
				warn!("{} stage(s) left running after abort", job.processes.len());
				report.processes = job.processes.clone();
				report.job_number = Some(state.job_set.push(job));
			}
		},
		Ok(()) if job.processes.is_empty() => {},
		Ok(()) if pipeline.is_background => {
			report.processes = job.processes.clone();
			let pids = job.pids();
			let n = state.job_set.push(job);
			info!("[{}] {:?}", n, pids);
			report.job_number = Some(n);
		},
		Ok(()) => {
			if let Err(e) = job.wait() {
				eprintln!("psh: {}", e);
			}
			let codes: Vec<Option<i32>> = job.processes.iter().map(|pr| pr.status.code()).collect();
			debug!("pipeline exit codes: {:?}", codes);
			report.processes = job.processes;
		},
	}
	report
}
