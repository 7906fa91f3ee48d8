use log::{debug, info, warn};
use nix::errno::Errno;
use nix::sys::wait::{waitpid, WaitPidFlag, WaitStatus};
use nix::unistd::Pid;

use crate::error::ExecError;

pub trait WaitStatusExt {
	fn is_terminated(&self) -> bool;
	fn code(&self) -> Option<i32>;
}

impl WaitStatusExt for WaitStatus {
	fn is_terminated(&self) -> bool {
		match *self {
			WaitStatus::Exited(..) | WaitStatus::Signaled(..) => true,
			_ => false,
		}
	}

	/// Exit code, with signal deaths reported as 128 + signal number.
	fn code(&self) -> Option<i32> {
		match *self {
			WaitStatus::Exited(_, code) => Some(code),
			WaitStatus::Signaled(_, sig, _) => Some(128 + sig as i32),
			_ => None,
		}
	}
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub struct Process {
	pub pid: Pid,
	pub status: WaitStatus,
}

/// The process table of one pipeline, in launch order.
#[derive(Debug)]
pub struct Job {
	pub processes: Vec<Process>,
}

impl Job {
	pub fn is_terminated(&self) -> bool {
		self.processes.iter().all(|pr| pr.status.is_terminated())
	}

	pub fn pids(&self) -> Vec<Pid> {
		self.processes.iter().map(|pr| pr.pid).collect()
	}

	/// Blocks on every process in launch order.
	pub fn wait(&mut self) -> Result<(), ExecError> {
		for pr in self.processes.iter_mut() {
			if pr.status.is_terminated() {
				continue;
			}
			debug!("waiting for child pid={}", pr.pid);
			let status = loop {
				match waitpid(pr.pid, None) {
					Err(Errno::EINTR) => continue,
					r => break r.map_err(ExecError::Wait)?,
				}
			};
			debug!("child pid={} exited with {:?}", pr.pid, status);
			pr.status = status;
		}
		Ok(())
	}
}

/// Collects pids while a pipeline is launched. Holds at most `limit`
/// processes; pushing past that is refused rather than growing.
#[derive(Debug)]
pub struct JobBuilder {
	imp: Job,
	limit: usize,
}

impl JobBuilder {
	pub fn new(limit: usize) -> JobBuilder {
		JobBuilder {
			imp: Job { processes: Vec::with_capacity(limit) },
			limit: limit,
		}
	}

	pub fn push(&mut self, pid: Pid) -> Result<(), ExecError> {
		let processes = &mut self.imp.processes;
		if processes.len() >= self.limit {
			return Err(ExecError::TooDeep { stages: processes.len() + 1, max: self.limit });
		}
		processes.push(Process { pid: pid, status: WaitStatus::StillAlive });
		Ok(())
	}

	pub fn build(self) -> Job {
		self.imp
	}
}

/// Background jobs that have not been fully reaped yet.
#[derive(Debug, Default)]
pub struct JobSet {
	jobs: Vec<Option<Job>>,
}

impl JobSet {
	pub fn new() -> JobSet {
		JobSet::default()
	}

	/// Registers a job and returns its number (1-based).
	pub fn push(&mut self, job: Job) -> usize {
		let jobs = &mut self.jobs;
		if let Some((i, space)) = jobs.iter_mut().enumerate().find(|(_, o)| o.is_none()) {
			*space = Some(job);
			i + 1
		} else {
			jobs.push(Some(job));
			jobs.len()
		}
	}

	pub fn len(&self) -> usize {
		self.jobs.iter().filter(|o| o.is_some()).count()
	}

	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}

	fn update(&mut self, status: WaitStatus) {
		let pid = match status.pid() {
			Some(pid) => pid,
			None => return,
		};
		let found = self.jobs.iter_mut().enumerate().find_map(|(i, slot)| {
			let job = slot.as_mut()?;
			let pr = job.processes.iter_mut().find(|pr| pr.pid == pid)?;
			pr.status = status;
			Some((i, job.is_terminated()))
		});
		match found {
			Some((i, true)) => {
				info!("[{}] done", i + 1);
				self.jobs[i] = None;
				let len = self.jobs.iter().rposition(|o| o.is_some()).map_or(0, |i| i + 1);
				self.jobs.truncate(len);
			},
			Some((_, false)) => {},
			None => debug!("zombie caught with pid={} status {:?}", pid, status),
		}
	}

	/// Collects every terminated child without blocking. Returns what was
	/// reaped, in collection order.
	pub fn reap(&mut self) -> Vec<Process> {
		let mut reaped = vec![];
		loop {
			match waitpid(Pid::from_raw(-1), Some(WaitPidFlag::WNOHANG)) {
				Ok(WaitStatus::StillAlive) | Err(Errno::ECHILD) => break,
				Err(Errno::EINTR) => continue,
				Err(e) => {
					warn!("reap sweep failed: {}", e);
					break;
				},
				Ok(status) => {
					if let Some(pid) = status.pid() {
						reaped.push(Process { pid: pid, status: status });
					}
					self.update(status);
				},
			}
		}
		reaped
	}
}
