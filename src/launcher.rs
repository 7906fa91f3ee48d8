use std::ffi::CString;

use log::debug;
use nix::errno::Errno;
use nix::sys::signal::{signal, SigHandler, Signal};
use nix::unistd::{self, ForkResult, Pid};

use crate::error::ExecError;
use crate::fd::{safe_close, Fd};

/// How a stage relates to the terminal's interrupt key.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Disposition {
	/// SIGINT back to default, so ^C ends the stage.
	Foreground,
	/// Own process group, SIGINT left as inherited (ignored by the shell).
	Background,
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub struct LaunchConfig {
	pub disposition: Disposition,
}

impl LaunchConfig {
	pub fn for_pipeline(is_background: bool) -> LaunchConfig {
		let disposition = if is_background { Disposition::Background } else { Disposition::Foreground };
		LaunchConfig { disposition: disposition }
	}

	fn apply_in_child(&self) -> nix::Result<()> {
		// The Rust runtime ignores SIGPIPE, and an ignored signal survives exec.
		unsafe { signal(Signal::SIGPIPE, SigHandler::SigDfl) }?;
		match self.disposition {
			Disposition::Foreground => unsafe { signal(Signal::SIGINT, SigHandler::SigDfl) }.map(drop),
			Disposition::Background => unistd::setpgid(Pid::from_raw(0), Pid::from_raw(0)),
		}
	}

	fn apply_in_parent(&self, child: Pid) {
		if self.disposition == Disposition::Background {
			// Also done by the child; whichever runs first wins the race.
			let _ = unistd::setpgid(child, child);
		}
	}
}

/// The four descriptors around one stage, as the builder holds them.
#[derive(Debug)]
pub struct StageIo<'a> {
	pub prev_read: &'a Fd,
	pub prev_write: &'a Fd,
	pub next_read: &'a Fd,
	pub next_write: &'a Fd,
}

impl<'a> StageIo<'a> {
	fn wire(&self) -> nix::Result<()> {
		safe_close(self.prev_write.raw());

		self.prev_read.dup_onto(libc::STDIN_FILENO)?;
		safe_close(self.prev_read.raw());

		safe_close(self.next_read.raw());

		self.next_write.dup_onto(libc::STDOUT_FILENO)?;
		safe_close(self.next_write.raw());
		Ok(())
	}
}

/// Exit status of a child whose program could not be started.
pub fn exec_failure_status(e: Errno) -> i32 {
	match e {
		Errno::ENOENT => 127,
		_ => 126,
	}
}

/// Forks one stage. The parent gets the child's pid back; the child never
/// returns from here.
pub fn launch(argv: &[CString], io: &StageIo, config: LaunchConfig) -> Result<Pid, ExecError> {
	match unsafe { unistd::fork() }.map_err(ExecError::Fork)? {
		ForkResult::Parent { child } => {
			config.apply_in_parent(child);
			debug!("forked pid={} for {:?}", child, argv[0]);
			Ok(child)
		},
		ForkResult::Child => exec_stage(argv, io, config),
	}
}

fn exec_stage(argv: &[CString], io: &StageIo, config: LaunchConfig) -> ! {
	let name = argv[0].to_string_lossy();
	if let Err(e) = config.apply_in_child() {
		child_error(&format!("psh: {}: signal setup failed: {}\n", name, e));
		unsafe { libc::_exit(126) }
	}
	if let Err(e) = io.wire() {
		child_error(&format!("psh: {}: could not set up redirection: {}\n", name, e));
		unsafe { libc::_exit(126) }
	}

	let e = match unistd::execvp(&argv[0], argv) {
		Err(e) => e,
		Ok(never) => match never {},
	};
	child_error(&format!("psh: could not execute {}: {}\n", name, e));
	unsafe { libc::_exit(exec_failure_status(e)) }
}

/// Raw write to fd 2. Forked children stay away from the logger and the
/// stderr lock.
fn child_error(msg: &str) {
	let bytes = msg.as_bytes();
	unsafe {
		libc::write(libc::STDERR_FILENO, bytes.as_ptr() as *const libc::c_void, bytes.len());
	}
}
