use std::fs;
use std::os::fd::{IntoRawFd, OwnedFd, RawFd};

use nix::unistd;

/// Close `fd` unless it is invalid or one of stdin/stdout.
pub fn safe_close(fd: RawFd) {
	if fd > libc::STDOUT_FILENO {
		let _ = unistd::close(fd);
	}
}

/// A descriptor slot in the pipe graph. It may be empty, borrow one of the
/// standard streams, or own a pipe end or redirection file. Closing goes
/// through `safe_close`, so the standard streams survive.
#[derive(Debug, PartialEq, Eq)]
pub struct Fd(RawFd);

impl Fd {
	pub fn none() -> Fd {
		Fd(-1)
	}

	pub fn stdin() -> Fd {
		Fd(libc::STDIN_FILENO)
	}

	pub fn stdout() -> Fd {
		Fd(libc::STDOUT_FILENO)
	}

	pub fn raw(&self) -> RawFd {
		self.0
	}

	pub fn is_open(&self) -> bool {
		self.0 >= 0
	}

	/// Make this descriptor `target` (dup2). A no-op when it already is.
	pub fn dup_onto(&self, target: RawFd) -> nix::Result<()> {
		if !self.is_open() || self.0 == target {
			return Ok(());
		}
		unistd::dup2(self.0, target)?;
		Ok(())
	}

	pub fn close(&mut self) {
		safe_close(self.0);
		self.0 = -1;
	}

	/// Moves the descriptor out, leaving this slot empty.
	pub fn take(&mut self) -> Fd {
		std::mem::replace(self, Fd::none())
	}
}

impl From<OwnedFd> for Fd {
	fn from(fd: OwnedFd) -> Fd {
		Fd(fd.into_raw_fd())
	}
}

impl From<fs::File> for Fd {
	fn from(file: fs::File) -> Fd {
		Fd(file.into_raw_fd())
	}
}

impl Drop for Fd {
	fn drop(&mut self) {
		self.close();
	}
}
