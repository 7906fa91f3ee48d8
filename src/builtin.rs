use std::env;
use std::ffi::{CStr, CString, OsStr};
use std::os::unix::ffi::OsStrExt;
use std::path::PathBuf;

use log::debug;
use nix::unistd;

/// What the read loop should do once the current pipeline is finished.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Flow { Continue, Exit }

pub type Builtin = fn(&[CString]) -> Flow;

/// `cd [dir]`. Without a directory, goes to `$HOME`. Failure is reported
/// and does not stop the pipeline.
pub fn builtin_cd(argv: &[CString]) -> Flow {
	let target = match argv.get(1) {
		Some(dir) => PathBuf::from(OsStr::from_bytes(dir.to_bytes())),
		None => match env::var_os("HOME") {
			Some(home) => PathBuf::from(home),
			None => {
				eprintln!("psh: cd: HOME not set");
				return Flow::Continue;
			},
		},
	};
	match unistd::chdir(target.as_path()) {
		Ok(()) => debug!("cd to {}", target.display()),
		Err(e) => eprintln!("psh: could not cd to {}: {}", target.display(), e),
	}
	Flow::Continue
}

pub fn builtin_exit(_: &[CString]) -> Flow {
	Flow::Exit
}

pub fn match_builtin(name: &CStr) -> Option<Builtin> {
	match name.to_bytes() {
		b"cd" => Some(builtin_cd),
		b"exit" => Some(builtin_exit),
		_ => None,
	}
}
