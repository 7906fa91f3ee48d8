use std::{error, fmt, io};
use std::path::PathBuf;

#[derive(Debug)]
pub enum ExecError {
	TooDeep { stages: usize, max: usize },
	Redirect { path: PathBuf, write: bool, source: io::Error },
	Pipe(nix::Error),
	Fork(nix::Error),
	Wait(nix::Error),
}

impl fmt::Display for ExecError {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		match *self {
			ExecError::TooDeep { stages, max } =>
				write!(f, "pipeline has {} stages, the limit is {}", stages, max),
			ExecError::Redirect { ref path, write, ref source } =>
				write!(f, "could not open {} for {}: {}", path.display(), if write { "writing" } else { "reading" }, source),
			ExecError::Pipe(ref e) => write!(f, "pipe failure: {}", e),
			ExecError::Fork(ref e) => write!(f, "fork failed: {}", e),
			ExecError::Wait(ref e) => write!(f, "wait failed: {}", e),
		}
	}
}

impl error::Error for ExecError {
	fn source(&self) -> Option<&(dyn error::Error + 'static)> {
		match *self {
			ExecError::TooDeep { .. } => None,
			ExecError::Redirect { ref source, .. } => Some(source),
			ExecError::Pipe(ref e) => Some(e),
			ExecError::Fork(ref e) => Some(e),
			ExecError::Wait(ref e) => Some(e),
		}
	}
}

#[derive(Debug, PartialEq, Eq)]
pub enum ConfigError {
	InvalidDepth(String),
}

impl fmt::Display for ConfigError {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		match *self {
			ConfigError::InvalidDepth(ref v) =>
				write!(f, "invalid maximum pipeline depth {:?}: expected a positive integer", v),
		}
	}
}

impl error::Error for ConfigError {}
