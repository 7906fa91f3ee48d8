use std::ffi::{CStr, CString};
use std::path::PathBuf;

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum RedirectType { Output, Append }

#[derive(Debug, PartialEq, Eq)]
pub struct Redirect {
	pub target: PathBuf,
	pub typ: RedirectType,
}

/// One program of a pipeline, linked in parse order: the head of the list
/// is the *last* stage to run.
#[derive(Debug, PartialEq, Eq)]
pub struct Stage {
	argv: Vec<CString>,
	pub next: Option<Box<Stage>>,
}

impl Stage {
	/// Returns `None` for an empty argument vector.
	pub fn new(argv: Vec<CString>, next: Option<Box<Stage>>) -> Option<Stage> {
		if argv.is_empty() {
			None
		} else {
			Some(Stage { argv: argv, next: next })
		}
	}

	pub fn name(&self) -> &CStr {
		&self.argv[0]
	}

	pub fn argv(&self) -> &[CString] {
		&self.argv
	}

	pub fn iter(&self) -> StageIter {
		StageIter { cur: Some(self) }
	}
}

pub struct StageIter<'a> {
	cur: Option<&'a Stage>,
}

impl<'a> Iterator for StageIter<'a> {
	type Item = &'a Stage;

	fn next(&mut self) -> Option<&'a Stage> {
		let stage = self.cur?;
		self.cur = stage.next.as_deref();
		Some(stage)
	}
}

#[derive(Debug, PartialEq, Eq)]
pub struct Pipeline {
	pub head: Stage,
	pub input: Option<PathBuf>,
	pub output: Option<Redirect>,
	pub is_background: bool,
}

impl Pipeline {
	pub fn stage_count(&self) -> usize {
		self.head.iter().count()
	}

	/// Stages in the order they run, index 0 first.
	pub fn execution_order(&self) -> Vec<&Stage> {
		let mut order: Vec<&Stage> = self.head.iter().collect();
		order.reverse();
		order
	}
}
