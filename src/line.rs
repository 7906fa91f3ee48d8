use std::io;
use io::{BufRead, Write};

/// Where command lines come from. `Ok(None)` means end of input.
pub trait LineSource {
	fn read_line(&mut self) -> io::Result<Option<Vec<u8>>>;
}

/// Prompts on stdout and reads lines from stdin.
pub struct StdinLines {
	prompt: Vec<u8>,
	stdin: io::StdinLock<'static>,
}

impl StdinLines {
	pub fn new(prompt: &str) -> StdinLines {
		StdinLines { prompt: prompt.as_bytes().to_vec(), stdin: io::stdin().lock() }
	}
}

impl LineSource for StdinLines {
	fn read_line(&mut self) -> io::Result<Option<Vec<u8>>> {
		let mut stdout = io::stdout();
		let _ = stdout.write_all(&self.prompt);
		let _ = stdout.flush();
		let mut line: Vec<u8> = vec![];
		if self.stdin.read_until(b'\n', &mut line)? == 0 {
			return Ok(None);
		}
		Ok(Some(strip_white(&line).to_vec()))
	}
}

fn is_white(c: u8) -> bool {
	match c {
		b' ' | b'\t' | b'\r' | b'\n' => true,
		_ => false,
	}
}

pub fn strip_white(line: &[u8]) -> &[u8] {
	let start = line.iter().position(|&c| !is_white(c)).unwrap_or(line.len());
	let end = line.iter().rposition(|&c| !is_white(c)).map_or(start, |i| i + 1);
	&line[start .. end]
}

#[derive(Debug, Default)]
pub struct History {
	entries: Vec<String>,
}

impl History {
	pub fn new() -> History {
		History::default()
	}

	pub fn add(&mut self, line: &[u8]) {
		if !line.is_empty() {
			self.entries.push(String::from_utf8_lossy(line).into_owned());
		}
	}

	pub fn entries(&self) -> &[String] {
		&self.entries
	}
}
