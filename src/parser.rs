use std::ffi::{CString, OsStr};
use std::os::unix::ffi::OsStrExt;
use std::path::PathBuf;

use crate::types::*;

type ParseResult<T> = Result<T, String>;

struct Parser<'a> {
	line: &'a [u8],
	i: usize,
}

/// A redirection as written, before it is attached to a stage.
enum Redirection<'a> {
	Input(&'a [u8]),
	Output(&'a [u8], RedirectType),
}

#[derive(Default)]
struct RawStage<'a> {
	words: Vec<&'a [u8]>,
	input: Option<&'a [u8]>,
	output: Option<(&'a [u8], RedirectType)>,
}

impl<'a> Parser<'a> {
	fn proceed_while<F>(&mut self, f: F) where F: Fn(u8) -> bool {
		while let Some(c) = self.line.get(self.i) {
			if !f(*c) { break; }
			self.i += 1;
		}
	}

	fn is_whitespace(c: u8) -> bool {
		match c {
			b' ' | b'\t' | b'\r' | b'\n' => true,
			_ => false,
		}
	}

	fn is_letter(c: u8) -> bool {
		match c {
			b'>' | b'<' | b'&' | b'|' => false,
			_ => !Parser::is_whitespace(c),
		}
	}

	fn skip_whitespaces(&mut self) {
		self.proceed_while(Parser::is_whitespace);
	}

	fn read_word(&mut self) -> &'a [u8] {
		let orig = self.i;
		self.proceed_while(Parser::is_letter);
		&self.line[orig .. self.i]
	}

	fn parse_redirect(&mut self) -> ParseResult<Option<Redirection<'a>>> {
		let redirection = match self.line.get(self.i) {
			Some(&b'<') => {
				self.i += 1;
				None
			},
			Some(&b'>') => if self.line.get(self.i+1) == Some(&b'>') {
				self.i += 2;
				Some(RedirectType::Append)
			} else {
				self.i += 1;
				Some(RedirectType::Output)
			},
			_ => { return Ok(None); },
		};

		self.skip_whitespaces();
		let target = self.read_word();
		if target.is_empty() {
			return Err("empty redirect".to_string());
		}

		Ok(Some(match redirection {
			None => Redirection::Input(target),
			Some(typ) => Redirection::Output(target, typ),
		}))
	}

	fn parse_command(&mut self) -> ParseResult<RawStage<'a>> {
		let mut stage = RawStage::default();

		loop {
			self.skip_whitespaces();
			match self.parse_redirect()? {
				Some(Redirection::Input(target)) => {
					if stage.input.replace(target).is_some() {
						return Err("duplicate input redirect".to_string());
					}
				},
				Some(Redirection::Output(target, typ)) => {
					if stage.output.replace((target, typ)).is_some() {
						return Err("duplicate output redirect".to_string());
					}
				},
				None => {
					let word = self.read_word();
					if word.is_empty() {
						break;
					}
					stage.words.push(word);
				},
			}
		}

		if stage.words.is_empty() {
			return Err("empty command".to_string());
		}
		Ok(stage)
	}

	fn parse_pipeline(&mut self) -> ParseResult<(Vec<RawStage<'a>>, bool)> {
		let mut stages: Vec<RawStage<'a>> = vec![];
		let mut is_background = false;

		loop {
			stages.push(self.parse_command()?);
			match self.line.get(self.i) {
				Some(&b'|') => { self.i += 1; },
				Some(&b'&') => {
					self.i += 1;
					is_background = true;
					self.skip_whitespaces();
					if let Some(&c) = self.line.get(self.i) {
						return Err(format!("character after '&': '{}'", c as char));
					} else {
						break;
					}
				},
				Some(&c) => { return Err(format!("unknown command separator: '{}'", c as char)); },
				None => { break; },
			}
		}
		Ok((stages, is_background))
	}
}

fn to_path(word: &[u8]) -> PathBuf {
	PathBuf::from(OsStr::from_bytes(word))
}

fn link_stages(stages: Vec<RawStage>) -> ParseResult<Pipeline> {
	let count = stages.len();
	let mut input = None;
	let mut output = None;
	let mut head: Option<Box<Stage>> = None;

	// Each stage links to the one parsed before it, so the last stage
	// ends up at the head of the list.
	for (i, stage) in stages.into_iter().enumerate() {
		if let Some(target) = stage.input {
			if i != 0 {
				return Err("input redirect is only allowed on the first command".to_string());
			}
			input = Some(to_path(target));
		}
		if let Some((target, typ)) = stage.output {
			if i != count - 1 {
				return Err("output redirect is only allowed on the last command".to_string());
			}
			output = Some(Redirect { target: to_path(target), typ: typ });
		}
		let argv: Result<Vec<CString>, _> = stage.words.iter().map(|&w| CString::new(w)).collect();
		let argv = argv.map_err(|e| e.to_string())?;
		let linked = Stage::new(argv, head.take()).ok_or_else(|| "empty command".to_string())?;
		head = Some(Box::new(linked));
	}

	match head {
		Some(head) => Ok(Pipeline { head: *head, input: input, output: output, is_background: false }),
		None => Err("empty command".to_string()),
	}
}

pub fn parse(line: &[u8]) -> ParseResult<Pipeline> {
	let mut parser = Parser { line: line, i: 0 };
	let (stages, is_background) = parser.parse_pipeline()?;
	let mut pipeline = link_stages(stages)?;
	pipeline.is_background = is_background;
	Ok(pipeline)
}
