use std::env;

use crate::error::ConfigError;
use crate::job;
use crate::line::History;

pub const DEFAULT_MAX_PIPELINE: usize = 20;
pub const DEFAULT_PROMPT: &str = "psh> ";

const MAX_PIPELINE_KEY: &str = "PSH_MAX_PIPELINE";
const PROMPT_KEY: &str = "PSH_PROMPT";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
	/// Upper bound on stages per pipeline, and so on the process table.
	pub max_pipeline: usize,
	pub prompt: String,
}

impl Default for Config {
	fn default() -> Config {
		Config { max_pipeline: DEFAULT_MAX_PIPELINE, prompt: DEFAULT_PROMPT.to_string() }
	}
}

impl Config {
	pub fn from_env() -> Result<Config, ConfigError> {
		Config::from_vars(env::var(MAX_PIPELINE_KEY).ok(), env::var(PROMPT_KEY).ok())
	}

	fn from_vars(max_pipeline: Option<String>, prompt: Option<String>) -> Result<Config, ConfigError> {
		let mut config = Config::default();
		if let Some(v) = max_pipeline {
			config.max_pipeline = match v.trim().parse::<usize>() {
				Ok(n) if n > 0 => n,
				_ => return Err(ConfigError::InvalidDepth(v)),
			};
		}
		if let Some(p) = prompt {
			config.prompt = p;
		}
		Ok(config)
	}
}

pub struct State {
	pub config: Config,
	pub job_set: job::JobSet,
	pub history: History,
}

impl State {
	pub fn new(config: Config) -> State {
		State { config: config, job_set: job::JobSet::new(), history: History::new() }
	}
}
