//! View controller configuration.
//!
//! # Environment Variables
//!
//! - `ASTVIEW_TOOL`: executable that renders the AST (required by `from_env`)
//! - `ASTVIEW_TOOL_ARGS`: whitespace-separated arguments before the file name
//! - `ASTVIEW_TIMEOUT_MS`: kill the tool after this many ms (`0` disables)
//! - `ASTVIEW_DEBOUNCE_MS`: coalesce updates arriving within this window
//! - `ASTVIEW_STDERR_IS_FAILURE`: `true`/`false`, fail runs that write stderr

use std::time::Duration;

use astview_runner::RunnerConfig;

use crate::error::{Result, ViewerError};

/// Environment variable naming the tool executable.
pub const TOOL_ENV: &str = "ASTVIEW_TOOL";

/// Environment variable with extra tool arguments.
pub const TOOL_ARGS_ENV: &str = "ASTVIEW_TOOL_ARGS";

/// Environment variable with the run timeout in milliseconds.
pub const TIMEOUT_ENV: &str = "ASTVIEW_TIMEOUT_MS";

/// Environment variable with the debounce window in milliseconds.
pub const DEBOUNCE_ENV: &str = "ASTVIEW_DEBOUNCE_MS";

/// Environment variable toggling the stderr failure policy.
pub const STDERR_IS_FAILURE_ENV: &str = "ASTVIEW_STDERR_IS_FAILURE";

/// Configuration for a view controller.
#[derive(Debug, Clone)]
pub struct ViewerConfig {
    /// How the tool is launched.
    pub runner: RunnerConfig,
    /// Updates arriving within this window collapse into the newest one.
    pub debounce: Duration,
    /// Capacity of the viewer event channel.
    pub event_capacity: usize,
}

impl ViewerConfig {
    /// Creates a config around a runner config.
    pub fn new(runner: RunnerConfig) -> Self {
        Self {
            runner,
            debounce: Duration::ZERO,
            event_capacity: 64,
        }
    }

    /// Builds a config from `ASTVIEW_*` environment variables.
    ///
    /// # Errors
    ///
    /// Returns `ViewerError::Config` if `ASTVIEW_TOOL` is unset or a
    /// numeric or boolean variable does not parse.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds a config from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let program = lookup(TOOL_ENV)
            .filter(|p| !p.trim().is_empty())
            .ok_or_else(|| ViewerError::Config(format!("{} is not set", TOOL_ENV)))?;

        let mut runner = RunnerConfig::new(program.trim());
        if let Some(args) = lookup(TOOL_ARGS_ENV) {
            runner = runner.with_args(args.split_whitespace());
        }
        if let Some(ms) = lookup(TIMEOUT_ENV) {
            let ms = parse_millis(TIMEOUT_ENV, &ms)?;
            runner = runner.with_timeout((ms > 0).then(|| Duration::from_millis(ms)));
        }
        if let Some(flag) = lookup(STDERR_IS_FAILURE_ENV) {
            runner = runner.with_stderr_is_failure(parse_bool(STDERR_IS_FAILURE_ENV, &flag)?);
        }

        let mut config = Self::new(runner);
        if let Some(ms) = lookup(DEBOUNCE_ENV) {
            config.debounce = Duration::from_millis(parse_millis(DEBOUNCE_ENV, &ms)?);
        }
        Ok(config)
    }

    /// Sets the debounce window.
    pub fn with_debounce(mut self, debounce: Duration) -> Self {
        self.debounce = debounce;
        self
    }

    /// Sets the event channel capacity.
    pub fn with_event_capacity(mut self, capacity: usize) -> Self {
        self.event_capacity = capacity.max(1);
        self
    }
}

fn parse_millis(key: &str, value: &str) -> Result<u64> {
    value
        .trim()
        .parse()
        .map_err(|_| ViewerError::Config(format!("{} must be milliseconds, got '{}'", key, value)))
}

fn parse_bool(key: &str, value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ViewerError::Config(format!(
            "{} must be true or false, got '{}'",
            key, value
        ))),
    }
}
