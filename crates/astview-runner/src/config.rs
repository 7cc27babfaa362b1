//! Runner configuration.

use std::path::PathBuf;
use std::time::Duration;

/// Configuration for a tool runner.
#[derive(Debug, Clone)]
pub struct RunnerConfig {
    /// Executable to launch. Bare names are looked up on `PATH`.
    pub program: String,
    /// Arguments placed before the source file name.
    pub args: Vec<String>,
    /// Kill the tool if it runs longer than this.
    pub timeout: Option<Duration>,
    /// Treat any stderr output as a failure, even on exit status 0.
    pub stderr_is_failure: bool,
    /// Working directory for the tool.
    pub working_dir: Option<PathBuf>,
    /// Extra environment variables for the tool.
    pub env: Vec<(String, String)>,
    /// Capacity of the event broadcast channel.
    pub event_capacity: usize,
    /// Size of each pipe read.
    pub read_chunk_size: usize,
}

impl RunnerConfig {
    /// Creates a config for the given executable with default settings.
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            timeout: Some(Duration::from_secs(30)),
            stderr_is_failure: true,
            working_dir: None,
            env: Vec::new(),
            event_capacity: 256,
            read_chunk_size: 8 * 1024,
        }
    }

    /// Appends an argument placed before the file name.
    pub fn with_arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Replaces the leading arguments.
    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    /// Sets the timeout. `None` waits forever.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sets whether stderr output alone fails a run.
    pub fn with_stderr_is_failure(mut self, enabled: bool) -> Self {
        self.stderr_is_failure = enabled;
        self
    }

    /// Sets the working directory.
    pub fn with_working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    /// Adds an environment variable.
    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }

    /// Sets the event channel capacity.
    pub fn with_event_capacity(mut self, capacity: usize) -> Self {
        self.event_capacity = capacity.max(1);
        self
    }

    /// Sets the pipe read size.
    pub fn with_read_chunk_size(mut self, size: usize) -> Self {
        self.read_chunk_size = size.max(1);
        self
    }
}
