//! Command-line interface definition using clap.

use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};

use astview_viewer::config::TOOL_ENV;
use astview_viewer::{Result, ViewerConfig};

/// astview - render the AST of a source file with an external tool
#[derive(Parser, Debug)]
#[command(name = "astview")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Analyze a file once and print its AST
    Show {
        /// Source file to analyze
        #[arg(required = true)]
        file: PathBuf,

        #[command(flatten)]
        tool: ToolArgs,

        /// Output format
        #[arg(short, long, default_value = "raw")]
        format: OutputFormat,
    },

    /// Re-analyze a file whenever it changes on disk
    Watch {
        /// Source file to watch
        #[arg(required = true)]
        file: PathBuf,

        #[command(flatten)]
        tool: ToolArgs,

        /// How often to check the file, in milliseconds
        #[arg(long, default_value_t = 500)]
        interval_ms: u64,

        /// Collapse changes arriving within this window, in milliseconds
        #[arg(long)]
        debounce_ms: Option<u64>,
    },
}

/// How the analysis tool is launched.
#[derive(Args, Debug, Clone, Default)]
pub struct ToolArgs {
    /// Tool executable (name on PATH or path)
    #[arg(short, long, env = "ASTVIEW_TOOL")]
    pub tool: Option<String>,

    /// Argument passed to the tool before the file name (repeatable)
    #[arg(short = 'a', long = "arg", allow_hyphen_values = true)]
    pub args: Vec<String>,

    /// Kill the tool after this many milliseconds (0 disables)
    #[arg(long)]
    pub timeout_ms: Option<u64>,

    /// Accept runs that write to stderr but exit 0
    #[arg(long)]
    pub allow_stderr: bool,
}

impl ToolArgs {
    /// Builds the viewer config from flags layered over `ASTVIEW_*` variables.
    pub fn viewer_config(&self) -> Result<ViewerConfig> {
        self.viewer_config_with(|key| std::env::var(key).ok())
    }

    /// Builds the viewer config from flags layered over `env`.
    pub fn viewer_config_with<F>(&self, env: F) -> Result<ViewerConfig>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = ViewerConfig::from_lookup(|key| {
            if key == TOOL_ENV {
                self.tool.clone().or_else(|| env(key))
            } else {
                env(key)
            }
        })?;

        if !self.args.is_empty() {
            config.runner = config.runner.with_args(self.args.clone());
        }
        if let Some(ms) = self.timeout_ms {
            config.runner = config
                .runner
                .with_timeout((ms > 0).then(|| Duration::from_millis(ms)));
        }
        if self.allow_stderr {
            config.runner = config.runner.with_stderr_is_failure(false);
        }
        Ok(config)
    }
}

/// Output format for `show`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// The tool's output as is
    #[default]
    Raw,
    /// A JSON report with status and timing
    Json,
}

impl Cli {
    /// Returns the log level based on verbosity.
    pub fn log_level(&self) -> tracing::Level {
        match self.verbose {
            0 => tracing::Level::WARN,
            1 => tracing::Level::INFO,
            2 => tracing::Level::DEBUG,
            _ => tracing::Level::TRACE,
        }
    }
}
