//! Resolution of the tool executable into a launchable command.

use std::path::PathBuf;
use std::process::Stdio;

use tokio::process::Command;
use tracing::trace;

use crate::config::RunnerConfig;
use crate::error::{Result, RunnerError};

/// A resolved tool invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolCommand {
    /// Absolute or relative path to the executable.
    pub program: PathBuf,
    /// Arguments placed before the file name.
    pub args: Vec<String>,
}

impl ToolCommand {
    /// Resolves the configured program.
    ///
    /// `~` is expanded. A program containing a path separator is used as
    /// is; a bare name is looked up on `PATH`.
    ///
    /// # Errors
    ///
    /// Returns `RunnerError::ToolNotFound` if a bare name is not on `PATH`.
    pub fn resolve(config: &RunnerConfig) -> Result<Self> {
        let expanded = shellexpand::tilde(&config.program).to_string();
        if expanded.is_empty() {
            return Err(RunnerError::ToolNotFound(config.program.clone()));
        }

        let program = if has_separator(&expanded) {
            PathBuf::from(expanded)
        } else {
            which::which(&expanded).map_err(|_| RunnerError::ToolNotFound(expanded.clone()))?
        };
        trace!(program = %program.display(), "resolved tool");

        Ok(Self {
            program,
            args: config.args.clone(),
        })
    }

    /// Builds the process command for one source file.
    ///
    /// All three standard streams are piped and the child is killed if its
    /// handle is dropped.
    pub fn command(&self, config: &RunnerConfig, source_file_name: &str) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args)
            .arg(source_file_name)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        if let Some(dir) = &config.working_dir {
            cmd.current_dir(dir);
        }
        for (key, value) in &config.env {
            cmd.env(key, value);
        }
        cmd
    }

    /// Returns the command line for logging.
    pub fn display(&self, source_file_name: &str) -> String {
        let mut line = self.program.display().to_string();
        for arg in self.args.iter().map(String::as_str).chain([source_file_name]) {
            line.push(' ');
            line.push_str(arg);
        }
        line
    }
}

fn has_separator(program: &str) -> bool {
    program.contains('/') || program.contains(std::path::MAIN_SEPARATOR)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_path_used_verbatim() {
        let config = RunnerConfig::new("/opt/tools/goastview").with_arg("-json");
        let tool = ToolCommand::resolve(&config).unwrap();

        assert_eq!(tool.program, PathBuf::from("/opt/tools/goastview"));
        assert_eq!(tool.args, vec!["-json"]);
    }

    #[test]
    fn test_relative_path_used_verbatim() {
        let config = RunnerConfig::new("./bin/astdump");
        let tool = ToolCommand::resolve(&config).unwrap();

        assert_eq!(tool.program, PathBuf::from("./bin/astdump"));
    }

    #[test]
    fn test_missing_bare_name() {
        let config = RunnerConfig::new("astview-definitely-not-installed");
        let result = ToolCommand::resolve(&config);

        assert!(matches!(result, Err(RunnerError::ToolNotFound(_))));
    }

    #[test]
    fn test_empty_program() {
        let result = ToolCommand::resolve(&RunnerConfig::new(""));
        assert!(matches!(result, Err(RunnerError::ToolNotFound(_))));
    }

    #[cfg(unix)]
    #[test]
    fn test_bare_name_found_on_path() {
        let tool = ToolCommand::resolve(&RunnerConfig::new("sh")).unwrap();
        assert!(tool.program.is_absolute());
    }

    #[test]
    fn test_display() {
        let tool = ToolCommand {
            program: PathBuf::from("/usr/bin/goastview"),
            args: vec!["-json".to_string()],
        };

        assert_eq!(tool.display("main.go"), "/usr/bin/goastview -json main.go");
    }
}
