#![forbid(unsafe_code)]

//! REPL configuration.

use std::path::PathBuf;
use std::time::Duration;

use crate::process_runner::{DEFAULT_STAGING_FILE, InterpreterCommand};

/// Default name shown in the prompt and help banner.
pub const DEFAULT_CLI_NAME: &str = "dreamberd";

/// Settings for one REPL run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplConfig {
    /// Name used in the prompt (`<name>> `) and the help banner.
    pub cli_name: String,
    /// Interpreter launched for `run(...)` and `read(...)`.
    pub interpreter: InterpreterCommand,
    /// File the snippet is staged in before the interpreter runs.
    pub staging_path: PathBuf,
    /// Upper bound on interpreter wall time. `None` waits indefinitely.
    pub max_run_duration: Option<Duration>,
}

impl Default for ReplConfig {
    fn default() -> Self {
        Self {
            cli_name: DEFAULT_CLI_NAME.to_string(),
            interpreter: InterpreterCommand::default(),
            staging_path: PathBuf::from(DEFAULT_STAGING_FILE),
            max_run_duration: None,
        }
    }
}

impl ReplConfig {
    #[must_use]
    pub fn with_cli_name(mut self, name: impl Into<String>) -> Self {
        self.cli_name = name.into();
        self
    }

    #[must_use]
    pub fn with_interpreter(mut self, interpreter: InterpreterCommand) -> Self {
        self.interpreter = interpreter;
        self
    }

    #[must_use]
    pub fn with_staging_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.staging_path = path.into();
        self
    }

    #[must_use]
    pub fn with_max_run_duration(mut self, limit: Option<Duration>) -> Self {
        self.max_run_duration = limit;
        self
    }

    /// The prompt printed before each input.
    #[must_use]
    pub fn prompt(&self) -> String {
        format!("{}> ", self.cli_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = ReplConfig::default();
        assert_eq!(config.cli_name, "dreamberd");
        assert_eq!(config.staging_path, PathBuf::from("command.berd"));
        assert_eq!(config.interpreter.program, PathBuf::from("dreamberd"));
        assert!(config.interpreter.args.is_empty());
        assert_eq!(config.max_run_duration, None);
        assert_eq!(config.prompt(), "dreamberd> ");
    }

    #[test]
    fn builders_override() {
        let config = ReplConfig::default()
            .with_cli_name("berd")
            .with_staging_path("temp.txt")
            .with_interpreter(InterpreterCommand::new("node").arg("main.js"))
            .with_max_run_duration(Some(Duration::from_secs(2)));
        assert_eq!(config.prompt(), "berd> ");
        assert_eq!(config.staging_path, PathBuf::from("temp.txt"));
        assert_eq!(config.interpreter.args, vec!["main.js".to_string()]);
        assert_eq!(config.max_run_duration, Some(Duration::from_secs(2)));
    }
}
