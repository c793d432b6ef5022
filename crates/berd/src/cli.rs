#![forbid(unsafe_code)]

//! Command-line argument parsing for the REPL binary.
//!
//! Args are parsed by hand. Environment variables with the `BERD_` prefix
//! supply defaults; explicit flags override them.

use std::env;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use berd_runtime::{InterpreterCommand, ReplConfig};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub const HELP_TEXT: &str = "\
berd: interactive DreamBerd REPL

USAGE:
    berd [OPTIONS]

OPTIONS:
    --interpreter=PROG       Interpreter launched for run(...) and read(...)
                             (default: dreamberd)
    --interpreter-arg=ARG    Extra interpreter argument, placed before the
                             staging file path (repeatable)
    --staging-file=PATH      File snippets are written to (default: command.berd)
    --max-run-ms=N           Kill the interpreter after N milliseconds
                             (default: no limit)
    --prompt=NAME            Name shown in the prompt and help banner
                             (default: dreamberd)
    --log-file=PATH          Write diagnostics to PATH (default: off)
    --help, -h               Show this help message
    --version, -V            Show version

KEYBINDINGS:
    Enter           Submit the current input
    Ctrl+Space      Continue input on a new line
    Backspace       Delete the last character
    Ctrl+L          Clear the screen and redraw the input
    Ctrl+C          Quit

ENVIRONMENT VARIABLES:
    BERD_INTERPRETER     Override --interpreter
    BERD_STAGING_FILE    Override --staging-file
    BERD_MAX_RUN_MS      Override --max-run-ms
    BERD_PROMPT          Override --prompt
    BERD_LOG_FILE        Override --log-file
    BERD_LOG             Log filter directive (default: info)";

/// Parsed command-line options.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Opts {
    pub config: ReplConfig,
    /// Diagnostics destination; logging is off when unset.
    pub log_file: Option<PathBuf>,
}

/// What the caller should do after parsing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Parsed {
    Run(Opts),
    Help,
    Version,
}

/// An argument that could not be parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CliError {
    InvalidValue { flag: &'static str, value: String },
    Unknown(String),
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidValue { flag, value } => write!(f, "Invalid {flag} value: {value}"),
            Self::Unknown(arg) => write!(f, "Unknown argument: {arg}"),
        }
    }
}

impl std::error::Error for CliError {}

impl Opts {
    /// Parse the process arguments and environment.
    pub fn parse() -> Result<Parsed, CliError> {
        Self::parse_from(env::args().skip(1), |key| env::var(key).ok())
    }

    /// Parse `args` (program name excluded) with `var` as the environment.
    pub fn parse_from<I, F>(args: I, var: F) -> Result<Parsed, CliError>
    where
        I: IntoIterator<Item = String>,
        F: Fn(&str) -> Option<String>,
    {
        let mut opts = Self::default();
        let mut interpreter = InterpreterCommand::default();

        // Environment defaults first
        if let Some(val) = var("BERD_INTERPRETER") {
            interpreter.program = PathBuf::from(val);
        }
        if let Some(val) = var("BERD_STAGING_FILE") {
            opts.config.staging_path = PathBuf::from(val);
        }
        if let Some(val) = var("BERD_MAX_RUN_MS")
            && let Ok(ms) = val.parse()
        {
            opts.config.max_run_duration = Some(Duration::from_millis(ms));
        }
        if let Some(val) = var("BERD_PROMPT") {
            opts.config.cli_name = val;
        }
        if let Some(val) = var("BERD_LOG_FILE") {
            opts.log_file = Some(PathBuf::from(val));
        }

        // Command-line args override env vars
        for arg in args {
            match arg.as_str() {
                "--help" | "-h" => return Ok(Parsed::Help),
                "--version" | "-V" => return Ok(Parsed::Version),
                other => {
                    if let Some(val) = other.strip_prefix("--interpreter=") {
                        interpreter.program = PathBuf::from(val);
                    } else if let Some(val) = other.strip_prefix("--interpreter-arg=") {
                        interpreter.args.push(val.to_string());
                    } else if let Some(val) = other.strip_prefix("--staging-file=") {
                        opts.config.staging_path = PathBuf::from(val);
                    } else if let Some(val) = other.strip_prefix("--max-run-ms=") {
                        let ms = val.parse().map_err(|_| CliError::InvalidValue {
                            flag: "--max-run-ms",
                            value: val.to_string(),
                        })?;
                        opts.config.max_run_duration = Some(Duration::from_millis(ms));
                    } else if let Some(val) = other.strip_prefix("--prompt=") {
                        if val.is_empty() {
                            return Err(CliError::InvalidValue {
                                flag: "--prompt",
                                value: String::new(),
                            });
                        }
                        opts.config.cli_name = val.to_string();
                    } else if let Some(val) = other.strip_prefix("--log-file=") {
                        opts.log_file = Some(PathBuf::from(val));
                    } else {
                        return Err(CliError::Unknown(other.to_string()));
                    }
                }
            }
        }

        opts.config.interpreter = interpreter;
        Ok(Parsed::Run(opts))
    }
}
