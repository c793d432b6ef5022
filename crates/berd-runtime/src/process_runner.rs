#![forbid(unsafe_code)]

//! External interpreter invocation.
//!
//! A snippet is written verbatim to the staging file (truncating it), then
//! the interpreter runs as `<program> [args...] <staging-path>`. The child
//! inherits stdin/stdout/stderr, so its output reaches the terminal
//! unbuffered and in the order it was emitted.
//!
//! # Failure Modes
//!
//! | Failure | Result |
//! |---------|--------|
//! | Source file unreadable (`read`) | [`RunError::ReadSource`] |
//! | Staging file cannot be opened / written | [`RunError::StagingOpen`] / [`RunError::StagingWrite`] |
//! | Interpreter fails to start | [`RunError::Spawn`] |
//! | Non-zero exit | [`RunError::Failed`] |
//! | Wall time exceeds `max_run_duration` | child killed, [`RunError::TimedOut`] |
//! | Interrupt raised before or while running | child killed (or never started), [`RunOutcome::Interrupted`] |
//! | Child killed by the same Ctrl+C | [`RunOutcome::Interrupted`] |
//!
//! The terminal delivers Ctrl+C to the whole foreground process group, so
//! the child often dies of SIGINT before the interrupt flag is polled. A
//! failing exit is therefore classified as an interrupt when the status
//! says SIGINT, or when the flag is raised within [`INTERRUPT_GRACE`].

use std::fmt;
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use berd_core::terminal_session::InterruptHandle;

/// Default staging file, relative to the working directory.
pub const DEFAULT_STAGING_FILE: &str = "command.berd";

/// Default interpreter entry point.
pub const DEFAULT_INTERPRETER: &str = "dreamberd";

const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// How long a failed exit waits for a matching interrupt flag.
pub const INTERRUPT_GRACE: Duration = Duration::from_millis(50);

/// How the interpreter is launched. The staging path is always appended
/// as the final argument.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterpreterCommand {
    pub program: PathBuf,
    pub args: Vec<String>,
}

impl InterpreterCommand {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    /// Add a fixed argument placed before the staging path.
    #[must_use]
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }
}

impl Default for InterpreterCommand {
    fn default() -> Self {
        Self::new(DEFAULT_INTERPRETER)
    }
}

/// How a run ended when it did not fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    Completed,
    /// The user interrupted the child; the REPL should terminate.
    Interrupted,
}

/// Recoverable runner failures. Reported to the terminal, never fatal.
#[derive(Debug)]
pub enum RunError {
    ReadSource { path: PathBuf, source: io::Error },
    StagingOpen { path: PathBuf, source: io::Error },
    StagingWrite { path: PathBuf, source: io::Error },
    Spawn { program: PathBuf, source: io::Error },
    Wait(io::Error),
    Failed { status: ExitStatus },
    TimedOut { limit: Duration },
}

impl fmt::Display for RunError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ReadSource { path, source } => {
                write!(f, "cannot read {}: {source}", path.display())
            }
            Self::StagingOpen { path, source } => {
                write!(f, "cannot open staging file {}: {source}", path.display())
            }
            Self::StagingWrite { path, source } => {
                write!(f, "cannot write staging file {}: {source}", path.display())
            }
            Self::Spawn { program, source } => {
                write!(f, "cannot start interpreter {}: {source}", program.display())
            }
            Self::Wait(source) => write!(f, "lost track of interpreter process: {source}"),
            Self::Failed { .. } => write!(f, "interpreter exited with an error"),
            Self::TimedOut { limit } => {
                write!(f, "interpreter stopped after {} ms", limit.as_millis())
            }
        }
    }
}

impl std::error::Error for RunError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::ReadSource { source, .. }
            | Self::StagingOpen { source, .. }
            | Self::StagingWrite { source, .. }
            | Self::Spawn { source, .. }
            | Self::Wait(source) => Some(source),
            Self::Failed { .. } | Self::TimedOut { .. } => None,
        }
    }
}

/// Collaborator boundary between the dispatcher and the interpreter.
pub trait SnippetRunner {
    /// Run `text` through the interpreter.
    fn run_snippet(&mut self, text: &str) -> Result<RunOutcome, RunError>;

    /// Read `path` fully and run its contents.
    fn run_file(&mut self, path: &Path) -> Result<RunOutcome, RunError> {
        let contents = fs::read_to_string(path).map_err(|source| RunError::ReadSource {
            path: path.to_path_buf(),
            source,
        })?;
        self.run_snippet(&contents)
    }
}

/// Runs snippets through a real child process.
#[derive(Debug, Clone)]
pub struct ProcessRunner {
    interpreter: InterpreterCommand,
    staging_path: PathBuf,
    max_run_duration: Option<Duration>,
    interrupt: InterruptHandle,
}

impl ProcessRunner {
    pub fn new(interpreter: InterpreterCommand, staging_path: impl Into<PathBuf>) -> Self {
        Self {
            interpreter,
            staging_path: staging_path.into(),
            max_run_duration: None,
            interrupt: InterruptHandle::new(),
        }
    }

    /// Cap interpreter wall time.
    #[must_use]
    pub fn with_max_run_duration(mut self, limit: Option<Duration>) -> Self {
        self.max_run_duration = limit;
        self
    }

    /// Observe `interrupt` while a child runs.
    #[must_use]
    pub fn with_interrupt(mut self, interrupt: InterruptHandle) -> Self {
        self.interrupt = interrupt;
        self
    }

    #[must_use]
    pub fn staging_path(&self) -> &Path {
        &self.staging_path
    }

    #[must_use]
    pub fn interpreter(&self) -> &InterpreterCommand {
        &self.interpreter
    }

    /// Overwrite the staging file with exactly `text`.
    pub fn write_staging(&self, text: &str) -> Result<(), RunError> {
        let path = &self.staging_path;
        let mut file = File::create(path).map_err(|source| RunError::StagingOpen {
            path: path.clone(),
            source,
        })?;
        file.write_all(text.as_bytes())
            .and_then(|()| file.flush())
            .map_err(|source| RunError::StagingWrite {
                path: path.clone(),
                source,
            })
    }

    fn spawn(&self) -> Result<Child, RunError> {
        Command::new(&self.interpreter.program)
            .args(&self.interpreter.args)
            .arg(&self.staging_path)
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .spawn()
            .map_err(|source| RunError::Spawn {
                program: self.interpreter.program.clone(),
                source,
            })
    }

    fn wait(&self, child: &mut Child) -> Result<RunOutcome, RunError> {
        let started = Instant::now();
        loop {
            if let Some(status) = child.try_wait().map_err(RunError::Wait)? {
                tracing::debug!(?status, elapsed_ms = started.elapsed().as_millis() as u64, "interpreter exited");
                if status.success() {
                    return Ok(RunOutcome::Completed);
                }
                if interrupted_status(status) || self.interrupt_within(INTERRUPT_GRACE) {
                    tracing::info!(?status, "interpreter stopped by interrupt");
                    self.interrupt.clear();
                    return Ok(RunOutcome::Interrupted);
                }
                return Err(RunError::Failed { status });
            }
            if self.interrupt.take() {
                tracing::info!("interrupt received, stopping interpreter");
                terminate(child);
                return Ok(RunOutcome::Interrupted);
            }
            if let Some(limit) = self.max_run_duration
                && started.elapsed() >= limit
            {
                tracing::warn!(limit_ms = limit.as_millis() as u64, "interpreter exceeded max run duration");
                terminate(child);
                return Err(RunError::TimedOut { limit });
            }
            thread::sleep(POLL_INTERVAL);
        }
    }

    /// Wait up to `grace` for the interrupt flag, consuming it if raised.
    fn interrupt_within(&self, grace: Duration) -> bool {
        let deadline = Instant::now() + grace;
        loop {
            if self.interrupt.take() {
                return true;
            }
            if Instant::now() >= deadline {
                return false;
            }
            thread::sleep(POLL_INTERVAL);
        }
    }
}

impl SnippetRunner for ProcessRunner {
    fn run_snippet(&mut self, text: &str) -> Result<RunOutcome, RunError> {
        let _span = tracing::info_span!(
            "berd.run",
            program = %self.interpreter.program.display(),
            staging = %self.staging_path.display(),
            bytes = text.len()
        )
        .entered();

        self.write_staging(text)?;
        if self.interrupt.take() {
            tracing::info!("interrupt raised before interpreter start");
            return Ok(RunOutcome::Interrupted);
        }
        let mut child = self.spawn()?;
        self.wait(&mut child)
    }
}

#[cfg(unix)]
fn interrupted_status(status: ExitStatus) -> bool {
    use signal_hook::consts::signal::SIGINT;
    use std::os::unix::process::ExitStatusExt;

    status.signal() == Some(SIGINT) || status.code() == Some(128 + SIGINT)
}

#[cfg(not(unix))]
fn interrupted_status(_status: ExitStatus) -> bool {
    false
}

fn terminate(child: &mut Child) {
    let _ = child.kill();
    let _ = child.wait();
}
