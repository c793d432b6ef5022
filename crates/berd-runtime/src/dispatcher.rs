#![forbid(unsafe_code)]

//! Side effects for classified commands.
//!
//! Every recoverable failure (missing file, bad directory, interpreter
//! error) is printed and the loop continues. Only errors writing to the
//! terminal itself propagate.

use std::env;
use std::fs;
use std::io::{self, Write};
use std::path::Path;

use berd_core::terminal_session::EventSource;

use crate::command::{BuiltIn, Command};
use crate::process_runner::{RunError, RunOutcome, SnippetRunner};
use crate::renderer::Renderer;

/// Why the loop stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitReason {
    /// The `exit` command.
    Command,
    /// Ctrl+C, either at the prompt or while a child process ran.
    Interrupted,
    /// The event source ran dry.
    EndOfInput,
}

/// What the loop does after handling one event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Exit(ExitReason),
}

/// Help text listing the command surface.
#[must_use]
pub fn help_text(cli_name: &str) -> String {
    format!(
        "Welcome to {cli_name}! These are the available commands: \n\
         help             - Show available commands\n\
         clear            - Clear the terminal screen\n\
         exit             - Closes the terminal\n\
         ls               - List the files in the current directory\n\
         pwd              - Print the current directory\n\
         cd <path>        - Change the current directory\n\
         read(file_path)  - Read the file at file_path for interpretation\n\
         run(snippet)     - Run snippet through the interpreter"
    )
}

/// Performs the side effect for each [`Command`].
#[derive(Debug)]
pub struct Dispatcher<R> {
    runner: R,
    cli_name: String,
}

impl<R: SnippetRunner> Dispatcher<R> {
    pub fn new(runner: R, cli_name: impl Into<String>) -> Self {
        Self {
            runner,
            cli_name: cli_name.into(),
        }
    }

    pub fn runner(&self) -> &R {
        &self.runner
    }

    pub fn into_runner(self) -> R {
        self.runner
    }

    /// Run `command`, writing any output through `renderer`.
    ///
    /// `events` is suspended while the interpreter owns the terminal.
    pub fn dispatch<W: Write, S: EventSource>(
        &mut self,
        command: Command,
        renderer: &mut Renderer<W>,
        events: &mut S,
    ) -> io::Result<Flow> {
        let _span = tracing::debug_span!("berd.dispatch", ?command).entered();
        match command {
            Command::BuiltIn(BuiltIn::Help) => renderer.print_line(&help_text(&self.cli_name))?,
            Command::BuiltIn(BuiltIn::Clear) => renderer.clear_screen()?,
            Command::BuiltIn(BuiltIn::Ls) => list_directory(renderer)?,
            Command::BuiltIn(BuiltIn::Pwd) => match env::current_dir() {
                Ok(dir) => renderer.print_line(&dir.display().to_string())?,
                Err(err) => renderer.report(format_args!("pwd: {err}"))?,
            },
            Command::ChangeDir(path) => change_dir(&path, renderer)?,
            Command::Exit => return Ok(Flow::Exit(ExitReason::Command)),
            Command::Read(path) => {
                return self.run_child(renderer, events, |runner| runner.run_file(Path::new(&path)));
            }
            Command::Run(snippet) => {
                return self.run_child(renderer, events, |runner| runner.run_snippet(&snippet));
            }
            Command::Unknown(text) if text.is_empty() => {}
            Command::Unknown(text) => renderer.print_line(&format!("{text} : command not found"))?,
        }
        Ok(Flow::Continue)
    }

    fn run_child<W: Write, S: EventSource>(
        &mut self,
        renderer: &mut Renderer<W>,
        events: &mut S,
        run: impl FnOnce(&mut R) -> Result<RunOutcome, RunError>,
    ) -> io::Result<Flow> {
        events.suspend()?;
        let result = run(&mut self.runner);
        events.resume()?;

        match result {
            Ok(RunOutcome::Completed) => Ok(Flow::Continue),
            Ok(RunOutcome::Interrupted) => Ok(Flow::Exit(ExitReason::Interrupted)),
            Err(err) => {
                tracing::warn!(error = %err, "interpreter run failed");
                renderer.report(format_args!("Error: {err}"))?;
                Ok(Flow::Continue)
            }
        }
    }
}

fn list_directory<W: Write>(renderer: &mut Renderer<W>) -> io::Result<()> {
    let entries = match fs::read_dir(".") {
        Ok(entries) => entries,
        Err(err) => return renderer.report(format_args!("ls: {err}")),
    };
    let mut names: Vec<String> = entries
        .filter_map(Result::ok)
        .map(|entry| {
            let mut name = entry.file_name().to_string_lossy().into_owned();
            if entry.file_type().is_ok_and(|t| t.is_dir()) {
                name.push('/');
            }
            name
        })
        .collect();
    names.sort();
    if names.is_empty() {
        return Ok(());
    }
    renderer.print_line(&names.join("\n"))
}

fn change_dir<W: Write>(path: &str, renderer: &mut Renderer<W>) -> io::Result<()> {
    if path.is_empty() {
        return renderer.report("cd: missing directory operand");
    }
    match env::set_current_dir(path) {
        Ok(()) => {
            tracing::debug!(path, "working directory changed");
            Ok(())
        }
        Err(err) => renderer.report(format_args!("cd: {path}: {err}")),
    }
}
