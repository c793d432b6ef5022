#![forbid(unsafe_code)]

//! berd binary entry point.

mod cli;

use std::fs::File;
use std::io;
use std::path::Path;
use std::process;
use std::sync::Mutex;

use berd_core::{PlatformTable, TerminalSession};
use berd_runtime::{ExitReason, ProcessRunner, Program, ReplConfig, Renderer};
use tracing_subscriber::EnvFilter;

use crate::cli::{HELP_TEXT, Opts, Parsed, VERSION};

const EXIT_USAGE: i32 = 1;
const EXIT_TERMINAL: i32 = 2;

fn main() {
    let opts = match Opts::parse() {
        Ok(Parsed::Run(opts)) => opts,
        Ok(Parsed::Help) => {
            println!("{HELP_TEXT}");
            return;
        }
        Ok(Parsed::Version) => {
            println!("berd {VERSION}");
            return;
        }
        Err(err) => {
            eprintln!("{err}");
            eprintln!("Run with --help for usage information.");
            process::exit(EXIT_USAGE);
        }
    };

    if let Some(path) = &opts.log_file
        && let Err(err) = init_logging(path)
    {
        eprintln!("Failed to open log file {}: {err}", path.display());
        process::exit(EXIT_USAGE);
    }

    process::exit(run(&opts.config));
}

/// Route diagnostics to `path`. Never stderr: it shares the raw-mode screen.
fn init_logging(path: &Path) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let file = File::options().create(true).append(true).open(path)?;
    let filter = EnvFilter::try_from_env("BERD_LOG").unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_target(false)
        .try_init()
}

/// Run the REPL and return the process exit code. The terminal is
/// restored before this returns.
fn run(config: &ReplConfig) -> i32 {
    let session = match TerminalSession::new() {
        Ok(session) => session,
        Err(err) => {
            tracing::error!(error = %err, "terminal initialization failed");
            eprintln!("Failed to initialize terminal: {err}");
            return EXIT_TERMINAL;
        }
    };

    let runner = ProcessRunner::new(config.interpreter.clone(), config.staging_path.clone())
        .with_max_run_duration(config.max_run_duration)
        .with_interrupt(session.interrupt_handle());
    let renderer = Renderer::new(io::stdout(), config.prompt(), PlatformTable::builtin().current());

    tracing::info!(
        interpreter = %config.interpreter.program.display(),
        staging = %config.staging_path.display(),
        "starting repl"
    );
    let mut program = Program::new(config, session, renderer, runner);
    let result = program.run();
    // Drops the session, which leaves raw mode before anything is printed.
    drop(program);

    match result {
        Ok(ExitReason::Command | ExitReason::Interrupted | ExitReason::EndOfInput) => 0,
        Err(err) => {
            tracing::error!(error = %err, "terminal I/O failed");
            eprintln!("Terminal I/O error: {err}");
            EXIT_TERMINAL
        }
    }
}
