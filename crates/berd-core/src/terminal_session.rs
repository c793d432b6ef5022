#![forbid(unsafe_code)]

//! Terminal session lifecycle guard.
//!
//! [`TerminalSession`] owns raw-mode entry/exit for the whole REPL run and
//! restores the terminal on drop, including during panic unwinding.
//!
//! # Lifecycle Guarantees
//!
//! 1. **Raw mode is tracked** - `raw_enabled` mirrors the terminal state,
//!    including while a child process runs with raw mode suspended.
//! 2. **Drop restores previous state** - cursor shown, raw mode disabled,
//!    stdout flushed.
//! 3. **Panic safety** - a panic hook performs the same best-effort cleanup
//!    before the default hook prints the panic message.
//! 4. **Signals** - on unix a guard thread watches SIGINT, SIGTERM and
//!    SIGWINCH. SIGINT while a child process runs (session suspended) only
//!    raises the [`InterruptHandle`]; the runner observes it and kills the
//!    child. SIGINT at any other time cleans up and exits with status 0.
//!    SIGTERM cleans up and exits with `128 + SIGTERM`.
//!
//! # Usage
//!
//! ```no_run
//! use berd_core::terminal_session::{EventSource, TerminalSession};
//!
//! let mut session = TerminalSession::new()?;
//! while let Some(event) = session.next_event()? {
//!     // handle event...
//! #   let _ = event;
//! }
//! // Terminal restored when `session` is dropped.
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use std::collections::VecDeque;
use std::fmt;
use std::io::{self, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};

use crossterm::tty::IsTty;

use crate::event::{Event, KeyCode, KeyEvent};

#[cfg(unix)]
use signal_hook::consts::signal::{SIGINT, SIGTERM, SIGWINCH};
#[cfg(unix)]
use signal_hook::iterator::Signals;

// ---------------------------------------------------------------------------
// EventSource
// ---------------------------------------------------------------------------

/// A blocking source of canonical input events.
pub trait EventSource {
    /// Block until the next event is available.
    ///
    /// Returns `Ok(None)` once the source is exhausted.
    fn next_event(&mut self) -> io::Result<Option<Event>>;

    /// Hand the terminal to a child process (leave raw mode).
    fn suspend(&mut self) -> io::Result<()> {
        Ok(())
    }

    /// Take the terminal back after [`EventSource::suspend`].
    fn resume(&mut self) -> io::Result<()> {
        Ok(())
    }

    /// Terminal size as (columns, rows), when known.
    fn size(&self) -> Option<(u16, u16)> {
        None
    }
}

// ---------------------------------------------------------------------------
// InterruptHandle
// ---------------------------------------------------------------------------

/// Shared flag raised when the user interrupts a running child process.
#[derive(Debug, Clone, Default)]
pub struct InterruptHandle {
    flag: Arc<AtomicBool>,
}

impl InterruptHandle {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn trigger(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    #[must_use]
    pub fn is_triggered(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }

    pub fn clear(&self) {
        self.flag.store(false, Ordering::SeqCst);
    }

    /// Consume a pending interrupt, lowering the flag.
    #[must_use]
    pub fn take(&self) -> bool {
        self.flag.swap(false, Ordering::SeqCst)
    }
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Terminal acquisition failure. Always fatal for the REPL.
#[derive(Debug)]
pub enum TerminalError {
    /// Standard input is not attached to a terminal.
    NotATerminal,
    /// Raw mode could not be entered.
    RawMode(io::Error),
    /// The signal guard could not be installed.
    Signals(io::Error),
}

impl fmt::Display for TerminalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotATerminal => write!(f, "standard input is not a terminal"),
            Self::RawMode(err) => write!(f, "failed to enter raw mode: {err}"),
            Self::Signals(err) => write!(f, "failed to install signal handlers: {err}"),
        }
    }
}

impl std::error::Error for TerminalError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::NotATerminal => None,
            Self::RawMode(err) | Self::Signals(err) => Some(err),
        }
    }
}

// ---------------------------------------------------------------------------
// TerminalSession
// ---------------------------------------------------------------------------

/// A terminal session that manages raw mode and cleanup.
///
/// Only one session should exist at a time.
#[derive(Debug)]
pub struct TerminalSession {
    raw_enabled: bool,
    suspended: Arc<AtomicBool>,
    interrupt: InterruptHandle,
    #[cfg(unix)]
    signal_guard: Option<SignalGuard>,
}

impl TerminalSession {
    /// Enter raw mode and install the signal guard.
    ///
    /// # Errors
    ///
    /// Fails if stdin is not a terminal, raw mode cannot be enabled, or the
    /// signal guard cannot be installed. Raw mode is released again before
    /// the error is returned.
    pub fn new() -> Result<Self, TerminalError> {
        if !io::stdin().is_tty() {
            return Err(TerminalError::NotATerminal);
        }

        install_panic_hook();

        crossterm::terminal::enable_raw_mode().map_err(TerminalError::RawMode)?;
        tracing::info!("terminal raw mode enabled");

        let suspended = Arc::new(AtomicBool::new(false));
        let interrupt = InterruptHandle::new();

        // From here on, Drop releases raw mode on every error path.
        #[cfg_attr(not(unix), allow(unused_mut))]
        let mut session = Self {
            raw_enabled: true,
            suspended: Arc::clone(&suspended),
            interrupt: interrupt.clone(),
            #[cfg(unix)]
            signal_guard: None,
        };

        #[cfg(unix)]
        {
            session.signal_guard =
                Some(SignalGuard::new(suspended, interrupt).map_err(TerminalError::Signals)?);
        }

        Ok(session)
    }

    /// Handle raised when SIGINT arrives while a child process runs.
    #[must_use]
    pub fn interrupt_handle(&self) -> InterruptHandle {
        self.interrupt.clone()
    }

    fn cleanup(&mut self) {
        #[cfg(unix)]
        let _ = self.signal_guard.take();

        let mut stdout = io::stdout();
        let _ = crossterm::execute!(stdout, crossterm::cursor::Show);

        if self.raw_enabled {
            let _ = crossterm::terminal::disable_raw_mode();
            self.raw_enabled = false;
            tracing::info!("terminal raw mode disabled");
        }

        let _ = stdout.flush();
    }
}

impl EventSource for TerminalSession {
    fn next_event(&mut self) -> io::Result<Option<Event>> {
        loop {
            let raw = crossterm::event::read()?;
            if let Some(event) = Event::from_crossterm(raw) {
                return Ok(Some(event));
            }
        }
    }

    fn suspend(&mut self) -> io::Result<()> {
        if self.raw_enabled {
            crossterm::terminal::disable_raw_mode()?;
            self.raw_enabled = false;
        }
        // A stale interrupt must not cancel the next child; one raised from
        // here on must survive until the runner polls it.
        self.interrupt.clear();
        self.suspended.store(true, Ordering::SeqCst);
        tracing::debug!("terminal suspended for child process");
        Ok(())
    }

    fn resume(&mut self) -> io::Result<()> {
        if !self.raw_enabled {
            crossterm::terminal::enable_raw_mode()?;
            self.raw_enabled = true;
        }
        self.suspended.store(false, Ordering::SeqCst);
        tracing::debug!("terminal resumed");
        Ok(())
    }

    fn size(&self) -> Option<(u16, u16)> {
        crossterm::terminal::size().ok()
    }
}

impl Drop for TerminalSession {
    fn drop(&mut self) {
        self.cleanup();
    }
}

fn install_panic_hook() {
    static HOOK: OnceLock<()> = OnceLock::new();
    HOOK.get_or_init(|| {
        let previous = std::panic::take_hook();
        std::panic::set_hook(Box::new(move |info| {
            best_effort_cleanup();
            previous(info);
        }));
    });
}

fn best_effort_cleanup() {
    let mut stdout = io::stdout();
    let _ = crossterm::execute!(stdout, crossterm::cursor::Show);
    let _ = crossterm::terminal::disable_raw_mode();
    let _ = stdout.flush();
}

#[cfg(unix)]
#[derive(Debug)]
struct SignalGuard {
    handle: signal_hook::iterator::Handle,
    thread: Option<std::thread::JoinHandle<()>>,
}

#[cfg(unix)]
impl SignalGuard {
    fn new(suspended: Arc<AtomicBool>, interrupt: InterruptHandle) -> io::Result<Self> {
        let mut signals = Signals::new([SIGINT, SIGTERM, SIGWINCH]).map_err(io::Error::other)?;
        let handle = signals.handle();
        let thread = std::thread::spawn(move || {
            for signal in signals.forever() {
                match signal {
                    SIGWINCH => {
                        tracing::debug!("SIGWINCH received");
                    }
                    SIGINT if suspended.load(Ordering::SeqCst) => {
                        tracing::info!("SIGINT received while child process runs");
                        interrupt.trigger();
                    }
                    SIGINT => {
                        tracing::info!("SIGINT received, cleaning up");
                        best_effort_cleanup();
                        std::process::exit(0);
                    }
                    SIGTERM => {
                        tracing::warn!("termination signal received, cleaning up");
                        best_effort_cleanup();
                        std::process::exit(128 + signal);
                    }
                    _ => {}
                }
            }
        });
        Ok(Self {
            handle,
            thread: Some(thread),
        })
    }
}

#[cfg(unix)]
impl Drop for SignalGuard {
    fn drop(&mut self) {
        self.handle.close();
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}

// ---------------------------------------------------------------------------
// ScriptedEvents
// ---------------------------------------------------------------------------

/// In-memory event source for tests and replays.
///
/// Events are returned in insertion order; the source reports exhaustion
/// once they run out.
#[derive(Debug, Clone, Default)]
pub struct ScriptedEvents {
    queue: VecDeque<Event>,
    suspensions: usize,
    suspended: bool,
    size: Option<(u16, u16)>,
}

impl ScriptedEvents {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one key press per character of `text`.
    #[must_use]
    pub fn typed(mut self, text: &str) -> Self {
        self.queue
            .extend(text.chars().map(|c| Event::key(KeyCode::Char(c))));
        self
    }

    /// Append a single key press.
    #[must_use]
    pub fn key(mut self, code: KeyCode) -> Self {
        self.queue.push_back(Event::key(code));
        self
    }

    /// Append a single key press with Ctrl held.
    #[must_use]
    pub fn ctrl(mut self, c: char) -> Self {
        self.queue.push_back(Event::ctrl(KeyCode::Char(c)));
        self
    }

    /// Append an arbitrary event.
    #[must_use]
    pub fn event(mut self, event: Event) -> Self {
        self.queue.push_back(event);
        self
    }

    /// Append a full line followed by Enter.
    #[must_use]
    pub fn line(self, text: &str) -> Self {
        self.typed(text).key(KeyCode::Enter)
    }

    /// Report a fixed terminal size.
    #[must_use]
    pub fn with_size(mut self, cols: u16, rows: u16) -> Self {
        self.size = Some((cols, rows));
        self
    }

    /// Number of times the source was suspended for a child process.
    #[must_use]
    pub fn suspensions(&self) -> usize {
        self.suspensions
    }

    /// Whether the source is currently suspended.
    #[must_use]
    pub fn is_suspended(&self) -> bool {
        self.suspended
    }

    /// Events not yet consumed.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.queue.len()
    }
}

impl Extend<KeyEvent> for ScriptedEvents {
    fn extend<T: IntoIterator<Item = KeyEvent>>(&mut self, iter: T) {
        self.queue.extend(iter.into_iter().map(Event::Key));
    }
}

impl EventSource for ScriptedEvents {
    fn next_event(&mut self) -> io::Result<Option<Event>> {
        Ok(self.queue.pop_front())
    }

    fn suspend(&mut self) -> io::Result<()> {
        self.suspensions += 1;
        self.suspended = true;
        Ok(())
    }

    fn resume(&mut self) -> io::Result<()> {
        self.suspended = false;
        Ok(())
    }

    fn size(&self) -> Option<(u16, u16)> {
        self.size
    }
}
