#![forbid(unsafe_code)]

//! The read, edit, render, dispatch cycle.
//!
//! [`Program`] pulls events from an [`EventSource`], decodes them with
//! [`ReplKey::from_key`], and pairs each [`EditBuffer`] mutation with the
//! matching [`Renderer`] call. Enter drains the buffer into the classifier
//! and hands the result to the [`Dispatcher`].
//!
//! # State machine
//!
//! ```text
//!   Idle --char/continuation--> Editing --Enter--> Dispatching --> Idle
//!     \                                                \
//!      `--------- Interrupt / exit / end of input -----`--> Terminated
//! ```
//!
//! Terminal release is not handled here: the [`TerminalSession`] that backs
//! the event source restores the terminal on drop, so every exit path out
//! of [`Program::run`] releases it.
//!
//! [`TerminalSession`]: berd_core::terminal_session::TerminalSession

use std::io::{self, Write};

use berd_core::event::Event;
use berd_core::keybinding::ReplKey;
use berd_core::terminal_session::EventSource;

use crate::command::classify;
use crate::config::ReplConfig;
use crate::dispatcher::{Dispatcher, ExitReason, Flow};
use crate::edit_buffer::EditBuffer;
use crate::process_runner::SnippetRunner;
use crate::renderer::Renderer;

/// Where the loop is in its cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoopState {
    /// Prompt shown, buffer empty.
    #[default]
    Idle,
    /// Buffer holds unsent input.
    Editing,
    /// A command is running.
    Dispatching,
    /// The loop has stopped; further events are ignored.
    Terminated,
}

/// The line editor loop.
#[derive(Debug)]
pub struct Program<S, W: Write, R> {
    events: S,
    renderer: Renderer<W>,
    dispatcher: Dispatcher<R>,
    buffer: EditBuffer,
    state: LoopState,
}

impl<S: EventSource, W: Write, R: SnippetRunner> Program<S, W, R> {
    pub fn new(config: &ReplConfig, events: S, renderer: Renderer<W>, runner: R) -> Self {
        Self {
            events,
            renderer,
            dispatcher: Dispatcher::new(runner, config.cli_name.clone()),
            buffer: EditBuffer::new(),
            state: LoopState::Idle,
        }
    }

    #[must_use]
    pub fn state(&self) -> LoopState {
        self.state
    }

    #[must_use]
    pub fn buffer(&self) -> &EditBuffer {
        &self.buffer
    }

    pub fn renderer(&self) -> &Renderer<W> {
        &self.renderer
    }

    pub fn events(&self) -> &S {
        &self.events
    }

    pub fn runner(&self) -> &R {
        self.dispatcher.runner()
    }

    pub fn into_parts(self) -> (S, Renderer<W>, R) {
        let Self {
            events,
            renderer,
            dispatcher,
            ..
        } = self;
        let runner = dispatcher.into_runner();
        (events, renderer, runner)
    }

    /// Report a platform fallback, pick up the terminal width, and print
    /// the first prompt.
    pub fn start(&mut self) -> io::Result<()> {
        if let Some(err) = self.renderer.unsupported_platform() {
            let message = format!("warning: {err}; screen redraws will be approximate");
            self.renderer.report(message)?;
        }
        self.renderer.set_width(self.events.size().map(|(cols, _)| cols));
        self.state = LoopState::Idle;
        self.renderer.prompt()
    }

    /// Run until `exit`, an interrupt, or the end of input.
    pub fn run(&mut self) -> io::Result<ExitReason> {
        let _span = tracing::info_span!("berd.loop").entered();
        self.start()?;
        loop {
            let Some(event) = self.events.next_event()? else {
                tracing::debug!("event source exhausted");
                self.state = LoopState::Terminated;
                return Ok(ExitReason::EndOfInput);
            };
            if let Flow::Exit(reason) = self.step(event)? {
                tracing::info!(?reason, "loop finished");
                return Ok(reason);
            }
        }
    }

    /// Handle one event.
    pub fn step(&mut self, event: Event) -> io::Result<Flow> {
        if self.state == LoopState::Terminated {
            return Ok(Flow::Exit(ExitReason::EndOfInput));
        }

        let key = match event {
            Event::Resize { width, .. } => {
                self.renderer.set_width(Some(width));
                return Ok(Flow::Continue);
            }
            Event::Key(key) => key,
        };

        match ReplKey::from_key(&key) {
            ReplKey::Character(ch) => {
                self.buffer.append(ch);
                self.renderer.echo(ch)?;
            }
            ReplKey::ExplicitContinuation => {
                self.buffer.append_continuation();
                self.renderer.new_line()?;
            }
            ReplKey::Backspace => {
                if let Some(removed) = self.buffer.backspace() {
                    self.renderer.erase_last(removed, &self.buffer)?;
                }
            }
            ReplKey::RedrawRequest => self.renderer.clear(&self.buffer)?,
            ReplKey::Interrupt => {
                self.renderer.new_line()?;
                self.state = LoopState::Terminated;
                return Ok(Flow::Exit(ExitReason::Interrupted));
            }
            ReplKey::Enter => return self.submit(),
            ReplKey::Other => {}
        }

        self.state = if self.buffer.is_empty() {
            LoopState::Idle
        } else {
            LoopState::Editing
        };
        Ok(Flow::Continue)
    }

    fn submit(&mut self) -> io::Result<Flow> {
        self.renderer.new_line()?;
        let text = self.buffer.drain();
        let command = classify(&text);
        tracing::debug!(?command, "submitted");

        self.state = LoopState::Dispatching;
        let flow = self
            .dispatcher
            .dispatch(command, &mut self.renderer, &mut self.events)?;

        match flow {
            Flow::Continue => {
                self.state = LoopState::Idle;
                self.renderer.prompt()?;
            }
            Flow::Exit(_) => self.state = LoopState::Terminated,
        }
        Ok(flow)
    }
}
