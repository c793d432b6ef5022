//! End-to-end scenarios driving [`Program::run`] with scripted key events.
//!
//! Output is captured as raw bytes, so assertions see exactly what a
//! raw-mode terminal would receive.

use std::cell::RefCell;
use std::rc::Rc;

use berd_core::event::KeyCode;
use berd_core::platform::platform_handler;
use berd_core::terminal_session::ScriptedEvents;
use berd_runtime::{
    ExitReason, Program, ReplConfig, Renderer, RunError, RunOutcome, SnippetRunner, help_text,
};

/// Records snippets and replies with a fixed outcome.
#[derive(Debug, Clone, Default)]
struct Recording {
    seen: Rc<RefCell<Vec<String>>>,
    outcome: Option<RunOutcome>,
}

impl SnippetRunner for Recording {
    fn run_snippet(&mut self, text: &str) -> Result<RunOutcome, RunError> {
        self.seen.borrow_mut().push(text.to_string());
        Ok(self.outcome.unwrap_or(RunOutcome::Completed))
    }
}

fn run_script<R: SnippetRunner>(events: ScriptedEvents, runner: R) -> (ExitReason, String, ScriptedEvents) {
    let config = ReplConfig::default();
    let renderer = Renderer::new(Vec::new(), config.prompt(), platform_handler("linux"));
    let mut program = Program::new(&config, events, renderer, runner);
    let reason = program.run().expect("scripted run");
    let (events, renderer, _) = program.into_parts();
    let output = String::from_utf8(renderer.into_inner()).expect("utf-8 output");
    (reason, output, events)
}

#[test]
fn help_then_exit() {
    let events = ScriptedEvents::new().line("help").line("exit");
    let (reason, output, _) = run_script(events, Recording::default());
    assert_eq!(reason, ExitReason::Command);
    let expected_help = help_text("dreamberd").replace('\n', "\r\n");
    assert_eq!(
        output,
        format!("dreamberd> help\r\n{expected_help}\r\ndreamberd> exit\r\n")
    );
}

#[test]
fn unknown_command_reports_and_reprompts() {
    let events = ScriptedEvents::new().line("foobar");
    let (reason, output, _) = run_script(events, Recording::default());
    assert_eq!(reason, ExitReason::EndOfInput);
    assert_eq!(
        output,
        "dreamberd> foobar\r\nfoobar : command not found\r\ndreamberd> "
    );
}

#[test]
fn empty_line_just_reprompts() {
    let events = ScriptedEvents::new().key(KeyCode::Enter).typed("   ").key(KeyCode::Enter);
    let (_, output, _) = run_script(events, Recording::default());
    assert_eq!(output, "dreamberd> \r\ndreamberd>    \r\ndreamberd> ");
}

#[test]
fn run_hands_snippet_to_runner() {
    let runner = Recording::default();
    let seen = Rc::clone(&runner.seen);
    let events = ScriptedEvents::new().line("run(1+1)");
    let (reason, output, events) = run_script(events, runner);
    assert_eq!(reason, ExitReason::EndOfInput);
    assert_eq!(*seen.borrow(), vec!["1+1".to_string()]);
    assert_eq!(events.suspensions(), 1);
    assert!(!events.is_suspended());
    assert_eq!(output, "dreamberd> run(1+1)\r\ndreamberd> ");
}

#[test]
fn multi_line_snippet_keeps_newline() {
    let runner = Recording::default();
    let seen = Rc::clone(&runner.seen);
    let events = ScriptedEvents::new()
        .typed("run(const x = 1!")
        .ctrl(' ')
        .typed("print(x)!)")
        .key(KeyCode::Enter);
    let (_, output, _) = run_script(events, runner);
    assert_eq!(*seen.borrow(), vec!["const x = 1!\nprint(x)!".to_string()]);
    assert!(output.starts_with("dreamberd> run(const x = 1!\r\nprint(x)!)\r\n"));
}

#[test]
fn backspace_edits_before_submit() {
    let runner = Recording::default();
    let seen = Rc::clone(&runner.seen);
    let events = ScriptedEvents::new()
        .typed("run(12")
        .key(KeyCode::Backspace)
        .typed("3)")
        .key(KeyCode::Enter);
    run_script(events, runner);
    assert_eq!(*seen.borrow(), vec!["13".to_string()]);
}

#[test]
fn interrupt_during_run_ends_without_prompt() {
    let runner = Recording {
        outcome: Some(RunOutcome::Interrupted),
        ..Recording::default()
    };
    let events = ScriptedEvents::new().line("run(loop)").line("help");
    let (reason, output, events) = run_script(events, runner);
    assert_eq!(reason, ExitReason::Interrupted);
    assert_eq!(output, "dreamberd> run(loop)\r\n");
    assert!(!events.is_suspended());
    assert_eq!(events.remaining(), 5);
}

#[test]
fn ctrl_c_at_prompt_interrupts() {
    let events = ScriptedEvents::new().typed("hel").ctrl('c').line("p");
    let (reason, output, _) = run_script(events, Recording::default());
    assert_eq!(reason, ExitReason::Interrupted);
    assert_eq!(output, "dreamberd> hel\r\n");
}

#[test]
fn ctrl_l_redraws_pending_input() {
    let events = ScriptedEvents::new().typed("ab").ctrl('l');
    let (_, output, _) = run_script(events, Recording::default());
    assert_eq!(output, "dreamberd> ab\x1b[2J\x1b[3J\x1b[1;1Hdreamberd> ab");
}

#[test]
fn pwd_prints_working_directory() {
    let cwd = std::env::current_dir().unwrap();
    let events = ScriptedEvents::new().line("PWD");
    let (_, output, _) = run_script(events, Recording::default());
    assert_eq!(
        output,
        format!("dreamberd> PWD\r\n{}\r\ndreamberd> ", cwd.display())
    );
}

#[test]
fn read_of_missing_file_reports_error() {
    let events = ScriptedEvents::new().line("read(./no/such/file.berd)");
    let (reason, output, events) = run_script(events, Recording::default());
    assert_eq!(reason, ExitReason::EndOfInput);
    assert!(output.contains("\r\nError: cannot read ./no/such/file.berd: "));
    assert!(output.ends_with("dreamberd> "));
    assert_eq!(events.suspensions(), 1);
}

#[cfg(unix)]
mod with_interpreter {
    use super::*;
    use std::thread;
    use std::time::{Duration, Instant};

    use berd_core::terminal_session::InterruptHandle;
    use berd_runtime::{InterpreterCommand, ProcessRunner};

    #[test]
    fn run_stages_snippet_for_interpreter() {
        let dir = tempfile::tempdir().unwrap();
        let staging = dir.path().join("command.berd");
        let runner = ProcessRunner::new(InterpreterCommand::new("true"), &staging);
        let events = ScriptedEvents::new().line("run(1+1)");
        let (reason, _, events) = run_script(events, runner);
        assert_eq!(reason, ExitReason::EndOfInput);
        assert_eq!(std::fs::read_to_string(&staging).unwrap(), "1+1");
        assert_eq!(events.suspensions(), 1);
    }

    #[test]
    fn read_runs_file_contents() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("hello.berd");
        std::fs::write(&source, "print(\"hi\")!").unwrap();
        let staging = dir.path().join("command.berd");
        let runner = ProcessRunner::new(InterpreterCommand::new("true"), &staging);
        let events = ScriptedEvents::new().line(&format!("read({})", source.display()));
        run_script(events, runner);
        assert_eq!(std::fs::read_to_string(&staging).unwrap(), "print(\"hi\")!");
    }

    #[test]
    fn failing_interpreter_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let runner = ProcessRunner::new(InterpreterCommand::new("false"), dir.path().join("c.berd"));
        let events = ScriptedEvents::new().line("run(x)");
        let (reason, output, _) = run_script(events, runner);
        assert_eq!(reason, ExitReason::EndOfInput);
        assert_eq!(
            output,
            "dreamberd> run(x)\r\nError: interpreter exited with an error\r\ndreamberd> "
        );
    }

    #[test]
    fn interrupt_kills_running_interpreter() {
        let dir = tempfile::tempdir().unwrap();
        let interrupt = InterruptHandle::new();
        let runner = ProcessRunner::new(InterpreterCommand::new("sh"), dir.path().join("c.berd"))
            .with_interrupt(interrupt.clone());

        let trigger = thread::spawn(move || {
            thread::sleep(Duration::from_millis(200));
            interrupt.trigger();
        });

        let started = Instant::now();
        let events = ScriptedEvents::new().line("run(exec sleep 30)").line("help");
        let (reason, output, _) = run_script(events, runner);
        trigger.join().unwrap();

        assert_eq!(reason, ExitReason::Interrupted);
        assert!(started.elapsed() < Duration::from_secs(10));
        assert_eq!(output, "dreamberd> run(exec sleep 30)\r\n");
    }

    #[test]
    fn interpreter_killed_by_ctrl_c_ends_loop() {
        let dir = tempfile::tempdir().unwrap();
        let interrupt = InterruptHandle::new();
        let runner = ProcessRunner::new(InterpreterCommand::new("sh"), dir.path().join("c.berd"))
            .with_interrupt(interrupt.clone());

        // Ctrl+C reaches the child and the signal thread together.
        let trigger = thread::spawn(move || {
            thread::sleep(Duration::from_millis(100));
            interrupt.trigger();
        });

        let events = ScriptedEvents::new()
            .line("run(sleep 0.1; kill -INT $$; sleep 5)")
            .line("help");
        let (reason, output, _) = run_script(events, runner);
        trigger.join().unwrap();

        assert_eq!(reason, ExitReason::Interrupted);
        assert_eq!(output, "dreamberd> run(sleep 0.1; kill -INT $$; sleep 5)\r\n");
        assert!(!output.contains("Error:"));
    }
}
