//! Screen-stack runtime
//!
//! Owns the terminal and drives the event loop: crossterm events and a
//! periodic tick multiplexed through `tokio::select!`. Screens live on a
//! stack; when one completes, its result is handed to the continuation it
//! was pushed with, which may push follow-up screens. The loop ends when
//! the stack empties.
//!
//! Raw mode, the alternate screen, and mouse capture are torn down in
//! `Drop`, so a panic or early return cannot leave the terminal wedged.

use std::io::{self, Stdout, stdout};
use std::time::Duration;

use crossterm::{
    ExecutableCommand,
    event::{
        DisableMouseCapture, EnableMouseCapture, Event, EventStream, KeyEventKind,
    },
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use futures::StreamExt;
use ratatui::{Terminal, backend::CrosstermBackend};
use thiserror::Error;
use trellis_core::{FormAction, ScreenResult};

use crate::{Screen, TerminalCapabilities, convert_key, ui};

const TICK_INTERVAL: Duration = Duration::from_millis(100);

/// Shell errors.
#[derive(Debug, Error)]
pub enum ShellError {
    /// I/O error from terminal operations.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Callback receiving a completed screen's result.
///
/// Runs exactly once. The stack reference allows pushing follow-up screens.
pub type Continuation = Box<dyn FnOnce(ScreenResult, &mut ScreenStack) + Send>;

struct ScreenEntry {
    screen: Screen,
    continuation: Option<Continuation>,
}

/// The stack of live screens. The top screen receives input.
#[derive(Default)]
pub struct ScreenStack {
    entries: Vec<ScreenEntry>,
}

impl ScreenStack {
    /// Push a screen whose result feeds `continuation`.
    pub fn push(
        &mut self,
        screen: Screen,
        continuation: impl FnOnce(ScreenResult, &mut ScreenStack) + Send + 'static,
    ) {
        self.entries.push(ScreenEntry { screen, continuation: Some(Box::new(continuation)) });
    }

    /// Push a screen whose result is discarded.
    pub fn push_screen(&mut self, screen: Screen) {
        self.entries.push(ScreenEntry { screen, continuation: None });
    }

    /// Number of live screens.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the stack is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Terminal shell: owns the terminal and runs the screen stack.
pub struct Shell {
    terminal: Terminal<CrosstermBackend<Stdout>>,
    capabilities: TerminalCapabilities,
    mouse_captured: bool,
    stack: ScreenStack,
}

impl Shell {
    /// Take over the terminal: raw mode, alternate screen, and mouse
    /// capture when the capabilities allow it.
    pub fn new(capabilities: TerminalCapabilities) -> Result<Self, ShellError> {
        enable_raw_mode()?;
        stdout().execute(EnterAlternateScreen)?;

        let mouse_captured = capabilities.mouse;
        if mouse_captured {
            stdout().execute(EnableMouseCapture)?;
        }

        let backend = CrosstermBackend::new(stdout());
        let terminal = Terminal::new(backend)?;
        tracing::info!(?capabilities, "shell started");

        Ok(Self { terminal, capabilities, mouse_captured, stack: ScreenStack::default() })
    }

    /// The capabilities this shell was started with.
    pub fn capabilities(&self) -> TerminalCapabilities {
        self.capabilities
    }

    /// Push a screen before or during the run.
    pub fn push(
        &mut self,
        screen: Screen,
        continuation: impl FnOnce(ScreenResult, &mut ScreenStack) + Send + 'static,
    ) {
        self.stack.push(screen, continuation);
    }

    /// Push a screen whose result is discarded.
    pub fn push_screen(&mut self, screen: Screen) {
        self.stack.push_screen(screen);
    }

    /// Run the event loop until the screen stack empties.
    pub async fn run(mut self) -> Result<(), ShellError> {
        self.render()?;

        let mut event_stream = EventStream::new();
        let mut tick_interval = tokio::time::interval(TICK_INTERVAL);

        while !self.stack.is_empty() {
            tokio::select! {
                maybe_event = event_stream.next() => {
                    match maybe_event {
                        Some(Ok(event)) => self.handle_terminal_event(event)?,
                        Some(Err(e)) => return Err(ShellError::Io(e)),
                        None => break,
                    }
                }

                // Periodic redraw picks up host-driven state changes.
                _ = tick_interval.tick() => {
                    self.render()?;
                }
            }
        }

        Ok(())
    }

    fn handle_terminal_event(&mut self, event: Event) -> Result<(), ShellError> {
        match event {
            Event::Key(key) if key.kind == KeyEventKind::Press => {
                let Some(key) = convert_key(&key) else {
                    return Ok(());
                };
                let Some(entry) = self.stack.entries.last_mut() else {
                    return Ok(());
                };
                let actions = entry.screen.handle_key(key);
                self.process_actions(actions)
            },
            Event::Resize(_, _) => self.render(),
            _ => Ok(()),
        }
    }

    /// Execute actions from the top screen.
    fn process_actions(&mut self, actions: Vec<FormAction>) -> Result<(), ShellError> {
        for action in actions {
            match action {
                FormAction::Render => self.render()?,
                FormAction::Complete(result) => {
                    let Some(entry) = self.stack.entries.pop() else {
                        continue;
                    };
                    tracing::debug!(
                        confirmed = result.confirmed,
                        remaining = self.stack.len(),
                        "screen completed"
                    );
                    if let Some(continuation) = entry.continuation {
                        continuation(result, &mut self.stack);
                    }
                    self.render()?;
                },
            }
        }
        Ok(())
    }

    fn render(&mut self) -> Result<(), ShellError> {
        let Some(entry) = self.stack.entries.last() else {
            return Ok(());
        };
        self.terminal.draw(|frame| {
            ui::render(frame, &entry.screen);
        })?;
        Ok(())
    }
}

impl Drop for Shell {
    fn drop(&mut self) {
        if self.mouse_captured {
            let _ = stdout().execute(DisableMouseCapture);
        }
        let _ = disable_raw_mode();
        let _ = stdout().execute(LeaveAlternateScreen);
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use trellis_core::Field;

    use super::*;
    use crate::ScreenBuilder;

    fn screen(title: &str) -> Screen {
        ScreenBuilder::new(title).field(Field::text("name")).build()
    }

    #[test]
    fn continuation_receives_result_and_can_chain() {
        let mut stack = ScreenStack::default();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);

        stack.push(screen("first"), move |result, stack| {
            sink.lock().unwrap().push(result.confirmed);
            stack.push_screen(screen("second"));
        });
        assert_eq!(stack.len(), 1);

        // Simulate what the shell does on completion.
        let entry = stack.entries.pop().unwrap();
        let result = ScreenResult { confirmed: true, values: Default::default() };
        if let Some(continuation) = entry.continuation {
            continuation(result, &mut stack);
        }

        assert_eq!(*seen.lock().unwrap(), vec![true]);
        assert_eq!(stack.len(), 1);
        assert_eq!(stack.entries[0].screen.form().title(), "second");
    }
}
