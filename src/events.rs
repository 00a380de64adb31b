//! Keyboard and terminal event handling.

use std::thread;
use std::time::Duration;

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use tokio::sync::mpsc;
use tracing::{debug, warn};

/// How long the input thread waits for an event before checking whether
/// anyone is still listening.
const INPUT_POLL_TIMEOUT: Duration = Duration::from_millis(100);

/// What the supervisor should do with an input event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Stop monitoring (`q` or Ctrl-C).
    Quit,
    /// Open the refresh interval prompt (`d`).
    ChangeInterval,
    /// Repaint now (terminal resized).
    Redraw,
    /// Nothing to do.
    Ignore,
}

/// Poll for events with a timeout
pub fn poll_event(timeout: Duration) -> std::io::Result<Option<Event>> {
    if event::poll(timeout)? {
        Ok(Some(event::read()?))
    } else {
        Ok(None)
    }
}

/// True for Ctrl-C.
pub fn is_interrupt(key: &KeyEvent) -> bool {
    key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL)
}

/// Map a terminal event to a supervisor command.
pub fn command_for(event: &Event) -> Command {
    match event {
        Event::Key(key) if key.kind == KeyEventKind::Press => {
            if is_interrupt(key) {
                return Command::Quit;
            }
            match key.code {
                KeyCode::Char('q') => Command::Quit,
                KeyCode::Char('d') => Command::ChangeInterval,
                _ => Command::Ignore,
            }
        }
        Event::Resize(_, _) => Command::Redraw,
        _ => Command::Ignore,
    }
}

/// Start a thread that forwards terminal events into a queue.
///
/// The thread exits on its own once the receiver is dropped, or when
/// reading events fails.
pub fn spawn_input_thread() -> mpsc::UnboundedReceiver<Event> {
    let (tx, rx) = mpsc::unbounded_channel();

    thread::spawn(move || {
        while !tx.is_closed() {
            match poll_event(INPUT_POLL_TIMEOUT) {
                Ok(Some(event)) => {
                    if tx.send(event).is_err() {
                        break;
                    }
                }
                Ok(None) => {}
                Err(e) => {
                    warn!(error = %e, "failed to read terminal events");
                    break;
                }
            }
        }
        debug!("input thread stopped");
    });

    rx
}
