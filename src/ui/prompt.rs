//! Single-line text input drawn over the dashboard's status bar.

use std::time::Duration;

use async_trait::async_trait;
use crossterm::event::{Event, KeyCode, KeyEventKind};
use ratatui::{backend::Backend, Terminal};
use tokio::sync::mpsc::UnboundedReceiver;
use tracing::warn;

use super::Dashboard;
use crate::events::is_interrupt;
use crate::monitor::interval::{EditError, LineEditor};
use crate::snapshot::Snapshot;

/// Reads a line of input while the dashboard stays frozen behind it.
///
/// The snapshot shown is taken when the prompt is created, so the tables
/// don't move while the user is typing.
pub struct TerminalPrompt<'a, B: Backend> {
    terminal: &'a mut Terminal<B>,
    events: &'a mut UnboundedReceiver<Event>,
    dashboard: &'a Dashboard,
    snapshot: Snapshot,
    interval: Duration,
}

impl<'a, B: Backend> TerminalPrompt<'a, B> {
    pub fn new(
        terminal: &'a mut Terminal<B>,
        events: &'a mut UnboundedReceiver<Event>,
        dashboard: &'a Dashboard,
        interval: Duration,
    ) -> Self {
        let snapshot = dashboard.aggregator.snapshot();
        Self {
            terminal,
            events,
            dashboard,
            snapshot,
            interval,
        }
    }
}

#[async_trait]
impl<'a, B: Backend + Send> LineEditor for TerminalPrompt<'a, B> {
    async fn start(&mut self, prompt: &str) -> Result<String, EditError> {
        let mut input = String::new();
        loop {
            self.dashboard
                .draw_prompt(self.terminal, &self.snapshot, prompt, &input)?;

            let Some(event) = self.events.recv().await else {
                return Err(EditError::Closed);
            };
            let Event::Key(key) = event else {
                continue;
            };
            if key.kind != KeyEventKind::Press {
                continue;
            }
            if is_interrupt(&key) {
                return Ok(String::new());
            }
            match key.code {
                KeyCode::Enter => return Ok(input),
                KeyCode::Esc => return Ok(String::new()),
                KeyCode::Backspace => {
                    input.pop();
                }
                KeyCode::Char(c) => input.push(c),
                _ => {}
            }
        }
    }

    fn reset(&mut self) {
        let _ = self.terminal.hide_cursor();
    }

    fn redraw_all(&mut self, message: &str) {
        self.dashboard.status.set(message);
        if let Err(e) = self
            .dashboard
            .draw_snapshot(self.terminal, &self.snapshot, self.interval)
        {
            warn!(error = %e, "failed to redraw dashboard");
        }
    }
}
