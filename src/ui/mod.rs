//! Terminal UI rendering using ratatui.
//!
//! ## Submodules
//!
//! - [`common`]: Table area, status bar and prompt line widgets
//! - [`prompt`]: Single-line text input used by the interval editor
//! - [`theme`]: Light/dark theme support with terminal auto-detection
//!
//! ## Layout
//!
//! ```text
//! ┌──────────────────────────────────────┐
//! │ edges / sources / boxes / sinks      │
//! │ (common::render_tables)              │
//! │                                      │
//! ├──────────────────────────────────────┤
//! │ Status bar or prompt line            │
//! └──────────────────────────────────────┘
//! ```

pub mod common;
pub mod prompt;
pub mod theme;

pub use prompt::TerminalPrompt;
pub use theme::Theme;

use std::io::{self, Stdout};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crossterm::{
    cursor, execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use parking_lot::Mutex;
use ratatui::{
    backend::{Backend, CrosstermBackend},
    layout::{Constraint, Layout, Rect},
    Terminal,
};

use crate::duration::format_interval;
use crate::render;
use crate::snapshot::{Aggregator, Snapshot};

/// How long a transient status message stays visible.
const MESSAGE_TTL: Duration = Duration::from_secs(3);

/// A temporary message shown in place of the status bar.
#[derive(Debug, Default)]
pub struct StatusLine {
    message: Mutex<Option<(String, Instant)>>,
}

impl StatusLine {
    /// Set a message that will be shown for a few seconds.
    pub fn set(&self, message: impl Into<String>) {
        *self.message.lock() = Some((message.into(), Instant::now()));
    }

    /// Get the current message if it hasn't expired.
    pub fn current(&self) -> Option<String> {
        let message = self.message.lock();
        match &*message {
            Some((msg, time)) if time.elapsed() < MESSAGE_TTL => Some(msg.clone()),
            _ => None,
        }
    }
}

/// What the bottom row shows.
enum BottomLine<'a> {
    Status { interval: Duration },
    Prompt { prompt: &'a str, input: &'a str },
}

/// Everything needed to paint the dashboard.
#[derive(Debug)]
pub struct Dashboard {
    pub aggregator: Arc<Aggregator>,
    pub status: StatusLine,
    pub theme: Theme,
    source: String,
}

impl Dashboard {
    pub fn new(aggregator: Arc<Aggregator>, source: impl Into<String>, theme: Theme) -> Self {
        Self {
            aggregator,
            status: StatusLine::default(),
            theme,
            source: source.into(),
        }
    }

    /// Returns the description of the status source.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Paint the current snapshot with the status bar.
    pub fn draw<B: Backend>(&self, terminal: &mut Terminal<B>, interval: Duration) -> io::Result<()> {
        let snapshot = self.aggregator.snapshot();
        self.paint(terminal, &snapshot, BottomLine::Status { interval })
    }

    /// Paint `snapshot` with the prompt line in place of the status bar.
    pub fn draw_prompt<B: Backend>(
        &self,
        terminal: &mut Terminal<B>,
        snapshot: &Snapshot,
        prompt: &str,
        input: &str,
    ) -> io::Result<()> {
        self.paint(terminal, snapshot, BottomLine::Prompt { prompt, input })
    }

    /// Paint `snapshot` with the status bar (showing any transient message).
    pub fn draw_snapshot<B: Backend>(
        &self,
        terminal: &mut Terminal<B>,
        snapshot: &Snapshot,
        interval: Duration,
    ) -> io::Result<()> {
        self.paint(terminal, snapshot, BottomLine::Status { interval })
    }

    fn paint<B: Backend>(
        &self,
        terminal: &mut Terminal<B>,
        snapshot: &Snapshot,
        bottom: BottomLine<'_>,
    ) -> io::Result<()> {
        let tables = render::tables(snapshot);
        let message = self.status.current();

        terminal.draw(|frame| {
            let area = frame.area();
            let [content, bar]: [Rect; 2] =
                Layout::vertical([Constraint::Min(0), Constraint::Length(1)]).areas(area);

            common::render_tables(frame, &tables, &self.theme, content);

            match bottom {
                BottomLine::Status { interval } => {
                    let text = common::status_text(
                        &self.source,
                        snapshot.tick,
                        &format_interval(interval),
                    );
                    common::render_status_bar(frame, &text, message.as_deref(), &self.theme, bar);
                }
                BottomLine::Prompt { prompt, input } => {
                    common::render_prompt(frame, prompt, input, &self.theme, bar);
                }
            }
        })?;
        Ok(())
    }
}

/// Restores the terminal when dropped.
#[derive(Debug)]
pub struct TerminalGuard {
    _private: (),
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = restore_terminal();
    }
}

/// Switch the terminal to raw mode on the alternate screen.
///
/// The returned guard puts the terminal back, also on panic.
pub fn init_terminal() -> io::Result<(Terminal<CrosstermBackend<Stdout>>, TerminalGuard)> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    if let Err(e) = execute!(stdout, EnterAlternateScreen) {
        let _ = disable_raw_mode();
        return Err(e);
    }
    let guard = TerminalGuard { _private: () };

    // Setup panic hook to restore terminal
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic| {
        let _ = restore_terminal();
        original_hook(panic);
    }));

    let mut terminal = Terminal::new(CrosstermBackend::new(stdout))?;
    terminal.clear()?;
    terminal.hide_cursor()?;
    Ok((terminal, guard))
}

/// Leave the alternate screen and raw mode.
pub fn restore_terminal() -> io::Result<()> {
    disable_raw_mode()?;
    execute!(io::stdout(), LeaveAlternateScreen, cursor::Show)
}
