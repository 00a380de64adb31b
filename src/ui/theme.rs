//! Theme configuration for the TUI.
//!
//! Supports light and dark themes with automatic terminal detection.

use ratatui::style::{Color, Modifier, Style};

/// Color and style theme for the dashboard.
///
/// Use [`Theme::auto_detect()`] for automatic theme selection based on
/// terminal background, or [`Theme::dark()`]/[`Theme::light()`] explicitly.
#[derive(Debug, Clone)]
pub struct Theme {
    /// Style for table header rows.
    pub header: Style,
    /// Style for the status bar.
    pub status_bar: Style,
    /// Style for transient messages (interval errors and the like).
    pub message: Style,
    /// Style for the interval prompt line.
    pub prompt: Style,
}

impl Theme {
    /// Create a dark theme suitable for dark terminal backgrounds.
    pub fn dark() -> Self {
        Self {
            header: Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
            status_bar: Style::default().add_modifier(Modifier::DIM),
            message: Style::default().fg(Color::Yellow),
            prompt: Style::default().fg(Color::Cyan),
        }
    }

    /// Create a light theme suitable for light terminal backgrounds.
    pub fn light() -> Self {
        Self {
            header: Style::default().fg(Color::Blue).add_modifier(Modifier::BOLD),
            status_bar: Style::default().add_modifier(Modifier::DIM),
            message: Style::default().fg(Color::Red),
            prompt: Style::default().fg(Color::Blue),
        }
    }

    /// Auto-detect based on terminal background
    pub fn auto_detect() -> Self {
        // Use terminal-light crate to detect background luminance
        match terminal_light::luma() {
            Ok(luma) if luma > 0.5 => Self::light(),
            _ => Self::dark(),
        }
    }
}
