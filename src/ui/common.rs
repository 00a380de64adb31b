//! Widgets shared by the dashboard and the interval prompt.
//!
//! This module contains the table area, the status bar and the prompt line.

use chrono::{DateTime, Utc};
use ratatui::{
    layout::Rect,
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

use super::Theme;
use crate::render::Table;

/// Render the four tables as plain aligned text, header rows styled.
///
/// Lines are never wrapped; whatever does not fit is cut off.
pub fn render_tables(frame: &mut Frame, tables: &[Table], theme: &Theme, area: Rect) {
    let mut lines: Vec<Line> = Vec::new();
    for (i, table) in tables.iter().enumerate() {
        if i > 0 {
            lines.push(Line::from(""));
        }
        for (row, text) in table.lines().into_iter().enumerate() {
            if row == 0 {
                lines.push(Line::from(Span::styled(text, theme.header)));
            } else {
                lines.push(Line::from(text));
            }
        }
    }
    frame.render_widget(Paragraph::new(lines), area);
}

/// Status bar text for normal dashboard mode.
pub fn status_text(source: &str, tick: Option<DateTime<Utc>>, interval: &str) -> String {
    let tick = match tick {
        Some(tick) => format!("tick {}", tick.format("%H:%M:%S")),
        None => "waiting for data...".to_string(),
    };
    format!(" {} | {} | every {} | d:interval q:quit", source, tick, interval)
}

/// Render the status bar, or the transient message if one is active.
pub fn render_status_bar(
    frame: &mut Frame,
    status: &str,
    message: Option<&str>,
    theme: &Theme,
    area: Rect,
) {
    let paragraph = match message {
        Some(msg) => Paragraph::new(format!(" {} ", msg)).style(theme.message),
        None => Paragraph::new(status.to_string()).style(theme.status_bar),
    };
    frame.render_widget(paragraph, area);
}

/// Render the prompt line with the text typed so far and place the cursor
/// after it.
pub fn render_prompt(frame: &mut Frame, prompt: &str, input: &str, theme: &Theme, area: Rect) {
    let line = Line::from(vec![
        Span::styled(prompt.to_string(), theme.prompt),
        Span::raw(input.to_string()),
    ]);
    frame.render_widget(Paragraph::new(line), area);

    let typed = (prompt.chars().count() + input.chars().count()) as u16;
    let x = area.x + typed.min(area.width.saturating_sub(1));
    frame.set_cursor_position((x, area.y));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_text_before_first_tick() {
        let text = status_text("stream: demo", None, "1s");
        assert_eq!(text, " stream: demo | waiting for data... | every 1s | d:interval q:quit");
    }

    #[test]
    fn test_status_text_with_tick() {
        let tick = "2016-05-12T10:20:30Z".parse().unwrap();
        let text = status_text("demo", Some(tick), "2.5s");
        assert!(text.contains("tick 10:20:30"));
        assert!(text.contains("every 2.5s"));
    }
}
