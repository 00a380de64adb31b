//! Interactive refresh interval editing.

use std::io;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

use crate::duration::{format_interval, parse_secs};

/// Errors raised by a [`LineEditor`] while reading a line.
#[derive(Debug, Error)]
pub enum EditError {
    /// The input event queue is gone.
    #[error("input closed")]
    Closed,

    #[error(transparent)]
    Io(#[from] io::Error),
}

/// A widget that reads one line of text from the user.
#[async_trait]
pub trait LineEditor: Send {
    /// Show `prompt` and wait for the user to submit a line.
    async fn start(&mut self, prompt: &str) -> Result<String, EditError>;

    /// Leave input mode (hide the cursor and the like).
    ///
    /// This does not repaint the dashboard: only the caller knows the
    /// interval to show, so it must request a redraw afterwards.
    fn reset(&mut self);

    /// Show a one-line message to the user.
    fn redraw_all(&mut self, message: &str);
}

/// Outcome of [`prompt_for_interval`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IntervalEdit {
    /// The user entered a new interval.
    Changed(Duration),
    /// The user submitted an empty line or cancelled.
    Unchanged,
    /// Reading or parsing failed; the message was shown to the user.
    Failed(String),
}

/// Ask the user for a new refresh interval, in seconds.
///
/// The editor is always reset before returning. The caller repaints the
/// dashboard once the outcome is applied.
pub async fn prompt_for_interval<E>(current: Duration, editor: &mut E) -> IntervalEdit
where
    E: LineEditor + ?Sized,
{
    let edit = read_interval(current, editor).await;
    editor.reset();
    edit
}

async fn read_interval<E>(current: Duration, editor: &mut E) -> IntervalEdit
where
    E: LineEditor + ?Sized,
{
    let prompt = format!("Current {}, change to [sec]: ", format_interval(current));
    let input = match editor.start(&prompt).await {
        Ok(input) => input,
        Err(e) => return fail(editor, format!("fail to get key events, {}", e)),
    };

    let input = input.trim();
    if input.is_empty() {
        return IntervalEdit::Unchanged;
    }
    match parse_secs(input) {
        Ok(interval) => IntervalEdit::Changed(interval),
        Err(e) => fail(editor, format!("fail to parse input string, {}", e)),
    }
}

fn fail<E: LineEditor + ?Sized>(editor: &mut E, message: String) -> IntervalEdit {
    editor.redraw_all(&message);
    IntervalEdit::Failed(message)
}
