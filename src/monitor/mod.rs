//! The live monitoring session.
//!
//! Three activities run side by side while the dashboard is up:
//!
//! - an ingestion task feeding status values from the [`StatusSource`] into
//!   the [`Aggregator`](crate::snapshot::Aggregator),
//! - a render task repainting the dashboard once per refresh interval,
//! - the supervisor (the caller of [`Monitor::run`]) reading key events.
//!
//! The first of a quit key, a closed input queue or an ingestion failure
//! ends the session. Editing the interval holds the terminal lock, which
//! keeps the render task from painting over the prompt.

pub mod interval;

use std::io;
use std::sync::Arc;
use std::time::Duration;

use crossterm::event::Event;
use ratatui::{backend::Backend, Terminal};
use tokio::sync::{mpsc, oneshot, watch, Mutex, Notify};
use tracing::{debug, info, warn};

use crate::error::MonitorError;
use crate::events::{command_for, Command};
use crate::snapshot::Aggregator;
use crate::source::StatusSource;
use crate::ui::{Dashboard, TerminalPrompt};
use interval::{prompt_for_interval, IntervalEdit};

/// Shortest time between two scheduled repaints.
pub const MIN_RENDER_PERIOD: Duration = Duration::from_millis(100);

/// Drives one monitoring session on a terminal.
pub struct Monitor<B: Backend> {
    terminal: Arc<Mutex<Terminal<B>>>,
    dashboard: Arc<Dashboard>,
    interval: watch::Sender<Duration>,
    redraw: Arc<Notify>,
}

impl<B: Backend + Send + 'static> Monitor<B> {
    pub fn new(terminal: Terminal<B>, dashboard: Dashboard, interval: Duration) -> Self {
        let (interval, _) = watch::channel(interval);
        Self {
            terminal: Arc::new(Mutex::new(terminal)),
            dashboard: Arc::new(dashboard),
            interval,
            redraw: Arc::new(Notify::new()),
        }
    }

    /// Returns the current refresh interval.
    pub fn interval(&self) -> Duration {
        *self.interval.borrow()
    }

    pub fn dashboard(&self) -> &Arc<Dashboard> {
        &self.dashboard
    }

    pub fn terminal(&self) -> &Arc<Mutex<Terminal<B>>> {
        &self.terminal
    }

    /// Run until the user quits or ingestion fails.
    ///
    /// Returns `Ok(())` on a quit key or when `events` closes, and the
    /// ingestion error otherwise. The source is closed before returning
    /// either way.
    pub async fn run(
        &self,
        source: Box<dyn StatusSource>,
        mut events: mpsc::UnboundedReceiver<Event>,
    ) -> Result<(), MonitorError> {
        let (error_tx, mut errors) = mpsc::channel(1);
        let (stop_tx, stop_rx) = oneshot::channel();

        let ingestion = tokio::spawn(ingest(
            source,
            Arc::clone(&self.dashboard.aggregator),
            error_tx,
            stop_rx,
        ));
        let render = tokio::spawn(render_loop(
            Arc::clone(&self.terminal),
            Arc::clone(&self.dashboard),
            self.interval.subscribe(),
            Arc::clone(&self.redraw),
        ));

        let result = self.supervise(&mut errors, &mut events).await;

        render.abort();
        let _ = render.await;

        let _ = stop_tx.send(());
        match ingestion.await {
            Ok(mut source) => {
                if let Err(e) = source.close().await {
                    warn!(error = %e, "failed to close status source");
                }
            }
            Err(e) => warn!(error = %e, "ingestion task failed"),
        }

        result
    }

    async fn supervise(
        &self,
        errors: &mut mpsc::Receiver<MonitorError>,
        events: &mut mpsc::UnboundedReceiver<Event>,
    ) -> Result<(), MonitorError> {
        loop {
            tokio::select! {
                Some(err) = errors.recv() => return Err(err),
                event = events.recv() => {
                    let Some(event) = event else {
                        debug!("input queue closed");
                        return Ok(());
                    };
                    match command_for(&event) {
                        Command::Quit => return Ok(()),
                        Command::ChangeInterval => self.change_interval(events).await,
                        Command::Redraw => self.redraw.notify_one(),
                        Command::Ignore => {}
                    }
                }
            }
        }
    }

    async fn change_interval(&self, events: &mut mpsc::UnboundedReceiver<Event>) {
        let current = self.interval();
        let mut terminal = self.terminal.lock().await;
        let mut prompt = TerminalPrompt::new(&mut *terminal, events, &self.dashboard, current);

        match prompt_for_interval(current, &mut prompt).await {
            IntervalEdit::Changed(interval) => {
                info!(?interval, "refresh interval changed");
                self.interval.send_replace(interval);
            }
            IntervalEdit::Unchanged => {}
            IntervalEdit::Failed(reason) => warn!(reason, "refresh interval not changed"),
        }

        drop(prompt);
        drop(terminal);
        self.redraw.notify_one();
    }
}

/// Set up the terminal for a session reading from `source`.
///
/// If `init` fails the source is closed before the error is returned, so
/// whatever it holds on the server side is released.
pub async fn open_terminal<B, G, F>(
    mut source: Box<dyn StatusSource>,
    init: F,
) -> Result<(Box<dyn StatusSource>, Terminal<B>, G), MonitorError>
where
    B: Backend,
    F: FnOnce() -> io::Result<(Terminal<B>, G)>,
{
    match init() {
        Ok((terminal, guard)) => Ok((source, terminal, guard)),
        Err(e) => {
            if let Err(close_err) = source.close().await {
                warn!(error = %close_err, "failed to close status source");
            }
            Err(MonitorError::Terminal(e))
        }
    }
}

/// Feed values from `source` into `aggregator` until told to stop or
/// something fails. The first failure is sent on `errors`.
async fn ingest(
    mut source: Box<dyn StatusSource>,
    aggregator: Arc<Aggregator>,
    errors: mpsc::Sender<MonitorError>,
    mut stop: oneshot::Receiver<()>,
) -> Box<dyn StatusSource> {
    let error = loop {
        let received = tokio::select! {
            _ = &mut stop => None,
            received = source.recv() => Some(received),
        };
        let Some(received) = received else {
            return source;
        };

        match received {
            Ok(Some(value)) => {
                if let Err(e) = aggregator.ingest(&value) {
                    break MonitorError::from(e);
                }
            }
            Ok(None) => break MonitorError::StreamClosed,
            Err(e) => break MonitorError::from(e),
        }
    };

    debug!(error = %error, "ingestion stopped");
    let _ = errors.send(error).await;
    source
}

async fn render_loop<B: Backend>(
    terminal: Arc<Mutex<Terminal<B>>>,
    dashboard: Arc<Dashboard>,
    mut interval: watch::Receiver<Duration>,
    redraw: Arc<Notify>,
) {
    loop {
        let period = {
            let mut terminal = terminal.lock().await;
            let period = *interval.borrow_and_update();
            if let Err(e) = dashboard.draw(&mut *terminal, period) {
                warn!(error = %e, "failed to draw dashboard");
            }
            period
        };

        tokio::select! {
            _ = tokio::time::sleep(period.max(MIN_RENDER_PERIOD)) => {}
            changed = interval.changed() => {
                if changed.is_err() {
                    return;
                }
            }
            _ = redraw.notified() => {}
        }
    }
}
