//! Event handling for the TUI

use std::time::Duration;

use crossterm::event::{Event as CrosstermEvent, EventStream, KeyEvent, KeyEventKind};
use futures::StreamExt;
use serde_json::Value;
use tokio::sync::mpsc;

use crate::auth::LoginOutcome;
use crate::error::{AuthError, FetchError};
use crate::models::Application;
use crate::monitor::LivenessReport;

/// TUI events
#[derive(Debug)]
pub enum Event {
    /// Terminal tick (redraw, notification expiry)
    Tick,
    /// Keyboard event
    Key(KeyEvent),
    /// Terminal resize
    Resize(u16, u16),
    /// Login request finished
    LoginFinished(Result<LoginOutcome, AuthError>),
    /// Directory fetch finished
    ApplicationsLoaded {
        /// Generation of the request that produced this result
        generation: u64,
        /// Listing or failure
        result: Result<Vec<Application>, FetchError>,
    },
    /// Application detail request finished
    DetailsLoaded {
        /// Sequence number of the request
        request: u64,
        /// Detail payload or failure
        result: Result<Value, FetchError>,
    },
    /// A probe reported
    Liveness(LivenessReport),
    /// Backend logout finished
    LoggedOut,
}

impl From<LivenessReport> for Event {
    fn from(report: LivenessReport) -> Self {
        Self::Liveness(report)
    }
}

/// Merges terminal input, ticks and background results into one stream
pub struct EventHandler {
    /// Sender for events
    tx: mpsc::UnboundedSender<Event>,
    /// Receiver for events
    rx: mpsc::UnboundedReceiver<Event>,
    /// Tick rate
    tick_rate: Duration,
}

impl EventHandler {
    /// Create a new event handler
    pub fn new(tick_rate_ms: u64) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            tx,
            rx,
            tick_rate: Duration::from_millis(tick_rate_ms.max(16)),
        }
    }

    /// Get a sender to inject events
    pub fn sender(&self) -> mpsc::UnboundedSender<Event> {
        self.tx.clone()
    }

    /// Start forwarding terminal input and ticks
    pub fn start(&self) {
        let tx = self.tx.clone();
        let mut ticker = tokio::time::interval(self.tick_rate);

        tokio::spawn(async move {
            let mut reader = EventStream::new();

            loop {
                let event = tokio::select! {
                    _ = ticker.tick() => Event::Tick,
                    maybe = reader.next() => match maybe {
                        Some(Ok(CrosstermEvent::Key(key))) if key.kind == KeyEventKind::Press => Event::Key(key),
                        Some(Ok(CrosstermEvent::Resize(w, h))) => Event::Resize(w, h),
                        Some(Ok(_)) => continue,
                        Some(Err(e)) => {
                            tracing::warn!(error = %e, "Terminal input error");
                            continue;
                        }
                        None => break,
                    },
                };

                if tx.send(event).is_err() {
                    break;
                }
            }
        });
    }

    /// Get the next event
    pub async fn next(&mut self) -> Option<Event> {
        self.rx.recv().await
    }
}
