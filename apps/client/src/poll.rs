//! Poll Loop: reads an entry until the responder has finished with it.
//!
//! Reads happen every `interval`. A failed read backs off exponentially up to
//! `max_backoff`; the next successful read resets the delay. The loop ends on
//! an answered status, on `error`, after `max_attempts` reads, or at `timeout`
//! when one is set.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use trail_core::QueryStatus;

use crate::api::EntryReader;
use crate::session::SessionEvent;

/// Spoken when an entry is answered without any response text.
pub const NO_MESSAGE: &str = "No message.";

#[derive(Debug, Clone)]
pub struct PollSettings {
    pub interval: Duration,
    pub max_backoff: Duration,
    pub max_attempts: u32,
    /// Overall bound on the loop; `None` relies on `max_attempts` alone.
    pub timeout: Option<Duration>,
}

impl Default for PollSettings {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(5),
            max_backoff: Duration::from_secs(60),
            max_attempts: 120,
            timeout: Some(Duration::from_secs(600)),
        }
    }
}

/// How a poll loop ended.
#[derive(Debug, Clone, PartialEq)]
pub enum PollOutcome {
    Answered(String),
    /// The responder marked the entry `error`.
    Failed(Option<String>),
    Exhausted { attempts: u32 },
    TimedOut,
}

/// Starts a poll loop for `id` on its own task. Aborting the handle cancels it.
pub fn spawn_poll(
    id: i64,
    reader: Arc<dyn EntryReader>,
    settings: PollSettings,
    events: mpsc::Sender<SessionEvent>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let outcome = poll_entry(id, reader.as_ref(), &settings, &events).await;
        let _ = events.send(SessionEvent::Finished { id, outcome }).await;
    })
}

pub async fn poll_entry(
    id: i64,
    reader: &dyn EntryReader,
    settings: &PollSettings,
    events: &mpsc::Sender<SessionEvent>,
) -> PollOutcome {
    info!("Polling entry {id} every {:?}", settings.interval);

    let polling = async {
        let mut delay = settings.interval;

        for attempt in 1..=settings.max_attempts {
            tokio::time::sleep(delay).await;

            match reader.read(id).await {
                Ok(entry) => {
                    delay = settings.interval;
                    debug!("Entry {id} attempt {attempt}: status={}", entry.status);
                    let _ = events
                        .send(SessionEvent::Progress {
                            id,
                            status: entry.status,
                        })
                        .await;

                    if entry.status.is_answered() {
                        let text = entry
                            .llm_response
                            .filter(|text| !text.trim().is_empty())
                            .unwrap_or_else(|| NO_MESSAGE.to_string());
                        return PollOutcome::Answered(text);
                    }
                    if entry.status == QueryStatus::Error {
                        return PollOutcome::Failed(entry.llm_response);
                    }
                }
                Err(e) => {
                    warn!("Polling entry {id} failed (attempt {attempt}): {e}");
                    let _ = events
                        .send(SessionEvent::PollError {
                            id,
                            message: e.to_string(),
                        })
                        .await;
                    delay = (delay * 2).min(settings.max_backoff);
                }
            }
        }

        PollOutcome::Exhausted {
            attempts: settings.max_attempts,
        }
    };

    match settings.timeout {
        Some(limit) => tokio::time::timeout(limit, polling)
            .await
            .unwrap_or(PollOutcome::TimedOut),
        None => polling.await,
    }
}
