//! Client session: the single owner of user-visible state.
//!
//! Location fixes and poll-loop events are applied here, one at a time, in
//! arrival order. Only the most recently submitted query is tracked; submitting
//! a new one aborts the previous poll task, and late events for older queries
//! are dropped.

use std::fmt;
use std::sync::Arc;

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{error, info, warn};
use trail_core::{Coordinates, QueryStatus};

use crate::api::{EntryReader, QuerySubmitter};
use crate::geocode::{Place, PlaceLookup};
use crate::location::LocationFix;
use crate::poll::{spawn_poll, PollOutcome, PollSettings};
use crate::speech::{Speaker, Voice};

#[derive(Debug, Clone, PartialEq)]
pub enum SessionState {
    Idle,
    Submitting { coordinates: Coordinates },
    Waiting { id: i64, status: Option<QueryStatus> },
    Answered { id: i64, text: String },
    Failed { id: Option<i64>, reason: String },
    TimedOut { id: i64 },
}

impl SessionState {
    pub fn is_busy(&self) -> bool {
        matches!(
            self,
            SessionState::Submitting { .. } | SessionState::Waiting { .. }
        )
    }

    fn waiting_on(&self) -> Option<i64> {
        match self {
            SessionState::Waiting { id, .. } => Some(*id),
            _ => None,
        }
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionState::Idle => write!(f, "Waiting for location..."),
            SessionState::Submitting { coordinates } => write!(
                f,
                "Sending {:.5}, {:.5} to server...",
                coordinates.latitude, coordinates.longitude
            ),
            SessionState::Waiting { status: None, .. } => {
                write!(f, "Location sent! Waiting for response...")
            }
            SessionState::Waiting {
                status: Some(status),
                ..
            } => write!(f, "Waiting for reply... Status: {status}"),
            SessionState::Answered { text, .. } => write!(f, "Final response: {text}"),
            SessionState::Failed { reason, .. } => write!(f, "{reason}"),
            SessionState::TimedOut { id } => write!(f, "Gave up waiting for entry {id}"),
        }
    }
}

/// Everything the user sees.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionView {
    pub state: SessionState,
    pub coordinates: Option<Coordinates>,
    pub place: Option<Place>,
    /// Set when the last address lookup failed; does not affect `state`.
    pub address_error: Option<String>,
    /// Set while the current poll loop is retrying a failed read.
    pub poll_error: Option<String>,
}

impl Default for SessionView {
    fn default() -> Self {
        Self {
            state: SessionState::Idle,
            coordinates: None,
            place: None,
            address_error: None,
            poll_error: None,
        }
    }
}

/// Messages from poll tasks back to the session.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    Progress { id: i64, status: QueryStatus },
    PollError { id: i64, message: String },
    Finished { id: i64, outcome: PollOutcome },
}

impl SessionEvent {
    fn id(&self) -> i64 {
        match self {
            SessionEvent::Progress { id, .. }
            | SessionEvent::PollError { id, .. }
            | SessionEvent::Finished { id, .. } => *id,
        }
    }
}

#[derive(Debug, Clone)]
pub struct SessionSettings {
    pub question: String,
    pub context_tag: String,
    pub poll: PollSettings,
    pub voice: Voice,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            question: "What is this place?".to_string(),
            context_tag: "trail".to_string(),
            poll: PollSettings::default(),
            voice: Voice::default(),
        }
    }
}

pub struct Session {
    submitter: Arc<dyn QuerySubmitter>,
    reader: Arc<dyn EntryReader>,
    places: Arc<dyn PlaceLookup>,
    speaker: Arc<dyn Speaker>,
    settings: SessionSettings,
    view: SessionView,
    publisher: watch::Sender<SessionView>,
    events_tx: mpsc::Sender<SessionEvent>,
    events_rx: mpsc::Receiver<SessionEvent>,
    poll_task: Option<JoinHandle<()>>,
}

impl Session {
    pub fn new(
        submitter: Arc<dyn QuerySubmitter>,
        reader: Arc<dyn EntryReader>,
        places: Arc<dyn PlaceLookup>,
        speaker: Arc<dyn Speaker>,
        settings: SessionSettings,
    ) -> (Self, watch::Receiver<SessionView>) {
        let (publisher, view_rx) = watch::channel(SessionView::default());
        let (events_tx, events_rx) = mpsc::channel(64);
        let session = Self {
            submitter,
            reader,
            places,
            speaker,
            settings,
            view: SessionView::default(),
            publisher,
            events_tx,
            events_rx,
            poll_task: None,
        };
        (session, view_rx)
    }

    /// Processes fixes until the fix source closes and the current query
    /// (if any) has finished. Returns the final view.
    pub async fn run(mut self, mut fixes: mpsc::Receiver<LocationFix>) -> SessionView {
        let mut fixes_open = true;

        loop {
            if !fixes_open && !self.view.state.is_busy() {
                break;
            }

            tokio::select! {
                fix = fixes.recv(), if fixes_open => match fix {
                    Some(fix) => self.handle_fix(fix).await,
                    None => fixes_open = false,
                },
                Some(event) = self.events_rx.recv() => self.apply(event),
                else => break,
            }
        }

        self.cancel_poll();
        self.view
    }

    async fn handle_fix(&mut self, fix: LocationFix) {
        self.cancel_poll();

        let coordinates = fix.coordinates;
        info!(
            "Location fix {:.5}, {:.5} at {}",
            coordinates.latitude, coordinates.longitude, fix.timestamp
        );
        self.view.coordinates = Some(coordinates);
        self.view.poll_error = None;
        self.transition(SessionState::Submitting { coordinates });

        let submitted = self
            .submitter
            .create(coordinates, &self.settings.question, &self.settings.context_tag)
            .await;

        // The address is display-only, so it is looked up whether or not the
        // submission went through.
        match self.places.reverse(coordinates).await {
            Ok(place) => {
                self.view.place = Some(place);
                self.view.address_error = None;
            }
            Err(e) => {
                warn!("Reverse geocoding failed: {e}");
                self.view.address_error = Some("Failed to load address info".to_string());
            }
        }

        match submitted {
            Ok(id) => {
                info!("Submitted query {id}");
                self.transition(SessionState::Waiting { id, status: None });
                self.poll_task = Some(spawn_poll(
                    id,
                    Arc::clone(&self.reader),
                    self.settings.poll.clone(),
                    self.events_tx.clone(),
                ));
            }
            Err(e) => {
                error!("Error sending to server: {e}");
                self.transition(SessionState::Failed {
                    id: None,
                    reason: "Failed to send to server.".to_string(),
                });
            }
        }
    }

    fn apply(&mut self, event: SessionEvent) {
        let id = event.id();
        if self.view.state.waiting_on() != Some(id) {
            info!("Ignoring event for superseded entry {id}");
            return;
        }

        match event {
            SessionEvent::Progress { status, .. } => {
                self.view.poll_error = None;
                self.transition(SessionState::Waiting {
                    id,
                    status: Some(status),
                });
            }
            SessionEvent::PollError { message, .. } => {
                self.view.poll_error = Some(message);
                self.publish();
            }
            SessionEvent::Finished { outcome, .. } => {
                self.poll_task = None;
                let next = match outcome {
                    PollOutcome::Answered(text) => {
                        self.speaker.speak(&text, &self.settings.voice);
                        SessionState::Answered { id, text }
                    }
                    PollOutcome::Failed(detail) => SessionState::Failed {
                        id: Some(id),
                        reason: match detail {
                            Some(detail) => format!("The responder reported an error: {detail}"),
                            None => "The responder reported an error".to_string(),
                        },
                    },
                    PollOutcome::Exhausted { attempts } => {
                        warn!("Entry {id} still pending after {attempts} reads");
                        SessionState::TimedOut { id }
                    }
                    PollOutcome::TimedOut => SessionState::TimedOut { id },
                };
                self.transition(next);
            }
        }
    }

    fn transition(&mut self, next: SessionState) {
        info!("Session: {} -> {}", self.view.state, next);
        self.view.state = next;
        self.publish();
    }

    fn publish(&self) {
        self.publisher.send_replace(self.view.clone());
    }

    fn cancel_poll(&mut self) {
        if let Some(task) = self.poll_task.take() {
            task.abort();
        }
    }
}
