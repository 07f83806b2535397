//! Background coordinator
//!
//! Owns the scan orchestrator and the detection counters collaborator, and
//! carries out the orchestrator's effects.
//!
//! # Architecture
//!
//! ```text
//! control ──START/STOP/STATUS/STATS──▶ ┌──────────────────────┐
//!                                      │     Coordinator      │
//! scanner ──BATCH/POST_DETECTED──────▶ │  ScanOrchestrator    │
//!                                      │  DetectionStore      │
//!                                      └──────────┬───────────┘
//!                                                 │ navigate
//!                                                 ▼
//!                                      BrowsingSurface ──Loaded──▶ scanner
//! ```
//!
//! The orchestrator is touched only from the coordinator task, so no locks
//! guard the scan state. Timers and navigations run on spawned tasks and
//! report back through an internal channel tagged with the run they belong to.

pub mod machine;

pub use machine::{Effect, LoopGuard, Phase, ScanOrchestrator};

use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::Instant;

use crate::bus::{ControlFeed, Envelope, Inbox, Message, Reply};
use crate::models::SurfaceHandle;
use crate::scanner::{PageEvent, PageEvents};
use crate::storage::DetectionStore;
use crate::surface::BrowsingSurface;
use crate::utils::error::FetchError;

/// Completions of work spawned by the coordinator
#[derive(Debug)]
enum Internal {
    SurfaceReady {
        run: u64,
        result: Result<SurfaceHandle, FetchError>,
    },
    Tick {
        run: u64,
    },
}

/// Background coordinator task state
pub struct Coordinator {
    machine: ScanOrchestrator,
    surface: Arc<dyn BrowsingSurface>,
    store: Arc<dyn DetectionStore>,
    pages: PageEvents,
    control: ControlFeed,
    internal: mpsc::UnboundedSender<Internal>,
    internal_rx: Option<mpsc::UnboundedReceiver<Internal>>,
}

impl Coordinator {
    pub fn new(
        machine: ScanOrchestrator,
        surface: Arc<dyn BrowsingSurface>,
        store: Arc<dyn DetectionStore>,
        pages: PageEvents,
        control: ControlFeed,
    ) -> Self {
        let (internal, internal_rx) = mpsc::unbounded_channel();
        Self {
            machine,
            surface,
            store,
            pages,
            control,
            internal,
            internal_rx: Some(internal_rx),
        }
    }

    /// Run the coordinator on its own task
    pub fn spawn(self, inbox: Inbox) -> JoinHandle<()> {
        tokio::spawn(self.run(inbox))
    }

    /// Process messages until the inbox closes
    pub async fn run(mut self, mut inbox: Inbox) {
        let Some(mut internal_rx) = self.internal_rx.take() else {
            return;
        };

        loop {
            tokio::select! {
                envelope = inbox.recv() => match envelope {
                    Some(envelope) => self.on_envelope(envelope).await,
                    None => break,
                },
                Some(event) = internal_rx.recv() => self.on_internal(event),
            }
        }

        tracing::debug!("Coordinator stopped");
    }

    async fn on_envelope(&mut self, envelope: Envelope) {
        let (message, responder) = envelope.into_parts();
        tracing::debug!(kind = message.kind(), "Received message");

        match message {
            Message::StartAutoScan => {
                let effect = self.machine.start();
                self.apply(effect);
                responder.send(Reply::ok());
            }
            Message::StopAutoScan => {
                self.machine.stop();
                responder.send(Reply::ok());
            }
            Message::GetScanStatus => {
                responder.send(Reply::Status(self.machine.status()));
            }
            Message::ScanBatchComplete { posts } => {
                if let Some(effect) = self.machine.on_batch(posts) {
                    self.apply(effect);
                }
            }
            Message::PostDetected(post) => {
                let post_id = post.id.clone();
                match self.store.record_detection(post).await {
                    Ok(total) => tracing::info!(post_id = %post_id, total, "Detection recorded"),
                    Err(e) => tracing::warn!(post_id = %post_id, error = %e, "Failed to record detection"),
                }
            }
            Message::GetStats => match self.store.stats().await {
                Ok(stats) => responder.send(Reply::Stats(stats)),
                Err(e) => responder.send(Reply::failed(e.to_string())),
            },
            Message::ResetStats => match self.store.reset().await {
                Ok(()) => {
                    tracing::info!("Statistics reset");
                    responder.send(Reply::ok());
                }
                Err(e) => responder.send(Reply::failed(e.to_string())),
            },
            other @ (Message::ManualScan | Message::ScanComplete { .. }) => {
                tracing::warn!(kind = other.kind(), "Unknown message type");
                responder.send(Reply::failed(format!("unsupported: {}", other.kind())));
            }
        }
    }

    fn on_internal(&mut self, event: Internal) {
        match event {
            Internal::SurfaceReady { run, result } if run == self.machine.run_id() => match result {
                Ok(handle) => {
                    if let Some(effect) = self.machine.surface_ready(handle, Instant::now()) {
                        self.apply(effect);
                    }
                }
                Err(e) => tracing::error!(error = %e, "Could not acquire a browsing surface"),
            },
            Internal::Tick { run } if run == self.machine.run_id() => {
                if let Some(effect) = self.machine.next_navigation(Instant::now()) {
                    self.apply(effect);
                }
            }
            stale => tracing::debug!(?stale, "Dropping event from a previous run"),
        }
    }

    fn apply(&self, effect: Effect) {
        let run = self.machine.run_id();
        match effect {
            Effect::AcquireSurface => {
                let surface = Arc::clone(&self.surface);
                let internal = self.internal.clone();
                tokio::spawn(async move {
                    let result = surface.open().await;
                    let _ = internal.send(Internal::SurfaceReady { run, result });
                });
            }
            Effect::Navigate {
                handle,
                index,
                url,
                ..
            } => {
                let surface = Arc::clone(&self.surface);
                let pages = self.pages.clone();
                tokio::spawn(async move {
                    match surface.navigate(handle, &url).await {
                        Ok(page) => {
                            tracing::debug!(index, "Navigated to search URL");
                            if pages.send(PageEvent::Loaded(page)).is_err() {
                                tracing::debug!("Scanner gone, page dropped");
                            }
                        }
                        // No retry: the run stays on this keyword until stopped or restarted
                        Err(e) => tracing::warn!(index, url = %url, error = %e, "Navigation failed"),
                    }
                });
            }
            Effect::ScheduleNext(delay) => {
                let internal = self.internal.clone();
                tokio::spawn(async move {
                    tokio::time::sleep(delay).await;
                    let _ = internal.send(Internal::Tick { run });
                });
            }
            Effect::Complete { count } => {
                self.control.publish(Message::ScanComplete { count });
            }
        }
    }
}
