//! Process wiring
//!
//! Builds the three cooperating processes (control surface handle,
//! coordinator, scanner), connects them through the message bus and exposes
//! the control-surface operations as typed async methods.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;

use crate::bus::{endpoint, Ack, BusError, ControlFeed, Endpoint, Message, Reply};
use crate::classifier::Classifier;
use crate::config::Config;
use crate::coordinator::{Coordinator, ScanOrchestrator};
use crate::corpus::KeywordCorpus;
use crate::models::{ScanStatus, StatsSnapshot};
use crate::scanner::{DetectionPipeline, PageEvent, PageEvents, ScanTimings, Scanner};
use crate::storage::DetectionStore;
use crate::surface::{BrowsingSurface, Page};

/// Handle to a running scanner system
pub struct System {
    coordinator: Endpoint,
    scanner: Endpoint,
    pages: PageEvents,
    feed: ControlFeed,
    timeout: Duration,
    tasks: Vec<JoinHandle<()>>,
}

impl System {
    /// Spawn the coordinator and the scanner with the given collaborators
    pub fn spawn(
        config: &Config,
        corpus: KeywordCorpus,
        surface: Arc<dyn BrowsingSurface>,
        store: Arc<dyn DetectionStore>,
        classifier: Classifier,
    ) -> Self {
        let (coordinator, coordinator_inbox) = endpoint("coordinator");
        let (scanner, scanner_inbox) = endpoint("scanner");
        let (pages, page_rx) = mpsc::unbounded_channel();
        let feed = ControlFeed::default();

        let machine = ScanOrchestrator::new(corpus, config.scanner.search_base_url.clone())
            .with_timings(config.settle_delay(), config.loop_cooldown());
        let coordinator_task =
            Coordinator::new(machine, surface, store, pages.clone(), feed.clone())
                .spawn(coordinator_inbox);

        let ai_stage = classifier.has_analyzer();
        let pipeline = Arc::new(DetectionPipeline::from_config(&config.scanner, classifier));
        let scanner_task = Scanner::new(
            pipeline,
            coordinator.clone(),
            ScanTimings::from(&config.scanner),
        )
        .spawn(scanner_inbox, page_rx);

        tracing::debug!(ai_stage, "Scanner system started");

        Self {
            coordinator,
            scanner,
            pages,
            feed,
            timeout: config.bus_timeout(),
            tasks: vec![coordinator_task, scanner_task],
        }
    }

    /// Reply timeout applied to every request
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Coordinator -> control notifications such as `SCAN_COMPLETE`
    pub fn subscribe(&self) -> broadcast::Receiver<Message> {
        self.feed.subscribe()
    }

    /// Show a page to the scanner, as if the user had navigated to it
    pub fn show_page(&self, page: Page) {
        if self.pages.send(PageEvent::Loaded(page)).is_err() {
            tracing::warn!("Scanner is not running, page dropped");
        }
    }

    /// Append rendered markup to the page the scanner is watching
    pub fn render(&self, added: impl Into<String>) {
        let added = added.into();
        if self.pages.send(PageEvent::Mutated { added }).is_err() {
            tracing::warn!("Scanner is not running, mutation dropped");
        }
    }

    pub async fn start_auto_scan(&self) -> Result<Ack, BusError> {
        self.ack(&self.coordinator, Message::StartAutoScan).await
    }

    pub async fn stop_auto_scan(&self) -> Result<Ack, BusError> {
        self.ack(&self.coordinator, Message::StopAutoScan).await
    }

    pub async fn scan_status(&self) -> Result<ScanStatus, BusError> {
        self.coordinator
            .request(Message::GetScanStatus, self.timeout)
            .await?
            .into_status()
            .ok_or(BusError::UnexpectedReply("GET_SCAN_STATUS"))
    }

    pub async fn stats(&self) -> Result<StatsSnapshot, BusError> {
        match self.coordinator.request(Message::GetStats, self.timeout).await? {
            Reply::Stats(stats) => Ok(stats),
            Reply::Ack(ack) => {
                tracing::warn!(error = ?ack.error, "Stats unavailable");
                Err(BusError::UnexpectedReply("GET_STATS"))
            }
            Reply::Status(_) => Err(BusError::UnexpectedReply("GET_STATS")),
        }
    }

    pub async fn reset_stats(&self) -> Result<Ack, BusError> {
        self.ack(&self.coordinator, Message::ResetStats).await
    }

    /// Scan the page currently shown, on demand
    pub async fn manual_scan(&self) -> Result<Ack, BusError> {
        self.ack(&self.scanner, Message::ManualScan).await
    }

    async fn ack(&self, to: &Endpoint, message: Message) -> Result<Ack, BusError> {
        let kind = message.kind();
        to.request(message, self.timeout)
            .await?
            .into_ack()
            .ok_or(BusError::UnexpectedReply(kind))
    }

    /// Stop both processes
    pub async fn shutdown(self) {
        for task in &self.tasks {
            task.abort();
        }
        for task in self.tasks {
            let _ = task.await;
        }
        tracing::debug!("Scanner system stopped");
    }
}
