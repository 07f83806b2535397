//! Page-scanning process
//!
//! Reacts to page events from the browsing surface and to `MANUAL_SCAN`
//! requests, runs the detection pipeline and reports to the coordinator:
//! - search views: wait for the page to settle, detect, then report the
//!   whole keyword-matching batch
//! - other pages: initial scan after a delay, interval polling and
//!   rescans when new posts are rendered

pub mod pipeline;
pub mod watch;

pub use pipeline::DetectionPipeline;
pub use watch::PageContext;

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch as state};
use tokio::task::JoinHandle;

use crate::bus::{Endpoint, Envelope, Inbox, Message, Reply};
use crate::config::ScannerConfig;
use crate::corpus::is_search_page;
use crate::parser::{has_new_posts, FeedSelectors};
use crate::surface::Page;

/// Events delivered by the browsing surface
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageEvent {
    /// Navigation finished and the page is rendered
    Loaded(Page),
    /// Markup was added to the current page
    Mutated { added: String },
}

/// Sender side of the scanner's page event stream
pub type PageEvents = mpsc::UnboundedSender<PageEvent>;

/// Scanner timings
#[derive(Debug, Clone, Copy)]
pub struct ScanTimings {
    pub search_settle_delay: Duration,
    pub initial_scan_delay: Duration,
    pub poll_interval: Duration,
}

impl From<&ScannerConfig> for ScanTimings {
    fn from(config: &ScannerConfig) -> Self {
        Self {
            search_settle_delay: Duration::from_millis(config.search_settle_delay_ms),
            initial_scan_delay: Duration::from_millis(config.initial_scan_delay_ms),
            poll_interval: Duration::from_millis(config.poll_interval_ms),
        }
    }
}

impl Default for ScanTimings {
    fn default() -> Self {
        Self::from(&ScannerConfig::default())
    }
}

/// Runs the pipeline and forwards its output to the coordinator
#[derive(Clone)]
pub struct Reporter {
    pipeline: Arc<DetectionPipeline>,
    coordinator: Endpoint,
}

impl Reporter {
    pub fn new(pipeline: Arc<DetectionPipeline>, coordinator: Endpoint) -> Self {
        Self {
            pipeline,
            coordinator,
        }
    }

    /// Detect new hiring posts and send one `POST_DETECTED` each
    pub async fn scan_posts(&self, html: &str) -> usize {
        let detections = self.pipeline.scan(html).await;
        let count = detections.len();
        for post in detections {
            self.coordinator.notify(Message::PostDetected(post));
        }
        count
    }

    /// Detect, then report every keyword-matching post as one batch
    pub async fn collect_and_report(&self, html: &str) -> usize {
        tracing::info!("Collecting search results");
        self.scan_posts(html).await;

        let posts = self.pipeline.collect_batch(html);
        let count = posts.len();
        tracing::info!(count, "Reporting batch to coordinator");
        self.coordinator.notify(Message::ScanBatchComplete { posts });
        count
    }
}

/// The page-scanning process
pub struct Scanner {
    reporter: Reporter,
    timings: ScanTimings,
    selectors: FeedSelectors,
    current: state::Sender<Option<Page>>,
    context: PageContext,
}

impl Scanner {
    pub fn new(pipeline: Arc<DetectionPipeline>, coordinator: Endpoint, timings: ScanTimings) -> Self {
        let (current, _) = state::channel(None);
        Self {
            reporter: Reporter::new(pipeline, coordinator),
            timings,
            selectors: FeedSelectors::new(),
            current,
            context: PageContext::new(),
        }
    }

    /// Run the scanner on its own task
    pub fn spawn(
        self,
        inbox: Inbox,
        pages: mpsc::UnboundedReceiver<PageEvent>,
    ) -> JoinHandle<()> {
        tokio::spawn(self.run(inbox, pages))
    }

    /// Process requests and page events until both channels close
    pub async fn run(mut self, mut inbox: Inbox, mut pages: mpsc::UnboundedReceiver<PageEvent>) {
        let mut inbox_open = true;
        let mut pages_open = true;

        while inbox_open || pages_open {
            // Page events queued before a request are handled first
            tokio::select! {
                biased;

                event = pages.recv(), if pages_open => match event {
                    Some(PageEvent::Loaded(page)) => self.on_page_loaded(page),
                    Some(PageEvent::Mutated { added }) => self.on_mutation(added),
                    None => pages_open = false,
                },
                envelope = inbox.recv(), if inbox_open => match envelope {
                    Some(envelope) => self.on_envelope(envelope),
                    None => inbox_open = false,
                },
            }
        }

        tracing::debug!("Scanner stopped");
    }

    fn on_page_loaded(&mut self, page: Page) {
        tracing::info!(url = %page.url, "Page loaded");
        let search_view = is_search_page(&page.url);

        // Navigation tears down the previous page's tasks
        self.context = PageContext::new();
        self.current.send_replace(Some(page));

        if search_view {
            tracing::info!("Active search mode detected");
            let reporter = self.reporter.clone();
            let current = self.current.subscribe();
            let settle = self.timings.search_settle_delay;
            self.context.spawn(async move {
                tokio::time::sleep(settle).await;
                let html = current.borrow().as_ref().map(|page| page.html.clone());
                if let Some(html) = html {
                    reporter.collect_and_report(&html).await;
                }
            });
        } else {
            self.context.start_passive(
                self.reporter.clone(),
                self.current.subscribe(),
                self.timings.initial_scan_delay,
                self.timings.poll_interval,
            );
        }
    }

    fn on_mutation(&mut self, added: String) {
        let mut appended = false;
        self.current.send_if_modified(|page| match page {
            Some(page) => {
                page.html.push_str(&added);
                appended = true;
                true
            }
            None => false,
        });
        if !appended {
            return;
        }

        if self.context.is_observing() && has_new_posts(&added, &self.selectors) {
            tracing::debug!("New content detected, scanning");
            let reporter = self.reporter.clone();
            let current = self.current.subscribe();
            self.context.spawn(async move {
                watch::scan_current(&reporter, &current).await;
            });
        }
    }

    fn on_envelope(&mut self, envelope: Envelope) {
        let (message, responder) = envelope.into_parts();
        match message {
            Message::ManualScan => {
                tracing::info!("Manual scan triggered");
                let html = self.current.borrow().as_ref().map(|page| page.html.clone());
                let Some(html) = html else {
                    responder.send(Reply::failed("No page loaded"));
                    return;
                };

                // Not page-scoped: a navigation must not drop the reply
                let reporter = self.reporter.clone();
                tokio::spawn(async move {
                    let count = reporter.scan_posts(&html).await;
                    tracing::info!(count, "Manual scan finished");
                    responder.send(Reply::ok());
                });
            }
            other => {
                tracing::warn!(kind = other.kind(), "Unknown message type");
                responder.send(Reply::failed(format!("unsupported: {}", other.kind())));
            }
        }
    }
}
