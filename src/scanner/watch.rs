//! Page-scoped background tasks
//!
//! Every page load starts a fresh [`PageContext`]; the tasks of the previous
//! page are aborted with it, the way navigation tears down a page's timers.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, sleep, Instant, MissedTickBehavior};

use crate::scanner::Reporter;
use crate::surface::Page;

/// Tasks bound to the page currently shown
#[derive(Default)]
pub struct PageContext {
    tasks: Vec<JoinHandle<()>>,
    observing: Arc<AtomicBool>,
}

impl PageContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run a task until it finishes or the page goes away
    pub fn spawn<F>(&mut self, task: F)
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        self.tasks.retain(|handle| !handle.is_finished());
        self.tasks.push(tokio::spawn(task));
    }

    /// Whether mutation-triggered rescans are active
    pub fn is_observing(&self) -> bool {
        self.observing.load(Ordering::SeqCst)
    }

    /// Start passive scanning: one scan after `initial_delay` (which also
    /// enables mutation-triggered rescans), plus one every `poll_interval`.
    pub fn start_passive(
        &mut self,
        reporter: Reporter,
        current: watch::Receiver<Option<Page>>,
        initial_delay: Duration,
        poll_interval: Duration,
    ) {
        let observing = Arc::clone(&self.observing);
        let initial_reporter = reporter.clone();
        let initial_current = current.clone();
        self.spawn(async move {
            sleep(initial_delay).await;
            tracing::debug!("Starting initial scan after delay");
            scan_current(&initial_reporter, &initial_current).await;
            observing.store(true, Ordering::SeqCst);
            tracing::debug!("Watching for new posts");
        });

        self.spawn(async move {
            let mut ticker = interval_at(Instant::now() + poll_interval, poll_interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                ticker.tick().await;
                scan_current(&reporter, &current).await;
            }
        });
    }
}

impl Drop for PageContext {
    fn drop(&mut self) {
        for handle in &self.tasks {
            handle.abort();
        }
    }
}

/// Scan whatever the page shows right now
pub async fn scan_current(reporter: &Reporter, current: &watch::Receiver<Option<Page>>) -> usize {
    let html = match current.borrow().as_ref() {
        Some(page) => page.html.clone(),
        None => return 0,
    };
    reporter.scan_posts(&html).await
}
