//! Scan orchestration state machine
//!
//! `Idle -> Scanning(i) -> Completed`. The machine owns [`ScanState`] and
//! performs no I/O: every transition returns the [`Effect`] the event loop
//! has to carry out.

use std::time::Duration;
use tokio::time::Instant;

use crate::corpus::{search_url, KeywordCorpus};
use crate::models::{PostRecord, ScanState, ScanStatus, SurfaceHandle};

/// Default window in which re-issuing the same keyword navigation is dropped
pub const LOOP_COOLDOWN: Duration = Duration::from_secs(5);

/// Default delay between a batch report and the next navigation
pub const SETTLE_DELAY: Duration = Duration::from_secs(3);

// ============================================================================
// Phase and effects
// ============================================================================

/// Observable phase of the orchestrator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Scanning(usize),
    Completed,
}

/// Work the event loop performs on behalf of the machine
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Acquire or open the browsing surface
    AcquireSurface,
    /// Load the search view of one keyword
    Navigate {
        handle: SurfaceHandle,
        index: usize,
        keyword: String,
        url: String,
    },
    /// Ask for the next navigation after a delay
    ScheduleNext(Duration),
    /// The corpus is exhausted
    Complete { count: usize },
}

// ============================================================================
// Loop guard
// ============================================================================

/// Drops a navigation for the same keyword index issued within the cooldown
///
/// Kept across runs: a new start does not clear it.
#[derive(Debug, Clone)]
pub struct LoopGuard {
    last: Option<(usize, Instant)>,
    cooldown: Duration,
}

impl LoopGuard {
    pub fn new(cooldown: Duration) -> Self {
        Self {
            last: None,
            cooldown,
        }
    }

    /// Record the issuance and return `true`, or return `false` when the same
    /// index was issued less than `cooldown` ago.
    pub fn permit(&mut self, index: usize, now: Instant) -> bool {
        if let Some((last_index, last_at)) = self.last {
            if last_index == index && now.saturating_duration_since(last_at) < self.cooldown {
                return false;
            }
        }
        self.last = Some((index, now));
        true
    }
}

// ============================================================================
// Orchestrator
// ============================================================================

/// Keyword-driven scan state machine
pub struct ScanOrchestrator {
    corpus: KeywordCorpus,
    search_base_url: String,
    settle_delay: Duration,
    state: ScanState,
    guard: LoopGuard,
    completed: bool,
    run: u64,
}

impl ScanOrchestrator {
    pub fn new(corpus: KeywordCorpus, search_base_url: impl Into<String>) -> Self {
        Self {
            corpus,
            search_base_url: search_base_url.into(),
            settle_delay: SETTLE_DELAY,
            state: ScanState::default(),
            guard: LoopGuard::new(LOOP_COOLDOWN),
            completed: false,
            run: 0,
        }
    }

    #[must_use]
    pub fn with_timings(mut self, settle_delay: Duration, loop_cooldown: Duration) -> Self {
        self.settle_delay = settle_delay;
        self.guard = LoopGuard::new(loop_cooldown);
        self
    }

    pub fn state(&self) -> &ScanState {
        &self.state
    }

    /// Identifies the current run; bumped on every start
    pub fn run_id(&self) -> u64 {
        self.run
    }

    pub fn phase(&self) -> Phase {
        if self.state.is_scanning {
            Phase::Scanning(self.state.current_keyword_index)
        } else if self.completed {
            Phase::Completed
        } else {
            Phase::Idle
        }
    }

    /// Replace the scan state with a fresh one and start a new run
    pub fn start(&mut self) -> Effect {
        self.state = ScanState::started();
        self.completed = false;
        self.run += 1;
        tracing::info!(run = self.run, keywords = self.corpus.len(), "Starting auto-scan");
        Effect::AcquireSurface
    }

    /// Stop the run; late batch reports and navigations become no-ops
    pub fn stop(&mut self) {
        if self.state.is_scanning {
            tracing::info!(index = self.state.current_keyword_index, "Auto-scan stopped");
        }
        self.state.is_scanning = false;
        self.completed = false;
    }

    /// The surface is ready: remember it and navigate to the current keyword
    pub fn surface_ready(&mut self, handle: SurfaceHandle, now: Instant) -> Option<Effect> {
        if !self.state.is_scanning {
            return None;
        }
        self.state.scan_tab_id = Some(handle);
        self.next_navigation(now)
    }

    /// Merge a batch report and advance to the next keyword
    pub fn on_batch(&mut self, posts: Vec<PostRecord>) -> Option<Effect> {
        if !self.state.is_scanning {
            tracing::debug!(count = posts.len(), "Batch ignored, not scanning");
            return None;
        }

        let received = posts.len();
        let added = self.state.merge(posts);
        self.state.current_keyword_index += 1;
        tracing::info!(
            received,
            added,
            collected = self.state.collected_posts.len(),
            progress = %self.progress(),
            "Batch merged"
        );

        if self.state.current_keyword_index >= self.corpus.len() {
            return Some(self.complete());
        }
        Some(Effect::ScheduleNext(self.settle_delay))
    }

    /// Issue the navigation for the current keyword, subject to the loop guard
    pub fn next_navigation(&mut self, now: Instant) -> Option<Effect> {
        if !self.state.is_scanning {
            return None;
        }

        let index = self.state.current_keyword_index;
        let Some(keyword) = self.corpus.get(index).map(str::to_string) else {
            return Some(self.complete());
        };

        if !self.guard.permit(index, now) {
            tracing::warn!(index, keyword = %keyword, "Loop detected: same keyword requested too quickly, skipping");
            return None;
        }

        let Some(handle) = self.state.scan_tab_id else {
            tracing::warn!(index, "No surface acquired yet");
            return None;
        };

        let url = match search_url(&self.search_base_url, &keyword) {
            Ok(url) => url,
            Err(e) => {
                tracing::error!(error = %e, base = %self.search_base_url, "Cannot build search URL");
                return None;
            }
        };

        tracing::info!(
            index,
            total = self.corpus.len(),
            keyword = %keyword,
            "Scanning keyword"
        );
        Some(Effect::Navigate {
            handle,
            index,
            keyword,
            url,
        })
    }

    fn complete(&mut self) -> Effect {
        self.state.is_scanning = false;
        self.completed = true;
        let count = self.state.collected_posts.len();
        tracing::info!(count, "Auto-scan complete");
        Effect::Complete { count }
    }

    fn progress(&self) -> String {
        format!("{}/{}", self.state.current_keyword_index, self.corpus.len())
    }

    /// Snapshot for `GET_SCAN_STATUS`
    pub fn status(&self) -> ScanStatus {
        ScanStatus {
            is_scanning: self.state.is_scanning,
            current_keyword: self
                .corpus
                .get(self.state.current_keyword_index)
                .map(str::to_string),
            progress: self.progress(),
            collected_count: self.state.collected_posts.len(),
            collected_posts: self.state.collected_posts.clone(),
        }
    }
}
