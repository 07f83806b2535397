// Core data structures for the leadscan scanner

use serde::{Deserialize, Serialize};

use crate::utils::{now_millis, truncate_chars};

/// Maximum number of characters kept in [`PostRecord::preview`]
pub const PREVIEW_LEN: usize = 200;

/// A post surfaced as a hiring lead
///
/// Two records with the same `id` describe the same post.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostRecord {
    pub id: String,
    pub author_name: Option<String>,
    pub profile_url: Option<String>,
    pub post_url: Option<String>,
    pub preview: String, // first 200 chars of full_text
    pub full_text: String,
    /// Epoch milliseconds
    #[serde(default)]
    pub timestamp: i64,
    /// Advisory metadata from the AI stage, when it ran
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub analysis: Option<ClassificationResult>,
}

impl PostRecord {
    /// Build a record from extracted text, deriving the preview
    pub fn new(id: impl Into<String>, full_text: impl Into<String>) -> Self {
        let full_text = full_text.into();
        Self {
            id: id.into(),
            author_name: None,
            profile_url: None,
            post_url: None,
            preview: truncate_chars(&full_text, PREVIEW_LEN),
            full_text,
            timestamp: now_millis(),
            analysis: None,
        }
    }

    pub fn with_author(mut self, name: Option<String>, profile_url: Option<String>) -> Self {
        self.author_name = name;
        self.profile_url = profile_url;
        self
    }

    pub fn with_post_url(mut self, post_url: Option<String>) -> Self {
        self.post_url = post_url;
        self
    }

    pub fn with_analysis(mut self, analysis: Option<ClassificationResult>) -> Self {
        self.analysis = analysis;
        self
    }
}

/// Outcome of the AI-assisted classification stage
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassificationResult {
    pub is_hiring: bool,
    /// Confidence in `[0, 1]`
    pub confidence: f32,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub summary: String,
}

impl ClassificationResult {
    /// Permissive default used whenever the AI stage cannot produce an answer
    pub fn fail_open(summary: impl Into<String>) -> Self {
        Self {
            is_hiring: true,
            confidence: 0.0,
            role: None,
            summary: summary.into(),
        }
    }

    /// Clamp confidence into `[0, 1]`; NaN collapses to 0
    pub fn normalized(mut self) -> Self {
        self.confidence = if self.confidence.is_nan() {
            0.0
        } else {
            self.confidence.clamp(0.0, 1.0)
        };
        self
    }
}

/// Opaque handle to the browsing surface a scan drives
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SurfaceHandle(pub uuid::Uuid);

impl SurfaceHandle {
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4())
    }
}

impl Default for SurfaceHandle {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SurfaceHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// State of one keyword-driven scan run
///
/// Replaced wholesale on every start, never persisted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanState {
    pub is_scanning: bool,
    pub current_keyword_index: usize,
    pub collected_posts: Vec<PostRecord>,
    pub scan_tab_id: Option<SurfaceHandle>,
}

impl ScanState {
    /// Fresh state for a run that is about to begin
    pub fn started() -> Self {
        Self {
            is_scanning: true,
            ..Default::default()
        }
    }

    /// Append posts whose id has not been collected yet; first-seen wins.
    /// Returns how many were added.
    pub fn merge(&mut self, posts: Vec<PostRecord>) -> usize {
        let mut added = 0;
        for post in posts {
            if !self.collected_posts.iter().any(|p| p.id == post.id) {
                self.collected_posts.push(post);
                added += 1;
            }
        }
        added
    }
}

/// Snapshot answered to `GET_SCAN_STATUS`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanStatus {
    pub is_scanning: bool,
    /// `None` once the index has run past the corpus
    pub current_keyword: Option<String>,
    /// `"i/total"`
    pub progress: String,
    pub collected_count: usize,
    pub collected_posts: Vec<PostRecord>,
}

/// Persisted detection counters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetectionCounters {
    #[serde(default)]
    pub detected_count: u64,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// Newest first
    #[serde(default)]
    pub recent_detections: Vec<PostRecord>,
}

fn default_enabled() -> bool {
    true
}

impl Default for DetectionCounters {
    fn default() -> Self {
        Self {
            detected_count: 0,
            enabled: true,
            recent_detections: Vec::new(),
        }
    }
}

impl DetectionCounters {
    /// Count a detection and push it to the front of the history,
    /// trimming the history to `cap` entries.
    pub fn record(&mut self, post: PostRecord, cap: usize) -> u64 {
        self.detected_count += 1;
        self.recent_detections.insert(0, post);
        self.recent_detections.truncate(cap);
        self.detected_count
    }

    pub fn reset(&mut self) {
        self.detected_count = 0;
        self.recent_detections.clear();
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            detected_count: self.detected_count,
            enabled: self.enabled,
            recent_detections: self.recent_detections.clone(),
        }
    }
}

/// Answer to `GET_STATS`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsSnapshot {
    pub detected_count: u64,
    pub enabled: bool,
    pub recent_detections: Vec<PostRecord>,
}
