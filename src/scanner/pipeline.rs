//! Detection pipeline: dedup, extraction, classification
//!
//! Safe to run concurrently from several scans over the same page; the dedup
//! claim is the only shared mutation and it is atomic.

use crate::classifier::Classifier;
use crate::config::ScannerConfig;
use crate::models::PostRecord;
use crate::parser::{ContentExtractor, PostCandidate};
use crate::storage::DedupStore;
use crate::utils::truncate_chars;

/// Extractor, classifier and the scanner's processed-post set
pub struct DetectionPipeline {
    extractor: ContentExtractor,
    classifier: Classifier,
    dedup: DedupStore,
}

impl DetectionPipeline {
    pub fn new(extractor: ContentExtractor, classifier: Classifier) -> Self {
        Self {
            extractor,
            classifier,
            dedup: DedupStore::new(),
        }
    }

    pub fn from_config(config: &ScannerConfig, classifier: Classifier) -> Self {
        Self::new(
            ContentExtractor::new(config.min_text_len, config.site_origin.clone()),
            classifier,
        )
    }

    pub fn dedup(&self) -> &DedupStore {
        &self.dedup
    }

    /// Run the detection path over every post on the page not seen before
    ///
    /// Each post is claimed in the dedup set before extraction, so it is
    /// processed at most once whatever the outcome. Returns the hiring leads.
    pub async fn scan(&self, html: &str) -> Vec<PostRecord> {
        let candidates = self
            .extractor
            .claim_candidates(html, |id| self.dedup.mark(id));

        tracing::debug!(count = candidates.len(), "Scanning new posts");

        let mut detections = Vec::new();
        for candidate in candidates {
            if let Some(record) = self.detect(candidate).await {
                detections.push(record);
            }
        }
        detections
    }

    async fn detect(&self, candidate: PostCandidate) -> Option<PostRecord> {
        let verdict = self.classifier.classify(&candidate.text).await;
        if !verdict.is_lead {
            tracing::trace!(post_id = %candidate.id, "No hiring keywords");
            return None;
        }

        tracing::info!(
            post_id = %candidate.id,
            author = candidate.author_name.as_deref().unwrap_or("unknown"),
            keyword = verdict.matched_keyword.as_deref().unwrap_or_default(),
            preview = %truncate_chars(&candidate.text, 80),
            "Found hiring post"
        );

        Some(candidate.into_record().with_analysis(verdict.analysis))
    }

    /// Every keyword-matching post on the page, regardless of the dedup set
    pub fn collect_batch(&self, html: &str) -> Vec<PostRecord> {
        self.extractor
            .batch_candidates(html)
            .into_iter()
            .filter(|c| self.classifier.contains_hiring_keywords(&c.text))
            .map(PostCandidate::into_record)
            .collect()
    }
}
