//! Post discovery on feed and search-result pages
//!
//! [`Html`] is not `Send`, so everything here runs synchronously and hands
//! back owned [`PostCandidate`]s that can cross `.await` points.

use scraper::{ElementRef, Html};

use crate::models::PostRecord;
use crate::parser::extract::{post_id, ContentExtractor};
use crate::parser::selectors::FeedSelectors;

/// A post extracted from a page, before classification
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostCandidate {
    pub id: String,
    pub text: String,
    pub author_name: Option<String>,
    pub profile_url: Option<String>,
    pub post_url: Option<String>,
}

impl PostCandidate {
    pub fn into_record(self) -> PostRecord {
        PostRecord::new(self.id, self.text)
            .with_author(self.author_name, self.profile_url)
            .with_post_url(self.post_url)
    }
}

/// Locate post nodes: the first container selector with any match wins,
/// otherwise every `div` holding both a post body and a profile link.
pub fn discover_posts<'a>(document: &'a Html, selectors: &FeedSelectors) -> Vec<ElementRef<'a>> {
    for named in selectors.posts {
        let found: Vec<_> = document.select(&named.selector).collect();
        tracing::trace!(selector = named.css, count = found.len(), "Trying post selector");
        if !found.is_empty() {
            tracing::debug!(selector = named.css, count = found.len(), "Posts located");
            return found;
        }
    }

    let fallback: Vec<_> = document
        .select(selectors.any_div)
        .filter(|div| {
            div.select(selectors.fallback_body).next().is_some()
                && div.select(selectors.profile_link).next().is_some()
        })
        .collect();

    if fallback.is_empty() {
        tracing::warn!("No posts found, structure may have changed");
    } else {
        tracing::debug!(count = fallback.len(), "Fallback located posts");
    }
    fallback
}

impl ContentExtractor {
    /// Extract text and metadata from one post node
    pub fn candidate(&self, node: ElementRef<'_>) -> PostCandidate {
        PostCandidate {
            id: post_id(node),
            text: self.extract_text(node),
            author_name: self.author_name(node),
            profile_url: self.profile_url(node),
            post_url: self.post_url(node),
        }
    }

    /// Extract every discovered post whose id `claim` accepts
    ///
    /// `claim` runs before extraction, so a rejected id costs nothing beyond
    /// discovery. Posts with text shorter than the minimum length are dropped
    /// after being claimed.
    pub fn claim_candidates(
        &self,
        html: &str,
        mut claim: impl FnMut(&str) -> bool,
    ) -> Vec<PostCandidate> {
        let document = Html::parse_document(html);
        let mut candidates = Vec::new();

        for node in discover_posts(&document, self.selectors()) {
            let id = post_id(node);
            if !claim(&id) {
                continue;
            }

            let candidate = self.candidate(node);
            if candidate.text.chars().count() < self.min_text_len() {
                tracing::debug!(post_id = %truncate_id(&id), "Post text too short, skipping");
                continue;
            }
            candidates.push(candidate);
        }

        candidates
    }

    /// Extract every post matched by the batch container selector, unfiltered
    pub fn batch_candidates(&self, html: &str) -> Vec<PostCandidate> {
        let document = Html::parse_document(html);
        document
            .select(self.selectors().batch)
            .map(|node| self.candidate(node))
            .collect()
    }
}

/// Whether a page fragment contains a freshly rendered post
pub fn has_new_posts(html: &str, selectors: &FeedSelectors) -> bool {
    Html::parse_fragment(html)
        .select(selectors.new_post_marker)
        .next()
        .is_some()
}

fn truncate_id(id: &str) -> String {
    crate::utils::truncate_chars(id, 40)
}
