//! HTML parsing and post extraction
//!
//! This module handles locating posts on feed and search-result pages and
//! turning them into normalized text plus author/post metadata.

pub mod extract;
pub mod feed;
pub mod sanitize;
pub mod selectors;

// Re-export main extractor and public types
pub use extract::{post_id, ContentExtractor, Tier, TIERS};
pub use feed::{discover_posts, has_new_posts, PostCandidate};
pub use sanitize::clean_text;
pub use selectors::FeedSelectors;
