//! Storage for processed-post identifiers and detection counters
//!
//! - [`dedup`] - in-process set of post ids already handled by the scanner
//! - [`counters`] - durable detection count, feature flag and history

pub mod counters;
pub mod dedup;

pub use counters::{DetectionStore, JsonFileStore, MemoryStore, DEFAULT_HISTORY_CAP};
pub use dedup::DedupStore;
