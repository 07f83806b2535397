//! leadscan - keyword-driven hiring lead scanner
//!
//! Walks a corpus of hiring-intent search phrases through a social feed's
//! search view, extracts post text with a tolerant selector cascade and flags
//! the posts that read as hiring leads.
//!
//! # Architecture
//!
//! The library is organized into several modules:
//!
//! - [`config`] - Configuration management and settings
//! - [`corpus`] - Search keyword corpus and search URLs
//! - [`parser`] - Post discovery and text/metadata extraction
//! - [`classifier`] - Keyword gate plus optional AI-assisted analysis
//! - [`llm`] - Text-generation client used by the AI stage
//! - [`storage`] - Dedup set and persisted detection counters
//! - [`bus`] - Typed messages between the cooperating processes
//! - [`surface`] - Browsing surface (HTTP or saved snapshots)
//! - [`scanner`] - Page-scanning process
//! - [`coordinator`] - Background coordinator and scan orchestration
//! - [`system`] - Wiring of the processes
//! - [`models`] - Core data structures and types
//! - [`utils`] - Common utilities and helpers
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use leadscan::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::from_env()?;
//!     let system = System::spawn(
//!         &config,
//!         KeywordCorpus::default(),
//!         Arc::new(SnapshotSurface::new("./snapshots")),
//!         Arc::new(MemoryStore::default()),
//!         Classifier::new(),
//!     );
//!     system.start_auto_scan().await?;
//!     Ok(())
//! }
//! ```

pub mod bus;
pub mod classifier;
pub mod config;
pub mod coordinator;
pub mod corpus;
pub mod error;
pub mod llm;
pub mod models;
pub mod parser;
pub mod scanner;
pub mod storage;
pub mod surface;
pub mod system;
pub mod utils;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::bus::{Ack, Message, Reply};
    pub use crate::classifier::{Classifier, HiringAnalyzer};
    pub use crate::config::Config;
    pub use crate::corpus::KeywordCorpus;
    pub use crate::error::{Error, ErrorCategory, LeadscanErrorTrait, Result};
    pub use crate::llm::GeminiClient;
    pub use crate::models::{ClassificationResult, PostRecord, ScanStatus, StatsSnapshot};
    pub use crate::parser::ContentExtractor;
    pub use crate::storage::{DetectionStore, JsonFileStore, MemoryStore};
    pub use crate::surface::{BrowsingSurface, HttpSurface, Page, SnapshotSurface};
    pub use crate::system::System;
}

// Direct re-exports for convenience
pub use models::{PostRecord, ScanStatus, StatsSnapshot};
