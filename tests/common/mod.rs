//! Common test utilities

#![allow(dead_code)]

use async_trait::async_trait;
use leadscan::classifier::Classifier;
use leadscan::config::Config;
use leadscan::corpus::{keyword_from_search_url, KeywordCorpus};
use leadscan::models::{PostRecord, SurfaceHandle};
use leadscan::storage::MemoryStore;
use leadscan::surface::{BrowsingSurface, Page};
use leadscan::system::System;
use leadscan::utils::error::FetchError;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Markup of one feed post
pub fn post_html(id: &str, text: &str) -> String {
    format!(
        r#"<div class="feed-shared-update-v2" data-urn="{id}">
            <span class="update-components-actor__name"><span aria-hidden="true">Jane Doe</span></span>
            <a href="/in/jane-doe?miniProfileUrn=abc">Jane Doe</a>
            <div class="feed-shared-inline-show-more-text">{text}</div>
        </div>"#
    )
}

/// A full page holding the given posts
pub fn feed_page(posts: &[(&str, &str)]) -> String {
    let body: String = posts.iter().map(|(id, text)| post_html(id, text)).collect();
    format!("<html><body><main>{body}</main></body></html>")
}

/// Create a test record with default values
pub fn create_test_post(id: &str) -> PostRecord {
    PostRecord::new(id, format!("We are hiring developer for our startup ({id})"))
}

/// In-memory browsing surface answering search views by keyword
#[derive(Default)]
pub struct FixtureSurface {
    pages: HashMap<String, String>,
    navigations: AtomicUsize,
}

impl FixtureSurface {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `html` for the search view of `keyword`
    pub fn with_search_page(mut self, keyword: &str, html: String) -> Self {
        self.pages.insert(keyword.to_string(), html);
        self
    }

    pub fn navigations(&self) -> usize {
        self.navigations.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl BrowsingSurface for FixtureSurface {
    async fn open(&self) -> Result<SurfaceHandle, FetchError> {
        Ok(SurfaceHandle::new())
    }

    async fn navigate(&self, _handle: SurfaceHandle, url: &str) -> Result<Page, FetchError> {
        self.navigations.fetch_add(1, Ordering::SeqCst);
        let html = keyword_from_search_url(url)
            .and_then(|keyword| self.pages.get(&keyword).cloned())
            .ok_or_else(|| FetchError::PageUnavailable(url.to_string()))?;
        Ok(Page {
            url: url.to_string(),
            html,
        })
    }
}

/// Spawn a full system over `keywords` and `surface`, keyword stage only
pub fn spawn_system<S>(keywords: &[&str], surface: S) -> (System, Arc<MemoryStore>)
where
    S: BrowsingSurface + 'static,
{
    let store = Arc::new(MemoryStore::default());
    let system = System::spawn(
        &Config::default(),
        KeywordCorpus::new(keywords.iter().copied()),
        Arc::new(surface),
        store.clone(),
        Classifier::new(),
    );
    (system, store)
}
