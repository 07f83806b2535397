//! Browsing surfaces the coordinator drives
//!
//! A surface is acquired (or opened) once per scan and then navigated to one
//! search view per keyword. Two implementations:
//! - [`HttpSurface`] - live pages over HTTP, rate limited with governor
//! - [`SnapshotSurface`] - saved pages from a directory, one file per keyword slug

use async_trait::async_trait;
use governor::{
    clock::DefaultClock,
    state::{InMemoryState, NotKeyed},
    Quota, RateLimiter,
};
use reqwest::{
    header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, USER_AGENT},
    Client,
};
use std::num::NonZeroU32;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;
use url::Url;

use crate::config::ScannerConfig;
use crate::corpus::{keyword_from_search_url, slug};
use crate::models::SurfaceHandle;
use crate::utils::error::FetchError;

/// Snapshot served for pages that are not keyword search views
pub const FEED_SNAPSHOT: &str = "feed";

/// A rendered page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page {
    pub url: String,
    pub html: String,
}

/// Something that can be navigated to a URL and hands back the rendered page
#[async_trait]
pub trait BrowsingSurface: Send + Sync {
    /// Reuse the surface already open, or open a new one
    async fn open(&self) -> Result<SurfaceHandle, FetchError>;

    /// Navigate the surface and wait for the page to load
    async fn navigate(&self, handle: SurfaceHandle, url: &str) -> Result<Page, FetchError>;
}

/// Keeps the handle of the surface in use so that later scans reuse it
#[derive(Debug, Default)]
struct HandleSlot(Mutex<Option<SurfaceHandle>>);

impl HandleSlot {
    fn acquire(&self) -> SurfaceHandle {
        let mut slot = self.0.lock().unwrap_or_else(PoisonError::into_inner);
        match *slot {
            Some(handle) => {
                tracing::debug!(%handle, "Reusing open surface");
                handle
            }
            None => {
                let handle = SurfaceHandle::new();
                tracing::debug!(%handle, "Opened new surface");
                *slot = Some(handle);
                handle
            }
        }
    }
}

// ============================================================================
// HTTP surface
// ============================================================================

/// Live surface fetching pages over HTTP
pub struct HttpSurface {
    /// HTTP client with configured timeout and compression
    client: Client,

    /// Rate limiter to control request frequency
    rate_limiter: RateLimiter<NotKeyed, InMemoryState, DefaultClock>,

    /// User agent sent with every request
    user_agent: String,

    /// Optional base URL override for testing with mock servers
    base_url: Option<String>,

    handle: HandleSlot,
}

impl HttpSurface {
    /// Create a new surface
    ///
    /// # Errors
    ///
    /// Returns `FetchError::Http` if the HTTP client cannot be created
    pub fn new(
        requests_per_second: u32,
        timeout: Duration,
        user_agent: impl Into<String>,
    ) -> Result<Self, FetchError> {
        let client = Client::builder()
            .timeout(timeout)
            .gzip(true)
            .cookie_store(true)
            .build()?;

        let rate = NonZeroU32::new(requests_per_second).unwrap_or(NonZeroU32::MIN);
        let rate_limiter = RateLimiter::direct(Quota::per_second(rate));

        Ok(Self {
            client,
            rate_limiter,
            user_agent: user_agent.into(),
            base_url: None,
            handle: HandleSlot::default(),
        })
    }

    /// Create a surface from scanner settings
    pub fn from_config(config: &ScannerConfig) -> Result<Self, FetchError> {
        Self::new(
            config.requests_per_second,
            Duration::from_secs(config.request_timeout_secs),
            config.user_agent.clone(),
        )
    }

    /// Send every request to `base_url`, keeping path and query
    #[must_use]
    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = Some(base_url.trim_end_matches('/').to_string());
        self
    }

    fn resolve(&self, url: &str) -> Result<String, FetchError> {
        let parsed = Url::parse(url).map_err(|_| FetchError::InvalidUrl(url.to_string()))?;
        Ok(match &self.base_url {
            Some(base) => match parsed.query() {
                Some(query) => format!("{base}{}?{query}", parsed.path()),
                None => format!("{base}{}", parsed.path()),
            },
            None => parsed.to_string(),
        })
    }

    fn build_headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();

        if let Ok(agent) = HeaderValue::from_str(&self.user_agent) {
            headers.insert(USER_AGENT, agent);
        }
        headers.insert(
            ACCEPT,
            HeaderValue::from_static(
                "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8",
            ),
        );
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.9"));

        headers
    }
}

#[async_trait]
impl BrowsingSurface for HttpSurface {
    async fn open(&self) -> Result<SurfaceHandle, FetchError> {
        Ok(self.handle.acquire())
    }

    async fn navigate(&self, handle: SurfaceHandle, url: &str) -> Result<Page, FetchError> {
        let target = self.resolve(url)?;

        // Wait for rate limiter
        self.rate_limiter.until_ready().await;

        tracing::debug!(%handle, url = %target, "Navigating");
        let response = self
            .client
            .get(&target)
            .headers(self.build_headers())
            .send()
            .await?;

        let status = response.status();
        if status.as_u16() == 429 {
            return Err(FetchError::RateLimit);
        }
        if !status.is_success() {
            return Err(FetchError::ServerError(status.as_u16()));
        }

        let html = response.text().await?;
        Ok(Page {
            url: url.to_string(),
            html,
        })
    }
}

// ============================================================================
// Snapshot surface
// ============================================================================

/// Offline surface serving saved pages
///
/// A search view for keyword `k` is read from `<dir>/<slug(k)>.html`; any
/// other page from `<dir>/feed.html`.
pub struct SnapshotSurface {
    dir: PathBuf,
    handle: HandleSlot,
}

impl SnapshotSurface {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            handle: HandleSlot::default(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// File holding the snapshot for a URL
    pub fn snapshot_path(&self, url: &str) -> PathBuf {
        let name = keyword_from_search_url(url)
            .map(|keyword| slug(&keyword))
            .unwrap_or_else(|| FEED_SNAPSHOT.to_string());
        self.dir.join(format!("{name}.html"))
    }
}

#[async_trait]
impl BrowsingSurface for SnapshotSurface {
    async fn open(&self) -> Result<SurfaceHandle, FetchError> {
        Ok(self.handle.acquire())
    }

    async fn navigate(&self, handle: SurfaceHandle, url: &str) -> Result<Page, FetchError> {
        let path = self.snapshot_path(url);
        tracing::debug!(%handle, path = %path.display(), "Loading snapshot");

        match tokio::fs::read_to_string(&path).await {
            Ok(html) => Ok(Page {
                url: url.to_string(),
                html,
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(FetchError::PageUnavailable(url.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }
}
