//! Failure handling across the coordinator and the scanner

use async_trait::async_trait;
use leadscan::models::SurfaceHandle;
use leadscan::surface::{BrowsingSurface, Page};
use leadscan::utils::error::FetchError;
use std::time::Duration;

use crate::common::{feed_page, spawn_system, FixtureSurface};

/// Surface that cannot be opened
struct ClosedSurface;

#[async_trait]
impl BrowsingSurface for ClosedSurface {
    async fn open(&self) -> Result<SurfaceHandle, FetchError> {
        Err(FetchError::PageUnavailable("no browsing surface".to_string()))
    }

    async fn navigate(&self, _handle: SurfaceHandle, url: &str) -> Result<Page, FetchError> {
        Err(FetchError::PageUnavailable(url.to_string()))
    }
}

#[tokio::test(start_paused = true)]
async fn test_failed_navigation_stalls_until_stopped() {
    // Second keyword has no page: its navigation fails and is not retried
    let surface = FixtureSurface::new().with_search_page(
        "hiring developer",
        feed_page(&[("urn:li:activity:1", "We are hiring developer for our startup")]),
    );
    let (system, _store) = spawn_system(&["hiring developer", "need a developer"], surface);

    system.start_auto_scan().await.unwrap();
    tokio::time::sleep(Duration::from_secs(60)).await;

    let status = system.scan_status().await.unwrap();
    assert!(status.is_scanning);
    assert_eq!(status.progress, "1/2");
    assert_eq!(status.current_keyword.as_deref(), Some("need a developer"));
    assert_eq!(status.collected_count, 1);

    system.stop_auto_scan().await.unwrap();
    let status = system.scan_status().await.unwrap();
    assert!(!status.is_scanning);
    assert_eq!(status.collected_count, 1);

    system.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_unavailable_surface_keeps_first_keyword() {
    let (system, _store) = spawn_system(&["hiring developer"], ClosedSurface);

    let ack = system.start_auto_scan().await.unwrap();
    assert!(ack.success);
    tokio::time::sleep(Duration::from_secs(10)).await;

    let status = system.scan_status().await.unwrap();
    assert!(status.is_scanning);
    assert_eq!(status.progress, "0/1");

    system.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_page_without_posts_yields_empty_batch() {
    let surface = FixtureSurface::new()
        .with_search_page("hiring developer", "<html><body><p>Sign in</p></body></html>".into());
    let (system, _store) = spawn_system(&["hiring developer"], surface);
    let mut events = system.subscribe();

    system.start_auto_scan().await.unwrap();
    assert_eq!(
        events.recv().await.unwrap(),
        leadscan::bus::Message::ScanComplete { count: 0 }
    );
    assert_eq!(system.stats().await.unwrap().detected_count, 0);

    system.shutdown().await;
}

#[tokio::test]
async fn test_repeated_start_resets_cleanly() {
    let (system, _store) = spawn_system(&["hiring developer", "need a developer"], ClosedSurface);

    for _ in 0..3 {
        assert!(system.start_auto_scan().await.unwrap().success);
    }
    let status = system.scan_status().await.unwrap();
    assert!(status.is_scanning);
    assert_eq!(status.progress, "0/2");
    assert_eq!(status.collected_count, 0);

    system.shutdown().await;
}
