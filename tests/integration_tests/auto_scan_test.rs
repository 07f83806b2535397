//! Keyword-driven auto-scan through the coordinator and the scanner
//!
//! Time is paused: settle delays and cooldowns elapse instantly once every
//! task is idle.

use leadscan::bus::Message;
use std::time::Duration;
use tokio::sync::broadcast::error::TryRecvError;

use crate::common::{feed_page, spawn_system, FixtureSurface};

const HIRING: &str = "We are hiring developer for our startup";

#[tokio::test(start_paused = true)]
async fn test_single_keyword_end_to_end() {
    let surface = FixtureSurface::new()
        .with_search_page("hiring developer", feed_page(&[("urn:li:activity:1", HIRING)]));
    let (system, _store) = spawn_system(&["hiring developer"], surface);
    let mut events = system.subscribe();

    let ack = system.start_auto_scan().await.unwrap();
    assert!(ack.success);

    assert_eq!(events.recv().await.unwrap(), Message::ScanComplete { count: 1 });

    let status = system.scan_status().await.unwrap();
    assert!(!status.is_scanning);
    assert_eq!(status.progress, "1/1");
    assert_eq!(status.collected_count, 1);
    let post = &status.collected_posts[0];
    assert_eq!(post.id, "urn:li:activity:1");
    assert_eq!(post.preview, HIRING);
    assert_eq!(post.author_name.as_deref(), Some("Jane Doe"));
    assert_eq!(
        post.profile_url.as_deref(),
        Some("https://www.linkedin.com/in/jane-doe")
    );
    assert_eq!(
        post.post_url.as_deref(),
        Some("https://www.linkedin.com/feed/update/urn:li:activity:1/")
    );

    let stats = system.stats().await.unwrap();
    assert_eq!(stats.detected_count, 1);
    assert_eq!(stats.recent_detections[0].id, "urn:li:activity:1");

    system.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_posts_seen_under_several_keywords_count_once() {
    let surface = FixtureSurface::new()
        .with_search_page(
            "hiring developer",
            feed_page(&[
                ("urn:li:activity:1", HIRING),
                ("urn:li:activity:2", "Great conference talk on distributed systems"),
            ]),
        )
        .with_search_page(
            "need a developer",
            feed_page(&[
                ("urn:li:activity:1", HIRING),
                ("urn:li:activity:3", "We need a developer to rebuild our booking site"),
            ]),
        );
    let (system, _store) = spawn_system(&["hiring developer", "need a developer"], surface);
    let mut events = system.subscribe();

    system.start_auto_scan().await.unwrap();
    assert_eq!(events.recv().await.unwrap(), Message::ScanComplete { count: 2 });

    let status = system.scan_status().await.unwrap();
    assert_eq!(status.progress, "2/2");
    let ids: Vec<_> = status.collected_posts.iter().map(|p| p.id.as_str()).collect();
    assert_eq!(ids, ["urn:li:activity:1", "urn:li:activity:3"]);

    assert_eq!(system.stats().await.unwrap().detected_count, 2);
    system.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_stop_before_first_batch() {
    let surface = FixtureSurface::new()
        .with_search_page("hiring developer", feed_page(&[("urn:li:activity:1", HIRING)]));
    let (system, _store) = spawn_system(&["hiring developer", "need a developer"], surface);
    let mut events = system.subscribe();

    system.start_auto_scan().await.unwrap();
    assert!(system.stop_auto_scan().await.unwrap().success);

    tokio::time::sleep(Duration::from_secs(30)).await;

    let status = system.scan_status().await.unwrap();
    assert!(!status.is_scanning);
    assert_eq!(status.progress, "0/2");
    assert_eq!(status.collected_count, 0);
    assert!(matches!(events.try_recv(), Err(TryRecvError::Empty)));
    system.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_restart_within_cooldown_is_held_by_loop_guard() {
    let surface = FixtureSurface::new()
        .with_search_page("hiring developer", feed_page(&[("urn:li:activity:1", HIRING)]));
    let (system, _store) = spawn_system(&["hiring developer"], surface);
    let mut events = system.subscribe();

    system.start_auto_scan().await.unwrap();
    assert_eq!(events.recv().await.unwrap(), Message::ScanComplete { count: 1 });

    // Keyword 0 was navigated about 3 s ago: the new run cannot re-issue it
    system.start_auto_scan().await.unwrap();
    tokio::time::sleep(Duration::from_secs(10)).await;
    let status = system.scan_status().await.unwrap();
    assert!(status.is_scanning);
    assert_eq!(status.progress, "0/1");
    assert_eq!(status.collected_count, 0);
    assert!(matches!(events.try_recv(), Err(TryRecvError::Empty)));

    // Outside the window a new start goes through
    system.start_auto_scan().await.unwrap();
    assert_eq!(events.recv().await.unwrap(), Message::ScanComplete { count: 1 });
    system.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_progress_never_decreases_during_a_run() {
    let keywords = ["hiring developer", "need a developer", "looking for developer"];
    let mut surface = FixtureSurface::new();
    for (i, keyword) in keywords.iter().enumerate() {
        let id = format!("urn:li:activity:{i}");
        surface = surface.with_search_page(keyword, feed_page(&[(id.as_str(), HIRING)]));
    }
    let (system, _store) = spawn_system(&keywords, surface);
    let mut events = system.subscribe();

    system.start_auto_scan().await.unwrap();

    let mut last = 0;
    loop {
        let status = system.scan_status().await.unwrap();
        let (done, total) = status.progress.split_once('/').unwrap();
        let done: usize = done.parse().unwrap();
        assert_eq!(total, "3");
        assert!(done >= last, "progress went from {last} to {done}");
        last = done;
        if !status.is_scanning {
            break;
        }
        tokio::time::sleep(Duration::from_millis(500)).await;
    }

    assert_eq!(last, 3);
    assert_eq!(events.recv().await.unwrap(), Message::ScanComplete { count: 3 });
    system.shutdown().await;
}
