//! Passive and manual scanning of a page outside the keyword loop

use leadscan::surface::Page;
use std::time::Duration;

use crate::common::{feed_page, post_html, spawn_system, FixtureSurface};

const FEED_URL: &str = "https://www.linkedin.com/feed/";

fn feed(posts: &[(&str, &str)]) -> Page {
    Page {
        url: FEED_URL.to_string(),
        html: feed_page(posts),
    }
}

#[tokio::test(start_paused = true)]
async fn test_initial_scan_then_mutation_rescans() {
    let (system, _store) = spawn_system(&[], FixtureSurface::new());

    system.show_page(feed(&[
        ("urn:li:activity:1", "Looking for developer to build our mobile app"),
        ("urn:li:activity:2", "Sharing some photos from our team offsite"),
    ]));

    tokio::time::sleep(Duration::from_millis(2500)).await;
    assert_eq!(system.stats().await.unwrap().detected_count, 1);

    system.render(post_html(
        "urn:li:activity:3",
        "Our agency is hiring a react developer, remote friendly",
    ));
    tokio::time::sleep(Duration::from_millis(100)).await;
    let stats = system.stats().await.unwrap();
    assert_eq!(stats.detected_count, 2);
    assert_eq!(stats.recent_detections[0].id, "urn:li:activity:3");

    system.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_repeated_scans_detect_each_post_once() {
    let (system, _store) = spawn_system(&[], FixtureSurface::new());
    let hiring = ("urn:li:activity:7", "Need a developer for a two month contract");

    system.show_page(feed(&[hiring]));
    tokio::time::sleep(Duration::from_millis(2500)).await;

    // Same post rendered again, plus several polling rounds
    system.render(post_html(hiring.0, hiring.1));
    tokio::time::sleep(Duration::from_secs(30)).await;
    assert!(system.manual_scan().await.unwrap().success);

    let stats = system.stats().await.unwrap();
    assert_eq!(stats.detected_count, 1);
    assert_eq!(stats.recent_detections.len(), 1);

    system.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_manual_scan_reports_before_replying() {
    let (system, _store) = spawn_system(&[], FixtureSurface::new());

    system.show_page(feed(&[(
        "urn:li:activity:9",
        "We are hiring developer for our startup",
    )]));
    let ack = system.manual_scan().await.unwrap();
    assert!(ack.success);
    assert_eq!(ack.error, None);

    assert_eq!(system.stats().await.unwrap().detected_count, 1);
    system.shutdown().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_manual_scan_right_after_page_load_always_succeeds() {
    let mut failures = 0;
    for _ in 0..50 {
        let (system, _store) = spawn_system(&[], FixtureSurface::new());
        system.show_page(feed(&[(
            "urn:li:activity:11",
            "We are hiring developer for our startup",
        )]));

        let ack = system.manual_scan().await.unwrap();
        if !ack.success {
            failures += 1;
        }
        system.shutdown().await;
    }
    assert_eq!(failures, 0);
}

#[tokio::test]
async fn test_manual_scan_without_page_fails() {
    let (system, _store) = spawn_system(&[], FixtureSurface::new());

    let ack = system.manual_scan().await.unwrap();
    assert!(!ack.success);
    assert_eq!(ack.error.as_deref(), Some("No page loaded"));

    system.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_new_page_drops_previous_watchers() {
    let (system, _store) = spawn_system(&[], FixtureSurface::new());

    system.show_page(feed(&[(
        "urn:li:activity:1",
        "We are hiring developer for our startup",
    )]));
    // Navigate away before the initial scan of the first page
    system.show_page(feed(&[(
        "urn:li:activity:2",
        "Weekend hike photos from the lake district",
    )]));

    tokio::time::sleep(Duration::from_secs(20)).await;
    assert_eq!(system.stats().await.unwrap().detected_count, 0);

    system.shutdown().await;
}
