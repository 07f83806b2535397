//! Tests for detection counter persistence
//!
//! History cap and ordering properties, plus persistence of the counters
//! file across reopen.

use leadscan::models::{DetectionCounters, PostRecord};
use leadscan::storage::{DetectionStore, JsonFileStore, MemoryStore, DEFAULT_HISTORY_CAP};
use proptest::prelude::*;
use tempfile::TempDir;
use tokio_test::{assert_ok, block_on};

fn post(n: usize) -> PostRecord {
    PostRecord::new(format!("urn:li:activity:{n}"), format!("Need a developer, post {n}"))
}

proptest! {
    /// The history keeps the newest `cap` records, newest first
    #[test]
    fn prop_history_is_capped_newest_first(total in 0usize..200, cap in 1usize..80) {
        let mut counters = DetectionCounters::default();
        for n in 0..total {
            counters.record(post(n), cap);
        }

        prop_assert_eq!(counters.detected_count, total as u64);
        prop_assert_eq!(counters.recent_detections.len(), total.min(cap));
        for (i, record) in counters.recent_detections.iter().enumerate() {
            let expected = format!("urn:li:activity:{}", total - 1 - i);
            prop_assert_eq!(&record.id, &expected);
        }
    }

    /// Reset clears the count and the history but keeps the flag
    #[test]
    fn prop_reset_keeps_flag(total in 0usize..60, enabled: bool) {
        let store = MemoryStore::default();
        block_on(async {
            store.set_enabled(enabled).await.unwrap();
            for n in 0..total {
                store.record_detection(post(n)).await.unwrap();
            }
            store.reset().await.unwrap();
        });

        let stats = block_on(store.stats()).unwrap();
        prop_assert_eq!(stats.detected_count, 0);
        prop_assert!(stats.recent_detections.is_empty());
        prop_assert_eq!(stats.enabled, enabled);
    }
}

#[tokio::test]
async fn test_fifty_one_detections_keep_fifty() {
    let store = MemoryStore::default();
    for n in 0..51 {
        assert_ok!(store.record_detection(post(n)).await);
    }

    let stats = assert_ok!(store.stats().await);
    assert_eq!(stats.detected_count, 51);
    assert_eq!(stats.recent_detections.len(), DEFAULT_HISTORY_CAP);
    assert_eq!(stats.recent_detections[0].id, "urn:li:activity:50");
    assert_eq!(
        stats.recent_detections[DEFAULT_HISTORY_CAP - 1].id,
        "urn:li:activity:1"
    );
}

#[tokio::test]
async fn test_file_store_persists_capped_history() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("detections.json");

    {
        let store = assert_ok!(JsonFileStore::open(&path, 3).await);
        for n in 0..5 {
            assert_ok!(store.record_detection(post(n)).await);
        }
    }

    let raw: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(raw["detectedCount"], 5);
    assert_eq!(raw["enabled"], true);
    assert_eq!(raw["recentDetections"].as_array().unwrap().len(), 3);
    assert_eq!(raw["recentDetections"][0]["id"], "urn:li:activity:4");
    assert!(raw["recentDetections"][0]["timestamp"].as_i64().unwrap() > 0);

    let reopened = assert_ok!(JsonFileStore::open(&path, 3).await);
    assert_ok!(reopened.reset().await);
    let stats = assert_ok!(reopened.stats().await);
    assert_eq!(stats.detected_count, 0);
    assert!(stats.recent_detections.is_empty());
}
