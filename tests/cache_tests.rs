// Result cache tests: TTL expiry and last-writer-wins.

mod common;

use std::time::Duration;

use common::make_record;
use voicenotes::cache::record_key;
use voicenotes::{MemoryResultCache, ResultCache};

#[tokio::test(start_paused = true)]
async fn put_then_get_roundtrip() {
    let cache = MemoryResultCache::new();
    let record = make_record("rec-1", "owner-1");

    cache
        .put(&record_key("rec-1"), &record, Duration::from_secs(3600))
        .await
        .unwrap();

    let hit = cache.get(&record_key("rec-1")).await.unwrap().unwrap();
    assert_eq!(hit.id, "rec-1");
    assert_eq!(hit.original_text, record.original_text);
}

#[tokio::test(start_paused = true)]
async fn absent_key_misses() {
    let cache = MemoryResultCache::new();
    assert!(cache.get(&record_key("nope")).await.unwrap().is_none());
}

#[tokio::test(start_paused = true)]
async fn entries_expire_after_ttl() {
    let cache = MemoryResultCache::new();
    let record = make_record("rec-1", "owner-1");

    cache
        .put(&record_key("rec-1"), &record, Duration::from_secs(5))
        .await
        .unwrap();

    tokio::time::sleep(Duration::from_secs(4)).await;
    assert!(cache.get(&record_key("rec-1")).await.unwrap().is_some());

    tokio::time::sleep(Duration::from_secs(2)).await;
    assert!(cache.get(&record_key("rec-1")).await.unwrap().is_none());
}

#[tokio::test(start_paused = true)]
async fn last_writer_wins() {
    let cache = MemoryResultCache::new();
    let first = make_record("rec-1", "owner-1");
    let mut second = make_record("rec-1", "owner-1");
    second.original_text = "updated words".to_string();

    let ttl = Duration::from_secs(3600);
    cache.put(&record_key("rec-1"), &first, ttl).await.unwrap();
    cache.put(&record_key("rec-1"), &second, ttl).await.unwrap();

    let hit = cache.get(&record_key("rec-1")).await.unwrap().unwrap();
    assert_eq!(hit.original_text, "updated words");
}
