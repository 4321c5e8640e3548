#[path = "helpers/mod.rs"]
mod helpers;

use std::sync::Arc;

use bucketdrop_core::{ContinuationToken, LoadMoreMode, Visibility};
use bucketdrop_services::{FileListingPaginator, ListingError, LoadOutcome, PaginatorOptions};
use bucketdrop_storage::{ListResult, MemoryStorage};
use helpers::fixtures::{at, summary};
use helpers::storage::ScriptedStorage;
use helpers::{signed_in, SignedOutIdentity};

fn paginator(storage: Arc<ScriptedStorage>, mode: LoadMoreMode) -> FileListingPaginator {
    FileListingPaginator::new(
        storage,
        signed_in(),
        PaginatorOptions {
            mode,
            ..Default::default()
        },
    )
}

fn keys(paginator: &FileListingPaginator) -> Vec<String> {
    paginator.entries().into_iter().map(|e| e.key).collect()
}

fn token(value: &str) -> Option<ContinuationToken> {
    Some(ContinuationToken::new(value))
}

#[tokio::test]
async fn test_page_sorted_newest_first_with_basenames() {
    let storage = ScriptedStorage::new();
    storage.push_page(ListResult {
        results: vec![
            summary("ten.txt", Some(10), at(10, 0)),
            summary("nine.txt", Some(10), at(9, 0)),
            summary("eleven.txt", Some(10), at(11, 0)),
        ],
        next_token: None,
    });
    let paginator = paginator(storage.clone(), LoadMoreMode::Append);

    let page = paginator.load_page(None).await.unwrap();
    let order: Vec<&str> = page.entries.iter().map(|e| e.key.as_str()).collect();
    assert_eq!(order, vec!["eleven.txt", "ten.txt", "nine.txt"]);
    assert!(page.next_token.is_none());

    // load_page alone does not touch the visible list
    assert!(paginator.entries().is_empty());

    let calls = storage.list_calls.lock().unwrap().clone();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].0, "example.com/");
    assert_eq!(calls[0].1.max_keys, 1000);
    assert_eq!(calls[0].1.visibility, Visibility::Public);
    assert!(calls[0].1.continuation_token.is_none());
}

#[tokio::test]
async fn test_equal_timestamps_keep_storage_order() {
    let storage = ScriptedStorage::new();
    storage.push_page(ListResult {
        results: vec![
            summary("first.txt", Some(1), at(8, 0)),
            summary("second.txt", Some(1), at(8, 0)),
            summary("newer.txt", Some(1), at(8, 30)),
        ],
        next_token: None,
    });
    let paginator = paginator(storage, LoadMoreMode::Append);

    let page = paginator.load_page(None).await.unwrap();
    let order: Vec<&str> = page.entries.iter().map(|e| e.key.as_str()).collect();
    assert_eq!(order, vec!["newer.txt", "first.txt", "second.txt"]);
}

#[tokio::test]
async fn test_page_truncated_to_display_limit_and_token_passed_through() {
    let storage = ScriptedStorage::new();
    let results = (0..45)
        .map(|i| summary(&format!("file-{i:02}.txt"), Some(1), at(i / 60, i % 60)))
        .collect();
    storage.push_page(ListResult {
        results,
        next_token: token("tok-1"),
    });
    let paginator = paginator(storage, LoadMoreMode::Append);

    let page = paginator.load_page(None).await.unwrap();
    assert_eq!(page.entries.len(), 30);
    assert_eq!(page.entries[0].key, "file-44.txt");
    assert_eq!(page.next_token, token("tok-1"));
}

#[tokio::test]
async fn test_size_labels() {
    let storage = ScriptedStorage::new();
    storage.push_page(ListResult {
        results: vec![
            summary("missing.bin", None, at(3, 0)),
            summary("empty.bin", Some(0), at(2, 0)),
            summary("half.bin", Some(1536), at(1, 0)),
        ],
        next_token: None,
    });
    let paginator = paginator(storage, LoadMoreMode::Append);

    let page = paginator.load_page(None).await.unwrap();
    let labels: Vec<&str> = page.entries.iter().map(|e| e.size_label.as_str()).collect();
    assert_eq!(labels, vec!["Unknown Size", "Unknown Size", "1.5 KB"]);
}

#[tokio::test]
async fn test_activate_loads_once() {
    let storage = ScriptedStorage::new();
    storage.push_page(ListResult {
        results: vec![summary("a.txt", Some(1), at(1, 0))],
        next_token: None,
    });
    let paginator = paginator(storage.clone(), LoadMoreMode::Append);

    assert!(matches!(
        paginator.activate().await,
        Some(LoadOutcome::Loaded(_))
    ));
    assert!(paginator.activate().await.is_none());

    assert_eq!(storage.list_calls.lock().unwrap().len(), 1);
    assert_eq!(keys(&paginator), vec!["a.txt"]);
    assert!(!paginator.has_more());
}

#[tokio::test]
async fn test_load_more_appends_by_default() {
    let storage = ScriptedStorage::new();
    storage.push_page(ListResult {
        results: vec![
            summary("a.txt", Some(1), at(5, 0)),
            summary("b.txt", Some(1), at(4, 0)),
        ],
        next_token: token("b"),
    });
    storage.push_page(ListResult {
        results: vec![summary("c.txt", Some(1), at(6, 0))],
        next_token: None,
    });
    let paginator = paginator(storage.clone(), LoadMoreMode::Append);

    paginator.activate().await;
    assert!(paginator.has_more());

    assert!(matches!(paginator.load_more().await, LoadOutcome::Loaded(_)));
    assert_eq!(keys(&paginator), vec!["a.txt", "b.txt", "c.txt"]);
    assert!(paginator.next_token().is_none());

    assert!(matches!(paginator.load_more().await, LoadOutcome::Exhausted));
    assert_eq!(storage.list_calls.lock().unwrap().len(), 2);

    let calls = storage.list_calls.lock().unwrap().clone();
    assert_eq!(calls[1].1.continuation_token, token("b"));
}

#[tokio::test]
async fn test_load_more_replace_mode() {
    let storage = ScriptedStorage::new();
    storage.push_page(ListResult {
        results: vec![summary("a.txt", Some(1), at(5, 0))],
        next_token: token("a"),
    });
    storage.push_page(ListResult {
        results: vec![summary("b.txt", Some(1), at(6, 0))],
        next_token: None,
    });
    let paginator = paginator(storage, LoadMoreMode::Replace);

    paginator.activate().await;
    paginator.load_more().await;

    assert_eq!(keys(&paginator), vec!["b.txt"]);
}

#[tokio::test]
async fn test_listing_error_clears_visible_list() {
    let storage = ScriptedStorage::new();
    storage.push_page(ListResult {
        results: vec![summary("a.txt", Some(1), at(5, 0))],
        next_token: token("a"),
    });
    storage.push_list_error("ServiceUnavailable");
    let paginator = paginator(storage, LoadMoreMode::Append);

    paginator.activate().await;
    assert_eq!(keys(&paginator), vec!["a.txt"]);

    let outcome = paginator.load_more().await;
    assert!(matches!(
        outcome,
        LoadOutcome::Failed(ListingError::Storage(_))
    ));
    assert!(paginator.entries().is_empty());
    assert!(paginator.next_token().is_none());
    assert!(paginator
        .last_error()
        .unwrap()
        .contains("ServiceUnavailable"));
    assert!(!paginator.is_loading());
}

#[tokio::test]
async fn test_refresh_after_error_recovers() {
    let storage = ScriptedStorage::new();
    storage.push_list_error("timeout");
    storage.push_page(ListResult {
        results: vec![summary("a.txt", Some(1), at(5, 0))],
        next_token: None,
    });
    let paginator = paginator(storage, LoadMoreMode::Append);

    assert!(matches!(
        paginator.activate().await,
        Some(LoadOutcome::Failed(_))
    ));
    assert!(paginator.last_error().is_some());

    assert!(matches!(paginator.refresh().await, LoadOutcome::Loaded(_)));
    assert_eq!(keys(&paginator), vec!["a.txt"]);
    assert!(paginator.last_error().is_none());
}

#[tokio::test]
async fn test_signed_out_listing_fails() {
    let storage = ScriptedStorage::new();
    let paginator = FileListingPaginator::new(
        storage.clone(),
        Arc::new(SignedOutIdentity),
        PaginatorOptions::default(),
    );

    let result = paginator.load_page(None).await;
    assert!(matches!(result, Err(ListingError::Identity(_))));
    assert!(storage.list_calls.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_overlapping_load_more_is_busy() {
    let storage = ScriptedStorage::new();
    storage.push_page(ListResult {
        results: vec![summary("a.txt", Some(1), at(5, 0))],
        next_token: token("a"),
    });
    storage.push_page(ListResult {
        results: vec![summary("b.txt", Some(1), at(4, 0))],
        next_token: None,
    });
    let paginator = Arc::new(paginator(storage.clone(), LoadMoreMode::Append));
    paginator.activate().await;

    let (entered, release) = storage.gate_next_list();
    let in_flight = {
        let paginator = paginator.clone();
        tokio::spawn(async move { paginator.load_more().await })
    };
    entered.notified().await;

    assert!(paginator.is_loading());
    assert!(matches!(paginator.load_more().await, LoadOutcome::Busy));
    assert!(matches!(paginator.refresh().await, LoadOutcome::Busy));

    release.notify_one();
    assert!(matches!(in_flight.await.unwrap(), LoadOutcome::Loaded(_)));
    assert!(!paginator.is_loading());
    assert_eq!(keys(&paginator), vec!["a.txt", "b.txt"]);
    assert_eq!(storage.list_calls.lock().unwrap().len(), 2);
}

#[tokio::test]
async fn test_activate_during_refresh_still_loads_later() {
    let storage = ScriptedStorage::new();
    storage.push_page(ListResult {
        results: vec![summary("a.txt", Some(1), at(5, 0))],
        next_token: None,
    });
    storage.push_page(ListResult {
        results: vec![summary("b.txt", Some(1), at(6, 0))],
        next_token: None,
    });
    let paginator = Arc::new(paginator(storage.clone(), LoadMoreMode::Append));

    let (entered, release) = storage.gate_next_list();
    let in_flight = {
        let paginator = paginator.clone();
        tokio::spawn(async move { paginator.refresh().await })
    };
    entered.notified().await;

    assert!(matches!(paginator.activate().await, Some(LoadOutcome::Busy)));

    release.notify_one();
    assert!(matches!(in_flight.await.unwrap(), LoadOutcome::Loaded(_)));
    assert_eq!(keys(&paginator), vec!["a.txt"]);

    assert!(matches!(
        paginator.activate().await,
        Some(LoadOutcome::Loaded(_))
    ));
    assert_eq!(keys(&paginator), vec!["b.txt"]);
    assert!(paginator.activate().await.is_none());
    assert_eq!(storage.list_calls.lock().unwrap().len(), 2);
}

#[tokio::test]
async fn test_pages_through_memory_storage() {
    let storage = Arc::new(MemoryStorage::new());
    for (name, hour) in [("a.txt", 1), ("b.txt", 2), ("c.txt", 3)] {
        storage
            .insert(
                Visibility::Public,
                &format!("example.com/{name}"),
                &b"data"[..],
                at(hour, 0),
            )
            .unwrap();
    }
    storage
        .insert(Visibility::Public, "other.org/x.txt", &b"data"[..], at(4, 0))
        .unwrap();

    let paginator = FileListingPaginator::new(
        storage,
        signed_in(),
        PaginatorOptions {
            max_keys: 2,
            ..Default::default()
        },
    );

    paginator.activate().await;
    assert_eq!(keys(&paginator), vec!["b.txt", "a.txt"]);
    assert!(paginator.has_more());

    paginator.load_more().await;
    assert_eq!(keys(&paginator), vec!["b.txt", "a.txt", "c.txt"]);
    assert!(!paginator.has_more());
}
