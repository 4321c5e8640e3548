//! Scripted storage double.
//!
//! Transfers follow a per-filename script; listing calls pop pre-queued
//! pages. Every call is recorded for assertions.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use bucketdrop_core::{StorageBackend, Visibility};
use bucketdrop_storage::keys::basename;
use bucketdrop_storage::{
    ListOptions, ListResult, ObjectStorage, PutOptions, PutResult, StorageError, StorageResult,
};
use bytes::Bytes;
use tokio::sync::Notify;

#[derive(Debug, Clone)]
pub enum PutScript {
    /// Report these `(loaded, total)` pairs, then succeed.
    Progress(Vec<(u64, u64)>),
    /// Report these pairs, then reject the transfer.
    Fail(Vec<(u64, u64)>, String),
    /// Succeed without reporting any progress.
    Silent,
}

#[derive(Debug, Clone)]
pub struct PutCall {
    pub key: String,
    pub content_type: String,
    pub visibility: Visibility,
    pub size: usize,
}

struct ListGate {
    entered: Arc<Notify>,
    release: Arc<Notify>,
}

#[derive(Default)]
pub struct ScriptedStorage {
    put_scripts: Mutex<HashMap<String, PutScript>>,
    put_delay: Mutex<Option<Duration>>,
    list_pages: Mutex<VecDeque<Result<ListResult, String>>>,
    list_gate: Mutex<Option<ListGate>>,
    pub put_calls: Mutex<Vec<PutCall>>,
    pub list_calls: Mutex<Vec<(String, ListOptions)>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl ScriptedStorage {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn script_put(&self, filename: &str, script: PutScript) {
        self.put_scripts
            .lock()
            .unwrap()
            .insert(filename.to_string(), script);
    }

    pub fn delay_puts(&self, delay: Duration) {
        *self.put_delay.lock().unwrap() = Some(delay);
    }

    pub fn push_page(&self, page: ListResult) {
        self.list_pages.lock().unwrap().push_back(Ok(page));
    }

    pub fn push_list_error(&self, reason: &str) {
        self.list_pages
            .lock()
            .unwrap()
            .push_back(Err(reason.to_string()));
    }

    /// Hold the next `list` call until `release` is notified.
    ///
    /// Returns `(entered, release)`; `entered` fires once the call is parked.
    pub fn gate_next_list(&self) -> (Arc<Notify>, Arc<Notify>) {
        let entered = Arc::new(Notify::new());
        let release = Arc::new(Notify::new());
        *self.list_gate.lock().unwrap() = Some(ListGate {
            entered: entered.clone(),
            release: release.clone(),
        });
        (entered, release)
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    pub fn put_keys(&self) -> Vec<String> {
        self.put_calls
            .lock()
            .unwrap()
            .iter()
            .map(|c| c.key.clone())
            .collect()
    }
}

#[async_trait]
impl ObjectStorage for ScriptedStorage {
    async fn put(&self, key: &str, data: Bytes, options: PutOptions) -> StorageResult<PutResult> {
        let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(current, Ordering::SeqCst);

        self.put_calls.lock().unwrap().push(PutCall {
            key: key.to_string(),
            content_type: options.content_type.clone(),
            visibility: options.visibility,
            size: data.len(),
        });

        let delay = *self.put_delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let total = data.len() as u64;
        let script = self
            .put_scripts
            .lock()
            .unwrap()
            .get(basename(key))
            .cloned()
            .unwrap_or_else(|| PutScript::Progress(vec![(total, total)]));

        let result = match script {
            PutScript::Progress(events) => {
                for (loaded, total) in events {
                    options.report_progress(loaded, total);
                }
                Ok(PutResult {
                    key: key.to_string(),
                })
            }
            PutScript::Fail(events, reason) => {
                for (loaded, total) in events {
                    options.report_progress(loaded, total);
                }
                Err(StorageError::UploadFailed(reason))
            }
            PutScript::Silent => Ok(PutResult {
                key: key.to_string(),
            }),
        };

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        result
    }

    async fn list(&self, prefix: &str, options: ListOptions) -> StorageResult<ListResult> {
        self.list_calls
            .lock()
            .unwrap()
            .push((prefix.to_string(), options));

        let gate = self.list_gate.lock().unwrap().take();
        if let Some(gate) = gate {
            gate.entered.notify_one();
            gate.release.notified().await;
        }

        let next = self.list_pages.lock().unwrap().pop_front();
        match next {
            Some(Ok(page)) => Ok(page),
            Some(Err(reason)) => Err(StorageError::ListFailed(reason)),
            None => Ok(ListResult::default()),
        }
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::Memory
    }
}
