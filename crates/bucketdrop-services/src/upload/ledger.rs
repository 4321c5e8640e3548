//! Upload history ledger.
//!
//! All mutations of the history go through one task that owns the records.
//! Transfers send it commands over an unbounded channel, so a progress event
//! from one file can never overwrite a concurrent update to another file.
//! Readers get whole snapshots through a `watch` channel and per-record
//! changes through a `broadcast` channel.

use std::sync::Arc;

use bucketdrop_core::{progress_percentage, UploadRecord, UploadStatus};
use bucketdrop_storage::ProgressCallback;
use serde::Serialize;
use tokio::sync::{broadcast, mpsc, oneshot, watch};

use crate::error::UploadError;

const EVENT_CAPACITY: usize = 1024;

/// A change to one history record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecordUpdate {
    pub id: u64,
    pub filename: String,
    pub percentage: u8,
    pub status: UploadStatus,
}

impl RecordUpdate {
    fn of(record: &UploadRecord) -> Self {
        Self {
            id: record.id,
            filename: record.filename.clone(),
            percentage: record.percentage,
            status: record.status,
        }
    }
}

enum LedgerCommand {
    Append {
        filename: String,
        mime_type: String,
        size_bytes: u64,
        reply: oneshot::Sender<u64>,
    },
    Progress {
        id: u64,
        loaded: u64,
        total: u64,
    },
    Complete {
        id: u64,
    },
    Fail {
        id: u64,
        reason: String,
    },
    Flush {
        reply: oneshot::Sender<()>,
    },
}

/// Handle to the history actor. Cheap to clone.
#[derive(Clone)]
pub struct HistoryLedger {
    commands: mpsc::UnboundedSender<LedgerCommand>,
    snapshot: watch::Receiver<Vec<UploadRecord>>,
    events: broadcast::Sender<RecordUpdate>,
}

impl HistoryLedger {
    /// Start the ledger task. Must be called from within a Tokio runtime.
    pub fn spawn() -> Self {
        let (commands, rx) = mpsc::unbounded_channel();
        let (snapshot_tx, snapshot) = watch::channel(Vec::new());
        let (events, _) = broadcast::channel(EVENT_CAPACITY);

        tokio::spawn(run(rx, snapshot_tx, events.clone()));

        Self {
            commands,
            snapshot,
            events,
        }
    }

    /// Append a fresh `InProgress` record and return its id.
    pub async fn append(
        &self,
        filename: String,
        mime_type: String,
        size_bytes: u64,
    ) -> Result<u64, UploadError> {
        let (reply, rx) = oneshot::channel();
        self.commands
            .send(LedgerCommand::Append {
                filename,
                mime_type,
                size_bytes,
                reply,
            })
            .map_err(|_| UploadError::LedgerClosed)?;
        rx.await.map_err(|_| UploadError::LedgerClosed)
    }

    pub fn progress(&self, id: u64, loaded: u64, total: u64) {
        self.send(LedgerCommand::Progress { id, loaded, total });
    }

    /// Mark a transfer as stored. This is the only way a record reaches 100%.
    pub fn complete(&self, id: u64) {
        self.send(LedgerCommand::Complete { id });
    }

    pub fn fail(&self, id: u64, reason: impl Into<String>) {
        self.send(LedgerCommand::Fail {
            id,
            reason: reason.into(),
        });
    }

    /// Progress callback bound to one record.
    pub fn progress_callback(&self, id: u64) -> Arc<dyn ProgressCallback> {
        let ledger = self.clone();
        Arc::new(move |loaded: u64, total: u64| ledger.progress(id, loaded, total))
    }

    /// Wait until every command sent before this call has been applied.
    pub async fn flush(&self) -> Result<(), UploadError> {
        let (reply, rx) = oneshot::channel();
        self.commands
            .send(LedgerCommand::Flush { reply })
            .map_err(|_| UploadError::LedgerClosed)?;
        rx.await.map_err(|_| UploadError::LedgerClosed)
    }

    /// Current history, in append order.
    pub fn snapshot(&self) -> Vec<UploadRecord> {
        self.snapshot.borrow().clone()
    }

    /// Receiver that yields a new snapshot after every change.
    pub fn watch(&self) -> watch::Receiver<Vec<UploadRecord>> {
        self.snapshot.clone()
    }

    /// Per-record change events. Slow subscribers may observe `Lagged`.
    pub fn subscribe(&self) -> broadcast::Receiver<RecordUpdate> {
        self.events.subscribe()
    }

    fn send(&self, command: LedgerCommand) {
        if self.commands.send(command).is_err() {
            tracing::warn!("Upload history ledger stopped; dropping update");
        }
    }
}

async fn run(
    mut rx: mpsc::UnboundedReceiver<LedgerCommand>,
    snapshot: watch::Sender<Vec<UploadRecord>>,
    events: broadcast::Sender<RecordUpdate>,
) {
    let mut next_id: u64 = 0;

    while let Some(command) = rx.recv().await {
        match command {
            LedgerCommand::Append {
                filename,
                mime_type,
                size_bytes,
                reply,
            } => {
                let id = next_id;
                next_id += 1;
                let record = UploadRecord::new(id, filename, mime_type, size_bytes);
                let update = RecordUpdate::of(&record);
                snapshot.send_modify(|records| records.push(record));
                let _ = events.send(update);
                let _ = reply.send(id);
            }
            LedgerCommand::Progress { id, loaded, total } => {
                let pct = progress_percentage(loaded, total);
                apply(&snapshot, &events, id, |r| r.apply_progress(pct));
            }
            LedgerCommand::Complete { id } => {
                apply(&snapshot, &events, id, |r| r.mark_complete());
            }
            LedgerCommand::Fail { id, reason } => {
                apply(&snapshot, &events, id, |r| r.mark_failed(reason));
            }
            LedgerCommand::Flush { reply } => {
                let _ = reply.send(());
            }
        }
    }

    tracing::debug!("Upload history ledger stopped");
}

fn apply<F>(
    snapshot: &watch::Sender<Vec<UploadRecord>>,
    events: &broadcast::Sender<RecordUpdate>,
    id: u64,
    change: F,
) where
    F: FnOnce(&mut UploadRecord) -> bool,
{
    let mut update = None;
    snapshot.send_if_modified(|records| {
        // Ids are dense and assigned in append order.
        let Some(record) = usize::try_from(id).ok().and_then(|i| records.get_mut(i)) else {
            tracing::warn!(record_id = id, "Update for unknown history record");
            return false;
        };
        if !change(record) {
            return false;
        }
        update = Some(RecordUpdate::of(record));
        true
    });

    if let Some(update) = update {
        let _ = events.send(update);
    }
}
