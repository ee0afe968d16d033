//! Durable history of translation records.
//!
//! Layout under the store root:
//!
//! ```text
//! translations/<uuid>/record.json   one record document each
//! translations_index.json           { "<uuid>": "<created_at>", ... }
//! ```
//!
//! A single worker thread owns the directory. [`RecordStore`] handles send it
//! commands over a channel and wait for the reply, so operations never
//! interleave no matter how many threads share the store. Commands are not
//! cancellable: once sent, an operation runs to completion even if the caller
//! stops waiting.

use std::{
    path::{Path, PathBuf},
    sync::{mpsc, Arc},
    thread,
};

use uuid::Uuid;

use crate::model::record::{IndexEntry, TranslationRecord};

mod disk;
mod error;

pub use disk::CompactReport;
pub use error::{StoreError, StoreErrorKind};

use disk::RecordDir;

type Reply<T> = mpsc::Sender<Result<T, StoreError>>;

enum Command {
    Save(Box<TranslationRecord>, Reply<()>),
    List(Reply<Vec<TranslationRecord>>),
    Entries(Reply<Vec<IndexEntry>>),
    Get(Uuid, Reply<TranslationRecord>),
    Delete(Uuid, Reply<()>),
    ClearAll(Reply<()>),
    Compact(Reply<CompactReport>),
}

/// Cloneable handle to the store worker. The worker stops once every handle
/// has been dropped and the queued commands are drained.
#[derive(Debug, Clone)]
pub struct RecordStore {
    root: Arc<PathBuf>,
    tx: mpsc::Sender<Command>,
}

impl RecordStore {
    /// Spawns the worker for `root`. Directories are created lazily on first write.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let root: PathBuf = root.into();
        let dir = RecordDir::new(root.clone());
        let (tx, rx) = mpsc::channel::<Command>();

        thread::Builder::new()
            .name("record-store".into())
            .spawn(move || run(dir, rx))
            .map_err(|source| StoreError::Io {
                path: root.clone(),
                source,
            })?;

        tracing::debug!(root = %root.display(), "record store opened");

        Ok(Self {
            root: Arc::new(root),
            tx,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn save(&self, record: TranslationRecord) -> Result<(), StoreError> {
        self.call(|reply| Command::Save(Box::new(record), reply))
    }

    /// Every readable record, newest first.
    pub fn list(&self) -> Result<Vec<TranslationRecord>, StoreError> {
        self.call(Command::List)
    }

    pub fn entries(&self) -> Result<Vec<IndexEntry>, StoreError> {
        self.call(Command::Entries)
    }

    pub fn get(&self, id: Uuid) -> Result<TranslationRecord, StoreError> {
        self.call(|reply| Command::Get(id, reply))
    }

    /// Deleting an id that was never saved succeeds.
    pub fn delete(&self, id: Uuid) -> Result<(), StoreError> {
        self.call(|reply| Command::Delete(id, reply))
    }

    pub fn clear_all(&self) -> Result<(), StoreError> {
        self.call(Command::ClearAll)
    }

    pub fn compact(&self) -> Result<CompactReport, StoreError> {
        self.call(Command::Compact)
    }

    fn call<T>(&self, command: impl FnOnce(Reply<T>) -> Command) -> Result<T, StoreError> {
        let (reply_tx, reply_rx) = mpsc::channel();

        self.tx
            .send(command(reply_tx))
            .map_err(|_| StoreError::stopped(&self.root))?;

        reply_rx
            .recv()
            .map_err(|_| StoreError::stopped(&self.root))?
    }
}

fn run(dir: RecordDir, rx: mpsc::Receiver<Command>) {
    for command in rx {
        // A caller that gave up waiting has dropped its receiver; the
        // operation itself has already completed, so the send error is moot.
        match command {
            Command::Save(record, reply) => {
                let _ = reply.send(dir.save(&record));
            }
            Command::List(reply) => {
                let _ = reply.send(Ok(dir.list()));
            }
            Command::Entries(reply) => {
                let _ = reply.send(Ok(dir.entries()));
            }
            Command::Get(id, reply) => {
                let _ = reply.send(dir.get(id));
            }
            Command::Delete(id, reply) => {
                let _ = reply.send(dir.delete(id));
            }
            Command::ClearAll(reply) => {
                let _ = reply.send(dir.clear_all());
            }
            Command::Compact(reply) => {
                let _ = reply.send(dir.compact());
            }
        }
    }

    tracing::debug!("record store worker stopped");
}
