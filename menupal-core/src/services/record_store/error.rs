use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreErrorKind {
    Io,
    NotFound,
    Corrupt,
}

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("I/O error at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("translation record {0} not found")]
    NotFound(Uuid),

    #[error("corrupt document at {}: {detail}", path.display())]
    Corrupt { path: PathBuf, detail: String },
}

impl StoreError {
    pub fn kind(&self) -> StoreErrorKind {
        match self {
            StoreError::Io { .. } => StoreErrorKind::Io,
            StoreError::NotFound(_) => StoreErrorKind::NotFound,
            StoreError::Corrupt { .. } => StoreErrorKind::Corrupt,
        }
    }

    pub(super) fn stopped(root: &Path) -> Self {
        StoreError::Io {
            path: root.to_path_buf(),
            source: io::Error::new(io::ErrorKind::BrokenPipe, "record store worker stopped"),
        }
    }
}

pub(super) fn io_at(path: &Path) -> impl FnOnce(io::Error) -> StoreError + '_ {
    move |source| StoreError::Io {
        path: path.to_path_buf(),
        source,
    }
}

pub(super) fn corrupt_at(path: &Path) -> impl FnOnce(serde_json::Error) -> StoreError + '_ {
    move |e| StoreError::Corrupt {
        path: path.to_path_buf(),
        detail: e.to_string(),
    }
}
