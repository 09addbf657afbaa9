//! Ingestion and filing core
//!
//! Accepts a validated request plus a payload stream and persists exactly one
//! dataset entry, or nothing at all. Four stages: validation, path
//! resolution, collision-safe naming, streamed write. No stage mutates
//! filesystem state before the writer, and the core holds no cross-request
//! state, so concurrent invocations share nothing but the dataset subtree.

pub mod naming;
pub mod paths;
pub mod validate;
pub mod writer;

use std::io;
use std::path::{Path, PathBuf};

use bytes::Bytes;
use chrono::{DateTime, Utc};
use futures::{Stream, StreamExt};
use serde::Serialize;
use soundpool_common::config::DatasetInitializer;
use thiserror::Error;

pub use validate::{recognition_request, training_request};

/// Filing pipeline errors
#[derive(Debug, Error)]
pub enum IngestError {
    /// Required request field absent after trimming/sanitization
    #[error("Missing field: {0}")]
    MissingField(&'static str),

    /// Payload stream produced no bytes
    #[error("Empty payload")]
    EmptyPayload,

    /// Target directory could not be created
    #[error("Cannot create directory {path}: {source}")]
    DirectoryCreateFailed {
        path: PathBuf,
        source: io::Error,
    },

    /// Streamed copy failed or the caller aborted mid-transfer
    #[error("Write failed for {path}: {source}")]
    WriteFailed {
        path: PathBuf,
        source: io::Error,
    },

    /// Byte count on disk does not match the announced payload length
    #[error("Short write for {path}: wrote {written} of {expected} bytes")]
    ShortWrite {
        path: PathBuf,
        written: u64,
        expected: u64,
    },

    /// Disambiguation attempts exhausted within one name bucket
    #[error("Could not allocate a unique name for {base} in {dir}")]
    NameAllocationFailed {
        dir: PathBuf,
        base: String,
    },
}

impl IngestError {
    /// Caller error (reject with 400) as opposed to an environment or
    /// resource error (500).
    pub fn is_validation(&self) -> bool {
        matches!(self, IngestError::MissingField(_) | IngestError::EmptyPayload)
    }
}

/// Which corpus a sample is destined for. The two subtrees never mix:
/// recognition traffic cannot be attributed back to a training identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IngestMode {
    /// Attributed sample for the training corpus
    Training {
        speaker: String,
        category: String,
    },
    /// Unattributed sample for the flat recognition pool
    Recognition {
        original_name: Option<String>,
    },
}

impl IngestMode {
    pub fn kind(&self) -> ModeKind {
        match self {
            IngestMode::Training { .. } => ModeKind::Training,
            IngestMode::Recognition { .. } => ModeKind::Recognition,
        }
    }

    pub fn speaker(&self) -> Option<&str> {
        match self {
            IngestMode::Training { speaker, .. } => Some(speaker),
            IngestMode::Recognition { .. } => None,
        }
    }

    pub fn category(&self) -> Option<&str> {
        match self {
            IngestMode::Training { category, .. } => Some(category),
            IngestMode::Recognition { .. } => None,
        }
    }
}

/// Mode discriminant for reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ModeKind {
    Training,
    Recognition,
}

/// One validated unit of work. Ephemeral: lives for a single `ingest` call.
#[derive(Debug, Clone)]
pub struct IngestRequest {
    pub mode: IngestMode,
    /// Assigned by the core at validation time, never taken from the client
    pub received_at: DateTime<Utc>,
}

/// One persisted, immutable dataset file. The core never re-opens an entry.
#[derive(Debug, Clone, Serialize)]
pub struct DatasetEntry {
    pub path: PathBuf,
    pub filename: String,
    pub mode: ModeKind,
    pub created_at: DateTime<Utc>,
    pub size_bytes: u64,
}

/// The filing core. Stateless apart from its configuration; the dataset
/// subtree is the only shared mutable resource, so the store is re-entrant
/// across any number of concurrent callers.
pub struct IngestStore {
    root: PathBuf,
    extension: String,
}

impl IngestStore {
    /// Open a store rooted at `root`, creating both mode subtrees.
    ///
    /// A root that cannot be created or written is a configuration error
    /// caught here, at startup, not a per-request failure.
    pub fn open(root: &Path, extension: &str) -> soundpool_common::Result<Self> {
        let initializer = DatasetInitializer::new(root.to_path_buf());
        initializer.ensure_layout()?;
        Ok(Self {
            root: root.to_path_buf(),
            extension: extension.trim_start_matches('.').to_ascii_lowercase(),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn extension(&self) -> &str {
        &self.extension
    }

    /// Run one request through the filing pipeline: resolve the target
    /// directory, peek the payload, create the directory, claim a unique
    /// name, stream to disk.
    ///
    /// `expected_len` is checked against the byte count actually written
    /// when the transport announced a payload length.
    ///
    /// On any failure nothing remains visible in the dataset: the partial
    /// file is removed, and validation failures never touch the disk at all.
    pub async fn ingest<S>(
        &self,
        request: &IngestRequest,
        payload: S,
        expected_len: Option<u64>,
    ) -> Result<DatasetEntry, IngestError>
    where
        S: Stream<Item = io::Result<Bytes>> + Unpin + Send,
    {
        let mut payload = payload;
        let dir = paths::resolve(&self.root, &request.mode);

        // Pull the first non-empty chunk before any disk state exists, so an
        // empty or immediately-failing payload leaves the filesystem
        // untouched.
        let first = loop {
            match payload.next().await {
                Some(Ok(chunk)) if chunk.is_empty() => continue,
                Some(Ok(chunk)) => break chunk,
                Some(Err(source)) => {
                    return Err(IngestError::WriteFailed { path: dir, source });
                }
                None => return Err(IngestError::EmptyPayload),
            }
        };

        paths::ensure_dir(&dir).await?;

        let base = naming::base_name(request);
        let (file, path, filename) = naming::claim(&dir, &base, &self.extension).await?;
        let size_bytes = writer::persist(file, &path, first, payload, expected_len).await?;

        tracing::debug!(
            path = %path.display(),
            size_bytes,
            "dataset entry persisted"
        );

        Ok(DatasetEntry {
            path,
            filename,
            mode: request.mode.kind(),
            created_at: request.received_at,
            size_bytes,
        })
    }
}
