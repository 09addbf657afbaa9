//! Storage writer
//!
//! Streams a payload into a freshly claimed file chunk-by-chunk, never
//! holding the whole payload in memory. The writer trusts the path resolver
//! and naming policy completely; its one job is to either finish the copy or
//! leave no trace.

use std::io;
use std::path::{Path, PathBuf};

use bytes::Bytes;
use futures::{Stream, StreamExt};
use tokio::fs::File;
use tokio::io::AsyncWriteExt;

use super::IngestError;

/// Removes a claimed file on drop unless the write completed.
///
/// Covers both I/O failures and caller aborts: when the transfer future is
/// dropped mid-copy, the guard still runs and the partial entry never
/// becomes visible to dataset readers.
struct PartialFileGuard {
    path: PathBuf,
    armed: bool,
}

impl PartialFileGuard {
    fn new(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
            armed: true,
        }
    }

    fn disarm(&mut self) {
        self.armed = false;
    }
}

impl Drop for PartialFileGuard {
    fn drop(&mut self) {
        if self.armed {
            if let Err(e) = std::fs::remove_file(&self.path) {
                tracing::warn!(
                    path = %self.path.display(),
                    error = %e,
                    "could not remove partial dataset file"
                );
            }
        }
    }
}

async fn copy_chunks<S>(file: &mut File, first: Bytes, rest: &mut S) -> io::Result<u64>
where
    S: Stream<Item = io::Result<Bytes>> + Unpin + Send,
{
    let mut written = first.len() as u64;
    file.write_all(&first).await?;

    while let Some(chunk) = rest.next().await {
        let chunk = chunk?;
        file.write_all(&chunk).await?;
        written += chunk.len() as u64;
    }

    file.flush().await?;
    Ok(written)
}

/// Copy the payload into the claimed file and return the byte count written.
///
/// `first` is the chunk the pipeline pulled while probing for an empty
/// payload; `rest` is the remainder of the stream. When the transport
/// announced a payload length, a mismatch with the actual count is a
/// [`IngestError::ShortWrite`] and the file is removed like any other
/// failure.
pub async fn persist<S>(
    mut file: File,
    path: &Path,
    first: Bytes,
    mut rest: S,
    expected_len: Option<u64>,
) -> Result<u64, IngestError>
where
    S: Stream<Item = io::Result<Bytes>> + Unpin + Send,
{
    let mut guard = PartialFileGuard::new(path);

    let result = copy_chunks(&mut file, first, &mut rest).await;
    // Close the handle before the guard decides the file's fate
    drop(file);

    let written = result.map_err(|source| IngestError::WriteFailed {
        path: path.to_path_buf(),
        source,
    })?;

    if let Some(expected) = expected_len {
        if written != expected {
            return Err(IngestError::ShortWrite {
                path: path.to_path_buf(),
                written,
                expected,
            });
        }
    }

    guard.disarm();
    Ok(written)
}
