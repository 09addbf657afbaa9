//! Filename derivation and collision-safe allocation
//!
//! Base pattern is `{tag}_{timestamp}` at second resolution, which is
//! coarser than the achievable request rate, so two requests can compute an
//! identical base name in the same directory. The claim step resolves this
//! with an atomic create-exclusive open: whoever opens the name first owns
//! it, everyone else moves on to the next `_NNN` suffix. No write ever
//! destroys a previously persisted entry.

use std::path::{Path, PathBuf};

use soundpool_common::time;
use tokio::fs::{File, OpenOptions};

use super::{IngestError, IngestMode, IngestRequest};

/// Fixed tag prefix for recognition-pool filenames
pub const RECOGNITION_TAG: &str = "rec";

/// Disambiguation attempts before a bucket is declared exhausted
const MAX_NAME_ATTEMPTS: u32 = 1000;

/// Base filename for a request, without extension or disambiguator.
///
/// Training: `{category}_{timestamp}`. Recognition: `rec_{timestamp}` with
/// the sanitized original name appended when the client supplied one.
pub fn base_name(request: &IngestRequest) -> String {
    let stamp = time::dataset_stamp(&request.received_at);
    match &request.mode {
        IngestMode::Training { category, .. } => format!("{category}_{stamp}"),
        IngestMode::Recognition { original_name } => match original_name {
            Some(name) => format!("{RECOGNITION_TAG}_{stamp}_{name}"),
            None => format!("{RECOGNITION_TAG}_{stamp}"),
        },
    }
}

/// Claim a unique filename in `dir` and open it for writing.
///
/// The first attempt uses the bare base name so the common case keeps the
/// plain `{tag}_{timestamp}` form; same-instant collisions get an additive
/// `_NNN` suffix, preserving prefix matching for downstream tooling. The
/// create-exclusive open makes the check-and-claim atomic with respect to
/// concurrent writers targeting the same directory.
pub async fn claim(
    dir: &Path,
    base: &str,
    extension: &str,
) -> Result<(File, PathBuf, String), IngestError> {
    for attempt in 0..MAX_NAME_ATTEMPTS {
        let filename = if attempt == 0 {
            format!("{base}.{extension}")
        } else {
            format!("{base}_{attempt:03}.{extension}")
        };
        let path = dir.join(&filename);

        match OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .await
        {
            Ok(file) => return Ok((file, path, filename)),
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => continue,
            Err(source) => return Err(IngestError::WriteFailed { path, source }),
        }
    }

    Err(IngestError::NameAllocationFailed {
        dir: dir.to_path_buf(),
        base: base.to_string(),
    })
}
