//! Path resolution
//!
//! Maps a validated request to its target directory. Training samples land
//! under one directory per speaker; recognition samples land in a single
//! flat pool that is deliberately never partitioned by speaker, so
//! training-side readers scanning `training/` can never discover them.

use std::path::{Path, PathBuf};

use soundpool_common::config::{RECOGNITION_DIR, TRAINING_DIR};

use super::{IngestError, IngestMode};

/// Target directory for a request. Pure: no filesystem access.
pub fn resolve(root: &Path, mode: &IngestMode) -> PathBuf {
    match mode {
        IngestMode::Training { speaker, .. } => root.join(TRAINING_DIR).join(speaker),
        IngestMode::Recognition { .. } => root.join(RECOGNITION_DIR),
    }
}

/// Create the target directory. Idempotent: an already-existing directory is
/// success, so concurrent first-writers for the same speaker cannot
/// race-fail.
pub async fn ensure_dir(dir: &Path) -> Result<(), IngestError> {
    tokio::fs::create_dir_all(dir)
        .await
        .map_err(|source| IngestError::DirectoryCreateFailed {
            path: dir.to_path_buf(),
            source,
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn training_resolves_to_speaker_directory() {
        let mode = IngestMode::Training {
            speaker: "alice".to_string(),
            category: "keyboard".to_string(),
        };
        assert_eq!(
            resolve(Path::new("/data"), &mode),
            PathBuf::from("/data/training/alice")
        );
    }

    #[test]
    fn recognition_resolves_to_flat_pool() {
        let mode = IngestMode::Recognition {
            original_name: Some("clip".to_string()),
        };
        assert_eq!(
            resolve(Path::new("/data"), &mode),
            PathBuf::from("/data/recognition")
        );
    }

    #[test]
    fn subtrees_never_overlap() {
        let training = IngestMode::Training {
            speaker: "alice".to_string(),
            category: "keyboard".to_string(),
        };
        let recognition = IngestMode::Recognition { original_name: None };
        let root = Path::new("/data");

        let training_dir = resolve(root, &training);
        let recognition_dir = resolve(root, &recognition);

        assert!(training_dir.starts_with(root.join(TRAINING_DIR)));
        assert!(!recognition_dir.starts_with(root.join(TRAINING_DIR)));
    }

    #[tokio::test]
    async fn ensure_dir_is_idempotent() {
        let temp = tempfile::TempDir::new().unwrap();
        let dir = temp.path().join("training").join("alice");

        ensure_dir(&dir).await.unwrap();
        ensure_dir(&dir).await.unwrap();

        assert!(dir.is_dir());
    }
}
