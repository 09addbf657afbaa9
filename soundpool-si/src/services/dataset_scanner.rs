//! Dataset survey scanner
//!
//! Walks the dataset root and tallies what has been collected: training
//! samples per speaker, recognition pool size, extension breakdown, total
//! bytes. Strictly read-only. Only files in the expected positions are
//! counted (`training/<speaker>/<file>`, `recognition/<file>`); anything
//! else is skipped with a warning.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Serialize;
use thiserror::Error;
use walkdir::WalkDir;

use soundpool_common::config::{RECOGNITION_DIR, TRAINING_DIR};

/// Dataset scanner errors
#[derive(Debug, Error)]
pub enum ScanError {
    /// Dataset root does not exist
    #[error("Path not found: {0}")]
    PathNotFound(PathBuf),

    /// Dataset root exists but is not a directory
    #[error("Not a directory: {0}")]
    NotADirectory(PathBuf),
}

/// Scan result with per-mode statistics
#[derive(Debug, Clone, Default, Serialize)]
pub struct DatasetStats {
    /// Attributed samples under `training/`
    pub training_samples: usize,
    /// Unattributed samples in the recognition pool
    pub recognition_samples: usize,
    /// Sample count per speaker
    pub speakers: BTreeMap<String, usize>,
    /// File count per extension (lowercased)
    pub by_extension: BTreeMap<String, usize>,
    /// Total size of all counted samples in bytes
    pub total_bytes: u64,
}

/// Read-only dataset scanner
pub struct DatasetScanner {
    root: PathBuf,
    ignore_patterns: Vec<String>,
}

impl DatasetScanner {
    /// Create a scanner with the default system-file ignore list
    pub fn new(root: PathBuf) -> Self {
        Self {
            root,
            ignore_patterns: vec![
                ".DS_Store".to_string(),
                "Thumbs.db".to_string(),
                ".git".to_string(),
            ],
        }
    }

    fn is_ignored(&self, name: &str) -> bool {
        self.ignore_patterns.iter().any(|p| p == name)
    }

    /// Survey the dataset root
    pub fn scan(&self) -> Result<DatasetStats, ScanError> {
        if !self.root.exists() {
            return Err(ScanError::PathNotFound(self.root.clone()));
        }
        if !self.root.is_dir() {
            return Err(ScanError::NotADirectory(self.root.clone()));
        }

        let mut stats = DatasetStats::default();

        self.scan_training(&mut stats);
        self.scan_recognition(&mut stats);

        Ok(stats)
    }

    fn scan_training(&self, stats: &mut DatasetStats) {
        let training_root = self.root.join(TRAINING_DIR);

        for entry in WalkDir::new(&training_root)
            .follow_links(false)
            .min_depth(2)
            .max_depth(2)
            .into_iter()
            .filter_map(|e| match e {
                Ok(entry) => Some(entry),
                Err(e) => {
                    tracing::warn!("Error accessing training entry: {}", e);
                    None
                }
            })
        {
            if !entry.file_type().is_file() {
                continue;
            }
            let name = entry.file_name().to_string_lossy();
            if self.is_ignored(&name) {
                continue;
            }

            // Parent directory name is the speaker
            let speaker = entry
                .path()
                .parent()
                .and_then(Path::file_name)
                .map(|s| s.to_string_lossy().to_string());
            let Some(speaker) = speaker else { continue };

            stats.training_samples += 1;
            *stats.speakers.entry(speaker).or_insert(0) += 1;
            self.count_file(entry.path(), stats);
        }
    }

    fn scan_recognition(&self, stats: &mut DatasetStats) {
        let recognition_root = self.root.join(RECOGNITION_DIR);

        for entry in WalkDir::new(&recognition_root)
            .follow_links(false)
            .min_depth(1)
            .max_depth(1)
            .into_iter()
            .filter_map(|e| match e {
                Ok(entry) => Some(entry),
                Err(e) => {
                    tracing::warn!("Error accessing recognition entry: {}", e);
                    None
                }
            })
        {
            if !entry.file_type().is_file() {
                continue;
            }
            let name = entry.file_name().to_string_lossy();
            if self.is_ignored(&name) {
                continue;
            }

            stats.recognition_samples += 1;
            self.count_file(entry.path(), stats);
        }
    }

    fn count_file(&self, path: &Path, stats: &mut DatasetStats) {
        if let Some(ext) = path.extension() {
            let ext = ext.to_string_lossy().to_ascii_lowercase();
            *stats.by_extension.entry(ext).or_insert(0) += 1;
        }
        match std::fs::metadata(path) {
            Ok(meta) => stats.total_bytes += meta.len(),
            Err(e) => tracing::warn!(path = %path.display(), "Cannot stat file: {}", e),
        }
    }
}
