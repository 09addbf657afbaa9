//! Timestamp utilities

use chrono::{DateTime, Utc};

/// Get current UTC timestamp
pub fn now() -> DateTime<Utc> {
    Utc::now()
}

/// Format a timestamp at the resolution used for dataset filenames.
///
/// Second resolution, no separators that are unsafe in filenames:
/// `20240101_100000` for 2024-01-01T10:00:00Z.
pub fn dataset_stamp(at: &DateTime<Utc>) -> String {
    at.format("%Y%m%d_%H%M%S").to_string()
}
