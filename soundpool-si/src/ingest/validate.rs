//! Request validation
//!
//! Builds validated requests from raw transport fields. Mode is fixed by
//! which operation was invoked, never inferred from a client-supplied field,
//! so a client cannot mislabel recognition data as training data. No disk
//! I/O happens here.

use chrono::Utc;

use super::{IngestError, IngestMode, IngestRequest};

/// Longest path component accepted after sanitization
const MAX_COMPONENT_LEN: usize = 64;

/// Validate raw fields for a training-mode upload.
///
/// Both `speaker` and `category` flow into filesystem paths, so they pass
/// through the same sanitizer as client-supplied filenames; a field with
/// nothing usable left is treated as absent.
pub fn training_request(speaker: &str, category: &str) -> Result<IngestRequest, IngestError> {
    let speaker = sanitize_component(speaker).ok_or(IngestError::MissingField("speaker"))?;
    let category = sanitize_component(category).ok_or(IngestError::MissingField("category"))?;

    Ok(IngestRequest {
        mode: IngestMode::Training { speaker, category },
        received_at: Utc::now(),
    })
}

/// Build a recognition-mode request.
///
/// The client-supplied original name is optional traceability data; it is
/// sanitized before it may flow into filename derivation, and dropped
/// entirely when nothing usable survives.
pub fn recognition_request(original_name: Option<&str>) -> IngestRequest {
    let original_name = original_name.and_then(sanitize_component);

    IngestRequest {
        mode: IngestMode::Recognition { original_name },
        received_at: Utc::now(),
    }
}

/// Reduce untrusted input to a single safe path component.
///
/// Alphanumerics and '-' pass through; every other run of characters (path
/// separators, traversal dots, whitespace) collapses to a single '_'.
/// Leading and trailing separators are dropped, the result is capped at
/// [`MAX_COMPONENT_LEN`] characters, and `None` means nothing usable
/// survived.
pub fn sanitize_component(raw: &str) -> Option<String> {
    let mut out = String::new();
    let mut kept = 0usize;
    let mut pending_sep = false;

    for ch in raw.trim().chars() {
        if kept >= MAX_COMPONENT_LEN {
            break;
        }
        if ch.is_alphanumeric() || ch == '-' {
            if pending_sep && !out.is_empty() {
                out.push('_');
                kept += 1;
                if kept >= MAX_COMPONENT_LEN {
                    break;
                }
            }
            pending_sep = false;
            out.push(ch);
            kept += 1;
        } else {
            pending_sep = true;
        }
    }

    if out.is_empty() {
        None
    } else {
        Some(out)
    }
}
