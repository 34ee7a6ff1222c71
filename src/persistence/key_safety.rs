//! Store key validation and symlink-escape detection.
//!
//! Keys come from session ids and scope names, so the file backend treats
//! them as untrusted: every key is checked segment by segment before it is
//! mapped onto a path under the store root.

use std::path::{Path, PathBuf};

use crate::{AppError, Result};

/// Check that `key` is a well-formed store key.
///
/// # Errors
///
/// Returns `AppError::Persistence` if the key is empty, has empty segments,
/// uses `.`/`..`, or contains characters outside `[A-Za-z0-9._-]`.
pub fn validate_key(key: &str) -> Result<()> {
    if key.is_empty() {
        return Err(AppError::Persistence("store key must not be empty".into()));
    }

    for segment in key.split('/') {
        if segment.is_empty() || segment == "." || segment == ".." {
            return Err(AppError::Persistence(format!(
                "store key '{key}' has an invalid segment"
            )));
        }
        if !segment
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'))
        {
            return Err(AppError::Persistence(format!(
                "store key '{key}' contains unsupported characters"
            )));
        }
    }

    Ok(())
}

/// Map `key` onto a file path under `root`.
///
/// `root` must already exist. If the target exists it is canonicalized and
/// must still resolve inside `root`.
///
/// # Errors
///
/// Returns `AppError::Persistence` if the key is malformed, the root cannot
/// be resolved, or a symlink points outside the root.
pub fn resolve_key(root: &Path, key: &str) -> Result<PathBuf> {
    validate_key(key)?;

    let root = root
        .canonicalize()
        .map_err(|err| AppError::Persistence(format!("store root invalid: {err}")))?;

    let mut path = root.clone();
    for segment in key.split('/') {
        path.push(segment);
    }

    if path.exists() {
        let canonical = path
            .canonicalize()
            .map_err(|err| AppError::Persistence(format!("cannot resolve key path: {err}")))?;
        if !canonical.starts_with(&root) {
            return Err(AppError::Persistence(format!(
                "store key '{key}' escapes the store root"
            )));
        }
        Ok(canonical)
    } else {
        Ok(path)
    }
}
