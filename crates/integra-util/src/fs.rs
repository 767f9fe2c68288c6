use std::path::{Path, PathBuf};

use crate::errors::IntegraError;

/// Walk up from `start` looking for a file named `filename`.
/// Returns the path to the directory containing the file, or `None`.
pub fn find_ancestor_with(start: &Path, filename: &str) -> Option<PathBuf> {
    let mut current = start;
    loop {
        let candidate = current.join(filename);
        if candidate.is_file() {
            return Some(current.to_path_buf());
        }
        current = current.parent()?;
    }
}

/// Read a text file, attaching the path to the error message.
///
/// `what` names the kind of file for the message, e.g. `"catalog"`.
pub fn read_text(path: &Path, what: &str) -> Result<String, IntegraError> {
    tracing::debug!("reading {what} from {}", path.display());
    std::fs::read_to_string(path).map_err(|e| IntegraError::Generic {
        message: format!("Failed to read {what} {}: {e}", path.display()),
    })
}
