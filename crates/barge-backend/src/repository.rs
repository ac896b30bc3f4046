//! Repository handles and name sanitization.

use std::path::{Path, PathBuf};

/// A repository resolved by a backend.
///
/// The daemon treats this as an opaque capability; its only daemon-relevant
/// properties are the store name and the filesystem path handed to the git
/// subprocess.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Repository {
    name: String,
    path: PathBuf,
}

impl Repository {
    /// Creates a repository handle.
    pub fn new(name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
        }
    }

    /// Store name of the repository.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Filesystem path of the bare repository.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Normalizes a client-supplied repository path into a store name.
///
/// Strips the leading `/` and a trailing `.git`, and returns `None` for
/// names that are empty or contain `.` / `..` components, so a lookup can
/// never climb out of the store root.
pub fn sanitize_name(raw: &str) -> Option<String> {
    let name = raw.trim().trim_start_matches('/').trim_end_matches('/');
    let name = name.strip_suffix(".git").unwrap_or(name);
    if name.is_empty() {
        return None;
    }
    for component in name.split('/') {
        if component.is_empty() || component == "." || component == ".." {
            return None;
        }
    }
    Some(name.to_string())
}
