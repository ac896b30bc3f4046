//! The repository backend trait.

use crate::{sanitize_name, AccessLevel, BackendError, Repository, Result};
use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::path::PathBuf;

/// A trait for repository stores.
///
/// Every connection resolves access independently through this trait; the
/// daemon caches nothing across connections, so a repository's access level
/// may change between two requests.
#[async_trait]
pub trait Backend: Send + Sync {
    /// Resolves a repository from a client-supplied path.
    ///
    /// Returns [`BackendError::NotFound`] when the path does not sanitize,
    /// the repository does not exist, or it is withheld from anonymous
    /// clients.
    async fn repository(&self, path: &str) -> Result<Repository>;

    /// Access level granted to anonymous clients for `repo`.
    async fn access_level(&self, repo: &Repository) -> AccessLevel;
}

/// An in-memory backend for testing.
pub struct MemoryBackend {
    repos: RwLock<HashMap<String, (PathBuf, AccessLevel)>>,
}

impl MemoryBackend {
    /// Creates an empty in-memory backend.
    pub fn new() -> Self {
        Self {
            repos: RwLock::new(HashMap::new()),
        }
    }

    /// Registers a repository under its store name.
    pub fn insert(&self, name: impl Into<String>, path: impl Into<PathBuf>, access: AccessLevel) {
        self.repos.write().insert(name.into(), (path.into(), access));
    }
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Backend for MemoryBackend {
    async fn repository(&self, path: &str) -> Result<Repository> {
        let name = sanitize_name(path).ok_or_else(|| BackendError::NotFound(path.to_string()))?;
        let repos = self.repos.read();
        let (dir, _) = repos
            .get(&name)
            .ok_or_else(|| BackendError::NotFound(name.clone()))?;
        Ok(Repository::new(name, dir.clone()))
    }

    async fn access_level(&self, repo: &Repository) -> AccessLevel {
        self.repos
            .read()
            .get(repo.name())
            .map(|(_, access)| *access)
            .unwrap_or(AccessLevel::NoAccess)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn memory_backend_resolves_sanitized_paths() {
        let backend = MemoryBackend::new();
        backend.insert("test", "/srv/repos/test.git", AccessLevel::ReadOnly);

        let repo = backend.repository("/test.git").await.unwrap();
        assert_eq!(repo.name(), "test");
        assert_eq!(backend.access_level(&repo).await, AccessLevel::ReadOnly);
    }

    #[tokio::test]
    async fn memory_backend_unknown_repo() {
        let backend = MemoryBackend::new();
        let err = backend.repository("/missing.git").await.unwrap_err();
        assert!(matches!(err, BackendError::NotFound(_)));
    }

    #[tokio::test]
    async fn memory_backend_private_repo_reports_no_access() {
        let backend = MemoryBackend::new();
        backend.insert("private", "/srv/repos/private.git", AccessLevel::NoAccess);

        let repo = backend.repository("private").await.unwrap();
        assert_eq!(backend.access_level(&repo).await, AccessLevel::NoAccess);
    }
}
