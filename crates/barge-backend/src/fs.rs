//! Filesystem-backed repository store.

use crate::{sanitize_name, AccessLevel, Backend, BackendError, Repository, Result};
use async_trait::async_trait;
use std::path::{Path, PathBuf};

/// Marker file that exports a repository to anonymous clients.
pub const EXPORT_OK_FILE: &str = "git-daemon-export-ok";

/// Repository store rooted at a directory of bare repositories.
///
/// A repository named `foo` lives at `<root>/foo.git`. It is visible to
/// anonymous clients only when the bare directory contains a
/// [`EXPORT_OK_FILE`] marker, unless the store is in `export_all` mode.
/// Unexported repositories resolve exactly like missing ones.
#[derive(Debug, Clone)]
pub struct FsBackend {
    root: PathBuf,
    anon_access: AccessLevel,
    export_all: bool,
}

impl FsBackend {
    /// Creates a store rooted at `root`, granting `anon_access` to every
    /// exported repository.
    pub fn new(root: impl Into<PathBuf>, anon_access: AccessLevel) -> Self {
        Self {
            root: root.into(),
            anon_access,
            export_all: false,
        }
    }

    /// Serves every repository under the root, marker file or not.
    pub fn export_all(mut self) -> Self {
        self.export_all = true;
        self
    }

    /// Root directory of the store.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn is_exported(&self, dir: &Path) -> bool {
        self.export_all || dir.join(EXPORT_OK_FILE).is_file()
    }

    fn is_bare_repository(dir: &Path) -> bool {
        dir.join("HEAD").is_file() && dir.join("objects").is_dir()
    }
}

#[async_trait]
impl Backend for FsBackend {
    async fn repository(&self, path: &str) -> Result<Repository> {
        let name = sanitize_name(path).ok_or_else(|| BackendError::NotFound(path.to_string()))?;
        let dir = self.root.join(format!("{name}.git"));
        if !Self::is_bare_repository(&dir) || !self.is_exported(&dir) {
            return Err(BackendError::NotFound(name));
        }
        Ok(Repository::new(name, dir))
    }

    async fn access_level(&self, _repo: &Repository) -> AccessLevel {
        self.anon_access
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn make_bare_repo(root: &Path, name: &str) -> PathBuf {
        let dir = root.join(format!("{name}.git"));
        fs::create_dir_all(dir.join("objects")).unwrap();
        fs::write(dir.join("HEAD"), "ref: refs/heads/main\n").unwrap();
        dir
    }

    #[tokio::test]
    async fn resolves_exported_repository() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = make_bare_repo(tmp.path(), "test");
        fs::write(dir.join(EXPORT_OK_FILE), "").unwrap();

        let backend = FsBackend::new(tmp.path(), AccessLevel::ReadOnly);
        let repo = backend.repository("/test.git").await.unwrap();
        assert_eq!(repo.name(), "test");
        assert_eq!(repo.path(), dir.as_path());
        assert_eq!(backend.access_level(&repo).await, AccessLevel::ReadOnly);
    }

    #[tokio::test]
    async fn unexported_repository_looks_missing() {
        let tmp = tempfile::tempdir().unwrap();
        make_bare_repo(tmp.path(), "hidden");

        let backend = FsBackend::new(tmp.path(), AccessLevel::ReadOnly);
        let err = backend.repository("/hidden.git").await.unwrap_err();
        assert!(matches!(err, BackendError::NotFound(_)));
    }

    #[tokio::test]
    async fn export_all_serves_unmarked_repositories() {
        let tmp = tempfile::tempdir().unwrap();
        make_bare_repo(tmp.path(), "open");

        let backend = FsBackend::new(tmp.path(), AccessLevel::ReadOnly).export_all();
        assert!(backend.repository("open").await.is_ok());
    }

    #[tokio::test]
    async fn missing_repository() {
        let tmp = tempfile::tempdir().unwrap();
        let backend = FsBackend::new(tmp.path(), AccessLevel::ReadOnly);
        assert!(backend.repository("/nope.git").await.is_err());
    }

    #[tokio::test]
    async fn plain_directory_is_not_a_repository() {
        let tmp = tempfile::tempdir().unwrap();
        fs::create_dir_all(tmp.path().join("junk.git")).unwrap();

        let backend = FsBackend::new(tmp.path(), AccessLevel::ReadOnly).export_all();
        assert!(backend.repository("junk").await.is_err());
    }

    #[tokio::test]
    async fn traversal_cannot_escape_the_root() {
        let tmp = tempfile::tempdir().unwrap();
        let backend = FsBackend::new(tmp.path().join("repos"), AccessLevel::ReadOnly).export_all();

        // A sibling of the root that a naive join would reach.
        make_bare_repo(tmp.path(), "outside");
        assert!(backend.repository("../outside.git").await.is_err());
    }
}
