//! Git transfer services a daemon client can name.

use crate::{GitError, Result};
use std::fmt;

/// A git transfer service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Service {
    /// `git-upload-pack`: serves fetch and clone.
    UploadPack,
    /// `git-upload-archive`: serves `git archive --remote`.
    UploadArchive,
    /// `git-receive-pack`: serves push.
    ReceivePack,
}

impl Service {
    /// Resolves a service from its wire name.
    pub fn from_name(name: &str) -> Result<Self> {
        match name {
            "git-upload-pack" => Ok(Self::UploadPack),
            "git-upload-archive" => Ok(Self::UploadArchive),
            "git-receive-pack" => Ok(Self::ReceivePack),
            other => Err(GitError::UnknownService(other.to_string())),
        }
    }

    /// Wire name of the service.
    pub fn name(&self) -> &'static str {
        match self {
            Self::UploadPack => "git-upload-pack",
            Self::UploadArchive => "git-upload-archive",
            Self::ReceivePack => "git-receive-pack",
        }
    }

    /// Whether the service only ever reads from a repository.
    pub fn is_read_only(&self) -> bool {
        !matches!(self, Self::ReceivePack)
    }

    /// The `git` subcommand that implements this service.
    pub fn subcommand(&self) -> &'static str {
        match self {
            Self::UploadPack => "upload-pack",
            Self::UploadArchive => "upload-archive",
            Self::ReceivePack => "receive-pack",
        }
    }
}

impl fmt::Display for Service {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_name() {
        assert_eq!(
            Service::from_name("git-upload-pack").unwrap(),
            Service::UploadPack
        );
        assert_eq!(
            Service::from_name("git-upload-archive").unwrap(),
            Service::UploadArchive
        );
        assert_eq!(
            Service::from_name("git-receive-pack").unwrap(),
            Service::ReceivePack
        );
        assert!(Service::from_name("upload-pack").is_err());
        assert!(Service::from_name("").is_err());
    }

    #[test]
    fn test_read_only_classification() {
        assert!(Service::UploadPack.is_read_only());
        assert!(Service::UploadArchive.is_read_only());
        assert!(!Service::ReceivePack.is_read_only());
    }

    #[test]
    fn test_subcommand() {
        assert_eq!(Service::UploadPack.subcommand(), "upload-pack");
        assert_eq!(Service::UploadArchive.subcommand(), "upload-archive");
        assert_eq!(Service::ReceivePack.subcommand(), "receive-pack");
    }

    #[test]
    fn test_display_matches_wire_name() {
        assert_eq!(Service::UploadPack.to_string(), "git-upload-pack");
    }
}
