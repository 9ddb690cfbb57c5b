//! Error kinds surfaced by repository operations
//!
//! Every variant is terminal for the operation that produced it. Nothing is
//! retried internally; callers decide whether to re-read state and try again
//! (for example after a [`Error::WriteConflict`]).
//!
//! Storage internals work with `anyhow::Result` and attach context as they go;
//! those failures reach callers as [`Error::Storage`] with the full chain.

use crate::artifacts::objects::object_id::ObjectId;
use std::path::PathBuf;
use thiserror::Error;

/// Result alias for repository operations.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// The remote could not be contacted or does not host a repository.
    #[error("remote {location} is unreachable: {cause}")]
    RemoteUnreachable { location: String, cause: String },

    /// Objects could not be fetched from the remote, or the transfer timed out.
    #[error("transfer from {location} failed: {cause}")]
    TransferFailed { location: String, cause: String },

    #[error("not a repository: {}", .0.display())]
    NotARepository(PathBuf),

    /// The destination already holds a repository or other content.
    #[error("destination {} {cause}", .path.display())]
    DestinationConflict { path: PathBuf, cause: String },

    #[error("branch {0} not found")]
    BranchNotFound(String),

    #[error("source ref {0} not found")]
    SourceRefNotFound(String),

    #[error("branch {0} already exists")]
    BranchAlreadyExists(String),

    /// The branch moved between reading its tip and swapping in the new commit.
    #[error("write conflict on branch {branch}: expected {}, found {}", display_tip(.expected), display_tip(.actual))]
    WriteConflict {
        branch: String,
        expected: Option<ObjectId>,
        actual: Option<ObjectId>,
    },

    #[error("invalid path {path}: {reason}")]
    InvalidPath { path: String, reason: String },

    /// The author name or email would break the commit header.
    #[error("invalid author {author}: {reason}")]
    InvalidAuthor { author: String, reason: String },

    #[error("invalid ref name {0}")]
    InvalidRefName(String),

    #[error("ref {0} not found")]
    RefNotFound(String),

    #[error("commit {0} not found")]
    CommitNotFound(String),

    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}

fn display_tip(tip: &Option<ObjectId>) -> String {
    match tip {
        Some(oid) => oid.to_short_oid(),
        None => "no commit".to_string(),
    }
}

impl Error {
    pub(crate) fn invalid_path(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Error::InvalidPath {
            path: path.into(),
            reason: reason.into(),
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Storage(err.into())
    }
}
