//! Remote repositories
//!
//! A [`Remote`] advertises branches and hands out serialized objects by ID.
//! Two transports implement it:
//!
//! - `local`: another repository on this machine (plain path or `file://`)
//! - `http`: git's dumb HTTP protocol (`info/refs`, `HEAD`, loose `objects/`)
//!
//! `transfer` copies the closure of a set of tips into a local database.

pub mod http;
pub mod local;
pub mod transfer;

use crate::artifacts::branch::branch_name::BranchName;
use crate::artifacts::objects::object_id::ObjectId;
use crate::errors::Error;
use async_trait::async_trait;
use bytes::Bytes;
use std::path::PathBuf;
use thiserror::Error;

/// Failures talking to a remote, before they are tied to a location
#[derive(Debug, Clone, Error)]
pub enum RemoteError {
    /// The remote could not be contacted or does not host a repository.
    #[error("{0}")]
    Unreachable(String),

    /// The remote does not have an object it should have.
    #[error("object {0} is missing")]
    MissingObject(ObjectId),

    /// An object arrived but is unusable, or the connection broke mid-transfer.
    #[error("{0}")]
    Transfer(String),
}

impl RemoteError {
    pub fn into_error(self, location: &str) -> Error {
        match self {
            RemoteError::Unreachable(cause) => Error::RemoteUnreachable {
                location: location.to_string(),
                cause,
            },
            other => Error::TransferFailed {
                location: location.to_string(),
                cause: other.to_string(),
            },
        }
    }
}

/// Branches a remote advertises, plus the branch its `HEAD` names if known
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RemoteRefs {
    pub head: Option<BranchName>,
    pub branches: Vec<(BranchName, ObjectId)>,
}

impl RemoteRefs {
    /// Branch a clone should check out: the remote's `HEAD` if it is advertised,
    /// else the first branch
    pub fn primary_branch(&self) -> Option<&BranchName> {
        self.head
            .as_ref()
            .filter(|head| self.branches.iter().any(|(name, _)| name == *head))
            .or_else(|| self.branches.first().map(|(name, _)| name))
    }
}

#[async_trait]
pub trait Remote: Send + Sync {
    fn location(&self) -> &str;

    async fn list_refs(&self) -> Result<RemoteRefs, RemoteError>;

    /// Serialized object (`<type> <size>\0<content>`), uncompressed
    async fn fetch_object(&self, oid: &ObjectId) -> Result<Bytes, RemoteError>;
}

/// Where a remote lives, parsed from user input
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteLocation {
    Local(PathBuf),
    Http(reqwest::Url),
}

impl RemoteLocation {
    pub fn parse(location: &str) -> Result<Self, RemoteError> {
        if location.starts_with("http://") || location.starts_with("https://") {
            let url = reqwest::Url::parse(location)
                .map_err(|err| RemoteError::Unreachable(format!("invalid URL: {err}")))?;
            return Ok(RemoteLocation::Http(url));
        }

        if location.starts_with("file://") {
            let path = reqwest::Url::parse(location)
                .ok()
                .and_then(|url| url.to_file_path().ok())
                .ok_or_else(|| RemoteError::Unreachable("invalid file URL".to_string()))?;
            return Ok(RemoteLocation::Local(path));
        }

        if location.contains("://") {
            return Err(RemoteError::Unreachable(
                "unsupported transport; expected a path, file://, http:// or https://".to_string(),
            ));
        }

        Ok(RemoteLocation::Local(PathBuf::from(location)))
    }

    /// Connect to the remote
    pub fn connect(&self, location: &str) -> Result<Box<dyn Remote>, RemoteError> {
        match self {
            RemoteLocation::Local(path) => {
                Ok(Box::new(local::LocalRemote::open(location, path)?))
            }
            RemoteLocation::Http(url) => Ok(Box::new(http::HttpRemote::new(location, url.clone())?)),
        }
    }
}
