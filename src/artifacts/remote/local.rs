use crate::areas::repository::Repository;
use crate::artifacts::objects::object_id::ObjectId;
use crate::artifacts::remote::{Remote, RemoteError, RemoteRefs};
use async_trait::async_trait;
use bytes::Bytes;
use std::path::Path;

/// A repository on the local filesystem acting as a remote
#[derive(Debug)]
pub struct LocalRemote {
    location: String,
    repository: Repository,
}

impl LocalRemote {
    pub fn open(location: &str, path: &Path) -> Result<Self, RemoteError> {
        let repository =
            Repository::open(path).map_err(|err| RemoteError::Unreachable(err.to_string()))?;

        Ok(LocalRemote {
            location: location.to_string(),
            repository,
        })
    }
}

#[async_trait]
impl Remote for LocalRemote {
    fn location(&self) -> &str {
        &self.location
    }

    async fn list_refs(&self) -> Result<RemoteRefs, RemoteError> {
        let refs = self.repository.refs();
        let read_failed = |err: anyhow::Error| RemoteError::Unreachable(format!("{err:#}"));

        Ok(RemoteRefs {
            head: refs.head_branch().map_err(read_failed)?,
            branches: refs.list_branches().map_err(read_failed)?,
        })
    }

    async fn fetch_object(&self, oid: &ObjectId) -> Result<Bytes, RemoteError> {
        let database = self.repository.database();

        match database.contains(oid) {
            Ok(true) => database
                .load(oid)
                .map_err(|err| RemoteError::Transfer(format!("{err:#}"))),
            Ok(false) => Err(RemoteError::MissingObject(oid.clone())),
            Err(err) => Err(RemoteError::Transfer(format!("{err:#}"))),
        }
    }
}
