//! Dumb HTTP transport
//!
//! The remote is a static file server exposing a git directory:
//!
//! - `info/refs`: one `<oid>\t<refname>` line per ref
//! - `HEAD`: `ref: refs/heads/<branch>`
//! - `objects/<xx>/<38 hex>`: zlib-compressed loose objects

use crate::artifacts::branch::branch_name::{BranchName, SymRefName};
use crate::artifacts::database::loose::inflate;
use crate::artifacts::objects::object_id::ObjectId;
use crate::artifacts::refs::SymRefOrOid;
use crate::artifacts::remote::{Remote, RemoteError, RemoteRefs};
use async_trait::async_trait;
use bytes::Bytes;
use reqwest::{Client, StatusCode, Url};

const USER_AGENT_VALUE: &str = concat!("bitflow/", env!("CARGO_PKG_VERSION"));

#[derive(Debug)]
pub struct HttpRemote {
    location: String,
    base: Url,
    client: Client,
}

impl HttpRemote {
    pub fn new(location: &str, mut base: Url) -> Result<Self, RemoteError> {
        // joined paths must land under the repository, not replace its last segment
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }

        let client = Client::builder()
            .user_agent(USER_AGENT_VALUE)
            .build()
            .map_err(|err| RemoteError::Unreachable(err.to_string()))?;

        Ok(HttpRemote {
            location: location.to_string(),
            base,
            client,
        })
    }

    fn url(&self, path: &str) -> Result<Url, RemoteError> {
        self.base
            .join(path)
            .map_err(|err| RemoteError::Unreachable(format!("invalid URL for {path}: {err}")))
    }

    async fn get(&self, url: Url) -> Result<reqwest::Response, reqwest::Error> {
        self.client.get(url).send().await
    }

    async fn read_head(&self) -> Option<BranchName> {
        let response = self.get(self.url("HEAD").ok()?).await.ok()?;
        if !response.status().is_success() {
            return None;
        }

        let content = response.text().await.ok()?;
        match SymRefOrOid::parse(&content).ok()?? {
            SymRefOrOid::SymRef { sym_ref_name } => sym_ref_name.branch_name(),
            SymRefOrOid::Oid(_) => None,
        }
    }
}

/// Branch lines of an `info/refs` listing; other refs and peeled tags are skipped
pub fn parse_info_refs(content: &str) -> Result<Vec<(BranchName, ObjectId)>, RemoteError> {
    let mut branches = Vec::new();

    for line in content.lines().filter(|line| !line.trim().is_empty()) {
        let (oid, name) = line
            .split_once('\t')
            .ok_or_else(|| RemoteError::Unreachable(format!("malformed info/refs line: {line}")))?;
        let Some(branch_name) = SymRefName::new(name.trim().to_string()).branch_name() else {
            continue;
        };
        let oid = ObjectId::try_parse(oid.trim().to_string())
            .map_err(|err| RemoteError::Unreachable(format!("malformed info/refs line: {err}")))?;

        branches.push((branch_name, oid));
    }

    branches.sort();
    Ok(branches)
}

#[async_trait]
impl Remote for HttpRemote {
    fn location(&self) -> &str {
        &self.location
    }

    async fn list_refs(&self) -> Result<RemoteRefs, RemoteError> {
        let response = self
            .get(self.url("info/refs")?)
            .await
            .map_err(|err| RemoteError::Unreachable(err.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(RemoteError::Unreachable(match status {
                StatusCode::NOT_FOUND => "no repository found (info/refs is missing)".to_string(),
                status => format!("info/refs returned {status}"),
            }));
        }

        let content = response
            .text()
            .await
            .map_err(|err| RemoteError::Unreachable(err.to_string()))?;

        Ok(RemoteRefs {
            head: self.read_head().await,
            branches: parse_info_refs(&content)?,
        })
    }

    async fn fetch_object(&self, oid: &ObjectId) -> Result<Bytes, RemoteError> {
        let path = format!("objects/{}/{}", &oid.as_ref()[..2], &oid.as_ref()[2..]);
        let response = self
            .get(self.url(&path)?)
            .await
            .map_err(|err| RemoteError::Transfer(err.to_string()))?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(RemoteError::MissingObject(oid.clone()));
        }
        if !status.is_success() {
            return Err(RemoteError::Transfer(format!("{path} returned {status}")));
        }

        let compressed = response
            .bytes()
            .await
            .map_err(|err| RemoteError::Transfer(err.to_string()))?;
        tracing::debug!(object = %oid, bytes = compressed.len(), "fetched object");

        inflate(&compressed).map_err(|err| RemoteError::Transfer(format!("object {oid}: {err:#}")))
    }
}
