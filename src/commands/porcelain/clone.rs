use crate::areas::repository::Repository;
use crate::areas::workspace::Workspace;
use crate::artifacts::branch::branch_name::BranchName;
use crate::artifacts::remote::transfer::fetch_closure;
use crate::artifacts::remote::{Remote, RemoteError, RemoteLocation};
use crate::artifacts::snapshot::Snapshot;
use crate::errors::{Error, Result};
use std::path::Path;
use std::time::Duration;

pub const DEFAULT_CLONE_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Debug, Clone)]
pub struct CloneOptions {
    /// Upper bound on the whole transfer, from listing refs to the last object
    pub timeout: Duration,
    /// `HEAD` target when the remote advertises no branches
    pub default_branch: BranchName,
}

impl Default for CloneOptions {
    fn default() -> Self {
        CloneOptions {
            timeout: DEFAULT_CLONE_TIMEOUT,
            default_branch: BranchName::default(),
        }
    }
}

impl Repository {
    /// Clone `location` into a new repository at `destination`
    ///
    /// The destination must be absent or an empty directory. On failure
    /// everything the clone created there is removed again.
    pub async fn clone_remote(
        location: &str,
        destination: &Path,
        options: &CloneOptions,
    ) -> Result<Self> {
        let existed = check_destination(destination)?;
        let remote = connect(location)?;

        let cloned = async {
            let repository = Repository::init(destination, &options.default_branch)?;
            repository.populate(remote.as_ref(), options).await?;
            Ok::<_, Error>(repository)
        }
        .await;

        match cloned {
            Ok(repository) => {
                tracing::info!(remote = location, path = %destination.display(), "cloned repository");
                Ok(repository)
            }
            Err(err) => {
                remove_clone(destination, existed);
                Err(err)
            }
        }
    }

    /// Clone `location` into a transient repository without a workspace
    pub async fn clone_into_memory(location: &str, options: &CloneOptions) -> Result<Self> {
        let remote = connect(location)?;

        let repository = Repository::in_memory(&options.default_branch)?;
        repository.populate(remote.as_ref(), options).await?;
        tracing::info!(remote = location, "cloned repository into memory");

        Ok(repository)
    }

    /// Get a repository for `source`
    ///
    /// HTTP(S) URLs are cloned into memory; paths and `file://` URLs are
    /// opened in place.
    pub async fn resolve(source: &str, options: &CloneOptions) -> Result<Self> {
        match RemoteLocation::parse(source).map_err(|err| err.into_error(source))? {
            RemoteLocation::Http(_) => Self::clone_into_memory(source, options).await,
            RemoteLocation::Local(path) => Self::open(&path),
        }
    }

    async fn populate(&self, remote: &dyn Remote, options: &CloneOptions) -> Result<()> {
        let location = remote.location().to_string();

        let transfer = async {
            let remote_refs = remote.list_refs().await?;
            let tips = remote_refs.branches.iter().map(|(_, oid)| oid.clone());
            let fetched = fetch_closure(remote, self.database(), tips).await?;

            Ok::<_, RemoteError>((remote_refs, fetched))
        };
        let (remote_refs, fetched) = tokio::time::timeout(options.timeout, transfer)
            .await
            .map_err(|_| Error::TransferFailed {
                location: location.clone(),
                cause: format!("timed out after {:?}", options.timeout),
            })?
            .map_err(|err| err.into_error(&location))?;
        tracing::debug!(remote = %location, objects = fetched, "fetched objects");

        for (branch_name, oid) in &remote_refs.branches {
            self.refs().write_branch(branch_name, oid)?;
        }

        let primary_branch = remote_refs
            .primary_branch()
            .cloned()
            .unwrap_or_else(|| options.default_branch.clone());
        self.refs().set_head(&primary_branch)?;

        if let Some(workspace) = self.workspace()
            && let Some(tip) = self.refs().read_branch(&primary_branch)?
        {
            let commit = self
                .database()
                .find_commit(&tip)?
                .ok_or_else(|| Error::CommitNotFound(tip.to_string()))?;
            let snapshot = Snapshot::new(self.database(), Some(commit.tree_oid().clone()));
            let files = workspace.checkout(self.database(), &snapshot)?;
            tracing::debug!(branch = %primary_branch, files, "checked out primary branch");
        }

        Ok(())
    }
}

fn connect(location: &str) -> Result<Box<dyn Remote>> {
    RemoteLocation::parse(location)
        .and_then(|remote_location| remote_location.connect(location))
        .map_err(|err| err.into_error(location))
}

/// Fails unless `destination` is absent or an empty directory; returns
/// whether it already existed
fn check_destination(destination: &Path) -> Result<bool> {
    let conflict = |cause: &str| Error::DestinationConflict {
        path: destination.to_path_buf(),
        cause: cause.to_string(),
    };

    if !destination.exists() {
        return Ok(false);
    }
    if !destination.is_dir() {
        return Err(conflict("is not a directory"));
    }
    if Repository::open(destination).is_ok() {
        return Err(conflict("already contains a repository"));
    }
    if !Workspace::new(destination.into()).is_empty()? {
        return Err(conflict("is not empty"));
    }

    Ok(true)
}

fn remove_clone(destination: &Path, existed: bool) {
    let removed = if existed {
        remove_contents(destination)
    } else if destination.exists() {
        std::fs::remove_dir_all(destination)
    } else {
        Ok(())
    };

    if let Err(err) = removed {
        tracing::warn!(path = %destination.display(), error = %err, "failed to clean up clone destination");
    }
}

fn remove_contents(dir: &Path) -> std::io::Result<()> {
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_dir() {
            std::fs::remove_dir_all(&path)?;
        } else {
            std::fs::remove_file(&path)?;
        }
    }

    Ok(())
}
