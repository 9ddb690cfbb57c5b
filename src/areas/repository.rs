use crate::areas::database::Database;
use crate::areas::refs::Refs;
use crate::areas::workspace::Workspace;
use crate::artifacts::branch::branch_name::BranchName;
pub use crate::artifacts::branch::branch_name::DEFAULT_BRANCH;
use crate::errors::{Error, Result};
use anyhow::Context;
use std::path::{Path, PathBuf};

pub const GIT_DIR_NAME: &str = ".git";

/// A repository handle
///
/// Owns one object database and one reference namespace, backed either by a
/// git directory on disk or by memory. Disk repositories opened from a
/// working directory also carry a [`Workspace`]. The handle is `Send + Sync`;
/// every operation takes `&self`.
#[derive(Debug)]
pub struct Repository {
    git_dir: Option<Box<Path>>,
    database: Database,
    refs: Refs,
    workspace: Option<Workspace>,
}

impl Repository {
    fn on_disk(git_dir: PathBuf, workspace: Option<PathBuf>) -> Self {
        Repository {
            database: Database::on_disk(git_dir.join("objects").into_boxed_path()),
            refs: Refs::on_disk(git_dir.clone().into_boxed_path()),
            workspace: workspace.map(|path| Workspace::new(path.into_boxed_path())),
            git_dir: Some(git_dir.into_boxed_path()),
        }
    }

    /// Create an empty repository with `HEAD` naming an unborn `primary_branch`
    pub fn init(location: &Path, primary_branch: &BranchName) -> Result<Self> {
        if Self::find_git_dir(location).is_some() {
            return Err(Error::DestinationConflict {
                path: location.to_path_buf(),
                cause: "already contains a repository".to_string(),
            });
        }

        let git_dir = location.join(GIT_DIR_NAME);
        for dir in ["objects", "refs/heads"] {
            let dir = git_dir.join(dir);
            std::fs::create_dir_all(&dir)
                .with_context(|| format!("Unable to create directory {}", dir.display()))?;
        }

        let repository = Self::on_disk(git_dir, Some(location.to_path_buf()));
        repository.refs.set_head(primary_branch)?;

        tracing::info!(path = %location.display(), branch = %primary_branch, "initialized repository");

        Ok(repository)
    }

    /// Create a transient repository that lives only as long as the handle
    pub fn in_memory(primary_branch: &BranchName) -> Result<Self> {
        let repository = Repository {
            git_dir: None,
            database: Database::in_memory(),
            refs: Refs::in_memory(),
            workspace: None,
        };
        repository.refs.set_head(primary_branch)?;

        Ok(repository)
    }

    /// Open a working directory containing `.git`, or a bare git directory
    pub fn open(location: &Path) -> Result<Self> {
        let git_dir = Self::find_git_dir(location)
            .ok_or_else(|| Error::NotARepository(location.to_path_buf()))?;

        let workspace = (git_dir != location).then(|| location.to_path_buf());
        tracing::debug!(git_dir = %git_dir.display(), "opened repository");

        Ok(Self::on_disk(git_dir, workspace))
    }

    fn find_git_dir(location: &Path) -> Option<PathBuf> {
        let is_git_dir = |dir: &Path| dir.join("HEAD").is_file() && dir.join("objects").is_dir();

        let dot_git = location.join(GIT_DIR_NAME);
        if is_git_dir(&dot_git) {
            Some(dot_git)
        } else if is_git_dir(location) {
            Some(location.to_path_buf())
        } else {
            None
        }
    }

    /// The git directory, or `None` for an in-memory repository
    pub fn git_dir(&self) -> Option<&Path> {
        self.git_dir.as_deref()
    }

    pub fn database(&self) -> &Database {
        &self.database
    }

    pub fn refs(&self) -> &Refs {
        &self.refs
    }

    pub fn workspace(&self) -> Option<&Workspace> {
        self.workspace.as_ref()
    }

    /// The branch `HEAD` names
    pub fn primary_branch(&self) -> Result<BranchName> {
        self.refs
            .head_branch()?
            .ok_or_else(|| Error::RefNotFound("HEAD".to_string()))
    }
}
