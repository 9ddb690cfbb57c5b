use crate::areas::repository::Repository;
use crate::areas::workspace::Workspace;
use crate::artifacts::branch::branch_name::BranchName;
use crate::artifacts::objects::commit::{Author, Commit};
use crate::artifacts::objects::object_id::ObjectId;
use crate::artifacts::snapshot::Snapshot;
use crate::artifacts::snapshot::repo_path::RepoPath;
use crate::errors::{Error, Result};
use bytes::Bytes;

/// A single-file change to commit onto a branch
#[derive(Debug, Clone)]
pub struct CommitRequest {
    pub branch: String,
    pub path: String,
    pub content: Bytes,
    pub message: String,
    pub author: Author,
    /// Tip the caller last saw; when set, the commit fails with a write
    /// conflict unless the branch still points there
    pub expected_tip: Option<ObjectId>,
}

impl Repository {
    pub fn commit(&self, request: CommitRequest) -> Result<ObjectId> {
        let branch_name = BranchName::try_parse(request.branch.as_str())?;
        let path = RepoPath::try_parse(&request.path)?;
        if let Some(invalid) = request.author.forbidden_char() {
            return Err(Error::InvalidAuthor {
                author: request.author.display_name(),
                reason: format!("contains {invalid:?}"),
            });
        }

        let current_tip = self.refs().read_branch(&branch_name)?;
        let is_head_branch = self.refs().is_head_branch(&branch_name)?;
        if current_tip.is_none() && !is_head_branch {
            return Err(Error::BranchNotFound(branch_name.to_string()));
        }
        let observed_tip = request.expected_tip.or(current_tip);

        let root_tree = match &observed_tip {
            Some(tip) => Some(
                self.database()
                    .find_commit(tip)?
                    .ok_or_else(|| Error::CommitNotFound(tip.to_string()))?
                    .tree_oid()
                    .clone(),
            ),
            None => None,
        };

        let snapshot = Snapshot::new(self.database(), root_tree);
        let tree_oid = snapshot.write_file(&path, request.content.clone())?;

        let commit = Commit::new(
            observed_tip.iter().cloned().collect(),
            tree_oid.clone(),
            request.author,
            request.message,
        );
        let commit_oid = self.database().store(&commit)?;

        self.refs()
            .update_branch(&branch_name, observed_tip.as_ref(), &commit_oid)?;

        // the branch has moved, so a workspace that cannot take the file stays behind
        if is_head_branch
            && let Some(workspace) = self.workspace()
            && let Err(err) = self.write_to_workspace(workspace, tree_oid, &path, &request.content)
        {
            tracing::warn!(
                branch = %branch_name,
                commit = %commit_oid,
                path = %path,
                "workspace not updated: {err:#}"
            );
        }

        tracing::info!(
            branch = %branch_name,
            commit = %commit_oid,
            path = %path,
            root = observed_tip.is_none(),
            "committed change"
        );

        Ok(commit_oid)
    }

    fn write_to_workspace(
        &self,
        workspace: &Workspace,
        tree_oid: ObjectId,
        path: &RepoPath,
        content: &[u8],
    ) -> anyhow::Result<()> {
        let mode = Snapshot::new(self.database(), Some(tree_oid))
            .find_entry(path)?
            .map(|entry| entry.mode)
            .unwrap_or_default();

        workspace.write_file(path.as_ref(), content, mode)
    }
}
