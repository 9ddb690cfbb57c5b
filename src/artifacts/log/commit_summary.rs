use crate::areas::database::Database;
use crate::artifacts::objects::commit::Commit;
use crate::artifacts::objects::object_id::ObjectId;
use serde::Serialize;

/// One entry of a history listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommitSummary {
    pub commit_id: ObjectId,
    /// Authoring time, serialized as RFC 3339
    pub commit_time: chrono::DateTime<chrono::FixedOffset>,
    /// Paths that differ from the first parent, sorted
    pub changed_files: Vec<String>,
    #[serde(skip)]
    pub author: String,
    #[serde(skip)]
    pub message: String,
}

impl CommitSummary {
    pub fn from_commit(
        database: &Database,
        commit_id: ObjectId,
        commit: &Commit,
    ) -> anyhow::Result<Self> {
        let parent_tree = match commit.parent() {
            Some(parent) => database
                .parse_object_as_commit(parent)?
                .map(|parent| parent.tree_oid().clone()),
            None => None,
        };

        let changed_files = database
            .tree_diff(parent_tree.as_ref(), Some(commit.tree_oid()))?
            .into_changes()
            .into_keys()
            .collect();

        Ok(CommitSummary {
            commit_id,
            commit_time: commit.timestamp(),
            changed_files,
            author: commit.author().display_name(),
            message: commit.short_message(),
        })
    }
}
