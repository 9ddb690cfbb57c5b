use crate::areas::repository::Repository;
use crate::artifacts::diff::diff_record::DiffRecord;
use crate::artifacts::diff::tree_diff::DiffFilter;
use crate::artifacts::objects::object_id::ObjectId;
use crate::errors::{Error, Result};

impl Repository {
    /// Per-path line changes going from commit `old` to commit `new`
    pub fn diff(&self, old: &str, new: &str, filter: Option<DiffFilter>) -> Result<Vec<DiffRecord>> {
        let old_tree = self.commit_tree(old)?;
        let new_tree = self.commit_tree(new)?;

        let tree_diff = self
            .database()
            .tree_diff(Some(&old_tree), Some(&new_tree))?;

        let records = tree_diff
            .changes()
            .iter()
            .filter(|(_, change)| filter.is_none_or(|filter| change.matches_filter(filter)))
            .map(|(path, change)| DiffRecord::from_change(self.database(), path, change))
            .collect::<anyhow::Result<Vec<_>>>()?;

        tracing::debug!(old, new, files = records.len(), "computed diff");

        Ok(records)
    }

    fn commit_tree(&self, commit_hash: &str) -> Result<ObjectId> {
        let not_found = || Error::CommitNotFound(commit_hash.to_string());
        let oid = ObjectId::try_parse(commit_hash.to_string()).map_err(|_| not_found())?;

        let commit = self.database().find_commit(&oid)?.ok_or_else(not_found)?;
        Ok(commit.tree_oid().clone())
    }
}
