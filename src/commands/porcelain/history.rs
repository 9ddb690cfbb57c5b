use crate::areas::repository::Repository;
use crate::artifacts::branch::branch_name::SymRefName;
use crate::artifacts::log::commit_summary::CommitSummary;
use crate::artifacts::log::rev_list::RevList;
use crate::errors::{Error, Result};

#[derive(Debug, Clone, Copy, Default)]
pub struct HistoryOptions {
    pub max_count: Option<usize>,
}

impl Repository {
    /// Commits reachable from `start_ref`, newest first
    pub fn history(&self, start_ref: &str, options: HistoryOptions) -> Result<Vec<CommitSummary>> {
        let sym_ref = SymRefName::parse(start_ref)
            .map_err(|_| Error::RefNotFound(start_ref.to_string()))?;
        let start_oid = self
            .refs()
            .read_oid(&sym_ref)?
            .ok_or_else(|| Error::RefNotFound(start_ref.to_string()))?;

        let history = RevList::new(self.database(), start_oid)?
            .with_max_count(options.max_count)
            .map(|entry| {
                let (oid, commit) = entry?;
                CommitSummary::from_commit(self.database(), oid, &commit)
            })
            .collect::<anyhow::Result<Vec<_>>>()?;

        tracing::debug!(start = start_ref, commits = history.len(), "walked history");

        Ok(history)
    }
}
