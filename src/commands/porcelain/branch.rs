use crate::areas::repository::Repository;
use crate::artifacts::branch::branch_name::{BranchName, SymRefName};
use crate::artifacts::refs::Reference;
use crate::errors::{Error, Result};

impl Repository {
    /// Register `branch_name` at the tip of `source_refname` (`HEAD` by default)
    ///
    /// The source may be a short branch name, `refs/heads/…`, `HEAD` or `@`.
    /// Nothing changes when the source does not resolve or the name is taken.
    pub fn create_branch(
        &self,
        branch_name: &str,
        source_refname: Option<&str>,
    ) -> Result<Reference> {
        let branch_name = BranchName::try_parse(branch_name)?;
        let source_refname = source_refname.unwrap_or("HEAD");

        let source_ref = SymRefName::parse(source_refname)
            .map_err(|_| Error::SourceRefNotFound(source_refname.to_string()))?;
        let source_oid = self
            .refs()
            .read_oid(&source_ref)?
            .ok_or_else(|| Error::SourceRefNotFound(source_refname.to_string()))?;

        self.refs().create_branch(&branch_name, &source_oid)?;
        tracing::info!(branch = %branch_name, source = source_refname, tip = %source_oid, "created branch");

        Ok(Reference {
            name: branch_name.to_sym_ref_name().to_string(),
            target: source_oid,
        })
    }

    /// Every branch with its tip, ordered by name
    pub fn list_branches(&self) -> Result<Vec<Reference>> {
        Ok(self
            .refs()
            .list_branches()?
            .into_iter()
            .map(|(branch_name, target)| Reference {
                name: branch_name.to_sym_ref_name().to_string(),
                target,
            })
            .collect())
    }
}
