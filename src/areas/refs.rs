//! Reference namespace
//!
//! Branches live under `refs/heads/` and point at commits. `HEAD` is a
//! symbolic ref naming the primary branch, which may be unborn.
//!
//! ## Updates
//!
//! Branch tips only move through [`RefBackend::compare_and_swap`]. Creating a
//! branch expects the ref to be absent; committing expects the tip the caller
//! observed. A mismatch surfaces as [`Error::BranchAlreadyExists`] or
//! [`Error::WriteConflict`] and leaves the ref untouched.

use crate::artifacts::branch::branch_name::{BranchName, REF_PREFIX, SymRefName};
use crate::artifacts::objects::object_id::ObjectId;
use crate::artifacts::refs::backend::RefBackend;
use crate::artifacts::refs::files::FileRefs;
use crate::artifacts::refs::memory::MemoryRefs;
use crate::artifacts::refs::{RefUpdate, SymRefOrOid};
use crate::errors::{Error, Result};
use std::path::Path;

/// Symbolic refs nested deeper than this are treated as a loop
const MAX_SYMREF_DEPTH: usize = 5;

#[derive(Debug)]
pub struct Refs {
    backend: Box<dyn RefBackend>,
}

impl Refs {
    pub fn new(backend: Box<dyn RefBackend>) -> Self {
        Refs { backend }
    }

    pub fn on_disk(path: Box<Path>) -> Self {
        Self::new(Box::new(FileRefs::new(path)))
    }

    pub fn in_memory() -> Self {
        Self::new(Box::<MemoryRefs>::default())
    }

    /// Get the ref `source` ultimately names
    ///
    /// Follows symbolic refs, so for `HEAD -> refs/heads/master` this yields
    /// `refs/heads/master` whether or not the branch has commits yet.
    pub fn current_ref(&self, source: &SymRefName) -> anyhow::Result<SymRefName> {
        let mut current = source.clone();

        for _ in 0..MAX_SYMREF_DEPTH {
            match self.backend.read(&current)? {
                Some(SymRefOrOid::SymRef { sym_ref_name }) => current = sym_ref_name,
                Some(SymRefOrOid::Oid(_)) | None => return Ok(current),
            }
        }

        anyhow::bail!("Symbolic ref {source} nests too deeply")
    }

    /// Read the commit a ref points to, following symbolic refs
    pub fn read_oid(&self, sym_ref_name: &SymRefName) -> anyhow::Result<Option<ObjectId>> {
        let target = self.current_ref(sym_ref_name)?;

        Ok(self
            .backend
            .read(&target)?
            .as_ref()
            .and_then(SymRefOrOid::as_oid)
            .cloned())
    }

    pub fn read_head(&self) -> anyhow::Result<Option<ObjectId>> {
        self.read_oid(&SymRefName::head())
    }

    pub fn read_branch(&self, branch_name: &BranchName) -> anyhow::Result<Option<ObjectId>> {
        self.read_oid(&branch_name.to_sym_ref_name())
    }

    /// The branch `HEAD` names, if `HEAD` is symbolic
    pub fn head_branch(&self) -> anyhow::Result<Option<BranchName>> {
        Ok(self.current_ref(&SymRefName::head())?.branch_name())
    }

    pub fn is_head_branch(&self, branch_name: &BranchName) -> anyhow::Result<bool> {
        Ok(self.head_branch()?.as_ref() == Some(branch_name))
    }

    /// Point `HEAD` at a branch, which need not exist yet
    pub fn set_head(&self, branch_name: &BranchName) -> anyhow::Result<()> {
        self.backend.write(
            &SymRefName::head(),
            &SymRefOrOid::SymRef {
                sym_ref_name: branch_name.to_sym_ref_name(),
            },
        )
    }

    /// Register a new branch; fails if the name is already taken
    pub fn create_branch(&self, branch_name: &BranchName, oid: &ObjectId) -> Result<()> {
        match self
            .backend
            .compare_and_swap(&branch_name.to_sym_ref_name(), None, oid)?
        {
            RefUpdate::Updated => Ok(()),
            RefUpdate::Rejected { .. } => Err(Error::BranchAlreadyExists(branch_name.to_string())),
        }
    }

    /// Move a branch from `expected` to `new`
    ///
    /// `expected` is `None` when the caller saw the branch unborn.
    pub fn update_branch(
        &self,
        branch_name: &BranchName,
        expected: Option<&ObjectId>,
        new: &ObjectId,
    ) -> Result<()> {
        match self
            .backend
            .compare_and_swap(&branch_name.to_sym_ref_name(), expected, new)?
        {
            RefUpdate::Updated => Ok(()),
            RefUpdate::Rejected { current } => Err(Error::WriteConflict {
                branch: branch_name.to_string(),
                expected: expected.cloned(),
                actual: current,
            }),
        }
    }

    /// Unconditionally set a branch tip; used when populating a fresh clone
    pub fn write_branch(&self, branch_name: &BranchName, oid: &ObjectId) -> anyhow::Result<()> {
        self.backend
            .write(&branch_name.to_sym_ref_name(), &SymRefOrOid::Oid(oid.clone()))
    }

    /// All branches with their tips, ordered by name
    pub fn list_branches(&self) -> anyhow::Result<Vec<(BranchName, ObjectId)>> {
        let mut branches = Vec::new();

        for sym_ref_name in self.backend.list(REF_PREFIX)? {
            let Some(branch_name) = sym_ref_name.branch_name() else {
                continue;
            };
            if let Some(oid) = self.read_oid(&sym_ref_name)? {
                branches.push((branch_name, oid));
            }
        }

        Ok(branches)
    }
}
