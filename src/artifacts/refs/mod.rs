//! Reference storage
//!
//! - `backend`: the storage trait with its compare-and-swap primitive
//! - `files`: one file per ref under the repository directory
//! - `memory`: a locked map for transient repositories

pub mod backend;
pub mod files;
pub mod memory;

use crate::artifacts::branch::branch_name::SymRefName;
use crate::artifacts::objects::object_id::ObjectId;
use serde::Serialize;

/// Regex pattern for parsing symbolic references
pub const SYMREF_REGEX: &str = r"^ref: (.+)$";

/// A reference value: either another ref name or a direct object ID
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SymRefOrOid {
    SymRef { sym_ref_name: SymRefName },
    Oid(ObjectId),
}

impl SymRefOrOid {
    pub fn parse(content: &str) -> anyhow::Result<Option<SymRefOrOid>> {
        let content = content.trim();
        if content.is_empty() {
            return Ok(None);
        }

        let symref_match = regex::Regex::new(SYMREF_REGEX)?.captures(content);
        if let Some(symref_match) = symref_match {
            Ok(Some(SymRefOrOid::SymRef {
                sym_ref_name: SymRefName::new(symref_match[1].to_string()),
            }))
        } else {
            Ok(Some(SymRefOrOid::Oid(ObjectId::try_parse(
                content.to_string(),
            )?)))
        }
    }

    pub fn as_oid(&self) -> Option<&ObjectId> {
        match self {
            SymRefOrOid::Oid(oid) => Some(oid),
            SymRefOrOid::SymRef { .. } => None,
        }
    }

    /// File contents for this value, newline terminated
    pub fn to_content(&self) -> String {
        match self {
            SymRefOrOid::SymRef { sym_ref_name } => format!("ref: {sym_ref_name}\n"),
            SymRefOrOid::Oid(oid) => format!("{oid}\n"),
        }
    }
}

/// A named pointer to a commit
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Reference {
    pub name: String,
    pub target: ObjectId,
}

/// Outcome of a compare-and-swap on a single ref
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefUpdate {
    Updated,
    /// The ref did not hold the expected value; `current` is what it held instead
    Rejected { current: Option<ObjectId> },
}
