//! bitflow: a small git-compatible version-control engine
//!
//! The crate is organized in layers:
//!
//! - `areas`: the repository and the stores it owns (objects, refs, workspace)
//! - `artifacts`: object types and the algorithms working on them
//! - `commands`: the workflows exposed to callers, as `impl Repository` blocks
//!
//! Repositories live on disk in git's loose-object layout or entirely in
//! memory. A [`Repository`] is `Send + Sync`; branch tips only move through
//! compare-and-swap, so concurrent writers get [`Error::WriteConflict`]
//! instead of lost updates.

pub mod areas;
pub mod artifacts;
pub mod commands;
pub mod config;
pub mod errors;
pub mod logging;

pub use areas::repository::Repository;
pub use artifacts::branch::branch_name::BranchName;
pub use artifacts::diff::diff_record::DiffRecord;
pub use artifacts::diff::tree_diff::DiffFilter;
pub use artifacts::log::commit_summary::CommitSummary;
pub use artifacts::objects::commit::Author;
pub use artifacts::objects::object_id::ObjectId;
pub use artifacts::refs::Reference;
pub use commands::porcelain::clone::CloneOptions;
pub use commands::porcelain::commit::CommitRequest;
pub use commands::porcelain::history::HistoryOptions;
pub use errors::{Error, Result};
