//! Commit history traversal
//!
//! - `rev_list`: priority-queue walk from a starting commit
//! - `commit_summary`: per-commit history entry with its changed files

pub mod commit_summary;
pub mod rev_list;
