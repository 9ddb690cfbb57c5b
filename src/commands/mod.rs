//! Repository operations
//!
//! - `plumbing`: low-level publishing support
//! - `porcelain`: the user-facing workflows (clone, branch, commit, history, diff)

pub mod plumbing;
pub mod porcelain;
