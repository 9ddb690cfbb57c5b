//! Porcelain commands (user-facing operations)
//!
//! Each command is an `impl Repository` block composing the areas and
//! artifacts into one workflow.
//!
//! ## Commands
//!
//! - `clone`: copy a local or dumb-HTTP remote to disk or memory
//! - `branch`: create and list branches
//! - `commit`: commit a single-file change onto a branch
//! - `history`: list commits reachable from a ref
//! - `diff`: per-file line changes between two commits

pub mod branch;
pub mod clone;
pub mod commit;
pub mod diff;
pub mod history;
