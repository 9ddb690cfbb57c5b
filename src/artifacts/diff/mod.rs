//! Diff algorithms and tree comparison
//!
//! - `tree_diff`: which files differ between two trees
//! - `myers`: Myers' shortest edit script for line counts
//! - `diff_record`: per-path added/deleted counts with a diffstat summary

pub mod diff_record;
pub mod myers;
pub mod tree_diff;
