//! Data structures and algorithms
//!
//! - `branch`: branch and reference names
//! - `database`: object storage backends
//! - `diff`: tree comparison and Myers line diff
//! - `log`: history traversal
//! - `objects`: object types (blob, tree, commit)
//! - `refs`: reference storage backends
//! - `remote`: remote transports and object transfer
//! - `snapshot`: staging a file change onto a tree

pub mod branch;
pub mod database;
pub mod diff;
pub mod log;
pub mod objects;
pub mod refs;
pub mod remote;
pub mod snapshot;
