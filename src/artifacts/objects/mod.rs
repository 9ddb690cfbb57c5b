//! Object types and operations
//!
//! All content is stored as objects identified by SHA-1 hashes:
//!
//! - **Blob**: File content (raw bytes)
//! - **Tree**: Directory listing (names, modes, and object IDs)
//! - **Commit**: Snapshot with metadata (author, message, parent commits, tree)
//!
//! All objects implement serialization/deserialization for the loose object format:
//! `<type> <size>\0<content>`, byte-compatible with git.

pub mod blob;
pub mod commit;
pub mod entry_mode;
pub mod object;
pub mod object_id;
pub mod object_type;
pub mod tree;

/// Length of a SHA-1 hash in hexadecimal format
pub const OBJECT_ID_LENGTH: usize = 40;

/// Length of a SHA-1 hash in binary format
pub const OBJECT_ID_BYTES: usize = 20;
