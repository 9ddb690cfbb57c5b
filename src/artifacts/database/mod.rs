//! Object database storage
//!
//! - `backend`: the append-only storage trait
//! - `loose`: zlib-compressed loose object files on disk
//! - `memory`: an in-memory map for transient repositories
//! - `database_entry`: tree entries as read back from the database

pub mod backend;
pub mod database_entry;
pub mod loose;
pub mod memory;
