//! Core repository components
//!
//! - `database`: content-addressed store for blobs, trees and commits
//! - `refs`: branch tips and `HEAD`
//! - `repository`: a handle tying the store, refs and workspace together
//! - `workspace`: the working directory of a checkout

pub mod database;
pub mod refs;
pub mod repository;
pub mod workspace;
