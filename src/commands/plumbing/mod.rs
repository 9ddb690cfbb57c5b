//! Plumbing commands
//!
//! - `update-server-info`: publish the branch listing for dumb HTTP clients

pub mod update_server_info;
