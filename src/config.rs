//! Command-line settings with environment fallbacks
//!
//! Every value is read once by the binary and passed down as a parameter;
//! nothing here is global state.

use crate::artifacts::branch::branch_name::{BranchName, DEFAULT_BRANCH};
use crate::commands::porcelain::clone::CloneOptions;
use crate::errors::Result;
use clap::{Args, ValueEnum};
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Json,
    Text,
}

#[derive(Debug, Clone, Args)]
pub struct LogConfig {
    #[arg(
        long = "log-level",
        global = true,
        env = "BITFLOW_LOG",
        default_value = "warn",
        help = "Log level for diagnostics on stderr (trace, debug, info, warn, error, off)"
    )]
    pub level: String,

    #[arg(
        id = "log_format",
        long = "log-format",
        global = true,
        env = "BITFLOW_LOG_FORMAT",
        default_value = "text",
        help = "Log line format on stderr (text or json)"
    )]
    pub format: String,
}

#[derive(Debug, Clone, Args)]
pub struct CloneConfig {
    #[arg(
        long = "clone-timeout",
        global = true,
        env = "BITFLOW_CLONE_TIMEOUT",
        default_value_t = 60,
        help = "Seconds a clone may spend transferring objects"
    )]
    pub timeout_secs: u64,

    #[arg(
        long = "default-branch",
        global = true,
        env = "BITFLOW_DEFAULT_BRANCH",
        default_value = DEFAULT_BRANCH,
        help = "Branch HEAD names in new repositories"
    )]
    pub default_branch: String,
}

impl CloneConfig {
    pub fn default_branch(&self) -> Result<BranchName> {
        BranchName::try_parse(self.default_branch.as_str())
    }

    pub fn to_options(&self) -> Result<CloneOptions> {
        Ok(CloneOptions {
            timeout: Duration::from_secs(self.timeout_secs),
            default_branch: self.default_branch()?,
        })
    }
}
