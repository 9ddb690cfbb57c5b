use crate::artifacts::branch::{INVALID_BRANCH_NAME_REGEX, REF_ALIASES};
use crate::errors::{Error, Result};

pub const REF_PREFIX: &str = "refs/heads/";
pub const HEAD_REF_NAME: &str = "HEAD";
pub const DEFAULT_BRANCH: &str = "master";

/// Full reference name, e.g. `HEAD` or `refs/heads/master`
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SymRefName(String);

impl SymRefName {
    pub fn new(name: String) -> Self {
        SymRefName(name)
    }

    pub fn head() -> Self {
        SymRefName(HEAD_REF_NAME.to_string())
    }

    /// Resolve user input naming a reference
    ///
    /// Accepts `HEAD`, its alias `@`, a full `refs/...` name, or a short branch
    /// name that is looked up under `refs/heads/`.
    pub fn parse(name: &str) -> Result<Self> {
        let name = REF_ALIASES.get(name).copied().unwrap_or(name);

        if name == HEAD_REF_NAME {
            return Ok(Self::head());
        }

        match name.strip_prefix("refs/") {
            Some(rest) => {
                validate(rest)?;
                Ok(SymRefName(name.to_string()))
            }
            None => Ok(BranchName::try_parse(name)?.to_sym_ref_name()),
        }
    }

    pub fn as_ref_path(&self) -> &str {
        &self.0
    }

    /// Short branch name, if this names a branch
    pub fn branch_name(&self) -> Option<BranchName> {
        self.0
            .strip_prefix(REF_PREFIX)
            .map(|name| BranchName(name.to_string()))
    }
}

impl AsRef<str> for SymRefName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for SymRefName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BranchName(String);

impl BranchName {
    pub fn try_parse(name: impl Into<String>) -> Result<Self> {
        let name = name.into();
        if name.is_empty() {
            return Err(Error::InvalidRefName("branch name cannot be empty".to_string()));
        }

        validate(&name)?;
        Ok(Self(name))
    }

    pub fn to_sym_ref_name(&self) -> SymRefName {
        SymRefName(format!("{REF_PREFIX}{}", self.0))
    }
}

fn validate(name: &str) -> Result<()> {
    let invalid_name = regex::Regex::new(INVALID_BRANCH_NAME_REGEX).map_err(anyhow::Error::from)?;
    if name.is_empty() || invalid_name.is_match(name) || name.split('/').any(str::is_empty) {
        return Err(Error::InvalidRefName(name.to_string()));
    }

    Ok(())
}

impl Default for BranchName {
    fn default() -> Self {
        BranchName(DEFAULT_BRANCH.to_string())
    }
}

impl AsRef<str> for BranchName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for BranchName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
