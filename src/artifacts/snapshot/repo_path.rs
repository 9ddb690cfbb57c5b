use crate::errors::{Error, Result};

const GIT_DIR_NAME: &str = ".git";

/// A validated, relative, `/`-separated file path inside a repository
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RepoPath {
    path: String,
}

impl RepoPath {
    pub fn try_parse(path: &str) -> Result<Self> {
        if path.is_empty() {
            return Err(Error::invalid_path(path, "path is empty"));
        }
        if path.contains('\0') {
            return Err(Error::invalid_path(path, "path contains a NUL byte"));
        }
        if path.starts_with('/') || path.starts_with('\\') {
            return Err(Error::invalid_path(path, "path must be relative"));
        }
        if path.ends_with('/') {
            return Err(Error::invalid_path(path, "path must name a file, not a directory"));
        }

        for segment in path.split('/') {
            match segment {
                "" => return Err(Error::invalid_path(path, "path has an empty segment")),
                "." | ".." => {
                    return Err(Error::invalid_path(path, format!("path has a `{segment}` segment")));
                }
                _ if segment.eq_ignore_ascii_case(GIT_DIR_NAME) => {
                    return Err(Error::invalid_path(path, "path enters the repository directory"));
                }
                _ => {}
            }
        }

        Ok(RepoPath {
            path: path.to_string(),
        })
    }

    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.path.split('/')
    }
}

impl AsRef<str> for RepoPath {
    fn as_ref(&self) -> &str {
        &self.path
    }
}

impl std::fmt::Display for RepoPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.path)
    }
}
