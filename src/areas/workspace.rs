use crate::areas::database::Database;
use crate::artifacts::objects::entry_mode::EntryMode;
use crate::artifacts::snapshot::Snapshot;
use anyhow::Context;
use std::io::Write;
use std::path::Path;

const IGNORED_PATHS: [&str; 3] = [".git", ".", ".."];

/// The working directory of a repository with a checkout
#[derive(Debug)]
pub struct Workspace {
    path: Box<Path>,
}

impl Workspace {
    pub fn new(path: Box<Path>) -> Self {
        Workspace { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether the directory holds nothing besides an optional `.git`
    pub fn is_empty(&self) -> anyhow::Result<bool> {
        if !self.path.exists() {
            return Ok(true);
        }

        for entry in std::fs::read_dir(&self.path)? {
            let name = entry?.file_name();
            if !IGNORED_PATHS.contains(&name.to_string_lossy().as_ref()) {
                return Ok(false);
            }
        }

        Ok(true)
    }

    /// Write `data` to a repository-relative path, creating parent directories
    pub fn write_file(&self, file_path: &str, data: &[u8], mode: EntryMode) -> anyhow::Result<()> {
        let path = self.path.join(file_path);

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {:?}", parent))?;
        }

        let mut file = std::fs::OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(&path)
            .with_context(|| format!("Failed to open file: {:?}", file_path))?;

        file.write_all(data)
            .with_context(|| format!("Failed to write to file: {:?}", file_path))?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let permissions = std::fs::Permissions::from_mode(mode.as_u32() & 0o777);
            std::fs::set_permissions(&path, permissions)
                .with_context(|| format!("Failed to set permissions for file: {:?}", file_path))?;
        }
        #[cfg(not(unix))]
        let _ = mode;

        Ok(())
    }

    /// Write every file of a snapshot into the workspace
    pub fn checkout(&self, database: &Database, snapshot: &Snapshot<'_>) -> anyhow::Result<usize> {
        let files = snapshot.files()?;

        for (file_path, entry) in &files {
            let blob = database
                .parse_object_as_blob(&entry.oid)?
                .with_context(|| format!("Object {} is not a blob", entry.oid))?;
            self.write_file(file_path, blob.content(), entry.mode)?;
        }

        Ok(files.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artifacts::objects::entry_mode::FileMode;
    use assert_fs::TempDir;
    use assert_fs::prelude::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn writes_nested_files() -> anyhow::Result<()> {
        let dir = TempDir::new()?;
        let workspace = Workspace::new(dir.path().into());

        workspace.write_file("a/b/c.txt", b"hello\n", EntryMode::File(FileMode::Regular))?;

        dir.child("a/b/c.txt").assert("hello\n");

        Ok(())
    }

    #[test]
    fn only_git_dir_counts_as_empty() -> anyhow::Result<()> {
        let dir = TempDir::new()?;
        let workspace = Workspace::new(dir.path().into());
        dir.child(".git").create_dir_all()?;

        assert!(workspace.is_empty()?);

        dir.child("file").touch()?;
        assert!(!workspace.is_empty()?);

        Ok(())
    }

    #[cfg(unix)]
    #[test]
    fn executable_files_keep_their_mode() -> anyhow::Result<()> {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new()?;
        let workspace = Workspace::new(dir.path().into());

        workspace.write_file("run.sh", b"#!/bin/sh\n", EntryMode::File(FileMode::Executable))?;

        let mode = std::fs::metadata(dir.path().join("run.sh"))?.permissions().mode();
        assert_eq!(mode & 0o777, 0o755);

        Ok(())
    }
}
