//! Working snapshot of one commit's tree
//!
//! A snapshot stages a single-file change on top of a root tree. Only the
//! trees along the changed path are rebuilt; every other subtree keeps its
//! existing ID. Objects are stored leaf first, so each tree is written after
//! the children it references.

pub mod repo_path;

use crate::areas::database::Database;
use crate::artifacts::database::database_entry::DatabaseEntry;
use crate::artifacts::objects::blob::Blob;
use crate::artifacts::objects::entry_mode::EntryMode;
use crate::artifacts::objects::object_id::ObjectId;
use crate::artifacts::objects::tree::Tree;
use crate::errors::{Error, Result};
use anyhow::Context;
use bytes::Bytes;
use repo_path::RepoPath;

#[derive(Debug)]
pub struct Snapshot<'r> {
    database: &'r Database,
    root: Option<ObjectId>,
}

impl<'r> Snapshot<'r> {
    /// `root` is `None` for the empty tree of an unborn branch
    pub fn new(database: &'r Database, root: Option<ObjectId>) -> Self {
        Snapshot { database, root }
    }

    /// Replace or insert the file at `path`, returning the new root tree ID
    ///
    /// A replaced file keeps its mode; a new file is a regular file.
    pub fn write_file(&self, path: &RepoPath, content: Bytes) -> Result<ObjectId> {
        let segments = path.segments().collect::<Vec<_>>();
        self.rebuild(self.root.as_ref(), &segments, path, &content)
    }

    /// Entry at `path`, or `None` when any segment is missing
    pub fn find_entry(&self, path: &RepoPath) -> anyhow::Result<Option<DatabaseEntry>> {
        let mut current = self.root.clone();
        let mut found = None;

        for name in path.segments() {
            let Some(tree_oid) = current.take() else {
                return Ok(None);
            };
            let Some(entry) = self.load_tree(Some(&tree_oid))?.get(name).cloned() else {
                return Ok(None);
            };
            if entry.is_tree() {
                current = Some(entry.oid.clone());
            }
            found = Some(entry);
        }

        Ok(found)
    }

    fn rebuild(
        &self,
        tree_oid: Option<&ObjectId>,
        segments: &[&str],
        path: &RepoPath,
        content: &Bytes,
    ) -> Result<ObjectId> {
        let (name, rest) = segments
            .split_first()
            .context("Snapshot path has no segments")?;
        let mut tree = self.load_tree(tree_oid)?;
        let existing = tree.get(name).cloned();

        let entry = if rest.is_empty() {
            let mode = match existing {
                Some(entry) if entry.is_tree() => {
                    return Err(Error::invalid_path(
                        path.as_ref(),
                        "path names an existing directory",
                    ));
                }
                Some(entry) => entry.mode,
                None => EntryMode::default(),
            };
            let blob_oid = self.database.store(&Blob::new(content.clone()))?;

            DatabaseEntry::new(blob_oid, mode)
        } else {
            let subtree_oid = match existing {
                Some(entry) if !entry.is_tree() => {
                    return Err(Error::invalid_path(
                        path.as_ref(),
                        format!("`{name}` is a file, not a directory"),
                    ));
                }
                Some(entry) => self.rebuild(Some(&entry.oid), rest, path, content)?,
                None => self.rebuild(None, rest, path, content)?,
            };

            DatabaseEntry::new(subtree_oid, EntryMode::Directory)
        };

        tree.insert(name.to_string(), entry);
        Ok(self.database.store(&tree)?)
    }

    fn load_tree(&self, tree_oid: Option<&ObjectId>) -> anyhow::Result<Tree> {
        match tree_oid {
            None => Ok(Tree::default()),
            Some(oid) => self
                .database
                .parse_object_as_tree(oid)?
                .with_context(|| format!("Object {oid} is not a tree")),
        }
    }

    /// Every file in the snapshot with its full path, in path order
    pub fn files(&self) -> anyhow::Result<Vec<(String, DatabaseEntry)>> {
        let mut files = Vec::new();
        self.collect_files(self.root.as_ref(), "", &mut files)?;
        files.sort_by(|(a, _), (b, _)| a.cmp(b));

        Ok(files)
    }

    fn collect_files(
        &self,
        tree_oid: Option<&ObjectId>,
        prefix: &str,
        files: &mut Vec<(String, DatabaseEntry)>,
    ) -> anyhow::Result<()> {
        for (name, entry) in self.load_tree(tree_oid)?.into_entries() {
            let path = if prefix.is_empty() {
                name
            } else {
                format!("{prefix}/{name}")
            };

            if entry.is_tree() {
                self.collect_files(Some(&entry.oid), &path, files)?;
            } else {
                files.push((path, entry));
            }
        }

        Ok(())
    }
}
