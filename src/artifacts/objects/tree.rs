//! Tree object
//!
//! Trees represent directory snapshots. They map entry names to blobs (files)
//! and other trees (subdirectories), along with their modes.
//!
//! ## Format
//!
//! On disk: `tree <size>\0<entries>`
//! Each entry: `<mode> <name>\0<20-byte-sha1>`
//!
//! Entries are written in git's order: byte-wise by name, where a directory
//! compares as if its name ended with `/`. This keeps tree IDs identical to the
//! ones git computes for the same content.

use crate::artifacts::database::database_entry::DatabaseEntry;
use crate::artifacts::objects::entry_mode::EntryMode;
use crate::artifacts::objects::object::{Object, Packable, Unpackable};
use crate::artifacts::objects::object_type::ObjectType;
use crate::artifacts::objects::object_id::ObjectId;
use anyhow::Context;
use bytes::Bytes;
use std::collections::BTreeMap;
use std::io::{BufRead, Write};

/// Immutable directory snapshot
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Tree {
    entries: BTreeMap<String, DatabaseEntry>,
}

impl Tree {
    pub fn new(entries: BTreeMap<String, DatabaseEntry>) -> Self {
        Tree { entries }
    }

    pub fn get(&self, name: &str) -> Option<&DatabaseEntry> {
        self.entries.get(name)
    }

    pub fn insert(&mut self, name: String, entry: DatabaseEntry) -> Option<DatabaseEntry> {
        self.entries.insert(name, entry)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> impl Iterator<Item = (&String, &DatabaseEntry)> {
        self.entries.iter()
    }

    pub fn into_entries(self) -> impl Iterator<Item = (String, DatabaseEntry)> {
        self.entries.into_iter()
    }

    fn sorted_for_storage(&self) -> Vec<(&String, &DatabaseEntry)> {
        let mut sorted = self.entries.iter().collect::<Vec<_>>();
        sorted.sort_by_cached_key(|(name, entry)| {
            let mut key = name.as_bytes().to_vec();
            if entry.is_tree() {
                key.push(b'/');
            }
            key
        });
        sorted
    }
}

impl Packable for Tree {
    fn serialize_content(&self) -> anyhow::Result<Bytes> {
        let mut content_bytes = Vec::new();

        for (name, entry) in self.sorted_for_storage() {
            let header = format!("{:o} {}", entry.mode.as_u32(), name);
            content_bytes.write_all(header.as_bytes())?;
            content_bytes.push(0);
            entry.oid.write_h40_to(&mut content_bytes)?;
        }

        Ok(Bytes::from(content_bytes))
    }
}

impl Unpackable for Tree {
    fn deserialize(reader: impl BufRead) -> anyhow::Result<Self> {
        let mut entries = BTreeMap::new();
        let mut reader = reader;

        // Reuse scratch buffers to reduce allocs
        let mut mode_bytes = Vec::new();
        let mut name_bytes = Vec::new();

        loop {
            mode_bytes.clear();
            // Read "mode " (space-delimited)
            let n = reader.read_until(b' ', &mut mode_bytes)?;
            if n == 0 {
                break; // clean EOF: no more entries
            }
            if mode_bytes.pop() != Some(b' ') {
                anyhow::bail!("unexpected EOF in mode");
            }

            let mode = EntryMode::from_octal_str(std::str::from_utf8(&mode_bytes)?)?;

            // Read "name\0"
            name_bytes.clear();
            reader.read_until(b'\0', &mut name_bytes)?;
            if name_bytes.pop() != Some(b'\0') {
                anyhow::bail!("unexpected EOF in name");
            }
            let name = std::str::from_utf8(&name_bytes)?.to_owned();

            let oid =
                ObjectId::read_h40_from(&mut reader).context("unexpected EOF in object id")?;

            entries.insert(name, DatabaseEntry::new(oid, mode));
        }

        Ok(Tree { entries })
    }
}

impl Object for Tree {
    fn object_type(&self) -> ObjectType {
        ObjectType::Tree
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artifacts::objects::blob::Blob;
    use crate::artifacts::objects::entry_mode::FileMode;
    use pretty_assertions::assert_eq;

    fn file(oid: &ObjectId) -> DatabaseEntry {
        DatabaseEntry::new(oid.clone(), EntryMode::File(FileMode::Regular))
    }

    #[test]
    fn tree_id_matches_git() -> anyhow::Result<()> {
        let blob_oid = Blob::from("hello").object_id()?;
        let mut tree = Tree::default();
        tree.insert("a.txt".to_string(), file(&blob_oid));

        // printf 'hello' > a.txt && git add a.txt && git write-tree
        assert_eq!(
            tree.object_id()?.as_ref(),
            "65829399355e5929e44741d637d52c614ac21bc3"
        );

        Ok(())
    }

    #[test]
    fn directories_sort_as_if_suffixed_with_slash() -> anyhow::Result<()> {
        let blob_oid = Blob::from("x").object_id()?;
        let mut tree = Tree::default();
        tree.insert("a.b".to_string(), file(&blob_oid));
        tree.insert(
            "a".to_string(),
            DatabaseEntry::new(Tree::default().object_id()?, EntryMode::Directory),
        );

        let names = tree
            .sorted_for_storage()
            .into_iter()
            .map(|(name, _)| name.as_str())
            .collect::<Vec<_>>();
        // "a.b" < "a/" because '.' (0x2e) < '/' (0x2f)
        assert_eq!(names, vec!["a.b", "a"]);

        Ok(())
    }

    #[test]
    fn deserializes_what_it_serializes() -> anyhow::Result<()> {
        let mut tree = Tree::default();
        tree.insert("one".to_string(), file(&Blob::from("1").object_id()?));
        tree.insert(
            "bin".to_string(),
            DatabaseEntry::new(
                Blob::from("#!/bin/sh").object_id()?,
                EntryMode::File(FileMode::Executable),
            ),
        );

        let content = tree.serialize_content()?;
        let parsed = Tree::deserialize(content.as_ref())?;

        assert_eq!(parsed, tree);

        Ok(())
    }
}
