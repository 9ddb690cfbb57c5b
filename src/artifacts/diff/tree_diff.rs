use crate::areas::database::Database;
use crate::artifacts::database::database_entry::DatabaseEntry;
use crate::artifacts::objects::object::ObjectBox;
use crate::artifacts::objects::object_id::ObjectId;
use crate::artifacts::objects::tree::Tree;
use bitflags::bitflags;
use std::collections::BTreeMap;

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
    pub struct DiffFilter: u32 {
        const ADDED = 0b0001;
        const DELETED = 0b0010;
        const MODIFIED = 0b0100;
    }
}

impl DiffFilter {
    pub fn try_parse(s: &str) -> Option<Self> {
        let mut filter = Self::empty();

        for c in s.chars() {
            match c {
                'A' => filter |= Self::ADDED,
                'D' => filter |= Self::DELETED,
                'M' => filter |= Self::MODIFIED,
                _ => return None,
            }
        }

        Some(filter)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum TreeChangeType {
    Added(DatabaseEntry),
    Deleted(DatabaseEntry),
    Modified {
        old: DatabaseEntry,
        new: DatabaseEntry,
    },
}

impl TreeChangeType {
    pub fn from_entries(old: Option<DatabaseEntry>, new: Option<DatabaseEntry>) -> Option<Self> {
        match (old, new) {
            (None, Some(new)) => Some(TreeChangeType::Added(new)),
            (Some(old), None) => Some(TreeChangeType::Deleted(old)),
            (Some(old), Some(new)) if old != new => Some(TreeChangeType::Modified { old, new }),
            _ => None,
        }
    }

    pub fn matches_filter(&self, filter: DiffFilter) -> bool {
        match self {
            TreeChangeType::Added(_) => filter.contains(DiffFilter::ADDED),
            TreeChangeType::Deleted(_) => filter.contains(DiffFilter::DELETED),
            TreeChangeType::Modified { .. } => filter.contains(DiffFilter::MODIFIED),
        }
    }
}

/// Changed file paths (joined with `/`) mapped to their change
pub type ChangeSet = BTreeMap<String, TreeChangeType>;
pub type TreeEntryMap = BTreeMap<String, DatabaseEntry>;

/// Recursive comparison of two trees
///
/// Only file entries appear in the change set; a directory present on one
/// side shows up as its files being added or deleted. Subtrees whose entries
/// are equal by hash are never read.
#[derive(Debug)]
pub struct TreeDiff<'r> {
    database: &'r Database,
    change_set: ChangeSet,
}

impl<'r> TreeDiff<'r> {
    pub fn new(database: &'r Database) -> Self {
        TreeDiff {
            database,
            change_set: BTreeMap::new(),
        }
    }

    pub fn changes(&self) -> &ChangeSet {
        &self.change_set
    }

    pub fn into_changes(self) -> ChangeSet {
        self.change_set
    }

    /// Compare two trees (or commits, which stand for their trees)
    pub fn compare_oids(
        &mut self,
        old: Option<&ObjectId>,
        new: Option<&ObjectId>,
        prefix: &str,
    ) -> anyhow::Result<()> {
        if old == new {
            return Ok(());
        }

        let old_tree_entries = self.inflate_oid_to_tree_entries(old)?;
        let new_tree_entries = self.inflate_oid_to_tree_entries(new)?;

        self.detect_deletions(&old_tree_entries, &new_tree_entries, prefix)?;
        self.detect_additions(&old_tree_entries, &new_tree_entries, prefix)?;

        Ok(())
    }

    fn inflate_oid_to_tree_entries(&self, oid: Option<&ObjectId>) -> anyhow::Result<TreeEntryMap> {
        match oid {
            None => Ok(BTreeMap::new()),
            Some(oid) => Ok(self.inflate_oid_to_tree(oid)?.into_entries().collect()),
        }
    }

    fn inflate_oid_to_tree(&self, oid: &ObjectId) -> anyhow::Result<Tree> {
        match self.database.parse_object(oid)? {
            ObjectBox::Tree(tree) => Ok(*tree),
            ObjectBox::Commit(commit) => self.inflate_oid_to_tree(commit.tree_oid()),
            ObjectBox::Blob(_) => Err(anyhow::anyhow!("Invalid tree object {oid}")),
        }
    }

    fn detect_deletions(
        &mut self,
        old: &TreeEntryMap,
        new: &TreeEntryMap,
        prefix: &str,
    ) -> anyhow::Result<()> {
        for (name, entry) in old {
            let other = new.get(name);

            if other == Some(entry) {
                continue;
            }

            let path = join_path(prefix, name);
            let tree_a_oid = entry.is_tree().then_some(&entry.oid);
            let tree_b_oid = other.filter(|other| other.is_tree()).map(|other| &other.oid);

            self.compare_oids(tree_a_oid, tree_b_oid, &path)?;

            let blob_a = (!entry.is_tree()).then(|| entry.clone());
            let blob_b = other.filter(|other| !other.is_tree()).cloned();

            if let Some(change_type) = TreeChangeType::from_entries(blob_a, blob_b) {
                self.change_set.insert(path, change_type);
            }
        }

        Ok(())
    }

    fn detect_additions(
        &mut self,
        old: &TreeEntryMap,
        new: &TreeEntryMap,
        prefix: &str,
    ) -> anyhow::Result<()> {
        for (name, entry) in new {
            if old.contains_key(name) {
                continue;
            }

            let path = join_path(prefix, name);
            if entry.is_tree() {
                self.compare_oids(None, Some(&entry.oid), &path)?;
            } else {
                self.change_set
                    .insert(path, TreeChangeType::Added(entry.clone()));
            }
        }

        Ok(())
    }
}

fn join_path(prefix: &str, name: &str) -> String {
    if prefix.is_empty() {
        name.to_string()
    } else {
        format!("{prefix}/{name}")
    }
}
