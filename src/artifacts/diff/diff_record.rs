use crate::areas::database::Database;
use crate::artifacts::database::database_entry::DatabaseEntry;
use crate::artifacts::diff::myers::MyersDiff;
use crate::artifacts::diff::tree_diff::TreeChangeType;
use crate::artifacts::objects::blob::split_lines;
use anyhow::Context;
use bytes::Bytes;
use serde::Serialize;

/// Widest `+`/`-` bar a diffstat line draws
pub const MAX_STAT_WIDTH: usize = 40;

/// Line counts for one changed path
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DiffRecord {
    #[serde(rename = "file")]
    pub path: String,
    pub added: usize,
    pub deleted: usize,
    /// diffstat line, e.g. `a.txt | 2 +-`
    #[serde(rename = "modified")]
    pub summary: String,
}

impl DiffRecord {
    pub fn new(path: String, added: usize, deleted: usize) -> Self {
        let summary = diffstat_line(&path, added, deleted);

        DiffRecord {
            path,
            added,
            deleted,
            summary,
        }
    }

    /// Count the lines a tree change adds and removes
    pub fn from_change(
        database: &Database,
        path: &str,
        change: &TreeChangeType,
    ) -> anyhow::Result<Self> {
        let (added, deleted) = match change {
            TreeChangeType::Added(new) => (split_lines(&load_content(database, new)?).len(), 0),
            TreeChangeType::Deleted(old) => (0, split_lines(&load_content(database, old)?).len()),
            TreeChangeType::Modified { old, new } if old.oid == new.oid => (0, 0),
            TreeChangeType::Modified { old, new } => {
                let old_content = load_content(database, old)?;
                let new_content = load_content(database, new)?;
                let old_lines = split_lines(&old_content);
                let new_lines = split_lines(&new_content);
                let stats = MyersDiff::new(&old_lines, &new_lines).stats();

                (stats.insertions, stats.deletions)
            }
        };

        Ok(Self::new(path.to_string(), added, deleted))
    }
}

fn load_content(database: &Database, entry: &DatabaseEntry) -> anyhow::Result<Bytes> {
    database
        .parse_object_as_blob(&entry.oid)?
        .map(|blob| blob.content().clone())
        .with_context(|| format!("Object {} is not a blob", entry.oid))
}

/// Render git's diffstat line: `path | total +++--`
pub fn diffstat_line(path: &str, added: usize, deleted: usize) -> String {
    let total = added + deleted;
    let (plus, minus) = scale_bar(added, deleted);

    if total == 0 {
        format!("{path} | 0")
    } else {
        format!("{path} | {total} {}{}", "+".repeat(plus), "-".repeat(minus))
    }
}

fn scale_bar(added: usize, deleted: usize) -> (usize, usize) {
    let total = added + deleted;
    if total <= MAX_STAT_WIDTH {
        return (added, deleted);
    }

    // keep a non-zero side visible after scaling
    let scale = |count: usize| match count * MAX_STAT_WIDTH / total {
        0 if count > 0 => 1,
        scaled => scaled,
    };
    let plus = scale(added);
    let minus = scale(deleted).min(MAX_STAT_WIDTH - plus);

    (plus, minus)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[rstest]
    #[case(1, 1, "a.txt | 2 +-".to_string())]
    #[case(3, 0, "a.txt | 3 +++".to_string())]
    #[case(0, 0, "a.txt | 0".to_string())]
    #[case(100, 0, format!("a.txt | 100 {}", "+".repeat(40)))]
    #[case(1, 99, format!("a.txt | 100 +{}", "-".repeat(39)))]
    fn renders_diffstat_lines(
        #[case] added: usize,
        #[case] deleted: usize,
        #[case] expected: String,
    ) {
        assert_eq!(diffstat_line("a.txt", added, deleted), expected);
    }

    #[test]
    fn serializes_with_wire_keys() -> anyhow::Result<()> {
        let record = DiffRecord::new("a.txt".to_string(), 1, 1);

        assert_eq!(
            serde_json::to_value(&record)?,
            serde_json::json!({
                "file": "a.txt",
                "added": 1,
                "deleted": 1,
                "modified": "a.txt | 2 +-",
            })
        );

        Ok(())
    }
}
