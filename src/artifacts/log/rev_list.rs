use crate::areas::database::Database;
use crate::artifacts::objects::commit::Commit;
use crate::artifacts::objects::object_id::ObjectId;
use anyhow::Context;
use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashSet};

/// Priority-queue walk over the commit graph
///
/// Commits come out newest authoring timestamp first, ties broken by ascending
/// hash, and every reachable commit is yielded exactly once however many
/// paths lead to it.
#[derive(Debug)]
pub struct RevList<'r> {
    database: &'r Database,
    queue: BinaryHeap<(i64, Reverse<ObjectId>)>,
    seen: HashSet<ObjectId>,
    remaining: Option<usize>,
}

impl<'r> RevList<'r> {
    pub fn new(database: &'r Database, start: ObjectId) -> anyhow::Result<Self> {
        let mut rev_list = RevList {
            database,
            queue: BinaryHeap::new(),
            seen: HashSet::new(),
            remaining: None,
        };
        rev_list.enqueue(start)?;

        Ok(rev_list)
    }

    pub fn with_max_count(mut self, max_count: Option<usize>) -> Self {
        self.remaining = max_count;
        self
    }

    fn load(&self, oid: &ObjectId) -> anyhow::Result<Commit> {
        self.database
            .parse_object_as_commit(oid)?
            .with_context(|| format!("Object {oid} is not a commit"))
    }

    fn enqueue(&mut self, oid: ObjectId) -> anyhow::Result<()> {
        if !self.seen.insert(oid.clone()) {
            return Ok(());
        }

        let commit = self.load(&oid)?;
        self.queue
            .push((commit.timestamp().timestamp(), Reverse(oid)));

        Ok(())
    }

    fn next_commit(&mut self) -> anyhow::Result<Option<(ObjectId, Commit)>> {
        if self.remaining == Some(0) {
            return Ok(None);
        }

        let Some((_, Reverse(oid))) = self.queue.pop() else {
            return Ok(None);
        };

        let commit = self.load(&oid)?;
        for parent in commit.parents() {
            self.enqueue(parent.clone())?;
        }

        if let Some(remaining) = self.remaining.as_mut() {
            *remaining -= 1;
        }
        tracing::debug!(commit = %oid, queued = self.queue.len(), "visited commit");

        Ok(Some((oid, commit)))
    }
}

impl Iterator for RevList<'_> {
    type Item = anyhow::Result<(ObjectId, Commit)>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_commit().transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artifacts::objects::commit::Author;
    use crate::artifacts::objects::tree::Tree;
    use pretty_assertions::assert_eq;

    fn commit_at(database: &Database, parents: Vec<ObjectId>, seconds: i64, message: &str) -> ObjectId {
        let tree_oid = database.store(&Tree::default()).unwrap();
        let author = Author::new_with_timestamp(
            "fake_user".to_string(),
            "fake_email@email.com".to_string(),
            Author::parse_date(&format!("{seconds} +0000")).unwrap(),
        );

        database
            .store(&Commit::new(parents, tree_oid, author, message.to_string()))
            .unwrap()
    }

    fn walk(database: &Database, start: &ObjectId, max_count: Option<usize>) -> Vec<ObjectId> {
        RevList::new(database, start.clone())
            .unwrap()
            .with_max_count(max_count)
            .map(|entry| entry.map(|(oid, _)| oid))
            .collect::<anyhow::Result<Vec<_>>>()
            .unwrap()
    }

    #[test]
    fn visits_a_diamond_merge_base_once() {
        let database = Database::in_memory();
        let base = commit_at(&database, vec![], 100, "base");
        let left = commit_at(&database, vec![base.clone()], 200, "left");
        let right = commit_at(&database, vec![base.clone()], 300, "right");
        let merge = commit_at(&database, vec![left.clone(), right.clone()], 400, "merge");

        assert_eq!(walk(&database, &merge, None), vec![merge, right, left, base]);
    }

    #[test]
    fn equal_timestamps_come_out_by_ascending_hash() {
        let database = Database::in_memory();
        let base = commit_at(&database, vec![], 100, "base");
        let first = commit_at(&database, vec![base.clone()], 200, "first");
        let second = commit_at(&database, vec![base.clone()], 200, "second");
        let merge = commit_at(&database, vec![first.clone(), second.clone()], 300, "merge");

        let mut siblings = vec![first, second];
        siblings.sort();

        assert_eq!(
            walk(&database, &merge, None),
            vec![merge, siblings[0].clone(), siblings[1].clone(), base]
        );
    }

    #[test]
    fn stops_after_max_count() {
        let database = Database::in_memory();
        let first = commit_at(&database, vec![], 100, "first");
        let second = commit_at(&database, vec![first], 200, "second");
        let third = commit_at(&database, vec![second.clone()], 300, "third");

        assert_eq!(walk(&database, &third, Some(2)), vec![third, second]);
    }
}
