use bitflow::artifacts::objects::commit::Commit;
use bitflow::{Error, HistoryOptions, ObjectId, Repository};
use pretty_assertions::assert_eq;
use rstest::rstest;

mod common;
use common::{author_at, branch, commit_file, memory_repository};

fn commit_ids(repository: &Repository, start: &str) -> Vec<ObjectId> {
    repository
        .history(start, HistoryOptions::default())
        .expect("history resolves")
        .into_iter()
        .map(|summary| summary.commit_id)
        .collect()
}

#[rstest]
fn branch_history_after_changing_a_file(memory_repository: Repository) -> anyhow::Result<()> {
    let root = commit_file(&memory_repository, "master", "a.txt", "hello", 1_700_000_000);
    memory_repository.create_branch("feature", Some("master"))?;
    let tip = commit_file(&memory_repository, "feature", "a.txt", "hello world", 1_700_000_100);

    let history = memory_repository.history("feature", HistoryOptions::default())?;

    assert_eq!(history.len(), 2);
    assert_eq!(history[0].commit_id, tip);
    assert_eq!(history[0].changed_files, vec!["a.txt"]);
    assert_eq!(history[1].commit_id, root.clone());
    assert_eq!(history[1].changed_files, vec!["a.txt"]);
    assert_eq!(commit_ids(&memory_repository, "master"), vec![root]);

    Ok(())
}

#[rstest]
fn changed_files_are_relative_to_the_first_parent(
    memory_repository: Repository,
) -> anyhow::Result<()> {
    commit_file(&memory_repository, "master", "z.txt", "z", 1_700_000_000);
    commit_file(&memory_repository, "master", "docs/b.md", "b", 1_700_000_100);
    commit_file(&memory_repository, "master", "docs/a.md", "a", 1_700_000_200);

    let history = memory_repository.history("HEAD", HistoryOptions::default())?;

    assert_eq!(
        history
            .iter()
            .map(|summary| summary.changed_files.clone())
            .collect::<Vec<_>>(),
        vec![vec!["docs/a.md"], vec!["docs/b.md"], vec!["z.txt"]]
    );

    Ok(())
}

#[rstest]
fn diamond_merges_are_visited_once(memory_repository: Repository) -> anyhow::Result<()> {
    let root = commit_file(&memory_repository, "master", "a.txt", "root", 1_700_000_000);
    memory_repository.create_branch("side", None)?;
    let left = commit_file(&memory_repository, "master", "left.txt", "l", 1_700_000_100);
    let right = commit_file(&memory_repository, "side", "right.txt", "r", 1_700_000_200);

    let database = memory_repository.database();
    let tree = database
        .find_commit(&left)?
        .expect("left is stored")
        .tree_oid()
        .clone();
    let merge = database.store(&Commit::new(
        vec![left.clone(), right.clone()],
        tree,
        author_at(1_700_000_300),
        "Merge side".to_string(),
    ))?;
    memory_repository
        .refs()
        .update_branch(&branch("master"), Some(&left), &merge)?;

    assert_eq!(
        commit_ids(&memory_repository, "master"),
        vec![merge, right, left, root]
    );

    Ok(())
}

#[rstest]
fn equal_timestamps_are_ordered_by_hash(memory_repository: Repository) -> anyhow::Result<()> {
    let root = commit_file(&memory_repository, "master", "a.txt", "root", 1_700_000_000);
    memory_repository.create_branch("side", None)?;
    let left = commit_file(&memory_repository, "master", "left.txt", "l", 1_700_000_100);
    let right = commit_file(&memory_repository, "side", "right.txt", "r", 1_700_000_100);

    let database = memory_repository.database();
    let tree = database
        .find_commit(&left)?
        .expect("left is stored")
        .tree_oid()
        .clone();
    let merge = database.store(&Commit::new(
        vec![left.clone(), right.clone()],
        tree,
        author_at(1_700_000_200),
        "Merge side".to_string(),
    ))?;
    memory_repository.refs().write_branch(&branch("master"), &merge)?;

    let (first, second) = if left < right { (left, right) } else { (right, left) };
    assert_eq!(
        commit_ids(&memory_repository, "master"),
        vec![merge, first, second, root]
    );

    Ok(())
}

#[rstest]
fn max_count_truncates_the_walk(memory_repository: Repository) -> anyhow::Result<()> {
    for (index, content) in ["one", "two", "three"].into_iter().enumerate() {
        commit_file(&memory_repository, "master", "a.txt", content, 1_700_000_000 + index as i64);
    }

    let history = memory_repository.history("master", HistoryOptions { max_count: Some(2) })?;

    assert_eq!(history.len(), 2);

    Ok(())
}

#[rstest]
#[case("missing")]
#[case("HEAD")]
#[case("not a ref")]
fn unresolvable_start_refs_fail(memory_repository: Repository, #[case] start: &str) {
    let result = memory_repository.history(start, HistoryOptions::default());

    assert!(matches!(result, Err(Error::RefNotFound(name)) if name == start));
}

#[rstest]
fn history_serializes_commit_fields(memory_repository: Repository) -> anyhow::Result<()> {
    let tip = commit_file(&memory_repository, "master", "a.txt", "hello", 1_700_000_000);

    let history = memory_repository.history("master", HistoryOptions::default())?;

    assert_eq!(
        serde_json::to_value(&history)?,
        serde_json::json!([{
            "commit_id": tip.to_string(),
            "commit_time": "2023-11-14T22:13:20+00:00",
            "changed_files": ["a.txt"],
        }])
    );

    Ok(())
}
