use bitflow::{DiffFilter, DiffRecord, Error, Repository};
use pretty_assertions::assert_eq;
use proptest::prelude::*;
use rstest::rstest;

mod common;
use common::{commit_file, master, memory_repository};

fn record(path: &str, added: usize, deleted: usize) -> DiffRecord {
    DiffRecord::new(path.to_string(), added, deleted)
}

#[rstest]
fn replacing_a_single_line(memory_repository: Repository) -> anyhow::Result<()> {
    let root = commit_file(&memory_repository, "master", "a.txt", "hello", 1_700_000_000);
    memory_repository.create_branch("feature", None)?;
    let tip = commit_file(&memory_repository, "feature", "a.txt", "hello world", 1_700_000_100);

    let records = memory_repository.diff(root.as_ref(), tip.as_ref(), None)?;

    assert_eq!(records, vec![record("a.txt", 1, 1)]);
    assert_eq!(records[0].summary, "a.txt | 2 +-");

    Ok(())
}

#[rstest]
fn additions_modifications_and_nested_paths(memory_repository: Repository) -> anyhow::Result<()> {
    let old = commit_file(&memory_repository, "master", "docs/old.txt", "1\n2\n3\n", 1_700_000_000);
    let first_keep = commit_file(&memory_repository, "master", "keep.txt", "a\nb\nc\n", 1_700_000_100);
    let base = commit_file(&memory_repository, "master", "keep.txt", "a\nB\nc\nd\n", 1_700_000_200);
    let new = commit_file(&memory_repository, "master", "src/new.rs", "fn main() {}\n", 1_700_000_300);

    assert_eq!(
        memory_repository.diff(old.as_ref(), new.as_ref(), None)?,
        vec![record("keep.txt", 4, 0), record("src/new.rs", 1, 0)]
    );
    assert_eq!(
        memory_repository.diff(new.as_ref(), old.as_ref(), None)?,
        vec![record("keep.txt", 0, 4), record("src/new.rs", 0, 1)]
    );
    assert_eq!(
        memory_repository.diff(first_keep.as_ref(), base.as_ref(), None)?,
        vec![record("keep.txt", 2, 1)]
    );

    Ok(())
}

#[rstest]
fn identical_commits_have_no_changes(memory_repository: Repository) -> anyhow::Result<()> {
    let tip = commit_file(&memory_repository, "master", "a.txt", "hello", 1_700_000_000);

    assert_eq!(memory_repository.diff(tip.as_ref(), tip.as_ref(), None)?, vec![]);

    Ok(())
}

#[rstest]
#[case("A", vec![record("b.txt", 1, 0)])]
#[case("M", vec![record("a.txt", 1, 1)])]
#[case("AM", vec![record("a.txt", 1, 1), record("b.txt", 1, 0)])]
#[case("D", vec![])]
fn filters_restrict_change_kinds(
    memory_repository: Repository,
    #[case] filter: &str,
    #[case] expected: Vec<DiffRecord>,
) -> anyhow::Result<()> {
    let old = commit_file(&memory_repository, "master", "a.txt", "one", 1_700_000_000);
    commit_file(&memory_repository, "master", "a.txt", "two", 1_700_000_100);
    let new = commit_file(&memory_repository, "master", "b.txt", "three", 1_700_000_200);

    let records = memory_repository.diff(old.as_ref(), new.as_ref(), DiffFilter::try_parse(filter))?;

    assert_eq!(records, expected);

    Ok(())
}

#[rstest]
#[case("not-a-hash")]
#[case("0123456789abcdef0123456789abcdef01234567")]
fn unknown_commits_fail(memory_repository: Repository, #[case] hash: &str) {
    let tip = commit_file(&memory_repository, "master", "a.txt", "hello", 1_700_000_000);

    let forward = memory_repository.diff(hash, tip.as_ref(), None);
    let backward = memory_repository.diff(tip.as_ref(), hash, None);

    assert!(matches!(forward, Err(Error::CommitNotFound(found)) if found == hash));
    assert!(matches!(backward, Err(Error::CommitNotFound(found)) if found == hash));
}

#[rstest]
fn blob_hashes_are_not_commits(memory_repository: Repository) -> anyhow::Result<()> {
    let tip = commit_file(&memory_repository, "master", "a.txt", "hello", 1_700_000_000);
    let tree = memory_repository
        .database()
        .find_commit(&tip)?
        .expect("tip is stored")
        .tree_oid()
        .clone();

    assert!(matches!(
        memory_repository.diff(tree.as_ref(), tip.as_ref(), None),
        Err(Error::CommitNotFound(_))
    ));

    Ok(())
}

fn files() -> impl Strategy<Value = Vec<(String, String)>> {
    prop::collection::vec(("[a-c]\\.txt|d/[a-b]\\.txt", "([a-z]{1,3}\n){0,4}"), 1..5)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn swapping_sides_swaps_additions_and_deletions(left in files(), right in files()) {
        let repository = Repository::in_memory(&master()).unwrap();
        let mut seconds = 1_700_000_000;
        let mut commit_all = |files: &[(String, String)]| {
            let mut tip = None;
            for (path, content) in files {
                seconds += 1;
                tip = Some(commit_file(&repository, "master", path, content, seconds));
            }
            tip.expect("at least one file")
        };
        let a = commit_all(&left);
        let b = commit_all(&right);

        let forward = repository.diff(a.as_ref(), b.as_ref(), None).unwrap();
        let backward = repository.diff(b.as_ref(), a.as_ref(), None).unwrap();

        let swapped = backward
            .into_iter()
            .map(|record| (record.path, record.deleted, record.added))
            .collect::<Vec<_>>();
        let forward = forward
            .into_iter()
            .map(|record| (record.path, record.added, record.deleted))
            .collect::<Vec<_>>();
        prop_assert_eq!(forward, swapped);
    }
}
