use assert_fs::TempDir;
use assert_fs::prelude::*;
use bitflow::{Author, CommitRequest, Error, HistoryOptions, Repository};
use pretty_assertions::assert_eq;
use rstest::rstest;
use std::sync::Barrier;

mod common;
use common::{commit_file, master, memory_repository, repository, request};

#[rstest]
fn first_commit_on_unborn_head_branch_is_a_root(
    repository: (TempDir, Repository),
) -> anyhow::Result<()> {
    let (dir, repository) = repository;

    let commit_id = repository.commit(request("master", "docs/a.txt", "hello\n", 1_700_000_000))?;

    let commit = repository
        .database()
        .find_commit(&commit_id)?
        .expect("commit is stored");
    assert!(commit.is_root());
    assert_eq!(repository.refs().read_branch(&master())?, Some(commit_id));
    dir.child("docs/a.txt").assert("hello\n");

    Ok(())
}

#[rstest]
fn commits_chain_onto_the_branch_tip(memory_repository: Repository) -> anyhow::Result<()> {
    let first = commit_file(&memory_repository, "master", "a.txt", "one\n", 1_700_000_000);
    let second = commit_file(&memory_repository, "master", "b/c.txt", "two\n", 1_700_000_100);

    let commit = memory_repository
        .database()
        .find_commit(&second)?
        .expect("commit is stored");
    let tree = memory_repository
        .database()
        .parse_object_as_tree(commit.tree_oid())?
        .expect("tree is stored");

    assert_eq!(commit.parents(), [first]);
    assert_eq!(commit.message(), "Update b/c.txt\n");
    assert_eq!(
        tree.entries().map(|(name, _)| name.as_str()).collect::<Vec<_>>(),
        vec!["a.txt", "b"]
    );

    Ok(())
}

#[rstest]
fn every_inserted_reference_resolves(memory_repository: Repository) -> anyhow::Result<()> {
    commit_file(&memory_repository, "master", "a/b/c.txt", "one\n", 1_700_000_000);
    let tip = commit_file(&memory_repository, "master", "a/d.txt", "two\n", 1_700_000_100);

    let mut pending = vec![tip];
    while let Some(oid) = pending.pop() {
        let object = memory_repository.database().parse_object(&oid)?;
        for reference in object.references() {
            assert!(memory_repository.database().contains(&reference)?, "{reference} is dangling");
            pending.push(reference);
        }
    }

    Ok(())
}

#[rstest]
fn commit_to_missing_branch_fails(memory_repository: Repository) {
    commit_file(&memory_repository, "master", "a.txt", "one\n", 1_700_000_000);

    let result = memory_repository.commit(request("nope", "a.txt", "two\n", 1_700_000_100));

    assert!(matches!(result, Err(Error::BranchNotFound(name)) if name == "nope"));
}

#[rstest]
fn commit_with_invalid_branch_name_fails(memory_repository: Repository) {
    let result = memory_repository.commit(request("bad..name", "a.txt", "two\n", 1_700_000_100));

    assert!(matches!(result, Err(Error::InvalidRefName(_))));
}

#[rstest]
fn commit_to_other_branch_leaves_workspace_alone(
    repository: (TempDir, Repository),
) -> anyhow::Result<()> {
    let (dir, repository) = repository;
    commit_file(&repository, "master", "a.txt", "master\n", 1_700_000_000);
    repository.create_branch("feature", None)?;

    commit_file(&repository, "feature", "a.txt", "feature\n", 1_700_000_100);

    dir.child("a.txt").assert("master\n");

    Ok(())
}

#[rstest]
#[case("")]
#[case("/etc/passwd")]
#[case("a//b.txt")]
#[case("a/./b.txt")]
#[case("../escape.txt")]
#[case(".git/config")]
#[case("dir/")]
#[case("nul\0byte")]
#[case("dir")]
#[case("dir/file.txt/nested")]
fn invalid_paths_are_rejected(memory_repository: Repository, #[case] path: &str) -> anyhow::Result<()> {
    let tip = commit_file(&memory_repository, "master", "dir/file.txt", "one\n", 1_700_000_000);

    let result = memory_repository.commit(request("master", path, "two\n", 1_700_000_100));

    assert!(matches!(result, Err(Error::InvalidPath { .. })), "{path:?} was accepted");
    assert_eq!(memory_repository.refs().read_branch(&master())?, Some(tip));

    Ok(())
}

#[rstest]
fn stale_expected_tip_is_a_write_conflict(memory_repository: Repository) -> anyhow::Result<()> {
    let base = commit_file(&memory_repository, "master", "a.txt", "one\n", 1_700_000_000);
    let moved = commit_file(&memory_repository, "master", "a.txt", "two\n", 1_700_000_100);

    let result = memory_repository.commit(CommitRequest {
        expected_tip: Some(base.clone()),
        ..request("master", "a.txt", "three\n", 1_700_000_200)
    });

    match result {
        Err(Error::WriteConflict {
            branch,
            expected,
            actual,
        }) => {
            assert_eq!(branch, "master");
            assert_eq!(expected, Some(base));
            assert_eq!(actual, Some(moved.clone()));
        }
        other => panic!("expected a write conflict, got {other:?}"),
    }
    assert_eq!(memory_repository.refs().read_branch(&master())?, Some(moved));

    Ok(())
}

fn race_two_commits(repository: &Repository) -> anyhow::Result<()> {
    let base = commit_file(repository, "master", "a.txt", "base\n", 1_700_000_000);
    let barrier = Barrier::new(2);

    let results = std::thread::scope(|scope| {
        let handles = ["left\n", "right\n"].map(|content| {
            let barrier = &barrier;
            let base = base.clone();
            scope.spawn(move || {
                let commit = CommitRequest {
                    expected_tip: Some(base),
                    ..request("master", "a.txt", content, 1_700_000_100)
                };
                barrier.wait();
                repository.commit(commit)
            })
        });

        handles.map(|handle| handle.join().expect("commit thread panicked"))
    });

    let winners = results
        .iter()
        .filter_map(|result| result.as_ref().ok())
        .collect::<Vec<_>>();
    assert_eq!(winners.len(), 1, "exactly one commit wins: {results:?}");
    assert!(
        results
            .iter()
            .any(|result| matches!(result, Err(Error::WriteConflict { .. })))
    );
    assert_eq!(repository.refs().read_branch(&master())?.as_ref(), Some(winners[0]));

    Ok(())
}

#[rstest]
fn concurrent_commits_on_disk_have_one_winner(
    repository: (TempDir, Repository),
) -> anyhow::Result<()> {
    let (_dir, repository) = repository;

    race_two_commits(&repository)
}

#[rstest]
fn concurrent_commits_in_memory_have_one_winner(memory_repository: Repository) -> anyhow::Result<()> {
    race_two_commits(&memory_repository)
}

#[rstest]
#[case("x <x> 1 +0000\nparent 0123456789abcdef0123456789abcdef01234567\nauthor y", "x@example.com")]
#[case("Ada\0Lovelace", "ada@example.com")]
#[case("Ada <ada@example.com>", "ada@example.com")]
#[case("Ada", "ada@example.com> 1 +0000")]
#[case("Ada", "ada@example.com\n")]
fn header_breaking_identities_are_rejected(
    memory_repository: Repository,
    #[case] name: &str,
    #[case] email: &str,
) -> anyhow::Result<()> {
    let tip = commit_file(&memory_repository, "master", "a.txt", "one\n", 1_700_000_000);
    let mut forged = request("master", "a.txt", "two\n", 1_700_000_100);
    forged.author = Author::new_with_timestamp(
        name.to_string(),
        email.to_string(),
        Author::parse_date("1700000100 +0000")?,
    );

    let result = memory_repository.commit(forged);

    assert!(matches!(result, Err(Error::InvalidAuthor { .. })));
    assert_eq!(memory_repository.refs().read_branch(&master())?, Some(tip));

    Ok(())
}

#[rstest]
fn blocked_workspace_path_does_not_fail_a_moved_branch(
    repository: (TempDir, Repository),
) -> anyhow::Result<()> {
    let (dir, repository) = repository;
    commit_file(&repository, "master", "a.txt", "one\n", 1_700_000_000);
    dir.child("sub").write_str("untracked")?;

    let commit_id = repository.commit(request("master", "sub/b.txt", "two\n", 1_700_000_100))?;

    assert_eq!(repository.refs().read_branch(&master())?, Some(commit_id.clone()));
    let files = repository.history("master", HistoryOptions::default())?[0]
        .changed_files
        .clone();
    assert_eq!(files, vec!["sub/b.txt"]);
    dir.child("sub").assert("untracked");

    Ok(())
}
