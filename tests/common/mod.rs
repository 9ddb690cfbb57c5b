#![allow(dead_code)]

use assert_cmd::Command;
use assert_fs::TempDir;
use bitflow::{Author, BranchName, CommitRequest, ObjectId, Repository};
use bytes::Bytes;
use fake::Fake;
use fake::faker::internet::en::FreeEmail;
use fake::faker::name::en::Name;
use rstest::fixture;
use std::path::Path;

pub mod server;

#[fixture]
pub fn repository_dir() -> TempDir {
    TempDir::new().expect("Failed to create temp dir")
}

/// An initialized on-disk repository with an unborn `master`
#[fixture]
pub fn repository(repository_dir: TempDir) -> (TempDir, Repository) {
    let repository = Repository::init(repository_dir.path(), &master())
        .expect("Failed to initialize repository");

    (repository_dir, repository)
}

#[fixture]
pub fn memory_repository() -> Repository {
    Repository::in_memory(&master()).expect("Failed to create repository")
}

pub fn master() -> BranchName {
    BranchName::default()
}

pub fn branch(name: &str) -> BranchName {
    BranchName::try_parse(name).expect("Invalid branch name")
}

/// A random identity authoring at `seconds` after the epoch
pub fn author_at(seconds: i64) -> Author {
    let timestamp = Author::parse_date(&format!("{seconds} +0000")).expect("Invalid timestamp");

    Author::new_with_timestamp(Name().fake(), FreeEmail().fake(), timestamp)
}

pub fn request(branch: &str, path: &str, content: &str, seconds: i64) -> CommitRequest {
    CommitRequest {
        branch: branch.to_string(),
        path: path.to_string(),
        content: Bytes::copy_from_slice(content.as_bytes()),
        message: format!("Update {path}"),
        author: author_at(seconds),
        expected_tip: None,
    }
}

pub fn commit_file(
    repository: &Repository,
    branch: &str,
    path: &str,
    content: &str,
    seconds: i64,
) -> ObjectId {
    repository
        .commit(request(branch, path, content, seconds))
        .expect("Failed to commit")
}

pub fn run_bitflow_command(dir: &Path, args: &[&str]) -> Command {
    let mut cmd = Command::cargo_bin("bitflow").expect("Failed to find bitflow binary");
    cmd.current_dir(dir)
        .env("GIT_AUTHOR_NAME", Name().fake::<String>())
        .env("GIT_AUTHOR_EMAIL", FreeEmail().fake::<String>())
        .env("GIT_AUTHOR_DATE", "2023-01-01 12:00:00 +0000")
        .env_remove("BITFLOW_LOG")
        .env_remove("BITFLOW_DEFAULT_BRANCH")
        .args(args);

    cmd
}
