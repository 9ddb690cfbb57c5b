//! File-backed refs
//!
//! Every ref is a file under the repository directory holding either an
//! object ID or `ref: <name>`. Updates hold an exclusive `file_guard` lock on
//! `<ref>.lock`, write the new value there, then rename it over the ref. `packed-refs` is honored when reading.

use crate::artifacts::branch::branch_name::SymRefName;
use crate::artifacts::objects::object_id::ObjectId;
use crate::artifacts::refs::backend::RefBackend;
use crate::artifacts::refs::{RefUpdate, SymRefOrOid};
use anyhow::Context;
use file_guard::{FileGuard, Lock};
use std::collections::{BTreeSet, HashSet};
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Condvar, LazyLock, Mutex, PoisonError};
use walkdir::WalkDir;

const LOCK_EXTENSION: &str = "lock";
const PACKED_REFS: &str = "packed-refs";

#[derive(Debug)]
pub struct FileRefs {
    path: Box<Path>,
}

impl FileRefs {
    pub fn new(path: Box<Path>) -> Self {
        FileRefs { path }
    }

    fn ref_path(&self, name: &SymRefName) -> PathBuf {
        self.path.join(name.as_ref_path())
    }

    fn read_loose(&self, name: &SymRefName) -> anyhow::Result<Option<SymRefOrOid>> {
        let ref_path = self.ref_path(name);
        if !ref_path.is_file() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(&ref_path)
            .with_context(|| format!("Unable to read ref file {}", ref_path.display()))?;

        SymRefOrOid::parse(&content)
            .with_context(|| format!("Ref file {} is malformed", ref_path.display()))
    }

    /// Entries of `packed-refs`, skipping comments and peeled tag lines
    fn read_packed(&self) -> anyhow::Result<Vec<(SymRefName, ObjectId)>> {
        let packed_path = self.path.join(PACKED_REFS);
        if !packed_path.is_file() {
            return Ok(Vec::new());
        }

        let content = std::fs::read_to_string(&packed_path)
            .with_context(|| format!("Unable to read {}", packed_path.display()))?;

        content
            .lines()
            .filter(|line| !line.starts_with('#') && !line.starts_with('^') && !line.is_empty())
            .map(|line| {
                let (oid, name) = line
                    .split_once(' ')
                    .with_context(|| format!("Malformed packed ref line: {line}"))?;
                Ok((
                    SymRefName::new(name.to_string()),
                    ObjectId::try_parse(oid.to_string())?,
                ))
            })
            .collect()
    }
}

impl RefBackend for FileRefs {
    fn read(&self, name: &SymRefName) -> anyhow::Result<Option<SymRefOrOid>> {
        if let Some(value) = self.read_loose(name)? {
            return Ok(Some(value));
        }

        Ok(self
            .read_packed()?
            .into_iter()
            .find(|(packed_name, _)| packed_name == name)
            .map(|(_, oid)| SymRefOrOid::Oid(oid)))
    }

    fn write(&self, name: &SymRefName, value: &SymRefOrOid) -> anyhow::Result<()> {
        RefLock::acquire(self.ref_path(name))?.commit(&value.to_content())
    }

    fn compare_and_swap(
        &self,
        name: &SymRefName,
        expected: Option<&ObjectId>,
        new: &ObjectId,
    ) -> anyhow::Result<RefUpdate> {
        let lock = RefLock::acquire(self.ref_path(name))?;

        // re-read while holding the lock
        let current = self.read(name)?.as_ref().and_then(SymRefOrOid::as_oid).cloned();
        if current.as_ref() != expected {
            return Ok(RefUpdate::Rejected { current });
        }

        lock.commit(&SymRefOrOid::Oid(new.clone()).to_content())?;
        Ok(RefUpdate::Updated)
    }

    fn list(&self, prefix: &str) -> anyhow::Result<Vec<SymRefName>> {
        let mut names = BTreeSet::new();
        let prefix_path = self.path.join(prefix);

        if prefix_path.is_dir() {
            for entry in WalkDir::new(&prefix_path) {
                let entry = entry?;
                let entry_path = entry.path();
                if !entry.file_type().is_file()
                    || entry_path.extension().is_some_and(|ext| ext == LOCK_EXTENSION)
                {
                    continue;
                }

                let relative = entry_path.strip_prefix(&self.path)?;
                let name = relative
                    .components()
                    .map(|component| component.as_os_str().to_string_lossy())
                    .collect::<Vec<_>>()
                    .join("/");
                names.insert(SymRefName::new(name));
            }
        }

        for (name, _) in self.read_packed()? {
            if name.as_ref().starts_with(prefix) {
                names.insert(name);
            }
        }

        Ok(names.into_iter().collect())
    }
}

/// Lock paths held by a thread of this process. fcntl locks do not
/// exclude threads of the same process.
static LOCAL_HOLDERS: LazyLock<(Mutex<HashSet<PathBuf>>, Condvar)> =
    LazyLock::new(Default::default);

/// Exclusive `<ref>.lock` file; removed on drop unless committed
struct RefLock {
    ref_path: PathBuf,
    lock_path: PathBuf,
    guard: Option<FileGuard<Box<File>>>,
}

impl RefLock {
    /// Blocks until this writer holds `<ref>.lock`
    fn acquire(ref_path: PathBuf) -> anyhow::Result<Self> {
        let parent = ref_path
            .parent()
            .with_context(|| format!("Invalid ref path {}", ref_path.display()))?;
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Unable to create ref directory {}", parent.display()))?;
        let file_name = ref_path
            .file_name()
            .with_context(|| format!("Invalid ref path {}", ref_path.display()))?;

        let mut lock_name = file_name.to_os_string();
        lock_name.push(".");
        lock_name.push(LOCK_EXTENSION);
        let lock_path = std::fs::canonicalize(parent)
            .with_context(|| format!("Unable to resolve ref directory {}", parent.display()))?
            .join(lock_name);

        enter_local(&lock_path)?;
        match Self::lock_file(&lock_path) {
            Ok(guard) => Ok(RefLock {
                ref_path,
                lock_path,
                guard: Some(guard),
            }),
            Err(err) => {
                leave_local(&lock_path);
                Err(err)
            }
        }
    }

    fn lock_file(lock_path: &Path) -> anyhow::Result<FileGuard<Box<File>>> {
        loop {
            let file = std::fs::OpenOptions::new()
                .read(true)
                .write(true)
                .create(true)
                .truncate(false)
                .open(lock_path)
                .with_context(|| format!("Unable to open lock file {}", lock_path.display()))?;
            let guard = file_guard::lock(Box::new(file), Lock::Exclusive, 0, 1)
                .with_context(|| format!("Unable to lock {}", lock_path.display()))?;

            // the previous holder renamed or removed the file while we waited
            if still_linked(lock_path, &guard)? {
                return Ok(guard);
            }
        }
    }

    fn commit(mut self, content: &str) -> anyhow::Result<()> {
        let mut guard = self.guard.take().context("Ref lock already released")?;
        let result = Self::write_and_rename(&mut guard, &self.lock_path, &self.ref_path, content);
        if result.is_err() {
            let _ = std::fs::remove_file(&self.lock_path);
        }
        drop(guard);
        leave_local(&self.lock_path);

        result
    }

    fn write_and_rename(
        file: &mut File,
        lock_path: &Path,
        ref_path: &Path,
        content: &str,
    ) -> anyhow::Result<()> {
        file.set_len(0)
            .with_context(|| format!("Unable to truncate lock file {}", lock_path.display()))?;
        file.write_all(content.as_bytes())
            .with_context(|| format!("Unable to write lock file {}", lock_path.display()))?;
        file.sync_all()?;

        // the rename happens while the lock is still held
        std::fs::rename(lock_path, ref_path)
            .with_context(|| format!("Unable to move lock file over {}", ref_path.display()))
    }
}

impl Drop for RefLock {
    fn drop(&mut self) {
        if let Some(guard) = self.guard.take() {
            let _ = std::fs::remove_file(&self.lock_path);
            drop(guard);
            leave_local(&self.lock_path);
        }
    }
}

fn enter_local(lock_path: &Path) -> anyhow::Result<()> {
    let (holders, released) = &*LOCAL_HOLDERS;
    let mut holders = holders
        .lock()
        .map_err(|_| anyhow::anyhow!("ref lock table poisoned"))?;
    while holders.contains(lock_path) {
        holders = released
            .wait(holders)
            .map_err(|_| anyhow::anyhow!("ref lock table poisoned"))?;
    }
    holders.insert(lock_path.to_path_buf());

    Ok(())
}

fn leave_local(lock_path: &Path) {
    let (holders, released) = &*LOCAL_HOLDERS;
    let mut holders = holders.lock().unwrap_or_else(PoisonError::into_inner);
    holders.remove(lock_path);
    released.notify_all();
}

#[cfg(unix)]
fn still_linked(lock_path: &Path, file: &File) -> anyhow::Result<bool> {
    use std::os::unix::fs::MetadataExt;

    let held = file.metadata()?;
    match std::fs::metadata(lock_path) {
        Ok(current) => Ok(current.dev() == held.dev() && current.ino() == held.ino()),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(false),
        Err(err) => Err(err).with_context(|| format!("Unable to stat {}", lock_path.display())),
    }
}

#[cfg(not(unix))]
fn still_linked(lock_path: &Path, _file: &File) -> anyhow::Result<bool> {
    Ok(lock_path.is_file())
}
