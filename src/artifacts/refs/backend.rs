use crate::artifacts::branch::branch_name::SymRefName;
use crate::artifacts::objects::object_id::ObjectId;
use crate::artifacts::refs::{RefUpdate, SymRefOrOid};
use std::fmt::Debug;

/// Storage for named references
///
/// `compare_and_swap` is the only way to move a branch tip: it must be
/// linearizable per ref across threads and handles sharing the same storage.
pub trait RefBackend: Send + Sync + Debug {
    fn read(&self, name: &SymRefName) -> anyhow::Result<Option<SymRefOrOid>>;

    /// Unconditionally set a ref; used for HEAD and while populating a clone
    fn write(&self, name: &SymRefName, value: &SymRefOrOid) -> anyhow::Result<()>;

    /// Point `name` at `new` only if it currently holds `expected` (`None` means absent)
    fn compare_and_swap(
        &self,
        name: &SymRefName,
        expected: Option<&ObjectId>,
        new: &ObjectId,
    ) -> anyhow::Result<RefUpdate>;

    /// Ref names under `prefix` (e.g. `refs/heads/`), sorted
    fn list(&self, prefix: &str) -> anyhow::Result<Vec<SymRefName>>;
}
