use crate::artifacts::branch::branch_name::SymRefName;
use crate::artifacts::objects::object_id::ObjectId;
use crate::artifacts::refs::backend::RefBackend;
use crate::artifacts::refs::{RefUpdate, SymRefOrOid};
use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

#[derive(Debug, Default)]
pub struct MemoryRefs {
    refs: Mutex<BTreeMap<SymRefName, SymRefOrOid>>,
}

impl MemoryRefs {
    fn lock(&self) -> anyhow::Result<MutexGuard<'_, BTreeMap<SymRefName, SymRefOrOid>>> {
        self.refs
            .lock()
            .map_err(|_| anyhow::anyhow!("ref map lock poisoned"))
    }
}

impl RefBackend for MemoryRefs {
    fn read(&self, name: &SymRefName) -> anyhow::Result<Option<SymRefOrOid>> {
        Ok(self.lock()?.get(name).cloned())
    }

    fn write(&self, name: &SymRefName, value: &SymRefOrOid) -> anyhow::Result<()> {
        self.lock()?.insert(name.clone(), value.clone());
        Ok(())
    }

    fn compare_and_swap(
        &self,
        name: &SymRefName,
        expected: Option<&ObjectId>,
        new: &ObjectId,
    ) -> anyhow::Result<RefUpdate> {
        let mut refs = self.lock()?;
        let current = refs.get(name).and_then(SymRefOrOid::as_oid).cloned();

        if current.as_ref() != expected {
            return Ok(RefUpdate::Rejected { current });
        }

        refs.insert(name.clone(), SymRefOrOid::Oid(new.clone()));
        Ok(RefUpdate::Updated)
    }

    fn list(&self, prefix: &str) -> anyhow::Result<Vec<SymRefName>> {
        Ok(self
            .lock()?
            .keys()
            .filter(|name| name.as_ref().starts_with(prefix))
            .cloned()
            .collect())
    }
}
