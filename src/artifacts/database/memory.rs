use crate::artifacts::database::backend::ObjectBackend;
use crate::artifacts::objects::object_id::ObjectId;
use bytes::Bytes;
use std::collections::HashMap;
use std::sync::RwLock;

/// Transient object storage scoped to the owning repository handle
#[derive(Debug, Default)]
pub struct MemoryObjects {
    objects: RwLock<HashMap<ObjectId, Bytes>>,
}

impl ObjectBackend for MemoryObjects {
    fn contains(&self, object_id: &ObjectId) -> anyhow::Result<bool> {
        let objects = self
            .objects
            .read()
            .map_err(|_| anyhow::anyhow!("object map lock poisoned"))?;

        Ok(objects.contains_key(object_id))
    }

    fn read(&self, object_id: &ObjectId) -> anyhow::Result<Option<Bytes>> {
        let objects = self
            .objects
            .read()
            .map_err(|_| anyhow::anyhow!("object map lock poisoned"))?;

        Ok(objects.get(object_id).cloned())
    }

    fn write(&self, object_id: &ObjectId, content: Bytes) -> anyhow::Result<()> {
        let mut objects = self
            .objects
            .write()
            .map_err(|_| anyhow::anyhow!("object map lock poisoned"))?;

        objects.entry(object_id.clone()).or_insert(content);

        Ok(())
    }
}
