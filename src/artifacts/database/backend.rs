use crate::artifacts::objects::object_id::ObjectId;
use bytes::Bytes;

/// Storage behind the object database
///
/// Backends hold serialized objects (`<type> <size>\0<content>`) keyed by their
/// ID. They are append-only: writing an ID that is already present leaves the
/// existing entry untouched, which makes concurrent writes of identical content
/// safe without locking.
pub trait ObjectBackend: Send + Sync + std::fmt::Debug {
    fn contains(&self, object_id: &ObjectId) -> anyhow::Result<bool>;

    fn read(&self, object_id: &ObjectId) -> anyhow::Result<Option<Bytes>>;

    fn write(&self, object_id: &ObjectId, content: Bytes) -> anyhow::Result<()>;
}
