use crate::artifacts::database::backend::ObjectBackend;
use crate::artifacts::database::loose::LooseObjects;
use crate::artifacts::database::memory::MemoryObjects;
use crate::artifacts::diff::tree_diff::TreeDiff;
use crate::artifacts::objects::blob::Blob;
use crate::artifacts::objects::commit::Commit;
use crate::artifacts::objects::object::{Object, ObjectBox, Unpackable};
use crate::artifacts::objects::object_id::ObjectId;
use crate::artifacts::objects::object_type::ObjectType;
use crate::artifacts::objects::tree::Tree;
use anyhow::Context;
use bytes::Bytes;
use std::io::Cursor;
use std::path::Path;

/// Content-addressed object database
///
/// Objects are immutable and keyed by the hash of their serialized form. The
/// database refuses to store a tree or commit whose references are not already
/// present, so it never holds a dangling reference.
#[derive(Debug)]
pub struct Database {
    backend: Box<dyn ObjectBackend>,
}

impl Database {
    pub fn new(backend: Box<dyn ObjectBackend>) -> Self {
        Database { backend }
    }

    pub fn on_disk(path: Box<Path>) -> Self {
        Self::new(Box::new(LooseObjects::new(path)))
    }

    pub fn in_memory() -> Self {
        Self::new(Box::<MemoryObjects>::default())
    }

    pub fn tree_diff(
        &self,
        old_oid: Option<&ObjectId>,
        new_oid: Option<&ObjectId>,
    ) -> anyhow::Result<TreeDiff<'_>> {
        let mut tree_diff = TreeDiff::new(self);
        tree_diff.compare_oids(old_oid, new_oid, "")?;
        Ok(tree_diff)
    }

    pub fn contains(&self, object_id: &ObjectId) -> anyhow::Result<bool> {
        self.backend.contains(object_id)
    }

    /// Load the serialized form (`<type> <size>\0<content>`) of an object
    pub fn load(&self, object_id: &ObjectId) -> anyhow::Result<Bytes> {
        self.backend
            .read(object_id)?
            .with_context(|| format!("Object {object_id} not found"))
    }

    pub fn store(&self, object: &impl Object) -> anyhow::Result<ObjectId> {
        let object_content = object.serialize()?;
        let object_id = ObjectId::hash_bytes(&object_content);

        self.store_raw(&object_id, object_content)?;

        Ok(object_id)
    }

    /// Store an already serialized object, typically one received from a remote
    ///
    /// The content must hash to `object_id` and parse as a well-formed object.
    pub fn store_raw(&self, object_id: &ObjectId, object_content: Bytes) -> anyhow::Result<()> {
        let actual_id = ObjectId::hash_bytes(&object_content);
        if &actual_id != object_id {
            anyhow::bail!("Object {object_id} is corrupt: content hashes to {actual_id}");
        }

        if self.backend.contains(object_id)? {
            return Ok(());
        }

        let object = Self::parse_raw(&object_content)
            .with_context(|| format!("Object {object_id} is malformed"))?;
        for reference in object.references() {
            if !self.backend.contains(&reference)? {
                anyhow::bail!(
                    "Refusing to store {} {object_id}: it references missing object {reference}",
                    object.object_type()
                );
            }
        }

        self.backend.write(object_id, object_content)
    }

    /// Parse a serialized object
    pub fn parse_raw(object_content: &[u8]) -> anyhow::Result<ObjectBox> {
        let mut object_reader = Cursor::new(object_content);
        let object_type = ObjectType::parse_object_type(&mut object_reader)?;

        match object_type {
            ObjectType::Blob => Ok(ObjectBox::Blob(Box::new(Blob::deserialize(object_reader)?))),
            ObjectType::Tree => Ok(ObjectBox::Tree(Box::new(Tree::deserialize(object_reader)?))),
            ObjectType::Commit => Ok(ObjectBox::Commit(Box::new(Commit::deserialize(
                object_reader,
            )?))),
        }
    }

    pub fn parse_object(&self, object_id: &ObjectId) -> anyhow::Result<ObjectBox> {
        Self::parse_raw(&self.load(object_id)?)
            .with_context(|| format!("Unable to parse object {object_id}"))
    }

    pub fn parse_object_as_blob(&self, object_id: &ObjectId) -> anyhow::Result<Option<Blob>> {
        match self.parse_object(object_id)? {
            ObjectBox::Blob(blob) => Ok(Some(*blob)),
            _ => Ok(None),
        }
    }

    pub fn parse_object_as_tree(&self, object_id: &ObjectId) -> anyhow::Result<Option<Tree>> {
        match self.parse_object(object_id)? {
            ObjectBox::Tree(tree) => Ok(Some(*tree)),
            _ => Ok(None),
        }
    }

    pub fn parse_object_as_commit(&self, object_id: &ObjectId) -> anyhow::Result<Option<Commit>> {
        match self.parse_object(object_id)? {
            ObjectBox::Commit(commit) => Ok(Some(*commit)),
            _ => Ok(None),
        }
    }

    /// Look up a commit, returning `None` when the ID is absent or names another type
    pub fn find_commit(&self, object_id: &ObjectId) -> anyhow::Result<Option<Commit>> {
        if !self.contains(object_id)? {
            return Ok(None);
        }

        self.parse_object_as_commit(object_id)
    }

    pub fn get_object_type(&self, object_id: &ObjectId) -> anyhow::Result<ObjectType> {
        let object_content = self.load(object_id)?;
        ObjectType::parse_object_type(&mut Cursor::new(object_content.as_ref()))
    }
}
