use crate::artifacts::objects::blob::Blob;
use crate::artifacts::objects::commit::Commit;
use crate::artifacts::objects::object_id::ObjectId;
use crate::artifacts::objects::object_type::ObjectType;
use crate::artifacts::objects::tree::Tree;
use anyhow::Result;
use bytes::Bytes;
use std::io::{BufRead, Write};

pub trait Packable {
    /// Serialize the object body, without the `<type> <size>\0` header
    fn serialize_content(&self) -> Result<Bytes>;
}

pub trait Unpackable {
    fn deserialize(reader: impl BufRead) -> Result<Self>
    where
        Self: Sized;
}

pub trait Object: Packable {
    fn object_type(&self) -> ObjectType;

    /// Full serialized form, `<type> <size>\0<content>`
    fn serialize(&self) -> Result<Bytes> {
        let content = self.serialize_content()?;

        let mut object_bytes = Vec::with_capacity(content.len() + 16);
        let header = format!("{} {}\0", self.object_type().as_str(), content.len());
        object_bytes.write_all(header.as_bytes())?;
        object_bytes.write_all(&content)?;

        Ok(Bytes::from(object_bytes))
    }

    fn object_id(&self) -> Result<ObjectId> {
        Ok(ObjectId::hash_bytes(&self.serialize()?))
    }
}

#[derive(Debug, Clone)]
pub enum ObjectBox {
    Blob(Box<Blob>),
    Tree(Box<Tree>),
    Commit(Box<Commit>),
}

impl ObjectBox {
    pub fn object_type(&self) -> ObjectType {
        match self {
            ObjectBox::Blob(_) => ObjectType::Blob,
            ObjectBox::Tree(_) => ObjectType::Tree,
            ObjectBox::Commit(_) => ObjectType::Commit,
        }
    }

    /// Object IDs this object points at
    ///
    /// A commit references its tree and parents, a tree its entries, a blob nothing.
    pub fn references(&self) -> Vec<ObjectId> {
        match self {
            ObjectBox::Blob(_) => Vec::new(),
            ObjectBox::Tree(tree) => tree.entries().map(|(_, entry)| entry.oid.clone()).collect(),
            ObjectBox::Commit(commit) => std::iter::once(commit.tree_oid().clone())
                .chain(commit.parents().iter().cloned())
                .collect(),
        }
    }
}
