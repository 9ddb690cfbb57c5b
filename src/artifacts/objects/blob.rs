//! Blob object
//!
//! Blobs store file content. They contain only the raw bytes, without any
//! metadata like filename or permissions (those are stored in trees).
//!
//! ## Format
//!
//! On disk: `blob <size>\0<content>`

use crate::artifacts::objects::object::{Object, Packable, Unpackable};
use crate::artifacts::objects::object_type::ObjectType;
use bytes::Bytes;
use derive_new::new;
use std::io::BufRead;

/// Immutable file content
#[derive(Debug, Clone, PartialEq, Eq, new)]
pub struct Blob {
    content: Bytes,
}

impl Blob {
    pub fn content(&self) -> &Bytes {
        &self.content
    }

    /// Split the content into lines
    ///
    /// Lines are `\n`-separated and keep no terminator. A trailing newline does
    /// not open an extra, empty line, so `"a\nb\n"` and `"a\nb"` both have two.
    pub fn lines(&self) -> Vec<&[u8]> {
        split_lines(&self.content)
    }
}

pub fn split_lines(content: &[u8]) -> Vec<&[u8]> {
    if content.is_empty() {
        return Vec::new();
    }

    let content = content.strip_suffix(b"\n").unwrap_or(content);
    content.split(|b| *b == b'\n').collect()
}

impl From<&str> for Blob {
    fn from(content: &str) -> Self {
        Blob::new(Bytes::copy_from_slice(content.as_bytes()))
    }
}

impl Packable for Blob {
    fn serialize_content(&self) -> anyhow::Result<Bytes> {
        Ok(self.content.clone())
    }
}

impl Unpackable for Blob {
    fn deserialize(mut reader: impl BufRead) -> anyhow::Result<Self> {
        // the header has already been read
        let mut content = Vec::new();
        reader.read_to_end(&mut content)?;

        Ok(Self::new(content.into()))
    }
}

impl Object for Blob {
    fn object_type(&self) -> ObjectType {
        ObjectType::Blob
    }
}
