//! Object identifier (SHA-1 hash)
//!
//! Object IDs are 40-character lowercase hexadecimal strings representing SHA-1
//! hashes of an object's serialized form. They identify blobs, trees and commits.
//!
//! ## Format
//!
//! - Full: 40 hex characters (e.g., "abc123...def")
//! - Short: First 7 characters (e.g., "abc1234")
//!
//! ## Storage
//!
//! Loose objects live in `objects/<first-2-chars>/<remaining-38-chars>`

use crate::artifacts::objects::{OBJECT_ID_BYTES, OBJECT_ID_LENGTH};
use anyhow::Context;
use serde::{Serialize, Serializer};
use sha1::{Digest, Sha1};
use std::io;
use std::path::PathBuf;

/// Object identifier (SHA-1 hash)
///
/// Always holds a validated, lowercase, 40-character hex string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectId(String);

impl ObjectId {
    /// Parse and validate an object ID from a string
    ///
    /// Uppercase input is accepted and normalized to lowercase.
    pub fn try_parse(id: String) -> anyhow::Result<Self> {
        if id.len() != OBJECT_ID_LENGTH {
            anyhow::bail!("Invalid object ID length: {}", id.len());
        }
        if !id.chars().all(|c| c.is_ascii_hexdigit()) {
            anyhow::bail!("Invalid object ID characters: {}", id);
        }
        Ok(Self(id.to_ascii_lowercase()))
    }

    /// Hash raw serialized object bytes (`<type> <size>\0<content>`)
    pub fn hash_bytes(data: &[u8]) -> Self {
        let mut hasher = Sha1::new();
        hasher.update(data);

        Self(hex::encode(hasher.finalize()))
    }

    /// Write the object ID in binary format (20 bytes)
    ///
    /// Used when serializing tree entries.
    pub fn write_h40_to<W: io::Write>(&self, writer: &mut W) -> anyhow::Result<()> {
        let raw = hex::decode(&self.0).context("Invalid hex in object ID")?;
        writer.write_all(&raw)?;

        Ok(())
    }

    /// Read an object ID from binary format (20 bytes)
    pub fn read_h40_from<R: io::Read + ?Sized>(reader: &mut R) -> anyhow::Result<Self> {
        let mut raw = [0u8; OBJECT_ID_BYTES];
        reader.read_exact(&mut raw)?;

        Ok(Self(hex::encode(raw)))
    }

    /// Convert to the relative path of a loose object
    ///
    /// `abc123...` becomes `ab/c123...`
    pub fn to_path(&self) -> PathBuf {
        let (dir, file) = self.0.split_at(2);
        PathBuf::from(dir).join(file)
    }

    /// First 7 characters of the hash
    pub fn to_short_oid(&self) -> String {
        self.0.split_at(7).0.to_string()
    }
}

impl AsRef<str> for ObjectId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ObjectId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for ObjectId {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        Self::try_parse(s.trim().to_string())
    }
}

impl Serialize for ObjectId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::proptest;

    #[test]
    fn hashes_the_empty_blob_like_git() {
        let oid = ObjectId::hash_bytes(b"blob 0\0");
        assert_eq!(oid.as_ref(), "e69de29bb2d1d6434b8b29ae775ad8c2e48c5391");
    }

    #[test]
    fn rejects_malformed_ids() {
        assert!(ObjectId::try_parse("abc".to_string()).is_err());
        assert!(ObjectId::try_parse("z".repeat(40)).is_err());
    }

    #[test]
    fn normalizes_uppercase() {
        let oid: ObjectId = "E69DE29BB2D1D6434B8B29AE775AD8C2E48C5391".parse().unwrap();
        assert_eq!(oid.to_short_oid(), "e69de29");
        assert_eq!(
            oid.to_path(),
            PathBuf::from("e6").join("9de29bb2d1d6434b8b29ae775ad8c2e48c5391")
        );
    }

    proptest! {
        #[test]
        fn binary_form_preserves_the_id(id in "[0-9a-f]{40}") {
            let oid = ObjectId::try_parse(id.clone()).unwrap();
            let mut raw = Vec::new();
            oid.write_h40_to(&mut raw).unwrap();
            assert_eq!(raw.len(), OBJECT_ID_BYTES);

            let read = ObjectId::read_h40_from(&mut raw.as_slice()).unwrap();
            assert_eq!(read.as_ref(), id.as_str());
        }
    }
}
