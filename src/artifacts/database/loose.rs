//! Loose object files
//!
//! Each object is zlib-compressed into `objects/<xx>/<38 hex chars>`, the same
//! layout git uses, so the directory can be served as-is over dumb HTTP.

use crate::artifacts::database::backend::ObjectBackend;
use crate::artifacts::objects::object_id::ObjectId;
use anyhow::Context;
use bytes::Bytes;
use fake::rand;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

#[derive(Debug)]
pub struct LooseObjects {
    path: Box<Path>,
}

impl LooseObjects {
    pub fn new(path: Box<Path>) -> Self {
        LooseObjects { path }
    }

    fn write_object(&self, object_path: PathBuf, object_content: Bytes) -> anyhow::Result<()> {
        let object_dir = object_path
            .parent()
            .context(format!("Invalid object path {}", object_path.display()))?;
        std::fs::create_dir_all(object_dir).context(format!(
            "Unable to create object directory {}",
            object_dir.display()
        ))?;
        let temp_object_path = object_dir.join(Self::generate_temp_name());

        let object_content = compress(&object_content)?;

        let mut file = std::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&temp_object_path)
            .context(format!(
                "Unable to open object file {}",
                temp_object_path.display()
            ))?;

        file.write_all(&object_content).context(format!(
            "Unable to write object file {}",
            temp_object_path.display()
        ))?;
        drop(file);

        // rename the temp file to the object file to make it atomic
        if let Err(err) = std::fs::rename(&temp_object_path, &object_path) {
            let _ = std::fs::remove_file(&temp_object_path);
            // another writer stored the same content first
            if !object_path.exists() {
                return Err(err).context(format!(
                    "Unable to rename object file to {}",
                    object_path.display()
                ));
            }
        }

        Ok(())
    }

    fn generate_temp_name() -> String {
        format!("tmp-obj-{}-{}", std::process::id(), rand::random::<u32>())
    }
}

impl ObjectBackend for LooseObjects {
    fn contains(&self, object_id: &ObjectId) -> anyhow::Result<bool> {
        Ok(self.path.join(object_id.to_path()).is_file())
    }

    fn read(&self, object_id: &ObjectId) -> anyhow::Result<Option<Bytes>> {
        let object_path = self.path.join(object_id.to_path());
        if !object_path.is_file() {
            return Ok(None);
        }

        let object_content = std::fs::read(&object_path).context(format!(
            "Unable to read object file {}",
            object_path.display()
        ))?;

        inflate(&object_content).map(Some)
    }

    fn write(&self, object_id: &ObjectId, content: Bytes) -> anyhow::Result<()> {
        let object_path = self.path.join(object_id.to_path());

        // write the object to disk unless it already exists
        if object_path.exists() {
            return Ok(());
        }

        self.write_object(object_path, content)
    }
}

pub fn compress(data: &[u8]) -> anyhow::Result<Bytes> {
    let mut encoder = flate2::write::ZlibEncoder::new(Vec::new(), flate2::Compression::default());
    encoder
        .write_all(data)
        .context("Unable to compress object content")?;

    encoder
        .finish()
        .map(|compressed_content| compressed_content.into())
        .context("Unable to finish compressing object content")
}

/// Decompress a loose object as stored on disk or served over dumb HTTP
pub fn inflate(data: &[u8]) -> anyhow::Result<Bytes> {
    let mut decoder = flate2::read::ZlibDecoder::new(data);
    let mut decompressed_content = Vec::new();
    decoder
        .read_to_end(&mut decompressed_content)
        .context("Unable to decompress object content")?;

    Ok(decompressed_content.into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_fs::TempDir;
    use pretty_assertions::assert_eq;

    #[test]
    fn stores_objects_under_fanout_directories() -> anyhow::Result<()> {
        let dir = TempDir::new()?;
        let objects = LooseObjects::new(dir.path().to_path_buf().into_boxed_path());
        let content = Bytes::from_static(b"blob 5\0hello");
        let oid = ObjectId::hash_bytes(&content);

        objects.write(&oid, content.clone())?;

        assert!(dir
            .path()
            .join("b6")
            .join("fc4c620b67d95f953a5c1c1230aaab5db5a1b0")
            .is_file());
        assert_eq!(objects.read(&oid)?, Some(content));

        Ok(())
    }

    #[test]
    fn leaves_no_temp_files_behind() -> anyhow::Result<()> {
        let dir = TempDir::new()?;
        let objects = LooseObjects::new(dir.path().to_path_buf().into_boxed_path());
        let content = Bytes::from_static(b"blob 1\0x");
        let oid = ObjectId::hash_bytes(&content);

        objects.write(&oid, content.clone())?;
        objects.write(&oid, content)?;

        let fanout = dir.path().join(&oid.as_ref()[..2]);
        assert_eq!(std::fs::read_dir(fanout)?.count(), 1);

        Ok(())
    }
}
