//! Bundle writing.

use crate::error::Result;
use crate::format::{
    ObjectEntry, TypeLayoutRecord, BUNDLE_MAGIC, FLAG_TYPE_METADATA, FORMAT_VERSION,
};
use binrw::BinWrite;
use byteorder::{WriteBytesExt, LE};
use std::io::{BufWriter, Cursor, Seek, Write};
use xxhash_rust::xxh3::xxh3_64;

/// One object staged for writing.
#[derive(Debug, Clone)]
pub struct ObjectRecord {
    pub path_id: i64,
    pub class_id: u32,
    pub type_name: String,
    pub container_path: String,
    pub bytes: Vec<u8>,
}

/// Serializes an object set into one self-contained bundle file.
///
/// Objects are written in the order they were added, so a fixed input
/// produces a byte-identical bundle on every run.
#[derive(Debug, Default)]
pub struct BundleBuilder {
    engine_version: String,
    objects: Vec<ObjectRecord>,
    type_layouts: Vec<TypeLayoutRecord>,
}

impl BundleBuilder {
    pub fn new(engine_version: &str) -> Self {
        Self {
            engine_version: engine_version.to_string(),
            ..Default::default()
        }
    }

    pub fn with_object(mut self, object: ObjectRecord) -> Self {
        self.objects.push(object);
        self
    }

    /// Record a type-metadata entry. Bundles with at least one layout get
    /// the type-metadata header flag; bundles with none are written bare,
    /// as older engines produce them.
    pub fn with_type_layout(mut self, type_name: &str, name_offset: u32) -> Self {
        self.type_layouts.push(TypeLayoutRecord {
            type_name: type_name.to_string(),
            name_offset,
        });
        self
    }

    /// Write the bundle.
    pub fn build_to_writer<W: Write + Seek>(self, writer: &mut W) -> Result<()> {
        let mut writer = BufWriter::new(writer);

        let flags = if self.type_layouts.is_empty() {
            0
        } else {
            FLAG_TYPE_METADATA
        };

        // Directory entries with final checksums but placeholder offsets,
        // serialized once to measure the directory size.
        let mut entries: Vec<ObjectEntry> = self
            .objects
            .iter()
            .map(|o| ObjectEntry {
                path_id: o.path_id,
                class_id: o.class_id,
                type_name: o.type_name.clone(),
                container_path: o.container_path.clone(),
                offset: 0,
                size: o.bytes.len() as u64,
                checksum: xxh3_64(&o.bytes),
            })
            .collect();

        let mut directory_probe = Cursor::new(Vec::new());
        for entry in &entries {
            entry.write(&mut directory_probe)?;
        }
        let directory_len = directory_probe.get_ref().len() as u64;

        let mut metadata_block = Cursor::new(Vec::new());
        if flags & FLAG_TYPE_METADATA != 0 {
            metadata_block.write_u32::<LE>(self.type_layouts.len() as u32)?;
            for layout in &self.type_layouts {
                layout.write(&mut metadata_block)?;
            }
        }
        let metadata_len = metadata_block.get_ref().len() as u64;

        let header_len = (BUNDLE_MAGIC.len()              // magic
            + 4                                           // format version
            + 4 + self.engine_version.len()               // engine version
            + 4                                           // flags
            + 4) as u64; // object count

        // Content block starts after header, directory and metadata.
        let mut offset = header_len + directory_len + metadata_len;
        for (entry, object) in entries.iter_mut().zip(&self.objects) {
            entry.offset = offset;
            offset += object.bytes.len() as u64;
        }

        writer.write_all(&BUNDLE_MAGIC)?;
        writer.write_u32::<LE>(FORMAT_VERSION)?;
        writer.write_u32::<LE>(self.engine_version.len() as u32)?;
        writer.write_all(self.engine_version.as_bytes())?;
        writer.write_u32::<LE>(flags)?;
        writer.write_u32::<LE>(entries.len() as u32)?;

        for entry in &entries {
            entry.write(&mut writer)?;
        }
        writer.write_all(metadata_block.get_ref())?;

        for object in &self.objects {
            writer.write_all(&object.bytes)?;
        }

        writer.flush()?;
        Ok(())
    }
}
