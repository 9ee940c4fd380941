//! Bundle mounting.

use crate::error::{BundleError, Result};
use crate::format::{ObjectEntry, TypeLayoutRecord, BUNDLE_MAGIC, FLAG_TYPE_METADATA, FORMAT_VERSION};
use binrw::BinRead;
use byteorder::{ReadBytesExt, LE};
use camino::Utf8Path;
use std::collections::HashMap;
use std::io::{Cursor, Read};
use xxhash_rust::xxh3::xxh3_64;

/// A mounted bundle, loaded fully into memory.
///
/// The full file is kept as one byte buffer; [`object_bytes`](Self::object_bytes)
/// returns slices into it. Object blobs are never mutated in place — patching
/// always yields a new array (see [`crate::aligned`]).
#[derive(Debug)]
pub struct Bundle {
    engine_version: String,
    entries: Vec<ObjectEntry>,
    /// `type_name -> m_Name offset`, when the bundle embeds type metadata.
    type_layouts: Option<HashMap<String, u32>>,
    data: Vec<u8>,
}

impl Bundle {
    /// Mount a bundle from any reader. The reader is drained to the end.
    pub fn mount_from_reader<R: Read>(mut source: R) -> Result<Self> {
        let mut data = Vec::new();
        source.read_to_end(&mut data)?;
        Self::mount_from_bytes(data)
    }

    /// Mount a bundle file.
    pub fn mount_from_file(path: &Utf8Path) -> Result<Self> {
        Self::mount_from_bytes(std::fs::read(path.as_std_path())?)
    }

    fn mount_from_bytes(data: Vec<u8>) -> Result<Self> {
        let mut reader = Cursor::new(&data);

        let magic = reader.read_u64::<LE>()?;
        if magic != u64::from_le_bytes(BUNDLE_MAGIC) {
            return Err(BundleError::InvalidMagic(magic));
        }

        let version = reader.read_u32::<LE>()?;
        if version != FORMAT_VERSION {
            return Err(BundleError::InvalidVersion(version));
        }

        let engine_version = read_string(&mut reader)?;
        let flags = reader.read_u32::<LE>()?;
        let object_count = reader.read_u32::<LE>()?;

        let mut entries = Vec::with_capacity(object_count as usize);
        for _ in 0..object_count {
            entries.push(ObjectEntry::read(&mut reader)?);
        }

        let type_layouts = if flags & FLAG_TYPE_METADATA != 0 {
            let type_count = reader.read_u32::<LE>()?;
            let mut layouts = HashMap::with_capacity(type_count as usize);
            for _ in 0..type_count {
                let record = TypeLayoutRecord::read(&mut reader)?;
                layouts.insert(record.type_name, record.name_offset);
            }
            Some(layouts)
        } else {
            None
        };

        // Validate ranges and checksums up front; a bundle that fails here
        // is unreadable, not partially usable.
        for entry in &entries {
            let out_of_bounds = BundleError::ObjectOutOfBounds {
                path_id: entry.path_id,
                offset: entry.offset,
                size: entry.size,
                len: data.len(),
            };
            match entry.offset.checked_add(entry.size) {
                Some(end) if end as usize <= data.len() => {}
                _ => return Err(out_of_bounds),
            }
            let bytes = &data[entry.offset as usize..(entry.offset + entry.size) as usize];
            if xxh3_64(bytes) != entry.checksum {
                return Err(BundleError::ChecksumMismatch {
                    path_id: entry.path_id,
                });
            }
        }

        tracing::debug!(
            "Mounted bundle: engine={} objects={} type_metadata={}",
            engine_version,
            entries.len(),
            type_layouts.is_some()
        );

        Ok(Self {
            engine_version,
            entries,
            type_layouts,
            data,
        })
    }

    /// Engine version string recorded in the bundle header.
    pub fn engine_version(&self) -> &str {
        &self.engine_version
    }

    /// All directory entries, in file order.
    pub fn entries(&self) -> &[ObjectEntry] {
        &self.entries
    }

    /// Directory entries of one class id, in file order.
    pub fn entries_of_class(&self, class_id: u32) -> impl Iterator<Item = &ObjectEntry> {
        self.entries.iter().filter(move |e| e.class_id == class_id)
    }

    /// Directory entries of one template type, in file order.
    pub fn entries_of_type<'a>(&'a self, type_name: &'a str) -> impl Iterator<Item = &'a ObjectEntry> {
        self.entries.iter().filter(move |e| e.type_name == type_name)
    }

    /// Look up a directory entry by object id.
    pub fn entry_by_path_id(&self, path_id: i64) -> Option<&ObjectEntry> {
        self.entries.iter().find(|e| e.path_id == path_id)
    }

    /// Raw bytes of one object.
    pub fn object_bytes(&self, entry: &ObjectEntry) -> &[u8] {
        &self.data[entry.offset as usize..(entry.offset + entry.size) as usize]
    }

    /// `type_name -> m_Name offset` map when the bundle embeds type metadata.
    pub fn type_layouts(&self) -> Option<&HashMap<String, u32>> {
        self.type_layouts.as_ref()
    }

    /// Highest object id in use. New objects are allocated above this.
    pub fn max_path_id(&self) -> i64 {
        self.entries.iter().map(|e| e.path_id).max().unwrap_or(0)
    }
}

fn read_string<R: Read>(reader: &mut R) -> Result<String> {
    let len = reader.read_u32::<LE>()?;
    let mut bytes = vec![0; len as usize];
    reader.read_exact(&mut bytes)?;
    String::from_utf8(bytes).map_err(|_| BundleError::InvalidUtf8 { offset: 0 })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::class_id;
    use crate::writer::{BundleBuilder, ObjectRecord};
    use std::io::Cursor;

    #[test]
    fn test_mount_rejects_bad_magic() {
        let data = b"NOTABNDL\x01\x00\x00\x00".to_vec();
        assert!(matches!(
            Bundle::mount_from_reader(Cursor::new(data)),
            Err(BundleError::InvalidMagic(_))
        ));
    }

    #[test]
    fn test_mount_roundtrip() {
        let mut out = Cursor::new(Vec::new());
        BundleBuilder::new("2021.3.16f1")
            .with_object(ObjectRecord {
                path_id: 1,
                class_id: class_id::TEMPLATE,
                type_name: "UnitTemplate".to_string(),
                container_path: "unittemplate/grunt".to_string(),
                bytes: vec![1, 2, 3, 4, 5],
            })
            .with_type_layout("UnitTemplate", 12)
            .build_to_writer(&mut out)
            .unwrap();

        out.set_position(0);
        let bundle = Bundle::mount_from_reader(out).unwrap();

        assert_eq!(bundle.engine_version(), "2021.3.16f1");
        assert_eq!(bundle.entries().len(), 1);
        assert_eq!(bundle.max_path_id(), 1);

        let entry = &bundle.entries()[0];
        assert_eq!(entry.type_name, "UnitTemplate");
        assert_eq!(bundle.object_bytes(entry), &[1, 2, 3, 4, 5]);
        assert_eq!(
            bundle.type_layouts().unwrap().get("UnitTemplate"),
            Some(&12)
        );
    }

    #[test]
    fn test_mount_detects_corruption() {
        let mut out = Cursor::new(Vec::new());
        BundleBuilder::new("2021.3.16f1")
            .with_object(ObjectRecord {
                path_id: 7,
                class_id: class_id::TEXTURE_2D,
                type_name: String::new(),
                container_path: "textures/t".to_string(),
                bytes: vec![0xAB; 32],
            })
            .build_to_writer(&mut out)
            .unwrap();

        // Flip a content byte (the last byte of the file is object data).
        let mut data = out.into_inner();
        let last = data.len() - 1;
        data[last] ^= 0xFF;

        assert!(matches!(
            Bundle::mount_from_reader(Cursor::new(data)),
            Err(BundleError::ChecksumMismatch { path_id: 7 })
        ));
    }
}
