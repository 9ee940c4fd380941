//! Asset registry ("manifest") object codec.
//!
//! Every bundle carries one registry object (class id
//! [`class_id::ASSET_REGISTRY`](crate::format::class_id::ASSET_REGISTRY))
//! that the engine consults to resolve instances by container path at load
//! time. The compile pipeline patches this object so newly staged objects
//! are resolvable.
//!
//! Serialized layout: `m_Name` aligned string, entry count `u32`, then per
//! entry an aligned container-path string, `path_id: i64`, `class_id: u32`.

use crate::aligned::{aligned_size, encode, read_string_at};
use crate::error::{BundleError, Result};
use byteorder::{ByteOrder, LE};

/// One registry row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestEntry {
    pub container_path: String,
    pub path_id: i64,
    pub class_id: u32,
}

/// Decoded registry object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Manifest {
    pub name: String,
    pub entries: Vec<ManifestEntry>,
}

impl Manifest {
    /// A fresh, empty registry.
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            entries: Vec::new(),
        }
    }

    /// Decode a registry object blob.
    pub fn parse(blob: &[u8]) -> Result<Self> {
        let name = read_string_at(blob, 0)?;
        let mut offset = aligned_size(name.len());

        if offset + 4 > blob.len() {
            return Err(BundleError::TruncatedString {
                offset,
                len: blob.len(),
            });
        }
        let count = LE::read_u32(&blob[offset..offset + 4]) as usize;
        offset += 4;

        let mut entries = Vec::with_capacity(count);
        for _ in 0..count {
            let container_path = read_string_at(blob, offset)?;
            offset += aligned_size(container_path.len());

            if offset + 12 > blob.len() {
                return Err(BundleError::TruncatedString {
                    offset,
                    len: blob.len(),
                });
            }
            let path_id = LE::read_i64(&blob[offset..offset + 8]);
            let class_id = LE::read_u32(&blob[offset + 8..offset + 12]);
            offset += 12;

            entries.push(ManifestEntry {
                container_path,
                path_id,
                class_id,
            });
        }

        Ok(Self { name, entries })
    }

    /// Encode back to the on-disk layout.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = encode(&self.name);
        out.extend_from_slice(&(self.entries.len() as u32).to_le_bytes());
        for entry in &self.entries {
            out.extend_from_slice(&encode(&entry.container_path));
            out.extend_from_slice(&entry.path_id.to_le_bytes());
            out.extend_from_slice(&entry.class_id.to_le_bytes());
        }
        out
    }

    /// Register an object, replacing any existing row with the same
    /// container path.
    pub fn register(&mut self, container_path: &str, path_id: i64, class_id: u32) {
        if let Some(existing) = self
            .entries
            .iter_mut()
            .find(|e| e.container_path == container_path)
        {
            existing.path_id = path_id;
            existing.class_id = class_id;
        } else {
            self.entries.push(ManifestEntry {
                container_path: container_path.to_string(),
                path_id,
                class_id,
            });
        }
    }

    /// Look up a row by container path.
    pub fn get(&self, container_path: &str) -> Option<&ManifestEntry> {
        self.entries
            .iter()
            .find(|e| e.container_path == container_path)
    }
}
