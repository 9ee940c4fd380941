//! Per-template-type object lookup.
//!
//! [`build_lookup`] indexes every object of one template type by the
//! identity name stored inside its blob. Two strategies, tried in order:
//!
//! 1. **Embedded type metadata** — when the bundle carries a type-metadata
//!    block (and the engine profile says to trust it), the `m_Name` offset
//!    for the type is known exactly and the name is read directly.
//! 2. **Bounded heuristic scan** — older engine versions ship bundles
//!    without type metadata. The scan walks 4-aligned offsets within
//!    [`EngineProfile::scan_window`] and accepts the first position where
//!    both identity strings parse as plausible names and hold the same
//!    value (the engine writes `m_Name == m_ID` for template objects).
//!    Objects with no confident match are excluded, not errors.
//!
//! Lookups are exact-match and case-sensitive, built once per compile, and
//! deterministic: an identical bundle produces an identical index on every
//! run.

use crate::aligned::{aligned_size, read_string_at};
use crate::profile::EngineProfile;
use crate::read::Bundle;
use std::collections::BTreeMap;
use xxhash_rust::xxh3::xxh3_64;

/// Location of one template object inside the bundle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LocatedObject {
    /// Directory object id.
    pub path_id: i64,
    /// Absolute byte offset of the blob.
    pub offset: u64,
    /// Blob size in bytes.
    pub size: u64,
    /// Offset of `m_Name` within the blob, as resolved by whichever
    /// strategy located the object. Identity rewrites start here.
    pub name_offset: u32,
}

/// `instance name -> location` for one template type.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AssetLookup {
    template_type: String,
    entries: BTreeMap<String, LocatedObject>,
}

impl AssetLookup {
    /// Exact, case-sensitive lookup by instance name.
    pub fn get(&self, instance_name: &str) -> Option<&LocatedObject> {
        self.entries.get(instance_name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &LocatedObject)> {
        self.entries.iter().map(|(name, loc)| (name.as_str(), loc))
    }

    pub fn template_type(&self) -> &str {
        &self.template_type
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Build the lookup for one template type.
pub fn build_lookup(bundle: &Bundle, template_type: &str, profile: &EngineProfile) -> AssetLookup {
    let metadata_offset = if profile.has_type_metadata {
        match bundle.type_layouts() {
            Some(layouts) => layouts.get(template_type).copied(),
            None => {
                tracing::warn!(
                    "Engine profile {} expects type metadata but bundle has none; \
                     falling back to heuristic scan",
                    profile.version_prefix
                );
                None
            }
        }
    } else {
        None
    };

    let mut entries: BTreeMap<String, LocatedObject> = BTreeMap::new();
    let mut excluded = 0usize;

    for entry in bundle.entries_of_type(template_type) {
        let blob = bundle.object_bytes(entry);

        let located = match metadata_offset {
            Some(name_offset) => read_identity_at(blob, name_offset as usize, profile)
                .map(|name| (name, name_offset)),
            None => scan_for_identity(blob, profile),
        };

        let Some((name, name_offset)) = located else {
            tracing::debug!(
                "Excluding object {} ({}): no confident identity",
                entry.path_id,
                template_type
            );
            excluded += 1;
            continue;
        };

        // First occurrence wins on duplicate names; file order is fixed,
        // so the choice is deterministic.
        entries.entry(name).or_insert(LocatedObject {
            path_id: entry.path_id,
            offset: entry.offset,
            size: entry.size,
            name_offset,
        });
    }

    tracing::debug!(
        "Lookup for {}: {} located, {} excluded",
        template_type,
        entries.len(),
        excluded
    );

    AssetLookup {
        template_type: template_type.to_string(),
        entries,
    }
}

/// Deterministic fingerprint over the lookup's sorted entries.
pub fn lookup_fingerprint(lookup: &AssetLookup) -> u64 {
    let mut buf = Vec::new();
    for (name, loc) in lookup.iter() {
        buf.extend_from_slice(name.as_bytes());
        buf.extend_from_slice(&loc.path_id.to_le_bytes());
        buf.extend_from_slice(&loc.offset.to_le_bytes());
        buf.extend_from_slice(&loc.size.to_le_bytes());
    }
    xxh3_64(&buf)
}

/// Read both identity strings at a known offset; `None` when the blob does
/// not hold a plausible identity pair there.
fn read_identity_at(blob: &[u8], name_offset: usize, profile: &EngineProfile) -> Option<String> {
    let name = read_string_at(blob, name_offset).ok()?;
    if !is_plausible_identity(&name, profile) {
        return None;
    }
    let id = read_string_at(blob, name_offset + aligned_size(name.len())).ok()?;
    (id == name).then_some(name)
}

/// Bounded heuristic scan for the identity pair.
fn scan_for_identity(blob: &[u8], profile: &EngineProfile) -> Option<(String, u32)> {
    let window = profile.scan_window.min(blob.len());
    for offset in (0..window).step_by(4) {
        if let Some(name) = read_identity_at(blob, offset, profile) {
            return Some((name, offset as u32));
        }
    }
    None
}

/// Identity names are short printable-ASCII tokens without whitespace.
fn is_plausible_identity(value: &str, profile: &EngineProfile) -> bool {
    !value.is_empty()
        && value.len() <= profile.max_identity_len
        && value.bytes().all(|b| b.is_ascii_graphic())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aligned::encode;
    use crate::format::class_id;
    use crate::writer::{BundleBuilder, ObjectRecord};
    use std::io::Cursor;

    fn template_blob(header_len: usize, name: &str, payload: &[u8]) -> Vec<u8> {
        let mut blob = vec![0xC3u8; header_len];
        blob.extend_from_slice(&encode(name));
        blob.extend_from_slice(&encode(name));
        blob.extend_from_slice(payload);
        blob
    }

    fn template_record(path_id: i64, bytes: Vec<u8>) -> ObjectRecord {
        ObjectRecord {
            path_id,
            class_id: class_id::TEMPLATE,
            type_name: "UnitTemplate".to_string(),
            container_path: format!("unittemplate/{path_id}"),
            bytes,
        }
    }

    fn mount(builder: BundleBuilder) -> Bundle {
        let mut out = Cursor::new(Vec::new());
        builder.build_to_writer(&mut out).unwrap();
        out.set_position(0);
        Bundle::mount_from_reader(out).unwrap()
    }

    #[test]
    fn test_metadata_strategy() {
        let profile = EngineProfile::resolve("2021.3.16f1").unwrap();
        let bundle = mount(
            BundleBuilder::new("2021.3.16f1")
                .with_object(template_record(1, template_blob(12, "grunt", &[9; 16])))
                .with_object(template_record(2, template_blob(12, "archer", &[9; 16])))
                .with_type_layout("UnitTemplate", 12),
        );

        let lookup = build_lookup(&bundle, "UnitTemplate", &profile);
        assert_eq!(lookup.len(), 2);
        assert_eq!(lookup.get("grunt").unwrap().path_id, 1);
        assert_eq!(lookup.get("grunt").unwrap().name_offset, 12);
        assert_eq!(lookup.get("archer").unwrap().path_id, 2);
    }

    #[test]
    fn test_heuristic_strategy_finds_planted_identity() {
        let profile = EngineProfile::resolve("2019.4.31f1").unwrap();
        assert!(!profile.has_type_metadata);

        let bundle = mount(
            BundleBuilder::new("2019.4.31f1")
                .with_object(template_record(1, template_blob(12, "grunt", &[0xEE; 24]))),
        );

        let lookup = build_lookup(&bundle, "UnitTemplate", &profile);
        let located = lookup.get("grunt").unwrap();
        assert_eq!(located.name_offset, 12);
    }

    #[test]
    fn test_heuristic_excludes_garbage_blob() {
        let profile = EngineProfile::resolve("2019.4.31f1").unwrap();

        // No identity pair anywhere: every probed length prefix is absurd.
        let garbage = vec![0xFFu8; 128];
        let bundle =
            mount(BundleBuilder::new("2019.4.31f1").with_object(template_record(1, garbage)));

        let lookup = build_lookup(&bundle, "UnitTemplate", &profile);
        assert!(lookup.is_empty());
    }

    #[test]
    fn test_heuristic_requires_matching_pair() {
        let profile = EngineProfile::resolve("2019.4.31f1").unwrap();

        // m_Name and m_ID differ: not a confident identity, excluded.
        let mut blob = vec![0u8; 12];
        blob.extend_from_slice(&encode("grunt"));
        blob.extend_from_slice(&encode("other"));
        let bundle = mount(BundleBuilder::new("2019.4.31f1").with_object(template_record(1, blob)));

        let lookup = build_lookup(&bundle, "UnitTemplate", &profile);
        assert!(lookup.is_empty());
    }

    #[test]
    fn test_scan_window_bounds_the_search() {
        let profile = EngineProfile {
            scan_window: 16,
            has_type_metadata: false,
            ..EngineProfile::default()
        };

        // Identity planted past the window; must not be found.
        let bundle = mount(
            BundleBuilder::new("2019.4.31f1")
                .with_object(template_record(1, template_blob(64, "grunt", &[]))),
        );

        let lookup = build_lookup(&bundle, "UnitTemplate", &profile);
        assert!(lookup.is_empty());
    }

    #[test]
    fn test_lookup_is_case_sensitive() {
        let profile = EngineProfile::resolve("2021.3.16f1").unwrap();
        let bundle = mount(
            BundleBuilder::new("2021.3.16f1")
                .with_object(template_record(1, template_blob(12, "Grunt", &[])))
                .with_type_layout("UnitTemplate", 12),
        );

        let lookup = build_lookup(&bundle, "UnitTemplate", &profile);
        assert!(lookup.get("Grunt").is_some());
        assert!(lookup.get("grunt").is_none());
    }

    #[test]
    fn test_lookup_deterministic() {
        let profile = EngineProfile::resolve("2019.4.31f1").unwrap();
        let builder = || {
            BundleBuilder::new("2019.4.31f1")
                .with_object(template_record(1, template_blob(12, "grunt", &[1; 8])))
                .with_object(template_record(2, template_blob(12, "archer", &[2; 8])))
        };

        let first = build_lookup(&mount(builder()), "UnitTemplate", &profile);
        let second = build_lookup(&mount(builder()), "UnitTemplate", &profile);
        assert_eq!(first, second);
        assert_eq!(lookup_fingerprint(&first), lookup_fingerprint(&second));
    }
}
