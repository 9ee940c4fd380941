//! Per-engine-version constants, externalized as configuration.
//!
//! Byte offsets and scan caps differ between target engine versions, and
//! some versions do not embed type metadata at all. Nothing in the patching
//! or locating code hardcodes these numbers — they are resolved here, either
//! from the built-in table or from a JSON override file shipped alongside a
//! game profile.
//!
//! # JSON format
//!
//! ```json
//! [
//!   {
//!     "versionPrefix": "2019",
//!     "hasTypeMetadata": false,
//!     "objectHeaderLen": 12,
//!     "maxIdentityLen": 96,
//!     "scanWindow": 256,
//!     "manifestClassId": 142
//!   }
//! ]
//! ```

use crate::error::{BundleError, Result};
use crate::format::class_id;
use camino::Utf8Path;
use serde::{Deserialize, Serialize};

/// Resolved constants for one target engine version.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineProfile {
    /// Engine version prefix this profile applies to (e.g. `"2021"`).
    pub version_prefix: String,

    /// Whether bundles from this engine embed a type-metadata block. When
    /// `false` the object locator falls back to the bounded heuristic scan.
    pub has_type_metadata: bool,

    /// Size of the constant leading header before `m_Name` in template
    /// blobs (the type-reference block).
    pub object_header_len: usize,

    /// Longest identity string the heuristic scan will accept as plausible.
    pub max_identity_len: usize,

    /// Heuristic scan cap: offsets past this are not probed, bounding the
    /// false-positive surface against unrelated binary data.
    pub scan_window: usize,

    /// Class id of the in-bundle asset registry object.
    pub manifest_class_id: u32,
}

impl Default for EngineProfile {
    fn default() -> Self {
        Self {
            version_prefix: String::new(),
            has_type_metadata: true,
            object_header_len: 12,
            max_identity_len: 96,
            scan_window: 256,
            manifest_class_id: class_id::ASSET_REGISTRY,
        }
    }
}

/// Built-in profile table. 2019-era engines shipped bundles without type
/// metadata; later versions embed it.
fn builtin_profiles() -> Vec<EngineProfile> {
    vec![
        EngineProfile {
            version_prefix: "2019".to_string(),
            has_type_metadata: false,
            ..Default::default()
        },
        EngineProfile {
            version_prefix: "2020".to_string(),
            has_type_metadata: false,
            ..Default::default()
        },
        EngineProfile {
            version_prefix: "2021".to_string(),
            ..Default::default()
        },
        EngineProfile {
            version_prefix: "2022".to_string(),
            ..Default::default()
        },
    ]
}

impl EngineProfile {
    /// Resolve the profile for an engine version string like `"2019.4.31f1"`.
    ///
    /// Longest matching prefix wins, so an override for `"2019.4"` beats the
    /// built-in `"2019"` entry.
    pub fn resolve(engine_version: &str) -> Result<Self> {
        Self::resolve_with_overrides(engine_version, &[])
    }

    /// Resolve against override profiles first, then the built-in table.
    pub fn resolve_with_overrides(engine_version: &str, overrides: &[Self]) -> Result<Self> {
        let builtin = builtin_profiles();
        overrides
            .iter()
            .chain(builtin.iter())
            .filter(|p| engine_version.starts_with(p.version_prefix.as_str()))
            .max_by_key(|p| p.version_prefix.len())
            .cloned()
            .ok_or_else(|| BundleError::UnknownEngineVersion(engine_version.to_string()))
    }

    /// Load override profiles from a JSON file.
    pub fn load_overrides(path: &Utf8Path) -> Result<Vec<Self>> {
        let contents = std::fs::read_to_string(path.as_std_path())?;
        Ok(serde_json::from_str(&contents)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_metadata_versions() {
        let profile = EngineProfile::resolve("2021.3.16f1").unwrap();
        assert!(profile.has_type_metadata);
        assert_eq!(profile.object_header_len, 12);
    }

    #[test]
    fn test_resolve_heuristic_versions() {
        let profile = EngineProfile::resolve("2019.4.31f1").unwrap();
        assert!(!profile.has_type_metadata);
    }

    #[test]
    fn test_resolve_unknown_version() {
        assert!(matches!(
            EngineProfile::resolve("5.6.7"),
            Err(BundleError::UnknownEngineVersion(_))
        ));
    }

    #[test]
    fn test_longest_prefix_wins() {
        let narrow = EngineProfile {
            version_prefix: "2019.4".to_string(),
            scan_window: 512,
            ..Default::default()
        };
        let resolved =
            EngineProfile::resolve_with_overrides("2019.4.31f1", &[narrow.clone()]).unwrap();
        assert_eq!(resolved.scan_window, 512);

        // Other 2019 versions still hit the built-in entry.
        let other = EngineProfile::resolve_with_overrides("2019.2.0f1", &[narrow]).unwrap();
        assert_eq!(other.scan_window, 256);
    }

    #[test]
    fn test_override_file_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("profiles.json");

        let profiles = vec![EngineProfile {
            version_prefix: "2023".to_string(),
            object_header_len: 16,
            ..Default::default()
        }];
        std::fs::write(&path, serde_json::to_string_pretty(&profiles).unwrap()).unwrap();

        let utf8 = camino::Utf8Path::from_path(&path).unwrap();
        let loaded = EngineProfile::load_overrides(utf8).unwrap();
        assert_eq!(loaded, profiles);
    }
}
