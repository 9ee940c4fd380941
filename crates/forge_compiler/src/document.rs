//! Field-patch metadata document.
//!
//! Field patches are never applied to object bytes during the compile —
//! they travel in this sibling JSON document instead, to be applied by the
//! runtime component once the bundle's objects exist in memory. The
//! contract: "for instance X of type T, set field F to value V".
//!
//! The document must list *every* merged patch, including ones whose target
//! instance the compile could not find (the instance may exist at runtime).

use crate::error::FatalError;
use crate::plan::TrackedPatch;
use camino::{Utf8Path, Utf8PathBuf};
use serde::{Deserialize, Serialize};

/// Sibling document carrying untouched field patches.
///
/// # JSON format
///
/// ```json
/// {
///   "version": 1,
///   "patches": [
///     {
///       "templateType": "UnitTemplate",
///       "instanceName": "grunt",
///       "fieldName": "MaxHealth",
///       "value": { "kind": "int", "value": 250 },
///       "sourceMod": "balance-overhaul"
///     }
///   ]
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldPatchDocument {
    /// Schema version (current: `1`).
    pub version: u32,
    pub patches: Vec<TrackedPatch>,
}

impl FieldPatchDocument {
    pub fn new(patches: Vec<TrackedPatch>) -> Self {
        Self {
            version: 1,
            patches,
        }
    }

    /// Conventional document path next to a compiled bundle.
    pub fn sibling_path(output: &Utf8Path) -> Utf8PathBuf {
        Utf8PathBuf::from(format!("{output}.patches.json"))
    }

    pub fn save(&self, path: &Utf8Path) -> Result<(), FatalError> {
        let contents = serde_json::to_string_pretty(self).map_err(|e| FatalError::OutputWrite {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        std::fs::write(path.as_std_path(), contents).map_err(|e| FatalError::OutputWrite {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    pub fn load(path: &Utf8Path) -> std::io::Result<Self> {
        let contents = std::fs::read_to_string(path.as_std_path())?;
        serde_json::from_str(&contents).map_err(std::io::Error::other)
    }
}
