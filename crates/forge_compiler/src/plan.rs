//! The compile plan: staged objects, tracked patches and diagnostics.

use forge_merge::PatchValue;
use serde::{Deserialize, Serialize};
use std::fmt::Display;

/// A freshly built or cloned object awaiting the write phase.
#[derive(Debug, Clone)]
pub struct StagedObject {
    /// Instance name (the identity written inside template blobs, or the
    /// asset name for native media objects).
    pub name: String,
    pub class_id: u32,
    /// Template type for template objects; empty for native classes.
    pub type_name: String,
    /// Container path the object is registered under.
    pub container_path: String,
    /// Freshly allocated object id, never reused from the base bundle.
    pub path_id: i64,
    pub bytes: Vec<u8>,
}

/// A field patch carried through to the output metadata.
///
/// Raw byte cloning does not give the pipeline enough schema knowledge to
/// rewrite arbitrary typed fields at unaligned offsets, so patches never
/// touch object bytes here. They are handed to the runtime side, which
/// applies them once the objects exist in memory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackedPatch {
    pub template_type: String,
    pub instance_name: String,
    pub field_name: String,
    pub value: PatchValue,
    pub source_mod: String,
}

/// One recoverable per-item failure, with enough context to identify the
/// offending mod and item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Diagnostic {
    /// Pipeline phase that recorded the failure.
    pub phase: String,
    pub mod_id: String,
    /// The item that failed (instance name, file name).
    pub item: String,
    pub message: String,
}

impl Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "[{}] mod '{}' item '{}': {}",
            self.phase, self.mod_id, self.item, self.message
        )
    }
}

/// Accumulated output of the pipeline, built fresh per compile invocation.
#[derive(Debug, Default)]
pub struct CompilePlan {
    staged: Vec<StagedObject>,
    tracked_patches: Vec<TrackedPatch>,
    diagnostics: Vec<Diagnostic>,
    next_path_id: i64,
}

impl CompilePlan {
    /// Create a plan whose id allocation starts above the base bundle's
    /// highest object id.
    pub fn new(path_id_watermark: i64) -> Self {
        Self {
            next_path_id: path_id_watermark,
            ..Default::default()
        }
    }

    /// Allocate a fresh object id. Ids are sequential and never collide
    /// with the base bundle or earlier allocations.
    pub fn allocate_path_id(&mut self) -> i64 {
        self.next_path_id += 1;
        self.next_path_id
    }

    pub fn stage(&mut self, object: StagedObject) {
        tracing::debug!(
            "Staged {} (class {}, id {})",
            object.container_path,
            object.class_id,
            object.path_id
        );
        self.staged.push(object);
    }

    pub fn staged(&self) -> &[StagedObject] {
        &self.staged
    }

    /// Find a staged template instance by type and name.
    pub fn staged_instance(&self, template_type: &str, name: &str) -> Option<&StagedObject> {
        self.staged
            .iter()
            .find(|o| o.type_name == template_type && o.name == name)
    }

    pub fn track_patch(&mut self, patch: TrackedPatch) {
        self.tracked_patches.push(patch);
    }

    pub fn tracked_patches(&self) -> &[TrackedPatch] {
        &self.tracked_patches
    }

    /// Record a recoverable per-item failure.
    pub fn diagnostic(&mut self, phase: &str, mod_id: &str, item: &str, message: String) {
        let diagnostic = Diagnostic {
            phase: phase.to_string(),
            mod_id: mod_id.to_string(),
            item: item.to_string(),
            message,
        };
        tracing::warn!("{diagnostic}");
        self.diagnostics.push(diagnostic);
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn into_diagnostics(self) -> Vec<Diagnostic> {
        self.diagnostics
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_path_id_allocation_is_sequential_above_watermark() {
        let mut plan = CompilePlan::new(40);
        assert_eq!(plan.allocate_path_id(), 41);
        assert_eq!(plan.allocate_path_id(), 42);
    }

    #[test]
    fn test_staged_instance_matches_type_and_name() {
        let mut plan = CompilePlan::new(0);
        plan.stage(StagedObject {
            name: "boss_grunt".to_string(),
            class_id: 114,
            type_name: "UnitTemplate".to_string(),
            container_path: "unittemplate/boss_grunt".to_string(),
            path_id: 1,
            bytes: Vec::new(),
        });

        assert!(plan.staged_instance("UnitTemplate", "boss_grunt").is_some());
        assert!(plan.staged_instance("WeaponTemplate", "boss_grunt").is_none());
        assert!(plan.staged_instance("UnitTemplate", "grunt").is_none());
    }
}
