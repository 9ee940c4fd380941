//! Last-wins aggregation of per-mod patch and clone dictionaries.

use crate::value::PatchValue;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Field overrides for one instance: `field name -> value`.
///
/// Field names are opaque atomic keys. A dotted name like
/// `"Stats.MaxHealth"` is one key; it is never decomposed into path
/// segments.
pub type FieldMap = BTreeMap<String, PatchValue>;

/// One mod's full contribution, as read from its package.
///
/// Mods are identified by `mod_id` and ordered by `load_order`. The merge
/// functions sort by `load_order` themselves, so callers may pass the sets
/// in any order.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModPatchSet {
    /// Unique identifier for the mod (used in provenance and logging).
    pub mod_id: String,
    /// Position in the enabled-mod list; higher loads later and wins.
    pub load_order: u32,
    /// `template type -> instance name -> field name -> value`.
    pub patches: BTreeMap<String, BTreeMap<String, FieldMap>>,
    /// `template type -> new instance name -> source instance name`.
    pub clones: BTreeMap<String, BTreeMap<String, String>>,
}

/// A merged field override together with the mod that won it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MergedPatch {
    pub value: PatchValue,
    /// `mod_id` of the highest-load-order contribution that set this key.
    pub source_mod: String,
}

/// A merged clone request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CloneRequest {
    /// Instance the new object is duplicated from.
    pub source_name: String,
    /// `mod_id` of the winning contribution.
    pub source_mod: String,
}

/// The authoritative field-override set across all enabled mods.
///
/// Invariant: each `(template, instance, field)` key holds exactly the value
/// from the highest-load-order contribution that set it. There is no partial
/// merging within a field.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MergedPatchSet {
    templates: BTreeMap<String, BTreeMap<String, BTreeMap<String, MergedPatch>>>,
}

impl MergedPatchSet {
    /// Get the merged field map for one instance.
    ///
    /// Returns `None` when no mod touched that instance — an explicit "no
    /// patches" answer, distinct from an empty map.
    pub fn instance_patch(
        &self,
        template: &str,
        instance: &str,
    ) -> Option<&BTreeMap<String, MergedPatch>> {
        self.templates.get(template)?.get(instance)
    }

    /// Iterate `(template, instance, field, patch)` in deterministic order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str, &str, &MergedPatch)> {
        self.templates.iter().flat_map(|(template, instances)| {
            instances.iter().flat_map(move |(instance, fields)| {
                fields.iter().map(move |(field, patch)| {
                    (template.as_str(), instance.as_str(), field.as_str(), patch)
                })
            })
        })
    }

    /// Template types that have at least one patched instance.
    pub fn template_types(&self) -> impl Iterator<Item = &str> {
        self.templates.keys().map(String::as_str)
    }

    /// Total number of `(template, instance, field)` keys.
    pub fn len(&self) -> usize {
        self.iter().count()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }
}

/// The authoritative clone set across all enabled mods.
///
/// Keyed by `(template, new instance name)`, last-wins. Two mods producing
/// the same new name from different sources silently resolve to the later
/// mod; conflict detection is a separate concern and must not block here.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MergedCloneSet {
    templates: BTreeMap<String, BTreeMap<String, CloneRequest>>,
}

impl MergedCloneSet {
    /// Iterate `(template, new_name, request)` in deterministic order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str, &CloneRequest)> {
        self.templates.iter().flat_map(|(template, clones)| {
            clones
                .iter()
                .map(move |(new_name, req)| (template.as_str(), new_name.as_str(), req))
        })
    }

    /// Template types that have at least one clone request.
    pub fn template_types(&self) -> impl Iterator<Item = &str> {
        self.templates.keys().map(String::as_str)
    }

    /// Look up a clone request by template type and new instance name.
    pub fn get(&self, template: &str, new_name: &str) -> Option<&CloneRequest> {
        self.templates.get(template)?.get(new_name)
    }

    pub fn len(&self) -> usize {
        self.templates.values().map(BTreeMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }
}

/// Merge the patch dictionaries of all enabled mods, last-load-order-wins.
pub fn merge_patch_sets(mods: &[ModPatchSet]) -> MergedPatchSet {
    let mut merged = MergedPatchSet::default();

    for mod_set in sorted_by_load_order(mods) {
        for (template, instances) in &mod_set.patches {
            for (instance, fields) in instances {
                for (field, value) in fields {
                    merged
                        .templates
                        .entry(template.clone())
                        .or_default()
                        .entry(instance.clone())
                        .or_default()
                        .insert(
                            field.clone(),
                            MergedPatch {
                                value: value.clone(),
                                source_mod: mod_set.mod_id.clone(),
                            },
                        );
                }
            }
        }
    }

    merged
}

/// Merge the clone dictionaries of all enabled mods, last-load-order-wins.
pub fn merge_clone_sets(mods: &[ModPatchSet]) -> MergedCloneSet {
    let mut merged = MergedCloneSet::default();

    for mod_set in sorted_by_load_order(mods) {
        for (template, clones) in &mod_set.clones {
            for (new_name, source_name) in clones {
                merged
                    .templates
                    .entry(template.clone())
                    .or_default()
                    .insert(
                        new_name.clone(),
                        CloneRequest {
                            source_name: source_name.clone(),
                            source_mod: mod_set.mod_id.clone(),
                        },
                    );
            }
        }
    }

    merged
}

/// Ascending load order; ties broken by mod id so the result is stable.
fn sorted_by_load_order(mods: &[ModPatchSet]) -> Vec<&ModPatchSet> {
    let mut ordered: Vec<&ModPatchSet> = mods.iter().collect();
    ordered.sort_by(|a, b| {
        a.load_order
            .cmp(&b.load_order)
            .then_with(|| a.mod_id.cmp(&b.mod_id))
    });
    ordered
}
