//! Merge model for TemplateForge mod contributions.
//!
//! Each installed mod contributes two dictionaries: field-level *patches*
//! (`template -> instance -> field -> value`) and *clones*
//! (`template -> new instance <- source instance`). This crate aggregates the
//! contributions of all enabled mods into one authoritative
//! [`MergedPatchSet`] / [`MergedCloneSet`] pair that the bundle compiler
//! consumes.
//!
//! Conflict resolution is last-writer-wins by mod load order, the same rule
//! the overlay builder applies to chunk overrides: when two mods touch the
//! same key, the mod with the higher load order wins and earlier values for
//! that exact key are discarded. All other keys are untouched. Merging is
//! total — empty input produces an empty result, never an error.
//!
//! Everything here is pure and in-memory. `BTreeMap` is used throughout so
//! iteration order (and every artifact derived from it downstream) is
//! deterministic for a fixed input.

pub mod merge;
pub mod value;

pub use merge::{
    merge_clone_sets, merge_patch_sets, CloneRequest, MergedCloneSet, MergedPatch, MergedPatchSet,
    ModPatchSet,
};
pub use value::PatchValue;
