//! The ordered compile pipeline.
//!
//! Each step implements [`Phase`] and operates on the shared [`CompileCx`].
//! The pipeline order is fixed — see [`pipeline`] — because the write phase
//! depends on object ids allocated by every phase before it, and the
//! registry patch needs the complete staged set.

pub mod audio;
pub mod clones;
pub mod lookup;
pub mod models;
pub mod patches;
pub mod textures;
pub mod write;

use crate::cancel::CancelToken;
use crate::entries::{AudioEntry, ModelEntry, TextureEntry};
use crate::error::FatalError;
use crate::plan::CompilePlan;
use crate::progress::{CompileProgress, CompileStage, ProgressCallback};
use camino::Utf8Path;
use forge_bundle::{AssetLookup, Bundle, EngineProfile};
use forge_merge::{MergedCloneSet, MergedPatchSet};
use std::collections::BTreeMap;

/// Shared state for one compile invocation.
///
/// Built fresh per compile and discarded after the write phase; nothing in
/// here outlives the invocation (no process-wide caches).
pub struct CompileCx<'a> {
    pub bundle: &'a Bundle,
    pub profile: &'a EngineProfile,
    pub patches: &'a MergedPatchSet,
    pub clones: &'a MergedCloneSet,
    pub audio: &'a [AudioEntry],
    pub textures: &'a [TextureEntry],
    pub models: &'a [ModelEntry],
    pub output: &'a Utf8Path,
    /// Per-template-type lookups built by the lookup phase.
    pub lookups: BTreeMap<String, AssetLookup>,
    pub plan: CompilePlan,
    pub(crate) cancel: CancelToken,
    pub(crate) progress: Option<ProgressCallback>,
}

impl CompileCx<'_> {
    /// Cooperative cancellation gate, called between phases and between
    /// work items within a phase.
    pub fn check_cancelled(&self) -> Result<(), FatalError> {
        if self.cancel.is_cancelled() {
            Err(FatalError::Cancelled)
        } else {
            Ok(())
        }
    }

    /// Emit a progress event if a callback was registered.
    pub fn emit_progress(
        &self,
        stage: CompileStage,
        current_item: Option<String>,
        current: u32,
        total: u32,
    ) {
        if let Some(callback) = &self.progress {
            callback(CompileProgress {
                stage,
                current_item,
                current,
                total,
            });
        }
    }
}

/// One step of the compile pipeline.
pub trait Phase {
    fn name(&self) -> &'static str;
    fn stage(&self) -> CompileStage;

    /// Process this phase's work items against the shared context.
    ///
    /// Per-item failures are recorded on the plan and never returned as
    /// errors; `Err` is reserved for fatal conditions and cancellation.
    fn run(&self, cx: &mut CompileCx<'_>) -> Result<(), FatalError>;
}

/// The fixed phase sequence.
pub fn pipeline() -> Vec<Box<dyn Phase>> {
    vec![
        Box::new(lookup::LookupPhase),
        Box::new(clones::ClonePhase),
        Box::new(patches::PatchTrackingPhase),
        Box::new(audio::AudioPhase),
        Box::new(textures::TexturePhase),
        Box::new(models::ModelPhase),
        Box::new(write::WritePhase),
    ]
}
