//! The compile entry point.

use crate::cancel::CancelToken;
use crate::entries::{AudioEntry, ModelEntry, TextureEntry};
use crate::error::FatalError;
use crate::phases::{pipeline, CompileCx};
use crate::plan::{CompilePlan, Diagnostic};
use crate::progress::{CompileProgress, CompileStage, ProgressCallback};
use camino::Utf8PathBuf;
use forge_bundle::{Bundle, EngineProfile};
use forge_merge::{MergedCloneSet, MergedPatchSet};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Everything one compile invocation needs.
///
/// Build with [`new`](Self::new), fill the merged sets and media entries,
/// then pass to [`compile`]. The whole request is consumed per invocation;
/// nothing is cached across compiles.
pub struct CompileRequest {
    pub merged_patches: MergedPatchSet,
    pub merged_clones: MergedCloneSet,
    pub audio: Vec<AudioEntry>,
    pub textures: Vec<TextureEntry>,
    pub models: Vec<ModelEntry>,
    pub base_bundle: Utf8PathBuf,
    /// Target engine version; selects the [`EngineProfile`] and thereby the
    /// locator strategy.
    pub engine_version: String,
    pub output: Utf8PathBuf,
    /// Extra engine profiles consulted before the built-in table.
    pub profile_overrides: Vec<EngineProfile>,
    pub cancel: CancelToken,
    pub progress: Option<ProgressCallback>,
}

impl CompileRequest {
    pub fn new(base_bundle: Utf8PathBuf, engine_version: &str, output: Utf8PathBuf) -> Self {
        Self {
            merged_patches: MergedPatchSet::default(),
            merged_clones: MergedCloneSet::default(),
            audio: Vec::new(),
            textures: Vec::new(),
            models: Vec::new(),
            base_bundle,
            engine_version: engine_version.to_string(),
            output,
            profile_overrides: Vec::new(),
            cancel: CancelToken::new(),
            progress: None,
        }
    }

    /// Register a progress callback.
    pub fn with_progress<F>(mut self, callback: F) -> Self
    where
        F: Fn(CompileProgress) + Send + Sync + 'static,
    {
        self.progress = Some(Arc::new(callback));
        self
    }

    /// Use an externally supplied cancellation token.
    pub fn with_cancel(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }
}

/// Outcome of a compile that produced an output file.
///
/// `success` is `true` only for a clean run. A partial run (`success ==
/// false`, non-empty `diagnostics`) still produced a usable bundle at
/// `output_path`; fatal failures return [`FatalError`] instead and leave no
/// output.
#[derive(Debug)]
pub struct CompileResult {
    pub success: bool,
    pub diagnostics: Vec<Diagnostic>,
    pub output_path: Utf8PathBuf,
}

/// Run the full compile pipeline.
///
/// See the crate docs for the phase sequence and failure policy.
pub fn compile(request: CompileRequest) -> Result<CompileResult, FatalError> {
    let start = std::time::Instant::now();

    let profile =
        EngineProfile::resolve_with_overrides(&request.engine_version, &request.profile_overrides)
            .map_err(|_| FatalError::UnknownEngineVersion(request.engine_version.clone()))?;

    let bundle = Bundle::mount_from_file(&request.base_bundle).map_err(|source| {
        FatalError::BaseBundle {
            path: request.base_bundle.clone(),
            source,
        }
    })?;

    tracing::info!(
        "Compiling {} -> {} (engine {}): {} patch(es), {} clone(s), {} audio, {} texture(s), {} model(s)",
        request.base_bundle,
        request.output,
        request.engine_version,
        request.merged_patches.len(),
        request.merged_clones.len(),
        request.audio.len(),
        request.textures.len(),
        request.models.len()
    );

    let mut cx = CompileCx {
        bundle: &bundle,
        profile: &profile,
        patches: &request.merged_patches,
        clones: &request.merged_clones,
        audio: &request.audio,
        textures: &request.textures,
        models: &request.models,
        output: &request.output,
        lookups: BTreeMap::new(),
        plan: CompilePlan::new(bundle.max_path_id()),
        cancel: request.cancel.clone(),
        progress: request.progress.clone(),
    };

    for phase in pipeline() {
        cx.check_cancelled()?;
        tracing::debug!("Running phase '{}'", phase.name());
        cx.emit_progress(phase.stage(), None, 0, 0);
        phase.run(&mut cx)?;
    }

    cx.emit_progress(CompileStage::Complete, None, 0, 0);
    let diagnostics = cx.plan.into_diagnostics();

    tracing::info!(
        "Compile finished in {} ms: {} diagnostic(s)",
        start.elapsed().as_millis(),
        diagnostics.len()
    );

    Ok(CompileResult {
        success: diagnostics.is_empty(),
        diagnostics,
        output_path: request.output,
    })
}
