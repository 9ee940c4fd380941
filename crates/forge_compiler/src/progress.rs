//! Progress reporting for compile runs.

use serde::Serialize;
use std::sync::Arc;

/// Stages of the compile pipeline, emitted in declaration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum CompileStage {
    Lookup,
    Clones,
    PatchTracking,
    Audio,
    Textures,
    Models,
    Write,
    Complete,
}

/// Progress information emitted during a compile.
///
/// Serializable so front-ends can forward it to a UI. The `current`/`total`
/// pair counts work items within the reported stage and is `0/0` for
/// stage-boundary events.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompileProgress {
    pub stage: CompileStage,
    /// Item being processed (instance name, media name), when applicable.
    pub current_item: Option<String>,
    pub current: u32,
    pub total: u32,
}

/// Callback invoked with progress updates.
pub type ProgressCallback = Arc<dyn Fn(CompileProgress) + Send + Sync>;
