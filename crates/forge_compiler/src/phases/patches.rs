//! Patch tracking phase: attach field patches to the plan as metadata.
//!
//! Raw byte cloning does not carry enough schema knowledge to rewrite
//! arbitrary typed fields at unaligned offsets, so this phase never touches
//! object bytes. Every merged patch is tracked — including ones whose
//! target cannot be found — so nothing silently disappears between the
//! merge and the runtime side.

use crate::error::FatalError;
use crate::phases::{CompileCx, Phase};
use crate::plan::TrackedPatch;
use crate::progress::CompileStage;

pub struct PatchTrackingPhase;

impl Phase for PatchTrackingPhase {
    fn name(&self) -> &'static str {
        "patches"
    }

    fn stage(&self) -> CompileStage {
        CompileStage::PatchTracking
    }

    fn run(&self, cx: &mut CompileCx<'_>) -> Result<(), FatalError> {
        let patches = cx.patches;
        let total = patches.len() as u32;

        for (idx, (template, instance, field, patch)) in patches.iter().enumerate() {
            cx.check_cancelled()?;
            cx.emit_progress(
                CompileStage::PatchTracking,
                Some(format!("{instance}.{field}")),
                idx as u32 + 1,
                total,
            );

            let target_exists = cx
                .lookups
                .get(template)
                .is_some_and(|lookup| lookup.get(instance).is_some())
                || cx.plan.staged_instance(template, instance).is_some();

            if !target_exists {
                cx.plan.diagnostic(
                    "patches",
                    &patch.source_mod,
                    instance,
                    format!(
                        "target instance not found for template type '{template}'; \
                         patch kept in metadata"
                    ),
                );
            }

            cx.plan.track_patch(TrackedPatch {
                template_type: template.to_string(),
                instance_name: instance.to_string(),
                field_name: field.to_string(),
                value: patch.value.clone(),
                source_mod: patch.source_mod.clone(),
            });
        }

        tracing::info!("Tracked {} field patch(es)", total);
        Ok(())
    }
}
