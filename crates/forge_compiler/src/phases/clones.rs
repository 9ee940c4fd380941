//! Clone phase: duplicate source objects under new identities.

use crate::error::FatalError;
use crate::phases::{CompileCx, Phase};
use crate::plan::StagedObject;
use crate::progress::CompileStage;
use forge_bundle::aligned::rewrite_identity;
use forge_bundle::class_id;

pub struct ClonePhase;

impl Phase for ClonePhase {
    fn name(&self) -> &'static str {
        "clones"
    }

    fn stage(&self) -> CompileStage {
        CompileStage::Clones
    }

    fn run(&self, cx: &mut CompileCx<'_>) -> Result<(), FatalError> {
        let clones = cx.clones;
        let total = clones.len() as u32;

        for (idx, (template, new_name, request)) in clones.iter().enumerate() {
            cx.check_cancelled()?;
            cx.emit_progress(
                CompileStage::Clones,
                Some(new_name.to_string()),
                idx as u32 + 1,
                total,
            );

            let located = cx
                .lookups
                .get(template)
                .and_then(|lookup| lookup.get(&request.source_name))
                .copied();

            let Some(located) = located else {
                cx.plan.diagnostic(
                    "clones",
                    &request.source_mod,
                    new_name,
                    format!(
                        "source instance '{}' not found for template type '{}'",
                        request.source_name, template
                    ),
                );
                continue;
            };

            // The lookup was built from the directory, so the entry exists.
            let Some(entry) = cx.bundle.entry_by_path_id(located.path_id) else {
                continue;
            };
            let blob = cx.bundle.object_bytes(entry);

            match rewrite_identity(blob, located.name_offset as usize, new_name) {
                Ok(bytes) => {
                    // Fresh id — the source object keeps its own.
                    let path_id = cx.plan.allocate_path_id();
                    tracing::debug!(
                        "Cloned '{}' -> '{}' ({}), id {} -> {}",
                        request.source_name,
                        new_name,
                        template,
                        located.path_id,
                        path_id
                    );
                    cx.plan.stage(StagedObject {
                        name: new_name.to_string(),
                        class_id: class_id::TEMPLATE,
                        type_name: template.to_string(),
                        container_path: format!(
                            "{}/{}",
                            template.to_lowercase(),
                            new_name.to_lowercase()
                        ),
                        path_id,
                        bytes,
                    });
                }
                Err(e) => {
                    cx.plan.diagnostic(
                        "clones",
                        &request.source_mod,
                        new_name,
                        format!("identity rewrite failed: {e}"),
                    );
                }
            }
        }

        Ok(())
    }
}
