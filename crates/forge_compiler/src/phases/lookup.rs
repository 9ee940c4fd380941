//! Lookup phase: index every template type the merged sets reference.

use crate::error::FatalError;
use crate::phases::{CompileCx, Phase};
use crate::progress::CompileStage;
use forge_bundle::{build_lookup, lookup_fingerprint};
use std::collections::BTreeSet;

pub struct LookupPhase;

impl Phase for LookupPhase {
    fn name(&self) -> &'static str {
        "lookup"
    }

    fn stage(&self) -> CompileStage {
        CompileStage::Lookup
    }

    fn run(&self, cx: &mut CompileCx<'_>) -> Result<(), FatalError> {
        let mut types: BTreeSet<&str> = cx.clones.template_types().collect();
        types.extend(cx.patches.template_types());

        let total = types.len() as u32;

        for (idx, template_type) in types.into_iter().enumerate() {
            cx.check_cancelled()?;
            cx.emit_progress(
                CompileStage::Lookup,
                Some(template_type.to_string()),
                idx as u32 + 1,
                total,
            );

            let lookup = build_lookup(cx.bundle, template_type, cx.profile);
            tracing::info!(
                "Indexed template type '{}': {} instances, fingerprint {:016x}",
                template_type,
                lookup.len(),
                lookup_fingerprint(&lookup)
            );
            cx.lookups.insert(template_type.to_string(), lookup);
        }

        Ok(())
    }
}
