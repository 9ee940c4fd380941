//! Audio phase: build native audio clips from decoded source files.

use crate::error::FatalError;
use crate::media::audio::{build_clip_object, decode_clip};
use crate::phases::{CompileCx, Phase};
use crate::plan::StagedObject;
use crate::progress::CompileStage;
use forge_bundle::class_id;
use rayon::prelude::*;

pub struct AudioPhase;

impl Phase for AudioPhase {
    fn name(&self) -> &'static str {
        "audio"
    }

    fn stage(&self) -> CompileStage {
        CompileStage::Audio
    }

    fn run(&self, cx: &mut CompileCx<'_>) -> Result<(), FatalError> {
        let entries = cx.audio;
        let total = entries.len() as u32;
        cx.check_cancelled()?;

        // Decoding is independent per entry; id assignment and staging stay
        // sequential so the plan is deterministic.
        let decoded: Vec<_> = entries
            .par_iter()
            .map(|entry| decode_clip(&entry.source))
            .collect();

        for (idx, (entry, result)) in entries.iter().zip(decoded).enumerate() {
            cx.check_cancelled()?;
            cx.emit_progress(
                CompileStage::Audio,
                Some(entry.name.clone()),
                idx as u32 + 1,
                total,
            );

            match result {
                Ok(clip) => {
                    let bytes = build_clip_object(&entry.name, &clip);
                    let path_id = cx.plan.allocate_path_id();
                    cx.plan.stage(StagedObject {
                        name: entry.name.clone(),
                        class_id: class_id::AUDIO_CLIP,
                        type_name: String::new(),
                        container_path: format!("audio/{}", entry.name.to_lowercase()),
                        path_id,
                        bytes,
                    });
                }
                Err(e) => {
                    cx.plan
                        .diagnostic("audio", &entry.mod_id, &entry.name, e.to_string());
                }
            }
        }

        Ok(())
    }
}
