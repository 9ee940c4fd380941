//! Texture phase: build native textures and companion sprites.

use crate::error::FatalError;
use crate::media::texture::{build_sprite_object, build_texture_object, decode_texture};
use crate::phases::{CompileCx, Phase};
use crate::plan::StagedObject;
use crate::progress::CompileStage;
use forge_bundle::class_id;
use rayon::prelude::*;

pub struct TexturePhase;

impl Phase for TexturePhase {
    fn name(&self) -> &'static str {
        "textures"
    }

    fn stage(&self) -> CompileStage {
        CompileStage::Textures
    }

    fn run(&self, cx: &mut CompileCx<'_>) -> Result<(), FatalError> {
        let entries = cx.textures;
        let total = entries.len() as u32;
        cx.check_cancelled()?;

        let decoded: Vec<_> = entries
            .par_iter()
            .map(|entry| decode_texture(&entry.source))
            .collect();

        for (idx, (entry, result)) in entries.iter().zip(decoded).enumerate() {
            cx.check_cancelled()?;
            cx.emit_progress(
                CompileStage::Textures,
                Some(entry.name.clone()),
                idx as u32 + 1,
                total,
            );

            match result {
                Ok(texture) => {
                    let texture_id = cx.plan.allocate_path_id();
                    cx.plan.stage(StagedObject {
                        name: entry.name.clone(),
                        class_id: class_id::TEXTURE_2D,
                        type_name: String::new(),
                        container_path: format!("textures/{}", entry.name.to_lowercase()),
                        path_id: texture_id,
                        bytes: build_texture_object(&entry.name, &texture),
                    });

                    // Each texture gets a full-rect sprite so the engine can
                    // address it from UI templates.
                    let sprite_id = cx.plan.allocate_path_id();
                    cx.plan.stage(StagedObject {
                        name: entry.name.clone(),
                        class_id: class_id::SPRITE,
                        type_name: String::new(),
                        container_path: format!("sprites/{}", entry.name.to_lowercase()),
                        path_id: sprite_id,
                        bytes: build_sprite_object(
                            &entry.name,
                            texture_id,
                            texture.width,
                            texture.height,
                        ),
                    });
                }
                Err(e) => {
                    cx.plan
                        .diagnostic("textures", &entry.mod_id, &entry.name, e.to_string());
                }
            }
        }

        Ok(())
    }
}
