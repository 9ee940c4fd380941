//! Model phase: convert scene graphs into meshes, materials and prefabs.

use crate::error::FatalError;
use crate::media::model::{
    build_material_object, build_mesh_object, build_prefab_object, load_scene,
};
use crate::phases::{CompileCx, Phase};
use crate::plan::StagedObject;
use crate::progress::CompileStage;
use forge_bundle::class_id;
use rayon::prelude::*;

pub struct ModelPhase;

impl Phase for ModelPhase {
    fn name(&self) -> &'static str {
        "models"
    }

    fn stage(&self) -> CompileStage {
        CompileStage::Models
    }

    fn run(&self, cx: &mut CompileCx<'_>) -> Result<(), FatalError> {
        let entries = cx.models;
        let total = entries.len() as u32;
        cx.check_cancelled()?;

        let scenes: Vec<_> = entries
            .par_iter()
            .map(|entry| load_scene(&entry.source))
            .collect();

        for (idx, (entry, result)) in entries.iter().zip(scenes).enumerate() {
            cx.check_cancelled()?;
            cx.emit_progress(
                CompileStage::Models,
                Some(entry.name.clone()),
                idx as u32 + 1,
                total,
            );

            let scene = match result {
                Ok(scene) => scene,
                Err(e) => {
                    cx.plan
                        .diagnostic("models", &entry.mod_id, &entry.name, e.to_string());
                    continue;
                }
            };

            let entry_slug = entry.name.to_lowercase();

            let mesh_ids: Vec<i64> = scene
                .meshes
                .iter()
                .map(|mesh| {
                    let path_id = cx.plan.allocate_path_id();
                    cx.plan.stage(StagedObject {
                        name: mesh.name.clone(),
                        class_id: class_id::MESH,
                        type_name: String::new(),
                        container_path: format!(
                            "meshes/{entry_slug}/{}",
                            mesh.name.to_lowercase()
                        ),
                        path_id,
                        bytes: build_mesh_object(mesh),
                    });
                    path_id
                })
                .collect();

            let material_ids: Vec<i64> = scene
                .materials
                .iter()
                .map(|material| {
                    let path_id = cx.plan.allocate_path_id();
                    cx.plan.stage(StagedObject {
                        name: material.name.clone(),
                        class_id: class_id::MATERIAL,
                        type_name: String::new(),
                        container_path: format!(
                            "materials/{entry_slug}/{}",
                            material.name.to_lowercase()
                        ),
                        path_id,
                        bytes: build_material_object(material),
                    });
                    path_id
                })
                .collect();

            let prefab_id = cx.plan.allocate_path_id();
            cx.plan.stage(StagedObject {
                name: entry.name.clone(),
                class_id: class_id::PREFAB,
                type_name: String::new(),
                container_path: format!("prefabs/{entry_slug}"),
                path_id: prefab_id,
                bytes: build_prefab_object(&entry.name, &scene.nodes, &mesh_ids, &material_ids),
            });

            tracing::debug!(
                "Converted model '{}': {} mesh(es), {} material(s), {} node(s)",
                entry.name,
                mesh_ids.len(),
                material_ids.len(),
                scene.nodes.len()
            );
        }

        Ok(())
    }
}
