//! Write phase: patch the asset registry and serialize the output bundle.

use crate::document::FieldPatchDocument;
use crate::error::FatalError;
use crate::phases::{CompileCx, Phase};
use crate::progress::CompileStage;
use camino::Utf8Path;
use forge_bundle::manifest::Manifest;
use forge_bundle::{BundleBuilder, ObjectRecord};

pub struct WritePhase;

impl Phase for WritePhase {
    fn name(&self) -> &'static str {
        "write"
    }

    fn stage(&self) -> CompileStage {
        CompileStage::Write
    }

    fn run(&self, cx: &mut CompileCx<'_>) -> Result<(), FatalError> {
        cx.check_cancelled()?;

        // Patch the registry so every staged object is resolvable.
        let registry_entry = cx
            .bundle
            .entries_of_class(cx.profile.manifest_class_id)
            .next()
            .cloned();

        let mut manifest = match &registry_entry {
            Some(entry) => Manifest::parse(cx.bundle.object_bytes(entry)).map_err(|source| {
                FatalError::MalformedRegistry {
                    path_id: entry.path_id,
                    source,
                }
            })?,
            None => {
                tracing::info!("Base bundle has no asset registry object; creating one");
                Manifest::new("assetregistry")
            }
        };

        for staged in cx.plan.staged() {
            manifest.register(&staged.container_path, staged.path_id, staged.class_id);
        }
        let manifest_bytes = manifest.to_bytes();

        let registry_path_id = match &registry_entry {
            Some(entry) => entry.path_id,
            None => cx.plan.allocate_path_id(),
        };

        let mut builder = BundleBuilder::new(cx.bundle.engine_version());

        if let Some(layouts) = cx.bundle.type_layouts() {
            let mut sorted: Vec<(&String, &u32)> = layouts.iter().collect();
            sorted.sort();
            for (type_name, name_offset) in sorted {
                builder = builder.with_type_layout(type_name, *name_offset);
            }
        }

        // Pass-through originals, with the registry object swapped for its
        // patched bytes.
        for entry in cx.bundle.entries() {
            let bytes = if registry_entry.is_some() && entry.path_id == registry_path_id {
                manifest_bytes.clone()
            } else {
                cx.bundle.object_bytes(entry).to_vec()
            };
            builder = builder.with_object(ObjectRecord {
                path_id: entry.path_id,
                class_id: entry.class_id,
                type_name: entry.type_name.clone(),
                container_path: entry.container_path.clone(),
                bytes,
            });
        }

        if registry_entry.is_none() {
            builder = builder.with_object(ObjectRecord {
                path_id: registry_path_id,
                class_id: cx.profile.manifest_class_id,
                type_name: String::new(),
                container_path: "assetregistry".to_string(),
                bytes: manifest_bytes,
            });
        }

        for staged in cx.plan.staged() {
            builder = builder.with_object(ObjectRecord {
                path_id: staged.path_id,
                class_id: staged.class_id,
                type_name: staged.type_name.clone(),
                container_path: staged.container_path.clone(),
                bytes: staged.bytes.clone(),
            });
        }

        // Last gate before any output IO; after this point the compile
        // runs to completion.
        cx.check_cancelled()?;
        write_output(cx, builder)
    }
}

/// Write the bundle to a temporary file and rename it into place, together
/// with the sibling patch document. A failed rename removes the document so
/// no half-published output remains.
fn write_output(cx: &CompileCx<'_>, builder: BundleBuilder) -> Result<(), FatalError> {
    let output = cx.output;
    let output_write = |message: String| FatalError::OutputWrite {
        path: output.to_path_buf(),
        message,
    };

    let parent = output.parent().unwrap_or_else(|| Utf8Path::new("."));
    std::fs::create_dir_all(parent.as_std_path()).map_err(|e| output_write(e.to_string()))?;

    let mut temp = tempfile::NamedTempFile::new_in(parent.as_std_path())
        .map_err(|e| output_write(e.to_string()))?;
    builder
        .build_to_writer(temp.as_file_mut())
        .map_err(|e| output_write(e.to_string()))?;

    let document_path = FieldPatchDocument::sibling_path(output);
    FieldPatchDocument::new(cx.plan.tracked_patches().to_vec()).save(&document_path)?;

    if let Err(e) = temp.persist(output.as_std_path()) {
        let _ = std::fs::remove_file(document_path.as_std_path());
        return Err(output_write(e.to_string()));
    }

    tracing::info!(
        "Wrote bundle {} ({} staged object(s), {} tracked patch(es))",
        output,
        cx.plan.staged().len(),
        cx.plan.tracked_patches().len()
    );
    Ok(())
}
