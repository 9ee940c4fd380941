//! Bundle compile pipeline for TemplateForge mods.
//!
//! This crate turns the merged output of [`forge_merge`] into one compiled
//! asset bundle. The pipeline is a fixed, ordered sequence of phases:
//!
//! 1. **Lookup** — index every template type the merged sets reference.
//! 2. **Clones** — duplicate source objects and rewrite their identities.
//! 3. **Patch tracking** — attach field patches to the plan as metadata.
//! 4. **Audio** — build native audio clips from decoded audio files.
//! 5. **Textures** — build native textures and sprites from decoded images.
//! 6. **Models** — convert model scenes into meshes, materials and prefabs.
//! 7. **Write** — patch the asset registry and serialize the output bundle.
//!
//! Phases run strictly in order (the write phase depends on ids allocated
//! across phases 2-6). A phase with zero work items is a no-op and never
//! blocks later phases.
//!
//! # Failure policy
//!
//! A single bad item (a clone whose source is missing, a malformed media
//! file, a patch whose target does not exist) is caught at the item
//! boundary, logged with the offending mod and item, recorded as a
//! [`Diagnostic`], and excluded. The phase and the compile continue;
//! partial success still yields a usable bundle. The compile fails
//! wholesale only when the base bundle is unreadable or the output cannot
//! be written. Cancellation is cooperative (checked between phases and
//! items) and leaves no partial output file.

pub mod cancel;
pub mod compiler;
pub mod document;
pub mod entries;
pub mod error;
pub mod media;
pub mod phases;
pub mod plan;
pub mod progress;

pub use cancel::CancelToken;
pub use compiler::{compile, CompileRequest, CompileResult};
pub use document::FieldPatchDocument;
pub use entries::{AudioEntry, ModelEntry, TextureEntry};
pub use error::FatalError;
pub use plan::{CompilePlan, Diagnostic, StagedObject, TrackedPatch};
pub use progress::{CompileProgress, CompileStage, ProgressCallback};
