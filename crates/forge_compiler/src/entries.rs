//! Media work items supplied by mods.
//!
//! Each entry names the contributing mod (for diagnostics), the instance
//! name the new object will carry, and the on-disk source file to decode.

use camino::Utf8PathBuf;

/// A new audio clip to construct from a decodable audio file (wav/ogg).
#[derive(Debug, Clone)]
pub struct AudioEntry {
    pub mod_id: String,
    pub name: String,
    pub source: Utf8PathBuf,
}

/// A new texture (plus companion sprite) to construct from an image file.
#[derive(Debug, Clone)]
pub struct TextureEntry {
    pub mod_id: String,
    pub name: String,
    pub source: Utf8PathBuf,
}

/// A new prefab (with meshes and materials) to construct from a glTF scene.
#[derive(Debug, Clone)]
pub struct ModelEntry {
    pub mod_id: String,
    pub name: String,
    pub source: Utf8PathBuf,
}
