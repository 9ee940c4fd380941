//! Native media object construction.
//!
//! Unlike template clones (raw byte duplication), new media objects are
//! built schema-aware: each builder decodes a disk source into an
//! intermediate form and serializes a complete native object blob from
//! scratch.

pub mod audio;
pub mod model;
pub mod texture;

use thiserror::Error;

/// A media source that could not be decoded or converted.
///
/// Always handled at the item boundary: the failing entry becomes a
/// diagnostic and the phase continues.
#[derive(Error, Debug)]
pub enum MediaError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("audio decode error: {0}")]
    Audio(#[from] rodio::decoder::DecoderError),

    #[error("image decode error: {0}")]
    Image(#[from] image::ImageError),

    #[error("model parse error: {0}")]
    Model(#[from] gltf::Error),

    #[error("scene contains no meshes")]
    EmptyScene,
}
