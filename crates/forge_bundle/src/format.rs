//! On-disk bundle records.
//!
//! Layout of a bundle file (all integers little-endian):
//!
//! ```text
//! magic            8 bytes  "TFBUNDLE"
//! format version   u32
//! engine version   length-prefixed string
//! flags            u32      bit 0: type-metadata block present
//! object count     u32
//! directory        object count x ObjectEntry
//! type metadata    (optional) u32 count + TypeLayoutRecord records
//! content block    raw object bytes; directory offsets are absolute
//! ```

use binrw::binrw;

/// Bundle file magic.
pub const BUNDLE_MAGIC: [u8; 8] = *b"TFBUNDLE";

/// Current bundle format version.
pub const FORMAT_VERSION: u32 = 1;

/// Header flag: a type-metadata block follows the directory.
pub const FLAG_TYPE_METADATA: u32 = 1;

/// Engine-native class ids.
///
/// These identify what kind of object a directory entry holds. Template
/// (script-backed) objects all share [`class_id::TEMPLATE`] and are told
/// apart by their `type_name`.
pub mod class_id {
    /// Script-backed template object; `type_name` carries the template type.
    pub const TEMPLATE: u32 = 114;
    /// Native audio clip.
    pub const AUDIO_CLIP: u32 = 83;
    /// Native 2D texture.
    pub const TEXTURE_2D: u32 = 28;
    /// Sprite referencing a texture.
    pub const SPRITE: u32 = 213;
    /// Native mesh.
    pub const MESH: u32 = 43;
    /// Native material.
    pub const MATERIAL: u32 = 21;
    /// Prefab node hierarchy.
    pub const PREFAB: u32 = 1;
    /// The asset registry ("manifest") object the engine consults to
    /// resolve instances by name at load time. One per bundle.
    pub const ASSET_REGISTRY: u32 = 142;
}

/// One directory record describing an object in the content block.
#[binrw]
#[brw(little)]
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ObjectEntry {
    /// Bundle-unique object id. Clones and new media objects get freshly
    /// allocated ids above the base bundle's watermark.
    pub path_id: i64,

    /// Engine class id (see [`class_id`]).
    pub class_id: u32,

    /// Template type name for [`class_id::TEMPLATE`] objects; empty for
    /// engine-native classes.
    #[br(temp)]
    #[bw(calc = type_name.len() as u32)]
    type_name_len: u32,
    #[br(count = type_name_len, try_map = String::from_utf8)]
    #[bw(map = |s| s.as_bytes().to_vec())]
    pub type_name: String,

    /// Container path the engine uses to address the object
    /// (e.g. `"unittemplate/grunt"`). Distinct from the identity name
    /// stored *inside* template blobs.
    #[br(temp)]
    #[bw(calc = container_path.len() as u32)]
    container_path_len: u32,
    #[br(count = container_path_len, try_map = String::from_utf8)]
    #[bw(map = |s| s.as_bytes().to_vec())]
    pub container_path: String,

    /// Absolute byte offset of the object in the bundle file.
    pub offset: u64,
    /// Object size in bytes.
    pub size: u64,
    /// xxh3 checksum of the object bytes.
    pub checksum: u64,
}

/// Per-type layout info from the embedded type-metadata block.
///
/// `name_offset` is the byte offset of `m_Name` inside blobs of this type,
/// i.e. the size of the type's leading header. Only present on engine
/// versions that embed schema metadata.
#[binrw]
#[brw(little)]
#[derive(Debug, Clone, PartialEq)]
pub struct TypeLayoutRecord {
    #[br(temp)]
    #[bw(calc = type_name.len() as u32)]
    type_name_len: u32,
    #[br(count = type_name_len, try_map = String::from_utf8)]
    #[bw(map = |s| s.as_bytes().to_vec())]
    pub type_name: String,

    pub name_offset: u32,
}
