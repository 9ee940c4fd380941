//! Texture and sprite construction.

use crate::media::MediaError;
use camino::Utf8Path;
use forge_bundle::aligned;

/// RGBA32 format id in texture objects.
const FORMAT_RGBA32: u32 = 4;

/// Image data decoded from a mod-provided source file.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedTexture {
    pub width: u32,
    pub height: u32,
    /// Tightly packed RGBA8 pixels, row-major.
    pub rgba: Vec<u8>,
}

/// Decode a png/jpeg file to RGBA8.
pub fn decode_texture(path: &Utf8Path) -> Result<DecodedTexture, MediaError> {
    let image = image::open(path.as_std_path())?.to_rgba8();
    let (width, height) = image.dimensions();
    Ok(DecodedTexture {
        width,
        height,
        rgba: image.into_raw(),
    })
}

/// Serialize a native texture object.
///
/// Layout: `m_Name` aligned string, width `u32`, height `u32`, format `u32`
/// (RGBA32), data length `u32`, pixel bytes (inherently 4-aligned).
pub fn build_texture_object(name: &str, texture: &DecodedTexture) -> Vec<u8> {
    let mut out = aligned::encode(name);
    out.extend_from_slice(&texture.width.to_le_bytes());
    out.extend_from_slice(&texture.height.to_le_bytes());
    out.extend_from_slice(&FORMAT_RGBA32.to_le_bytes());
    out.extend_from_slice(&(texture.rgba.len() as u32).to_le_bytes());
    out.extend_from_slice(&texture.rgba);
    out
}

/// Serialize a sprite object covering the full texture.
///
/// Layout: `m_Name` aligned string, texture object id `i64`, then the
/// sprite rect as four `f32` (x, y, width, height).
pub fn build_sprite_object(name: &str, texture_path_id: i64, width: u32, height: u32) -> Vec<u8> {
    let mut out = aligned::encode(name);
    out.extend_from_slice(&texture_path_id.to_le_bytes());
    out.extend_from_slice(&0f32.to_le_bytes());
    out.extend_from_slice(&0f32.to_le_bytes());
    out.extend_from_slice(&(width as f32).to_le_bytes());
    out.extend_from_slice(&(height as f32).to_le_bytes());
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use byteorder::{ByteOrder, LE};
    use camino::Utf8PathBuf;

    #[test]
    fn test_decode_png() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pixel.png");

        let mut img = image::RgbaImage::new(2, 2);
        img.put_pixel(0, 0, image::Rgba([255, 0, 0, 255]));
        img.put_pixel(1, 1, image::Rgba([0, 255, 0, 128]));
        img.save(&path).unwrap();

        let utf8 = Utf8PathBuf::from_path_buf(path).unwrap();
        let texture = decode_texture(&utf8).unwrap();

        assert_eq!(texture.width, 2);
        assert_eq!(texture.height, 2);
        assert_eq!(texture.rgba.len(), 16);
        assert_eq!(&texture.rgba[..4], &[255, 0, 0, 255]);
    }

    #[test]
    fn test_decode_garbage_is_err() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.png");
        std::fs::write(&path, b"not an image at all").unwrap();

        let utf8 = Utf8PathBuf::from_path_buf(path).unwrap();
        assert!(decode_texture(&utf8).is_err());
    }

    #[test]
    fn test_texture_object_layout() {
        let texture = DecodedTexture {
            width: 2,
            height: 1,
            rgba: vec![1, 2, 3, 4, 5, 6, 7, 8],
        };
        let blob = build_texture_object("banner", &texture);

        assert_eq!(aligned::read_string_at(&blob, 0).unwrap(), "banner");
        let base = aligned::aligned_size(6);
        assert_eq!(LE::read_u32(&blob[base..]), 2);
        assert_eq!(LE::read_u32(&blob[base + 4..]), 1);
        assert_eq!(LE::read_u32(&blob[base + 8..]), FORMAT_RGBA32);
        assert_eq!(LE::read_u32(&blob[base + 12..]), 8);
        assert_eq!(&blob[base + 16..], &[1, 2, 3, 4, 5, 6, 7, 8]);
    }

    #[test]
    fn test_sprite_references_texture() {
        let blob = build_sprite_object("banner", 77, 64, 32);

        let base = aligned::aligned_size(6);
        assert_eq!(LE::read_i64(&blob[base..]), 77);
        assert_eq!(LE::read_f32(&blob[base + 16..]), 64.0);
        assert_eq!(LE::read_f32(&blob[base + 20..]), 32.0);
    }
}
