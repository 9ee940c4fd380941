//! Length-prefixed, 4-byte-aligned string fields inside opaque object blobs.
//!
//! Serialized template objects store their string fields as a `u32`
//! little-endian length prefix followed by the UTF-8 bytes, padded with
//! zeroes to the next 4-byte boundary. Everything around such a field is
//! treated as an opaque byte stream: patching a field to a value of a
//! different length shifts every later byte of the object by exactly the
//! aligned-size delta.
//!
//! All patching functions are pure — they never mutate their input and
//! return a freshly allocated blob. Failures (out-of-range offset, truncated
//! field) are reported as [`BundleError`] values, never panics.

use crate::error::{BundleError, Result};
use byteorder::{ByteOrder, LE};

/// On-disk size of an aligned string with `len` content bytes:
/// the 4-byte length prefix, the bytes, and zero padding to the next
/// 4-byte boundary.
pub fn aligned_size(len: usize) -> usize {
    4 + len + (4 - len % 4) % 4
}

/// Read the aligned string at `offset`.
///
/// Trailing padding is ignored. Errors when the blob is empty, the offset is
/// out of range, the length prefix points past the end of the blob, or the
/// bytes are not valid UTF-8.
pub fn read_string_at(blob: &[u8], offset: usize) -> Result<String> {
    if blob.is_empty() {
        return Err(BundleError::EmptyBlob);
    }
    if offset + 4 > blob.len() {
        return Err(BundleError::OffsetOutOfRange {
            offset,
            len: blob.len(),
        });
    }

    let len = LE::read_u32(&blob[offset..offset + 4]) as usize;
    if offset + 4 + len > blob.len() {
        return Err(BundleError::TruncatedString { offset, len });
    }

    String::from_utf8(blob[offset + 4..offset + 4 + len].to_vec())
        .map_err(|_| BundleError::InvalidUtf8 { offset })
}

/// Encode `value` as an aligned string field.
pub fn encode(value: &str) -> Vec<u8> {
    let bytes = value.as_bytes();
    let mut out = Vec::with_capacity(aligned_size(bytes.len()));
    out.extend_from_slice(&(bytes.len() as u32).to_le_bytes());
    out.extend_from_slice(bytes);
    out.resize(aligned_size(bytes.len()), 0);
    out
}

/// Replace the aligned string at `offset` with `new_value`.
///
/// The output is `blob[..offset]` unchanged, the newly encoded field, then
/// the old field's tail `blob[offset + old_aligned..]` unchanged. The total
/// length changes by `aligned_size(new) - aligned_size(old)`.
pub fn patch_string_at(blob: &[u8], offset: usize, new_value: &str) -> Result<Vec<u8>> {
    if blob.is_empty() {
        return Err(BundleError::EmptyBlob);
    }
    if offset + 4 > blob.len() {
        return Err(BundleError::OffsetOutOfRange {
            offset,
            len: blob.len(),
        });
    }

    let old_len = LE::read_u32(&blob[offset..offset + 4]) as usize;
    let old_aligned = aligned_size(old_len);
    if offset + old_aligned > blob.len() {
        return Err(BundleError::TruncatedString {
            offset,
            len: old_len,
        });
    }

    let encoded = encode(new_value);
    let mut out = Vec::with_capacity(blob.len() - old_aligned + encoded.len());
    out.extend_from_slice(&blob[..offset]);
    out.extend_from_slice(&encoded);
    out.extend_from_slice(&blob[offset + old_aligned..]);
    Ok(out)
}

/// Rewrite both identity fields of a template object blob to `new_value`.
///
/// Template objects carry two consecutive identity strings, `m_Name` and
/// `m_ID`, with `m_Name` at `name_offset` and `m_ID` immediately after it.
/// The blob is one contiguous stream, so patching `m_Name` shifts `m_ID` by
/// the aligned-size delta; the second patch targets the recomputed offset.
/// Bytes after `m_ID` come through byte-identical.
pub fn rewrite_identity(blob: &[u8], name_offset: usize, new_value: &str) -> Result<Vec<u8>> {
    // Validate the original layout before touching anything, so a malformed
    // blob errors without producing a half-patched output.
    let old_name_len = {
        let name = read_string_at(blob, name_offset)?;
        name.len()
    };
    let old_id_offset = name_offset + aligned_size(old_name_len);
    read_string_at(blob, old_id_offset)?;

    let patched = patch_string_at(blob, name_offset, new_value)?;

    // m_Name grew or shrank by delta; m_ID now sits after the new field.
    let new_id_offset = name_offset + aligned_size(new_value.len());
    patch_string_at(&patched, new_id_offset, new_value)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Blob with `m_Name`/`m_ID` at `name_offset` after an opaque header,
    /// followed by a trailing sentinel.
    fn identity_blob(header: &[u8], name: &str, id: &str, sentinel: &[u8]) -> Vec<u8> {
        let mut blob = header.to_vec();
        blob.extend_from_slice(&encode(name));
        blob.extend_from_slice(&encode(id));
        blob.extend_from_slice(sentinel);
        blob
    }

    #[test]
    fn test_aligned_size_law() {
        assert_eq!(aligned_size(4), 8);
        assert_eq!(aligned_size(5), 12);
        assert_eq!(aligned_size(8), 12);
        assert_eq!(aligned_size(13), 20);
    }

    #[test]
    fn test_aligned_size_zero() {
        assert_eq!(aligned_size(0), 4);
    }

    #[test]
    fn test_read_ignores_padding() {
        let mut blob = encode("abcde");
        assert_eq!(blob.len(), 12);
        // Dirty the padding; the read must not care.
        blob[9] = 0xFF;
        assert_eq!(read_string_at(&blob, 0).unwrap(), "abcde");
    }

    #[test]
    fn test_same_length_patch_keeps_total_length() {
        let blob = identity_blob(&[0u8; 12], "grunt_soldier", "grunt_soldier", &[0xEE; 8]);
        let original_len = blob.len();

        let patched = patch_string_at(&blob, 12, "elite_soldier").unwrap();
        assert_eq!(patched.len(), original_len);
        assert_eq!(&patched[..12], &blob[..12]);
        assert_eq!(read_string_at(&patched, 12).unwrap(), "elite_soldier");
    }

    #[test]
    fn test_shrink() {
        let blob = identity_blob(&[0u8; 12], "grunt_soldier", "grunt_soldier", &[0xEE; 8]);
        let patched = patch_string_at(&blob, 12, "grunt").unwrap();

        assert_eq!(blob.len() - patched.len(), aligned_size(13) - aligned_size(5));
        assert_eq!(read_string_at(&patched, 12).unwrap(), "grunt");
    }

    #[test]
    fn test_grow() {
        let name = "grunt_soldier"; // 13 chars
        let replacement = "n".repeat(39);
        let blob = identity_blob(&[0u8; 12], name, name, &[0xEE; 8]);

        let patched = patch_string_at(&blob, 12, &replacement).unwrap();
        assert_eq!(patched.len() - blob.len(), aligned_size(39) - aligned_size(13));
        assert_eq!(read_string_at(&patched, 12).unwrap(), replacement);
    }

    #[test]
    fn test_tail_is_opaque_passthrough() {
        let sentinel = [0xDE, 0xAD, 0xBE, 0xEF, 0x01, 0x02, 0x03, 0x04];
        let blob = identity_blob(&[0u8; 12], "old_name", "old_name", &sentinel);

        let patched = patch_string_at(&blob, 12, "replacement_x").unwrap();
        assert_eq!(&patched[patched.len() - sentinel.len()..], &sentinel);
    }

    #[test]
    fn test_sequential_identity_rewrite() {
        let sentinel = [0xDE, 0xAD, 0xBE, 0xEF];
        let blob = identity_blob(&[0u8; 12], "grunt_soldier", "grunt_soldier", &sentinel);

        let new_name = "boss_grunt";
        let rewritten = rewrite_identity(&blob, 12, new_name).unwrap();

        assert_eq!(read_string_at(&rewritten, 12).unwrap(), new_name);
        let id_offset = 12 + aligned_size(new_name.len());
        assert_eq!(read_string_at(&rewritten, id_offset).unwrap(), new_name);

        // Header and trailing sentinel byte-identical.
        assert_eq!(&rewritten[..12], &blob[..12]);
        assert_eq!(&rewritten[rewritten.len() - sentinel.len()..], &sentinel);

        // Total delta is twice the per-field delta.
        let delta = aligned_size(new_name.len()) as i64 - aligned_size(13) as i64;
        assert_eq!(rewritten.len() as i64 - blob.len() as i64, 2 * delta);
    }

    #[test]
    fn test_identity_rewrite_growing_name() {
        let blob = identity_blob(&[0xABu8; 12], "ant", "ant", &[0x77; 4]);
        let rewritten = rewrite_identity(&blob, 12, "a_considerably_longer_name").unwrap();

        assert_eq!(read_string_at(&rewritten, 12).unwrap(), "a_considerably_longer_name");
        let id_offset = 12 + aligned_size(26);
        assert_eq!(
            read_string_at(&rewritten, id_offset).unwrap(),
            "a_considerably_longer_name"
        );
        assert_eq!(&rewritten[rewritten.len() - 4..], &[0x77; 4]);
    }

    #[test]
    fn test_out_of_range_offset_is_err_not_panic() {
        let blob = encode("abc");
        let input_copy = blob.clone();

        assert!(matches!(
            patch_string_at(&blob, 4096, "x"),
            Err(BundleError::OffsetOutOfRange { .. })
        ));
        assert!(matches!(
            read_string_at(&blob, 4096),
            Err(BundleError::OffsetOutOfRange { .. })
        ));
        // Input untouched.
        assert_eq!(blob, input_copy);
    }

    #[test]
    fn test_empty_blob_is_err() {
        assert!(matches!(read_string_at(&[], 0), Err(BundleError::EmptyBlob)));
        assert!(matches!(
            patch_string_at(&[], 0, "x"),
            Err(BundleError::EmptyBlob)
        ));
    }

    #[test]
    fn test_truncated_length_prefix_is_err() {
        // Length prefix claims 100 bytes, blob has 4.
        let blob = 100u32.to_le_bytes().to_vec();
        assert!(matches!(
            read_string_at(&blob, 0),
            Err(BundleError::TruncatedString { .. })
        ));
        assert!(matches!(
            patch_string_at(&blob, 0, "x"),
            Err(BundleError::TruncatedString { .. })
        ));
    }

    #[test]
    fn test_encode_roundtrip_lengths() {
        for value in ["", "a", "abcd", "abcde", "thirteen_char"] {
            let encoded = encode(value);
            assert_eq!(encoded.len(), aligned_size(value.len()));
            assert_eq!(read_string_at(&encoded, 0).unwrap(), value);
        }
    }
}
