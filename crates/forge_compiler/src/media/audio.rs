//! Audio clip construction.

use crate::media::MediaError;
use camino::Utf8Path;
use forge_bundle::aligned;
use rodio::Source;
use std::fs::File;
use std::io::BufReader;

/// PCM audio decoded from a mod-provided source file.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedClip {
    pub channels: u16,
    pub sample_rate: u32,
    /// Interleaved 16-bit samples.
    pub samples: Vec<i16>,
}

/// Decode a wav/ogg file to interleaved PCM.
pub fn decode_clip(path: &Utf8Path) -> Result<DecodedClip, MediaError> {
    let file = File::open(path.as_std_path())?;
    let decoder = rodio::Decoder::new(BufReader::new(file))?;

    let channels = decoder.channels();
    let sample_rate = decoder.sample_rate();
    let samples: Vec<i16> = decoder.collect();

    Ok(DecodedClip {
        channels,
        sample_rate,
        samples,
    })
}

/// Serialize a native audio clip object.
///
/// Layout: `m_Name` aligned string, channel count `u32`, frequency `u32`,
/// bits per sample `u32` (always 16), sample count `u32`, then the raw
/// sample data padded to a 4-byte boundary.
pub fn build_clip_object(name: &str, clip: &DecodedClip) -> Vec<u8> {
    let mut out = aligned::encode(name);
    out.extend_from_slice(&(clip.channels as u32).to_le_bytes());
    out.extend_from_slice(&clip.sample_rate.to_le_bytes());
    out.extend_from_slice(&16u32.to_le_bytes());
    out.extend_from_slice(&(clip.samples.len() as u32).to_le_bytes());
    for sample in &clip.samples {
        out.extend_from_slice(&sample.to_le_bytes());
    }
    while out.len() % 4 != 0 {
        out.push(0);
    }
    out
}
