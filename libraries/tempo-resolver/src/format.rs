//! Encoding selection
//!
//! Upstream returns muxed and adaptive encodings in two lists. Selection
//! merges them, keeps the audio ones and prefers the highest bitrate.

use crate::types::{Encoding, StreamingData};

/// Merge `formats` and `adaptiveFormats` into one list, dropping unusable
/// entries. Upstream order is kept: muxed first, then adaptive.
pub fn merge_formats(data: &StreamingData) -> Vec<Encoding> {
    data.formats
        .iter()
        .chain(data.adaptive_formats.iter())
        .filter_map(Encoding::from_raw)
        .collect()
}

/// Highest-bitrate audio encoding; on ties the earliest entry wins
pub fn select_best_audio(encodings: &[Encoding]) -> Option<&Encoding> {
    encodings
        .iter()
        .filter(|e| e.is_audio())
        .fold(None, |best: Option<&Encoding>, candidate| match best {
            Some(current) if current.bitrate >= candidate.bitrate => Some(current),
            _ => Some(candidate),
        })
}

/// Sort by descending bitrate, keeping upstream order for equal bitrates
pub fn rank_by_bitrate(encodings: &mut [Encoding]) {
    encodings.sort_by(|a, b| b.bitrate.cmp(&a.bitrate));
}

/// Filter over encodings by codec and bitrate
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormatFilter {
    /// Substring the MIME type must contain, e.g. `mp4a`
    pub codec: Option<String>,
    /// Minimum bitrate in bits per second
    pub min_bitrate: u64,
    /// Only keep audio encodings
    pub audio_only: bool,
}

impl FormatFilter {
    /// AAC audio at 128 kbit/s or better
    pub fn best_audio() -> Self {
        Self {
            codec: Some("mp4a".into()),
            min_bitrate: 128_000,
            audio_only: true,
        }
    }

    pub fn matches(&self, encoding: &Encoding) -> bool {
        if self.audio_only && !encoding.is_audio() {
            return false;
        }
        if encoding.bitrate < self.min_bitrate {
            return false;
        }
        match &self.codec {
            Some(codec) => encoding.mime_type.contains(codec.as_str()),
            None => true,
        }
    }
}

/// Encodings accepted by `filter`, in input order
pub fn filter_formats<'a>(encodings: &'a [Encoding], filter: &FormatFilter) -> Vec<&'a Encoding> {
    encodings.iter().filter(|e| filter.matches(e)).collect()
}
