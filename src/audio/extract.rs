use std::sync::Arc;
use tracing::debug;

use super::decode::{DecodeCache, DecodedAudio};
use super::source::{AudioSource, SourceId};
use super::wav::encode_pcm16;
use crate::error::ExtractionError;

/// Half-open sample interval `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SampleRange {
    pub start: usize,
    pub end: usize,
}

impl SampleRange {
    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn seconds_to_sample(seconds: f64, sample_rate: u32, total_samples: usize) -> usize {
    if !(seconds > 0.0) {
        return 0;
    }
    let idx = (seconds * sample_rate as f64).floor();
    if idx >= total_samples as f64 {
        total_samples
    } else {
        idx as usize
    }
}

/// `floor(t * sr)` for both ends, clamped to `[0, total_samples]`.
pub fn sample_range(
    start_seconds: f64,
    end_seconds: f64,
    sample_rate: u32,
    total_samples: usize,
) -> Result<SampleRange, ExtractionError> {
    let start = seconds_to_sample(start_seconds, sample_rate, total_samples);
    let end = seconds_to_sample(end_seconds, sample_rate, total_samples);
    if end <= start {
        return Err(ExtractionError::InvalidRange {
            start_sample: start,
            end_sample: end,
        });
    }
    Ok(SampleRange { start, end })
}

/// Exact copy of `range` from every channel, no resampling or windowing.
pub fn slice_channels(decoded: &DecodedAudio, range: SampleRange) -> Vec<&[f32]> {
    decoded
        .channels
        .iter()
        .map(|ch| &ch[range.start..range.end])
        .collect()
}

/// Seam between the region kernel and the concrete extractor so drivers and
/// tests can substitute their own.
pub trait ExtractAudio: Send + Sync {
    fn extract(
        &self,
        source: &AudioSource,
        start_seconds: f64,
        end_seconds: f64,
    ) -> Result<AudioSource, ExtractionError>;

    /// `source` became the open recording.
    fn source_attached(&self, _source: SourceId) {}

    /// `source` is no longer the open recording; drop anything held for it.
    fn source_released(&self, _source: SourceId) {}
}

/// Decodes once per source (through the shared cache), slices, and re-encodes
/// as canonical 16-bit PCM.
#[derive(Debug, Default, Clone)]
pub struct Extractor {
    cache: Arc<DecodeCache>,
}

impl Extractor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_cache(cache: Arc<DecodeCache>) -> Self {
        Self { cache }
    }

    pub fn cache(&self) -> &Arc<DecodeCache> {
        &self.cache
    }

    pub fn decoded(&self, source: &AudioSource) -> Result<Arc<DecodedAudio>, ExtractionError> {
        self.cache.get_or_decode(source)
    }
}

impl ExtractAudio for Extractor {
    fn extract(
        &self,
        source: &AudioSource,
        start_seconds: f64,
        end_seconds: f64,
    ) -> Result<AudioSource, ExtractionError> {
        let decoded = self.decoded(source)?;
        let range = sample_range(
            start_seconds,
            end_seconds,
            decoded.sample_rate,
            decoded.total_samples(),
        )?;
        let slices = slice_channels(&decoded, range);
        let bytes = encode_pcm16(&slices, decoded.sample_rate);
        debug!(
            source = %source.id(),
            start_sample = range.start,
            end_sample = range.end,
            bytes = bytes.len(),
            "extracted region"
        );
        Ok(AudioSource::derived(
            source.id(),
            start_seconds,
            end_seconds,
            bytes,
        ))
    }

    fn source_attached(&self, source: SourceId) {
        self.cache.admit(source);
    }

    fn source_released(&self, source: SourceId) {
        self.cache.evict(source);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn range_uses_floor_and_clamps() {
        let r = sample_range(0.5, 1.25, 8, 100).unwrap();
        assert_eq!(r, SampleRange { start: 4, end: 10 });

        let r = sample_range(-3.0, 1000.0, 8, 100).unwrap();
        assert_eq!(r, SampleRange { start: 0, end: 100 });
    }

    #[test]
    fn collapsed_range_is_invalid() {
        // 0.01s at 8 Hz rounds down to the same sample on both ends.
        assert_eq!(
            sample_range(1.0, 1.01, 8, 100),
            Err(ExtractionError::InvalidRange {
                start_sample: 8,
                end_sample: 8
            })
        );
        assert!(sample_range(20.0, 30.0, 8, 100).is_err());
        assert!(sample_range(f64::NAN, 1.0, 8, 100).is_ok());
    }
}
