use std::collections::{HashMap, HashSet};
use std::io::Cursor;
use std::sync::{Arc, Mutex};
use tracing::debug;

use super::source::{AudioInfo, AudioSource, SourceId};
use crate::error::ExtractionError;

/// Per-channel float samples at the source's native rate.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedAudio {
    pub channels: Vec<Vec<f32>>,
    pub sample_rate: u32,
}

impl DecodedAudio {
    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    pub fn total_samples(&self) -> usize {
        self.channels.first().map(|c| c.len()).unwrap_or(0)
    }

    pub fn duration_seconds(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.total_samples() as f64 / self.sample_rate as f64
    }

    /// Channel average over `[start, end)` samples, clamped to the buffer.
    pub fn mono_range(&self, start: usize, end: usize) -> Vec<f32> {
        let total = self.total_samples();
        let start = start.min(total);
        let end = end.min(total).max(start);
        let count = self.channel_count().max(1) as f32;
        (start..end)
            .map(|i| self.channels.iter().map(|ch| ch[i]).sum::<f32>() / count)
            .collect()
    }
}

fn decode_err(e: hound::Error) -> ExtractionError {
    ExtractionError::Decode(e.to_string())
}

pub fn read_info(bytes: &[u8]) -> Result<AudioInfo, ExtractionError> {
    let reader = hound::WavReader::new(Cursor::new(bytes)).map_err(decode_err)?;
    let spec = reader.spec();
    if spec.sample_rate == 0 {
        return Err(ExtractionError::Decode("unknown sample rate".to_string()));
    }
    Ok(AudioInfo {
        channels: spec.channels,
        sample_rate: spec.sample_rate,
        total_samples: reader.duration() as usize,
    })
}

pub fn decode(bytes: &[u8]) -> Result<DecodedAudio, ExtractionError> {
    let mut reader = hound::WavReader::new(Cursor::new(bytes)).map_err(decode_err)?;
    let spec = reader.spec();
    if spec.sample_rate == 0 {
        return Err(ExtractionError::Decode("unknown sample rate".to_string()));
    }
    let channel_count = spec.channels.max(1) as usize;
    let frames = reader.duration() as usize;
    let mut channels = vec![Vec::with_capacity(frames); channel_count];

    match spec.sample_format {
        hound::SampleFormat::Float => {
            for (i, sample) in reader.samples::<f32>().enumerate() {
                channels[i % channel_count].push(sample.map_err(decode_err)?);
            }
        }
        hound::SampleFormat::Int => {
            let bits = spec.bits_per_sample.clamp(1, 32) as u32;
            let scale = 1.0 / (1u64 << (bits - 1)) as f64;
            for (i, sample) in reader.samples::<i32>().enumerate() {
                let v = sample.map_err(decode_err)?;
                channels[i % channel_count].push((v as f64 * scale) as f32);
            }
        }
    }

    // A trailing partial frame is dropped so every channel has equal length.
    let complete = channels.iter().map(|c| c.len()).min().unwrap_or(0);
    for ch in channels.iter_mut() {
        ch.truncate(complete);
    }
    sanitize_non_finite(&mut channels);

    debug!(
        sample_rate = spec.sample_rate,
        channels = channel_count,
        frames = complete,
        "decoded audio"
    );
    Ok(DecodedAudio {
        channels,
        sample_rate: spec.sample_rate,
    })
}

fn sanitize_non_finite(channels: &mut [Vec<f32>]) {
    let mut replaced = 0usize;
    for ch in channels.iter_mut() {
        for v in ch.iter_mut() {
            if !v.is_finite() {
                *v = 0.0;
                replaced += 1;
            }
        }
    }
    if replaced > 0 {
        debug!(replaced, "replaced non-finite samples");
    }
}

/// Session-scoped cache of decoded buffers. Entries are shared read-only
/// between the extractor and the inference pipeline.
///
/// An evicted source stays retired: a decode still running for it when it
/// was evicted does not re-populate the cache. `admit` lifts that.
#[derive(Debug, Default)]
pub struct DecodeCache {
    entries: Mutex<CacheEntries>,
}

#[derive(Debug, Default)]
struct CacheEntries {
    decoded: HashMap<SourceId, Arc<DecodedAudio>>,
    retired: HashSet<SourceId>,
}

impl DecodeCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: SourceId) -> Option<Arc<DecodedAudio>> {
        self.entries.lock().ok()?.decoded.get(&id).cloned()
    }

    pub fn get_or_decode(&self, source: &AudioSource) -> Result<Arc<DecodedAudio>, ExtractionError> {
        if let Some(hit) = self.get(source.id()) {
            return Ok(hit);
        }
        // Decode outside the lock; a racing decode of the same source just
        // produces an identical buffer.
        let decoded = Arc::new(decode(source.bytes())?);
        if let Ok(mut entries) = self.entries.lock() {
            if !entries.retired.contains(&source.id()) {
                entries
                    .decoded
                    .entry(source.id())
                    .or_insert_with(|| decoded.clone());
            }
        }
        Ok(decoded)
    }

    /// Allows `id` to be cached again after an `evict`.
    pub fn admit(&self, id: SourceId) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.retired.remove(&id);
        }
    }

    /// Drops the decoded buffer for `id` and retires it.
    pub fn evict(&self, id: SourceId) -> bool {
        let Ok(mut entries) = self.entries.lock() else {
            return false;
        };
        entries.retired.insert(id);
        let removed = entries.decoded.remove(&id).is_some();
        if removed {
            debug!(source = %id, "decoded buffer evicted");
        }
        removed
    }

    pub fn len(&self) -> usize {
        self.entries.lock().map(|e| e.decoded.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
