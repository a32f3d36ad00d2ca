//! Partitioning of a recording into padded inference chunks.

use crate::audio::AudioSource;

/// A trailing chunk shorter than this is dropped rather than emitted.
pub const MIN_CHUNK_SECONDS: f64 = 0.1;

/// Time layout of one chunk, before any audio is extracted.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChunkWindow {
    pub index: usize,
    /// Un-padded bounds in recording time.
    pub start_time: f64,
    pub end_time: f64,
    /// Padded bounds, clamped to the signal.
    pub padded_start: f64,
    pub padded_end: f64,
}

impl ChunkWindow {
    pub fn duration(&self) -> f64 {
        self.end_time - self.start_time
    }

    pub fn padded_left(&self) -> f64 {
        self.start_time - self.padded_start
    }

    pub fn padded_right(&self) -> f64 {
        self.padded_end - self.end_time
    }

    /// Chunk-local `[left, left + duration]`, inclusive on both ends.
    pub fn valid_window(&self) -> (f64, f64) {
        let left = self.padded_left();
        (left, left + self.duration())
    }

    /// Drops predictions that fall in the padding and maps the rest to
    /// recording time. Order is preserved.
    pub fn remap(&self, local_seconds: &[f64]) -> Vec<f64> {
        let (lo, hi) = self.valid_window();
        let left = self.padded_left();
        local_seconds
            .iter()
            .copied()
            .filter(|t| t.is_finite() && *t >= lo && *t <= hi)
            .map(|t| t - left + self.start_time)
            .collect()
    }
}

/// Splits `[0, total)` into `chunk_seconds` windows, each padded by
/// `padding_seconds` on both sides and clamped to `[0, total]`.
///
/// Starts are computed as `index * chunk_seconds` so long recordings do not
/// accumulate drift.
pub fn plan_chunks(total_seconds: f64, chunk_seconds: f64, padding_seconds: f64) -> Vec<ChunkWindow> {
    if !(total_seconds > 0.0) || !(chunk_seconds > 0.0) {
        return Vec::new();
    }
    let padding = if padding_seconds.is_finite() {
        padding_seconds.max(0.0)
    } else {
        0.0
    };

    let mut windows = Vec::new();
    let mut index = 0usize;
    loop {
        let start_time = index as f64 * chunk_seconds;
        if start_time >= total_seconds {
            break;
        }
        let end_time = (start_time + chunk_seconds).min(total_seconds);
        if end_time - start_time < MIN_CHUNK_SECONDS {
            break;
        }
        windows.push(ChunkWindow {
            index,
            start_time,
            end_time,
            padded_start: (start_time - padding).max(0.0),
            padded_end: (end_time + padding).min(total_seconds),
        });
        index += 1;
    }
    windows
}

/// One extracted chunk, handed to the predictor exactly once.
#[derive(Debug, Clone)]
pub struct Chunk {
    pub index: usize,
    pub start_time: f64,
    pub end_time: f64,
    pub padded_left_seconds: f64,
    pub padded_right_seconds: f64,
    pub audio: AudioSource,
}

impl Chunk {
    pub fn new(window: &ChunkWindow, audio: AudioSource) -> Self {
        Self {
            index: window.index,
            start_time: window.start_time,
            end_time: window.end_time,
            padded_left_seconds: window.padded_left(),
            padded_right_seconds: window.padded_right(),
            audio,
        }
    }

    /// Multipart file name for this chunk.
    pub fn file_name(&self) -> String {
        format!("chunk_{:04}.wav", self.index)
    }
}
