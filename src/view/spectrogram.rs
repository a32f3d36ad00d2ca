use rustfft::{num_complex::Complex, FftPlanner};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpectrogramConfig {
    pub fft_size: usize,
    pub hop_size: usize,
    /// Values below this are clamped.
    pub floor_db: f32,
}

impl Default for SpectrogramConfig {
    fn default() -> Self {
        Self {
            fft_size: 512,
            hop_size: 128,
            floor_db: -120.0,
        }
    }
}

/// Magnitude spectrogram in dB, frame-major.
#[derive(Debug, Clone, PartialEq)]
pub struct Spectrogram {
    pub frames: usize,
    pub bins: usize,
    pub sample_rate: u32,
    pub hop_size: usize,
    pub values_db: Vec<f32>,
}

impl Spectrogram {
    pub fn frame(&self, index: usize) -> Option<&[f32]> {
        let start = index.checked_mul(self.bins)?;
        self.values_db.get(start..start + self.bins)
    }

    pub fn bin_hz(&self, bin: usize) -> f32 {
        let fft_size = (self.bins.saturating_sub(1)) * 2;
        if fft_size == 0 {
            return 0.0;
        }
        bin as f32 * self.sample_rate as f32 / fft_size as f32
    }
}

fn hann_window(n: usize) -> Vec<f32> {
    if n <= 1 {
        return vec![1.0; n];
    }
    (0..n)
        .map(|i| {
            let t = i as f32 / (n - 1) as f32;
            0.5 - 0.5 * (2.0 * std::f32::consts::PI * t).cos()
        })
        .collect()
}

/// Short-time FFT of `mono` with a Hann window. Signals shorter than one
/// window are zero-padded into a single frame.
pub fn compute_spectrogram(mono: &[f32], sample_rate: u32, cfg: &SpectrogramConfig) -> Spectrogram {
    let fft_size = cfg.fft_size.max(2);
    let hop = cfg.hop_size.max(1);
    let bins = fft_size / 2 + 1;

    if mono.is_empty() {
        return Spectrogram {
            frames: 0,
            bins,
            sample_rate,
            hop_size: hop,
            values_db: Vec::new(),
        };
    }

    let frames = if mono.len() <= fft_size {
        1
    } else {
        (mono.len() - fft_size) / hop + 1
    };

    let window = hann_window(fft_size);
    let mut planner = FftPlanner::<f32>::new();
    let fft = planner.plan_fft_forward(fft_size);
    let mut buf = vec![Complex::new(0.0f32, 0.0); fft_size];
    let mut values_db = Vec::with_capacity(frames * bins);

    for frame in 0..frames {
        let offset = frame * hop;
        for (i, slot) in buf.iter_mut().enumerate() {
            let sample = mono.get(offset + i).copied().unwrap_or(0.0);
            *slot = Complex::new(sample * window[i], 0.0);
        }
        fft.process(&mut buf);
        for c in buf.iter().take(bins) {
            let mag = c.norm() / fft_size as f32;
            let db = 20.0 * mag.max(1e-9).log10();
            values_db.push(db.max(cfg.floor_db));
        }
    }

    Spectrogram {
        frames,
        bins,
        sample_rate,
        hop_size: hop,
        values_db,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tone_peaks_at_its_bin() {
        let sr = 8_000u32;
        let cfg = SpectrogramConfig::default();
        // 1 kHz lands exactly on bin 64 of a 512-point FFT at 8 kHz.
        let tone: Vec<f32> = (0..2048)
            .map(|i| (2.0 * std::f32::consts::PI * 1000.0 * i as f32 / sr as f32).sin())
            .collect();
        let spec = compute_spectrogram(&tone, sr, &cfg);
        assert_eq!(spec.frames, (2048 - 512) / 128 + 1);
        assert_eq!(spec.bins, 257);

        let frame = spec.frame(0).unwrap();
        let peak = frame
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.total_cmp(b.1))
            .map(|(i, _)| i)
            .unwrap();
        assert_eq!(peak, 64);
        assert!((spec.bin_hz(64) - 1000.0).abs() < 1e-3);
    }

    #[test]
    fn short_signal_is_one_frame() {
        let spec = compute_spectrogram(&[0.1; 100], 8_000, &SpectrogramConfig::default());
        assert_eq!(spec.frames, 1);
        assert_eq!(spec.values_db.len(), spec.bins);
    }
}
