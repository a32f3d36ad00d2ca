use crate::audio::DecodedAudio;

/// Min/max per bin across `samples`. Non-finite bins render flat.
pub fn build_minmax(out: &mut Vec<(f32, f32)>, samples: &[f32], bins: usize) {
    out.clear();
    if samples.is_empty() || bins == 0 {
        return;
    }
    let len = samples.len();
    let step = (len as f64 / bins as f64).max(1.0);
    for bin in 0..bins {
        let start = (bin as f64 * step) as usize;
        if start >= len {
            break;
        }
        let end = (((bin + 1) as f64 * step) as usize).min(len).max(start + 1);
        let (mut mn, mut mx) = (f32::INFINITY, f32::NEG_INFINITY);
        for &v in &samples[start..end] {
            mn = mn.min(v);
            mx = mx.max(v);
        }
        if mn.is_finite() && mx.is_finite() {
            out.push((mn, mx));
        } else {
            out.push((0.0, 0.0));
        }
    }
}

/// Peaks of the mono mix over `[start_seconds, end_seconds)`.
pub fn peaks_for_range(
    decoded: &DecodedAudio,
    start_seconds: f64,
    end_seconds: f64,
    bins: usize,
) -> Vec<(f32, f32)> {
    let sr = decoded.sample_rate as f64;
    let start = (start_seconds.max(0.0) * sr).floor() as usize;
    let end = (end_seconds.max(0.0) * sr).floor() as usize;
    let mono = decoded.mono_range(start, end);
    let mut out = Vec::with_capacity(bins);
    build_minmax(&mut out, &mono, bins);
    out
}
