#![allow(dead_code)]

use std::io::Cursor;

use cachalot::audio::AudioSource;

/// 32-bit float WAV with the given channels (equal length).
pub fn float_wav(channels: &[Vec<f32>], sample_rate: u32) -> Vec<u8> {
    let spec = hound::WavSpec {
        channels: channels.len() as u16,
        sample_rate,
        bits_per_sample: 32,
        sample_format: hound::SampleFormat::Float,
    };
    let mut buf = Vec::new();
    {
        let mut writer = hound::WavWriter::new(Cursor::new(&mut buf), spec).unwrap();
        let frames = channels[0].len();
        for i in 0..frames {
            for ch in channels {
                writer.write_sample(ch[i]).unwrap();
            }
        }
        writer.finalize().unwrap();
    }
    buf
}

/// Deterministic pseudo-random signal in [-1, 1], including the extremes.
pub fn signal(len: usize, seed: u32) -> Vec<f32> {
    let mut state = seed.wrapping_mul(2_654_435_761).wrapping_add(1);
    (0..len)
        .map(|i| {
            if i % 997 == 0 {
                return if i % 2 == 0 { 1.0 } else { -1.0 };
            }
            state ^= state << 13;
            state ^= state >> 17;
            state ^= state << 5;
            (state as f32 / u32::MAX as f32) * 2.0 - 1.0
        })
        .collect()
}

/// Mono recording of `seconds` at `sample_rate`.
pub fn recording(seconds: f64, sample_rate: u32) -> AudioSource {
    let len = (seconds * sample_rate as f64) as usize;
    AudioSource::from_bytes(float_wav(&[signal(len, 7)], sample_rate))
}

/// Reads back a PCM16 WAV as per-channel i16 samples.
pub fn read_pcm16(bytes: &[u8]) -> (hound::WavSpec, Vec<Vec<i16>>) {
    let mut reader = hound::WavReader::new(Cursor::new(bytes)).unwrap();
    let spec = reader.spec();
    let n = spec.channels as usize;
    let mut channels = vec![Vec::new(); n];
    for (i, s) in reader.samples::<i16>().enumerate() {
        channels[i % n].push(s.unwrap());
    }
    (spec, channels)
}
