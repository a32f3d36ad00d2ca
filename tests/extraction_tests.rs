mod common;

use std::sync::Arc;

use cachalot::audio::extract::sample_range;
use cachalot::audio::wav::{quantize_sample, WAV_HEADER_LEN};
use cachalot::audio::{AudioSource, DecodeCache, ExtractAudio, Extractor, SourceOrigin};
use cachalot::ExtractionError;

use common::{float_wav, read_pcm16, signal};

fn floor_sample(t: f64, sr: u32) -> usize {
    (t * sr as f64).floor() as usize
}

#[test]
fn test_round_trip_slicing_is_exact() {
    let sr = 8_000;
    let left = signal(16_000, 1);
    let right = signal(16_000, 2);
    let source = AudioSource::from_bytes(float_wav(&[left.clone(), right.clone()], sr));
    let extractor = Extractor::new();

    for (a, b) in [(0.0, 2.0), (0.5, 1.2345), (1.999, 2.0), (0.123, 0.124)] {
        let asset = extractor.extract(&source, a, b).unwrap();
        let (spec, channels) = read_pcm16(asset.bytes());

        let (start, end) = (floor_sample(a, sr), floor_sample(b, sr));
        assert_eq!(spec.sample_rate, sr);
        assert_eq!(spec.channels, 2);
        assert_eq!(spec.bits_per_sample, 16);

        for (ch, original) in channels.iter().zip([&left, &right]) {
            assert_eq!(ch.len(), end - start, "[{a}, {b})");
            let expected: Vec<i16> = original[start..end].iter().map(|&s| quantize_sample(s)).collect();
            assert_eq!(ch, &expected, "[{a}, {b})");
        }
    }
}

#[test]
fn test_container_layout() {
    let sr = 1_000;
    let source = AudioSource::from_bytes(float_wav(&[signal(1_000, 3)], sr));
    let asset = Extractor::new().extract(&source, 0.25, 0.5).unwrap();
    let bytes = asset.bytes();

    let frames = 250usize;
    assert_eq!(bytes.len(), WAV_HEADER_LEN + frames * 2);
    assert_eq!(&bytes[0..4], b"RIFF");
    assert_eq!(u32::from_le_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]) as usize, bytes.len() - 8);
    assert_eq!(&bytes[8..12], b"WAVE");
    assert_eq!(&bytes[36..40], b"data");
    assert_eq!(u32::from_le_bytes([bytes[40], bytes[41], bytes[42], bytes[43]]) as usize, frames * 2);
}

#[test]
fn test_invalid_ranges_fail() {
    let source = AudioSource::from_bytes(float_wav(&[signal(8_000, 4)], 8_000));
    let extractor = Extractor::new();

    // Empty after clamping: both ends land past the signal.
    assert!(matches!(
        extractor.extract(&source, 3.0, 4.0),
        Err(ExtractionError::InvalidRange { .. })
    ));
    assert!(matches!(
        extractor.extract(&source, 0.5, 0.5),
        Err(ExtractionError::InvalidRange { .. })
    ));
    assert!(matches!(
        extractor.extract(&source, 0.6, 0.5),
        Err(ExtractionError::InvalidRange { .. })
    ));
}

#[test]
fn test_undecodable_source_is_decode_error() {
    let source = AudioSource::from_bytes(b"not a wav file".to_vec());
    assert!(matches!(
        Extractor::new().extract(&source, 0.0, 1.0),
        Err(ExtractionError::Decode(_))
    ));
    assert!(source.info().is_err());
}

#[test]
fn test_decode_is_cached_per_source() {
    let cache = Arc::new(DecodeCache::new());
    let extractor = Extractor::with_cache(Arc::clone(&cache));
    let source = AudioSource::from_bytes(float_wav(&[signal(4_000, 5)], 4_000));

    extractor.extract(&source, 0.0, 0.5).unwrap();
    let first = cache.get(source.id()).unwrap();
    extractor.extract(&source, 0.5, 1.0).unwrap();
    let second = cache.get(source.id()).unwrap();

    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(cache.len(), 1);
}

#[test]
fn test_extracted_asset_remembers_parent() {
    let source = AudioSource::from_bytes(float_wav(&[signal(4_000, 6)], 4_000));
    let asset = Extractor::new().extract(&source, 0.25, 0.75).unwrap();

    match asset.origin() {
        SourceOrigin::Derived {
            parent,
            start_seconds,
            end_seconds,
        } => {
            assert_eq!(*parent, source.id());
            assert_eq!((*start_seconds, *end_seconds), (0.25, 0.75));
        }
        other => panic!("unexpected origin {other:?}"),
    }
    let info = asset.info().unwrap();
    assert_eq!(info.total_samples, 2_000);
    assert_eq!(sample_range(0.25, 0.75, 4_000, 4_000).unwrap().len(), 2_000);
}
