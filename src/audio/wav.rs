//! Canonical 16-bit PCM RIFF/WAVE writer.
//!
//! Layout (all little-endian):
//!
//! | offset | size | field                        |
//! |--------|------|------------------------------|
//! | 0      | 4    | `RIFF`                       |
//! | 4      | 4    | total size - 8               |
//! | 8      | 4    | `WAVE`                       |
//! | 12     | 4    | `fmt `                       |
//! | 16     | 4    | 16 (fmt body size)           |
//! | 20     | 2    | 1 (PCM)                      |
//! | 22     | 2    | channel count                |
//! | 24     | 4    | sample rate                  |
//! | 28     | 4    | byte rate                    |
//! | 32     | 2    | block align                  |
//! | 34     | 2    | 16 (bits per sample)         |
//! | 36     | 4    | `data`                       |
//! | 40     | 4    | data size                    |
//! | 44     | ..   | interleaved i16 samples      |

pub const WAV_HEADER_LEN: usize = 44;
const BITS_PER_SAMPLE: u16 = 16;
const PCM_FORMAT: u16 = 1;

/// Float to int16. Clamps to [-1, 1] first; negative values scale by 32768,
/// positive by 32767, then truncate toward zero.
pub fn quantize_sample(sample: f32) -> i16 {
    let s = sample.clamp(-1.0, 1.0);
    if s < 0.0 {
        (s * 32768.0) as i16
    } else {
        (s * 32767.0) as i16
    }
}

/// Encodes equally long channel slices. Extra samples in a longer channel
/// are ignored.
pub fn encode_pcm16(channels: &[&[f32]], sample_rate: u32) -> Vec<u8> {
    let channel_count = channels.len().max(1) as u16;
    let frames = channels.iter().map(|c| c.len()).min().unwrap_or(0);
    let block_align = channel_count as u32 * (BITS_PER_SAMPLE as u32 / 8);
    let data_len = frames as u32 * block_align;
    let byte_rate = sample_rate * block_align;

    let mut out = Vec::with_capacity(WAV_HEADER_LEN + data_len as usize);
    out.extend_from_slice(b"RIFF");
    out.extend_from_slice(&(36 + data_len).to_le_bytes());
    out.extend_from_slice(b"WAVE");

    out.extend_from_slice(b"fmt ");
    out.extend_from_slice(&16u32.to_le_bytes());
    out.extend_from_slice(&PCM_FORMAT.to_le_bytes());
    out.extend_from_slice(&channel_count.to_le_bytes());
    out.extend_from_slice(&sample_rate.to_le_bytes());
    out.extend_from_slice(&byte_rate.to_le_bytes());
    out.extend_from_slice(&(block_align as u16).to_le_bytes());
    out.extend_from_slice(&BITS_PER_SAMPLE.to_le_bytes());

    out.extend_from_slice(b"data");
    out.extend_from_slice(&data_len.to_le_bytes());
    for frame in 0..frames {
        for ch in channels {
            out.extend_from_slice(&quantize_sample(ch[frame]).to_le_bytes());
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn u32_at(bytes: &[u8], at: usize) -> u32 {
        u32::from_le_bytes([bytes[at], bytes[at + 1], bytes[at + 2], bytes[at + 3]])
    }

    fn u16_at(bytes: &[u8], at: usize) -> u16 {
        u16::from_le_bytes([bytes[at], bytes[at + 1]])
    }

    #[test]
    fn quantization_is_asymmetric() {
        assert_eq!(quantize_sample(1.0), 32767);
        assert_eq!(quantize_sample(-1.0), -32768);
        assert_eq!(quantize_sample(2.5), 32767);
        assert_eq!(quantize_sample(-7.0), -32768);
        assert_eq!(quantize_sample(0.5), 16383);
        assert_eq!(quantize_sample(-0.5), -16384);
        assert_eq!(quantize_sample(0.0), 0);
    }

    #[test]
    fn header_layout_stereo() {
        let left = [0.0f32, 0.5, -0.5];
        let right = [1.0f32, -1.0, 0.25];
        let bytes = encode_pcm16(&[&left[..], &right[..]], 48_000);

        assert_eq!(&bytes[0..4], b"RIFF");
        assert_eq!(u32_at(&bytes, 4) as usize, bytes.len() - 8);
        assert_eq!(&bytes[8..12], b"WAVE");
        assert_eq!(&bytes[12..16], b"fmt ");
        assert_eq!(u32_at(&bytes, 16), 16);
        assert_eq!(u16_at(&bytes, 20), 1);
        assert_eq!(u16_at(&bytes, 22), 2);
        assert_eq!(u32_at(&bytes, 24), 48_000);
        assert_eq!(u32_at(&bytes, 28), 48_000 * 4);
        assert_eq!(u16_at(&bytes, 32), 4);
        assert_eq!(u16_at(&bytes, 34), 16);
        assert_eq!(&bytes[36..40], b"data");
        assert_eq!(u32_at(&bytes, 40), 12);
        assert_eq!(bytes.len(), WAV_HEADER_LEN + 12);

        // interleaved: L0 R0 L1 R1 ...
        let first_right = i16::from_le_bytes([bytes[46], bytes[47]]);
        assert_eq!(first_right, 32767);
        let second_left = i16::from_le_bytes([bytes[48], bytes[49]]);
        assert_eq!(second_left, 16383);
    }

    #[test]
    fn empty_buffer_is_header_only() {
        let empty: [f32; 0] = [];
        let bytes = encode_pcm16(&[&empty[..]], 8_000);
        assert_eq!(bytes.len(), WAV_HEADER_LEN);
        assert_eq!(u32_at(&bytes, 40), 0);
        assert_eq!(u32_at(&bytes, 4), 36);
    }
}
