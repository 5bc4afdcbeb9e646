//! RIFF/WAVE decoding for 8 and 16 bit PCM.

use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum WavError {
    #[error("not a RIFF/WAVE file")]
    NotWave,
    #[error("missing {0} chunk")]
    MissingChunk(&'static str),
    #[error("unsupported encoding {0}, only PCM is played")]
    NotPcm(u16),
    #[error("unsupported sample width of {0} bits")]
    BitDepth(u16),
    #[error("invalid channel count {0}")]
    Channels(u16),
    #[error("truncated chunk")]
    Truncated,
}

const FORMAT_PCM: u16 = 1;

/// Decoded audio as stereo frames in -1.0..=1.0.
#[derive(Debug, Clone, PartialEq)]
pub struct Clip {
    pub sample_rate: u32,
    pub frames: Vec<[f32; 2]>,
}

impl Clip {
    pub fn silent(sample_rate: u32) -> Self {
        Self {
            sample_rate,
            frames: Vec::new(),
        }
    }

    pub fn duration_secs(&self) -> f32 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.frames.len() as f32 / self.sample_rate as f32
    }

    /// Linear interpolation to a new sample rate.
    pub fn resample(&self, target_rate: u32) -> Clip {
        if target_rate == self.sample_rate || self.frames.len() < 2 || target_rate == 0 {
            return Clip {
                sample_rate: target_rate,
                frames: self.frames.clone(),
            };
        }
        let step = self.sample_rate as f64 / target_rate as f64;
        let out_len = ((self.frames.len() as f64) / step).floor() as usize;
        let last = self.frames.len() - 1;

        let frames = (0..out_len)
            .map(|i| {
                let pos = i as f64 * step;
                let idx = (pos as usize).min(last);
                let next = (idx + 1).min(last);
                let t = (pos - idx as f64) as f32;
                let a = self.frames[idx];
                let b = self.frames[next];
                [a[0] + (b[0] - a[0]) * t, a[1] + (b[1] - a[1]) * t]
            })
            .collect();

        Clip {
            sample_rate: target_rate,
            frames,
        }
    }
}

struct Format {
    channels: u16,
    sample_rate: u32,
    bits_per_sample: u16,
}

fn read_u16(bytes: &[u8], at: usize) -> Result<u16, WavError> {
    bytes
        .get(at..at + 2)
        .map(|b| u16::from_le_bytes([b[0], b[1]]))
        .ok_or(WavError::Truncated)
}

fn read_u32(bytes: &[u8], at: usize) -> Result<u32, WavError> {
    bytes
        .get(at..at + 4)
        .map(|b| u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
        .ok_or(WavError::Truncated)
}

pub fn decode(bytes: &[u8]) -> Result<Clip, WavError> {
    if bytes.len() < 12 || &bytes[0..4] != b"RIFF" || &bytes[8..12] != b"WAVE" {
        return Err(WavError::NotWave);
    }

    let mut format = None;
    let mut data = None;
    let mut at = 12;
    while at + 8 <= bytes.len() {
        let id = &bytes[at..at + 4];
        let size = read_u32(bytes, at + 4)? as usize;
        let body_start = at + 8;
        // Writers sometimes put a wrong size on the last chunk
        let body_end = body_start.saturating_add(size).min(bytes.len());
        let body = &bytes[body_start..body_end];

        match id {
            b"fmt " => {
                let encoding = read_u16(body, 0)?;
                if encoding != FORMAT_PCM {
                    return Err(WavError::NotPcm(encoding));
                }
                format = Some(Format {
                    channels: read_u16(body, 2)?,
                    sample_rate: read_u32(body, 4)?,
                    bits_per_sample: read_u16(body, 14)?,
                });
            }
            b"data" => data = Some(body),
            _ => {}
        }
        // Chunks are word aligned
        at = body_start.saturating_add(size).saturating_add(size & 1);
    }

    let format = format.ok_or(WavError::MissingChunk("fmt"))?;
    let data = data.ok_or(WavError::MissingChunk("data"))?;
    if format.channels == 0 {
        return Err(WavError::Channels(0));
    }

    let samples: Vec<f32> = match format.bits_per_sample {
        8 => data.iter().map(|&b| (b as f32 - 128.0) / 128.0).collect(),
        16 => data
            .chunks_exact(2)
            .map(|b| i16::from_le_bytes([b[0], b[1]]) as f32 / 32768.0)
            .collect(),
        bits => return Err(WavError::BitDepth(bits)),
    };

    let channels = format.channels as usize;
    let frames = samples
        .chunks_exact(channels)
        .map(|frame| {
            let left = frame[0];
            let right = if channels > 1 { frame[1] } else { left };
            [left, right]
        })
        .collect();

    Ok(Clip {
        sample_rate: format.sample_rate,
        frames,
    })
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Minimal PCM writer for building fixtures.
    pub(crate) fn wav_bytes(channels: u16, bits: u16, sample_rate: u32, data: &[u8]) -> Vec<u8> {
        let block_align = channels * bits / 8;
        let mut buf = Vec::new();
        buf.extend_from_slice(b"RIFF");
        buf.extend_from_slice(&(36 + data.len() as u32).to_le_bytes());
        buf.extend_from_slice(b"WAVE");
        buf.extend_from_slice(b"fmt ");
        buf.extend_from_slice(&16u32.to_le_bytes());
        buf.extend_from_slice(&FORMAT_PCM.to_le_bytes());
        buf.extend_from_slice(&channels.to_le_bytes());
        buf.extend_from_slice(&sample_rate.to_le_bytes());
        buf.extend_from_slice(&(sample_rate * block_align as u32).to_le_bytes());
        buf.extend_from_slice(&block_align.to_le_bytes());
        buf.extend_from_slice(&bits.to_le_bytes());
        buf.extend_from_slice(b"data");
        buf.extend_from_slice(&(data.len() as u32).to_le_bytes());
        buf.extend_from_slice(data);
        buf
    }

    #[test]
    fn test_decode_16bit_mono() {
        let data: Vec<u8> = [0i16, 16384, -32768]
            .iter()
            .flat_map(|s| s.to_le_bytes())
            .collect();
        let clip = decode(&wav_bytes(1, 16, 22050, &data)).unwrap();

        assert_eq!(clip.sample_rate, 22050);
        assert_eq!(clip.frames, vec![[0.0, 0.0], [0.5, 0.5], [-1.0, -1.0]]);
    }

    #[test]
    fn test_decode_8bit_stereo() {
        let clip = decode(&wav_bytes(2, 8, 11025, &[128, 255, 0, 128])).unwrap();
        assert_eq!(clip.frames.len(), 2);
        assert_eq!(clip.frames[0][0], 0.0);
        assert!((clip.frames[0][1] - 127.0 / 128.0).abs() < 1e-6);
        assert_eq!(clip.frames[1], [-1.0, 0.0]);
    }

    #[test]
    fn test_rejects_non_pcm() {
        let mut bytes = wav_bytes(1, 16, 8000, &[0, 0]);
        // Encoding field of the fmt chunk
        bytes[20..22].copy_from_slice(&3u16.to_le_bytes());
        assert_eq!(decode(&bytes), Err(WavError::NotPcm(3)));
    }

    #[test]
    fn test_rejects_other_files() {
        assert_eq!(decode(b"OggS0000000000000"), Err(WavError::NotWave));
        assert_eq!(decode(&wav_bytes(1, 24, 8000, &[0, 0, 0])), Err(WavError::BitDepth(24)));
    }

    #[test]
    fn test_resample_doubles_length() {
        let clip = Clip {
            sample_rate: 100,
            frames: vec![[0.0, 0.0], [1.0, 1.0], [0.0, 0.0], [1.0, 1.0]],
        };
        let up = clip.resample(200);
        assert_eq!(up.sample_rate, 200);
        assert_eq!(up.frames.len(), 8);
        assert_eq!(up.frames[1], [0.5, 0.5]);
        assert!((up.duration_secs() - clip.duration_secs()).abs() < 1e-6);
    }
}
