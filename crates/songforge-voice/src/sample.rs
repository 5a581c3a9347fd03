//! Voice sample loading and validation.

use serde::{Deserialize, Serialize};

use crate::error::VoiceError;

/// Minimum usable sample length.
pub const MIN_SAMPLE_SECONDS: f64 = 3.0;

/// RMS floor below which a sample counts as silence.
pub const SILENCE_RMS: f64 = 0.005;

/// A decoded mono voice sample.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VoiceSample {
    /// Mono samples in -1..1.
    pub samples: Vec<f64>,
    /// Source sample rate in Hz.
    pub sample_rate: u32,
}

impl VoiceSample {
    /// Decodes a 16-bit PCM WAV upload. Stereo input is downmixed to mono;
    /// other channel counts and encodings are rejected.
    pub fn from_wav_bytes(bytes: &[u8]) -> Result<Self, VoiceError> {
        let mut reader = RiffReader::new(bytes)?;
        let fmt = reader.fmt_chunk()?;
        let data = reader.data_chunk()?;

        if fmt.audio_format != 1 || fmt.bits_per_sample != 16 {
            return Err(VoiceError::invalid_sample(format!(
                "only 16-bit PCM WAV is accepted (got format {} at {} bits)",
                fmt.audio_format, fmt.bits_per_sample
            )));
        }
        if fmt.channels == 0 || fmt.channels > 2 {
            return Err(VoiceError::invalid_sample(format!(
                "unsupported channel count {}",
                fmt.channels
            )));
        }

        let channels = fmt.channels as usize;
        let frame_bytes = channels * 2;
        let frames = data.len() / frame_bytes;
        let mut samples = Vec::with_capacity(frames);
        for frame in 0..frames {
            let mut acc = 0.0;
            for ch in 0..channels {
                let at = frame * frame_bytes + ch * 2;
                let value = i16::from_le_bytes([data[at], data[at + 1]]);
                acc += value as f64 / 32768.0;
            }
            samples.push(acc / channels as f64);
        }

        Ok(Self {
            samples,
            sample_rate: fmt.sample_rate,
        })
    }

    /// Sample length in seconds.
    pub fn duration_seconds(&self) -> f64 {
        self.samples.len() as f64 / self.sample_rate as f64
    }

    /// Root-mean-square level.
    pub fn rms(&self) -> f64 {
        if self.samples.is_empty() {
            return 0.0;
        }
        (self.samples.iter().map(|s| s * s).sum::<f64>() / self.samples.len() as f64).sqrt()
    }

    /// Registration gate: long enough and audibly non-silent.
    pub fn validate_for_registration(&self) -> Result<(), VoiceError> {
        if self.duration_seconds() < MIN_SAMPLE_SECONDS {
            return Err(VoiceError::invalid_sample(format!(
                "sample is {:.2}s, need at least {}s",
                self.duration_seconds(),
                MIN_SAMPLE_SECONDS
            )));
        }
        if self.rms() < SILENCE_RMS {
            return Err(VoiceError::invalid_sample("sample is silent"));
        }
        Ok(())
    }
}

struct FmtChunk {
    audio_format: u16,
    channels: u16,
    sample_rate: u32,
    bits_per_sample: u16,
}

/// Minimal RIFF/WAVE chunk walker.
struct RiffReader<'a> {
    bytes: &'a [u8],
}

impl<'a> RiffReader<'a> {
    fn new(bytes: &'a [u8]) -> Result<Self, VoiceError> {
        if bytes.len() < 12 || &bytes[0..4] != b"RIFF" || &bytes[8..12] != b"WAVE" {
            return Err(VoiceError::invalid_sample("not a RIFF/WAVE file"));
        }
        Ok(Self { bytes })
    }

    fn find_chunk(&self, id: &[u8; 4]) -> Result<&'a [u8], VoiceError> {
        let mut at = 12;
        while at + 8 <= self.bytes.len() {
            let chunk_id = &self.bytes[at..at + 4];
            let size = u32::from_le_bytes([
                self.bytes[at + 4],
                self.bytes[at + 5],
                self.bytes[at + 6],
                self.bytes[at + 7],
            ]) as usize;
            let body_start = at + 8;
            let body_end = body_start.checked_add(size).filter(|&e| e <= self.bytes.len());
            let Some(body_end) = body_end else {
                return Err(VoiceError::invalid_sample("truncated WAV chunk"));
            };
            if chunk_id == id {
                return Ok(&self.bytes[body_start..body_end]);
            }
            // Chunks are word-aligned.
            at = body_end + (size & 1);
        }
        Err(VoiceError::invalid_sample(format!(
            "missing '{}' chunk",
            String::from_utf8_lossy(id)
        )))
    }

    fn fmt_chunk(&mut self) -> Result<FmtChunk, VoiceError> {
        let body = self.find_chunk(b"fmt ")?;
        if body.len() < 16 {
            return Err(VoiceError::invalid_sample("fmt chunk too short"));
        }
        Ok(FmtChunk {
            audio_format: u16::from_le_bytes([body[0], body[1]]),
            channels: u16::from_le_bytes([body[2], body[3]]),
            sample_rate: u32::from_le_bytes([body[4], body[5], body[6], body[7]]),
            bits_per_sample: u16::from_le_bytes([body[14], body[15]]),
        })
    }

    fn data_chunk(&mut self) -> Result<&'a [u8], VoiceError> {
        self.find_chunk(b"data")
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    /// Builds a 16-bit PCM mono WAV containing a sine tone.
    pub fn sine_wav(frequency: f64, seconds: f64, sample_rate: u32, amplitude: f64) -> Vec<u8> {
        let num_samples = (seconds * sample_rate as f64) as usize;
        let mut data = Vec::with_capacity(num_samples * 2);
        for i in 0..num_samples {
            let t = i as f64 / sample_rate as f64;
            let value = (2.0 * std::f64::consts::PI * frequency * t).sin() * amplitude;
            let quantized = (value * 32767.0) as i16;
            data.extend_from_slice(&quantized.to_le_bytes());
        }
        wrap_wav(&data, 1, sample_rate)
    }

    pub fn wrap_wav(data: &[u8], channels: u16, sample_rate: u32) -> Vec<u8> {
        let byte_rate = sample_rate * channels as u32 * 2;
        let block_align = channels * 2;
        let mut out = Vec::new();
        out.extend_from_slice(b"RIFF");
        out.extend_from_slice(&(36 + data.len() as u32).to_le_bytes());
        out.extend_from_slice(b"WAVE");
        out.extend_from_slice(b"fmt ");
        out.extend_from_slice(&16u32.to_le_bytes());
        out.extend_from_slice(&1u16.to_le_bytes());
        out.extend_from_slice(&channels.to_le_bytes());
        out.extend_from_slice(&sample_rate.to_le_bytes());
        out.extend_from_slice(&byte_rate.to_le_bytes());
        out.extend_from_slice(&block_align.to_le_bytes());
        out.extend_from_slice(&16u16.to_le_bytes());
        out.extend_from_slice(b"data");
        out.extend_from_slice(&(data.len() as u32).to_le_bytes());
        out.extend_from_slice(data);
        out
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::sine_wav;
    use super::*;

    #[test]
    fn decodes_mono_pcm16() {
        let wav = sine_wav(220.0, 4.0, 44100, 0.5);
        let sample = VoiceSample::from_wav_bytes(&wav).unwrap();
        assert_eq!(sample.sample_rate, 44100);
        assert!((sample.duration_seconds() - 4.0).abs() < 0.01);
        sample.validate_for_registration().unwrap();
    }

    #[test]
    fn rejects_garbage_bytes() {
        assert!(matches!(
            VoiceSample::from_wav_bytes(b"definitely not audio"),
            Err(VoiceError::InvalidSample { .. })
        ));
    }

    #[test]
    fn rejects_short_sample() {
        let wav = sine_wav(220.0, 1.0, 44100, 0.5);
        let sample = VoiceSample::from_wav_bytes(&wav).unwrap();
        assert!(sample.validate_for_registration().is_err());
    }

    #[test]
    fn rejects_silent_sample() {
        let wav = sine_wav(220.0, 4.0, 44100, 0.0005);
        let sample = VoiceSample::from_wav_bytes(&wav).unwrap();
        let err = sample.validate_for_registration().unwrap_err();
        assert!(err.to_string().contains("silent"));
    }
}
