//! PCM encoding and WAV packaging.
//!
//! The WAV writer is byte-deterministic: same samples in, same file out.
//! Level changes land in the mix stage, so encoding only quantizes and
//! packages.

use songforge_core::hash::blake3_hex;
use songforge_core::Encoding;

/// Linearly resamples one channel to a new rate. Identity rates return the
/// input unchanged.
pub fn resample(samples: &[f64], from_rate: u32, to_rate: u32) -> Vec<f64> {
    if from_rate == to_rate || samples.is_empty() {
        return samples.to_vec();
    }
    let ratio = from_rate as f64 / to_rate as f64;
    let out_len = ((samples.len() as f64) / ratio).round() as usize;
    let mut out = Vec::with_capacity(out_len);
    for i in 0..out_len {
        let pos = i as f64 * ratio;
        let base = pos as usize;
        let frac = pos - base as f64;
        let a = samples[base.min(samples.len() - 1)];
        let b = samples[(base + 1).min(samples.len() - 1)];
        out.push(a + (b - a) * frac);
    }
    out
}

/// Quantizes interleaved stereo samples to PCM bytes at the given depth.
pub fn interleave_to_pcm(left: &[f64], right: &[f64], encoding: Encoding) -> Vec<u8> {
    let len = left.len().min(right.len());
    let bytes_per_sample = encoding.bits_per_sample() as usize / 8;
    let mut pcm = Vec::with_capacity(len * 2 * bytes_per_sample);
    for i in 0..len {
        push_sample(&mut pcm, left[i], encoding);
        push_sample(&mut pcm, right[i], encoding);
    }
    pcm
}

/// Quantizes a mono channel to PCM bytes.
pub fn mono_to_pcm(samples: &[f64], encoding: Encoding) -> Vec<u8> {
    let bytes_per_sample = encoding.bits_per_sample() as usize / 8;
    let mut pcm = Vec::with_capacity(samples.len() * bytes_per_sample);
    for &sample in samples {
        push_sample(&mut pcm, sample, encoding);
    }
    pcm
}

fn push_sample(pcm: &mut Vec<u8>, sample: f64, encoding: Encoding) {
    let clipped = sample.clamp(-1.0, 1.0);
    match encoding {
        Encoding::Pcm8 => {
            // WAV convention: 8-bit is unsigned, centered at 128.
            pcm.push(((clipped * 127.0).round() + 128.0) as u8);
        }
        Encoding::Pcm16 => {
            let value = (clipped * 32767.0).round() as i16;
            pcm.extend_from_slice(&value.to_le_bytes());
        }
        Encoding::Pcm24 => {
            let value = (clipped * 8_388_607.0).round() as i32;
            pcm.extend_from_slice(&value.to_le_bytes()[..3]);
        }
    }
}

/// Wraps PCM bytes in a RIFF/WAVE container.
pub fn write_wav(pcm: &[u8], channels: u16, sample_rate: u32, encoding: Encoding) -> Vec<u8> {
    let bits = encoding.bits_per_sample();
    let block_align = channels * bits / 8;
    let byte_rate = sample_rate * block_align as u32;
    let data_size = pcm.len() as u32;

    let mut out = Vec::with_capacity(44 + pcm.len());
    out.extend_from_slice(b"RIFF");
    out.extend_from_slice(&(36 + data_size).to_le_bytes());
    out.extend_from_slice(b"WAVE");
    out.extend_from_slice(b"fmt ");
    out.extend_from_slice(&16u32.to_le_bytes());
    out.extend_from_slice(&1u16.to_le_bytes());
    out.extend_from_slice(&channels.to_le_bytes());
    out.extend_from_slice(&sample_rate.to_le_bytes());
    out.extend_from_slice(&byte_rate.to_le_bytes());
    out.extend_from_slice(&block_align.to_le_bytes());
    out.extend_from_slice(&bits.to_le_bytes());
    out.extend_from_slice(b"data");
    out.extend_from_slice(&data_size.to_le_bytes());
    out.extend_from_slice(pcm);
    out
}

/// BLAKE3 hash of the PCM payload, for byte-level determinism checks.
pub fn pcm_hash(pcm: &[u8]) -> String {
    blake3_hex(pcm)
}
