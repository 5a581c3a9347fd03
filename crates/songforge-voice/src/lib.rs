//! Songforge Voice
//!
//! Voice profile management and vocal synthesis. The crate owns three
//! concerns:
//!
//! - **Voice bank** — registration, lookup, and deletion of voice profiles
//!   built from uploaded samples.
//! - **Embedding extraction** — a deterministic spectral fingerprint of a
//!   voice sample, used to condition the cloning synthesizer.
//! - **Vocal synthesis** — two backends behind [`VocalSynthesizer`]: stock
//!   voices from formant presets, and cloned voices conditioned on an
//!   embedding.

pub mod bank;
pub mod embedding;
pub mod error;
pub mod profile;
pub mod sample;
pub mod synth;

pub use bank::VoiceBank;
pub use embedding::{EmbeddingExtractor, VoiceEmbedding, EMBEDDING_DIM};
pub use error::VoiceError;
pub use profile::{ProfileStatus, VoiceProfile};
pub use sample::VoiceSample;
pub use synth::{synthesizer_for, VocalSynthesizer};
