//! Songforge Core Library
//!
//! Shared types for the song synthesis pipeline: the symbolic arrangement
//! produced by the composer, audio stems, tiered masters, voice
//! specifications, the caller-visible error taxonomy, and the canonical
//! hashing used for content-addressed caching.
//!
//! # Determinism
//!
//! Every stage of the pipeline is deterministic given identical inputs and
//! component versions. The determinism policy lives here:
//!
//! - [`hash`] canonicalizes JSON (sorted keys, minimal escaping) and hashes
//!   it with BLAKE3, and derives per-component PCG32 seeds from those hashes.
//! - [`version`] carries the version constants that travel inside cache keys
//!   and embeddings, so a model/template upgrade invalidates exactly the
//!   artifacts it affects.
//!
//! # Modules
//!
//! - [`arrangement`]: symbolic arrangement (sections, melody, harmony, rhythm)
//! - [`error`]: caller-visible error taxonomy for the whole pipeline
//! - [`genre`]: the genre enumeration shared by composer and renderer
//! - [`hash`]: canonical hashing and seed derivation
//! - [`master`]: output tiers, formats, and the mixed master type
//! - [`note`]: MIDI pitch math
//! - [`stem`]: single-instrument audio renders
//! - [`version`]: component version constants
//! - [`voice`]: voice specification (stock vs cloned) and profile ids

pub mod arrangement;
pub mod error;
pub mod genre;
pub mod hash;
pub mod master;
pub mod note;
pub mod stem;
pub mod version;
pub mod voice;

pub use arrangement::{
    InstrumentEvent, KeySignature, MelodyEvent, Mode, Section, SectionLabel, SymbolicArrangement,
};
pub use error::{SongError, SongResult};
pub use genre::Genre;
pub use hash::{blake3_hex, canonical_value_hash, derive_component_seed, render_key};
pub use master::{Encoding, Master, MasterFormat, Tier};
pub use note::midi_to_freq;
pub use stem::{Stem, StemKind};
pub use voice::{ProfileId, StockVoice, VoiceSpec};
