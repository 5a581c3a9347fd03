//! Component version constants.
//!
//! These travel inside cache keys and embeddings so that upgrading one
//! component invalidates exactly the artifacts it affects.

/// Composer (section templates + melodic policy) version.
pub const COMPOSER_VERSION: &str = "compose-v1";

/// Vocal synthesis backends version.
pub const VOCAL_SYNTH_VERSION: &str = "vocal-v1";

/// Instrumental renderer version.
pub const INSTRUMENT_RENDER_VERSION: &str = "instr-v1";

/// Embedding extractor version. Embeddings from different extractor
/// versions are mutually incompatible.
pub const EXTRACTOR_VERSION: &str = "embed-v1";

/// Mixer/mastering stage version.
pub const MIX_VERSION: &str = "mix-v1";
