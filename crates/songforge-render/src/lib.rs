//! Songforge Instrumental Renderer
//!
//! Turns a symbolic arrangement into per-instrument audio stems: drums,
//! bass, melody, and harmony. All synthesis is deterministic; the PCG32
//! streams are seeded from a BLAKE3 hash of the arrangement, so the same
//! arrangement renders to byte-identical stems across runs on the same
//! platform.
//!
//! Stems come back at [`RENDER_SAMPLE_RATE`] as mono `f64` buffers of equal
//! length, ready for the mixer.

pub mod envelope;
pub mod error;
pub mod filter;
pub mod instruments;
pub mod karplus;
pub mod kit;
pub mod noise;
pub mod oscillator;
pub mod render;

pub use error::RenderError;
pub use render::{render_instrumental, RENDER_SAMPLE_RATE};
