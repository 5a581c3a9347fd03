//! Songforge Mixer / Mastering
//!
//! Sums stems onto a stereo bus (equal-power panning, soft-knee bus
//! compression), normalizes to the tier's loudness target, and encodes the
//! result as a tiered [`Master`](songforge_core::Master):
//!
//! - **preview** — watermarked, reduced-resolution, compressed hard.
//! - **clean** — full-rate, streaming loudness.
//! - **studio** — lossless with headroom, stems included.
//!
//! [`mix`] is a pure function of its inputs; tiers render independently and
//! in any order.

pub mod bus;
pub mod encode;
pub mod error;
pub mod master;
pub mod watermark;

pub use error::MixError;
pub use master::{mix, TierPolicy};
