//! Preview watermark.
//!
//! Short tone bursts at a fixed period, mixed in at low level while the
//! program audio dips underneath them. Placement is a pure function of the
//! sample clock, so the same bus always watermarks identically.

use crate::bus::StereoBus;

/// Seconds between burst starts.
const PERIOD_SECONDS: f64 = 5.0;
/// Burst length in seconds.
const BURST_SECONDS: f64 = 0.25;
/// Burst tone frequency.
const TONE_HZ: f64 = 1000.0;
/// Burst level.
const TONE_GAIN: f64 = 0.12;
/// Program level multiplier during a burst.
const DUCK_GAIN: f64 = 0.7;

/// Stamps the watermark onto the bus in place.
pub fn apply_watermark(bus: &mut StereoBus, sample_rate: f64) {
    let period = (PERIOD_SECONDS * sample_rate) as usize;
    let burst = (BURST_SECONDS * sample_rate) as usize;
    if period == 0 || burst == 0 {
        return;
    }

    for i in 0..bus.left.len() {
        let in_burst = i % period < burst;
        if !in_burst {
            continue;
        }
        let t = i as f64 / sample_rate;
        let tone = (2.0 * std::f64::consts::PI * TONE_HZ * t).sin() * TONE_GAIN;
        bus.left[i] = bus.left[i] * DUCK_GAIN + tone;
        bus.right[i] = bus.right[i] * DUCK_GAIN + tone;
    }
}
