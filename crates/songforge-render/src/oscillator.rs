//! Basic waveform generators.
//!
//! Free functions evaluate one sample from a phase; [`PhaseAccumulator`]
//! tracks phase across samples, including under a changing frequency. The
//! saw and square generators use PolyBLEP to suppress aliasing at their
//! discontinuities.

/// Full circle in radians.
pub const TWO_PI: f64 = 2.0 * std::f64::consts::PI;

/// Sine wave at the given phase (radians).
pub fn sine(phase: f64) -> f64 {
    phase.sin()
}

/// Naive sawtooth at the given phase (radians).
pub fn sawtooth(phase: f64) -> f64 {
    let t = (phase / TWO_PI).fract();
    2.0 * t - 1.0
}

/// Naive square wave with duty cycle at the given phase (radians).
pub fn square(phase: f64, duty: f64) -> f64 {
    let t = (phase / TWO_PI).fract();
    if t < duty {
        1.0
    } else {
        -1.0
    }
}

/// Triangle wave at the given phase (radians).
pub fn triangle(phase: f64) -> f64 {
    let t = (phase / TWO_PI).fract();
    if t < 0.5 {
        4.0 * t - 1.0
    } else {
        3.0 - 4.0 * t
    }
}

/// PolyBLEP correction for a discontinuity at phase `t` (normalized 0..1)
/// with per-sample phase increment `dt`.
fn polyblep(t: f64, dt: f64) -> f64 {
    if t < dt {
        let x = t / dt;
        2.0 * x - x * x - 1.0
    } else if t > 1.0 - dt {
        let x = (t - 1.0) / dt;
        x * x + 2.0 * x + 1.0
    } else {
        0.0
    }
}

/// Band-limited sawtooth. `phase` is normalized (0..1), `dt` is the
/// per-sample phase increment.
pub fn polyblep_saw(phase: f64, dt: f64) -> f64 {
    2.0 * phase - 1.0 - polyblep(phase, dt)
}

/// Band-limited square wave with duty cycle.
pub fn polyblep_square(phase: f64, dt: f64, duty: f64) -> f64 {
    let naive = if phase < duty { 1.0 } else { -1.0 };
    naive + polyblep(phase, dt) - polyblep((phase + 1.0 - duty).fract(), dt)
}

/// Phase accumulator producing radians, tolerant of per-sample frequency
/// changes.
#[derive(Debug, Clone)]
pub struct PhaseAccumulator {
    phase: f64,
    sample_rate: f64,
}

impl PhaseAccumulator {
    /// Creates an accumulator at phase zero.
    pub fn new(sample_rate: f64) -> Self {
        Self {
            phase: 0.0,
            sample_rate,
        }
    }

    /// Returns the current phase (radians) and advances by one sample at
    /// `frequency`.
    pub fn advance(&mut self, frequency: f64) -> f64 {
        let current = self.phase;
        self.phase += TWO_PI * frequency / self.sample_rate;
        if self.phase >= TWO_PI {
            self.phase -= TWO_PI;
        }
        current
    }
}
