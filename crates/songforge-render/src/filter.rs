//! Biquad filters (Audio EQ Cookbook coefficients).

use std::f64::consts::PI;

/// Filter response shapes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterShape {
    Lowpass,
    Highpass,
    Bandpass,
}

/// Direct form I biquad.
#[derive(Debug, Clone)]
pub struct Biquad {
    b0: f64,
    b1: f64,
    b2: f64,
    a1: f64,
    a2: f64,
    x1: f64,
    x2: f64,
    y1: f64,
    y2: f64,
}

impl Biquad {
    /// Builds a filter for the given shape.
    ///
    /// `q` of 0.707 gives a Butterworth response for low/highpass; it is
    /// clamped to 0.5 to keep the coefficients finite.
    pub fn new(shape: FilterShape, frequency: f64, q: f64, sample_rate: f64) -> Self {
        let q = q.max(0.5);
        let omega = 2.0 * PI * frequency / sample_rate;
        let (sin_omega, cos_omega) = omega.sin_cos();
        let alpha = sin_omega / (2.0 * q);

        let (b0, b1, b2) = match shape {
            FilterShape::Lowpass => {
                let b1 = 1.0 - cos_omega;
                (b1 / 2.0, b1, b1 / 2.0)
            }
            FilterShape::Highpass => {
                let peak = 1.0 + cos_omega;
                (peak / 2.0, -peak, peak / 2.0)
            }
            FilterShape::Bandpass => (alpha, 0.0, -alpha),
        };
        let a0 = 1.0 + alpha;

        Self {
            b0: b0 / a0,
            b1: b1 / a0,
            b2: b2 / a0,
            a1: -2.0 * cos_omega / a0,
            a2: (1.0 - alpha) / a0,
            x1: 0.0,
            x2: 0.0,
            y1: 0.0,
            y2: 0.0,
        }
    }

    /// Filters one sample.
    pub fn process(&mut self, x: f64) -> f64 {
        let y = self.b0 * x + self.b1 * self.x1 + self.b2 * self.x2
            - self.a1 * self.y1
            - self.a2 * self.y2;
        self.x2 = self.x1;
        self.x1 = x;
        self.y2 = self.y1;
        self.y1 = y;
        y
    }

    /// Filters a buffer in place.
    pub fn process_buffer(&mut self, samples: &mut [f64]) {
        for sample in samples {
            *sample = self.process(*sample);
        }
    }
}
