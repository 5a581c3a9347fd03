//! MIDI pitch math.

/// Concert pitch reference: A4 = MIDI 69 = 440 Hz.
pub const A4_MIDI: u8 = 69;
/// Frequency of A4 in Hz.
pub const A4_FREQ: f64 = 440.0;

/// Converts a MIDI note number to its frequency in Hz (equal temperament).
pub fn midi_to_freq(midi: u8) -> f64 {
    A4_FREQ * 2.0_f64.powf((midi as f64 - A4_MIDI as f64) / 12.0)
}

/// Converts a frequency in Hz to the nearest MIDI note number.
pub fn freq_to_midi(freq: f64) -> u8 {
    let midi = A4_MIDI as f64 + 12.0 * (freq / A4_FREQ).log2();
    midi.round().clamp(0.0, 127.0) as u8
}

/// Signed pitch difference between two frequencies, in cents.
pub fn cents_between(actual: f64, expected: f64) -> f64 {
    1200.0 * (actual / expected).log2()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn a4_is_440() {
        assert!((midi_to_freq(69) - 440.0).abs() < 1e-9);
    }

    #[test]
    fn octaves_double() {
        assert!((midi_to_freq(81) - 880.0).abs() < 1e-6);
        assert!((midi_to_freq(57) - 220.0).abs() < 1e-6);
    }

    #[test]
    fn middle_c() {
        // MIDI 60 = C4 ~ 261.63 Hz
        let c4 = midi_to_freq(60);
        assert!((c4 - 261.6256).abs() < 0.01);
        assert_eq!(freq_to_midi(c4), 60);
    }

    #[test]
    fn cents_symmetry() {
        assert!((cents_between(440.0, 440.0)).abs() < 1e-9);
        // One semitone = 100 cents
        assert!((cents_between(midi_to_freq(70), 440.0) - 100.0).abs() < 1e-6);
    }
}
