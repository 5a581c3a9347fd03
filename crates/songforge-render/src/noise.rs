//! Noise generators.

use rand::Rng;
use rand_pcg::Pcg32;

/// Uniform white noise in -1..1.
pub fn white(num_samples: usize, rng: &mut Pcg32) -> Vec<f64> {
    (0..num_samples).map(|_| rng.gen_range(-1.0..1.0)).collect()
}

/// Pink noise via the Voss-McCartney octave-bank approximation.
pub fn pink(num_samples: usize, rng: &mut Pcg32) -> Vec<f64> {
    const ROWS: usize = 8;
    let mut bank = [0.0f64; ROWS];
    for value in bank.iter_mut() {
        *value = rng.gen_range(-1.0..1.0);
    }

    let mut output = Vec::with_capacity(num_samples);
    for i in 0..num_samples {
        // Update the row whose bit flipped at this counter position.
        let row = (i + 1).trailing_zeros() as usize;
        if row < ROWS {
            bank[row] = rng.gen_range(-1.0..1.0);
        }
        let sum: f64 = bank.iter().sum();
        output.push(sum / ROWS as f64);
    }
    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    #[test]
    fn white_noise_is_bounded_and_deterministic() {
        let mut rng1 = Pcg32::seed_from_u64(9);
        let mut rng2 = Pcg32::seed_from_u64(9);
        let a = white(4096, &mut rng1);
        let b = white(4096, &mut rng2);
        assert_eq!(a, b);
        assert!(a.iter().all(|s| (-1.0..1.0).contains(s)));
    }

    #[test]
    fn pink_noise_has_less_high_frequency_energy_than_white() {
        let mut rng = Pcg32::seed_from_u64(11);
        let w = white(16384, &mut rng);
        let p = pink(16384, &mut rng);

        // Sample-to-sample difference energy is a crude high-band proxy.
        let diff_energy = |s: &[f64]| {
            let total: f64 = s.iter().map(|x| x * x).sum();
            let diff: f64 = s.windows(2).map(|w| (w[1] - w[0]).powi(2)).sum();
            diff / total
        };
        assert!(diff_energy(&p) < diff_energy(&w));
    }
}
