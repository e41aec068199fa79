use crate::math::StatsHelper;
use ndarray::Array2;
use num_complex::Complex64;

/// Magnitude-normalized real cross power between complex spectra.
///
/// Per pair: `cross = Σ(re1·re2 − im1·im2)`, normalized by the square root of
/// the product of the population variances of the two magnitude sequences,
/// then divided by `N − 1`. This is not a coherence estimate.
pub fn correlate(columns: &[Vec<Complex64>], n_rows: usize) -> Array2<f64> {
    let variances: Vec<f64> = columns
        .iter()
        .map(|column| {
            let magnitudes: Vec<f64> = column.iter().map(|c| c.norm()).collect();
            if StatsHelper::is_constant(&magnitudes) {
                0.0
            } else {
                StatsHelper::population_variance(&magnitudes)
            }
        })
        .collect();

    let denom = n_rows as f64 - 1.0;
    let k = columns.len();
    let mut values = Array2::zeros((k, k));
    for (i, c1) in columns.iter().enumerate() {
        for (j, c2) in columns.iter().enumerate() {
            let cross: f64 = c1
                .iter()
                .zip(c2)
                .map(|(a, b)| a.re * b.re - a.im * b.im)
                .sum();
            let spread = (variances[i] * variances[j]).sqrt();
            values[[i, j]] = if spread == 0.0 {
                f64::NAN
            } else {
                cross / spread / denom
            };
        }
    }
    values
}

#[cfg(test)]
mod tests {
    use super::*;

    fn real(values: &[f64]) -> Vec<Complex64> {
        values.iter().map(|&v| Complex64::new(v, 0.0)).collect()
    }

    fn imaginary(values: &[f64]) -> Vec<Complex64> {
        values.iter().map(|&v| Complex64::new(0.0, v)).collect()
    }

    #[test]
    fn real_spectra_match_hand_computation() {
        // cross = 1 + 4 + 9 = 14, var(|c|) = 2/3, 14 / (2/3) / 2 = 10.5
        let values = correlate(&[real(&[1.0, 2.0, 3.0])], 3);
        assert!((values[[0, 0]] - 10.5).abs() < 1e-12);
    }

    #[test]
    fn imaginary_parts_enter_with_negative_sign() {
        let values = correlate(&[imaginary(&[1.0, 2.0, 3.0]), real(&[1.0, 2.0, 3.0])], 3);
        assert!((values[[0, 0]] + 10.5).abs() < 1e-12);
        assert!(values[[0, 1]].abs() < 1e-12);
        assert_eq!(values[[0, 1]], values[[1, 0]]);
    }

    #[test]
    fn flat_magnitude_gives_nan() {
        let flat = vec![
            Complex64::new(1.0, 0.0),
            Complex64::new(0.0, 1.0),
            Complex64::new(-1.0, 0.0),
        ];
        let values = correlate(&[flat, real(&[1.0, 2.0, 4.0])], 3);
        assert!(values[[0, 1]].is_nan());
        assert!(values[[1, 0]].is_nan());
        assert!(values[[1, 1]].is_finite());
    }

    #[test]
    fn inexact_constant_magnitude_gives_nan() {
        for n in [3, 7] {
            let constant = real(&vec![0.7e-6; n]);
            let ramp: Vec<f64> = (0..n).map(|i| i as f64).collect();
            let values = correlate(&[constant, real(&ramp)], n);
            assert!(values[[0, 0]].is_nan());
            assert!(values[[0, 1]].is_nan());
            assert!(values[[1, 0]].is_nan());
            assert!(values[[1, 1]].is_finite());
        }
    }
}
