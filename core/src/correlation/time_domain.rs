use crate::math::StatsHelper;
use ndarray::Array2;

/// Pairwise correlation of z-scored columns.
///
/// Columns are scaled by `scale`, z-scored with the population (÷N) standard
/// deviation, and each pair is `Σ z1·z2 / (N − 1)`. The ÷N / ÷(N − 1) mix is
/// intentional, so self-correlation comes out as `N / (N − 1)` rather than 1.
pub fn correlate(columns: &[Vec<f64>], n_rows: usize, scale: f64) -> Array2<f64> {
    let zscored: Vec<Vec<f64>> = columns
        .iter()
        .map(|column| {
            let scaled: Vec<f64> = column.iter().map(|v| v * scale).collect();
            StatsHelper::zscores(&scaled)
        })
        .collect();

    let denom = n_rows as f64 - 1.0;
    let k = zscored.len();
    let mut values = Array2::zeros((k, k));
    for (i, z1) in zscored.iter().enumerate() {
        for (j, z2) in zscored.iter().enumerate() {
            let dot: f64 = z1.iter().zip(z2).map(|(a, b)| a * b).sum();
            values[[i, j]] = dot / denom;
        }
    }
    values
}
