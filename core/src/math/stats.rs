pub struct StatsHelper;

impl StatsHelper {
    /// Arithmetic mean, NaN for an empty slice.
    pub fn mean(samples: &[f64]) -> f64 {
        samples.iter().sum::<f64>() / samples.len() as f64
    }

    /// Variance dividing by N.
    pub fn population_variance(samples: &[f64]) -> f64 {
        let mean = Self::mean(samples);
        samples.iter().map(|&v| (v - mean) * (v - mean)).sum::<f64>() / samples.len() as f64
    }

    /// True when every sample equals the first one.
    ///
    /// Checked on the values themselves: the computed variance of a constant
    /// column can come out as a tiny positive number from rounding in the mean.
    pub fn is_constant(samples: &[f64]) -> bool {
        match samples.split_first() {
            Some((first, rest)) => rest.iter().all(|v| v == first),
            None => false,
        }
    }

    /// `(v - mean) / stddev` with population stddev.
    ///
    /// A constant column has zero stddev and every z-score is NaN.
    pub fn zscores(samples: &[f64]) -> Vec<f64> {
        let mean = Self::mean(samples);
        let stddev = if Self::is_constant(samples) {
            0.0
        } else {
            Self::population_variance(samples).sqrt()
        };
        samples
            .iter()
            .map(|&v| {
                if stddev == 0.0 {
                    f64::NAN
                } else {
                    (v - mean) / stddev
                }
            })
            .collect()
    }
}
