//! Spread of a per-iteration sample.

/// Summary of a set of samples.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Distribution {
    pub count: usize,
    pub mean: f64,
    pub min: f64,
    pub max: f64,
    pub std_dev: f64,
    /// Half-width of the 95% confidence interval of the mean.
    pub error: f64,
}

impl Distribution {
    /// Summarise `samples`. Empty input gives all zeros.
    pub fn from_samples(samples: &[f64]) -> Self {
        if samples.is_empty() {
            return Self::default();
        }
        let n = samples.len() as f64;
        let mean = samples.iter().sum::<f64>() / n;
        let variance = samples.iter().map(|s| (s - mean).powi(2)).sum::<f64>() / n;
        let std_dev = variance.sqrt();
        Self {
            count: samples.len(),
            mean,
            min: samples.iter().copied().fold(f64::INFINITY, f64::min),
            max: samples.iter().copied().fold(f64::NEG_INFINITY, f64::max),
            std_dev,
            error: 1.96 * std_dev / n.sqrt(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_is_zero() {
        assert_eq!(Distribution::from_samples(&[]), Distribution::default());
    }

    #[test]
    fn test_spread() {
        let d = Distribution::from_samples(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]);
        assert_eq!(d.count, 8);
        assert_eq!(d.mean, 5.0);
        assert_eq!(d.std_dev, 2.0);
        assert_eq!(d.min, 2.0);
        assert_eq!(d.max, 9.0);
        assert!((d.error - 1.96 * 2.0 / 8f64.sqrt()).abs() < 1e-12);
    }

    #[test]
    fn test_constant_samples_have_no_error() {
        let d = Distribution::from_samples(&[100.0; 10]);
        assert_eq!(d.std_dev, 0.0);
        assert_eq!(d.error, 0.0);
    }
}
