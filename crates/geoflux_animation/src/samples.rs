//! Value sample curves
//!
//! Layer animations describe their output as an ordered list of samples in
//! [0, 1], where 1.0 stands for the configured style value. The samples act
//! as evenly spaced keyframes over the eased progress.

use geoflux_core::{ConfigError, Result};
use smallvec::SmallVec;

/// Evenly spaced keyframe values
#[derive(Clone, Debug, PartialEq)]
pub struct ValueSamples {
    values: SmallVec<[f32; 4]>,
}

impl ValueSamples {
    pub fn new(values: &[f32]) -> Result<Self> {
        if values.is_empty() {
            return Err(ConfigError::EmptySamples);
        }
        if values.iter().any(|v| !v.is_finite()) {
            return Err(ConfigError::MalformedCurve(
                "animation value sample is not finite".to_string(),
            ));
        }
        Ok(Self {
            values: SmallVec::from_slice(values),
        })
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn first(&self) -> f32 {
        self.values[0]
    }

    pub fn last(&self) -> f32 {
        self.values[self.values.len() - 1]
    }

    /// Interpolated value at an eased progress.
    ///
    /// Progress outside [0, 1] (overshooting easings) extrapolates the first
    /// or last segment.
    pub fn sample(&self, progress: f32) -> f32 {
        let n = self.values.len();
        if n == 1 {
            return self.values[0];
        }

        let position = progress * (n - 1) as f32;
        let prev = (position.floor().max(0.0) as usize).min(n - 2);
        let local_progress = position - prev as f32;

        let a = self.values[prev];
        let b = self.values[prev + 1];
        a + (b - a) * local_progress
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_two_samples_are_linear() {
        let samples = ValueSamples::new(&[0.0, 1.0]).unwrap();
        assert_eq!(samples.sample(0.0), 0.0);
        assert_eq!(samples.sample(0.25), 0.25);
        assert_eq!(samples.sample(1.0), 1.0);
    }

    #[test]
    fn test_overshoot_extrapolates_end_segments() {
        let samples = ValueSamples::new(&[0.0, 1.0, 0.5]).unwrap();
        assert!((samples.sample(1.1) - 0.4).abs() < 1e-6);
        assert!((samples.sample(-0.1) + 0.2).abs() < 1e-6);

        let samples = ValueSamples::new(&[0.0, 1.0]).unwrap();
        assert!((samples.sample(1.1) - 1.1).abs() < 1e-6);
    }

    #[test]
    fn test_multiple_samples_are_evenly_spaced() {
        let samples = ValueSamples::new(&[0.0, 1.0, 0.5]).unwrap();
        assert_eq!(samples.sample(0.5), 1.0);
        assert_eq!(samples.sample(0.75), 0.75);
        assert_eq!(samples.first(), 0.0);
        assert_eq!(samples.last(), 0.5);
    }

    #[test]
    fn test_single_sample_is_constant() {
        let samples = ValueSamples::new(&[0.3]).unwrap();
        assert_eq!(samples.sample(0.0), 0.3);
        assert_eq!(samples.sample(0.9), 0.3);
    }

    #[test]
    fn test_rejects_empty() {
        assert_eq!(ValueSamples::new(&[]), Err(ConfigError::EmptySamples));
    }
}
