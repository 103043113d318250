//! Summary statistics for materialized tensors.

use crate::tensor::Tensor;
use std::fmt;

/// Min, max, arithmetic mean, and population standard deviation of a
/// tensor's elements.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TensorStats {
    pub min: f32,
    pub max: f32,
    pub mean: f32,
    pub std: f32,
}

impl TensorStats {
    /// Compute statistics over every element of `tensor`.
    ///
    /// An empty tensor yields all zeros.
    pub fn compute(tensor: &Tensor) -> Self {
        let data = tensor.as_slice();
        if data.is_empty() {
            return Self {
                min: 0.0,
                max: 0.0,
                mean: 0.0,
                std: 0.0,
            };
        }

        let mut min = f32::INFINITY;
        let mut max = f32::NEG_INFINITY;
        let mut sum = 0.0f64;
        for &v in data {
            min = min.min(v);
            max = max.max(v);
            sum += f64::from(v);
        }
        let mean = sum / data.len() as f64;

        let mut sq_sum = 0.0f64;
        for &v in data {
            let d = f64::from(v) - mean;
            sq_sum += d * d;
        }
        let std = (sq_sum / data.len() as f64).sqrt();

        Self {
            min,
            max,
            mean: mean as f32,
            std: std as f32,
        }
    }
}

impl fmt::Display for TensorStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "min: {:.6}, mean: {:.6}, max: {:.6}, std: {:.6}",
            self.min, self.mean, self.max, self.std
        )
    }
}

/// Compute and log a tensor's statistics under its semantic name.
pub fn log_stats(name: &str, tensor: &Tensor) -> TensorStats {
    let stats = TensorStats::compute(tensor);
    tracing::info!(name, shape = ?tensor.shape(), %stats, "tensor statistics");
    stats
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stats_over_known_values() {
        let t = Tensor::from_vec(vec![1.0, 2.0, 3.0, 4.0], &[4]);
        let s = TensorStats::compute(&t);
        assert_eq!(s.min, 1.0);
        assert_eq!(s.max, 4.0);
        assert_eq!(s.mean, 2.5);
        // Population std of 1..4 is sqrt(1.25).
        assert!((s.std - 1.25f32.sqrt()).abs() < 1e-6);
    }

    #[test]
    fn constant_tensor_has_zero_std() {
        let t = Tensor::from_vec(vec![7.0; 9], &[3, 3]);
        let s = TensorStats::compute(&t);
        assert_eq!(s.mean, 7.0);
        assert_eq!(s.std, 0.0);
        assert_eq!(s.min, s.max);
    }

    #[test]
    fn display_formats_all_four_moments() {
        let t = Tensor::from_vec(vec![0.0, 1.0], &[2]);
        let line = TensorStats::compute(&t).to_string();
        assert!(line.contains("min:"));
        assert!(line.contains("mean:"));
        assert!(line.contains("max:"));
        assert!(line.contains("std:"));
    }
}
