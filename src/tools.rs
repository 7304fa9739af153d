//! Evaluation helpers: RMSE against ground truth and NIS consistency.

use nalgebra::Vector4;
use serde::Serialize;

use crate::error::{FilterError, FilterResult};
use crate::types::{SensorType, StateVec};

/// 95th percentile of the χ² distribution for 2 degrees of freedom
pub const CHI2_95_2DOF: f64 = 5.991;
/// 95th percentile of the χ² distribution for 3 degrees of freedom
pub const CHI2_95_3DOF: f64 = 7.815;

/// χ² 95% threshold for a measurement of `dof` dimensions, if tabulated.
pub fn chi_square_95(dof: usize) -> Option<f64> {
    match dof {
        1 => Some(3.841),
        2 => Some(CHI2_95_2DOF),
        3 => Some(CHI2_95_3DOF),
        4 => Some(9.488),
        _ => None,
    }
}

/// Root mean squared error per component (px, py, vx, vy).
pub fn calculate_rmse(
    estimations: &[Vector4<f64>],
    ground_truth: &[Vector4<f64>],
) -> FilterResult<Vector4<f64>> {
    if estimations.is_empty() {
        return Err(FilterError::InvalidInput(
            "no estimations to evaluate".to_string(),
        ));
    }
    if estimations.len() != ground_truth.len() {
        return Err(FilterError::InvalidInput(format!(
            "{} estimations but {} ground truth samples",
            estimations.len(),
            ground_truth.len()
        )));
    }

    let sum = estimations
        .iter()
        .zip(ground_truth)
        .fold(Vector4::zeros(), |acc, (est, gt)| {
            let residual = est - gt;
            acc + residual.component_mul(&residual)
        });

    Ok((sum / estimations.len() as f64).map(f64::sqrt))
}

/// Convert a CTRV state into (px, py, vx, vy).
pub fn cartesian_estimate(x: &StateVec) -> Vector4<f64> {
    let v = x[2];
    let yaw = x[3];
    Vector4::new(x[0], x[1], v * yaw.cos(), v * yaw.sin())
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
pub struct NisStats {
    pub samples: u64,
    /// Samples above the 95% χ² threshold
    pub exceeded: u64,
    pub mean: f64,
}

impl NisStats {
    /// Fraction of samples above the threshold; about 0.05 for a consistent filter
    pub fn exceed_fraction(&self) -> f64 {
        if self.samples == 0 {
            0.0
        } else {
            self.exceeded as f64 / self.samples as f64
        }
    }
}

/// Accumulates NIS values per sensor for a consistency check.
#[derive(Clone, Debug, Default)]
pub struct NisMonitor {
    lidar: NisStats,
    radar: NisStats,
}

impl NisMonitor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, sensor: SensorType, nis: f64) {
        let threshold = chi_square_95(sensor.measurement_dim()).unwrap_or(f64::INFINITY);
        let stats = match sensor {
            SensorType::Position => &mut self.lidar,
            SensorType::RangeBearing => &mut self.radar,
        };

        stats.samples += 1;
        if nis > threshold {
            stats.exceeded += 1;
        }
        // Running mean
        stats.mean += (nis - stats.mean) / stats.samples as f64;
    }

    pub fn stats(&self, sensor: SensorType) -> NisStats {
        match sensor {
            SensorType::Position => self.lidar,
            SensorType::RangeBearing => self.radar,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f64::consts::FRAC_PI_2;

    #[test]
    fn test_rmse() {
        let est = vec![
            Vector4::new(1.0, 1.0, 0.2, 0.1),
            Vector4::new(2.0, 2.0, 0.3, 0.2),
            Vector4::new(3.0, 3.0, 0.4, 0.3),
        ];
        let gt = vec![
            Vector4::new(1.1, 1.1, 0.3, 0.2),
            Vector4::new(2.1, 2.1, 0.4, 0.3),
            Vector4::new(3.1, 3.1, 0.5, 0.4),
        ];
        let rmse = calculate_rmse(&est, &gt).unwrap();
        for i in 0..4 {
            assert_relative_eq!(rmse[i], 0.1, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_rmse_mixed_errors() {
        let est = vec![Vector4::new(0.0, 0.0, 0.0, 0.0), Vector4::new(0.0, 0.0, 0.0, 0.0)];
        let gt = vec![Vector4::new(3.0, 0.0, 1.0, 0.0), Vector4::new(-1.0, 0.0, 1.0, 2.0)];
        let rmse = calculate_rmse(&est, &gt).unwrap();
        assert_relative_eq!(rmse[0], 5.0_f64.sqrt(), epsilon = 1e-12);
        assert_eq!(rmse[1], 0.0);
        assert_relative_eq!(rmse[2], 1.0, epsilon = 1e-12);
        assert_relative_eq!(rmse[3], 2.0_f64.sqrt(), epsilon = 1e-12);
    }

    #[test]
    fn test_rmse_invalid_input() {
        assert!(matches!(
            calculate_rmse(&[], &[]),
            Err(FilterError::InvalidInput(_))
        ));
        let one = vec![Vector4::zeros()];
        let two = vec![Vector4::zeros(), Vector4::zeros()];
        assert!(matches!(
            calculate_rmse(&one, &two),
            Err(FilterError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_cartesian_estimate() {
        let est = cartesian_estimate(&StateVec::new(1.0, 2.0, 3.0, FRAC_PI_2, 0.4));
        assert_relative_eq!(est[0], 1.0);
        assert_relative_eq!(est[1], 2.0);
        assert!(est[2].abs() < 1e-12);
        assert_relative_eq!(est[3], 3.0, epsilon = 1e-12);
    }

    #[test]
    fn test_nis_monitor() {
        let mut monitor = NisMonitor::new();
        for nis in [1.0, 2.0, 7.0, 3.0] {
            monitor.record(SensorType::Position, nis);
        }
        monitor.record(SensorType::RangeBearing, 7.0);

        let lidar = monitor.stats(SensorType::Position);
        assert_eq!(lidar.samples, 4);
        assert_eq!(lidar.exceeded, 1);
        assert_relative_eq!(lidar.mean, 3.25, epsilon = 1e-12);
        assert_relative_eq!(lidar.exceed_fraction(), 0.25);

        // 7.0 is below the 3-dof threshold
        let radar = monitor.stats(SensorType::RangeBearing);
        assert_eq!(radar.samples, 1);
        assert_eq!(radar.exceeded, 0);
    }

    #[test]
    fn test_chi_square_table() {
        assert_eq!(chi_square_95(2), Some(CHI2_95_2DOF));
        assert_eq!(chi_square_95(3), Some(CHI2_95_3DOF));
        assert_eq!(chi_square_95(12), None);
        assert_eq!(NisStats::default().exceed_fraction(), 0.0);
    }
}
