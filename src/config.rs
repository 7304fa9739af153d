use serde::{Deserialize, Serialize};

use crate::error::{FilterError, FilterResult};
use crate::types::{AUG_STATE_DIM, STATE_DIM};

/// Filter configuration, fixed at construction.
///
/// Measurement noise values are provided by the sensor manufacturer and
/// should not be changed. `std_a` and `std_yawdd` are tunable, but the
/// initial covariance (identity) was tuned against them.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UkfConfig {
    /// If false, position measurements are ignored (except during init)
    pub use_laser: bool,
    /// If false, range/bearing measurements are ignored (except during init)
    pub use_radar: bool,

    /// Sigma point spreading parameter
    pub lambda: f64,

    /// Process noise std-dev, longitudinal acceleration [m/s²]
    pub std_a: f64,
    /// Process noise std-dev, yaw acceleration [rad/s²]
    pub std_yawdd: f64,

    /// Lidar noise std-dev, x position [m]
    pub std_laspx: f64,
    /// Lidar noise std-dev, y position [m]
    pub std_laspy: f64,

    /// Radar noise std-dev, range [m]
    pub std_radr: f64,
    /// Radar noise std-dev, bearing [rad]
    pub std_radphi: f64,
    /// Radar noise std-dev, range rate [m/s]
    pub std_radrd: f64,

    /// Floor for the range used as range-rate denominator [m]
    pub min_range: f64,
}

impl Default for UkfConfig {
    fn default() -> Self {
        Self {
            use_laser: true,
            use_radar: true,
            lambda: 3.0,
            std_a: 5.0,
            std_yawdd: 8.0,
            std_laspx: 0.15,
            std_laspy: 0.15,
            std_radr: 0.3,
            std_radphi: 0.03,
            std_radrd: 0.3,
            min_range: 1e-4,
        }
    }
}

impl UkfConfig {
    pub fn validate(&self) -> FilterResult<()> {
        let positive = [
            ("std_a", self.std_a),
            ("std_yawdd", self.std_yawdd),
            ("std_laspx", self.std_laspx),
            ("std_laspy", self.std_laspy),
            ("std_radr", self.std_radr),
            ("std_radphi", self.std_radphi),
            ("std_radrd", self.std_radrd),
            ("min_range", self.min_range),
        ];
        for (name, value) in positive {
            if !(value.is_finite() && value > 0.0) {
                return Err(FilterError::InvalidConfig(format!(
                    "{name} must be positive and finite, got {value}"
                )));
            }
        }

        // Both sigma point sets take sqrt(lambda + n)
        let n_min = STATE_DIM.min(AUG_STATE_DIM) as f64;
        if !self.lambda.is_finite() || self.lambda + n_min <= 0.0 {
            return Err(FilterError::InvalidConfig(format!(
                "lambda + {n_min} must be positive, got lambda = {}",
                self.lambda
            )));
        }

        Ok(())
    }
}
