pub mod linalg;

pub use linalg::*;

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{FilterError, FilterResult};

/// Which sensor produced a measurement.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SensorType {
    /// Cartesian position sensor (lidar)
    Position,
    /// Polar range / bearing / range-rate sensor (radar)
    RangeBearing,
}

impl SensorType {
    /// Number of raw values this sensor reports
    pub fn measurement_dim(self) -> usize {
        match self {
            SensorType::Position => MEASURE_DIM_LIDAR,
            SensorType::RangeBearing => MEASURE_DIM_RADAR,
        }
    }
}

impl fmt::Display for SensorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SensorType::Position => write!(f, "position"),
            SensorType::RangeBearing => write!(f, "range-bearing"),
        }
    }
}

/// Raw sensor values carried by a [`MeasurementPackage`].
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub enum RawMeasurement {
    /// Position in meters
    Position { px: f64, py: f64 },
    /// Range [m], bearing [rad], range rate [m/s]
    RangeBearing { rho: f64, phi: f64, rho_dot: f64 },
}

impl RawMeasurement {
    fn finite_count(&self) -> usize {
        match *self {
            RawMeasurement::Position { px, py } => {
                [px, py].iter().filter(|v| v.is_finite()).count()
            }
            RawMeasurement::RangeBearing { rho, phi, rho_dot } => {
                [rho, phi, rho_dot].iter().filter(|v| v.is_finite()).count()
            }
        }
    }
}

/// A single timestamped sensor reading. Consumed once by the filter.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct MeasurementPackage {
    /// Timestamp in microseconds
    pub timestamp_us: i64,
    pub raw: RawMeasurement,
}

impl MeasurementPackage {
    pub fn position(px: f64, py: f64, timestamp_us: i64) -> Self {
        Self {
            timestamp_us,
            raw: RawMeasurement::Position { px, py },
        }
    }

    pub fn range_bearing(rho: f64, phi: f64, rho_dot: f64, timestamp_us: i64) -> Self {
        Self {
            timestamp_us,
            raw: RawMeasurement::RangeBearing { rho, phi, rho_dot },
        }
    }

    /// Build a package from an untyped value slice, checking its length
    /// against the sensor type and rejecting non-finite values.
    pub fn from_raw(sensor: SensorType, values: &[f64], timestamp_us: i64) -> FilterResult<Self> {
        let expected = sensor.measurement_dim();
        if values.len() != expected || values.iter().any(|v| !v.is_finite()) {
            return Err(FilterError::InvalidMeasurement {
                sensor,
                expected,
                got: values.len(),
            });
        }

        Ok(match sensor {
            SensorType::Position => Self::position(values[0], values[1], timestamp_us),
            SensorType::RangeBearing => {
                Self::range_bearing(values[0], values[1], values[2], timestamp_us)
            }
        })
    }

    /// Reject packages carrying NaN or infinite values.
    pub fn validate(&self) -> FilterResult<()> {
        let sensor = self.sensor_type();
        let finite = self.raw.finite_count();
        if finite != sensor.measurement_dim() {
            return Err(FilterError::InvalidMeasurement {
                sensor,
                expected: sensor.measurement_dim(),
                got: finite,
            });
        }
        Ok(())
    }

    pub fn sensor_type(&self) -> SensorType {
        match self.raw {
            RawMeasurement::Position { .. } => SensorType::Position,
            RawMeasurement::RangeBearing { .. } => SensorType::RangeBearing,
        }
    }
}
