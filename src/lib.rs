//! Unscented Kalman Filter for a CTRV (constant turn rate and velocity)
//! target, fusing Cartesian position (lidar) and range/bearing/range-rate
//! (radar) measurements.
//!
//! ```no_run
//! use ctrv_ukf::{MeasurementPackage, Ukf};
//!
//! let mut ukf = Ukf::default();
//! ukf.process_measurement(&MeasurementPackage::position(1.0, 2.0, 0))?;
//! ukf.process_measurement(&MeasurementPackage::range_bearing(2.3, 1.1, 0.5, 50_000))?;
//! println!("{}", ukf.state());
//! # Ok::<(), ctrv_ukf::FilterError>(())
//! ```

pub mod angle;
pub mod config;
pub mod dataset;
pub mod error;
pub mod filters;
pub mod tools;
pub mod types;

pub use config::UkfConfig;
pub use error::{FilterError, FilterResult};
pub use filters::{StepOutcome, Ukf, UkfSnapshot, UpdateReport};
pub use types::{MeasurementPackage, RawMeasurement, SensorType};
