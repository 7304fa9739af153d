use serde::Serialize;

use super::ctrv::predict_sigma_points;
use super::lidar::LidarModel;
use super::radar::RadarModel;
use super::sigma_points::{
    augmented_sigma_points, generate_sigma_points, predict_mean_and_covariance, sigma_weights,
};
use super::Correction;
use crate::config::UkfConfig;
use crate::error::{FilterError, FilterResult};
use crate::types::{
    LidarVec, MeasurementPackage, PredSigmaPoints, RadarVec, RawMeasurement, SensorType,
    SigmaWeights, StateMat, StateVec, AUG_SIGMA_COUNT,
};

/// Summary of one fused measurement.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct UpdateReport {
    pub sensor: SensorType,
    /// Elapsed time since the previous measurement [s]
    pub delta_t: f64,
    /// Normalized innovation squared
    pub nis: f64,
}

/// What a call to [`Ukf::process_measurement`] did.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub enum StepOutcome {
    /// First measurement seeded the state
    Initialized(SensorType),
    /// Sensor disabled; only the timestamp advanced
    Skipped(SensorType),
    /// Prediction and update ran
    Updated(UpdateReport),
}

#[derive(Clone, Debug, Serialize)]
pub struct UkfSnapshot {
    pub initialized: bool,
    /// Last seen timestamp [us]
    pub timestamp_us: Option<i64>,

    /// Position [m]
    pub position: (f64, f64),
    /// Speed magnitude [m/s]
    pub speed: f64,
    /// Heading [rad]
    pub yaw: f64,
    /// Heading rate [rad/s]
    pub yaw_rate: f64,

    /// Covariance trace for uncertainty
    pub covariance_trace: f64,

    /// Update counters
    pub lidar_updates: u64,
    pub radar_updates: u64,
    pub skipped: u64,
}

/// Unscented Kalman Filter with a CTRV motion model.
///
/// State vector (5D):
/// [0-1]: Position (px, py) [m]
/// [2]:   Speed magnitude v [m/s]
/// [3]:   Yaw angle [rad]
/// [4]:   Yaw rate [rad/s]
///
/// Fuses Cartesian position (lidar) and range/bearing/range-rate (radar)
/// readings delivered in non-decreasing timestamp order.
#[derive(Clone, Debug)]
pub struct Ukf {
    config: UkfConfig,

    is_initialized: bool,
    /// Timestamp of the last measurement [us]
    time_us: i64,

    /// State vector [5D]
    x: StateVec,
    /// Covariance matrix [5x5]
    p: StateMat,
    /// Predicted sigma points [5x15], reused by the update of the same cycle
    xsig_pred: PredSigmaPoints,

    /// Weights for sigma points
    weights: SigmaWeights,

    lidar: LidarModel,
    radar: RadarModel,

    lidar_updates: u64,
    radar_updates: u64,
    skipped: u64,
}

impl Default for Ukf {
    fn default() -> Self {
        Self::from_valid_config(UkfConfig::default())
    }
}

impl Ukf {
    /// Create a new filter, rejecting invalid noise parameters
    pub fn new(config: UkfConfig) -> FilterResult<Self> {
        config.validate()?;
        Ok(Self::from_valid_config(config))
    }

    fn from_valid_config(config: UkfConfig) -> Self {
        let weights = sigma_weights::<AUG_SIGMA_COUNT>(config.lambda);
        let lidar = LidarModel::new(config.std_laspx, config.std_laspy);
        let radar = RadarModel::new(
            config.std_radr,
            config.std_radphi,
            config.std_radrd,
            config.min_range,
        );

        Self {
            config,
            is_initialized: false,
            time_us: 0,
            x: StateVec::zeros(),
            p: StateMat::identity(),
            xsig_pred: PredSigmaPoints::zeros(),
            weights,
            lidar,
            radar,
            lidar_updates: 0,
            radar_updates: 0,
            skipped: 0,
        }
    }

    pub fn config(&self) -> &UkfConfig {
        &self.config
    }

    pub fn is_initialized(&self) -> bool {
        self.is_initialized
    }

    /// Current state estimate (px, py, v, yaw, yaw_rate)
    pub fn state(&self) -> &StateVec {
        &self.x
    }

    pub fn covariance(&self) -> &StateMat {
        &self.p
    }

    pub fn last_timestamp(&self) -> Option<i64> {
        self.is_initialized.then_some(self.time_us)
    }

    pub fn snapshot(&self) -> UkfSnapshot {
        UkfSnapshot {
            initialized: self.is_initialized,
            timestamp_us: self.last_timestamp(),
            position: (self.x[0], self.x[1]),
            speed: self.x[2],
            yaw: self.x[3],
            yaw_rate: self.x[4],
            covariance_trace: self.p.trace(),
            lidar_updates: self.lidar_updates,
            radar_updates: self.radar_updates,
            skipped: self.skipped,
        }
    }

    /// Set state manually (for testing/initialization)
    pub fn set_state(&mut self, x: StateVec, p: StateMat, timestamp_us: i64) {
        self.x = x;
        self.p = p;
        self.time_us = timestamp_us;
        self.is_initialized = true;
    }

    /// Drop the belief; the next measurement re-initializes the filter
    pub fn reset(&mut self) {
        self.is_initialized = false;
        self.time_us = 0;
        self.x = StateVec::zeros();
        self.p = StateMat::identity();
        self.xsig_pred = PredSigmaPoints::zeros();
    }

    /// Run one filter cycle for a measurement.
    ///
    /// Non-finite readings are rejected before anything changes. Otherwise
    /// the timestamp advances before prediction, so it moves even when the
    /// sensor is disabled or the cycle fails. A failed cycle leaves the state,
    /// covariance and predicted sigma points as they were.
    pub fn process_measurement(&mut self, meas: &MeasurementPackage) -> FilterResult<StepOutcome> {
        let sensor = meas.sensor_type();
        meas.validate()?;

        if !self.is_initialized {
            self.initialize(meas);
            return Ok(StepOutcome::Initialized(sensor));
        }

        if meas.timestamp_us < self.time_us {
            return Err(FilterError::OutOfOrder {
                previous: self.time_us,
                current: meas.timestamp_us,
            });
        }

        let delta_t = (meas.timestamp_us - self.time_us) as f64 / 1_000_000.0;
        self.time_us = meas.timestamp_us;
        log::debug!("{} measurement, dt = {:.6} s", sensor, delta_t);

        let enabled = match sensor {
            SensorType::Position => self.config.use_laser,
            SensorType::RangeBearing => self.config.use_radar,
        };
        if !enabled {
            log::debug!("{} sensor disabled, skipping", sensor);
            self.skipped += 1;
            return Ok(StepOutcome::Skipped(sensor));
        }

        let saved = (self.x, self.p, self.xsig_pred);
        match self.predict_and_update(meas, delta_t) {
            Ok(nis) => Ok(StepOutcome::Updated(UpdateReport {
                sensor,
                delta_t,
                nis,
            })),
            Err(err) => {
                log::warn!("Rejected {} cycle at {} us: {}", sensor, meas.timestamp_us, err);
                (self.x, self.p, self.xsig_pred) = saved;
                Err(err)
            }
        }
    }

    fn predict_and_update(&mut self, meas: &MeasurementPackage, delta_t: f64) -> FilterResult<f64> {
        self.prediction(delta_t)?;
        match meas.raw {
            RawMeasurement::Position { px, py } => self.update_lidar(&LidarVec::new(px, py)),
            RawMeasurement::RangeBearing { rho, phi, rho_dot } => {
                self.update_radar(&RadarVec::new(rho, phi, rho_dot))
            }
        }
    }

    fn initialize(&mut self, meas: &MeasurementPackage) {
        self.x = match meas.raw {
            // Initial location, zero velocity
            RawMeasurement::Position { px, py } => StateVec::new(px, py, 0.0, 0.0, 0.0),
            // Range rate stands in for speed, bearing for heading
            RawMeasurement::RangeBearing { rho, phi, rho_dot } => {
                StateVec::new(rho * phi.cos(), rho * phi.sin(), rho_dot, phi, 0.0)
            }
        };
        self.p = StateMat::identity();
        self.time_us = meas.timestamp_us;
        self.is_initialized = true;

        log::debug!(
            "Initialized from {} measurement at {} us: x ={}",
            meas.sensor_type(),
            meas.timestamp_us,
            self.x.transpose()
        );
    }

    /// Predict step: propagate sigma points through CTRV, then recover the
    /// predicted mean and covariance.
    ///
    /// On error nothing is modified.
    pub fn prediction(&mut self, delta_t: f64) -> FilterResult<()> {
        if log::log_enabled!(log::Level::Trace) {
            match generate_sigma_points(&self.x, &self.p, self.config.lambda) {
                Ok(xsig) => log::trace!("Xsig:{}", xsig),
                Err(err) => log::trace!("Xsig unavailable: {}", err),
            }
        }

        let xsig_aug = augmented_sigma_points(
            &self.x,
            &self.p,
            self.config.std_a,
            self.config.std_yawdd,
            self.config.lambda,
        )?;
        let xsig_pred = predict_sigma_points(&xsig_aug, delta_t);
        let (x, p) = predict_mean_and_covariance(&xsig_pred, &self.weights);

        self.xsig_pred = xsig_pred;
        self.x = x;
        self.p = p;
        log::trace!("predicted x:{}P:{}", self.x, self.p);

        Ok(())
    }

    /// Linear update from a position measurement. Returns the NIS.
    pub fn update_lidar(&mut self, z: &LidarVec) -> FilterResult<f64> {
        let correction = self.lidar.update(&self.x, &self.p, z)?;
        self.lidar_updates += 1;
        Ok(self.apply(correction))
    }

    /// Unscented update from a range/bearing/range-rate measurement, using
    /// the sigma points of the preceding prediction. Returns the NIS.
    pub fn update_radar(&mut self, z: &RadarVec) -> FilterResult<f64> {
        let prediction = self.radar.predict_measurement(&self.xsig_pred, &self.weights);
        let correction = self.radar.update_state(
            &self.x,
            &self.p,
            &self.xsig_pred,
            &self.weights,
            &prediction,
            z,
        )?;
        self.radar_updates += 1;
        Ok(self.apply(correction))
    }

    fn apply(&mut self, correction: Correction) -> f64 {
        self.x = correction.x;
        self.p = correction.p;
        log::trace!("updated x:{}P:{}", self.x, self.p);
        correction.nis
    }
}
