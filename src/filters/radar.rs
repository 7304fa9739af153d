//! Nonlinear (unscented) update for the range / bearing / range-rate sensor.

use super::sigma_points::state_residual;
use super::Correction;
use crate::angle::normalize_angle;
use crate::error::{FilterError, FilterResult};
use crate::types::{
    KalmanGainRadar, PredSigmaPoints, RadarNoise, RadarSigmaPoints, RadarVec, SensorType,
    SigmaWeights, StateMat, StateVec, BEARING_INDEX,
};

/// Predicted measurement distribution for one radar cycle.
#[derive(Clone, Debug)]
pub struct RadarPrediction {
    /// Weighted mean of the measurement sigma points
    pub z_pred: RadarVec,
    /// Innovation covariance S, including R
    pub s: RadarNoise,
    /// Predicted sigma points mapped into measurement space
    pub z_sig: RadarSigmaPoints,
}

#[derive(Clone, Debug)]
pub struct RadarModel {
    /// Measurement noise R = diag(σ_r², σ_φ², σ_ṙ²)
    r: RadarNoise,
    /// Floor for the range-rate denominator [m]
    min_range: f64,
}

impl RadarModel {
    pub fn new(std_radr: f64, std_radphi: f64, std_radrd: f64, min_range: f64) -> Self {
        let r = RadarNoise::from_diagonal(&RadarVec::new(
            std_radr * std_radr,
            std_radphi * std_radphi,
            std_radrd * std_radrd,
        ));
        Self { r, min_range }
    }

    pub fn noise(&self) -> &RadarNoise {
        &self.r
    }

    /// Map a state into (rho, phi, rho_dot).
    ///
    /// Range rate uses the state's own yaw. Ranges below `min_range` are
    /// clamped in the range-rate denominator.
    pub fn measurement_function(&self, state: &StateVec) -> RadarVec {
        let p_x = state[0];
        let p_y = state[1];
        let v = state[2];
        let yaw = state[3];

        let v1 = yaw.cos() * v;
        let v2 = yaw.sin() * v;

        let rho = p_x.hypot(p_y);
        let phi = p_y.atan2(p_x);
        let rho_dot = (p_x * v1 + p_y * v2) / rho.max(self.min_range);

        RadarVec::new(rho, phi, rho_dot)
    }

    /// Transform predicted sigma points into measurement space and recover
    /// the predicted measurement and innovation covariance.
    ///
    /// The bearing mean is a plain weighted sum, so it is biased when the
    /// sigma points straddle the ±π seam (targets on the negative x-axis).
    pub fn predict_measurement(
        &self,
        xsig_pred: &PredSigmaPoints,
        weights: &SigmaWeights,
    ) -> RadarPrediction {
        let mut z_sig = RadarSigmaPoints::zeros();
        for (i, column) in xsig_pred.column_iter().enumerate() {
            z_sig.set_column(i, &self.measurement_function(&column.into_owned()));
        }

        let z_pred = z_sig * weights;

        let mut s = RadarNoise::zeros();
        for (i, column) in z_sig.column_iter().enumerate() {
            let z_diff = measurement_residual(&(column - &z_pred));
            s += weights[i] * z_diff * z_diff.transpose();
        }
        s += self.noise();

        log::trace!("radar z_pred:{}S:{}", z_pred, s);

        RadarPrediction { z_pred, s, z_sig }
    }

    /// Fuse a radar measurement into the predicted belief.
    pub fn update_state(
        &self,
        x: &StateVec,
        p: &StateMat,
        xsig_pred: &PredSigmaPoints,
        weights: &SigmaWeights,
        prediction: &RadarPrediction,
        z: &RadarVec,
    ) -> FilterResult<Correction> {
        // Cross correlation Tc
        let mut tc = KalmanGainRadar::zeros();
        for i in 0..xsig_pred.ncols() {
            let z_diff = measurement_residual(&(prediction.z_sig.column(i) - &prediction.z_pred));
            let x_diff = state_residual(&(xsig_pred.column(i) - x));
            tc += weights[i] * x_diff * z_diff.transpose();
        }

        let Some(s_inv) = prediction.s.try_inverse() else {
            return Err(FilterError::SingularInnovation(SensorType::RangeBearing));
        };

        let k = tc * s_inv;
        let z_diff = measurement_residual(&(z - prediction.z_pred));
        log::trace!("radar K:{}", k);

        let x_new = x + k * z_diff;
        let p_new = p - k * prediction.s * k.transpose();
        let nis = (z_diff.transpose() * s_inv * z_diff)[0];

        Ok(Correction {
            x: x_new,
            p: super::symmetrize(&p_new),
            nis,
        })
    }
}

/// Measurement difference with the bearing component wrapped into (-π, π].
pub fn measurement_residual(diff: &RadarVec) -> RadarVec {
    let mut residual = *diff;
    residual[BEARING_INDEX] = normalize_angle(residual[BEARING_INDEX]);
    residual
}
