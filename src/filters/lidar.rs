//! Linear Kalman update for the Cartesian position sensor.

use super::Correction;
use crate::error::{FilterError, FilterResult};
use crate::types::{
    KalmanGainLidar, LidarJacobian, LidarNoise, LidarVec, SensorType, StateMat, StateVec,
};

#[derive(Clone, Debug)]
pub struct LidarModel {
    /// Selects (px, py) from the state
    h: LidarJacobian,
    /// Measurement noise R = diag(σ_px², σ_py²)
    r: LidarNoise,
}

impl LidarModel {
    pub fn new(std_px: f64, std_py: f64) -> Self {
        let mut h = LidarJacobian::zeros();
        h[(0, 0)] = 1.0;
        h[(1, 1)] = 1.0;

        let r = LidarNoise::from_diagonal(&LidarVec::new(std_px * std_px, std_py * std_py));

        Self { h, r }
    }

    pub fn h(&self) -> &LidarJacobian {
        &self.h
    }

    pub fn noise(&self) -> &LidarNoise {
        &self.r
    }

    /// Standard Kalman update with measurement `z = H x`.
    pub fn update(&self, x: &StateVec, p: &StateMat, z: &LidarVec) -> FilterResult<Correction> {
        let h = self.h();
        let y = z - h * x;
        let ht = h.transpose();
        let s = h * p * ht + self.noise();

        let Some(s_inv) = s.try_inverse() else {
            return Err(FilterError::SingularInnovation(SensorType::Position));
        };

        let k: KalmanGainLidar = p * ht * s_inv;
        log::trace!("lidar S:{}K:{}", s, k);

        let x_new = x + k * y;
        let p_new = (StateMat::identity() - k * h) * p;
        let nis = (y.transpose() * s_inv * y)[0];

        Ok(Correction {
            x: x_new,
            p: super::symmetrize(&p_new),
            nis,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::{assert_abs_diff_eq, assert_relative_eq};

    fn belief() -> (StateVec, StateMat) {
        let x = StateVec::new(1.0, 2.0, 3.0, 0.4, 0.1);
        let mut p = StateMat::identity() * 0.5;
        p[(0, 2)] = 0.1;
        p[(2, 0)] = 0.1;
        (x, p)
    }

    #[test]
    fn test_noise_is_variance() {
        let model = LidarModel::new(0.15, 0.15);
        assert_relative_eq!(model.noise()[(0, 0)], 0.0225, epsilon = 1e-12);
        assert_relative_eq!(model.noise()[(1, 1)], 0.0225, epsilon = 1e-12);
        assert_eq!(model.noise()[(0, 1)], 0.0);
    }

    #[test]
    fn test_zero_innovation_keeps_state() {
        let model = LidarModel::new(0.15, 0.15);
        let (x, p) = belief();
        let z = model.h() * x;

        let c = model.update(&x, &p, &z).unwrap();
        assert_abs_diff_eq!(c.x, x, epsilon = 1e-12);
        assert_abs_diff_eq!(c.nis, 0.0, epsilon = 1e-12);
        // Covariance still contracts on the observed axes
        assert!(c.p[(0, 0)] < p[(0, 0)]);
        assert!(c.p[(1, 1)] < p[(1, 1)]);
        assert_abs_diff_eq!(c.p[(4, 4)], p[(4, 4)], epsilon = 1e-12);
        assert_abs_diff_eq!(c.p, c.p.transpose(), epsilon = 1e-12);
    }

    #[test]
    fn test_pulls_toward_measurement() {
        let model = LidarModel::new(0.15, 0.15);
        let (x, p) = belief();
        let z = LidarVec::new(1.5, 1.5);

        let c = model.update(&x, &p, &z).unwrap();
        assert!(c.x[0] > 1.0 && c.x[0] < 1.5);
        assert!(c.x[1] < 2.0 && c.x[1] > 1.5);
        // Correlated velocity follows the position correction
        assert!(c.x[2] > 3.0);
        assert!(c.nis > 0.0);
    }

    #[test]
    fn test_scalar_gain() {
        // Uncorrelated 1-D check: K = P / (P + R)
        let model = LidarModel::new(1.0, 1.0);
        let x = StateVec::zeros();
        let p = StateMat::identity();
        let c = model.update(&x, &p, &LidarVec::new(2.0, -4.0)).unwrap();

        assert_relative_eq!(c.x[0], 1.0, epsilon = 1e-12);
        assert_relative_eq!(c.x[1], -2.0, epsilon = 1e-12);
        assert_relative_eq!(c.p[(0, 0)], 0.5, epsilon = 1e-12);
        assert_relative_eq!(c.nis, (4.0 + 16.0) / 2.0, epsilon = 1e-12);
    }

    #[test]
    fn test_singular_innovation() {
        let model = LidarModel::new(1e-200, 1e-200);
        let x = StateVec::zeros();
        let p = StateMat::zeros();
        assert_eq!(
            model.update(&x, &p, &LidarVec::zeros()).unwrap_err(),
            FilterError::SingularInnovation(SensorType::Position)
        );
    }
}
