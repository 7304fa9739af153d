//! Linear algebra type system for the CTRV filter
//!
//! Provides compile-time dimension checking and clean type aliases
//! for the prediction and update stages.

use nalgebra::{SMatrix, SVector};

// ===== State Dimensions =====
pub const STATE_DIM: usize = 5; // (px, py, v, yaw, yaw_rate)
pub const AUG_STATE_DIM: usize = 7; // state + (nu_a, nu_yawdd)

/// Index of the yaw angle inside the state vector
pub const YAW_INDEX: usize = 3;

// ===== Measurement Dimensions =====
pub const MEASURE_DIM_LIDAR: usize = 2; // (px, py)
pub const MEASURE_DIM_RADAR: usize = 3; // (rho, phi, rho_dot)

/// Index of the bearing angle inside a radar measurement
pub const BEARING_INDEX: usize = 1;

// ===== Sigma Point Counts =====
pub const SIGMA_COUNT: usize = 2 * STATE_DIM + 1; // 11
pub const AUG_SIGMA_COUNT: usize = 2 * AUG_STATE_DIM + 1; // 15

// ===== State Types =====
pub type StateVec = SVector<f64, STATE_DIM>;
pub type StateMat = SMatrix<f64, STATE_DIM, STATE_DIM>;

pub type AugStateVec = SVector<f64, AUG_STATE_DIM>;
pub type AugStateMat = SMatrix<f64, AUG_STATE_DIM, AUG_STATE_DIM>;

// ===== Sigma Point Types (one point per column) =====
pub type SigmaPoints = SMatrix<f64, STATE_DIM, SIGMA_COUNT>; // 5×11
pub type AugSigmaPoints = SMatrix<f64, AUG_STATE_DIM, AUG_SIGMA_COUNT>; // 7×15
pub type PredSigmaPoints = SMatrix<f64, STATE_DIM, AUG_SIGMA_COUNT>; // 5×15
pub type SigmaWeights = SVector<f64, AUG_SIGMA_COUNT>;

// ===== Lidar Types =====
pub type LidarVec = SVector<f64, MEASURE_DIM_LIDAR>;
pub type LidarNoise = SMatrix<f64, MEASURE_DIM_LIDAR, MEASURE_DIM_LIDAR>;
pub type LidarJacobian = SMatrix<f64, MEASURE_DIM_LIDAR, STATE_DIM>; // 2×5
pub type KalmanGainLidar = SMatrix<f64, STATE_DIM, MEASURE_DIM_LIDAR>; // 5×2

// ===== Radar Types =====
pub type RadarVec = SVector<f64, MEASURE_DIM_RADAR>;
pub type RadarNoise = SMatrix<f64, MEASURE_DIM_RADAR, MEASURE_DIM_RADAR>;
pub type RadarSigmaPoints = SMatrix<f64, MEASURE_DIM_RADAR, AUG_SIGMA_COUNT>; // 3×15
pub type KalmanGainRadar = SMatrix<f64, STATE_DIM, MEASURE_DIM_RADAR>; // 5×3
