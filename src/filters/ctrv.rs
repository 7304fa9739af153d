//! Constant Turn Rate and Velocity (CTRV) motion model
//!
//! State: [px, py, v, yaw, yaw_rate]
//! Augmented with [nu_a, nu_yawdd] (longitudinal and yaw acceleration noise).

use crate::types::{AugSigmaPoints, AugStateVec, PredSigmaPoints, StateVec};

/// Below this yaw rate the straight-line limit is used
pub const YAW_RATE_EPSILON: f64 = 1e-3;

/// Propagate one augmented sigma point by `dt` seconds.
pub fn motion_model(sigma: &AugStateVec, dt: f64) -> StateVec {
    let p_x = sigma[0];
    let p_y = sigma[1];
    let v = sigma[2];
    let yaw = sigma[3];
    let yawd = sigma[4];
    let nu_a = sigma[5];
    let nu_yawdd = sigma[6];

    // Avoid division by zero
    let (mut px_p, mut py_p) = if yawd.abs() > YAW_RATE_EPSILON {
        (
            p_x + v / yawd * ((yaw + yawd * dt).sin() - yaw.sin()),
            p_y + v / yawd * (yaw.cos() - (yaw + yawd * dt).cos()),
        )
    } else {
        (p_x + v * dt * yaw.cos(), p_y + v * dt * yaw.sin())
    };

    let half_dt2 = 0.5 * dt * dt;

    // Process noise
    px_p += half_dt2 * nu_a * yaw.cos();
    py_p += half_dt2 * nu_a * yaw.sin();
    let v_p = v + nu_a * dt;
    let yaw_p = yaw + yawd * dt + half_dt2 * nu_yawdd;
    let yawd_p = yawd + nu_yawdd * dt;

    StateVec::new(px_p, py_p, v_p, yaw_p, yawd_p)
}

/// Propagate every augmented sigma point, one per column.
pub fn predict_sigma_points(xsig_aug: &AugSigmaPoints, dt: f64) -> PredSigmaPoints {
    let mut xsig_pred = PredSigmaPoints::zeros();
    for (i, column) in xsig_aug.column_iter().enumerate() {
        let predicted = motion_model(&column.into_owned(), dt);
        xsig_pred.set_column(i, &predicted);
    }
    xsig_pred
}
