//! Sigma point generation and recombination (unscented transform)
//!
//! Points are stored one per column. Every set uses the symmetric pattern
//! `mean, mean + sqrt(lambda + n) * L[:, i], mean - sqrt(lambda + n) * L[:, i]`
//! where `L` is the lower Cholesky factor of the covariance.

use nalgebra::{SMatrix, SVector};

use crate::angle::normalize_angle;
use crate::error::{FilterError, FilterResult};
use crate::types::{
    AugSigmaPoints, AugStateMat, AugStateVec, PredSigmaPoints, SigmaPoints, SigmaWeights,
    StateMat, StateVec, AUG_STATE_DIM, STATE_DIM, YAW_INDEX,
};

/// Weights for a set of `P = 2n + 1` sigma points.
///
/// `w[0] = lambda / (lambda + n)`, all others `1 / (2 (lambda + n))`.
pub fn sigma_weights<const P: usize>(lambda: f64) -> SVector<f64, P> {
    let n = ((P - 1) / 2) as f64;
    let mut weights = SVector::<f64, P>::from_element(0.5 / (lambda + n));
    weights[0] = lambda / (lambda + n);
    weights
}

fn spread_points<const D: usize, const P: usize>(
    mean: &SVector<f64, D>,
    covariance: &SMatrix<f64, D, D>,
    lambda: f64,
    stage: &'static str,
) -> FilterResult<SMatrix<f64, D, P>> {
    debug_assert_eq!(P, 2 * D + 1);

    let l_mat = covariance
        .clone()
        .cholesky()
        .ok_or(FilterError::NotPositiveDefinite { stage })?
        .l();
    let scale = (lambda + D as f64).sqrt();

    let mut points = SMatrix::<f64, D, P>::zeros();
    points.set_column(0, mean);
    for i in 0..D {
        let offset = l_mat.column(i) * scale;
        points.set_column(i + 1, &(mean + &offset));
        points.set_column(i + 1 + D, &(mean - &offset));
    }

    Ok(points)
}

/// Sigma points of the plain (unaugmented) state, 5×11.
pub fn generate_sigma_points(x: &StateVec, p: &StateMat, lambda: f64) -> FilterResult<SigmaPoints> {
    spread_points(x, p, lambda, "state covariance")
}

/// Extend the state with the two zero-mean process noise terms.
pub fn augment(x: &StateVec, p: &StateMat, std_a: f64, std_yawdd: f64) -> (AugStateVec, AugStateMat) {
    let mut x_aug = AugStateVec::zeros();
    x_aug.fixed_rows_mut::<STATE_DIM>(0).copy_from(x);

    let mut p_aug = AugStateMat::zeros();
    p_aug
        .fixed_view_mut::<STATE_DIM, STATE_DIM>(0, 0)
        .copy_from(p);
    p_aug[(STATE_DIM, STATE_DIM)] = std_a * std_a;
    p_aug[(AUG_STATE_DIM - 1, AUG_STATE_DIM - 1)] = std_yawdd * std_yawdd;

    (x_aug, p_aug)
}

/// Sigma points of the augmented state, 7×15.
pub fn augmented_sigma_points(
    x: &StateVec,
    p: &StateMat,
    std_a: f64,
    std_yawdd: f64,
    lambda: f64,
) -> FilterResult<AugSigmaPoints> {
    let (x_aug, p_aug) = augment(x, p, std_a, std_yawdd);
    spread_points(&x_aug, &p_aug, lambda, "augmented covariance")
}

/// Recover mean and covariance from propagated sigma points.
///
/// Yaw residuals are wrapped before forming outer products. The yaw mean
/// itself is a plain weighted sum and is biased when points straddle ±π.
pub fn predict_mean_and_covariance(
    xsig_pred: &PredSigmaPoints,
    weights: &SigmaWeights,
) -> (StateVec, StateMat) {
    let x = xsig_pred * weights;

    let mut p = StateMat::zeros();
    for (i, column) in xsig_pred.column_iter().enumerate() {
        let x_diff = state_residual(&(column - &x));
        p += weights[i] * x_diff * x_diff.transpose();
    }

    (x, p)
}

/// State difference with the yaw component wrapped into (-π, π].
pub fn state_residual(diff: &StateVec) -> StateVec {
    let mut residual = *diff;
    residual[YAW_INDEX] = normalize_angle(residual[YAW_INDEX]);
    residual
}
