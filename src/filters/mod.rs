/// Filter pipeline stages
///
/// Each stage is a pure function over values; `ukf_ctrv` owns the belief
/// and sequences the stages once per measurement.

pub mod ctrv;
pub mod lidar;
pub mod radar;
pub mod sigma_points;
pub mod ukf_ctrv;

pub use ukf_ctrv::{StepOutcome, Ukf, UkfSnapshot, UpdateReport};

use crate::types::{StateMat, StateVec};

/// Result of fusing one measurement into a predicted belief.
#[derive(Clone, Debug)]
pub struct Correction {
    pub x: StateVec,
    pub p: StateMat,
    /// Normalized innovation squared
    pub nis: f64,
}

/// Remove round-off asymmetry: (P + Pᵀ) / 2
pub(crate) fn symmetrize(p: &StateMat) -> StateMat {
    (p + p.transpose()) * 0.5
}
