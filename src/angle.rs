use std::f64::consts::{PI, TAU};

/// Wrap an angle into (-π, π].
///
/// Uses Euclidean remainder, so arbitrarily large inputs wrap in constant time.
pub fn normalize_angle(angle: f64) -> f64 {
    let wrapped = PI - (PI - angle).rem_euclid(TAU);
    // rem_euclid may round up to exactly TAU just above π
    if wrapped <= -PI {
        PI
    } else {
        wrapped
    }
}
