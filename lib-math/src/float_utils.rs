use crate::*;

/// Constrain a value to the range `[low, high]`. NaN stays NaN so bad input is not hidden.
///
#[inline]
pub fn clamp(value: f64, low: f64, high: f64) -> f64 {
    if value < low {
        low
    } else if value > high {
        high
    } else {
        value
    }
}

/// Convert radians to degrees.
#[inline]
pub fn degrees(radians: f64) -> f64 {
    radians * RAD_TO_DEG
}

/// Convert degrees to radians.
#[inline]
pub fn radians(degrees: f64) -> f64 {
    degrees * DEG_TO_RAD
}
