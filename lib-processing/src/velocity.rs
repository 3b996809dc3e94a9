use alloc::vec::Vec;
use core::f64::consts::{PI, SQRT_2};
use crate::*;

/// Default low-pass cutoff applied to joint angular velocity.
///
pub const VELOCITY_CUTOFF_HZ: f64 = 20.0;

/// Samples of odd extension added on both ends before zero-phase filtering,
/// `3 * max(len(a), len(b))` for a second order section.
///
pub const FILTER_PADDING: usize = 9;

/// In deg/s; finite difference of `angle` over time. One entry shorter than the input.
///
pub fn angular_velocity(time_ms: &[i64], angle: &[f64]) -> Vec<f64> {
    time_ms
        .windows(2)
        .zip(angle.windows(2))
        .map(|(t, a)| (a[1] - a[0]) / ((t[1] - t[0]) as f64 / 1000.0))
        .collect()
}

/// In Hz; reciprocal of the mean time step of the series. `None` when there are fewer than two
/// samples or the time steps do not average to a positive duration.
///
pub fn sample_rate(time_ms: &[i64]) -> Option<f64> {
    if time_ms.len() < 2 {
        return None;
    }
    let steps = time_ms.len() - 1;
    let total: f64 = time_ms
        .windows(2)
        .map(|t| (t[1] - t[0]) as f64 / 1000.0)
        .sum();
    let mean = total / steps as f64;
    if mean > 0.0 && mean.is_finite() {
        Some(1.0 / mean)
    } else {
        None
    }
}

/// Second order Butterworth low-pass filter in transfer function form, `a[0]` is always one.
///
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Butterworth
{
    pub b: [f64; 3],
    pub a: [f64; 3],
}

impl Butterworth
{
    /// Design the digital filter with the bilinear transform, pre-warping the cutoff.
    ///
    pub fn low_pass(cutoff_hz: f64, sample_rate: f64) -> Result<Self, ProcessingError> {
        let invalid = ProcessingError::InvalidCutoff { cutoff_hz, sample_rate };
        if !(sample_rate > 0.0 && sample_rate.is_finite()) {
            return Err(invalid);
        }

        // Cutoff relative to the Nyquist frequency.
        let normal_cutoff = cutoff_hz / (0.5 * sample_rate);
        if !(normal_cutoff > 0.0 && normal_cutoff < 1.0) {
            return Err(invalid);
        }

        let k = libm::tan(PI * normal_cutoff / 2.0);
        let k2 = k * k;
        let norm = 1.0 / (1.0 + SQRT_2 * k + k2);
        let b0 = k2 * norm;

        Ok(Butterworth {
            b: [b0, 2.0 * b0, b0],
            a: [1.0, 2.0 * (k2 - 1.0) * norm, (1.0 - SQRT_2 * k + k2) * norm],
        })
    }

    /// Filter state that makes a constant input come out unchanged, scaled by the first sample
    /// before use.
    ///
    fn steady_state(&self) -> [f64; 2] {
        let [b0, b1, b2] = self.b;
        let [_, a1, a2] = self.a;
        let r0 = b1 - a1 * b0;
        let r1 = b2 - a2 * b0;
        let z0 = (r0 + r1) / (1.0 + a1 + a2);
        [z0, r1 - a2 * z0]
    }

    /// Single pass in transposed direct form II, starting from state `zi`.
    ///
    fn lfilter(&self, x: &[f64], zi: [f64; 2]) -> Vec<f64> {
        let [b0, b1, b2] = self.b;
        let [_, a1, a2] = self.a;
        let [mut z0, mut z1] = zi;
        x.iter()
            .map(|&sample| {
                let y = b0 * sample + z0;
                z0 = b1 * sample - a1 * y + z1;
                z1 = b2 * sample - a2 * y;
                y
            })
            .collect()
    }

    /// Zero-phase filtering: forward pass, backward pass, with both ends padded by an odd
    /// reflection of the signal to suppress start-up transients.
    ///
    pub fn filtfilt(&self, x: &[f64]) -> Result<Vec<f64>, ProcessingError> {
        let n = x.len();
        if n <= FILTER_PADDING {
            return Err(ProcessingError::SeriesTooShort { len: n, min: FILTER_PADDING });
        }

        let first = x[0];
        let last = x[n - 1];
        let mut extended = Vec::with_capacity(n + 2 * FILTER_PADDING);
        extended.extend((1..=FILTER_PADDING).rev().map(|i| 2.0 * first - x[i]));
        extended.extend_from_slice(x);
        extended.extend((1..=FILTER_PADDING).map(|i| 2.0 * last - x[n - 1 - i]));

        let zi = self.steady_state();
        let scaled = |z: [f64; 2], by: f64| [z[0] * by, z[1] * by];

        let mut forward = self.lfilter(&extended, scaled(zi, extended[0]));
        forward.reverse();
        let mut backward = self.lfilter(&forward, scaled(zi, forward[0]));
        backward.reverse();

        Ok(backward[FILTER_PADDING..FILTER_PADDING + n].to_vec())
    }
}

/// Angular velocity of a joint smoothed with the zero-phase low-pass filter at the empirically
/// estimated sample rate of the series.
///
pub fn filtered_velocity(time_ms: &[i64], angle: &[f64], cutoff_hz: f64) -> Result<Vec<f64>, ProcessingError> {
    let velocity = angular_velocity(time_ms, angle);
    let rate = sample_rate(time_ms).unwrap_or(f64::NAN);
    let filter = Butterworth::low_pass(cutoff_hz, rate)?;
    filter.filtfilt(&velocity)
}
