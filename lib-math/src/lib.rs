#![cfg_attr(not(test), no_std)]

pub mod error;
pub use error::*;

pub mod float_utils;
pub use float_utils::*;

pub mod quaternion;
pub use quaternion::*;

#[cfg(test)]
mod tests;

pub const RAD_TO_DEG: f64 = 180.0 / core::f64::consts::PI;

pub const DEG_TO_RAD: f64 = core::f64::consts::PI / 180.0;
