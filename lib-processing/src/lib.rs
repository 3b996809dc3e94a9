#![cfg_attr(not(test), no_std)]

extern crate alloc;

pub mod error;
pub use error::*;

pub mod record;
pub use record::*;

pub mod calibration;
pub use calibration::*;

pub mod joint_angles;
pub use joint_angles::*;

pub mod velocity;
pub use velocity::*;

/// Status code, timestamp, three quaternions and the pressure reading.
///
pub const RECORD_FIELDS: usize = 15;
