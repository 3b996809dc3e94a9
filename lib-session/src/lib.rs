//! On-disk session files: a `key=value` header describing the calibration pose, a blank line, then
//! the raw device lines of one recording exactly as they were received.

pub mod error;
pub use error::*;

pub mod header;
pub use header::*;

pub mod writer;
pub use writer::*;

pub mod loader;
pub use loader::*;
