//! Receiver for the knee and ankle sensor rig: reads status-tagged quaternion lines, follows the
//! zeroing and recording phases, persists sessions and reports joint angle series.

pub mod protocol;
pub use protocol::*;

pub mod events;
pub use events::*;

pub mod machine;
pub use machine::*;

pub mod source;
pub use source::*;

pub mod worker;
pub use worker::*;

pub mod config;
pub use config::*;

pub mod presentation;
pub use presentation::*;
