use std::path::PathBuf;
use processing::{JointSeries, ProcessingError};
use session::ClosedSession;
use crate::protocol::{StatusCode, SOURCE_FAILURE_LABEL};

/// Initial joint angles measured at the end of zeroing, in degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CalibrationEvent {
    pub initial_knee_angle_deg: f64,
    pub initial_ankle_angle_deg: f64,
}

/// Why a zeroing or recording phase ended without a result.
#[derive(Debug, Clone, PartialEq)]
pub enum Diagnostic {
    /// Reading stopped before any zeroing produced a calibration pose.
    MissingCalibration,
    Processing(ProcessingError),
}

/// Everything the acquisition worker reports to the presentation side. Payloads are owned
/// snapshots; nothing in them refers back into the worker.
#[derive(Debug, Clone, PartialEq)]
pub enum AcquisitionEvent {
    /// A line carried a status code other than the silent data code.
    Status(StatusCode),
    Calibrated(CalibrationEvent),
    Series(JointSeries),
    SessionOpened(PathBuf),
    SessionClosed(ClosedSession),
    Diagnostic(Diagnostic),
    /// Writing the session file failed; the recording continues without it.
    PersistenceFailed(String),
    /// The line source is gone, the worker stops after this event.
    Fatal(String),
}

impl AcquisitionEvent {
    /// Status label for the event, if it is a status-bearing one.
    pub fn status_label(&self) -> Option<&'static str> {
        match self {
            Self::Status(status) => status.label(),
            Self::Fatal(_) => Some(SOURCE_FAILURE_LABEL),
            _ => None,
        }
    }
}
