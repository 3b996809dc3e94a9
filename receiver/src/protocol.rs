//! Line protocol spoken by the sensor rig: every line is `<code>,<payload>` where the code tags the
//! device or session state and the payload is a list of numbers.

use processing::{parse_number, SensorRecord};
use thiserror::Error;

/// Status codes the device prefixes to its lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatusCode {
    /// Plain data line, never reported.
    Silent,
    Standby,
    ZeroingStarted,
    ZeroingStopped,
    ReadingStarted,
    ReadingStopped,
    MagnetometerCalibrating,
    LowVoltage,
    SensorMalfunction,
    Unknown(i64),
}

/// Label shown for every code the device does not document.
pub const UNKNOWN_LABEL: &str = "ERROR - ???";

/// Label reported when the line source itself fails.
pub const SOURCE_FAILURE_LABEL: &str = "ERROR - Serial Port Failure";

impl StatusCode {
    pub fn from_code(code: i64) -> Self {
        match code {
            0 => Self::Silent,
            101 => Self::Standby,
            102 => Self::ZeroingStarted,
            103 => Self::ZeroingStopped,
            104 => Self::ReadingStarted,
            105 => Self::ReadingStopped,
            106 => Self::MagnetometerCalibrating,
            201 => Self::LowVoltage,
            202 => Self::SensorMalfunction,
            other => Self::Unknown(other),
        }
    }

    pub fn code(&self) -> i64 {
        match self {
            Self::Silent => 0,
            Self::Standby => 101,
            Self::ZeroingStarted => 102,
            Self::ZeroingStopped => 103,
            Self::ReadingStarted => 104,
            Self::ReadingStopped => 105,
            Self::MagnetometerCalibrating => 106,
            Self::LowVoltage => 201,
            Self::SensorMalfunction => 202,
            Self::Unknown(code) => *code,
        }
    }

    /// Human readable label, `None` for the silent data code.
    pub fn label(&self) -> Option<&'static str> {
        Some(match self {
            Self::Silent => return None,
            Self::Standby => "Standby",
            Self::ZeroingStarted => "Leg zeroing started",
            Self::ZeroingStopped => "Leg zeroing stopped",
            Self::ReadingStarted => "Reading started",
            Self::ReadingStopped => "Reading stopped",
            Self::MagnetometerCalibrating => "Magnetometer calibrating",
            Self::LowVoltage => "ERROR - Low voltage",
            Self::SensorMalfunction => "ERROR - Sensor malfunction",
            Self::Unknown(_) => UNKNOWN_LABEL,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LineError {
    #[error("missing ',' after the status code")]
    MissingSeparator,
    #[error("status code {0:?} is not an integer")]
    InvalidCode(String),
    #[error("payload field {index} ({field:?}) is not a number")]
    NonNumericPayload { index: usize, field: String },
}

/// A protocol line that passed validation.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedLine {
    /// The line as received, without surrounding whitespace.
    pub raw: String,
    pub status: StatusCode,
    /// Present when the payload has the full shape of a sensor record.
    pub record: Option<SensorRecord>,
}

/// Validate one line: an integer status code, a comma, then only numeric payload fields.
pub fn decode_line(line: &str) -> Result<DecodedLine, LineError> {
    let raw = line.trim();
    let (code, payload) = raw.split_once(',').ok_or(LineError::MissingSeparator)?;

    let code = code.trim();
    let code = code
        .parse::<i64>()
        .map_err(|_| LineError::InvalidCode(code.to_string()))?;

    for (index, field) in payload.split(',').enumerate() {
        if parse_number(field).is_none() {
            return Err(LineError::NonNumericPayload {
                index,
                field: field.to_string(),
            });
        }
    }

    Ok(DecodedLine {
        raw: raw.to_string(),
        status: StatusCode::from_code(code),
        record: SensorRecord::parse(raw).ok(),
    })
}
