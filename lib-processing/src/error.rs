use core::{error::Error, fmt};
use math::MathError;

/// Why a single body line could not be decoded into a [`crate::SensorRecord`].
///
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordError
{
    /// The line did not split into the status code plus 14 payload fields.
    FieldCount { found: usize },
    /// Field at `index` (0 is the status code) is not a number of the expected kind.
    InvalidField { index: usize },
}

impl Error for RecordError {}

impl fmt::Display for RecordError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::FieldCount { found } => write!(
                f, "Expected {} comma separated fields, found {}", crate::RECORD_FIELDS, found
            ),
            Self::InvalidField { index } => write!(f, "Field {} is not a valid number", index),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ProcessingError
{
    /// Zeroing ended without a single usable sample.
    EmptyCalibrationBuffer,
    /// Recording ended without a single usable record.
    EmptyBatch,
    Math(MathError),
    /// Zero-phase filtering needs more samples than the padding it adds on each side.
    SeriesTooShort { len: usize, min: usize },
    /// Cutoff is not strictly between zero and the Nyquist frequency of the sample rate.
    InvalidCutoff { cutoff_hz: f64, sample_rate: f64 },
}

impl Error for ProcessingError {}

impl fmt::Display for ProcessingError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::EmptyCalibrationBuffer => write!(f, "No valid samples to calibrate from"),
            Self::EmptyBatch => write!(f, "No valid records to process"),
            Self::Math(err) => write!(f, "Math error: {}", err),
            Self::SeriesTooShort { len, min } => write!(
                f, "Series of {} samples is too short to filter, need more than {}", len, min
            ),
            Self::InvalidCutoff { cutoff_hz, sample_rate } => write!(
                f, "Cutoff of {} Hz is invalid for a sample rate of {} Hz", cutoff_hz, sample_rate
            ),
        }
    }
}

impl From<MathError> for ProcessingError
{
    fn from(err: MathError) -> Self {
        ProcessingError::Math(err)
    }
}
