use core::{error::Error, fmt};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MathError
{
    /// Zero or non-finite magnitude, the quaternion does not describe an orientation.
    DegenerateQuaternion,
}

impl Error for MathError {}

impl fmt::Display for MathError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::DegenerateQuaternion => write!(f, "Quaternion has zero or non-finite magnitude"),
        }
    }
}
