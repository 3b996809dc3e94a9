use std::io::{self, Write};
use math::Quaternion;
use processing::CalibrationPose;
use crate::*;

pub const Q_TI: &str = "q_ti";
pub const Q_SI: &str = "q_si";
pub const Q_FI: &str = "q_fi";
pub const INITIAL_KNEE_ANGLE: &str = "initial_knee_angle";
pub const INITIAL_ANKLE_ANGLE: &str = "initial_ankle_angle";

/// Ordered `key=value` entries written above the body of a session file. Every value is a list of
/// numbers; single numbers are lists of length one.
///
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionHeader {
    entries: Vec<(String, Vec<f64>)>,
}

impl SessionHeader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Header describing the given pose. Recording before any zeroing has no pose yet, the
    /// header is then left empty.
    pub fn from_pose(pose: Option<&CalibrationPose>) -> Self {
        let mut header = SessionHeader::new();
        if let Some(pose) = pose {
            header.push(Q_TI, pose.q_ti.to_array());
            header.push(Q_SI, pose.q_si.to_array());
            header.push(Q_FI, pose.q_fi.to_array());
            header.push(INITIAL_KNEE_ANGLE, [pose.initial_knee_angle]);
            header.push(INITIAL_ANKLE_ANGLE, [pose.initial_ankle_angle]);
        }
        header
    }

    /// Add an entry, replacing any earlier entry with the same key.
    pub fn push(&mut self, key: impl Into<String>, values: impl Into<Vec<f64>>) {
        let key = key.into();
        let values = values.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = values,
            None => self.entries.push((key, values)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&[f64]> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, values)| values.as_slice())
    }

    pub fn entries(&self) -> impl Iterator<Item = (&str, &[f64])> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Write the entries followed by the blank separator line.
    ///
    /// Values use the shortest representation that parses back to the same `f64`, a reloaded
    /// pose is bit-for-bit the pose that was written.
    pub fn write_to<W: Write>(&self, out: &mut W) -> io::Result<()> {
        for (key, values) in &self.entries {
            let joined = values
                .iter()
                .map(|v| format!("{:?}", v))
                .collect::<Vec<_>>()
                .join(",");
            writeln!(out, "{}={}", key, joined)?;
        }
        writeln!(out)
    }

    /// Parse one `key=value1,value2,...` line. `line_no` is only used for error reporting.
    pub fn parse_line(&mut self, line_no: usize, line: &str) -> Result<(), LoadError> {
        let malformed = || LoadError::MalformedHeader {
            line_no,
            line: line.to_string(),
        };

        let (key, value) = line.split_once('=').ok_or_else(malformed)?;
        let key = key.trim();
        if key.is_empty() {
            return Err(malformed());
        }
        let values = value
            .split(',')
            .map(|v| v.trim().parse::<f64>())
            .collect::<Result<Vec<_>, _>>()
            .map_err(|_| malformed())?;

        self.push(key, values);
        Ok(())
    }

    /// Rebuild the calibration pose. The three quaternions are required; the initial angles are
    /// taken from the header when present and derived from the quaternions otherwise.
    pub fn to_pose(&self) -> Result<CalibrationPose, LoadError> {
        let mut pose = CalibrationPose::from_segments(
            self.quaternion(Q_TI)?,
            self.quaternion(Q_SI)?,
            self.quaternion(Q_FI)?,
        )?;
        if let Some(angle) = self.scalar(INITIAL_KNEE_ANGLE)? {
            pose.initial_knee_angle = angle;
        }
        if let Some(angle) = self.scalar(INITIAL_ANKLE_ANGLE)? {
            pose.initial_ankle_angle = angle;
        }
        Ok(pose)
    }

    fn quaternion(&self, key: &'static str) -> Result<Quaternion, LoadError> {
        let values = self.get(key).ok_or(LoadError::MissingKey { key })?;
        let components: [f64; 4] = values.try_into().map_err(|_| LoadError::WrongLength {
            key,
            expected: 4,
            found: values.len(),
        })?;
        Ok(Quaternion::from(components))
    }

    fn scalar(&self, key: &'static str) -> Result<Option<f64>, LoadError> {
        match self.get(key) {
            None => Ok(None),
            Some([value]) => Ok(Some(*value)),
            Some(values) => Err(LoadError::WrongLength {
                key,
                expected: 1,
                found: values.len(),
            }),
        }
    }
}
