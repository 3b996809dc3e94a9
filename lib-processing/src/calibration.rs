use math::*;
use crate::*;

/// Reference orientation of every segment captured while the leg is held still during zeroing.
/// Later orientations are expressed relative to this pose to get joint angles.
///
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CalibrationPose
{
    /// Initial thigh orientation.
    pub q_ti: Quaternion,
    /// Initial shank orientation.
    pub q_si: Quaternion,
    /// Initial foot orientation.
    pub q_fi: Quaternion,

    /// In degrees; angle between the thigh and shank in the calibration pose.
    pub initial_knee_angle: f64,
    /// In degrees; angle between the shank and foot in the calibration pose.
    pub initial_ankle_angle: f64,
}

impl CalibrationPose
{
    /// Build a pose from the three segment orientations, deriving the initial joint angles.
    ///
    pub fn from_segments(q_ti: Quaternion, q_si: Quaternion, q_fi: Quaternion) -> Result<Self, MathError> {
        Ok(CalibrationPose {
            q_ti,
            q_si,
            q_fi,
            initial_knee_angle: q_ti.angular_separation(&q_si)?,
            initial_ankle_angle: q_si.angular_separation(&q_fi)?,
        })
    }

    /// Compute the pose from the raw lines buffered during zeroing. Lines that do not decode are
    /// ignored.
    ///
    pub fn calibrate<S: AsRef<str>>(lines: &[S]) -> Result<Self, ProcessingError> {
        let (records, skipped) = parse_records(lines);
        if skipped > 0 {
            log::warn!("Ignored {} malformed calibration lines", skipped);
        }
        CalibrationPose::from_records(&records)
    }

    /// Average the normalized orientation of each segment over all records.
    ///
    /// A component-wise mean of unit quaternions is not a unit quaternion itself, so the mean is
    /// normalized once more before it is stored.
    ///
    pub fn from_records(records: &[SensorRecord]) -> Result<Self, ProcessingError> {
        let zero = Quaternion::new(0.0, 0.0, 0.0, 0.0);
        let mut sums = [zero; 3];
        let mut count = 0usize;

        for record in records {
            match record.normalized_segments() {
                Ok(segments) => {
                    for (sum, q) in sums.iter_mut().zip(segments) {
                        *sum = *sum + q;
                    }
                    count += 1;
                }
                Err(err) => log::debug!("Skipping calibration sample at {} ms: {}", record.timestamp_ms, err),
            }
        }

        if count == 0 {
            return Err(ProcessingError::EmptyCalibrationBuffer);
        }

        let [thigh, shank, foot] = sums.map(|sum| sum / count as f64);
        let pose = CalibrationPose::from_segments(thigh.normalize()?, shank.normalize()?, foot.normalize()?)?;

        log::info!(
            "Calibrated from {} samples: knee {:.2} deg, ankle {:.2} deg",
            count, pose.initial_knee_angle, pose.initial_ankle_angle
        );
        Ok(pose)
    }
}
