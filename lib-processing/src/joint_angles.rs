use alloc::vec::Vec;
use math::*;
use crate::*;
use cfg_if::cfg_if;

/// Knee and ankle angle for a single record, in degrees.
///
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct JointAngles
{
    pub knee: f64,
    pub ankle: f64,

    #[cfg(feature = "debug")]
    pub q_knee: Quaternion,

    #[cfg(feature = "debug")]
    pub q_ankle: Quaternion,
}

/// Relative rotation between two calibrated segments:
///
/// `(q_distal * conj(q_distal_init)) * (q_proximal_init * conj(q_proximal))`
///
/// Each factor expresses how far a segment has turned since calibration, so the mounting
/// orientation of the sensors on the leg cancels out.
///
fn relative_rotation(
    distal: &Quaternion,
    distal_init: &Quaternion,
    proximal_init: &Quaternion,
    proximal: &Quaternion,
) -> Result<Quaternion, MathError> {
    let distal_delta = distal.multiply(&distal_init.conjugate())?;
    let proximal_delta = proximal_init.multiply(&proximal.conjugate())?;
    distal_delta.multiply(&proximal_delta)
}

/// Compute the joint angles of a single record against the calibration pose.
///
pub fn joint_angles(record: &SensorRecord, pose: &CalibrationPose) -> Result<JointAngles, MathError> {
    let q_knee = relative_rotation(&record.shank, &pose.q_si, &pose.q_ti, &record.thigh)?;
    let q_ankle = relative_rotation(&record.foot, &pose.q_fi, &pose.q_si, &record.shank)?;

    Ok(JointAngles {
        knee: degrees(q_knee.rotation_angle()),
        ankle: degrees(q_ankle.rotation_angle()),
        #[cfg(feature = "debug")]
        q_knee,
        #[cfg(feature = "debug")]
        q_ankle,
    })
}

/// Time series produced by one recording. All vectors have the same length, one entry per valid
/// record in the order they were received.
///
#[derive(Debug, Clone, Default, PartialEq)]
pub struct JointSeries
{
    pub time_ms: Vec<i64>,

    /// Raw thigh, shank and foot quaternion components as received.
    pub quaternions: Vec<[f64; 12]>,

    pub pressure: Vec<f64>,

    /// In degrees.
    pub knee_angle: Vec<f64>,

    /// In degrees.
    pub ankle_angle: Vec<f64>,

    /// Composed knee rotation per record.
    #[cfg(feature = "debug")]
    pub knee_quaternions: Vec<Quaternion>,

    /// Composed ankle rotation per record.
    #[cfg(feature = "debug")]
    pub ankle_quaternions: Vec<Quaternion>,
}

impl JointSeries
{
    pub fn with_capacity(capacity: usize) -> Self {
        JointSeries {
            time_ms: Vec::with_capacity(capacity),
            quaternions: Vec::with_capacity(capacity),
            pressure: Vec::with_capacity(capacity),
            knee_angle: Vec::with_capacity(capacity),
            ankle_angle: Vec::with_capacity(capacity),
            #[cfg(feature = "debug")]
            knee_quaternions: Vec::with_capacity(capacity),
            #[cfg(feature = "debug")]
            ankle_quaternions: Vec::with_capacity(capacity),
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.time_ms.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.time_ms.is_empty()
    }

    /// Append one processed record.
    ///
    pub fn push(&mut self, record: &SensorRecord, angles: JointAngles) {
        self.time_ms.push(record.timestamp_ms);
        self.quaternions.push(record.quaternions());
        self.pressure.push(record.pressure);
        self.knee_angle.push(angles.knee);
        self.ankle_angle.push(angles.ankle);

        cfg_if!{ if #[cfg(feature = "debug")] {
            self.knee_quaternions.push(angles.q_knee);
            self.ankle_quaternions.push(angles.q_ankle);
        }}
    }
}

/// Turn the raw lines buffered during a recording into joint angle series. Lines that do not
/// decode and records with a degenerate orientation are left out.
///
pub fn process_batch<S: AsRef<str>>(lines: &[S], pose: &CalibrationPose) -> Result<JointSeries, ProcessingError> {
    let (records, skipped) = parse_records(lines);
    if skipped > 0 {
        log::warn!("Ignored {} malformed lines in recording", skipped);
    }
    process_records(&records, pose)
}

/// Compute joint angles for already decoded records.
///
pub fn process_records(records: &[SensorRecord], pose: &CalibrationPose) -> Result<JointSeries, ProcessingError> {
    let mut series = JointSeries::with_capacity(records.len());
    for record in records {
        match joint_angles(record, pose) {
            Ok(angles) => series.push(record, angles),
            Err(err) => log::debug!("Skipping record at {} ms: {}", record.timestamp_ms, err),
        }
    }

    if series.is_empty() {
        return Err(ProcessingError::EmptyBatch);
    }
    log::debug!("Processed {} records", series.len());
    Ok(series)
}
