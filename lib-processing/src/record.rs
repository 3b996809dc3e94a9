use core::str::FromStr;
use math::*;
use crate::*;

/// One decoded body line of the sensor stream:
///
/// `code,timestamp,tw,tx,ty,tz,sw,sx,sy,sz,fw,fx,fy,fz,pressure`
///
/// where `t`, `s` and `f` are the thigh, shank and foot quaternions in (w, x, y, z) order.
///
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SensorRecord
{
    /// Status code the device prefixed to the line.
    pub code: u16,

    /// In milliseconds; device clock at the time of the reading.
    pub timestamp_ms: i64,

    pub thigh: Quaternion,
    pub shank: Quaternion,
    pub foot: Quaternion,

    /// Raw pressure sensor reading.
    pub pressure: f64,
}

impl SensorRecord
{
    /// Decode a raw line. Surrounding whitespace per field is tolerated, anything else that is not
    /// exactly [`RECORD_FIELDS`] numbers is rejected.
    ///
    pub fn parse(line: &str) -> Result<Self, RecordError> {
        let mut fields = [""; RECORD_FIELDS];
        let mut found = 0;
        for field in line.trim().split(',') {
            if found < RECORD_FIELDS {
                fields[found] = field.trim();
            }
            found += 1;
        }
        if found != RECORD_FIELDS {
            return Err(RecordError::FieldCount { found });
        }

        let code = fields[0]
            .parse::<u16>()
            .map_err(|_| RecordError::InvalidField { index: 0 })?;
        let timestamp_ms = parse_timestamp(fields[1])
            .ok_or(RecordError::InvalidField { index: 1 })?;

        let mut values = [0.0; 13];
        for (offset, value) in values.iter_mut().enumerate() {
            let index = offset + 2;
            *value = parse_number(fields[index]).ok_or(RecordError::InvalidField { index })?;
        }

        Ok(SensorRecord {
            code,
            timestamp_ms,
            thigh: Quaternion::new(values[0], values[1], values[2], values[3]),
            shank: Quaternion::new(values[4], values[5], values[6], values[7]),
            foot: Quaternion::new(values[8], values[9], values[10], values[11]),
            pressure: values[12],
        })
    }

    /// Thigh, shank and foot orientation as unit quaternions.
    ///
    pub fn normalized_segments(&self) -> Result<[Quaternion; 3], MathError> {
        Ok([self.thigh.normalize()?, self.shank.normalize()?, self.foot.normalize()?])
    }

    /// The twelve raw quaternion components, thigh then shank then foot.
    ///
    pub fn quaternions(&self) -> [f64; 12] {
        let mut out = [0.0; 12];
        out[0..4].copy_from_slice(&self.thigh.to_array());
        out[4..8].copy_from_slice(&self.shank.to_array());
        out[8..12].copy_from_slice(&self.foot.to_array());
        out
    }
}

impl FromStr for SensorRecord {
    type Err = RecordError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SensorRecord::parse(s)
    }
}

/// Parse a finite floating point number.
///
#[inline]
pub fn parse_number(field: &str) -> Option<f64> {
    field.trim().parse::<f64>().ok().filter(|value| value.is_finite())
}

/// Timestamps are integer milliseconds, but some firmware prints them with a trailing `.0`.
///
fn parse_timestamp(field: &str) -> Option<i64> {
    if let Ok(value) = field.parse::<i64>() {
        return Some(value);
    }
    let value = parse_number(field)?;
    if libm::trunc(value) != value || libm::fabs(value) > i64::MAX as f64 {
        return None;
    }
    Some(value as i64)
}

/// Decode every line that is a valid record, dropping the rest. Returns the records together with
/// the number of lines that were skipped.
///
pub fn parse_records<S: AsRef<str>>(lines: &[S]) -> (alloc::vec::Vec<SensorRecord>, usize) {
    let mut records = alloc::vec::Vec::with_capacity(lines.len());
    let mut skipped = 0;
    for line in lines {
        match SensorRecord::parse(line.as_ref()) {
            Ok(record) => records.push(record),
            Err(err) => {
                log::debug!("Skipping malformed record {:?}: {}", line.as_ref(), err);
                skipped += 1;
            }
        }
    }
    (records, skipped)
}
