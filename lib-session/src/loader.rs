use std::{
    fs::File,
    io::{BufRead, BufReader},
    path::Path,
};
use processing::{process_batch, CalibrationPose, JointSeries, ProcessingError};
use crate::*;

/// A session file read back from disk.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedSession {
    pub header: SessionHeader,
    pub pose: CalibrationPose,
    /// Raw body lines in file order.
    pub body: Vec<String>,
}

impl LoadedSession {
    /// Recompute the joint angle series from the body, exactly as it was computed while the
    /// session was recorded.
    pub fn series(&self) -> Result<JointSeries, ProcessingError> {
        process_batch(&self.body, &self.pose)
    }
}

/// Split a session file into its header and body lines. The header ends at the first blank line;
/// blank lines inside the body are ignored.
pub fn read_session<R: BufRead>(reader: R) -> Result<(SessionHeader, Vec<String>), LoadError> {
    let mut header = SessionHeader::new();
    let mut body = Vec::new();
    let mut in_header = true;

    for (index, line) in reader.lines().enumerate() {
        let line = line?;
        let line = line.trim();
        if in_header {
            if line.is_empty() {
                in_header = false;
            } else {
                header.parse_line(index + 1, line)?;
            }
        } else if !line.is_empty() {
            body.push(line.to_string());
        }
    }

    Ok((header, body))
}

/// Load a session file and rebuild its calibration pose.
pub fn load_session(path: impl AsRef<Path>) -> Result<LoadedSession, LoadError> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|source| LoadError::Open {
        path: path.to_path_buf(),
        source,
    })?;

    let (header, body) = read_session(BufReader::new(file))?;
    let pose = header.to_pose()?;
    log::info!("Loaded {:?}: {} body lines", path, body.len());

    Ok(LoadedSession { header, pose, body })
}
