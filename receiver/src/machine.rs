//! Acquisition state machine: follows the status codes in the stream, buffers the lines of a
//! zeroing or recording phase and turns them into a calibration pose or joint angle series.

use std::{mem, path::Path};
use processing::{process_batch, CalibrationPose};
use session::{SessionHeader, SessionWriter};
use crate::{
    events::{AcquisitionEvent, CalibrationEvent, Diagnostic},
    protocol::{decode_line, DecodedLine, StatusCode},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Calibrating,
    Recording,
}

pub struct AcquisitionMachine {
    phase: Phase,
    /// Raw lines of the current zeroing or recording phase.
    buffer: Vec<String>,
    pose: Option<CalibrationPose>,
    writer: SessionWriter,
}

impl AcquisitionMachine {
    pub fn new(writer: SessionWriter) -> Self {
        AcquisitionMachine {
            phase: Phase::Idle,
            buffer: Vec::new(),
            pose: None,
            writer,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Number of lines collected in the current phase.
    pub fn buffered(&self) -> usize {
        self.buffer.len()
    }

    /// Most recent calibration pose.
    pub fn pose(&self) -> Option<&CalibrationPose> {
        self.pose.as_ref()
    }

    pub fn session_path(&self) -> Option<&Path> {
        self.writer.current_path()
    }

    /// Feed one line from the source and return the events it caused, in order.
    pub fn handle_line(&mut self, line: &str) -> Vec<AcquisitionEvent> {
        let mut events = Vec::new();

        let decoded = match decode_line(line) {
            Ok(decoded) => decoded,
            Err(err) => {
                log::debug!("Skipping line {:?}: {}", line, err);
                return events;
            }
        };

        if decoded.status != StatusCode::Silent {
            events.push(AcquisitionEvent::Status(decoded.status));
        }

        match decoded.status {
            StatusCode::ZeroingStarted => self.start_zeroing(&mut events),
            StatusCode::ZeroingStopped => self.stop_zeroing(&mut events),
            StatusCode::ReadingStarted => self.start_reading(&mut events),
            StatusCode::ReadingStopped => self.stop_reading(&mut events),
            StatusCode::Silent
            | StatusCode::Standby
            | StatusCode::MagnetometerCalibrating
            | StatusCode::LowVoltage
            | StatusCode::SensorMalfunction
            | StatusCode::Unknown(_) => self.collect(decoded, &mut events),
        }

        events
    }

    /// Close whatever is still open. Safe to call more than once.
    pub fn shutdown(&mut self) -> Vec<AcquisitionEvent> {
        let mut events = Vec::new();
        self.close_session(&mut events);
        self.buffer.clear();
        self.phase = Phase::Idle;
        events
    }

    fn start_zeroing(&mut self, events: &mut Vec<AcquisitionEvent>) {
        // A file still open here belongs to the previous pose, its header would no longer match.
        self.close_session(events);
        self.buffer.clear();
        self.phase = Phase::Calibrating;
    }

    fn stop_zeroing(&mut self, events: &mut Vec<AcquisitionEvent>) {
        if self.phase != Phase::Calibrating {
            log::warn!("Zeroing stopped while {:?}, ignoring", self.phase);
            return;
        }

        let lines = mem::take(&mut self.buffer);
        self.phase = Phase::Idle;

        match CalibrationPose::calibrate(&lines) {
            Ok(pose) => {
                self.pose = Some(pose);
                // Register the header now, the following recording writes into this file.
                self.open_session(events);
                events.push(AcquisitionEvent::Calibrated(CalibrationEvent {
                    initial_knee_angle_deg: pose.initial_knee_angle,
                    initial_ankle_angle_deg: pose.initial_ankle_angle,
                }));
            }
            Err(err) => {
                log::warn!("Calibration skipped: {}", err);
                events.push(AcquisitionEvent::Diagnostic(Diagnostic::Processing(err)));
            }
        }
    }

    fn start_reading(&mut self, events: &mut Vec<AcquisitionEvent>) {
        self.buffer.clear();
        if self.pose.is_none() {
            log::warn!("Reading started without calibration");
        }
        self.open_session(events);
        self.phase = Phase::Recording;
    }

    fn stop_reading(&mut self, events: &mut Vec<AcquisitionEvent>) {
        if self.phase != Phase::Recording {
            log::warn!("Reading stopped while {:?}, ignoring", self.phase);
            return;
        }

        let lines = mem::take(&mut self.buffer);
        self.phase = Phase::Idle;

        let result = match &self.pose {
            Some(pose) => process_batch(&lines, pose).map_err(Diagnostic::Processing),
            None => Err(Diagnostic::MissingCalibration),
        };
        match result {
            Ok(series) => events.push(AcquisitionEvent::Series(series)),
            Err(diagnostic) => {
                log::warn!("Recording of {} lines not processed: {:?}", lines.len(), diagnostic);
                events.push(AcquisitionEvent::Diagnostic(diagnostic));
            }
        }

        self.close_session(events);
    }

    fn collect(&mut self, decoded: DecodedLine, events: &mut Vec<AcquisitionEvent>) {
        if self.phase == Phase::Idle {
            return;
        }
        if decoded.record.is_none() {
            log::debug!("Not a sensor record, not buffered: {:?}", decoded.raw);
            return;
        }

        if self.phase == Phase::Recording {
            if let Err(err) = self.writer.write_line(&decoded.raw) {
                log::error!("{}", err);
                events.push(AcquisitionEvent::PersistenceFailed(err.to_string()));
            }
        }
        self.buffer.push(decoded.raw);
    }

    fn open_session(&mut self, events: &mut Vec<AcquisitionEvent>) {
        match self.writer.open(&SessionHeader::from_pose(self.pose.as_ref())) {
            Ok(Some(path)) => events.push(AcquisitionEvent::SessionOpened(path)),
            Ok(None) => {}
            Err(err) => {
                log::error!("{}", err);
                events.push(AcquisitionEvent::PersistenceFailed(err.to_string()));
            }
        }
    }

    fn close_session(&mut self, events: &mut Vec<AcquisitionEvent>) {
        match self.writer.close() {
            Ok(Some(closed)) => events.push(AcquisitionEvent::SessionClosed(closed)),
            Ok(None) => {}
            Err(err) => {
                log::error!("{}", err);
                events.push(AcquisitionEvent::PersistenceFailed(err.to_string()));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::UNKNOWN_LABEL;

    const IDENTITY_LINE: &str = "0,0,1,0,0,0,1,0,0,0,1,0,0,0,0";

    fn machine() -> (tempfile::TempDir, AcquisitionMachine) {
        let dir = tempfile::tempdir().unwrap();
        let writer = SessionWriter::new(dir.path().join("trial"));
        (dir, AcquisitionMachine::new(writer))
    }

    #[test]
    fn unknown_code_only_reports_status() {
        let (_dir, mut machine) = machine();
        let events = machine.handle_line("999,1,2,3");
        assert_eq!(events, [AcquisitionEvent::Status(StatusCode::Unknown(999))]);
        assert_eq!(events[0].status_label(), Some(UNKNOWN_LABEL));
        assert_eq!(machine.phase(), Phase::Idle);
    }

    #[test]
    fn silent_lines_report_nothing() {
        let (_dir, mut machine) = machine();
        assert!(machine.handle_line(IDENTITY_LINE).is_empty());
        assert_eq!(machine.buffered(), 0);
    }

    #[test]
    fn zeroing_restarts_buffer() {
        let (_dir, mut machine) = machine();
        machine.handle_line("102,0");
        machine.handle_line(IDENTITY_LINE);
        machine.handle_line(IDENTITY_LINE);
        assert_eq!(machine.buffered(), 2);

        machine.handle_line("102,0");
        assert_eq!(machine.buffered(), 0);
        assert_eq!(machine.phase(), Phase::Calibrating);
    }

    #[test]
    fn status_lines_are_buffered_while_collecting() {
        let (_dir, mut machine) = machine();
        machine.handle_line("102,0");
        let events = machine.handle_line("106,0,1,0,0,0,1,0,0,0,1,0,0,0,0");
        assert_eq!(events, [AcquisitionEvent::Status(StatusCode::MagnetometerCalibrating)]);
        assert_eq!(machine.buffered(), 1);

        // Reported, but too short to be a sensor record.
        machine.handle_line("201,0");
        assert_eq!(machine.buffered(), 1);
    }

    #[test]
    fn empty_zeroing_keeps_previous_pose() {
        let (_dir, mut machine) = machine();
        machine.handle_line("102,0");
        let events = machine.handle_line("103,0");
        assert_eq!(
            events[1],
            AcquisitionEvent::Diagnostic(Diagnostic::Processing(
                processing::ProcessingError::EmptyCalibrationBuffer
            ))
        );
        assert_eq!(machine.phase(), Phase::Idle);
        assert!(machine.pose().is_none());
        assert!(machine.session_path().is_none());
    }

    #[test]
    fn zeroing_stop_outside_zeroing_is_ignored() {
        let (_dir, mut machine) = machine();
        let events = machine.handle_line("103,0");
        assert_eq!(events, [AcquisitionEvent::Status(StatusCode::ZeroingStopped)]);
        assert_eq!(machine.phase(), Phase::Idle);
    }

    #[test]
    fn recording_without_calibration_reports_diagnostic() {
        let (_dir, mut machine) = machine();
        machine.handle_line("104,0");
        machine.handle_line(IDENTITY_LINE);
        let events = machine.handle_line("105,0");

        assert_eq!(events[0], AcquisitionEvent::Status(StatusCode::ReadingStopped));
        assert_eq!(events[1], AcquisitionEvent::Diagnostic(Diagnostic::MissingCalibration));
        assert!(matches!(&events[2], AcquisitionEvent::SessionClosed(closed) if closed.lines == 1));
        assert_eq!(machine.phase(), Phase::Idle);
        assert_eq!(machine.buffered(), 0);
    }

    #[test]
    fn failed_session_file_does_not_stop_recording() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, "").unwrap();
        let mut machine = AcquisitionMachine::new(SessionWriter::new(blocker.join("trial")));

        let events = machine.handle_line("104,0");
        assert_eq!(events.len(), 2);
        assert!(matches!(events[1], AcquisitionEvent::PersistenceFailed(_)));
        assert_eq!(machine.phase(), Phase::Recording);
        assert!(machine.session_path().is_none());

        assert!(machine.handle_line(IDENTITY_LINE).is_empty());
        assert_eq!(machine.buffered(), 1);

        let events = machine.handle_line("105,0");
        assert_eq!(
            events,
            [
                AcquisitionEvent::Status(StatusCode::ReadingStopped),
                AcquisitionEvent::Diagnostic(Diagnostic::MissingCalibration),
            ]
        );
    }

    #[test]
    fn reading_restart_keeps_file_and_clears_buffer() {
        let (_dir, mut machine) = machine();
        machine.handle_line("104,0");
        let path = machine.session_path().unwrap().to_path_buf();
        machine.handle_line(IDENTITY_LINE);
        machine.handle_line(IDENTITY_LINE);

        let events = machine.handle_line("104,0");
        assert_eq!(events, [AcquisitionEvent::Status(StatusCode::ReadingStarted)]);
        assert_eq!(machine.buffered(), 0);
        assert_eq!(machine.session_path(), Some(path.as_path()));

        machine.handle_line(IDENTITY_LINE);
        let events = machine.handle_line("105,0");
        assert!(matches!(&events[2], AcquisitionEvent::SessionClosed(closed) if closed.path == path && closed.lines == 3));
    }

    #[test]
    fn shutdown_closes_open_session() {
        let (_dir, mut machine) = machine();
        machine.handle_line("104,0");
        assert!(machine.session_path().is_some());

        let events = machine.shutdown();
        assert!(matches!(&events[..], [AcquisitionEvent::SessionClosed(_)]));
        assert!(machine.session_path().is_none());
        assert!(machine.shutdown().is_empty());
    }
}
