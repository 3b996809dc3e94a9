//! Console side of the receiver: turns acquisition events into log output and optional CSV files.

use std::path::{Path, PathBuf};
use processing::{angular_velocity, filtered_velocity, JointSeries};
use serde::Serialize;
use crate::{events::AcquisitionEvent, protocol::SOURCE_FAILURE_LABEL};

/// Headline numbers of one processed series.
#[derive(Debug, Clone, PartialEq)]
pub struct SeriesSummary {
    pub samples: usize,
    pub duration_ms: i64,
    /// Largest knee and ankle angle, in degrees.
    pub peak_knee_deg: f64,
    pub peak_ankle_deg: f64,
    /// Largest absolute angular velocity, in deg/s. `None` with fewer than two samples.
    pub peak_knee_velocity: Option<f64>,
    pub peak_ankle_velocity: Option<f64>,
}

/// Knee and ankle angular velocity of a series, one entry shorter than the series.
#[derive(Debug, Clone, PartialEq)]
pub struct JointVelocity {
    pub knee: Vec<f64>,
    pub ankle: Vec<f64>,
}

impl JointVelocity {
    /// Filtered velocity, or the raw finite difference when the series cannot be filtered.
    pub fn of(series: &JointSeries, cutoff_hz: f64) -> Self {
        let joint = |angle: &[f64], name: &str| {
            filtered_velocity(&series.time_ms, angle, cutoff_hz).unwrap_or_else(|err| {
                log::warn!("Unfiltered {} velocity: {}", name, err);
                angular_velocity(&series.time_ms, angle)
            })
        };
        JointVelocity {
            knee: joint(&series.knee_angle, "knee"),
            ankle: joint(&series.ankle_angle, "ankle"),
        }
    }
}

#[derive(Debug, Serialize)]
struct AngleRow {
    time_ms: i64,
    knee_deg: f64,
    ankle_deg: f64,
    pressure: f64,
    knee_velocity: Option<f64>,
    ankle_velocity: Option<f64>,
}

fn peak(values: &[f64]) -> f64 {
    values.iter().copied().fold(f64::NEG_INFINITY, f64::max)
}

fn peak_abs(values: &[f64]) -> Option<f64> {
    values.iter().map(|v| v.abs()).reduce(f64::max)
}

pub fn summarize(series: &JointSeries, velocity: &JointVelocity) -> SeriesSummary {
    let duration_ms = match (series.time_ms.first(), series.time_ms.last()) {
        (Some(first), Some(last)) => last - first,
        _ => 0,
    };
    SeriesSummary {
        samples: series.len(),
        duration_ms,
        peak_knee_deg: peak(&series.knee_angle),
        peak_ankle_deg: peak(&series.ankle_angle),
        peak_knee_velocity: peak_abs(&velocity.knee),
        peak_ankle_velocity: peak_abs(&velocity.ankle),
    }
}

/// `walk_03.txt` exports to `walk_03_angles.csv` in the same directory.
pub fn csv_path(session: &Path) -> PathBuf {
    let stem = session
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| "session".to_string());
    session.with_file_name(format!("{}_angles.csv", stem))
}

/// Write one row per sample; the last row has no velocity.
pub fn export_csv(path: &Path, series: &JointSeries, velocity: &JointVelocity) -> Result<(), csv::Error> {
    let mut writer = csv::Writer::from_path(path)?;
    for i in 0..series.len() {
        writer.serialize(AngleRow {
            time_ms: series.time_ms[i],
            knee_deg: series.knee_angle[i],
            ankle_deg: series.ankle_angle[i],
            pressure: series.pressure[i],
            knee_velocity: velocity.knee.get(i).copied(),
            ankle_velocity: velocity.ankle.get(i).copied(),
        })?;
    }
    writer.flush()?;
    Ok(())
}

/// Logs every event and exports series when asked to.
pub struct ConsolePresenter {
    cutoff_hz: f64,
    export_csv: bool,
    session: Option<PathBuf>,
    fatal: bool,
}

impl ConsolePresenter {
    pub fn new(cutoff_hz: f64, export_csv: bool) -> Self {
        ConsolePresenter {
            cutoff_hz,
            export_csv,
            session: None,
            fatal: false,
        }
    }

    /// Session file the next series belongs to.
    pub fn session(&self) -> Option<&Path> {
        self.session.as_deref()
    }

    /// Whether the line source failed.
    pub fn saw_fatal(&self) -> bool {
        self.fatal
    }

    pub fn handle(&mut self, event: AcquisitionEvent) {
        match event {
            AcquisitionEvent::Status(status) => {
                if let Some(label) = status.label() {
                    log::info!("[{}] {}", status.code(), label);
                }
            }
            AcquisitionEvent::Calibrated(calibration) => log::info!(
                "Calibrated: initial knee {:.2} deg, initial ankle {:.2} deg",
                calibration.initial_knee_angle_deg,
                calibration.initial_ankle_angle_deg
            ),
            AcquisitionEvent::Series(series) => {
                if let Err(err) = self.present_series(&series, self.session.as_deref()) {
                    log::error!("CSV export failed: {}", err);
                }
            }
            AcquisitionEvent::SessionOpened(path) => {
                log::info!("Writing session to {:?}", path);
                self.session = Some(path);
            }
            AcquisitionEvent::SessionClosed(closed) => {
                log::info!("Closed {:?} with {} lines", closed.path, closed.lines);
                // The series of a recording arrives before its file is closed.
                self.session = None;
            }
            AcquisitionEvent::Diagnostic(diagnostic) => log::warn!("No result: {:?}", diagnostic),
            AcquisitionEvent::PersistenceFailed(message) => log::error!("Session file: {}", message),
            AcquisitionEvent::Fatal(message) => {
                log::error!("{}: {}", SOURCE_FAILURE_LABEL, message);
                self.fatal = true;
            }
        }
    }

    /// Log the summary of a series and export it next to `session` when enabled.
    pub fn present_series(
        &self,
        series: &JointSeries,
        session: Option<&Path>,
    ) -> Result<SeriesSummary, csv::Error> {
        let velocity = JointVelocity::of(series, self.cutoff_hz);
        let summary = summarize(series, &velocity);

        log::info!(
            "{} samples over {} ms, peak knee {:.2} deg, peak ankle {:.2} deg",
            summary.samples,
            summary.duration_ms,
            summary.peak_knee_deg,
            summary.peak_ankle_deg
        );
        if let (Some(knee), Some(ankle)) = (summary.peak_knee_velocity, summary.peak_ankle_velocity) {
            log::info!("Peak velocity: knee {:.1} deg/s, ankle {:.1} deg/s", knee, ankle);
        }

        if self.export_csv {
            match session {
                Some(session) => {
                    let path = csv_path(session);
                    export_csv(&path, series, &velocity)?;
                    log::info!("Exported angles to {:?}", path);
                }
                None => log::warn!("No session file, angles not exported"),
            }
        }
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use processing::{process_batch, CalibrationPose};
    use session::ClosedSession;
    use std::fs;

    /// Shank and foot turn together about x by 0.1 deg every 10 ms, the thigh stays put.
    fn ramp(samples: usize) -> JointSeries {
        let lines: Vec<String> = (0..samples)
            .map(|i| {
                let half = (0.1 * i as f64).to_radians() / 2.0;
                let (s, c) = half.sin_cos();
                format!("0,{},1,0,0,0,{c},{s},0,0,{c},{s},0,0,{}", i * 10, i)
            })
            .collect();
        let pose = CalibrationPose::calibrate(&["0,0,1,0,0,0,1,0,0,0,1,0,0,0,0"]).unwrap();
        process_batch(&lines, &pose).unwrap()
    }

    #[test]
    fn summary_of_ramp() {
        let series = ramp(20);
        let velocity = JointVelocity::of(&series, 20.0);
        let summary = summarize(&series, &velocity);

        assert_eq!(summary.samples, 20);
        assert_eq!(summary.duration_ms, 190);
        assert_abs_diff_eq!(summary.peak_knee_deg, 1.9, epsilon = 1e-6);
        assert_abs_diff_eq!(summary.peak_ankle_deg, 0.0, epsilon = 1e-4);
        assert_abs_diff_eq!(summary.peak_knee_velocity.unwrap(), 10.0, epsilon = 1e-3);
    }

    #[test]
    fn short_series_falls_back_to_raw_velocity() {
        let series = ramp(4);
        let velocity = JointVelocity::of(&series, 20.0);
        assert_eq!(velocity.knee.len(), 3);
        for v in &velocity.knee {
            assert_abs_diff_eq!(*v, 10.0, epsilon = 1e-3);
        }

        let single = ramp(1);
        let summary = summarize(&single, &JointVelocity::of(&single, 20.0));
        assert_eq!(summary.duration_ms, 0);
        assert_eq!(summary.peak_knee_velocity, None);
    }

    #[test]
    fn csv_is_named_after_session() {
        assert_eq!(
            csv_path(Path::new("data/walk_03.txt")),
            PathBuf::from("data/walk_03_angles.csv")
        );
    }

    #[test]
    fn exports_one_row_per_sample() {
        let dir = tempfile::tempdir().unwrap();
        let session = dir.path().join("walk_01.txt");
        let series = ramp(12);

        let presenter = ConsolePresenter::new(20.0, true);
        presenter.present_series(&series, Some(&session)).unwrap();

        let contents = fs::read_to_string(dir.path().join("walk_01_angles.csv")).unwrap();
        let rows: Vec<&str> = contents.lines().collect();
        assert_eq!(rows.len(), 13);
        assert_eq!(rows[0], "time_ms,knee_deg,ankle_deg,pressure,knee_velocity,ankle_velocity");
        assert!(rows[1].starts_with("0,0.0,0.0,0.0,"));
        assert!(rows[12].starts_with("110,"));
        assert!(rows[12].ends_with(",11.0,,"));
    }

    #[test]
    fn export_disabled_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let session = dir.path().join("walk_01.txt");
        ConsolePresenter::new(20.0, false)
            .present_series(&ramp(12), Some(&session))
            .unwrap();
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn tracks_session_and_failure() {
        let mut presenter = ConsolePresenter::new(20.0, false);
        presenter.handle(AcquisitionEvent::SessionOpened(PathBuf::from("walk_01.txt")));
        assert_eq!(presenter.session(), Some(Path::new("walk_01.txt")));

        presenter.handle(AcquisitionEvent::SessionClosed(ClosedSession {
            path: PathBuf::from("walk_01.txt"),
            lines: 3,
        }));
        assert_eq!(presenter.session(), None);
        assert!(!presenter.saw_fatal());

        presenter.handle(AcquisitionEvent::Fatal("broken pipe".into()));
        assert!(presenter.saw_fatal());
    }
}
