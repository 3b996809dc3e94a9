use std::{io, path::PathBuf};
use math::MathError;
use thiserror::Error;

/// Failure to persist a session. Raised instead of dropping data silently.
#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("Could not create session file {path:?}: {source}")]
    Create {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Could not write to session file {path:?}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("Could not open session file {path:?}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Could not read session file: {0}")]
    Read(#[from] io::Error),
    #[error("Malformed header line {line_no}: {line:?}")]
    MalformedHeader { line_no: usize, line: String },
    #[error("Header is missing {key:?}")]
    MissingKey { key: &'static str },
    #[error("Header entry {key:?} has {found} values, expected {expected}")]
    WrongLength {
        key: &'static str,
        expected: usize,
        found: usize,
    },
    #[error("Header does not describe a valid calibration pose: {0}")]
    InvalidPose(#[from] MathError),
}
