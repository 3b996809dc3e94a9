use std::{
    fs::{self, File},
    io::{BufWriter, Write},
    path::{Path, PathBuf},
};
use crate::*;

struct OpenSession {
    path: PathBuf,
    out: BufWriter<File>,
    lines: usize,
}

/// Summary of a session file that was just closed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClosedSession {
    pub path: PathBuf,
    /// Body lines written, the header is not counted.
    pub lines: usize,
}

/// Writes one session file at a time, named `{prefix}_{index:02}.txt`.
///
/// The index starts at 1 and advances on every successful open. It lives only as long as the
/// writer, a restarted process starts counting from 1 again.
pub struct SessionWriter {
    prefix: PathBuf,
    session_index: u32,
    session: Option<OpenSession>,
}

impl SessionWriter {
    pub fn new(prefix: impl Into<PathBuf>) -> Self {
        SessionWriter {
            prefix: prefix.into(),
            session_index: 1,
            session: None,
        }
    }

    /// Path the session with the given index is written to.
    pub fn session_path(&self, index: u32) -> PathBuf {
        let mut name = self.prefix.as_os_str().to_owned();
        name.push(format!("_{:02}.txt", index));
        PathBuf::from(name)
    }

    /// Index the next opened session will get.
    pub fn next_index(&self) -> u32 {
        self.session_index
    }

    pub fn is_open(&self) -> bool {
        self.session.is_some()
    }

    pub fn current_path(&self) -> Option<&Path> {
        self.session.as_ref().map(|s| s.path.as_path())
    }

    /// Create the next session file and write the header to it.
    ///
    /// Only one file is open at a time: while one is open this does nothing and returns
    /// `Ok(None)`, the header of the open file stays as it was.
    pub fn open(&mut self, header: &SessionHeader) -> Result<Option<PathBuf>, PersistenceError> {
        if self.session.is_some() {
            log::debug!("Session file already open, keeping it");
            return Ok(None);
        }

        let path = self.session_path(self.session_index);
        let create_err = |source| PersistenceError::Create {
            path: path.clone(),
            source,
        };

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(create_err)?;
        }
        let mut out = BufWriter::new(File::create(&path).map_err(create_err)?);
        header
            .write_to(&mut out)
            .and_then(|_| out.flush())
            .map_err(|source| PersistenceError::Write {
                path: path.clone(),
                source,
            })?;

        log::info!("Opened session file {:?}", path);
        self.session_index += 1;
        self.session = Some(OpenSession {
            path: path.clone(),
            out,
            lines: 0,
        });
        Ok(Some(path))
    }

    /// Append one body line verbatim and flush it, so every line written is on disk even if the
    /// process is killed with the file still open. Does nothing when no file is open.
    pub fn write_line(&mut self, line: &str) -> Result<(), PersistenceError> {
        let Some(session) = self.session.as_mut() else {
            return Ok(());
        };
        writeln!(session.out, "{}", line)
            .and_then(|_| session.out.flush())
            .map_err(|source| PersistenceError::Write {
                path: session.path.clone(),
                source,
            })?;
        session.lines += 1;
        Ok(())
    }

    /// Flush and release the open file. Closing when nothing is open is fine and returns
    /// `Ok(None)`.
    pub fn close(&mut self) -> Result<Option<ClosedSession>, PersistenceError> {
        let Some(mut session) = self.session.take() else {
            return Ok(None);
        };
        session.out.flush().map_err(|source| PersistenceError::Write {
            path: session.path.clone(),
            source,
        })?;

        log::info!("Closed session file {:?} with {} lines", session.path, session.lines);
        Ok(Some(ClosedSession {
            path: session.path,
            lines: session.lines,
        }))
    }
}

impl Drop for SessionWriter {
    fn drop(&mut self) {
        if let Err(err) = self.close() {
            log::error!("{}", err);
        }
    }
}
