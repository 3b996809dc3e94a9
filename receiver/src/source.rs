use std::{
    fs::File,
    io::{self, BufRead, BufReader},
    path::{Path, PathBuf},
    str::Utf8Error,
};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SourceError {
    /// The line could not be decoded; the source itself is still usable.
    #[error("undecodable line: {0}")]
    Decode(#[from] Utf8Error),
    /// The underlying connection is gone.
    #[error("line source unavailable: {0}")]
    Unavailable(#[from] io::Error),
    #[error("could not open {path:?}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl SourceError {
    /// Whether reading may continue after this error.
    pub fn is_skippable(&self) -> bool {
        matches!(self, Self::Decode(_))
    }
}

/// Blocking producer of decoded text lines.
pub trait LineSource {
    /// Next non-empty line with surrounding whitespace removed, `Ok(None)` once the stream ended.
    fn next_line(&mut self) -> Result<Option<String>, SourceError>;
}

impl<S: LineSource + ?Sized> LineSource for Box<S> {
    fn next_line(&mut self) -> Result<Option<String>, SourceError> {
        (**self).next_line()
    }
}

/// Line source over anything buffered, e.g. a recorded capture or stdin.
pub struct ReaderSource<R> {
    reader: R,
    buf: Vec<u8>,
}

impl<R: BufRead> ReaderSource<R> {
    pub fn new(reader: R) -> Self {
        ReaderSource {
            reader,
            buf: Vec::with_capacity(256),
        }
    }
}

impl<R: BufRead> LineSource for ReaderSource<R> {
    fn next_line(&mut self) -> Result<Option<String>, SourceError> {
        loop {
            self.buf.clear();
            if self.reader.read_until(b'\n', &mut self.buf)? == 0 {
                return Ok(None);
            }
            let line = std::str::from_utf8(&self.buf)?.trim();
            if !line.is_empty() {
                return Ok(Some(line.to_string()));
            }
        }
    }
}

/// Open the capture file at `input`, or stdin when no file is given.
pub fn open_source(input: Option<&Path>) -> Result<Box<dyn LineSource + Send>, SourceError> {
    match input {
        Some(path) => {
            let file = File::open(path).map_err(|source| SourceError::Open {
                path: path.to_path_buf(),
                source,
            })?;
            log::info!("Reading lines from {:?}", path);
            Ok(Box::new(ReaderSource::new(BufReader::new(file))))
        }
        None => {
            log::info!("Reading lines from stdin");
            Ok(Box::new(ReaderSource::new(BufReader::new(io::stdin()))))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn yields_trimmed_non_empty_lines() {
        let mut source = ReaderSource::new(&b"101,0\r\n\n  \n0,1,2\n105,0"[..]);
        assert_eq!(source.next_line().unwrap().as_deref(), Some("101,0"));
        assert_eq!(source.next_line().unwrap().as_deref(), Some("0,1,2"));
        assert_eq!(source.next_line().unwrap().as_deref(), Some("105,0"));
        assert_eq!(source.next_line().unwrap(), None);
    }

    #[test]
    fn invalid_utf8_is_skippable() {
        let mut source = ReaderSource::new(&b"\xff\xfe,1\n101,0\n"[..]);
        let err = source.next_line().unwrap_err();
        assert!(err.is_skippable());
        assert_eq!(source.next_line().unwrap().as_deref(), Some("101,0"));
    }

    #[test]
    fn missing_file_cannot_be_opened() {
        let dir = tempfile::tempdir().unwrap();
        let err = open_source(Some(&dir.path().join("absent.txt"))).err().unwrap();
        assert!(!err.is_skippable());
    }
}
