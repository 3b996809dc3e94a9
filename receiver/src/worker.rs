//! Dedicated background thread that owns the line source and the state machine.

use std::{
    io,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    thread::{self, JoinHandle},
};
use crossbeam_channel::Sender;
use thiserror::Error;
use crate::{
    events::AcquisitionEvent,
    machine::AcquisitionMachine,
    source::{LineSource, SourceError},
};

#[derive(Debug, Error)]
pub enum WorkerError {
    #[error("could not spawn acquisition thread: {0}")]
    Spawn(#[from] io::Error),
    #[error("acquisition thread panicked")]
    ThreadPanic,
}

/// Events are fire-and-forget: a presentation side that went away must not stop acquisition.
fn emit(events: &Sender<AcquisitionEvent>, event: AcquisitionEvent) {
    if events.send(event).is_err() {
        log::trace!("Event dropped, no receiver");
    }
}

/// Shuts the machine down when dropped, so the session file is closed on every way out of the
/// read loop, unwinding included.
struct ShutdownGuard {
    machine: AcquisitionMachine,
    events: Sender<AcquisitionEvent>,
}

impl Drop for ShutdownGuard {
    fn drop(&mut self) {
        for event in self.machine.shutdown() {
            emit(&self.events, event);
        }
    }
}

/// Read and handle lines until the stop flag is raised, the stream ends or the source fails.
/// The flag is checked between lines; a read that blocks keeps blocking.
pub fn run_acquisition_loop<S: LineSource + ?Sized>(
    source: &mut S,
    machine: &mut AcquisitionMachine,
    events: &Sender<AcquisitionEvent>,
    stop: &AtomicBool,
) {
    let mut lines: u64 = 0;

    while !stop.load(Ordering::Relaxed) {
        match source.next_line() {
            Ok(Some(line)) => {
                for event in machine.handle_line(&line) {
                    emit(events, event);
                }
                lines += 1;
                if lines % 1000 == 0 {
                    log::debug!("{} lines processed", lines);
                }
            }
            Ok(None) => {
                log::info!("Line source ended after {} lines", lines);
                return;
            }
            Err(err) if err.is_skippable() => {
                log::debug!("Skipping line: {}", err);
            }
            Err(err) => {
                log::error!("{}", err);
                emit(events, AcquisitionEvent::Fatal(err.to_string()));
                return;
            }
        }
    }
    log::info!("Acquisition stopped after {} lines", lines);
}

/// Handle to the acquisition thread.
pub struct AcquisitionWorker {
    stop: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl AcquisitionWorker {
    /// Start the worker. `open` runs on the worker thread; failing to open the source is reported
    /// like losing it mid-stream, as a single fatal event.
    pub fn spawn<S, F>(
        open: F,
        machine: AcquisitionMachine,
        events: Sender<AcquisitionEvent>,
    ) -> Result<Self, WorkerError>
    where
        S: LineSource,
        F: FnOnce() -> Result<S, SourceError> + Send + 'static,
        S: 'static,
    {
        let stop = Arc::new(AtomicBool::new(false));
        let thread_stop = stop.clone();

        let handle = thread::Builder::new()
            .name("acquisition".into())
            .spawn(move || {
                let mut guard = ShutdownGuard {
                    machine,
                    events: events.clone(),
                };
                let mut source = match open() {
                    Ok(source) => source,
                    Err(err) => {
                        log::error!("{}", err);
                        emit(&events, AcquisitionEvent::Fatal(err.to_string()));
                        return;
                    }
                };
                run_acquisition_loop(&mut source, &mut guard.machine, &events, &thread_stop);
            })?;

        Ok(AcquisitionWorker {
            stop,
            handle: Some(handle),
        })
    }

    /// Ask the worker to exit at the next line boundary.
    pub fn stop(&self) {
        self.stop.store(true, Ordering::Relaxed);
    }

    /// Shared stop flag, for raising it from another thread such as a signal handler.
    pub fn stop_signal(&self) -> Arc<AtomicBool> {
        self.stop.clone()
    }

    /// Wait for the thread to finish.
    pub fn join(mut self) -> Result<(), WorkerError> {
        match self.handle.take() {
            Some(handle) => handle.join().map_err(|_| WorkerError::ThreadPanic),
            None => Ok(()),
        }
    }
}
