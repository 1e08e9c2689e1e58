//! Event sink implementations: console, log file, tracing, fan-out and memory

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use crate::event::{ActionRecord, Event, EventSink, FailureRecord};

/// Writes `<timestamp> - <message>` lines to stdout, failures to stderr.
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleSink;

impl EventSink for ConsoleSink {
    fn emit(&self, event: &Event) {
        if event.is_failure() {
            eprintln!("{}", event.to_line());
        } else {
            println!("{}", event.to_line());
        }
    }
}

/// Appends `<timestamp> - <message>` lines to a log file.
#[derive(Debug)]
pub struct LogFileSink {
    path: PathBuf,
    file: Mutex<File>,
}

impl LogFileSink {
    /// Open `path` for appending, creating it and its parent directories.
    pub fn create(path: impl Into<PathBuf>) -> mirror_fs::Result<Self> {
        let path = path.into();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            mirror_fs::io::create_dir_all(parent)?;
        }
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|e| mirror_fs::Error::io(&path, e))?;

        Ok(Self {
            path,
            file: Mutex::new(file),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl EventSink for LogFileSink {
    fn emit(&self, event: &Event) {
        let mut file = self.file.lock().unwrap_or_else(PoisonError::into_inner);
        if let Err(e) = writeln!(file, "{}", event.to_line()).and_then(|_| file.flush()) {
            tracing::warn!(log_file = %self.path.display(), error = %e, "Failed to write log line");
        }
    }
}

/// Forwards events to `tracing`: actions at info, failures at error.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl EventSink for TracingSink {
    fn emit(&self, event: &Event) {
        match event {
            Event::Action(ActionRecord { kind, path, .. }) => {
                tracing::info!(?kind, path = %path.display(), "{}", event.message());
            }
            Event::Failure(FailureRecord { message, .. }) => {
                tracing::error!("{}", message);
            }
        }
    }
}

/// Fans every event out to each inner sink, in order.
#[derive(Default, Clone)]
pub struct MultiSink {
    sinks: Vec<Arc<dyn EventSink>>,
}

impl MultiSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, sink: impl EventSink + 'static) -> Self {
        self.sinks.push(Arc::new(sink));
        self
    }

    pub fn len(&self) -> usize {
        self.sinks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }
}

impl EventSink for MultiSink {
    fn emit(&self, event: &Event) {
        for sink in &self.sinks {
            sink.emit(event);
        }
    }
}

/// Keeps every event in memory.
#[derive(Debug, Default)]
pub struct MemorySink {
    events: Mutex<Vec<Event>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<Event> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn actions(&self) -> Vec<ActionRecord> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                Event::Action(record) => Some(record),
                Event::Failure(_) => None,
            })
            .collect()
    }

    pub fn failures(&self) -> Vec<FailureRecord> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                Event::Failure(record) => Some(record),
                Event::Action(_) => None,
            })
            .collect()
    }

    /// Drain the collected events.
    pub fn take(&self) -> Vec<Event> {
        std::mem::take(&mut *self.events.lock().unwrap_or_else(PoisonError::into_inner))
    }
}

impl EventSink for MemorySink {
    fn emit(&self, event: &Event) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event.clone());
    }
}

impl<S: EventSink + ?Sized> EventSink for Arc<S> {
    fn emit(&self, event: &Event) {
        (**self).emit(event);
    }
}
