//! Reconciliation engine for the folder mirror
//!
//! [`Mirror::reconcile`] makes a replica tree match a source tree in one pass.
//! Every mutation is reported to an injected [`EventSink`]; the [`Scheduler`]
//! repeats the pass on an interval until cancelled.

pub mod config;
pub mod engine;
pub mod error;
pub mod event;
pub mod report;
pub mod scheduler;
pub mod sink;

pub use config::{MirrorConfig, Settings};
pub use engine::{Decision, Mirror};
pub use error::{Error, Operation, Result};
pub use event::{ActionKind, ActionRecord, Event, EventSink, FailureRecord};
pub use report::CycleReport;
pub use scheduler::{Scheduler, SchedulerOutcome};
pub use sink::{ConsoleSink, LogFileSink, MemorySink, MultiSink, TracingSink};
