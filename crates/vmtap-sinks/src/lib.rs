//! Event-sink implementations for the `vmtap` instrumentation layer.
//!
//! Everything here sits behind the [`vmtap::EventSink`] capability; the core
//! hook layer knows none of these types. [`ControllerSink`] models the
//! external analysis controller, the rest are in-process consumers:
//!
//! - [`CountingSink`] - per-class event counters with a read handle
//! - [`RecordingSink`] - in-memory event log, the test workhorse
//! - [`TraceSink`] - mirrors events into the `tracing` output
//! - [`FileSink`] - packed binary event log for offline analysis

mod controller;
mod counting;
mod file;
mod log;
mod recording;

pub use controller::{ControllerEvent, ControllerSink};
pub use counting::{CountingHandle, CountingSink};
pub use file::FileSink;
pub use log::TraceSink;
pub use recording::{RecordedEvent, RecordingHandle, RecordingSink};
