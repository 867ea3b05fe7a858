//! In-memory event log for assertions and small captures.

use std::sync::Arc;

use parking_lot::Mutex;
use vmtap::{AddressSpaceSwitch, CallEvent, EventSink, Result};

/// One delivered event, in delivery order.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RecordedEvent {
    AddressSpaceSwitch(AddressSpaceSwitch),
    Call(CallEvent),
}

/// Appends every delivered event to a shared log.
#[derive(Default)]
pub struct RecordingSink {
    log: Arc<Mutex<Vec<RecordedEvent>>>,
}

impl RecordingSink {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Handle for reading the log after the sink is attached.
    #[must_use]
    pub fn handle(&self) -> RecordingHandle {
        RecordingHandle {
            log: Arc::clone(&self.log),
        }
    }
}

impl EventSink for RecordingSink {
    fn on_address_space_switch(&mut self, event: &AddressSpaceSwitch) -> Result<()> {
        self.log.lock().push(RecordedEvent::AddressSpaceSwitch(*event));
        Ok(())
    }

    fn on_call_event(&mut self, event: &CallEvent) -> Result<()> {
        self.log.lock().push(RecordedEvent::Call(*event));
        Ok(())
    }
}

/// Read side of a [`RecordingSink`].
#[derive(Clone)]
pub struct RecordingHandle {
    log: Arc<Mutex<Vec<RecordedEvent>>>,
}

impl RecordingHandle {
    /// Snapshot of everything recorded so far, in delivery order.
    #[must_use]
    pub fn events(&self) -> Vec<RecordedEvent> {
        self.log.lock().clone()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.log.lock().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.log.lock().is_empty()
    }
}
