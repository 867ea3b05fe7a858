//! Per-class event counters, readable while the sink stays attached.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use vmtap::{AddressSpaceSwitch, CallEvent, EventSink, Result};

#[derive(Default)]
struct Counters {
    address_space: AtomicU64,
    calls: AtomicU64,
}

/// Counts delivered events per class.
///
/// Attaching hands the sink over to the instrumentation layer, so the counts
/// are exposed through a [`CountingHandle`] that stays with the embedder.
#[derive(Default)]
pub struct CountingSink {
    counters: Arc<Counters>,
}

impl CountingSink {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Handle for reading the counters after the sink is attached.
    #[must_use]
    pub fn handle(&self) -> CountingHandle {
        CountingHandle {
            counters: Arc::clone(&self.counters),
        }
    }
}

impl EventSink for CountingSink {
    fn on_address_space_switch(&mut self, _event: &AddressSpaceSwitch) -> Result<()> {
        self.counters.address_space.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    fn on_call_event(&mut self, _event: &CallEvent) -> Result<()> {
        self.counters.calls.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }
}

/// Read side of a [`CountingSink`].
#[derive(Clone)]
pub struct CountingHandle {
    counters: Arc<Counters>,
}

impl CountingHandle {
    /// Address-space switches delivered so far.
    #[must_use]
    pub fn address_space_switches(&self) -> u64 {
        self.counters.address_space.load(Ordering::Relaxed)
    }

    /// Call events delivered so far.
    #[must_use]
    pub fn calls(&self) -> u64 {
        self.counters.calls.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vmtap::VcpuId;

    #[test]
    fn test_counts_per_class() {
        let mut sink = CountingSink::new();
        let handle = sink.handle();

        let switch = AddressSpaceSwitch {
            vcpu: VcpuId(0),
            old: 0x1000,
            new: 0x2000,
        };
        let call = CallEvent {
            vcpu: VcpuId(0),
            origin: 0x4010,
            destination: 0x8000,
        };

        sink.on_address_space_switch(&switch).unwrap();
        sink.on_call_event(&call).unwrap();
        sink.on_call_event(&call).unwrap();

        assert_eq!(handle.address_space_switches(), 1);
        assert_eq!(handle.calls(), 2);
    }
}
