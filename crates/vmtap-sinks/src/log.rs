//! Sink that mirrors events into the `tracing` output.

use tracing::debug;
use vmtap::{AddressSpaceSwitch, CallEvent, EventSink, Result};

/// Emits each event as a `tracing` event at debug level.
///
/// Useful while bringing up an embedder; for real analysis attach a
/// [`ControllerSink`](crate::ControllerSink) instead.
#[derive(Default)]
pub struct TraceSink;

impl TraceSink {
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl EventSink for TraceSink {
    fn on_address_space_switch(&mut self, event: &AddressSpaceSwitch) -> Result<()> {
        debug!(
            "{}: address space {:#010x} -> {:#010x}",
            event.vcpu, event.old, event.new
        );
        Ok(())
    }

    fn on_call_event(&mut self, event: &CallEvent) -> Result<()> {
        debug!(
            "{}: call {:#010x} -> {:#010x}",
            event.vcpu, event.origin, event.destination
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vmtap::VcpuId;

    #[test]
    fn test_trace_sink_accepts_events() {
        let mut sink = TraceSink::new();
        let switch = AddressSpaceSwitch {
            vcpu: VcpuId(0),
            old: 0x1000,
            new: 0x2000,
        };
        assert!(sink.on_address_space_switch(&switch).is_ok());
    }
}
