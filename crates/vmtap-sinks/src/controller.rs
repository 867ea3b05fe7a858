//! Boundary to an external analysis controller.
//!
//! The controller (a scripted or embedded analysis engine) runs outside the
//! emulation loop and drains a bounded channel. Delivery is synchronous from
//! the emulator's point of view: a full channel blocks the stepping thread
//! until the controller catches up, and a controller that hung up turns
//! every further delivery into a failure.

use std::sync::mpsc::{Receiver, SyncSender, sync_channel};

use vmtap::{AddressSpaceSwitch, CallEvent, EventSink, Result, SinkError, SinkKind};

/// Event as seen by the controller.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ControllerEvent {
    AddressSpaceSwitch(AddressSpaceSwitch),
    Call(CallEvent),
}

/// Forwards events to an analysis controller over a bounded channel.
///
/// Reports [`SinkKind::Controller`], so attaching one raises the
/// instrumentation layer's controller flag.
pub struct ControllerSink {
    tx: SyncSender<ControllerEvent>,
}

impl ControllerSink {
    /// Create the sink plus the receiving end for the controller thread.
    ///
    /// `capacity` bounds how far the controller may fall behind before the
    /// emulating thread blocks on the next event.
    #[must_use]
    pub fn channel(capacity: usize) -> (Self, Receiver<ControllerEvent>) {
        let (tx, rx) = sync_channel(capacity);
        (Self { tx }, rx)
    }

    fn forward(&self, event: ControllerEvent) -> Result<()> {
        self.tx
            .send(event)
            .map_err(|_| SinkError::ControllerUnavailable("controller hung up".into()))
    }
}

impl EventSink for ControllerSink {
    fn on_address_space_switch(&mut self, event: &AddressSpaceSwitch) -> Result<()> {
        self.forward(ControllerEvent::AddressSpaceSwitch(*event))
    }

    fn on_call_event(&mut self, event: &CallEvent) -> Result<()> {
        self.forward(ControllerEvent::Call(*event))
    }

    fn kind(&self) -> SinkKind {
        SinkKind::Controller
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vmtap::VcpuId;

    #[test]
    fn test_forwards_events_in_order() {
        let (mut sink, rx) = ControllerSink::channel(8);
        assert_eq!(sink.kind(), SinkKind::Controller);

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

        assert_eq!(rx.recv().unwrap(), ControllerEvent::AddressSpaceSwitch(switch));
        assert_eq!(rx.recv().unwrap(), ControllerEvent::Call(call));
    }

    #[test]
    fn test_hung_up_controller_fails_delivery() {
        let (mut sink, rx) = ControllerSink::channel(8);
        drop(rx);

        let call = CallEvent {
            vcpu: VcpuId(0),
            origin: 0x4010,
            destination: 0x8000,
        };
        let err = sink.on_call_event(&call).unwrap_err();
        assert!(matches!(err, SinkError::ControllerUnavailable(_)));
    }
}
