//! The consumer capability for instrumentation events.

use crate::error::Result;
use crate::event::{AddressSpaceSwitch, CallEvent};

/// What a sink is, as far as the activation state cares.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SinkKind {
    /// A consumer living inside the emulator process.
    #[default]
    InProcess,
    /// A scripted or embedded analysis controller. Attaching one raises
    /// [`Instrumentation::controller_attached`](crate::Instrumentation::controller_attached).
    Controller,
}

/// Event classes a sink wants delivered.
///
/// Declared once at attach time. The per-class activation flags are the
/// union of the interests of every attached sink, so the first subscriber
/// of a class arms its hot-path gate and the last one leaving disarms it.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Interest {
    /// Page-table-base writes (guest address-space switches).
    pub address_space: bool,
    /// Retired call instructions. These fire far more often than
    /// address-space switches; subscribing makes the emulator pay on
    /// every call.
    pub calls: bool,
}

impl Interest {
    /// Address-space switches only.
    pub const ADDRESS_SPACE: Self = Self {
        address_space: true,
        calls: false,
    };
    /// Call events only.
    pub const CALLS: Self = Self {
        address_space: false,
        calls: true,
    };
    /// Both event classes.
    pub const ALL: Self = Self {
        address_space: true,
        calls: true,
    };

    /// No event class selected.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        !self.address_space && !self.calls
    }
}

/// A consumer of instrumentation events.
///
/// All methods default to accepting the event and doing nothing, so an
/// implementation only overrides the classes it subscribes to. Sinks run
/// synchronously on the thread stepping the virtual CPU: a slow sink stalls
/// that CPU for the duration of the call, which is the accepted trade-off
/// for delivering events in exact emulation order.
pub trait EventSink: Send {
    /// The running virtual CPU switched address spaces.
    fn on_address_space_switch(&mut self, _event: &AddressSpaceSwitch) -> Result<()> {
        Ok(())
    }

    /// The running virtual CPU retired a call instruction.
    fn on_call_event(&mut self, _event: &CallEvent) -> Result<()> {
        Ok(())
    }

    /// What this sink is, for the controller activation flag.
    fn kind(&self) -> SinkKind {
        SinkKind::InProcess
    }
}

/// Sink that accepts and discards every event.
#[derive(Default)]
pub struct NoopSink;

impl EventSink for NoopSink {}
