//! Event payloads reported by the emulator core.

use std::fmt;

/// Handle of a virtual CPU slot in the emulator's CPU table.
///
/// The instrumentation layer never owns the CPU state this refers to. The
/// scheduler publishes the handle of whichever virtual CPU it is about to
/// step, and the notifiers copy it into outgoing events for exactly one call.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct VcpuId(pub u32);

impl fmt::Display for VcpuId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "vcpu{}", self.0)
    }
}

/// The running virtual CPU loaded a new page-table base (CR3 on x86), i.e.
/// the guest switched address spaces.
///
/// Both the outgoing and the incoming value are carried so a consumer can
/// follow context-switch direction without keeping a shadow copy of the
/// register.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AddressSpaceSwitch {
    /// Virtual CPU that executed the register write.
    pub vcpu: VcpuId,
    /// Page-table base that was active before the write.
    pub old: u32,
    /// Page-table base just loaded.
    pub new: u32,
}

impl AddressSpaceSwitch {
    /// The guest reloaded the register with its current value.
    ///
    /// Legitimate, just carries no information about a context switch.
    #[must_use]
    pub const fn is_reload(&self) -> bool {
        self.old == self.new
    }
}

/// The running virtual CPU retired a control-transfer ("call") instruction.
///
/// Addresses are raw guest instruction-pointer values; validating them is the
/// emulator's job, not this layer's.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CallEvent {
    /// Virtual CPU that executed the call.
    pub vcpu: VcpuId,
    /// Guest instruction pointer of the call site.
    pub origin: u32,
    /// Guest instruction pointer being transferred to.
    pub destination: u32,
}
