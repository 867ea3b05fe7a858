//! Instrumentation hook layer for virtual-CPU emulators.
//!
//! The emulator core reports two classes of guest events - address-space
//! switches (page-table-base register writes) and retired call instructions -
//! and this crate fans them out to attached consumers. Consumers implement
//! the [`EventSink`] capability; the layer itself never knows what they do
//! with the events.
//!
//! Both notifiers sit on the emulator's hottest paths, so the activation
//! decision is a single relaxed atomic load: with nothing attached, a
//! notification costs one branch and returns [`HookStatus::Inactive`].
//!
//! # Example
//!
//! ```
//! use vmtap::Instrumentation;
//!
//! let tap = Instrumentation::new();
//! // Nothing attached: the notifier declines in O(1).
//! assert!(tap.update_cr3(0x1000, 0x2000).is_inactive());
//! ```

mod error;
mod event;
mod instrument;
pub mod metrics;
mod sink;

pub use error::{Result, SinkError};
pub use event::{AddressSpaceSwitch, CallEvent, VcpuId};
pub use instrument::{HookStatus, Instrumentation, SinkId};
pub use sink::{EventSink, Interest, NoopSink, SinkKind};
