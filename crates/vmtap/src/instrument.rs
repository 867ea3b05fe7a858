//! Activation state and the hot-path notifiers.
//!
//! One [`Instrumentation`] value is owned by the emulator instance and shared
//! with its scheduler and attach/detach plumbing. The notifiers are pure
//! readers of the state: they gate on one relaxed atomic load and only take
//! the sink table lock once a consumer is known to be listening.

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

use parking_lot::Mutex;
use tracing::{debug, warn};

use crate::event::{AddressSpaceSwitch, CallEvent, VcpuId};
use crate::metrics::{
    CLASS_ADDRESS_SPACE, CLASS_CALL, record_delivery_failures, record_events_delivered,
};
use crate::sink::{EventSink, Interest, SinkKind};

/// Sentinel in the current-vCPU cell meaning "no CPU is being stepped".
const NO_VCPU: u32 = u32::MAX;

/// Outcome of a hook notification, reported back to the emulator core.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[must_use]
pub enum HookStatus {
    /// Every interested consumer accepted the event.
    Delivered,
    /// Nothing is listening for this event class; no work was done.
    Inactive,
    /// At least one consumer failed to process the event.
    Failed,
}

impl HookStatus {
    /// The event reached every interested consumer.
    #[must_use]
    pub const fn is_delivered(&self) -> bool {
        matches!(self, Self::Delivered)
    }

    /// The gate declined the event; nothing was delivered.
    #[must_use]
    pub const fn is_inactive(&self) -> bool {
        matches!(self, Self::Inactive)
    }

    /// A consumer failed; the emulator decides whether to log or abort.
    #[must_use]
    pub const fn is_failed(&self) -> bool {
        matches!(self, Self::Failed)
    }
}

/// Identifier handed out by [`Instrumentation::attach`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SinkId(u64);

struct SinkEntry {
    id: SinkId,
    interest: Interest,
    kind: SinkKind,
    sink: Box<dyn EventSink>,
}

#[derive(Default)]
struct SinkTable {
    next_id: u64,
    entries: Vec<SinkEntry>,
}

/// Instrumentation state for one emulator instance.
///
/// Single source of truth for "is anyone listening" and "which virtual CPU
/// is live". Held by the emulator for the lifetime of the process; a process
/// hosting several emulator instances gives each its own value.
///
/// Mutation is restricted to three paths: construction (everything starts
/// inactive), the scheduler ([`enter_vcpu`](Self::enter_vcpu) /
/// [`leave_vcpu`](Self::leave_vcpu)), and consumer churn
/// ([`attach`](Self::attach) / [`detach`](Self::detach)). The notifiers only
/// read.
pub struct Instrumentation {
    // Hot-path gates, one per event class. Plain relaxed atomics: the sink
    // table mutex orders flag updates against delivery.
    address_space_active: AtomicBool,
    call_active: AtomicBool,
    controller_active: AtomicBool,
    current_vcpu: AtomicU32,
    sinks: Mutex<SinkTable>,
}

impl Instrumentation {
    /// Set up the instrumentation state for one emulator instance.
    ///
    /// Called once at emulator startup, before any virtual CPU steps. All
    /// event classes start inactive and no virtual CPU is scheduled.
    #[must_use]
    pub fn new() -> Self {
        Self {
            address_space_active: AtomicBool::new(false),
            call_active: AtomicBool::new(false),
            controller_active: AtomicBool::new(false),
            current_vcpu: AtomicU32::new(NO_VCPU),
            sinks: Mutex::new(SinkTable::default()),
        }
    }

    // ========================================================================
    // Scheduler interface
    // ========================================================================

    /// Publish the virtual CPU the calling thread is about to step.
    ///
    /// The handle is copied into every event delivered until the next
    /// `enter_vcpu` or [`leave_vcpu`](Self::leave_vcpu); the layer never
    /// retains it beyond a single notification.
    pub fn enter_vcpu(&self, vcpu: VcpuId) {
        debug_assert_ne!(vcpu.0, NO_VCPU, "vcpu handle collides with the none sentinel");
        self.current_vcpu.store(vcpu.0, Ordering::Relaxed);
    }

    /// Clear the scheduled virtual CPU, e.g. while the scheduler itself runs.
    pub fn leave_vcpu(&self) {
        self.current_vcpu.store(NO_VCPU, Ordering::Relaxed);
    }

    /// Virtual CPU currently being stepped, if any.
    #[must_use]
    pub fn current_vcpu(&self) -> Option<VcpuId> {
        match self.current_vcpu.load(Ordering::Relaxed) {
            NO_VCPU => None,
            raw => Some(VcpuId(raw)),
        }
    }

    // ========================================================================
    // Attach/detach interface
    // ========================================================================

    /// Attach a consumer for the given event classes.
    ///
    /// The per-class activation flags are recomputed, so the first subscriber
    /// of a class arms its hot-path gate. Attaching with an empty interest is
    /// allowed but the sink will never be called.
    pub fn attach(&self, interest: Interest, sink: Box<dyn EventSink>) -> SinkId {
        let kind = sink.kind();
        let mut table = self.sinks.lock();
        table.next_id += 1;
        let id = SinkId(table.next_id);
        table.entries.push(SinkEntry {
            id,
            interest,
            kind,
            sink,
        });
        self.refresh_flags(&table);
        debug!(id = id.0, ?interest, ?kind, "sink attached");
        id
    }

    /// Detach a consumer, returning it so counters or buffers it accumulated
    /// can be read back. Returns `None` for an unknown id.
    pub fn detach(&self, id: SinkId) -> Option<Box<dyn EventSink>> {
        let mut table = self.sinks.lock();
        let pos = table.entries.iter().position(|entry| entry.id == id)?;
        let entry = table.entries.remove(pos);
        self.refresh_flags(&table);
        debug!(id = id.0, "sink detached");
        Some(entry.sink)
    }

    /// Whether any consumer subscribes to address-space switches.
    #[must_use]
    pub fn address_space_tracing(&self) -> bool {
        self.address_space_active.load(Ordering::Relaxed)
    }

    /// Whether any consumer subscribes to call events.
    #[must_use]
    pub fn call_tracing(&self) -> bool {
        self.call_active.load(Ordering::Relaxed)
    }

    /// Whether a scripted/embedded analysis controller is attached, as
    /// opposed to purely in-process consumers.
    #[must_use]
    pub fn controller_attached(&self) -> bool {
        self.controller_active.load(Ordering::Relaxed)
    }

    fn refresh_flags(&self, table: &SinkTable) {
        let mut address_space = false;
        let mut calls = false;
        let mut controller = false;
        for entry in &table.entries {
            address_space |= entry.interest.address_space;
            calls |= entry.interest.calls;
            controller |= entry.kind == SinkKind::Controller;
        }
        self.address_space_active
            .store(address_space, Ordering::Relaxed);
        self.call_active.store(calls, Ordering::Relaxed);
        self.controller_active.store(controller, Ordering::Relaxed);
    }

    // ========================================================================
    // Notifiers (emulator hot path)
    // ========================================================================

    /// Report that the running virtual CPU wrote its page-table-base
    /// register: `old` was active before, `new` was just loaded.
    ///
    /// `old == new` is a legitimate reload and is delivered like any other
    /// switch. Consumers run synchronously and in attach order; the emulator
    /// resumes once the last one returns. A consumer failure is logged,
    /// counted, and reported as [`HookStatus::Failed`] without touching any
    /// activation state.
    ///
    /// # Panics
    ///
    /// Panics if address-space tracing is active while no virtual CPU is
    /// scheduled - the scheduler must call [`enter_vcpu`](Self::enter_vcpu)
    /// before stepping.
    pub fn update_cr3(&self, old: u32, new: u32) -> HookStatus {
        if !self.address_space_active.load(Ordering::Relaxed) {
            return HookStatus::Inactive;
        }
        let event = AddressSpaceSwitch {
            vcpu: self.stepping_vcpu("update_cr3"),
            old,
            new,
        };
        let mut table = self.sinks.lock();
        let mut delivered = 0u32;
        let mut failed = 0u32;
        for entry in table
            .entries
            .iter_mut()
            .filter(|entry| entry.interest.address_space)
        {
            match entry.sink.on_address_space_switch(&event) {
                Ok(()) => delivered += 1,
                Err(err) => {
                    warn!(sink = entry.id.0, error = %err, "address-space event delivery failed");
                    failed += 1;
                }
            }
        }
        drop(table);
        finish_delivery(CLASS_ADDRESS_SPACE, delivered, failed)
    }

    /// Report that the running virtual CPU retired a call instruction from
    /// `origin` to `destination`.
    ///
    /// Gated independently of [`update_cr3`](Self::update_cr3): call tracing
    /// fires orders of magnitude more often and is toggled on its own. The
    /// gate itself is the same single relaxed load. Delivery semantics match
    /// `update_cr3`.
    ///
    /// # Panics
    ///
    /// Panics if call tracing is active while no virtual CPU is scheduled.
    pub fn call_event(&self, origin: u32, destination: u32) -> HookStatus {
        if !self.call_active.load(Ordering::Relaxed) {
            return HookStatus::Inactive;
        }
        let event = CallEvent {
            vcpu: self.stepping_vcpu("call_event"),
            origin,
            destination,
        };
        let mut table = self.sinks.lock();
        let mut delivered = 0u32;
        let mut failed = 0u32;
        for entry in table.entries.iter_mut().filter(|entry| entry.interest.calls) {
            match entry.sink.on_call_event(&event) {
                Ok(()) => delivered += 1,
                Err(err) => {
                    warn!(sink = entry.id.0, error = %err, "call event delivery failed");
                    failed += 1;
                }
            }
        }
        drop(table);
        finish_delivery(CLASS_CALL, delivered, failed)
    }

    fn stepping_vcpu(&self, hook: &'static str) -> VcpuId {
        match self.current_vcpu() {
            Some(vcpu) => vcpu,
            None => panic!("{hook} fired while no virtual CPU is scheduled"),
        }
    }
}

impl Default for Instrumentation {
    fn default() -> Self {
        Self::new()
    }
}

fn finish_delivery(class: &'static str, delivered: u32, failed: u32) -> HookStatus {
    if delivered > 0 {
        record_events_delivered(class, delivered);
    }
    if failed > 0 {
        record_delivery_failures(class, failed);
        return HookStatus::Failed;
    }
    if delivered == 0 {
        // The gate raced with a detach: the flag read true but the table no
        // longer holds an interested sink. Equivalent to being inactive.
        return HookStatus::Inactive;
    }
    HookStatus::Delivered
}
