//! Metric descriptions and recording helpers.
//!
//! Counters are only touched when a delivery actually happens; the disabled
//! fast path stays free of metrics work, otherwise the gate would stop being
//! near-zero cost.

use metrics::{Unit, counter, describe_counter};

/// Label value for address-space-switch events.
pub const CLASS_ADDRESS_SPACE: &str = "address_space";
/// Label value for call events.
pub const CLASS_CALL: &str = "call";

/// Register metric descriptions.
///
/// Call once at emulator startup if the embedder installs a recorder;
/// harmless without one.
pub fn init() {
    describe_counter!(
        "vmtap_events_delivered_total",
        Unit::Count,
        "Instrumentation events accepted by consumers"
    );
    describe_counter!(
        "vmtap_delivery_failures_total",
        Unit::Count,
        "Instrumentation event deliveries refused or failed by a consumer"
    );
}

/// Record one event accepted by `count` consumers.
pub(crate) fn record_events_delivered(class: &'static str, count: u32) {
    counter!("vmtap_events_delivered_total", "class" => class).increment(u64::from(count));
}

/// Record one event refused by `count` consumers.
pub(crate) fn record_delivery_failures(class: &'static str, count: u32) {
    counter!("vmtap_delivery_failures_total", "class" => class).increment(u64::from(count));
}
