//! Minimal embedder: a stand-in stepping loop reports events while a
//! controller thread drains them.
//!
//! Run with `RUST_LOG=debug` to also see the `TraceSink` mirror.

use std::thread;

use vmtap::{Instrumentation, Interest, VcpuId};
use vmtap_sinks::{ControllerEvent, ControllerSink, TraceSink};

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    vmtap::metrics::init();
    let tap = Instrumentation::new();

    // Debug mirror of everything, plus the controller boundary.
    tap.attach(Interest::ALL, Box::new(TraceSink::new()));
    let (controller, events) = ControllerSink::channel(64);
    let controller_id = tap.attach(Interest::ALL, Box::new(controller));
    assert!(tap.controller_attached());

    let analysis = thread::spawn(move || {
        let mut switches = 0u64;
        let mut calls = 0u64;
        for event in events {
            match event {
                ControllerEvent::AddressSpaceSwitch(ev) => {
                    switches += 1;
                    println!(
                        "[controller] {} switched {:#010x} -> {:#010x}",
                        ev.vcpu, ev.old, ev.new
                    );
                }
                ControllerEvent::Call(ev) => {
                    calls += 1;
                    println!(
                        "[controller] {} call {:#010x} -> {:#010x}",
                        ev.vcpu, ev.origin, ev.destination
                    );
                }
            }
        }
        (switches, calls)
    });

    // Stand-in for the emulator's stepping loop.
    tap.enter_vcpu(VcpuId(0));
    let mut page_table = 0x0010_0000u32;
    for step in 0..8u32 {
        let next = page_table + 0x1000;
        assert!(tap.update_cr3(page_table, next).is_delivered());
        page_table = next;

        let origin = 0x0040_0000 + step * 0x10;
        assert!(tap.call_event(origin, origin + 0x100).is_delivered());
    }
    tap.leave_vcpu();

    // Hang up the controller and wait for its tallies.
    drop(tap.detach(controller_id));
    let (switches, calls) = analysis.join().unwrap();
    println!("controller saw {switches} switches, {calls} calls");
}
