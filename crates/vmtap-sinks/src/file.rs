//! Packed binary event log for offline analysis.
//!
//! Record layout, little-endian, 13 bytes each:
//!
//! ```text
//! tag: u8        1 = address-space switch, 2 = call
//! vcpu: u32
//! word0: u32     old page-table base / call origin
//! word1: u32     new page-table base / call destination
//! ```

use std::io::Write;

use vmtap::{AddressSpaceSwitch, CallEvent, EventSink, Result};

const TAG_ADDRESS_SPACE: u8 = 1;
const TAG_CALL: u8 = 2;

const RECORD_LEN: usize = 13;

/// Packs events into a little-endian record stream on any writer.
///
/// Write errors surface as delivery failures on the notifier that triggered
/// them. Call [`into_inner`](Self::into_inner) when detached to flush and
/// recover the writer.
pub struct FileSink<W: Write + Send> {
    writer: W,
}

impl<W: Write + Send> FileSink<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    /// Flush and hand back the writer.
    ///
    /// # Errors
    ///
    /// Returns the underlying I/O error if the flush fails.
    pub fn into_inner(mut self) -> std::io::Result<W> {
        self.writer.flush()?;
        Ok(self.writer)
    }

    fn write_record(&mut self, tag: u8, vcpu: u32, word0: u32, word1: u32) -> Result<()> {
        let mut record = [0u8; RECORD_LEN];
        record[0] = tag;
        record[1..5].copy_from_slice(&vcpu.to_le_bytes());
        record[5..9].copy_from_slice(&word0.to_le_bytes());
        record[9..13].copy_from_slice(&word1.to_le_bytes());
        self.writer.write_all(&record)?;
        Ok(())
    }
}

impl<W: Write + Send> EventSink for FileSink<W> {
    fn on_address_space_switch(&mut self, event: &AddressSpaceSwitch) -> Result<()> {
        self.write_record(TAG_ADDRESS_SPACE, event.vcpu.0, event.old, event.new)
    }

    fn on_call_event(&mut self, event: &CallEvent) -> Result<()> {
        self.write_record(TAG_CALL, event.vcpu.0, event.origin, event.destination)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vmtap::VcpuId;

    #[test]
    fn test_record_layout() {
        let mut sink = FileSink::new(Vec::new());

        let switch = AddressSpaceSwitch {
            vcpu: VcpuId(2),
            old: 0x0000_1000,
            new: 0x0000_2000,
        };
        sink.on_address_space_switch(&switch).unwrap();

        let call = CallEvent {
            vcpu: VcpuId(2),
            origin: 0x0040_1010,
            destination: 0x0040_8000,
        };
        sink.on_call_event(&call).unwrap();

        let bytes = sink.into_inner().unwrap();
        assert_eq!(bytes.len(), 2 * RECORD_LEN);

        // First record: tag 1, vcpu 2, old, new.
        assert_eq!(bytes[0], TAG_ADDRESS_SPACE);
        assert_eq!(&bytes[1..5], &2u32.to_le_bytes());
        assert_eq!(&bytes[5..9], &0x0000_1000u32.to_le_bytes());
        assert_eq!(&bytes[9..13], &0x0000_2000u32.to_le_bytes());

        // Second record: tag 2, vcpu 2, origin, destination.
        let rec = &bytes[RECORD_LEN..];
        assert_eq!(rec[0], TAG_CALL);
        assert_eq!(&rec[5..9], &0x0040_1010u32.to_le_bytes());
        assert_eq!(&rec[9..13], &0x0040_8000u32.to_le_bytes());
    }

    #[test]
    fn test_write_error_becomes_delivery_failure() {
        struct Broken;

        impl Write for Broken {
            fn write(&mut self, _buf: &[u8]) -> std::io::Result<usize> {
                Err(std::io::Error::other("disk gone"))
            }

            fn flush(&mut self) -> std::io::Result<()> {
                Ok(())
            }
        }

        let mut sink = FileSink::new(Broken);
        let call = CallEvent {
            vcpu: VcpuId(0),
            origin: 0x4010,
            destination: 0x8000,
        };
        assert!(sink.on_call_event(&call).is_err());
    }
}
