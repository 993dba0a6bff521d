//! Telemetry frame buffer and the bounded TLV writer

use super::snapshot::{MAX_LINK_ADDR_LEN, MAX_NODE_ID_LEN};
use crate::{Result, TelemetryError};

/// Size of the fixed frame buffer.
pub const FRAME_CAPACITY: usize = 128;

/// Type byte plus length byte.
pub const RECORD_HEADER_LEN: usize = 2;

/// Record type codes of the telemetry wire format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum RecordType {
    FrameStart = 0x00,
    NodeIdentity = 0x01,
    CacheCount = 0x02,
    CacheCapacity = 0x03,
    ParentAdded = 0x04,
    ParentDropped = 0x05,
}

impl RecordType {
    pub fn code(self) -> u8 {
        self as u8
    }

    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0x00 => Some(RecordType::FrameStart),
            0x01 => Some(RecordType::NodeIdentity),
            0x02 => Some(RecordType::CacheCount),
            0x03 => Some(RecordType::CacheCapacity),
            0x04 => Some(RecordType::ParentAdded),
            0x05 => Some(RecordType::ParentDropped),
            _ => None,
        }
    }
}

/// Longest frame any event can produce: start, identity, parent, count, capacity.
pub const WORST_CASE_FRAME_LEN: usize = RECORD_HEADER_LEN
    + (RECORD_HEADER_LEN + MAX_NODE_ID_LEN)
    + (RECORD_HEADER_LEN + MAX_LINK_ADDR_LEN)
    + (RECORD_HEADER_LEN + 1)
    + (RECORD_HEADER_LEN + 1);

const _: () = assert!(WORST_CASE_FRAME_LEN <= FRAME_CAPACITY);
const _: () = assert!(MAX_NODE_ID_LEN <= u8::MAX as usize);

/// An encoded telemetry frame.
///
/// Built fresh for every emission into a fixed buffer; never persisted.
#[derive(Clone, PartialEq, Eq)]
pub struct TelemetryFrame {
    buf: [u8; FRAME_CAPACITY],
    len: usize,
}

impl TelemetryFrame {
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf[..self.len]
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Whether the frame contains a record with the given type at a record boundary.
    pub fn contains_record(&self, record: RecordType) -> bool {
        self.records().any(|(code, _)| code == record.code())
    }

    /// Iterate `(type, value)` pairs. Stops at the first truncated record.
    pub fn records(&self) -> impl Iterator<Item = (u8, &[u8])> + '_ {
        let mut rest = self.as_bytes();
        std::iter::from_fn(move || {
            let [code, len, tail @ ..] = rest else { return None };
            let len = *len as usize;
            if tail.len() < len {
                return None;
            }
            let (value, next) = tail.split_at(len);
            rest = next;
            Some((*code, value))
        })
    }
}

impl std::fmt::Debug for TelemetryFrame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelemetryFrame").field("len", &self.len).field("bytes", &self.as_bytes()).finish()
    }
}

impl AsRef<[u8]> for TelemetryFrame {
    fn as_ref(&self) -> &[u8] {
        self.as_bytes()
    }
}

/// Append-only TLV writer over a fixed buffer.
///
/// Every append checks the remaining capacity first and fails closed with
/// [`TelemetryError::FrameOverflow`], leaving the frame untouched.
pub struct FrameWriter {
    frame: TelemetryFrame,
}

impl Default for FrameWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameWriter {
    pub fn new() -> Self {
        Self { frame: TelemetryFrame { buf: [0; FRAME_CAPACITY], len: 0 } }
    }

    pub fn remaining(&self) -> usize {
        FRAME_CAPACITY - self.frame.len
    }

    /// Append one record.
    pub fn record(&mut self, record: RecordType, value: &[u8]) -> Result<&mut Self> {
        let needed = RECORD_HEADER_LEN + value.len();
        if value.len() > u8::MAX as usize || needed > self.remaining() {
            return Err(TelemetryError::FrameOverflow { needed, remaining: self.remaining() });
        }
        let start = self.frame.len;
        self.frame.buf[start] = record.code();
        self.frame.buf[start + 1] = value.len() as u8;
        self.frame.buf[start + RECORD_HEADER_LEN..start + needed].copy_from_slice(value);
        self.frame.len += needed;
        Ok(self)
    }

    pub fn finish(self) -> TelemetryFrame {
        self.frame
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn worst_case_fits_with_room_to_spare() {
        let start = RECORD_HEADER_LEN;
        let identity = RECORD_HEADER_LEN + MAX_NODE_ID_LEN;
        let parent = RECORD_HEADER_LEN + MAX_LINK_ADDR_LEN;
        let counts = 2 * (RECORD_HEADER_LEN + 1);
        assert_eq!(WORST_CASE_FRAME_LEN, start + identity + parent + counts);
        assert_eq!(WORST_CASE_FRAME_LEN, 52);
        assert!(WORST_CASE_FRAME_LEN < FRAME_CAPACITY);
    }

    #[test]
    fn worst_case_frame_is_writable() {
        let mut writer = FrameWriter::new();
        writer
            .record(RecordType::FrameStart, &[])
            .unwrap()
            .record(RecordType::NodeIdentity, &[b'x'; MAX_NODE_ID_LEN])
            .unwrap()
            .record(RecordType::ParentAdded, &[0xff; MAX_LINK_ADDR_LEN])
            .unwrap()
            .record(RecordType::CacheCount, &[255])
            .unwrap()
            .record(RecordType::CacheCapacity, &[255])
            .unwrap();
        assert_eq!(writer.finish().len(), WORST_CASE_FRAME_LEN);
    }

    #[test]
    fn writer_appends_records_in_order() {
        let mut writer = FrameWriter::new();
        writer.record(RecordType::FrameStart, &[]).unwrap();
        writer.record(RecordType::CacheCount, &[7]).unwrap();
        let frame = writer.finish();
        assert_eq!(frame.as_bytes(), &[0x00, 0x00, 0x02, 0x01, 0x07]);
        assert!(frame.contains_record(RecordType::CacheCount));
        assert!(!frame.contains_record(RecordType::ParentAdded));
    }

    #[test]
    fn writer_fails_closed_on_overflow() {
        let mut writer = FrameWriter::new();
        writer.record(RecordType::NodeIdentity, &[b'a'; 120]).unwrap();
        let before = writer.remaining();
        let err = writer.record(RecordType::NodeIdentity, &[b'b'; 10]).err().unwrap();
        assert!(matches!(err, TelemetryError::FrameOverflow { needed: 12, remaining: 6 }));
        assert_eq!(writer.remaining(), before);
        assert_eq!(writer.finish().len(), 122);
    }

    #[test]
    fn writer_rejects_values_longer_than_a_length_byte() {
        let mut writer = FrameWriter::new();
        assert!(writer.record(RecordType::NodeIdentity, &[0; 256]).is_err());
        assert_eq!(writer.remaining(), FRAME_CAPACITY);
    }

    #[test]
    fn record_codes_round_trip() {
        for code in 0u8..=5 {
            assert_eq!(RecordType::from_code(code).map(RecordType::code), Some(code));
        }
        assert_eq!(RecordType::from_code(0x06), None);
    }
}
