//! Collector-side frame decoding
//!
//! Walks a received frame record by record and folds the records into a
//! [`NodeReport`], the per-node view a network collector publishes.

use serde::Serialize;

use crate::types::{LinkAddr, RECORD_HEADER_LEN, RecordType};
use crate::{Result, TelemetryError};

/// One decoded telemetry record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TelemetryRecord {
    FrameStart,
    NodeIdentity(String),
    CacheCount(u8),
    CacheCapacity(u8),
    ParentAdded(LinkAddr),
    ParentDropped(LinkAddr),
    /// A record type this collector does not know; kept verbatim.
    Unknown { code: u8, value: Vec<u8> },
}

/// Decode every record of a frame.
///
/// A record whose declared length runs past the end of the frame is an error,
/// as are fixed-size records with the wrong length.
pub fn decode_frame(bytes: &[u8]) -> Result<Vec<TelemetryRecord>> {
    let mut records = Vec::new();
    let mut offset = 0;

    while offset < bytes.len() {
        let header = bytes
            .get(offset..offset + RECORD_HEADER_LEN)
            .ok_or_else(|| TelemetryError::decode_error(offset, "truncated record header"))?;
        let (code, len) = (header[0], header[1] as usize);
        let start = offset + RECORD_HEADER_LEN;
        let value = bytes.get(start..start + len).ok_or_else(|| {
            TelemetryError::decode_error(
                offset,
                format!("record 0x{code:02x} declares {len} bytes, {} left", bytes.len() - start),
            )
        })?;

        records.push(decode_record(code, value, offset)?);
        offset = start + len;
    }

    Ok(records)
}

fn decode_record(code: u8, value: &[u8], offset: usize) -> Result<TelemetryRecord> {
    let single_byte = || match value {
        [byte] => Ok(*byte),
        _ => Err(TelemetryError::decode_error(
            offset,
            format!("record 0x{code:02x} must carry one byte, found {}", value.len()),
        )),
    };
    let address = || {
        LinkAddr::new(value).map_err(|e| TelemetryError::decode_error(offset, e.to_string()))
    };

    let record = match RecordType::from_code(code) {
        Some(RecordType::FrameStart) => TelemetryRecord::FrameStart,
        Some(RecordType::NodeIdentity) => {
            TelemetryRecord::NodeIdentity(String::from_utf8_lossy(value).into_owned())
        }
        Some(RecordType::CacheCount) => TelemetryRecord::CacheCount(single_byte()?),
        Some(RecordType::CacheCapacity) => TelemetryRecord::CacheCapacity(single_byte()?),
        Some(RecordType::ParentAdded) => TelemetryRecord::ParentAdded(address()?),
        Some(RecordType::ParentDropped) => TelemetryRecord::ParentDropped(address()?),
        None => TelemetryRecord::Unknown { code, value: value.to_vec() },
    };
    Ok(record)
}

/// Cache occupancy as seen by a collector.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CacheInfo {
    pub cached: Option<u8>,
    pub cache_size: Option<u8>,
}

/// Everything one frame said about its sender.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct NodeReport {
    /// Sanitized node id, `None` when the frame carried an empty one.
    pub id: Option<String>,
    pub cache: Option<CacheInfo>,
    pub new_route: Option<LinkAddr>,
    pub lost_route: Option<LinkAddr>,
}

impl NodeReport {
    pub fn from_records(records: &[TelemetryRecord]) -> Self {
        let mut report = NodeReport::default();
        for record in records {
            match record {
                TelemetryRecord::NodeIdentity(id) => {
                    let id = sanitize_id(id);
                    report.id = (!id.is_empty()).then_some(id);
                }
                TelemetryRecord::CacheCount(count) => {
                    report.cache.get_or_insert_with(CacheInfo::default).cached = Some(*count);
                }
                TelemetryRecord::CacheCapacity(size) => {
                    report.cache.get_or_insert_with(CacheInfo::default).cache_size = Some(*size);
                }
                TelemetryRecord::ParentAdded(addr) => report.new_route = Some(*addr),
                TelemetryRecord::ParentDropped(addr) => report.lost_route = Some(*addr),
                TelemetryRecord::FrameStart | TelemetryRecord::Unknown { .. } => {}
            }
        }
        report
    }

    /// Decode a frame straight into a report.
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        decode_frame(bytes).map(|records| Self::from_records(&records))
    }
}

/// Strip leading non-alphanumerics and anything outside `[_A-Za-z0-9-.]`.
fn sanitize_id(raw: &str) -> String {
    raw.trim_start_matches(|c: char| !c.is_ascii_alphanumeric())
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'))
        .collect()
}
