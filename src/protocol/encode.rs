//! Telemetry frame encoder

use tracing::trace;

use crate::types::{Event, FrameWriter, RecordSet, RecordType, StateSnapshot, TelemetryFrame};
use crate::{Result, TelemetryError};

/// Encode the frame for `event` from `snapshot`.
///
/// Record selection per event:
/// - parent added, refreshed and periodic ticks: identity, parent-added (only
///   when the node has a defined rank and is not floating), cache count, capacity
/// - parent dropped: identity, parent-dropped with the dropped parent's address
/// - cache changes: identity, cache count, capacity
///
/// Every frame starts with the frame start marker. Publish requests never
/// produce a frame and are rejected with [`TelemetryError::NotEncodable`].
///
/// The output is a pure function of its inputs.
pub fn encode_frame(event: Event, snapshot: &StateSnapshot) -> Result<TelemetryFrame> {
    let records = event.record_set().ok_or(TelemetryError::NotEncodable { event })?;

    let mut writer = FrameWriter::new();
    writer
        .record(RecordType::FrameStart, &[])?
        .record(RecordType::NodeIdentity, snapshot.node_id.as_bytes())?;

    match records {
        RecordSet::ParentAndCache => {
            if snapshot.has_route() {
                writer.record(RecordType::ParentAdded, snapshot.parent.as_bytes())?;
            }
            write_cache_records(&mut writer, snapshot)?;
        }
        RecordSet::ParentDropped => {
            writer.record(RecordType::ParentDropped, snapshot.parent.as_bytes())?;
        }
        RecordSet::Cache => write_cache_records(&mut writer, snapshot)?,
    }

    let frame = writer.finish();
    trace!(?event, len = frame.len(), "Encoded telemetry frame");
    Ok(frame)
}

fn write_cache_records(writer: &mut FrameWriter, snapshot: &StateSnapshot) -> Result<()> {
    writer
        .record(RecordType::CacheCount, &[snapshot.occupied_byte()])?
        .record(RecordType::CacheCapacity, &[snapshot.capacity_byte()])?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{node_a_snapshot, snapshot_with};
    use crate::types::{FRAME_CAPACITY, LinkAddr, NodeId, RoutingState};
    use proptest::prelude::*;

    const NODE_A: &[u8] = b"Node A";

    fn expected_parent_added() -> Vec<u8> {
        let mut bytes = vec![0x00, 0x00, 0x01, 0x06];
        bytes.extend_from_slice(NODE_A);
        bytes.extend_from_slice(&[0x04, 0x08, 1, 2, 3, 4, 5, 6, 7, 8]);
        bytes.extend_from_slice(&[0x02, 0x01, 0x02, 0x03, 0x01, 0x10]);
        bytes
    }

    #[test]
    fn parent_added_frame_matches_wire_format() {
        let frame = encode_frame(Event::ParentAdded, &node_a_snapshot()).unwrap();
        assert_eq!(frame.as_bytes(), expected_parent_added().as_slice());
    }

    #[test]
    fn cache_entry_added_omits_parent_record() {
        let frame = encode_frame(Event::CacheEntryAdded, &node_a_snapshot()).unwrap();
        let mut expected = vec![0x00, 0x00, 0x01, 0x06];
        expected.extend_from_slice(NODE_A);
        expected.extend_from_slice(&[0x02, 0x01, 0x02, 0x03, 0x01, 0x10]);
        assert_eq!(frame.as_bytes(), expected.as_slice());
    }

    #[test]
    fn periodic_and_refresh_match_parent_added() {
        let snapshot = node_a_snapshot();
        let added = encode_frame(Event::ParentAdded, &snapshot).unwrap();
        assert_eq!(encode_frame(Event::PeriodicTick, &snapshot).unwrap(), added);
        assert_eq!(encode_frame(Event::ParentRefreshed, &snapshot).unwrap(), added);
    }

    #[test]
    fn parent_dropped_reports_dropped_address_only() {
        let mut snapshot = node_a_snapshot();
        snapshot.floating = true;
        snapshot.rank = None;
        let frame = encode_frame(Event::ParentDropped, &snapshot).unwrap();
        let mut expected = vec![0x00, 0x00, 0x01, 0x06];
        expected.extend_from_slice(NODE_A);
        expected.extend_from_slice(&[0x05, 0x08, 1, 2, 3, 4, 5, 6, 7, 8]);
        assert_eq!(frame.as_bytes(), expected.as_slice());
    }

    #[test]
    fn floating_node_suppresses_parent_record() {
        let mut snapshot = node_a_snapshot();
        snapshot.floating = true;
        let frame = encode_frame(Event::ParentAdded, &snapshot).unwrap();
        assert!(!frame.contains_record(RecordType::ParentAdded));
        assert!(frame.contains_record(RecordType::CacheCount));
    }

    #[test]
    fn undefined_rank_suppresses_parent_record() {
        let mut snapshot = node_a_snapshot();
        snapshot.rank = None;
        let frame = encode_frame(Event::PeriodicTick, &snapshot).unwrap();
        assert!(!frame.contains_record(RecordType::ParentAdded));
    }

    #[test]
    fn publish_requests_are_not_encodable() {
        let err = encode_frame(Event::PublishRequested, &node_a_snapshot()).unwrap_err();
        assert!(matches!(err, TelemetryError::NotEncodable { event: Event::PublishRequested }));
    }

    #[test]
    fn empty_identity_still_frames() {
        let id = NodeId::new("").unwrap();
        let snapshot = StateSnapshot::new(id, &RoutingState::detached(), 0, 16);
        let frame = encode_frame(Event::CacheEntryRemoved, &snapshot).unwrap();
        assert_eq!(frame.as_bytes(), &[0x00, 0x00, 0x01, 0x00, 0x02, 0x01, 0x00, 0x03, 0x01, 0x10]);
    }

    prop_compose! {
        fn arb_snapshot()(
            id in "[ -~]{0,32}",
            rank in proptest::option::of(any::<u16>()),
            floating in any::<bool>(),
            parent in prop::collection::vec(any::<u8>(), 0..=8),
            occupied in 0usize..400,
            capacity in 0usize..400,
        ) -> StateSnapshot {
            let routing = RoutingState {
                rank,
                floating,
                parent: LinkAddr::new(&parent).unwrap(),
                prefix: None,
            };
            snapshot_with(&id, &routing, occupied, capacity)
        }
    }

    fn arb_event() -> impl Strategy<Value = Event> {
        prop::sample::select(Event::ALL.to_vec())
    }

    proptest! {
        #[test]
        fn prop_frames_never_exceed_capacity(event in arb_event(), snapshot in arb_snapshot()) {
            match encode_frame(event, &snapshot) {
                Ok(frame) => {
                    prop_assert!(frame.len() <= FRAME_CAPACITY);
                }
                Err(TelemetryError::NotEncodable { .. }) => {
                    prop_assert_eq!(event, Event::PublishRequested);
                }
                Err(other) => {
                    prop_assert!(false, "unexpected error: {}", other);
                }
            }
        }

        #[test]
        fn prop_no_route_means_no_parent_record(snapshot in arb_snapshot()) {
            prop_assume!(snapshot.floating || snapshot.rank.is_none());
            let frame = encode_frame(Event::PeriodicTick, &snapshot).unwrap();
            prop_assert!(!frame.contains_record(RecordType::ParentAdded));
        }

        #[test]
        fn prop_encoding_is_idempotent(event in arb_event(), snapshot in arb_snapshot()) {
            prop_assume!(event != Event::PublishRequested);
            let first = encode_frame(event, &snapshot).unwrap();
            let second = encode_frame(event, &snapshot).unwrap();
            prop_assert_eq!(first.as_bytes(), second.as_bytes());
        }

        #[test]
        fn prop_cache_count_record_matches_snapshot(event in arb_event(), snapshot in arb_snapshot()) {
            prop_assume!(event.record_set().is_some() && event != Event::ParentDropped);
            let frame = encode_frame(event, &snapshot).unwrap();
            let count = frame
                .records()
                .find(|(code, _)| *code == RecordType::CacheCount.code())
                .map(|(_, value)| value[0]);
            prop_assert_eq!(count, Some(snapshot.occupied_byte()));
        }
    }
}
