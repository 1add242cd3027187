//! Property-based tests for rust_typed_logger using proptest

use chrono::{TimeZone, Utc};
use proptest::prelude::*;
use rust_typed_logger::prelude::*;
use serde::{Deserialize, Serialize};
use std::io::Cursor;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Tag(String);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Sample {
    name: String,
    count: i64,
    ok: bool,
}

fn any_level() -> impl Strategy<Value = Level> {
    prop_oneof![
        Just(Level::Debug),
        Just(Level::Info),
        Just(Level::Warn),
        Just(Level::Error),
        Just(Level::Fatal),
        Just(Level::Panic),
    ]
}

fn codec() -> EntryCodec {
    let spec = Specification::new().context::<Tag>().event::<Sample>();
    EntryCodec::from_specification(&spec).unwrap()
}

// ============================================================================
// Level Tests
// ============================================================================

proptest! {
    /// Level string conversions round trip, case-insensitively
    #[test]
    fn test_level_str_roundtrip(level in any_level(), lower in any::<bool>()) {
        let text = if lower { level.to_str().to_lowercase() } else { level.to_str().to_string() };
        let parsed: Level = text.parse().unwrap();
        prop_assert_eq!(level, parsed);
    }

    /// Level wire values round trip
    #[test]
    fn test_level_u8_roundtrip(level in any_level()) {
        prop_assert_eq!(Level::try_from(level.as_u8()).unwrap(), level);
    }

    /// Out-of-range wire values are rejected
    #[test]
    fn test_level_u8_rejects_unknown(value in 6u8..) {
        prop_assert!(Level::try_from(value).is_err());
    }

    /// Level ordering agrees with wire values
    #[test]
    fn test_level_ordering(a in any_level(), b in any_level()) {
        prop_assert_eq!(a < b, a.as_u8() < b.as_u8());
        prop_assert_eq!(a.aborts(), a >= Level::Fatal);
    }

    /// LevelFilter includes exactly the levels at or above its threshold
    #[test]
    fn test_level_filter_threshold(threshold in any_level(), level in any_level()) {
        let filter = LevelFilter::new(threshold);
        let entry = Entry::new("0", Utc::now(), level, Sample {
            name: String::new(),
            count: 0,
            ok: true,
        });
        prop_assert_eq!(filter.include(&entry), level >= threshold);
    }
}

// ============================================================================
// Framing Tests
// ============================================================================

proptest! {
    /// Any sequence of non-empty payloads decodes back in order
    #[test]
    fn test_frame_sequence_roundtrip(
        payloads in prop::collection::vec(prop::collection::vec(any::<u8>(), 1..512), 0..16)
    ) {
        let mut wire = Vec::new();
        for payload in &payloads {
            let written = FrameEncoder.encode(&mut wire, payload).unwrap();
            prop_assert!(written >= payload.len() + 3);
        }

        let decoder = FrameDecoder::new();
        let mut source = Cursor::new(wire);
        for payload in &payloads {
            let frame = decoder.decode(&mut source).unwrap();
            prop_assert_eq!(frame.as_deref(), Some(payload.as_slice()));
        }
        prop_assert!(decoder.decode(&mut source).unwrap().is_none());
    }

    /// Frames are exactly prefix + digits + payload + separator
    #[test]
    fn test_frame_length(len in 1usize..20_000) {
        let payload = vec![b'a'; len];
        let mut wire = Vec::new();
        let written = FrameEncoder.encode(&mut wire, &payload).unwrap();

        let digits = len.to_string();
        prop_assert_eq!(written, digits.len() + len + 2);
        prop_assert_eq!(wire[0] as usize, digits.len());
        prop_assert_eq!(&wire[1..=digits.len()], digits.as_bytes());
        prop_assert_eq!(wire.last().copied(), Some(b'\n'));
    }

    /// Truncating a frame anywhere before its end never yields a frame
    #[test]
    fn test_truncated_frame_is_error(len in 1usize..256, cut_seed in any::<usize>()) {
        let mut wire = Vec::new();
        FrameEncoder.encode(&mut wire, &vec![b'z'; len]).unwrap();
        let cut = 1 + cut_seed % (wire.len() - 1);
        wire.truncate(cut);

        let result = FrameDecoder::new().decode(&mut Cursor::new(wire));
        prop_assert!(result.is_err());
    }
}

#[test]
fn test_empty_payload_writes_nothing() {
    let mut wire = Vec::new();
    assert_eq!(FrameEncoder.encode(&mut wire, b"").unwrap(), 0);
    assert!(wire.is_empty());
}

// ============================================================================
// Entry Codec Tests
// ============================================================================

proptest! {
    /// Entries round trip through the envelope with every field intact
    #[test]
    fn test_entry_roundtrip(
        id in "[a-z0-9-]{1,36}",
        nanos in 0i64..4_000_000_000_000_000_000,
        level in any_level(),
        tags in prop::collection::vec(".*", 0..4),
        name in ".*",
        count in any::<i64>(),
        ok in any::<bool>(),
        output in prop::option::of(prop::collection::vec(any::<u8>(), 0..64)),
    ) {
        let mut entry = Entry::new(
            id,
            Utc.timestamp_nanos(nanos),
            level,
            Sample { name, count, ok },
        );
        for tag in tags {
            entry = entry.with_context(Tag(tag));
        }
        if let Some(output) = output {
            entry = entry.with_writer_output(output);
        }

        let codec = codec();
        let bytes = codec.marshal(&entry).unwrap();
        prop_assert!(!bytes.contains(&b'\n'));

        let decoded = codec.unmarshal(&bytes).unwrap();
        prop_assert_eq!(decoded, entry);
    }

    /// Framed entries survive the stream decoder in order
    #[test]
    fn test_stream_roundtrip(counts in prop::collection::vec(any::<i64>(), 0..20)) {
        let codec = codec();
        let mut wire = Vec::new();
        for (i, count) in counts.iter().enumerate() {
            let entry = Entry::new(
                i.to_string(),
                Utc.timestamp_opt(i as i64, 0).unwrap(),
                Level::Info,
                Sample { name: "s".into(), count: *count, ok: true },
            );
            FrameEncoder.encode(&mut wire, &codec.marshal(&entry).unwrap()).unwrap();
        }

        let decoder = StreamDecoder::builder()
            .registry(codec.registry().clone())
            .build(Cursor::new(wire))
            .unwrap();
        let entries = BlockingReader::new(decoder).entries().unwrap();

        let decoded: Vec<i64> = entries
            .iter()
            .map(|e| e.event.downcast_ref::<Sample>().unwrap().count)
            .collect();
        prop_assert_eq!(decoded, counts);
    }
}
