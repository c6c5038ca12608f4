//! Property-based tests for encode/decode round-trips.

#![allow(missing_docs, clippy::float_cmp)]

use borsh_reflect::{Borsh, BorshError};
use proptest::prelude::*;
use std::collections::{BTreeMap, HashMap, HashSet};

#[derive(Borsh, PartialEq, Debug, Clone)]
enum Event {
    Created { id: u64, name: String },
    Moved(i32, i32),
    Tagged(Vec<String>),
    Deleted,
}

#[derive(Borsh, PartialEq, Debug, Clone, Default)]
struct Record {
    id: u32,
    score: f64,
    flags: [bool; 4],
    tags: HashSet<String>,
    counters: HashMap<u16, i64>,
    parent: Option<u64>,
    #[borsh(skip)]
    scratch: Vec<u8>,
}

#[derive(Borsh, PartialEq, Debug, Clone)]
struct Journal {
    owner: String,
    events: Vec<Event>,
    index: BTreeMap<String, Vec<u8>>,
    record: Record,
}

/// Strategy for generating arbitrary `Event` instances.
fn arb_event() -> impl Strategy<Value = Event> {
    prop_oneof![
        (any::<u64>(), ".{0,16}").prop_map(|(id, name)| Event::Created { id, name }),
        (any::<i32>(), any::<i32>()).prop_map(|(x, y)| Event::Moved(x, y)),
        prop::collection::vec("[a-z]{0,8}", 0..5).prop_map(Event::Tagged),
        Just(Event::Deleted),
    ]
}

/// Strategy for generating arbitrary `Record` instances. Skipped state is
/// generated too, to check it never reaches the wire.
fn arb_record() -> impl Strategy<Value = Record> {
    (
        any::<u32>(),
        // Filter out NaN since NaN != NaN
        any::<f64>().prop_filter("not NaN", |f| !f.is_nan()),
        any::<[bool; 4]>(),
        prop::collection::hash_set("[a-z]{1,6}", 0..6),
        prop::collection::hash_map(any::<u16>(), any::<i64>(), 0..8),
        any::<Option<u64>>(),
        prop::collection::vec(any::<u8>(), 0..8),
    )
        .prop_map(|(id, score, flags, tags, counters, parent, scratch)| Record {
            id,
            score,
            flags,
            tags,
            counters,
            parent,
            scratch,
        })
}

fn arb_journal() -> impl Strategy<Value = Journal> {
    (
        ".{0,24}",
        prop::collection::vec(arb_event(), 0..8),
        prop::collection::btree_map("[a-z]{0,4}", prop::collection::vec(any::<u8>(), 0..6), 0..4),
        arb_record(),
    )
        .prop_map(|(owner, events, index, record)| Journal {
            owner,
            events,
            index,
            record,
        })
}

proptest! {
    #[test]
    fn prop_journal_roundtrip(journal in arb_journal()) {
        let bytes = Borsh::serialize(&journal).expect("encode should succeed");
        let decoded: Journal = Borsh::from_slice(&bytes).expect("decode should succeed");

        let expected = Journal {
            record: Record { scratch: Vec::new(), ..journal.record.clone() },
            ..journal
        };
        prop_assert_eq!(decoded, expected);
    }

    #[test]
    fn prop_encoding_is_deterministic(record in arb_record()) {
        // Re-collecting draws fresh hash seeds, so iteration order differs.
        let copy = Record {
            tags: record.tags.iter().cloned().collect(),
            counters: record.counters.iter().map(|(k, v)| (*k, *v)).collect(),
            ..record.clone()
        };
        prop_assert_eq!(Borsh::serialize(&record).expect("encode"), Borsh::serialize(&copy).expect("encode"));
    }

    #[test]
    fn prop_prefix_is_truncated(journal in arb_journal(), cut in any::<prop::sample::Index>()) {
        let bytes = Borsh::serialize(&journal).expect("encode should succeed");
        prop_assume!(!bytes.is_empty());
        let cut = cut.index(bytes.len());

        let result = Borsh::from_prefix::<Journal>(&bytes[..cut]);
        prop_assert!(
            matches!(result, Err(BorshError::Truncated { .. })),
            "prefix {} of {} gave {:?}", cut, bytes.len(), result
        );
    }

    #[test]
    fn prop_arbitrary_bytes_never_panic(bytes in prop::collection::vec(any::<u8>(), 0..256)) {
        // Any outcome is fine as long as it is a value, not a panic.
        let _ = Borsh::from_prefix::<Journal>(&bytes);
        let _ = Borsh::from_prefix::<Vec<Event>>(&bytes);
    }

    #[test]
    fn prop_primitive_roundtrip(a in any::<i128>(), b in any::<u16>(), c in any::<f32>().prop_filter("not NaN", |f| !f.is_nan()), d in ".*") {
        let value = (a, b, c, d);
        let bytes = Borsh::serialize(&value).expect("encode");
        prop_assert_eq!(bytes.len(), 16 + 2 + 4 + 4 + value.3.len());
        let back: (i128, u16, f32, String) = Borsh::from_slice(&bytes).expect("decode");
        prop_assert_eq!(back, value);
    }
}
