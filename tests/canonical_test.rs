#![allow(missing_docs)]

use borsh_reflect::{Borsh, BorshError, BorshOptions, Value};
use std::collections::{BTreeMap, BTreeSet, HashMap};

fn ordered() -> BTreeMap<u16, bool> {
    [(2, true), (256, false)].into()
}

#[test]
fn test_canonical_order_follows_key_bytes() -> borsh_reflect::Result<()> {
    // 256 encodes as [0x00, 0x01], which sorts before 2 as [0x02, 0x00].
    let bytes = Borsh::serialize(&ordered())?;
    assert_eq!(bytes, [2, 0, 0, 0, 0x00, 0x01, 0, 0x02, 0x00, 1]);
    Ok(())
}

#[test]
fn test_traversal_order_when_disabled() -> borsh_reflect::Result<()> {
    let options = BorshOptions::new().canonical_maps(false);
    let bytes = options.serialize(&ordered())?;
    assert_eq!(bytes, [2, 0, 0, 0, 0x02, 0x00, 1, 0x00, 0x01, 0]);

    // Both orders decode to the same map.
    assert_eq!(Borsh::from_slice::<BTreeMap<u16, bool>>(&bytes)?, ordered());
    Ok(())
}

#[test]
fn test_string_keys_sort_by_length_prefix_first() -> borsh_reflect::Result<()> {
    let set: BTreeSet<String> = ["b".to_string(), "aa".to_string()].into();
    let bytes = Borsh::serialize(&set)?;
    // "b" has the shorter prefix, so it comes first despite sorting after "aa".
    assert_eq!(
        bytes,
        [2, 0, 0, 0, 1, 0, 0, 0, b'b', 2, 0, 0, 0, b'a', b'a']
    );
    Ok(())
}

#[test]
fn test_equal_maps_encode_equally() -> borsh_reflect::Result<()> {
    let forward: HashMap<String, u32> = (0..100).map(|i| (format!("k{i}"), i)).collect();
    let mut backward = HashMap::new();
    for i in (0..100).rev() {
        backward.insert(format!("k{i}"), i);
    }
    assert_eq!(Borsh::serialize(&forward)?, Borsh::serialize(&backward)?);
    Ok(())
}

#[test]
fn test_duplicate_encoded_keys_are_rejected() -> borsh_reflect::Result<()> {
    let descriptor = Borsh::describe::<HashMap<u8, u8>>()?;
    let value = Value::Map(vec![
        (Value::UInt(1), Value::UInt(10)),
        (Value::UInt(1), Value::UInt(20)),
    ]);

    let err = Borsh::encode_value(&value, &descriptor).unwrap_err();
    assert!(matches!(err, BorshError::Malformed(_)));

    // Without canonical ordering the encoder does not look at keys.
    let bytes = BorshOptions::new()
        .canonical_maps(false)
        .encode_value(&value, &descriptor)?;
    assert_eq!(bytes, [2, 0, 0, 0, 1, 10, 1, 20]);
    Ok(())
}

#[derive(Borsh, Debug, Default)]
struct Choice {
    #[borsh(discriminant)]
    pick: u8,
    left: BTreeSet<u8>,
    right: String,
}

#[test]
fn test_failed_encode_leaves_buffer_untouched() {
    let descriptor = Borsh::describe::<Vec<u8>>().expect("describe");
    let bad = Value::Sequence(vec![Value::UInt(1), Value::UInt(300)]);
    assert!(matches!(
        Borsh::encode_value(&bad, &descriptor),
        Err(BorshError::Unsupported(_))
    ));

    // An unselectable variant fails the typed path without leaving bytes behind.
    let mut out = vec![9, 9];
    let choice = Choice {
        pick: 2,
        ..Choice::default()
    };
    assert!(Borsh::serialize_into(&choice, &mut out).is_err());
    assert_eq!(out, [9, 9]);

    let choice = Choice {
        pick: 0,
        left: [2, 1].into(),
        ..Choice::default()
    };
    Borsh::serialize_into(&choice, &mut out).expect("encodes");
    assert_eq!(out, [9, 9, 0, 2, 0, 0, 0, 1, 2]);
}

#[test]
fn test_dynamic_values_roundtrip_through_descriptors() -> borsh_reflect::Result<()> {
    let descriptor = Borsh::describe::<(u8, Option<String>)>()?;
    let value = Value::Record(vec![
        Value::UInt(4),
        Value::Optional(Some(Box::new(Value::String("hi".into())))),
    ]);

    let bytes = Borsh::encode_value(&value, &descriptor)?;
    assert_eq!(bytes, [4, 1, 2, 0, 0, 0, b'h', b'i']);

    let (decoded, consumed) = Borsh::decode_value(&bytes, &descriptor)?;
    assert_eq!((decoded, consumed), (value, bytes.len()));
    Ok(())
}
