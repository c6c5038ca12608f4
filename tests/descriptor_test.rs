#![allow(missing_docs)]

use borsh_reflect::{
    Borsh, BorshError, BorshSchema, Descriptor, DescriptorBuilder, FieldRole, Kind, Markers,
};
use rayon::prelude::*;
use std::sync::Arc;

#[derive(Borsh, Debug, Default)]
struct Account {
    id: u64,
    #[borsh(skip)]
    session: Option<String>,
    balance: i128,
}

#[derive(Borsh, Debug, Default)]
struct Message {
    #[borsh(skip)]
    received_at: u64,
    #[borsh(discriminant)]
    tag: u16,
    ping: (),
    text: String,
}

#[derive(Borsh, Debug, Default)]
struct TwoSelectors {
    #[borsh(discriminant)]
    first: u8,
    #[borsh(discriminant)]
    second: u8,
    body: u32,
}

#[derive(Borsh, Debug, Default)]
struct SkippedSelector {
    #[borsh(skip, discriminant)]
    tag: u8,
    body: u32,
}

#[derive(Borsh, Debug, Default)]
struct SelectorOnly {
    #[borsh(discriminant)]
    tag: u8,
}

#[derive(Borsh, Debug, Default)]
struct Outer {
    first: Account,
    second: Account,
}

// A type without a derive, describing itself by hand.
struct SignedSelector;

impl BorshSchema for SignedSelector {
    fn build_descriptor(builder: &mut DescriptorBuilder) -> borsh_reflect::Result<Descriptor> {
        let fields = vec![
            builder.field::<i32>("tag", Markers::DISCRIMINANT)?,
            builder.field::<u8>("body", Markers::NONE)?,
        ];
        builder.record("SignedSelector", fields)
    }
}

struct TooManyVariants;

impl BorshSchema for TooManyVariants {
    fn build_descriptor(builder: &mut DescriptorBuilder) -> borsh_reflect::Result<Descriptor> {
        let mut fields = vec![builder.field::<u8>("tag", Markers::DISCRIMINANT)?];
        for i in 0..257 {
            fields.push(builder.field::<bool>(format!("v{i}"), Markers::NONE)?);
        }
        builder.record("TooManyVariants", fields)
    }
}

fn descriptor_error<T: BorshSchema>() -> String {
    match borsh_reflect::describe::<T>() {
        Err(BorshError::Descriptor(msg)) => msg,
        other => panic!("expected a descriptor error, got {other:?}"),
    }
}

#[test]
fn test_record_keeps_declaration_order_and_roles() -> borsh_reflect::Result<()> {
    let d = Borsh::describe::<Account>()?;
    let Kind::Record { fields } = d.kind() else {
        panic!("expected a record, got {}", d.kind_name());
    };

    let names: Vec<&str> = fields.iter().map(|f| f.name.as_str()).collect();
    assert_eq!(names, ["id", "session", "balance"]);
    assert_eq!(fields[1].role, FieldRole::Skip);
    assert!(fields[1].descriptor.is_none());
    assert_eq!(d.min_size(), 8 + 16);
    Ok(())
}

#[test]
fn test_union_variants_exclude_skip_and_selector() -> borsh_reflect::Result<()> {
    let d = Borsh::describe::<Message>()?;
    let Kind::Union {
        discriminant,
        variants,
        skipped,
    } = d.kind()
    else {
        panic!("expected a union, got {}", d.kind_name());
    };

    assert_eq!(discriminant.name, "tag");
    assert_eq!(discriminant.role, FieldRole::Discriminant);
    let names: Vec<&str> = variants.iter().map(|f| f.name.as_str()).collect();
    assert_eq!(names, ["ping", "text"]);
    assert_eq!(skipped.len(), 1);
    // Two-byte selector plus the empty `ping` payload.
    assert_eq!(d.min_size(), 2);
    Ok(())
}

#[test]
fn test_union_discriminant_width_follows_field_type() -> borsh_reflect::Result<()> {
    let msg = Message {
        received_at: 99,
        tag: 1,
        ping: (),
        text: "hey".into(),
    };
    let bytes = Borsh::serialize(&msg)?;
    assert_eq!(bytes, [1, 0, 3, 0, 0, 0, b'h', b'e', b'y']);

    let back: Message = Borsh::from_slice(&bytes)?;
    assert_eq!((back.tag, back.text.as_str(), back.received_at), (1, "hey", 0));
    Ok(())
}

#[test]
fn test_invalid_annotations_fail_at_build_time() {
    assert!(descriptor_error::<TwoSelectors>().contains("both marked as discriminant"));
    assert!(descriptor_error::<SkippedSelector>().contains("both skipped and a discriminant"));
    assert!(descriptor_error::<SignedSelector>().contains("must be an unsigned integer"));
    assert!(descriptor_error::<SelectorOnly>().starts_with("SelectorOnly"));
    assert!(descriptor_error::<TooManyVariants>().starts_with("TooManyVariants"));
}

#[test]
fn test_invalid_annotations_block_encoding() {
    let value = TwoSelectors::default();
    assert!(matches!(
        Borsh::serialize(&value),
        Err(BorshError::Descriptor(_))
    ));
    assert!(matches!(
        Borsh::from_slice::<TwoSelectors>(&[0, 0, 0, 0, 0, 0]),
        Err(BorshError::Descriptor(_))
    ));
}

#[test]
fn test_descriptors_are_shared() -> borsh_reflect::Result<()> {
    let outer = Borsh::describe::<Outer>()?;
    let account = Borsh::describe::<Account>()?;

    let Kind::Record { fields } = outer.kind() else {
        panic!("expected a record");
    };
    for field in fields {
        let nested = field.descriptor.as_ref().expect("wire field has a descriptor");
        assert!(Arc::ptr_eq(nested, &account));
    }
    Ok(())
}

#[test]
fn test_concurrent_describe_yields_one_descriptor() -> borsh_reflect::Result<()> {
    let all = (0..256)
        .into_par_iter()
        .map(|_| Borsh::describe::<Vec<Option<(u8, String, i64)>>>())
        .collect::<borsh_reflect::Result<Vec<_>>>()?;

    let first = &all[0];
    assert!(all.iter().all(|d| Arc::ptr_eq(d, first)));
    assert!(borsh_reflect::builder::cached_count() >= 4);
    Ok(())
}

#[test]
fn test_descriptor_serializes_to_json() -> borsh_reflect::Result<()> {
    let d = Borsh::describe::<Account>()?;
    let json = serde_json::to_value(&*d).expect("descriptor serializes");

    assert_eq!(json["name"], "Account");
    assert_eq!(json["kind"], "record");
    assert_eq!(json["fields"][1]["role"], "skip");
    assert_eq!(json["fields"][2]["descriptor"]["width"], 16);
    Ok(())
}
