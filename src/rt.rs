// src/rt.rs

//! Runtime support for code generated by `#[derive(Borsh)]`.
//! Do not use directly.

pub use crate::annotations::{FieldDecl, Markers};
pub use crate::builder::DescriptorBuilder;
pub use crate::descriptor::Descriptor;
pub use crate::error::{BorshError, Result};
pub use crate::schema::{BorshReflect, BorshSchema, Discriminant};
pub use crate::value::Value;
pub use std::any::type_name;
pub use std::vec::IntoIter;

/// Converts the next record entry into field `name`.
pub fn next_field<T: BorshReflect>(fields: &mut IntoIter<Value>, name: &str) -> Result<T> {
    let value = fields
        .next()
        .ok_or_else(|| BorshError::Mismatch(format!("record ended before field `{name}`")))?;
    T::from_value(value)
}

/// A union value whose discriminant selects no variant of `type_name`.
pub fn unknown_variant(type_name: &str, index: u64) -> BorshError {
    BorshError::Malformed(format!("{type_name}: discriminant {index} selects no variant"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn next_field_reports_the_missing_name() {
        let mut fields = vec![Value::UInt(1)].into_iter();
        assert_eq!(next_field::<u8>(&mut fields, "a").unwrap(), 1);
        let err = next_field::<u8>(&mut fields, "b").unwrap_err();
        assert!(matches!(err, BorshError::Mismatch(ref m) if m.contains("`b`")));
    }
}
