// src/schema_impls.rs

//! `BorshSchema` and `BorshReflect` for primitives and standard collections.

use crate::annotations::Markers;
use crate::builder::DescriptorBuilder;
use crate::descriptor::{Descriptor, Kind};
use crate::error::{BorshError, Result};
use crate::schema::{BorshReflect, BorshSchema};
use crate::value::Value;
use std::any::type_name;
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::hash::{BuildHasher, Hash};

fn out_of_range<T>(v: impl std::fmt::Display) -> BorshError {
    BorshError::Malformed(format!("{v} is out of range for {}", type_name::<T>()))
}

// --- INTEGERS ---

macro_rules! impl_unsigned {
    ($($t:ty => $width:expr),*) => {
        $(
            impl BorshSchema for $t {
                fn build_descriptor(_: &mut DescriptorBuilder) -> Result<Descriptor> {
                    Ok(Descriptor::unsigned(stringify!($t), $width))
                }
            }

            impl BorshReflect for $t {
                fn to_value(&self) -> Value {
                    Value::UInt(*self as u128)
                }

                fn from_value(value: Value) -> Result<Self> {
                    let v = value.into_u128()?;
                    <$t>::try_from(v).map_err(|_| out_of_range::<$t>(v))
                }
            }
        )*
    }
}

macro_rules! impl_signed {
    ($($t:ty => $width:expr),*) => {
        $(
            impl BorshSchema for $t {
                fn build_descriptor(_: &mut DescriptorBuilder) -> Result<Descriptor> {
                    Ok(Descriptor::signed(stringify!($t), $width))
                }
            }

            impl BorshReflect for $t {
                fn to_value(&self) -> Value {
                    Value::Int(*self as i128)
                }

                fn from_value(value: Value) -> Result<Self> {
                    let v = value.into_i128()?;
                    <$t>::try_from(v).map_err(|_| out_of_range::<$t>(v))
                }
            }
        )*
    }
}

// `usize` and `isize` always travel as 64-bit so the wire does not depend on the platform.
impl_unsigned!(u8 => 1, u16 => 2, u32 => 4, u64 => 8, u128 => 16, usize => 8);
impl_signed!(i8 => 1, i16 => 2, i32 => 4, i64 => 8, i128 => 16, isize => 8);

// --- FLOATS, BOOL, STRING ---

impl BorshSchema for f32 {
    fn build_descriptor(_: &mut DescriptorBuilder) -> Result<Descriptor> {
        Ok(Descriptor::new("f32", Kind::Float { width: 4 }))
    }
}

impl BorshReflect for f32 {
    fn to_value(&self) -> Value {
        Value::Float(f64::from(*self))
    }

    fn from_value(value: Value) -> Result<Self> {
        // Values decoded from four bytes widen losslessly, so narrowing is exact.
        Ok(value.into_f64()? as f32)
    }
}

impl BorshSchema for f64 {
    fn build_descriptor(_: &mut DescriptorBuilder) -> Result<Descriptor> {
        Ok(Descriptor::new("f64", Kind::Float { width: 8 }))
    }
}

impl BorshReflect for f64 {
    fn to_value(&self) -> Value {
        Value::Float(*self)
    }

    fn from_value(value: Value) -> Result<Self> {
        value.into_f64()
    }
}

impl BorshSchema for bool {
    fn build_descriptor(_: &mut DescriptorBuilder) -> Result<Descriptor> {
        Ok(Descriptor::new("bool", Kind::Bool))
    }
}

impl BorshReflect for bool {
    fn to_value(&self) -> Value {
        Value::Bool(*self)
    }

    fn from_value(value: Value) -> Result<Self> {
        value.into_bool()
    }
}

impl BorshSchema for String {
    fn build_descriptor(_: &mut DescriptorBuilder) -> Result<Descriptor> {
        Ok(Descriptor::new("String", Kind::String))
    }
}

impl BorshReflect for String {
    fn to_value(&self) -> Value {
        Value::String(self.clone())
    }

    fn from_value(value: Value) -> Result<Self> {
        value.into_string()
    }
}

// --- UNIT AND TUPLES ---

impl BorshSchema for () {
    fn build_descriptor(_: &mut DescriptorBuilder) -> Result<Descriptor> {
        Ok(Descriptor::new("()", Kind::Record { fields: Vec::new() }))
    }
}

impl BorshReflect for () {
    fn to_value(&self) -> Value {
        Value::UNIT
    }

    fn from_value(value: Value) -> Result<Self> {
        value.into_record(0, "()")?;
        Ok(())
    }
}

macro_rules! impl_tuple {
    ($len:expr => $($name:ident $idx:tt),+) => {
        impl<$($name: BorshReflect),+> BorshSchema for ($($name,)+) {
            fn build_descriptor(builder: &mut DescriptorBuilder) -> Result<Descriptor> {
                let fields = vec![$(builder.field::<$name>(stringify!($idx), Markers::NONE)?),+];
                builder.record(type_name::<Self>(), fields)
            }
        }

        impl<$($name: BorshReflect),+> BorshReflect for ($($name,)+) {
            fn to_value(&self) -> Value {
                Value::Record(vec![$(self.$idx.to_value()),+])
            }

            fn from_value(value: Value) -> Result<Self> {
                let mut fields = value.into_record($len, type_name::<Self>())?.into_iter();
                Ok(($(crate::rt::next_field::<$name>(&mut fields, stringify!($idx))?,)+))
            }
        }
    }
}

impl_tuple!(1 => A 0);
impl_tuple!(2 => A 0, B 1);
impl_tuple!(3 => A 0, B 1, C 2);
impl_tuple!(4 => A 0, B 1, C 2, D 3);

// --- CONTAINERS ---

impl<T: BorshReflect, const N: usize> BorshSchema for [T; N] {
    fn build_descriptor(builder: &mut DescriptorBuilder) -> Result<Descriptor> {
        let element = builder.describe::<T>()?;
        Ok(Descriptor::new(
            type_name::<Self>(),
            Kind::Array { len: N, element },
        ))
    }
}

impl<T: BorshReflect, const N: usize> BorshReflect for [T; N] {
    fn to_value(&self) -> Value {
        Value::Array(self.iter().map(BorshReflect::to_value).collect())
    }

    fn from_value(value: Value) -> Result<Self> {
        let items = value
            .into_elements()?
            .into_iter()
            .map(T::from_value)
            .collect::<Result<Vec<T>>>()?;
        let found = items.len();
        items.try_into().map_err(|_| {
            BorshError::Mismatch(format!("expected {N} elements, found {found}"))
        })
    }
}

impl<T: BorshReflect> BorshSchema for Vec<T> {
    fn build_descriptor(builder: &mut DescriptorBuilder) -> Result<Descriptor> {
        let element = builder.describe::<T>()?;
        Ok(Descriptor::new(type_name::<Self>(), Kind::Sequence { element }))
    }
}

impl<T: BorshReflect> BorshReflect for Vec<T> {
    fn to_value(&self) -> Value {
        Value::Sequence(self.iter().map(BorshReflect::to_value).collect())
    }

    fn from_value(value: Value) -> Result<Self> {
        value.into_elements()?.into_iter().map(T::from_value).collect()
    }
}

impl<T: BorshReflect> BorshSchema for Option<T> {
    fn build_descriptor(builder: &mut DescriptorBuilder) -> Result<Descriptor> {
        let inner = builder.describe::<T>()?;
        Ok(Descriptor::new(type_name::<Self>(), Kind::Optional { inner }))
    }
}

impl<T: BorshReflect> BorshReflect for Option<T> {
    fn to_value(&self) -> Value {
        Value::Optional(self.as_ref().map(|v| Box::new(v.to_value())))
    }

    fn from_value(value: Value) -> Result<Self> {
        value.into_optional()?.map(T::from_value).transpose()
    }
}

// A box adds no wire structure of its own.
impl<T: BorshReflect> BorshSchema for Box<T> {
    fn build_descriptor(builder: &mut DescriptorBuilder) -> Result<Descriptor> {
        let inner = builder.describe::<T>()?;
        Ok(Descriptor::clone(&inner))
    }
}

impl<T: BorshReflect> BorshReflect for Box<T> {
    fn to_value(&self) -> Value {
        self.as_ref().to_value()
    }

    fn from_value(value: Value) -> Result<Self> {
        T::from_value(value).map(Box::new)
    }
}

fn duplicate_key<T>() -> BorshError {
    BorshError::Malformed(format!("duplicate key in {}", type_name::<T>()))
}

impl<K, V, S> BorshSchema for HashMap<K, V, S>
where
    K: BorshReflect + Eq + Hash,
    V: BorshReflect,
    S: BuildHasher + Default + 'static,
{
    fn build_descriptor(builder: &mut DescriptorBuilder) -> Result<Descriptor> {
        let key = builder.describe::<K>()?;
        let value = builder.describe::<V>()?;
        Ok(Descriptor::new(type_name::<Self>(), Kind::Map { key, value }))
    }
}

impl<K, V, S> BorshReflect for HashMap<K, V, S>
where
    K: BorshReflect + Eq + Hash,
    V: BorshReflect,
    S: BuildHasher + Default + 'static,
{
    fn to_value(&self) -> Value {
        Value::Map(self.iter().map(|(k, v)| (k.to_value(), v.to_value())).collect())
    }

    fn from_value(value: Value) -> Result<Self> {
        let entries = value.into_entries()?;
        let mut map = HashMap::with_capacity_and_hasher(entries.len(), S::default());
        for (k, v) in entries {
            if map.insert(K::from_value(k)?, V::from_value(v)?).is_some() {
                return Err(duplicate_key::<Self>());
            }
        }
        Ok(map)
    }
}

impl<K: BorshReflect + Ord, V: BorshReflect> BorshSchema for BTreeMap<K, V> {
    fn build_descriptor(builder: &mut DescriptorBuilder) -> Result<Descriptor> {
        let key = builder.describe::<K>()?;
        let value = builder.describe::<V>()?;
        Ok(Descriptor::new(type_name::<Self>(), Kind::Map { key, value }))
    }
}

impl<K: BorshReflect + Ord, V: BorshReflect> BorshReflect for BTreeMap<K, V> {
    fn to_value(&self) -> Value {
        Value::Map(self.iter().map(|(k, v)| (k.to_value(), v.to_value())).collect())
    }

    fn from_value(value: Value) -> Result<Self> {
        let mut map = BTreeMap::new();
        for (k, v) in value.into_entries()? {
            if map.insert(K::from_value(k)?, V::from_value(v)?).is_some() {
                return Err(duplicate_key::<Self>());
            }
        }
        Ok(map)
    }
}

impl<K, S> BorshSchema for HashSet<K, S>
where
    K: BorshReflect + Eq + Hash,
    S: BuildHasher + Default + 'static,
{
    fn build_descriptor(builder: &mut DescriptorBuilder) -> Result<Descriptor> {
        let element = builder.describe::<K>()?;
        Ok(Descriptor::new(type_name::<Self>(), Kind::Set { element }))
    }
}

impl<K, S> BorshReflect for HashSet<K, S>
where
    K: BorshReflect + Eq + Hash,
    S: BuildHasher + Default + 'static,
{
    fn to_value(&self) -> Value {
        Value::Set(self.iter().map(BorshReflect::to_value).collect())
    }

    fn from_value(value: Value) -> Result<Self> {
        let items = value.into_elements()?;
        let mut set = HashSet::with_capacity_and_hasher(items.len(), S::default());
        for item in items {
            if !set.insert(K::from_value(item)?) {
                return Err(duplicate_key::<Self>());
            }
        }
        Ok(set)
    }
}

impl<K: BorshReflect + Ord> BorshSchema for BTreeSet<K> {
    fn build_descriptor(builder: &mut DescriptorBuilder) -> Result<Descriptor> {
        let element = builder.describe::<K>()?;
        Ok(Descriptor::new(type_name::<Self>(), Kind::Set { element }))
    }
}

impl<K: BorshReflect + Ord> BorshReflect for BTreeSet<K> {
    fn to_value(&self) -> Value {
        Value::Set(self.iter().map(BorshReflect::to_value).collect())
    }

    fn from_value(value: Value) -> Result<Self> {
        let mut set = BTreeSet::new();
        for item in value.into_elements()? {
            if !set.insert(K::from_value(item)?) {
                return Err(duplicate_key::<Self>());
            }
        }
        Ok(set)
    }
}
