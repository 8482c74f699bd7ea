//! # Dynamic Values
//!
//! [`DynamicValue`] is the runtime counterpart of a [`crate::types::TypeDescriptor`]: a
//! tagged tree that can hold an instance of any IDL type. Values carry no type
//! information of their own beyond their shape, so the same `Integer` may be encoded as a
//! `nat`, an `int` or any fixed-width integer depending on the type it is encoded against.
//!
//! Records are keyed by field id (not by label) and iterate in ascending id order, which is
//! the order fields travel on the wire. Variants hold the id of the active alternative.
mod principal;

pub use principal::{Principal, PrincipalError};

use num_bigint::BigInt;
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq)]
pub enum DynamicValue {
    Null,
    Bool(bool),
    /// Any integer, regardless of the declared width.
    Integer(BigInt),
    Float(f64),
    Text(String),
    Blob(Vec<u8>),
    PrincipalId(Principal),
    Vector(Vec<DynamicValue>),
    Option(Option<Box<DynamicValue>>),
    Record(BTreeMap<u32, DynamicValue>),
    /// The active alternative's field id and its payload.
    Variant(u32, Box<DynamicValue>),
    /// A reference to a public method of a canister.
    Func(Principal, String),
    /// A reference to a canister.
    Service(Principal),
}

impl DynamicValue {
    pub fn integer(value: impl Into<BigInt>) -> Self {
        DynamicValue::Integer(value.into())
    }

    pub fn text(value: impl Into<String>) -> Self {
        DynamicValue::Text(value.into())
    }

    pub fn some(value: DynamicValue) -> Self {
        DynamicValue::Option(Some(Box::new(value)))
    }

    pub fn none() -> Self {
        DynamicValue::Option(None)
    }

    /// Builds a record from `(label, value)` pairs, hashing each label into its field id.
    pub fn record<'a>(fields: impl IntoIterator<Item = (&'a str, DynamicValue)>) -> Self {
        DynamicValue::Record(
            fields
                .into_iter()
                .map(|(label, value)| (crate::types::idl_hash(label), value))
                .collect(),
        )
    }

    /// Builds a variant value for the alternative named `label`.
    pub fn variant(label: &str, value: DynamicValue) -> Self {
        DynamicValue::Variant(crate::types::idl_hash(label), Box::new(value))
    }

    /// Short name of the value's shape, used in error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            DynamicValue::Null => "null",
            DynamicValue::Bool(_) => "bool",
            DynamicValue::Integer(_) => "integer",
            DynamicValue::Float(_) => "float",
            DynamicValue::Text(_) => "text",
            DynamicValue::Blob(_) => "blob",
            DynamicValue::PrincipalId(_) => "principal",
            DynamicValue::Vector(_) => "vector",
            DynamicValue::Option(_) => "option",
            DynamicValue::Record(_) => "record",
            DynamicValue::Variant(..) => "variant",
            DynamicValue::Func(..) => "func",
            DynamicValue::Service(_) => "service",
        }
    }

    pub fn as_record(&self) -> Option<&BTreeMap<u32, DynamicValue>> {
        match self {
            DynamicValue::Record(fields) => Some(fields),
            _ => None,
        }
    }

    /// Looks up a record field by label.
    pub fn field(&self, label: &str) -> Option<&DynamicValue> {
        self.as_record()?.get(&crate::types::idl_hash(label))
    }
}

impl From<bool> for DynamicValue {
    fn from(value: bool) -> Self {
        DynamicValue::Bool(value)
    }
}

impl From<&str> for DynamicValue {
    fn from(value: &str) -> Self {
        DynamicValue::Text(value.to_string())
    }
}

impl From<String> for DynamicValue {
    fn from(value: String) -> Self {
        DynamicValue::Text(value)
    }
}

impl From<Principal> for DynamicValue {
    fn from(value: Principal) -> Self {
        DynamicValue::PrincipalId(value)
    }
}

macro_rules! integer_from {
    ($($t:ty),*) => {
        $(
            impl From<$t> for DynamicValue {
                fn from(value: $t) -> Self {
                    DynamicValue::Integer(BigInt::from(value))
                }
            }
        )*
    };
}

integer_from!(u8, u16, u32, u64, u128, i8, i16, i32, i64, i128);

impl From<f64> for DynamicValue {
    fn from(value: f64) -> Self {
        DynamicValue::Float(value)
    }
}
