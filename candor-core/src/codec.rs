//! # Wire Codec
//!
//! This module implements the binary encoding of argument and reply blobs.
//!
//! ## Layout
//!
//! ```text
//! "DIDL" | type table | leb128 count, sleb128 type ref per value | values
//! ```
//!
//! 1. **Encoder ([`DynamicValue`] -> bytes)**:
//!    - Validates every value against its declared type first, so a bad argument never
//!      produces a partial buffer.
//!    - Emits the minimal sub-table of composite types reachable from the declared types.
//!    - Serializes the values. Records carry no tags: the field order (ascending field id)
//!      is entirely described by the type table.
//!
//! 2. **Decoder (bytes -> [`DynamicValue`])**:
//!    - Reads the type table embedded in the message. Messages are self-describing, so
//!      values are first decoded against the *wire* types.
//!    - Reconciles each value with the type the caller *expects*, using structural
//!      subtyping: unknown record fields are dropped, missing optional fields become
//!      absent and `nat` is accepted where `int` is expected.
//!
//! Decoding is all-or-nothing: either every expected value is produced or an error is
//! returned.
mod cursor;
mod decoder;
mod encoder;
mod leb128;
mod subtype;

pub use decoder::WireMessage;

use crate::{
    types::{Primitive, TypeRef, TypeTable},
    value::{DynamicValue, PrincipalError},
};

/// Every message starts with these four bytes.
pub const MAGIC: &[u8; 4] = b"DIDL";

/// Limits applied while decoding untrusted replies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CodecConfig {
    /// Maximum nesting of composite values.
    pub max_depth: usize,
    /// Maximum number of entries in a wire type table.
    pub max_table_len: usize,
    /// Maximum number of vector elements of types that occupy no bytes (`null`,
    /// `reserved` and records of those), summed over the whole message.
    pub max_zero_sized_elements: usize,
}

impl Default for CodecConfig {
    fn default() -> Self {
        Self {
            max_depth: 256,
            max_table_len: 10_000,
            max_zero_sized_elements: 1_000_000,
        }
    }
}

/// Errors that can occur while encoding values.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EncodeError {
    #[error("Expected {expected} values but got {found}")]
    ArityMismatch { expected: usize, found: usize },
    #[error("Value {value} is out of range for '{ty}'")]
    OutOfRange { value: String, ty: Primitive },
    #[error("Type mismatch: '{expected}' cannot hold a {found} value")]
    TypeMismatch {
        expected: String,
        found: &'static str,
    },
    #[error("Required field '{0}' is missing")]
    MissingField(String),
    #[error("Field '{field}' is not declared by '{ty}'")]
    UnknownField { field: String, ty: String },
    #[error("Variant alternative '{tag}' is not declared by '{ty}'")]
    UnknownVariantTag { tag: String, ty: String },
    #[error("Type reference '{0:?}' does not exist in the type table")]
    UnknownTypeRef(TypeRef),
    #[error("Cannot encode a value of type empty")]
    EmptyValue,
    #[error("Invalid principal '{0}': '{1}'")]
    InvalidPrincipal(String, #[source] PrincipalError),
    #[error("Invalid value for '{ty}': {reason}")]
    InvalidValue { ty: String, reason: String },
}

/// Errors that can occur while decoding a message.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DecodeError {
    #[error("Bad magic number, expected 'DIDL' but found '{0}'")]
    BadMagic(String),
    #[error("Unexpected end of input at byte {0}")]
    Truncated(usize),
    #[error("Malformed LEB128 integer at byte {0}")]
    MalformedLeb128(usize),
    #[error("Type table index {index} is out of range, the table has {len} entries")]
    TypeIndexOutOfRange { index: usize, len: usize },
    #[error("Unknown type opcode {0}")]
    UnknownOpcode(i64),
    #[error("Type table declares {0} entries, more than the configured limit")]
    TableTooLarge(usize),
    #[error("Entries of a wire {0} are not sorted by ascending id or name")]
    UnsortedFields(&'static str),
    #[error("Field id {0} does not fit in 32 bits")]
    FieldIdOutOfRange(u64),
    #[error("Variant index {index} is out of range for a variant of {count} alternatives")]
    VariantIndexOutOfRange { index: u64, count: usize },
    #[error("Invalid UTF-8 in text value: '{0}'")]
    InvalidUtf8(#[from] std::str::Utf8Error),
    #[error("Invalid {what} byte {byte:#04x}")]
    InvalidByte { what: &'static str, byte: u8 },
    #[error("Invalid principal: '{0}'")]
    InvalidPrincipal(#[from] PrincipalError),
    #[error("Cannot decode a value of type empty")]
    EmptyValue,
    #[error("{0} trailing bytes after the last value")]
    TrailingBytes(usize),
    #[error("Value nesting exceeds the configured depth of {0}")]
    TooDeep(usize),
    #[error("Message holds more than {0} elements of zero-sized types")]
    TooManyElements(usize),
    #[error("Type mismatch: expected '{expected}' but found '{found}'")]
    TypeMismatch { expected: String, found: String },
    #[error("Required field '{0}' is missing")]
    MissingField(String),
    #[error("Variant alternative '{0}' is not declared by the expected type")]
    UnknownVariantTag(String),
    #[error("Message carries {found} values but {expected} are required")]
    MissingValue { expected: usize, found: usize },
}

/// Encodes and decodes messages against the types of one [`TypeTable`].
///
/// The codec only borrows the table, so one bound interface can serve any number of
/// concurrent calls, each with its own buffers.
#[derive(Debug, Clone, Copy)]
pub struct ValueCodec<'a> {
    table: &'a TypeTable,
    config: CodecConfig,
}

impl<'a> ValueCodec<'a> {
    pub fn new(table: &'a TypeTable) -> Self {
        Self {
            table,
            config: CodecConfig::default(),
        }
    }

    pub fn with_config(mut self, config: CodecConfig) -> Self {
        self.config = config;
        self
    }

    /// Encodes `values`, each against the type at the same position in `types`.
    ///
    /// # Returns
    ///
    /// * `Ok(bytes)` - The complete message, magic number included.
    /// * `Err(EncodeError)` - If the counts differ or a value does not fit its type.
    pub fn encode(
        &self,
        types: &[TypeRef],
        values: &[DynamicValue],
    ) -> Result<Vec<u8>, EncodeError> {
        encoder::encode_message(self.table, types, values)
    }

    /// Decodes a message and reconciles its values with the `expected` types.
    ///
    /// Extra trailing values in the message are ignored. Missing trailing values are
    /// filled in as absent when their expected type is optional.
    pub fn decode(
        &self,
        bytes: &[u8],
        expected: &[TypeRef],
    ) -> Result<Vec<DynamicValue>, DecodeError> {
        let message = self.decode_wire(bytes)?;
        let found = message.values.len();
        let reconciler = subtype::Reconciler::new(&message.table, self.table);

        let mut pairs = message.types.iter().copied().zip(message.values);
        expected
            .iter()
            .map(|ty| match pairs.next() {
                Some((wire_ty, value)) => reconciler.coerce(value, wire_ty, *ty),
                None => reconciler
                    .absent(*ty)
                    .ok_or(DecodeError::MissingValue {
                        expected: expected.len(),
                        found,
                    }),
            })
            .collect()
    }

    /// Decodes a message against its own embedded types, without reconciliation.
    pub fn decode_wire(&self, bytes: &[u8]) -> Result<WireMessage, DecodeError> {
        decoder::decode_message(bytes, &self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Field, Label, TypeDescriptor};

    fn hex(bytes: &[u8]) -> String {
        bytes.iter().map(|b| format!("{b:02x}")).collect()
    }

    #[test]
    fn test_known_byte_vectors() {
        let mut table = TypeTable::new();
        let opt_nat = table.intern(TypeDescriptor::Opt(Primitive::Nat.into()));
        let codec = ValueCodec::new(&table);

        let nat = codec.encode(&[Primitive::Nat.into()], &[DynamicValue::from(42u8)]).unwrap();
        assert_eq!(hex(&nat), "4449444c00017d2a");

        let int = codec.encode(&[Primitive::Int.into()], &[DynamicValue::from(-1)]).unwrap();
        assert_eq!(hex(&int), "4449444c00017c7f");

        let none = codec.encode(&[opt_nat], &[DynamicValue::none()]).unwrap();
        assert_eq!(hex(&none), "4449444c016e7d010000");

        let text = codec.encode(&[Primitive::Text.into()], &[DynamicValue::text("hi")]).unwrap();
        assert_eq!(hex(&text), "4449444c000171026869");
    }

    #[test]
    fn test_empty_argument_list() {
        let table = TypeTable::new();
        let bytes = ValueCodec::new(&table).encode(&[], &[]).unwrap();
        assert_eq!(hex(&bytes), "4449444c0000");
        assert!(ValueCodec::new(&table).decode(&bytes, &[]).unwrap().is_empty());
    }

    #[test]
    fn test_fixed_width_out_of_range_produces_no_bytes() {
        let table = TypeTable::new();
        let err = ValueCodec::new(&table)
            .encode(&[Primitive::Nat8.into()], &[DynamicValue::from(300)])
            .unwrap_err();
        assert_eq!(
            err,
            EncodeError::OutOfRange {
                value: "300".into(),
                ty: Primitive::Nat8
            }
        );
    }

    #[test]
    fn test_float32_out_of_range() {
        let table = TypeTable::new();
        let codec = ValueCodec::new(&table);
        let float32 = [TypeRef::from(Primitive::Float32)];

        let err = codec.encode(&float32, &[DynamicValue::Float(1e39)]).unwrap_err();
        assert_eq!(
            err,
            EncodeError::OutOfRange {
                value: 1e39f64.to_string(),
                ty: Primitive::Float32
            }
        );

        let bytes = codec
            .encode(&float32, &[DynamicValue::Float(f64::from(f32::MAX))])
            .unwrap();
        assert_eq!(
            codec.decode(&bytes, &float32).unwrap(),
            vec![DynamicValue::Float(f64::from(f32::MAX))]
        );
        assert!(codec.encode(&float32, &[DynamicValue::Float(f64::INFINITY)]).is_ok());
    }

    #[test]
    fn test_record_fields_are_emitted_by_ascending_id() {
        let mut table = TypeTable::new();
        // idl_hash("b") = 98 > idl_hash("a") = 97, declared in reverse on purpose.
        let record = table.intern(TypeDescriptor::Record(vec![
            Field::new(Label::Named("a".into()), Primitive::Nat8.into()),
            Field::new(Label::Named("b".into()), Primitive::Nat8.into()),
        ]));
        let value = DynamicValue::record([("b", 2u8.into()), ("a", 1u8.into())]);
        let bytes = ValueCodec::new(&table).encode(&[record], &[value]).unwrap();

        // table: 1 entry, record, 2 fields: (97, nat8) (98, nat8); 1 arg of type 0; values 1 2
        assert_eq!(hex(&bytes), "4449444c016c02617b627b01000102");
    }

    #[test]
    fn test_decode_rejects_bad_magic_and_trailing_bytes() {
        let table = TypeTable::new();
        let codec = ValueCodec::new(&table);

        assert!(matches!(codec.decode(b"DIDX\x00\x00", &[]), Err(DecodeError::BadMagic(_))));
        assert!(matches!(codec.decode(b"DI", &[]), Err(DecodeError::BadMagic(_))));
        assert_eq!(
            codec.decode(b"DIDL\x00\x00\x01", &[]),
            Err(DecodeError::TrailingBytes(1))
        );
    }

    #[test]
    fn test_decode_missing_trailing_values() {
        let mut table = TypeTable::new();
        let opt_text = table.intern(TypeDescriptor::Opt(Primitive::Text.into()));
        let codec = ValueCodec::new(&table);

        let values = codec.decode(b"DIDL\x00\x00", &[opt_text]).unwrap();
        assert_eq!(values, vec![DynamicValue::none()]);

        let err = codec.decode(b"DIDL\x00\x00", &[Primitive::Nat.into()]).unwrap_err();
        assert_eq!(err, DecodeError::MissingValue { expected: 1, found: 0 });
    }
}
