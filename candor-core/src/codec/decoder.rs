use super::{
    CodecConfig, DecodeError, MAGIC,
    cursor::Cursor,
    encoder::{FUNC, OPT, RECORD, SERVICE, VARIANT, VEC},
    leb128,
};
use crate::{
    types::{Field, FuncMode, FuncType, Label, Primitive, TypeDescriptor, TypeRef, TypeTable},
    value::{DynamicValue, Principal},
};
use num_bigint::BigInt;
use std::{cell::Cell, collections::BTreeMap};

/// A message decoded against its own embedded type table.
///
/// Record fields are only known by id here, labels come from the expected types during
/// reconciliation.
#[derive(Debug, Clone)]
pub struct WireMessage {
    pub table: TypeTable,
    pub types: Vec<TypeRef>,
    pub values: Vec<DynamicValue>,
}

pub(super) fn decode_message(
    bytes: &[u8],
    config: &CodecConfig,
) -> Result<WireMessage, DecodeError> {
    let mut cursor = Cursor::new(bytes);

    let magic = cursor
        .read_bytes(MAGIC.len())
        .map_err(|_| DecodeError::BadMagic(String::from_utf8_lossy(bytes).into_owned()))?;
    if magic != MAGIC {
        return Err(DecodeError::BadMagic(String::from_utf8_lossy(magic).into_owned()));
    }

    let table = read_type_table(&mut cursor, config)?;

    let count = leb128::read_usize(&mut cursor)?;
    if count > cursor.remaining() {
        return Err(DecodeError::Truncated(bytes.len()));
    }
    let types = (0..count)
        .map(|_| {
            let ty = read_type_ref(&mut cursor)?;
            check_ref(&table, ty)?;
            Ok(ty)
        })
        .collect::<Result<Vec<_>, DecodeError>>()?;

    let reader = ValueReader {
        table: &table,
        config,
        zero_sized: Cell::new(0),
    };
    let values = types
        .iter()
        .map(|ty| reader.read_value(&mut cursor, *ty, 0))
        .collect::<Result<Vec<_>, _>>()?;

    if !cursor.is_empty() {
        return Err(DecodeError::TrailingBytes(cursor.remaining()));
    }

    tracing::trace!(
        entries = table.len(),
        values = values.len(),
        "Decoded wire message"
    );
    Ok(WireMessage {
        table,
        types,
        values,
    })
}

fn read_type_table(
    cursor: &mut Cursor<'_>,
    config: &CodecConfig,
) -> Result<TypeTable, DecodeError> {
    let len = leb128::read_usize(cursor)?;
    if len > config.max_table_len {
        return Err(DecodeError::TableTooLarge(len));
    }

    let mut table = TypeTable::new();
    for _ in 0..len {
        let entry = read_entry(cursor)?;
        table.push(entry);
    }

    // Entries may reference later entries, so references are checked once all are known.
    for index in 0..table.len() {
        if let Some(entry) = table.describe(TypeRef::Table(index)) {
            for child in entry.children() {
                check_ref(&table, child)?;
            }
        }
    }
    Ok(table)
}

fn read_entry(cursor: &mut Cursor<'_>) -> Result<TypeDescriptor, DecodeError> {
    let opcode = leb128::read_i64(cursor)?;
    let entry = match opcode {
        OPT => TypeDescriptor::Opt(read_type_ref(cursor)?),
        VEC => TypeDescriptor::Vec(read_type_ref(cursor)?),
        RECORD => TypeDescriptor::Record(read_fields(cursor, "record")?),
        VARIANT => TypeDescriptor::Variant(read_fields(cursor, "variant")?),
        FUNC => {
            let args = read_type_refs(cursor)?;
            let rets = read_type_refs(cursor)?;
            let mode = match leb128::read_usize(cursor)? {
                0 => FuncMode::Update,
                1 => {
                    let byte = cursor.read_byte()?;
                    FuncMode::from_wire_byte(byte).ok_or(DecodeError::InvalidByte {
                        what: "func annotation",
                        byte,
                    })?
                }
                n => {
                    return Err(DecodeError::InvalidByte {
                        what: "func annotation count",
                        byte: n.min(u8::MAX as usize) as u8,
                    });
                }
            };
            TypeDescriptor::Func(FuncType { args, rets, mode })
        }
        SERVICE => {
            let count = leb128::read_usize(cursor)?;
            let mut methods: Vec<(String, TypeRef)> = Vec::new();
            for _ in 0..count {
                let name = read_text(cursor)?;
                if methods.last().is_some_and(|(prev, _)| *prev >= name) {
                    return Err(DecodeError::UnsortedFields("service"));
                }
                methods.push((name, read_type_ref(cursor)?));
            }
            TypeDescriptor::Service(methods)
        }
        other => return Err(DecodeError::UnknownOpcode(other)),
    };
    Ok(entry)
}

fn read_fields(cursor: &mut Cursor<'_>, kind: &'static str) -> Result<Vec<Field>, DecodeError> {
    let count = leb128::read_usize(cursor)?;
    let mut fields: Vec<Field> = Vec::with_capacity(count.min(cursor.remaining()));
    for _ in 0..count {
        let raw = leb128::read_u64(cursor)?;
        let id = u32::try_from(raw).map_err(|_| DecodeError::FieldIdOutOfRange(raw))?;
        if fields.last().is_some_and(|prev| prev.id() >= id) {
            return Err(DecodeError::UnsortedFields(kind));
        }
        fields.push(Field::new(Label::Id(id), read_type_ref(cursor)?));
    }
    Ok(fields)
}

fn read_type_refs(cursor: &mut Cursor<'_>) -> Result<Vec<TypeRef>, DecodeError> {
    let count = leb128::read_usize(cursor)?;
    if count > cursor.remaining() {
        return Err(DecodeError::Truncated(cursor.position() + cursor.remaining()));
    }
    (0..count).map(|_| read_type_ref(cursor)).collect()
}

fn read_type_ref(cursor: &mut Cursor<'_>) -> Result<TypeRef, DecodeError> {
    let raw = leb128::read_i64(cursor)?;
    if raw >= 0 {
        let index = usize::try_from(raw).map_err(|_| DecodeError::UnknownOpcode(raw))?;
        return Ok(TypeRef::Table(index));
    }
    Primitive::from_opcode(raw)
        .map(TypeRef::Primitive)
        .ok_or(DecodeError::UnknownOpcode(raw))
}

fn check_ref(table: &TypeTable, ty: TypeRef) -> Result<(), DecodeError> {
    match ty {
        TypeRef::Table(index) if !table.contains(ty) => Err(DecodeError::TypeIndexOutOfRange {
            index,
            len: table.len(),
        }),
        _ => Ok(()),
    }
}

fn read_text(cursor: &mut Cursor<'_>) -> Result<String, DecodeError> {
    let len = leb128::read_usize(cursor)?;
    let bytes = cursor.read_bytes(len)?;
    Ok(std::str::from_utf8(bytes)?.to_string())
}

struct ValueReader<'a> {
    table: &'a TypeTable,
    config: &'a CodecConfig,
    /// Zero-sized vector elements decoded so far.
    zero_sized: Cell<usize>,
}

impl ValueReader<'_> {
    fn read_value(
        &self,
        cursor: &mut Cursor<'_>,
        ty: TypeRef,
        depth: usize,
    ) -> Result<DynamicValue, DecodeError> {
        if depth > self.config.max_depth {
            return Err(DecodeError::TooDeep(self.config.max_depth));
        }
        let descriptor = self.table.describe(ty).ok_or(DecodeError::TypeIndexOutOfRange {
            index: match ty {
                TypeRef::Table(index) => index,
                TypeRef::Primitive(_) => 0,
            },
            len: self.table.len(),
        })?;

        let value = match descriptor.as_ref() {
            TypeDescriptor::Primitive(p) => read_primitive(cursor, *p)?,
            TypeDescriptor::Opt(inner) => match cursor.read_byte()? {
                0 => DynamicValue::Option(None),
                1 => DynamicValue::some(self.read_value(cursor, *inner, depth + 1)?),
                byte => return Err(DecodeError::InvalidByte { what: "opt tag", byte }),
            },
            TypeDescriptor::Vec(inner) => {
                let len = leb128::read_usize(cursor)?;
                if *inner == TypeRef::NAT8 {
                    DynamicValue::Blob(cursor.read_bytes(len)?.to_vec())
                } else {
                    if self.is_zero_sized(*inner, 0) {
                        self.charge_zero_sized(len)?;
                    } else if len > cursor.remaining() {
                        return Err(DecodeError::Truncated(cursor.position() + cursor.remaining()));
                    }
                    let mut items = Vec::with_capacity(len.min(cursor.remaining()));
                    for _ in 0..len {
                        items.push(self.read_value(cursor, *inner, depth + 1)?);
                    }
                    DynamicValue::Vector(items)
                }
            }
            TypeDescriptor::Record(fields) => {
                let mut values = BTreeMap::new();
                for field in fields {
                    values.insert(field.id(), self.read_value(cursor, field.ty, depth + 1)?);
                }
                DynamicValue::Record(values)
            }
            TypeDescriptor::Variant(fields) => {
                let index = leb128::read_u64(cursor)?;
                let field = usize::try_from(index)
                    .ok()
                    .and_then(|i| fields.get(i))
                    .ok_or(DecodeError::VariantIndexOutOfRange {
                        index,
                        count: fields.len(),
                    })?;
                let payload = self.read_value(cursor, field.ty, depth + 1)?;
                DynamicValue::Variant(field.id(), Box::new(payload))
            }
            TypeDescriptor::Func(_) => {
                read_reference_tag(cursor, "func reference")?;
                let principal = read_principal(cursor)?;
                let method = read_text(cursor)?;
                DynamicValue::Func(principal, method)
            }
            TypeDescriptor::Service(_) => {
                read_reference_tag(cursor, "service reference")?;
                DynamicValue::Service(read_principal(cursor)?)
            }
        };
        Ok(value)
    }

    /// Elements that occupy no bytes cannot be bounded by the input length, so they draw
    /// from a per-message budget instead.
    fn charge_zero_sized(&self, len: usize) -> Result<(), DecodeError> {
        let total = self.zero_sized.get().saturating_add(len);
        if total > self.config.max_zero_sized_elements {
            return Err(DecodeError::TooManyElements(self.config.max_zero_sized_elements));
        }
        self.zero_sized.set(total);
        Ok(())
    }

    /// Whether values of this type occupy no bytes at all.
    fn is_zero_sized(&self, ty: TypeRef, depth: usize) -> bool {
        if depth > 16 {
            return false;
        }
        match self.table.describe(ty).as_deref() {
            Some(TypeDescriptor::Primitive(Primitive::Null | Primitive::Reserved)) => true,
            Some(TypeDescriptor::Record(fields)) => {
                fields.iter().all(|f| self.is_zero_sized(f.ty, depth + 1))
            }
            _ => false,
        }
    }
}

fn read_primitive(
    cursor: &mut Cursor<'_>,
    primitive: Primitive,
) -> Result<DynamicValue, DecodeError> {
    let value = match primitive {
        Primitive::Null | Primitive::Reserved => DynamicValue::Null,
        Primitive::Empty => return Err(DecodeError::EmptyValue),
        Primitive::Bool => match cursor.read_byte()? {
            0 => DynamicValue::Bool(false),
            1 => DynamicValue::Bool(true),
            byte => return Err(DecodeError::InvalidByte { what: "bool", byte }),
        },
        Primitive::Nat => DynamicValue::Integer(BigInt::from(leb128::read_nat(cursor)?)),
        Primitive::Int => DynamicValue::Integer(leb128::read_int(cursor)?),
        Primitive::Nat8 => DynamicValue::from(u8::from_le_bytes(cursor.read_array()?)),
        Primitive::Nat16 => DynamicValue::from(u16::from_le_bytes(cursor.read_array()?)),
        Primitive::Nat32 => DynamicValue::from(u32::from_le_bytes(cursor.read_array()?)),
        Primitive::Nat64 => DynamicValue::from(u64::from_le_bytes(cursor.read_array()?)),
        Primitive::Int8 => DynamicValue::from(i8::from_le_bytes(cursor.read_array()?)),
        Primitive::Int16 => DynamicValue::from(i16::from_le_bytes(cursor.read_array()?)),
        Primitive::Int32 => DynamicValue::from(i32::from_le_bytes(cursor.read_array()?)),
        Primitive::Int64 => DynamicValue::from(i64::from_le_bytes(cursor.read_array()?)),
        Primitive::Float32 => {
            DynamicValue::Float(f64::from(f32::from_le_bytes(cursor.read_array()?)))
        }
        Primitive::Float64 => DynamicValue::Float(f64::from_le_bytes(cursor.read_array()?)),
        Primitive::Text => DynamicValue::Text(read_text(cursor)?),
        Primitive::Principal => {
            read_reference_tag(cursor, "principal reference")?;
            DynamicValue::PrincipalId(read_principal(cursor)?)
        }
    };
    Ok(value)
}

/// Only transparent (inline) references are supported.
fn read_reference_tag(cursor: &mut Cursor<'_>, what: &'static str) -> Result<(), DecodeError> {
    match cursor.read_byte()? {
        1 => Ok(()),
        byte => Err(DecodeError::InvalidByte { what, byte }),
    }
}

fn read_principal(cursor: &mut Cursor<'_>) -> Result<Principal, DecodeError> {
    let len = leb128::read_usize(cursor)?;
    let bytes = cursor.read_bytes(len)?;
    Ok(Principal::from_slice(bytes)?)
}
