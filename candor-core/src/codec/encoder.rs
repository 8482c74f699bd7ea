use super::{EncodeError, MAGIC, leb128};
use crate::{
    types::{Field, Primitive, TypeDescriptor, TypeRef, TypeTable},
    value::{DynamicValue, Principal},
};
use num_bigint::{BigInt, Sign};
use num_traits::ToPrimitive;
use std::collections::{BTreeMap, HashMap};

pub(crate) const OPT: i64 = -18;
pub(crate) const VEC: i64 = -19;
pub(crate) const RECORD: i64 = -20;
pub(crate) const VARIANT: i64 = -21;
pub(crate) const FUNC: i64 = -22;
pub(crate) const SERVICE: i64 = -23;

/// Marks a reference (principal, func or service) as transparent, i.e. carried inline.
const TRANSPARENT: u8 = 1;

pub(super) fn encode_message(
    table: &TypeTable,
    types: &[TypeRef],
    values: &[DynamicValue],
) -> Result<Vec<u8>, EncodeError> {
    if types.len() != values.len() {
        return Err(EncodeError::ArityMismatch {
            expected: types.len(),
            found: values.len(),
        });
    }

    // Values go first so that a bad argument fails before anything is assembled.
    let encoder = ValueEncoder { table };
    let mut value_bytes = Vec::new();
    for (ty, value) in types.iter().zip(values) {
        encoder.encode_value(&mut value_bytes, *ty, value)?;
    }

    let mut builder = WireTableBuilder::new(table);
    let refs = types
        .iter()
        .map(|ty| builder.add(*ty))
        .collect::<Result<Vec<_>, _>>()?;

    let mut out = Vec::with_capacity(MAGIC.len() + value_bytes.len() + 16);
    out.extend_from_slice(MAGIC);
    builder.write_to(&mut out);
    leb128::write_usize(&mut out, refs.len());
    for r in refs {
        leb128::write_i64(&mut out, r);
    }
    out.extend_from_slice(&value_bytes);

    tracing::trace!(
        values = values.len(),
        size = out.len(),
        "Encoded message"
    );
    Ok(out)
}

/// Collects the composite types reachable from the encoded values, renumbered densely in
/// the order they are first reached.
struct WireTableBuilder<'a> {
    table: &'a TypeTable,
    indices: HashMap<usize, usize>,
    entries: Vec<Vec<u8>>,
}

impl<'a> WireTableBuilder<'a> {
    fn new(table: &'a TypeTable) -> Self {
        Self {
            table,
            indices: HashMap::new(),
            entries: Vec::new(),
        }
    }

    /// Returns the wire reference for `ty`, emitting its entry (and its children) when it
    /// is reached for the first time.
    fn add(&mut self, ty: TypeRef) -> Result<i64, EncodeError> {
        let index = match ty {
            TypeRef::Primitive(p) => return Ok(p.opcode()),
            TypeRef::Table(index) => index,
        };
        if let Some(wire_index) = self.indices.get(&index) {
            return Ok(*wire_index as i64);
        }

        let table = self.table;
        let descriptor = table.describe(ty).ok_or(EncodeError::UnknownTypeRef(ty))?;
        if let TypeDescriptor::Primitive(p) = descriptor.as_ref() {
            return Ok(p.opcode());
        }

        // Reserve the index before visiting children, recursive types point back to it.
        let wire_index = self.entries.len();
        self.indices.insert(index, wire_index);
        self.entries.push(Vec::new());

        let mut entry = Vec::new();
        match descriptor.as_ref() {
            TypeDescriptor::Primitive(_) => unreachable!("handled above"),
            TypeDescriptor::Opt(inner) => {
                leb128::write_i64(&mut entry, OPT);
                let inner = self.add(*inner)?;
                leb128::write_i64(&mut entry, inner);
            }
            TypeDescriptor::Vec(inner) => {
                leb128::write_i64(&mut entry, VEC);
                let inner = self.add(*inner)?;
                leb128::write_i64(&mut entry, inner);
            }
            TypeDescriptor::Record(fields) => self.write_fields(&mut entry, RECORD, fields)?,
            TypeDescriptor::Variant(fields) => self.write_fields(&mut entry, VARIANT, fields)?,
            TypeDescriptor::Func(func) => {
                leb128::write_i64(&mut entry, FUNC);
                for types in [&func.args, &func.rets] {
                    leb128::write_usize(&mut entry, types.len());
                    for ty in types {
                        let r = self.add(*ty)?;
                        leb128::write_i64(&mut entry, r);
                    }
                }
                match func.mode.wire_byte() {
                    Some(byte) => {
                        leb128::write_u64(&mut entry, 1);
                        entry.push(byte);
                    }
                    None => leb128::write_u64(&mut entry, 0),
                }
            }
            TypeDescriptor::Service(methods) => {
                leb128::write_i64(&mut entry, SERVICE);
                leb128::write_usize(&mut entry, methods.len());
                for (name, ty) in methods {
                    leb128::write_usize(&mut entry, name.len());
                    entry.extend_from_slice(name.as_bytes());
                    let r = self.add(*ty)?;
                    leb128::write_i64(&mut entry, r);
                }
            }
        }

        self.entries[wire_index] = entry;
        Ok(wire_index as i64)
    }

    fn write_fields(
        &mut self,
        entry: &mut Vec<u8>,
        opcode: i64,
        fields: &[Field],
    ) -> Result<(), EncodeError> {
        leb128::write_i64(entry, opcode);
        leb128::write_usize(entry, fields.len());
        for field in fields {
            leb128::write_u64(entry, u64::from(field.id()));
            let r = self.add(field.ty)?;
            leb128::write_i64(entry, r);
        }
        Ok(())
    }

    fn write_to(&self, out: &mut Vec<u8>) {
        leb128::write_usize(out, self.entries.len());
        for entry in &self.entries {
            out.extend_from_slice(entry);
        }
    }
}

struct ValueEncoder<'a> {
    table: &'a TypeTable,
}

impl ValueEncoder<'_> {
    fn encode_value(
        &self,
        buf: &mut Vec<u8>,
        ty: TypeRef,
        value: &DynamicValue,
    ) -> Result<(), EncodeError> {
        let descriptor = self
            .table
            .describe(ty)
            .ok_or(EncodeError::UnknownTypeRef(ty))?;

        match (descriptor.as_ref(), value) {
            (TypeDescriptor::Primitive(p), value) => self.encode_primitive(buf, ty, *p, value),
            (TypeDescriptor::Opt(_), DynamicValue::Option(None)) => {
                buf.push(0);
                Ok(())
            }
            (TypeDescriptor::Opt(inner), DynamicValue::Option(Some(inner_value))) => {
                buf.push(1);
                self.encode_value(buf, *inner, inner_value)
            }
            (TypeDescriptor::Vec(inner), DynamicValue::Blob(bytes))
                if self.table.primitive(*inner) == Some(Primitive::Nat8) =>
            {
                leb128::write_usize(buf, bytes.len());
                buf.extend_from_slice(bytes);
                Ok(())
            }
            (TypeDescriptor::Vec(inner), DynamicValue::Vector(items)) => {
                leb128::write_usize(buf, items.len());
                for item in items {
                    self.encode_value(buf, *inner, item)?;
                }
                Ok(())
            }
            (TypeDescriptor::Record(fields), DynamicValue::Record(values)) => {
                self.encode_record(buf, ty, fields, values)
            }
            (TypeDescriptor::Variant(fields), DynamicValue::Variant(id, payload)) => {
                let index = fields.iter().position(|f| f.id() == *id).ok_or_else(|| {
                    EncodeError::UnknownVariantTag {
                        tag: id.to_string(),
                        ty: self.table.display(ty).to_string(),
                    }
                })?;
                leb128::write_usize(buf, index);
                self.encode_value(buf, fields[index].ty, payload)
            }
            (TypeDescriptor::Func(_), DynamicValue::Func(principal, method)) => {
                buf.push(TRANSPARENT);
                write_principal(buf, principal);
                write_text(buf, method);
                Ok(())
            }
            (TypeDescriptor::Service(_), DynamicValue::Service(principal)) => {
                buf.push(TRANSPARENT);
                write_principal(buf, principal);
                Ok(())
            }
            (_, value) => Err(self.mismatch(ty, value)),
        }
    }

    fn encode_record(
        &self,
        buf: &mut Vec<u8>,
        ty: TypeRef,
        fields: &[Field],
        values: &BTreeMap<u32, DynamicValue>,
    ) -> Result<(), EncodeError> {
        if let Some(unknown) = values.keys().find(|id| !fields.iter().any(|f| f.id() == **id)) {
            return Err(EncodeError::UnknownField {
                field: unknown.to_string(),
                ty: self.table.display(ty).to_string(),
            });
        }

        for field in fields {
            match values.get(&field.id()) {
                Some(value) => self.encode_value(buf, field.ty, value)?,
                None => self.encode_absent(buf, field)?,
            }
        }
        Ok(())
    }

    /// A field left out of a record value is only acceptable when its type has a
    /// natural absent value.
    fn encode_absent(&self, buf: &mut Vec<u8>, field: &Field) -> Result<(), EncodeError> {
        let descriptor = self
            .table
            .describe(field.ty)
            .ok_or(EncodeError::UnknownTypeRef(field.ty))?;
        match descriptor.as_ref() {
            TypeDescriptor::Opt(_) => {
                buf.push(0);
                Ok(())
            }
            TypeDescriptor::Primitive(Primitive::Null | Primitive::Reserved) => Ok(()),
            _ => Err(EncodeError::MissingField(field.label.to_string())),
        }
    }

    fn encode_primitive(
        &self,
        buf: &mut Vec<u8>,
        ty: TypeRef,
        primitive: Primitive,
        value: &DynamicValue,
    ) -> Result<(), EncodeError> {
        match (primitive, value) {
            (Primitive::Null, DynamicValue::Null) => {}
            (Primitive::Reserved, _) => {}
            (Primitive::Empty, _) => return Err(EncodeError::EmptyValue),
            (Primitive::Bool, DynamicValue::Bool(b)) => buf.push(u8::from(*b)),
            (Primitive::Nat, DynamicValue::Integer(n)) => match n.sign() {
                Sign::Minus => return Err(out_of_range(n, primitive)),
                _ => leb128::write_nat(buf, n.magnitude()),
            },
            (Primitive::Int, DynamicValue::Integer(n)) => leb128::write_int(buf, n),
            (Primitive::Nat8, DynamicValue::Integer(n)) => {
                buf.extend(fixed(n, primitive, BigInt::to_u8)?.to_le_bytes())
            }
            (Primitive::Nat16, DynamicValue::Integer(n)) => {
                buf.extend(fixed(n, primitive, BigInt::to_u16)?.to_le_bytes())
            }
            (Primitive::Nat32, DynamicValue::Integer(n)) => {
                buf.extend(fixed(n, primitive, BigInt::to_u32)?.to_le_bytes())
            }
            (Primitive::Nat64, DynamicValue::Integer(n)) => {
                buf.extend(fixed(n, primitive, BigInt::to_u64)?.to_le_bytes())
            }
            (Primitive::Int8, DynamicValue::Integer(n)) => {
                buf.extend(fixed(n, primitive, BigInt::to_i8)?.to_le_bytes())
            }
            (Primitive::Int16, DynamicValue::Integer(n)) => {
                buf.extend(fixed(n, primitive, BigInt::to_i16)?.to_le_bytes())
            }
            (Primitive::Int32, DynamicValue::Integer(n)) => {
                buf.extend(fixed(n, primitive, BigInt::to_i32)?.to_le_bytes())
            }
            (Primitive::Int64, DynamicValue::Integer(n)) => {
                buf.extend(fixed(n, primitive, BigInt::to_i64)?.to_le_bytes())
            }
            (Primitive::Float32, DynamicValue::Float(x)) => {
                if x.is_finite() && x.abs() > f64::from(f32::MAX) {
                    return Err(EncodeError::OutOfRange {
                        value: x.to_string(),
                        ty: primitive,
                    });
                }
                buf.extend((*x as f32).to_le_bytes())
            }
            (Primitive::Float64, DynamicValue::Float(x)) => buf.extend(x.to_le_bytes()),
            (Primitive::Text, DynamicValue::Text(s)) => write_text(buf, s),
            (Primitive::Principal, DynamicValue::PrincipalId(p)) => {
                buf.push(TRANSPARENT);
                write_principal(buf, p);
            }
            (_, value) => return Err(self.mismatch(ty, value)),
        }
        Ok(())
    }

    fn mismatch(&self, ty: TypeRef, value: &DynamicValue) -> EncodeError {
        EncodeError::TypeMismatch {
            expected: self.table.display(ty).to_string(),
            found: value.kind(),
        }
    }
}

fn fixed<T>(
    value: &BigInt,
    primitive: Primitive,
    convert: impl Fn(&BigInt) -> Option<T>,
) -> Result<T, EncodeError> {
    convert(value).ok_or_else(|| out_of_range(value, primitive))
}

fn out_of_range(value: &BigInt, primitive: Primitive) -> EncodeError {
    EncodeError::OutOfRange {
        value: value.to_string(),
        ty: primitive,
    }
}

fn write_text(buf: &mut Vec<u8>, text: &str) {
    leb128::write_usize(buf, text.len());
    buf.extend_from_slice(text.as_bytes());
}

fn write_principal(buf: &mut Vec<u8>, principal: &Principal) {
    let bytes = principal.as_slice();
    leb128::write_usize(buf, bytes.len());
    buf.extend_from_slice(bytes);
}
