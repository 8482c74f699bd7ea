use crate::{
    codec::{DecodeError, EncodeError},
    types::{Field, Label, Primitive, TypeDescriptor, TypeRef, TypeTable},
    value::{DynamicValue, Principal},
};
use num_bigint::BigInt;
use num_traits::ToPrimitive;
use serde_json::{Map, Number, Value};
use std::collections::BTreeMap;

/// Converts a JSON value into a [`DynamicValue`] shaped after `ty`.
///
/// Only the shape is checked here. Ranges of fixed-width integers and required record
/// fields are checked by the encoder.
pub fn to_dynamic(
    table: &TypeTable,
    ty: TypeRef,
    json: &Value,
) -> Result<DynamicValue, EncodeError> {
    let descriptor = table.describe(ty).ok_or(EncodeError::UnknownTypeRef(ty))?;
    let mismatch = || EncodeError::TypeMismatch {
        expected: table.display(ty).to_string(),
        found: json_kind(json),
    };

    let value = match (descriptor.as_ref(), json) {
        (TypeDescriptor::Primitive(p), json) => primitive_to_dynamic(table, ty, *p, json)?,

        (TypeDescriptor::Opt(_), Value::Null) => DynamicValue::none(),
        (TypeDescriptor::Opt(inner), Value::Array(items)) => match items.as_slice() {
            [] => DynamicValue::none(),
            [item] => DynamicValue::some(to_dynamic(table, *inner, item)?),
            _ => return Err(mismatch()),
        },
        // A bare value is accepted as a present option.
        (TypeDescriptor::Opt(inner), json) => DynamicValue::some(to_dynamic(table, *inner, json)?),

        (TypeDescriptor::Vec(inner), Value::Array(items))
            if table.primitive(*inner) == Some(Primitive::Nat8) =>
        {
            let bytes = items
                .iter()
                .map(|item| {
                    item.as_u64()
                        .and_then(|b| u8::try_from(b).ok())
                        .ok_or_else(|| EncodeError::OutOfRange {
                            value: item.to_string(),
                            ty: Primitive::Nat8,
                        })
                })
                .collect::<Result<Vec<_>, _>>()?;
            DynamicValue::Blob(bytes)
        }
        (TypeDescriptor::Vec(inner), Value::Array(items)) => DynamicValue::Vector(
            items
                .iter()
                .map(|item| to_dynamic(table, *inner, item))
                .collect::<Result<_, _>>()?,
        ),

        (TypeDescriptor::Record(fields), Value::Object(entries)) => {
            let mut values = BTreeMap::new();
            for (key, item) in entries {
                let field = field_for_key(fields, key).ok_or_else(|| EncodeError::UnknownField {
                    field: key.clone(),
                    ty: table.display(ty).to_string(),
                })?;
                values.insert(field.id(), to_dynamic(table, field.ty, item)?);
            }
            DynamicValue::Record(values)
        }
        (TypeDescriptor::Record(fields), Value::Array(items))
            if descriptor.is_tuple() || fields.is_empty() =>
        {
            if items.len() > fields.len() {
                return Err(EncodeError::UnknownField {
                    field: fields.len().to_string(),
                    ty: table.display(ty).to_string(),
                });
            }
            let mut values = BTreeMap::new();
            for (field, item) in fields.iter().zip(items) {
                values.insert(field.id(), to_dynamic(table, field.ty, item)?);
            }
            DynamicValue::Record(values)
        }

        (TypeDescriptor::Variant(fields), Value::Object(entries)) if entries.len() == 1 => {
            let Some((tag, payload)) = entries.iter().next() else {
                return Err(mismatch());
            };
            let field = variant_field(table, ty, fields, tag)?;
            DynamicValue::Variant(field.id(), Box::new(to_dynamic(table, field.ty, payload)?))
        }
        (TypeDescriptor::Variant(fields), Value::String(tag)) => {
            let field = variant_field(table, ty, fields, tag)?;
            let payload = to_dynamic(table, field.ty, &Value::Null)?;
            DynamicValue::Variant(field.id(), Box::new(payload))
        }

        (TypeDescriptor::Func(_), Value::Array(items)) => match items.as_slice() {
            [Value::String(principal), Value::String(method)] => {
                DynamicValue::Func(parse_principal(principal)?, method.clone())
            }
            _ => return Err(mismatch()),
        },
        (TypeDescriptor::Service(_), Value::String(principal)) => {
            DynamicValue::Service(parse_principal(principal)?)
        }

        _ => return Err(mismatch()),
    };
    Ok(value)
}

fn primitive_to_dynamic(
    table: &TypeTable,
    ty: TypeRef,
    primitive: Primitive,
    json: &Value,
) -> Result<DynamicValue, EncodeError> {
    let value = match (primitive, json) {
        (Primitive::Reserved, _) => DynamicValue::Null,
        (Primitive::Empty, _) => return Err(EncodeError::EmptyValue),
        (Primitive::Null, Value::Null) => DynamicValue::Null,
        (Primitive::Bool, Value::Bool(b)) => DynamicValue::Bool(*b),
        (Primitive::Text, Value::String(s)) => DynamicValue::Text(s.clone()),
        (Primitive::Principal, Value::String(s)) => DynamicValue::PrincipalId(parse_principal(s)?),
        (Primitive::Float32 | Primitive::Float64, Value::Number(n)) => {
            DynamicValue::Float(n.as_f64().ok_or_else(|| EncodeError::InvalidValue {
                ty: primitive.to_string(),
                reason: format!("'{n}' is not representable as a float"),
            })?)
        }
        (p, json) if is_integer(p) => DynamicValue::Integer(integer(json).ok_or_else(|| {
            EncodeError::TypeMismatch {
                expected: table.display(ty).to_string(),
                found: json_kind(json),
            }
        })?),
        (_, json) => {
            return Err(EncodeError::TypeMismatch {
                expected: table.display(ty).to_string(),
                found: json_kind(json),
            });
        }
    };
    Ok(value)
}

fn is_integer(primitive: Primitive) -> bool {
    matches!(
        primitive,
        Primitive::Nat
            | Primitive::Int
            | Primitive::Nat8
            | Primitive::Nat16
            | Primitive::Nat32
            | Primitive::Nat64
            | Primitive::Int8
            | Primitive::Int16
            | Primitive::Int32
            | Primitive::Int64
    )
}

/// Integers arrive as JSON numbers or as decimal strings when they exceed 64 bits.
fn integer(json: &Value) -> Option<BigInt> {
    match json {
        Value::Number(n) => n
            .as_u64()
            .map(BigInt::from)
            .or_else(|| n.as_i64().map(BigInt::from)),
        Value::String(s) => s.replace('_', "").parse::<BigInt>().ok(),
        _ => None,
    }
}

fn parse_principal(text: &str) -> Result<Principal, EncodeError> {
    Principal::from_text(text).map_err(|e| EncodeError::InvalidPrincipal(text.to_string(), e))
}

/// Matches a JSON object key against record fields: by name, by numeric id (`"42"`) or by
/// the escaped id form (`"_42_"`).
fn field_for_key<'f>(fields: &'f [Field], key: &str) -> Option<&'f Field> {
    if let Some(field) = fields.iter().find(|f| f.label.name() == Some(key)) {
        return Some(field);
    }
    let digits = key
        .strip_prefix('_')
        .and_then(|k| k.strip_suffix('_'))
        .unwrap_or(key);
    let id = digits.parse::<u32>().ok()?;
    fields.iter().find(|f| f.id() == id)
}

fn variant_field<'f>(
    table: &TypeTable,
    ty: TypeRef,
    fields: &'f [Field],
    tag: &str,
) -> Result<&'f Field, EncodeError> {
    field_for_key(fields, tag).ok_or_else(|| EncodeError::UnknownVariantTag {
        tag: tag.to_string(),
        ty: table.display(ty).to_string(),
    })
}

fn json_kind(json: &Value) -> &'static str {
    match json {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Converts a decoded [`DynamicValue`] into JSON, using `ty` for labels.
pub fn to_native(
    table: &TypeTable,
    ty: TypeRef,
    value: &DynamicValue,
) -> Result<Value, DecodeError> {
    let descriptor = table.describe(ty).ok_or(DecodeError::TypeIndexOutOfRange {
        index: match ty {
            TypeRef::Table(index) => index,
            TypeRef::Primitive(_) => 0,
        },
        len: table.len(),
    })?;
    let mismatch = || DecodeError::TypeMismatch {
        expected: table.display(ty).to_string(),
        found: value.kind().to_string(),
    };

    let json = match (descriptor.as_ref(), value) {
        (TypeDescriptor::Primitive(Primitive::Reserved), _) => Value::Null,
        (_, DynamicValue::Null) => Value::Null,
        (_, DynamicValue::Bool(b)) => Value::Bool(*b),
        (_, DynamicValue::Integer(n)) => integer_to_json(n),
        (_, DynamicValue::Float(x)) => Number::from_f64(*x).map_or(Value::Null, Value::Number),
        (_, DynamicValue::Text(s)) => Value::String(s.clone()),
        (_, DynamicValue::Blob(bytes)) => {
            Value::Array(bytes.iter().map(|b| Value::from(*b)).collect())
        }
        (_, DynamicValue::PrincipalId(p)) | (_, DynamicValue::Service(p)) => {
            Value::String(p.to_text())
        }
        (_, DynamicValue::Func(p, method)) => {
            Value::Array(vec![Value::String(p.to_text()), Value::String(method.clone())])
        }

        (TypeDescriptor::Opt(_), DynamicValue::Option(None)) => Value::Array(Vec::new()),
        (TypeDescriptor::Opt(inner), DynamicValue::Option(Some(inner_value))) => {
            Value::Array(vec![to_native(table, *inner, inner_value)?])
        }
        (TypeDescriptor::Vec(inner), DynamicValue::Vector(items)) => Value::Array(
            items
                .iter()
                .map(|item| to_native(table, *inner, item))
                .collect::<Result<_, _>>()?,
        ),

        (TypeDescriptor::Record(fields), DynamicValue::Record(values)) if descriptor.is_tuple() => {
            Value::Array(
                fields
                    .iter()
                    .filter_map(|field| values.get(&field.id()).map(|v| (field, v)))
                    .map(|(field, v)| to_native(table, field.ty, v))
                    .collect::<Result<_, _>>()?,
            )
        }
        (TypeDescriptor::Record(fields), DynamicValue::Record(values)) => {
            let mut object = Map::new();
            for field in fields {
                if let Some(v) = values.get(&field.id()) {
                    object.insert(label_key(&field.label), to_native(table, field.ty, v)?);
                }
            }
            Value::Object(object)
        }
        (TypeDescriptor::Variant(fields), DynamicValue::Variant(id, payload)) => {
            let field = fields.iter().find(|f| f.id() == *id).ok_or_else(mismatch)?;
            let mut object = Map::new();
            object.insert(label_key(&field.label), to_native(table, field.ty, payload)?);
            Value::Object(object)
        }

        _ => return Err(mismatch()),
    };
    Ok(json)
}

fn integer_to_json(n: &BigInt) -> Value {
    if let Some(u) = n.to_u64() {
        Value::from(u)
    } else if let Some(i) = n.to_i64() {
        Value::from(i)
    } else {
        Value::String(n.to_string())
    }
}

fn label_key(label: &Label) -> String {
    match label {
        Label::Named(name) => name.clone(),
        Label::Id(id) | Label::Unnamed(id) => id.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::idl;
    use serde_json::json;

    fn round_trip(did: &str, name: &str, input: Value) -> Value {
        let (table, _) = idl::parse(did).unwrap();
        let ty = table.resolve(name).unwrap();
        let value = to_dynamic(&table, ty, &input).unwrap();
        to_native(&table, ty, &value).unwrap()
    }

    #[test]
    fn test_record_with_absent_option() {
        let output = round_trip(
            "type R = record { a : nat; b : opt text };",
            "R",
            json!({ "a": 5, "b": [] }),
        );
        assert_eq!(output, json!({ "a": 5, "b": [] }));
    }

    #[test]
    fn test_record_keys_by_id() {
        let (table, _) = idl::parse("type R = record { 1 : nat; name : text };").unwrap();
        let ty = table.resolve("R").unwrap();
        let value = to_dynamic(&table, ty, &json!({ "_1_": 7, "name": "x" })).unwrap();
        assert_eq!(to_native(&table, ty, &value).unwrap(), json!({ "1": 7, "name": "x" }));

        let err = to_dynamic(&table, ty, &json!({ "nope": 1 })).unwrap_err();
        assert!(matches!(err, EncodeError::UnknownField { field, .. } if field == "nope"));
    }

    #[test]
    fn test_tuples_use_arrays() {
        let output = round_trip("type T = record { nat; text };", "T", json!([1, "one"]));
        assert_eq!(output, json!([1, "one"]));
    }

    #[test]
    fn test_variants() {
        let did = "type V = variant { Ok : nat; Err : text; Pending };";
        assert_eq!(round_trip(did, "V", json!({ "Err": "bad" })), json!({ "Err": "bad" }));
        assert_eq!(round_trip(did, "V", json!("Pending")), json!({ "Pending": null }));

        let (table, _) = idl::parse(did).unwrap();
        let err = to_dynamic(&table, table.resolve("V").unwrap(), &json!({ "Nope": 1 }))
            .unwrap_err();
        assert!(matches!(err, EncodeError::UnknownVariantTag { tag, .. } if tag == "Nope"));
    }

    #[test]
    fn test_big_integers_travel_as_strings() {
        let did = "type N = nat;  type I = record { n : nat; i : int };";
        let big = "340282366920938463463374607431768211456";
        let output = round_trip(did, "I", json!({ "n": big, "i": -3 }));
        assert_eq!(output, json!({ "n": big, "i": -3 }));
    }

    #[test]
    fn test_blob_principal_and_references() {
        let did = "type R = record { data : blob; owner : principal; cb : func (nat) -> (); svc : service {} };";
        let input = json!({
            "data": [1, 2, 255],
            "owner": "aaaaa-aa",
            "cb": ["2vxsx-fae", "notify"],
            "svc": "aaaaa-aa",
        });
        assert_eq!(round_trip(did, "R", input.clone()), input);

        let (table, _) = idl::parse(did).unwrap();
        let err = to_dynamic(&table, table.resolve("R").unwrap(), &json!({ "owner": "nope" }))
            .unwrap_err();
        assert!(matches!(err, EncodeError::InvalidPrincipal(text, _) if text == "nope"));
    }

    #[test]
    fn test_shape_mismatch() {
        let (table, _) = idl::parse("type R = record { a : nat };").unwrap();
        let err = to_dynamic(&table, table.resolve("R").unwrap(), &json!("text")).unwrap_err();
        assert!(matches!(err, EncodeError::TypeMismatch { found: "string", .. }));
    }
}
