use super::DecodeError;
use crate::{
    types::{Field, Primitive, TypeDescriptor, TypeRef, TypeTable},
    value::DynamicValue,
};
use std::{borrow::Cow, collections::BTreeMap};

/// Converts values decoded against wire types into values of the expected types.
pub(super) struct Reconciler<'a> {
    wire: &'a TypeTable,
    expected: &'a TypeTable,
}

impl<'a> Reconciler<'a> {
    pub(super) fn new(wire: &'a TypeTable, expected: &'a TypeTable) -> Self {
        Self { wire, expected }
    }

    /// The value a missing field or argument of type `ty` takes, if it has one.
    pub(super) fn absent(&self, ty: TypeRef) -> Option<DynamicValue> {
        match self.expected.describe(ty)?.as_ref() {
            TypeDescriptor::Opt(_) => Some(DynamicValue::none()),
            TypeDescriptor::Primitive(Primitive::Null | Primitive::Reserved) => {
                Some(DynamicValue::Null)
            }
            _ => None,
        }
    }

    pub(super) fn coerce(
        &self,
        value: DynamicValue,
        wire_ty: TypeRef,
        expected_ty: TypeRef,
    ) -> Result<DynamicValue, DecodeError> {
        let wire = describe(self.wire, wire_ty)?;
        let expected = describe(self.expected, expected_ty)?;

        match (wire.as_ref(), expected.as_ref(), value) {
            (_, TypeDescriptor::Primitive(Primitive::Reserved), _) => Ok(DynamicValue::Null),

            (_, TypeDescriptor::Opt(inner), value) => {
                Ok(self.coerce_opt(value, wire_ty, &wire, *inner))
            }

            (TypeDescriptor::Primitive(w), TypeDescriptor::Primitive(e), value)
                if w == e || (*w == Primitive::Nat && *e == Primitive::Int) =>
            {
                Ok(value)
            }

            (TypeDescriptor::Vec(w), TypeDescriptor::Vec(e), DynamicValue::Blob(bytes)) => {
                if self.expected.primitive(*e) == Some(Primitive::Nat8) {
                    return Ok(DynamicValue::Blob(bytes));
                }
                bytes
                    .into_iter()
                    .map(|b| self.coerce(DynamicValue::from(b), *w, *e))
                    .collect::<Result<Vec<_>, _>>()
                    .map(DynamicValue::Vector)
            }
            (TypeDescriptor::Vec(w), TypeDescriptor::Vec(e), DynamicValue::Vector(items)) => items
                .into_iter()
                .map(|item| self.coerce(item, *w, *e))
                .collect::<Result<Vec<_>, _>>()
                .map(DynamicValue::Vector),

            (
                TypeDescriptor::Record(wire_fields),
                TypeDescriptor::Record(expected_fields),
                DynamicValue::Record(values),
            ) => self.coerce_record(values, wire_fields, expected_fields),

            (
                TypeDescriptor::Variant(wire_fields),
                TypeDescriptor::Variant(expected_fields),
                DynamicValue::Variant(id, payload),
            ) => {
                let wire_field = wire_fields.iter().find(|f| f.id() == id);
                let expected_field = expected_fields.iter().find(|f| f.id() == id);
                match (wire_field, expected_field) {
                    (Some(w), Some(e)) => {
                        let payload = self.coerce(*payload, w.ty, e.ty)?;
                        Ok(DynamicValue::Variant(id, Box::new(payload)))
                    }
                    _ => Err(DecodeError::UnknownVariantTag(id.to_string())),
                }
            }

            // References are opaque, their signatures are not compared.
            (TypeDescriptor::Func(_), TypeDescriptor::Func(_), value @ DynamicValue::Func(..)) => {
                Ok(value)
            }
            (
                TypeDescriptor::Service(_),
                TypeDescriptor::Service(_),
                value @ DynamicValue::Service(_),
            ) => Ok(value),

            _ => Err(DecodeError::TypeMismatch {
                expected: self.expected.display(expected_ty).to_string(),
                found: self.wire.display(wire_ty).to_string(),
            }),
        }
    }

    /// An expected `opt` never fails: anything that cannot be reconciled becomes absent.
    fn coerce_opt(
        &self,
        value: DynamicValue,
        wire_ty: TypeRef,
        wire: &TypeDescriptor,
        inner: TypeRef,
    ) -> DynamicValue {
        match (wire, value) {
            (TypeDescriptor::Primitive(Primitive::Null | Primitive::Reserved), _) => {
                DynamicValue::none()
            }
            (TypeDescriptor::Opt(wire_inner), DynamicValue::Option(payload)) => payload
                .and_then(|payload| self.coerce(*payload, *wire_inner, inner).ok())
                .map_or_else(DynamicValue::none, DynamicValue::some),
            (_, value) => self
                .coerce(value, wire_ty, inner)
                .map_or_else(|_| DynamicValue::none(), DynamicValue::some),
        }
    }

    fn coerce_record(
        &self,
        mut values: BTreeMap<u32, DynamicValue>,
        wire_fields: &[Field],
        expected_fields: &[Field],
    ) -> Result<DynamicValue, DecodeError> {
        let mut out = BTreeMap::new();
        for field in expected_fields {
            let id = field.id();
            let wire_field = wire_fields.iter().find(|f| f.id() == id);
            let value = match (wire_field, values.remove(&id)) {
                (Some(w), Some(value)) => self.coerce(value, w.ty, field.ty)?,
                _ => self
                    .absent(field.ty)
                    .ok_or_else(|| DecodeError::MissingField(field.label.to_string()))?,
            };
            out.insert(id, value);
        }
        if !values.is_empty() {
            tracing::trace!(
                dropped = ?values.keys().collect::<Vec<_>>(),
                "Dropping record fields unknown to the expected type"
            );
        }
        Ok(DynamicValue::Record(out))
    }
}

fn describe(table: &TypeTable, ty: TypeRef) -> Result<Cow<'_, TypeDescriptor>, DecodeError> {
    table.describe(ty).ok_or(DecodeError::TypeIndexOutOfRange {
        index: match ty {
            TypeRef::Table(index) => index,
            TypeRef::Primitive(_) => 0,
        },
        len: table.len(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Label;

    fn named(name: &str, ty: impl Into<TypeRef>) -> Field {
        Field::new(Label::Named(name.into()), ty.into())
    }

    #[test]
    fn test_extra_fields_are_dropped_and_missing_options_filled() {
        let mut wire = TypeTable::new();
        let wire_record = wire.intern(TypeDescriptor::Record(vec![
            Field::new(Label::Id(crate::types::idl_hash("a")), Primitive::Nat.into()),
            Field::new(Label::Id(crate::types::idl_hash("z")), Primitive::Text.into()),
        ]));

        let mut expected = TypeTable::new();
        let opt_text = expected.intern(TypeDescriptor::Opt(Primitive::Text.into()));
        let expected_record = expected.intern(TypeDescriptor::Record(vec![
            named("a", Primitive::Nat),
            named("b", opt_text),
        ]));

        let value = DynamicValue::record([("a", 5u8.into()), ("z", "extra".into())]);
        let reconciled = Reconciler::new(&wire, &expected)
            .coerce(value, wire_record, expected_record)
            .unwrap();
        assert_eq!(
            reconciled,
            DynamicValue::record([("a", 5u8.into()), ("b", DynamicValue::none())])
        );
    }

    #[test]
    fn test_missing_required_field() {
        let mut wire = TypeTable::new();
        let wire_record = wire.intern(TypeDescriptor::Record(vec![]));
        let mut expected = TypeTable::new();
        let expected_record =
            expected.intern(TypeDescriptor::Record(vec![named("a", Primitive::Nat)]));

        let err = Reconciler::new(&wire, &expected)
            .coerce(DynamicValue::Record(BTreeMap::new()), wire_record, expected_record)
            .unwrap_err();
        assert_eq!(err, DecodeError::MissingField("a".into()));
    }

    #[test]
    fn test_nat_widens_to_int_but_not_the_reverse() {
        let table = TypeTable::new();
        let reconciler = Reconciler::new(&table, &table);
        assert_eq!(
            reconciler.coerce(7u8.into(), Primitive::Nat.into(), Primitive::Int.into()),
            Ok(DynamicValue::from(7u8))
        );
        assert!(matches!(
            reconciler.coerce(7u8.into(), Primitive::Int.into(), Primitive::Nat.into()),
            Err(DecodeError::TypeMismatch { .. })
        ));
    }

    #[test]
    fn test_opt_rule() {
        let mut wire = TypeTable::new();
        let wire_opt_text = wire.intern(TypeDescriptor::Opt(Primitive::Text.into()));
        let mut expected = TypeTable::new();
        let opt_nat = expected.intern(TypeDescriptor::Opt(Primitive::Nat.into()));
        let reconciler = Reconciler::new(&wire, &expected);

        // Wire null becomes absent.
        assert_eq!(
            reconciler.coerce(DynamicValue::Null, Primitive::Null.into(), opt_nat),
            Ok(DynamicValue::none())
        );
        // Non-opt wire value fitting the payload becomes present.
        assert_eq!(
            reconciler.coerce(3u8.into(), Primitive::Nat.into(), opt_nat),
            Ok(DynamicValue::some(3u8.into()))
        );
        // A payload that does not fit collapses to absent instead of failing.
        assert_eq!(
            reconciler.coerce(DynamicValue::some("x".into()), wire_opt_text, opt_nat),
            Ok(DynamicValue::none())
        );
    }

    #[test]
    fn test_unknown_variant_tag() {
        let mut wire = TypeTable::new();
        let wire_variant = wire.intern(TypeDescriptor::Variant(vec![Field::new(
            Label::Id(crate::types::idl_hash("Gone")),
            Primitive::Null.into(),
        )]));
        let mut expected = TypeTable::new();
        let expected_variant =
            expected.intern(TypeDescriptor::Variant(vec![named("Ok", Primitive::Null)]));

        let value = DynamicValue::variant("Gone", DynamicValue::Null);
        let reconciler = Reconciler::new(&wire, &expected);
        assert!(matches!(
            reconciler.coerce(value.clone(), wire_variant, expected_variant),
            Err(DecodeError::UnknownVariantTag(_))
        ));
        // `reserved` accepts anything.
        assert_eq!(
            reconciler.coerce(value, wire_variant, Primitive::Reserved.into()),
            Ok(DynamicValue::Null)
        );
    }
}
