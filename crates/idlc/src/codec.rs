//! Type-directed conversion between [`Value`]s and [`WireValue`]s.
//!
//! Every conversion walks the compiled type alongside the value, so the
//! same rules apply no matter which protocol encodes the result:
//!
//! - struct fields are keyed by field id on the wire and by name in values
//! - required fields must be present, both ways
//! - unknown field ids are skipped when decoding
//! - absent fields with a default get the default when decoding
//! - unions carry exactly one field
//! - enum values must name a defined item

use crate::error::ValueError;
use crate::wire::{FieldValue, TType, WireValue};
use idlc_ast::{PrimitiveType, Span};
use idlc_link::{
    CompileError, Dealiased, EntityId, EntityTag, EnumValue, Reference, Scope, StructSpec,
    StructValue, TypeSpec, Value,
};
use tracing::trace;

type Result<T> = std::result::Result<T, ValueError>;

fn resolve<'a>(scope: &'a Scope, ty: &'a TypeSpec) -> Result<Dealiased<'a>> {
    scope.dealias(ty, scope.name()).map_err(|err| match err {
        CompileError::UnknownSymbol { name, .. } => ValueError::UnknownType(name),
        other => ValueError::Link(other),
    })
}

fn not_a_type(scope: &Scope, id: EntityId, tag: EntityTag) -> ValueError {
    ValueError::mismatch("a type", format!("{} '{}'", tag, scope.entity(id).name()))
}

fn struct_spec(scope: &Scope, id: EntityId) -> Result<&StructSpec> {
    let entity = scope.entity(id);
    entity
        .as_struct()
        .ok_or_else(|| ValueError::mismatch("a struct type", entity.name()))
}

/// Wire tag used for values of `ty`.
pub fn ttype_of(scope: &Scope, ty: &TypeSpec) -> Result<TType> {
    Ok(match resolve(scope, ty)? {
        Dealiased::Spec(TypeSpec::Primitive(primitive)) => match primitive {
            PrimitiveType::Bool => TType::Bool,
            PrimitiveType::Byte => TType::Byte,
            PrimitiveType::I16 => TType::I16,
            PrimitiveType::I32 => TType::I32,
            PrimitiveType::I64 => TType::I64,
            PrimitiveType::Double => TType::Double,
            PrimitiveType::String => TType::String,
            PrimitiveType::Binary => TType::Binary,
        },
        Dealiased::Spec(TypeSpec::List(_)) => TType::List,
        Dealiased::Spec(TypeSpec::Set(_)) => TType::Set,
        Dealiased::Spec(TypeSpec::Map(_, _)) => TType::Map,
        Dealiased::Spec(TypeSpec::Named(reference)) => {
            return Err(ValueError::UnknownType(reference.name().to_string()))
        }
        Dealiased::Entity(_, EntityTag::Enum) => TType::I32,
        Dealiased::Entity(_, tag) if tag.is_struct_like() => TType::Struct,
        Dealiased::Entity(id, tag) => return Err(not_a_type(scope, id, tag)),
    })
}

/// Lower `value` to its wire form as a value of type `ty`.
pub fn to_wire(scope: &Scope, ty: &TypeSpec, value: &Value) -> Result<WireValue> {
    match resolve(scope, ty)? {
        Dealiased::Spec(TypeSpec::Primitive(primitive)) => primitive_to_wire(*primitive, value),
        Dealiased::Spec(TypeSpec::List(element)) => match value {
            Value::List(items) => Ok(WireValue::List {
                element: ttype_of(scope, element)?,
                items: items
                    .iter()
                    .map(|item| to_wire(scope, element, item))
                    .collect::<Result<_>>()?,
            }),
            other => Err(ValueError::mismatch(ty, other.describe())),
        },
        Dealiased::Spec(TypeSpec::Set(element)) => match value {
            Value::Set(items) => Ok(WireValue::Set {
                element: ttype_of(scope, element)?,
                items: items
                    .iter()
                    .map(|item| to_wire(scope, element, item))
                    .collect::<Result<_>>()?,
            }),
            other => Err(ValueError::mismatch(ty, other.describe())),
        },
        Dealiased::Spec(TypeSpec::Map(key, val)) => match value {
            Value::Map(entries) => Ok(WireValue::Map {
                key: ttype_of(scope, key)?,
                value: ttype_of(scope, val)?,
                entries: entries
                    .iter()
                    .map(|(k, v)| Ok((to_wire(scope, key, k)?, to_wire(scope, val, v)?)))
                    .collect::<Result<_>>()?,
            }),
            other => Err(ValueError::mismatch(ty, other.describe())),
        },
        Dealiased::Spec(TypeSpec::Named(reference)) => {
            Err(ValueError::UnknownType(reference.name().to_string()))
        }
        Dealiased::Entity(id, EntityTag::Enum) => enum_to_wire(scope, id, value),
        Dealiased::Entity(id, tag) if tag.is_struct_like() => struct_to_wire(scope, id, tag, value),
        Dealiased::Entity(id, tag) => Err(not_a_type(scope, id, tag)),
    }
}

fn primitive_to_wire(primitive: PrimitiveType, value: &Value) -> Result<WireValue> {
    Ok(match (primitive, value) {
        (PrimitiveType::Bool, Value::Bool(v)) => WireValue::Bool(*v),
        (PrimitiveType::Byte, Value::Byte(v)) => WireValue::Byte(*v),
        (PrimitiveType::I16, Value::I16(v)) => WireValue::I16(*v),
        (PrimitiveType::I32, Value::I32(v)) => WireValue::I32(*v),
        (PrimitiveType::I64, Value::I64(v)) => WireValue::I64(*v),
        (PrimitiveType::Double, Value::Double(v)) => WireValue::Double(*v),
        (PrimitiveType::String, Value::String(v)) => WireValue::String(v.clone()),
        (PrimitiveType::Binary, Value::Binary(v)) => WireValue::Binary(v.clone()),
        (primitive, other) => return Err(ValueError::mismatch(primitive, other.describe())),
    })
}

fn enum_to_wire(scope: &Scope, id: EntityId, value: &Value) -> Result<WireValue> {
    let entity = scope.entity(id);
    let Value::Enum(EnumValue { type_name, value }) = value else {
        return Err(ValueError::mismatch(entity.name(), value.describe()));
    };
    if type_name != entity.name() {
        return Err(ValueError::mismatch(entity.name(), type_name));
    }
    let defined = entity
        .as_enum()
        .is_some_and(|spec| spec.item_by_value(*value).is_some());
    if !defined {
        return Err(ValueError::UnknownEnumValue {
            type_name: type_name.clone(),
            value: *value,
        });
    }
    Ok(WireValue::I32(*value))
}

fn struct_to_wire(scope: &Scope, id: EntityId, tag: EntityTag, value: &Value) -> Result<WireValue> {
    let name = scope.entity(id).name();
    let spec = struct_spec(scope, id)?;
    let instance = match value {
        Value::Struct(instance) if instance.type_name == name => instance,
        Value::Struct(instance) => return Err(ValueError::mismatch(name, &instance.type_name)),
        other => return Err(ValueError::mismatch(name, other.describe())),
    };

    if let Some(unknown) = instance.fields.keys().find(|key| spec.field(key).is_none()) {
        return Err(ValueError::UnknownField {
            type_name: name.to_string(),
            field: unknown.clone(),
        });
    }
    if tag == EntityTag::Union && instance.fields.len() != 1 {
        return Err(ValueError::UnionArity {
            type_name: name.to_string(),
            count: instance.fields.len(),
        });
    }

    let mut fields = Vec::with_capacity(instance.fields.len());
    for field in &spec.fields {
        match instance.fields.get(&field.name) {
            Some(value) => fields.push(FieldValue {
                id: field.id,
                value: to_wire(scope, &field.ty, value)?,
            }),
            None if field.is_required() => {
                return Err(ValueError::MissingField {
                    type_name: name.to_string(),
                    field: field.name.clone(),
                })
            }
            None => {}
        }
    }
    Ok(WireValue::Struct(fields))
}

/// Raise a decoded wire value back to a [`Value`] of type `ty`.
pub fn from_wire(scope: &Scope, ty: &TypeSpec, wire: &WireValue) -> Result<Value> {
    let mismatch = |wire: &WireValue| ValueError::mismatch(ty, wire.ttype());

    match resolve(scope, ty)? {
        Dealiased::Spec(TypeSpec::Primitive(primitive)) => primitive_from_wire(*primitive, wire),
        Dealiased::Spec(TypeSpec::List(element)) => match wire {
            WireValue::List { items, .. } => Ok(Value::List(
                items
                    .iter()
                    .map(|item| from_wire(scope, element, item))
                    .collect::<Result<_>>()?,
            )),
            other => Err(mismatch(other)),
        },
        Dealiased::Spec(TypeSpec::Set(element)) => match wire {
            WireValue::Set { items, .. } => Ok(Value::Set(
                items
                    .iter()
                    .map(|item| from_wire(scope, element, item))
                    .collect::<Result<_>>()?,
            )),
            other => Err(mismatch(other)),
        },
        Dealiased::Spec(TypeSpec::Map(key, val)) => match wire {
            WireValue::Map { entries, .. } => Ok(Value::Map(
                entries
                    .iter()
                    .map(|(k, v)| Ok((from_wire(scope, key, k)?, from_wire(scope, val, v)?)))
                    .collect::<Result<_>>()?,
            )),
            other => Err(mismatch(other)),
        },
        Dealiased::Spec(TypeSpec::Named(reference)) => {
            Err(ValueError::UnknownType(reference.name().to_string()))
        }
        Dealiased::Entity(id, EntityTag::Enum) => {
            let entity = scope.entity(id);
            let WireValue::I32(value) = wire else {
                return Err(mismatch(wire));
            };
            match entity.as_enum().and_then(|spec| spec.item_by_value(*value)) {
                Some(_) => Ok(Value::enum_value(entity.name(), *value)),
                None => Err(ValueError::UnknownEnumValue {
                    type_name: entity.name().to_string(),
                    value: *value,
                }),
            }
        }
        Dealiased::Entity(id, tag) if tag.is_struct_like() => struct_from_wire(scope, id, tag, wire),
        Dealiased::Entity(id, tag) => Err(not_a_type(scope, id, tag)),
    }
}

fn primitive_from_wire(primitive: PrimitiveType, wire: &WireValue) -> Result<Value> {
    Ok(match (primitive, wire) {
        (PrimitiveType::Bool, WireValue::Bool(v)) => Value::Bool(*v),
        (PrimitiveType::Byte, WireValue::Byte(v)) => Value::Byte(*v),
        (PrimitiveType::I16, WireValue::I16(v)) => Value::I16(*v),
        (PrimitiveType::I32, WireValue::I32(v)) => Value::I32(*v),
        (PrimitiveType::I64, WireValue::I64(v)) => Value::I64(*v),
        (PrimitiveType::Double, WireValue::Double(v)) => Value::Double(*v),
        (PrimitiveType::String, WireValue::String(v)) => Value::String(v.clone()),
        (PrimitiveType::Binary, WireValue::Binary(v)) => Value::Binary(v.clone()),
        (primitive, other) => return Err(ValueError::mismatch(primitive, other.ttype())),
    })
}

fn struct_from_wire(scope: &Scope, id: EntityId, tag: EntityTag, wire: &WireValue) -> Result<Value> {
    let name = scope.entity(id).name();
    let spec = struct_spec(scope, id)?;
    let WireValue::Struct(encoded) = wire else {
        return Err(ValueError::mismatch(name, wire.ttype()));
    };

    for field in encoded {
        if spec.field_by_id(field.id).is_none() {
            trace!(type_name = name, id = field.id, "skipping unknown field");
        }
    }

    let mut instance = StructValue::new(name);
    for field in &spec.fields {
        match encoded.iter().find(|encoded| encoded.id == field.id) {
            Some(encoded) => {
                let value = from_wire(scope, &field.ty, &encoded.value)?;
                instance.fields.insert(field.name.clone(), value);
            }
            None => match &field.default_value {
                Some(default) => {
                    instance.fields.insert(field.name.clone(), default.clone());
                }
                None if field.is_required() => {
                    return Err(ValueError::MissingField {
                        type_name: name.to_string(),
                        field: field.name.clone(),
                    })
                }
                None => {}
            },
        }
    }

    if tag == EntityTag::Union && instance.fields.len() != 1 {
        return Err(ValueError::UnionArity {
            type_name: name.to_string(),
            count: instance.fields.len(),
        });
    }
    Ok(Value::Struct(instance))
}

/// Type of a value, as far as the value itself can tell.
///
/// Named values carry their type name. Containers are typed by their first
/// element, so empty containers cannot be inferred.
pub fn infer_type(scope: &Scope, value: &Value) -> Result<TypeSpec> {
    Ok(match value {
        Value::Bool(_) => PrimitiveType::Bool.into(),
        Value::Byte(_) => PrimitiveType::Byte.into(),
        Value::I16(_) => PrimitiveType::I16.into(),
        Value::I32(_) => PrimitiveType::I32.into(),
        Value::I64(_) => PrimitiveType::I64.into(),
        Value::Double(_) => PrimitiveType::Double.into(),
        Value::String(_) => PrimitiveType::String.into(),
        Value::Binary(_) => PrimitiveType::Binary.into(),
        Value::List(items) => match items.first() {
            Some(first) => TypeSpec::list(infer_type(scope, first)?),
            None => return Err(ValueError::CannotInfer("an empty list".to_string())),
        },
        Value::Set(items) => match items.first() {
            Some(first) => TypeSpec::set(infer_type(scope, first)?),
            None => return Err(ValueError::CannotInfer("an empty set".to_string())),
        },
        Value::Map(entries) => match entries.first() {
            Some((key, value)) => TypeSpec::map(infer_type(scope, key)?, infer_type(scope, value)?),
            None => return Err(ValueError::CannotInfer("an empty map".to_string())),
        },
        Value::Enum(value) => named_type(scope, &value.type_name)?,
        Value::Struct(value) => named_type(scope, &value.type_name)?,
    })
}

/// Bound reference to the type entity called `name`.
pub fn named_type(scope: &Scope, name: &str) -> Result<TypeSpec> {
    match scope.get(name) {
        Some(id) if scope.entity(id).tag().is_type() => Ok(TypeSpec::Named(Reference::bound(
            name,
            Span::unknown(),
            id,
        ))),
        _ => Err(ValueError::UnknownType(name.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use idlc_ast::{
        ConstExpr, Definition, Document, EnumDecl, Field, StructDecl, TypeExpr, TypedefDecl,
    };

    fn scope() -> Scope {
        let document = Document::new()
            .with_definition(EnumDecl::new("Color").item("RED", None).item("BLUE", Some(4)))
            .with_definition(TypedefDecl::new("Palette", TypeExpr::list(TypeExpr::named("Color", Span::line(2)))))
            .with_definition(Definition::Struct(
                StructDecl::new("Pixel")
                    .field(Field::new(1, "x", PrimitiveType::I32).required())
                    .field(Field::new(2, "color", TypeExpr::named("Color", Span::line(4))))
                    .field(
                        Field::new(3, "alpha", PrimitiveType::Double)
                            .with_default(ConstExpr::Double(1.0)),
                    ),
            ))
            .with_definition(Definition::Union(
                StructDecl::new("Shape")
                    .field(Field::new(1, "circle", PrimitiveType::Double))
                    .field(Field::new(2, "square", PrimitiveType::Double)),
            ));
        idlc_link::compile("codec", &document).unwrap().scope
    }

    fn pixel() -> Value {
        StructValue::new("Pixel")
            .with("x", Value::I32(3))
            .with("color", Value::enum_value("Color", 4))
            .with("alpha", Value::Double(0.5))
            .into()
    }

    #[test]
    fn test_struct_fields_keyed_by_id() {
        let scope = scope();
        let ty = named_type(&scope, "Pixel").unwrap();
        let wire = to_wire(&scope, &ty, &pixel()).unwrap();

        assert_eq!(wire.field(1), Some(&WireValue::I32(3)));
        assert_eq!(wire.field(2), Some(&WireValue::I32(4)));
        assert_eq!(from_wire(&scope, &ty, &wire).unwrap(), pixel());
    }

    #[test]
    fn test_typedef_resolves_to_target() {
        let scope = scope();
        let ty = named_type(&scope, "Palette").unwrap();
        assert_eq!(ttype_of(&scope, &ty).unwrap(), TType::List);

        let value = Value::List(vec![Value::enum_value("Color", 0)]);
        let wire = to_wire(&scope, &ty, &value).unwrap();
        assert_eq!(
            wire,
            WireValue::List {
                element: TType::I32,
                items: vec![WireValue::I32(0)],
            }
        );
    }

    #[test]
    fn test_missing_required_field() {
        let scope = scope();
        let ty = named_type(&scope, "Pixel").unwrap();
        let value: Value = StructValue::new("Pixel").with("alpha", Value::Double(0.1)).into();
        assert!(matches!(
            to_wire(&scope, &ty, &value),
            Err(ValueError::MissingField { field, .. }) if field == "x"
        ));
        assert!(matches!(
            from_wire(&scope, &ty, &WireValue::Struct(vec![])),
            Err(ValueError::MissingField { field, .. }) if field == "x"
        ));
    }

    #[test]
    fn test_decode_fills_defaults_and_skips_unknown_ids() {
        let scope = scope();
        let ty = named_type(&scope, "Pixel").unwrap();
        let wire = WireValue::Struct(vec![
            FieldValue { id: 1, value: WireValue::I32(9) },
            FieldValue { id: 42, value: WireValue::String("future".into()) },
        ]);

        let decoded = from_wire(&scope, &ty, &wire).unwrap();
        let expected: Value = StructValue::new("Pixel")
            .with("x", Value::I32(9))
            .with("alpha", Value::Double(1.0))
            .into();
        assert_eq!(decoded, expected);
    }

    #[test]
    fn test_unknown_field_in_value() {
        let scope = scope();
        let ty = named_type(&scope, "Pixel").unwrap();
        let value: Value = StructValue::new("Pixel")
            .with("x", Value::I32(1))
            .with("z", Value::I32(1))
            .into();
        assert!(matches!(
            to_wire(&scope, &ty, &value),
            Err(ValueError::UnknownField { field, .. }) if field == "z"
        ));
    }

    #[test]
    fn test_union_arity() {
        let scope = scope();
        let ty = named_type(&scope, "Shape").unwrap();
        let both: Value = StructValue::new("Shape")
            .with("circle", Value::Double(1.0))
            .with("square", Value::Double(2.0))
            .into();
        assert!(matches!(
            to_wire(&scope, &ty, &both),
            Err(ValueError::UnionArity { count: 2, .. })
        ));
        assert!(matches!(
            from_wire(&scope, &ty, &WireValue::Struct(vec![])),
            Err(ValueError::UnionArity { count: 0, .. })
        ));
    }

    #[test]
    fn test_enum_values_are_checked() {
        let scope = scope();
        let ty = named_type(&scope, "Color").unwrap();
        assert!(matches!(
            to_wire(&scope, &ty, &Value::enum_value("Color", 2)),
            Err(ValueError::UnknownEnumValue { value: 2, .. })
        ));
        assert!(matches!(
            from_wire(&scope, &ty, &WireValue::I32(3)),
            Err(ValueError::UnknownEnumValue { value: 3, .. })
        ));
    }

    #[test]
    fn test_primitive_mismatch() {
        let scope = scope();
        let ty: TypeSpec = PrimitiveType::I64.into();
        assert!(matches!(
            to_wire(&scope, &ty, &Value::I32(1)),
            Err(ValueError::Mismatch { .. })
        ));
        assert!(matches!(
            from_wire(&scope, &ty, &WireValue::String("1".into())),
            Err(ValueError::Mismatch { .. })
        ));
    }

    #[test]
    fn test_infer_type() {
        let scope = scope();
        let ty = infer_type(&scope, &Value::Map(vec![(
            Value::String("k".into()),
            Value::List(vec![pixel()]),
        )]))
        .unwrap();
        assert_eq!(ttype_of(&scope, &ty).unwrap(), TType::Map);

        assert!(matches!(
            infer_type(&scope, &Value::List(vec![])),
            Err(ValueError::CannotInfer(_))
        ));
        assert!(matches!(
            infer_type(&scope, &Value::from(StructValue::new("Nope"))),
            Err(ValueError::UnknownType(name)) if name == "Nope"
        ));
    }

    #[test]
    fn test_unbound_reference_to_missing_type() {
        let scope = scope();
        let ty = TypeSpec::Named(Reference::new("Missing", Span::unknown()));
        assert!(matches!(
            to_wire(&scope, &ty, &Value::I32(1)),
            Err(ValueError::UnknownType(name)) if name == "Missing"
        ));
    }
}
