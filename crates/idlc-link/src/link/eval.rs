//! Constant evaluation and value/type compatibility.
//!
//! Evaluation happens in two steps:
//!
//! 1. [`literal`] turns a [`ConstValue`] into a loosely typed [`Value`]
//!    (integer literals become `I64`, list literals become `List`, ...).
//!    References are replaced by the referenced constant's value or by the
//!    referenced enum item.
//! 2. [`coerce`] checks that loose value against the declared type and
//!    converts it to its typed form.
//!
//! Types are inspected through [`Scope::dealias`], which works whether or
//! not the type's own pass has run yet.

use crate::entity::{ConstTarget, ConstValue, EntityId, EntityTag, TypeSpec};
use crate::error::{CompileError, Result};
use crate::scope::{Dealiased, Scope};
use crate::value::{EnumValue, StructValue, Value};
use idlc_ast::{PrimitiveType, Span};

/// Supplies the evaluated value of a referenced constant.
pub(crate) trait ConstSource {
    fn constant(&mut self, scope: &Scope, id: EntityId) -> Result<Value>;
}

/// Reads values stored on constants that are already resolved.
pub(crate) struct Resolved;

impl ConstSource for Resolved {
    fn constant(&mut self, scope: &Scope, id: EntityId) -> Result<Value> {
        let entity = scope.entity(id);
        entity
            .as_const()
            .and_then(|spec| spec.value.clone())
            .ok_or_else(|| {
                CompileError::invalid(entity.name(), entity.span(), "constant was not evaluated")
            })
    }
}

/// Evaluate `expr` and check it against `ty`.
pub(crate) fn evaluate(
    scope: &Scope,
    ty: &TypeSpec,
    expr: &ConstValue,
    source: &mut dyn ConstSource,
    owner: &str,
    span: Span,
) -> Result<Value> {
    let loose = literal(scope, expr, source, owner, span)?;
    coerce(scope, ty, loose, owner, span)
}

/// Loosely typed value of a constant expression.
pub(crate) fn literal(
    scope: &Scope,
    expr: &ConstValue,
    source: &mut dyn ConstSource,
    owner: &str,
    span: Span,
) -> Result<Value> {
    Ok(match expr {
        ConstValue::Bool(v) => Value::Bool(*v),
        ConstValue::Int(v) => Value::I64(*v),
        ConstValue::Double(v) => Value::Double(*v),
        ConstValue::String(v) => Value::String(v.clone()),
        ConstValue::List(items) => Value::List(
            items
                .iter()
                .map(|item| literal(scope, item, source, owner, span))
                .collect::<Result<_>>()?,
        ),
        ConstValue::Map(pairs) => Value::Map(
            pairs
                .iter()
                .map(|(k, v)| {
                    Ok((
                        literal(scope, k, source, owner, span)?,
                        literal(scope, v, source, owner, span)?,
                    ))
                })
                .collect::<Result<_>>()?,
        ),
        ConstValue::Reference(reference) => match reference.target() {
            Some(ConstTarget::Const(id)) => source.constant(scope, id)?,
            Some(ConstTarget::EnumItem { enum_id, value }) => Value::Enum(EnumValue {
                type_name: scope.entity(enum_id).name().to_string(),
                value,
            }),
            None => {
                return Err(CompileError::UnknownSymbol {
                    name: reference.name().to_string(),
                    referrer: owner.to_string(),
                    span: reference.span(),
                })
            }
        },
    })
}

/// Convert a loose value to the typed value of `ty`.
///
/// # Errors
///
/// [`CompileError::TypeMismatch`] naming `owner` when the value's shape is
/// incompatible with the type.
pub(crate) fn coerce(
    scope: &Scope,
    ty: &TypeSpec,
    value: Value,
    owner: &str,
    span: Span,
) -> Result<Value> {
    let mismatch = |value: &Value| {
        CompileError::mismatch(
            owner,
            span,
            format!("cannot use {} value {} as {}", value.describe(), value, ty),
        )
    };

    match scope.dealias(ty, owner)? {
        Dealiased::Spec(TypeSpec::Primitive(primitive)) => {
            coerce_primitive(*primitive, value, owner, span, ty)
        }
        Dealiased::Spec(TypeSpec::List(element)) => match value {
            Value::List(items) | Value::Set(items) => Ok(Value::List(
                items
                    .into_iter()
                    .map(|item| coerce(scope, element, item, owner, span))
                    .collect::<Result<_>>()?,
            )),
            other => Err(mismatch(&other)),
        },
        Dealiased::Spec(TypeSpec::Set(element)) => match value {
            Value::List(items) | Value::Set(items) => {
                let mut typed: Vec<Value> = Vec::with_capacity(items.len());
                for item in items {
                    let item = coerce(scope, element, item, owner, span)?;
                    if !typed.contains(&item) {
                        typed.push(item);
                    }
                }
                Ok(Value::Set(typed))
            }
            other => Err(mismatch(&other)),
        },
        Dealiased::Spec(TypeSpec::Map(key, val)) => match value {
            Value::Map(pairs) => Ok(Value::Map(
                pairs
                    .into_iter()
                    .map(|(k, v)| {
                        Ok((
                            coerce(scope, key, k, owner, span)?,
                            coerce(scope, val, v, owner, span)?,
                        ))
                    })
                    .collect::<Result<_>>()?,
            )),
            other => Err(mismatch(&other)),
        },
        Dealiased::Spec(TypeSpec::Named(_)) => Err(mismatch(&value)),
        Dealiased::Entity(id, EntityTag::Enum) => coerce_enum(scope, id, value, owner, span),
        Dealiased::Entity(id, tag) if tag.is_struct_like() => {
            coerce_struct(scope, id, tag, value, owner, span)
        }
        Dealiased::Entity(id, tag) => Err(CompileError::mismatch(
            owner,
            span,
            format!("'{}' is a {}, expected a type", scope.entity(id).name(), tag),
        )),
    }
}

fn coerce_primitive(
    primitive: PrimitiveType,
    value: Value,
    owner: &str,
    span: Span,
    ty: &TypeSpec,
) -> Result<Value> {
    let mismatch = |value: &Value| {
        CompileError::mismatch(
            owner,
            span,
            format!("cannot use {} value {} as {}", value.describe(), value, ty),
        )
    };

    if let Some((min, max)) = primitive.integer_range() {
        let Some(int) = value.as_i64() else {
            return Err(mismatch(&value));
        };
        if int < min || int > max {
            return Err(CompileError::mismatch(
                owner,
                span,
                format!("value {int} is out of range for {primitive}"),
            ));
        }
        // Range was checked above, the narrowing casts are exact.
        return Ok(match primitive {
            PrimitiveType::Byte => Value::Byte(int as i8),
            PrimitiveType::I16 => Value::I16(int as i16),
            PrimitiveType::I32 => Value::I32(int as i32),
            _ => Value::I64(int),
        });
    }

    match (primitive, value) {
        (PrimitiveType::Bool, Value::Bool(b)) => Ok(Value::Bool(b)),
        (PrimitiveType::Bool, value) => match value.as_i64() {
            Some(0) if !matches!(value, Value::Enum(_)) => Ok(Value::Bool(false)),
            Some(1) if !matches!(value, Value::Enum(_)) => Ok(Value::Bool(true)),
            _ => Err(mismatch(&value)),
        },
        (PrimitiveType::Double, Value::Double(d)) => Ok(Value::Double(d)),
        (PrimitiveType::Double, value) => match value {
            Value::Byte(_) | Value::I16(_) | Value::I32(_) | Value::I64(_) => {
                Ok(Value::Double(value.as_i64().unwrap_or_default() as f64))
            }
            other => Err(mismatch(&other)),
        },
        (PrimitiveType::String, Value::String(s)) => Ok(Value::String(s)),
        (PrimitiveType::Binary, Value::String(s)) => Ok(Value::Binary(s.into_bytes())),
        (PrimitiveType::Binary, Value::Binary(b)) => Ok(Value::Binary(b)),
        (_, other) => Err(mismatch(&other)),
    }
}

fn coerce_enum(
    scope: &Scope,
    id: EntityId,
    value: Value,
    owner: &str,
    span: Span,
) -> Result<Value> {
    let entity = scope.entity(id);
    let items = entity.as_enum().map(|spec| spec.items.as_slice()).unwrap_or_default();

    match value {
        Value::Enum(e) if e.type_name == entity.name() => Ok(Value::Enum(e)),
        Value::Enum(e) => Err(CompileError::mismatch(
            owner,
            span,
            format!("item of enum '{}' used where '{}' is expected", e.type_name, entity.name()),
        )),
        other => {
            let matched = other
                .as_i64()
                .and_then(|int| items.iter().find(|item| item.value as i64 == int));
            match matched {
                Some(item) => Ok(Value::Enum(EnumValue {
                    type_name: entity.name().to_string(),
                    value: item.value,
                })),
                None => Err(CompileError::mismatch(
                    owner,
                    span,
                    format!("{} is not a valid value of enum '{}'", other, entity.name()),
                )),
            }
        }
    }
}

fn coerce_struct(
    scope: &Scope,
    id: EntityId,
    tag: EntityTag,
    value: Value,
    owner: &str,
    span: Span,
) -> Result<Value> {
    let entity = scope.entity(id);
    let Some(spec) = entity.as_struct() else {
        return Err(CompileError::invalid(entity.name(), entity.span(), "expected a struct body"));
    };

    let pairs = match value {
        Value::Struct(s) if s.type_name == entity.name() => return Ok(Value::Struct(s)),
        Value::Map(pairs) => pairs,
        other => {
            return Err(CompileError::mismatch(
                owner,
                span,
                format!("cannot use {} value {} as {} '{}'", other.describe(), other, tag, entity.name()),
            ))
        }
    };

    let mut result = StructValue::new(entity.name());
    for (key, val) in pairs {
        let field_name = match key {
            Value::String(name) => name,
            other => {
                return Err(CompileError::mismatch(
                    owner,
                    span,
                    format!("keys of a {tag} constant must be field names, found {other}"),
                ))
            }
        };
        let Some(field) = spec.field(&field_name) else {
            return Err(CompileError::mismatch(
                owner,
                span,
                format!("{} '{}' has no field '{}'", tag, entity.name(), field_name),
            ));
        };
        if result.fields.contains_key(&field_name) {
            return Err(CompileError::mismatch(
                owner,
                span,
                format!("field '{}' of {} '{}' is set more than once", field_name, tag, entity.name()),
            ));
        }
        let typed = coerce(scope, &field.ty, val, owner, span)?;
        result.fields.insert(field_name, typed);
    }

    if tag == EntityTag::Union {
        if result.fields.len() != 1 {
            return Err(CompileError::mismatch(
                owner,
                span,
                format!(
                    "union '{}' needs exactly one field set, found {}",
                    entity.name(),
                    result.fields.len()
                ),
            ));
        }
    } else if let Some(missing) = spec
        .fields
        .iter()
        .find(|field| field.is_required() && !result.fields.contains_key(&field.name))
    {
        return Err(CompileError::mismatch(
            owner,
            span,
            format!(
                "required field '{}' of {} '{}' is missing",
                missing.name,
                tag,
                entity.name()
            ),
        ));
    }

    Ok(Value::Struct(result))
}
