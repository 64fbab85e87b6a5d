//! Type pass.
//!
//! Resolves typedefs, enums, structs, unions and exceptions. Linking binds
//! field and alias types to handles; a field typed `B` only needs `B` to
//! exist in the scope, so `struct A { 1: optional B b }` and
//! `struct B { 1: optional A a }` resolve regardless of order.
//!
//! Validation then checks:
//! - typedef chains reach a type (`typedef A B; typedef B A;` is a cycle)
//! - field ids and names are unique per type
//! - unions have no required fields and no defaults
//! - field defaults fit the field type (constants are resolved already)

use super::eval::{self, Resolved};
use super::{bind_const, bind_type, LinkPass};
use crate::entity::{EntityId, EntityKind, EntityTag, FieldSpec};
use crate::error::{CompileError, Result};
use crate::scope::Scope;
use crate::value::Value;
use std::collections::HashMap;

#[derive(Debug, Default)]
pub(crate) struct TypePass;

impl LinkPass for TypePass {
    const NAME: &'static str = "types";

    fn handles(tag: EntityTag) -> bool {
        tag.is_type()
    }

    fn link(&mut self, scope: &mut Scope, id: EntityId) -> Result<()> {
        let entity = scope.entity(id);
        let name = entity.name().to_string();
        let mut kind = entity.kind().clone();

        match &mut kind {
            EntityKind::TypeAlias(alias) => bind_type(scope, &mut alias.target, &name)?,
            EntityKind::Struct(spec) | EntityKind::Union(spec) | EntityKind::Exception(spec) => {
                bind_fields(scope, &name, &mut spec.fields)?;
            }
            EntityKind::Enum(_) => return Ok(()),
            EntityKind::Const(_) | EntityKind::Service(_) => return Ok(()),
        }

        scope.entity_mut(id).replace_kind(kind);
        Ok(())
    }

    fn validate(&mut self, scope: &mut Scope, id: EntityId) -> Result<()> {
        let entity = scope.entity(id);
        let tag = entity.tag();

        match tag {
            EntityTag::TypeAlias => {
                scope.dealias_entity(id)?;
                Ok(())
            }
            EntityTag::Struct | EntityTag::Union | EntityTag::Exception => {
                let Some(spec) = entity.as_struct() else {
                    return Ok(());
                };
                let name = entity.name().to_string();
                check_fields(&name, &spec.fields)?;
                if tag == EntityTag::Union {
                    check_union(&name, &spec.fields)?;
                }

                let defaults = evaluate_defaults(scope, &name, &spec.fields)?;
                let mut kind = entity.kind().clone();
                if let EntityKind::Struct(spec) | EntityKind::Union(spec) | EntityKind::Exception(spec) =
                    &mut kind
                {
                    apply_defaults(&mut spec.fields, defaults);
                }
                scope.entity_mut(id).replace_kind(kind);
                Ok(())
            }
            EntityTag::Enum | EntityTag::Const | EntityTag::Service => Ok(()),
        }
    }
}

/// Bind field types and default-value references.
///
/// Used for struct-like fields as well as function parameters and declared
/// exceptions.
pub(crate) fn bind_fields(scope: &Scope, owner: &str, fields: &mut [FieldSpec]) -> Result<()> {
    for field in fields {
        let referrer = format!("{}.{}", owner, field.name);
        bind_type(scope, &mut field.ty, &referrer)?;
        if let Some(default) = &mut field.default {
            bind_const(scope, default, &referrer)?;
        }
    }
    Ok(())
}

/// Field ids and names must be unique within one owner.
pub(crate) fn check_fields(owner: &str, fields: &[FieldSpec]) -> Result<()> {
    let mut ids = HashMap::new();
    let mut names = HashMap::new();

    for field in fields {
        if let Some(first) = names.insert(field.name.as_str(), field.span) {
            return Err(CompileError::DuplicateSymbol {
                name: format!("{}.{}", owner, field.name),
                span: field.span,
                first,
            });
        }
        if let Some(first) = ids.insert(field.id, field.span) {
            return Err(CompileError::DuplicateSymbol {
                name: format!("{}.{} (field id {})", owner, field.name, field.id),
                span: field.span,
                first,
            });
        }
    }
    Ok(())
}

fn check_union(owner: &str, fields: &[FieldSpec]) -> Result<()> {
    for field in fields {
        let name = format!("{}.{}", owner, field.name);
        if field.is_required() {
            return Err(CompileError::invalid(
                &name,
                field.span,
                "union fields cannot be required",
            ));
        }
        if field.default.is_some() {
            return Err(CompileError::invalid(
                &name,
                field.span,
                "union fields cannot have default values",
            ));
        }
    }
    Ok(())
}

/// Evaluate every default against its field type.
pub(crate) fn evaluate_defaults(
    scope: &Scope,
    owner: &str,
    fields: &[FieldSpec],
) -> Result<Vec<Option<Value>>> {
    fields
        .iter()
        .map(|field| match &field.default {
            Some(default) => {
                let name = format!("{}.{}", owner, field.name);
                eval::evaluate(scope, &field.ty, default, &mut Resolved, &name, field.span)
                    .map(Some)
            }
            None => Ok(None),
        })
        .collect()
}

pub(crate) fn apply_defaults(fields: &mut [FieldSpec], defaults: Vec<Option<Value>>) {
    for (field, default) in fields.iter_mut().zip(defaults) {
        field.default_value = default;
    }
}
