//! Definition generator.
//!
//! Walks the document's headers and definitions in source order and
//! declares one unresolved [`Entity`](crate::Entity) per definition in the
//! [`Scope`]. No reference is looked up here; that is the linker's job.
//!
//! # What This Stage Does
//!
//! 1. **Header checks** - `namespace` is ignored, `include` is rejected
//! 2. **Entity creation** - one entity per definition, typedefs included
//! 3. **Duplicate detection** - top-level names via [`Scope::declare`],
//!    enum item names locally
//! 4. **Local numbering** - enum item values and implicit field ids
//!
//! # Pipeline Position
//!
//! ```text
//! Headers → Generate → Link constants → Link types → Link services
//!             ^^^^^^
//! ```

use crate::entity::{
    AliasSpec, ConstSpec, ConstValue, EntityId, EntityKind, EnumItemSpec, EnumSpec, FieldSpec,
    FunctionSpec, Reference, ServiceSpec, StructSpec, TypeSpec,
};
use crate::error::{CompileError, Result};
use crate::scope::Scope;
use idlc_ast::{
    ConstExpr, Definition, EnumDecl, Field, FunctionDecl, Header, ServiceDecl, Span, StructDecl,
    TypeExpr,
};
use std::collections::HashMap;
use tracing::trace;

/// Fills a [`Scope`] with unresolved entities.
pub struct Generator<'a> {
    scope: &'a mut Scope,
}

impl<'a> Generator<'a> {
    pub fn new(scope: &'a mut Scope) -> Self {
        Self { scope }
    }

    /// Check one header.
    ///
    /// # Errors
    ///
    /// [`CompileError::UnsupportedFeature`] for every `include`: only a
    /// single self-contained document is ever compiled.
    pub fn process_header(&mut self, header: &Header) -> Result<()> {
        match header {
            Header::Include(include) => Err(CompileError::UnsupportedFeature {
                path: include.path.clone(),
                span: include.span,
            }),
            Header::Namespace(_) => Ok(()),
        }
    }

    /// Create and declare the entity for one definition.
    pub fn process(&mut self, definition: &Definition) -> Result<EntityId> {
        let name = definition.name();
        let span = definition.span();
        check_name(name, span)?;

        let kind = match definition {
            Definition::Const(c) => EntityKind::Const(ConstSpec {
                ty: type_spec(&c.ty),
                expr: const_value(&c.value),
                value: None,
            }),
            Definition::Typedef(t) => EntityKind::TypeAlias(AliasSpec {
                target: type_spec(&t.target),
            }),
            Definition::Enum(e) => EntityKind::Enum(enum_spec(e)?),
            Definition::Struct(s) => EntityKind::Struct(struct_spec(s)?),
            Definition::Union(s) => EntityKind::Union(struct_spec(s)?),
            Definition::Exception(s) => EntityKind::Exception(struct_spec(s)?),
            Definition::Service(s) => EntityKind::Service(service_spec(s)?),
        };

        let id = self.scope.declare(name, span, kind)?;
        trace!(%name, kind = %definition.kind(), %id, "entity generated");
        Ok(id)
    }
}

/// Names must be non-empty and may not contain `.`, which separates an
/// enum from its item in constant references.
fn check_name(name: &str, span: Span) -> Result<()> {
    if name.is_empty() {
        return Err(CompileError::invalid(name, span, "name must not be empty"));
    }
    if name.contains('.') {
        return Err(CompileError::invalid(
            name,
            span,
            "name must not contain '.'",
        ));
    }
    Ok(())
}

pub(crate) fn type_spec(expr: &TypeExpr) -> TypeSpec {
    match expr {
        TypeExpr::Primitive(p) => TypeSpec::Primitive(*p),
        TypeExpr::List(inner) => TypeSpec::list(type_spec(inner)),
        TypeExpr::Set(inner) => TypeSpec::set(type_spec(inner)),
        TypeExpr::Map { key, value } => TypeSpec::map(type_spec(key), type_spec(value)),
        TypeExpr::Named(named) => TypeSpec::Named(Reference::new(&named.name, named.span)),
    }
}

pub(crate) fn const_value(expr: &ConstExpr) -> ConstValue {
    match expr {
        ConstExpr::Bool(v) => ConstValue::Bool(*v),
        ConstExpr::Int(v) => ConstValue::Int(*v),
        ConstExpr::Double(v) => ConstValue::Double(*v),
        ConstExpr::String(v) => ConstValue::String(v.clone()),
        ConstExpr::List(items) => ConstValue::List(items.iter().map(const_value).collect()),
        ConstExpr::Map(pairs) => ConstValue::Map(
            pairs
                .iter()
                .map(|(k, v)| (const_value(k), const_value(v)))
                .collect(),
        ),
        ConstExpr::Reference(symbol) => {
            ConstValue::Reference(Reference::new(&symbol.name, symbol.span))
        }
    }
}

/// Assign item values: explicit values stick, implicit ones continue from
/// the previous item.
fn enum_spec(decl: &EnumDecl) -> Result<EnumSpec> {
    let mut items = Vec::with_capacity(decl.items.len());
    let mut seen: HashMap<&str, Span> = HashMap::new();
    let mut next: i64 = 0;

    for item in &decl.items {
        let qualified = format!("{}.{}", decl.name, item.name);
        check_name(&item.name, item.span).map_err(|_| {
            CompileError::invalid(&qualified, item.span, "enum item name must be a plain identifier")
        })?;

        if let Some(first) = seen.insert(&item.name, item.span) {
            return Err(CompileError::DuplicateSymbol {
                name: qualified,
                span: item.span,
                first,
            });
        }

        let value = match item.value {
            Some(explicit) => explicit,
            None => i32::try_from(next).map_err(|_| {
                CompileError::invalid(&qualified, item.span, "implicit enum value overflows i32")
            })?,
        };
        next = value as i64 + 1;

        items.push(EnumItemSpec {
            name: item.name.clone(),
            value,
            span: item.span,
        });
    }

    Ok(EnumSpec { items })
}

fn struct_spec(decl: &StructDecl) -> Result<StructSpec> {
    Ok(StructSpec {
        fields: field_specs(&decl.name, &decl.fields)?,
    })
}

/// Convert fields, handing out implicit negative ids (-1, -2, ...) to
/// fields declared without one.
fn field_specs(owner: &str, fields: &[Field]) -> Result<Vec<FieldSpec>> {
    let mut implicit: i16 = 0;
    fields
        .iter()
        .map(|field| {
            if field.name.is_empty() {
                return Err(CompileError::invalid(
                    owner,
                    field.span,
                    "field name must not be empty",
                ));
            }
            let id = match field.id {
                Some(id) => id,
                None => {
                    implicit = implicit.checked_sub(1).ok_or_else(|| {
                        CompileError::invalid(owner, field.span, "too many fields without an id")
                    })?;
                    implicit
                }
            };
            Ok(FieldSpec {
                id,
                name: field.name.clone(),
                ty: type_spec(&field.ty),
                requiredness: field.requiredness,
                default: field.default.as_ref().map(const_value),
                default_value: None,
                span: field.span,
            })
        })
        .collect()
}

fn function_spec(service: &str, decl: &FunctionDecl) -> Result<FunctionSpec> {
    if decl.name.is_empty() {
        return Err(CompileError::invalid(
            service,
            decl.span,
            "function name must not be empty",
        ));
    }
    let owner = format!("{}.{}", service, decl.name);
    Ok(FunctionSpec {
        name: decl.name.clone(),
        parameters: field_specs(&owner, &decl.parameters)?,
        return_type: decl.return_type.as_ref().map(type_spec),
        exceptions: field_specs(&owner, &decl.exceptions)?,
        oneway: decl.oneway,
        span: decl.span,
    })
}

fn service_spec(decl: &ServiceDecl) -> Result<ServiceSpec> {
    let functions = decl
        .functions
        .iter()
        .map(|function| function_spec(&decl.name, function))
        .collect::<Result<Vec<_>>>()?;

    Ok(ServiceSpec {
        functions,
        parent: decl
            .extends
            .as_ref()
            .map(|parent| Reference::new(&parent.name, parent.span)),
        methods: Vec::new(),
    })
}
