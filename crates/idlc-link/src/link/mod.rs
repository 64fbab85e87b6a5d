//! Reference resolution: the three linker passes.
//!
//! ```text
//! Generate → [constants] → [types] → [services]
//! ```
//!
//! The order is fixed. Type definitions embed default values that may
//! reference constants, so constants resolve first; service signatures
//! reference types (exceptions in particular), so types resolve before
//! services. A pass never revisits an earlier pass's entity kinds.
//!
//! Each pass is a [`LinkPass`] run by the same driver in two sweeps over
//! its entities:
//!
//! 1. **link** - bind every symbolic reference to an [`EntityId`] handle.
//!    Only the target's identity is needed, so mutually recursive types
//!    link without forcing each other's resolution.
//! 2. **validate** - kind-specific checks and evaluation of constant
//!    expressions. Value-level chains (constants, typedefs, `extends`) are
//!    walked with an explicit visited list and fail with
//!    [`CompileError::CircularDefinition`] instead of recursing forever.
//!
//! Entities are marked resolved once both sweeps succeed.

mod consts;
mod eval;
mod services;
mod types;

use crate::entity::{ConstTarget, ConstValue, EntityId, EntityTag, TypeSpec};
use crate::error::{CompileError, Result, Warning};
use crate::scope::Scope;
use tracing::{debug, trace};

pub(crate) use consts::ConstPass;
pub(crate) use services::ServicePass;
pub(crate) use types::TypePass;

/// One linker pass, parameterized by the entity kinds it owns.
pub(crate) trait LinkPass {
    /// Name used in logs.
    const NAME: &'static str;

    /// Whether this pass resolves entities carrying `tag`.
    fn handles(tag: EntityTag) -> bool;

    /// Bind the symbolic references held by entity `id`.
    fn link(&mut self, scope: &mut Scope, id: EntityId) -> Result<()>;

    /// Validate entity `id` once every entity of this pass is linked.
    fn validate(&mut self, scope: &mut Scope, id: EntityId) -> Result<()>;
}

/// Run one pass over every entity it handles.
pub(crate) fn run_pass<P: LinkPass>(scope: &mut Scope, pass: &mut P) -> Result<()> {
    let ids: Vec<EntityId> = scope
        .iter()
        .filter(|(_, entity)| P::handles(entity.tag()))
        .map(|(id, _)| id)
        .collect();

    debug!(pass = P::NAME, entities = ids.len(), "linker pass starting");

    for &id in &ids {
        pass.link(scope, id)?;
        trace!(pass = P::NAME, entity = scope.entity(id).name(), "linked");
    }
    for &id in &ids {
        pass.validate(scope, id)?;
    }
    for &id in &ids {
        scope.entity_mut(id).mark_resolved();
    }

    debug!(pass = P::NAME, "linker pass complete");
    Ok(())
}

/// Resolve every entity in the scope: constants, then types, then services.
///
/// Returns the non-fatal warnings collected along the way.
pub fn link_all(scope: &mut Scope) -> Result<Vec<Warning>> {
    run_pass(scope, &mut ConstPass::default())?;
    run_pass(scope, &mut TypePass)?;

    let mut services = ServicePass::default();
    run_pass(scope, &mut services)?;

    debug_assert!(scope.iter().all(|(_, entity)| entity.is_resolved()));
    Ok(services.into_warnings())
}

/// Bind every named reference in `spec` to a type-shaped entity.
///
/// # Errors
///
/// - [`CompileError::UnknownSymbol`] for names missing from the scope
/// - [`CompileError::TypeMismatch`] for names that denote a constant or a
///   service
pub(crate) fn bind_type(scope: &Scope, spec: &mut TypeSpec, referrer: &str) -> Result<()> {
    spec.try_for_each_named_mut(&mut |reference| {
        let id = scope.lookup(reference.name(), reference.span(), referrer)?;
        let tag = scope.entity(id).tag();
        if !tag.is_type() {
            return Err(CompileError::mismatch(
                referrer,
                reference.span(),
                format!("'{}' is a {}, expected a type", reference.name(), tag),
            ));
        }
        reference.bind(id);
        Ok(())
    })
}

/// Bind every reference in a constant expression to a constant or an enum
/// item.
///
/// `NAME` is looked up as a constant first; `Enum.ITEM` falls back to an
/// item of the enum `Enum`.
pub(crate) fn bind_const(scope: &Scope, value: &mut ConstValue, referrer: &str) -> Result<()> {
    value.try_for_each_reference_mut(&mut |reference| {
        let name = reference.name();
        let span = reference.span();

        if let Some(id) = scope.get(name) {
            let tag = scope.entity(id).tag();
            if tag != EntityTag::Const {
                return Err(CompileError::mismatch(
                    referrer,
                    span,
                    format!("'{name}' is a {tag}, expected a constant or enum item"),
                ));
            }
            reference.bind(ConstTarget::Const(id));
            return Ok(());
        }

        let unknown = || CompileError::UnknownSymbol {
            name: name.to_string(),
            referrer: referrer.to_string(),
            span,
        };

        let (enum_name, item_name) = name.rsplit_once('.').ok_or_else(unknown)?;
        let enum_id = scope.get(enum_name).ok_or_else(unknown)?;
        let item = scope
            .entity(enum_id)
            .as_enum()
            .and_then(|spec| spec.item(item_name))
            .ok_or_else(unknown)?;

        let target = ConstTarget::EnumItem {
            enum_id,
            value: item.value,
        };
        reference.bind(target);
        Ok(())
    })
}

#[cfg(test)]
mod tests;
