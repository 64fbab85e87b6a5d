//! Constant pass.
//!
//! Binds each constant's declared type and value references, then evaluates
//! every constant to a typed [`Value`]. A constant defined in terms of
//! another is evaluated on demand; the evaluation stack doubles as the
//! visited list that catches `const i32 X = Y; const i32 Y = X;`.

use super::eval::{self, ConstSource};
use super::{bind_const, bind_type, LinkPass};
use crate::entity::{EntityId, EntityKind, EntityTag};
use crate::error::{CompileError, Result};
use crate::scope::Scope;
use crate::value::Value;
use std::collections::HashMap;

#[derive(Debug, Default)]
pub(crate) struct ConstPass {
    /// Constants evaluated so far
    values: HashMap<EntityId, Value>,
    /// Constants currently being evaluated, outermost first
    stack: Vec<EntityId>,
}

impl LinkPass for ConstPass {
    const NAME: &'static str = "constants";

    fn handles(tag: EntityTag) -> bool {
        tag == EntityTag::Const
    }

    fn link(&mut self, scope: &mut Scope, id: EntityId) -> Result<()> {
        let entity = scope.entity(id);
        let EntityKind::Const(mut spec) = entity.kind().clone() else {
            return Ok(());
        };
        let name = entity.name().to_string();

        bind_type(scope, &mut spec.ty, &name)?;
        bind_const(scope, &mut spec.expr, &name)?;

        scope.entity_mut(id).replace_kind(EntityKind::Const(spec));
        Ok(())
    }

    fn validate(&mut self, scope: &mut Scope, id: EntityId) -> Result<()> {
        let value = self.constant(scope, id)?;

        let entity = scope.entity(id);
        if let EntityKind::Const(mut spec) = entity.kind().clone() {
            spec.value = Some(value);
            scope.entity_mut(id).replace_kind(EntityKind::Const(spec));
        }
        Ok(())
    }
}

impl ConstSource for ConstPass {
    fn constant(&mut self, scope: &Scope, id: EntityId) -> Result<Value> {
        if let Some(value) = self.values.get(&id) {
            return Ok(value.clone());
        }

        let entity = scope.entity(id);
        if let Some(start) = self.stack.iter().position(|seen| *seen == id) {
            let mut chain: Vec<String> = self.stack[start..]
                .iter()
                .map(|seen| scope.entity(*seen).name().to_string())
                .collect();
            chain.push(entity.name().to_string());
            let first = scope.entity(self.stack[start]);
            return Err(CompileError::CircularDefinition {
                name: first.name().to_string(),
                chain,
                span: first.span(),
            });
        }

        let Some(spec) = entity.as_const() else {
            return Err(CompileError::mismatch(
                entity.name(),
                entity.span(),
                format!("'{}' is a {}, expected a constant", entity.name(), entity.tag()),
            ));
        };

        self.stack.push(id);
        let result = eval::evaluate(scope, &spec.ty, &spec.expr, self, entity.name(), entity.span());
        self.stack.pop();

        let value = result?;
        self.values.insert(id, value.clone());
        Ok(value)
    }
}
