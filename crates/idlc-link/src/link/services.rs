//! Service pass.
//!
//! Binds parent services and function signatures, checks declared
//! exceptions, and computes each service's effective method set. A child
//! finalizes its methods only after its parent has; the `extends` chain is
//! walked with an explicit stack so `A extends B`, `B extends A` fails
//! cleanly.

use super::types::{apply_defaults, bind_fields, check_fields, evaluate_defaults};
use super::{bind_type, LinkPass};
use crate::entity::{EntityId, EntityKind, EntityTag, FunctionSpec, MethodRef};
use crate::error::{CompileError, Result, Warning};
use crate::scope::{Dealiased, Scope};
use std::collections::HashMap;
use tracing::warn;

#[derive(Debug, Default)]
pub(crate) struct ServicePass {
    /// Effective method sets computed so far
    methods: HashMap<EntityId, Vec<MethodRef>>,
    /// Services whose method set is being computed, outermost first
    stack: Vec<EntityId>,
    warnings: Vec<Warning>,
}

impl ServicePass {
    pub(crate) fn into_warnings(self) -> Vec<Warning> {
        self.warnings
    }

    /// Parent's effective methods minus the ones overridden here, followed
    /// by this service's own functions.
    fn effective_methods(&mut self, scope: &Scope, id: EntityId) -> Result<Vec<MethodRef>> {
        if let Some(methods) = self.methods.get(&id) {
            return Ok(methods.clone());
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

        let Some(spec) = entity.as_service() else {
            return Ok(Vec::new());
        };

        self.stack.push(id);
        let inherited = match spec.parent.as_ref().and_then(|parent| parent.target()) {
            Some(parent) => self.effective_methods(scope, parent),
            None => Ok(Vec::new()),
        };
        self.stack.pop();
        let inherited = inherited?;

        let mut methods = Vec::with_capacity(inherited.len() + spec.functions.len());
        for method in inherited {
            let function = function_at(scope, method);
            match function.and_then(|f| spec.function(&f.name).map(|own| (f, own))) {
                Some((overridden, own)) => {
                    let owner = scope.entity(method.service).name();
                    let message = format!(
                        "method '{}' of service '{}' overrides the one inherited from '{}'",
                        own.name,
                        entity.name(),
                        owner
                    );
                    warn!(service = entity.name(), method = %overridden.name, parent = owner, "inherited method overridden");
                    self.warnings.push(Warning {
                        message,
                        span: own.span,
                    });
                }
                None => methods.push(method),
            }
        }
        methods.extend((0..spec.functions.len()).map(|index| MethodRef { service: id, index }));

        self.methods.insert(id, methods.clone());
        Ok(methods)
    }
}

impl LinkPass for ServicePass {
    const NAME: &'static str = "services";

    fn handles(tag: EntityTag) -> bool {
        tag == EntityTag::Service
    }

    fn link(&mut self, scope: &mut Scope, id: EntityId) -> Result<()> {
        let entity = scope.entity(id);
        let name = entity.name().to_string();
        let EntityKind::Service(mut spec) = entity.kind().clone() else {
            return Ok(());
        };

        if let Some(parent) = &mut spec.parent {
            let target = scope.lookup(parent.name(), parent.span(), &name)?;
            let tag = scope.entity(target).tag();
            if tag != EntityTag::Service {
                return Err(CompileError::mismatch(
                    &name,
                    parent.span(),
                    format!("'{}' is a {}, services can only extend services", parent.name(), tag),
                ));
            }
            parent.bind(target);
        }

        for function in &mut spec.functions {
            let owner = format!("{}.{}", name, function.name);
            bind_fields(scope, &owner, &mut function.parameters)?;
            if let Some(return_type) = &mut function.return_type {
                bind_type(scope, return_type, &owner)?;
            }
            bind_fields(scope, &owner, &mut function.exceptions)?;

            for exception in &function.exceptions {
                match scope.dealias(&exception.ty, &owner)? {
                    Dealiased::Entity(_, EntityTag::Exception) => {}
                    _ => {
                        return Err(CompileError::mismatch(
                            &format!("{}.{}", owner, exception.name),
                            exception.span,
                            format!("'{}' is not an exception type", exception.ty),
                        ))
                    }
                }
            }
        }

        scope.entity_mut(id).replace_kind(EntityKind::Service(spec));
        Ok(())
    }

    fn validate(&mut self, scope: &mut Scope, id: EntityId) -> Result<()> {
        let entity = scope.entity(id);
        let name = entity.name().to_string();
        let EntityKind::Service(mut spec) = entity.kind().clone() else {
            return Ok(());
        };

        check_function_names(&name, &spec.functions)?;

        let mut defaults = Vec::with_capacity(spec.functions.len());
        for function in &spec.functions {
            let owner = format!("{}.{}", name, function.name);
            check_function(&owner, function)?;
            defaults.push(evaluate_defaults(scope, &owner, &function.parameters)?);
        }
        for (function, defaults) in spec.functions.iter_mut().zip(defaults) {
            apply_defaults(&mut function.parameters, defaults);
        }

        spec.methods = self.effective_methods(scope, id)?;
        scope.entity_mut(id).replace_kind(EntityKind::Service(spec));
        Ok(())
    }
}

fn check_function_names(service: &str, functions: &[FunctionSpec]) -> Result<()> {
    let mut seen = HashMap::new();
    for function in functions {
        if let Some(first) = seen.insert(function.name.as_str(), function.span) {
            return Err(CompileError::DuplicateSymbol {
                name: format!("{}.{}", service, function.name),
                span: function.span,
                first,
            });
        }
    }
    Ok(())
}

fn check_function(owner: &str, function: &FunctionSpec) -> Result<()> {
    check_fields(owner, &function.parameters)?;
    check_fields(owner, &function.exceptions)?;

    if function.oneway {
        if function.return_type.is_some() {
            return Err(CompileError::invalid(
                owner,
                function.span,
                "oneway functions must return void",
            ));
        }
        if !function.exceptions.is_empty() {
            return Err(CompileError::invalid(
                owner,
                function.span,
                "oneway functions cannot declare exceptions",
            ));
        }
    }
    Ok(())
}

fn function_at(scope: &Scope, method: MethodRef) -> Option<&FunctionSpec> {
    scope
        .entity(method.service)
        .as_service()
        .and_then(|spec| spec.functions.get(method.index))
}
