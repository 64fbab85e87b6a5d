//! Per-compilation symbol table.
//!
//! The [`Scope`] is an arena: it owns every [`Entity`] of one document and
//! hands out [`EntityId`] handles. Names map to handles through an
//! insertion-ordered index, so iteration follows declaration order while
//! lookups stay exact-match and case-sensitive.
//!
//! # Examples
//!
//! ```
//! # use idlc_link::{Scope, EntityKind, EnumSpec, EntityTag};
//! # use idlc_ast::Span;
//! let mut scope = Scope::new("example");
//! let id = scope
//!     .declare("Color", Span::new(1, 1), EntityKind::Enum(EnumSpec { items: vec![] }))
//!     .unwrap();
//!
//! assert_eq!(scope.get("Color"), Some(id));
//! assert_eq!(scope.get("color"), None);
//! assert_eq!(scope.all(EntityTag::Enum).count(), 1);
//! ```

use crate::entity::{Entity, EntityId, EntityKind, EntityTag, Reference, TypeSpec};
use crate::error::{CompileError, Result};
use idlc_ast::Span;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Symbol table owning all entities of one compilation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scope {
    name: String,
    entities: Vec<Entity>,
    symbols: IndexMap<String, EntityId>,
}

/// A type with every typedef layer peeled off.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Dealiased<'a> {
    /// Primitive or container type
    Spec(&'a TypeSpec),
    /// Enum, struct, union or exception (or a non-type entity, which
    /// callers reject)
    Entity(EntityId, EntityTag),
}

impl Scope {
    /// Create an empty scope for the document `name`.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            entities: Vec::new(),
            symbols: IndexMap::new(),
        }
    }

    /// Name of the compiled document.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Register a new entity under `name`.
    ///
    /// # Errors
    ///
    /// [`CompileError::DuplicateSymbol`] if `name` is already declared,
    /// regardless of the kinds involved.
    pub fn declare(&mut self, name: &str, span: Span, kind: EntityKind) -> Result<EntityId> {
        if let Some(existing) = self.symbols.get(name) {
            return Err(CompileError::DuplicateSymbol {
                name: name.to_string(),
                span,
                first: self.entity(*existing).span(),
            });
        }

        let id = EntityId::try_from_index(self.entities.len()).ok_or_else(|| {
            CompileError::invalid(name, span, "too many definitions in one document")
        })?;
        self.entities.push(Entity::new(name.to_string(), span, kind));
        self.symbols.insert(name.to_string(), id);
        Ok(id)
    }

    /// Exact-match lookup without error reporting.
    pub fn get(&self, name: &str) -> Option<EntityId> {
        self.symbols.get(name).copied()
    }

    /// Look up `name` on behalf of `referrer`.
    ///
    /// # Errors
    ///
    /// [`CompileError::UnknownSymbol`] naming the symbol, the referrer and
    /// the location of the reference.
    pub fn lookup(&self, name: &str, span: Span, referrer: &str) -> Result<EntityId> {
        self.get(name).ok_or_else(|| CompileError::UnknownSymbol {
            name: name.to_string(),
            referrer: referrer.to_string(),
            span,
        })
    }

    /// Entity behind a handle issued by this scope.
    ///
    /// # Panics
    ///
    /// Panics if `id` was issued by a different scope. Use
    /// [`try_entity`](Self::try_entity) for handles of unknown origin.
    pub fn entity(&self, id: EntityId) -> &Entity {
        &self.entities[id.index()]
    }

    /// Entity behind `id`, or `None` if this scope never issued it.
    pub fn try_entity(&self, id: EntityId) -> Option<&Entity> {
        self.entities.get(id.index())
    }

    pub(crate) fn entity_mut(&mut self, id: EntityId) -> &mut Entity {
        &mut self.entities[id.index()]
    }

    /// Entity declared under `name`.
    pub fn by_name(&self, name: &str) -> Option<&Entity> {
        self.get(name).map(|id| self.entity(id))
    }

    /// All entities in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (EntityId, &Entity)> + '_ {
        self.symbols
            .values()
            .map(move |&id| (id, &self.entities[id.index()]))
    }

    /// Entities of one kind, lazily and in declaration order.
    pub fn all(&self, tag: EntityTag) -> impl Iterator<Item = (EntityId, &Entity)> + '_ {
        self.iter().filter(move |(_, entity)| entity.tag() == tag)
    }

    /// Target of a type reference.
    ///
    /// Bound references return their handle. Unbound ones are looked up by
    /// name, which lets earlier passes inspect types whose own pass has not
    /// run yet.
    ///
    /// A bound handle must name the same entity in this scope, so a type
    /// taken from another scope is reported as unknown.
    pub fn target_of(&self, reference: &Reference<EntityId>, referrer: &str) -> Result<EntityId> {
        match reference.target() {
            Some(id) if self.try_entity(id).is_some_and(|e| e.name() == reference.name()) => Ok(id),
            Some(_) => Err(CompileError::UnknownSymbol {
                name: reference.name().to_string(),
                referrer: referrer.to_string(),
                span: reference.span(),
            }),
            None => self.lookup(reference.name(), reference.span(), referrer),
        }
    }

    /// Peel typedef layers off `spec`.
    ///
    /// # Errors
    ///
    /// - [`CompileError::UnknownSymbol`] for an unbound name missing from the scope
    /// - [`CompileError::CircularDefinition`] for a typedef chain that never
    ///   reaches a type
    pub fn dealias<'a>(&'a self, spec: &'a TypeSpec, referrer: &str) -> Result<Dealiased<'a>> {
        self.follow_aliases(spec, referrer, Vec::new())
    }

    /// Peel typedef layers off the entity `id` itself.
    ///
    /// For a typedef this follows its target chain, reporting a cycle that
    /// starts and ends at `id`. Any other entity is returned unchanged.
    pub fn dealias_entity(&self, id: EntityId) -> Result<Dealiased<'_>> {
        let entity = self.entity(id);
        match entity.as_alias() {
            Some(alias) => self.follow_aliases(&alias.target, entity.name(), vec![id]),
            None => Ok(Dealiased::Entity(id, entity.tag())),
        }
    }

    fn follow_aliases<'a>(
        &'a self,
        mut spec: &'a TypeSpec,
        referrer: &str,
        mut chain: Vec<EntityId>,
    ) -> Result<Dealiased<'a>> {
        loop {
            let reference = match spec {
                TypeSpec::Named(reference) => reference,
                other => return Ok(Dealiased::Spec(other)),
            };

            let id = self.target_of(reference, referrer)?;
            let entity = self.entity(id);
            let Some(alias) = entity.as_alias() else {
                return Ok(Dealiased::Entity(id, entity.tag()));
            };

            if let Some(start) = chain.iter().position(|seen| *seen == id) {
                let mut names: Vec<String> = chain[start..]
                    .iter()
                    .map(|seen| self.entity(*seen).name().to_string())
                    .collect();
                names.push(entity.name().to_string());
                let first = self.entity(chain[start]);
                return Err(CompileError::CircularDefinition {
                    name: first.name().to_string(),
                    chain: names,
                    span: first.span(),
                });
            }

            chain.push(id);
            spec = &alias.target;
        }
    }
}
