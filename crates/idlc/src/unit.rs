//! Compiled units.
//!
//! A [`CompiledUnit`] is the resolved scope bundled with the protocol it
//! serializes through. It is assembled only after every linker pass has
//! succeeded and is immutable afterwards.

use crate::codec;
use crate::descriptor::{EnumDescriptor, ServiceDescriptor, StructDescriptor, TypeDescriptor};
use crate::error::{ConfigError, ValueError};
use crate::protocol::Protocol;
use idlc_link::{EntityTag, Linked, Scope, TypeSpec, Value, Warning};
use std::fmt;
use std::sync::Arc;
use tracing::debug;

pub struct CompiledUnit {
    scope: Scope,
    warnings: Vec<Warning>,
    protocol: Arc<dyn Protocol>,
}

impl fmt::Debug for CompiledUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompiledUnit")
            .field("name", &self.scope.name())
            .field("entities", &self.scope.len())
            .field("warnings", &self.warnings.len())
            .field("protocol", &self.protocol.name())
            .finish()
    }
}

/// Bind a linked scope to its protocol.
///
/// Linking has already succeeded at this point; the only failure left is a
/// missing protocol.
pub(crate) fn assemble(
    linked: Linked,
    protocol: Option<Arc<dyn Protocol>>,
) -> Result<CompiledUnit, ConfigError> {
    let protocol = protocol.ok_or(ConfigError::MissingProtocol)?;
    debug!(unit = linked.scope.name(), protocol = protocol.name(), "assembling compiled unit");
    Ok(CompiledUnit {
        scope: linked.scope,
        warnings: linked.warnings,
        protocol,
    })
}

impl CompiledUnit {
    pub fn name(&self) -> &str {
        self.scope.name()
    }

    /// The resolved scope.
    pub fn scope(&self) -> &Scope {
        &self.scope
    }

    /// Non-fatal diagnostics produced while linking.
    pub fn warnings(&self) -> &[Warning] {
        &self.warnings
    }

    pub fn protocol(&self) -> &dyn Protocol {
        self.protocol.as_ref()
    }

    /// Evaluated value of constant `name`.
    pub fn constant(&self, name: &str) -> Option<&Value> {
        self.scope.by_name(name)?.as_const()?.value.as_ref()
    }

    /// Type reference to the type called `name`, for use with
    /// [`serialize_as`](Self::serialize_as) and [`deserialize`](Self::deserialize).
    pub fn type_spec(&self, name: &str) -> Option<TypeSpec> {
        codec::named_type(&self.scope, name).ok()
    }

    pub fn struct_type(&self, name: &str) -> Option<StructDescriptor<'_>> {
        StructDescriptor::new(&self.scope, self.scope.get(name)?)
    }

    pub fn enum_type(&self, name: &str) -> Option<EnumDescriptor<'_>> {
        EnumDescriptor::new(&self.scope, self.scope.get(name)?)
    }

    pub fn service(&self, name: &str) -> Option<ServiceDescriptor<'_>> {
        ServiceDescriptor::new(&self.scope, self.scope.get(name)?)
    }

    /// Descriptors of every enum, struct, union and exception, in
    /// declaration order.
    pub fn types(&self) -> impl Iterator<Item = TypeDescriptor<'_>> + '_ {
        self.scope.iter().filter_map(|(id, entity)| match entity.tag() {
            EntityTag::Enum => EnumDescriptor::new(&self.scope, id).map(TypeDescriptor::Enum),
            tag if tag.is_struct_like() => {
                StructDescriptor::new(&self.scope, id).map(TypeDescriptor::Struct)
            }
            _ => None,
        })
    }

    pub fn services(&self) -> impl Iterator<Item = ServiceDescriptor<'_>> + '_ {
        self.scope
            .all(EntityTag::Service)
            .filter_map(|(id, _)| ServiceDescriptor::new(&self.scope, id))
    }

    /// Encode `value`, inferring its type from the value itself.
    ///
    /// # Errors
    ///
    /// [`ValueError::CannotInfer`] for empty containers; use
    /// [`serialize_as`](Self::serialize_as) for those.
    pub fn serialize(&self, value: &Value) -> Result<Vec<u8>, ValueError> {
        let ty = codec::infer_type(&self.scope, value)?;
        self.serialize_as(&ty, value)
    }

    /// Encode `value` as a value of type `ty`.
    pub fn serialize_as(&self, ty: &TypeSpec, value: &Value) -> Result<Vec<u8>, ValueError> {
        let wire = codec::to_wire(&self.scope, ty, value)?;
        Ok(self.protocol.serialize(&wire)?)
    }

    /// Decode `bytes` as a value of type `ty`.
    pub fn deserialize(&self, ty: &TypeSpec, bytes: &[u8]) -> Result<Value, ValueError> {
        let ttype = codec::ttype_of(&self.scope, ty)?;
        let wire = self.protocol.deserialize(ttype, bytes)?;
        codec::from_wire(&self.scope, ty, &wire)
    }
}
