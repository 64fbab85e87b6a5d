//! Generated type and service descriptors.
//!
//! Descriptors are thin views over the resolved scope: they borrow it and
//! hold a handle, so handing one out costs nothing and the scope stays the
//! single owner of every entity.

use crate::codec;
use crate::error::ValueError;
use idlc_link::{
    EntityId, EntityTag, EnumItemSpec, FieldSpec, FunctionSpec, Scope, StructSpec, StructValue,
    TypeSpec, Value,
};

/// Descriptor of any generated type.
#[derive(Debug, Clone, Copy)]
pub enum TypeDescriptor<'a> {
    Struct(StructDescriptor<'a>),
    Enum(EnumDescriptor<'a>),
}

impl<'a> TypeDescriptor<'a> {
    pub fn name(&self) -> &'a str {
        match self {
            TypeDescriptor::Struct(s) => s.name(),
            TypeDescriptor::Enum(e) => e.name(),
        }
    }
}

/// A struct, union or exception.
#[derive(Debug, Clone, Copy)]
pub struct StructDescriptor<'a> {
    scope: &'a Scope,
    id: EntityId,
    spec: &'a StructSpec,
}

impl<'a> StructDescriptor<'a> {
    pub(crate) fn new(scope: &'a Scope, id: EntityId) -> Option<Self> {
        let spec = scope.entity(id).as_struct()?;
        Some(Self { scope, id, spec })
    }

    pub fn id(&self) -> EntityId {
        self.id
    }

    pub fn name(&self) -> &'a str {
        self.scope.entity(self.id).name()
    }

    /// Struct, union or exception.
    pub fn tag(&self) -> EntityTag {
        self.scope.entity(self.id).tag()
    }

    pub fn fields(&self) -> &'a [FieldSpec] {
        &self.spec.fields
    }

    pub fn field(&self, name: &str) -> Option<&'a FieldSpec> {
        self.spec.field(name)
    }

    /// Type reference usable with `serialize_as` and `deserialize`.
    pub fn type_spec(&self) -> TypeSpec {
        TypeSpec::Named(idlc_link::Reference::bound(
            self.name(),
            self.scope.entity(self.id).span(),
            self.id,
        ))
    }

    /// Build an instance from named field values.
    ///
    /// Absent fields with a default get the default. Each given value is
    /// checked against its field type.
    ///
    /// # Errors
    ///
    /// - [`ValueError::UnknownField`] for a name the type does not declare
    /// - [`ValueError::MissingField`] for an absent required field
    /// - [`ValueError::UnionArity`] unless a union ends up with exactly one field
    /// - any mismatch between a value and its field type
    pub fn construct<I, K>(&self, values: I) -> Result<Value, ValueError>
    where
        I: IntoIterator<Item = (K, Value)>,
        K: Into<String>,
    {
        let mut instance = StructValue::new(self.name());
        for (name, value) in values {
            let name = name.into();
            let Some(field) = self.field(&name) else {
                return Err(ValueError::UnknownField {
                    type_name: self.name().to_string(),
                    field: name,
                });
            };
            codec::to_wire(self.scope, &field.ty, &value)?;
            instance.fields.insert(name, value);
        }

        for field in self.fields() {
            if instance.fields.contains_key(&field.name) {
                continue;
            }
            if let Some(default) = &field.default_value {
                instance.fields.insert(field.name.clone(), default.clone());
            } else if field.is_required() {
                return Err(ValueError::MissingField {
                    type_name: self.name().to_string(),
                    field: field.name.clone(),
                });
            }
        }

        if self.tag() == EntityTag::Union && instance.fields.len() != 1 {
            return Err(ValueError::UnionArity {
                type_name: self.name().to_string(),
                count: instance.fields.len(),
            });
        }
        Ok(Value::Struct(instance))
    }
}

#[derive(Debug, Clone, Copy)]
pub struct EnumDescriptor<'a> {
    scope: &'a Scope,
    id: EntityId,
    items: &'a [EnumItemSpec],
}

impl<'a> EnumDescriptor<'a> {
    pub(crate) fn new(scope: &'a Scope, id: EntityId) -> Option<Self> {
        let spec = scope.entity(id).as_enum()?;
        Some(Self {
            scope,
            id,
            items: &spec.items,
        })
    }

    pub fn name(&self) -> &'a str {
        self.scope.entity(self.id).name()
    }

    pub fn items(&self) -> &'a [EnumItemSpec] {
        self.items
    }

    /// Value of the item called `item`.
    pub fn value_of(&self, item: &str) -> Option<Value> {
        self.items
            .iter()
            .find(|candidate| candidate.name == item)
            .map(|found| Value::enum_value(self.name(), found.value))
    }

    /// Name of the item with numeric value `value`.
    pub fn name_of(&self, value: i32) -> Option<&'a str> {
        self.items
            .iter()
            .find(|item| item.value == value)
            .map(|item| item.name.as_str())
    }
}

/// A service with its effective method set.
#[derive(Debug, Clone, Copy)]
pub struct ServiceDescriptor<'a> {
    scope: &'a Scope,
    id: EntityId,
}

impl<'a> ServiceDescriptor<'a> {
    pub(crate) fn new(scope: &'a Scope, id: EntityId) -> Option<Self> {
        scope.entity(id).as_service()?;
        Some(Self { scope, id })
    }

    pub fn name(&self) -> &'a str {
        self.scope.entity(self.id).name()
    }

    /// Service this one extends.
    pub fn parent(&self) -> Option<ServiceDescriptor<'a>> {
        let spec = self.scope.entity(self.id).as_service()?;
        let parent = spec.parent.as_ref()?.target()?;
        ServiceDescriptor::new(self.scope, parent)
    }

    /// Functions declared directly on this service.
    pub fn functions(&self) -> Vec<FunctionDescriptor<'a>> {
        let Some(spec) = self.scope.entity(self.id).as_service() else {
            return Vec::new();
        };
        spec.functions
            .iter()
            .map(|function| FunctionDescriptor {
                service: self.name(),
                spec: function,
            })
            .collect()
    }

    /// Effective methods: inherited ones not overridden here, then own.
    pub fn methods(&self) -> Vec<FunctionDescriptor<'a>> {
        let Some(spec) = self.scope.entity(self.id).as_service() else {
            return Vec::new();
        };
        spec.methods
            .iter()
            .filter_map(|method| {
                let owner = self.scope.entity(method.service);
                let function = owner.as_service()?.functions.get(method.index)?;
                Some(FunctionDescriptor {
                    service: owner.name(),
                    spec: function,
                })
            })
            .collect()
    }

    pub fn method(&self, name: &str) -> Option<FunctionDescriptor<'a>> {
        self.methods().into_iter().find(|method| method.name() == name)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct FunctionDescriptor<'a> {
    service: &'a str,
    spec: &'a FunctionSpec,
}

impl<'a> FunctionDescriptor<'a> {
    pub fn name(&self) -> &'a str {
        &self.spec.name
    }

    /// Service that declares the function.
    pub fn declared_in(&self) -> &'a str {
        self.service
    }

    pub fn parameters(&self) -> &'a [FieldSpec] {
        &self.spec.parameters
    }

    /// `None` for void functions.
    pub fn return_type(&self) -> Option<&'a TypeSpec> {
        self.spec.return_type.as_ref()
    }

    pub fn exceptions(&self) -> &'a [FieldSpec] {
        &self.spec.exceptions
    }

    pub fn is_oneway(&self) -> bool {
        self.spec.oneway
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use idlc_ast::{
        ConstExpr, Definition, Document, EnumDecl, Field, FunctionDecl, PrimitiveType,
        ServiceDecl, Span, StructDecl, TypeExpr,
    };

    fn scope() -> Scope {
        let document = Document::new()
            .with_definition(EnumDecl::new("Level").item("LOW", None).item("HIGH", Some(10)))
            .with_definition(Definition::Struct(
                StructDecl::new("Settings")
                    .field(Field::new(1, "name", PrimitiveType::String).required())
                    .field(
                        Field::new(2, "retries", PrimitiveType::I32)
                            .with_default(ConstExpr::Int(3)),
                    )
                    .field(Field::new(3, "note", PrimitiveType::String).optional()),
            ))
            .with_definition(Definition::Union(
                StructDecl::new("Either")
                    .field(Field::new(1, "left", PrimitiveType::I32))
                    .field(Field::new(2, "right", PrimitiveType::String)),
            ))
            .with_definition(
                ServiceDecl::new("Base")
                    .function(FunctionDecl::new("ping"))
                    .function(FunctionDecl::new("level").returns(TypeExpr::named("Level", Span::line(9)))),
            )
            .with_definition(
                ServiceDecl::new("Child")
                    .extends("Base", Span::line(11))
                    .function(FunctionDecl::new("ping").oneway()),
            );
        idlc_link::compile("descriptors", &document).unwrap().scope
    }

    fn struct_descriptor<'a>(scope: &'a Scope, name: &str) -> StructDescriptor<'a> {
        StructDescriptor::new(scope, scope.get(name).unwrap()).unwrap()
    }

    #[test]
    fn test_construct_fills_defaults() {
        let scope = scope();
        let settings = struct_descriptor(&scope, "Settings");

        let value = settings
            .construct([("name", Value::String("main".into()))])
            .unwrap();
        let expected: Value = StructValue::new("Settings")
            .with("name", Value::String("main".into()))
            .with("retries", Value::I32(3))
            .into();
        assert_eq!(value, expected);
    }

    #[test]
    fn test_construct_checks_fields() {
        let scope = scope();
        let settings = struct_descriptor(&scope, "Settings");

        assert!(matches!(
            settings.construct(Vec::<(String, Value)>::new()),
            Err(ValueError::MissingField { field, .. }) if field == "name"
        ));
        assert!(matches!(
            settings.construct([("colour", Value::I32(1))]),
            Err(ValueError::UnknownField { field, .. }) if field == "colour"
        ));
        assert!(matches!(
            settings.construct([("name", Value::I32(1))]),
            Err(ValueError::Mismatch { .. })
        ));
    }

    #[test]
    fn test_construct_union() {
        let scope = scope();
        let either = struct_descriptor(&scope, "Either");
        assert_eq!(either.tag(), EntityTag::Union);

        assert!(either.construct([("left", Value::I32(1))]).is_ok());
        assert!(matches!(
            either.construct(Vec::<(&str, Value)>::new()),
            Err(ValueError::UnionArity { count: 0, .. })
        ));
    }

    #[test]
    fn test_enum_lookup_both_ways() {
        let scope = scope();
        let level = EnumDescriptor::new(&scope, scope.get("Level").unwrap()).unwrap();

        assert_eq!(level.value_of("HIGH"), Some(Value::enum_value("Level", 10)));
        assert_eq!(level.name_of(0), Some("LOW"));
        assert_eq!(level.name_of(5), None);
        assert_eq!(level.items().len(), 2);
    }

    #[test]
    fn test_service_methods() {
        let scope = scope();
        let child = ServiceDescriptor::new(&scope, scope.get("Child").unwrap()).unwrap();

        assert_eq!(child.parent().map(|p| p.name()), Some("Base"));
        let methods: Vec<(&str, &str)> = child
            .methods()
            .iter()
            .map(|m| (m.declared_in(), m.name()))
            .collect();
        assert_eq!(methods, vec![("Base", "level"), ("Child", "ping")]);

        let ping = child.method("ping").unwrap();
        assert!(ping.is_oneway());
        assert!(ping.return_type().is_none());
        assert_eq!(child.functions().len(), 1);
    }

    #[test]
    fn test_descriptor_kind_checks() {
        let scope = scope();
        let level = scope.get("Level").unwrap();
        assert!(StructDescriptor::new(&scope, level).is_none());
        assert!(ServiceDescriptor::new(&scope, level).is_none());
    }
}
