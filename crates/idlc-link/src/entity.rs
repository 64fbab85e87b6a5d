//! Compiled entities and the references between them.
//!
//! An [`Entity`] is the compiled form of one named definition. Entities are
//! created unresolved by the [`Generator`](crate::Generator): every
//! reference they hold is a [`Reference`] carrying only a name and a span.
//! Exactly one linker pass binds each reference to an [`EntityId`] handle and
//! then marks the entity resolved. After that the entity is never mutated.
//!
//! Handles are indices into the owning [`Scope`](crate::Scope), never
//! copies of the target, so `struct A { 1: optional B b }` and
//! `struct B { 1: optional A a }` link to each other without either one
//! containing the other.

use crate::value::Value;
use idlc_ast::{PrimitiveType, Requiredness, Span};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Stable handle of an entity within its scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityId(u32);

impl EntityId {
    /// Handle for arena slot `index`, if it fits the handle width.
    pub(crate) fn try_from_index(index: usize) -> Option<Self> {
        u32::try_from(index).ok().map(Self)
    }

    /// Position of the entity in declaration order.
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Variant tag of an entity, available independently of its link state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityTag {
    Const,
    TypeAlias,
    Enum,
    Struct,
    Union,
    Exception,
    Service,
}

impl EntityTag {
    /// Whether entities of this kind may appear where a type is expected.
    pub fn is_type(self) -> bool {
        !matches!(self, EntityTag::Const | EntityTag::Service)
    }

    /// Whether this is a struct, union or exception.
    pub fn is_struct_like(self) -> bool {
        matches!(
            self,
            EntityTag::Struct | EntityTag::Union | EntityTag::Exception
        )
    }

    /// Noun used in diagnostics.
    pub fn describe(self) -> &'static str {
        match self {
            EntityTag::Const => "constant",
            EntityTag::TypeAlias => "typedef",
            EntityTag::Enum => "enum",
            EntityTag::Struct => "struct",
            EntityTag::Union => "union",
            EntityTag::Exception => "exception",
            EntityTag::Service => "service",
        }
    }
}

impl fmt::Display for EntityTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.describe())
    }
}

/// Link state of an entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LinkState {
    Unresolved,
    Resolved,
}

/// One compiled definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    name: String,
    span: Span,
    tag: EntityTag,
    state: LinkState,
    kind: EntityKind,
}

impl Entity {
    pub(crate) fn new(name: String, span: Span, kind: EntityKind) -> Self {
        Self {
            name,
            span,
            tag: kind.tag(),
            state: LinkState::Unresolved,
            kind,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn span(&self) -> Span {
        self.span
    }

    pub fn tag(&self) -> EntityTag {
        self.tag
    }

    pub fn kind(&self) -> &EntityKind {
        &self.kind
    }

    pub fn is_resolved(&self) -> bool {
        self.state == LinkState::Resolved
    }

    /// Replace the entity body with its linked form.
    pub(crate) fn replace_kind(&mut self, kind: EntityKind) {
        debug_assert!(
            !self.is_resolved(),
            "entity '{}' mutated after resolution",
            self.name
        );
        debug_assert_eq!(kind.tag(), self.tag);
        self.kind = kind;
    }

    /// Transition unresolved → resolved. Happens exactly once.
    pub(crate) fn mark_resolved(&mut self) {
        debug_assert!(
            !self.is_resolved(),
            "entity '{}' resolved twice",
            self.name
        );
        self.state = LinkState::Resolved;
    }

    pub fn as_const(&self) -> Option<&ConstSpec> {
        match &self.kind {
            EntityKind::Const(c) => Some(c),
            _ => None,
        }
    }

    pub fn as_alias(&self) -> Option<&AliasSpec> {
        match &self.kind {
            EntityKind::TypeAlias(a) => Some(a),
            _ => None,
        }
    }

    pub fn as_enum(&self) -> Option<&EnumSpec> {
        match &self.kind {
            EntityKind::Enum(e) => Some(e),
            _ => None,
        }
    }

    /// Body of a struct, union or exception.
    pub fn as_struct(&self) -> Option<&StructSpec> {
        match &self.kind {
            EntityKind::Struct(s) | EntityKind::Union(s) | EntityKind::Exception(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_service(&self) -> Option<&ServiceSpec> {
        match &self.kind {
            EntityKind::Service(s) => Some(s),
            _ => None,
        }
    }
}

/// Body of an entity, one variant per definition kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum EntityKind {
    Const(ConstSpec),
    TypeAlias(AliasSpec),
    Enum(EnumSpec),
    Struct(StructSpec),
    Union(StructSpec),
    Exception(StructSpec),
    Service(ServiceSpec),
}

impl EntityKind {
    pub fn tag(&self) -> EntityTag {
        match self {
            EntityKind::Const(_) => EntityTag::Const,
            EntityKind::TypeAlias(_) => EntityTag::TypeAlias,
            EntityKind::Enum(_) => EntityTag::Enum,
            EntityKind::Struct(_) => EntityTag::Struct,
            EntityKind::Union(_) => EntityTag::Union,
            EntityKind::Exception(_) => EntityTag::Exception,
            EntityKind::Service(_) => EntityTag::Service,
        }
    }
}

/// Symbolic reference, bound to a target during linking.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Reference<T> {
    name: String,
    span: Span,
    target: Option<T>,
}

impl<T: Copy> Reference<T> {
    pub fn new(name: impl Into<String>, span: Span) -> Self {
        Self {
            name: name.into(),
            span,
            target: None,
        }
    }

    /// Create an already-bound reference.
    pub fn bound(name: impl Into<String>, span: Span, target: T) -> Self {
        Self {
            name: name.into(),
            span,
            target: Some(target),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn span(&self) -> Span {
        self.span
    }

    /// Linked target, `None` while unresolved.
    pub fn target(&self) -> Option<T> {
        self.target
    }

    pub fn is_bound(&self) -> bool {
        self.target.is_some()
    }

    pub(crate) fn bind(&mut self, target: T) {
        debug_assert!(self.target.is_none(), "'{}' bound twice", self.name);
        self.target = Some(target);
    }
}

// --- Types ---

/// Compiled type description.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TypeSpec {
    Primitive(PrimitiveType),
    List(Box<TypeSpec>),
    Set(Box<TypeSpec>),
    Map(Box<TypeSpec>, Box<TypeSpec>),
    /// Enum, struct, union, exception or typedef
    Named(Reference<EntityId>),
}

impl TypeSpec {
    pub fn list(element: TypeSpec) -> Self {
        TypeSpec::List(Box::new(element))
    }

    pub fn set(element: TypeSpec) -> Self {
        TypeSpec::Set(Box::new(element))
    }

    pub fn map(key: TypeSpec, value: TypeSpec) -> Self {
        TypeSpec::Map(Box::new(key), Box::new(value))
    }

    /// Visit every named reference, innermost container elements first.
    pub(crate) fn try_for_each_named_mut<E>(
        &mut self,
        f: &mut impl FnMut(&mut Reference<EntityId>) -> Result<(), E>,
    ) -> Result<(), E> {
        match self {
            TypeSpec::Primitive(_) => Ok(()),
            TypeSpec::List(inner) | TypeSpec::Set(inner) => inner.try_for_each_named_mut(f),
            TypeSpec::Map(key, value) => {
                key.try_for_each_named_mut(f)?;
                value.try_for_each_named_mut(f)
            }
            TypeSpec::Named(reference) => f(reference),
        }
    }
}

impl From<PrimitiveType> for TypeSpec {
    fn from(primitive: PrimitiveType) -> Self {
        TypeSpec::Primitive(primitive)
    }
}

impl fmt::Display for TypeSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeSpec::Primitive(p) => write!(f, "{p}"),
            TypeSpec::List(inner) => write!(f, "list<{inner}>"),
            TypeSpec::Set(inner) => write!(f, "set<{inner}>"),
            TypeSpec::Map(key, value) => write!(f, "map<{key}, {value}>"),
            TypeSpec::Named(reference) => f.write_str(reference.name()),
        }
    }
}

// --- Constants ---

/// What a constant reference points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConstTarget {
    /// Another constant
    Const(EntityId),
    /// An item of an enum (`Enum.ITEM`)
    EnumItem { enum_id: EntityId, value: i32 },
}

/// Constant expression with linkable references.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConstValue {
    Bool(bool),
    Int(i64),
    Double(f64),
    String(String),
    List(Vec<ConstValue>),
    Map(Vec<(ConstValue, ConstValue)>),
    Reference(Reference<ConstTarget>),
}

impl ConstValue {
    /// Visit every reference in the expression.
    pub(crate) fn try_for_each_reference_mut<E>(
        &mut self,
        f: &mut impl FnMut(&mut Reference<ConstTarget>) -> Result<(), E>,
    ) -> Result<(), E> {
        match self {
            ConstValue::Bool(_)
            | ConstValue::Int(_)
            | ConstValue::Double(_)
            | ConstValue::String(_) => Ok(()),
            ConstValue::List(items) => items
                .iter_mut()
                .try_for_each(|item| item.try_for_each_reference_mut(f)),
            ConstValue::Map(pairs) => pairs.iter_mut().try_for_each(|(k, v)| {
                k.try_for_each_reference_mut(f)?;
                v.try_for_each_reference_mut(f)
            }),
            ConstValue::Reference(reference) => f(reference),
        }
    }
}

/// `const` definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConstSpec {
    pub ty: TypeSpec,
    pub expr: ConstValue,
    /// Evaluated value, set by the constant pass
    pub value: Option<Value>,
}

/// `typedef` definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AliasSpec {
    pub target: TypeSpec,
}

// --- Enums ---

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnumItemSpec {
    pub name: String,
    pub value: i32,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnumSpec {
    pub items: Vec<EnumItemSpec>,
}

impl EnumSpec {
    pub fn item(&self, name: &str) -> Option<&EnumItemSpec> {
        self.items.iter().find(|item| item.name == name)
    }

    /// First item carrying `value`.
    pub fn item_by_value(&self, value: i32) -> Option<&EnumItemSpec> {
        self.items.iter().find(|item| item.value == value)
    }
}

// --- Structs / Unions / Exceptions ---

/// Field of a struct-like type, or a function parameter or declared
/// exception.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldSpec {
    pub id: i16,
    pub name: String,
    pub ty: TypeSpec,
    pub requiredness: Requiredness,
    pub default: Option<ConstValue>,
    /// Evaluated default, set by the pass that resolves the owner
    pub default_value: Option<Value>,
    pub span: Span,
}

impl FieldSpec {
    pub fn is_required(&self) -> bool {
        self.requiredness == Requiredness::Required
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StructSpec {
    pub fields: Vec<FieldSpec>,
}

impl StructSpec {
    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|field| field.name == name)
    }

    pub fn field_by_id(&self, id: i16) -> Option<&FieldSpec> {
        self.fields.iter().find(|field| field.id == id)
    }
}

// --- Services ---

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionSpec {
    pub name: String,
    pub parameters: Vec<FieldSpec>,
    /// `None` for `void`
    pub return_type: Option<TypeSpec>,
    pub exceptions: Vec<FieldSpec>,
    pub oneway: bool,
    pub span: Span,
}

/// Handle to a function declared on some service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MethodRef {
    pub service: EntityId,
    pub index: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceSpec {
    /// Functions declared on this service, in source order
    pub functions: Vec<FunctionSpec>,
    pub parent: Option<Reference<EntityId>>,
    /// Effective method set: inherited methods not overridden here,
    /// followed by this service's own functions. Set by the service pass.
    pub methods: Vec<MethodRef>,
}

impl ServiceSpec {
    pub fn function(&self, name: &str) -> Option<&FunctionSpec> {
        self.functions.iter().find(|function| function.name == name)
    }
}
