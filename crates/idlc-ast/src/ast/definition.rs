//! Top-level definitions.
//!
//! Every definition carries its own name and span. Builders on each
//! declaration type exist mainly so tests and tools can assemble documents
//! without a parser.

use super::expr::{ConstExpr, TypeExpr};
use crate::foundation::Span;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A named top-level definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Definition {
    Const(ConstDecl),
    Typedef(TypedefDecl),
    Enum(EnumDecl),
    Struct(StructDecl),
    Union(StructDecl),
    Exception(StructDecl),
    Service(ServiceDecl),
}

/// Discriminant of [`Definition`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DefinitionKind {
    Const,
    Typedef,
    Enum,
    Struct,
    Union,
    Exception,
    Service,
}

impl fmt::Display for DefinitionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let keyword = match self {
            DefinitionKind::Const => "const",
            DefinitionKind::Typedef => "typedef",
            DefinitionKind::Enum => "enum",
            DefinitionKind::Struct => "struct",
            DefinitionKind::Union => "union",
            DefinitionKind::Exception => "exception",
            DefinitionKind::Service => "service",
        };
        f.write_str(keyword)
    }
}

impl Definition {
    /// Name under which the definition is declared.
    pub fn name(&self) -> &str {
        match self {
            Definition::Const(c) => &c.name,
            Definition::Typedef(t) => &t.name,
            Definition::Enum(e) => &e.name,
            Definition::Struct(s) | Definition::Union(s) | Definition::Exception(s) => &s.name,
            Definition::Service(s) => &s.name,
        }
    }

    /// Source location of the definition.
    pub fn span(&self) -> Span {
        match self {
            Definition::Const(c) => c.span,
            Definition::Typedef(t) => t.span,
            Definition::Enum(e) => e.span,
            Definition::Struct(s) | Definition::Union(s) | Definition::Exception(s) => s.span,
            Definition::Service(s) => s.span,
        }
    }

    pub fn kind(&self) -> DefinitionKind {
        match self {
            Definition::Const(_) => DefinitionKind::Const,
            Definition::Typedef(_) => DefinitionKind::Typedef,
            Definition::Enum(_) => DefinitionKind::Enum,
            Definition::Struct(_) => DefinitionKind::Struct,
            Definition::Union(_) => DefinitionKind::Union,
            Definition::Exception(_) => DefinitionKind::Exception,
            Definition::Service(_) => DefinitionKind::Service,
        }
    }
}

// --- Const / Typedef ---

/// `const <type> <name> = <value>`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConstDecl {
    pub name: String,
    pub ty: TypeExpr,
    pub value: ConstExpr,
    #[serde(default)]
    pub span: Span,
}

impl ConstDecl {
    pub fn new(name: impl Into<String>, ty: impl Into<TypeExpr>, value: ConstExpr) -> Self {
        Self {
            name: name.into(),
            ty: ty.into(),
            value,
            span: Span::unknown(),
        }
    }

    pub fn at(mut self, span: Span) -> Self {
        self.span = span;
        self
    }
}

/// `typedef <target> <name>`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypedefDecl {
    pub name: String,
    pub target: TypeExpr,
    #[serde(default)]
    pub span: Span,
}

impl TypedefDecl {
    pub fn new(name: impl Into<String>, target: impl Into<TypeExpr>) -> Self {
        Self {
            name: name.into(),
            target: target.into(),
            span: Span::unknown(),
        }
    }

    pub fn at(mut self, span: Span) -> Self {
        self.span = span;
        self
    }
}

// --- Enum ---

/// One item of an enum.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnumItem {
    pub name: String,
    /// Explicit value; implicit items continue from the previous one
    #[serde(default)]
    pub value: Option<i32>,
    #[serde(default)]
    pub span: Span,
}

/// `enum <name> { ... }`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnumDecl {
    pub name: String,
    pub items: Vec<EnumItem>,
    #[serde(default)]
    pub span: Span,
}

impl EnumDecl {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            items: Vec::new(),
            span: Span::unknown(),
        }
    }

    /// Append an item, optionally with an explicit value.
    pub fn item(mut self, name: impl Into<String>, value: Option<i32>) -> Self {
        self.items.push(EnumItem {
            name: name.into(),
            value,
            span: Span::unknown(),
        });
        self
    }

    pub fn at(mut self, span: Span) -> Self {
        self.span = span;
        self
    }
}

// --- Struct / Union / Exception ---

/// Field requiredness marker.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Requiredness {
    Required,
    Optional,
    /// No explicit marker
    #[default]
    Default,
}

/// Field of a struct, union or exception; also used for function
/// parameters and declared exceptions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Field {
    /// Explicit field id; implicit ids are assigned by the compiler
    #[serde(default)]
    pub id: Option<i16>,
    pub name: String,
    pub ty: TypeExpr,
    #[serde(default)]
    pub requiredness: Requiredness,
    #[serde(default)]
    pub default: Option<ConstExpr>,
    #[serde(default)]
    pub span: Span,
}

impl Field {
    pub fn new(id: i16, name: impl Into<String>, ty: impl Into<TypeExpr>) -> Self {
        Self {
            id: Some(id),
            name: name.into(),
            ty: ty.into(),
            requiredness: Requiredness::Default,
            default: None,
            span: Span::unknown(),
        }
    }

    pub fn required(mut self) -> Self {
        self.requiredness = Requiredness::Required;
        self
    }

    pub fn optional(mut self) -> Self {
        self.requiredness = Requiredness::Optional;
        self
    }

    pub fn with_default(mut self, value: ConstExpr) -> Self {
        self.default = Some(value);
        self
    }

    pub fn at(mut self, span: Span) -> Self {
        self.span = span;
        self
    }
}

/// Body shared by `struct`, `union` and `exception`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StructDecl {
    pub name: String,
    #[serde(default)]
    pub fields: Vec<Field>,
    #[serde(default)]
    pub span: Span,
}

impl StructDecl {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fields: Vec::new(),
            span: Span::unknown(),
        }
    }

    pub fn field(mut self, field: Field) -> Self {
        self.fields.push(field);
        self
    }

    pub fn at(mut self, span: Span) -> Self {
        self.span = span;
        self
    }
}

// --- Service ---

/// Parent service named in an `extends` clause.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceRef {
    pub name: String,
    #[serde(default)]
    pub span: Span,
}

/// One method of a service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionDecl {
    pub name: String,
    #[serde(default)]
    pub parameters: Vec<Field>,
    /// `None` for `void`
    #[serde(default)]
    pub return_type: Option<TypeExpr>,
    #[serde(default)]
    pub exceptions: Vec<Field>,
    #[serde(default)]
    pub oneway: bool,
    #[serde(default)]
    pub span: Span,
}

impl FunctionDecl {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            parameters: Vec::new(),
            return_type: None,
            exceptions: Vec::new(),
            oneway: false,
            span: Span::unknown(),
        }
    }

    pub fn parameter(mut self, field: Field) -> Self {
        self.parameters.push(field);
        self
    }

    pub fn returns(mut self, ty: impl Into<TypeExpr>) -> Self {
        self.return_type = Some(ty.into());
        self
    }

    pub fn throws(mut self, field: Field) -> Self {
        self.exceptions.push(field);
        self
    }

    pub fn oneway(mut self) -> Self {
        self.oneway = true;
        self
    }

    pub fn at(mut self, span: Span) -> Self {
        self.span = span;
        self
    }
}

/// `service <name> [extends <parent>] { ... }`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceDecl {
    pub name: String,
    #[serde(default)]
    pub functions: Vec<FunctionDecl>,
    #[serde(default)]
    pub extends: Option<ServiceRef>,
    #[serde(default)]
    pub span: Span,
}

impl ServiceDecl {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            functions: Vec::new(),
            extends: None,
            span: Span::unknown(),
        }
    }

    pub fn function(mut self, function: FunctionDecl) -> Self {
        self.functions.push(function);
        self
    }

    pub fn extends(mut self, parent: impl Into<String>, span: Span) -> Self {
        self.extends = Some(ServiceRef {
            name: parent.into(),
            span,
        });
        self
    }

    pub fn at(mut self, span: Span) -> Self {
        self.span = span;
        self
    }
}

impl From<ConstDecl> for Definition {
    fn from(decl: ConstDecl) -> Self {
        Definition::Const(decl)
    }
}

impl From<TypedefDecl> for Definition {
    fn from(decl: TypedefDecl) -> Self {
        Definition::Typedef(decl)
    }
}

impl From<EnumDecl> for Definition {
    fn from(decl: EnumDecl) -> Self {
        Definition::Enum(decl)
    }
}

impl From<ServiceDecl> for Definition {
    fn from(decl: ServiceDecl) -> Self {
        Definition::Service(decl)
    }
}
