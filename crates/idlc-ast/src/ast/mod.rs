//! Syntax tree of a single IDL document.
//!
//! A [`Document`] is an ordered list of [`Header`]s followed by an ordered
//! list of [`Definition`]s, exactly as the external parser produced them.
//! The tree is immutable once handed to the compiler.
//!
//! ```text
//! Document
//!   ├── headers:     Include | Namespace
//!   └── definitions: Const | Typedef | Enum | Struct | Union | Exception | Service
//! ```

pub mod definition;
pub mod expr;
pub mod header;

pub use definition::{
    ConstDecl, Definition, DefinitionKind, EnumDecl, EnumItem, Field, FunctionDecl,
    Requiredness, ServiceDecl, ServiceRef, StructDecl, TypedefDecl,
};
pub use expr::{ConstExpr, NamedType, SymbolRef, TypeExpr};
pub use header::{Header, Include, Namespace};

use serde::{Deserialize, Serialize};

/// A parsed IDL document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// Include and namespace declarations, in source order
    #[serde(default)]
    pub headers: Vec<Header>,
    /// Top-level definitions, in source order
    #[serde(default)]
    pub definitions: Vec<Definition>,
}

impl Document {
    /// Create an empty document.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a header.
    pub fn with_header(mut self, header: Header) -> Self {
        self.headers.push(header);
        self
    }

    /// Append a definition.
    pub fn with_definition(mut self, definition: impl Into<Definition>) -> Self {
        self.definitions.push(definition.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{PrimitiveType, Span};

    #[test]
    fn test_document_json_shape() {
        let json = r#"{
            "headers": [
                {"kind": "namespace", "scope": "py", "name": "example", "span": {"line": 1, "column": 1}}
            ],
            "definitions": [
                {
                    "kind": "const",
                    "name": "MAX",
                    "ty": {"primitive": "i32"},
                    "value": {"int": 10},
                    "span": {"line": 3, "column": 1}
                },
                {
                    "kind": "struct",
                    "name": "Item",
                    "fields": [
                        {"id": 1, "name": "next", "ty": {"named": {"name": "Item", "span": {"line": 5, "column": 17}}}, "requiredness": "optional", "span": {"line": 5, "column": 5}}
                    ],
                    "span": {"line": 4, "column": 1}
                }
            ]
        }"#;

        let doc: Document = serde_json::from_str(json).unwrap();
        assert_eq!(doc.headers.len(), 1);
        assert_eq!(doc.definitions.len(), 2);

        match &doc.definitions[0] {
            Definition::Const(c) => {
                assert_eq!(c.name, "MAX");
                assert_eq!(c.ty, TypeExpr::Primitive(PrimitiveType::I32));
                assert_eq!(c.value, ConstExpr::Int(10));
            }
            other => panic!("expected const, got {:?}", other.kind()),
        }

        match &doc.definitions[1] {
            Definition::Struct(s) => {
                assert_eq!(s.fields[0].requiredness, Requiredness::Optional);
                assert_eq!(s.fields[0].ty, TypeExpr::named("Item", Span::new(5, 17)));
                assert_eq!(s.fields[0].default, None);
            }
            other => panic!("expected struct, got {:?}", other.kind()),
        }
    }

    #[test]
    fn test_builder_preserves_order() {
        let doc = Document::new()
            .with_definition(TypedefDecl::new("A", TypeExpr::named("B", Span::line(1))))
            .with_definition(TypedefDecl::new("B", TypeExpr::Primitive(PrimitiveType::I64)));

        let names: Vec<_> = doc.definitions.iter().map(|d| d.name()).collect();
        assert_eq!(names, vec!["A", "B"]);
    }
}
