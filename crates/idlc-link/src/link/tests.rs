use crate::entity::{ConstTarget, ConstValue, EntityTag, MethodRef, TypeSpec};
use crate::error::{CompileError, ErrorKind};
use crate::pipeline::{compile, Linked};
use crate::value::{StructValue, Value};
use idlc_ast::{
    ConstDecl, ConstExpr, Definition, Document, EnumDecl, Field, FunctionDecl, Include,
    PrimitiveType, ServiceDecl, Span, StructDecl, TypeExpr, TypedefDecl,
};

fn named(name: &str, line: u32) -> TypeExpr {
    TypeExpr::named(name, Span::new(line, 20))
}

fn i32_const(name: &str, value: ConstExpr, line: u32) -> Definition {
    ConstDecl::new(name, PrimitiveType::I32, value)
        .at(Span::line(line))
        .into()
}

fn compile_defs(definitions: Vec<Definition>) -> Result<Linked, CompileError> {
    let mut document = Document::new();
    document.definitions = definitions;
    compile("test", &document)
}

fn field_target(linked: &Linked, owner: &str, field: &str) -> String {
    let spec = linked.scope.by_name(owner).unwrap().as_struct().unwrap();
    match &spec.field(field).unwrap().ty {
        TypeSpec::Named(reference) => {
            let id = reference.target().expect("field type should be bound");
            linked.scope.entity(id).name().to_string()
        }
        other => panic!("expected named field type, got {other:?}"),
    }
}

fn constant(linked: &Linked, name: &str) -> Value {
    linked
        .scope
        .by_name(name)
        .unwrap()
        .as_const()
        .unwrap()
        .value
        .clone()
        .unwrap()
}

// --- Types ---

#[test]
fn test_mutually_recursive_structs_link_to_each_other() {
    let linked = compile_defs(vec![
        Definition::Struct(StructDecl::new("A").field(Field::new(1, "b", named("B", 2)).optional())),
        Definition::Struct(StructDecl::new("B").field(Field::new(1, "a", named("A", 5)).optional())),
    ])
    .unwrap();

    assert_eq!(field_target(&linked, "A", "b"), "B");
    assert_eq!(field_target(&linked, "B", "a"), "A");
    assert!(linked.scope.iter().all(|(_, e)| e.is_resolved()));
}

#[test]
fn test_self_recursive_container_field() {
    let linked = compile_defs(vec![Definition::Struct(
        StructDecl::new("Node")
            .field(Field::new(1, "value", PrimitiveType::I32))
            .field(Field::new(2, "children", TypeExpr::list(named("Node", 3)))),
    )])
    .unwrap();

    let node = linked.scope.get("Node").unwrap();
    let spec = linked.scope.entity(node).as_struct().unwrap();
    match &spec.field("children").unwrap().ty {
        TypeSpec::List(inner) => match inner.as_ref() {
            TypeSpec::Named(reference) => assert_eq!(reference.target(), Some(node)),
            other => panic!("expected named element, got {other:?}"),
        },
        other => panic!("expected list, got {other:?}"),
    }
}

#[test]
fn test_unknown_field_type() {
    let err = compile_defs(vec![Definition::Struct(
        StructDecl::new("Foo").field(Field::new(1, "bar", TypeExpr::named("Bar", Span::new(7, 14)))),
    )])
    .unwrap_err();

    assert_eq!(
        err,
        CompileError::UnknownSymbol {
            name: "Bar".to_string(),
            referrer: "Foo.bar".to_string(),
            span: Span::new(7, 14),
        }
    );
}

#[test]
fn test_unknown_symbol_inside_map_value() {
    let err = compile_defs(vec![Definition::Struct(StructDecl::new("Index").field(
        Field::new(
            1,
            "entries",
            TypeExpr::map(PrimitiveType::String.into(), TypeExpr::list(named("Missing", 4))),
        ),
    ))])
    .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::UnknownSymbol);
    assert_eq!(err.symbol(), "Missing");
}

#[test]
fn test_field_typed_as_constant_is_mismatch() {
    let err = compile_defs(vec![
        i32_const("LIMIT", ConstExpr::Int(3), 1),
        Definition::Struct(StructDecl::new("Foo").field(Field::new(1, "x", named("LIMIT", 2)))),
    ])
    .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::TypeMismatch);
    assert_eq!(err.symbol(), "Foo.x");
}

#[test]
fn test_field_typed_as_service_is_mismatch() {
    let err = compile_defs(vec![
        ServiceDecl::new("Api").into(),
        Definition::Struct(StructDecl::new("Foo").field(Field::new(1, "x", named("Api", 2)))),
    ])
    .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::TypeMismatch);
}

#[test]
fn test_typedef_cycle() {
    let err = compile_defs(vec![
        TypedefDecl::new("A", named("B", 1)).at(Span::line(1)).into(),
        TypedefDecl::new("B", named("A", 2)).at(Span::line(2)).into(),
    ])
    .unwrap_err();

    match err {
        CompileError::CircularDefinition { name, chain, span } => {
            assert_eq!(name, "A");
            assert_eq!(chain, vec!["A", "B", "A"]);
            assert_eq!(span, Span::line(1));
        }
        other => panic!("expected circular definition, got {other:?}"),
    }
}

#[test]
fn test_typedef_chain_to_struct_is_fine() {
    let linked = compile_defs(vec![
        TypedefDecl::new("UserList", TypeExpr::list(named("UserRef", 1))).into(),
        TypedefDecl::new("UserRef", named("User", 2)).into(),
        Definition::Struct(StructDecl::new("User").field(Field::new(1, "friends", named("UserList", 3)))),
    ])
    .unwrap();
    assert_eq!(linked.scope.all(EntityTag::TypeAlias).count(), 2);
}

#[test]
fn test_duplicate_field_id_and_name() {
    let err = compile_defs(vec![Definition::Struct(
        StructDecl::new("Dup")
            .field(Field::new(1, "a", PrimitiveType::I32))
            .field(Field::new(1, "b", PrimitiveType::I32)),
    )])
    .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::DuplicateSymbol);

    let err = compile_defs(vec![Definition::Struct(
        StructDecl::new("Dup")
            .field(Field::new(1, "a", PrimitiveType::I32))
            .field(Field::new(2, "a", PrimitiveType::I64)),
    )])
    .unwrap_err();
    assert_eq!(err.symbol(), "Dup.a");
}

#[test]
fn test_union_rules() {
    let err = compile_defs(vec![Definition::Union(
        StructDecl::new("Choice").field(Field::new(1, "a", PrimitiveType::I32).required()),
    )])
    .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidDefinition);

    let err = compile_defs(vec![Definition::Union(
        StructDecl::new("Choice")
            .field(Field::new(1, "a", PrimitiveType::I32).with_default(ConstExpr::Int(1))),
    )])
    .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidDefinition);
}

#[test]
fn test_field_defaults_use_resolved_constants() {
    let linked = compile_defs(vec![
        Definition::Struct(
            StructDecl::new("Config").field(
                Field::new(1, "retries", PrimitiveType::I16)
                    .with_default(ConstExpr::reference("DEFAULT_RETRIES", Span::line(2))),
            ),
        ),
        i32_const("DEFAULT_RETRIES", ConstExpr::Int(3), 4),
    ])
    .unwrap();

    let config = linked.scope.by_name("Config").unwrap().as_struct().unwrap();
    assert_eq!(config.fields[0].default_value, Some(Value::I16(3)));
}

#[test]
fn test_field_default_mismatch() {
    let err = compile_defs(vec![Definition::Struct(StructDecl::new("Config").field(
        Field::new(1, "name", PrimitiveType::String).with_default(ConstExpr::Int(3)),
    ))])
    .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::TypeMismatch);
    assert_eq!(err.symbol(), "Config.name");
}

// --- Constants ---

#[test]
fn test_constant_cycle() {
    let err = compile_defs(vec![
        i32_const("X", ConstExpr::reference("Y", Span::new(1, 15)), 1),
        i32_const("Y", ConstExpr::reference("X", Span::new(2, 15)), 2),
    ])
    .unwrap_err();

    match err {
        CompileError::CircularDefinition { name, chain, .. } => {
            assert_eq!(name, "X");
            assert_eq!(chain, vec!["X", "Y", "X"]);
        }
        other => panic!("expected circular definition, got {other:?}"),
    }
}

#[test]
fn test_constant_self_reference() {
    let err = compile_defs(vec![i32_const(
        "X",
        ConstExpr::List(vec![ConstExpr::reference("X", Span::line(1))]),
        1,
    )])
    .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::CircularDefinition);
}

#[test]
fn test_constant_forward_reference_and_widening() {
    let linked = compile_defs(vec![
        ConstDecl::new("BIG", PrimitiveType::I64, ConstExpr::reference("SMALL", Span::line(1))).into(),
        ConstDecl::new("RATIO", PrimitiveType::Double, ConstExpr::reference("SMALL", Span::line(2))).into(),
        i32_const("SMALL", ConstExpr::Int(42), 3),
    ])
    .unwrap();

    assert_eq!(constant(&linked, "BIG"), Value::I64(42));
    assert_eq!(constant(&linked, "RATIO"), Value::Double(42.0));
    assert_eq!(constant(&linked, "SMALL"), Value::I32(42));

    let big = linked.scope.by_name("BIG").unwrap().as_const().unwrap();
    match &big.expr {
        ConstValue::Reference(reference) => {
            let small = linked.scope.get("SMALL").unwrap();
            assert_eq!(reference.target(), Some(ConstTarget::Const(small)));
        }
        other => panic!("expected reference, got {other:?}"),
    }
}

#[test]
fn test_constant_type_mismatches() {
    let err = compile_defs(vec![i32_const("X", ConstExpr::string("nope"), 1)]).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::TypeMismatch);
    assert_eq!(err.symbol(), "X");

    let err = compile_defs(vec![ConstDecl::new("B", PrimitiveType::Byte, ConstExpr::Int(300)).into()])
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::TypeMismatch);

    let err = compile_defs(vec![
        ConstDecl::new("S", PrimitiveType::String, ConstExpr::string("s")).into(),
        i32_const("X", ConstExpr::reference("S", Span::line(2)), 2),
    ])
    .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::TypeMismatch);
}

#[test]
fn test_constant_referencing_a_type_is_mismatch() {
    let err = compile_defs(vec![
        Definition::Struct(StructDecl::new("Point")),
        i32_const("X", ConstExpr::reference("Point", Span::line(2)), 2),
    ])
    .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::TypeMismatch);
}

#[test]
fn test_unknown_constant_reference() {
    let err = compile_defs(vec![i32_const("X", ConstExpr::reference("NOPE", Span::new(1, 9)), 1)])
        .unwrap_err();
    assert_eq!(
        err,
        CompileError::UnknownSymbol {
            name: "NOPE".to_string(),
            referrer: "X".to_string(),
            span: Span::new(1, 9),
        }
    );

    let err = compile_defs(vec![
        EnumDecl::new("Color").item("RED", None).into(),
        ConstDecl::new("C", named("Color", 2), ConstExpr::reference("Color.BLUE", Span::line(2))).into(),
    ])
    .unwrap_err();
    assert_eq!(err.symbol(), "Color.BLUE");
}

#[test]
fn test_enum_constants() {
    let linked = compile_defs(vec![
        ConstDecl::new("FAVORITE", named("Color", 1), ConstExpr::reference("Color.GREEN", Span::line(1))).into(),
        ConstDecl::new("BY_NUMBER", named("Color", 2), ConstExpr::Int(0)).into(),
        ConstDecl::new("AS_INT", PrimitiveType::I32, ConstExpr::reference("Color.GREEN", Span::line(3))).into(),
        EnumDecl::new("Color").item("RED", None).item("GREEN", None).into(),
    ])
    .unwrap();

    assert_eq!(constant(&linked, "FAVORITE"), Value::enum_value("Color", 1));
    assert_eq!(constant(&linked, "BY_NUMBER"), Value::enum_value("Color", 0));
    assert_eq!(constant(&linked, "AS_INT"), Value::I32(1));

    let err = compile_defs(vec![
        EnumDecl::new("Color").item("RED", None).into(),
        ConstDecl::new("BAD", named("Color", 2), ConstExpr::Int(7)).into(),
    ])
    .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::TypeMismatch);
}

#[test]
fn test_container_and_struct_constants() {
    let linked = compile_defs(vec![
        ConstDecl::new(
            "ORIGIN",
            named("Point", 1),
            ConstExpr::Map(vec![
                (ConstExpr::string("x"), ConstExpr::Int(0)),
                (ConstExpr::string("y"), ConstExpr::reference("OFFSET", Span::line(1))),
            ]),
        )
        .into(),
        ConstDecl::new(
            "TAGS",
            TypeExpr::set(PrimitiveType::String.into()),
            ConstExpr::List(vec![ConstExpr::string("a"), ConstExpr::string("b"), ConstExpr::string("a")]),
        )
        .into(),
        ConstDecl::new("ID", named("UserId", 3), ConstExpr::Int(9)).into(),
        i32_const("OFFSET", ConstExpr::Int(5), 4),
        TypedefDecl::new("UserId", PrimitiveType::I64).into(),
        Definition::Struct(
            StructDecl::new("Point")
                .field(Field::new(1, "x", PrimitiveType::I32).required())
                .field(Field::new(2, "y", PrimitiveType::I32)),
        ),
    ])
    .unwrap();

    assert_eq!(
        constant(&linked, "ORIGIN"),
        Value::Struct(
            StructValue::new("Point")
                .with("x", Value::I32(0))
                .with("y", Value::I32(5))
        )
    );
    assert_eq!(
        constant(&linked, "TAGS"),
        Value::Set(vec![Value::String("a".into()), Value::String("b".into())])
    );
    assert_eq!(constant(&linked, "ID"), Value::I64(9));
}

#[test]
fn test_struct_constant_missing_required_field() {
    let err = compile_defs(vec![
        Definition::Struct(StructDecl::new("Point").field(Field::new(1, "x", PrimitiveType::I32).required())),
        ConstDecl::new("P", named("Point", 2), ConstExpr::Map(vec![])).into(),
    ])
    .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::TypeMismatch);
    assert_eq!(err.symbol(), "P");
}

#[test]
fn test_struct_constant_repeated_field_is_mismatch() {
    let err = compile_defs(vec![
        Definition::Struct(StructDecl::new("Point").field(Field::new(1, "x", PrimitiveType::I32))),
        ConstDecl::new(
            "P",
            named("Point", 2),
            ConstExpr::Map(vec![
                (ConstExpr::string("x"), ConstExpr::Int(1)),
                (ConstExpr::string("x"), ConstExpr::Int(2)),
            ]),
        )
        .into(),
    ])
    .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::TypeMismatch);
    assert_eq!(err.symbol(), "P");
}

#[test]
fn test_union_constant_repeated_member_is_mismatch() {
    let err = compile_defs(vec![
        Definition::Union(
            StructDecl::new("Choice")
                .field(Field::new(1, "a", PrimitiveType::I32))
                .field(Field::new(2, "b", PrimitiveType::String)),
        ),
        ConstDecl::new(
            "C",
            named("Choice", 2),
            ConstExpr::Map(vec![
                (ConstExpr::string("a"), ConstExpr::Int(1)),
                (ConstExpr::string("a"), ConstExpr::Int(2)),
            ]),
        )
        .into(),
    ])
    .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::TypeMismatch);
    assert_eq!(err.symbol(), "C");
}

// --- Services ---

#[test]
fn test_service_return_type_declared_later() {
    let linked = compile_defs(vec![
        ServiceDecl::new("Lights")
            .function(FunctionDecl::new("current").returns(named("Color", 2)))
            .into(),
        EnumDecl::new("Color").item("RED", None).into(),
    ])
    .unwrap();

    let lights = linked.scope.by_name("Lights").unwrap().as_service().unwrap();
    match lights.functions[0].return_type.as_ref().unwrap() {
        TypeSpec::Named(reference) => {
            assert_eq!(reference.target(), linked.scope.get("Color"));
        }
        other => panic!("expected named return type, got {other:?}"),
    }
}

#[test]
fn test_declared_exceptions_must_be_exceptions() {
    let err = compile_defs(vec![
        Definition::Struct(StructDecl::new("NotAnError")),
        ServiceDecl::new("Api")
            .function(FunctionDecl::new("call").throws(Field::new(1, "e", named("NotAnError", 3))))
            .into(),
    ])
    .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::TypeMismatch);
    assert_eq!(err.symbol(), "Api.call.e");

    let linked = compile_defs(vec![
        TypedefDecl::new("Failure", named("Boom", 1)).into(),
        ServiceDecl::new("Api")
            .function(FunctionDecl::new("call").throws(Field::new(1, "e", named("Failure", 3))))
            .into(),
        Definition::Exception(StructDecl::new("Boom")),
    ]);
    assert!(linked.is_ok());
}

#[test]
fn test_service_inheritance_and_override_warning() {
    let linked = compile_defs(vec![
        ServiceDecl::new("Child")
            .extends("Base", Span::line(1))
            .function(FunctionDecl::new("ping").at(Span::line(2)))
            .function(FunctionDecl::new("extra").at(Span::line(3)))
            .into(),
        ServiceDecl::new("Base")
            .function(FunctionDecl::new("ping"))
            .function(FunctionDecl::new("status"))
            .into(),
    ])
    .unwrap();

    let child = linked.scope.get("Child").unwrap();
    let base = linked.scope.get("Base").unwrap();
    let methods = &linked.scope.entity(child).as_service().unwrap().methods;
    assert_eq!(
        methods,
        &vec![
            MethodRef { service: base, index: 1 },
            MethodRef { service: child, index: 0 },
            MethodRef { service: child, index: 1 },
        ]
    );

    assert_eq!(linked.warnings.len(), 1);
    assert_eq!(linked.warnings[0].span, Span::line(2));
    assert!(linked.warnings[0].message.contains("ping"));
}

#[test]
fn test_extends_must_name_a_service() {
    let err = compile_defs(vec![
        Definition::Struct(StructDecl::new("Base")),
        ServiceDecl::new("Child").extends("Base", Span::line(2)).into(),
    ])
    .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::TypeMismatch);
}

#[test]
fn test_extends_unknown_service() {
    let err = compile_defs(vec![ServiceDecl::new("Child").extends("Missing", Span::line(2)).into()])
        .unwrap_err();

    assert_eq!(
        err,
        CompileError::UnknownSymbol {
            name: "Missing".to_string(),
            referrer: "Child".to_string(),
            span: Span::line(2),
        }
    );
}

#[test]
fn test_unknown_parameter_type() {
    let err = compile_defs(vec![ServiceDecl::new("Api")
        .function(FunctionDecl::new("get").parameter(Field::new(1, "id", named("Missing", 4))))
        .into()])
    .unwrap_err();

    assert_eq!(
        err,
        CompileError::UnknownSymbol {
            name: "Missing".to_string(),
            referrer: "Api.get.id".to_string(),
            span: Span::new(4, 20),
        }
    );
}

#[test]
fn test_unknown_return_type() {
    let err = compile_defs(vec![ServiceDecl::new("Api")
        .function(FunctionDecl::new("get").returns(named("Missing", 6)))
        .into()])
    .unwrap_err();

    assert_eq!(
        err,
        CompileError::UnknownSymbol {
            name: "Missing".to_string(),
            referrer: "Api.get".to_string(),
            span: Span::new(6, 20),
        }
    );
}

#[test]
fn test_extends_cycle() {
    let err = compile_defs(vec![
        ServiceDecl::new("A").extends("B", Span::line(1)).into(),
        ServiceDecl::new("B").extends("A", Span::line(2)).into(),
    ])
    .unwrap_err();

    match err {
        CompileError::CircularDefinition { chain, .. } => assert_eq!(chain, vec!["A", "B", "A"]),
        other => panic!("expected circular definition, got {other:?}"),
    }
}

#[test]
fn test_oneway_rules() {
    let err = compile_defs(vec![ServiceDecl::new("Api")
        .function(FunctionDecl::new("fire").oneway().returns(PrimitiveType::I32))
        .into()])
    .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidDefinition);
    assert_eq!(err.symbol(), "Api.fire");
}

#[test]
fn test_duplicate_function_names() {
    let err = compile_defs(vec![ServiceDecl::new("Api")
        .function(FunctionDecl::new("get"))
        .function(FunctionDecl::new("get"))
        .into()])
    .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::DuplicateSymbol);
    assert_eq!(err.symbol(), "Api.get");
}

#[test]
fn test_parameter_defaults() {
    let linked = compile_defs(vec![ServiceDecl::new("Api")
        .function(
            FunctionDecl::new("page")
                .parameter(Field::new(1, "size", PrimitiveType::I32).with_default(ConstExpr::Int(50))),
        )
        .into()])
    .unwrap();

    let api = linked.scope.by_name("Api").unwrap().as_service().unwrap();
    assert_eq!(
        api.functions[0].parameters[0].default_value,
        Some(Value::I32(50))
    );
}

// --- Pipeline ---

#[test]
fn test_include_rejected_before_generation() {
    let document = Document::new()
        .with_header(Include::new("other.idl", Span::line(1)).into())
        .with_definition(i32_const("X", ConstExpr::Int(1), 3))
        .with_definition(i32_const("X", ConstExpr::Int(2), 4));

    let err = compile("test", &document).unwrap_err();
    assert_eq!(
        err,
        CompileError::UnsupportedFeature {
            path: "other.idl".to_string(),
            span: Span::line(1),
        }
    );
}

#[test]
fn test_duplicate_reported_before_linking() {
    let err = compile_defs(vec![
        Definition::Struct(StructDecl::new("Foo").field(Field::new(1, "x", named("Missing", 1)))),
        EnumDecl::new("Foo").at(Span::line(4)).into(),
    ])
    .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::DuplicateSymbol);
    assert_eq!(err.symbol(), "Foo");
}

#[test]
fn test_compilation_is_deterministic() {
    let definitions = vec![
        Definition::Struct(StructDecl::new("A").field(Field::new(1, "b", named("B", 1)).optional())),
        Definition::Struct(StructDecl::new("B").field(Field::new(1, "a", named("A", 2)).optional())),
        i32_const("X", ConstExpr::Int(1), 3),
    ];
    let first = compile_defs(definitions.clone()).unwrap();
    let second = compile_defs(definitions).unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_resolved_scope_survives_json() {
    let linked = compile_defs(vec![
        Definition::Struct(StructDecl::new("A").field(Field::new(1, "b", named("B", 1)).optional())),
        Definition::Struct(StructDecl::new("B").field(Field::new(1, "a", named("A", 2)).optional())),
        ConstDecl::new("RATIO", PrimitiveType::Double, ConstExpr::Double(0.5)).into(),
        EnumDecl::new("Color").item("RED", None).into(),
    ])
    .unwrap();

    let json = serde_json::to_string(&linked.scope).unwrap();
    let restored: crate::scope::Scope = serde_json::from_str(&json).unwrap();
    assert_eq!(restored, linked.scope);
}
