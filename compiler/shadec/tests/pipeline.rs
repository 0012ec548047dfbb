//! End-to-end compilation: registration through C++ emission.

#![allow(clippy::unwrap_used)]

use pretty_assertions::assert_eq;
use shade_diagnostic::ErrorCode;
use shade_ir::ast::{ClassDecl, Expr, FuncDecl, Stmt, TypeVarDecl};
use shade_ir::{BinaryOp, Name, Span, VarType};
use shade_typeck::InferErrorKind;
use shade_types::Type;
use shadec::{CompileError, CompileOptions, Compiler};

fn hint(name: &str) -> VarType {
    VarType::concrete(name)
}

fn compiler() -> Compiler {
    shadec::init_tracing();
    Compiler::new(CompileOptions::default().with_prelude(false))
}

fn generic_add() -> FuncDecl {
    FuncDecl::new("demo.add")
        .type_var(TypeVarDecl::new("T"))
        .param("x", VarType::var("T"))
        .param("y", VarType::var("T"))
        .returns(VarType::var("T"))
        .body(vec![Stmt::ret(Expr::binary(
            BinaryOp::Add,
            Expr::name("x"),
            Expr::name("y"),
        ))])
}

#[test]
fn generic_add_end_to_end() {
    let mut c = compiler();
    c.register_function(&generic_add()).unwrap();

    let floats = c.compile("demo.add", &[Type::F32, Type::F32]).unwrap();
    assert_eq!(floats.symbols, vec!["shade_N4demo3addEFf32f32f32E".to_owned()]);
    assert_eq!(
        floats.source,
        "extern \"C\" auto shade_N4demo3addEFf32f32f32E(f32 x, f32 y) -> f32 {\n    \
         return (x + y);\n}\n\n"
    );

    let ints = c.compile("demo.add", &[Type::I32, Type::I32]).unwrap();
    assert_ne!(floats.symbols, ints.symbols);
    assert!(ints.source.contains("(i32 x, i32 y) -> i32 {"));
}

#[test]
fn several_entries_share_one_unit() {
    let mut c = compiler();
    c.register_function(&generic_add()).unwrap();
    let unit = c
        .compile_many(&[
            (Name::new("demo.add"), vec![Type::F32, Type::F32]),
            (Name::new("demo.add"), vec![Type::U32, Type::U32]),
            (Name::new("demo.add"), vec![Type::F32, Type::F32]),
        ])
        .unwrap();
    assert_eq!(unit.symbols.len(), 3);
    assert_eq!(unit.symbols[0], unit.symbols[2]);
    assert_eq!(unit.source.matches("extern \"C\"").count(), 2);
}

#[test]
fn entries_stay_internal_when_not_exported() {
    let mut c = Compiler::new(
        CompileOptions::default()
            .with_prelude(false)
            .with_export_entry(false),
    );
    c.register_function(&generic_add()).unwrap();
    let unit = c.compile("demo.add", &[Type::F32, Type::F32]).unwrap();
    assert!(unit.source.starts_with("auto "));
}

#[test]
fn forward_operator_method_wins() {
    let mut c = compiler();
    let a = c
        .register_class(
            &ClassDecl::new("demo.A").field("v", hint("f32")).method(
                FuncDecl::new("__add__")
                    .param("self", hint("demo.A"))
                    .param("other", hint("demo.B"))
                    .returns(hint("demo.A"))
                    .body(vec![Stmt::ret(Expr::name("self"))]),
            ),
        )
        .unwrap();
    let b = c
        .register_class(
            &ClassDecl::new("demo.B").field("v", hint("f32")).method(
                FuncDecl::new("__radd__")
                    .param("self", hint("demo.B"))
                    .param("other", hint("demo.A"))
                    .returns(hint("demo.B"))
                    .body(vec![Stmt::ret(Expr::name("self"))]),
            ),
        )
        .unwrap();
    c.register_function(
        &FuncDecl::new("demo.sum")
            .param("a", hint("demo.A"))
            .param("b", hint("demo.B"))
            .body(vec![Stmt::ret(Expr::binary(
                BinaryOp::Add,
                Expr::name("a"),
                Expr::name("b"),
            ))]),
    )
    .unwrap();
    let unit = c.compile("demo.sum", &[a, b]).unwrap();

    assert!(unit.source.contains("-> shade_SN4demo1AE {"));
    assert!(unit.source.contains("N4demo1A7__add__E"));
    assert!(!unit.source.contains("__radd__"));
}

#[test]
fn point_struct_is_defined_once() {
    let mut c = compiler();
    let point = c
        .register_class(
            &ClassDecl::new("demo.Point")
                .field("x", hint("f32"))
                .field("y", hint("f32")),
        )
        .unwrap();
    c.register_function(
        &FuncDecl::new("demo.mid")
            .param("a", hint("demo.Point"))
            .param("b", hint("demo.Point"))
            .body(vec![Stmt::ret(Expr::construct(
                hint("demo.Point"),
                vec![
                    Expr::binary(
                        BinaryOp::Mul,
                        Expr::binary(
                            BinaryOp::Add,
                            Expr::attr(Expr::name("a"), "x"),
                            Expr::attr(Expr::name("b"), "x"),
                        ),
                        Expr::float(0.5),
                    ),
                    Expr::binary(
                        BinaryOp::Mul,
                        Expr::binary(
                            BinaryOp::Add,
                            Expr::attr(Expr::name("a"), "y"),
                            Expr::attr(Expr::name("b"), "y"),
                        ),
                        Expr::float(0.5),
                    ),
                ],
            ))]),
    )
    .unwrap();

    let unit = c.compile("demo.mid", &[point.clone(), point]).unwrap();
    assert_eq!(unit.source.matches("struct shade_SN4demo5PointE {").count(), 1);
    assert!(unit.source.contains(
        "return shade_SN4demo5PointE{((a.x + b.x) * 0.5f), ((a.y + b.y) * 0.5f)};"
    ));
}

#[test]
fn recursion_is_a_compile_error() {
    let mut c = compiler();
    c.register_function(
        &FuncDecl::new("demo.fact")
            .param("n", hint("i32"))
            .returns(hint("i32"))
            .body(vec![Stmt::ret(Expr::binary(
                BinaryOp::Mul,
                Expr::name("n"),
                Expr::call(
                    "demo.fact",
                    vec![Expr::binary(BinaryOp::Sub, Expr::name("n"), Expr::int(1))],
                ),
            ))])
            .with_span(Span::at((3, 1), (5, 1)).with_file("demo.py")),
    )
    .unwrap();

    let err = c.compile("demo.fact", &[Type::I32]).unwrap_err();
    let CompileError::Inference(inner) = &err else {
        panic!("expected an inference error, got {err}");
    };
    assert_eq!(
        *inner.kind,
        InferErrorKind::RecursiveInstantiation {
            callee: Name::new("demo.fact")
        }
    );
    let diag = err.to_diagnostic();
    assert_eq!(diag.code, ErrorCode::E2008);
    assert!(diag.primary_span().is_some());
}

#[test]
fn failed_entries_leave_the_compiler_usable() {
    let mut c = compiler();
    c.register_function(&generic_add()).unwrap();

    let err = c.compile("demo.add", &[Type::F32, Type::Bool]).unwrap_err();
    assert!(matches!(err, CompileError::Inference(_)));
    assert_eq!(err.to_diagnostic().code, ErrorCode::E2003);

    assert!(c.compile("demo.add", &[Type::F64, Type::F64]).is_ok());
}

#[test]
fn unregistered_entry() {
    let mut c = compiler();
    let err = c.compile("demo.nothing", &[]).unwrap_err();
    assert_eq!(err.to_diagnostic().code, ErrorCode::E2006);
}

#[test]
fn generic_class_methods_compile_per_instance() {
    let mut c = compiler();
    c.register_class(
        &ClassDecl::new("demo.Pair")
            .type_var(TypeVarDecl::new("T"))
            .field("a", VarType::var("T"))
            .field("b", VarType::var("T"))
            .method(
                FuncDecl::new("sum")
                    .untyped_param("self")
                    .returns(VarType::var("T"))
                    .body(vec![Stmt::ret(Expr::binary(
                        BinaryOp::Add,
                        Expr::attr(Expr::name("self"), "a"),
                        Expr::attr(Expr::name("self"), "b"),
                    ))]),
            ),
    )
    .unwrap();
    c.register_function(
        &FuncDecl::new("demo.total")
            .type_var(TypeVarDecl::new("T"))
            .param("p", VarType::instance("demo.Pair", vec![VarType::var("T")]))
            .body(vec![Stmt::ret(Expr::method_call(
                Expr::name("p"),
                "sum",
                vec![],
            ))]),
    )
    .unwrap();

    let f32_pair = c.instantiate_class("demo.Pair", &[Type::F32]).unwrap();
    let i32_pair = c.instantiate_class("demo.Pair", &[Type::I32]).unwrap();
    let unit = c
        .compile_many(&[
            (Name::new("demo.total"), vec![f32_pair]),
            (Name::new("demo.total"), vec![i32_pair]),
        ])
        .unwrap();

    assert_eq!(unit.source.matches("struct shade_SN4demo4PairET").count(), 2);
    assert!(unit.source.contains("struct shade_SN4demo4PairETf32E {\n    f32 a;\n    f32 b;\n};"));
    assert!(unit.source.contains("(shade_SN4demo4PairETi32E self) -> i32 {\n    return (self.a + self.b);"));
    assert_eq!(unit.source.matches("auto shade_N4demo4Pair3sumE").count(), 2);
}
