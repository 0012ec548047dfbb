use pretty_assertions::assert_eq;
use shade_ir::ast::{Expr, FuncDecl, Stmt as AstStmt};
use shade_ir::{BinaryOp, Name, Span, VarType};
use shade_types::{Substitution, Type, TypeRegistry};

use super::*;
use crate::node::{NodeKind, User};

struct Registry(TypeRegistry);

impl HintResolver for Registry {
    fn resolve_hint(&mut self, hint: &VarType) -> Result<Type, RegistrationError> {
        self.0.lower(hint, &Substitution::new(), None)
    }
}

fn signature(params: &[(&str, Type)]) -> Signature {
    Signature {
        name: Name::new("demo.f"),
        params: params
            .iter()
            .map(|(name, ty)| ParamSpec {
                name: Name::new(*name),
                ty: Some(ty.clone()),
                by_ref: false,
            })
            .collect(),
        return_type: Some(Type::F32),
        const_params: Vec::new(),
        flags: FunctionFlags::empty(),
        span: Span::default(),
    }
}

fn build(decl: &FuncDecl, sig: Signature) -> Result<Function, BuildError> {
    build_function(decl, sig, &mut Registry(TypeRegistry::new()))
}

#[test]
fn binary_return_lowers_to_call_of_loads() {
    let decl = FuncDecl::new("demo.add").body(vec![AstStmt::ret(Expr::binary(
        BinaryOp::Add,
        Expr::name("x"),
        Expr::name("y"),
    ))]);
    let f = build(&decl, signature(&[("x", Type::F32), ("y", Type::F32)])).unwrap();

    assert_eq!(f.body.len(), 1);
    let StmtKind::Return(Some(value)) = f.arena.stmt(f.body[0]).kind else {
        panic!("expected a return");
    };
    let call = f.arena.node(value).call().unwrap();
    assert_eq!(call.op, CallOp::Binary(BinaryOp::Add));
    assert_eq!(call.kind, CallKind::BinaryOp);
    assert!(!call.is_resolved());
    for (&arg, &param) in call.args.iter().zip(&f.params) {
        let Some(Value::Load(r)) = f.arena.node(arg).value() else {
            panic!("expected a load");
        };
        assert_eq!(f.arena.node(*r).place(), Some(&Ref::Var(param)));
    }
    assert_eq!(f.arena.uses(value), &[User::Stmt(f.body[0])]);
}

#[test]
fn first_assignment_declares_a_local() {
    let decl = FuncDecl::new("demo.f").body(vec![
        AstStmt::assign(Expr::name("t"), Expr::name("x")),
        AstStmt::assign(Expr::name("t"), Expr::int(2)),
        AstStmt::ret(Expr::name("t")),
    ]);
    let f = build(&decl, signature(&[("x", Type::F32)])).unwrap();
    assert_eq!(f.locals.len(), 1);
    let local = f.arena.var(f.locals[0]);
    assert_eq!(local.name.as_str(), "t");
    assert_eq!(local.kind, VarKind::Local);
    assert_eq!(local.ty, None);
}

#[test]
fn locals_assigned_in_branches_have_function_scope() {
    let decl = FuncDecl::new("demo.f").body(vec![
        AstStmt::if_else(
            Expr::bool(true),
            vec![AstStmt::assign(Expr::name("t"), Expr::float(1.0))],
            vec![AstStmt::assign(Expr::name("t"), Expr::float(2.0))],
        ),
        AstStmt::ret(Expr::name("t")),
    ]);
    let f = build(&decl, signature(&[])).unwrap();
    assert_eq!(f.locals.len(), 1);
    assert_eq!(f.statements().len(), 4);
}

#[test]
fn reading_an_unassigned_name_fails() {
    let decl = FuncDecl::new("demo.f").body(vec![AstStmt::ret(
        Expr::name("missing").with_span(Span::at((2, 11), (2, 18)).with_file("demo.py")),
    )]);
    let err = build(&decl, signature(&[])).unwrap_err();
    assert!(matches!(err, BuildError::UndefinedVariable { ref name, .. } if name.as_str() == "missing"));
    let diag = err.to_diagnostic();
    assert_eq!(diag.code, ErrorCode::E2007);
    assert_eq!(
        diag.primary_span().map(ToString::to_string),
        Some("demo.py:2:11-2:18".to_owned())
    );
}

#[test]
fn assigning_to_a_literal_fails() {
    let decl = FuncDecl::new("demo.f").body(vec![AstStmt::assign(Expr::int(1), Expr::int(2))]);
    assert!(matches!(
        build(&decl, signature(&[])),
        Err(BuildError::InvalidAssignTarget { .. })
    ));
}

#[test]
fn constant_generic_parameters_become_symbolic_constants() {
    let decl = FuncDecl::new("demo.len").body(vec![AstStmt::ret(Expr::name("N"))]);
    let mut sig = signature(&[]);
    sig.const_params = vec![Name::new("N")];
    let f = build(&decl, sig).unwrap();
    let StmtKind::Return(Some(value)) = f.arena.stmt(f.body[0]).kind else {
        panic!("expected a return");
    };
    assert_eq!(
        f.arena.node(value).value(),
        Some(&Value::SymbolicConstant(Name::new("N")))
    );
}

#[test]
fn annotations_and_constructors_resolve_through_the_registry() {
    let decl = FuncDecl::new("demo.f").body(vec![
        AstStmt::assign_annotated(
            Expr::name("v"),
            VarType::concrete("float2"),
            Expr::construct(VarType::concrete("float2"), vec![Expr::float(1.0), Expr::float(2.0)]),
        ),
        AstStmt::declare("w", VarType::concrete("f32")),
    ]);
    let f = build(&decl, signature(&[])).unwrap();
    let float2 = Type::vector(Type::F32, 2).unwrap();

    let StmtKind::Assign {
        value,
        ref expected_type,
        ..
    } = f.arena.stmt(f.body[0]).kind
    else {
        panic!("expected an assignment");
    };
    assert_eq!(expected_type.as_ref(), Some(&float2));
    assert_eq!(
        f.arena.node(value).call().unwrap().op,
        CallOp::Construct(float2)
    );
    assert!(matches!(
        f.arena.stmt(f.body[1]).kind,
        StmtKind::VarDecl { expected: Type::Float { bits: 32 }, .. }
    ));
}

#[test]
fn method_calls_keep_the_member_callee() {
    let decl = FuncDecl::new("demo.f").body(vec![AstStmt::ret(Expr::method_call(
        Expr::name("p"),
        "length",
        vec![],
    ))]);
    let f = build(&decl, signature(&[("p", Type::F32)])).unwrap();
    let StmtKind::Return(Some(value)) = f.arena.stmt(f.body[0]).kind else {
        panic!("expected a return");
    };
    let CallOp::Callee(callee) = f.arena.node(value).call().unwrap().op else {
        panic!("expected an expression callee");
    };
    let Some(Value::Load(member)) = f.arena.node(callee).value() else {
        panic!("expected a load");
    };
    assert!(matches!(
        f.arena.node(*member).kind,
        NodeKind::Ref(Ref::Member { ref field, .. }) if field.as_str() == "length"
    ));
}

#[test]
fn redeclaring_a_parameter_fails() {
    let decl = FuncDecl::new("demo.f").body(vec![AstStmt::declare("x", VarType::concrete("f32"))]);
    assert!(matches!(
        build(&decl, signature(&[("x", Type::F32)])),
        Err(BuildError::Redeclared { .. })
    ));
}
