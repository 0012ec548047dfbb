use pretty_assertions::assert_eq;
use shade_ir::ast::{ClassDecl, Expr, FuncDecl, Stmt, TypeVarDecl};
use shade_ir::{BinaryOp, LiteralValue, Name, Span, UnaryOp, VarType};

use super::*;

fn f32_hint() -> VarType {
    VarType::concrete("f32")
}

fn point() -> ClassDecl {
    ClassDecl::new("demo.Point")
        .field("x", f32_hint())
        .field("y", f32_hint())
        .method(
            FuncDecl::new("__add__")
                .untyped_param("self")
                .param("other", VarType::SelfType)
                .returns(VarType::SelfType)
                .body(vec![Stmt::ret(Expr::name("self"))]),
        )
}

fn boxed() -> ClassDecl {
    ClassDecl::new("demo.Box")
        .type_var(TypeVarDecl::new("T"))
        .field("value", VarType::var("T"))
        .method(
            FuncDecl::new("get")
                .untyped_param("self")
                .returns(VarType::var("T"))
                .body(vec![Stmt::ret(Expr::attr(Expr::name("self"), "value"))]),
        )
}

fn lower(registry: &mut TypeRegistry, hint: &VarType) -> Result<Type, RegistrationError> {
    registry.lower(hint, &Substitution::new(), None)
}

// Builtins

#[test]
fn scalar_names_and_aliases() {
    let registry = TypeRegistry::new();
    assert_eq!(registry.lookup("f32"), Some(&Type::F32));
    assert_eq!(registry.lookup("float"), Some(&Type::F32));
    assert_eq!(registry.lookup("int"), Some(&Type::I32));
    assert_eq!(registry.lookup("None"), Some(&Type::Unit));
    assert_eq!(
        registry.lookup("float3"),
        Some(&Type::vector(Type::F32, 3).unwrap())
    );
    assert_eq!(
        registry.lookup("uint2"),
        Some(&Type::vector(Type::U32, 2).unwrap())
    );
    assert_eq!(registry.lookup("float5"), None);
}

#[test]
fn scalar_operator_methods() {
    let mut registry = TypeRegistry::new();
    let add = registry.methods(&Type::F32, "__add__").unwrap();
    assert_eq!(add.len(), 1);
    assert_eq!(add[0].ret, Some(Type::F32));
    assert_eq!(add[0].imp, MethodImpl::Intrinsic(Intrinsic::Binary(BinaryOp::Add)));

    assert_eq!(registry.methods(&Type::F32, "__lt__").unwrap()[0].ret, Some(Type::Bool));
    assert!(!registry.methods(&Type::I32, "__and__").unwrap().is_empty());
    assert!(registry.methods(&Type::F32, "__and__").unwrap().is_empty());
    assert!(registry.methods(&Type::Bool, "__add__").unwrap().is_empty());
    assert!(!registry.methods(&Type::Bool, "__not__").unwrap().is_empty());
    assert_eq!(
        registry.methods(&Type::I32, UnaryOp::Invert.method_name()).unwrap()[0].imp,
        MethodImpl::Intrinsic(Intrinsic::Unary(UnaryOp::Invert))
    );
}

#[test]
fn vector_operator_overloads() {
    let mut registry = TypeRegistry::new();
    let v = Type::vector(Type::F32, 3).unwrap();
    let mul = registry.methods(&v, "__mul__").unwrap();
    let rhs: Vec<_> = mul.iter().map(|m| m.params[1].1.clone()).collect();
    assert_eq!(rhs, vec![v.clone(), Type::F32]);
    assert_eq!(registry.methods(&v, "__rmul__").unwrap()[0].params[1].1, Type::F32);
    assert_eq!(
        registry.methods(&v, "__lt__").unwrap()[0].ret,
        Some(Type::vector(Type::Bool, 3).unwrap())
    );
}

#[test]
fn vector_swizzle_members() {
    let mut registry = TypeRegistry::new();
    let v = Type::vector(Type::F32, 2).unwrap();
    assert_eq!(registry.member(&v, "x").unwrap(), Some(Type::F32));
    assert_eq!(registry.member(&v, "y").unwrap(), Some(Type::F32));
    assert_eq!(registry.member(&v, "z").unwrap(), None);
}

// Lowering

#[test]
fn lowers_builtin_generic_origins() {
    let mut registry = TypeRegistry::new();
    let array = VarType::instance(
        ARRAY_ORIGIN,
        vec![f32_hint(), VarType::Literal(LiteralValue::Int(4))],
    );
    assert_eq!(
        lower(&mut registry, &array).unwrap(),
        Type::array(Type::F32, ArrayLen::Known(4))
    );

    let symbolic = VarType::instance(ARRAY_ORIGIN, vec![VarType::var("T"), VarType::var("N")]);
    assert_eq!(
        lower(&mut registry, &symbolic).unwrap(),
        Type::array(Type::symbolic("T"), ArrayLen::Symbolic(Name::new("N")))
    );

    let vector = VarType::instance(
        VECTOR_ORIGIN,
        vec![f32_hint(), VarType::Literal(LiteralValue::Int(4))],
    );
    assert_eq!(
        lower(&mut registry, &vector).unwrap(),
        Type::vector(Type::F32, 4).unwrap()
    );

    let pointer = VarType::instance(POINTER_ORIGIN, vec![f32_hint()]);
    assert_eq!(
        lower(&mut registry, &pointer).unwrap(),
        Type::pointer(Type::F32)
    );
}

#[test]
fn rejects_unsupported_hints() {
    let mut registry = TypeRegistry::new();
    let union = VarType::Union(vec![f32_hint(), VarType::concrete("i32")]);
    assert!(matches!(
        lower(&mut registry, &union),
        Err(RegistrationError::UnsupportedHint { .. })
    ));
    assert!(matches!(
        lower(&mut registry, &VarType::Any),
        Err(RegistrationError::UnsupportedHint { .. })
    ));
    assert_eq!(
        lower(&mut registry, &VarType::concrete("demo.Missing")),
        Err(RegistrationError::UnknownType {
            name: Name::new("demo.Missing")
        })
    );
}

#[test]
fn bad_vector_width_is_rejected() {
    let mut registry = TypeRegistry::new();
    let hint = VarType::instance(
        VECTOR_ORIGIN,
        vec![f32_hint(), VarType::Literal(LiteralValue::Int(5))],
    );
    let err = lower(&mut registry, &hint).unwrap_err();
    assert_eq!(
        err,
        RegistrationError::InvalidType(crate::TypeError::VectorWidth { count: 5 })
    );
}

#[test]
fn annotated_hints_lower_to_inner() {
    let mut registry = TypeRegistry::new();
    let hint = VarType::Annotated {
        inner: Box::new(f32_hint()),
        metadata: vec![Name::new("byref")],
    };
    assert_eq!(lower(&mut registry, &hint).unwrap(), Type::F32);
}

// Classes

#[test]
fn registers_plain_class_with_methods() {
    let mut registry = TypeRegistry::new();
    let ty = registry.register_class(&point()).unwrap();
    let s = ty.as_struct().unwrap();
    assert_eq!(s.name.as_str(), "Point");
    assert_eq!(s.qualified_name.as_str(), "demo.Point");
    assert_eq!(registry.member(&ty, "x").unwrap(), Some(Type::F32));

    let add = registry.methods(&ty, "__add__").unwrap();
    assert_eq!(add.len(), 1);
    assert_eq!(add[0].params[0].1, ty);
    assert_eq!(add[0].params[1].1, ty);
    assert_eq!(add[0].ret, Some(ty.clone()));
    assert!(matches!(add[0].imp, MethodImpl::Source(_)));
}

#[test]
fn registration_is_idempotent() {
    let mut registry = TypeRegistry::new();
    let first = registry.register_class(&point()).unwrap();
    let second = registry.register_class(&point()).unwrap();
    assert_eq!(first, second);
    assert_eq!(registry.methods(&first, "__add__").unwrap().len(), 1);

    let changed = point().field("z", f32_hint());
    assert_eq!(
        registry.register_class(&changed),
        Err(RegistrationError::ConflictingRegistration {
            name: Name::new("demo.Point")
        })
    );
}

#[test]
fn local_classes_are_rejected() {
    let mut registry = TypeRegistry::new();
    let mut decl = point();
    decl.is_local = true;
    decl.span = Span::at((3, 4), (6, 0)).with_file("demo.py");
    let err = registry.register_class(&decl).unwrap_err();
    assert!(matches!(err, RegistrationError::LocalDeclaration { .. }));
    let diag = err.to_diagnostic();
    assert_eq!(diag.code, shade_diagnostic::ErrorCode::E1001);
    assert!(diag.primary_span().is_some());
}

#[test]
fn base_classes_must_be_registered_first() {
    let mut registry = TypeRegistry::new();
    let derived = ClassDecl::new("demo.Point3")
        .base(VarType::concrete("demo.Point"))
        .field("z", f32_hint());
    assert!(matches!(
        registry.register_class(&derived),
        Err(RegistrationError::UnregisteredBase { .. })
    ));

    registry.register_class(&point()).unwrap();
    let ty = registry.register_class(&derived).unwrap();
    let fields: Vec<_> = ty
        .as_struct()
        .unwrap()
        .fields
        .iter()
        .map(|(name, _)| name.as_str().to_owned())
        .collect();
    assert_eq!(fields, vec!["x", "y", "z"]);
    assert_eq!(registry.methods(&ty, "__add__").unwrap()[0].params[0].1, ty);
}

#[test]
fn class_signature_includes_inherited_members() {
    let mut registry = TypeRegistry::new();
    let base = ClassDecl::new("demo.Base")
        .field("x", f32_hint())
        .field("tag", VarType::concrete("i32"))
        .method(
            FuncDecl::new("get")
                .untyped_param("self")
                .returns(f32_hint())
                .body(vec![Stmt::ret(Expr::attr(Expr::name("self"), "x"))]),
        )
        .method(
            FuncDecl::new("base_only")
                .untyped_param("self")
                .returns(f32_hint())
                .body(vec![Stmt::ret(Expr::attr(Expr::name("self"), "x"))]),
        );
    let derived = ClassDecl::new("demo.Derived")
        .base(VarType::concrete("demo.Base"))
        .field("tag", VarType::concrete("u32"))
        .field("y", f32_hint())
        .method(
            FuncDecl::new("get")
                .untyped_param("self")
                .returns(f32_hint())
                .body(vec![Stmt::ret(Expr::attr(Expr::name("self"), "y"))]),
        );
    registry.register_class(&base).unwrap();
    let ty = registry.register_class(&derived).unwrap();

    let signature = registry.class_signature("demo.Derived").unwrap();
    let fields: Vec<_> = signature
        .fields
        .iter()
        .map(|(name, hint)| format!("{name}: {hint}"))
        .collect();
    assert_eq!(fields, vec!["x: f32", "tag: u32", "y: f32"]);
    let owners: Vec<_> = signature
        .methods
        .iter()
        .map(|m| m.qualified_name().to_string())
        .collect();
    assert_eq!(owners, vec!["demo.Derived.get", "demo.Base.base_only"]);
    assert!(registry.class_signature("demo.Missing").is_none());

    let inherited = registry.methods(&ty, "base_only").unwrap();
    let MethodImpl::Source(source) = &inherited[0].imp else {
        panic!("expected a source method");
    };
    assert_eq!(source.signature.owner.as_str(), "demo.Base");
    assert_eq!(source.self_type, ty);
}

#[test]
fn methods_may_name_their_own_class() {
    let mut registry = TypeRegistry::new();
    let decl = ClassDecl::new("demo.Point")
        .field("x", f32_hint())
        .method(
            FuncDecl::new("__add__")
                .untyped_param("self")
                .param("other", VarType::concrete("demo.Point"))
                .returns(VarType::concrete("demo.Point"))
                .body(vec![Stmt::ret(Expr::name("other"))]),
        );
    let ty = registry.register_class(&decl).unwrap();

    let add = registry.methods(&ty, "__add__").unwrap();
    assert_eq!(add[0].params[1].1, ty);
    assert_eq!(add[0].ret, Some(ty.clone()));
}

#[test]
fn methods_may_name_classes_registered_later() {
    let mut registry = TypeRegistry::new();
    let a = ClassDecl::new("demo.A").field("v", f32_hint()).method(
        FuncDecl::new("__add__")
            .param("self", VarType::concrete("demo.A"))
            .param("other", VarType::concrete("demo.B"))
            .returns(VarType::concrete("demo.A"))
            .body(vec![Stmt::ret(Expr::name("self"))]),
    );
    let b = ClassDecl::new("demo.B").field("v", f32_hint()).method(
        FuncDecl::new("__radd__")
            .param("self", VarType::concrete("demo.B"))
            .param("other", VarType::concrete("demo.A"))
            .returns(VarType::concrete("demo.B"))
            .body(vec![Stmt::ret(Expr::name("self"))]),
    );
    let a_ty = registry.register_class(&a).unwrap();
    let b_ty = registry.register_class(&b).unwrap();

    let add = registry.methods(&a_ty, "__add__").unwrap();
    assert_eq!(add[0].params[1].1, b_ty);
    let radd = registry.methods(&b_ty, "__radd__").unwrap();
    assert_eq!(radd[0].params[1].1, a_ty);
    assert_eq!(radd[0].ret, Some(b_ty.clone()));
}

#[test]
fn unknown_method_hints_surface_at_lookup() {
    let mut registry = TypeRegistry::new();
    let decl = ClassDecl::new("demo.Holder").field("v", f32_hint()).method(
        FuncDecl::new("take")
            .untyped_param("self")
            .param("other", VarType::concrete("demo.Later"))
            .body(vec![Stmt::ret_unit()]),
    );
    let ty = registry.register_class(&decl).unwrap();
    assert_eq!(registry.member(&ty, "v").unwrap(), Some(Type::F32));
    assert_eq!(
        registry.methods(&ty, "take").unwrap_err(),
        RegistrationError::UnknownType {
            name: Name::new("demo.Later")
        }
    );

    let later = registry
        .register_class(&ClassDecl::new("demo.Later").field("v", f32_hint()))
        .unwrap();
    assert_eq!(registry.methods(&ty, "take").unwrap()[0].params[1].1, later);
}

#[test]
fn generic_class_registers_as_parametric() {
    let mut registry = TypeRegistry::new();
    let ty = registry.register_class(&boxed()).unwrap();
    let Type::Parametric(generic) = &ty else {
        panic!("expected parametric, got {ty:?}");
    };
    assert_eq!(generic.params.len(), 1);
    assert_eq!(
        generic.body.field("value"),
        Some(&Type::symbolic("T"))
    );
    assert_eq!(ty.to_string(), "Box[T]");

    assert!(matches!(
        lower(&mut registry, &VarType::concrete("demo.Box")),
        Err(RegistrationError::TypeArgArity { expected: 1, found: 0, .. })
    ));
}

#[test]
fn instantiation_is_cached_and_structural() {
    let mut registry = TypeRegistry::new();
    registry.register_class(&boxed()).unwrap();
    let name = Name::new("demo.Box");

    let a = registry.instantiate_class(&name, &[Type::F32]).unwrap();
    let b = lower(
        &mut registry,
        &VarType::instance("demo.Box", vec![f32_hint()]),
    )
    .unwrap();
    assert_eq!(a, b);
    assert_eq!(a.to_string(), "Box[f32]");
    assert_eq!(registry.member(&a, "value").unwrap(), Some(Type::F32));

    let bound = registry.bound_instance(&name, &[Type::F32]).unwrap();
    assert_eq!(bound.instantiated, a);

    let get = registry.methods(&a, "get").unwrap();
    assert_eq!(get.len(), 1);
    assert_eq!(get[0].ret, Some(Type::F32));

    let c = registry.instantiate_class(&name, &[Type::I32]).unwrap();
    assert_ne!(a, c);
    assert_eq!(registry.methods(&c, "get").unwrap()[0].ret, Some(Type::I32));
}

#[test]
fn symbolic_instantiation_is_not_cached() {
    let mut registry = TypeRegistry::new();
    registry.register_class(&boxed()).unwrap();
    let name = Name::new("demo.Box");
    let ty = registry
        .instantiate_class(&name, &[Type::symbolic("U")])
        .unwrap();
    assert!(ty.contains_symbolic());
    assert!(registry.bound_instance(&name, &[Type::symbolic("U")]).is_none());
    assert!(registry.methods(&ty, "get").unwrap().is_empty());
}

#[test]
fn instantiation_checks_arity_and_bounds() {
    let mut registry = TypeRegistry::new();
    let decl = ClassDecl::new("demo.Num")
        .type_var(TypeVarDecl::new("T").bounded(vec![f32_hint(), VarType::concrete("f64")]))
        .field("value", VarType::var("T"));
    registry.register_class(&decl).unwrap();
    let name = Name::new("demo.Num");

    assert!(registry.instantiate_class(&name, &[Type::F64]).is_ok());
    let err = registry.instantiate_class(&name, &[Type::I32]).unwrap_err();
    assert_eq!(
        err.to_string(),
        "`i32` does not satisfy the bound on `T` of `demo.Num`"
    );
    assert!(matches!(
        registry.instantiate_class(&name, &[Type::F32, Type::F32]),
        Err(RegistrationError::TypeArgArity { expected: 1, found: 2, .. })
    ));
}

#[test]
fn define_rejects_conflicts() {
    let mut registry = TypeRegistry::new();
    registry.define("demo.Texture", Type::opaque("Texture")).unwrap();
    registry.define("demo.Texture", Type::opaque("Texture")).unwrap();
    assert!(registry.define("demo.Texture", Type::F32).is_err());
    assert!(registry.define("f32", Type::F64).is_err());
}
