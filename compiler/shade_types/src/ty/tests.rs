use std::sync::Arc;

use shade_ir::Name;

use super::*;

fn point(fields: Vec<(&str, Type)>) -> Type {
    Type::Struct(Arc::new(StructType {
        name: Name::new("Point"),
        qualified_name: Name::new("demo.Point"),
        type_args: Vec::new(),
        fields: fields
            .into_iter()
            .map(|(name, ty)| (Name::new(name), ty))
            .collect(),
    }))
}

#[test]
fn vector_width_is_validated() {
    assert!(Type::vector(Type::F32, 2).is_ok());
    assert!(Type::vector(Type::F32, 4).is_ok());
    assert_eq!(
        Type::vector(Type::F32, 5),
        Err(TypeError::VectorWidth { count: 5 })
    );
    assert_eq!(
        Type::vector(Type::F32, 1),
        Err(TypeError::VectorWidth { count: 1 })
    );
}

#[test]
fn vector_element_must_be_scalar() {
    let inner = Type::vector(Type::F32, 2).unwrap();
    assert!(matches!(
        Type::vector(inner, 2),
        Err(TypeError::VectorElement { .. })
    ));
    assert!(Type::vector(Type::symbolic("T"), 4).is_ok());
}

#[test]
fn independently_built_structs_compare_equal() {
    let a = point(vec![("x", Type::F32), ("y", Type::F32)]);
    let b = point(vec![("x", Type::F32), ("y", Type::F32)]);
    assert_eq!(a, b);

    let c = point(vec![("x", Type::F32), ("y", Type::I32)]);
    assert_ne!(a, c);
}

#[test]
fn parametric_compares_by_name() {
    let a = ParametricType {
        name: Name::new("demo.Vec2"),
        params: vec![TypeParameter::unbounded(TypeParamSymbol::Type(Name::new("T")))],
        body: Type::Unit,
    };
    let b = ParametricType {
        name: Name::new("demo.Vec2"),
        params: Vec::new(),
        body: Type::Bool,
    };
    assert_eq!(a, b);
}

#[test]
fn display_names() {
    assert_eq!(Type::I32.to_string(), "i32");
    assert_eq!(Type::U8.to_string(), "u8");
    assert_eq!(Type::F16.to_string(), "f16");
    assert_eq!(Type::Unit.to_string(), "()");
    assert_eq!(Type::GenericInt.to_string(), "{integer}");
    assert_eq!(Type::vector(Type::F32, 3).unwrap().to_string(), "vec<f32, 3>");
    assert_eq!(
        Type::array(Type::I32, ArrayLen::Symbolic(Name::new("N"))).to_string(),
        "[i32; N]"
    );
    assert_eq!(
        Type::function(vec![Type::F32, Type::F32], Type::Bool).to_string(),
        "fn(f32, f32) -> bool"
    );
}

#[test]
fn literal_defaults() {
    assert_eq!(Type::GenericInt.defaulted(), Type::I32);
    assert_eq!(Type::GenericFloat.defaulted(), Type::F32);
    assert_eq!(Type::U16.defaulted(), Type::U16);
}

#[test]
fn symbolic_detection_reaches_nested_types() {
    let t = Type::symbolic("T");
    assert!(t.contains_symbolic());
    assert!(Type::pointer(Type::vector(t.clone(), 4).unwrap()).contains_symbolic());
    assert!(Type::array(Type::F32, ArrayLen::Symbolic(Name::new("N"))).contains_symbolic());
    assert!(!Type::array(Type::F32, ArrayLen::Known(4)).contains_symbolic());
    assert!(point(vec![("x", t)]).contains_symbolic());
}

#[test]
fn concrete_excludes_placeholders() {
    assert!(Type::F32.is_concrete());
    assert!(!Type::GenericFloat.is_concrete());
    assert!(!Type::function(vec![Type::GenericInt], Type::Unit).is_concrete());
}

#[test]
fn field_lookup() {
    let p = point(vec![("x", Type::F32), ("y", Type::I32)]);
    assert_eq!(p.field("y"), Some(&Type::I32));
    assert_eq!(p.field("z"), None);
    assert_eq!(Type::F32.field("x"), None);
}

#[test]
fn bound_parameter_admits() {
    let param = TypeParameter {
        symbol: TypeParamSymbol::Type(Name::new("T")),
        bound: vec![Type::F32, Type::F64],
    };
    assert!(param.admits(&Type::F64));
    assert!(!param.admits(&Type::I32));
    assert!(TypeParameter::unbounded(TypeParamSymbol::Type(Name::new("U"))).admits(&Type::I32));
}
