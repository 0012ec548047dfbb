//! Builtin names and operator methods.
//!
//! Scalars and vectors get their arithmetic, comparison, bitwise and unary
//! operators as intrinsic methods, so operator resolution goes through the
//! same method tables as user classes.

use std::sync::Arc;

use shade_ir::{BinaryOp, Name, UnaryOp};

use crate::registry::{Intrinsic, Method, MethodImpl, TypeRegistry};
use crate::{Type, VectorType};

/// Scalar spellings, including the host-level aliases.
const SCALAR_NAMES: &[(&str, Type)] = &[
    ("bool", Type::Bool),
    ("i8", Type::I8),
    ("i16", Type::I16),
    ("i32", Type::I32),
    ("i64", Type::I64),
    ("u8", Type::U8),
    ("u16", Type::U16),
    ("u32", Type::U32),
    ("u64", Type::U64),
    ("f16", Type::F16),
    ("f32", Type::F32),
    ("f64", Type::F64),
    ("int", Type::I32),
    ("float", Type::F32),
    ("None", Type::Unit),
];

/// Prefixes of the named vector types (`float3`, `uint2`, ...).
const VECTOR_PREFIXES: &[(&str, Type)] = &[
    ("bool", Type::Bool),
    ("short", Type::I16),
    ("ushort", Type::U16),
    ("int", Type::I32),
    ("uint", Type::U32),
    ("long", Type::I64),
    ("ulong", Type::U64),
    ("half", Type::F16),
    ("float", Type::F32),
    ("double", Type::F64),
];

pub(crate) fn seed(registry: &mut TypeRegistry) {
    for (name, ty) in SCALAR_NAMES {
        registry.seed_name(Name::new(name), ty.clone());
    }
    for scalar in &Type::SCALARS {
        seed_scalar_methods(registry, scalar);
    }

    for (prefix, element) in VECTOR_PREFIXES {
        for count in 2..=4 {
            registry.seed_name(
                Name::new(format!("{prefix}{count}")),
                vector_of(element, count),
            );
        }
    }
    for element in &Type::SCALARS {
        for count in 2..=4 {
            seed_vector_methods(registry, element, count);
        }
    }
    tracing::trace!("seeded builtin types");
}

fn vector_of(element: &Type, count: u32) -> Type {
    Type::Vector(VectorType {
        element: Arc::new(element.clone()),
        count,
    })
}

fn binary(op: BinaryOp, name: &str, lhs: &Type, rhs: &Type, ret: &Type) -> Method {
    Method {
        name: Name::new(name),
        params: vec![
            (Name::new("self"), lhs.clone()),
            (Name::new("other"), rhs.clone()),
        ],
        ret: Some(ret.clone()),
        type_params: Vec::new(),
        imp: MethodImpl::Intrinsic(Intrinsic::Binary(op)),
    }
}

fn unary(op: UnaryOp, operand: &Type, ret: &Type) -> Method {
    Method {
        name: Name::new(op.method_name()),
        params: vec![(Name::new("self"), operand.clone())],
        ret: Some(ret.clone()),
        type_params: Vec::new(),
        imp: MethodImpl::Intrinsic(Intrinsic::Unary(op)),
    }
}

/// Install `op` under its forward and reflected names, both taking
/// `(self, rhs)`.
fn both_directions(registry: &mut TypeRegistry, owner: &Type, op: BinaryOp, rhs: &Type, ret: &Type) {
    registry.add_method(owner, binary(op, op.forward_method(), owner, rhs, ret));
    registry.add_method(owner, binary(op, op.reflected_method(), owner, rhs, ret));
}

fn seed_scalar_methods(registry: &mut TypeRegistry, scalar: &Type) {
    for op in BinaryOp::ALL {
        let applies = if op.is_comparison() {
            scalar.is_numeric() || matches!(op, BinaryOp::Eq | BinaryOp::NotEq)
        } else if op.is_bitwise() {
            scalar.is_int()
                || (*scalar == Type::Bool
                    && matches!(op, BinaryOp::BitAnd | BinaryOp::BitOr | BinaryOp::BitXor))
        } else {
            scalar.is_numeric()
        };
        if !applies {
            continue;
        }
        if op.is_comparison() {
            registry.add_method(
                scalar,
                binary(op, op.forward_method(), scalar, scalar, &Type::Bool),
            );
        } else {
            both_directions(registry, scalar, op, scalar, scalar);
        }
    }

    if scalar.is_numeric() {
        registry.add_method(scalar, unary(UnaryOp::Neg, scalar, scalar));
        registry.add_method(scalar, unary(UnaryOp::Pos, scalar, scalar));
    }
    if scalar.is_int() {
        registry.add_method(scalar, unary(UnaryOp::Invert, scalar, scalar));
    }
    if *scalar == Type::Bool {
        registry.add_method(scalar, unary(UnaryOp::Not, scalar, scalar));
    }
}

fn seed_vector_methods(registry: &mut TypeRegistry, element: &Type, count: u32) {
    let vector = vector_of(element, count);
    let mask = vector_of(&Type::Bool, count);

    for op in BinaryOp::ALL {
        if op.is_comparison() {
            if !(element.is_numeric() || matches!(op, BinaryOp::Eq | BinaryOp::NotEq)) {
                continue;
            }
            let method = op.forward_method();
            registry.add_method(&vector, binary(op, method, &vector, &vector, &mask));
            registry.add_method(&vector, binary(op, method, &vector, element, &mask));
            continue;
        }
        let applies = if op.is_bitwise() {
            element.is_int()
                || (*element == Type::Bool
                    && matches!(op, BinaryOp::BitAnd | BinaryOp::BitOr | BinaryOp::BitXor))
        } else {
            element.is_numeric()
        };
        if !applies {
            continue;
        }
        registry.add_method(
            &vector,
            binary(op, op.forward_method(), &vector, &vector, &vector),
        );
        both_directions(registry, &vector, op, element, &vector);
    }

    if element.is_numeric() {
        registry.add_method(&vector, unary(UnaryOp::Neg, &vector, &vector));
        registry.add_method(&vector, unary(UnaryOp::Pos, &vector, &vector));
    }
    if element.is_int() {
        registry.add_method(&vector, unary(UnaryOp::Invert, &vector, &vector));
    }
    if *element == Type::Bool {
        registry.add_method(&vector, unary(UnaryOp::Not, &vector, &vector));
    }
}
