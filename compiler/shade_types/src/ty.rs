//! The DSL type model.
//!
//! [`Type`] is an immutable, value-compared sum type. Composite variants
//! share their payload through `Arc`, so cloning a type is cheap and two
//! independently built types compare equal whenever their structure does.
//!
//! Two variants deviate from plain structural equality:
//! - [`ParametricType`] compares (and hashes) by name only, since its body
//!   may refer back to itself.
//! - `Opaque` carries nothing but its name.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use shade_ir::Name;
use thiserror::Error;

// ── Errors ──────────────────────────────────────────────────────────

/// Rejected construction of a builtin type.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum TypeError {
    #[error("vector width must be 2, 3 or 4, got {count}")]
    VectorWidth { count: u32 },
    #[error("vector element must be a scalar type, got `{element}`")]
    VectorElement { element: Type },
}

// ── Type ────────────────────────────────────────────────────────────

#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub enum Type {
    Unit,
    Bool,
    Int { bits: u8, signed: bool },
    Float { bits: u8 },
    /// Untyped integer literal; refined at first use, defaults to `i32`.
    GenericInt,
    /// Untyped float literal; refined at first use, defaults to `f32`.
    GenericFloat,
    Vector(VectorType),
    Array(Arc<ArrayType>),
    Pointer(Arc<Type>),
    Struct(Arc<StructType>),
    /// Placeholder for a not-yet-bound generic parameter.
    Symbolic(Name),
    Parametric(Arc<ParametricType>),
    Bound(Arc<BoundType>),
    Function(Arc<FunctionType>),
    Opaque(Name),
}

impl Type {
    pub const I8: Type = Type::Int { bits: 8, signed: true };
    pub const I16: Type = Type::Int { bits: 16, signed: true };
    pub const I32: Type = Type::Int { bits: 32, signed: true };
    pub const I64: Type = Type::Int { bits: 64, signed: true };
    pub const U8: Type = Type::Int { bits: 8, signed: false };
    pub const U16: Type = Type::Int { bits: 16, signed: false };
    pub const U32: Type = Type::Int { bits: 32, signed: false };
    pub const U64: Type = Type::Int { bits: 64, signed: false };
    pub const F16: Type = Type::Float { bits: 16 };
    pub const F32: Type = Type::Float { bits: 32 };
    pub const F64: Type = Type::Float { bits: 64 };

    /// Every builtin scalar, in registration order.
    pub const SCALARS: [Type; 12] = [
        Type::Bool,
        Type::I8,
        Type::I16,
        Type::I32,
        Type::I64,
        Type::U8,
        Type::U16,
        Type::U32,
        Type::U64,
        Type::F16,
        Type::F32,
        Type::F64,
    ];

    pub fn vector(element: Type, count: u32) -> Result<Type, TypeError> {
        VectorType::new(element, count).map(Type::Vector)
    }

    pub fn array(element: Type, count: ArrayLen) -> Type {
        Type::Array(Arc::new(ArrayType { element, count }))
    }

    pub fn pointer(element: Type) -> Type {
        Type::Pointer(Arc::new(element))
    }

    pub fn function(params: Vec<Type>, ret: Type) -> Type {
        Type::Function(Arc::new(FunctionType { params, ret }))
    }

    pub fn symbolic(name: impl Into<Name>) -> Type {
        Type::Symbolic(name.into())
    }

    pub fn opaque(name: impl Into<Name>) -> Type {
        Type::Opaque(name.into())
    }

    // ── Classification ──────────────────────────────────────────────

    pub fn is_int(&self) -> bool {
        matches!(self, Type::Int { .. })
    }

    pub fn is_float(&self) -> bool {
        matches!(self, Type::Float { .. })
    }

    pub fn is_numeric(&self) -> bool {
        self.is_int() || self.is_float()
    }

    /// `bool`, integers and floats.
    pub fn is_scalar(&self) -> bool {
        matches!(self, Type::Bool | Type::Int { .. } | Type::Float { .. })
    }

    pub fn is_literal_placeholder(&self) -> bool {
        matches!(self, Type::GenericInt | Type::GenericFloat)
    }

    /// Replace a literal placeholder with its default concrete type.
    #[must_use]
    pub fn defaulted(&self) -> Type {
        match self {
            Type::GenericInt => Type::I32,
            Type::GenericFloat => Type::F32,
            other => other.clone(),
        }
    }

    /// True if the type mentions a generic parameter anywhere.
    pub fn contains_symbolic(&self) -> bool {
        match self {
            Type::Symbolic(_) | Type::Parametric(_) => true,
            Type::Vector(v) => v.element.contains_symbolic(),
            Type::Array(a) => {
                matches!(a.count, ArrayLen::Symbolic(_)) || a.element.contains_symbolic()
            }
            Type::Pointer(elem) => elem.contains_symbolic(),
            Type::Struct(s) => {
                s.type_args.iter().any(Type::contains_symbolic)
                    || s.fields.iter().any(|(_, ty)| ty.contains_symbolic())
            }
            Type::Bound(b) => b.args.iter().any(Type::contains_symbolic),
            Type::Function(f) => {
                f.params.iter().any(Type::contains_symbolic) || f.ret.contains_symbolic()
            }
            Type::Unit
            | Type::Bool
            | Type::Int { .. }
            | Type::Float { .. }
            | Type::GenericInt
            | Type::GenericFloat
            | Type::Opaque(_) => false,
        }
    }

    /// Fully resolved: no generic parameters and no literal placeholders.
    pub fn is_concrete(&self) -> bool {
        !self.contains_symbolic() && !self.contains_placeholder()
    }

    fn contains_placeholder(&self) -> bool {
        match self {
            Type::GenericInt | Type::GenericFloat => true,
            Type::Vector(v) => v.element.contains_placeholder(),
            Type::Array(a) => a.element.contains_placeholder(),
            Type::Pointer(elem) => elem.contains_placeholder(),
            Type::Struct(s) => s.fields.iter().any(|(_, ty)| ty.contains_placeholder()),
            Type::Function(f) => {
                f.params.iter().any(Type::contains_placeholder) || f.ret.contains_placeholder()
            }
            _ => false,
        }
    }

    /// Element type of an indexable type.
    pub fn element(&self) -> Option<&Type> {
        match self {
            Type::Vector(v) => Some(&v.element),
            Type::Array(a) => Some(&a.element),
            Type::Pointer(elem) => Some(elem),
            Type::Bound(b) => b.instantiated.element(),
            _ => None,
        }
    }

    /// Struct view, looking through bound instantiations.
    pub fn as_struct(&self) -> Option<&StructType> {
        match self {
            Type::Struct(s) => Some(s),
            Type::Bound(b) => b.instantiated.as_struct(),
            _ => None,
        }
    }

    /// Type of a named struct field.
    pub fn field(&self, name: &str) -> Option<&Type> {
        self.as_struct()?.field(name)
    }

    /// Strip a `Bound` wrapper down to the concrete instantiation.
    pub fn materialized(&self) -> &Type {
        match self {
            Type::Bound(b) => b.instantiated.materialized(),
            other => other,
        }
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Unit => f.write_str("()"),
            Type::Bool => f.write_str("bool"),
            Type::Int { bits, signed } => {
                write!(f, "{}{bits}", if *signed { 'i' } else { 'u' })
            }
            Type::Float { bits } => write!(f, "f{bits}"),
            Type::GenericInt => f.write_str("{integer}"),
            Type::GenericFloat => f.write_str("{float}"),
            Type::Vector(v) => write!(f, "vec<{}, {}>", v.element, v.count),
            Type::Array(a) => write!(f, "[{}; {}]", a.element, a.count),
            Type::Pointer(elem) => write!(f, "*{elem}"),
            Type::Struct(s) => {
                f.write_str(s.name.as_str())?;
                write_args(f, &s.type_args)
            }
            Type::Symbolic(name) | Type::Opaque(name) => write!(f, "{name}"),
            Type::Parametric(p) => {
                f.write_str(p.name.short())?;
                f.write_str("[")?;
                for (i, param) in p.params.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", param.symbol.name())?;
                }
                f.write_str("]")
            }
            Type::Bound(b) => write!(f, "{}", b.instantiated),
            Type::Function(func) => {
                f.write_str("fn(")?;
                for (i, param) in func.params.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{param}")?;
                }
                write!(f, ") -> {}", func.ret)
            }
        }
    }
}

fn write_args(f: &mut fmt::Formatter<'_>, args: &[Type]) -> fmt::Result {
    if args.is_empty() {
        return Ok(());
    }
    f.write_str("[")?;
    for (i, arg) in args.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{arg}")?;
    }
    f.write_str("]")
}

// ── Payloads ────────────────────────────────────────────────────────

/// A 2-, 3- or 4-wide vector of scalars.
///
/// Fields are private so every vector goes through [`VectorType::new`].
/// The element may also be a generic parameter inside templates.
#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub struct VectorType {
    pub(crate) element: Arc<Type>,
    pub(crate) count: u32,
}

impl VectorType {
    pub fn new(element: Type, count: u32) -> Result<Self, TypeError> {
        if !(2..=4).contains(&count) {
            return Err(TypeError::VectorWidth { count });
        }
        if !(element.is_scalar() || matches!(element, Type::Symbolic(_))) {
            return Err(TypeError::VectorElement { element });
        }
        Ok(VectorType {
            element: Arc::new(element),
            count,
        })
    }

    #[inline]
    pub fn element(&self) -> &Type {
        &self.element
    }

    #[inline]
    pub fn count(&self) -> u32 {
        self.count
    }
}

/// Array length: a literal or a constant generic parameter.
#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub enum ArrayLen {
    Known(u32),
    Symbolic(Name),
}

impl fmt::Display for ArrayLen {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArrayLen::Known(n) => write!(f, "{n}"),
            ArrayLen::Symbolic(name) => write!(f, "{name}"),
        }
    }
}

#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub struct ArrayType {
    pub element: Type,
    pub count: ArrayLen,
}

#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub struct StructType {
    /// Short name (`Point`).
    pub name: Name,
    /// Qualified name (`demo.Point`).
    pub qualified_name: Name,
    /// Arguments this struct was instantiated with; empty if not generic.
    pub type_args: Vec<Type>,
    pub fields: Vec<(Name, Type)>,
}

impl StructType {
    pub fn field(&self, name: &str) -> Option<&Type> {
        self.fields
            .iter()
            .find(|(field, _)| field.as_str() == name)
            .map(|(_, ty)| ty)
    }
}

/// Symbol introduced by a generic parameter.
#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub enum TypeParamSymbol {
    /// Stands for a type.
    Type(Name),
    /// Stands for a compile-time integer.
    Const(Name),
}

impl TypeParamSymbol {
    pub fn name(&self) -> &Name {
        match self {
            TypeParamSymbol::Type(name) | TypeParamSymbol::Const(name) => name,
        }
    }
}

#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub struct TypeParameter {
    pub symbol: TypeParamSymbol,
    /// Allowed bindings; empty means unconstrained.
    pub bound: Vec<Type>,
}

impl TypeParameter {
    pub fn unbounded(symbol: TypeParamSymbol) -> Self {
        TypeParameter {
            symbol,
            bound: Vec::new(),
        }
    }

    /// Whether `ty` may bind this parameter.
    pub fn admits(&self, ty: &Type) -> bool {
        self.bound.is_empty() || self.bound.iter().any(|b| b == ty)
    }
}

/// An uninstantiated generic definition.
#[derive(Clone, Debug)]
pub struct ParametricType {
    pub name: Name,
    pub params: Vec<TypeParameter>,
    /// The definition with its parameters left as `Symbolic` placeholders.
    pub body: Type,
}

impl PartialEq for ParametricType {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Eq for ParametricType {}

impl Hash for ParametricType {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.hash(state);
    }
}

/// One concrete instantiation of a [`ParametricType`].
#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub struct BoundType {
    pub generic: Arc<ParametricType>,
    pub args: Vec<Type>,
    pub instantiated: Type,
}

#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub struct FunctionType {
    pub params: Vec<Type>,
    pub ret: Type,
}

#[cfg(test)]
#[allow(clippy::unwrap_used, reason = "test assertions use unwrap for clarity")]
mod tests;
