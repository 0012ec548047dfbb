//! Signature algebra.
//!
//! Declarations reach the compiler with their type hints already translated
//! into [`VarType`]. The type registry lowers these into concrete `Type`s;
//! nothing past that boundary inspects host-language metadata.

use std::fmt;

use crate::Name;

/// Value carried by a literal type hint (`Array[f32, 4]` carries `4`).
#[derive(Clone, Eq, PartialEq, Hash, Debug)]
pub enum LiteralValue {
    Int(i64),
    Bool(bool),
    Str(Name),
}

impl fmt::Display for LiteralValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LiteralValue::Int(v) => write!(f, "{v}"),
            LiteralValue::Bool(v) => write!(f, "{v}"),
            LiteralValue::Str(v) => write!(f, "{v:?}"),
        }
    }
}

/// A type hint as written on a declaration.
#[derive(Clone, Eq, PartialEq, Hash, Debug)]
pub enum VarType {
    /// A type variable of the enclosing generic class or function.
    TypeVar(Name),
    /// A named, non-generic type (`f32`, `float3`, `demo.Point`).
    Concrete(Name),
    /// A generic origin applied to arguments (`Array[f32, 4]`, `Vec2[T]`).
    Instance { origin: Name, args: Vec<VarType> },
    Union(Vec<VarType>),
    Any,
    SelfType,
    Literal(LiteralValue),
    /// A hint wrapped with metadata; only `inner` participates in typing.
    Annotated {
        inner: Box<VarType>,
        metadata: Vec<Name>,
    },
}

impl VarType {
    pub fn var(name: impl Into<Name>) -> Self {
        VarType::TypeVar(name.into())
    }

    pub fn concrete(name: impl Into<Name>) -> Self {
        VarType::Concrete(name.into())
    }

    pub fn instance(origin: impl Into<Name>, args: Vec<VarType>) -> Self {
        VarType::Instance {
            origin: origin.into(),
            args,
        }
    }

    /// Replace type variables found in `bindings`.
    #[must_use]
    pub fn substitute(&self, bindings: &[(Name, VarType)]) -> VarType {
        match self {
            VarType::TypeVar(name) => bindings
                .iter()
                .find(|(var, _)| var == name)
                .map_or_else(|| self.clone(), |(_, ty)| ty.clone()),
            VarType::Instance { origin, args } => VarType::Instance {
                origin: origin.clone(),
                args: args.iter().map(|a| a.substitute(bindings)).collect(),
            },
            VarType::Union(members) => {
                VarType::Union(members.iter().map(|m| m.substitute(bindings)).collect())
            }
            VarType::Annotated { inner, metadata } => VarType::Annotated {
                inner: Box::new(inner.substitute(bindings)),
                metadata: metadata.clone(),
            },
            VarType::Concrete(_) | VarType::Any | VarType::SelfType | VarType::Literal(_) => {
                self.clone()
            }
        }
    }

    /// Collect type variable names in first-occurrence order.
    pub fn collect_type_vars(&self, out: &mut Vec<Name>) {
        match self {
            VarType::TypeVar(name) => {
                if !out.contains(name) {
                    out.push(name.clone());
                }
            }
            VarType::Instance { args, .. } => {
                for arg in args {
                    arg.collect_type_vars(out);
                }
            }
            VarType::Union(members) => {
                for member in members {
                    member.collect_type_vars(out);
                }
            }
            VarType::Annotated { inner, .. } => inner.collect_type_vars(out),
            VarType::Concrete(_) | VarType::Any | VarType::SelfType | VarType::Literal(_) => {}
        }
    }
}

impl fmt::Display for VarType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VarType::TypeVar(name) | VarType::Concrete(name) => write!(f, "{name}"),
            VarType::Instance { origin, args } => {
                write!(f, "{origin}[")?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{arg}")?;
                }
                f.write_str("]")
            }
            VarType::Union(members) => {
                for (i, member) in members.iter().enumerate() {
                    if i > 0 {
                        f.write_str(" | ")?;
                    }
                    write!(f, "{member}")?;
                }
                Ok(())
            }
            VarType::Any => f.write_str("Any"),
            VarType::SelfType => f.write_str("Self"),
            VarType::Literal(value) => write!(f, "Literal[{value}]"),
            VarType::Annotated { inner, .. } => write!(f, "Annotated[{inner}, ...]"),
        }
    }
}
