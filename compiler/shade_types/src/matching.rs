//! Structural matching of template parameters against argument types.
//!
//! Matching walks each declared parameter type alongside the concrete
//! argument type, decomposing shapes that agree (vectors, arrays, pointers,
//! functions, generic struct instantiations) and binding every `Symbolic`
//! placeholder it meets. There is no backtracking: the first binding of a
//! symbol wins and later occurrences must agree with it.
//!
//! Literal placeholders (`{integer}`, `{float}`) are accepted wherever a
//! compatible numeric type is expected. A symbol first bound to a
//! placeholder is refined by a later concrete binding; whatever is still a
//! placeholder after the walk defaults to `i32` / `f32`.

use std::fmt;
use std::sync::Arc;

use rustc_hash::FxHashMap;
use shade_diagnostic::{Diagnostic, ErrorCode};
use shade_ir::Name;
use thiserror::Error;

use crate::{ArrayLen, ArrayType, BoundType, FunctionType, StructType, Type, VectorType};

// ── Substitution ────────────────────────────────────────────────────

/// Bindings produced by a successful match.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Substitution {
    types: FxHashMap<Name, Type>,
    consts: FxHashMap<Name, u32>,
}

impl Substitution {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, symbol: &str) -> Option<&Type> {
        self.types.get(symbol)
    }

    pub fn get_const(&self, symbol: &str) -> Option<u32> {
        self.consts.get(symbol).copied()
    }

    pub fn bind(&mut self, symbol: Name, ty: Type) {
        self.types.insert(symbol, ty);
    }

    pub fn bind_const(&mut self, symbol: Name, value: u32) {
        self.consts.insert(symbol, value);
    }

    /// Drop any binding of `symbol`.
    pub fn remove(&mut self, symbol: &str) {
        self.types.remove(symbol);
        self.consts.remove(symbol);
    }

    /// Add every binding of `other`, overriding existing ones.
    pub fn extend(&mut self, other: &Substitution) {
        self.types
            .extend(other.types.iter().map(|(k, v)| (k.clone(), v.clone())));
        self.consts
            .extend(other.consts.iter().map(|(k, v)| (k.clone(), *v)));
    }

    /// Whether `symbol` is bound either as a type or as a constant.
    pub fn binds(&self, symbol: &str) -> bool {
        self.types.contains_key(symbol) || self.consts.contains_key(symbol)
    }

    pub fn len(&self) -> usize {
        self.types.len() + self.consts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty() && self.consts.is_empty()
    }

    /// Type bindings sorted by symbol, for deterministic iteration.
    pub fn sorted_types(&self) -> Vec<(&Name, &Type)> {
        let mut bindings: Vec<_> = self.types.iter().collect();
        bindings.sort_by(|a, b| a.0.cmp(b.0));
        bindings
    }

    /// Default any literal placeholder bindings.
    fn finalize(&mut self) {
        for ty in self.types.values_mut() {
            if ty.is_literal_placeholder() {
                *ty = ty.defaulted();
            }
        }
    }
}

impl fmt::Display for Substitution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("{")?;
        let mut first = true;
        for (symbol, ty) in self.sorted_types() {
            if !first {
                f.write_str(", ")?;
            }
            first = false;
            write!(f, "{symbol}: {ty}")?;
        }
        let mut consts: Vec<_> = self.consts.iter().collect();
        consts.sort();
        for (symbol, value) in consts {
            if !first {
                f.write_str(", ")?;
            }
            first = false;
            write!(f, "{symbol}: {value}")?;
        }
        f.write_str("}")
    }
}

// ── Errors ──────────────────────────────────────────────────────────

#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum MatchErrorKind {
    #[error("expected {expected} argument(s), found {found}")]
    Arity { expected: usize, found: usize },
    #[error("conflicting bindings for `{symbol}`: `{first}` and `{second}`")]
    Conflict {
        symbol: Name,
        first: Type,
        second: Type,
    },
    #[error("conflicting values for `{symbol}`: {first} and {second}")]
    ConstConflict {
        symbol: Name,
        first: u32,
        second: u32,
    },
    #[error("parameter `{param}` expects `{expected}`, found `{found}`")]
    Mismatch {
        param: Name,
        expected: Type,
        found: Type,
    },
}

/// A failed match, carrying the attempted parameter and argument types.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("cannot match arguments of `{callee}`: {kind}")]
pub struct MatchError {
    pub callee: Name,
    pub kind: MatchErrorKind,
    pub params: Vec<Type>,
    pub args: Vec<Type>,
}

impl MatchError {
    pub fn to_diagnostic(&self) -> Diagnostic {
        let code = match self.kind {
            MatchErrorKind::Arity { .. } => ErrorCode::E2002,
            MatchErrorKind::Conflict { .. } | MatchErrorKind::ConstConflict { .. } => {
                ErrorCode::E2003
            }
            MatchErrorKind::Mismatch { .. } => ErrorCode::E2001,
        };
        Diagnostic::error(code)
            .with_message(self.to_string())
            .with_note(format!("parameters: ({})", join(&self.params)))
            .with_note(format!("arguments:  ({})", join(&self.args)))
    }
}

fn join(types: &[Type]) -> String {
    types
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

// ── Matching ────────────────────────────────────────────────────────

/// Whether a value typed `literal` can stand where `target` is expected.
pub fn accepts_literal(target: &Type, literal: &Type) -> bool {
    match literal {
        Type::GenericInt => {
            target.is_numeric() || matches!(target, Type::GenericInt | Type::GenericFloat)
        }
        Type::GenericFloat => target.is_float() || matches!(target, Type::GenericFloat),
        _ => false,
    }
}

/// Match `args` against the declared `params` of `callee`.
pub fn match_template_args(
    callee: &Name,
    params: &[(Name, Type)],
    args: &[Type],
) -> Result<Substitution, MatchError> {
    let fail = |kind| MatchError {
        callee: callee.clone(),
        kind,
        params: params.iter().map(|(_, ty)| ty.clone()).collect(),
        args: args.to_vec(),
    };

    if params.len() != args.len() {
        return Err(fail(MatchErrorKind::Arity {
            expected: params.len(),
            found: args.len(),
        }));
    }

    let mut matcher = Matcher::default();
    for ((name, param), arg) in params.iter().zip(args) {
        matcher.unify(param, arg).map_err(|clash| {
            fail(match clash {
                Clash::Shape => MatchErrorKind::Mismatch {
                    param: name.clone(),
                    expected: param.clone(),
                    found: arg.clone(),
                },
                Clash::Binding {
                    symbol,
                    first,
                    second,
                } => MatchErrorKind::Conflict {
                    symbol,
                    first,
                    second,
                },
                Clash::Const {
                    symbol,
                    first,
                    second,
                } => MatchErrorKind::ConstConflict {
                    symbol,
                    first,
                    second,
                },
            })
        })?;
    }

    matcher.subst.finalize();
    tracing::trace!(%callee, bindings = %matcher.subst, "matched template arguments");
    Ok(matcher.subst)
}

enum Clash {
    Shape,
    Binding { symbol: Name, first: Type, second: Type },
    Const { symbol: Name, first: u32, second: u32 },
}

#[derive(Default)]
struct Matcher {
    subst: Substitution,
}

impl Matcher {
    fn unify(&mut self, param: &Type, arg: &Type) -> Result<(), Clash> {
        if param == arg {
            return Ok(());
        }
        match (param, arg) {
            (Type::Symbolic(symbol), _) => self.bind(symbol, arg),
            (_, Type::GenericInt | Type::GenericFloat) if accepts_literal(param, arg) => Ok(()),
            (Type::Vector(p), Type::Vector(a)) if p.count == a.count => {
                self.unify(&p.element, &a.element)
            }
            (Type::Array(p), Type::Array(a)) => {
                self.unify_len(&p.count, &a.count)?;
                self.unify(&p.element, &a.element)
            }
            (Type::Pointer(p), Type::Pointer(a)) => self.unify(p, a),
            (Type::Struct(p), Type::Struct(a))
                if p.qualified_name == a.qualified_name
                    && !p.type_args.is_empty()
                    && p.type_args.len() == a.type_args.len() =>
            {
                for (p, a) in p.type_args.iter().zip(&a.type_args) {
                    self.unify(p, a)?;
                }
                Ok(())
            }
            (Type::Bound(p), Type::Bound(a))
                if p.generic == a.generic && p.args.len() == a.args.len() =>
            {
                for (p, a) in p.args.iter().zip(&a.args) {
                    self.unify(p, a)?;
                }
                Ok(())
            }
            (Type::Function(p), Type::Function(a)) if p.params.len() == a.params.len() => {
                for (p, a) in p.params.iter().zip(&a.params) {
                    self.unify(p, a)?;
                }
                self.unify(&p.ret, &a.ret)
            }
            _ => Err(Clash::Shape),
        }
    }

    fn bind(&mut self, symbol: &Name, arg: &Type) -> Result<(), Clash> {
        let Some(existing) = self.subst.types.get(symbol) else {
            tracing::trace!(%symbol, ty = %arg, "bind");
            self.subst.bind(symbol.clone(), arg.clone());
            return Ok(());
        };
        if existing == arg || accepts_literal(existing, arg) {
            return Ok(());
        }
        if accepts_literal(arg, existing) {
            tracing::trace!(%symbol, from = %existing, to = %arg, "refine literal binding");
            self.subst.bind(symbol.clone(), arg.clone());
            return Ok(());
        }
        Err(Clash::Binding {
            symbol: symbol.clone(),
            first: existing.clone(),
            second: arg.clone(),
        })
    }

    fn unify_len(&mut self, param: &ArrayLen, arg: &ArrayLen) -> Result<(), Clash> {
        match (param, arg) {
            (ArrayLen::Known(p), ArrayLen::Known(a)) if p == a => Ok(()),
            (ArrayLen::Symbolic(p), ArrayLen::Symbolic(a)) if p == a => Ok(()),
            (ArrayLen::Symbolic(symbol), ArrayLen::Known(value)) => {
                match self.subst.get_const(symbol) {
                    None => {
                        self.subst.bind_const(symbol.clone(), *value);
                        Ok(())
                    }
                    Some(existing) if existing == *value => Ok(()),
                    Some(existing) => Err(Clash::Const {
                        symbol: symbol.clone(),
                        first: existing,
                        second: *value,
                    }),
                }
            }
            _ => Err(Clash::Shape),
        }
    }
}

// ── Substitution application ────────────────────────────────────────

/// Apply `subst` to every placeholder in `ty`.
pub fn substitute(ty: &Type, subst: &Substitution) -> Type {
    if subst.is_empty() || !ty.contains_symbolic() {
        return ty.clone();
    }
    match ty {
        Type::Symbolic(symbol) => subst.get(symbol).cloned().unwrap_or_else(|| ty.clone()),
        Type::Vector(v) => Type::Vector(VectorType {
            element: Arc::new(substitute(&v.element, subst)),
            count: v.count,
        }),
        Type::Array(a) => {
            let count = match &a.count {
                ArrayLen::Symbolic(symbol) => subst
                    .get_const(symbol)
                    .map_or_else(|| a.count.clone(), ArrayLen::Known),
                known @ ArrayLen::Known(_) => known.clone(),
            };
            Type::Array(Arc::new(ArrayType {
                element: substitute(&a.element, subst),
                count,
            }))
        }
        Type::Pointer(elem) => Type::pointer(substitute(elem, subst)),
        Type::Struct(s) => Type::Struct(Arc::new(StructType {
            name: s.name.clone(),
            qualified_name: s.qualified_name.clone(),
            type_args: s.type_args.iter().map(|t| substitute(t, subst)).collect(),
            fields: s
                .fields
                .iter()
                .map(|(name, t)| (name.clone(), substitute(t, subst)))
                .collect(),
        })),
        Type::Bound(b) => Type::Bound(Arc::new(BoundType {
            generic: Arc::clone(&b.generic),
            args: b.args.iter().map(|t| substitute(t, subst)).collect(),
            instantiated: substitute(&b.instantiated, subst),
        })),
        Type::Function(f) => Type::Function(Arc::new(FunctionType {
            params: f.params.iter().map(|t| substitute(t, subst)).collect(),
            ret: substitute(&f.ret, subst),
        })),
        Type::Parametric(_)
        | Type::Unit
        | Type::Bool
        | Type::Int { .. }
        | Type::Float { .. }
        | Type::GenericInt
        | Type::GenericFloat
        | Type::Opaque(_) => ty.clone(),
    }
}
