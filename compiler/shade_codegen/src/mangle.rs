//! Symbol mangling.
//!
//! Every emitted function is named after its qualified source name and its
//! monomorphized signature, so two instances of one template never share a
//! symbol.
//!
//! ```text
//! shade_<name><signature>
//!
//! name       N <len><component>... E        N4demo3addE
//! signature  F <ret> <params>... E          Ff32f32f32E
//! ```
//!
//! | Type | Code |
//! |------|------|
//! | `()` | `v` |
//! | `bool` | `b` |
//! | `i32`, `u8`, `f32` | `i32`, `u8`, `f32` |
//! | `vec<T, N>` | `V<N><T>` |
//! | `[T; N]` | `A<N><T>` |
//! | `*T` | `P<T>` |
//! | struct | `S<name>`, then `T<args>...E` when generic |
//! | `fn(..) -> R` | `F<R><params>...E` |
//! | opaque | `O<name>` |

use std::fmt::Write;

use rustc_hash::FxHashMap;
use shade_ir::Name;
use shade_types::{ArrayLen, Type};

use crate::CodegenError;

/// Prefix of every function symbol and struct name.
pub const MANGLE_PREFIX: &str = "shade_";

/// Memoizing mangler, one per codegen run.
#[derive(Default)]
pub struct Mangling {
    functions: FxHashMap<(Name, Vec<Type>), String>,
}

impl Mangling {
    pub fn new() -> Self {
        Self::default()
    }

    /// Symbol of the function `name` instantiated at `params`.
    pub fn mangle_function(
        &mut self,
        name: &Name,
        params: &[Type],
        ret: &Type,
    ) -> Result<&str, CodegenError> {
        let key = (name.clone(), params.to_vec());
        if !self.functions.contains_key(&key) {
            let mut symbol = String::with_capacity(64);
            symbol.push_str(MANGLE_PREFIX);
            encode_name(&mut symbol, name);
            encode_signature(&mut symbol, params, ret)?;
            tracing::trace!(%name, %symbol, "mangled function");
            self.functions.insert(key.clone(), symbol);
        }
        Ok(self.functions.get(&key).map_or("", String::as_str))
    }
}

/// `N<len><component>...E` over the dotted components of `name`.
pub(crate) fn encode_name(out: &mut String, name: &Name) {
    out.push('N');
    for component in name.components() {
        let _ = write!(out, "{}", component.len());
        for c in component.chars() {
            out.push(if c.is_ascii_alphanumeric() { c } else { '_' });
        }
    }
    out.push('E');
}

fn encode_signature(out: &mut String, params: &[Type], ret: &Type) -> Result<(), CodegenError> {
    out.push('F');
    encode_type(out, ret)?;
    for param in params {
        encode_type(out, param)?;
    }
    out.push('E');
    Ok(())
}

pub(crate) fn encode_type(out: &mut String, ty: &Type) -> Result<(), CodegenError> {
    match ty {
        Type::Unit => out.push('v'),
        Type::Bool => out.push('b'),
        Type::Int { .. } | Type::Float { .. } => {
            let _ = write!(out, "{ty}");
        }
        Type::Vector(v) => {
            let _ = write!(out, "V{}", v.count());
            encode_type(out, v.element())?;
        }
        Type::Array(a) => {
            let ArrayLen::Known(n) = a.count else {
                return Err(CodegenError::UnsupportedType { ty: ty.clone() });
            };
            let _ = write!(out, "A{n}");
            encode_type(out, &a.element)?;
        }
        Type::Pointer(elem) => {
            out.push('P');
            encode_type(out, elem)?;
        }
        Type::Struct(s) => {
            out.push('S');
            encode_name(out, &s.qualified_name);
            if !s.type_args.is_empty() {
                out.push('T');
                for arg in &s.type_args {
                    encode_type(out, arg)?;
                }
                out.push('E');
            }
        }
        Type::Bound(b) => encode_type(out, &b.instantiated)?,
        Type::Function(f) => encode_signature(out, &f.params, &f.ret)?,
        Type::Opaque(name) => {
            out.push('O');
            encode_name(out, name);
        }
        Type::GenericInt | Type::GenericFloat | Type::Symbolic(_) | Type::Parametric(_) => {
            return Err(CodegenError::UnsupportedType { ty: ty.clone() });
        }
    }
    Ok(())
}
