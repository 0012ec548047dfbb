//! Type model for the Shade compiler.
//!
//! - [`Type`]: immutable, structurally compared DSL types
//! - [`layout`]: size and alignment rules
//! - [`matching`]: structural template matching and substitution
//! - [`reflect`]: normalized class and function signatures
//! - [`TypeRegistry`]: host names, method tables, generic instantiation

mod builtins;
pub mod layout;
pub mod matching;
pub mod reflect;
mod registry;
mod ty;

pub use layout::{LayoutError, POINTER_SIZE};
pub use matching::{
    accepts_literal, match_template_args, substitute, MatchError, MatchErrorKind, Substitution,
};
pub use reflect::{ClassSignature, FunctionSignature, MethodSignature, RegistrationError};
pub use registry::{
    swizzle_index, Intrinsic, Method, MethodImpl, SourceMethod, TypeRegistry,
    ARRAY_ORIGIN, POINTER_ORIGIN, VECTOR_ORIGIN,
};
pub use ty::{
    ArrayLen, ArrayType, BoundType, FunctionType, ParametricType, StructType, Type, TypeError,
    TypeParamSymbol, TypeParameter, VectorType,
};
