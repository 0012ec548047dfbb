//! Template resolution and type inference.
//!
//! [`GlobalContext`] owns the type registry and the registered free
//! functions. Asking it for a function at concrete argument types
//! ([`GlobalContext::instantiate`]) matches the template, builds its body
//! and infers it; every callee met along the way is instantiated the same
//! way. The result is a table of [`Instance`]s whose functions are fully
//! typed and ready for codegen.

mod context;
mod error;
mod infer;
mod resolve;

pub use context::{GlobalContext, Instance, ResolveState, TemplateKey};
pub use error::{InferErrorKind, TypeInferenceError};
