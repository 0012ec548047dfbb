//! C++ code generation for Shade.
//!
//! # Architecture
//!
//! ```text
//! GlobalContext (fully typed instances)
//!        ↓
//!   CppCodeGen::emit_function   (callees first, memoized per instance)
//!        ↓                       TypeCodeGenCache: type names + struct defs
//!        ↓                       Mangling: function symbols
//!   CppCodeGen::finish          (prelude + defs + functions)
//! ```
//!
//! Caches live on the [`CppCodeGen`] value, so independent runs never see
//! each other's state.

mod cpp;
mod error;
pub mod mangle;
mod prelude;
mod types;
mod writer;

pub use cpp::CppCodeGen;
pub use error::CodegenError;
pub use mangle::Mangling;
pub use prelude::PRELUDE;
pub use types::TypeCodeGenCache;
pub use writer::CodeWriter;

/// Output settings for a codegen run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CodegenOptions {
    /// Emit the support header ahead of generated code.
    pub emit_prelude: bool,
    /// Spaces per indentation level.
    pub indent_width: usize,
}

impl Default for CodegenOptions {
    fn default() -> Self {
        CodegenOptions {
            emit_prelude: true,
            indent_width: 4,
        }
    }
}

impl CodegenOptions {
    #[must_use]
    pub fn with_prelude(mut self, emit_prelude: bool) -> Self {
        self.emit_prelude = emit_prelude;
        self
    }

    #[must_use]
    pub fn with_indent_width(mut self, indent_width: usize) -> Self {
        self.indent_width = indent_width;
        self
    }
}
