use shade_codegen::CodegenOptions;

/// Settings for one [`Compiler`](crate::Compiler).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CompileOptions {
    /// Emit the C++ support header ahead of generated code.
    pub emit_prelude: bool,
    /// Give requested entry points `extern "C"` linkage.
    pub export_entry: bool,
    /// Spaces per indentation level in the output.
    pub indent_width: usize,
}

impl Default for CompileOptions {
    fn default() -> Self {
        CompileOptions {
            emit_prelude: true,
            export_entry: true,
            indent_width: 4,
        }
    }
}

impl CompileOptions {
    #[must_use]
    pub fn with_prelude(mut self, emit_prelude: bool) -> Self {
        self.emit_prelude = emit_prelude;
        self
    }

    #[must_use]
    pub fn with_export_entry(mut self, export_entry: bool) -> Self {
        self.export_entry = export_entry;
        self
    }

    #[must_use]
    pub fn with_indent_width(mut self, indent_width: usize) -> Self {
        self.indent_width = indent_width;
        self
    }

    pub fn codegen(&self) -> CodegenOptions {
        CodegenOptions::default()
            .with_prelude(self.emit_prelude)
            .with_indent_width(self.indent_width)
    }
}
