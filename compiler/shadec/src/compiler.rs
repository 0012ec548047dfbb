use shade_codegen::CppCodeGen;
use shade_hir::{FunctionFlags, InstanceId};
use shade_ir::ast::{ClassDecl, FuncDecl};
use shade_ir::Name;
use shade_typeck::GlobalContext;
use shade_types::Type;

use crate::{CompileError, CompileOptions};

/// Generated C++ for a set of entry points.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CompiledUnit {
    pub source: String,
    /// Symbol of each requested entry point, in request order.
    pub symbols: Vec<String>,
}

/// Owns the compilation context and turns entry-point requests into C++.
///
/// Classes and functions are registered up front; each [`compile`] call
/// instantiates its entry points at the given argument types and emits
/// them together with everything they call.
///
/// [`compile`]: Compiler::compile
pub struct Compiler {
    ctx: GlobalContext,
    options: CompileOptions,
}

impl Compiler {
    pub fn new(options: CompileOptions) -> Self {
        Self::with_context(GlobalContext::new(), options)
    }

    pub fn with_context(ctx: GlobalContext, options: CompileOptions) -> Self {
        Compiler { ctx, options }
    }

    pub fn context(&self) -> &GlobalContext {
        &self.ctx
    }

    pub fn options(&self) -> &CompileOptions {
        &self.options
    }

    pub fn register_class(&mut self, decl: &ClassDecl) -> Result<Type, CompileError> {
        Ok(self.ctx.register_class(decl)?)
    }

    pub fn register_function(&mut self, decl: &FuncDecl) -> Result<(), CompileError> {
        Ok(self.ctx.register_function(decl)?)
    }

    /// The concrete type of generic class `name` at `args`, for use as an
    /// entry-point argument type.
    pub fn instantiate_class(&mut self, name: &str, args: &[Type]) -> Result<Type, CompileError> {
        Ok(self.ctx.registry.instantiate_class(&Name::new(name), args)?)
    }

    /// Compile one entry point at `args`.
    pub fn compile(&mut self, entry: &str, args: &[Type]) -> Result<CompiledUnit, CompileError> {
        self.compile_many(&[(Name::new(entry), args.to_vec())])
    }

    /// Compile several entry points into one translation unit.
    #[tracing::instrument(level = "debug", skip_all, fields(entries = entries.len()))]
    pub fn compile_many(
        &mut self,
        entries: &[(Name, Vec<Type>)],
    ) -> Result<CompiledUnit, CompileError> {
        let mut ids: Vec<InstanceId> = Vec::with_capacity(entries.len());
        for (name, args) in entries {
            let id = self.ctx.instantiate(name, args)?;
            if self.options.export_entry {
                if let Some(function) = self.ctx.function_mut(id) {
                    function.flags |= FunctionFlags::EXPORT;
                }
            }
            ids.push(id);
        }

        let mut codegen = CppCodeGen::new(&self.ctx, self.options.codegen());
        let mut symbols = Vec::with_capacity(ids.len());
        for id in ids {
            symbols.push(codegen.emit_function(id)?);
        }
        let source = codegen.finish();
        tracing::debug!(bytes = source.len(), "compiled unit");
        Ok(CompiledUnit { source, symbols })
    }
}

impl Default for Compiler {
    fn default() -> Self {
        Self::new(CompileOptions::default())
    }
}
