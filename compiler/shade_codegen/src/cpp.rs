//! C++ emission for fully typed instances.
//!
//! [`CppCodeGen::emit_function`] writes one instance and, before it, every
//! instance it calls. Output is assembled by [`CppCodeGen::finish`] as the
//! prelude, then struct definitions, then functions in emission order.

use rustc_hash::FxHashMap;
use shade_hir::{
    Call, CallOp, Constant, Function, FunctionFlags, InstanceId, NodeId, NodeKind, Ref,
    Resolution, StmtId, StmtKind, Value,
};
use shade_ir::{BinaryOp, UnaryOp};
use shade_typeck::GlobalContext;
use shade_types::{swizzle_index, Intrinsic, Type};

use crate::mangle::Mangling;
use crate::prelude::PRELUDE;
use crate::types::TypeCodeGenCache;
use crate::writer::CodeWriter;
use crate::{CodegenError, CodegenOptions};

/// C++ keywords that are valid Shade identifiers.
const RESERVED: &[&str] = &[
    "auto", "bool", "case", "char", "class", "const", "default", "delete", "do", "double",
    "enum", "explicit", "extern", "float", "goto", "inline", "int", "long", "namespace", "new",
    "operator", "private", "protected", "public", "register", "short", "signed", "sizeof",
    "static", "struct", "switch", "template", "this", "throw", "typedef", "typename", "union",
    "unsigned", "using", "virtual", "void", "volatile",
];

/// Spell a source identifier so it cannot collide with a C++ keyword.
pub(crate) fn identifier(name: &str) -> String {
    if RESERVED.contains(&name) {
        format!("{name}_")
    } else {
        name.to_owned()
    }
}

pub struct CppCodeGen<'ctx> {
    ctx: &'ctx GlobalContext,
    options: CodegenOptions,
    types: TypeCodeGenCache,
    mangling: Mangling,
    /// Symbol of every instance emitted (or being emitted).
    emitted: FxHashMap<InstanceId, String>,
    functions: CodeWriter,
}

impl<'ctx> CppCodeGen<'ctx> {
    pub fn new(ctx: &'ctx GlobalContext, options: CodegenOptions) -> Self {
        CppCodeGen {
            ctx,
            types: TypeCodeGenCache::new(options.indent_width),
            mangling: Mangling::new(),
            emitted: FxHashMap::default(),
            functions: CodeWriter::new(options.indent_width),
            options,
        }
    }

    /// C++ name of `ty`, defining it on first use.
    pub fn type_name(&mut self, ty: &Type) -> Result<String, CodegenError> {
        self.types.name(ty)
    }

    /// Emit instance `id` (after its callees) and return its symbol.
    #[tracing::instrument(level = "debug", skip_all, fields(instance = %id))]
    pub fn emit_function(&mut self, id: InstanceId) -> Result<String, CodegenError> {
        if let Some(symbol) = self.emitted.get(&id) {
            tracing::trace!(%symbol, "function already emitted");
            return Ok(symbol.clone());
        }
        let ctx = self.ctx;
        let function = ctx
            .function(id)
            .ok_or(CodegenError::MissingInstance { id })?;
        if !function.is_fully_typed() {
            return Err(not_fully_typed(function));
        }

        let ret = function.return_type.clone().unwrap_or(Type::Unit);
        let symbol = self
            .mangling
            .mangle_function(&function.name, &ctx.instance(id).params, &ret)?
            .to_owned();
        self.emitted.insert(id, symbol.clone());

        let mut out = CodeWriter::new(self.options.indent_width);
        if let Err(err) = self.write_function(function, &symbol, &ret, &mut out) {
            self.emitted.remove(&id);
            return Err(err);
        }
        self.functions.write(out.as_str());
        tracing::debug!(%symbol, name = %function.name, "emitted function");
        Ok(symbol)
    }

    /// Prelude, struct definitions and functions, in that order.
    pub fn finish(self) -> String {
        let defs = self.types.definitions();
        let functions = self.functions.as_str();
        let mut out = String::with_capacity(PRELUDE.len() + defs.len() + functions.len());
        if self.options.emit_prelude {
            out.push_str(PRELUDE);
        }
        out.push_str(defs);
        out.push_str(functions);
        out
    }

    // ── Functions ───────────────────────────────────────────────────

    fn write_function(
        &mut self,
        f: &Function,
        symbol: &str,
        ret: &Type,
        out: &mut CodeWriter,
    ) -> Result<(), CodegenError> {
        let mut params = Vec::with_capacity(f.params.len());
        for &param in &f.params {
            let var = f.arena.var(param);
            let ty = var.ty.as_ref().ok_or_else(|| not_fully_typed(f))?;
            let ty = self.types.name(ty)?;
            let reference = if var.byval { "" } else { "&" };
            params.push(format!("{ty}{reference} {}", identifier(var.name.as_str())));
        }
        let ret = self.types.name(ret)?;
        let linkage = if f.flags.contains(FunctionFlags::EXPORT) {
            "extern \"C\" "
        } else {
            ""
        };

        out.writeln(&format!(
            "{linkage}auto {symbol}({}) -> {ret} {{",
            params.join(", ")
        ));
        out.indent();
        for &local in &f.locals {
            let var = f.arena.var(local);
            let ty = var.ty.as_ref().ok_or_else(|| not_fully_typed(f))?;
            let ty = self.types.name(ty)?;
            out.writeln(&format!("{ty} {}{{}};", identifier(var.name.as_str())));
        }
        self.write_block(f, &f.body, out)?;
        out.dedent();
        out.writeln("}");
        out.newline();
        Ok(())
    }

    fn write_block(
        &mut self,
        f: &Function,
        body: &[StmtId],
        out: &mut CodeWriter,
    ) -> Result<(), CodegenError> {
        for &stmt in body {
            self.write_stmt(f, stmt, out)?;
        }
        Ok(())
    }

    fn write_stmt(
        &mut self,
        f: &Function,
        id: StmtId,
        out: &mut CodeWriter,
    ) -> Result<(), CodegenError> {
        match &f.arena.stmt(id).kind {
            // Locals are declared at the top of the function.
            StmtKind::VarDecl { .. } => {}
            StmtKind::Assign { target, value, .. } => {
                let target = self.expr(f, *target)?;
                let value = self.expr(f, *value)?;
                out.writeln(&format!("{target} = {value};"));
            }
            StmtKind::Return(Some(value)) => {
                let value = self.expr(f, *value)?;
                out.writeln(&format!("return {value};"));
            }
            StmtKind::Return(None) => out.writeln("return;"),
            StmtKind::If {
                cond,
                then_body,
                else_body,
            } => {
                let cond = self.expr(f, *cond)?;
                out.writeln(&format!("if ({cond}) {{"));
                out.indent();
                self.write_block(f, then_body, out)?;
                out.dedent();
                if else_body.is_empty() {
                    out.writeln("}");
                } else {
                    out.writeln("} else {");
                    out.indent();
                    self.write_block(f, else_body, out)?;
                    out.dedent();
                    out.writeln("}");
                }
            }
        }
        Ok(())
    }

    // ── Expressions ─────────────────────────────────────────────────

    fn expr(&mut self, f: &Function, id: NodeId) -> Result<String, CodegenError> {
        let node = f.arena.node(id);
        match &node.kind {
            NodeKind::Ref(place) => self.place(f, place),
            NodeKind::Value(Value::Load(place)) => self.expr(f, *place),
            NodeKind::Value(Value::Constant(constant)) => {
                let ty = node.ty.as_ref().ok_or_else(|| not_fully_typed(f))?;
                self.constant(constant, ty)
            }
            NodeKind::Value(Value::Call(call)) => self.call(f, id, call),
            NodeKind::Value(Value::SymbolicConstant(_)) => {
                Err(unsupported(f, id, "a symbolic constant"))
            }
        }
    }

    fn place(&mut self, f: &Function, place: &Ref) -> Result<String, CodegenError> {
        match place {
            Ref::Var(var) => Ok(identifier(f.arena.var(*var).name.as_str())),
            Ref::Member { base, field } => {
                let base_ty = f.arena.ty(*base).map(Type::materialized);
                let base_text = self.expr(f, *base)?;
                match (base_ty, swizzle_index(field.as_str())) {
                    (Some(Type::Vector(_)), Some(i)) => Ok(format!("{base_text}[{i}]")),
                    _ => Ok(format!("{base_text}.{}", identifier(field.as_str()))),
                }
            }
            Ref::Index { base, index } => {
                let base = self.expr(f, *base)?;
                let index = self.expr(f, *index)?;
                Ok(format!("{base}[{index}]"))
            }
            Ref::ValueRef(value) => self.expr(f, *value),
        }
    }

    fn constant(&mut self, constant: &Constant, ty: &Type) -> Result<String, CodegenError> {
        Ok(match (constant, ty) {
            (Constant::Bool(b), _) => b.to_string(),
            (Constant::Int(n), Type::Int { bits: 32, signed: true }) => n.to_string(),
            (Constant::Int(n), Type::Float { bits: 32 }) => format!("{n}.0f"),
            (Constant::Int(n), Type::Float { bits: 64 }) => format!("{n}.0"),
            (Constant::Int(n), ty) => format!("{}({n})", self.types.name(ty)?),
            (Constant::Float(x), Type::Float { bits: 32 }) => float_literal(*x, "f"),
            (Constant::Float(x), Type::Float { bits: 64 }) => float_literal(*x, ""),
            (Constant::Float(x), ty) => {
                format!("{}({})", self.types.name(ty)?, float_literal(*x, ""))
            }
        })
    }

    fn call(&mut self, f: &Function, id: NodeId, call: &Call) -> Result<String, CodegenError> {
        let Some(resolution) = &call.resolved else {
            return Err(unsupported(f, id, "an unresolved call"));
        };
        let mut args = Vec::with_capacity(call.args.len());
        for &arg in &call.args {
            args.push(self.expr(f, arg)?);
        }

        match resolution {
            Resolution::Intrinsic { op, .. } => {
                // Operator calls keep their operands in source order even
                // when a reflected method resolved them.
                let op = match (&call.op, op) {
                    (CallOp::Binary(source), _) => Intrinsic::Binary(*source),
                    (CallOp::Unary(source), _) => Intrinsic::Unary(*source),
                    (_, op) => *op,
                };
                match (op, args.as_slice()) {
                    (Intrinsic::Binary(op), [lhs, rhs]) => {
                        let float = call.args.iter().any(|&a| is_float_valued(f, a));
                        Ok(binary(op, lhs, rhs, float))
                    }
                    (Intrinsic::Unary(op), [operand]) => Ok(unary(op, operand)),
                    _ => Err(unsupported(f, id, "an operator with this many operands")),
                }
            }
            Resolution::Instance(callee) => {
                let symbol = self.emit_function(*callee)?;
                Ok(format!("{symbol}({})", args.join(", ")))
            }
            Resolution::Construct(ty) => {
                let name = self.types.name(ty)?;
                if ty.is_scalar() {
                    Ok(format!("{name}({})", args.join(", ")))
                } else {
                    Ok(format!("{name}{{{}}}", args.join(", ")))
                }
            }
        }
    }
}

fn binary(op: BinaryOp, lhs: &str, rhs: &str, float: bool) -> String {
    match op {
        BinaryOp::Pow => format!("__pow({lhs}, {rhs})"),
        BinaryOp::FloorDiv => format!("__floordiv({lhs}, {rhs})"),
        BinaryOp::Mod if float => format!("__fmod({lhs}, {rhs})"),
        op => format!("({lhs} {} {rhs})", op.as_symbol()),
    }
}

fn unary(op: UnaryOp, operand: &str) -> String {
    let symbol = match op {
        UnaryOp::Neg => "-",
        UnaryOp::Pos => "+",
        UnaryOp::Invert => "~",
        UnaryOp::Not => "!",
    };
    format!("({symbol}{operand})")
}

fn float_literal(x: f64, suffix: &str) -> String {
    if x.is_nan() {
        "NAN".to_owned()
    } else if x.is_infinite() {
        let inf = if x.is_sign_positive() { "INFINITY" } else { "-INFINITY" };
        inf.to_owned()
    } else {
        format!("{x:?}{suffix}")
    }
}

fn is_float_valued(f: &Function, id: NodeId) -> bool {
    f.arena.ty(id).map(Type::materialized).is_some_and(|ty| {
        ty.is_float() || ty.element().is_some_and(Type::is_float)
    })
}

fn not_fully_typed(f: &Function) -> CodegenError {
    CodegenError::NotFullyTyped {
        function: f.name.clone(),
        span: f.span.clone(),
    }
}

fn unsupported(f: &Function, id: NodeId, what: &'static str) -> CodegenError {
    CodegenError::UnsupportedNode {
        function: f.name.clone(),
        what,
        span: f.arena.node(id).span.clone(),
    }
}
