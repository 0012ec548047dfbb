//! Lowering from the surface AST to HIR.
//!
//! The builder is purely structural: it allocates nodes, resolves local
//! variable names to [`VarId`]s and turns operators into unresolved calls.
//! Types, apart from those written in the signature and in annotations, are
//! left for the inferencer.
//!
//! Variables have function scope. The first assignment to an unknown name
//! declares a local, wherever in the body it happens.

use rustc_hash::FxHashMap;
use shade_diagnostic::{Diagnostic, ErrorCode};
use shade_ir::ast::{Callee, Expr, ExprKind, FuncDecl, Stmt as AstStmt, StmtKind as AstStmtKind};
use shade_ir::{Name, Span, VarType};
use shade_types::{RegistrationError, Type};
use smallvec::SmallVec;
use thiserror::Error;

use crate::arena::Arena;
use crate::function::{Function, FunctionFlags};
use crate::node::{
    Call, CallKind, CallOp, Constant, Ref, Stmt, StmtKind, Value, Var, VarKind,
};
use crate::{NodeId, StmtId, VarId};

// ── Errors ──────────────────────────────────────────────────────────

#[derive(Clone, Debug, PartialEq, Error)]
pub enum BuildError {
    #[error("undefined variable `{name}`")]
    UndefinedVariable { name: Name, span: Span },
    #[error("invalid assignment target")]
    InvalidAssignTarget { span: Span },
    #[error("`{name}` is already declared")]
    Redeclared { name: Name, span: Span },
    #[error(transparent)]
    Hint(#[from] RegistrationError),
}

impl BuildError {
    pub fn span(&self) -> Option<&Span> {
        match self {
            BuildError::UndefinedVariable { span, .. }
            | BuildError::InvalidAssignTarget { span }
            | BuildError::Redeclared { span, .. } => Some(span).filter(|s| !s.is_dummy()),
            BuildError::Hint(_) => None,
        }
    }

    pub fn to_diagnostic(&self) -> Diagnostic {
        match self {
            BuildError::Hint(err) => err.to_diagnostic(),
            BuildError::UndefinedVariable { .. } => Diagnostic::error(ErrorCode::E2007)
                .with_message(self.to_string())
                .with_optional_label(self.span(), "not assigned before this use"),
            BuildError::InvalidAssignTarget { .. } => Diagnostic::error(ErrorCode::E2001)
                .with_message(self.to_string())
                .with_optional_label(self.span(), "cannot assign to this expression")
                .with_note("only variables, fields and elements can be assigned"),
            BuildError::Redeclared { .. } => Diagnostic::error(ErrorCode::E2001)
                .with_message(self.to_string())
                .with_optional_label(self.span(), "declared again here"),
        }
    }
}

// ── Inputs ──────────────────────────────────────────────────────────

/// Resolves type hints met inside a body (annotations, constructor calls).
pub trait HintResolver {
    fn resolve_hint(&mut self, hint: &VarType) -> Result<Type, RegistrationError>;
}

#[derive(Clone, Debug, PartialEq)]
pub struct ParamSpec {
    pub name: Name,
    /// `None` while the parameter is still generic.
    pub ty: Option<Type>,
    pub by_ref: bool,
}

/// The already-lowered signature a body is built against.
#[derive(Clone, Debug, PartialEq)]
pub struct Signature {
    pub name: Name,
    pub params: Vec<ParamSpec>,
    pub return_type: Option<Type>,
    /// Constant generic parameters, usable as values in the body.
    pub const_params: Vec<Name>,
    pub flags: FunctionFlags,
    pub span: Span,
}

// ── Builder ─────────────────────────────────────────────────────────

/// Build the HIR of `decl`'s body against `signature`.
#[tracing::instrument(level = "debug", skip_all, fields(function = %signature.name))]
pub fn build_function(
    decl: &FuncDecl,
    signature: Signature,
    resolver: &mut dyn HintResolver,
) -> Result<Function, BuildError> {
    let mut builder = Builder {
        arena: Arena::new(),
        scope: FxHashMap::default(),
        locals: Vec::new(),
        consts: &signature.const_params,
        resolver,
    };

    let mut params = Vec::with_capacity(signature.params.len());
    for param in &signature.params {
        let id = builder.arena.add_var(Var {
            name: param.name.clone(),
            ty: param.ty.clone(),
            byval: !param.by_ref,
            kind: VarKind::Param,
        });
        builder.scope.insert(param.name.clone(), id);
        params.push(id);
    }

    let body = builder.lower_block(&decl.body)?;
    tracing::trace!(
        nodes = builder.arena.node_count(),
        locals = builder.locals.len(),
        "built body"
    );

    let Builder { arena, locals, .. } = builder;
    Ok(Function {
        name: signature.name,
        params,
        return_type: signature.return_type,
        body,
        locals,
        flags: signature.flags,
        arena,
        span: signature.span,
    })
}

struct Builder<'a, 'r> {
    arena: Arena,
    scope: FxHashMap<Name, VarId>,
    locals: Vec<VarId>,
    consts: &'a [Name],
    resolver: &'r mut dyn HintResolver,
}

impl Builder<'_, '_> {
    fn lower_block(&mut self, stmts: &[AstStmt]) -> Result<Vec<StmtId>, BuildError> {
        stmts.iter().map(|stmt| self.lower_stmt(stmt)).collect()
    }

    fn lower_stmt(&mut self, stmt: &AstStmt) -> Result<StmtId, BuildError> {
        let kind = match &stmt.kind {
            AstStmtKind::Assign {
                target,
                annotation,
                value,
            } => {
                let value = self.lower_value(value)?;
                let expected_type = match annotation {
                    Some(hint) => Some(self.resolver.resolve_hint(hint)?),
                    None => None,
                };
                let target = self.lower_target(target)?;
                StmtKind::Assign {
                    target,
                    expected_type,
                    value,
                }
            }
            AstStmtKind::Declare { name, annotation } => {
                if self.scope.contains_key(name) {
                    return Err(BuildError::Redeclared {
                        name: name.clone(),
                        span: stmt.span.clone(),
                    });
                }
                let expected = self.resolver.resolve_hint(annotation)?;
                let var = self.declare_local(name);
                StmtKind::VarDecl { var, expected }
            }
            AstStmtKind::Return(value) => {
                let value = match value {
                    Some(expr) => Some(self.lower_value(expr)?),
                    None => None,
                };
                StmtKind::Return(value)
            }
            AstStmtKind::If {
                cond,
                then_body,
                else_body,
            } => {
                let cond = self.lower_value(cond)?;
                let then_body = self.lower_block(then_body)?;
                let else_body = self.lower_block(else_body)?;
                StmtKind::If {
                    cond,
                    then_body,
                    else_body,
                }
            }
        };
        Ok(self.arena.add_stmt(Stmt {
            kind,
            span: stmt.span.clone(),
        }))
    }

    fn declare_local(&mut self, name: &Name) -> VarId {
        let id = self.arena.add_var(Var {
            name: name.clone(),
            ty: None,
            byval: true,
            kind: VarKind::Local,
        });
        self.scope.insert(name.clone(), id);
        self.locals.push(id);
        id
    }

    fn lower_target(&mut self, target: &Expr) -> Result<NodeId, BuildError> {
        match &target.kind {
            ExprKind::Name(name) => {
                let var = match self.scope.get(name) {
                    Some(&var) => var,
                    None => self.declare_local(name),
                };
                Ok(self.arena.add_ref(Ref::Var(var), target.span.clone()))
            }
            ExprKind::Attribute { .. } | ExprKind::Subscript { .. } => self.lower_ref(target),
            _ => Err(BuildError::InvalidAssignTarget {
                span: target.span.clone(),
            }),
        }
    }

    fn lower_ref(&mut self, expr: &Expr) -> Result<NodeId, BuildError> {
        let r = match &expr.kind {
            ExprKind::Name(name) => match self.scope.get(name) {
                Some(&var) => Ref::Var(var),
                None => {
                    return Err(BuildError::UndefinedVariable {
                        name: name.clone(),
                        span: expr.span.clone(),
                    })
                }
            },
            ExprKind::Attribute { base, field } => Ref::Member {
                base: self.lower_ref(base)?,
                field: field.clone(),
            },
            ExprKind::Subscript { base, index } => {
                let base = self.lower_ref(base)?;
                let index = self.lower_value(index)?;
                Ref::Index { base, index }
            }
            _ => Ref::ValueRef(self.lower_value(expr)?),
        };
        Ok(self.arena.add_ref(r, expr.span.clone()))
    }

    fn lower_value(&mut self, expr: &Expr) -> Result<NodeId, BuildError> {
        let span = expr.span.clone();
        let value = match &expr.kind {
            ExprKind::Name(name) => {
                if self.scope.contains_key(name) {
                    Value::Load(self.lower_ref(expr)?)
                } else if self.consts.contains(name) {
                    Value::SymbolicConstant(name.clone())
                } else {
                    return Err(BuildError::UndefinedVariable {
                        name: name.clone(),
                        span,
                    });
                }
            }
            ExprKind::Int(v) => Value::Constant(Constant::Int(*v)),
            ExprKind::Float(v) => Value::Constant(Constant::Float(*v)),
            ExprKind::Bool(v) => Value::Constant(Constant::Bool(*v)),
            ExprKind::Attribute { .. } | ExprKind::Subscript { .. } => {
                Value::Load(self.lower_ref(expr)?)
            }
            ExprKind::Binary { op, lhs, rhs } => {
                let lhs = self.lower_value(lhs)?;
                let rhs = self.lower_value(rhs)?;
                Value::Call(Call {
                    op: CallOp::Binary(*op),
                    args: smallvec::smallvec![lhs, rhs],
                    kind: CallKind::BinaryOp,
                    resolved: None,
                })
            }
            ExprKind::Unary { op, operand } => {
                let operand = self.lower_value(operand)?;
                Value::Call(Call {
                    op: CallOp::Unary(*op),
                    args: smallvec::smallvec![operand],
                    kind: CallKind::UnaryOp,
                    resolved: None,
                })
            }
            ExprKind::Call { callee, args } => {
                let op = match callee {
                    Callee::Function(name) => CallOp::Function(name.clone()),
                    Callee::Type(hint) => CallOp::Construct(self.resolver.resolve_hint(hint)?),
                    Callee::Expr(callee) => CallOp::Callee(self.lower_value(callee)?),
                };
                let args = args
                    .iter()
                    .map(|arg| self.lower_value(arg))
                    .collect::<Result<SmallVec<_>, _>>()?;
                Value::Call(Call {
                    op,
                    args,
                    kind: CallKind::Func,
                    resolved: None,
                })
            }
        };
        Ok(self.arena.add_value(value, span))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, reason = "test assertions use unwrap for clarity")]
mod tests;
