//! Surface syntax tree.
//!
//! This is the statement/expression tree a front-end (or host-language
//! reflection bridge) hands to the compiler. Names are already resolved to
//! the three kinds the compiler distinguishes: local variables
//! ([`ExprKind::Name`]), free functions ([`Callee::Function`]), and types
//! ([`Callee::Type`]).
//!
//! The constructor helpers produce nodes with the default span and are
//! meant for bridges that have no source locations as well as for tests.

use crate::{BinaryOp, Name, Span, UnaryOp, VarType};

// ── Declarations ────────────────────────────────────────────────────

/// A generic parameter of a class or function.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct TypeVarDecl {
    pub name: Name,
    /// Allowed instantiations; empty means unconstrained.
    pub bounds: Vec<VarType>,
    /// Stands for a compile-time integer (array length) rather than a type.
    pub is_const: bool,
}

impl TypeVarDecl {
    pub fn new(name: impl Into<Name>) -> Self {
        TypeVarDecl {
            name: name.into(),
            bounds: Vec::new(),
            is_const: false,
        }
    }

    pub fn constant(name: impl Into<Name>) -> Self {
        TypeVarDecl {
            name: name.into(),
            bounds: Vec::new(),
            is_const: true,
        }
    }

    #[must_use]
    pub fn bounded(mut self, bounds: Vec<VarType>) -> Self {
        self.bounds = bounds;
        self
    }
}

#[derive(Clone, PartialEq, Debug)]
pub struct ParamDecl {
    pub name: Name,
    /// `None` when the parameter has no annotation; such parameters become
    /// implicit generic parameters.
    pub ty: Option<VarType>,
    /// Passed by reference (`T&`) instead of by value.
    pub by_ref: bool,
    pub span: Span,
}

/// A function or method declaration.
///
/// Free functions carry their qualified name (`demo.add`); methods carry
/// their short name (`__add__`) and are qualified by the owning class.
#[derive(Clone, PartialEq, Debug)]
pub struct FuncDecl {
    pub name: Name,
    pub type_vars: Vec<TypeVarDecl>,
    pub params: Vec<ParamDecl>,
    pub ret: Option<VarType>,
    pub body: Vec<Stmt>,
    pub is_static: bool,
    pub export: bool,
    pub span: Span,
}

impl FuncDecl {
    pub fn new(name: impl Into<Name>) -> Self {
        FuncDecl {
            name: name.into(),
            type_vars: Vec::new(),
            params: Vec::new(),
            ret: None,
            body: Vec::new(),
            is_static: false,
            export: false,
            span: Span::default(),
        }
    }

    #[must_use]
    pub fn type_var(mut self, decl: TypeVarDecl) -> Self {
        self.type_vars.push(decl);
        self
    }

    #[must_use]
    pub fn param(mut self, name: impl Into<Name>, ty: VarType) -> Self {
        self.params.push(ParamDecl {
            name: name.into(),
            ty: Some(ty),
            by_ref: false,
            span: Span::default(),
        });
        self
    }

    #[must_use]
    pub fn param_ref(mut self, name: impl Into<Name>, ty: VarType) -> Self {
        self.params.push(ParamDecl {
            name: name.into(),
            ty: Some(ty),
            by_ref: true,
            span: Span::default(),
        });
        self
    }

    #[must_use]
    pub fn untyped_param(mut self, name: impl Into<Name>) -> Self {
        self.params.push(ParamDecl {
            name: name.into(),
            ty: None,
            by_ref: false,
            span: Span::default(),
        });
        self
    }

    #[must_use]
    pub fn returns(mut self, ty: VarType) -> Self {
        self.ret = Some(ty);
        self
    }

    #[must_use]
    pub fn body(mut self, body: Vec<Stmt>) -> Self {
        self.body = body;
        self
    }

    #[must_use]
    pub fn exported(mut self) -> Self {
        self.export = true;
        self
    }

    #[must_use]
    pub fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }
}

/// A class declaration.
#[derive(Clone, PartialEq, Debug)]
pub struct ClassDecl {
    /// Qualified name (`demo.Point`).
    pub name: Name,
    pub type_vars: Vec<TypeVarDecl>,
    pub bases: Vec<VarType>,
    pub fields: Vec<(Name, VarType)>,
    pub methods: Vec<FuncDecl>,
    /// Declared inside a function body rather than at module level.
    pub is_local: bool,
    pub span: Span,
}

impl ClassDecl {
    pub fn new(name: impl Into<Name>) -> Self {
        ClassDecl {
            name: name.into(),
            type_vars: Vec::new(),
            bases: Vec::new(),
            fields: Vec::new(),
            methods: Vec::new(),
            is_local: false,
            span: Span::default(),
        }
    }

    #[must_use]
    pub fn type_var(mut self, decl: TypeVarDecl) -> Self {
        self.type_vars.push(decl);
        self
    }

    #[must_use]
    pub fn base(mut self, base: VarType) -> Self {
        self.bases.push(base);
        self
    }

    #[must_use]
    pub fn field(mut self, name: impl Into<Name>, ty: VarType) -> Self {
        self.fields.push((name.into(), ty));
        self
    }

    #[must_use]
    pub fn method(mut self, method: FuncDecl) -> Self {
        self.methods.push(method);
        self
    }
}

// ── Statements ──────────────────────────────────────────────────────

#[derive(Clone, PartialEq, Debug)]
pub enum StmtKind {
    /// `target [: annotation] = value`
    Assign {
        target: Expr,
        annotation: Option<VarType>,
        value: Expr,
    },
    /// `name: annotation` with no value.
    Declare { name: Name, annotation: VarType },
    Return(Option<Expr>),
    If {
        cond: Expr,
        then_body: Vec<Stmt>,
        else_body: Vec<Stmt>,
    },
}

#[derive(Clone, PartialEq, Debug)]
pub struct Stmt {
    pub kind: StmtKind,
    pub span: Span,
}

impl Stmt {
    pub fn new(kind: StmtKind, span: Span) -> Self {
        Stmt { kind, span }
    }

    pub fn assign(target: Expr, value: Expr) -> Self {
        Stmt::new(
            StmtKind::Assign {
                target,
                annotation: None,
                value,
            },
            Span::default(),
        )
    }

    pub fn assign_annotated(target: Expr, annotation: VarType, value: Expr) -> Self {
        Stmt::new(
            StmtKind::Assign {
                target,
                annotation: Some(annotation),
                value,
            },
            Span::default(),
        )
    }

    pub fn declare(name: impl Into<Name>, annotation: VarType) -> Self {
        Stmt::new(
            StmtKind::Declare {
                name: name.into(),
                annotation,
            },
            Span::default(),
        )
    }

    pub fn ret(value: Expr) -> Self {
        Stmt::new(StmtKind::Return(Some(value)), Span::default())
    }

    pub fn ret_unit() -> Self {
        Stmt::new(StmtKind::Return(None), Span::default())
    }

    pub fn if_else(cond: Expr, then_body: Vec<Stmt>, else_body: Vec<Stmt>) -> Self {
        Stmt::new(
            StmtKind::If {
                cond,
                then_body,
                else_body,
            },
            Span::default(),
        )
    }

    #[must_use]
    pub fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }
}

// ── Expressions ─────────────────────────────────────────────────────

/// What a call expression invokes.
#[derive(Clone, PartialEq, Debug)]
pub enum Callee {
    /// A free function by qualified name.
    Function(Name),
    /// A type constructor (`Point(1.0, 2.0)`, `float3(x, y, z)`).
    Type(VarType),
    /// Any other expression; `a.m` makes this a method call.
    Expr(Box<Expr>),
}

#[derive(Clone, PartialEq, Debug)]
pub enum ExprKind {
    /// A local variable or parameter.
    Name(Name),
    Int(i64),
    Float(f64),
    Bool(bool),
    Attribute {
        base: Box<Expr>,
        field: Name,
    },
    Subscript {
        base: Box<Expr>,
        index: Box<Expr>,
    },
    Binary {
        op: BinaryOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
    },
    Call {
        callee: Callee,
        args: Vec<Expr>,
    },
}

#[derive(Clone, PartialEq, Debug)]
pub struct Expr {
    pub kind: ExprKind,
    pub span: Span,
}

impl Expr {
    pub fn new(kind: ExprKind, span: Span) -> Self {
        Expr { kind, span }
    }

    fn bare(kind: ExprKind) -> Self {
        Expr::new(kind, Span::default())
    }

    pub fn name(name: impl Into<Name>) -> Self {
        Expr::bare(ExprKind::Name(name.into()))
    }

    pub fn int(value: i64) -> Self {
        Expr::bare(ExprKind::Int(value))
    }

    pub fn float(value: f64) -> Self {
        Expr::bare(ExprKind::Float(value))
    }

    pub fn bool(value: bool) -> Self {
        Expr::bare(ExprKind::Bool(value))
    }

    pub fn attr(base: Expr, field: impl Into<Name>) -> Self {
        Expr::bare(ExprKind::Attribute {
            base: Box::new(base),
            field: field.into(),
        })
    }

    pub fn index(base: Expr, index: Expr) -> Self {
        Expr::bare(ExprKind::Subscript {
            base: Box::new(base),
            index: Box::new(index),
        })
    }

    pub fn binary(op: BinaryOp, lhs: Expr, rhs: Expr) -> Self {
        Expr::bare(ExprKind::Binary {
            op,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        })
    }

    pub fn unary(op: UnaryOp, operand: Expr) -> Self {
        Expr::bare(ExprKind::Unary {
            op,
            operand: Box::new(operand),
        })
    }

    pub fn call(function: impl Into<Name>, args: Vec<Expr>) -> Self {
        Expr::bare(ExprKind::Call {
            callee: Callee::Function(function.into()),
            args,
        })
    }

    pub fn construct(ty: VarType, args: Vec<Expr>) -> Self {
        Expr::bare(ExprKind::Call {
            callee: Callee::Type(ty),
            args,
        })
    }

    pub fn method_call(receiver: Expr, method: impl Into<Name>, args: Vec<Expr>) -> Self {
        Expr::bare(ExprKind::Call {
            callee: Callee::Expr(Box::new(Expr::attr(receiver, method))),
            args,
        })
    }

    #[must_use]
    pub fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }
}
