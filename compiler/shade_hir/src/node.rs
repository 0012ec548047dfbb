//! HIR node vocabulary.
//!
//! - **[`Ref`]**: lvalue-ish places (variables, fields, elements)
//! - **[`Value`]**: rvalue-ish computations (loads, constants, calls)
//! - **[`Stmt`]**: declarations, assignments, returns, conditionals
//!
//! Children are referenced by [`NodeId`]; the arena keeps the reverse
//! edges (`uses`) in sync.

use shade_ir::{BinaryOp, Name, Span, UnaryOp};
use shade_types::{Intrinsic, Type};
use smallvec::SmallVec;

use crate::{InstanceId, NodeId, StmtId, VarId};

// ── Variables ───────────────────────────────────────────────────────

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum VarKind {
    Param,
    Local,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Var {
    pub name: Name,
    /// Set from the signature for parameters, from the annotation or the
    /// first assignment for locals.
    pub ty: Option<Type>,
    /// Passed by value; `false` for reference parameters.
    pub byval: bool,
    pub kind: VarKind,
}

// ── Refs ────────────────────────────────────────────────────────────

#[derive(Clone, Debug, PartialEq)]
pub enum Ref {
    Var(VarId),
    Member { base: NodeId, field: Name },
    Index { base: NodeId, index: NodeId },
    /// A value used where a place is expected (`f(x).y`).
    ValueRef(NodeId),
}

// ── Values ──────────────────────────────────────────────────────────

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Constant {
    Int(i64),
    Float(f64),
    Bool(bool),
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum CallKind {
    Func,
    BinaryOp,
    UnaryOp,
}

/// What a call invokes before resolution.
#[derive(Clone, Debug, PartialEq)]
pub enum CallOp {
    Binary(BinaryOp),
    Unary(UnaryOp),
    /// A free function by qualified name.
    Function(Name),
    /// A type used as a constructor.
    Construct(Type),
    /// A method looked up on the type of the first argument.
    Method(Name),
    /// An arbitrary callee expression; `a.m(...)` is rewritten into
    /// `Method` once the type of `a` is known.
    Callee(NodeId),
}

/// The callee a call was resolved to.
#[derive(Clone, Debug, PartialEq)]
pub enum Resolution {
    /// A backend operator. `reflected` records that the right operand's
    /// reflected method was chosen; the call's arguments stay in source
    /// order.
    Intrinsic { op: Intrinsic, reflected: bool },
    Instance(InstanceId),
    Construct(Type),
}

#[derive(Clone, Debug, PartialEq)]
pub struct Call {
    pub op: CallOp,
    pub args: SmallVec<[NodeId; 4]>,
    pub kind: CallKind,
    pub resolved: Option<Resolution>,
}

impl Call {
    pub fn is_resolved(&self) -> bool {
        self.resolved.is_some()
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    Load(NodeId),
    Constant(Constant),
    Call(Call),
    /// A constant generic parameter (`N`) not yet replaced by its value.
    SymbolicConstant(Name),
}

// ── Nodes ───────────────────────────────────────────────────────────

#[derive(Clone, Debug, PartialEq)]
pub enum NodeKind {
    Ref(Ref),
    Value(Value),
}

/// Something that holds a [`NodeId`] as a child.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum User {
    Node(NodeId),
    Stmt(StmtId),
}

#[derive(Clone, Debug, PartialEq)]
pub struct Node {
    pub kind: NodeKind,
    pub ty: Option<Type>,
    pub span: Span,
    pub uses: SmallVec<[User; 2]>,
}

impl Node {
    /// Direct children, in evaluation order.
    pub fn children(&self) -> SmallVec<[NodeId; 4]> {
        match &self.kind {
            NodeKind::Ref(r) => match r {
                Ref::Var(_) => SmallVec::new(),
                Ref::Member { base, .. } => smallvec::smallvec![*base],
                Ref::Index { base, index } => smallvec::smallvec![*base, *index],
                Ref::ValueRef(value) => smallvec::smallvec![*value],
            },
            NodeKind::Value(v) => match v {
                Value::Load(r) => smallvec::smallvec![*r],
                Value::Call(call) => {
                    let mut children = SmallVec::new();
                    if let CallOp::Callee(callee) = call.op {
                        children.push(callee);
                    }
                    children.extend(call.args.iter().copied());
                    children
                }
                Value::Constant(_) | Value::SymbolicConstant(_) => SmallVec::new(),
            },
        }
    }

    /// Rewrite every child equal to `old` into `new`.
    pub(crate) fn replace_child(&mut self, old: NodeId, new: NodeId) {
        let swap = |id: &mut NodeId| {
            if *id == old {
                *id = new;
            }
        };
        match &mut self.kind {
            NodeKind::Ref(r) => match r {
                Ref::Var(_) => {}
                Ref::Member { base, .. } => swap(base),
                Ref::Index { base, index } => {
                    swap(base);
                    swap(index);
                }
                Ref::ValueRef(value) => swap(value),
            },
            NodeKind::Value(v) => match v {
                Value::Load(r) => swap(r),
                Value::Call(call) => {
                    if let CallOp::Callee(callee) = &mut call.op {
                        swap(callee);
                    }
                    call.args.iter_mut().for_each(swap);
                }
                Value::Constant(_) | Value::SymbolicConstant(_) => {}
            },
        }
    }

    pub fn place(&self) -> Option<&Ref> {
        match &self.kind {
            NodeKind::Ref(r) => Some(r),
            NodeKind::Value(_) => None,
        }
    }

    pub fn value(&self) -> Option<&Value> {
        match &self.kind {
            NodeKind::Value(v) => Some(v),
            NodeKind::Ref(_) => None,
        }
    }

    pub fn call(&self) -> Option<&Call> {
        match &self.kind {
            NodeKind::Value(Value::Call(call)) => Some(call),
            _ => None,
        }
    }
}

// ── Statements ──────────────────────────────────────────────────────

#[derive(Clone, Debug, PartialEq)]
pub enum StmtKind {
    /// `name: T` without a value.
    VarDecl { var: VarId, expected: Type },
    Assign {
        target: NodeId,
        /// Annotation written on the assignment, if any.
        expected_type: Option<Type>,
        value: NodeId,
    },
    Return(Option<NodeId>),
    If {
        cond: NodeId,
        then_body: Vec<StmtId>,
        else_body: Vec<StmtId>,
    },
}

#[derive(Clone, Debug, PartialEq)]
pub struct Stmt {
    pub kind: StmtKind,
    pub span: Span,
}

impl Stmt {
    pub fn children(&self) -> SmallVec<[NodeId; 2]> {
        match &self.kind {
            StmtKind::VarDecl { .. } | StmtKind::Return(None) => SmallVec::new(),
            StmtKind::Assign { target, value, .. } => smallvec::smallvec![*target, *value],
            StmtKind::Return(Some(value)) => smallvec::smallvec![*value],
            StmtKind::If { cond, .. } => smallvec::smallvec![*cond],
        }
    }

    pub(crate) fn replace_child(&mut self, old: NodeId, new: NodeId) {
        let swap = |id: &mut NodeId| {
            if *id == old {
                *id = new;
            }
        };
        match &mut self.kind {
            StmtKind::VarDecl { .. } | StmtKind::Return(None) => {}
            StmtKind::Assign { target, value, .. } => {
                swap(target);
                swap(value);
            }
            StmtKind::Return(Some(value)) => swap(value),
            StmtKind::If { cond, .. } => swap(cond),
        }
    }
}
