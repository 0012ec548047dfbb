//! HIR functions.

use bitflags::bitflags;
use shade_ir::{Name, Span};
use shade_types::Type;

use crate::arena::Arena;
use crate::node::{NodeKind, StmtKind, Value};
use crate::{NodeId, StmtId, VarId};

bitflags! {
    #[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Default)]
    pub struct FunctionFlags: u8 {
        /// Emitted with external linkage.
        const EXPORT = 1 << 0;
        /// Every reachable node carries a concrete type and every call is
        /// resolved. Set once by the inferencer; required by codegen.
        const FULLY_TYPED = 1 << 1;
    }
}

#[derive(Clone, Debug)]
pub struct Function {
    /// Qualified source name (`demo.add`, `demo.Point.__add__`).
    pub name: Name,
    pub params: Vec<VarId>,
    /// `None` until inferred when the declaration has no annotation.
    pub return_type: Option<Type>,
    pub body: Vec<StmtId>,
    pub locals: Vec<VarId>,
    pub flags: FunctionFlags,
    pub arena: Arena,
    pub span: Span,
}

impl Function {
    pub fn param_types(&self) -> impl Iterator<Item = Option<&Type>> {
        self.params.iter().map(|&p| self.arena.var(p).ty.as_ref())
    }

    /// True while any parameter or the return type is unknown or still
    /// generic.
    pub fn is_parametric(&self) -> bool {
        let open = |ty: Option<&Type>| ty.map_or(true, Type::contains_symbolic);
        self.param_types().any(open) || open(self.return_type.as_ref())
    }

    pub fn is_fully_typed(&self) -> bool {
        self.flags.contains(FunctionFlags::FULLY_TYPED)
    }

    /// All statements in body order, descending into conditionals.
    pub fn statements(&self) -> Vec<StmtId> {
        let mut out = Vec::new();
        let mut stack: Vec<StmtId> = self.body.iter().rev().copied().collect();
        while let Some(id) = stack.pop() {
            out.push(id);
            if let StmtKind::If {
                then_body,
                else_body,
                ..
            } = &self.arena.stmt(id).kind
            {
                stack.extend(else_body.iter().rev().copied());
                stack.extend(then_body.iter().rev().copied());
            }
        }
        out
    }

    /// Every node reachable from the body, children before parents.
    pub fn reachable_nodes(&self) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut seen = rustc_hash::FxHashSet::default();
        for stmt in self.statements() {
            for root in self.arena.stmt(stmt).children() {
                self.post_order(root, &mut seen, &mut out);
            }
        }
        out
    }

    fn post_order(
        &self,
        id: NodeId,
        seen: &mut rustc_hash::FxHashSet<NodeId>,
        out: &mut Vec<NodeId>,
    ) {
        if !seen.insert(id) {
            return;
        }
        for child in self.arena.node(id).children() {
            self.post_order(child, seen, out);
        }
        out.push(id);
    }

    /// The first reachable node that is untyped, still carries a
    /// placeholder, or is an unresolved call.
    pub fn first_untyped_node(&self) -> Option<NodeId> {
        self.reachable_nodes().into_iter().find(|&id| {
            let node = self.arena.node(id);
            let typed = node.ty.as_ref().is_some_and(Type::is_concrete);
            let resolved = match &node.kind {
                NodeKind::Value(Value::Call(call)) => call.is_resolved(),
                NodeKind::Value(Value::SymbolicConstant(_)) => false,
                _ => true,
            };
            !(typed && resolved)
        })
    }
}
