//! Node and statement storage with use tracking.
//!
//! Nodes never move and are never freed while the function lives; a node
//! that has been replaced simply loses all its uses. Every child edge is
//! mirrored by a [`User`] entry in the child's `uses` list, which is what
//! makes [`Arena::replace_all_uses`] an index rewrite instead of a tree
//! walk.

use shade_ir::Span;
use shade_types::Type;
use smallvec::SmallVec;

use crate::node::{Node, NodeKind, Ref, Stmt, User, Value, Var};
use crate::{NodeId, StmtId, VarId};

#[derive(Clone, Debug, Default)]
pub struct Arena {
    nodes: Vec<Node>,
    stmts: Vec<Stmt>,
    vars: Vec<Var>,
}

impl Arena {
    pub fn new() -> Self {
        Self::default()
    }

    // ── Allocation ──────────────────────────────────────────────────

    fn push_node(&mut self, kind: NodeKind, span: Span) -> NodeId {
        let id = NodeId::new(u32::try_from(self.nodes.len()).unwrap_or(u32::MAX));
        let node = Node {
            kind,
            ty: None,
            span,
            uses: SmallVec::new(),
        };
        for child in node.children() {
            self.nodes[child.index()].uses.push(User::Node(id));
        }
        self.nodes.push(node);
        id
    }

    pub fn add_ref(&mut self, r: Ref, span: Span) -> NodeId {
        self.push_node(NodeKind::Ref(r), span)
    }

    pub fn add_value(&mut self, value: Value, span: Span) -> NodeId {
        self.push_node(NodeKind::Value(value), span)
    }

    pub fn add_stmt(&mut self, stmt: Stmt) -> StmtId {
        let id = StmtId::new(u32::try_from(self.stmts.len()).unwrap_or(u32::MAX));
        for child in stmt.children() {
            self.nodes[child.index()].uses.push(User::Stmt(id));
        }
        self.stmts.push(stmt);
        id
    }

    pub fn add_var(&mut self, var: Var) -> VarId {
        let id = VarId::new(u32::try_from(self.vars.len()).unwrap_or(u32::MAX));
        self.vars.push(var);
        id
    }

    // ── Access ──────────────────────────────────────────────────────

    #[inline]
    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.index()]
    }

    #[inline]
    pub fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.index()]
    }

    #[inline]
    pub fn stmt(&self, id: StmtId) -> &Stmt {
        &self.stmts[id.index()]
    }

    #[inline]
    pub fn var(&self, id: VarId) -> &Var {
        &self.vars[id.index()]
    }

    #[inline]
    pub fn var_mut(&mut self, id: VarId) -> &mut Var {
        &mut self.vars[id.index()]
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn vars(&self) -> impl Iterator<Item = (VarId, &Var)> {
        self.vars
            .iter()
            .enumerate()
            .map(|(i, var)| (VarId::new(u32::try_from(i).unwrap_or(u32::MAX)), var))
    }

    // ── Types ───────────────────────────────────────────────────────

    #[inline]
    pub fn ty(&self, id: NodeId) -> Option<&Type> {
        self.nodes[id.index()].ty.as_ref()
    }

    /// Record the type of a node.
    ///
    /// Types only move forward: an unset type may be set, and a literal
    /// placeholder may be refined to a concrete type it accepts.
    pub fn set_type(&mut self, id: NodeId, ty: Type) {
        let slot = &mut self.nodes[id.index()].ty;
        debug_assert!(
            slot.as_ref().map_or(true, |old| *old == ty
                || old.is_literal_placeholder()
                || shade_types::accepts_literal(&ty, old)),
            "type of {id} would regress from {slot:?} to {ty}"
        );
        *slot = Some(ty);
    }

    // ── Uses ────────────────────────────────────────────────────────

    pub fn uses(&self, id: NodeId) -> &[User] {
        &self.nodes[id.index()].uses
    }

    /// Redirect every user of `old` to `new`.
    ///
    /// After the call `old` has no uses; `new` has gained all of them.
    pub fn replace_all_uses(&mut self, old: NodeId, new: NodeId) {
        if old == new {
            return;
        }
        let users = std::mem::take(&mut self.nodes[old.index()].uses);
        tracing::trace!(%old, %new, users = users.len(), "replace all uses");
        for user in &users {
            match *user {
                User::Node(node) => self.nodes[node.index()].replace_child(old, new),
                User::Stmt(stmt) => self.stmts[stmt.index()].replace_child(old, new),
            }
        }
        self.nodes[new.index()].uses.extend(users);
    }
}
