//! Typed high-level IR.
//!
//! A [`Function`] owns an [`Arena`] of nodes and statements. Nodes refer to
//! their children by [`NodeId`]; every child keeps a `uses` list pointing
//! back at its users so a node can be replaced everywhere with
//! [`Arena::replace_all_uses`].
//!
//! Lifecycle: [`build_function`] produces a function whose nodes are mostly
//! untyped; the inferencer fills in types (monotonically) and resolves every
//! call, then sets [`FunctionFlags::FULLY_TYPED`]. From then on the function
//! is read-only.

mod arena;
mod build;
mod function;
mod ids;
mod node;

pub use arena::Arena;
pub use build::{build_function, BuildError, HintResolver, ParamSpec, Signature};
pub use function::{Function, FunctionFlags};
pub use ids::{InstanceId, NodeId, StmtId, VarId};
pub use node::{
    Call, CallKind, CallOp, Constant, Node, NodeKind, Ref, Resolution, Stmt, StmtKind, User,
    Value, Var, VarKind,
};
