//! Shared vocabulary of the Shade compiler.
//!
//! Everything downstream of the host-language boundary speaks in terms of
//! this crate:
//!
//! - [`Name`]: cheaply clonable identifier
//! - [`Span`]: `file:line:col-line:col` source location
//! - [`BinaryOp`] / [`UnaryOp`]: operators and their dunder-method tables
//! - [`ast`]: the surface statement/expression tree handed to the compiler
//! - [`VarType`]: the signature algebra produced by declaration reflection

pub mod ast;
mod name;
mod operator;
mod span;
mod var_type;

pub use name::Name;
pub use operator::{BinaryOp, UnaryOp};
pub use span::{Position, Span};
pub use var_type::{LiteralValue, VarType};
