//! Diagnostic system for structured error reporting.
//!
//! Every error the compiler raises converts into a [`Diagnostic`]:
//! - Error codes for searchability
//! - Clear messages naming the types and symbols involved
//! - Primary span (`file:line:col-line:col`) when one is known
//! - Notes and suggestions
//!
//! Rendering beyond `Display` is left to the caller.

mod diagnostic;
mod error_code;

pub use diagnostic::{Diagnostic, Label, Severity};
pub use error_code::ErrorCode;
