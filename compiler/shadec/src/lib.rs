//! Shade compiler driver.
//!
//! ```text
//! ClassDecl / FuncDecl
//!        ↓  register
//!   GlobalContext   (type registry + function templates)
//!        ↓  instantiate entry at argument types
//!   typed instances (resolver + inferencer)
//!        ↓  emit
//!   C++ source
//! ```
//!
//! The driver only returns source text; writing it anywhere is up to the
//! caller.

mod compiler;
mod error;
mod options;

use std::sync::Once;

pub use compiler::{CompiledUnit, Compiler};
pub use error::CompileError;
pub use options::CompileOptions;

static TRACING_INIT: Once = Once::new();

/// Initialize tracing for debug output.
///
/// Safe to call multiple times. Does nothing unless `RUST_LOG` is set,
/// e.g. `RUST_LOG=shade_typeck=debug` or `RUST_LOG=shade_codegen=trace`.
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::{fmt, prelude::*, EnvFilter};

        if std::env::var("RUST_LOG").is_ok() {
            let filter = EnvFilter::from_default_env();
            tracing_subscriber::registry()
                .with(
                    fmt::layer()
                        .with_writer(std::io::stderr)
                        .with_target(true)
                        .with_level(true),
                )
                .with(filter)
                .init();
        }
    });
}
