use shade_codegen::CodegenError;
use shade_diagnostic::Diagnostic;
use shade_typeck::TypeInferenceError;
use shade_types::RegistrationError;
use thiserror::Error;

/// Any failure of a compilation request.
///
/// The compiler stops at the first error; the caller decides whether to
/// abort or to skip the offending entry point.
#[derive(Debug, Error)]
pub enum CompileError {
    #[error(transparent)]
    Registration(#[from] RegistrationError),
    #[error(transparent)]
    Inference(#[from] TypeInferenceError),
    #[error(transparent)]
    Codegen(#[from] CodegenError),
}

impl CompileError {
    pub fn to_diagnostic(&self) -> Diagnostic {
        match self {
            CompileError::Registration(err) => err.to_diagnostic(),
            CompileError::Inference(err) => err.to_diagnostic(),
            CompileError::Codegen(err) => err.to_diagnostic(),
        }
    }
}
