use shade_diagnostic::{Diagnostic, ErrorCode};
use shade_hir::InstanceId;
use shade_ir::{Name, Span};
use shade_types::Type;
use thiserror::Error;

/// A construct reached the emitter that it cannot express.
///
/// These indicate either an incomplete backend or an inference bug; the
/// emitter stops at the first one.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum CodegenError {
    #[error("type `{ty}` has no C++ representation")]
    UnsupportedType { ty: Type },

    #[error("function `{function}` reached codegen without being fully typed")]
    NotFullyTyped { function: Name, span: Span },

    #[error("cannot emit {what} in `{function}`")]
    UnsupportedNode {
        function: Name,
        what: &'static str,
        span: Span,
    },

    #[error("instance {id} has no built function")]
    MissingInstance { id: InstanceId },
}

impl CodegenError {
    pub fn span(&self) -> Option<&Span> {
        match self {
            CodegenError::NotFullyTyped { span, .. } | CodegenError::UnsupportedNode { span, .. } => {
                Some(span).filter(|s| !s.is_dummy())
            }
            CodegenError::UnsupportedType { .. } | CodegenError::MissingInstance { .. } => None,
        }
    }

    pub fn to_diagnostic(&self) -> Diagnostic {
        let message = self.to_string();
        match self {
            CodegenError::UnsupportedType { ty } => {
                let diag = Diagnostic::error(ErrorCode::E3001).with_message(message);
                if ty.is_literal_placeholder() || ty.contains_symbolic() {
                    diag.with_note("the type was never fully inferred")
                } else {
                    diag
                }
            }
            CodegenError::NotFullyTyped { .. } => Diagnostic::error(ErrorCode::E3002)
                .with_message(message)
                .with_optional_label(self.span(), "defined here"),
            CodegenError::UnsupportedNode { .. } => Diagnostic::error(ErrorCode::E3003)
                .with_message(message)
                .with_optional_label(self.span(), "here"),
            CodegenError::MissingInstance { .. } => {
                Diagnostic::error(ErrorCode::E9001).with_message(message)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn placeholder_types_get_a_note() {
        let diag = CodegenError::UnsupportedType {
            ty: Type::GenericInt,
        }
        .to_diagnostic();
        assert_eq!(diag.code, ErrorCode::E3001);
        assert_eq!(diag.message, "type `{integer}` has no C++ representation");
        assert_eq!(diag.notes, vec!["the type was never fully inferred".to_owned()]);
    }

    #[test]
    fn dummy_spans_are_not_labelled() {
        let err = CodegenError::UnsupportedNode {
            function: Name::new("demo.f"),
            what: "a symbolic constant",
            span: Span::default(),
        };
        assert_eq!(err.span(), None);
        assert!(err.to_diagnostic().labels.is_empty());
    }
}
