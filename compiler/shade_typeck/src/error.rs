//! Inference and instantiation errors.

use shade_diagnostic::{Diagnostic, ErrorCode};
use shade_hir::BuildError;
use shade_ir::{Name, Span};
use shade_types::{MatchError, RegistrationError, Type};
use thiserror::Error;

#[derive(Clone, Debug, PartialEq, Error)]
pub enum InferErrorKind {
    #[error(transparent)]
    Match(#[from] MatchError),
    #[error(transparent)]
    Registration(#[from] RegistrationError),
    #[error(transparent)]
    Build(#[from] BuildError),
    #[error("generic parameter `{param}` of `{callee}` is not bound by the arguments")]
    UnboundParameter { callee: Name, param: Name },
    #[error("`{ty}` does not satisfy the bound on `{param}` of `{callee}`")]
    BoundViolation { callee: Name, param: Name, ty: Type },
    #[error("internal error: signature of `{callee}` still mentions `{ty}` after instantiation")]
    ResidualGeneric { callee: Name, ty: Type },
    #[error("`{callee}` is instantiated recursively at the same argument types")]
    RecursiveInstantiation { callee: Name },
    #[error("operator `{op}` is not defined for `{lhs}` and `{rhs}`")]
    NoBinaryOverload {
        op: &'static str,
        lhs: Type,
        rhs: Type,
    },
    #[error("operator `{op}` is not defined for `{operand}`")]
    NoUnaryOverload { op: &'static str, operand: Type },
    #[error("no overload of `{method}` on `{receiver}` accepts ({args})")]
    NoMethodOverload {
        receiver: Type,
        method: Name,
        args: String,
    },
    #[error("unknown function `{name}`")]
    UnknownFunction { name: Name },
    #[error("`{ty}` has no member `{member}`")]
    UnknownMember { ty: Type, member: Name },
    #[error("method `{member}` of `{ty}` must be called")]
    UnboundMethod { ty: Type, member: Name },
    #[error("type mismatch: expected `{expected}`, found `{found}`")]
    TypeMismatch { expected: Type, found: Type },
    #[error("`{function}` returns `{expected}` but this returns `{found}`")]
    ReturnMismatch {
        function: Name,
        expected: Type,
        found: Type,
    },
    #[error("`{name}` is annotated `{annotation}` but assigned `{found}`")]
    AnnotationMismatch {
        name: String,
        annotation: Type,
        found: Type,
    },
    #[error("condition must be `bool`, found `{found}`")]
    ConditionNotBool { found: Type },
    #[error("`{ty}` cannot be indexed")]
    NotIndexable { ty: Type },
    #[error("index must be an integer, found `{found}`")]
    NonIntegerIndex { found: Type },
    #[error("expression of type `{ty}` is not callable")]
    NotCallable { ty: Type },
    #[error("`{callee}` expects {expected} argument(s), found {found}")]
    ArgCount {
        callee: String,
        expected: usize,
        found: usize,
    },
    #[error("`{name}` is used before it is assigned")]
    UseBeforeAssignment { name: Name },
    #[error("internal error: {message}")]
    Internal { message: String },
}

/// An error raised while instantiating or inferring a function, with the
/// span of the offending node when one is known.
#[derive(Clone, Debug, PartialEq, Error)]
#[error("{kind}")]
pub struct TypeInferenceError {
    pub kind: Box<InferErrorKind>,
    pub span: Span,
}

impl TypeInferenceError {
    pub fn new(kind: InferErrorKind, span: Span) -> Self {
        TypeInferenceError {
            kind: Box::new(kind),
            span,
        }
    }

    /// Attach `span` unless the error already carries a real location.
    #[must_use]
    pub fn or_span(mut self, span: &Span) -> Self {
        if self.span.is_dummy() {
            self.span = span.clone();
        }
        self
    }

    pub fn to_diagnostic(&self) -> Diagnostic {
        let span = Some(&self.span).filter(|s| !s.is_dummy());
        let message = self.to_string();
        match &*self.kind {
            InferErrorKind::Match(err) => err.to_diagnostic().with_optional_label(span, "in this call"),
            InferErrorKind::Registration(err) => err.to_diagnostic(),
            InferErrorKind::Build(err) => err.to_diagnostic(),
            InferErrorKind::UnboundParameter { param, .. } => Diagnostic::error(ErrorCode::E2004)
                .with_message(message)
                .with_optional_label(span, "called here")
                .with_suggestion(format!(
                    "mention `{param}` in a parameter type or give it a default"
                )),
            InferErrorKind::BoundViolation { .. } => Diagnostic::error(ErrorCode::E2009)
                .with_message(message)
                .with_optional_label(span, "instantiated here"),
            InferErrorKind::ResidualGeneric { .. } | InferErrorKind::Internal { .. } => {
                Diagnostic::error(ErrorCode::E9001)
                    .with_message(message)
                    .with_optional_label(span, "while compiling this")
            }
            InferErrorKind::RecursiveInstantiation { .. } => Diagnostic::error(ErrorCode::E2008)
                .with_message(message)
                .with_optional_label(span, "recursive call here")
                .with_note("device code cannot recurse"),
            InferErrorKind::NoBinaryOverload { lhs, rhs, .. } => {
                let diag = Diagnostic::error(ErrorCode::E2005)
                    .with_message(message)
                    .with_optional_label(span, "no matching overload");
                match (lhs, rhs) {
                    (l, r) if l.is_int() && r.is_float() || l.is_float() && r.is_int() => diag
                        .with_suggestion("convert one operand explicitly, e.g. `f32(x)`"),
                    (Type::Vector(l), Type::Vector(r)) if l.count() != r.count() => {
                        diag.with_note("vector operands must have the same width")
                    }
                    _ => diag,
                }
            }
            InferErrorKind::NoUnaryOverload { .. } | InferErrorKind::NoMethodOverload { .. } => {
                Diagnostic::error(ErrorCode::E2005)
                    .with_message(message)
                    .with_optional_label(span, "no matching overload")
            }
            InferErrorKind::UnknownFunction { .. } => Diagnostic::error(ErrorCode::E2006)
                .with_message(message)
                .with_optional_label(span, "not registered")
                .with_suggestion("register the function before compiling its callers"),
            InferErrorKind::UnknownMember { .. } | InferErrorKind::NotCallable { .. } => {
                Diagnostic::error(ErrorCode::E2011)
                    .with_message(message)
                    .with_optional_label(span, "unknown member")
            }
            InferErrorKind::UnboundMethod { member, .. } => Diagnostic::error(ErrorCode::E2011)
                .with_message(message)
                .with_optional_label(span, "method used as a value")
                .with_suggestion(format!("call it, e.g. `.{member}()`")),
            InferErrorKind::TypeMismatch { expected, found }
            | InferErrorKind::ReturnMismatch {
                expected, found, ..
            }
            | InferErrorKind::AnnotationMismatch {
                annotation: expected,
                found,
                ..
            } => {
                let diag = Diagnostic::error(ErrorCode::E2001)
                    .with_message(message)
                    .with_optional_label(span, format!("expected `{expected}`"));
                match (expected, found) {
                    (e, f) if e.is_float() && f.is_int() => {
                        diag.with_suggestion(format!("use `{e}(x)` to convert to `{e}`"))
                    }
                    (e, f) if e.is_int() && f.is_float() => {
                        diag.with_suggestion(format!("use `{e}(x)` to truncate to `{e}`"))
                    }
                    _ => diag,
                }
            }
            InferErrorKind::ConditionNotBool { .. }
            | InferErrorKind::NotIndexable { .. }
            | InferErrorKind::NonIntegerIndex { .. } => Diagnostic::error(ErrorCode::E2001)
                .with_message(message)
                .with_optional_label(span, "here"),
            InferErrorKind::ArgCount { .. } => Diagnostic::error(ErrorCode::E2002)
                .with_message(message)
                .with_optional_label(span, "in this call"),
            InferErrorKind::UseBeforeAssignment { .. } => Diagnostic::error(ErrorCode::E2010)
                .with_message(message)
                .with_optional_label(span, "read here")
                .with_suggestion("assign a value or declare the variable with a type first"),
        }
    }
}

impl From<InferErrorKind> for TypeInferenceError {
    fn from(kind: InferErrorKind) -> Self {
        TypeInferenceError::new(kind, Span::default())
    }
}

impl From<MatchError> for TypeInferenceError {
    fn from(err: MatchError) -> Self {
        InferErrorKind::Match(err).into()
    }
}

impl From<RegistrationError> for TypeInferenceError {
    fn from(err: RegistrationError) -> Self {
        InferErrorKind::Registration(err).into()
    }
}

impl From<BuildError> for TypeInferenceError {
    fn from(err: BuildError) -> Self {
        let span = err.span().cloned().unwrap_or_default();
        TypeInferenceError::new(InferErrorKind::Build(err), span)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn binary_overload_message_names_both_types() {
        let err = TypeInferenceError::new(
            InferErrorKind::NoBinaryOverload {
                op: "+",
                lhs: Type::F32,
                rhs: Type::I32,
            },
            Span::at((4, 12), (4, 17)).with_file("demo.py"),
        );
        assert_eq!(
            err.to_string(),
            "operator `+` is not defined for `f32` and `i32`"
        );
        let diag = err.to_diagnostic();
        assert_eq!(diag.code, ErrorCode::E2005);
        assert_eq!(
            diag.to_string(),
            "error[E2005]: operator `+` is not defined for `f32` and `i32`\n  \
             --> demo.py:4:12-4:17: no matching overload\n  \
             = help: convert one operand explicitly, e.g. `f32(x)`"
        );
    }

    #[test]
    fn or_span_keeps_existing_location() {
        let inner = Span::at((1, 1), (1, 2)).with_file("a.py");
        let outer = Span::at((9, 1), (9, 2)).with_file("a.py");
        let err = TypeInferenceError::new(
            InferErrorKind::UnknownFunction {
                name: Name::new("demo.g"),
            },
            inner.clone(),
        );
        assert_eq!(err.or_span(&outer).span, inner);

        let bare: TypeInferenceError = InferErrorKind::UnknownFunction {
            name: Name::new("demo.g"),
        }
        .into();
        assert_eq!(bare.or_span(&outer).span, outer);
    }

    #[test]
    fn return_mismatch_suggests_conversion() {
        let err = TypeInferenceError::new(
            InferErrorKind::ReturnMismatch {
                function: Name::new("demo.f"),
                expected: Type::F32,
                found: Type::I32,
            },
            Span::default(),
        );
        let diag = err.to_diagnostic();
        assert_eq!(diag.code, ErrorCode::E2001);
        assert!(diag.primary_span().is_none());
        assert_eq!(diag.suggestions, vec!["use `f32(x)` to convert to `f32`".to_owned()]);
    }
}
