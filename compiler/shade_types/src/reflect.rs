//! Class and function signatures in the `VarType` algebra.
//!
//! This is the first thing a declaration meets after crossing the host
//! boundary: hints are normalized (implicit generics, `Self` receivers),
//! base classes are merged in, and generic signatures can be instantiated
//! with concrete type arguments.

use std::sync::Arc;

use shade_diagnostic::{Diagnostic, ErrorCode};
use shade_ir::ast::{ClassDecl, FuncDecl, TypeVarDecl};
use shade_ir::{Name, Span, VarType};
use thiserror::Error;

use crate::{Type, TypeError};

// ── Errors ──────────────────────────────────────────────────────────

#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum RegistrationError {
    #[error("`{name}` is declared inside a function; only top-level classes can be DSL types")]
    LocalDeclaration { name: Name, span: Span },
    #[error("base class `{base}` of `{class}` is not registered")]
    UnregisteredBase { class: Name, base: String },
    #[error("unsupported type hint `{hint}`")]
    UnsupportedHint { hint: String },
    #[error("unknown type `{name}`")]
    UnknownType { name: Name },
    #[error("`{name}` expects {expected} type argument(s) but got {found}")]
    TypeArgArity {
        name: Name,
        expected: usize,
        found: usize,
    },
    #[error("`{name}` is already registered with a different declaration")]
    ConflictingRegistration { name: Name },
    #[error("`{ty}` does not satisfy the bound on `{param}` of `{name}`")]
    BoundViolation { name: Name, param: Name, ty: Type },
    #[error(transparent)]
    InvalidType(#[from] TypeError),
}

impl RegistrationError {
    pub fn unsupported(hint: &VarType) -> Self {
        RegistrationError::UnsupportedHint {
            hint: hint.to_string(),
        }
    }

    pub fn to_diagnostic(&self) -> Diagnostic {
        let code = match self {
            RegistrationError::LocalDeclaration { .. } => ErrorCode::E1001,
            RegistrationError::UnregisteredBase { .. } => ErrorCode::E1002,
            RegistrationError::UnsupportedHint { .. } => ErrorCode::E1003,
            RegistrationError::UnknownType { .. } => ErrorCode::E1004,
            RegistrationError::TypeArgArity { .. } => ErrorCode::E1005,
            RegistrationError::ConflictingRegistration { .. } => ErrorCode::E1006,
            RegistrationError::InvalidType(_) => ErrorCode::E1007,
            RegistrationError::BoundViolation { .. } => ErrorCode::E1008,
        };
        let diag = Diagnostic::error(code).with_message(self.to_string());
        match self {
            RegistrationError::LocalDeclaration { span, .. } if !span.is_dummy() => {
                diag.with_label(span.clone(), "declared here")
                    .with_suggestion("move the class to module level")
            }
            RegistrationError::UnregisteredBase { .. } => {
                diag.with_suggestion("register the base class before its subclasses")
            }
            RegistrationError::UnsupportedHint { .. } => {
                diag.with_note("unions, literals and `Any` are not DSL types")
            }
            _ => diag,
        }
    }
}

// ── Signatures ──────────────────────────────────────────────────────

/// A normalized function or method signature.
#[derive(Clone, Debug, PartialEq)]
pub struct FunctionSignature {
    pub name: Name,
    /// Declared generic parameters followed by implicit ones (`Any#i`).
    pub type_vars: Vec<TypeVarDecl>,
    pub params: Vec<(Name, VarType)>,
    pub ret: Option<VarType>,
    pub is_static: bool,
}

impl FunctionSignature {
    /// Normalize a declaration.
    ///
    /// Parameters without a hint (or hinted `Any`) become implicit generic
    /// parameters named `Any#<index>`. For methods, an unannotated first
    /// parameter of a non-static method is the receiver and types as `Self`.
    pub fn from_decl(decl: &FuncDecl, is_method: bool) -> Self {
        let mut type_vars = decl.type_vars.clone();
        let params = decl
            .params
            .iter()
            .enumerate()
            .map(|(i, param)| {
                let ty = match &param.ty {
                    None if i == 0 && is_method && !decl.is_static => VarType::SelfType,
                    None | Some(VarType::Any) => {
                        let implicit = Name::new(format!("Any#{i}"));
                        type_vars.push(TypeVarDecl::new(implicit.clone()));
                        VarType::TypeVar(implicit)
                    }
                    Some(ty) => ty.clone(),
                };
                (param.name.clone(), ty)
            })
            .collect();
        FunctionSignature {
            name: decl.name.clone(),
            type_vars,
            params,
            ret: decl.ret.clone(),
            is_static: decl.is_static,
        }
    }

    pub fn is_generic(&self) -> bool {
        !self.type_vars.is_empty()
    }

    /// Substitute outer (class-level) type variables. The signature's own
    /// generic parameters shadow outer ones of the same name.
    #[must_use]
    pub fn substitute(&self, bindings: &[(Name, VarType)]) -> FunctionSignature {
        let visible: Vec<(Name, VarType)> = bindings
            .iter()
            .filter(|(var, _)| !self.type_vars.iter().any(|tv| &tv.name == var))
            .cloned()
            .collect();
        FunctionSignature {
            name: self.name.clone(),
            type_vars: self.type_vars.clone(),
            params: self
                .params
                .iter()
                .map(|(name, ty)| (name.clone(), ty.substitute(&visible)))
                .collect(),
            ret: self.ret.as_ref().map(|ty| ty.substitute(&visible)),
            is_static: self.is_static,
        }
    }
}

/// A method together with the class that defines it.
#[derive(Clone, Debug, PartialEq)]
pub struct MethodSignature {
    /// Qualified name of the defining class (a base class for inherited
    /// methods).
    pub owner: Name,
    pub signature: FunctionSignature,
    pub decl: Arc<FuncDecl>,
}

impl MethodSignature {
    pub fn name(&self) -> &Name {
        &self.signature.name
    }

    /// `owner.method`
    pub fn qualified_name(&self) -> Name {
        self.owner.child(self.signature.name.as_str())
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct ClassSignature {
    pub name: Name,
    pub type_vars: Vec<TypeVarDecl>,
    pub fields: Vec<(Name, VarType)>,
    pub methods: Vec<MethodSignature>,
}

impl ClassSignature {
    /// Build the signature of `decl`, merging in already-resolved base
    /// signatures. Members declared on `decl` replace same-named inherited
    /// ones in place; later bases do not override earlier ones.
    pub fn from_decl(decl: &ClassDecl, bases: &[ClassSignature]) -> Self {
        let mut fields: Vec<(Name, VarType)> = Vec::new();
        let mut methods: Vec<MethodSignature> = Vec::new();

        for base in bases {
            for field in &base.fields {
                if !fields.iter().any(|(name, _)| *name == field.0) {
                    fields.push(field.clone());
                }
            }
            for method in &base.methods {
                if !methods.iter().any(|m| m.name() == method.name()) {
                    methods.push(method.clone());
                }
            }
        }

        for (name, ty) in &decl.fields {
            match fields.iter_mut().find(|(existing, _)| existing == name) {
                Some(slot) => slot.1 = ty.clone(),
                None => fields.push((name.clone(), ty.clone())),
            }
        }

        for method in &decl.methods {
            let sig = MethodSignature {
                owner: decl.name.clone(),
                signature: FunctionSignature::from_decl(method, true),
                decl: Arc::new(method.clone()),
            };
            match methods.iter_mut().find(|m| m.name() == &method.name) {
                Some(slot) => *slot = sig,
                None => methods.push(sig),
            }
        }

        ClassSignature {
            name: decl.name.clone(),
            type_vars: decl.type_vars.clone(),
            fields,
            methods,
        }
    }

    pub fn field(&self, name: &str) -> Option<&VarType> {
        self.fields
            .iter()
            .find(|(field, _)| field.as_str() == name)
            .map(|(_, ty)| ty)
    }

    pub fn method(&self, name: &str) -> Option<&MethodSignature> {
        self.methods.iter().find(|m| m.name().as_str() == name)
    }

    /// Substitute `type_args` for the class's type variables throughout
    /// fields and methods.
    pub fn instantiate(&self, type_args: &[VarType]) -> Result<ClassSignature, RegistrationError> {
        if type_args.len() != self.type_vars.len() {
            return Err(RegistrationError::TypeArgArity {
                name: self.name.clone(),
                expected: self.type_vars.len(),
                found: type_args.len(),
            });
        }
        let bindings: Vec<(Name, VarType)> = self
            .type_vars
            .iter()
            .map(|tv| tv.name.clone())
            .zip(type_args.iter().cloned())
            .collect();
        Ok(ClassSignature {
            name: self.name.clone(),
            type_vars: Vec::new(),
            fields: self
                .fields
                .iter()
                .map(|(name, ty)| (name.clone(), ty.substitute(&bindings)))
                .collect(),
            methods: self
                .methods
                .iter()
                .map(|m| MethodSignature {
                    owner: m.owner.clone(),
                    signature: m.signature.substitute(&bindings),
                    decl: Arc::clone(&m.decl),
                })
                .collect(),
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, reason = "test assertions use unwrap for clarity")]
mod tests {
    use pretty_assertions::assert_eq;
    use shade_ir::ast::{ClassDecl, Expr, FuncDecl, Stmt};

    use super::*;

    fn getter(name: &str, ret: &str) -> FuncDecl {
        FuncDecl::new(name)
            .untyped_param("self")
            .returns(VarType::concrete(ret))
            .body(vec![Stmt::ret(Expr::attr(Expr::name("self"), "x"))])
    }

    #[test]
    fn unannotated_receiver_is_self() {
        let sig = FunctionSignature::from_decl(&getter("get", "f32"), true);
        assert_eq!(sig.params[0].1, VarType::SelfType);
        assert!(sig.type_vars.is_empty());
    }

    #[test]
    fn unannotated_params_become_implicit_generics() {
        let decl = FuncDecl::new("demo.mix")
            .untyped_param("a")
            .param("b", VarType::Any)
            .param("t", VarType::concrete("f32"));
        let sig = FunctionSignature::from_decl(&decl, false);
        let names: Vec<_> = sig.type_vars.iter().map(|tv| tv.name.as_str()).collect();
        assert_eq!(names, vec!["Any#0", "Any#1"]);
        assert_eq!(sig.params[0].1, VarType::var("Any#0"));
        assert_eq!(sig.params[2].1, VarType::concrete("f32"));
    }

    #[test]
    fn derived_members_override_base_members() {
        let base_decl = ClassDecl::new("demo.Base")
            .field("x", VarType::concrete("f32"))
            .field("tag", VarType::concrete("i32"))
            .method(getter("get", "f32"))
            .method(getter("base_only", "f32"));
        let base = ClassSignature::from_decl(&base_decl, &[]);

        let derived_decl = ClassDecl::new("demo.Derived")
            .base(VarType::concrete("demo.Base"))
            .field("tag", VarType::concrete("u32"))
            .field("y", VarType::concrete("f32"))
            .method(getter("get", "f64"));
        let derived = ClassSignature::from_decl(&derived_decl, &[base]);

        let fields: Vec<_> = derived
            .fields
            .iter()
            .map(|(n, t)| format!("{n}: {t}"))
            .collect();
        assert_eq!(fields, vec!["x: f32", "tag: u32", "y: f32"]);

        assert_eq!(derived.method("get").unwrap().owner.as_str(), "demo.Derived");
        assert_eq!(
            derived.method("base_only").unwrap().qualified_name().as_str(),
            "demo.Base.base_only"
        );
        assert_eq!(derived.methods.len(), 2);
    }

    #[test]
    fn instantiate_substitutes_fields_and_methods() {
        let decl = ClassDecl::new("demo.Box")
            .type_var(TypeVarDecl::new("T"))
            .field("value", VarType::var("T"))
            .method(
                FuncDecl::new("scale")
                    .untyped_param("self")
                    .param("k", VarType::var("T"))
                    .returns(VarType::var("T")),
            );
        let sig = ClassSignature::from_decl(&decl, &[]);
        let inst = sig.instantiate(&[VarType::concrete("f32")]).unwrap();

        assert_eq!(inst.field("value"), Some(&VarType::concrete("f32")));
        let scale = &inst.method("scale").unwrap().signature;
        assert_eq!(scale.params[1].1, VarType::concrete("f32"));
        assert_eq!(scale.ret, Some(VarType::concrete("f32")));
        assert!(inst.type_vars.is_empty());
    }

    #[test]
    fn method_type_vars_shadow_class_type_vars() {
        let decl = ClassDecl::new("demo.Box")
            .type_var(TypeVarDecl::new("T"))
            .method(
                FuncDecl::new("convert")
                    .type_var(TypeVarDecl::new("T"))
                    .untyped_param("self")
                    .param("x", VarType::var("T")),
            );
        let inst = ClassSignature::from_decl(&decl, &[])
            .instantiate(&[VarType::concrete("i32")])
            .unwrap();
        assert_eq!(
            inst.method("convert").unwrap().signature.params[1].1,
            VarType::var("T")
        );
    }

    #[test]
    fn instantiate_arity_mismatch_names_both_counts() {
        let decl = ClassDecl::new("demo.Pair")
            .type_var(TypeVarDecl::new("A"))
            .type_var(TypeVarDecl::new("B"));
        let err = ClassSignature::from_decl(&decl, &[])
            .instantiate(&[VarType::concrete("f32")])
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "`demo.Pair` expects 2 type argument(s) but got 1"
        );
        assert_eq!(err.to_diagnostic().code, ErrorCode::E1005);
    }
}
