//! Function-template resolution.
//!
//! Every free function and every source method is a template. Calling one
//! at concrete argument types walks the instance through
//! `Unresolved → Matching → Instantiating → Parsed`:
//!
//! 1. lower the declared parameter hints and match them against the
//!    argument types, binding every generic parameter;
//! 2. check that nothing is left unbound and every bound is respected;
//! 3. re-derive the signature under the bindings, which must be concrete;
//! 4. build the body against that signature and infer it.
//!
//! An instance is recorded as soon as matching starts, so its state is
//! observable throughout. Instances are memoized by `(template, concrete
//! parameter types)`. Meeting an instance that is still being built means
//! the template calls itself at the same types, which device code cannot
//! express. A failed instantiation is dropped together with every instance
//! created while it was being built.

use std::sync::Arc;

use shade_hir::{
    build_function, FunctionFlags, HintResolver, InstanceId, ParamSpec, Signature,
};
use shade_ir::ast::FuncDecl;
use shade_ir::{Name, VarType};
use shade_types::{
    match_template_args, substitute, FunctionSignature, RegistrationError, SourceMethod,
    Substitution, Type, TypeRegistry,
};

use crate::context::{GlobalContext, Instance, ResolveState, TemplateKey};
use crate::error::{InferErrorKind, TypeInferenceError};
use crate::infer::infer_function;

/// Everything needed to instantiate one template.
struct Template {
    key: TemplateKey,
    symbol: Name,
    signature: FunctionSignature,
    decl: Arc<FuncDecl>,
    self_type: Option<Type>,
    /// Bindings from the enclosing class instance.
    outer: Substitution,
}

/// Lowers hints met inside a body under the instance's bindings.
struct ContextResolver<'a> {
    registry: &'a mut TypeRegistry,
    subst: &'a Substitution,
    self_type: Option<&'a Type>,
}

impl HintResolver for ContextResolver<'_> {
    fn resolve_hint(&mut self, hint: &VarType) -> Result<Type, RegistrationError> {
        self.registry.lower(hint, self.subst, self.self_type)
    }
}

impl GlobalContext {
    /// Instantiate the free function `name` at `args`.
    pub fn instantiate(
        &mut self,
        name: &Name,
        args: &[Type],
    ) -> Result<InstanceId, TypeInferenceError> {
        let entry = self.functions.get(name).ok_or_else(|| {
            TypeInferenceError::from(InferErrorKind::UnknownFunction { name: name.clone() })
        })?;
        let template = Template {
            key: TemplateKey::Function(name.clone()),
            symbol: name.clone(),
            signature: entry.signature.clone(),
            decl: Arc::clone(&entry.decl),
            self_type: None,
            outer: Substitution::new(),
        };
        self.instantiate_template(template, args)
    }

    /// Instantiate a source method at `args`, receiver first.
    pub fn instantiate_method(
        &mut self,
        method: &SourceMethod,
        args: &[Type],
    ) -> Result<InstanceId, TypeInferenceError> {
        let template = Template {
            key: TemplateKey::Method {
                owner: method.self_type.clone(),
                name: method.signature.name().clone(),
            },
            symbol: method.signature.qualified_name(),
            signature: method.signature.signature.clone(),
            decl: Arc::clone(&method.signature.decl),
            self_type: Some(method.self_type.clone()),
            outer: method.class_subst.clone(),
        };
        self.instantiate_template(template, args)
    }

    #[tracing::instrument(level = "debug", skip_all, fields(template = %template.key))]
    fn instantiate_template(
        &mut self,
        template: Template,
        args: &[Type],
    ) -> Result<InstanceId, TypeInferenceError> {
        let span = template.decl.span.clone();
        let at_decl = |err: TypeInferenceError| err.or_span(&span);

        let id = InstanceId::new(u32::try_from(self.instances.len()).unwrap_or(u32::MAX));
        self.instances.push(Instance {
            key: template.key.clone(),
            symbol: template.symbol.clone(),
            params: args.to_vec(),
            state: ResolveState::Unresolved,
            function: None,
        });
        self.set_state(id, ResolveState::Matching);

        let (subst, params) = match self.bind_parameters(&template, args) {
            Ok(bound) => bound,
            Err(err) => {
                self.discard_from(id);
                return Err(at_decl(err));
            }
        };

        let key = (template.key.clone(), params.clone());
        if let Some(&existing) = self.by_key.get(&key) {
            self.discard_from(id);
            return match self.instances[existing.index()].state {
                ResolveState::Parsed => {
                    tracing::trace!(id = %existing, "instance cache hit");
                    Ok(existing)
                }
                _ => Err(at_decl(
                    InferErrorKind::RecursiveInstantiation {
                        callee: template.symbol.clone(),
                    }
                    .into(),
                )),
            };
        }
        self.instances[id.index()].params = params.clone();
        self.by_key.insert(key, id);

        match self.build_instance(id, &template, &subst, params) {
            Ok(()) => Ok(id),
            Err(err) => {
                tracing::debug!(%id, error = %err, "instantiation failed");
                self.discard_from(id);
                Err(at_decl(err))
            }
        }
    }

    /// Drop instance `id` and every instance created after it.
    fn discard_from(&mut self, id: InstanceId) {
        let len = id.index();
        self.instances.truncate(len);
        self.by_key.retain(|_, kept| kept.index() < len);
    }

    /// Match `args` against the template's parameters and derive the
    /// concrete parameter types.
    fn bind_parameters(
        &mut self,
        template: &Template,
        args: &[Type],
    ) -> Result<(Substitution, Vec<Type>), TypeInferenceError> {
        let signature = &template.signature;
        let mut declared = Vec::with_capacity(signature.params.len());
        for (name, hint) in &signature.params {
            let ty = self
                .registry
                .lower(hint, &template.outer, template.self_type.as_ref())?;
            declared.push((name.clone(), ty));
        }

        let matched = match_template_args(&template.symbol, &declared, args)?;
        for tv in &signature.type_vars {
            if !matched.binds(&tv.name) {
                return Err(InferErrorKind::UnboundParameter {
                    callee: template.symbol.clone(),
                    param: tv.name.clone(),
                }
                .into());
            }
            let Some(bound_to) = matched.get(&tv.name) else {
                continue;
            };
            if tv.bounds.is_empty() {
                continue;
            }
            let mut admitted = false;
            for hint in &tv.bounds {
                if self.registry.lower(hint, &Substitution::new(), None)? == *bound_to {
                    admitted = true;
                    break;
                }
            }
            if !admitted {
                return Err(InferErrorKind::BoundViolation {
                    callee: template.symbol.clone(),
                    param: tv.name.clone(),
                    ty: bound_to.clone(),
                }
                .into());
            }
        }

        let mut subst = template.outer.clone();
        subst.extend(&matched);

        let mut params = Vec::with_capacity(declared.len());
        for (_, ty) in &declared {
            let ty = substitute(ty, &subst);
            if !ty.is_concrete() {
                return Err(InferErrorKind::ResidualGeneric {
                    callee: template.symbol.clone(),
                    ty,
                }
                .into());
            }
            params.push(ty);
        }
        tracing::trace!(bindings = %subst, "bound template parameters");
        Ok((subst, params))
    }

    fn build_instance(
        &mut self,
        id: InstanceId,
        template: &Template,
        subst: &Substitution,
        params: Vec<Type>,
    ) -> Result<(), TypeInferenceError> {
        let signature = &template.signature;
        let return_type = match &signature.ret {
            Some(hint) => {
                let ty = self.registry.lower(hint, subst, template.self_type.as_ref())?;
                if !ty.is_concrete() {
                    return Err(InferErrorKind::ResidualGeneric {
                        callee: template.symbol.clone(),
                        ty,
                    }
                    .into());
                }
                Some(ty)
            }
            None => None,
        };

        self.set_state(id, ResolveState::Instantiating);

        let mut flags = FunctionFlags::empty();
        if template.decl.export {
            flags |= FunctionFlags::EXPORT;
        }
        let hir_signature = Signature {
            name: template.symbol.clone(),
            params: signature
                .params
                .iter()
                .zip(&template.decl.params)
                .zip(params)
                .map(|(((name, _), decl), ty)| ParamSpec {
                    name: name.clone(),
                    ty: Some(ty),
                    by_ref: decl.by_ref,
                })
                .collect(),
            return_type,
            const_params: signature
                .type_vars
                .iter()
                .filter(|tv| tv.is_const)
                .map(|tv| tv.name.clone())
                .collect(),
            flags,
            span: template.decl.span.clone(),
        };

        let mut resolver = ContextResolver {
            registry: &mut self.registry,
            subst,
            self_type: template.self_type.as_ref(),
        };
        let mut function = build_function(&template.decl, hir_signature, &mut resolver)?;
        infer_function(self, &mut function, subst)?;

        let instance = &mut self.instances[id.index()];
        instance.function = Some(function);
        self.set_state(id, ResolveState::Parsed);
        Ok(())
    }

    fn set_state(&mut self, id: InstanceId, state: ResolveState) {
        let instance = &mut self.instances[id.index()];
        tracing::debug!(%id, symbol = %instance.symbol, from = ?instance.state, to = ?state, "instance state");
        instance.state = state;
    }
}
