//! The compilation context.
//!
//! [`GlobalContext`] is the one piece of mutable state shared by a whole
//! compilation: the type registry, the registered free functions and every
//! template instance produced so far. It is an ordinary value; tests build
//! as many independent contexts as they like.

use std::sync::Arc;

use rustc_hash::FxHashMap;
use shade_hir::{Function, InstanceId};
use shade_ir::ast::{ClassDecl, FuncDecl};
use shade_ir::Name;
use shade_types::{FunctionSignature, RegistrationError, Type, TypeRegistry};

/// Identity of a function template.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum TemplateKey {
    /// A registered free function.
    Function(Name),
    /// A source method installed on `owner`.
    Method { owner: Type, name: Name },
}

impl std::fmt::Display for TemplateKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TemplateKey::Function(name) => write!(f, "{name}"),
            TemplateKey::Method { owner, name } => write!(f, "{owner}.{name}"),
        }
    }
}

/// Progress of one instantiation.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ResolveState {
    Unresolved,
    /// Binding the template's generic parameters.
    Matching,
    /// Building and inferring the body.
    Instantiating,
    /// Done; the instance holds a fully typed function.
    Parsed,
}

/// A template monomorphized at concrete parameter types.
#[derive(Clone, Debug)]
pub struct Instance {
    pub key: TemplateKey,
    /// Source-level name of the instantiated function.
    pub symbol: Name,
    /// Concrete parameter types, receiver first for methods.
    pub params: Vec<Type>,
    pub state: ResolveState,
    /// Present once `state` is [`ResolveState::Parsed`].
    pub function: Option<Function>,
}

pub(crate) struct FunctionEntry {
    pub(crate) decl: Arc<FuncDecl>,
    pub(crate) signature: FunctionSignature,
}

#[derive(Default)]
pub struct GlobalContext {
    pub registry: TypeRegistry,
    pub(crate) functions: FxHashMap<Name, FunctionEntry>,
    pub(crate) instances: Vec<Instance>,
    pub(crate) by_key: FxHashMap<(TemplateKey, Vec<Type>), InstanceId>,
}

impl GlobalContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_class(&mut self, decl: &ClassDecl) -> Result<Type, RegistrationError> {
        self.registry.register_class(decl)
    }

    /// Register a free function under its qualified name. Registering the
    /// same declaration again is a no-op.
    #[tracing::instrument(level = "debug", skip_all, fields(function = %decl.name))]
    pub fn register_function(&mut self, decl: &FuncDecl) -> Result<(), RegistrationError> {
        if let Some(entry) = self.functions.get(&decl.name) {
            return if *entry.decl == *decl {
                Ok(())
            } else {
                Err(RegistrationError::ConflictingRegistration {
                    name: decl.name.clone(),
                })
            };
        }
        let signature = FunctionSignature::from_decl(decl, false);
        tracing::debug!(generic = signature.is_generic(), "registered function");
        self.functions.insert(
            decl.name.clone(),
            FunctionEntry {
                decl: Arc::new(decl.clone()),
                signature,
            },
        );
        Ok(())
    }

    pub fn function_signature(&self, name: &str) -> Option<&FunctionSignature> {
        self.functions.get(name).map(|entry| &entry.signature)
    }

    pub fn instance(&self, id: InstanceId) -> &Instance {
        &self.instances[id.index()]
    }

    /// The fully typed function of a finished instance.
    pub fn function(&self, id: InstanceId) -> Option<&Function> {
        self.instances.get(id.index())?.function.as_ref()
    }

    pub fn function_mut(&mut self, id: InstanceId) -> Option<&mut Function> {
        self.instances.get_mut(id.index())?.function.as_mut()
    }

    /// The instance of `key` at `params`, if one was started.
    pub fn lookup_instance(&self, key: &TemplateKey, params: &[Type]) -> Option<InstanceId> {
        self.by_key.get(&(key.clone(), params.to_vec())).copied()
    }

    pub fn instance_count(&self) -> usize {
        self.instances.len()
    }
}
