//! The type registry.
//!
//! Maps host-level names to DSL types, owns the per-type method tables, and
//! caches monomorphized instantiations of generic classes. The registry is
//! append-only: registering the same declaration twice is a no-op, and
//! nothing is ever removed.
//!
//! Source methods are installed unlowered and their hints are lowered the
//! first time the owning type's methods are looked up, so a method may name
//! its own class or a class registered after it.

use std::sync::Arc;

use rustc_hash::FxHashMap;
use shade_ir::ast::{ClassDecl, TypeVarDecl};
use shade_ir::{BinaryOp, LiteralValue, Name, UnaryOp, VarType};

use crate::reflect::{ClassSignature, MethodSignature, RegistrationError};
use crate::{
    ArrayLen, BoundType, ParametricType, StructType, Substitution, Type, TypeParamSymbol,
    TypeParameter,
};

/// Builtin generic origins understood by [`TypeRegistry::lower`].
pub const ARRAY_ORIGIN: &str = "Array";
pub const POINTER_ORIGIN: &str = "Pointer";
pub const VECTOR_ORIGIN: &str = "Vector";

// ── Methods ─────────────────────────────────────────────────────────

/// Operations implemented directly by the backend.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum Intrinsic {
    Binary(BinaryOp),
    Unary(UnaryOp),
}

/// A method defined in DSL source on a registered class.
#[derive(Clone, Debug, PartialEq)]
pub struct SourceMethod {
    pub signature: MethodSignature,
    /// The struct the method was installed on.
    pub self_type: Type,
    /// Class type arguments visible to the method body.
    pub class_subst: Substitution,
}

#[derive(Clone, Debug, PartialEq)]
pub enum MethodImpl {
    Intrinsic(Intrinsic),
    Source(Arc<SourceMethod>),
}

/// One entry of a method table.
#[derive(Clone, Debug, PartialEq)]
pub struct Method {
    pub name: Name,
    /// Parameters, receiver first for instance methods. May mention the
    /// method's own generic parameters as `Symbolic` types.
    pub params: Vec<(Name, Type)>,
    /// `None` when the return type is left to inference.
    pub ret: Option<Type>,
    pub type_params: Vec<TypeParameter>,
    pub imp: MethodImpl,
}

impl Method {
    /// The method viewed as a first-class function type.
    pub fn function_type(&self) -> Type {
        Type::function(
            self.params.iter().map(|(_, ty)| ty.clone()).collect(),
            self.ret.clone().unwrap_or(Type::Unit),
        )
    }
}

/// Overload sets by method name, each in installation order.
#[derive(Clone, Debug, Default)]
struct MethodTable {
    by_name: FxHashMap<Name, Vec<Method>>,
}

impl MethodTable {
    fn get(&self, name: &str) -> &[Method] {
        self.by_name.get(name).map_or(&[], Vec::as_slice)
    }

    fn push(&mut self, method: Method) {
        self.by_name
            .entry(method.name.clone())
            .or_default()
            .push(method);
    }
}

/// A source method whose hints have not been lowered yet.
#[derive(Clone)]
struct PendingMethod {
    signature: MethodSignature,
    class_subst: Substitution,
}

/// Component index of a vector swizzle (`x`, `y`, `z`, `w`).
pub fn swizzle_index(name: &str) -> Option<u32> {
    match name {
        "x" => Some(0),
        "y" => Some(1),
        "z" => Some(2),
        "w" => Some(3),
        _ => None,
    }
}

// ── Registry ────────────────────────────────────────────────────────

struct ClassEntry {
    decl: ClassDecl,
    signature: ClassSignature,
    ty: Type,
}

pub struct TypeRegistry {
    types: FxHashMap<Name, Type>,
    classes: FxHashMap<Name, ClassEntry>,
    methods: FxHashMap<Type, MethodTable>,
    pending: FxHashMap<Type, Vec<PendingMethod>>,
    instances: FxHashMap<(Name, Vec<Type>), Arc<BoundType>>,
}

impl Default for TypeRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl TypeRegistry {
    /// A registry seeded with the builtin scalars, vectors and their
    /// operator methods.
    pub fn new() -> Self {
        let mut registry = TypeRegistry {
            types: FxHashMap::default(),
            classes: FxHashMap::default(),
            methods: FxHashMap::default(),
            pending: FxHashMap::default(),
            instances: FxHashMap::default(),
        };
        crate::builtins::seed(&mut registry);
        registry
    }

    // ── Names ───────────────────────────────────────────────────────

    pub fn lookup(&self, name: &str) -> Option<&Type> {
        self.types.get(name)
    }

    /// Bind a host name to a type. Rebinding a name to the same type is a
    /// no-op; rebinding it to a different type is an error.
    pub fn define(&mut self, name: impl Into<Name>, ty: Type) -> Result<(), RegistrationError> {
        let name = name.into();
        match self.types.get(&name) {
            Some(existing) if *existing == ty => Ok(()),
            Some(_) => Err(RegistrationError::ConflictingRegistration { name }),
            None => {
                self.types.insert(name, ty);
                Ok(())
            }
        }
    }

    pub(crate) fn seed_name(&mut self, name: Name, ty: Type) {
        self.types.insert(name, ty);
    }

    // ── Classes ─────────────────────────────────────────────────────

    /// Register a class declaration and return its type: a `Struct` for a
    /// plain class, a `Parametric` for a generic one.
    #[tracing::instrument(level = "debug", skip_all, fields(class = %decl.name))]
    pub fn register_class(&mut self, decl: &ClassDecl) -> Result<Type, RegistrationError> {
        if decl.is_local {
            return Err(RegistrationError::LocalDeclaration {
                name: decl.name.clone(),
                span: decl.span.clone(),
            });
        }
        if let Some(entry) = self.classes.get(&decl.name) {
            tracing::trace!("already registered");
            return if entry.decl == *decl {
                Ok(entry.ty.clone())
            } else {
                Err(RegistrationError::ConflictingRegistration {
                    name: decl.name.clone(),
                })
            };
        }
        if self.types.contains_key(&decl.name) {
            return Err(RegistrationError::ConflictingRegistration {
                name: decl.name.clone(),
            });
        }

        let mut bases = Vec::with_capacity(decl.bases.len());
        for base in &decl.bases {
            bases.push(self.base_signature(&decl.name, base)?);
        }
        let signature = ClassSignature::from_decl(decl, &bases);

        let plain = signature.type_vars.is_empty();
        let ty = if plain {
            self.build_struct(&signature, Vec::new(), &Substitution::new())?
        } else {
            if let Some(tv) = signature.type_vars.iter().find(|tv| tv.is_const) {
                return Err(RegistrationError::UnsupportedHint {
                    hint: format!("constant class parameter `{}`", tv.name),
                });
            }
            let params = self.type_parameters(&signature.type_vars)?;
            let symbolic_args = signature
                .type_vars
                .iter()
                .map(|tv| Type::Symbolic(tv.name.clone()))
                .collect();
            let body = self.build_struct(&signature, symbolic_args, &Substitution::new())?;
            Type::Parametric(Arc::new(ParametricType {
                name: decl.name.clone(),
                params,
                body,
            }))
        };

        tracing::debug!(ty = %ty, "registered class");
        self.types.insert(decl.name.clone(), ty.clone());
        if plain {
            self.install_methods(&ty, &signature, &Substitution::new());
        }
        self.classes.insert(
            decl.name.clone(),
            ClassEntry {
                decl: decl.clone(),
                signature,
                ty: ty.clone(),
            },
        );
        Ok(ty)
    }

    /// The merged signature of a registered class, inherited members
    /// included.
    pub fn class_signature(&self, name: &str) -> Option<&ClassSignature> {
        self.classes.get(name).map(|entry| &entry.signature)
    }

    fn base_signature(
        &self,
        class: &Name,
        base: &VarType,
    ) -> Result<ClassSignature, RegistrationError> {
        let unregistered = || RegistrationError::UnregisteredBase {
            class: class.clone(),
            base: base.to_string(),
        };
        match base {
            VarType::Concrete(name) => {
                let entry = self.classes.get(name).ok_or_else(unregistered)?;
                if entry.signature.type_vars.is_empty() {
                    Ok(entry.signature.clone())
                } else {
                    entry.signature.instantiate(&[])
                }
            }
            VarType::Instance { origin, args } => {
                let entry = self.classes.get(origin).ok_or_else(unregistered)?;
                entry.signature.instantiate(args)
            }
            VarType::Annotated { inner, .. } => self.base_signature(class, inner),
            _ => Err(unregistered()),
        }
    }

    fn build_struct(
        &mut self,
        signature: &ClassSignature,
        type_args: Vec<Type>,
        subst: &Substitution,
    ) -> Result<Type, RegistrationError> {
        let mut fields = Vec::with_capacity(signature.fields.len());
        for (name, hint) in &signature.fields {
            fields.push((name.clone(), self.lower(hint, subst, None)?));
        }
        Ok(Type::Struct(Arc::new(StructType {
            name: Name::new(signature.name.short()),
            qualified_name: signature.name.clone(),
            type_args,
            fields,
        })))
    }

    fn type_parameters(
        &mut self,
        decls: &[TypeVarDecl],
    ) -> Result<Vec<TypeParameter>, RegistrationError> {
        let mut params = Vec::with_capacity(decls.len());
        for decl in decls {
            let symbol = if decl.is_const {
                TypeParamSymbol::Const(decl.name.clone())
            } else {
                TypeParamSymbol::Type(decl.name.clone())
            };
            let mut bound = Vec::with_capacity(decl.bounds.len());
            for hint in &decl.bounds {
                bound.push(self.lower(hint, &Substitution::new(), None)?);
            }
            params.push(TypeParameter { symbol, bound });
        }
        Ok(params)
    }

    fn install_methods(
        &mut self,
        ty: &Type,
        signature: &ClassSignature,
        class_subst: &Substitution,
    ) {
        let pending = self.pending.entry(ty.materialized().clone()).or_default();
        for method in &signature.methods {
            tracing::trace!(ty = %ty, method = %method.name(), "install method");
            pending.push(PendingMethod {
                signature: method.clone(),
                class_subst: class_subst.clone(),
            });
        }
    }

    /// Lower the hints of every source method still pending on `ty` and
    /// move them into its method table. Either all of them are lowered or
    /// none is.
    fn lower_methods(&mut self, ty: &Type) -> Result<(), RegistrationError> {
        let owner = ty.materialized();
        let Some(pending) = self.pending.get(owner).cloned() else {
            return Ok(());
        };
        let owner = owner.clone();
        let mut lowered = Vec::with_capacity(pending.len());
        for method in &pending {
            lowered.push(self.lower_method(&owner, method)?);
        }
        self.pending.remove(&owner);
        for method in lowered {
            self.add_method(&owner, method);
        }
        tracing::debug!(ty = %owner, "lowered source methods");
        Ok(())
    }

    fn lower_method(
        &mut self,
        owner: &Type,
        pending: &PendingMethod,
    ) -> Result<Method, RegistrationError> {
        let sig = &pending.signature.signature;
        let mut subst = pending.class_subst.clone();
        for tv in &sig.type_vars {
            subst.remove(&tv.name);
        }

        let mut params = Vec::with_capacity(sig.params.len());
        for (name, hint) in &sig.params {
            params.push((name.clone(), self.lower(hint, &subst, Some(owner))?));
        }
        let ret = match &sig.ret {
            Some(hint) => Some(self.lower(hint, &subst, Some(owner))?),
            None => None,
        };
        let type_params = self.type_parameters(&sig.type_vars)?;

        Ok(Method {
            name: sig.name.clone(),
            params,
            ret,
            type_params,
            imp: MethodImpl::Source(Arc::new(SourceMethod {
                signature: pending.signature.clone(),
                self_type: owner.clone(),
                class_subst: subst,
            })),
        })
    }

    /// Monomorphize a generic class. Instantiations with fully concrete
    /// arguments are cached and get their own method table; the same
    /// arguments always yield an equal struct type.
    #[tracing::instrument(level = "debug", skip(self), fields(class = %name))]
    pub fn instantiate_class(
        &mut self,
        name: &Name,
        args: &[Type],
    ) -> Result<Type, RegistrationError> {
        let entry = self
            .classes
            .get(name)
            .ok_or_else(|| RegistrationError::UnknownType { name: name.clone() })?;
        let Type::Parametric(generic) = &entry.ty else {
            return Err(RegistrationError::TypeArgArity {
                name: name.clone(),
                expected: 0,
                found: args.len(),
            });
        };
        if generic.params.len() != args.len() {
            return Err(RegistrationError::TypeArgArity {
                name: name.clone(),
                expected: generic.params.len(),
                found: args.len(),
            });
        }
        for (param, arg) in generic.params.iter().zip(args) {
            if arg.is_concrete() && !param.admits(arg) {
                return Err(RegistrationError::BoundViolation {
                    name: name.clone(),
                    param: param.symbol.name().clone(),
                    ty: arg.clone(),
                });
            }
        }

        let concrete = args.iter().all(Type::is_concrete);
        let key = (name.clone(), args.to_vec());
        if concrete {
            if let Some(bound) = self.instances.get(&key) {
                tracing::trace!("instance cache hit");
                return Ok(bound.instantiated.clone());
            }
        }

        let generic = Arc::clone(generic);
        let signature = entry.signature.clone();
        let mut subst = Substitution::new();
        for (tv, arg) in signature.type_vars.iter().zip(args) {
            subst.bind(tv.name.clone(), arg.clone());
        }

        let ty = self.build_struct(&signature, args.to_vec(), &subst)?;
        if concrete {
            tracing::debug!(ty = %ty, "new instance");
            self.instances.insert(
                key,
                Arc::new(BoundType {
                    generic,
                    args: args.to_vec(),
                    instantiated: ty.clone(),
                }),
            );
            self.install_methods(&ty, &signature, &subst);
        }
        Ok(ty)
    }

    /// The cached instantiation of `name` at `args`, if any.
    pub fn bound_instance(&self, name: &Name, args: &[Type]) -> Option<&Arc<BoundType>> {
        self.instances.get(&(name.clone(), args.to_vec()))
    }

    // ── Lowering ────────────────────────────────────────────────────

    /// Lower a type hint. Type variables bound in `subst` are replaced;
    /// unbound ones become `Symbolic`. `Self` lowers to `self_type`.
    pub fn lower(
        &mut self,
        hint: &VarType,
        subst: &Substitution,
        self_type: Option<&Type>,
    ) -> Result<Type, RegistrationError> {
        match hint {
            VarType::TypeVar(name) => match subst.get(name) {
                Some(ty) => Ok(ty.clone()),
                None if subst.get_const(name).is_some() => Err(RegistrationError::unsupported(hint)),
                None => Ok(Type::Symbolic(name.clone())),
            },
            VarType::Concrete(name) => match self.types.get(name) {
                Some(Type::Parametric(p)) => Err(RegistrationError::TypeArgArity {
                    name: name.clone(),
                    expected: p.params.len(),
                    found: 0,
                }),
                Some(ty) => Ok(ty.clone()),
                None => Err(RegistrationError::UnknownType { name: name.clone() }),
            },
            VarType::Instance { origin, args } => self.lower_instance(origin, args, subst, self_type),
            VarType::SelfType => self_type
                .cloned()
                .ok_or_else(|| RegistrationError::unsupported(hint)),
            VarType::Annotated { inner, .. } => self.lower(inner, subst, self_type),
            VarType::Union(_) | VarType::Any | VarType::Literal(_) => {
                Err(RegistrationError::unsupported(hint))
            }
        }
    }

    fn lower_instance(
        &mut self,
        origin: &Name,
        args: &[VarType],
        subst: &Substitution,
        self_type: Option<&Type>,
    ) -> Result<Type, RegistrationError> {
        let arity = |expected: usize| {
            if args.len() == expected {
                Ok(())
            } else {
                Err(RegistrationError::TypeArgArity {
                    name: origin.clone(),
                    expected,
                    found: args.len(),
                })
            }
        };
        match origin.as_str() {
            ARRAY_ORIGIN => {
                arity(2)?;
                let element = self.lower(&args[0], subst, self_type)?;
                let count = match &args[1] {
                    VarType::Literal(LiteralValue::Int(n)) => ArrayLen::Known(
                        u32::try_from(*n).map_err(|_| RegistrationError::unsupported(&args[1]))?,
                    ),
                    VarType::TypeVar(n) => subst
                        .get_const(n)
                        .map_or_else(|| ArrayLen::Symbolic(n.clone()), ArrayLen::Known),
                    other => return Err(RegistrationError::unsupported(other)),
                };
                Ok(Type::array(element, count))
            }
            POINTER_ORIGIN => {
                arity(1)?;
                Ok(Type::pointer(self.lower(&args[0], subst, self_type)?))
            }
            VECTOR_ORIGIN => {
                arity(2)?;
                let element = self.lower(&args[0], subst, self_type)?;
                match &args[1] {
                    VarType::Literal(LiteralValue::Int(n)) => {
                        let count = u32::try_from(*n)
                            .map_err(|_| RegistrationError::unsupported(&args[1]))?;
                        Ok(Type::vector(element, count)?)
                    }
                    other => Err(RegistrationError::unsupported(other)),
                }
            }
            _ => {
                if !self.classes.contains_key(origin) {
                    return Err(RegistrationError::UnknownType {
                        name: origin.clone(),
                    });
                }
                let mut lowered = Vec::with_capacity(args.len());
                for arg in args {
                    lowered.push(self.lower(arg, subst, self_type)?);
                }
                self.instantiate_class(origin, &lowered)
            }
        }
    }

    // ── Members ─────────────────────────────────────────────────────

    pub fn add_method(&mut self, ty: &Type, method: Method) {
        self.methods
            .entry(ty.materialized().clone())
            .or_default()
            .push(method);
    }

    /// The overload set named `name` on `ty`, lowering the type's source
    /// methods first if that has not happened yet.
    pub fn methods(&mut self, ty: &Type, name: &str) -> Result<&[Method], RegistrationError> {
        self.lower_methods(ty)?;
        Ok(self
            .methods
            .get(ty.materialized())
            .map_or(&[], |table| table.get(name)))
    }

    /// Field type, vector component type, or the first overload of a method
    /// as a function type. Fields shadow methods of the same name.
    pub fn member(&mut self, ty: &Type, name: &str) -> Result<Option<Type>, RegistrationError> {
        let ty = ty.materialized();
        if let Some(field) = ty.field(name) {
            return Ok(Some(field.clone()));
        }
        if let Type::Vector(v) = ty {
            if swizzle_index(name).is_some_and(|i| i < v.count()) {
                return Ok(Some(v.element().clone()));
            }
        }
        Ok(self.methods(ty, name)?.first().map(Method::function_type))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, reason = "test assertions use unwrap for clarity")]
mod tests;
