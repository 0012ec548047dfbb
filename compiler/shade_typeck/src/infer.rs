//! Type inference.
//!
//! A single walk over the body in statement order, typing every expression
//! after its children. Locals take their type from the first assignment
//! (or their annotation); operators and method calls are resolved against
//! the method tables of their operand types, instantiating source methods
//! and called functions on the way.
//!
//! Literal placeholders are refined in place when they meet a concrete
//! numeric type and defaulted when nothing constrains them. When the walk
//! is done every reachable node is concrete and every call resolved, and
//! the function is marked [`FunctionFlags::FULLY_TYPED`].

use shade_hir::{
    Call, CallKind, CallOp, Constant, Function, FunctionFlags, InstanceId, NodeId, NodeKind,
    Ref, Resolution, StmtId, StmtKind, Value,
};
use shade_ir::{BinaryOp, Name, UnaryOp};
use shade_types::{
    accepts_literal, match_template_args, substitute, Method, MethodImpl,
    Substitution, Type, TypeParamSymbol,
};
use smallvec::SmallVec;

use crate::context::GlobalContext;
use crate::error::{InferErrorKind, TypeInferenceError};

/// A node together with its inferred type.
type Typed = (NodeId, Type);

/// Infer `function` in place.
#[tracing::instrument(level = "debug", skip_all, fields(function = %function.name))]
pub(crate) fn infer_function(
    ctx: &mut GlobalContext,
    function: &mut Function,
    subst: &Substitution,
) -> Result<(), TypeInferenceError> {
    let body = function.body.clone();
    let mut inferencer = Inferencer {
        ctx,
        f: function,
        subst,
    };
    inferencer.infer_block(&body)?;
    inferencer.finish()
}

struct Inferencer<'a> {
    ctx: &'a mut GlobalContext,
    f: &'a mut Function,
    /// Bindings of the instance being inferred; supplies constant
    /// parameters.
    subst: &'a Substitution,
}

impl Inferencer<'_> {
    // ── Statements ──────────────────────────────────────────────────

    fn infer_block(&mut self, stmts: &[StmtId]) -> Result<(), TypeInferenceError> {
        for &stmt in stmts {
            let stmt = self.f.arena.stmt(stmt).clone();
            self.infer_stmt(stmt.kind)
                .map_err(|err| err.or_span(&stmt.span))?;
        }
        Ok(())
    }

    fn infer_stmt(&mut self, kind: StmtKind) -> Result<(), TypeInferenceError> {
        match kind {
            StmtKind::VarDecl { var, expected } => {
                tracing::trace!(var = %self.f.arena.var(var).name, ty = %expected, "declared");
                self.f.arena.var_mut(var).ty = Some(expected);
                Ok(())
            }
            StmtKind::Assign {
                target,
                expected_type,
                value,
            } => self.infer_assign(target, expected_type, value),
            StmtKind::Return(value) => self.infer_return(value),
            StmtKind::If {
                cond,
                then_body,
                else_body,
            } => {
                let (cond, found) = self.infer_value(cond)?;
                if !self.coerce(cond, &found, &Type::Bool) {
                    return Err(self.error_at(InferErrorKind::ConditionNotBool { found }, cond));
                }
                self.infer_block(&then_body)?;
                self.infer_block(&else_body)
            }
        }
    }

    fn infer_assign(
        &mut self,
        target: NodeId,
        annotation: Option<Type>,
        value: NodeId,
    ) -> Result<(), TypeInferenceError> {
        let (value, found) = self.infer_value(value)?;

        if let Some(&Ref::Var(var)) = self.f.arena.node(target).place() {
            if self.f.arena.var(var).ty.is_none() {
                let ty = match annotation {
                    Some(annotation) => {
                        if !self.coerce(value, &found, &annotation) {
                            let name = self.f.arena.var(var).name.to_string();
                            return Err(self.error_at(
                                InferErrorKind::AnnotationMismatch {
                                    name,
                                    annotation,
                                    found,
                                },
                                value,
                            ));
                        }
                        annotation
                    }
                    None => {
                        let ty = found.defaulted();
                        self.coerce(value, &found, &ty);
                        ty
                    }
                };
                tracing::trace!(var = %self.f.arena.var(var).name, ty = %ty, "typed by first assignment");
                self.f.arena.var_mut(var).ty = Some(ty.clone());
                self.f.arena.set_type(target, ty);
                return Ok(());
            }
        }

        let expected = self.infer_ref(target)?;
        if let Some(annotation) = annotation {
            if annotation != expected {
                return Err(self.error_at(
                    InferErrorKind::AnnotationMismatch {
                        name: self.describe_place(target),
                        annotation,
                        found: expected,
                    },
                    target,
                ));
            }
        }
        if !self.coerce(value, &found, &expected) {
            return Err(self.error_at(InferErrorKind::TypeMismatch { expected, found }, value));
        }
        Ok(())
    }

    fn infer_return(&mut self, value: Option<NodeId>) -> Result<(), TypeInferenceError> {
        let Some(value) = value else {
            return match self.f.return_type.clone() {
                None => {
                    self.f.return_type = Some(Type::Unit);
                    Ok(())
                }
                Some(Type::Unit) => Ok(()),
                Some(expected) => Err(InferErrorKind::ReturnMismatch {
                    function: self.f.name.clone(),
                    expected,
                    found: Type::Unit,
                }
                .into()),
            };
        };

        let (value, found) = self.infer_value(value)?;
        match self.f.return_type.clone() {
            None => {
                let ty = found.defaulted();
                self.coerce(value, &found, &ty);
                tracing::trace!(ty = %ty, "return type taken from first return");
                self.f.return_type = Some(ty);
                Ok(())
            }
            Some(expected) => {
                if self.coerce(value, &found, &expected) {
                    return Ok(());
                }
                Err(self.error_at(
                    InferErrorKind::ReturnMismatch {
                        function: self.f.name.clone(),
                        expected,
                        found,
                    },
                    value,
                ))
            }
        }
    }

    // ── Places ──────────────────────────────────────────────────────

    fn infer_ref(&mut self, id: NodeId) -> Result<Type, TypeInferenceError> {
        let Some(place) = self.f.arena.node(id).place().cloned() else {
            return Err(self.internal(format!("{id} is not a place"), id));
        };
        let ty = match place {
            Ref::Var(var) => {
                let var = self.f.arena.var(var);
                match &var.ty {
                    Some(ty) => ty.clone(),
                    None => {
                        let name = var.name.clone();
                        return Err(
                            self.error_at(InferErrorKind::UseBeforeAssignment { name }, id)
                        );
                    }
                }
            }
            Ref::Member { base, field } => {
                let base_ty = self.infer_ref(base)?;
                match self.ctx.registry.member(&base_ty, &field)? {
                    Some(Type::Function(_)) => {
                        return Err(self.error_at(
                            InferErrorKind::UnboundMethod {
                                ty: base_ty,
                                member: field,
                            },
                            id,
                        ))
                    }
                    Some(ty) => ty,
                    None => {
                        return Err(self.error_at(
                            InferErrorKind::UnknownMember {
                                ty: base_ty,
                                member: field,
                            },
                            id,
                        ))
                    }
                }
            }
            Ref::Index { base, index } => {
                let base_ty = self.infer_ref(base)?;
                let (index, index_ty) = self.infer_value(index)?;
                if !self.coerce(index, &index_ty, &Type::I32) && !index_ty.is_int() {
                    return Err(self.error_at(
                        InferErrorKind::NonIntegerIndex { found: index_ty },
                        index,
                    ));
                }
                match base_ty.materialized().element() {
                    Some(element) => element.clone(),
                    None => {
                        return Err(self.error_at(InferErrorKind::NotIndexable { ty: base_ty }, id))
                    }
                }
            }
            Ref::ValueRef(value) => self.infer_value(value)?.1,
        };
        self.f.arena.set_type(id, ty.clone());
        Ok(ty)
    }

    fn describe_place(&self, id: NodeId) -> String {
        match self.f.arena.node(id).place() {
            Some(Ref::Var(var)) => self.f.arena.var(*var).name.to_string(),
            Some(Ref::Member { base, field }) => format!("{}.{field}", self.describe_place(*base)),
            Some(Ref::Index { base, .. }) => format!("{}[..]", self.describe_place(*base)),
            Some(Ref::ValueRef(_)) | None => "expression".to_owned(),
        }
    }

    // ── Values ──────────────────────────────────────────────────────

    /// Infer a value node. Returns the node now standing in its place,
    /// which differs from `id` when the node was rewritten.
    fn infer_value(&mut self, id: NodeId) -> Result<Typed, TypeInferenceError> {
        let node = self.f.arena.node(id);
        let span = node.span.clone();
        let Some(value) = node.value().cloned() else {
            return Err(self.internal(format!("{id} is not a value"), id));
        };
        let ty = match value {
            Value::Constant(Constant::Int(_)) => Type::GenericInt,
            Value::Constant(Constant::Float(_)) => Type::GenericFloat,
            Value::Constant(Constant::Bool(_)) => Type::Bool,
            Value::SymbolicConstant(name) => return self.fold_constant(id, &name),
            Value::Load(place) => self.infer_ref(place)?,
            Value::Call(call) => {
                return self
                    .infer_call(id, call)
                    .map_err(|err| err.or_span(&span))
            }
        };
        self.f.arena.set_type(id, ty.clone());
        Ok((id, ty))
    }

    /// Replace a constant generic parameter by its bound value.
    fn fold_constant(&mut self, id: NodeId, name: &Name) -> Result<Typed, TypeInferenceError> {
        let Some(value) = self.subst.get_const(name) else {
            return Err(self.error_at(
                InferErrorKind::UnboundParameter {
                    callee: self.f.name.clone(),
                    param: name.clone(),
                },
                id,
            ));
        };
        let span = self.f.arena.node(id).span.clone();
        let folded = self
            .f
            .arena
            .add_value(Value::Constant(Constant::Int(i64::from(value))), span);
        self.f.arena.set_type(folded, Type::GenericInt);
        self.f.arena.replace_all_uses(id, folded);
        tracing::trace!(%name, value, "folded constant parameter");
        Ok((folded, Type::GenericInt))
    }

    fn infer_args(&mut self, args: &[NodeId]) -> Result<Vec<Typed>, TypeInferenceError> {
        args.iter().map(|&arg| self.infer_value(arg)).collect()
    }

    fn infer_call(&mut self, id: NodeId, call: Call) -> Result<Typed, TypeInferenceError> {
        let ty = match call.op {
            CallOp::Callee(callee) => return self.rewrite_method_call(id, callee, &call.args),
            CallOp::Binary(op) => {
                let args = self.infer_args(&call.args)?;
                self.resolve_binary(id, op, &args)?
            }
            CallOp::Unary(op) => {
                let args = self.infer_args(&call.args)?;
                self.resolve_unary(id, op, &args)?
            }
            CallOp::Function(name) => {
                let args = self.infer_args(&call.args)?;
                self.resolve_function(id, &name, &args)?
            }
            CallOp::Construct(ty) => {
                let args = self.infer_args(&call.args)?;
                self.resolve_construct(id, ty, &args)?
            }
            CallOp::Method(name) => {
                let args = self.infer_args(&call.args)?;
                self.resolve_method(id, &name, &args)?
            }
        };
        self.f.arena.set_type(id, ty.clone());
        Ok((id, ty))
    }

    // ── Operators ───────────────────────────────────────────────────

    /// Left operand's forward method first, then the right operand's
    /// reflected method. The first overload that matches wins.
    fn resolve_binary(
        &mut self,
        id: NodeId,
        op: BinaryOp,
        args: &[Typed],
    ) -> Result<Type, TypeInferenceError> {
        let [lhs, rhs] = args else {
            return Err(self.internal(format!("`{op}` with {} operands", args.len()), id));
        };

        let forward = self
            .ctx
            .registry
            .methods(&lhs.1.defaulted(), op.forward_method())?
            .to_vec();
        let ordered = [lhs.clone(), rhs.clone()];
        for method in &forward {
            if let Some(subst) = match_method(method, &ordered) {
                tracing::trace!(%op, lhs = %lhs.1, rhs = %rhs.1, "forward overload");
                return self.apply_method(id, method, &subst, &ordered, false);
            }
        }

        let reflected = self
            .ctx
            .registry
            .methods(&rhs.1.defaulted(), op.reflected_method())?
            .to_vec();
        let ordered = [rhs.clone(), lhs.clone()];
        for method in &reflected {
            if let Some(subst) = match_method(method, &ordered) {
                tracing::trace!(%op, lhs = %lhs.1, rhs = %rhs.1, "reflected overload");
                return self.apply_method(id, method, &subst, &ordered, true);
            }
        }

        Err(self.error_at(
            InferErrorKind::NoBinaryOverload {
                op: op.as_symbol(),
                lhs: lhs.1.clone(),
                rhs: rhs.1.clone(),
            },
            id,
        ))
    }

    fn resolve_unary(
        &mut self,
        id: NodeId,
        op: UnaryOp,
        args: &[Typed],
    ) -> Result<Type, TypeInferenceError> {
        let [operand] = args else {
            return Err(self.internal(format!("`{op}` with {} operands", args.len()), id));
        };
        let methods = self
            .ctx
            .registry
            .methods(&operand.1.defaulted(), op.method_name())?
            .to_vec();
        for method in &methods {
            if let Some(subst) = match_method(method, args) {
                return self.apply_method(id, method, &subst, args, false);
            }
        }
        Err(self.error_at(
            InferErrorKind::NoUnaryOverload {
                op: op.as_symbol(),
                operand: operand.1.clone(),
            },
            id,
        ))
    }

    // ── Calls ───────────────────────────────────────────────────────

    fn resolve_method(
        &mut self,
        id: NodeId,
        name: &Name,
        args: &[Typed],
    ) -> Result<Type, TypeInferenceError> {
        let Some((_, receiver)) = args.first() else {
            return Err(self.internal(format!("method `{name}` without a receiver"), id));
        };
        let receiver = receiver.defaulted();
        let methods = self.ctx.registry.methods(&receiver, name)?.to_vec();
        if methods.is_empty() {
            return Err(self.error_at(
                InferErrorKind::UnknownMember {
                    ty: receiver,
                    member: name.clone(),
                },
                id,
            ));
        }
        for method in &methods {
            if let Some(subst) = match_method(method, args) {
                return self.apply_method(id, method, &subst, args, false);
            }
        }
        Err(self.error_at(
            InferErrorKind::NoMethodOverload {
                receiver,
                method: name.clone(),
                args: join_types(args),
            },
            id,
        ))
    }

    fn resolve_function(
        &mut self,
        id: NodeId,
        name: &Name,
        args: &[Typed],
    ) -> Result<Type, TypeInferenceError> {
        let types: Vec<Type> = args.iter().map(|(_, ty)| ty.clone()).collect();
        let instance = self.ctx.instantiate(name, &types)?;
        let (params, ret) = self.instance_signature(instance, id)?;
        for ((arg, found), param) in args.iter().zip(&params) {
            self.coerce(*arg, found, param);
        }
        self.resolve(id, Resolution::Instance(instance))?;
        Ok(ret)
    }

    /// Rewrite `a.m(args)` into a method call `m(a, args)` once the type
    /// of `a` is known.
    fn rewrite_method_call(
        &mut self,
        id: NodeId,
        callee: NodeId,
        args: &[NodeId],
    ) -> Result<Typed, TypeInferenceError> {
        let member = match self.f.arena.node(callee).value() {
            Some(&Value::Load(member)) => Some(member),
            _ => None,
        };
        let Some(member) = member else {
            let (_, ty) = self.infer_value(callee)?;
            return Err(self.error_at(InferErrorKind::NotCallable { ty }, callee));
        };
        let Some(Ref::Member { base, field }) = self.f.arena.node(member).place().cloned() else {
            let ty = self.infer_ref(member)?;
            return Err(self.error_at(InferErrorKind::NotCallable { ty }, callee));
        };

        let base_ty = self.infer_ref(base)?;
        match self.ctx.registry.member(&base_ty, &field)? {
            Some(Type::Function(_)) => {}
            Some(ty) => return Err(self.error_at(InferErrorKind::NotCallable { ty }, callee)),
            None => {
                return Err(self.error_at(
                    InferErrorKind::UnknownMember {
                        ty: base_ty,
                        member: field,
                    },
                    callee,
                ))
            }
        }

        let receiver_span = self.f.arena.node(base).span.clone();
        let receiver = self.f.arena.add_value(Value::Load(base), receiver_span);
        let mut new_args: SmallVec<[NodeId; 4]> = SmallVec::with_capacity(args.len() + 1);
        new_args.push(receiver);
        new_args.extend(args.iter().copied());

        let span = self.f.arena.node(id).span.clone();
        let call = self.f.arena.add_value(
            Value::Call(Call {
                op: CallOp::Method(field.clone()),
                args: new_args,
                kind: CallKind::Func,
                resolved: None,
            }),
            span,
        );
        self.f.arena.replace_all_uses(id, call);
        tracing::trace!(method = %field, receiver = %base_ty, old = %id, new = %call, "rewrote method call");
        self.infer_value(call)
    }

    fn resolve_construct(
        &mut self,
        id: NodeId,
        ty: Type,
        args: &[Typed],
    ) -> Result<Type, TypeInferenceError> {
        let arity = |expected: usize| {
            if args.len() == expected {
                Ok(())
            } else {
                Err(InferErrorKind::ArgCount {
                    callee: ty.to_string(),
                    expected,
                    found: args.len(),
                })
            }
        };

        match ty.materialized() {
            Type::Struct(s) => {
                arity(s.fields.len()).map_err(|kind| self.error_at(kind, id))?;
                for ((arg, found), (_, field)) in args.iter().zip(&s.fields) {
                    if !self.coerce(*arg, found, field) {
                        return Err(self.error_at(
                            InferErrorKind::TypeMismatch {
                                expected: field.clone(),
                                found: found.clone(),
                            },
                            *arg,
                        ));
                    }
                }
            }
            Type::Vector(v) => {
                let count = usize::try_from(v.count()).unwrap_or(usize::MAX);
                if args.len() != 1 {
                    arity(count).map_err(|kind| self.error_at(kind, id))?;
                }
                let element = v.element().clone();
                for (arg, found) in args {
                    if !self.coerce(*arg, found, &element) {
                        return Err(self.error_at(
                            InferErrorKind::TypeMismatch {
                                expected: element.clone(),
                                found: found.clone(),
                            },
                            *arg,
                        ));
                    }
                }
            }
            target if target.is_scalar() => {
                arity(1).map_err(|kind| self.error_at(kind, id))?;
                let (arg, found) = &args[0];
                if found.is_literal_placeholder() {
                    let refined = if accepts_literal(target, found) {
                        target.clone()
                    } else {
                        found.defaulted()
                    };
                    self.refine(*arg, refined);
                } else if !found.is_scalar() {
                    return Err(self.error_at(
                        InferErrorKind::TypeMismatch {
                            expected: target.clone(),
                            found: found.clone(),
                        },
                        *arg,
                    ));
                }
            }
            _ => {
                return Err(self.error_at(InferErrorKind::NotCallable { ty: ty.clone() }, id))
            }
        }
        self.resolve(id, Resolution::Construct(ty.clone()))?;
        Ok(ty)
    }

    // ── Resolution ──────────────────────────────────────────────────

    /// Record `method` as the callee of `id`. `args` are in the method's
    /// parameter order.
    fn apply_method(
        &mut self,
        id: NodeId,
        method: &Method,
        subst: &Substitution,
        args: &[Typed],
        reflected: bool,
    ) -> Result<Type, TypeInferenceError> {
        match &method.imp {
            MethodImpl::Intrinsic(intrinsic) => {
                for ((arg, found), (_, param)) in args.iter().zip(&method.params) {
                    let param = substitute(param, subst);
                    self.coerce(*arg, found, &param);
                }
                self.resolve(
                    id,
                    Resolution::Intrinsic {
                        op: *intrinsic,
                        reflected,
                    },
                )?;
                Ok(substitute(method.ret.as_ref().unwrap_or(&Type::Unit), subst))
            }
            MethodImpl::Source(source) => {
                let types: Vec<Type> = args.iter().map(|(_, ty)| ty.clone()).collect();
                let instance = self.ctx.instantiate_method(source, &types)?;
                let (params, ret) = self.instance_signature(instance, id)?;
                for ((arg, found), param) in args.iter().zip(&params) {
                    self.coerce(*arg, found, param);
                }
                if reflected {
                    // The instance takes the right operand as its receiver.
                    self.with_call(id, |call| {
                        call.op = CallOp::Method(method.name.clone());
                        call.kind = CallKind::Func;
                        call.args = args.iter().map(|(arg, _)| *arg).collect();
                    })?;
                }
                self.resolve(id, Resolution::Instance(instance))?;
                Ok(ret)
            }
        }
    }

    fn instance_signature(
        &self,
        instance: InstanceId,
        at: NodeId,
    ) -> Result<(Vec<Type>, Type), TypeInferenceError> {
        let params = self.ctx.instance(instance).params.clone();
        match self.ctx.function(instance) {
            Some(function) => Ok((
                params,
                function.return_type.clone().unwrap_or(Type::Unit),
            )),
            None => Err(self.internal(format!("instance {instance} has no body"), at)),
        }
    }

    fn resolve(&mut self, id: NodeId, resolution: Resolution) -> Result<(), TypeInferenceError> {
        self.with_call(id, |call| call.resolved = Some(resolution))
    }

    fn with_call(
        &mut self,
        id: NodeId,
        update: impl FnOnce(&mut Call),
    ) -> Result<(), TypeInferenceError> {
        if let NodeKind::Value(Value::Call(call)) = &mut self.f.arena.node_mut(id).kind {
            update(call);
            return Ok(());
        }
        Err(self.internal(format!("{id} is not a call"), id))
    }

    // ── Literals ────────────────────────────────────────────────────

    /// Whether a value typed `found` may stand where `target` is expected.
    /// Literal placeholders are refined to `target` on success.
    fn coerce(&mut self, node: NodeId, found: &Type, target: &Type) -> bool {
        if found == target {
            return true;
        }
        if accepts_literal(target, found) {
            self.refine(node, target.clone());
            return true;
        }
        false
    }

    fn refine(&mut self, node: NodeId, ty: Type) {
        tracing::trace!(%node, ty = %ty, "refine literal");
        self.f.arena.set_type(node, ty);
    }

    // ── Completion ──────────────────────────────────────────────────

    fn finish(mut self) -> Result<(), TypeInferenceError> {
        if self.f.return_type.is_none() {
            self.f.return_type = Some(Type::Unit);
        }
        for id in self.f.reachable_nodes() {
            if let Some(ty) = self.f.arena.ty(id).filter(|ty| ty.is_literal_placeholder()) {
                let ty = ty.defaulted();
                self.refine(id, ty);
            }
        }
        for &local in &self.f.locals {
            let var = self.f.arena.var(local);
            if var.ty.is_none() {
                return Err(InferErrorKind::UseBeforeAssignment {
                    name: var.name.clone(),
                }
                .into());
            }
        }
        if let Some(node) = self.f.first_untyped_node() {
            return Err(self.internal(
                format!("`{}` leaves {node} untyped after inference", self.f.name),
                node,
            ));
        }
        self.f.flags |= FunctionFlags::FULLY_TYPED;
        tracing::debug!(
            nodes = self.f.arena.node_count(),
            ret = ?self.f.return_type,
            "function fully typed"
        );
        Ok(())
    }

    // ── Errors ──────────────────────────────────────────────────────

    fn error_at(&self, kind: InferErrorKind, node: NodeId) -> TypeInferenceError {
        TypeInferenceError::new(kind, self.f.arena.node(node).span.clone())
    }

    fn internal(&self, message: String, node: NodeId) -> TypeInferenceError {
        self.error_at(InferErrorKind::Internal { message }, node)
    }
}

/// Try one overload against argument types in parameter order.
fn match_method(method: &Method, args: &[Typed]) -> Option<Substitution> {
    let types: Vec<Type> = args.iter().map(|(_, ty)| ty.clone()).collect();
    let subst = match_template_args(&method.name, &method.params, &types).ok()?;
    let within_bounds = method.type_params.iter().all(|param| match &param.symbol {
        TypeParamSymbol::Type(name) => subst.get(name).map_or(true, |ty| param.admits(ty)),
        TypeParamSymbol::Const(_) => true,
    });
    within_bounds.then_some(subst)
}

fn join_types(args: &[Typed]) -> String {
    args.iter()
        .map(|(_, ty)| ty.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}
