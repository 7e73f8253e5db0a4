//! Per-statement inference
//!
//! Values are inferred by value: every `infer_*` function takes a node and
//! returns the node that must replace it, which may be a different variant
//! (an instance call resolving to a static method becomes a static call).

use super::builtins::BuiltinRegistry;
use super::resolver::TypeResolver;
use crate::config::InferenceConfig;
use crate::ir::consts::{self, builtin, component};
use crate::ir::{
    ClassSignature, ConditionExpr, Expr, FieldSignature, InvokeExpr, InvokeKind, Local, LocalTable, MethodSignature,
    MethodSubSignature, Ref, RelationalBinaryOperator, Stmt, StmtKind, Type, Value,
};
use crate::model::{ArkClass, ClassCategory, ExportSymbol, ImportInfo};
use tracing::{trace, warn};

/// Work discovered while inferring one body that touches another method
#[derive(Debug, Clone, PartialEq)]
pub enum DeferredUpdate {
    /// The first parameter of `callback` receives elements of type `elem_type`
    CallbackParam { callback: MethodSignature, elem_type: Type },
}

pub(crate) struct ExprInferrer<'a> {
    resolver: TypeResolver<'a>,
    method: &'a MethodSignature,
    config: &'a InferenceConfig,
    builtins: &'a BuiltinRegistry,
    locals: &'a mut LocalTable,
    deferred: Vec<DeferredUpdate>,
    unresolved: usize,
}

impl<'a> ExprInferrer<'a> {
    pub(crate) fn new(
        resolver: TypeResolver<'a>,
        method: &'a MethodSignature,
        config: &'a InferenceConfig,
        builtins: &'a BuiltinRegistry,
        locals: &'a mut LocalTable,
    ) -> Self {
        Self {
            resolver,
            method,
            config,
            builtins,
            locals,
            deferred: Vec::new(),
            unresolved: 0,
        }
    }

    /// Deferred updates and the number of unresolved calls
    pub(crate) fn finish(self) -> (Vec<DeferredUpdate>, usize) {
        (self.deferred, self.unresolved)
    }

    fn class(&self) -> Option<&'a ArkClass> {
        self.resolver.class()
    }

    /// Resolve the declared types of all locals before walking statements
    pub(crate) fn resolve_locals(&mut self) {
        let pending: Vec<(Local, Type)> = self
            .locals
            .iter()
            .map(|(local, data)| (local, data.ty.clone()))
            .filter(|(_, ty)| contains_placeholder(ty))
            .collect();
        for (local, ty) in pending {
            let mut resolved = self.resolver.resolve(&ty);
            if resolved.is_unknown() {
                resolved = self.lookup_unknown_local(&local.name).unwrap_or(Type::Unknown);
            }
            if resolved != ty {
                trace!(local = %local, from = %ty, to = %resolved, "resolved local type");
                self.locals.set_type(&local, resolved);
            }
        }
    }

    /// Type of a name the binder left untyped: a field of the declaring
    /// class, a top-level variable of the file, or a class used as a value.
    fn lookup_unknown_local(&self, name: &str) -> Option<Type> {
        let scene = self.resolver.scene();
        if let Some(class) = self.class() {
            if let Some(field) = scene.find_field_in_hierarchy(class.signature(), name) {
                if !field.ty().is_unresolved() {
                    return Some(field.ty().clone());
                }
            }
        }
        if let Some(ty) = scene.default_local_type(self.resolver.file(), name) {
            if !ty.is_unresolved() {
                return Some(ty);
            }
        }
        self.resolver.resolve_class(name).map(|c| Type::class(c.signature().clone()))
    }

    pub(crate) fn infer_stmt(&mut self, stmt: &mut Stmt) {
        match &mut stmt.kind {
            StmtKind::Assign { left, right } => {
                *right = self.infer_value(right.clone());
                if let Value::Ref(r) = left {
                    **r = self.infer_ref((**r).clone());
                }
                self.propagate_assign(left, right);
            }
            StmtKind::Invoke(invoke) => {
                *invoke = self.infer_invoke(invoke.clone());
            }
            StmtKind::If(cond) => {
                *cond = self.infer_condition(cond.clone());
            }
            StmtKind::Return(op) | StmtKind::Throw(op) => {
                *op = self.infer_value(op.clone());
            }
            StmtKind::Switch { key, cases } => {
                *key = self.infer_value(key.clone());
                for case in cases.iter_mut() {
                    *case = self.infer_value(case.clone());
                }
            }
            StmtKind::ReturnVoid => {}
        }
    }

    /// Flow the right-hand type into an untyped left-hand side
    fn propagate_assign(&mut self, left: &mut Value, right: &Value) {
        let right_ty = right.get_type(&*self.locals);
        if right_ty.is_unresolved() {
            return;
        }
        match left {
            Value::Local(local) => {
                if self.locals.type_of(local).is_unresolved() {
                    self.locals.set_type(local, right_ty);
                }
            }
            Value::Ref(r) => {
                if let Some(field) = r.field_signature() {
                    if field.ty.is_unresolved() {
                        let mut field = field.clone();
                        field.ty = right_ty;
                        r.set_field_signature(field);
                    }
                }
            }
            Value::Constant(_) | Value::Expr(_) => {}
        }
    }

    pub(crate) fn infer_value(&mut self, value: Value) -> Value {
        match value {
            Value::Local(local) => {
                let ty = self.locals.type_of(&local);
                if ty.is_unknown() {
                    if let Some(found) = self.lookup_unknown_local(&local.name) {
                        self.locals.set_type(&local, found);
                    }
                }
                Value::Local(local)
            }
            Value::Constant(constant) => Value::Constant(constant),
            Value::Expr(expr) => Value::Expr(Box::new(self.infer_expr(*expr))),
            Value::Ref(r) => Value::Ref(Box::new(self.infer_ref(*r))),
        }
    }

    pub(crate) fn infer_expr(&mut self, expr: Expr) -> Expr {
        match expr {
            Expr::Invoke(invoke) => Expr::Invoke(self.infer_invoke(invoke)),
            Expr::New { class_type } => Expr::New {
                class_type: self.resolve_improving(class_type),
            },
            Expr::NewArray {
                base_type,
                size,
                from_literal,
            } => Expr::NewArray {
                base_type: self.resolve_improving(base_type),
                size: self.infer_value(size),
                from_literal,
            },
            Expr::Delete(op) => Expr::Delete(self.infer_value(op)),
            Expr::Await(op) => Expr::Await(self.infer_value(op)),
            Expr::Yield(op) => Expr::Yield(self.infer_value(op)),
            Expr::TypeOf(op) => Expr::TypeOf(self.infer_value(op)),
            Expr::InstanceOf { op, check_type } => Expr::InstanceOf {
                op: self.infer_value(op),
                check_type: self.resolve_improving(check_type),
            },
            Expr::Cast { op, ty } => Expr::Cast {
                op: self.infer_value(op),
                ty: self.resolve_improving(ty),
            },
            Expr::Phi { args, ty } => {
                let ty = if ty.is_unresolved() {
                    Type::union_of(args.iter().map(|a| self.locals.type_of(a)).filter(|t| !t.is_unknown()))
                } else {
                    ty
                };
                Expr::Phi { args, ty }
            }
            Expr::Unop { op, operator } => Expr::Unop {
                op: self.infer_value(op),
                operator,
            },
            Expr::Binop {
                op1, op2, operator, ..
            } => {
                let op1 = self.infer_value(op1);
                let op2 = self.infer_value(op2);
                Expr::binop(op1, op2, operator, &*self.locals)
            }
            Expr::Condition(cond) => Expr::Condition(self.infer_condition(cond)),
        }
    }

    /// Resolve a declared type, keeping the old one unless the result is
    /// strictly better. Aliases are replaced by what they stand for.
    fn resolve_improving(&self, ty: Type) -> Type {
        let resolved = self.resolver.resolve(&ty).unwrap_alias().clone();
        let was_alias = matches!(ty, Type::Alias { .. });
        if was_alias || (ty.is_unresolved() && !resolved.is_unresolved()) {
            resolved
        } else {
            ty
        }
    }

    fn infer_condition(&mut self, cond: ConditionExpr) -> ConditionExpr {
        let mut cond = ConditionExpr {
            op1: self.infer_value(cond.op1),
            op2: self.infer_value(cond.op2),
            operator: cond.operator,
        };
        self.normalize_condition(&mut cond);
        cond
    }

    /// The binder lowers `if (x)` to `x != 0`; retype the zero to match `x`
    fn normalize_condition(&self, cond: &mut ConditionExpr) {
        if cond.operator != RelationalBinaryOperator::InEquality {
            return;
        }
        let op1_ty = cond.op1.get_type(&*self.locals);
        let Value::Constant(constant) = &mut cond.op2 else {
            return;
        };
        if constant.value() != "0" {
            return;
        }
        if op1_ty.is_boolean_like() {
            constant.set_value("false");
            constant.set_type(Type::Boolean);
        } else if op1_ty.is_string_like() {
            constant.set_value("");
            constant.set_type(Type::String);
        }
    }

    pub(crate) fn infer_invoke(&mut self, invoke: InvokeExpr) -> InvokeExpr {
        let InvokeExpr {
            kind,
            method_signature,
            args,
            real_generic_types,
        } = invoke;
        let args: Vec<Value> = args.into_iter().map(|a| self.infer_value(a)).collect();
        match kind {
            InvokeKind::Instance { base } => {
                self.infer_instance_invoke(base, method_signature, args, real_generic_types)
            }
            InvokeKind::Static => self.infer_static_invoke(method_signature, args, real_generic_types),
            InvokeKind::Ptr { func_ptr } => {
                let func_ptr = self.infer_value(func_ptr);
                self.infer_ptr_invoke(func_ptr, method_signature, args, real_generic_types)
            }
        }
    }

    fn infer_instance_invoke(
        &mut self,
        base: Local,
        signature: MethodSignature,
        args: Vec<Value>,
        real_generic_types: Option<Vec<Type>>,
    ) -> InvokeExpr {
        let name = signature.name().to_string();
        let base_ty = self.resolve_base(&base);

        if name == builtin::FOR_EACH {
            self.defer_for_each(&base_ty, &args);
        }

        let mut resolved = self.resolve_method_on(&base_ty, &name);
        // a receiver of known type never rebinds to an SDK global
        if resolved.is_none() && contains_placeholder(&base_ty) {
            resolved = self.global_fallback(&name);
        }
        match resolved {
            Some(resolved) if resolved.is_static() => {
                trace!(method = %self.method, callee = %resolved, "instance call resolved to static method");
                InvokeExpr {
                    kind: InvokeKind::Static,
                    method_signature: resolved,
                    args,
                    real_generic_types,
                }
            }
            Some(resolved) => InvokeExpr {
                kind: InvokeKind::Instance { base },
                method_signature: resolved,
                args,
                real_generic_types,
            },
            None => {
                warn!(method = %self.method, base = %base, base_type = %base_ty, callee = %name, "unresolved instance invocation");
                self.unresolved += 1;
                InvokeExpr {
                    kind: InvokeKind::Instance { base },
                    method_signature: signature,
                    args,
                    real_generic_types,
                }
            }
        }
    }

    /// Current type of a call receiver, resolving it first if needed
    fn resolve_base(&mut self, base: &Local) -> Type {
        let ty = self.locals.type_of(base);
        if !contains_placeholder(&ty) {
            return ty;
        }
        let mut resolved = self.resolver.resolve(&ty);
        if resolved.is_unknown() {
            resolved = self.lookup_unknown_local(&base.name).unwrap_or(Type::Unknown);
        }
        if resolved != ty {
            self.locals.set_type(base, resolved.clone());
        }
        resolved
    }

    fn defer_for_each(&mut self, base_ty: &Type, args: &[Value]) {
        let Some(elem_type) = base_ty.unwrap_alias().element_type() else {
            return;
        };
        let Some(callback) = args.first() else {
            return;
        };
        if let Type::Function { signature, .. } = callback.get_type(&*self.locals) {
            self.deferred.push(DeferredUpdate::CallbackParam {
                callback: *signature,
                elem_type,
            });
        }
    }

    /// Find `name` on a receiver of type `ty`. Union members are tried in
    /// order and the first one defining the method wins.
    fn resolve_method_on(&self, ty: &Type, name: &str) -> Option<MethodSignature> {
        let scene = self.resolver.scene();
        let ty = ty.unwrap_alias();
        match ty {
            Type::Union(members) => members.iter().find_map(|m| self.resolve_method_on(m, name)),
            Type::Class { signature, .. } => {
                if let Some(method) = scene.find_method_in_hierarchy(signature, name) {
                    return Some(method.signature().clone());
                }
                if signature.is_unknown() {
                    if let Some(class) = self.resolver.resolve_class(&signature.name) {
                        if let Some(method) = scene.find_method_in_hierarchy(class.signature(), name) {
                            return Some(method.signature().clone());
                        }
                    }
                }
                if name == consts::CONSTRUCTOR_NAME {
                    return Some(MethodSignature::new(
                        signature.clone(),
                        MethodSubSignature::new(name, Vec::new(), ty.clone()),
                    ));
                }
                self.builtins
                    .resolve(ty, name)
                    .or_else(|| self.sdk_method(&signature.name, name))
            }
            Type::String | Type::Number | Type::Boolean | Type::Literal(_) => {
                let class_name = match ty.widen() {
                    Type::String => builtin::STRING,
                    Type::Number => builtin::NUMBER,
                    _ => builtin::BOOLEAN,
                };
                self.builtins
                    .resolve(ty, name)
                    .or_else(|| self.sdk_method(class_name, name))
            }
            Type::Array { .. } | Type::Tuple(_) => self
                .builtins
                .resolve(ty, name)
                .or_else(|| self.sdk_method(builtin::ARRAY, name)),
            _ => None,
        }
    }

    /// Method `name` of the SDK class `class_name`
    fn sdk_method(&self, class_name: &str, name: &str) -> Option<MethodSignature> {
        let scene = self.resolver.scene();
        scene
            .sdk_files()
            .find_map(|f| f.get_class(class_name))
            .and_then(|c| scene.find_method_in_hierarchy(c.signature(), name))
            .map(|m| m.signature().clone())
    }

    /// Calls inside UI components and object literals may target SDK globals
    fn global_fallback(&self, name: &str) -> Option<MethodSignature> {
        if !self.config.sdk_fallback {
            return None;
        }
        let class = self.class()?;
        if !class.has_component_decorator() && class.category() != ClassCategory::Object {
            return None;
        }
        match self.resolver.scene().get_sdk_global(name)? {
            ExportSymbol::Method(signature) => Some(signature),
            _ => None,
        }
    }

    fn infer_static_invoke(
        &mut self,
        signature: MethodSignature,
        args: Vec<Value>,
        real_generic_types: Option<Vec<Type>>,
    ) -> InvokeExpr {
        let name = signature.name().to_string();
        if name == builtin::IMPORT {
            return self.infer_dynamic_import(signature, args);
        }
        match self.resolve_static(&signature, &name) {
            Some(resolved) => InvokeExpr {
                kind: InvokeKind::Static,
                method_signature: resolved,
                args,
                real_generic_types,
            },
            None => {
                warn!(method = %self.method, callee = %signature, "unresolved static invocation");
                self.unresolved += 1;
                InvokeExpr {
                    kind: InvokeKind::Static,
                    method_signature: signature,
                    args,
                    real_generic_types,
                }
            }
        }
    }

    fn resolve_static(&self, signature: &MethodSignature, name: &str) -> Option<MethodSignature> {
        let scene = self.resolver.scene();
        let class_sig = &signature.declaring_class;

        // known class: refresh with the current signature
        if !class_sig.is_unknown() {
            if let Some(method) = scene.find_method_in_hierarchy(class_sig, name) {
                return Some(method.signature().clone());
            }
        }

        // `Cls.method(...)` where only the class name is known
        let named_class = class_sig.is_unknown() && class_sig.name != consts::UNKNOWN_CLASS_NAME;
        if named_class {
            if let Some(class) = self.resolver.resolve_class(&class_sig.name) {
                if let Some(method) = scene.find_method_in_hierarchy(class.signature(), name) {
                    return Some(method.signature().clone());
                }
            }
        }

        if let Some(class) = self.class() {
            let candidate = if class.signature().is_default() {
                class.get_method(name)
            } else {
                class.get_static_method(name)
            };
            if let Some(method) = candidate {
                return Some(method.signature().clone());
            }
        }

        let file = scene.get_file(self.resolver.file());
        if let Some(method) = file.and_then(|f| f.default_class()).and_then(|c| c.get_method(name)) {
            return Some(method.signature().clone());
        }
        if let Some(info) = file.and_then(|f| f.import_info(name)) {
            match scene.resolve_import(info, self.resolver.file()) {
                Some(ExportSymbol::Method(sig)) => return Some(sig),
                Some(ExportSymbol::Local {
                    ty: Type::Function { signature, .. },
                    ..
                }) => return Some(*signature),
                _ => {}
            }
        }

        if !self.config.sdk_fallback {
            return None;
        }
        // component factories are keyed by the component class
        let global_name = if named_class && (name == component::CREATE_FUNCTION || name == component::POP_FUNCTION) {
            class_sig.name.as_str()
        } else {
            name
        };
        match scene.get_sdk_global(global_name)? {
            ExportSymbol::Method(sig) => Some(sig),
            ExportSymbol::Class(sig) => scene
                .get_class(&sig)
                .and_then(|c| c.get_method(name))
                .map(|m| m.signature().clone()),
            _ => None,
        }
    }

    /// `import('./module')` evaluates to a promise of the module's default export
    fn infer_dynamic_import(&mut self, signature: MethodSignature, args: Vec<Value>) -> InvokeExpr {
        let module = args.first().and_then(Value::as_constant).map(|c| c.value().to_string());
        let export_ty = module
            .and_then(|m| {
                self.resolver
                    .scene()
                    .resolve_import(&ImportInfo::new("default", m), self.resolver.file())
            })
            .map(|symbol| symbol.ty())
            .unwrap_or(Type::Unknown);
        let ret = Type::promise_of(export_ty.clone());
        let mut sub = signature.sub.clone();
        sub.return_type = ret;
        InvokeExpr {
            kind: InvokeKind::Static,
            method_signature: MethodSignature::new(ClassSignature::builtin(builtin::IMPORT), sub.with_static(true)),
            args,
            real_generic_types: Some(vec![export_ty]),
        }
    }

    fn infer_ptr_invoke(
        &mut self,
        func_ptr: Value,
        signature: MethodSignature,
        args: Vec<Value>,
        real_generic_types: Option<Vec<Type>>,
    ) -> InvokeExpr {
        match func_ptr.get_type(&*self.locals) {
            Type::Function {
                signature: target,
                real_generic_types: bound,
            } => InvokeExpr {
                kind: InvokeKind::Ptr { func_ptr },
                method_signature: *target,
                args,
                real_generic_types: real_generic_types.or(bound),
            },
            other => {
                warn!(method = %self.method, callee = %signature, ptr_type = %other, "unresolved pointer invocation");
                self.unresolved += 1;
                InvokeExpr {
                    kind: InvokeKind::Ptr { func_ptr },
                    method_signature: signature,
                    args,
                    real_generic_types,
                }
            }
        }
    }

    pub(crate) fn infer_ref(&mut self, r: Ref) -> Ref {
        match r {
            Ref::InstanceField { base, field } => {
                let base_ty = self.resolve_base(&base);
                let field = self.resolve_field(&base_ty, field);
                Ref::InstanceField { base, field }
            }
            Ref::StaticField { field } => {
                let field = if field.ty.is_unresolved() || field.declaring_class.is_unknown() {
                    let owner = if field.declaring_class.is_unknown() {
                        self.resolver
                            .resolve_class(&field.declaring_class.name)
                            .map(|c| Type::class(c.signature().clone()))
                    } else {
                        Some(Type::class(field.declaring_class.clone()))
                    };
                    match owner {
                        Some(owner) => self.resolve_field(&owner, field),
                        None => field,
                    }
                } else {
                    field
                };
                Ref::StaticField { field }
            }
            Ref::Array { base, index } => {
                self.resolve_base(&base);
                Ref::Array {
                    base,
                    index: self.infer_value(index),
                }
            }
            Ref::Parameter { index, param_type } => {
                let mut param_type = self.resolver.resolve(&param_type);
                if param_type.is_unresolved() {
                    if let Some(declared) = self.method.sub.parameters.get(index) {
                        let declared = self.resolver.resolve(&declared.ty);
                        if !declared.is_unresolved() {
                            param_type = declared;
                        }
                    }
                }
                Ref::Parameter { index, param_type }
            }
            Ref::This { ty } => {
                let ty = if ty.is_unresolved() {
                    self.class().map(ArkClass::to_type).unwrap_or(ty)
                } else {
                    ty
                };
                Ref::This { ty }
            }
            Ref::CaughtException { ty } => Ref::CaughtException {
                ty: self.resolver.resolve(&ty),
            },
            Ref::Global { name, ref_value } => Ref::Global {
                name,
                ref_value: ref_value.map(|v| self.infer_value(v)),
            },
        }
    }

    /// Complete a field signature from the receiver type
    fn resolve_field(&self, owner: &Type, field: FieldSignature) -> FieldSignature {
        if !field.ty.is_unresolved() && !field.declaring_class.is_unknown() {
            return field;
        }
        let scene = self.resolver.scene();
        let owner = owner.unwrap_alias();
        let name = field.name.as_str();

        let builtin_ty = match owner {
            _ if name == builtin::LENGTH && (owner.element_type().is_some() || owner.is_string_like()) => {
                Some(Type::Number)
            }
            Type::Class { .. } if owner.is_builtin_class(builtin::ITERATOR_RESULT) => match name {
                builtin::ITERATOR_RESULT_VALUE => Some(
                    owner
                        .real_generic_types()
                        .and_then(|g| g.first().cloned())
                        .unwrap_or(Type::Unknown),
                ),
                builtin::ITERATOR_RESULT_DONE => Some(Type::Boolean),
                _ => None,
            },
            _ => None,
        };
        if let Some(ty) = builtin_ty {
            return FieldSignature { ty, ..field };
        }

        let Some(class_sig) = owner.class_signature() else {
            return field;
        };
        if let Some(found) = scene.find_field_in_hierarchy(class_sig, name) {
            let mut resolved = found.signature().clone();
            resolved.ty = self.resolver.resolve(&resolved.ty);
            if let Some(real) = owner.real_generic_types() {
                resolved.ty = resolved.ty.substitute_generics(real);
            }
            return resolved;
        }
        // method used as a value: `obj.handler`
        if let Some(method) = scene.find_method_in_hierarchy(class_sig, name) {
            return FieldSignature::new(
                name,
                class_sig.clone(),
                Type::function(method.signature().clone()),
                method.is_static(),
            );
        }
        trace!(method = %self.method, field = name, owner = %owner, "unresolved field");
        field
    }
}

/// Whether inference could still refine `ty`
pub(crate) fn contains_placeholder(ty: &Type) -> bool {
    match ty {
        Type::Unknown | Type::UnclearReference { .. } => true,
        Type::Class { signature, .. } => signature.is_unknown(),
        Type::Union(members) | Type::Tuple(members) => members.iter().any(contains_placeholder),
        Type::Array { base, .. } => contains_placeholder(base),
        Type::Alias { original, .. } => contains_placeholder(original),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::{BinaryOperator, Constant, FileSignature, NormalBinaryOperator};
    use crate::model::Scene;

    fn with_inferrer<R>(scene: &Scene, locals: &mut LocalTable, f: impl FnOnce(&mut ExprInferrer<'_>) -> R) -> R {
        let file = FileSignature::new("demo", "a.ts");
        let method = MethodSignature::from_name("test");
        let config = InferenceConfig::default();
        let builtins = BuiltinRegistry::new();
        let resolver = TypeResolver::new(scene, &file);
        let mut inferrer = ExprInferrer::new(resolver, &method, &config, &builtins, locals);
        f(&mut inferrer)
    }

    #[test]
    fn test_not_equal_zero_normalized_for_booleans_and_strings() {
        let scene = Scene::new("demo");
        let mut locals = LocalTable::new();
        let flag = locals.new_local("flag", Type::Boolean);
        let text = locals.new_local("text", Type::String);
        let n = locals.new_local("n", Type::Number);

        let zero_cond = |l: &Local| ConditionExpr::new(l.clone().into(), Constant::number("0").into(), RelationalBinaryOperator::InEquality);
        let (b, s, num) = with_inferrer(&scene, &mut locals, |inf| {
            (
                inf.infer_condition(zero_cond(&flag)),
                inf.infer_condition(zero_cond(&text)),
                inf.infer_condition(zero_cond(&n)),
            )
        });
        assert_eq!(b.to_string(), "flag != false");
        assert_eq!(b.op2.as_constant().map(|c| c.ty().clone()), Some(Type::Boolean));
        assert_eq!(s.op2.as_constant().map(|c| c.value().to_string()), Some(String::new()));
        assert_eq!(num.to_string(), "n != 0");
    }

    #[test]
    fn test_binop_type_recomputed_after_operands() {
        let scene = Scene::new("demo");
        let mut locals = LocalTable::new();
        let s = locals.new_local("s", Type::String);
        let expr = Expr::Binop {
            op1: s.into(),
            op2: Constant::number("1").into(),
            operator: BinaryOperator::Normal(NormalBinaryOperator::Add),
            ty: Type::Unknown,
        };
        let inferred = with_inferrer(&scene, &mut locals, |inf| inf.infer_expr(expr));
        assert_eq!(inferred.get_type(&locals), Type::String);
    }

    #[test]
    fn test_unclear_cast_keeps_type_when_unresolvable() {
        let scene = Scene::new("demo");
        let mut locals = LocalTable::new();
        let x = locals.new_local("x", Type::Any);
        let cast = Expr::Cast {
            op: x.into(),
            ty: Type::unclear("Missing"),
        };
        let inferred = with_inferrer(&scene, &mut locals, |inf| inf.infer_expr(cast));
        assert!(matches!(inferred, Expr::Cast { ty: Type::UnclearReference { .. }, .. }));
    }

    #[test]
    fn test_iterator_result_fields() {
        let scene = Scene::new("demo");
        let mut locals = LocalTable::new();
        let result_ty = Type::class_with_generics(ClassSignature::builtin(builtin::ITERATOR_RESULT), vec![Type::String]);
        let res = locals.new_local("res", result_ty);
        let value_ref = Ref::instance_field(res.clone(), FieldSignature::from_name(builtin::ITERATOR_RESULT_VALUE));
        let done_ref = Ref::instance_field(res, FieldSignature::from_name(builtin::ITERATOR_RESULT_DONE));
        let (v, d) = with_inferrer(&scene, &mut locals, |inf| (inf.infer_ref(value_ref), inf.infer_ref(done_ref)));
        assert_eq!(v.get_type(&locals), Type::String);
        assert_eq!(d.get_type(&locals), Type::Boolean);
    }

    #[test]
    fn test_array_length_is_number() {
        let scene = Scene::new("demo");
        let mut locals = LocalTable::new();
        let arr = locals.new_local("arr", Type::array_of(Type::String));
        let len = Ref::instance_field(arr, FieldSignature::from_name(builtin::LENGTH));
        let inferred = with_inferrer(&scene, &mut locals, |inf| inf.infer_ref(len));
        assert_eq!(inferred.get_type(&locals), Type::Number);
    }

    #[test]
    fn test_phi_joins_argument_types() {
        let scene = Scene::new("demo");
        let mut locals = LocalTable::new();
        let a = locals.new_local("a", Type::Number);
        let b = locals.new_local("b", Type::Unknown);
        let phi = Expr::Phi {
            args: vec![a, b],
            ty: Type::Unknown,
        };
        let inferred = with_inferrer(&scene, &mut locals, |inf| inf.infer_expr(phi));
        assert_eq!(inferred.get_type(&locals), Type::Number);
    }

    #[test]
    fn test_placeholder_detection() {
        assert!(contains_placeholder(&Type::array_of(Type::unclear("T"))));
        assert!(contains_placeholder(&Type::class(ClassSignature::unresolved("Math"))));
        assert!(!contains_placeholder(&Type::array_of(Type::Number)));
        assert!(!contains_placeholder(&Type::generic("T", 0)));
    }
}
