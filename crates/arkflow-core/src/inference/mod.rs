//! Type inference
//!
//! Placeholder types left by the binder (`Unknown`, unclear references,
//! calls to methods of unknown classes) are resolved against the scene:
//! first the expression itself, then the declaring class and its supertypes,
//! then the file's imports, and finally the SDK declarations.
//!
//! Inference is best effort. Whatever cannot be resolved stays as it was
//! and is reported with a warning; it never fails.

mod builtins;
mod expr;
mod resolver;

pub use builtins::{BuiltinMethod, BuiltinRegistry};
pub use expr::DeferredUpdate;
pub use resolver::TypeResolver;

use crate::config::InferenceConfig;
use crate::ir::{ClassSignature, MethodSignature, Ref, StmtKind, Type, Value};
use crate::model::{ArkBody, Scene};
use expr::ExprInferrer;
use std::collections::HashSet;
use tracing::{debug, trace};

/// Summary of a scene-wide inference run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InferenceReport {
    /// Method bodies visited, counted once per pass
    pub methods_inferred: usize,
    /// Calls left unresolved by the last pass
    pub unresolved: usize,
    pub passes: usize,
}

/// Identity of a method across signature refinements
type MethodKey = (ClassSignature, String);

fn method_key(signature: &MethodSignature) -> MethodKey {
    (signature.declaring_class.clone(), signature.name().to_string())
}

pub struct TypeInference {
    config: InferenceConfig,
    builtins: BuiltinRegistry,
}

impl Default for TypeInference {
    fn default() -> Self {
        Self::new(InferenceConfig::default())
    }
}

impl TypeInference {
    pub fn new(config: InferenceConfig) -> Self {
        Self {
            config,
            builtins: BuiltinRegistry::new(),
        }
    }

    /// Register an additional builtin method handler
    pub fn with_builtin(mut self, handler: Box<dyn BuiltinMethod + Send + Sync>) -> Self {
        self.builtins.register(handler);
        self
    }

    pub fn config(&self) -> &InferenceConfig {
        &self.config
    }

    /// Infer every method body of the scene. Later passes see the return
    /// types inferred by earlier ones.
    pub fn infer_scene(&self, scene: &mut Scene) -> InferenceReport {
        let mut report = InferenceReport::default();
        for pass in 0..self.config.max_passes {
            let signatures = scene.method_signatures();
            let mut unresolved = 0;
            for signature in &signatures {
                unresolved += self.infer_method(scene, signature);
            }
            report.methods_inferred += signatures.len();
            report.unresolved = unresolved;
            report.passes = pass + 1;
            debug!(pass, methods = signatures.len(), unresolved, "inference pass done");
        }
        report
    }

    /// Infer one method and everything it defers; returns the number of
    /// calls left unresolved in its body
    pub fn infer_method(&self, scene: &mut Scene, signature: &MethodSignature) -> usize {
        let mut visiting = HashSet::new();
        self.infer_method_guarded(scene, signature, &mut visiting)
    }

    fn infer_method_guarded(
        &self,
        scene: &mut Scene,
        signature: &MethodSignature,
        visiting: &mut HashSet<MethodKey>,
    ) -> usize {
        if !visiting.insert(method_key(signature)) {
            return 0;
        }
        let Some(method) = scene.get_method_mut(signature) else {
            trace!(method = %signature, "method not in scene");
            return 0;
        };
        let current = method.signature().clone();
        let Some(mut body) = method.take_body() else {
            return 0;
        };

        let (deferred, unresolved) = self.infer_body(scene, &current, &mut body);

        if let Some(method) = scene.get_method_mut(signature) {
            method.set_body(body);
        }
        for update in deferred {
            self.apply_deferred(scene, update, visiting);
        }
        if self.config.infer_return_types {
            infer_return_type(scene, signature);
        }
        unresolved
    }

    fn infer_body(&self, scene: &Scene, signature: &MethodSignature, body: &mut ArkBody) -> (Vec<DeferredUpdate>, usize) {
        let class = scene.get_class(&signature.declaring_class);
        let method_generics: Vec<Type> = scene
            .get_method(signature)
            .map(|m| m.generic_types().to_vec())
            .unwrap_or_default();
        let alias_types = body.alias_types().clone();
        let resolver = TypeResolver::new(scene, &signature.declaring_class.file)
            .with_class(class)
            .with_method_generics(&method_generics)
            .with_alias_types(&alias_types);

        let (cfg, locals) = body.split_mut();
        let mut inferrer = ExprInferrer::new(resolver, signature, &self.config, &self.builtins, locals);
        inferrer.resolve_locals();
        for id in cfg.stmt_ids() {
            if let Some(stmt) = cfg.stmt_mut(id) {
                inferrer.infer_stmt(stmt);
            }
        }
        inferrer.finish()
    }

    fn apply_deferred(&self, scene: &mut Scene, update: DeferredUpdate, visiting: &mut HashSet<MethodKey>) {
        match update {
            DeferredUpdate::CallbackParam { callback, elem_type } => {
                if set_first_parameter(scene, &callback, &elem_type) {
                    debug!(callback = %callback, elem = %elem_type, "callback parameter typed from array element");
                    self.infer_method_guarded(scene, &callback, visiting);
                }
            }
        }
    }
}

/// Type the first parameter of `callback` and the local it is read into.
/// Returns false when the parameter was already resolved.
fn set_first_parameter(scene: &mut Scene, callback: &MethodSignature, elem_type: &Type) -> bool {
    let Some(method) = scene.get_method_mut(callback) else {
        return false;
    };
    let unresolved = method.parameters().first().is_some_and(|p| p.ty.is_unresolved());
    if !unresolved {
        return false;
    }
    method.set_parameter_type(0, elem_type.clone());
    if let Some(body) = method.body_mut() {
        let (cfg, locals) = body.split_mut();
        for id in cfg.stmt_ids() {
            let Some(stmt) = cfg.stmt_mut(id) else {
                continue;
            };
            if let StmtKind::Assign {
                left: Value::Local(local),
                right: Value::Ref(r),
            } = &mut stmt.kind
            {
                if let Ref::Parameter { index: 0, param_type } = &mut **r {
                    *param_type = elem_type.clone();
                    if locals.type_of(local).is_unresolved() {
                        locals.set_type(local, elem_type.clone());
                    }
                }
            }
        }
    }
    true
}

/// Derive a missing return type from the method's return statements
fn infer_return_type(scene: &mut Scene, signature: &MethodSignature) {
    let Some(method) = scene.get_method_mut(signature) else {
        return;
    };
    if !method.return_type().is_unresolved() {
        return;
    }
    let Some(ty) = method.body().map(body_return_type) else {
        return;
    };
    if !ty.is_unresolved() {
        trace!(method = %signature, ret = %ty, "inferred return type");
        method.set_return_type(ty);
    }
}

fn body_return_type(body: &ArkBody) -> Type {
    let returned: Vec<Type> = body
        .cfg()
        .stmts()
        .filter_map(|(_, stmt)| match &stmt.kind {
            StmtKind::Return(op) => Some(op.get_type(body.locals()).widen()),
            _ => None,
        })
        .collect();
    if returned.is_empty() {
        return Type::Void;
    }
    if returned.iter().any(Type::is_unresolved) {
        return Type::Unknown;
    }
    Type::union_of(returned)
}
