//! Builtin library methods with signatures synthesized on demand
//!
//! Each handler knows one method of the builtin library and the receiver
//! types it applies to.

use crate::ir::consts::builtin;
use crate::ir::{ClassSignature, MethodParameter, MethodSignature, MethodSubSignature, Type};

pub trait BuiltinMethod {
    /// The method name this handler responds to
    fn method_name(&self) -> &'static str;

    /// Whether the handler applies to calls on `receiver`
    fn applies_to(&self, receiver: &Type) -> bool;

    /// Signature of the method on `receiver`
    fn signature(&self, receiver: &Type) -> MethodSignature;
}

/// Element type of anything iterable
fn iterated_type(receiver: &Type) -> Option<Type> {
    match receiver {
        Type::String | Type::Literal(_) if receiver.is_string_like() => Some(Type::String),
        other => other.element_type(),
    }
}

fn builtin_method(class: &str, name: &str, parameters: Vec<MethodParameter>, return_type: Type) -> MethodSignature {
    MethodSignature::new(
        ClassSignature::builtin(class),
        MethodSubSignature::new(name, parameters, return_type),
    )
}

/// `array.forEach(callback)`
pub struct ForEach;

impl BuiltinMethod for ForEach {
    fn method_name(&self) -> &'static str {
        builtin::FOR_EACH
    }

    fn applies_to(&self, receiver: &Type) -> bool {
        receiver.element_type().is_some()
    }

    fn signature(&self, _receiver: &Type) -> MethodSignature {
        builtin_method(
            builtin::ARRAY,
            builtin::FOR_EACH,
            vec![MethodParameter::new("callbackfn", Type::Unknown)],
            Type::Void,
        )
    }
}

/// `iterable[Symbol.iterator]()`, emitted for `for..of` loops
pub struct IteratorFunction;

impl BuiltinMethod for IteratorFunction {
    fn method_name(&self) -> &'static str {
        builtin::ITERATOR_FUNCTION
    }

    fn applies_to(&self, receiver: &Type) -> bool {
        iterated_type(receiver).is_some()
    }

    fn signature(&self, receiver: &Type) -> MethodSignature {
        let elem = iterated_type(receiver).unwrap_or(Type::Unknown);
        let ret = Type::class_with_generics(ClassSignature::builtin(builtin::ITERATOR_CLASS), vec![elem]);
        builtin_method(builtin::ARRAY, builtin::ITERATOR_FUNCTION, Vec::new(), ret)
    }
}

/// `iterator.next()`
pub struct IteratorNext;

impl BuiltinMethod for IteratorNext {
    fn method_name(&self) -> &'static str {
        builtin::ITERATOR_NEXT
    }

    fn applies_to(&self, receiver: &Type) -> bool {
        receiver.is_builtin_class(builtin::ITERATOR_CLASS)
    }

    fn signature(&self, receiver: &Type) -> MethodSignature {
        let elem = receiver
            .real_generic_types()
            .and_then(|g| g.first().cloned())
            .unwrap_or(Type::Unknown);
        let ret = Type::class_with_generics(ClassSignature::builtin(builtin::ITERATOR_RESULT), vec![elem]);
        builtin_method(builtin::ITERATOR_CLASS, builtin::ITERATOR_NEXT, Vec::new(), ret)
    }
}

/// Registry of all builtin method handlers
pub struct BuiltinRegistry {
    handlers: Vec<Box<dyn BuiltinMethod + Send + Sync>>,
}

impl BuiltinRegistry {
    pub fn new() -> Self {
        let mut registry = Self { handlers: Vec::new() };
        registry.register(Box::new(ForEach));
        registry.register(Box::new(IteratorFunction));
        registry.register(Box::new(IteratorNext));
        registry
    }

    pub fn register(&mut self, handler: Box<dyn BuiltinMethod + Send + Sync>) {
        self.handlers.push(handler);
    }

    /// Signature of `receiver.method(...)` if a handler knows it
    pub fn resolve(&self, receiver: &Type, method: &str) -> Option<MethodSignature> {
        self.handlers
            .iter()
            .find(|h| h.method_name() == method && h.applies_to(receiver))
            .map(|h| h.signature(receiver))
    }
}

impl Default for BuiltinRegistry {
    fn default() -> Self {
        Self::new()
    }
}
