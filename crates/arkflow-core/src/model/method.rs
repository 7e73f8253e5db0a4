use super::body::ArkBody;
use crate::ir::{MethodParameter, MethodSignature, Type};

#[derive(Debug, Clone)]
pub struct ArkMethod {
    signature: MethodSignature,
    body: Option<ArkBody>,
    generic_types: Vec<Type>,
    decorators: Vec<String>,
}

impl ArkMethod {
    pub fn new(signature: MethodSignature) -> Self {
        Self {
            signature,
            body: None,
            generic_types: Vec::new(),
            decorators: Vec::new(),
        }
    }

    pub fn with_body(mut self, body: ArkBody) -> Self {
        self.body = Some(body);
        self
    }

    pub fn with_generic_types(mut self, generic_types: Vec<Type>) -> Self {
        self.generic_types = generic_types;
        self
    }

    pub fn with_decorator(mut self, decorator: impl Into<String>) -> Self {
        self.decorators.push(decorator.into());
        self
    }

    pub fn signature(&self) -> &MethodSignature {
        &self.signature
    }

    pub fn name(&self) -> &str {
        self.signature.name()
    }

    pub fn is_static(&self) -> bool {
        self.signature.is_static()
    }

    pub fn parameters(&self) -> &[MethodParameter] {
        &self.signature.sub.parameters
    }

    pub fn return_type(&self) -> &Type {
        self.signature.return_type()
    }

    pub fn set_return_type(&mut self, ty: Type) {
        self.signature.sub.return_type = ty;
    }

    /// Set the type of the `index`-th parameter; false when there is none
    pub fn set_parameter_type(&mut self, index: usize, ty: Type) -> bool {
        match self.signature.sub.parameters.get_mut(index) {
            Some(param) => {
                param.ty = ty;
                true
            }
            None => false,
        }
    }

    pub fn generic_types(&self) -> &[Type] {
        &self.generic_types
    }

    pub fn decorators(&self) -> &[String] {
        &self.decorators
    }

    pub fn body(&self) -> Option<&ArkBody> {
        self.body.as_ref()
    }

    pub fn body_mut(&mut self) -> Option<&mut ArkBody> {
        self.body.as_mut()
    }

    /// Detach the body, e.g. to mutate it while the scene is borrowed
    pub fn take_body(&mut self) -> Option<ArkBody> {
        self.body.take()
    }

    pub fn set_body(&mut self, body: ArkBody) {
        self.body = Some(body);
    }
}
