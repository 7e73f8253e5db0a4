use crate::ir::{FieldSignature, Type};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArkField {
    signature: FieldSignature,
    has_initializer: bool,
}

impl ArkField {
    pub fn new(signature: FieldSignature) -> Self {
        Self {
            signature,
            has_initializer: false,
        }
    }

    pub fn with_initializer(mut self) -> Self {
        self.has_initializer = true;
        self
    }

    pub fn signature(&self) -> &FieldSignature {
        &self.signature
    }

    pub fn name(&self) -> &str {
        &self.signature.name
    }

    pub fn ty(&self) -> &Type {
        &self.signature.ty
    }

    pub fn is_static(&self) -> bool {
        self.signature.is_static
    }

    /// Whether the declaration assigns a value
    pub fn has_initializer(&self) -> bool {
        self.has_initializer
    }
}
