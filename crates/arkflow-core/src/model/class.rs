use super::field::ArkField;
use super::method::ArkMethod;
use crate::ir::consts::component;
use crate::ir::{ClassSignature, Type};
use indexmap::IndexMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ClassCategory {
    #[default]
    Class,
    Struct,
    Interface,
    Enum,
    TypeLiteral,
    /// Anonymous object literal
    Object,
}

#[derive(Debug, Clone)]
pub struct ArkClass {
    signature: ClassSignature,
    category: ClassCategory,
    super_class_name: Option<String>,
    implemented_interfaces: Vec<String>,
    decorators: Vec<String>,
    fields: IndexMap<String, ArkField>,
    static_fields: IndexMap<String, ArkField>,
    methods: IndexMap<String, ArkMethod>,
    static_methods: IndexMap<String, ArkMethod>,
    generic_types: Vec<Type>,
}

impl ArkClass {
    pub fn new(signature: ClassSignature, category: ClassCategory) -> Self {
        Self {
            signature,
            category,
            super_class_name: None,
            implemented_interfaces: Vec::new(),
            decorators: Vec::new(),
            fields: IndexMap::new(),
            static_fields: IndexMap::new(),
            methods: IndexMap::new(),
            static_methods: IndexMap::new(),
            generic_types: Vec::new(),
        }
    }

    pub fn with_super_class(mut self, name: impl Into<String>) -> Self {
        self.super_class_name = Some(name.into());
        self
    }

    pub fn with_interface(mut self, name: impl Into<String>) -> Self {
        self.implemented_interfaces.push(name.into());
        self
    }

    pub fn with_decorator(mut self, decorator: impl Into<String>) -> Self {
        self.decorators.push(decorator.into());
        self
    }

    pub fn with_generic_types(mut self, generic_types: Vec<Type>) -> Self {
        self.generic_types = generic_types;
        self
    }

    pub fn signature(&self) -> &ClassSignature {
        &self.signature
    }

    pub fn name(&self) -> &str {
        &self.signature.name
    }

    pub fn category(&self) -> ClassCategory {
        self.category
    }

    pub fn super_class_name(&self) -> Option<&str> {
        self.super_class_name.as_deref()
    }

    pub fn implemented_interfaces(&self) -> &[String] {
        &self.implemented_interfaces
    }

    pub fn decorators(&self) -> &[String] {
        &self.decorators
    }

    pub fn generic_types(&self) -> &[Type] {
        &self.generic_types
    }

    /// Carries one of the UI component decorators
    pub fn has_component_decorator(&self) -> bool {
        self.decorators.iter().any(|d| component::DECORATORS.contains(&d.as_str()))
    }

    pub fn add_field(&mut self, field: ArkField) {
        let name = field.name().to_string();
        if field.is_static() {
            self.static_fields.insert(name, field);
        } else {
            self.fields.insert(name, field);
        }
    }

    pub fn add_method(&mut self, method: ArkMethod) {
        let name = method.name().to_string();
        if method.is_static() {
            self.static_methods.insert(name, method);
        } else {
            self.methods.insert(name, method);
        }
    }

    /// Instance field first, then static
    pub fn get_field(&self, name: &str) -> Option<&ArkField> {
        self.fields.get(name).or_else(|| self.static_fields.get(name))
    }

    pub fn get_static_field(&self, name: &str) -> Option<&ArkField> {
        self.static_fields.get(name)
    }

    pub fn fields(&self) -> impl Iterator<Item = &ArkField> {
        self.fields.values()
    }

    pub fn static_fields(&self) -> impl Iterator<Item = &ArkField> {
        self.static_fields.values()
    }

    /// Instance method first, then static
    pub fn get_method(&self, name: &str) -> Option<&ArkMethod> {
        self.methods.get(name).or_else(|| self.static_methods.get(name))
    }

    pub fn get_method_mut(&mut self, name: &str) -> Option<&mut ArkMethod> {
        match self.methods.get_mut(name) {
            Some(method) => Some(method),
            None => self.static_methods.get_mut(name),
        }
    }

    pub fn get_static_method(&self, name: &str) -> Option<&ArkMethod> {
        self.static_methods.get(name)
    }

    /// Instance methods followed by static methods
    pub fn methods(&self) -> impl Iterator<Item = &ArkMethod> {
        self.methods.values().chain(self.static_methods.values())
    }

    pub fn methods_mut(&mut self) -> impl Iterator<Item = &mut ArkMethod> {
        self.methods.values_mut().chain(self.static_methods.values_mut())
    }

    pub fn to_type(&self) -> Type {
        if self.generic_types.is_empty() {
            Type::class(self.signature.clone())
        } else {
            Type::class_with_generics(self.signature.clone(), self.generic_types.clone())
        }
    }
}
