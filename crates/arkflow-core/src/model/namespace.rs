use super::class::ArkClass;
use crate::ir::NamespaceSignature;
use indexmap::IndexMap;

#[derive(Debug, Clone)]
pub struct ArkNamespace {
    signature: NamespaceSignature,
    classes: IndexMap<String, ArkClass>,
    namespaces: IndexMap<String, ArkNamespace>,
}

impl ArkNamespace {
    pub fn new(signature: NamespaceSignature) -> Self {
        Self {
            signature,
            classes: IndexMap::new(),
            namespaces: IndexMap::new(),
        }
    }

    pub fn signature(&self) -> &NamespaceSignature {
        &self.signature
    }

    pub fn name(&self) -> &str {
        &self.signature.name
    }

    pub fn add_class(&mut self, class: ArkClass) {
        self.classes.insert(class.name().to_string(), class);
    }

    pub fn add_namespace(&mut self, namespace: ArkNamespace) {
        self.namespaces.insert(namespace.name().to_string(), namespace);
    }

    pub fn get_class(&self, name: &str) -> Option<&ArkClass> {
        self.classes.get(name)
    }

    pub fn get_class_mut(&mut self, name: &str) -> Option<&mut ArkClass> {
        self.classes.get_mut(name)
    }

    pub fn get_namespace(&self, name: &str) -> Option<&ArkNamespace> {
        self.namespaces.get(name)
    }

    pub fn get_namespace_mut(&mut self, name: &str) -> Option<&mut ArkNamespace> {
        self.namespaces.get_mut(name)
    }

    pub fn classes(&self) -> impl Iterator<Item = &ArkClass> {
        self.classes.values()
    }

    pub fn namespaces(&self) -> impl Iterator<Item = &ArkNamespace> {
        self.namespaces.values()
    }

    /// Classes of this namespace and every nested one
    pub fn all_classes(&self) -> Vec<&ArkClass> {
        let mut classes: Vec<&ArkClass> = self.classes.values().collect();
        for ns in self.namespaces.values() {
            classes.extend(ns.all_classes());
        }
        classes
    }

    pub(crate) fn all_classes_mut(&mut self) -> Vec<&mut ArkClass> {
        let mut classes: Vec<&mut ArkClass> = self.classes.values_mut().collect();
        for ns in self.namespaces.values_mut() {
            classes.extend(ns.all_classes_mut());
        }
        classes
    }
}
