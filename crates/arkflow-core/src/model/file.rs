use super::class::ArkClass;
use super::namespace::ArkNamespace;
use crate::ir::consts;
use crate::ir::{ClassSignature, FileSignature, MethodSignature, NamespaceSignature, Type};
use indexmap::IndexMap;

/// `import { name_before_as as import_clause_name } from 'from'`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportInfo {
    pub import_clause_name: String,
    pub from: String,
    pub name_before_as: Option<String>,
}

impl ImportInfo {
    pub fn new(import_clause_name: impl Into<String>, from: impl Into<String>) -> Self {
        Self {
            import_clause_name: import_clause_name.into(),
            from: from.into(),
            name_before_as: None,
        }
    }

    pub fn with_original_name(mut self, name: impl Into<String>) -> Self {
        self.name_before_as = Some(name.into());
        self
    }

    /// Name the exporting file knows the symbol by
    pub fn exported_name(&self) -> &str {
        self.name_before_as.as_deref().unwrap_or(&self.import_clause_name)
    }
}

/// Symbol an export resolves to
#[derive(Debug, Clone, PartialEq)]
pub enum ExportSymbol {
    Class(ClassSignature),
    Method(MethodSignature),
    Namespace(NamespaceSignature),
    Local { name: String, ty: Type },
}

impl ExportSymbol {
    pub fn ty(&self) -> Type {
        match self {
            ExportSymbol::Class(sig) => Type::class(sig.clone()),
            ExportSymbol::Method(sig) => Type::function(sig.clone()),
            ExportSymbol::Namespace(_) => Type::Unknown,
            ExportSymbol::Local { ty, .. } => ty.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExportInfo {
    pub export_clause_name: String,
    pub name_before_as: Option<String>,
    /// Set for re-exports: `export { a } from './b'`
    pub from: Option<String>,
    pub symbol: Option<ExportSymbol>,
}

impl ExportInfo {
    pub fn new(export_clause_name: impl Into<String>) -> Self {
        Self {
            export_clause_name: export_clause_name.into(),
            name_before_as: None,
            from: None,
            symbol: None,
        }
    }

    pub fn with_symbol(mut self, symbol: ExportSymbol) -> Self {
        self.symbol = Some(symbol);
        self
    }

    pub fn with_original_name(mut self, name: impl Into<String>) -> Self {
        self.name_before_as = Some(name.into());
        self
    }

    pub fn reexported_from(mut self, from: impl Into<String>) -> Self {
        self.from = Some(from.into());
        self
    }

    pub fn local_name(&self) -> &str {
        self.name_before_as.as_deref().unwrap_or(&self.export_clause_name)
    }
}

#[derive(Debug, Clone)]
pub struct ArkFile {
    signature: FileSignature,
    classes: IndexMap<String, ArkClass>,
    namespaces: IndexMap<String, ArkNamespace>,
    import_infos: Vec<ImportInfo>,
    export_infos: IndexMap<String, ExportInfo>,
    is_sdk: bool,
}

impl ArkFile {
    pub fn new(signature: FileSignature) -> Self {
        Self {
            signature,
            classes: IndexMap::new(),
            namespaces: IndexMap::new(),
            import_infos: Vec::new(),
            export_infos: IndexMap::new(),
            is_sdk: false,
        }
    }

    /// Declaration file of the platform SDK
    pub fn sdk(signature: FileSignature) -> Self {
        Self {
            is_sdk: true,
            ..Self::new(signature)
        }
    }

    pub fn signature(&self) -> &FileSignature {
        &self.signature
    }

    pub fn name(&self) -> &str {
        &self.signature.file_name
    }

    pub fn is_sdk(&self) -> bool {
        self.is_sdk
    }

    pub fn add_class(&mut self, class: ArkClass) {
        self.classes.insert(class.name().to_string(), class);
    }

    pub fn add_namespace(&mut self, namespace: ArkNamespace) {
        self.namespaces.insert(namespace.name().to_string(), namespace);
    }

    pub fn add_import(&mut self, info: ImportInfo) {
        self.import_infos.push(info);
    }

    pub fn add_export(&mut self, info: ExportInfo) {
        self.export_infos.insert(info.export_clause_name.clone(), info);
    }

    pub fn get_class(&self, name: &str) -> Option<&ArkClass> {
        self.classes.get(name)
    }

    pub fn get_class_mut(&mut self, name: &str) -> Option<&mut ArkClass> {
        self.classes.get_mut(name)
    }

    /// The implicit class holding top-level functions and statements
    pub fn default_class(&self) -> Option<&ArkClass> {
        self.classes.get(consts::DEFAULT_CLASS_NAME)
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

    /// Top-level classes and those of every namespace
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

    pub fn import_infos(&self) -> &[ImportInfo] {
        &self.import_infos
    }

    pub fn import_info(&self, name: &str) -> Option<&ImportInfo> {
        self.import_infos.iter().find(|info| info.import_clause_name == name)
    }

    pub fn export_info(&self, name: &str) -> Option<&ExportInfo> {
        self.export_infos.get(name)
    }

    pub fn export_infos(&self) -> impl Iterator<Item = &ExportInfo> {
        self.export_infos.values()
    }
}
