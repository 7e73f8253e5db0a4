//! Scene: the project-wide symbol table
//!
//! Lookups walk from the most specific scope outward: the current file, its
//! namespaces, its imports, and finally the SDK declaration files.

use super::class::ArkClass;
use super::field::ArkField;
use super::file::{ArkFile, ExportSymbol, ImportInfo};
use super::method::ArkMethod;
use super::namespace::ArkNamespace;
use crate::ir::consts;
use crate::ir::{ClassSignature, FileSignature, MethodSignature, Type};
use indexmap::IndexMap;
use std::collections::HashSet;
use tracing::trace;

/// Re-export chains longer than this are treated as unresolvable
const MAX_REEXPORT_DEPTH: usize = 8;

const MODULE_SUFFIXES: &[&str] = &["", ".ts", ".ets", "/index.ts", "/index.ets"];
const SDK_SUFFIXES: &[&str] = &[".d.ts", ".d.ets", ".ts", ".ets"];

#[derive(Debug, Clone, Default)]
pub struct Scene {
    project_name: String,
    files: IndexMap<FileSignature, ArkFile>,
}

impl Scene {
    pub fn new(project_name: impl Into<String>) -> Self {
        Self {
            project_name: project_name.into(),
            files: IndexMap::new(),
        }
    }

    pub fn project_name(&self) -> &str {
        &self.project_name
    }

    pub fn add_file(&mut self, file: ArkFile) {
        self.files.insert(file.signature().clone(), file);
    }

    pub fn get_file(&self, signature: &FileSignature) -> Option<&ArkFile> {
        self.files.get(signature)
    }

    pub fn get_file_mut(&mut self, signature: &FileSignature) -> Option<&mut ArkFile> {
        self.files.get_mut(signature)
    }

    pub fn files(&self) -> impl Iterator<Item = &ArkFile> {
        self.files.values()
    }

    pub fn sdk_files(&self) -> impl Iterator<Item = &ArkFile> {
        self.files.values().filter(|f| f.is_sdk())
    }

    /// Every class of every file, namespaces included
    pub fn classes(&self) -> Vec<&ArkClass> {
        self.files.values().flat_map(|f| f.all_classes()).collect()
    }

    pub fn get_class(&self, signature: &ClassSignature) -> Option<&ArkClass> {
        let file = self.files.get(&signature.file)?;
        match &signature.namespace {
            None => file.get_class(&signature.name),
            Some(ns) => {
                let path = ns.path();
                let (first, rest) = path.split_first()?;
                let mut current = file.get_namespace(first)?;
                for name in rest {
                    current = current.get_namespace(name)?;
                }
                current.get_class(&signature.name)
            }
        }
    }

    pub fn get_class_mut(&mut self, signature: &ClassSignature) -> Option<&mut ArkClass> {
        let file = self.files.get_mut(&signature.file)?;
        match &signature.namespace {
            None => file.get_class_mut(&signature.name),
            Some(ns) => {
                let path = ns.path();
                let (first, rest) = path.split_first()?;
                let mut current = file.get_namespace_mut(first)?;
                for name in rest {
                    current = current.get_namespace_mut(name)?;
                }
                current.get_class_mut(&signature.name)
            }
        }
    }

    pub fn get_method(&self, signature: &MethodSignature) -> Option<&ArkMethod> {
        self.get_class(&signature.declaring_class)?.get_method(signature.name())
    }

    pub fn get_method_mut(&mut self, signature: &MethodSignature) -> Option<&mut ArkMethod> {
        self.get_class_mut(&signature.declaring_class)?
            .get_method_mut(signature.name())
    }

    /// Signatures of every method that has a body, in declaration order
    pub fn method_signatures(&self) -> Vec<MethodSignature> {
        self.classes()
            .into_iter()
            .flat_map(|c| c.methods())
            .filter(|m| m.body().is_some())
            .map(|m| m.signature().clone())
            .collect()
    }

    pub fn get_super_class(&self, class: &ArkClass) -> Option<&ArkClass> {
        let name = class.super_class_name()?;
        self.resolve_class_by_name(name, &class.signature().file)
    }

    /// Search a class and its superclasses for a method
    pub fn find_method_in_hierarchy(&self, class: &ClassSignature, name: &str) -> Option<&ArkMethod> {
        let mut visited = HashSet::new();
        let mut current = self.get_class(class);
        while let Some(cls) = current {
            if !visited.insert(cls.signature().clone()) {
                trace!(class = %cls.signature(), "inheritance cycle");
                return None;
            }
            if let Some(method) = cls.get_method(name) {
                return Some(method);
            }
            current = self.get_super_class(cls);
        }
        None
    }

    pub fn find_field_in_hierarchy(&self, class: &ClassSignature, name: &str) -> Option<&ArkField> {
        let mut visited = HashSet::new();
        let mut current = self.get_class(class);
        while let Some(cls) = current {
            if !visited.insert(cls.signature().clone()) {
                return None;
            }
            if let Some(field) = cls.get_field(name) {
                return Some(field);
            }
            current = self.get_super_class(cls);
        }
        None
    }

    /// Resolve a class name as written in `from`. Qualified names (`NS.C`)
    /// are resolved through namespaces.
    pub fn resolve_class_by_name(&self, name: &str, from: &FileSignature) -> Option<&ArkClass> {
        if let Some((ns_path, class_name)) = name.rsplit_once('.') {
            let ns = self.resolve_namespace_by_name(ns_path, from)?;
            return ns.get_class(class_name);
        }
        if let Some(file) = self.files.get(from) {
            if let Some(class) = file.get_class(name) {
                return Some(class);
            }
            if let Some(class) = file.all_classes().into_iter().find(|c| c.name() == name) {
                return Some(class);
            }
            if let Some(info) = file.import_info(name) {
                match self.resolve_import(info, from) {
                    Some(ExportSymbol::Class(sig)) => return self.get_class(&sig),
                    Some(_) => return None,
                    None => {}
                }
            }
        }
        self.sdk_files().find_map(|f| f.get_class(name))
    }

    /// Resolve a possibly dotted namespace path as written in `from`
    pub fn resolve_namespace_by_name(&self, name: &str, from: &FileSignature) -> Option<&ArkNamespace> {
        let mut parts = name.split('.');
        let first = parts.next()?;
        let mut current = self.resolve_top_namespace(first, from)?;
        for part in parts {
            current = current.get_namespace(part)?;
        }
        Some(current)
    }

    fn resolve_top_namespace(&self, name: &str, from: &FileSignature) -> Option<&ArkNamespace> {
        if let Some(file) = self.files.get(from) {
            if let Some(ns) = file.get_namespace(name) {
                return Some(ns);
            }
            if let Some(info) = file.import_info(name) {
                if let Some(ExportSymbol::Namespace(sig)) = self.resolve_import(info, from) {
                    let file = self.files.get(&sig.file)?;
                    let path = sig.path();
                    let (first, rest) = path.split_first()?;
                    let mut current = file.get_namespace(first)?;
                    for part in rest {
                        current = current.get_namespace(part)?;
                    }
                    return Some(current);
                }
            }
        }
        self.sdk_files().find_map(|f| f.get_namespace(name))
    }

    /// Resolve the symbol an import binds
    pub fn resolve_import(&self, info: &ImportInfo, from: &FileSignature) -> Option<ExportSymbol> {
        let target = self.resolve_module(&info.from, from)?;
        self.resolve_export(target, info.exported_name(), 0)
    }

    fn resolve_export(&self, file: &ArkFile, name: &str, depth: usize) -> Option<ExportSymbol> {
        if depth > MAX_REEXPORT_DEPTH {
            trace!(file = %file.signature(), name, "re-export chain too deep");
            return None;
        }
        let Some(export) = file.export_info(name) else {
            return Self::declared_symbol(file, name);
        };
        if let Some(symbol) = &export.symbol {
            return Some(symbol.clone());
        }
        match &export.from {
            Some(module) => {
                let next = self.resolve_module(module, file.signature())?;
                self.resolve_export(next, export.local_name(), depth + 1)
            }
            None => Self::declared_symbol(file, export.local_name()),
        }
    }

    /// Symbol a file declares under `name`, found lazily by kind
    fn declared_symbol(file: &ArkFile, name: &str) -> Option<ExportSymbol> {
        if let Some(class) = file.get_class(name) {
            return Some(ExportSymbol::Class(class.signature().clone()));
        }
        if let Some(ns) = file.get_namespace(name) {
            return Some(ExportSymbol::Namespace(ns.signature().clone()));
        }
        let default_class = file.default_class()?;
        if let Some(method) = default_class.get_method(name) {
            return Some(ExportSymbol::Method(method.signature().clone()));
        }
        let ty = default_class
            .get_method(consts::DEFAULT_METHOD_NAME)
            .and_then(|m| m.body())
            .and_then(|b| b.local_type(name))?;
        Some(ExportSymbol::Local {
            name: name.to_string(),
            ty,
        })
    }

    /// Find the file a module specifier refers to. Relative specifiers are
    /// joined to the importing file's directory; bare ones name SDK files.
    pub fn resolve_module(&self, module: &str, from: &FileSignature) -> Option<&ArkFile> {
        if module.starts_with('.') {
            let joined = normalize_path(from.directory(), module);
            MODULE_SUFFIXES.iter().find_map(|suffix| {
                let candidate = FileSignature::new(from.project_name.clone(), format!("{joined}{suffix}"));
                self.files.get(&candidate)
            })
        } else {
            self.sdk_files().find(|f| {
                let base = f.name().rsplit('/').next().unwrap_or(f.name());
                SDK_SUFFIXES
                    .iter()
                    .any(|suffix| base.strip_suffix(suffix) == Some(module))
            })
        }
    }

    /// Top-level function, class or namespace declared by an SDK file
    pub fn get_sdk_global(&self, name: &str) -> Option<ExportSymbol> {
        self.sdk_files().find_map(|f| Self::declared_symbol(f, name))
    }

    /// Type of a variable declared at the top level of `file`
    pub fn default_local_type(&self, file: &FileSignature, name: &str) -> Option<Type> {
        self.files
            .get(file)?
            .default_class()?
            .get_method(consts::DEFAULT_METHOD_NAME)?
            .body()?
            .local_type(name)
    }
}

/// Join `relative` onto `dir`, folding `.` and `..` segments
fn normalize_path(dir: &str, relative: &str) -> String {
    let mut parts: Vec<&str> = dir.split('/').filter(|p| !p.is_empty()).collect();
    for segment in relative.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                parts.pop();
            }
            other => parts.push(other),
        }
    }
    parts.join("/")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::{FieldSignature, MethodSubSignature, NamespaceSignature};
    use crate::model::{ArkField, ClassCategory, ExportInfo};

    fn class(name: &str, file: &FileSignature) -> ArkClass {
        ArkClass::new(ClassSignature::new(name, file.clone(), None), ClassCategory::Class)
    }

    fn method(class: &ClassSignature, name: &str, ret: Type) -> ArkMethod {
        ArkMethod::new(MethodSignature::new(
            class.clone(),
            MethodSubSignature::new(name, vec![], ret),
        ))
    }

    fn two_file_scene() -> (Scene, FileSignature, FileSignature) {
        let a_sig = FileSignature::new("demo", "src/pages/a.ts");
        let b_sig = FileSignature::new("demo", "src/model/b.ets");
        let mut scene = Scene::new("demo");

        let mut b = ArkFile::new(b_sig.clone());
        let mut point = class("Point", &b_sig);
        point.add_method(method(point.signature(), "norm", Type::Number));
        b.add_class(point);
        b.add_export(ExportInfo::new("Point"));
        scene.add_file(b);

        let mut a = ArkFile::new(a_sig.clone());
        a.add_import(ImportInfo::new("P", "../model/b").with_original_name("Point"));
        scene.add_file(a);
        (scene, a_sig, b_sig)
    }

    #[test]
    fn test_normalize_path() {
        assert_eq!(normalize_path("src/pages", "../model/b"), "src/model/b");
        assert_eq!(normalize_path("src", "./util"), "src/util");
        assert_eq!(normalize_path("", "./x"), "x");
    }

    #[test]
    fn test_resolve_class_through_import_alias() {
        let (scene, a_sig, b_sig) = two_file_scene();
        let class = scene.resolve_class_by_name("P", &a_sig).unwrap();
        assert_eq!(class.signature().file, b_sig);
        assert_eq!(class.name(), "Point");
        assert!(scene.resolve_class_by_name("Missing", &a_sig).is_none());
    }

    #[test]
    fn test_reexport_chain() {
        let (mut scene, _, _) = two_file_scene();
        let index_sig = FileSignature::new("demo", "src/model/index.ts");
        let mut index = ArkFile::new(index_sig);
        index.add_export(ExportInfo::new("Point").reexported_from("./b"));
        scene.add_file(index);

        let c_sig = FileSignature::new("demo", "src/c.ts");
        let mut c = ArkFile::new(c_sig.clone());
        c.add_import(ImportInfo::new("Point", "./model"));
        scene.add_file(c);

        let class = scene.resolve_class_by_name("Point", &c_sig).unwrap();
        assert_eq!(class.signature().file.file_name, "src/model/b.ets");
    }

    #[test]
    fn test_reexport_cycle_terminates() {
        let mut scene = Scene::new("demo");
        for (name, target) in [("x.ts", "./y"), ("y.ts", "./x")] {
            let mut file = ArkFile::new(FileSignature::new("demo", name));
            file.add_export(ExportInfo::new("Loop").reexported_from(target));
            scene.add_file(file);
        }
        let mut user = ArkFile::new(FileSignature::new("demo", "u.ts"));
        user.add_import(ImportInfo::new("Loop", "./x"));
        scene.add_file(user);
        assert!(scene
            .resolve_class_by_name("Loop", &FileSignature::new("demo", "u.ts"))
            .is_none());
    }

    #[test]
    fn test_namespace_qualified_lookup() {
        let file_sig = FileSignature::new("demo", "ns.ts");
        let ns_sig = NamespaceSignature::new("Shapes", file_sig.clone(), None);
        let mut ns = ArkNamespace::new(ns_sig.clone());
        ns.add_class(ArkClass::new(
            ClassSignature::new("Circle", file_sig.clone(), Some(ns_sig)),
            ClassCategory::Class,
        ));
        let mut file = ArkFile::new(file_sig.clone());
        file.add_namespace(ns);
        let mut scene = Scene::new("demo");
        scene.add_file(file);

        let circle = scene.resolve_class_by_name("Shapes.Circle", &file_sig).unwrap();
        let sig = circle.signature().clone();
        assert!(scene.get_class(&sig).is_some());
        assert!(scene.get_class_mut(&sig).is_some());
        // unqualified names also find namespace members of the same file
        assert!(scene.resolve_class_by_name("Circle", &file_sig).is_some());
    }

    #[test]
    fn test_hierarchy_lookup_with_cycle() {
        let file_sig = FileSignature::new("demo", "h.ts");
        let mut base = class("Base", &file_sig).with_super_class("Derived");
        base.add_method(method(base.signature(), "greet", Type::String));
        base.add_field(ArkField::new(FieldSignature::new(
            "id",
            base.signature().clone(),
            Type::Number,
            false,
        )));
        let derived = class("Derived", &file_sig).with_super_class("Base");
        let derived_sig = derived.signature().clone();
        let mut file = ArkFile::new(file_sig);
        file.add_class(base);
        file.add_class(derived);
        let mut scene = Scene::new("demo");
        scene.add_file(file);

        let found = scene.find_method_in_hierarchy(&derived_sig, "greet").unwrap();
        assert_eq!(found.return_type(), &Type::String);
        assert!(scene.find_field_in_hierarchy(&derived_sig, "id").is_some());
        assert!(scene.find_method_in_hierarchy(&derived_sig, "absent").is_none());
    }

    #[test]
    fn test_sdk_module_and_global() {
        let sdk_sig = FileSignature::new("sdk", "api/@ohos.router.d.ts");
        let mut sdk = ArkFile::sdk(sdk_sig.clone());
        let dflt = ClassSignature::new(consts::DEFAULT_CLASS_NAME, sdk_sig.clone(), None);
        let mut dflt_class = ArkClass::new(dflt.clone(), ClassCategory::Class);
        dflt_class.add_method(method(&dflt, "pushUrl", Type::Void));
        sdk.add_class(dflt_class);
        sdk.add_class(class("Router", &sdk_sig));
        let mut scene = Scene::new("demo");
        scene.add_file(sdk);

        let from = FileSignature::new("demo", "main.ts");
        let module = scene.resolve_module("@ohos.router", &from).unwrap();
        assert_eq!(module.signature(), &sdk_sig);
        assert!(matches!(scene.get_sdk_global("pushUrl"), Some(ExportSymbol::Method(_))));
        assert!(matches!(scene.get_sdk_global("Router"), Some(ExportSymbol::Class(_))));
        assert!(scene.get_sdk_global("nothing").is_none());
    }
}
