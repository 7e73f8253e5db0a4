//! Signatures identifying files, namespaces, classes, methods and fields

use super::consts::{self, builtin};
use super::types::Type;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FileSignature {
    pub project_name: String,
    pub file_name: String,
}

impl FileSignature {
    pub fn new(project_name: impl Into<String>, file_name: impl Into<String>) -> Self {
        Self {
            project_name: project_name.into(),
            file_name: file_name.into(),
        }
    }

    pub fn unknown() -> Self {
        Self::new(consts::UNKNOWN_PROJECT_NAME, consts::UNKNOWN_FILE_NAME)
    }

    pub fn builtin() -> Self {
        Self::new(builtin::PROJECT_NAME, builtin::FILE_NAME)
    }

    pub fn is_unknown(&self) -> bool {
        self.file_name == consts::UNKNOWN_FILE_NAME
    }

    /// Directory part of the file name, without a trailing slash
    pub fn directory(&self) -> &str {
        match self.file_name.rfind('/') {
            Some(idx) => &self.file_name[..idx],
            None => "",
        }
    }
}

impl fmt::Display for FileSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "@{}/{}: ", self.project_name, self.file_name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NamespaceSignature {
    pub name: String,
    pub file: FileSignature,
    pub parent: Option<Box<NamespaceSignature>>,
}

impl NamespaceSignature {
    pub fn new(name: impl Into<String>, file: FileSignature, parent: Option<NamespaceSignature>) -> Self {
        Self {
            name: name.into(),
            file,
            parent: parent.map(Box::new),
        }
    }

    /// Namespace names from the outermost to this one
    pub fn path(&self) -> Vec<&str> {
        let mut path = match &self.parent {
            Some(parent) => parent.path(),
            None => Vec::new(),
        };
        path.push(&self.name);
        path
    }

    pub fn qualified_name(&self) -> String {
        self.path().join(".")
    }
}

impl fmt::Display for NamespaceSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.file, self.qualified_name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ClassSignature {
    pub name: String,
    pub file: FileSignature,
    pub namespace: Option<NamespaceSignature>,
}

impl ClassSignature {
    pub fn new(name: impl Into<String>, file: FileSignature, namespace: Option<NamespaceSignature>) -> Self {
        Self {
            name: name.into(),
            file,
            namespace,
        }
    }

    /// Class whose declaring file is not known yet, e.g. `Math` in `Math.max(...)`
    pub fn unresolved(name: impl Into<String>) -> Self {
        Self::new(name, FileSignature::unknown(), None)
    }

    pub fn unknown() -> Self {
        Self::unresolved(consts::UNKNOWN_CLASS_NAME)
    }

    pub fn builtin(name: impl Into<String>) -> Self {
        Self::new(name, FileSignature::builtin(), None)
    }

    pub fn is_unknown(&self) -> bool {
        self.file.is_unknown()
    }

    pub fn is_default(&self) -> bool {
        self.name == consts::DEFAULT_CLASS_NAME
    }

    pub fn is_builtin(&self) -> bool {
        self.file.project_name == builtin::PROJECT_NAME
    }
}

impl fmt::Display for ClassSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.file)?;
        if let Some(ns) = &self.namespace {
            write!(f, "{}.", ns.qualified_name())?;
        }
        write!(f, "{}", self.name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MethodParameter {
    pub name: String,
    pub ty: Type,
    pub optional: bool,
    pub rest: bool,
}

impl MethodParameter {
    pub fn new(name: impl Into<String>, ty: Type) -> Self {
        Self {
            name: name.into(),
            ty,
            optional: false,
            rest: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MethodSubSignature {
    pub name: String,
    pub parameters: Vec<MethodParameter>,
    pub return_type: Type,
    pub is_static: bool,
}

impl MethodSubSignature {
    pub fn new(name: impl Into<String>, parameters: Vec<MethodParameter>, return_type: Type) -> Self {
        Self {
            name: name.into(),
            parameters,
            return_type,
            is_static: false,
        }
    }

    pub fn with_static(mut self, is_static: bool) -> Self {
        self.is_static = is_static;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MethodSignature {
    pub declaring_class: ClassSignature,
    pub sub: MethodSubSignature,
}

impl MethodSignature {
    pub fn new(declaring_class: ClassSignature, sub: MethodSubSignature) -> Self {
        Self { declaring_class, sub }
    }

    /// Placeholder signature for a call whose target is resolved later by inference
    pub fn from_name(name: impl Into<String>) -> Self {
        Self::new(
            ClassSignature::unknown(),
            MethodSubSignature::new(name, Vec::new(), Type::Unknown),
        )
    }

    pub fn name(&self) -> &str {
        &self.sub.name
    }

    pub fn return_type(&self) -> &Type {
        &self.sub.return_type
    }

    pub fn is_static(&self) -> bool {
        self.sub.is_static
    }

    /// Two signatures denote the same method when class and name agree;
    /// parameter and return types are refined by inference and not part of identity.
    pub fn same_method(&self, other: &MethodSignature) -> bool {
        self.declaring_class == other.declaring_class && self.sub.name == other.sub.name
    }
}

impl fmt::Display for MethodSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}(", self.declaring_class, self.sub.name)?;
        for (i, param) in self.sub.parameters.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", param.ty)?;
        }
        write!(f, ")")
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FieldSignature {
    pub name: String,
    pub declaring_class: ClassSignature,
    pub ty: Type,
    pub is_static: bool,
}

impl FieldSignature {
    pub fn new(name: impl Into<String>, declaring_class: ClassSignature, ty: Type, is_static: bool) -> Self {
        Self {
            name: name.into(),
            declaring_class,
            ty,
            is_static,
        }
    }

    /// Field whose declaring class has not been resolved yet
    pub fn from_name(name: impl Into<String>) -> Self {
        Self::new(name, ClassSignature::unknown(), Type::Unknown, false)
    }
}

impl fmt::Display for FieldSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.declaring_class, self.name)
    }
}
