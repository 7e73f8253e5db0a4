//! Resolution of placeholder types against the scene

use crate::ir::consts::builtin;
use crate::ir::{FileSignature, Type};
use crate::model::{ArkClass, Scene};
use indexmap::IndexMap;
use tracing::trace;

/// Alias chains deeper than this are left unresolved
const MAX_RESOLVE_DEPTH: usize = 16;

/// Resolves type names as seen from one method: its body aliases, its own
/// and its class's generic parameters, then classes visible from the file.
pub struct TypeResolver<'a> {
    scene: &'a Scene,
    file: &'a FileSignature,
    class: Option<&'a ArkClass>,
    method_generics: &'a [Type],
    alias_types: Option<&'a IndexMap<String, Type>>,
}

impl<'a> TypeResolver<'a> {
    pub fn new(scene: &'a Scene, file: &'a FileSignature) -> Self {
        Self {
            scene,
            file,
            class: None,
            method_generics: &[],
            alias_types: None,
        }
    }

    pub fn with_class(mut self, class: Option<&'a ArkClass>) -> Self {
        self.class = class;
        self
    }

    pub fn with_method_generics(mut self, generics: &'a [Type]) -> Self {
        self.method_generics = generics;
        self
    }

    pub fn with_alias_types(mut self, alias_types: &'a IndexMap<String, Type>) -> Self {
        self.alias_types = Some(alias_types);
        self
    }

    pub fn scene(&self) -> &'a Scene {
        self.scene
    }

    pub fn file(&self) -> &'a FileSignature {
        self.file
    }

    pub fn class(&self) -> Option<&'a ArkClass> {
        self.class
    }

    /// Class visible under `name` from the resolver's file
    pub fn resolve_class(&self, name: &str) -> Option<&'a ArkClass> {
        self.scene.resolve_class_by_name(name, self.file)
    }

    /// Replace every placeholder inside `ty` that can be resolved.
    /// Whatever cannot be resolved is left as it was.
    pub fn resolve(&self, ty: &Type) -> Type {
        self.resolve_at(ty, 0)
    }

    fn resolve_at(&self, ty: &Type, depth: usize) -> Type {
        if depth > MAX_RESOLVE_DEPTH {
            trace!(ty = %ty, "type resolution too deep");
            return ty.clone();
        }
        let next = depth + 1;
        match ty {
            Type::UnclearReference { name, generic_types } => self
                .resolve_name(name, generic_types, next)
                .unwrap_or_else(|| ty.clone()),
            Type::Class {
                signature,
                real_generic_types,
            } if signature.is_unknown() => {
                let generics = real_generic_types.as_deref().unwrap_or(&[]);
                self.resolve_name(&signature.name, generics, next)
                    .unwrap_or_else(|| ty.clone())
            }
            Type::Class {
                signature,
                real_generic_types: Some(generics),
            } => Type::class_with_generics(
                signature.clone(),
                generics.iter().map(|g| self.resolve_at(g, next)).collect(),
            ),
            Type::Union(members) => Type::union_of(members.iter().map(|m| self.resolve_at(m, next))),
            Type::Tuple(members) => Type::Tuple(members.iter().map(|m| self.resolve_at(m, next)).collect()),
            Type::Array { base, dimension } => Type::Array {
                base: Box::new(self.resolve_at(base, next)),
                dimension: *dimension,
            },
            Type::Alias {
                name,
                original,
                real_generic_types,
            } => Type::Alias {
                name: name.clone(),
                original: Box::new(self.resolve_at(original, next)),
                real_generic_types: real_generic_types.clone(),
            },
            Type::Generic { name, index, default } => self.resolve_generic(name).unwrap_or_else(|| Type::Generic {
                name: name.clone(),
                index: *index,
                default: default.clone(),
            }),
            _ => ty.clone(),
        }
    }

    fn resolve_name(&self, name: &str, generic_types: &[Type], depth: usize) -> Option<Type> {
        if let Some(primitive) = primitive_type(name) {
            return Some(primitive);
        }
        if let Some(alias) = self.alias_types.and_then(|aliases| aliases.get(name)) {
            return Some(self.resolve_at(alias, depth));
        }
        if let Some(generic) = self.resolve_generic(name) {
            return Some(generic);
        }
        let generics: Vec<Type> = generic_types.iter().map(|g| self.resolve_at(g, depth)).collect();
        match name {
            builtin::ARRAY => {
                return Some(Type::array_of(generics.into_iter().next().unwrap_or(Type::Any)));
            }
            builtin::PROMISE => {
                return Some(Type::promise_of(generics.into_iter().next().unwrap_or(Type::Unknown)));
            }
            _ => {}
        }
        let class = self.resolve_class(name)?;
        let signature = class.signature().clone();
        Some(if generics.is_empty() {
            Type::class(signature)
        } else {
            Type::class_with_generics(signature, generics)
        })
    }

    /// Generic parameter of the method or its class named `name`
    fn resolve_generic(&self, name: &str) -> Option<Type> {
        let class_generics = self.class.map(|c| c.generic_types()).unwrap_or(&[]);
        self.method_generics
            .iter()
            .chain(class_generics)
            .find(|g| matches!(g, Type::Generic { name: n, .. } if n == name))
            .cloned()
    }
}

fn primitive_type(name: &str) -> Option<Type> {
    Some(match name {
        "any" => Type::Any,
        "unknown" => Type::Unknown,
        "void" => Type::Void,
        "never" => Type::Never,
        "undefined" => Type::Undefined,
        "null" => Type::Null,
        "boolean" => Type::Boolean,
        "number" => Type::Number,
        "string" => Type::String,
        "bigint" => Type::BigInt,
        _ => return None,
    })
}
