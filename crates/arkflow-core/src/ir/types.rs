//! Type representation for the IR
//!
//! Types start out as placeholders (`Unknown`, `UnclearReference`, `Generic`)
//! when the binder cannot decide them and are replaced in place by the
//! inference engine. Everything else is a resolved type.

use super::consts::builtin;
use super::signature::{ClassSignature, MethodSignature};
use std::fmt;

/// Literal types such as `'a'`, `1` or `true`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum LiteralType {
    String(String),
    Number(String),
    Boolean(bool),
}

impl LiteralType {
    /// The primitive type the literal belongs to
    pub fn widen(&self) -> Type {
        match self {
            LiteralType::String(_) => Type::String,
            LiteralType::Number(_) => Type::Number,
            LiteralType::Boolean(_) => Type::Boolean,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Type {
    Any,
    Unknown,
    Void,
    Never,
    Undefined,
    Null,
    Boolean,
    Number,
    String,
    BigInt,
    Literal(LiteralType),
    Union(Vec<Type>),
    Tuple(Vec<Type>),
    Array {
        base: Box<Type>,
        dimension: usize,
    },
    Class {
        signature: ClassSignature,
        real_generic_types: Option<Vec<Type>>,
    },
    Function {
        signature: Box<MethodSignature>,
        real_generic_types: Option<Vec<Type>>,
    },
    /// A type name the binder could not tie to a declaration
    UnclearReference {
        name: String,
        generic_types: Vec<Type>,
    },
    /// Generic type parameter, `index` is its position in the declaring list
    Generic {
        name: String,
        index: usize,
        default: Option<Box<Type>>,
    },
    Alias {
        name: String,
        original: Box<Type>,
        real_generic_types: Option<Vec<Type>>,
    },
}

impl Type {
    pub fn class(signature: ClassSignature) -> Type {
        Type::Class {
            signature,
            real_generic_types: None,
        }
    }

    pub fn class_with_generics(signature: ClassSignature, generics: Vec<Type>) -> Type {
        Type::Class {
            signature,
            real_generic_types: Some(generics),
        }
    }

    pub fn builtin_class(name: &str) -> Type {
        Type::class(ClassSignature::builtin(name))
    }

    pub fn function(signature: MethodSignature) -> Type {
        Type::Function {
            signature: Box::new(signature),
            real_generic_types: None,
        }
    }

    pub fn unclear(name: impl Into<String>) -> Type {
        Type::UnclearReference {
            name: name.into(),
            generic_types: Vec::new(),
        }
    }

    pub fn generic(name: impl Into<String>, index: usize) -> Type {
        Type::Generic {
            name: name.into(),
            index,
            default: None,
        }
    }

    /// Array of `elem`; arrays of arrays collapse into a higher dimension
    pub fn array_of(elem: Type) -> Type {
        match elem {
            Type::Array { base, dimension } => Type::Array {
                base,
                dimension: dimension + 1,
            },
            other => Type::Array {
                base: Box::new(other),
                dimension: 1,
            },
        }
    }

    /// Element type of an array, `None` for anything else
    pub fn element_type(&self) -> Option<Type> {
        match self {
            Type::Array { base, dimension } if *dimension > 1 => Some(Type::Array {
                base: base.clone(),
                dimension: dimension - 1,
            }),
            Type::Array { base, .. } => Some((**base).clone()),
            Type::Tuple(elems) => Some(Type::union_of(elems.iter().cloned())),
            Type::Class {
                signature,
                real_generic_types,
            } if signature.is_builtin() && signature.name == builtin::ARRAY => Some(
                real_generic_types
                    .as_ref()
                    .and_then(|g| g.first().cloned())
                    .unwrap_or(Type::Unknown),
            ),
            _ => None,
        }
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self, Type::Unknown)
    }

    pub fn is_unclear(&self) -> bool {
        matches!(self, Type::UnclearReference { .. })
    }

    /// Placeholder types the inference engine tries to replace
    pub fn is_unresolved(&self) -> bool {
        matches!(self, Type::Unknown | Type::UnclearReference { .. } | Type::Generic { .. })
    }

    pub fn is_string_like(&self) -> bool {
        matches!(self, Type::String | Type::Literal(LiteralType::String(_)))
    }

    pub fn is_number_like(&self) -> bool {
        matches!(self, Type::Number | Type::Literal(LiteralType::Number(_)))
    }

    pub fn is_boolean_like(&self) -> bool {
        matches!(self, Type::Boolean | Type::Literal(LiteralType::Boolean(_)))
    }

    /// Types whose value is `undefined` or `null` at run time
    pub fn is_nullish(&self) -> bool {
        matches!(self, Type::Undefined | Type::Null)
    }

    pub fn is_array(&self) -> bool {
        matches!(self, Type::Array { .. } | Type::Tuple(_))
    }

    /// Literal types widen to their primitive; everything else is unchanged
    pub fn widen(&self) -> Type {
        match self {
            Type::Literal(lit) => lit.widen(),
            other => other.clone(),
        }
    }

    /// Follow alias chains down to the aliased type
    pub fn unwrap_alias(&self) -> &Type {
        let mut current = self;
        while let Type::Alias { original, .. } = current {
            current = original;
        }
        current
    }

    pub fn class_signature(&self) -> Option<&ClassSignature> {
        match self {
            Type::Class { signature, .. } => Some(signature),
            _ => None,
        }
    }

    pub fn is_builtin_class(&self, name: &str) -> bool {
        matches!(self, Type::Class { signature, .. } if signature.is_builtin() && signature.name == name)
    }

    /// Generic arguments the type was instantiated with
    pub fn real_generic_types(&self) -> Option<&[Type]> {
        match self {
            Type::Class { real_generic_types, .. }
            | Type::Function { real_generic_types, .. }
            | Type::Alias { real_generic_types, .. } => real_generic_types.as_deref(),
            Type::UnclearReference { generic_types, .. } if !generic_types.is_empty() => {
                Some(generic_types)
            }
            _ => None,
        }
    }

    /// Replace generic parameters by the types bound at `real`
    ///
    /// Parameters without a binding fall back to their default, and stay
    /// generic otherwise.
    pub fn substitute_generics(&self, real: &[Type]) -> Type {
        let subst_all = |types: &[Type]| types.iter().map(|t| t.substitute_generics(real)).collect::<Vec<_>>();
        match self {
            Type::Generic { index, default, .. } => match real.get(*index) {
                Some(bound) => bound.clone(),
                None => default.as_deref().cloned().unwrap_or_else(|| self.clone()),
            },
            Type::Union(types) => Type::Union(subst_all(types)),
            Type::Tuple(types) => Type::Tuple(subst_all(types)),
            Type::Array { base, dimension } => Type::Array {
                base: Box::new(base.substitute_generics(real)),
                dimension: *dimension,
            },
            Type::Class {
                signature,
                real_generic_types: Some(generics),
            } => Type::Class {
                signature: signature.clone(),
                real_generic_types: Some(subst_all(generics)),
            },
            Type::Function {
                signature,
                real_generic_types: Some(generics),
            } => Type::Function {
                signature: signature.clone(),
                real_generic_types: Some(subst_all(generics)),
            },
            other => other.clone(),
        }
    }

    /// Build a union, flattening nested unions and dropping duplicates.
    /// A single member is returned as is, no members give `Unknown`.
    pub fn union_of(types: impl IntoIterator<Item = Type>) -> Type {
        let mut members: Vec<Type> = Vec::new();
        for ty in types {
            let flat = match ty {
                Type::Union(inner) => inner,
                other => vec![other],
            };
            for member in flat {
                if !members.contains(&member) {
                    members.push(member);
                }
            }
        }
        match members.len() {
            0 => Type::Unknown,
            1 => members.remove(0),
            _ => Type::Union(members),
        }
    }

    /// Least upper bound used when several definitions meet
    ///
    /// `Unknown` is the identity; different resolved types form a union.
    pub fn join(&self, other: &Type) -> Type {
        match (self, other) {
            (Type::Unknown, t) | (t, Type::Unknown) => t.clone(),
            (a, b) if a == b => a.clone(),
            (a, b) => Type::union_of([a.clone(), b.clone()]),
        }
    }

    /// Promise of `inner`, the result type of `await`-able calls
    pub fn promise_of(inner: Type) -> Type {
        Type::class_with_generics(ClassSignature::builtin(builtin::PROMISE), vec![inner])
    }
}

fn write_generics(f: &mut fmt::Formatter<'_>, generics: &[Type]) -> fmt::Result {
    if generics.is_empty() {
        return Ok(());
    }
    write!(f, "<")?;
    for (i, ty) in generics.iter().enumerate() {
        if i > 0 {
            write!(f, ", ")?;
        }
        write!(f, "{ty}")?;
    }
    write!(f, ">")
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Any => write!(f, "any"),
            Type::Unknown => write!(f, "unknown"),
            Type::Void => write!(f, "void"),
            Type::Never => write!(f, "never"),
            Type::Undefined => write!(f, "undefined"),
            Type::Null => write!(f, "null"),
            Type::Boolean => write!(f, "boolean"),
            Type::Number => write!(f, "number"),
            Type::String => write!(f, "string"),
            Type::BigInt => write!(f, "bigint"),
            Type::Literal(LiteralType::String(s)) => write!(f, "'{s}'"),
            Type::Literal(LiteralType::Number(n)) => write!(f, "{n}"),
            Type::Literal(LiteralType::Boolean(b)) => write!(f, "{b}"),
            Type::Union(types) => {
                for (i, ty) in types.iter().enumerate() {
                    if i > 0 {
                        write!(f, "|")?;
                    }
                    write!(f, "{ty}")?;
                }
                Ok(())
            }
            Type::Tuple(types) => {
                write!(f, "[")?;
                for (i, ty) in types.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{ty}")?;
                }
                write!(f, "]")
            }
            Type::Array { base, dimension } => {
                if matches!(**base, Type::Union(_)) {
                    write!(f, "({base})")?;
                } else {
                    write!(f, "{base}")?;
                }
                for _ in 0..*dimension {
                    write!(f, "[]")?;
                }
                Ok(())
            }
            Type::Class {
                signature,
                real_generic_types,
            } => {
                write!(f, "{signature}")?;
                write_generics(f, real_generic_types.as_deref().unwrap_or_default())
            }
            Type::Function {
                signature,
                real_generic_types,
            } => {
                write!(f, "{signature}")?;
                write_generics(f, real_generic_types.as_deref().unwrap_or_default())
            }
            Type::UnclearReference { name, generic_types } => {
                write!(f, "{name}")?;
                write_generics(f, generic_types)
            }
            Type::Generic { name, .. } => write!(f, "{name}"),
            Type::Alias {
                name,
                real_generic_types,
                ..
            } => {
                write!(f, "{name}")?;
                write_generics(f, real_generic_types.as_deref().unwrap_or_default())
            }
        }
    }
}
