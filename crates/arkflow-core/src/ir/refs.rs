//! References: fields, array elements, parameters, `this`, caught exceptions and globals

use super::signature::FieldSignature;
use super::types::Type;
use super::value::{Local, LocalTable, Value};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Ref {
    InstanceField {
        base: Local,
        field: FieldSignature,
    },
    StaticField {
        field: FieldSignature,
    },
    Array {
        base: Local,
        index: Value,
    },
    /// The `index`-th formal parameter, read once at method entry
    Parameter {
        index: usize,
        param_type: Type,
    },
    This {
        ty: Type,
    },
    CaughtException {
        ty: Type,
    },
    /// A file-level variable used inside a method, bound to its defining value once known
    Global {
        name: String,
        ref_value: Option<Value>,
    },
}

impl Ref {
    pub fn instance_field(base: Local, field: FieldSignature) -> Self {
        Ref::InstanceField { base, field }
    }

    pub fn static_field(field: FieldSignature) -> Self {
        Ref::StaticField { field }
    }

    pub fn field_signature(&self) -> Option<&FieldSignature> {
        match self {
            Ref::InstanceField { field, .. } | Ref::StaticField { field } => Some(field),
            _ => None,
        }
    }

    pub fn set_field_signature(&mut self, signature: FieldSignature) {
        if let Ref::InstanceField { field, .. } | Ref::StaticField { field } = self {
            *field = signature;
        }
    }

    pub fn base(&self) -> Option<&Local> {
        match self {
            Ref::InstanceField { base, .. } | Ref::Array { base, .. } => Some(base),
            _ => None,
        }
    }

    pub fn is_field_ref(&self) -> bool {
        matches!(self, Ref::InstanceField { .. } | Ref::StaticField { .. })
    }

    pub fn get_uses(&self) -> Vec<Value> {
        match self {
            Ref::InstanceField { base, .. } => vec![Value::Local(base.clone())],
            Ref::Array { base, index } => {
                let mut uses = vec![Value::Local(base.clone()), index.clone()];
                uses.extend(index.get_uses());
                uses
            }
            Ref::Global {
                ref_value: Some(value), ..
            } => {
                let mut uses = vec![value.clone()];
                uses.extend(value.get_uses());
                uses
            }
            Ref::StaticField { .. }
            | Ref::Parameter { .. }
            | Ref::This { .. }
            | Ref::CaughtException { .. }
            | Ref::Global { ref_value: None, .. } => Vec::new(),
        }
    }

    pub fn get_type(&self, locals: &LocalTable) -> Type {
        match self {
            Ref::InstanceField { field, .. } | Ref::StaticField { field } => field.ty.clone(),
            Ref::Array { base, .. } => locals
                .type_of(base)
                .unwrap_alias()
                .element_type()
                .unwrap_or(Type::Unknown),
            Ref::Parameter { param_type, .. } => param_type.clone(),
            Ref::This { ty } | Ref::CaughtException { ty } => ty.clone(),
            Ref::Global { ref_value, .. } => ref_value
                .as_ref()
                .map(|v| v.get_type(locals))
                .unwrap_or(Type::Unknown),
        }
    }
}

impl fmt::Display for Ref {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Ref::InstanceField { base, field } => write!(f, "{base}.<{field}>"),
            Ref::StaticField { field } => write!(f, "<{field}>"),
            Ref::Array { base, index } => write!(f, "{base}[{index}]"),
            Ref::Parameter { index, param_type } => write!(f, "parameter{index}: {param_type}"),
            Ref::This { ty } => write!(f, "this: {ty}"),
            Ref::CaughtException { ty } => write!(f, "caughtexception: {ty}"),
            Ref::Global { name, .. } => write!(f, "{name}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::value::Constant;

    #[test]
    fn test_array_ref_type_from_base() {
        let mut locals = LocalTable::new();
        let arr = locals.new_local("arr", Type::array_of(Type::String));
        let i = locals.new_local("i", Type::Number);
        let r = Ref::Array {
            base: arr.clone(),
            index: i.clone().into(),
        };
        assert_eq!(r.get_type(&locals), Type::String);
        assert_eq!(r.get_uses(), vec![Value::Local(arr), Value::Local(i)]);
        assert_eq!(r.to_string(), "arr[i]");
    }

    #[test]
    fn test_field_ref_uses_base_only() {
        let mut locals = LocalTable::new();
        let obj = locals.new_local("obj", Type::Unknown);
        let r = Ref::instance_field(obj.clone(), FieldSignature::from_name("f"));
        assert_eq!(r.get_uses(), vec![Value::Local(obj)]);
        assert!(Ref::static_field(FieldSignature::from_name("g")).get_uses().is_empty());
    }

    #[test]
    fn test_global_ref_follows_bound_value() {
        let locals = LocalTable::new();
        let unbound = Ref::Global {
            name: "g".into(),
            ref_value: None,
        };
        assert_eq!(unbound.get_type(&locals), Type::Unknown);
        let bound = Ref::Global {
            name: "g".into(),
            ref_value: Some(Constant::string("x").into()),
        };
        assert_eq!(bound.get_type(&locals), Type::String);
    }
}
