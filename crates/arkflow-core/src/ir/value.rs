//! Operands of the IR: locals, constants, expressions and references

use super::consts;
use super::expr::Expr;
use super::refs::Ref;
use super::stmt::StmtId;
use super::types::{LiteralType, Type};
use std::fmt;

/// Index of a local in its body's [`LocalTable`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LocalId(pub usize);

/// Handle to a local variable
///
/// The handle carries the name so values can be rendered without the table;
/// everything that inference or def-use tracking mutates lives in [`LocalData`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Local {
    pub id: LocalId,
    pub name: String,
}

impl Local {
    pub fn is_this(&self) -> bool {
        self.name == consts::THIS_NAME
    }
}

impl fmt::Display for Local {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LocalData {
    pub name: String,
    pub ty: Type,
    /// Statement defining the local, set once
    pub declaring_stmt: Option<StmtId>,
    pub used_stmts: Vec<StmtId>,
}

/// Storage for the locals of one method body
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LocalTable {
    locals: Vec<LocalData>,
}

impl LocalTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn new_local(&mut self, name: impl Into<String>, ty: Type) -> Local {
        let name = name.into();
        let id = LocalId(self.locals.len());
        self.locals.push(LocalData {
            name: name.clone(),
            ty,
            declaring_stmt: None,
            used_stmts: Vec::new(),
        });
        Local { id, name }
    }

    pub fn data(&self, local: &Local) -> Option<&LocalData> {
        self.locals.get(local.id.0)
    }

    pub fn data_mut(&mut self, local: &Local) -> Option<&mut LocalData> {
        self.locals.get_mut(local.id.0)
    }

    /// Handle for the local stored at `id`
    pub fn handle(&self, id: LocalId) -> Option<Local> {
        self.locals.get(id.0).map(|data| Local {
            id,
            name: data.name.clone(),
        })
    }

    /// Current type of `local`; locals from another table read as `Unknown`
    pub fn type_of(&self, local: &Local) -> Type {
        self.data(local).map(|d| d.ty.clone()).unwrap_or(Type::Unknown)
    }

    pub fn set_type(&mut self, local: &Local, ty: Type) {
        if let Some(data) = self.data_mut(local) {
            data.ty = ty;
        }
    }

    pub fn declaring_stmt(&self, local: &Local) -> Option<StmtId> {
        self.data(local).and_then(|d| d.declaring_stmt)
    }

    /// Record the defining statement; returns false when one was already set
    pub fn set_declaring_stmt(&mut self, local: &Local, stmt: StmtId) -> bool {
        match self.data_mut(local) {
            Some(data) if data.declaring_stmt.is_none() => {
                data.declaring_stmt = Some(stmt);
                true
            }
            _ => false,
        }
    }

    pub fn add_used_stmt(&mut self, local: &Local, stmt: StmtId) {
        if let Some(data) = self.data_mut(local) {
            if !data.used_stmts.contains(&stmt) {
                data.used_stmts.push(stmt);
            }
        }
    }

    pub fn used_stmts(&self, local: &Local) -> &[StmtId] {
        self.data(local).map(|d| d.used_stmts.as_slice()).unwrap_or_default()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Local, &LocalData)> {
        self.locals.iter().enumerate().map(|(i, data)| {
            (
                Local {
                    id: LocalId(i),
                    name: data.name.clone(),
                },
                data,
            )
        })
    }

    pub fn len(&self) -> usize {
        self.locals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locals.is_empty()
    }
}

/// A literal with its type. Inference may rewrite both through the setters.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Constant {
    value: String,
    ty: Type,
}

impl Constant {
    pub fn new(value: impl Into<String>, ty: Type) -> Self {
        Self {
            value: value.into(),
            ty,
        }
    }

    pub fn undefined() -> Self {
        Self::new(consts::UNDEFINED_NAME, Type::Undefined)
    }

    pub fn null() -> Self {
        Self::new(consts::NULL_NAME, Type::Null)
    }

    pub fn number(value: impl Into<String>) -> Self {
        Self::new(value, Type::Number)
    }

    pub fn string(value: impl Into<String>) -> Self {
        Self::new(value, Type::String)
    }

    pub fn boolean(value: bool) -> Self {
        Self::new(value.to_string(), Type::Boolean)
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn ty(&self) -> &Type {
        &self.ty
    }

    pub fn set_value(&mut self, value: impl Into<String>) {
        self.value = value.into();
    }

    pub fn set_type(&mut self, ty: Type) {
        self.ty = ty;
    }

    pub fn is_undefined(&self) -> bool {
        matches!(self.ty, Type::Undefined) || self.value == consts::UNDEFINED_NAME
    }

    /// Numeric literal equal to zero (`0`, `0.0`, `-0`, `0x0`)
    pub fn is_zero(&self) -> bool {
        if !self.ty.is_number_like() {
            return false;
        }
        let text = self.value.trim().trim_start_matches(['-', '+']);
        let digits = text
            .strip_prefix("0x")
            .or_else(|| text.strip_prefix("0X"))
            .or_else(|| text.strip_prefix("0b"))
            .or_else(|| text.strip_prefix("0o"))
            .unwrap_or(text);
        !digits.is_empty() && digits.chars().all(|c| c == '0' || c == '.' || c == '_')
            && digits.contains('0')
    }
}

impl fmt::Display for Constant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if matches!(self.ty, Type::String | Type::Literal(LiteralType::String(_))) {
            write!(f, "'{}'", self.value)
        } else {
            write!(f, "{}", self.value)
        }
    }
}

/// Anything usable as an operand
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Value {
    Local(Local),
    Constant(Constant),
    Expr(Box<Expr>),
    Ref(Box<Ref>),
}

impl Value {
    /// Sub-values read when evaluating this value, not including itself
    pub fn get_uses(&self) -> Vec<Value> {
        match self {
            Value::Local(_) | Value::Constant(_) => Vec::new(),
            Value::Expr(expr) => expr.get_uses(),
            Value::Ref(r) => r.get_uses(),
        }
    }

    pub fn get_type(&self, locals: &LocalTable) -> Type {
        match self {
            Value::Local(local) => locals.type_of(local),
            Value::Constant(c) => c.ty().clone(),
            Value::Expr(expr) => expr.get_type(locals),
            Value::Ref(r) => r.get_type(locals),
        }
    }

    pub fn as_local(&self) -> Option<&Local> {
        match self {
            Value::Local(local) => Some(local),
            _ => None,
        }
    }

    pub fn as_constant(&self) -> Option<&Constant> {
        match self {
            Value::Constant(c) => Some(c),
            _ => None,
        }
    }

    pub fn as_expr(&self) -> Option<&Expr> {
        match self {
            Value::Expr(expr) => Some(expr),
            _ => None,
        }
    }

    pub fn as_expr_mut(&mut self) -> Option<&mut Expr> {
        match self {
            Value::Expr(expr) => Some(expr),
            _ => None,
        }
    }

    pub fn as_reference(&self) -> Option<&Ref> {
        match self {
            Value::Ref(r) => Some(r),
            _ => None,
        }
    }

    pub fn as_reference_mut(&mut self) -> Option<&mut Ref> {
        match self {
            Value::Ref(r) => Some(r),
            _ => None,
        }
    }

    pub fn is_undefined_constant(&self) -> bool {
        matches!(self, Value::Constant(c) if c.is_undefined())
    }
}

impl From<Local> for Value {
    fn from(local: Local) -> Self {
        Value::Local(local)
    }
}

impl From<Constant> for Value {
    fn from(c: Constant) -> Self {
        Value::Constant(c)
    }
}

impl From<Expr> for Value {
    fn from(expr: Expr) -> Self {
        Value::Expr(Box::new(expr))
    }
}

impl From<Ref> for Value {
    fn from(r: Ref) -> Self {
        Value::Ref(Box::new(r))
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Local(local) => write!(f, "{local}"),
            Value::Constant(c) => write!(f, "{c}"),
            Value::Expr(expr) => write!(f, "{expr}"),
            Value::Ref(r) => write!(f, "{r}"),
        }
    }
}
