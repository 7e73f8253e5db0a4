//! Expressions: invocations, allocation, operators and casts

use super::consts::builtin;
use super::signature::MethodSignature;
use super::types::Type;
use super::value::{Local, LocalTable, Value};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NormalBinaryOperator {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    Exp,
    BitAnd,
    BitOr,
    BitXor,
    LeftShift,
    RightShift,
    UnsignedRightShift,
    LogicalAnd,
    LogicalOr,
    NullishCoalescing,
}

impl NormalBinaryOperator {
    pub const ALL: [NormalBinaryOperator; 15] = [
        Self::Add,
        Self::Sub,
        Self::Mul,
        Self::Div,
        Self::Rem,
        Self::Exp,
        Self::BitAnd,
        Self::BitOr,
        Self::BitXor,
        Self::LeftShift,
        Self::RightShift,
        Self::UnsignedRightShift,
        Self::LogicalAnd,
        Self::LogicalOr,
        Self::NullishCoalescing,
    ];

    pub fn symbol(self) -> &'static str {
        match self {
            Self::Add => "+",
            Self::Sub => "-",
            Self::Mul => "*",
            Self::Div => "/",
            Self::Rem => "%",
            Self::Exp => "**",
            Self::BitAnd => "&",
            Self::BitOr => "|",
            Self::BitXor => "^",
            Self::LeftShift => "<<",
            Self::RightShift => ">>",
            Self::UnsignedRightShift => ">>>",
            Self::LogicalAnd => "&&",
            Self::LogicalOr => "||",
            Self::NullishCoalescing => "??",
        }
    }

    /// Operators whose result is numeric when both sides are numbers
    pub fn is_arithmetic(self) -> bool {
        !matches!(self, Self::LogicalAnd | Self::LogicalOr | Self::NullishCoalescing)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RelationalBinaryOperator {
    LessThan,
    LessThanOrEqual,
    GreaterThan,
    GreaterThanOrEqual,
    Equality,
    InEquality,
    StrictEquality,
    StrictInequality,
}

impl RelationalBinaryOperator {
    pub const ALL: [RelationalBinaryOperator; 8] = [
        Self::LessThan,
        Self::LessThanOrEqual,
        Self::GreaterThan,
        Self::GreaterThanOrEqual,
        Self::Equality,
        Self::InEquality,
        Self::StrictEquality,
        Self::StrictInequality,
    ];

    pub fn symbol(self) -> &'static str {
        match self {
            Self::LessThan => "<",
            Self::LessThanOrEqual => "<=",
            Self::GreaterThan => ">",
            Self::GreaterThanOrEqual => ">=",
            Self::Equality => "==",
            Self::InEquality => "!=",
            Self::StrictEquality => "===",
            Self::StrictInequality => "!==",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOperator {
    Normal(NormalBinaryOperator),
    Relational(RelationalBinaryOperator),
}

impl BinaryOperator {
    pub fn symbol(self) -> &'static str {
        match self {
            BinaryOperator::Normal(op) => op.symbol(),
            BinaryOperator::Relational(op) => op.symbol(),
        }
    }

    pub fn is_division(self) -> bool {
        matches!(
            self,
            BinaryOperator::Normal(NormalBinaryOperator::Div | NormalBinaryOperator::Rem)
        )
    }
}

impl fmt::Display for BinaryOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnaryOperator {
    Neg,
    BitwiseNot,
    LogicalNot,
}

impl UnaryOperator {
    pub fn symbol(self) -> &'static str {
        match self {
            UnaryOperator::Neg => "-",
            UnaryOperator::BitwiseNot => "~",
            UnaryOperator::LogicalNot => "!",
        }
    }
}

/// Result type of `op1 <operator> op2`
///
/// Pure in its three inputs. Combinations it does not recognize give
/// `Type::Unknown`.
pub fn binop_result_type(operator: BinaryOperator, op1: &Type, op2: &Type) -> Type {
    let left = op1.widen();
    let right = op2.widen();
    let op = match operator {
        BinaryOperator::Relational(_) => return Type::Boolean,
        BinaryOperator::Normal(op) => op,
    };
    match op {
        NormalBinaryOperator::LogicalAnd | NormalBinaryOperator::LogicalOr => Type::Boolean,
        NormalBinaryOperator::NullishCoalescing => {
            if matches!(left, Type::Unknown | Type::Undefined | Type::Null) {
                right
            } else {
                left
            }
        }
        _ if left == Type::String || right == Type::String => Type::String,
        _ if left == Type::Number && right == Type::Number => Type::Number,
        _ if left == Type::BigInt && right == Type::BigInt => Type::BigInt,
        _ => Type::Unknown,
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum InvokeKind {
    /// `base.method(args)`
    Instance { base: Local },
    /// `method(args)` or `Class.method(args)`
    Static,
    /// Call through a function-typed value
    Ptr { func_ptr: Value },
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct InvokeExpr {
    pub kind: InvokeKind,
    pub method_signature: MethodSignature,
    pub args: Vec<Value>,
    pub real_generic_types: Option<Vec<Type>>,
}

impl InvokeExpr {
    pub fn instance(base: Local, method_signature: MethodSignature, args: Vec<Value>) -> Self {
        Self {
            kind: InvokeKind::Instance { base },
            method_signature,
            args,
            real_generic_types: None,
        }
    }

    pub fn static_call(method_signature: MethodSignature, args: Vec<Value>) -> Self {
        Self {
            kind: InvokeKind::Static,
            method_signature,
            args,
            real_generic_types: None,
        }
    }

    pub fn ptr(func_ptr: Value, method_signature: MethodSignature, args: Vec<Value>) -> Self {
        Self {
            kind: InvokeKind::Ptr { func_ptr },
            method_signature,
            args,
            real_generic_types: None,
        }
    }

    pub fn with_real_generic_types(mut self, types: Vec<Type>) -> Self {
        self.real_generic_types = Some(types);
        self
    }

    pub fn base(&self) -> Option<&Local> {
        match &self.kind {
            InvokeKind::Instance { base } => Some(base),
            _ => None,
        }
    }

    pub fn is_static(&self) -> bool {
        matches!(self.kind, InvokeKind::Static)
    }

    pub fn get_uses(&self) -> Vec<Value> {
        let mut uses = Vec::new();
        match &self.kind {
            InvokeKind::Instance { base } => uses.push(Value::Local(base.clone())),
            InvokeKind::Ptr { func_ptr } => {
                uses.push(func_ptr.clone());
                uses.extend(func_ptr.get_uses());
            }
            InvokeKind::Static => {}
        }
        for arg in &self.args {
            uses.push(arg.clone());
            uses.extend(arg.get_uses());
        }
        uses
    }

    /// Return type of the call with generic parameters substituted
    ///
    /// Bindings on the call take precedence over those of an instance base.
    pub fn get_type(&self, locals: &LocalTable) -> Type {
        let ret = self.method_signature.return_type();
        if let Some(real) = &self.real_generic_types {
            return ret.substitute_generics(real);
        }
        if let InvokeKind::Instance { base } = &self.kind {
            let base_ty = locals.type_of(base);
            if let Some(real) = base_ty.unwrap_alias().real_generic_types() {
                return ret.substitute_generics(real);
            }
        }
        ret.clone()
    }
}

impl fmt::Display for InvokeExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            InvokeKind::Instance { base } => write!(f, "instanceinvoke {base}.<{}>(", self.method_signature)?,
            InvokeKind::Static => write!(f, "staticinvoke <{}>(", self.method_signature)?,
            InvokeKind::Ptr { .. } => write!(f, "ptrinvoke <{}>(", self.method_signature)?,
        }
        for (i, arg) in self.args.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{arg}")?;
        }
        write!(f, ")")
    }
}

/// Binary comparison used as the condition of an `if`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ConditionExpr {
    pub op1: Value,
    pub op2: Value,
    pub operator: RelationalBinaryOperator,
}

impl ConditionExpr {
    pub fn new(op1: Value, op2: Value, operator: RelationalBinaryOperator) -> Self {
        Self { op1, op2, operator }
    }

    pub fn get_uses(&self) -> Vec<Value> {
        let mut uses = vec![self.op1.clone()];
        uses.extend(self.op1.get_uses());
        uses.push(self.op2.clone());
        uses.extend(self.op2.get_uses());
        uses
    }
}

impl fmt::Display for ConditionExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.op1, self.operator.symbol(), self.op2)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Expr {
    Invoke(InvokeExpr),
    New {
        class_type: Type,
    },
    NewArray {
        base_type: Type,
        size: Value,
        from_literal: bool,
    },
    Delete(Value),
    Await(Value),
    Yield(Value),
    TypeOf(Value),
    InstanceOf {
        op: Value,
        check_type: Type,
    },
    Cast {
        op: Value,
        ty: Type,
    },
    Phi {
        args: Vec<Local>,
        ty: Type,
    },
    Unop {
        op: Value,
        operator: UnaryOperator,
    },
    Binop {
        op1: Value,
        op2: Value,
        operator: BinaryOperator,
        ty: Type,
    },
    Condition(ConditionExpr),
}

impl Expr {
    /// Binary expression with its type computed from the operand types
    pub fn binop(op1: Value, op2: Value, operator: BinaryOperator, locals: &LocalTable) -> Expr {
        let ty = binop_result_type(operator, &op1.get_type(locals), &op2.get_type(locals));
        Expr::Binop { op1, op2, operator, ty }
    }

    /// Recompute the type of a `Binop` from its current operands
    pub fn set_binop_type(&mut self, locals: &LocalTable) {
        if let Expr::Binop { op1, op2, operator, ty } = self {
            *ty = binop_result_type(*operator, &op1.get_type(locals), &op2.get_type(locals));
        }
    }

    pub fn as_invoke(&self) -> Option<&InvokeExpr> {
        match self {
            Expr::Invoke(invoke) => Some(invoke),
            _ => None,
        }
    }

    pub fn as_invoke_mut(&mut self) -> Option<&mut InvokeExpr> {
        match self {
            Expr::Invoke(invoke) => Some(invoke),
            _ => None,
        }
    }

    pub fn get_uses(&self) -> Vec<Value> {
        fn operand(v: &Value) -> Vec<Value> {
            let mut uses = vec![v.clone()];
            uses.extend(v.get_uses());
            uses
        }
        match self {
            Expr::Invoke(invoke) => invoke.get_uses(),
            Expr::New { .. } => Vec::new(),
            Expr::NewArray { size, .. } => operand(size),
            Expr::Delete(op)
            | Expr::Await(op)
            | Expr::Yield(op)
            | Expr::TypeOf(op)
            | Expr::InstanceOf { op, .. }
            | Expr::Cast { op, .. }
            | Expr::Unop { op, .. } => operand(op),
            Expr::Phi { args, .. } => args.iter().cloned().map(Value::Local).collect(),
            Expr::Binop { op1, op2, .. } => {
                let mut uses = operand(op1);
                uses.extend(operand(op2));
                uses
            }
            Expr::Condition(cond) => cond.get_uses(),
        }
    }

    pub fn get_type(&self, locals: &LocalTable) -> Type {
        match self {
            Expr::Invoke(invoke) => invoke.get_type(locals),
            Expr::New { class_type } => class_type.clone(),
            Expr::NewArray { base_type, .. } => Type::array_of(base_type.clone()),
            Expr::Delete(_) | Expr::InstanceOf { .. } | Expr::Condition(_) => Type::Boolean,
            Expr::Await(op) => {
                let ty = op.get_type(locals);
                let unwrapped = ty.unwrap_alias();
                if unwrapped.is_builtin_class(builtin::PROMISE) {
                    unwrapped
                        .real_generic_types()
                        .and_then(|g| g.first().cloned())
                        .unwrap_or(Type::Unknown)
                } else {
                    ty
                }
            }
            Expr::Yield(op) => op.get_type(locals),
            Expr::TypeOf(_) => Type::String,
            Expr::Cast { ty, .. } | Expr::Phi { ty, .. } | Expr::Binop { ty, .. } => ty.clone(),
            Expr::Unop { op, operator } => match operator {
                UnaryOperator::LogicalNot => Type::Boolean,
                _ => op.get_type(locals).widen(),
            },
        }
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Invoke(invoke) => write!(f, "{invoke}"),
            Expr::New { class_type } => write!(f, "new {class_type}"),
            Expr::NewArray { base_type, size, .. } => write!(f, "newarray ({base_type})[{size}]"),
            Expr::Delete(op) => write!(f, "delete {op}"),
            Expr::Await(op) => write!(f, "await {op}"),
            Expr::Yield(op) => write!(f, "yield {op}"),
            Expr::TypeOf(op) => write!(f, "typeof {op}"),
            Expr::InstanceOf { op, check_type } => write!(f, "{op} instanceof {check_type}"),
            Expr::Cast { op, ty } => write!(f, "<{ty}>{op}"),
            Expr::Phi { args, .. } => {
                write!(f, "phi(")?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{arg}")?;
                }
                write!(f, ")")
            }
            Expr::Unop { op, operator } => write!(f, "{}{op}", operator.symbol()),
            Expr::Binop { op1, op2, operator, .. } => write!(f, "{op1} {operator} {op2}"),
            Expr::Condition(cond) => write!(f, "{cond}"),
        }
    }
}
