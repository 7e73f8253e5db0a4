//! Three-address statements

use super::expr::{ConditionExpr, Expr, InvokeExpr};
use super::position::{FullPosition, LineColPosition};
use super::refs::Ref;
use super::value::{Local, Value};
use crate::error::{IrError, IrResult};
use std::fmt;

/// Index of a statement in its cfg's statement arena
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StmtId(pub usize);

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum StmtKind {
    Assign { left: Value, right: Value },
    Invoke(InvokeExpr),
    If(ConditionExpr),
    Return(Value),
    ReturnVoid,
    Switch { key: Value, cases: Vec<Value> },
    Throw(Value),
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Stmt {
    pub kind: StmtKind,
    pub position: LineColPosition,
    /// Positions of the operands in `get_def` then `get_uses` order
    pub operand_positions: Option<Vec<FullPosition>>,
}

impl Stmt {
    pub fn new(kind: StmtKind) -> Self {
        Self {
            kind,
            position: LineColPosition::DEFAULT,
            operand_positions: None,
        }
    }

    pub fn assign(left: impl Into<Value>, right: impl Into<Value>) -> Self {
        Self::new(StmtKind::Assign {
            left: left.into(),
            right: right.into(),
        })
    }

    pub fn invoke(expr: InvokeExpr) -> Self {
        Self::new(StmtKind::Invoke(expr))
    }

    pub fn if_stmt(condition: ConditionExpr) -> Self {
        Self::new(StmtKind::If(condition))
    }

    pub fn return_value(op: impl Into<Value>) -> Self {
        Self::new(StmtKind::Return(op.into()))
    }

    pub fn return_void() -> Self {
        Self::new(StmtKind::ReturnVoid)
    }

    pub fn switch(key: impl Into<Value>, cases: Vec<Value>) -> Self {
        Self::new(StmtKind::Switch { key: key.into(), cases })
    }

    pub fn throw(op: impl Into<Value>) -> Self {
        Self::new(StmtKind::Throw(op.into()))
    }

    pub fn with_position(mut self, position: LineColPosition) -> Self {
        self.position = position;
        self
    }

    pub fn with_operand_positions(mut self, positions: Vec<FullPosition>) -> Self {
        self.operand_positions = Some(positions);
        self
    }

    /// The value assigned by this statement
    pub fn get_def(&self) -> Option<&Value> {
        match &self.kind {
            StmtKind::Assign { left, .. } => Some(left),
            _ => None,
        }
    }

    pub fn get_def_local(&self) -> Option<&Local> {
        self.get_def().and_then(Value::as_local)
    }

    pub fn get_uses(&self) -> Vec<Value> {
        fn operand(v: &Value) -> Vec<Value> {
            let mut uses = vec![v.clone()];
            uses.extend(v.get_uses());
            uses
        }
        match &self.kind {
            StmtKind::Assign { left, right } => {
                let mut uses = left.get_uses();
                uses.extend(operand(right));
                uses
            }
            StmtKind::Invoke(invoke) => {
                let mut uses = vec![Value::from(Expr::Invoke(invoke.clone()))];
                uses.extend(invoke.get_uses());
                uses
            }
            StmtKind::If(cond) => {
                let mut uses = vec![Value::from(Expr::Condition(cond.clone()))];
                uses.extend(cond.get_uses());
                uses
            }
            StmtKind::Return(op) | StmtKind::Throw(op) => operand(op),
            StmtKind::ReturnVoid => Vec::new(),
            StmtKind::Switch { key, cases } => {
                let mut uses = operand(key);
                for case in cases {
                    uses.extend(operand(case));
                }
                uses
            }
        }
    }

    /// Number of successor blocks a block ending in this statement must have
    pub fn get_expected_successor_count(&self) -> usize {
        match &self.kind {
            StmtKind::If(_) => 2,
            StmtKind::Switch { cases, .. } => cases.len() + 1,
            StmtKind::Return(_) | StmtKind::ReturnVoid | StmtKind::Throw(_) => 0,
            StmtKind::Assign { .. } | StmtKind::Invoke(_) => 1,
        }
    }

    pub fn is_terminator(&self) -> bool {
        matches!(
            self.kind,
            StmtKind::If(_)
                | StmtKind::Switch { .. }
                | StmtKind::Return(_)
                | StmtKind::ReturnVoid
                | StmtKind::Throw(_)
        )
    }

    pub fn is_return(&self) -> bool {
        matches!(self.kind, StmtKind::Return(_) | StmtKind::ReturnVoid)
    }

    pub fn get_invoke_expr(&self) -> Option<&InvokeExpr> {
        match &self.kind {
            StmtKind::Invoke(invoke) => Some(invoke),
            StmtKind::Assign { right, .. } => right.as_expr().and_then(Expr::as_invoke),
            _ => None,
        }
    }

    pub fn get_invoke_expr_mut(&mut self) -> Option<&mut InvokeExpr> {
        match &mut self.kind {
            StmtKind::Invoke(invoke) => Some(invoke),
            StmtKind::Assign { right, .. } => right.as_expr_mut().and_then(Expr::as_invoke_mut),
            _ => None,
        }
    }

    pub fn contains_invoke_expr(&self) -> bool {
        self.get_invoke_expr().is_some()
            || self
                .get_uses()
                .iter()
                .any(|v| matches!(v, Value::Expr(e) if e.as_invoke().is_some()))
    }

    fn find_ref(&self, pred: impl Fn(&Ref) -> bool) -> Option<Ref> {
        let def = self.get_def().and_then(Value::as_reference).filter(|r| pred(r));
        if let Some(r) = def {
            return Some(r.clone());
        }
        self.get_uses()
            .into_iter()
            .find_map(|v| v.as_reference().filter(|r| pred(r)).cloned())
    }

    pub fn get_array_ref(&self) -> Option<Ref> {
        self.find_ref(|r| matches!(r, Ref::Array { .. }))
    }

    pub fn contains_array_ref(&self) -> bool {
        self.get_array_ref().is_some()
    }

    pub fn get_field_ref(&self) -> Option<Ref> {
        self.find_ref(Ref::is_field_ref)
    }

    pub fn contains_field_ref(&self) -> bool {
        self.get_field_ref().is_some()
    }

    pub fn left_op(&self) -> Option<&Value> {
        self.get_def()
    }

    pub fn right_op(&self) -> Option<&Value> {
        match &self.kind {
            StmtKind::Assign { right, .. } => Some(right),
            _ => None,
        }
    }

    pub fn set_left_op(&mut self, value: Value) -> IrResult<()> {
        match &mut self.kind {
            StmtKind::Assign { left, .. } => {
                *left = value;
                Ok(())
            }
            _ => Err(IrError::NotAnAssignment(self.to_string())),
        }
    }

    pub fn set_right_op(&mut self, value: Value) -> IrResult<()> {
        match &mut self.kind {
            StmtKind::Assign { right, .. } => {
                *right = value;
                Ok(())
            }
            _ => Err(IrError::NotAnAssignment(self.to_string())),
        }
    }

    /// Every operand slot of the statement, for in-place rewriting
    pub fn operands_mut(&mut self) -> Vec<&mut Value> {
        match &mut self.kind {
            StmtKind::Assign { left, right } => vec![left, right],
            StmtKind::Invoke(invoke) => {
                let mut ops: Vec<&mut Value> = Vec::new();
                if let super::expr::InvokeKind::Ptr { func_ptr } = &mut invoke.kind {
                    ops.push(func_ptr);
                }
                ops.extend(invoke.args.iter_mut());
                ops
            }
            StmtKind::If(cond) => vec![&mut cond.op1, &mut cond.op2],
            StmtKind::Return(op) | StmtKind::Throw(op) => vec![op],
            StmtKind::ReturnVoid => Vec::new(),
            StmtKind::Switch { key, cases } => {
                let mut ops = vec![key];
                ops.extend(cases.iter_mut());
                ops
            }
        }
    }
}

impl fmt::Display for Stmt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            StmtKind::Assign { left, right } => write!(f, "{left} = {right}"),
            StmtKind::Invoke(invoke) => write!(f, "{invoke}"),
            StmtKind::If(cond) => write!(f, "if {cond}"),
            StmtKind::Return(op) => write!(f, "return {op}"),
            StmtKind::ReturnVoid => write!(f, "return"),
            StmtKind::Switch { key, cases } => {
                write!(f, "switch({key})")?;
                for case in cases {
                    write!(f, " case {case}:")?;
                }
                write!(f, " default:")
            }
            StmtKind::Throw(op) => write!(f, "throw {op}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::expr::{BinaryOperator, NormalBinaryOperator, RelationalBinaryOperator};
    use crate::ir::signature::FieldSignature;
    use crate::ir::types::Type;
    use crate::ir::value::{Constant, LocalTable};
    use proptest::prelude::*;

    #[test]
    fn test_assign_uses_order() {
        let mut locals = LocalTable::new();
        let obj = locals.new_local("obj", Type::Unknown);
        let x = locals.new_local("x", Type::Number);
        let stmt = Stmt::assign(
            Ref::instance_field(obj.clone(), FieldSignature::from_name("f")),
            Expr::binop(
                x.clone().into(),
                Constant::number("1").into(),
                BinaryOperator::Normal(NormalBinaryOperator::Add),
                &locals,
            ),
        );
        let uses = stmt.get_uses();
        assert_eq!(uses[0], Value::Local(obj));
        assert!(matches!(uses[1], Value::Expr(_)));
        assert_eq!(uses[2], Value::Local(x));
        assert!(stmt.contains_field_ref());
        assert!(!stmt.contains_array_ref());
    }

    #[test]
    fn test_set_ops_reject_non_assign() {
        let mut stmt = Stmt::return_void();
        assert!(matches!(
            stmt.set_right_op(Constant::undefined().into()),
            Err(IrError::NotAnAssignment(_))
        ));
    }

    #[test]
    fn test_invoke_detection() {
        let mut locals = LocalTable::new();
        let r = locals.new_local("r", Type::Unknown);
        let call = InvokeExpr::static_call(crate::ir::MethodSignature::from_name("f"), vec![]);
        let assign = Stmt::assign(r, Expr::Invoke(call.clone()));
        assert!(assign.contains_invoke_expr());
        assert_eq!(assign.get_invoke_expr(), Some(&call));
        assert!(Stmt::invoke(call).contains_invoke_expr());
    }

    fn cond() -> ConditionExpr {
        ConditionExpr::new(
            Constant::number("1").into(),
            Constant::number("0").into(),
            RelationalBinaryOperator::InEquality,
        )
    }

    #[test]
    fn test_fixed_successor_counts() {
        assert_eq!(Stmt::if_stmt(cond()).get_expected_successor_count(), 2);
        assert_eq!(Stmt::return_void().get_expected_successor_count(), 0);
        assert_eq!(
            Stmt::return_value(Constant::number("1")).get_expected_successor_count(),
            0
        );
        assert_eq!(Stmt::throw(Constant::string("e")).get_expected_successor_count(), 0);
    }

    proptest! {
        #[test]
        fn prop_switch_has_case_plus_default_successors(n in 0usize..32) {
            let cases = (0..n).map(|i| Value::from(Constant::number(i.to_string()))).collect();
            let stmt = Stmt::switch(Constant::number("0"), cases);
            prop_assert_eq!(stmt.get_expected_successor_count(), n + 1);
        }
    }
}
