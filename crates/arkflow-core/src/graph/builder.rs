//! CFG construction from structured statement trees

use super::basic_block::BlockId;
use super::cfg::Cfg;
use crate::error::{IrError, IrResult};
use crate::ir::{ConditionExpr, MethodSignature, Stmt, StmtKind, Value};
use std::collections::HashSet;
use tracing::trace;

/// A statement with its nested control flow still intact
#[derive(Debug, Clone)]
pub enum StructuredStmt {
    Simple(Stmt),
    If {
        condition: ConditionExpr,
        then_body: Vec<StructuredStmt>,
        else_body: Vec<StructuredStmt>,
    },
    While {
        condition: ConditionExpr,
        body: Vec<StructuredStmt>,
    },
    DoWhile {
        body: Vec<StructuredStmt>,
        condition: ConditionExpr,
    },
    Switch {
        key: Value,
        cases: Vec<SwitchCase>,
        default: Vec<StructuredStmt>,
    },
    Break,
    Continue,
    Return(Option<Value>),
    Throw(Value),
}

#[derive(Debug, Clone)]
pub struct SwitchCase {
    pub value: Value,
    pub body: Vec<StructuredStmt>,
}

/// Builder for constructing a [`Cfg`] from structured statements
///
/// Every `if` block gets its successors in `[then, else]` order and every
/// `switch` block one successor per case followed by the default.
pub struct CfgBuilder {
    cfg: Cfg,
    current_block: BlockId,
    loop_stack: Vec<LoopContext>,
    /// Blocks whose outgoing edges are final
    sealed: HashSet<BlockId>,
}

struct LoopContext {
    /// `None` for a switch, which only captures `break`
    continue_block: Option<BlockId>,
    break_block: BlockId,
}

impl CfgBuilder {
    pub fn new() -> Self {
        let mut cfg = Cfg::new();
        let entry = cfg.new_block();
        Self {
            cfg,
            current_block: entry,
            loop_stack: Vec::new(),
            sealed: HashSet::new(),
        }
    }

    pub fn with_declaring_method(mut self, signature: MethodSignature) -> Self {
        self.cfg.set_declaring_method(signature);
        self
    }

    /// Build the graph of a method body
    ///
    /// Falling off the end adds a `return`. Blocks unreachable from the entry
    /// are dropped before the successor counts are checked.
    pub fn build(mut self, body: &[StructuredStmt]) -> IrResult<Cfg> {
        let entry = self.current_block;
        self.build_body(body)?;

        if self.is_open(self.current_block) {
            self.push(Stmt::return_void())?;
            self.seal(self.current_block);
        }

        self.prune_unreachable(entry);
        if let Some(start) = self.first_stmt_from(entry) {
            self.cfg.set_starting_stmt(start);
        }
        self.cfg.validate()?;
        trace!(blocks = self.cfg.block_count(), "built cfg");
        Ok(self.cfg)
    }

    fn build_body(&mut self, stmts: &[StructuredStmt]) -> IrResult<()> {
        for stmt in stmts {
            self.build_stmt(stmt)?;
        }
        Ok(())
    }

    fn build_stmt(&mut self, stmt: &StructuredStmt) -> IrResult<()> {
        match stmt {
            StructuredStmt::Simple(s) => {
                let terminates = matches!(s.kind, StmtKind::Return(_) | StmtKind::ReturnVoid | StmtKind::Throw(_));
                self.push(s.clone())?;
                if terminates {
                    self.terminate();
                }
            }
            StructuredStmt::If {
                condition,
                then_body,
                else_body,
            } => self.build_if(condition, then_body, else_body)?,
            StructuredStmt::While { condition, body } => self.build_while(condition, body)?,
            StructuredStmt::DoWhile { body, condition } => self.build_do_while(body, condition)?,
            StructuredStmt::Switch { key, cases, default } => self.build_switch(key, cases, default)?,
            StructuredStmt::Break => {
                let target = self
                    .loop_stack
                    .last()
                    .map(|ctx| ctx.break_block)
                    .ok_or(IrError::JumpOutsideLoop("break"))?;
                self.jump(target)?;
            }
            StructuredStmt::Continue => {
                let target = self
                    .loop_stack
                    .iter()
                    .rev()
                    .find_map(|ctx| ctx.continue_block)
                    .ok_or(IrError::JumpOutsideLoop("continue"))?;
                self.jump(target)?;
            }
            StructuredStmt::Return(value) => {
                let ret = match value {
                    Some(v) => Stmt::return_value(v.clone()),
                    None => Stmt::return_void(),
                };
                self.push(ret)?;
                self.terminate();
            }
            StructuredStmt::Throw(value) => {
                self.push(Stmt::throw(value.clone()))?;
                self.terminate();
            }
        }
        Ok(())
    }

    fn build_if(
        &mut self,
        condition: &ConditionExpr,
        then_body: &[StructuredStmt],
        else_body: &[StructuredStmt],
    ) -> IrResult<()> {
        self.push(Stmt::if_stmt(condition.clone()))?;
        let cond_block = self.current_block;
        let then_block = self.cfg.new_block();
        let merge_block = self.cfg.new_block();
        let else_block = if else_body.is_empty() {
            merge_block
        } else {
            self.cfg.new_block()
        };

        self.cfg.link(cond_block, then_block)?;
        self.cfg.link(cond_block, else_block)?;
        self.seal(cond_block);

        self.current_block = then_block;
        self.build_body(then_body)?;
        self.fall_through(merge_block)?;

        if else_block != merge_block {
            self.current_block = else_block;
            self.build_body(else_body)?;
            self.fall_through(merge_block)?;
        }

        self.current_block = merge_block;
        Ok(())
    }

    fn build_while(&mut self, condition: &ConditionExpr, body: &[StructuredStmt]) -> IrResult<()> {
        let header_block = self.loop_header()?;
        self.push(Stmt::if_stmt(condition.clone()))?;
        let body_block = self.cfg.new_block();
        let exit_block = self.cfg.new_block();
        self.cfg.link(header_block, body_block)?;
        self.cfg.link(header_block, exit_block)?;
        self.seal(header_block);

        self.loop_stack.push(LoopContext {
            continue_block: Some(header_block),
            break_block: exit_block,
        });
        self.current_block = body_block;
        let built = self.build_body(body);
        self.loop_stack.pop();
        built?;

        // back edge
        self.fall_through(header_block)?;
        self.current_block = exit_block;
        Ok(())
    }

    fn build_do_while(&mut self, body: &[StructuredStmt], condition: &ConditionExpr) -> IrResult<()> {
        let body_block = self.loop_header()?;
        let cond_block = self.cfg.new_block();
        let exit_block = self.cfg.new_block();

        self.loop_stack.push(LoopContext {
            continue_block: Some(cond_block),
            break_block: exit_block,
        });
        let built = self.build_body(body);
        self.loop_stack.pop();
        built?;
        self.fall_through(cond_block)?;

        self.current_block = cond_block;
        self.push(Stmt::if_stmt(condition.clone()))?;
        self.cfg.link(cond_block, body_block)?;
        self.cfg.link(cond_block, exit_block)?;
        self.seal(cond_block);

        self.current_block = exit_block;
        Ok(())
    }

    fn build_switch(&mut self, key: &Value, cases: &[SwitchCase], default: &[StructuredStmt]) -> IrResult<()> {
        let case_values = cases.iter().map(|c| c.value.clone()).collect();
        self.push(Stmt::switch(key.clone(), case_values))?;
        let switch_block = self.current_block;

        let case_blocks: Vec<BlockId> = cases.iter().map(|_| self.cfg.new_block()).collect();
        let default_block = self.cfg.new_block();
        let exit_block = self.cfg.new_block();
        for &case_block in &case_blocks {
            self.cfg.link(switch_block, case_block)?;
        }
        self.cfg.link(switch_block, default_block)?;
        self.seal(switch_block);

        self.loop_stack.push(LoopContext {
            continue_block: None,
            break_block: exit_block,
        });
        let mut built = Ok(());
        for (i, case) in cases.iter().enumerate() {
            self.current_block = case_blocks[i];
            built = self.build_body(&case.body);
            if built.is_err() {
                break;
            }
            // cases without `break` fall into the next one
            let next = case_blocks.get(i + 1).copied().unwrap_or(default_block);
            built = self.fall_through(next);
            if built.is_err() {
                break;
            }
        }
        if built.is_ok() {
            self.current_block = default_block;
            built = self.build_body(default);
        }
        self.loop_stack.pop();
        built?;
        self.fall_through(exit_block)?;

        self.current_block = exit_block;
        Ok(())
    }

    /// Block to hold a loop condition: the current block when it is still
    /// empty, a fresh one otherwise
    fn loop_header(&mut self) -> IrResult<BlockId> {
        let current = self.current_block;
        let reusable = self.is_open(current) && self.cfg.block(current).is_some_and(|b| b.is_empty());
        if reusable {
            return Ok(current);
        }
        let header = self.cfg.new_block();
        self.fall_through(header)?;
        self.current_block = header;
        Ok(header)
    }

    fn push(&mut self, stmt: Stmt) -> IrResult<()> {
        self.cfg.push_stmt(self.current_block, stmt).map(|_| ())
    }

    fn is_open(&self, block: BlockId) -> bool {
        !self.sealed.contains(&block)
    }

    fn seal(&mut self, block: BlockId) {
        self.sealed.insert(block);
    }

    /// Link the current block to `target` unless control already left it
    fn fall_through(&mut self, target: BlockId) -> IrResult<()> {
        if self.is_open(self.current_block) {
            self.cfg.link(self.current_block, target)?;
            self.seal(self.current_block);
        }
        Ok(())
    }

    fn jump(&mut self, target: BlockId) -> IrResult<()> {
        self.fall_through(target)?;
        self.current_block = self.cfg.new_block();
        Ok(())
    }

    /// Close the current block; code after it lands in an unreachable block
    fn terminate(&mut self) {
        self.seal(self.current_block);
        self.current_block = self.cfg.new_block();
    }

    fn prune_unreachable(&mut self, entry: BlockId) {
        let mut reachable = HashSet::new();
        let mut stack = vec![entry];
        while let Some(id) = stack.pop() {
            if !reachable.insert(id) {
                continue;
            }
            if let Some(block) = self.cfg.block(id) {
                stack.extend(block.successors().iter().copied());
            }
        }
        for id in self.cfg.block_ids() {
            if !reachable.contains(&id) {
                self.cfg.remove_block(id);
            }
        }
    }

    fn first_stmt_from(&self, entry: BlockId) -> Option<crate::ir::StmtId> {
        let mut visited = HashSet::new();
        let mut current = Some(entry);
        while let Some(id) = current {
            if !visited.insert(id) {
                return None;
            }
            let block = self.cfg.block(id)?;
            if let Some(head) = block.head() {
                return Some(head);
            }
            current = block.successors().first().copied();
        }
        None
    }
}

impl Default for CfgBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::{
        BinaryOperator, Constant, Expr, LocalTable, NormalBinaryOperator, RelationalBinaryOperator, StmtId, Type,
    };
    use proptest::prelude::*;

    fn gt_zero(v: Value) -> ConditionExpr {
        ConditionExpr::new(v, Constant::number("0").into(), RelationalBinaryOperator::GreaterThan)
    }

    fn assign_const(locals: &mut LocalTable, name: &str, value: &str) -> StructuredStmt {
        let local = locals.new_local(name, Type::Number);
        StructuredStmt::Simple(Stmt::assign(local, Constant::number(value)))
    }

    fn tail_kind(cfg: &Cfg, block: BlockId) -> Option<StmtKind> {
        cfg.block(block)?.tail().and_then(|t| cfg.stmt(t)).map(|s| s.kind.clone())
    }

    #[test]
    fn test_empty_body_gets_return() {
        let cfg = CfgBuilder::new().build(&[]).unwrap();
        assert_eq!(cfg.block_count(), 1);
        let start = cfg.starting_stmt().unwrap();
        assert_eq!(cfg.stmt(start).unwrap().kind, StmtKind::ReturnVoid);
        assert_eq!(cfg.starting_block(), Some(BlockId(0)));
    }

    #[test]
    fn test_if_blocks_have_two_successors() {
        let mut locals = LocalTable::new();
        let x = locals.new_local("x", Type::Number);
        let body = vec![StructuredStmt::If {
            condition: gt_zero(x.into()),
            then_body: vec![assign_const(&mut locals, "y", "1")],
            else_body: vec![],
        }];
        let cfg = CfgBuilder::new().build(&body).unwrap();
        let if_blocks: Vec<_> = cfg
            .blocks()
            .filter(|b| matches!(tail_kind(&cfg, b.id), Some(StmtKind::If(_))))
            .collect();
        assert_eq!(if_blocks.len(), 1);
        assert_eq!(if_blocks[0].successors().len(), 2);
    }

    #[test]
    fn test_if_with_returning_branches_drops_dead_merge() {
        let mut locals = LocalTable::new();
        let x = locals.new_local("x", Type::Number);
        let body = vec![StructuredStmt::If {
            condition: gt_zero(x.clone().into()),
            then_body: vec![StructuredStmt::Return(Some(Constant::number("1").into()))],
            else_body: vec![StructuredStmt::Return(Some(x.into()))],
        }];
        let cfg = CfgBuilder::new().build(&body).unwrap();
        assert_eq!(cfg.block_count(), 3);
        assert_eq!(cfg.return_stmts().len(), 2);
    }

    #[test]
    fn test_while_loop_has_back_edge() {
        let mut locals = LocalTable::new();
        let i = locals.new_local("i", Type::Number);
        let dec = Expr::binop(
            i.clone().into(),
            Constant::number("1").into(),
            BinaryOperator::Normal(NormalBinaryOperator::Sub),
            &locals,
        );
        let body = vec![
            StructuredStmt::Simple(Stmt::assign(i.clone(), Constant::number("3"))),
            StructuredStmt::While {
                condition: gt_zero(i.clone().into()),
                body: vec![StructuredStmt::Simple(Stmt::assign(i.clone(), dec))],
            },
        ];
        let cfg = CfgBuilder::new().build(&body).unwrap();
        let header = cfg
            .blocks()
            .find(|b| matches!(tail_kind(&cfg, b.id), Some(StmtKind::If(_))))
            .unwrap();
        let body_block = header.successors()[0];
        assert!(cfg.block(body_block).unwrap().successors().contains(&header.id));
    }

    #[test]
    fn test_while_reuses_empty_entry() {
        let mut locals = LocalTable::new();
        let i = locals.new_local("i", Type::Number);
        let body = vec![StructuredStmt::While {
            condition: gt_zero(i.into()),
            body: vec![StructuredStmt::Break],
        }];
        let cfg = CfgBuilder::new().build(&body).unwrap();
        assert!(matches!(tail_kind(&cfg, BlockId(0)), Some(StmtKind::If(_))));
    }

    #[test]
    fn test_do_while_and_continue() {
        let mut locals = LocalTable::new();
        let i = locals.new_local("i", Type::Number);
        let body = vec![StructuredStmt::DoWhile {
            body: vec![
                assign_const(&mut locals, "a", "1"),
                StructuredStmt::If {
                    condition: gt_zero(i.clone().into()),
                    then_body: vec![StructuredStmt::Continue],
                    else_body: vec![],
                },
                assign_const(&mut locals, "b", "2"),
            ],
            condition: gt_zero(i.into()),
        }];
        let cfg = CfgBuilder::new().build(&body).unwrap();
        assert!(cfg.validate().is_ok());
        let loop_cond = cfg
            .blocks()
            .filter(|b| matches!(tail_kind(&cfg, b.id), Some(StmtKind::If(_))))
            .find(|b| b.successors().contains(&BlockId(0)))
            .unwrap();
        // `continue` and the end of the body both reach the condition
        assert_eq!(loop_cond.predecessors().len(), 2);
    }

    #[test]
    fn test_switch_fallthrough_and_break() {
        let mut locals = LocalTable::new();
        let k = locals.new_local("k", Type::Number);
        let body = vec![StructuredStmt::Switch {
            key: k.into(),
            cases: vec![
                SwitchCase {
                    value: Constant::number("1").into(),
                    body: vec![assign_const(&mut locals, "a", "1")],
                },
                SwitchCase {
                    value: Constant::number("2").into(),
                    body: vec![assign_const(&mut locals, "b", "2"), StructuredStmt::Break],
                },
            ],
            default: vec![assign_const(&mut locals, "c", "3")],
        }];
        let cfg = CfgBuilder::new().build(&body).unwrap();
        let switch_block = cfg.block(BlockId(0)).unwrap();
        assert_eq!(switch_block.successors().len(), 3);
        let first_case = cfg.block(switch_block.successors()[0]).unwrap();
        assert_eq!(first_case.successors(), &[switch_block.successors()[1]]);
    }

    #[test]
    fn test_break_outside_loop_is_rejected() {
        let result = CfgBuilder::new().build(&[StructuredStmt::Break]);
        assert!(matches!(result, Err(IrError::JumpOutsideLoop("break"))));
    }

    #[test]
    fn test_throw_block_has_no_successors() {
        let cfg = CfgBuilder::new()
            .build(&[StructuredStmt::Throw(Constant::string("boom").into())])
            .unwrap();
        let start = cfg.starting_block().unwrap();
        assert!(cfg.block(start).unwrap().successors().is_empty());
        assert_eq!(cfg.stmt(StmtId(0)).unwrap().get_expected_successor_count(), 0);
    }

    fn structured(depth: u32) -> BoxedStrategy<StructuredStmt> {
        let leaf = prop_oneof![
            Just(StructuredStmt::Simple(Stmt::return_value(Constant::number("1")))),
            Just(StructuredStmt::Simple(Stmt::invoke(crate::ir::InvokeExpr::static_call(
                MethodSignature::from_name("f"),
                vec![],
            )))),
        ];
        if depth == 0 {
            return leaf.boxed();
        }
        let inner = proptest::collection::vec(structured(depth - 1), 0..3);
        let cond = || gt_zero(Constant::number("1").into());
        prop_oneof![
            leaf,
            (inner.clone(), inner.clone()).prop_map(move |(t, e)| StructuredStmt::If {
                condition: cond(),
                then_body: t,
                else_body: e,
            }),
            inner.clone().prop_map(move |b| StructuredStmt::While {
                condition: cond(),
                body: b,
            }),
            (1usize..4, inner).prop_map(|(n, b)| StructuredStmt::Switch {
                key: Constant::number("0").into(),
                cases: (0..n)
                    .map(|i| SwitchCase {
                        value: Constant::number(i.to_string()).into(),
                        body: b.clone(),
                    })
                    .collect(),
                default: vec![],
            }),
        ]
        .boxed()
    }

    proptest! {
        #[test]
        fn prop_built_cfgs_respect_successor_counts(body in proptest::collection::vec(structured(2), 0..4)) {
            let cfg = CfgBuilder::new().build(&body).unwrap();
            for block in cfg.blocks() {
                if let Some(tail) = block.tail().and_then(|t| cfg.stmt(t)) {
                    match &tail.kind {
                        StmtKind::If(_) => prop_assert_eq!(block.successors().len(), 2),
                        StmtKind::Switch { cases, .. } => prop_assert_eq!(block.successors().len(), cases.len() + 1),
                        StmtKind::Return(_) | StmtKind::ReturnVoid | StmtKind::Throw(_) => {
                            prop_assert_eq!(block.successors().len(), 0)
                        }
                        _ => prop_assert!(block.successors().len() <= 1),
                    }
                }
            }
        }
    }
}
