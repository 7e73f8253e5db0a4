//! Def-use chains
//!
//! Uses are tied to definitions by rendered name: two locals printing the
//! same are treated as one variable. The nearest definition scanning backward
//! in the block wins; without one, every predecessor path is searched and
//! each reaching definition yields its own chain.

use super::basic_block::BlockId;
use super::cfg::Cfg;
use crate::ir::{StmtId, Value};
use std::collections::HashSet;
use tracing::trace;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DefUseChain {
    pub value: Value,
    pub def: StmtId,
    pub use_stmt: StmtId,
}

impl Cfg {
    pub fn def_use_chains(&self) -> &[DefUseChain] {
        &self.def_use_chains
    }

    /// Recompute the def-use chains of the whole graph
    pub fn build_def_use_chain(&mut self) {
        let mut chains = Vec::new();
        for block_id in self.block_ids() {
            let Some(block) = self.block(block_id) else {
                continue;
            };
            for (index, &use_stmt) in block.stmts().iter().enumerate() {
                let Some(stmt) = self.stmt(use_stmt) else {
                    continue;
                };
                for value in stmt.get_uses() {
                    let name = value.to_string();
                    let local_def = block.stmts()[..index]
                        .iter()
                        .rev()
                        .copied()
                        .find(|&s| self.defines(s, &name));
                    let defs = match local_def {
                        Some(def) => vec![def],
                        None => self.reaching_defs_from_predecessors(block_id, &name),
                    };
                    for def in defs {
                        chains.push(DefUseChain {
                            value: value.clone(),
                            def,
                            use_stmt,
                        });
                    }
                }
            }
        }
        trace!(chains = chains.len(), "built def-use chains");
        self.def_use_chains = chains;
    }

    fn defines(&self, stmt: StmtId, name: &str) -> bool {
        self.stmt(stmt)
            .and_then(|s| s.get_def())
            .is_some_and(|def| def.to_string() == name)
    }

    /// Walk predecessor blocks; a path stops at the last definition of its block
    fn reaching_defs_from_predecessors(&self, block: BlockId, name: &str) -> Vec<StmtId> {
        let mut defs = Vec::new();
        let mut walked: HashSet<BlockId> = HashSet::new();
        let mut pending: Vec<BlockId> = self
            .block(block)
            .map(|b| b.predecessors().to_vec())
            .unwrap_or_default();

        while let Some(pred_id) = pending.pop() {
            if !walked.insert(pred_id) {
                continue;
            }
            let Some(pred) = self.block(pred_id) else {
                continue;
            };
            match pred.stmts().iter().rev().copied().find(|&s| self.defines(s, name)) {
                Some(def) => {
                    if !defs.contains(&def) {
                        defs.push(def);
                    }
                }
                None => {
                    for &more in pred.predecessors() {
                        if !walked.contains(&more) && !pending.contains(&more) {
                            pending.insert(0, more);
                        }
                    }
                }
            }
        }
        defs
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::{
        BinaryOperator, ConditionExpr, Constant, Expr, LocalTable, NormalBinaryOperator, RelationalBinaryOperator,
        Stmt, Type,
    };

    fn cond(v: Value) -> ConditionExpr {
        ConditionExpr::new(v, Constant::number("0").into(), RelationalBinaryOperator::GreaterThan)
    }

    #[test]
    fn test_nearest_def_in_block_wins() {
        let mut locals = LocalTable::new();
        let x = locals.new_local("x", Type::Number);
        let mut cfg = Cfg::new();
        let b = cfg.new_block();
        let _first = cfg.push_stmt(b, Stmt::assign(x.clone(), Constant::number("1"))).unwrap();
        let second = cfg.push_stmt(b, Stmt::assign(x.clone(), Constant::number("2"))).unwrap();
        let ret = cfg.push_stmt(b, Stmt::return_value(x.clone())).unwrap();
        cfg.build_def_use_chain();

        let chains: Vec<_> = cfg.def_use_chains().iter().filter(|c| c.use_stmt == ret).collect();
        assert_eq!(chains.len(), 1);
        assert_eq!(chains[0].def, second);
        assert_eq!(chains[0].value, Value::Local(x));
    }

    #[test]
    fn test_defs_from_both_branches_reach_join() {
        let mut locals = LocalTable::new();
        let c = locals.new_local("c", Type::Number);
        let x = locals.new_local("x", Type::Number);
        let mut cfg = Cfg::new();
        let entry = cfg.new_block();
        let then_b = cfg.new_block();
        let else_b = cfg.new_block();
        let join = cfg.new_block();
        cfg.push_stmt(entry, Stmt::if_stmt(cond(c.into()))).unwrap();
        let d1 = cfg.push_stmt(then_b, Stmt::assign(x.clone(), Constant::number("1"))).unwrap();
        let d2 = cfg.push_stmt(else_b, Stmt::assign(x.clone(), Constant::number("2"))).unwrap();
        let ret = cfg.push_stmt(join, Stmt::return_value(x.clone())).unwrap();
        cfg.link(entry, then_b).unwrap();
        cfg.link(entry, else_b).unwrap();
        cfg.link(then_b, join).unwrap();
        cfg.link(else_b, join).unwrap();
        cfg.build_def_use_chain();

        let mut defs: Vec<StmtId> = cfg
            .def_use_chains()
            .iter()
            .filter(|ch| ch.use_stmt == ret)
            .map(|ch| ch.def)
            .collect();
        defs.sort();
        assert_eq!(defs, vec![d1, d2]);
    }

    #[test]
    fn test_loop_terminates_and_finds_back_edge_def() {
        let mut locals = LocalTable::new();
        let i = locals.new_local("i", Type::Number);
        let mut cfg = Cfg::new();
        let entry = cfg.new_block();
        let header = cfg.new_block();
        let body = cfg.new_block();
        let exit = cfg.new_block();
        let init = cfg.push_stmt(entry, Stmt::assign(i.clone(), Constant::number("0"))).unwrap();
        let check = cfg.push_stmt(header, Stmt::if_stmt(cond(i.clone().into()))).unwrap();
        let add = Expr::binop(
            i.clone().into(),
            Constant::number("1").into(),
            BinaryOperator::Normal(NormalBinaryOperator::Sub),
            &locals,
        );
        let step = cfg.push_stmt(body, Stmt::assign(i.clone(), add)).unwrap();
        cfg.push_stmt(exit, Stmt::return_void()).unwrap();
        cfg.link(entry, header).unwrap();
        cfg.link(header, body).unwrap();
        cfg.link(header, exit).unwrap();
        cfg.link(body, header).unwrap();
        cfg.build_def_use_chain();

        let mut defs: Vec<StmtId> = cfg
            .def_use_chains()
            .iter()
            .filter(|ch| ch.use_stmt == check && ch.value == Value::Local(i.clone()))
            .map(|ch| ch.def)
            .collect();
        defs.sort();
        assert_eq!(defs, vec![init, step]);
    }

    #[test]
    fn test_same_name_locals_collide() {
        let mut locals = LocalTable::new();
        let outer = locals.new_local("v", Type::Number);
        let shadow = locals.new_local("v", Type::String);
        let mut cfg = Cfg::new();
        let b = cfg.new_block();
        let def = cfg.push_stmt(b, Stmt::assign(outer, Constant::number("1"))).unwrap();
        let ret = cfg.push_stmt(b, Stmt::return_value(shadow)).unwrap();
        cfg.build_def_use_chain();
        assert!(cfg.def_use_chains().iter().any(|ch| ch.def == def && ch.use_stmt == ret));
    }
}
