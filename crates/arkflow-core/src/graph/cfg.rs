//! Control flow graph over an arena of statements

use super::basic_block::{BasicBlock, BlockId};
use super::def_use::DefUseChain;
use crate::error::{IrError, IrResult};
use crate::ir::{LocalTable, MethodSignature, Stmt, StmtId, Value};
use indexmap::IndexMap;
use std::collections::{HashMap, HashSet, VecDeque};

/// Control Flow Graph
///
/// Statements live in an arena indexed by [`StmtId`]; blocks refer to them by
/// id. A statement allocated but never placed in a block is not part of the
/// graph.
#[derive(Debug, Clone, Default)]
pub struct Cfg {
    stmts: Vec<Stmt>,
    blocks: IndexMap<BlockId, BasicBlock>,
    stmt_to_block: HashMap<StmtId, BlockId>,
    starting_stmt: Option<StmtId>,
    next_block_id: usize,
    declaring_method: Option<MethodSignature>,
    pub(super) def_use_chains: Vec<DefUseChain>,
}

impl Cfg {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn declaring_method(&self) -> Option<&MethodSignature> {
        self.declaring_method.as_ref()
    }

    pub fn set_declaring_method(&mut self, signature: MethodSignature) {
        self.declaring_method = Some(signature);
    }

    /// Store a statement in the arena without placing it in a block
    pub fn alloc_stmt(&mut self, stmt: Stmt) -> StmtId {
        let id = StmtId(self.stmts.len());
        self.stmts.push(stmt);
        id
    }

    pub fn new_block(&mut self) -> BlockId {
        let id = BlockId(self.next_block_id);
        self.next_block_id += 1;
        self.blocks.insert(id, BasicBlock::new(id));
        id
    }

    /// Insert or replace a block and index every statement it holds
    pub fn add_block(&mut self, block: BasicBlock) {
        let id = block.id;
        if let Some(old) = self.blocks.get(&id) {
            for stmt in old.stmts() {
                if self.stmt_to_block.get(stmt) == Some(&id) {
                    self.stmt_to_block.remove(stmt);
                }
            }
        }
        for &stmt in block.stmts() {
            self.stmt_to_block.insert(stmt, id);
        }
        self.next_block_id = self.next_block_id.max(id.0 + 1);
        self.blocks.insert(id, block);
    }

    /// Drop a block, unlinking it from its neighbours. Its statements stay in
    /// the arena but are no longer indexed.
    pub fn remove_block(&mut self, id: BlockId) -> Option<BasicBlock> {
        let block = self.blocks.shift_remove(&id)?;
        for stmt in block.stmts() {
            self.stmt_to_block.remove(stmt);
        }
        for succ in block.successors() {
            if let Some(b) = self.blocks.get_mut(succ) {
                while b.remove_predecessor_block(id) {}
            }
        }
        for pred in block.predecessors() {
            if let Some(b) = self.blocks.get_mut(pred) {
                while b.remove_successor_block(id) {}
            }
        }
        if self.starting_stmt.is_some_and(|s| block.stmts().contains(&s)) {
            self.starting_stmt = None;
        }
        Some(block)
    }

    /// Append a new statement to `block`
    pub fn push_stmt(&mut self, block: BlockId, stmt: Stmt) -> IrResult<StmtId> {
        if !self.blocks.contains_key(&block) {
            return Err(IrError::UnknownBlock(block));
        }
        let id = self.alloc_stmt(stmt);
        self.add_stmt(block, id)?;
        Ok(id)
    }

    /// Append an allocated statement to `block`
    pub fn add_stmt(&mut self, block: BlockId, stmt: StmtId) -> IrResult<()> {
        if stmt.0 >= self.stmts.len() {
            return Err(IrError::UnknownStmt(stmt));
        }
        let b = self.blocks.get_mut(&block).ok_or(IrError::UnknownBlock(block))?;
        b.push_stmt(stmt);
        self.stmt_to_block.insert(stmt, block);
        Ok(())
    }

    /// Add the edge `from -> to` on both endpoints
    pub fn link(&mut self, from: BlockId, to: BlockId) -> IrResult<()> {
        if !self.blocks.contains_key(&to) {
            return Err(IrError::UnknownBlock(to));
        }
        self.blocks
            .get_mut(&from)
            .ok_or(IrError::UnknownBlock(from))?
            .add_successor_block(to);
        if let Some(b) = self.blocks.get_mut(&to) {
            b.add_predecessor_block(from);
        }
        Ok(())
    }

    /// Place `stmt` right before `existing` in the same block.
    /// Only the inserted statement is (re-)indexed.
    pub fn insert_before(&mut self, stmt: Stmt, existing: StmtId) -> IrResult<StmtId> {
        let block_id = self.block_of(existing).ok_or(IrError::UnknownStmt(existing))?;
        let index = self
            .blocks
            .get(&block_id)
            .and_then(|b| b.position_of(existing))
            .ok_or(IrError::UnknownStmt(existing))?;
        let id = self.alloc_stmt(stmt);
        if let Some(b) = self.blocks.get_mut(&block_id) {
            b.insert_stmt(index, id);
        }
        self.stmt_to_block.insert(id, block_id);
        if self.starting_stmt == Some(existing) && index == 0 {
            self.starting_stmt = Some(id);
        }
        Ok(id)
    }

    /// Take a statement out of its block; it remains in the arena
    pub fn remove_stmt(&mut self, stmt: StmtId) -> IrResult<()> {
        let block_id = self.stmt_to_block.remove(&stmt).ok_or(IrError::UnknownStmt(stmt))?;
        if let Some(b) = self.blocks.get_mut(&block_id) {
            b.remove_stmt(stmt);
        }
        Ok(())
    }

    pub fn set_starting_stmt(&mut self, stmt: StmtId) {
        self.starting_stmt = Some(stmt);
    }

    pub fn starting_stmt(&self) -> Option<StmtId> {
        self.starting_stmt
    }

    /// Block holding the starting statement, `None` if it was never placed
    pub fn starting_block(&self) -> Option<BlockId> {
        self.starting_stmt.and_then(|s| self.block_of(s))
    }

    pub fn stmt(&self, id: StmtId) -> Option<&Stmt> {
        self.stmts.get(id.0)
    }

    pub fn stmt_mut(&mut self, id: StmtId) -> Option<&mut Stmt> {
        self.stmts.get_mut(id.0)
    }

    pub fn block(&self, id: BlockId) -> Option<&BasicBlock> {
        self.blocks.get(&id)
    }

    pub fn block_mut(&mut self, id: BlockId) -> Option<&mut BasicBlock> {
        self.blocks.get_mut(&id)
    }

    pub fn block_of(&self, stmt: StmtId) -> Option<BlockId> {
        self.stmt_to_block.get(&stmt).copied()
    }

    /// Blocks in insertion order
    pub fn blocks(&self) -> impl Iterator<Item = &BasicBlock> {
        self.blocks.values()
    }

    pub fn block_ids(&self) -> Vec<BlockId> {
        self.blocks.keys().copied().collect()
    }

    pub fn block_count(&self) -> usize {
        self.blocks.len()
    }

    /// Statements placed in blocks, block by block
    pub fn stmt_ids(&self) -> Vec<StmtId> {
        self.blocks.values().flat_map(|b| b.stmts().iter().copied()).collect()
    }

    pub fn stmts(&self) -> impl Iterator<Item = (StmtId, &Stmt)> {
        self.blocks
            .values()
            .flat_map(|b| b.stmts().iter().copied())
            .filter_map(|id| self.stmt(id).map(|s| (id, s)))
    }

    /// Statement-level successors; empty blocks are looked through
    pub fn stmt_successors(&self, stmt: StmtId) -> Vec<StmtId> {
        let Some(block_id) = self.block_of(stmt) else {
            return Vec::new();
        };
        let Some(block) = self.blocks.get(&block_id) else {
            return Vec::new();
        };
        if let Some(idx) = block.position_of(stmt) {
            if let Some(next) = block.stmts().get(idx + 1) {
                return vec![*next];
            }
        }
        self.first_stmts_from(block.successors(), BasicBlock::successors, BasicBlock::head)
    }

    /// Statement-level predecessors; empty blocks are looked through
    pub fn stmt_predecessors(&self, stmt: StmtId) -> Vec<StmtId> {
        let Some(block_id) = self.block_of(stmt) else {
            return Vec::new();
        };
        let Some(block) = self.blocks.get(&block_id) else {
            return Vec::new();
        };
        if let Some(idx) = block.position_of(stmt) {
            if idx > 0 {
                return vec![block.stmts()[idx - 1]];
            }
        }
        self.first_stmts_from(block.predecessors(), BasicBlock::predecessors, BasicBlock::tail)
    }

    fn first_stmts_from(
        &self,
        start: &[BlockId],
        next: impl Fn(&BasicBlock) -> &[BlockId],
        pick: impl Fn(&BasicBlock) -> Option<StmtId>,
    ) -> Vec<StmtId> {
        let mut result = Vec::new();
        let mut visited = HashSet::new();
        let mut queue: VecDeque<BlockId> = start.iter().copied().collect();
        while let Some(id) = queue.pop_front() {
            if !visited.insert(id) {
                continue;
            }
            let Some(block) = self.blocks.get(&id) else {
                continue;
            };
            match pick(block) {
                Some(s) => {
                    if !result.contains(&s) {
                        result.push(s);
                    }
                }
                None => queue.extend(next(block).iter().copied()),
            }
        }
        result
    }

    /// Statements ending the method normally
    pub fn return_stmts(&self) -> Vec<StmtId> {
        self.stmts().filter(|(_, s)| s.is_return()).map(|(id, _)| id).collect()
    }

    /// Statements with no statement-level successor
    pub fn exit_stmts(&self) -> Vec<StmtId> {
        self.stmts()
            .filter(|(id, _)| self.stmt_successors(*id).is_empty())
            .map(|(id, _)| id)
            .collect()
    }

    /// Check the successor count of every block against its last statement
    pub fn validate(&self) -> IrResult<()> {
        for block in self.blocks.values() {
            let Some(tail) = block.tail().and_then(|t| self.stmt(t)) else {
                continue;
            };
            let expected = tail.get_expected_successor_count();
            let actual = block.successors().len();
            let ok = if tail.is_terminator() {
                expected == actual
            } else {
                actual <= expected
            };
            if !ok {
                return Err(IrError::SuccessorCount {
                    stmt: tail.to_string(),
                    block: block.id,
                    expected,
                    actual,
                });
            }
        }
        Ok(())
    }

    /// Copy kept by a body as its original, pre-transform graph
    pub fn deep_copy(&self) -> Cfg {
        self.clone()
    }

    /// Blocks in reverse postorder from the starting block
    pub fn reverse_postorder(&self) -> Vec<BlockId> {
        let mut postorder = self.postorder();
        postorder.reverse();
        postorder
    }

    pub fn postorder(&self) -> Vec<BlockId> {
        let mut visited = HashSet::new();
        let mut result = Vec::new();
        if let Some(start) = self.starting_block().or_else(|| self.blocks.keys().next().copied()) {
            self.dfs_postorder(start, &mut visited, &mut result);
        }
        result
    }

    fn dfs_postorder(&self, block: BlockId, visited: &mut HashSet<BlockId>, postorder: &mut Vec<BlockId>) {
        if !visited.insert(block) {
            return;
        }
        if let Some(b) = self.blocks.get(&block) {
            for &succ in b.successors() {
                self.dfs_postorder(succ, visited, postorder);
            }
        }
        postorder.push(block);
    }

    /// Blocks reachable from the starting block
    pub fn reachable_blocks(&self) -> HashSet<BlockId> {
        self.postorder().into_iter().collect()
    }

    /// Fill in declaring and using statements of every local, scanning each block once
    pub fn build_def_use_stmt(&self, locals: &mut LocalTable) {
        for (id, stmt) in self.stmts() {
            if let Some(def) = stmt.get_def_local() {
                locals.set_declaring_stmt(def, id);
            }
            for used in stmt.get_uses() {
                if let Value::Local(local) = used {
                    locals.add_used_stmt(&local, id);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::{ConditionExpr, Constant, RelationalBinaryOperator, Type};

    fn cond() -> ConditionExpr {
        ConditionExpr::new(
            Constant::boolean(true).into(),
            Constant::boolean(false).into(),
            RelationalBinaryOperator::InEquality,
        )
    }

    #[test]
    fn test_starting_block_requires_placed_stmt() {
        let mut cfg = Cfg::new();
        let dangling = cfg.alloc_stmt(Stmt::return_void());
        cfg.set_starting_stmt(dangling);
        assert_eq!(cfg.starting_block(), None);

        let entry = cfg.new_block();
        cfg.add_stmt(entry, dangling).unwrap();
        assert_eq!(cfg.starting_block(), Some(entry));
    }

    #[test]
    fn test_add_block_is_idempotent_and_reindexes() {
        let mut cfg = Cfg::new();
        let a = cfg.alloc_stmt(Stmt::return_void());
        let block = BasicBlock::with_stmts(BlockId(5), vec![a]);
        cfg.add_block(block.clone());
        cfg.add_block(block);
        assert_eq!(cfg.block_count(), 1);
        assert_eq!(cfg.block_of(a), Some(BlockId(5)));
        // fresh ids do not collide with the added block
        assert_eq!(cfg.new_block(), BlockId(6));
    }

    #[test]
    fn test_replacing_block_drops_stale_index_entries() {
        let mut cfg = Cfg::new();
        let a = cfg.alloc_stmt(Stmt::return_void());
        let b = cfg.alloc_stmt(Stmt::return_void());
        cfg.add_block(BasicBlock::with_stmts(BlockId(0), vec![a, b]));
        cfg.add_block(BasicBlock::with_stmts(BlockId(0), vec![b]));
        assert_eq!(cfg.block_of(a), None);
        assert_eq!(cfg.block_of(b), Some(BlockId(0)));

        // a statement that moved elsewhere keeps its new block
        cfg.add_block(BasicBlock::with_stmts(BlockId(0), vec![a, b]));
        cfg.add_block(BasicBlock::with_stmts(BlockId(1), vec![a]));
        cfg.add_block(BasicBlock::with_stmts(BlockId(0), vec![b]));
        assert_eq!(cfg.block_of(a), Some(BlockId(1)));
    }

    #[test]
    fn test_insert_before_indexes_moved_stmt() {
        let mut locals = LocalTable::new();
        let x = locals.new_local("x", Type::Number);
        let mut cfg = Cfg::new();
        let b = cfg.new_block();
        let ret = cfg.push_stmt(b, Stmt::return_value(x.clone())).unwrap();
        cfg.set_starting_stmt(ret);

        let def = cfg.insert_before(Stmt::assign(x, Constant::number("1")), ret).unwrap();
        assert_eq!(cfg.block(b).unwrap().stmts(), &[def, ret]);
        assert_eq!(cfg.block_of(def), Some(b));
        assert_eq!(cfg.starting_stmt(), Some(def));
        assert!(matches!(
            cfg.insert_before(Stmt::return_void(), StmtId(99)),
            Err(IrError::UnknownStmt(StmtId(99)))
        ));
    }

    #[test]
    fn test_stmt_successors_skip_empty_blocks() {
        let mut cfg = Cfg::new();
        let a = cfg.new_block();
        let empty = cfg.new_block();
        let c = cfg.new_block();
        let s1 = cfg.push_stmt(a, Stmt::if_stmt(cond())).unwrap();
        let s2 = cfg.push_stmt(c, Stmt::return_void()).unwrap();
        cfg.link(a, empty).unwrap();
        cfg.link(a, c).unwrap();
        cfg.link(empty, c).unwrap();

        assert_eq!(cfg.stmt_successors(s1), vec![s2]);
        assert_eq!(cfg.stmt_predecessors(s2), vec![s1]);
        assert!(cfg.stmt_successors(s2).is_empty());
    }

    #[test]
    fn test_validate_if_successor_count() {
        let mut cfg = Cfg::new();
        let a = cfg.new_block();
        let b = cfg.new_block();
        cfg.push_stmt(a, Stmt::if_stmt(cond())).unwrap();
        cfg.push_stmt(b, Stmt::return_void()).unwrap();
        cfg.link(a, b).unwrap();
        assert!(matches!(
            cfg.validate(),
            Err(IrError::SuccessorCount {
                expected: 2,
                actual: 1,
                ..
            })
        ));
        cfg.link(a, b).unwrap();
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn test_remove_block_unlinks_neighbours() {
        let mut cfg = Cfg::new();
        let a = cfg.new_block();
        let b = cfg.new_block();
        cfg.link(a, b).unwrap();
        cfg.remove_block(b);
        assert!(cfg.block(a).unwrap().successors().is_empty());
    }

    #[test]
    fn test_build_def_use_stmt() {
        let mut locals = LocalTable::new();
        let x = locals.new_local("x", Type::Unknown);
        let mut cfg = Cfg::new();
        let b = cfg.new_block();
        let def = cfg.push_stmt(b, Stmt::assign(x.clone(), Constant::number("0"))).unwrap();
        let use1 = cfg.push_stmt(b, Stmt::return_value(x.clone())).unwrap();
        cfg.build_def_use_stmt(&mut locals);
        assert_eq!(locals.declaring_stmt(&x), Some(def));
        assert_eq!(locals.used_stmts(&x), &[use1]);
    }
}
