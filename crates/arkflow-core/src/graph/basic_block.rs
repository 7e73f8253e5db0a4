use crate::ir::StmtId;
use smallvec::SmallVec;

/// Unique identifier for a basic block
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BlockId(pub usize);

/// Edge list of a block. Multi-edges are kept: an `if` whose branches meet
/// in the same block still lists two successors.
pub type BlockList = SmallVec<[BlockId; 2]>;

/// A straight-line sequence of statements
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BasicBlock {
    pub id: BlockId,
    stmts: Vec<StmtId>,
    predecessors: BlockList,
    successors: BlockList,
}

impl BasicBlock {
    pub fn new(id: BlockId) -> Self {
        Self {
            id,
            stmts: Vec::new(),
            predecessors: SmallVec::new(),
            successors: SmallVec::new(),
        }
    }

    pub fn with_stmts(id: BlockId, stmts: Vec<StmtId>) -> Self {
        Self {
            stmts,
            ..Self::new(id)
        }
    }

    pub fn stmts(&self) -> &[StmtId] {
        &self.stmts
    }

    pub fn head(&self) -> Option<StmtId> {
        self.stmts.first().copied()
    }

    pub fn tail(&self) -> Option<StmtId> {
        self.stmts.last().copied()
    }

    pub fn is_empty(&self) -> bool {
        self.stmts.is_empty()
    }

    pub fn len(&self) -> usize {
        self.stmts.len()
    }

    pub fn position_of(&self, stmt: StmtId) -> Option<usize> {
        self.stmts.iter().position(|s| *s == stmt)
    }

    pub(crate) fn push_stmt(&mut self, stmt: StmtId) {
        self.stmts.push(stmt);
    }

    pub(crate) fn insert_stmt(&mut self, index: usize, stmt: StmtId) {
        self.stmts.insert(index, stmt);
    }

    pub(crate) fn remove_stmt(&mut self, stmt: StmtId) -> bool {
        match self.position_of(stmt) {
            Some(idx) => {
                self.stmts.remove(idx);
                true
            }
            None => false,
        }
    }

    pub fn predecessors(&self) -> &[BlockId] {
        &self.predecessors
    }

    pub fn successors(&self) -> &[BlockId] {
        &self.successors
    }

    pub fn add_predecessor_block(&mut self, block: BlockId) {
        self.predecessors.push(block);
    }

    pub fn add_successor_block(&mut self, block: BlockId) {
        self.successors.push(block);
    }

    /// Replace the predecessor at `index`; false when out of range
    pub fn set_predecessor_block(&mut self, index: usize, block: BlockId) -> bool {
        match self.predecessors.get_mut(index) {
            Some(slot) => {
                *slot = block;
                true
            }
            None => false,
        }
    }

    /// Replace the successor at `index`; false when out of range
    pub fn set_successor_block(&mut self, index: usize, block: BlockId) -> bool {
        match self.successors.get_mut(index) {
            Some(slot) => {
                *slot = block;
                true
            }
            None => false,
        }
    }

    /// Remove one occurrence of `block` from the predecessors
    pub fn remove_predecessor_block(&mut self, block: BlockId) -> bool {
        match self.predecessors.iter().position(|b| *b == block) {
            Some(idx) => {
                self.predecessors.remove(idx);
                true
            }
            None => false,
        }
    }

    /// Remove one occurrence of `block` from the successors
    pub fn remove_successor_block(&mut self, block: BlockId) -> bool {
        match self.successors.iter().position(|b| *b == block) {
            Some(idx) => {
                self.successors.remove(idx);
                true
            }
            None => false,
        }
    }
}
