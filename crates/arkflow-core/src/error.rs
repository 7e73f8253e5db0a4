use crate::graph::BlockId;
use crate::ir::StmtId;
use thiserror::Error;

/// Structural violations detected while building or mutating IR
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum IrError {
    #[error("statement {0:?} is not part of this cfg")]
    UnknownStmt(StmtId),

    #[error("block {0:?} is not part of this cfg")]
    UnknownBlock(BlockId),

    #[error("`{stmt}` in block {block:?} expects {expected} successors but has {actual}")]
    SuccessorCount {
        stmt: String,
        block: BlockId,
        expected: usize,
        actual: usize,
    },

    #[error("`{0}` is not an assignment")]
    NotAnAssignment(String),

    #[error("`{0}` outside of a loop or switch")]
    JumpOutsideLoop(&'static str),

    #[error("cfg has no starting statement")]
    MissingStart,
}

pub type IrResult<T> = Result<T, IrError>;
