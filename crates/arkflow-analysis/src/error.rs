use arkflow_core::ir::StmtId;
use thiserror::Error;

/// Failures of the IFDS solver
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SolverError {
    #[error("solver did not converge after {iterations} iterations")]
    DidNotConverge { iterations: usize },

    #[error("entry method `{method}` has no body in the scene")]
    MissingEntry { method: String },
}

pub type SolverResult<T> = Result<T, SolverError>;

/// Failures while exporting IR
#[derive(Debug, Error)]
pub enum PrintError {
    #[error("statement {0:?} is not in the statement arena")]
    DanglingStmt(StmtId),

    #[error("failed to encode json: {0}")]
    Json(#[from] serde_json::Error),

    #[error("failed to write output: {0}")]
    Io(#[from] std::io::Error),
}

pub type PrintResult<T> = Result<T, PrintError>;
