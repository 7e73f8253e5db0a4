//! # Arkflow Analysis
//!
//! Interprocedural dataflow analysis and IR export on top of `arkflow-core`.
//!
//! ## Modules
//!
//! - **[`ifds`]** - Supergraph, problem definition and tabulation solver
//! - **[`checkers`]** - Undefined variable and division-by-zero checkers
//! - **[`printer`]** - JSON and Graphviz export
//! - **[`pipeline`]** - Inference followed by every checker
//!
//! ## Quick Start
//!
//! ```rust
//! use arkflow_analysis::prelude::*;
//! use arkflow_core::prelude::*;
//!
//! let mut scene = Scene::new("demo");
//! let analyzer = Analyzer::new(AnalysisConfig::default());
//! // An empty scene has no top-level code, so the dummy main is empty too
//! let report = analyzer.run(&mut scene, None).unwrap();
//! assert_eq!(report.finding_count(), 0);
//! ```

pub mod checkers;
pub mod error;
pub mod ifds;
pub mod pipeline;
pub mod printer;

pub use error::{PrintError, PrintResult, SolverError, SolverResult};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::checkers::{DivByZeroChecker, Finding, UndefinedFact, UndefinedVariableChecker, ZeroFact};
    pub use crate::error::{PrintError, PrintResult, SolverError, SolverResult};
    pub use crate::ifds::{DataflowProblem, FlowFunction, Icfg, IfdsResult, IfdsSolver, MethodId, Node};
    pub use crate::pipeline::{AnalysisReport, Analyzer};
    pub use crate::printer::{DotPrinter, JsonPrinter};
}
