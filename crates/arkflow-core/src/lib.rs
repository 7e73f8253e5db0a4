//! # Arkflow Core
//!
//! Intermediate representation, control-flow graphs and type inference for
//! TypeScript-family programs.
//!
//! ## Modules
//!
//! - **[`ir`]** - Values, expressions, statements, types and signatures
//! - **[`graph`]** - Basic blocks, CFGs, def-use chains and the structured CFG builder
//! - **[`model`]** - Scene, files, namespaces, classes, methods, bodies and the dummy main
//! - **[`inference`]** - Scene-wide type inference
//! - **[`config`]** - Inference and solver settings
//!
//! ## Quick Start
//!
//! ```rust
//! use arkflow_core::prelude::*;
//!
//! let mut scene = Scene::new("demo");
//! let inference = TypeInference::new(InferenceConfig::default().without_sdk_fallback());
//! let report = inference.infer_scene(&mut scene);
//! assert_eq!(report.methods_inferred, 0);
//! ```

pub mod config;
pub mod error;
pub mod graph;
pub mod inference;
pub mod ir;
pub mod model;

pub use error::{IrError, IrResult};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::config::{AnalysisConfig, InferenceConfig, SolverConfig};
    pub use crate::error::{IrError, IrResult};
    pub use crate::graph::{BasicBlock, BlockId, Cfg, CfgBuilder, DefUseChain, StructuredStmt, SwitchCase};
    pub use crate::inference::{InferenceReport, TypeInference};
    pub use crate::ir::{
        BinaryOperator, ClassSignature, ConditionExpr, Constant, Expr, FieldSignature, FileSignature, InvokeExpr,
        Local, LocalTable, MethodParameter, MethodSignature, MethodSubSignature, NormalBinaryOperator, Ref,
        RelationalBinaryOperator, Stmt, StmtId, StmtKind, Type, UnaryOperator, Value,
    };
    pub use crate::model::{
        ArkBody, ArkClass, ArkField, ArkFile, ArkMethod, ArkNamespace, ClassCategory, DummyMainCreator, Scene,
    };
}
