//! End-to-end analysis of a scene: type inference, then both checkers

use crate::checkers::{DivByZeroChecker, Finding, UndefinedVariableChecker};
use crate::ifds::Icfg;
use anyhow::{Context, Result};
use arkflow_core::config::AnalysisConfig;
use arkflow_core::inference::{InferenceReport, TypeInference};
use arkflow_core::ir::MethodSignature;
use arkflow_core::model::{DummyMainCreator, Scene};
use serde::Serialize;
use std::path::Path;
use tracing::{debug, warn};

#[derive(Debug, Clone, Default, Serialize)]
pub struct AnalysisReport {
    pub entry: String,
    pub methods_inferred: usize,
    pub unresolved_calls: usize,
    pub undefined: Vec<Finding>,
    pub div_by_zero: Vec<Finding>,
}

impl AnalysisReport {
    pub fn finding_count(&self) -> usize {
        self.undefined.len() + self.div_by_zero.len()
    }
}

#[derive(Debug, Clone, Default)]
pub struct Analyzer {
    config: AnalysisConfig,
}

impl Analyzer {
    pub fn new(config: AnalysisConfig) -> Self {
        Self { config }
    }

    pub fn from_config_file(path: &Path) -> Result<Self> {
        Ok(Self::new(AnalysisConfig::from_file(path)?))
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    /// Infer types over `scene` and run every checker from `entry`.
    ///
    /// Without an entry a dummy main over the scene's top-level code is
    /// synthesized and used instead.
    pub fn run(&self, scene: &mut Scene, entry: Option<MethodSignature>) -> Result<AnalysisReport> {
        let inference: InferenceReport = TypeInference::new(self.config.inference.clone()).infer_scene(scene);
        if inference.unresolved > 0 {
            warn!(unresolved = inference.unresolved, "calls left unresolved after inference");
        }

        let entry = match entry {
            Some(entry) => entry,
            None => DummyMainCreator::new(scene)
                .create_dummy_main()
                .context("failed to synthesize dummy main")?,
        };

        let icfg = Icfg::new(scene);
        let undefined = UndefinedVariableChecker::new(entry.clone())
            .check(&icfg, self.config.solver.clone())
            .with_context(|| format!("undefined variable check from {entry}"))?;
        let div_by_zero = DivByZeroChecker::new(entry.clone())
            .check(&icfg, self.config.solver.clone())
            .with_context(|| format!("division by zero check from {entry}"))?;

        let report = AnalysisReport {
            entry: entry.to_string(),
            methods_inferred: inference.methods_inferred,
            unresolved_calls: inference.unresolved,
            undefined,
            div_by_zero,
        };
        debug!(entry = %report.entry, findings = report.finding_count(), "analysis finished");
        Ok(report)
    }
}
