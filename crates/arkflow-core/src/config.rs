//! Analysis configuration

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InferenceConfig {
    /// Passes over the whole scene; later passes see return types inferred by earlier ones
    pub max_passes: usize,
    /// Infer missing method return types from return statements
    pub infer_return_types: bool,
    /// Fall back to SDK globals for calls nothing else resolves
    pub sdk_fallback: bool,
}

impl Default for InferenceConfig {
    fn default() -> Self {
        Self {
            max_passes: 2,
            infer_return_types: true,
            sdk_fallback: true,
        }
    }
}

impl InferenceConfig {
    /// Disable return type inference
    pub fn without_return_inference(mut self) -> Self {
        self.infer_return_types = false;
        self
    }

    /// Disable the SDK global lookup
    pub fn without_sdk_fallback(mut self) -> Self {
        self.sdk_fallback = false;
        self
    }

    pub fn with_max_passes(mut self, passes: usize) -> Self {
        self.max_passes = passes;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverConfig {
    /// Worklist items processed before the solver gives up
    pub max_iterations: usize,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            max_iterations: 100_000,
        }
    }
}

impl SolverConfig {
    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    pub inference: InferenceConfig,
    pub solver: SolverConfig,
}

impl AnalysisConfig {
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        let config: Self = serde_json::from_str(&content)
            .with_context(|| format!("invalid config {}", path.display()))?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = AnalysisConfig::default();
        assert_eq!(config.inference.max_passes, 2);
        assert!(config.inference.infer_return_types);
        assert!(config.inference.sdk_fallback);
        assert_eq!(config.solver.max_iterations, 100_000);
    }

    #[test]
    fn test_builder_toggles() {
        let config = InferenceConfig::default()
            .without_return_inference()
            .without_sdk_fallback()
            .with_max_passes(5);
        assert!(!config.infer_return_types);
        assert!(!config.sdk_fallback);
        assert_eq!(config.max_passes, 5);
    }

    #[test]
    fn test_from_file_partial() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"solver": {{"max_iterations": 42}}}}"#).unwrap();
        let config = AnalysisConfig::from_file(file.path()).unwrap();
        assert_eq!(config.solver.max_iterations, 42);
        assert_eq!(config.inference, InferenceConfig::default());
    }

    #[test]
    fn test_from_file_reports_path() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("absent.json");
        let err = AnalysisConfig::from_file(&missing).unwrap_err();
        assert!(err.to_string().contains("absent.json"));
    }
}
