use crate::generator::profile::GeneratorConfig;
use anyhow::Context;
use roadcore::prelude::EngineConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkflowConfig {
    pub engine: EngineConfig,
    pub generator: GeneratorConfig,
}

impl WorkflowConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path_ref = path.as_ref();
        let contents = fs::read_to_string(path_ref)
            .with_context(|| format!("reading workflow config {}", path_ref.display()))?;
        let config: WorkflowConfig = serde_yaml::from_str(&contents)
            .with_context(|| format!("parsing workflow config {}", path_ref.display()))?;
        config
            .engine
            .validate()
            .with_context(|| format!("validating workflow config {}", path_ref.display()))?;
        Ok(config)
    }

    pub fn from_args(seed: u64, duration_millis: i64, cooldown_millis: i64) -> Self {
        Self {
            engine: EngineConfig {
                cooldown_millis,
                ..Default::default()
            },
            generator: GeneratorConfig {
                seed,
                duration_millis,
                ..Default::default()
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn config_from_args_sets_engine_and_generator() {
        let cfg = WorkflowConfig::from_args(9, 4_000, 500);
        assert_eq!(cfg.engine.cooldown_millis, 500);
        assert_eq!(cfg.generator.seed, 9);
        assert_eq!(cfg.engine.window_capacity, 50);
    }

    #[test]
    fn config_load_reads_yaml() {
        let mut temp = NamedTempFile::new().unwrap();
        temp.write_all(
            b"engine:\n  window_capacity: 40\n  report_confidence: 1.5\ngenerator:\n  seed: 4\n  anomalies:\n    - kind: double_bump\n      at_millis: 1200\n      magnitude: 2.0\n",
        )
        .unwrap();
        let path = temp.into_temp_path();
        let cfg = WorkflowConfig::load(&path).unwrap();
        assert_eq!(cfg.engine.window_capacity, 40);
        assert_eq!(cfg.engine.cooldown_millis, 1000);
        assert_eq!(cfg.generator.seed, 4);
        assert_eq!(cfg.generator.anomalies.len(), 1);
        assert_eq!(cfg.generator.anomalies[0].pitch, 1.5);
    }

    #[test]
    fn config_load_rejects_invalid_engine() {
        let mut temp = NamedTempFile::new().unwrap();
        temp.write_all(b"engine:\n  window_capacity: 0\n").unwrap();
        let path = temp.into_temp_path();
        assert!(WorkflowConfig::load(&path).is_err());
    }
}
