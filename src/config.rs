//! @ai:module:intent Configuration document for a benchmark run
//! @ai:module:layer infrastructure
//! @ai:module:public_api BenchmarkConfig, ToolConfig
//! @ai:module:stateless true

use crate::error::{Error, Result};
use crate::ordered::OrderedMap;
use crate::tool::{ArgValue, EnvValue};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// @ai:intent Main configuration: paths plus the toolchain keyed by stage index
/// @ai:effects pure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BenchmarkConfig {
    /// Working directory for every tool invocation
    pub app_path: PathBuf,
    /// Task table (CSV)
    pub bench_path: PathBuf,
    /// Result table (CSV), overwritten on success
    pub result_path: PathBuf,
    /// Task columns copied to the output without being routed to any tool
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub passthrough_columns: Vec<String>,
    /// Reject field names declared by more than one stage
    #[serde(default)]
    pub strict_fields: bool,
    /// Stage index (as a string) to tool description, in any order
    pub toolchain: OrderedMap<ToolConfig>,
}

/// @ai:intent Configuration entry for one toolchain stage
/// @ai:effects pure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolConfig {
    #[serde(alias = "command")]
    pub tool: String,
    #[serde(default, alias = "env")]
    pub envs: BTreeMap<String, EnvValue>,
    #[serde(default)]
    pub args: OrderedMap<ArgValue>,
    #[serde(default, alias = "fields")]
    pub greps: OrderedMap<String>,
}

impl BenchmarkConfig {
    /// @ai:intent Load configuration from a JSON file
    /// @ai:pre path exists and is readable
    /// @ai:effects fs:read
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::config(format!("failed to read {}: {e}", path.display()))
        })?;
        serde_json::from_str(&content)
            .map_err(|e| Error::config(format!("{}: {e}", path.display())))
    }

    /// @ai:intent Parse configuration from JSON text
    /// @ai:effects pure
    pub fn from_json(content: &str) -> Result<Self> {
        serde_json::from_str(content).map_err(|e| Error::config(e.to_string()))
    }

    /// @ai:intent Save configuration as pretty-printed JSON
    /// @ai:effects fs:write
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content + "\n")?;
        Ok(())
    }

    /// @ai:intent Example configuration written by `init`
    /// @ai:effects pure
    pub fn template() -> Self {
        let build = ToolConfig {
            tool: "make".to_string(),
            envs: BTreeMap::new(),
            args: [("-j", ArgValue::Number(4u64.into()))].into_iter().collect(),
            greps: OrderedMap::new(),
        };

        let bench = ToolConfig {
            tool: "./bench".to_string(),
            envs: BTreeMap::from([(
                "OMP_NUM_THREADS".to_string(),
                EnvValue::Set("1".to_string()),
            )]),
            args: [
                ("--size", ArgValue::Number(100u64.into())),
                ("--verbose", ArgValue::Flag),
            ]
            .into_iter()
            .collect(),
            greps: [("time", r"time=([0-9.]+)".to_string())]
                .into_iter()
                .collect(),
        };

        Self {
            app_path: PathBuf::from("app"),
            bench_path: PathBuf::from("tasks.csv"),
            result_path: PathBuf::from("results.csv"),
            passthrough_columns: Vec::new(),
            strict_fields: false,
            toolchain: [("0", build), ("1", bench)].into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    const SAMPLE: &str = r#"{
        "app_path": "app",
        "bench_path": "tasks.csv",
        "result_path": "out.csv",
        "toolchain": {
            "1": {"tool": "./run", "envs": {"A": "1"}, "args": {"--n": 3}, "greps": {"t": "t=(\\d+)"}},
            "0": {"command": "make", "fields": {}}
        }
    }"#;

    #[test]
    fn test_parse_sample() {
        let config = BenchmarkConfig::from_json(SAMPLE).unwrap();
        assert_eq!(config.app_path, PathBuf::from("app"));
        assert_eq!(config.toolchain.keys().collect::<Vec<_>>(), vec!["1", "0"]);
        assert!(!config.strict_fields);
        assert!(config.passthrough_columns.is_empty());

        let make = config.toolchain.get("0").unwrap();
        assert_eq!(make.tool, "make");
        assert!(make.args.is_empty());
        assert!(make.envs.is_empty());
    }

    #[test]
    fn test_missing_field_is_config_error() {
        let result = BenchmarkConfig::from_json(r#"{"app_path": "a", "toolchain": {}}"#);
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_load_missing_file_is_config_error() {
        let temp = TempDir::new().unwrap();
        let result = BenchmarkConfig::load(&temp.path().join("absent.json"));
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_template_save_and_load() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("bench.json");

        let template = BenchmarkConfig::template();
        template.save(&path).unwrap();
        let loaded = BenchmarkConfig::load(&path).unwrap();

        assert_eq!(loaded.toolchain.len(), 2);
        assert_eq!(
            loaded.toolchain.get("1").unwrap().args,
            template.toolchain.get("1").unwrap().args
        );
    }
}
