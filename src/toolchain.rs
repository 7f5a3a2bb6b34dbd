//! @ai:module:intent Build the ordered toolchain and check its tools are launchable
//! @ai:module:layer domain
//! @ai:module:public_api Toolchain, ToolchainStatus, MissingTool

use crate::config::ToolConfig;
use crate::error::{Error, Result};
use crate::ordered::OrderedMap;
use crate::runner::Environment;
use crate::tool::ToolSpec;
use std::collections::HashSet;
use std::path::Path;

/// @ai:intent Dense, zero-based sequence of stages in invocation order
#[derive(Debug, Clone)]
pub struct Toolchain {
    stages: Vec<ToolSpec>,
}

/// @ai:intent Result of resolving every stage's command
#[derive(Debug, Default)]
pub struct ToolchainStatus {
    pub missing_tools: Vec<MissingTool>,
}

/// @ai:intent A stage whose command could not be resolved
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MissingTool {
    pub stage: usize,
    pub command: String,
    pub hint: &'static str,
}

impl Toolchain {
    pub fn new(stages: Vec<ToolSpec>) -> Self {
        Self { stages }
    }

    /// @ai:intent Place each configured tool at its numeric stage index
    /// @ai:pre keys are decimal stage indices forming 0..N without gaps or repeats
    /// @ai:effects pure
    pub fn from_config(entries: &OrderedMap<ToolConfig>, strict_fields: bool) -> Result<Self> {
        if entries.is_empty() {
            return Err(Error::config("toolchain must declare at least one stage"));
        }

        let count = entries.len();
        let mut slots: Vec<Option<ToolSpec>> = vec![None; count];

        for (key, config) in entries.iter() {
            let index = parse_stage_index(key)?;
            if index >= count {
                return Err(Error::config(format!(
                    "toolchain indices must be contiguous from 0: found '{key}' with only {count} stages declared"
                )));
            }
            if slots[index].is_some() {
                return Err(Error::config(format!("duplicate toolchain index '{key}'")));
            }

            let spec = ToolSpec::from_config(config).map_err(|e| match e {
                Error::Config(message) => Error::config(format!("toolchain stage {index}: {message}")),
                other => other,
            })?;
            slots[index] = Some(spec);
        }

        let stages = slots
            .into_iter()
            .enumerate()
            .map(|(index, slot)| {
                slot.ok_or_else(|| Error::config(format!("toolchain stage {index} is missing")))
            })
            .collect::<Result<Vec<_>>>()?;

        let toolchain = Self { stages };
        toolchain.check_field_collisions(strict_fields)?;
        Ok(toolchain)
    }

    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    pub fn stages(&self) -> &[ToolSpec] {
        &self.stages
    }

    pub fn get(&self, stage: usize) -> Option<&ToolSpec> {
        self.stages.get(stage)
    }

    /// @ai:intent Every declared field name, toolchain then declaration order, first occurrence kept
    /// @ai:effects pure
    pub fn field_names(&self) -> Vec<String> {
        let mut seen = HashSet::new();
        self.stages
            .iter()
            .flat_map(|stage| stage.field_names())
            .filter(|name| seen.insert(*name))
            .map(str::to_string)
            .collect()
    }

    /// @ai:intent Field names declared by more than one stage
    /// @ai:effects pure
    pub fn duplicate_fields(&self) -> Vec<String> {
        let mut seen = HashSet::new();
        let mut duplicates = Vec::new();
        for name in self.stages.iter().flat_map(|stage| stage.field_names()) {
            if !seen.insert(name) && !duplicates.iter().any(|d| d == name) {
                duplicates.push(name.to_string());
            }
        }
        duplicates
    }

    fn check_field_collisions(&self, strict: bool) -> Result<()> {
        let duplicates = self.duplicate_fields();
        if duplicates.is_empty() {
            return Ok(());
        }
        if strict {
            return Err(Error::config(format!(
                "field names declared by more than one stage: {}",
                duplicates.join(", ")
            )));
        }
        tracing::warn!(
            "Field names declared by more than one stage (later stage wins): {}",
            duplicates.join(", ")
        );
        Ok(())
    }

    /// @ai:intent Resolve every stage's command without running it
    /// @ai:effects fs:read
    pub fn preflight(&self, app_path: &Path, base_env: &Environment) -> ToolchainStatus {
        let missing_tools = self
            .stages
            .iter()
            .enumerate()
            .filter_map(|(stage, tool)| {
                let env = base_env.overlay(tool.default_env());
                match resolve_command(tool.command(), app_path, &env) {
                    Ok(()) => None,
                    Err(hint) => Some(MissingTool {
                        stage,
                        command: tool.command().to_string(),
                        hint,
                    }),
                }
            })
            .collect();

        ToolchainStatus { missing_tools }
    }
}

impl ToolchainStatus {
    pub fn is_ready(&self) -> bool {
        self.missing_tools.is_empty()
    }

    /// @ai:intent Log warnings for missing tools
    /// @ai:effects io
    pub fn log_warnings(&self) {
        for missing in &self.missing_tools {
            tracing::warn!(
                "Stage {} tool '{}' not found - {}",
                missing.stage,
                missing.command,
                missing.hint
            );
        }
    }
}

/// @ai:intent Parse a configuration key as a decimal stage index
/// @ai:effects pure
fn parse_stage_index(key: &str) -> Result<usize> {
    if key.is_empty() || !key.bytes().all(|b| b.is_ascii_digit()) {
        return Err(Error::config(format!(
            "toolchain key '{key}' is not a non-negative integer"
        )));
    }
    key.parse()
        .map_err(|_| Error::config(format!("toolchain key '{key}' is too large")))
}

/// @ai:intent Check that a command resolves to an executable file
/// @ai:effects fs:read
fn resolve_command(command: &str, app_path: &Path, env: &Environment) -> std::result::Result<(), &'static str> {
    let path = Path::new(command);

    if path.is_absolute() || path.components().count() > 1 {
        return which::which_in(app_path.join(path), None::<&str>, app_path)
            .map(|_| ())
            .map_err(|_| "no executable at this path relative to the application path");
    }

    which::which_in(command, env.get("PATH"), app_path)
        .map(|_| ())
        .map_err(|_| "no executable with this name on PATH")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn entries(json: &str) -> OrderedMap<ToolConfig> {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_stages_land_at_their_index() {
        let config = entries(
            r#"{
                "2": {"tool": "third"},
                "0": {"tool": "first"},
                "1": {"tool": "second"}
            }"#,
        );
        let toolchain = Toolchain::from_config(&config, false).unwrap();

        assert_eq!(toolchain.len(), config.len());
        for (key, entry) in config.iter() {
            let index: usize = key.parse().unwrap();
            assert_eq!(toolchain.get(index).unwrap().command(), entry.tool);
        }
    }

    #[test]
    fn test_rejects_bad_indices() {
        let cases = [
            r#"{}"#,
            r#"{"a": {"tool": "x"}}"#,
            r#"{"-1": {"tool": "x"}}"#,
            r#"{"0": {"tool": "x"}, "2": {"tool": "y"}}"#,
            r#"{"1": {"tool": "x"}}"#,
            r#"{"0": {"tool": "x"}, "00": {"tool": "y"}}"#,
        ];
        for case in cases {
            assert!(
                matches!(Toolchain::from_config(&entries(case), false), Err(Error::Config(_))),
                "{case} should be rejected"
            );
        }
    }

    #[test]
    fn test_invalid_pattern_names_the_stage() {
        let config = entries(r#"{"0": {"tool": "x", "greps": {"t": "no group"}}}"#);
        let err = Toolchain::from_config(&config, false).unwrap_err();
        assert!(err.to_string().contains("stage 0"));
    }

    #[test]
    fn test_field_names_in_declaration_order() {
        let config = entries(
            r#"{
                "1": {"tool": "b", "greps": {"z": "z=(\\d)", "a": "a=(\\d)"}},
                "0": {"tool": "a", "greps": {"m": "m=(\\d)"}}
            }"#,
        );
        let toolchain = Toolchain::from_config(&config, false).unwrap();
        assert_eq!(toolchain.field_names(), vec!["m", "z", "a"]);
    }

    #[test]
    fn test_field_collisions() {
        let config = entries(
            r#"{
                "0": {"tool": "a", "greps": {"t": "t=(\\d)"}},
                "1": {"tool": "b", "greps": {"t": "t=(\\d)", "u": "u=(\\d)"}}
            }"#,
        );
        let lenient = Toolchain::from_config(&config, false).unwrap();
        assert_eq!(lenient.duplicate_fields(), vec!["t"]);
        assert_eq!(lenient.field_names(), vec!["t", "u"]);

        assert!(matches!(
            Toolchain::from_config(&config, true),
            Err(Error::Config(_))
        ));
    }

    #[cfg(unix)]
    fn write_executable(path: &Path) {
        use std::os::unix::fs::PermissionsExt;
        std::fs::write(path, "#!/bin/sh\n").unwrap();
        std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o755)).unwrap();
    }

    #[cfg(unix)]
    #[test]
    fn test_preflight_reports_missing_tools() {
        let temp = TempDir::new().unwrap();
        write_executable(&temp.path().join("run.sh"));
        std::fs::write(temp.path().join("data.txt"), "not a program").unwrap();
        let bin_dir = temp.path().join("bin");
        std::fs::create_dir(&bin_dir).unwrap();
        write_executable(&bin_dir.join("mytool"));
        std::fs::write(bin_dir.join("plaintool"), "").unwrap();

        let config = entries(
            r#"{
                "0": {"tool": "./run.sh"},
                "1": {"tool": "mytool"},
                "2": {"tool": "./absent.sh"},
                "3": {"tool": "nowhere-to-be-found"},
                "4": {"tool": "plaintool"},
                "5": {"tool": "./data.txt"}
            }"#,
        );
        let toolchain = Toolchain::from_config(&config, false).unwrap();
        let env = Environment::empty().with("PATH", bin_dir.to_string_lossy());

        let status = toolchain.preflight(temp.path(), &env);
        assert!(!status.is_ready());
        let missing: Vec<_> = status.missing_tools.iter().map(|m| m.stage).collect();
        assert_eq!(missing, vec![2, 3, 4, 5]);
    }

    #[cfg(unix)]
    #[test]
    fn test_preflight_ready_when_every_tool_is_executable() {
        let temp = TempDir::new().unwrap();
        let bin_dir = temp.path().join("bin");
        std::fs::create_dir(&bin_dir).unwrap();
        write_executable(&bin_dir.join("mytool"));
        write_executable(&temp.path().join("run.sh"));

        let config = entries(r#"{"0": {"tool": "mytool"}, "1": {"tool": "./run.sh"}}"#);
        let toolchain = Toolchain::from_config(&config, false).unwrap();
        let env = Environment::empty().with("PATH", bin_dir.to_string_lossy());

        assert!(toolchain.preflight(temp.path(), &env).is_ready());
    }
}
