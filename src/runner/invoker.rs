//! @ai:module:intent Merge overrides onto a stage's defaults, launch it, extract its fields
//! @ai:module:layer application
//! @ai:module:public_api ToolInvoker
//! @ai:module:stateless true

use crate::error::Result;
use crate::matrix::TaskOverride;
use crate::ordered::OrderedMap;
use crate::runner::process::{Environment, ProcessRequest, ProcessRunnerTrait};
use crate::tool::{render_args, ToolSpec};
use std::path::Path;
use std::sync::Arc;

/// @ai:intent Invokes toolchain stages through a process runner
pub struct ToolInvoker<P: ProcessRunnerTrait> {
    process: Arc<P>,
    base_env: Environment,
}

impl<P: ProcessRunnerTrait> ToolInvoker<P> {
    /// @ai:intent Create an invoker with an explicit base environment
    /// @ai:effects pure
    pub fn new(process: Arc<P>, base_env: Environment) -> Self {
        Self { process, base_env }
    }

    pub fn base_env(&self) -> &Environment {
        &self.base_env
    }

    /// @ai:intent Resolve the launch request for one stage of one task
    /// @ai:effects pure
    pub fn prepare(&self, tool: &ToolSpec, app_path: &Path, overrides: &TaskOverride) -> ProcessRequest {
        let env = self.base_env.overlay(&tool.effective_env(&overrides.env));
        let args = render_args(&tool.effective_args(&overrides.args));

        ProcessRequest {
            program: tool.command().to_string(),
            args,
            env: env.vars().clone(),
            working_dir: app_path.to_path_buf(),
        }
    }

    /// @ai:intent Run one stage and return its extracted fields
    /// @ai:post every declared field is present in the result
    /// @ai:effects io
    pub fn run(
        &self,
        tool: &ToolSpec,
        app_path: &Path,
        overrides: &TaskOverride,
    ) -> Result<OrderedMap<String>> {
        let request = self.prepare(tool, app_path, overrides);
        tracing::debug!("Running: {}", request.display_command());

        let output = self.process.run(&request)?;
        tracing::debug!(
            "{} exited with {:?} ({} bytes stdout, {} bytes stderr)",
            request.program,
            output.exit_code,
            output.stdout.len(),
            output.stderr.len()
        );

        if !output.success() {
            tracing::warn!(
                "{} exited with status {:?}; extracting fields anyway",
                request.program,
                output.exit_code
            );
        }

        tool.extract(&output.stdout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::runner::process::{MockProcessRunner, SystemProcessRunner};
    use crate::tool::{ArgValue, EnvValue, FieldExtractor};
    use pretty_assertions::assert_eq;
    use std::collections::BTreeMap;
    use tempfile::TempDir;

    fn fields(pairs: &[(&str, &str)]) -> FieldExtractor {
        let greps: OrderedMap<String> = pairs
            .iter()
            .map(|(name, pattern)| (*name, pattern.to_string()))
            .collect();
        FieldExtractor::compile(&greps).unwrap()
    }

    fn system_env() -> Environment {
        Environment::capture()
            .vars()
            .iter()
            .filter(|(key, _)| *key == "PATH")
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    #[test]
    fn test_prepare_merges_defaults_and_overrides() {
        let tool = ToolSpec::new(
            "bench",
            BTreeMap::from([
                ("THREADS".to_string(), EnvValue::Set("1".to_string())),
                ("NOISY".to_string(), EnvValue::Unset),
            ]),
            [("--size", ArgValue::Number(10u64.into())), ("--fast", ArgValue::Flag)]
                .into_iter()
                .collect(),
            FieldExtractor::default(),
        );
        let base = Environment::empty().with("HOME", "/home/bench").with("NOISY", "yes");
        let invoker = ToolInvoker::new(Arc::new(MockProcessRunner::new("")), base);

        let overrides = TaskOverride {
            env: vec![("THREADS".to_string(), "4".to_string())],
            args: vec![("--size".to_string(), "20".to_string())],
        };
        let request = invoker.prepare(&tool, Path::new("/srv/app"), &overrides);

        assert_eq!(request.program, "bench");
        assert_eq!(request.args, vec!["--size=\"20\"", "--fast"]);
        assert_eq!(
            request.env,
            BTreeMap::from([
                ("HOME".to_string(), "/home/bench".to_string()),
                ("THREADS".to_string(), "4".to_string()),
            ])
        );
        assert_eq!(request.working_dir, Path::new("/srv/app"));
    }

    #[test]
    fn test_echo_scenario() {
        let temp = TempDir::new().unwrap();
        let tool = ToolSpec::new(
            "echo",
            BTreeMap::new(),
            [("--x", ArgValue::Number(5u64.into()))].into_iter().collect(),
            fields(&[("val", r"x=(\d+)")]),
        );
        let invoker = ToolInvoker::new(Arc::new(SystemProcessRunner::new()), system_env());

        let values = invoker
            .run(&tool, temp.path(), &TaskOverride::default())
            .unwrap();

        let expected: OrderedMap<String> = [("val", "5".to_string())].into_iter().collect();
        assert_eq!(values, expected);
    }

    #[test]
    fn test_nonzero_exit_is_not_a_failure() {
        let temp = TempDir::new().unwrap();
        let tool = ToolSpec::new(
            "sh",
            BTreeMap::new(),
            [("-c", ArgValue::Flag), ("echo score=7; exit 1", ArgValue::Flag)]
                .into_iter()
                .collect(),
            fields(&[("score", r"score=(\d+)")]),
        );
        let invoker = ToolInvoker::new(Arc::new(SystemProcessRunner::new()), system_env());

        let values = invoker
            .run(&tool, temp.path(), &TaskOverride::default())
            .unwrap();
        assert_eq!(values.get("score").map(String::as_str), Some("7"));
    }

    #[test]
    fn test_missing_metric_fails() {
        let tool = ToolSpec::new(
            "bench",
            BTreeMap::new(),
            OrderedMap::new(),
            fields(&[("time", r"time=(\d+)")]),
        );
        let invoker = ToolInvoker::new(
            Arc::new(MockProcessRunner::new("no metrics printed")),
            Environment::empty(),
        );

        let result = invoker.run(&tool, Path::new("."), &TaskOverride::default());
        assert!(matches!(result, Err(Error::Extraction { .. })));
    }
}
