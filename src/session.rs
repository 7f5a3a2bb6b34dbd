//! @ai:module:intent Wire configuration, toolchain, task matrix, runner and writer into one run
//! @ai:module:layer application
//! @ai:module:public_api BenchmarkSession, RunSummary
//! @ai:module:stateless false

use crate::config::BenchmarkConfig;
use crate::error::{Error, Result};
use crate::matrix::TaskMatrix;
use crate::report::{ResultTable, ResultWriter, ResultWriterTrait};
use crate::runner::{BenchmarkRunner, Environment, PlannedInvocation, ProcessRunnerTrait, ToolInvoker};
use crate::toolchain::{Toolchain, ToolchainStatus};
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// @ai:intent Outcome of a completed run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub tasks: usize,
    pub columns: usize,
    pub result_path: PathBuf,
}

/// @ai:intent A fully constructed benchmark, ready to run
pub struct BenchmarkSession<P: ProcessRunnerTrait> {
    runner: BenchmarkRunner<P>,
    result_path: PathBuf,
}

impl<P: ProcessRunnerTrait> BenchmarkSession<P> {
    /// @ai:intent Build toolchain and task matrix from configuration; no tool runs here
    /// @ai:effects fs:read
    pub fn from_config(config: &BenchmarkConfig, process: Arc<P>, base_env: Environment) -> Result<Self> {
        let toolchain = Toolchain::from_config(&config.toolchain, config.strict_fields)?;
        let matrix = TaskMatrix::load(&config.bench_path, toolchain.len(), &config.passthrough_columns)?;
        Self::assemble(config, toolchain, matrix, process, base_env)
    }

    /// @ai:intent Same as from_config with the task table read from a CSV source
    /// @ai:effects io
    pub fn from_reader<R: Read>(
        config: &BenchmarkConfig,
        tasks: R,
        process: Arc<P>,
        base_env: Environment,
    ) -> Result<Self> {
        let toolchain = Toolchain::from_config(&config.toolchain, config.strict_fields)?;
        let matrix = TaskMatrix::from_reader(tasks, toolchain.len(), &config.passthrough_columns)?;
        Self::assemble(config, toolchain, matrix, process, base_env)
    }

    fn assemble(
        config: &BenchmarkConfig,
        toolchain: Toolchain,
        matrix: TaskMatrix,
        process: Arc<P>,
        base_env: Environment,
    ) -> Result<Self> {
        let fields = toolchain.field_names();
        if let Some(clash) = fields.iter().find(|field| matrix.header().contains(*field)) {
            return Err(Error::config(format!(
                "field '{clash}' has the same name as a task table column"
            )));
        }

        tracing::info!(
            "Loaded {} tasks for a {}-stage toolchain ({} result fields)",
            matrix.len(),
            toolchain.len(),
            fields.len()
        );

        let invoker = ToolInvoker::new(process, base_env);
        Ok(Self {
            runner: BenchmarkRunner::new(toolchain, matrix, config.app_path.clone(), invoker),
            result_path: config.result_path.clone(),
        })
    }

    pub fn runner(&self) -> &BenchmarkRunner<P> {
        &self.runner
    }

    pub fn result_path(&self) -> &Path {
        &self.result_path
    }

    /// @ai:intent Check every stage's command can be found
    /// @ai:effects fs:read
    pub fn preflight(&self) -> ToolchainStatus {
        self.runner
            .toolchain()
            .preflight(self.runner.app_path(), self.runner.invoker().base_env())
    }

    pub fn plan(&self) -> Vec<PlannedInvocation> {
        self.runner.plan()
    }

    /// @ai:intent Run every task and assemble the result table in memory
    /// @ai:effects io
    pub fn execute(&self) -> Result<ResultTable> {
        let results = self.runner.run_all()?;
        let matrix = self.runner.matrix();
        ResultTable::assemble(
            matrix.header(),
            matrix.tasks(),
            &results,
            &self.runner.toolchain().field_names(),
        )
    }

    /// @ai:intent Run every task, then write the result table; nothing is written on failure
    /// @ai:effects io, fs:write
    pub fn run(&self) -> Result<RunSummary> {
        let table = self.execute()?;
        ResultWriter::new().write(&table, &self.result_path)?;

        Ok(RunSummary {
            tasks: table.rows.len(),
            columns: table.header.len(),
            result_path: self.result_path.clone(),
        })
    }
}
