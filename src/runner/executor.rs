//! @ai:module:intent Sequential execution of every task through the toolchain
//! @ai:module:layer application
//! @ai:module:public_api BenchmarkRunner, ResultRow, PlannedInvocation
//! @ai:module:stateless false

use crate::error::{Error, Result};
use crate::matrix::{Task, TaskMatrix};
use crate::ordered::OrderedMap;
use crate::runner::invoker::ToolInvoker;
use crate::runner::process::{ProcessRequest, ProcessRunnerTrait};
use crate::toolchain::Toolchain;
use std::path::{Path, PathBuf};

/// Extracted field name to value, one per task
pub type ResultRow = OrderedMap<String>;

/// @ai:intent One resolved launch of the plan, for dry runs
#[derive(Debug, Clone)]
pub struct PlannedInvocation {
    /// Zero-based task index
    pub task: usize,
    pub stage: usize,
    pub request: ProcessRequest,
}

/// @ai:intent Owns the toolchain and task matrix and drives them task by task
pub struct BenchmarkRunner<P: ProcessRunnerTrait> {
    toolchain: Toolchain,
    matrix: TaskMatrix,
    app_path: PathBuf,
    invoker: ToolInvoker<P>,
}

impl<P: ProcessRunnerTrait> BenchmarkRunner<P> {
    /// @ai:intent Create a runner
    /// @ai:pre matrix was parsed against toolchain.len() stages
    /// @ai:effects pure
    pub fn new(
        toolchain: Toolchain,
        matrix: TaskMatrix,
        app_path: PathBuf,
        invoker: ToolInvoker<P>,
    ) -> Self {
        Self {
            toolchain,
            matrix,
            app_path,
            invoker,
        }
    }

    pub fn toolchain(&self) -> &Toolchain {
        &self.toolchain
    }

    pub fn matrix(&self) -> &TaskMatrix {
        &self.matrix
    }

    pub fn app_path(&self) -> &Path {
        &self.app_path
    }

    pub fn invoker(&self) -> &ToolInvoker<P> {
        &self.invoker
    }

    /// @ai:intent Run every stage for one task, merging their fields
    /// @ai:post later stages overwrite same-named fields of earlier ones
    /// @ai:effects io
    pub fn run_task(&self, task: &Task) -> Result<ResultRow> {
        let mut row = ResultRow::new();

        for (stage, tool) in self.toolchain.stages().iter().enumerate() {
            let fields = self
                .invoker
                .run(tool, &self.app_path, task.overrides_for(stage))
                .map_err(|e| Error::Stage {
                    task: task.index + 1,
                    stage,
                    command: tool.command().to_string(),
                    source: Box::new(e),
                })?;
            row.extend(fields);
        }

        Ok(row)
    }

    /// @ai:intent Run all tasks in table order; the first failure aborts the run
    /// @ai:post result i belongs to task i
    /// @ai:effects io
    pub fn run_all(&self) -> Result<Vec<ResultRow>> {
        let total = self.matrix.len();
        let mut results = Vec::with_capacity(total);

        for task in self.matrix.tasks() {
            tracing::info!("[{}/{}] Benchmarking task", task.index + 1, total);
            results.push(self.run_task(task)?);
        }

        Ok(results)
    }

    /// @ai:intent Every launch the run would perform, without performing any
    /// @ai:effects pure
    pub fn plan(&self) -> Vec<PlannedInvocation> {
        self.matrix
            .tasks()
            .iter()
            .flat_map(|task| {
                self.toolchain
                    .stages()
                    .iter()
                    .enumerate()
                    .map(move |(stage, tool)| PlannedInvocation {
                        task: task.index,
                        stage,
                        request: self.invoker.prepare(
                            tool,
                            &self.app_path,
                            task.overrides_for(stage),
                        ),
                    })
            })
            .collect()
    }
}
