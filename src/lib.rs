//! @ai:module:intent Toolchain benchmark harness library
//! @ai:module:layer application
//! @ai:module:public_api config, error, matrix, report, runner, session, tool, toolchain

pub mod config;
pub mod error;
pub mod matrix;
pub mod ordered;
pub mod report;
pub mod runner;
pub mod session;
pub mod tool;
pub mod toolchain;

pub use config::{BenchmarkConfig, ToolConfig};
pub use error::{Error, Result};
pub use matrix::{Task, TaskMatrix, TaskOverride};
pub use ordered::OrderedMap;
pub use report::{ResultTable, ResultWriter};
pub use runner::{
    BenchmarkRunner, Environment, MockProcessRunner, ProcessRunnerTrait, ResultRow,
    SystemProcessRunner, ToolInvoker,
};
pub use session::{BenchmarkSession, RunSummary};
pub use tool::{ArgValue, EnvValue, ToolSpec};
pub use toolchain::{Toolchain, ToolchainStatus};
