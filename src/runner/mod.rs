//! @ai:module:intent Tool invocation and sequential benchmark execution
//! @ai:module:layer application
//! @ai:module:public_api BenchmarkRunner, ToolInvoker, ProcessRunnerTrait, SystemProcessRunner, MockProcessRunner, Environment

pub mod executor;
pub mod invoker;
pub mod process;

pub use executor::{BenchmarkRunner, PlannedInvocation, ResultRow};
pub use invoker::ToolInvoker;
pub use process::{
    Environment, MockProcessRunner, ProcessOutput, ProcessRequest, ProcessRunnerTrait,
    SystemProcessRunner,
};
