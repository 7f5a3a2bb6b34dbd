//! @ai:module:intent Error types for toolchain construction, task parsing and execution
//! @ai:module:layer domain
//! @ai:module:public_api Error, Result
//! @ai:module:stateless true

use thiserror::Error;

/// @ai:intent Unified error type for every harness operation
#[derive(Error, Debug)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid task column '{column}': {message}")]
    Parse { column: String, message: String },

    #[error("Task row {row} has {found} cells, header declares {expected}")]
    RowShape {
        row: usize,
        expected: usize,
        found: usize,
    },

    #[error("Field '{field}' pattern '{pattern}' matched {matches} times in tool output (expected exactly 1)")]
    Extraction {
        field: String,
        pattern: String,
        matches: usize,
    },

    #[error("Field '{field}' pattern '{pattern}' matched but its capture group did not participate")]
    UnmatchedGroup { field: String, pattern: String },

    #[error("Result table has {tasks} tasks but {results} result rows")]
    ResultShape { tasks: usize, results: usize },

    #[error("Failed to launch '{command}': {source}")]
    Process {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Task {task}, stage {stage} ({command}) failed: {source}")]
    Stage {
        task: usize,
        stage: usize,
        command: String,
        #[source]
        source: Box<Error>,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// @ai:intent Shorthand for a configuration error
    /// @ai:effects pure
    pub fn config(message: impl Into<String>) -> Self {
        Error::Config(message.into())
    }

    /// @ai:intent Shorthand for a task column parse error
    /// @ai:effects pure
    pub fn parse(column: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Parse {
            column: column.into(),
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
