//! @ai:module:intent CSV task table loader
//! @ai:module:layer infrastructure
//! @ai:module:public_api TaskMatrix
//! @ai:module:stateless true

use crate::error::{Error, Result};
use crate::matrix::binding::HeaderSchema;
use crate::matrix::task::Task;
use std::io::Read;
use std::path::Path;

/// @ai:intent Parsed task table: typed header schema plus one task per row
#[derive(Debug, Clone)]
pub struct TaskMatrix {
    schema: HeaderSchema,
    tasks: Vec<Task>,
}

impl TaskMatrix {
    /// @ai:intent Load and parse a task table from a CSV file
    /// @ai:effects fs:read
    pub fn load(path: &Path, stage_count: usize, passthrough: &[String]) -> Result<Self> {
        let file = std::fs::File::open(path).map_err(|e| {
            Error::config(format!("failed to open task table {}: {e}", path.display()))
        })?;
        Self::from_reader(file, stage_count, passthrough)
    }

    /// @ai:intent Parse a task table from any CSV source
    /// @ai:effects io
    pub fn from_reader<R: Read>(reader: R, stage_count: usize, passthrough: &[String]) -> Result<Self> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(reader);

        let schema = HeaderSchema::from_header(csv_reader.headers()?.iter(), stage_count, passthrough)?;

        let mut tasks = Vec::new();
        for (index, record) in csv_reader.records().enumerate() {
            let record = record?;
            if record.len() != schema.columns().len() {
                return Err(Error::RowShape {
                    row: index + 1,
                    expected: schema.columns().len(),
                    found: record.len(),
                });
            }

            let raw: Vec<String> = record.iter().map(str::to_string).collect();
            let overrides = schema.overrides_for(&raw);
            tasks.push(Task {
                index,
                raw,
                overrides,
            });
        }

        tracing::debug!(
            "Parsed {} tasks over {} columns",
            tasks.len(),
            schema.columns().len()
        );

        Ok(Self { schema, tasks })
    }

    pub fn schema(&self) -> &HeaderSchema {
        &self.schema
    }

    /// @ai:intent Original header, in table order
    pub fn header(&self) -> &[String] {
        self.schema.columns()
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }
}
