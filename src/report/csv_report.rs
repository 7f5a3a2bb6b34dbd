//! @ai:module:intent Join task rows with extracted fields and write the result table
//! @ai:module:layer infrastructure
//! @ai:module:public_api ResultTable, ResultWriter, ResultWriterTrait
//! @ai:module:stateless true

use crate::error::{Error, Result};
use crate::matrix::Task;
use crate::runner::ResultRow;
use std::path::Path;
use tempfile::NamedTempFile;

/// @ai:intent Final output table: header plus one row per task
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultTable {
    pub header: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl ResultTable {
    /// @ai:intent Join each task's raw cells with its result row
    /// @ai:pre tasks and results are index-aligned
    /// @ai:post header = task columns followed by field names; order does not depend on map internals
    /// @ai:effects pure
    pub fn assemble(
        columns: &[String],
        tasks: &[Task],
        results: &[ResultRow],
        fields: &[String],
    ) -> Result<Self> {
        if tasks.len() != results.len() {
            return Err(Error::ResultShape {
                tasks: tasks.len(),
                results: results.len(),
            });
        }

        let header = columns.iter().chain(fields).cloned().collect();

        let rows = tasks
            .iter()
            .zip(results)
            .map(|(task, result)| {
                task.raw
                    .iter()
                    .cloned()
                    .chain(
                        fields
                            .iter()
                            .map(|field| result.get(field).cloned().unwrap_or_default()),
                    )
                    .collect()
            })
            .collect();

        Ok(Self { header, rows })
    }
}

/// @ai:intent Trait for result table output
pub trait ResultWriterTrait: Send + Sync {
    /// @ai:intent Write the table, replacing any existing file
    fn write(&self, table: &ResultTable, output_path: &Path) -> Result<()>;
}

/// @ai:intent Writes result tables as CSV
pub struct ResultWriter;

impl ResultWriter {
    /// @ai:intent Create a new result writer
    /// @ai:effects pure
    pub fn new() -> Self {
        Self
    }
}

impl Default for ResultWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl ResultWriterTrait for ResultWriter {
    /// @ai:intent Write CSV to a sibling temp file, then rename it over the destination
    /// @ai:effects fs:write
    fn write(&self, table: &ResultTable, output_path: &Path) -> Result<()> {
        let dir = match output_path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        std::fs::create_dir_all(dir)?;

        let mut staging = NamedTempFile::new_in(dir)?;
        {
            let mut writer = csv::Writer::from_writer(&mut staging);
            writer.write_record(&table.header)?;
            for row in &table.rows {
                writer.write_record(row)?;
            }
            writer.flush()?;
        }

        staging
            .persist(output_path)
            .map_err(|e| Error::Io(e.error))?;

        tracing::info!(
            "Written {} result rows into {}",
            table.rows.len(),
            output_path.display()
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matrix::TaskMatrix;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    fn sample_table() -> ResultTable {
        let matrix = TaskMatrix::from_reader("@0-n,$0_MODE\n1,fast\n2,slow\n".as_bytes(), 1, &[]).unwrap();
        // inserted in the opposite order of the declared fields
        let results: Vec<ResultRow> = vec![
            [("b", "x1".to_string()), ("a", "y1".to_string())].into_iter().collect(),
            [("b", "x2".to_string()), ("a", "y2".to_string())].into_iter().collect(),
        ];
        ResultTable::assemble(matrix.header(), matrix.tasks(), &results, &strings(&["a", "b"])).unwrap()
    }

    #[test]
    fn test_column_order_is_stable() {
        let table = sample_table();
        assert_eq!(table.header, strings(&["@0-n", "$0_MODE", "a", "b"]));
        assert_eq!(table.rows[0], strings(&["1", "fast", "y1", "x1"]));
        assert_eq!(table.rows[1], strings(&["2", "slow", "y2", "x2"]));
    }

    #[test]
    fn test_assemble_rejects_misaligned_results() {
        let matrix = TaskMatrix::from_reader("@0-n\n1\n".as_bytes(), 1, &[]).unwrap();
        let result = ResultTable::assemble(matrix.header(), matrix.tasks(), &[], &[]);
        assert!(matches!(
            result,
            Err(Error::ResultShape {
                tasks: 1,
                results: 0
            })
        ));
    }

    #[test]
    fn test_write_overwrites_existing_file() {
        let temp = TempDir::new().unwrap();
        let output = temp.path().join("nested").join("results.csv");
        std::fs::create_dir_all(output.parent().unwrap()).unwrap();
        std::fs::write(&output, "stale content\n").unwrap();

        ResultWriter::new().write(&sample_table(), &output).unwrap();

        let content = std::fs::read_to_string(&output).unwrap();
        assert_eq!(content, "@0-n,$0_MODE,a,b\n1,fast,y1,x1\n2,slow,y2,x2\n");
    }

    #[test]
    fn test_write_quotes_cells_with_commas() {
        let temp = TempDir::new().unwrap();
        let output = temp.path().join("results.csv");
        let table = ResultTable {
            header: strings(&["@0--mode", "time"]),
            rows: vec![strings(&["a, b", "1.5"])],
        };

        ResultWriter::new().write(&table, &output).unwrap();
        let content = std::fs::read_to_string(&output).unwrap();
        assert_eq!(content, "@0--mode,time\n\"a, b\",1.5\n");
    }
}
