//! @ai:module:intent Typed schema compiled once from the task table header
//! @ai:module:layer domain
//! @ai:module:public_api HeaderSchema, ColumnBinding, OverrideKind
//! @ai:module:stateless true

use crate::error::{Error, Result};
use crate::matrix::task::TaskOverride;
use std::collections::HashSet;

const ENV_SIGIL: char = '$';

/// @ai:intent Whether a column overrides an environment variable or an argument
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OverrideKind {
    Env,
    Arg,
}

impl OverrideKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            OverrideKind::Env => "env",
            OverrideKind::Arg => "arg",
        }
    }
}

impl std::fmt::Display for OverrideKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// @ai:intent What a single task column means
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColumnBinding {
    /// Copied to the output only
    Passthrough,
    Override {
        stage: usize,
        kind: OverrideKind,
        key: String,
    },
}

impl ColumnBinding {
    /// @ai:intent Parse an override column name: `<sigil><stage><rest>`
    /// @ai:pre column is not a passthrough column
    /// @ai:effects pure
    pub fn parse_override(column: &str, stage_count: usize) -> Result<Self> {
        let sigil = column
            .chars()
            .next()
            .ok_or_else(|| Error::parse(column, "empty column name"))?;

        if !sigil.is_ascii_punctuation() {
            return Err(Error::parse(
                column,
                "expected '$' (environment) or '@' (argument) followed by a stage index, \
                 or a column listed in passthrough_columns",
            ));
        }

        let rest = &column[1..];
        let digits = rest.bytes().take_while(u8::is_ascii_digit).count();
        if digits == 0 {
            return Err(Error::parse(column, "missing stage index after the sigil"));
        }

        let stage: usize = rest[..digits]
            .parse()
            .map_err(|_| Error::parse(column, "stage index is too large"))?;
        if stage >= stage_count {
            return Err(Error::parse(
                column,
                format!("stage index {stage} out of range (toolchain has {stage_count} stages)"),
            ));
        }

        let tail = &rest[digits..];
        let (kind, key) = if sigil == ENV_SIGIL {
            let mut chars = tail.chars();
            match chars.next() {
                Some(separator) if !separator.is_alphanumeric() => (OverrideKind::Env, chars.as_str()),
                _ => {
                    return Err(Error::parse(
                        column,
                        "expected a separator between the stage index and the variable name",
                    ))
                }
            }
        } else {
            (OverrideKind::Arg, tail)
        };

        if key.is_empty() {
            return Err(Error::parse(column, "missing override key"));
        }

        Ok(ColumnBinding::Override {
            stage,
            kind,
            key: key.to_string(),
        })
    }
}

/// @ai:intent Header columns and their bindings, in header order
#[derive(Debug, Clone, PartialEq)]
pub struct HeaderSchema {
    columns: Vec<String>,
    bindings: Vec<ColumnBinding>,
    stage_count: usize,
}

impl HeaderSchema {
    /// @ai:intent Compile the header; fails fast on the first malformed column
    /// @ai:effects pure
    pub fn from_header<I, S>(header: I, stage_count: usize, passthrough: &[String]) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut columns = Vec::new();
        let mut bindings = Vec::new();
        let mut seen = HashSet::new();

        for column in header {
            let column = column.into();
            if !seen.insert(column.clone()) {
                return Err(Error::parse(column, "duplicate column name"));
            }

            let binding = if passthrough.contains(&column) {
                ColumnBinding::Passthrough
            } else {
                ColumnBinding::parse_override(&column, stage_count)?
            };

            columns.push(column);
            bindings.push(binding);
        }

        Ok(Self {
            columns,
            bindings,
            stage_count,
        })
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn bindings(&self) -> impl Iterator<Item = (&str, &ColumnBinding)> {
        self.columns
            .iter()
            .map(String::as_str)
            .zip(self.bindings.iter())
    }

    pub fn stage_count(&self) -> usize {
        self.stage_count
    }

    /// @ai:intent Route one row's cells into per-stage overrides
    /// @ai:pre cells.len() == columns().len()
    /// @ai:effects pure
    pub fn overrides_for(&self, cells: &[String]) -> Vec<TaskOverride> {
        let mut overrides = vec![TaskOverride::default(); self.stage_count];

        for (binding, cell) in self.bindings.iter().zip(cells) {
            if let ColumnBinding::Override { stage, kind, key } = binding {
                let target = &mut overrides[*stage];
                let entry = (key.clone(), cell.clone());
                match kind {
                    OverrideKind::Env => target.env.push(entry),
                    OverrideKind::Arg => target.args.push(entry),
                }
            }
        }

        overrides
    }
}
