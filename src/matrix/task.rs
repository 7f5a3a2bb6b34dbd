//! @ai:module:intent Task definitions derived from task table rows
//! @ai:module:layer domain
//! @ai:module:public_api Task, TaskOverride
//! @ai:module:stateless true

/// @ai:intent Per-stage overrides for one task, raw cell text in column order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskOverride {
    pub env: Vec<(String, String)>,
    pub args: Vec<(String, String)>,
}

impl TaskOverride {
    pub fn is_empty(&self) -> bool {
        self.env.is_empty() && self.args.is_empty()
    }
}

/// @ai:intent One benchmark task: the raw row plus one override set per stage
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Task {
    /// Zero-based position in the task table
    pub index: usize,
    /// Cells aligned with the header, preserved verbatim for output
    pub raw: Vec<String>,
    pub overrides: Vec<TaskOverride>,
}

impl Task {
    /// @ai:intent Overrides for a stage; stages without columns get pure defaults
    /// @ai:effects pure
    pub fn overrides_for(&self, stage: usize) -> &TaskOverride {
        const NO_OVERRIDES: &TaskOverride = &TaskOverride {
            env: Vec::new(),
            args: Vec::new(),
        };
        self.overrides.get(stage).unwrap_or(NO_OVERRIDES)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overrides_for_missing_stage_is_empty() {
        let task = Task {
            index: 0,
            raw: vec![],
            overrides: vec![TaskOverride {
                env: vec![("A".to_string(), "1".to_string())],
                args: vec![],
            }],
        };
        assert!(!task.overrides_for(0).is_empty());
        assert!(task.overrides_for(5).is_empty());
    }
}
