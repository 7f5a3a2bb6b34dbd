//! @ai:module:intent Process boundary: base environment, launch requests and runners
//! @ai:module:layer infrastructure
//! @ai:module:public_api Environment, ProcessRequest, ProcessOutput, ProcessRunnerTrait, SystemProcessRunner, MockProcessRunner

use crate::error::{Error, Result};
use crate::tool::EnvValue;
use std::collections::{BTreeMap, HashMap};
use std::ffi::OsString;
use std::path::PathBuf;
use std::process::Command;
use std::sync::Mutex;

/// @ai:intent Explicit snapshot of the environment every tool inherits
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Environment {
    vars: BTreeMap<String, String>,
}

impl Environment {
    /// @ai:intent Snapshot the current process environment (non-UTF-8 entries are skipped)
    /// @ai:effects env:read
    pub fn capture() -> Self {
        Self::from_os_vars(std::env::vars_os())
    }

    /// @ai:intent Build a snapshot from raw OS pairs, logging each entry that is not UTF-8
    /// @ai:effects pure
    pub fn from_os_vars<I>(vars: I) -> Self
    where
        I: IntoIterator<Item = (OsString, OsString)>,
    {
        vars.into_iter()
            .filter_map(|(key, value)| match (key.into_string(), value.into_string()) {
                (Ok(key), Ok(value)) => Some((key, value)),
                (key, _) => {
                    let name = match key {
                        Ok(key) => key,
                        Err(raw) => raw.to_string_lossy().into_owned(),
                    };
                    tracing::debug!("Skipping non UTF-8 environment variable {}", name);
                    None
                }
            })
            .collect()
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.vars.insert(key.into(), value.into());
        self
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.vars.get(key).map(String::as_str)
    }

    pub fn vars(&self) -> &BTreeMap<String, String> {
        &self.vars
    }

    /// @ai:intent Overlay stage settings onto the snapshot; Unset removes the variable
    /// @ai:effects pure
    pub fn overlay(&self, env: &BTreeMap<String, EnvValue>) -> Environment {
        let mut vars = self.vars.clone();
        for (key, value) in env {
            match value {
                EnvValue::Set(text) => {
                    vars.insert(key.clone(), text.clone());
                }
                EnvValue::Unset => {
                    vars.remove(key);
                }
            }
        }
        Environment { vars }
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Environment {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            vars: iter
                .into_iter()
                .map(|(key, value)| (key.into(), value.into()))
                .collect(),
        }
    }
}

/// @ai:intent Fully resolved description of one tool launch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessRequest {
    pub program: String,
    pub args: Vec<String>,
    /// Complete child environment; nothing else is inherited
    pub env: BTreeMap<String, String>,
    pub working_dir: PathBuf,
}

impl ProcessRequest {
    /// @ai:intent Human-readable command line for logs and dry runs
    /// @ai:effects pure
    pub fn display_command(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// @ai:intent Captured result of a finished process
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessOutput {
    /// None when the process was terminated by a signal
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl ProcessOutput {
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }
}

/// @ai:intent Trait for launching a tool and waiting for its output
pub trait ProcessRunnerTrait: Send + Sync {
    /// @ai:intent Run the request to completion, capturing stdout and stderr
    fn run(&self, request: &ProcessRequest) -> Result<ProcessOutput>;
}

/// @ai:intent Runs tools as real child processes
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemProcessRunner;

impl SystemProcessRunner {
    pub fn new() -> Self {
        Self
    }
}

impl ProcessRunnerTrait for SystemProcessRunner {
    /// @ai:intent Spawn the program and block until it exits
    /// @ai:effects io
    fn run(&self, request: &ProcessRequest) -> Result<ProcessOutput> {
        let output = Command::new(&request.program)
            .args(&request.args)
            .current_dir(&request.working_dir)
            .env_clear()
            .envs(&request.env)
            .output()
            .map_err(|source| Error::Process {
                command: request.program.clone(),
                source,
            })?;

        Ok(ProcessOutput {
            exit_code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}

/// @ai:intent Scripted runner for tests; records every request it receives
#[derive(Debug, Default)]
pub struct MockProcessRunner {
    default_stdout: String,
    outputs: HashMap<String, String>,
    requests: Mutex<Vec<ProcessRequest>>,
}

impl MockProcessRunner {
    /// @ai:intent Create a mock that prints the same stdout for every program
    /// @ai:effects pure
    pub fn new(stdout: impl Into<String>) -> Self {
        Self {
            default_stdout: stdout.into(),
            ..Default::default()
        }
    }

    /// @ai:intent Script the stdout of one program
    /// @ai:effects pure
    pub fn with_output(mut self, program: impl Into<String>, stdout: impl Into<String>) -> Self {
        self.outputs.insert(program.into(), stdout.into());
        self
    }

    /// @ai:intent Requests received so far, in order
    pub fn requests(&self) -> Vec<ProcessRequest> {
        self.requests
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    pub fn invocation_count(&self) -> usize {
        self.requests
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }
}

impl ProcessRunnerTrait for MockProcessRunner {
    fn run(&self, request: &ProcessRequest) -> Result<ProcessOutput> {
        self.requests
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(request.clone());

        let stdout = self
            .outputs
            .get(&request.program)
            .unwrap_or(&self.default_stdout)
            .clone();

        Ok(ProcessOutput {
            exit_code: Some(0),
            stdout,
            stderr: String::new(),
        })
    }
}
