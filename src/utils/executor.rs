//! Dump execution abstraction for testability
//!
//! This module provides a trait-based abstraction for running a dump tool
//! against a single database, enabling dependency injection and mocking for tests.

use super::command::{run_command, DumpCommand};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

/// Why a single dump did not produce a backup
#[derive(Debug, thiserror::Error)]
pub enum DumpError {
    #[error("Dump binary '{program}' not found: {reason}")]
    BinaryNotFound { program: String, reason: String },

    #[error("Failed to start {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("I/O error on {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to start async runtime: {0}")]
    Runtime(#[source] std::io::Error),

    #[error("{program} timed out after {timeout:?}{}", stderr_suffix(.stderr))]
    Timeout {
        program: String,
        timeout: Duration,
        stderr: String,
    },

    #[error("{program} failed with exit code {code:?}: {stderr}")]
    Failed {
        program: String,
        code: Option<i32>,
        stderr: String,
    },

    #[error("{program} exited successfully but {path:?} was not created")]
    MissingOutput { program: String, path: PathBuf },
}

fn stderr_suffix(stderr: &str) -> String {
    if stderr.is_empty() {
        String::new()
    } else {
        format!(": {}", stderr)
    }
}

/// One dump invocation for one database
#[derive(Debug, Clone)]
pub struct DumpRequest {
    pub database: String,
    pub command: DumpCommand,
    pub output: PathBuf,
    /// The tool writes to stdout and the executor must persist it to `output`
    pub capture_stdout: bool,
    pub timeout: Duration,
}

/// Abstraction for dump execution, enabling mocking in tests
pub trait DumpExecutor: Send + Sync {
    /// Run the dump; `Ok` means the process exited with status zero
    fn execute(&self, request: &DumpRequest) -> Result<(), DumpError>;
}

/// Default implementation running the real dump binaries
#[derive(Debug, Clone, Default)]
pub struct RealExecutor {
    binaries: HashMap<String, PathBuf>,
}

impl RealExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use explicit paths for some binaries instead of searching PATH
    pub fn with_binaries(binaries: HashMap<String, PathBuf>) -> Self {
        Self { binaries }
    }

    /// Resolve a dump binary: configured path first, then PATH lookup
    pub fn resolve_binary(&self, program: &str) -> Result<PathBuf, DumpError> {
        if let Some(path) = self.binaries.get(program) {
            if path.exists() {
                return Ok(path.clone());
            }
            return Err(DumpError::BinaryNotFound {
                program: program.to_string(),
                reason: format!("configured path {:?} does not exist", path),
            });
        }

        which::which(program).map_err(|e| DumpError::BinaryNotFound {
            program: program.to_string(),
            reason: e.to_string(),
        })
    }
}

impl DumpExecutor for RealExecutor {
    fn execute(&self, request: &DumpRequest) -> Result<(), DumpError> {
        let binary = self.resolve_binary(request.command.program())?;

        prepare_output(&request.output)?;

        let stdout_file = request.capture_stdout.then_some(request.output.as_path());
        let result = run_command(&binary, &request.command, stdout_file, request.timeout);

        if result.is_err() {
            discard_partial_output(&request.output);
        }

        result.map(|_| ())
    }
}

/// Make sure the output directory exists and no stale file can be mistaken
/// for a fresh dump
fn prepare_output(output: &Path) -> Result<(), DumpError> {
    if let Some(parent) = output.parent() {
        fs::create_dir_all(parent).map_err(|source| DumpError::Io {
            path: parent.to_path_buf(),
            source,
        })?;
    }

    if output.exists() {
        fs::remove_file(output).map_err(|source| DumpError::Io {
            path: output.to_path_buf(),
            source,
        })?;
    }

    Ok(())
}

fn discard_partial_output(output: &Path) {
    if output.exists() {
        if let Err(e) = fs::remove_file(output) {
            debug!("Failed to remove partial dump {:?}: {}", output, e);
        }
    }
}

/// A mock executor for testing that records calls and returns configured responses
/// Available for use in external test crates
#[allow(dead_code)]
pub mod mock {
    use super::*;
    use std::sync::{Arc, Mutex};

    /// Recorded dump invocation
    #[derive(Clone, Debug)]
    pub struct DumpCall {
        pub database: String,
        pub program: String,
        pub args: Vec<String>,
        pub output: PathBuf,
        pub capture_stdout: bool,
        pub timeout: Duration,
    }

    /// Response configuration for mock
    #[derive(Clone, Debug)]
    pub enum MockResponse {
        /// Exit zero and write the output file
        Success,
        /// Exit zero without writing anything
        SuccessWithoutOutput,
        Failure { stderr: String, exit_code: i32 },
        Timeout,
    }

    impl Default for MockResponse {
        fn default() -> Self {
            MockResponse::Success
        }
    }

    /// Mock executor for testing
    #[derive(Clone, Default)]
    pub struct MockExecutor {
        /// Recorded dump invocations
        pub calls: Arc<Mutex<Vec<DumpCall>>>,
        /// Pre-configured responses: database name -> response
        responses: Arc<Mutex<HashMap<String, MockResponse>>>,
        /// Default response when no specific response is configured
        default_response: Arc<Mutex<MockResponse>>,
    }

    impl MockExecutor {
        pub fn new() -> Self {
            Self::default()
        }

        /// Configure a response for a specific database
        pub fn expect(self, database: &str, response: MockResponse) -> Self {
            self.responses
                .lock()
                .unwrap()
                .insert(database.to_string(), response);
            self
        }

        /// Set the default response for unconfigured databases
        pub fn with_default_response(self, response: MockResponse) -> Self {
            *self.default_response.lock().unwrap() = response;
            self
        }

        /// Get all recorded calls
        pub fn get_calls(&self) -> Vec<DumpCall> {
            self.calls.lock().unwrap().clone()
        }

        /// Databases dumped, in call order
        pub fn dumped_databases(&self) -> Vec<String> {
            self.calls
                .lock()
                .unwrap()
                .iter()
                .map(|c| c.database.clone())
                .collect()
        }

        /// Number of dump processes "started"
        pub fn call_count(&self) -> usize {
            self.calls.lock().unwrap().len()
        }

        fn record_call(&self, request: &DumpRequest) {
            self.calls.lock().unwrap().push(DumpCall {
                database: request.database.clone(),
                program: request.command.program().to_string(),
                args: request.command.args().to_vec(),
                output: request.output.clone(),
                capture_stdout: request.capture_stdout,
                timeout: request.timeout,
            });
        }

        fn get_response(&self, database: &str) -> MockResponse {
            self.responses
                .lock()
                .unwrap()
                .get(database)
                .cloned()
                .unwrap_or_else(|| self.default_response.lock().unwrap().clone())
        }
    }

    impl DumpExecutor for MockExecutor {
        fn execute(&self, request: &DumpRequest) -> Result<(), DumpError> {
            self.record_call(request);
            let program = request.command.program().to_string();

            match self.get_response(&request.database) {
                MockResponse::Success => {
                    prepare_output(&request.output)?;
                    let content = format!("-- dump of {}\n", request.database);
                    fs::write(&request.output, content).map_err(|source| DumpError::Io {
                        path: request.output.clone(),
                        source,
                    })
                }
                MockResponse::SuccessWithoutOutput => Ok(()),
                MockResponse::Failure { stderr, exit_code } => Err(DumpError::Failed {
                    program,
                    code: Some(exit_code),
                    stderr,
                }),
                MockResponse::Timeout => Err(DumpError::Timeout {
                    program,
                    timeout: request.timeout,
                    stderr: String::new(),
                }),
            }
        }
    }
}
