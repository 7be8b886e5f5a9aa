//! Common executor trait and types

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::Result;

/// Per-request execution constraints
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionOptions {
    /// Wall-clock deadline, enforced from the host
    #[serde(default = "default_timeout", with = "humantime_serde")]
    pub timeout: Duration,
    /// Container memory ceiling (e.g. "256m", "1g")
    #[serde(default = "default_memory_limit")]
    pub memory_limit: String,
    /// CPU quota (number of CPUs)
    #[serde(default = "default_cpu_limit")]
    pub cpu_limit: f64,
    /// Disable network access inside the container
    #[serde(default = "default_network_disabled")]
    pub network_disabled: bool,
}

fn default_timeout() -> Duration {
    Duration::from_secs(30)
}

fn default_memory_limit() -> String {
    "256m".to_string()
}

fn default_cpu_limit() -> f64 {
    1.0
}

fn default_network_disabled() -> bool {
    true
}

impl Default for ExecutionOptions {
    fn default() -> Self {
        ExecutionOptions {
            timeout: default_timeout(),
            memory_limit: default_memory_limit(),
            cpu_limit: default_cpu_limit(),
            network_disabled: default_network_disabled(),
        }
    }
}

impl ExecutionOptions {
    /// Derive per-request defaults from the executor configuration
    pub fn from_config(config: &crate::config::ExecutorConfig) -> Self {
        ExecutionOptions {
            timeout: config.default_timeout,
            memory_limit: config.default_memory_limit.clone(),
            cpu_limit: config.cpu_limit,
            network_disabled: config.network_disabled,
        }
    }
}

/// Request to execute code
///
/// Immutable once constructed; one request maps to exactly one sandboxed
/// execution and is discarded afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionRequest {
    /// The code to execute (untrusted, arbitrary size)
    pub code: String,
    /// Language identifier, resolved through the static registry
    pub language: String,
    /// Execution constraints
    #[serde(default)]
    pub options: ExecutionOptions,
}

impl ExecutionRequest {
    /// Create a new execution request with default options
    pub fn new(code: impl Into<String>, language: impl Into<String>) -> Self {
        ExecutionRequest {
            code: code.into(),
            language: language.into(),
            options: ExecutionOptions::default(),
        }
    }

    /// Set the wall-clock deadline
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.options.timeout = timeout;
        self
    }

    /// Set the memory ceiling
    pub fn with_memory_limit(mut self, limit: impl Into<String>) -> Self {
        self.options.memory_limit = limit.into();
        self
    }

    /// Set the CPU quota
    pub fn with_cpu_limit(mut self, cpus: f64) -> Self {
        self.options.cpu_limit = cpus;
        self
    }

    /// Enable or disable network access
    pub fn with_network_disabled(mut self, disabled: bool) -> Self {
        self.options.network_disabled = disabled;
        self
    }
}

/// Terminal state of an execution
///
/// Every run ends in exactly one of these; there are no automatic retries,
/// and a caller-initiated retry is a wholly new session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionStatus {
    /// The program exited on its own before the deadline
    Completed,
    /// The deadline elapsed and the sandbox was forcibly terminated
    TimedOut,
    /// The launch itself failed (engine unreachable, bad invocation)
    Failed,
}

/// Exit code reported when the deadline elapses, matching the convention
/// of coreutils `timeout`
pub const TIMEOUT_EXIT_CODE: i32 = 124;

/// Exit code reported when the sandbox could not be launched at all
pub const LAUNCH_FAILURE_EXIT_CODE: i32 = -1;

/// Result of code execution
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionResult {
    /// Terminal state the supervisor reached
    pub status: ExecutionStatus,
    /// Process exit code: 0 on success, the program's own code on failure,
    /// 124 on timeout, -1 when the launch failed
    pub exit_code: i32,
    /// Captured standard output (may be partial on timeout)
    pub stdout: String,
    /// Captured standard error (may be partial on timeout)
    pub stderr: String,
    /// Host-measured wall-clock duration from launch to termination
    #[serde(with = "humantime_serde")]
    pub execution_time: Duration,
    /// Peak memory usage in bytes, when the runtime reports it
    pub memory_used: Option<u64>,
}

impl ExecutionResult {
    /// The program ran to completion (with any exit code)
    pub fn completed(exit_code: i32, stdout: String, stderr: String, elapsed: Duration) -> Self {
        ExecutionResult {
            status: ExecutionStatus::Completed,
            exit_code,
            stdout,
            stderr,
            execution_time: elapsed,
            memory_used: None,
        }
    }

    /// The deadline elapsed; partial output is surfaced as captured
    pub fn timed_out(partial_stdout: String, partial_stderr: String, elapsed: Duration) -> Self {
        let mut stderr = partial_stderr;
        if !stderr.is_empty() && !stderr.ends_with('\n') {
            stderr.push('\n');
        }
        stderr.push_str("Execution timed out");

        ExecutionResult {
            status: ExecutionStatus::TimedOut,
            exit_code: TIMEOUT_EXIT_CODE,
            stdout: partial_stdout,
            stderr,
            execution_time: elapsed,
            memory_used: None,
        }
    }

    /// The sandbox could not be launched; the diagnostic goes to stderr
    pub fn failed(diagnostic: impl Into<String>, elapsed: Duration) -> Self {
        ExecutionResult {
            status: ExecutionStatus::Failed,
            exit_code: LAUNCH_FAILURE_EXIT_CODE,
            stdout: String::new(),
            stderr: diagnostic.into(),
            execution_time: elapsed,
            memory_used: None,
        }
    }

    /// Whether the program ran and exited zero
    pub fn is_success(&self) -> bool {
        self.status == ExecutionStatus::Completed && self.exit_code == 0
    }
}

/// Trait for code execution backends
#[async_trait]
pub trait CodeExecutor: Send + Sync {
    /// Get the executor name
    fn name(&self) -> &str;

    /// Execute one request in a fresh sandbox.
    ///
    /// Program failures, timeouts, and launch failures all come back as a
    /// well-formed [`ExecutionResult`]; an `Err` is reserved for workspace
    /// creation failing before a session exists.
    async fn execute(&self, request: ExecutionRequest) -> Result<ExecutionResult>;

    /// Best-effort probe of the underlying runtime; never errors outward
    async fn is_available(&self) -> bool;

    /// Canonical identifiers of the registered languages
    fn supported_languages(&self) -> Vec<&'static str> {
        crate::sandbox::languages::supported_languages()
    }
}
