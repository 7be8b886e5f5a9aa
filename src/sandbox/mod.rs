//! Sandbox module - Secure code execution environments
//!
//! One execution per request: a fresh session workspace is created, the
//! submitted source is materialized into it, an ephemeral Docker container
//! runs the language's command against the file, and the workspace is torn
//! down regardless of how the run ends.

mod container;
mod executor;
mod languages;
mod workspace;

pub use container::ContainerExecutor;
pub use executor::{
    CodeExecutor, ExecutionOptions, ExecutionRequest, ExecutionResult, ExecutionStatus,
};
pub use languages::{resolve_profile, supported_languages, LanguageProfile};
pub use workspace::ExecutionSession;

use crate::config::ExecutorConfig;
use crate::error::Result;

/// Create the container-backed executor from the configuration
pub fn create_executor(config: &ExecutorConfig) -> Result<Box<dyn CodeExecutor>> {
    let executor = ContainerExecutor::new(config)?;
    Ok(Box::new(executor))
}
