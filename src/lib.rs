//! # Runcell
//!
//! A sandboxed, multi-language code execution engine built with Rust.
//!
//! ## Features
//!
//! - **Ephemeral Containers:** Every execution runs in a throwaway Docker
//!   container with its own scratch workspace
//! - **Multi-Language:** Static registry mapping language identifiers to
//!   images, file extensions, and run commands
//! - **Bounded Execution:** Wall-clock deadlines, memory ceilings, and
//!   network isolation enforced from the host
//! - **Guaranteed Cleanup:** Workspace teardown on every exit path

pub mod config;
pub mod error;
pub mod sandbox;

pub use config::ExecutorConfig;
pub use error::{Error, Result};

/// Application version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name
pub const NAME: &str = env!("CARGO_PKG_NAME");
