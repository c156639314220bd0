//! # actbench
//!
//! Discover, configure, run and track local GitHub Actions workflow runs
//! through `act`.
//!
//! ## Usage
//!
//! ```bash
//! actbench settings set secrets API_KEY --value s3cret --select
//! actbench run --workflow build.yml --job test
//! ```
//!
//! ## Modules
//!
//! - `cli` - Argument parsing and command handlers
//! - `command` - Runner command synthesis and shell display quoting
//! - `config` - Tool configuration from `config.toml` and the environment
//! - `context` - Explicitly constructed engine context
//! - `history` - Run records, their lifecycle and orphan recovery
//! - `settings` - Extracted settings, setting files and runner options
//! - `storage` - Plain and protected key-value stores partitioned per folder
//! - `subprocess` - Process spawning, streaming and cancellation
//! - `workflow` - Workflow discovery and reference extraction
pub mod cli;
pub mod command;
pub mod config;
pub mod context;
pub mod error;
pub mod history;
pub mod settings;
pub mod storage;
pub mod subprocess;
pub mod workflow;

pub use context::ActContext;
pub use error::{Error, Result};
