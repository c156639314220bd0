//! Process execution for the workflow runner
//!
//! `ProcessRunner` is the seam between run tracking and the operating system;
//! `MockProcessRunner` scripts it in tests.

pub mod builder;
pub mod error;
pub mod mock;
pub mod runner;

pub use builder::ProcessCommandBuilder;
pub use error::ProcessError;
pub use mock::{MockCommandConfig, MockProcessRunner};
pub use runner::{
    CancelHandle, ExitStatus, ProcessCommand, ProcessRunner, ProcessStream, TokioProcessRunner,
};

use std::sync::Arc;

/// Production runner behind a shared trait object
pub fn production_runner() -> Arc<dyn ProcessRunner> {
    Arc::new(TokioProcessRunner)
}
