//! Command-line front end
//!
//! `args` holds the clap tree, `router` opens an [`crate::ActContext`] and
//! dispatches to the handlers in `commands`.

pub mod args;
pub mod commands;
pub mod help;
pub mod router;

pub use args::{Cli, Commands};
pub use help::get_log_level;
pub use router::execute_command;
