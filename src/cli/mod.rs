//! Command-line front end: argument definitions and workflow orchestration.

pub mod args;
pub mod orchestration;

pub use args::{ChangelogArgs, Cli, Command, CreateReleaseArgs, NextVersionArgs};
pub use orchestration::{run, CommandReport, CommandStatus, Workflow};
