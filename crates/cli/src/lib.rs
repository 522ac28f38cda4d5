//! Command-line entry point: runs one reallocation against a JSON snapshot.

pub mod app;
pub mod args;

pub use app::{run, RunOutput};
pub use args::Cli;
