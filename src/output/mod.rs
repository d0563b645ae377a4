//! Output rendering
//!
//! Failure messages for file results and formatters for the command line.

mod failure;
mod formatter;

pub use failure::format_failure_message;
pub use formatter::{write_results_to_file, OutputFormat, ResultFormatter};
