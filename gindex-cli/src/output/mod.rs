//! Output formatting for CLI.

pub mod export;
mod json;
mod text;

pub use json::{FailureOutput, JsonFormatter, ResultsOutput};
pub use text::TextFormatter;
