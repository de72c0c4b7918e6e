//! Output formatting module

pub mod formatter;

pub use formatter::{BatchEntry, Output, OutputFormatter, ReportGenerator};
