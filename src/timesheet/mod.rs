//! Timesheet ingestion: format detection and per-row parsing (spec §4.4).

pub mod parser;
pub mod work_item;

pub use parser::parse;
pub use work_item::{DetectedFormat, ParseMetadata, ParseResult, RowError, WorkItem};
