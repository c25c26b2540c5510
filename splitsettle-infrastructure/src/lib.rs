#![warn(clippy::uninlined_format_args)]

pub mod csv_source;
pub mod optimizer;

pub use csv_source::{CsvOptions, CsvRecordSource, parse_records};
pub use optimizer::GreedySettlementOptimizer;
