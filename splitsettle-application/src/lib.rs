#![warn(clippy::uninlined_format_args)]

pub mod error;
pub mod model;
pub mod ports;
pub mod settlement_processor;

pub use error::{RecordSourceError, RunError, SettlementOptimizationError};
pub use model::{
    ExpenseRecord, MergeRequest, MergeStep, PersonBalance, RecordPayer, SettlementReport,
};
pub use ports::{RecordSource, SettlementOptimizer};
pub use settlement_processor::SettlementProcessor;
