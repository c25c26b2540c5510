#![warn(clippy::uninlined_format_args)]

pub mod error_presenter;
pub mod report_presenter;
pub mod strings;

pub use error_presenter::{format_run_error, format_settlement_error};
pub use report_presenter::ReportPresenter;
