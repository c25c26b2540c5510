use crate::strings;
use splitsettle_application::{RecordSourceError, RunError, SettlementOptimizationError};
use splitsettle_domain::LedgerError;

pub fn format_run_error(error: &RunError) -> String {
    match error {
        RunError::Source(RecordSourceError::Unreadable { path, detail }) => {
            format!("File '{path}' could not be read ({detail}).")
        }
        RunError::Source(RecordSourceError::MissingColumn(column)) => {
            format!("CSV must contain '{column}' column.")
        }
        RunError::Source(RecordSourceError::InvalidRow { line, detail }) => {
            format!("{}: {detail}", strings::record_line(*line))
        }
        RunError::Source(RecordSourceError::MalformedRecord { line, source })
        | RunError::Ledger(LedgerError::MalformedRecord { line, source }) => {
            format!("{}: {source}", strings::record_line(*line))
        }
        RunError::Ledger(LedgerError::EmptyPayingSet { line }) => format!(
            "{}: the cash pool paid but nobody is known yet",
            strings::record_line(*line)
        ),
        RunError::Ledger(LedgerError::EmptyBenefitingSet { line }) => format!(
            "{}: nobody is left to share the expense",
            strings::record_line(*line)
        ),
        RunError::Ledger(
            err @ (LedgerError::UnknownPerson(_) | LedgerError::UnsupportedScale { .. }),
        ) => err.to_string(),
        RunError::Settlement(err) => format_settlement_error(err),
    }
}

pub fn format_settlement_error(error: &SettlementOptimizationError) -> String {
    format!("{}: {error}", strings::SETTLEMENT_CALCULATION_FAILED)
}
