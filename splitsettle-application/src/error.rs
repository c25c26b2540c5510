use splitsettle_domain::{LedgerError, Money, RecordError};

#[derive(Debug, thiserror::Error)]
pub enum RecordSourceError {
    #[error("failed to read '{path}': {detail}")]
    Unreadable { path: String, detail: String },
    #[error("CSV must contain '{0}' column")]
    MissingColumn(&'static str),
    #[error("line {line}: {detail}")]
    InvalidRow { line: usize, detail: String },
    #[error("line {line}: {source}")]
    MalformedRecord {
        line: usize,
        #[source]
        source: RecordError,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SettlementOptimizationError {
    #[error("balances sum to {0}, not zero")]
    ImbalancedTotal(Money),
    #[error("settlement did not finish within {limit} steps")]
    IterationLimitExceeded { limit: usize },
    #[error("a balance is too large to settle")]
    QuantizationOutOfRange,
    #[error("scale {scale} is not supported (max {max_supported})")]
    QuantizationUnsupportedScale { scale: u32, max_supported: u32 },
    #[error("rounded balances no longer sum to zero")]
    ZeroSumInvariantViolation,
}

#[derive(Debug, thiserror::Error)]
pub enum RunError {
    #[error(transparent)]
    Source(#[from] RecordSourceError),
    #[error(transparent)]
    Ledger(#[from] LedgerError),
    #[error("settlement failed: {0}")]
    Settlement(#[from] SettlementOptimizationError),
}
