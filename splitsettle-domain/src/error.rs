use crate::model::Money;

/// Why a single transaction record cannot be accepted.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RecordError {
    #[error("amount must be positive (found {0})")]
    NonPositiveAmount(Money),
    #[error("amount {amount} has more than {scale} decimal places")]
    AmountFinerThanScale { amount: Money, scale: u32 },
    #[error("amount {0} is too large")]
    AmountOutOfRange(Money),
    #[error("payer is empty")]
    EmptyPayer,
    #[error("involved list contains an empty name")]
    EmptyInvolvedName,
    #[error("the cash pool '{0}' cannot be listed as involved")]
    CashPoolInvolved(String),
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LedgerError {
    #[error("record {line}: {source}")]
    MalformedRecord {
        line: usize,
        #[source]
        source: RecordError,
    },
    #[error("record {line}: nobody is known to have paid (the cash pool has no members)")]
    EmptyPayingSet { line: usize },
    #[error("record {line}: nobody is known to share the expense")]
    EmptyBenefitingSet { line: usize },
    #[error("unknown person '{0}'")]
    UnknownPerson(String),
    #[error("settlement scale {scale} is not supported (max {max_supported})")]
    UnsupportedScale { scale: u32, max_supported: u32 },
}
