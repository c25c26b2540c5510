#![warn(clippy::uninlined_format_args)]

pub mod error;
pub mod model;
pub mod services;

pub use error::{LedgerError, RecordError};
pub use model::{
    BalanceMerge, BalanceSheet, CASH_POOL_SENTINEL, LedgerCheck, MemberSet, Money, Payer,
    PersonRegistry, Settlement, Transaction, TransactionWithLine, Transfer,
};
pub use services::{
    Ledger, LedgerBuilder, MemberSetResolver, RoundingMode, SettlementContext, SettlementError,
    SettlementPlanner, SettlementRoundingError,
};
