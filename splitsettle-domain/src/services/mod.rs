pub mod ledger_builder;
pub mod member_set_resolver;
pub mod settlement_planner;
pub mod settlement_rounding;

pub use ledger_builder::{BalanceAccumulator, Ledger, LedgerBuilder, distribute_units};
pub use member_set_resolver::MemberSetResolver;
pub use settlement_planner::{SettlementError, SettlementPlanner};
pub use settlement_rounding::{
    AtomicUnitConversionError, DEFAULT_SCALE, MAX_SETTLEMENT_SCALE, RoundingMode, SettlementContext,
    SettlementRoundingError, quantize_balances,
};
