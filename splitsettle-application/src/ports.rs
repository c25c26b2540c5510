use crate::{
    error::{RecordSourceError, SettlementOptimizationError},
    model::ExpenseRecord,
};
use splitsettle_domain::{BalanceSheet, SettlementContext, Transfer};

/// Where expense rows come from (a CSV file, a fixture, ...).
pub trait RecordSource: Send + Sync {
    fn read_records(&self) -> Result<Vec<ExpenseRecord>, RecordSourceError>;
}

pub trait SettlementOptimizer: Send + Sync {
    fn optimize<'a>(
        &self,
        balances: &BalanceSheet<'a>,
        context: SettlementContext,
    ) -> Result<Vec<Transfer<'a>>, SettlementOptimizationError>;
}

impl RecordSource for Vec<ExpenseRecord> {
    fn read_records(&self) -> Result<Vec<ExpenseRecord>, RecordSourceError> {
        Ok(self.clone())
    }
}
