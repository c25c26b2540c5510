use splitsettle_application::{SettlementOptimizationError, SettlementOptimizer};
use splitsettle_domain::{
    BalanceSheet, SettlementContext, SettlementError, SettlementPlanner, SettlementRoundingError,
    Transfer, services::quantize_balances,
};

/// Rounds balances to the atomic unit, then matches debtors to creditors greedily.
#[derive(Default)]
pub struct GreedySettlementOptimizer;

fn map_rounding_error(err: SettlementRoundingError) -> SettlementOptimizationError {
    match err {
        SettlementRoundingError::ImbalancedTotal(total) => {
            SettlementOptimizationError::ImbalancedTotal(total)
        }
        SettlementRoundingError::InvalidAdjustmentCount
        | SettlementRoundingError::ZeroSumInvariantViolation => {
            SettlementOptimizationError::ZeroSumInvariantViolation
        }
        SettlementRoundingError::OutOfRange => SettlementOptimizationError::QuantizationOutOfRange,
        SettlementRoundingError::UnsupportedScale {
            scale,
            max_supported,
        } => SettlementOptimizationError::QuantizationUnsupportedScale {
            scale,
            max_supported,
        },
    }
}

fn map_settlement_error(err: SettlementError) -> SettlementOptimizationError {
    match err {
        SettlementError::ImbalancedTotal { credit, debit } => {
            SettlementOptimizationError::ImbalancedTotal(credit - debit)
        }
        SettlementError::IterationLimitExceeded { limit } => {
            SettlementOptimizationError::IterationLimitExceeded { limit }
        }
    }
}

impl SettlementOptimizer for GreedySettlementOptimizer {
    fn optimize<'a>(
        &self,
        balances: &BalanceSheet<'a>,
        context: SettlementContext,
    ) -> Result<Vec<Transfer<'a>>, SettlementOptimizationError> {
        let quantized = quantize_balances(balances, context).map_err(map_rounding_error)?;
        let settlement = SettlementPlanner::new(context)
            .plan(&quantized)
            .map_err(map_settlement_error)?;

        Ok(settlement.transfers)
    }
}
