use std::collections::VecDeque;

use crate::{
    model::{BalanceSheet, Money, Settlement, Transfer},
    services::settlement_rounding::SettlementContext,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum SettlementError {
    #[error("creditors are owed {credit} but debtors owe {debit}")]
    ImbalancedTotal { credit: Money, debit: Money },
    #[error("greedy matching did not finish within {limit} steps")]
    IterationLimitExceeded { limit: usize },
}

/// Greedy debtor/creditor matching in registry order.
pub struct SettlementPlanner {
    tolerance: Money,
}

impl SettlementPlanner {
    pub fn new(context: SettlementContext) -> Self {
        Self {
            tolerance: context.tolerance(),
        }
    }

    /// Plan transfers that bring every balance back to zero.
    ///
    /// The first remaining debtor always pays the first remaining creditor
    /// `min(debt, credit)`; whoever reaches zero drops out. Each emitted transfer
    /// zeroes at least one side, so the plan has at most
    /// `creditors + debtors - 1` entries.
    ///
    /// # Returns
    /// The transfers, plus the balances after applying them.
    pub fn plan<'a>(&self, balances: &BalanceSheet<'a>) -> Result<Settlement<'a>, SettlementError> {
        let mut creditors: VecDeque<(&'a str, Money)> = balances
            .iter()
            .filter(|(_, balance)| balance.is_positive())
            .collect();
        let mut debtors: VecDeque<(&'a str, Money)> = balances
            .iter()
            .filter(|(_, balance)| balance.is_negative())
            .map(|(name, balance)| (name, balance.abs()))
            .collect();

        let credit: Money = creditors.iter().map(|(_, amount)| *amount).sum();
        let debit: Money = debtors.iter().map(|(_, amount)| *amount).sum();
        if (credit - debit).abs() > self.tolerance {
            tracing::error!(
                reject_reason = "input_imbalance",
                credit = %credit,
                debit = %debit,
                "Settlement rejected due to imbalanced balances"
            );
            return Err(SettlementError::ImbalancedTotal { credit, debit });
        }

        // Every person is matched at most once after reaching zero and dropped at most once.
        let limit = 2 * (creditors.len() + debtors.len());
        let mut steps = 0;
        let mut transfers = Vec::new();

        while let (Some(&(creditor, credit_left)), Some(&(debtor, debt_left))) =
            (creditors.front(), debtors.front())
        {
            if steps == limit {
                tracing::error!(limit, "Greedy settlement failed to terminate");
                return Err(SettlementError::IterationLimitExceeded { limit });
            }
            steps += 1;

            if credit_left.is_zero() {
                creditors.pop_front();
                continue;
            }
            if debt_left.is_zero() {
                debtors.pop_front();
                continue;
            }

            let amount = credit_left.min(debt_left);
            transfers.push(Transfer {
                from: debtor,
                to: creditor,
                amount,
            });
            if let Some(front) = creditors.front_mut() {
                front.1 -= amount;
            }
            if let Some(front) = debtors.front_mut() {
                front.1 -= amount;
            }
        }

        let residual: Money = creditors
            .iter()
            .chain(debtors.iter())
            .map(|(_, amount)| *amount)
            .sum();
        if !residual.is_zero() {
            tracing::debug!(residual = %residual, "Settlement left sub-tolerance residue");
        }

        let mut new_balances = balances.clone();
        for transfer in &transfers {
            new_balances.apply_transfer(transfer);
        }

        tracing::debug!(
            creditor_total = %credit,
            transfer_count = transfers.len(),
            "Settlement planned"
        );

        Ok(Settlement {
            new_balances,
            transfers,
        })
    }
}
