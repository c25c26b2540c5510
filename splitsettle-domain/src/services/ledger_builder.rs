use crate::{
    error::{LedgerError, RecordError},
    model::{BalanceSheet, MemberSet, Money, PersonRegistry, TransactionWithLine},
    services::{
        MemberSetResolver,
        settlement_rounding::{
            AtomicUnitConversionError, MAX_SETTLEMENT_SCALE, SettlementContext,
        },
    },
};

/// Registry and balances produced from one transaction list.
#[derive(Debug, Clone, PartialEq)]
pub struct Ledger<'a> {
    registry: PersonRegistry<'a>,
    balances: BalanceSheet<'a>,
}

impl<'a> Ledger<'a> {
    pub fn registry(&self) -> &PersonRegistry<'a> {
        &self.registry
    }

    pub fn balances(&self) -> &BalanceSheet<'a> {
        &self.balances
    }

    pub fn into_balances(self) -> BalanceSheet<'a> {
        self.balances
    }
}

pub struct LedgerBuilder {
    context: SettlementContext,
}

impl LedgerBuilder {
    pub fn new(context: SettlementContext) -> Self {
        Self { context }
    }

    /// Two passes: the registry is fixed from every record first, so a cash-pool
    /// payer or a missing involved list always means the final set of people.
    pub fn build<'a>(
        &self,
        transactions: &[TransactionWithLine<'a>],
    ) -> Result<Ledger<'a>, LedgerError> {
        let registry =
            PersonRegistry::from_transactions(transactions.iter().map(|tx| &tx.transaction));

        tracing::debug!(
            transaction_count = transactions.len(),
            person_count = registry.len(),
            scale = self.context.scale,
            "Person registry built"
        );

        let mut accumulator = BalanceAccumulator::new(&registry, self.context);
        for transaction in transactions {
            accumulator.apply(transaction)?;
        }
        let balances = accumulator.into_balances();

        Ok(Ledger { registry, balances })
    }
}

pub struct BalanceAccumulator<'r, 'a> {
    balances: BalanceSheet<'a>,
    resolver: MemberSetResolver<'r, 'a>,
    context: SettlementContext,
}

impl<'r, 'a> BalanceAccumulator<'r, 'a> {
    /// Amounts finer than the configured scale are split at their own
    /// precision; quantization brings balances back to the configured scale
    /// before planning.
    fn split_context(&self, line: usize, amount: Money) -> SettlementContext {
        let amount_scale = amount.as_decimal().normalize().scale();
        if amount_scale <= self.context.scale {
            return self.context;
        }

        let scale = amount_scale.min(MAX_SETTLEMENT_SCALE).max(self.context.scale);
        tracing::debug!(
            line,
            amount = %amount,
            configured_scale = self.context.scale,
            split_scale = scale,
            "Splitting amount finer than the configured scale"
        );
        SettlementContext {
            scale,
            ..self.context
        }
    }

    pub fn new(registry: &'r PersonRegistry<'a>, context: SettlementContext) -> Self {
        Self {
            balances: BalanceSheet::with_people(registry.iter()),
            resolver: MemberSetResolver::new(registry),
            context,
        }
    }

    pub fn apply(&mut self, transaction: &TransactionWithLine<'a>) -> Result<(), LedgerError> {
        let TransactionWithLine { line, transaction } = transaction;
        let line = *line;

        if !transaction.amount.is_positive() {
            return Err(LedgerError::MalformedRecord {
                line,
                source: RecordError::NonPositiveAmount(transaction.amount),
            });
        }

        let split_context = self.split_context(line, transaction.amount);
        let units = split_context
            .to_atomic_units_i64(transaction.amount)
            .map_err(|err| match err {
                AtomicUnitConversionError::NonIntegral => LedgerError::MalformedRecord {
                    line,
                    source: RecordError::AmountFinerThanScale {
                        amount: transaction.amount,
                        scale: split_context.scale,
                    },
                },
                AtomicUnitConversionError::OutOfRange => LedgerError::MalformedRecord {
                    line,
                    source: RecordError::AmountOutOfRange(transaction.amount),
                },
                AtomicUnitConversionError::UnsupportedScale {
                    scale,
                    max_supported,
                } => LedgerError::UnsupportedScale {
                    scale,
                    max_supported,
                },
            })?;

        let payers = self.resolver.paying_set(transaction.payer);
        if payers.is_empty() {
            tracing::error!(line, "Rejected record with an empty paying set");
            return Err(LedgerError::EmptyPayingSet { line });
        }
        let beneficiaries = self.resolver.benefiting_set(transaction.involved());
        if beneficiaries.is_empty() {
            tracing::error!(line, "Rejected record with an empty benefiting set");
            return Err(LedgerError::EmptyBenefitingSet { line });
        }

        distribute_units(&mut self.balances, &beneficiaries, units, -1, split_context);
        distribute_units(&mut self.balances, &payers, units, 1, split_context);

        tracing::trace!(
            line,
            amount = %transaction.amount,
            payer_count = payers.len(),
            beneficiary_count = beneficiaries.len(),
            "Transaction applied"
        );

        Ok(())
    }

    pub fn into_balances(self) -> BalanceSheet<'a> {
        self.balances
    }
}

/// Splits `units` across `members`; shares differ by at most one unit and the
/// remainder goes to the members that come first in the registry, whatever
/// order the set was listed in.
pub fn distribute_units<'a>(
    balances: &mut BalanceSheet<'a>,
    members: &MemberSet<'a>,
    units: i64,
    direction: i64,
    context: SettlementContext,
) {
    if members.is_empty() {
        return;
    }

    let member_count = members.len() as i64;
    let base = units / member_count;
    let remainder = (units % member_count).unsigned_abs() as usize;

    let mut ranked: Vec<&'a str> = members.iter().collect();
    ranked.sort_by_key(|member| balances.position(member).unwrap_or(usize::MAX));

    for (idx, member) in ranked.into_iter().enumerate() {
        let mut share = base;
        if idx < remainder {
            share += 1;
        }
        balances.credit(member, context.from_atomic_units(share * direction));
    }
}
