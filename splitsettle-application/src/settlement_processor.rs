use crate::{
    error::{RunError, SettlementOptimizationError},
    model::{ExpenseRecord, MergeRequest, MergeStep, PersonBalance, SettlementReport},
    ports::{RecordSource, SettlementOptimizer},
};
use splitsettle_domain::{
    BalanceSheet, Ledger, LedgerBuilder, LedgerCheck, LedgerError, SettlementContext, Transfer,
};

/// Runs records through the ledger, the optional merges and the planner.
#[derive(Clone, Copy)]
pub struct SettlementProcessor<'a> {
    source: &'a dyn RecordSource,
    optimizer: &'a dyn SettlementOptimizer,
    context: SettlementContext,
}

impl<'a> SettlementProcessor<'a> {
    pub fn new(
        source: &'a dyn RecordSource,
        optimizer: &'a dyn SettlementOptimizer,
        context: SettlementContext,
    ) -> Self {
        Self {
            source,
            optimizer,
            context,
        }
    }

    pub fn load_records(&self) -> Result<Vec<ExpenseRecord>, RunError> {
        let records = self.source.read_records()?;
        tracing::info!(record_count = records.len(), "Expense records loaded");
        Ok(records)
    }

    pub fn build_ledger<'r>(&self, records: &'r [ExpenseRecord]) -> Result<Ledger<'r>, RunError> {
        let transactions = records
            .iter()
            .map(|record| {
                record
                    .to_transaction()
                    .map_err(|source| LedgerError::MalformedRecord {
                        line: record.line,
                        source,
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(LedgerBuilder::new(self.context).build(&transactions)?)
    }

    pub fn plan<'b>(
        &self,
        balances: &BalanceSheet<'b>,
    ) -> Result<Vec<Transfer<'b>>, SettlementOptimizationError> {
        self.optimizer.optimize(balances, self.context)
    }

    /// Full run. Malformed input and unknown merge names abort; an imbalanced
    /// ledger or a failed plan is reported inside the result.
    pub fn settle<'r>(
        &self,
        records: &'r [ExpenseRecord],
        merges: &[MergeRequest],
    ) -> Result<SettlementReport<'r>, RunError> {
        let mut balances = self.build_ledger(records)?.into_balances();

        let total = balances.total();
        let check = balances.check(self.context.tolerance());
        match check {
            LedgerCheck::Balanced => {
                tracing::debug!(person_count = balances.len(), "Ledger balanced");
            }
            LedgerCheck::Imbalanced { total } => {
                tracing::warn!(
                    total = %total,
                    tolerance = %self.context.tolerance(),
                    "Ledger does not sum to zero"
                );
            }
        }
        let ledger_balances = PersonBalance::from_sheet(&balances);

        let mut merge_steps = Vec::with_capacity(merges.len());
        for request in merges {
            let merge = balances.merge_balance(&request.source, &request.target)?;
            tracing::info!(
                source = merge.source,
                target = merge.target,
                amount = %merge.amount,
                "Balance merged"
            );
            merge_steps.push(MergeStep {
                merge,
                balances: PersonBalance::from_sheet(&balances),
            });
        }

        let plan = self.plan(&balances);
        if let Err(err) = &plan {
            tracing::error!(error = %err, "Settlement planning failed");
        }

        Ok(SettlementReport {
            balances: ledger_balances,
            total,
            check,
            merges: merge_steps,
            plan,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{RecordPayer, RecordSourceError};
    use rstest::{fixture, rstest};
    use splitsettle_domain::{Money, RecordError, SettlementPlanner};

    struct GreedyOptimizer;

    impl SettlementOptimizer for GreedyOptimizer {
        fn optimize<'a>(
            &self,
            balances: &BalanceSheet<'a>,
            context: SettlementContext,
        ) -> Result<Vec<Transfer<'a>>, SettlementOptimizationError> {
            SettlementPlanner::new(context)
                .plan(balances)
                .map(|settlement| settlement.transfers)
                .map_err(|_| SettlementOptimizationError::ZeroSumInvariantViolation)
        }
    }

    struct FailingSource;

    impl RecordSource for FailingSource {
        fn read_records(&self) -> Result<Vec<ExpenseRecord>, RecordSourceError> {
            Err(RecordSourceError::MissingColumn("Payer"))
        }
    }

    static OPTIMIZER: GreedyOptimizer = GreedyOptimizer;

    fn record(line: usize, payer: &str, amount: i64, involved: Option<&[&str]>) -> ExpenseRecord {
        ExpenseRecord {
            line,
            payer: if payer == "Cash" {
                RecordPayer::CashPool
            } else {
                RecordPayer::Person(payer.to_owned())
            },
            amount: Money::from_i64(amount),
            involved: involved.map(|names| names.iter().map(|name| (*name).to_owned()).collect()),
        }
    }

    #[fixture]
    fn trip() -> Vec<ExpenseRecord> {
        vec![
            record(2, "Ana", 90, Some(&["Ana", "Ben", "Cy"])),
            record(3, "Ben", 30, None),
            record(4, "Cash", 60, None),
        ]
    }

    fn merge(source: &str, target: &str) -> MergeRequest {
        MergeRequest {
            source: source.to_owned(),
            target: target.to_owned(),
        }
    }

    #[rstest]
    fn settle_reports_balances_and_plan(trip: Vec<ExpenseRecord>) {
        let processor =
            SettlementProcessor::new(&trip, &OPTIMIZER, SettlementContext::cents_default());
        let records = processor.load_records().expect("records load");

        let report = processor.settle(&records, &[]).expect("run succeeds");

        let balances: Vec<(&str, Money)> = report
            .balances
            .iter()
            .map(|person| (person.name, person.balance))
            .collect();
        assert_eq!(
            balances,
            vec![
                ("Ana", Money::from_i64(50)),
                ("Ben", Money::from_i64(-10)),
                ("Cy", Money::from_i64(-40)),
            ]
        );
        assert_eq!(report.total, Money::ZERO);
        assert!(report.check.is_balanced());
        assert!(report.merges.is_empty());

        let plan = report.plan.expect("plan succeeds");
        assert_eq!(
            plan,
            vec![
                Transfer {
                    from: "Ben",
                    to: "Ana",
                    amount: Money::from_i64(10),
                },
                Transfer {
                    from: "Cy",
                    to: "Ana",
                    amount: Money::from_i64(40),
                },
            ]
        );
    }

    #[rstest]
    fn merges_apply_in_order_before_planning(trip: Vec<ExpenseRecord>) {
        let processor =
            SettlementProcessor::new(&trip, &OPTIMIZER, SettlementContext::cents_default());

        let report = processor
            .settle(&trip, &[merge("Cy", "Ben")])
            .expect("run succeeds");

        assert_eq!(report.merges.len(), 1);
        let step = &report.merges[0];
        assert_eq!(step.merge.source, "Cy");
        assert_eq!(step.merge.target, "Ben");
        assert_eq!(step.merge.amount, Money::from_i64(-40));
        assert_eq!(
            step.balances
                .iter()
                .map(|person| person.balance)
                .collect::<Vec<_>>(),
            vec![Money::from_i64(50), Money::from_i64(-50), Money::ZERO]
        );

        let plan = report.plan.expect("plan succeeds");
        assert_eq!(
            plan,
            vec![Transfer {
                from: "Ben",
                to: "Ana",
                amount: Money::from_i64(50),
            }]
        );
    }

    #[rstest]
    fn unknown_merge_name_aborts(trip: Vec<ExpenseRecord>) {
        let processor =
            SettlementProcessor::new(&trip, &OPTIMIZER, SettlementContext::cents_default());

        let result = processor.settle(&trip, &[merge("Zoe", "Ana")]);

        assert!(matches!(
            result,
            Err(RunError::Ledger(LedgerError::UnknownPerson(name))) if name == "Zoe"
        ));
    }

    #[rstest]
    #[case::zero_amount(record(5, "Ana", 0, None), RecordError::NonPositiveAmount(Money::ZERO))]
    #[case::blank_payer(record(5, " ", 10, None), RecordError::EmptyPayer)]
    fn malformed_record_names_its_line(
        mut trip: Vec<ExpenseRecord>,
        #[case] bad: ExpenseRecord,
        #[case] expected: RecordError,
    ) {
        trip.push(bad);
        let processor =
            SettlementProcessor::new(&trip, &OPTIMIZER, SettlementContext::cents_default());

        let result = processor.settle(&trip, &[]);

        match result {
            Err(RunError::Ledger(LedgerError::MalformedRecord { line, source })) => {
                assert_eq!(line, 5);
                assert_eq!(source, expected);
            }
            other => panic!("expected malformed record error, got {other:?}"),
        }
    }

    #[test]
    fn source_errors_propagate() {
        let processor = SettlementProcessor::new(
            &FailingSource,
            &OPTIMIZER,
            SettlementContext::cents_default(),
        );

        assert!(matches!(
            processor.load_records(),
            Err(RunError::Source(RecordSourceError::MissingColumn("Payer")))
        ));
    }
}
