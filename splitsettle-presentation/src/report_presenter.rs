use crate::strings;
use splitsettle_application::{MergeStep, PersonBalance, SettlementReport};
use splitsettle_domain::{LedgerCheck, Money, Transfer};

const NAME_WIDTH: usize = 15;

/// Renders a settlement report as plain text, one section per stage.
pub struct ReportPresenter {
    precision: usize,
}

impl ReportPresenter {
    /// `scale` is the number of decimal places shown for every amount.
    pub fn new(scale: u32) -> Self {
        Self {
            precision: scale as usize,
        }
    }

    /// Balances, checksum, each merge, then the plan. A failed plan is left
    /// out so the caller can report the error on its own channel.
    pub fn render(&self, report: &SettlementReport<'_>) -> String {
        let mut sections = vec![
            self.render_balances(strings::NET_BALANCES_HEADER, &report.balances),
            self.render_total(report.total, report.check),
        ];
        sections.extend(report.merges.iter().map(|step| self.render_merge(step)));
        if let Ok(transfers) = &report.plan {
            sections.push(self.render_plan(transfers));
        }

        let mut out = sections.join("\n\n");
        out.push('\n');
        out
    }

    pub fn render_balances(&self, header: &str, balances: &[PersonBalance<'_>]) -> String {
        let mut lines = vec![header.to_owned()];
        lines.extend(balances.iter().map(|person| {
            format!(
                "{name:<NAME_WIDTH$}: $ {balance}",
                name = person.name,
                balance = self.amount(person.balance)
            )
        }));
        lines.join("\n")
    }

    pub fn render_total(&self, total: Money, check: LedgerCheck) -> String {
        let summary = strings::total_balance(self.amount(total));
        match check {
            LedgerCheck::Balanced => summary,
            LedgerCheck::Imbalanced { total } => {
                format!("{summary}\n{}", strings::imbalance_warning(self.amount(total)))
            }
        }
    }

    pub fn render_merge(&self, step: &MergeStep<'_>) -> String {
        self.render_balances(
            &strings::merge_header(step.merge.source, step.merge.target),
            &step.balances,
        )
    }

    pub fn render_plan(&self, transfers: &[Transfer<'_>]) -> String {
        if transfers.is_empty() {
            return format!(
                "{}\n{}",
                strings::SETTLEMENT_PLAN_HEADER,
                strings::EVERYONE_SETTLED
            );
        }

        let mut lines = vec![strings::SETTLEMENT_PLAN_HEADER.to_owned()];
        lines.extend(transfers.iter().map(|transfer| {
            strings::pays(transfer.from, transfer.to, self.amount(transfer.amount))
        }));
        lines.join("\n")
    }

    fn amount(&self, money: Money) -> String {
        let rounded = money.as_decimal().round_dp(self.precision as u32);
        format!("{rounded:.precision$}", precision = self.precision)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::{fixture, rstest};
    use splitsettle_application::SettlementOptimizationError;
    use splitsettle_domain::BalanceMerge;

    #[fixture]
    fn presenter() -> ReportPresenter {
        ReportPresenter::new(2)
    }

    fn balance(name: &'static str, cents: i64) -> PersonBalance<'static> {
        PersonBalance {
            name,
            balance: Money::new(cents, 2),
        }
    }

    fn transfer(from: &'static str, to: &'static str, cents: i64) -> Transfer<'static> {
        Transfer {
            from,
            to,
            amount: Money::new(cents, 2),
        }
    }

    #[fixture]
    fn report() -> SettlementReport<'static> {
        SettlementReport {
            balances: vec![balance("Alice", 6000), balance("Bob", -3000), balance("Cara", -3000)],
            total: Money::ZERO,
            check: LedgerCheck::Balanced,
            merges: vec![MergeStep {
                merge: BalanceMerge {
                    source: "Cara",
                    target: "Bob",
                    amount: Money::new(-3000, 2),
                },
                balances: vec![balance("Alice", 6000), balance("Bob", -6000), balance("Cara", 0)],
            }],
            plan: Ok(vec![transfer("Bob", "Alice", 6000)]),
        }
    }

    #[rstest]
    fn render_prints_every_section_in_order(
        presenter: ReportPresenter,
        report: SettlementReport<'static>,
    ) {
        let expected = "\
Net Balances (positive = overpaid, negative = underpaid):
Alice          : $ 60.00
Bob            : $ -30.00
Cara           : $ -30.00

Total balance: $0.00. This should be zero if all transactions are balanced.

Transferring all of Cara's money to Bob. New balances:
Alice          : $ 60.00
Bob            : $ -60.00
Cara           : $ 0.00

Settlement Plan:
Bob pays Alice $60.00
";

        assert_eq!(presenter.render(&report), expected);
    }

    #[rstest]
    fn failed_plan_is_left_out(presenter: ReportPresenter, mut report: SettlementReport<'static>) {
        report.plan = Err(SettlementOptimizationError::ZeroSumInvariantViolation);

        let rendered = presenter.render(&report);

        assert!(!rendered.contains(strings::SETTLEMENT_PLAN_HEADER));
        assert!(rendered.contains("Total balance"));
    }

    #[rstest]
    fn empty_plan_says_everyone_is_settled(presenter: ReportPresenter) {
        assert_eq!(
            presenter.render_plan(&[]),
            "Settlement Plan:\nEveryone is settled up."
        );
    }

    #[rstest]
    fn imbalanced_total_adds_warning(presenter: ReportPresenter) {
        let total = Money::new(5, 2);

        let rendered = presenter.render_total(total, LedgerCheck::Imbalanced { total });

        assert_eq!(
            rendered,
            "Total balance: $0.05. This should be zero if all transactions are balanced.\n\
             Warning: balances are off by $0.05; check the input for mistakes."
        );
    }

    #[rstest]
    #[case::whole_units(0, Money::new(4200, 2), "42")]
    #[case::cents(2, Money::from_i64(7), "7.00")]
    #[case::finer_scale(3, Money::new(12346, 4), "1.235")]
    fn amounts_follow_scale(#[case] scale: u32, #[case] money: Money, #[case] expected: &str) {
        assert_eq!(ReportPresenter::new(scale).amount(money), expected);
    }

    #[rstest]
    fn long_names_are_not_truncated(presenter: ReportPresenter) {
        let rendered = presenter.render_balances("Header:", &[balance("Bartholomew Jones", 100)]);

        assert_eq!(rendered, "Header:\nBartholomew Jones: $ 1.00");
    }
}
