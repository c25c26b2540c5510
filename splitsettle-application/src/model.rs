use splitsettle_domain::{
    BalanceMerge, BalanceSheet, LedgerCheck, Money, Payer, RecordError, Transaction,
    TransactionWithLine, Transfer,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordPayer {
    Person(String),
    CashPool,
}

/// One expense row as read from the outside world, before validation.
#[derive(Debug, Clone, PartialEq)]
pub struct ExpenseRecord {
    pub line: usize,
    pub payer: RecordPayer,
    pub amount: Money,
    pub involved: Option<Vec<String>>,
}

impl ExpenseRecord {
    pub fn to_transaction(&self) -> Result<TransactionWithLine<'_>, RecordError> {
        let payer = match &self.payer {
            RecordPayer::Person(name) => Payer::Person(name.as_str()),
            RecordPayer::CashPool => Payer::CashPool,
        };
        let involved = self
            .involved
            .as_ref()
            .map(|names| names.iter().map(String::as_str).collect());

        Ok(TransactionWithLine {
            line: self.line,
            transaction: Transaction::try_new(payer, self.amount, involved)?,
        })
    }
}

/// "Give everything `source` owes or is owed to `target`".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeRequest {
    pub source: String,
    pub target: String,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PersonBalance<'a> {
    pub name: &'a str,
    pub balance: Money,
}

impl<'a> PersonBalance<'a> {
    pub fn from_sheet(balances: &BalanceSheet<'a>) -> Vec<Self> {
        balances
            .iter()
            .map(|(name, balance)| Self { name, balance })
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MergeStep<'a> {
    pub merge: BalanceMerge<'a>,
    pub balances: Vec<PersonBalance<'a>>,
}

#[derive(Debug)]
pub struct SettlementReport<'a> {
    /// Balances straight from the ledger, before any merge.
    pub balances: Vec<PersonBalance<'a>>,
    pub total: Money,
    pub check: LedgerCheck,
    pub merges: Vec<MergeStep<'a>>,
    pub plan: Result<Vec<Transfer<'a>>, crate::SettlementOptimizationError>,
}
