use std::{
    fmt,
    iter::Sum,
    ops::{Add, AddAssign, Neg, Sub, SubAssign},
    str::FromStr,
};

use fxhash::FxBuildHasher;
use indexmap::{IndexMap, IndexSet};
use rust_decimal::Decimal;

use crate::error::{LedgerError, RecordError};

/// Payer value meaning "everyone in the registry paid an equal share".
pub const CASH_POOL_SENTINEL: &str = "Cash";

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Money(Decimal);

impl Money {
    pub const ZERO: Self = Self(Decimal::ZERO);

    pub fn new(num: i64, scale: u32) -> Self {
        Self(Decimal::new(num, scale))
    }

    pub fn from_i64(value: i64) -> Self {
        Self(Decimal::from(value))
    }

    pub fn from_decimal(value: Decimal) -> Self {
        Self(value)
    }

    pub fn as_decimal(self) -> Decimal {
        self.0
    }

    pub fn abs(self) -> Self {
        Self(self.0.abs())
    }

    pub fn is_zero(self) -> bool {
        self.0.is_zero()
    }

    pub fn is_positive(self) -> bool {
        self.0 > Decimal::ZERO
    }

    pub fn is_negative(self) -> bool {
        self.0 < Decimal::ZERO
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl FromStr for Money {
    type Err = rust_decimal::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Decimal::from_str(s).map(Self)
    }
}

impl Add for Money {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self(self.0 + rhs.0)
    }
}

impl AddAssign for Money {
    fn add_assign(&mut self, rhs: Self) {
        self.0 += rhs.0;
    }
}

impl Sub for Money {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        Self(self.0 - rhs.0)
    }
}

impl SubAssign for Money {
    fn sub_assign(&mut self, rhs: Self) {
        self.0 -= rhs.0;
    }
}

impl Neg for Money {
    type Output = Self;

    fn neg(self) -> Self::Output {
        Self(-self.0)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, Add::add)
    }
}

impl<'a> Sum<&'a Money> for Money {
    fn sum<I: Iterator<Item = &'a Money>>(iter: I) -> Self {
        iter.copied().sum()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Payer<'a> {
    Person(&'a str),
    /// Fronted collectively by every registered person.
    CashPool,
}

impl<'a> Payer<'a> {
    /// Interprets a raw payer field; the sentinel matches case-insensitively.
    pub fn from_field(field: &'a str, sentinel: &str) -> Self {
        if field.eq_ignore_ascii_case(sentinel) {
            Self::CashPool
        } else {
            Self::Person(field)
        }
    }

    pub fn is_cash_pool(self) -> bool {
        matches!(self, Self::CashPool)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Transaction<'a> {
    pub payer: Payer<'a>,
    pub amount: Money,
    /// `None` (or an empty list) means every registered person benefited.
    pub involved: Option<Vec<&'a str>>,
}

impl<'a> Transaction<'a> {
    pub fn try_new(
        payer: Payer<'a>,
        amount: Money,
        involved: Option<Vec<&'a str>>,
    ) -> Result<Self, RecordError> {
        if !amount.is_positive() {
            return Err(RecordError::NonPositiveAmount(amount));
        }
        if let Payer::Person(name) = payer
            && name.trim().is_empty()
        {
            return Err(RecordError::EmptyPayer);
        }
        if involved.iter().flatten().any(|name| name.trim().is_empty()) {
            return Err(RecordError::EmptyInvolvedName);
        }

        Ok(Self {
            payer,
            amount,
            involved,
        })
    }

    pub fn involved(&self) -> Option<&[&'a str]> {
        self.involved.as_deref().filter(|list| !list.is_empty())
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct TransactionWithLine<'a> {
    pub line: usize,
    pub transaction: Transaction<'a>,
}

impl<'a> TransactionWithLine<'a> {
    /// Numbers transactions from 1 in iteration order.
    pub fn numbered<I>(transactions: I) -> Vec<Self>
    where
        I: IntoIterator<Item = Transaction<'a>>,
    {
        transactions
            .into_iter()
            .enumerate()
            .map(|(idx, transaction)| Self {
                line: idx + 1,
                transaction,
            })
            .collect()
    }
}

/// Everyone named anywhere in a transaction list, in first-seen order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PersonRegistry<'a> {
    people: IndexSet<&'a str, FxBuildHasher>,
}

impl<'a> PersonRegistry<'a> {
    pub fn from_transactions<'t, I>(transactions: I) -> Self
    where
        'a: 't,
        I: IntoIterator<Item = &'t Transaction<'a>>,
    {
        let mut registry = Self::default();
        for transaction in transactions {
            if let Payer::Person(name) = transaction.payer {
                registry.register(name);
            }
            for name in transaction.involved.iter().flatten().copied() {
                registry.register(name);
            }
        }
        registry
    }

    pub fn register(&mut self, name: &'a str) -> bool {
        self.people.insert(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.people.contains(name)
    }

    pub fn len(&self) -> usize {
        self.people.len()
    }

    pub fn is_empty(&self) -> bool {
        self.people.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &'a str> + '_ {
        self.people.iter().copied()
    }

    pub fn members(&self) -> MemberSet<'a> {
        MemberSet::new(self.iter().collect())
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MemberSet<'a> {
    members: Vec<&'a str>,
}

impl<'a> MemberSet<'a> {
    pub fn new(members: Vec<&'a str>) -> Self {
        Self { members }
    }

    pub fn members(&self) -> &[&'a str] {
        &self.members
    }

    pub fn iter(&self) -> impl Iterator<Item = &'a str> + '_ {
        self.members.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

/// Net position per person (positive: is owed, negative: owes), in registry order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BalanceSheet<'a> {
    balances: IndexMap<&'a str, Money, FxBuildHasher>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LedgerCheck {
    Balanced,
    Imbalanced { total: Money },
}

impl LedgerCheck {
    pub fn is_balanced(self) -> bool {
        matches!(self, Self::Balanced)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BalanceMerge<'a> {
    pub source: &'a str,
    pub target: &'a str,
    pub amount: Money,
}

impl<'a> BalanceSheet<'a> {
    pub fn with_people<I>(people: I) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        people
            .into_iter()
            .map(|person| (person, Money::ZERO))
            .collect()
    }

    pub fn get(&self, name: &str) -> Option<Money> {
        self.balances.get(name).copied()
    }

    /// Registry position of `name`.
    pub fn position(&self, name: &str) -> Option<usize> {
        self.balances.get_index_of(name)
    }

    pub fn credit(&mut self, name: &'a str, amount: Money) {
        *self.balances.entry(name).or_insert(Money::ZERO) += amount;
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'a str, Money)> + '_ {
        self.balances.iter().map(|(name, money)| (*name, *money))
    }

    pub fn len(&self) -> usize {
        self.balances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.balances.is_empty()
    }

    pub fn total(&self) -> Money {
        self.balances.values().sum()
    }

    pub fn check(&self, tolerance: Money) -> LedgerCheck {
        let total = self.total();
        if total.abs() > tolerance {
            LedgerCheck::Imbalanced { total }
        } else {
            LedgerCheck::Balanced
        }
    }

    /// Moves the whole balance of `source` onto `target`, leaving `source` at zero.
    pub fn merge_balance(
        &mut self,
        source: &str,
        target: &str,
    ) -> Result<BalanceMerge<'a>, LedgerError> {
        let Some((source_idx, &source_key, &moved)) = self.balances.get_full(source) else {
            return Err(LedgerError::UnknownPerson(source.to_owned()));
        };
        let Some((target_idx, &target_key, _)) = self.balances.get_full(target) else {
            return Err(LedgerError::UnknownPerson(target.to_owned()));
        };

        if source_idx == target_idx {
            return Ok(BalanceMerge {
                source: source_key,
                target: target_key,
                amount: Money::ZERO,
            });
        }

        self.balances[source_idx] = Money::ZERO;
        self.balances[target_idx] += moved;

        Ok(BalanceMerge {
            source: source_key,
            target: target_key,
            amount: moved,
        })
    }

    /// Debtor pays creditor: `from` moves up, `to` moves down.
    pub fn apply_transfer(&mut self, transfer: &Transfer<'a>) {
        self.credit(transfer.from, transfer.amount);
        self.credit(transfer.to, -transfer.amount);
    }
}

impl<'a> FromIterator<(&'a str, Money)> for BalanceSheet<'a> {
    fn from_iter<I: IntoIterator<Item = (&'a str, Money)>>(iter: I) -> Self {
        Self {
            balances: iter.into_iter().collect(),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Transfer<'a> {
    pub from: &'a str,
    pub to: &'a str,
    pub amount: Money,
}

#[derive(Debug, PartialEq)]
pub struct Settlement<'a> {
    pub new_balances: BalanceSheet<'a>,
    pub transfers: Vec<Transfer<'a>>,
}
