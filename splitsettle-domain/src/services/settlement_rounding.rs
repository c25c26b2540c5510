//! Atomic-unit arithmetic and zero-sum rounding of balances.
//!
//! Every split is carried out in integer atomic units of the configured scale
//! (cents by default), so balances produced by the ledger are already exact.
//! Balance sheets supplied from elsewhere may carry more precision; those are
//! quantized here before settlement:
//! 1. The total must be within the tolerance of zero.
//! 2. Each balance is rounded to the atomic unit.
//! 3. The rounded total `V` is repaired by moving `|V|` members one unit each,
//!    starting with those whose rounding drifted furthest in the surplus direction.

use crate::model::{BalanceSheet, Money};
use rust_decimal::{Decimal, RoundingStrategy, prelude::ToPrimitive};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RoundingMode {
    /// Round half away from zero (0.005 -> 0.01, -0.005 -> -0.01).
    HalfUp,
    /// Banker's rounding.
    HalfEven,
}

/// Scale and rounding used for splitting and settling.
///
/// # Example
/// ```
/// use splitsettle_domain::{Money, services::{RoundingMode, SettlementContext}};
///
/// let ctx = SettlementContext {
///     scale: 2,
///     rounding_mode: RoundingMode::HalfUp,
/// };
/// assert_eq!(ctx.to_atomic_units_i64(Money::new(1050, 2)), Ok(1050));
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SettlementContext {
    /// Decimal places of the atomic unit (2 for cents).
    pub scale: u32,
    pub rounding_mode: RoundingMode,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
pub enum AtomicUnitConversionError {
    #[error("amount is not a whole number of atomic units")]
    NonIntegral,
    #[error("amount does not fit in atomic units")]
    OutOfRange,
    #[error("scale {scale} is not supported (max {max_supported})")]
    UnsupportedScale { scale: u32, max_supported: u32 },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
pub enum SettlementRoundingError {
    /// The balances do not sum to zero within tolerance.
    #[error("balances sum to {0}, not zero")]
    ImbalancedTotal(Money),
    #[error("rounding needs more adjustments than there are people")]
    InvalidAdjustmentCount,
    #[error("rounded balances failed to restore a zero total")]
    ZeroSumInvariantViolation,
    #[error("balance does not fit in atomic units")]
    OutOfRange,
    #[error("scale {scale} is not supported (max {max_supported})")]
    UnsupportedScale { scale: u32, max_supported: u32 },
}

pub const DEFAULT_SCALE: u32 = 2;
pub const MAX_SETTLEMENT_SCALE: u32 = 22;
const EPSILON_OP_COUNT_BUDGET: i64 = 1_000_000;
const EPSILON_SAFETY_FACTOR: i64 = 100;

impl SettlementContext {
    pub fn cents_default() -> Self {
        Self {
            scale: DEFAULT_SCALE,
            rounding_mode: RoundingMode::HalfUp,
        }
    }

    pub fn atomic_unit(self) -> Money {
        Money::new(1, self.scale.min(MAX_SETTLEMENT_SCALE))
    }

    /// Largest absolute total still treated as zero.
    pub fn tolerance(self) -> Money {
        let baseline = Decimal::new(1, self.scale.min(MAX_SETTLEMENT_SCALE) + 6);
        let epsilon_min = Decimal::from(EPSILON_SAFETY_FACTOR * EPSILON_OP_COUNT_BUDGET)
            * Decimal::from_i128_with_scale(1, 28);
        Money::from_decimal(baseline.max(epsilon_min))
    }

    pub fn to_atomic_units_i64(self, amount: Money) -> Result<i64, AtomicUnitConversionError> {
        if self.scale > MAX_SETTLEMENT_SCALE {
            return Err(AtomicUnitConversionError::UnsupportedScale {
                scale: self.scale,
                max_supported: MAX_SETTLEMENT_SCALE,
            });
        }
        let factor = Decimal::from_i128_with_scale(10_i128.pow(self.scale), 0);
        let units = amount
            .as_decimal()
            .checked_mul(factor)
            .ok_or(AtomicUnitConversionError::OutOfRange)?;
        if !units.fract().is_zero() {
            return Err(AtomicUnitConversionError::NonIntegral);
        }
        units.to_i64().ok_or(AtomicUnitConversionError::OutOfRange)
    }

    pub fn from_atomic_units(self, units: i64) -> Money {
        Money::new(units, self.scale.min(MAX_SETTLEMENT_SCALE))
    }
}

impl Default for SettlementContext {
    fn default() -> Self {
        Self::cents_default()
    }
}

/// Rounds every balance to the atomic unit while keeping the total at exactly zero.
pub fn quantize_balances<'a>(
    balances: &BalanceSheet<'a>,
    context: SettlementContext,
) -> Result<BalanceSheet<'a>, SettlementRoundingError> {
    if context.scale > MAX_SETTLEMENT_SCALE {
        return Err(SettlementRoundingError::UnsupportedScale {
            scale: context.scale,
            max_supported: MAX_SETTLEMENT_SCALE,
        });
    }

    let atomic_unit = context.atomic_unit().as_decimal();
    let tolerance = context.tolerance();
    let original_sum = balances.total();
    if original_sum.abs() > tolerance {
        tracing::error!(
            reject_reason = "input_imbalance",
            member_count = balances.len(),
            sum_original = %original_sum,
            tolerance = %tolerance,
            "Balance quantization rejected due to input imbalance"
        );
        return Err(SettlementRoundingError::ImbalancedTotal(original_sum));
    }

    let strategy = match context.rounding_mode {
        RoundingMode::HalfUp => RoundingStrategy::MidpointAwayFromZero,
        RoundingMode::HalfEven => RoundingStrategy::MidpointNearestEven,
    };

    let mut entries: Vec<(&'a str, i64, Decimal)> = balances
        .iter()
        .map(|(name, money)| {
            let original = money.as_decimal();
            let units = quantize_to_units(original, atomic_unit, strategy)?;
            let diff = Decimal::from(units) * atomic_unit - original;
            Ok((name, units, diff))
        })
        .collect::<Result<_, SettlementRoundingError>>()?;

    let v_int: i128 = entries
        .iter()
        .map(|(_, units, _)| i128::from(*units))
        .sum();

    if v_int != 0 {
        let adjustment_count = usize::try_from(v_int.unsigned_abs())
            .map_err(|_| SettlementRoundingError::InvalidAdjustmentCount)?;
        if adjustment_count > entries.len() {
            tracing::error!(
                reject_reason = "k_gt_n",
                v_int,
                adjustment_count,
                member_count = entries.len(),
                "Adjustment count exceeds participant count during balance quantization"
            );
            return Err(SettlementRoundingError::InvalidAdjustmentCount);
        }

        // Surplus: take back from those rounded up the most. Deficit: give to those
        // rounded down the most. Registry order breaks ties.
        let score_sign = if v_int > 0 {
            Decimal::ONE
        } else {
            Decimal::NEGATIVE_ONE
        };
        let mut ranked: Vec<usize> = (0..entries.len()).collect();
        ranked.sort_by(|&a, &b| {
            (entries[b].2 * score_sign)
                .cmp(&(entries[a].2 * score_sign))
                .then_with(|| a.cmp(&b))
        });

        let step = if v_int > 0 { -1 } else { 1 };
        let mut selected = Vec::with_capacity(adjustment_count);
        for &idx in ranked.iter().take(adjustment_count) {
            entries[idx].1 += step;
            selected.push(entries[idx].0);
        }

        tracing::warn!(
            v_int,
            adjustment_count,
            selected = ?selected,
            member_count = entries.len(),
            "Balance quantization repaired rounding drift"
        );

        let repaired: i128 = entries
            .iter()
            .map(|(_, units, _)| i128::from(*units))
            .sum();
        if repaired != 0 {
            tracing::error!(
                reject_reason = "zero_sum_invariant_violation",
                repaired,
                "Balance quantization failed zero-sum invariant check"
            );
            return Err(SettlementRoundingError::ZeroSumInvariantViolation);
        }
    }

    Ok(entries
        .into_iter()
        .map(|(name, units, _)| (name, context.from_atomic_units(units)))
        .collect())
}

fn quantize_to_units(
    original: Decimal,
    atomic_unit: Decimal,
    strategy: RoundingStrategy,
) -> Result<i64, SettlementRoundingError> {
    let Some(units) = original
        .checked_div(atomic_unit)
        .map(|value| value.round_dp_with_strategy(0, strategy))
    else {
        return Err(SettlementRoundingError::OutOfRange);
    };
    units.to_i64().ok_or_else(|| {
        tracing::warn!(
            reject_reason = "quantize_failure",
            original = %original,
            atomic_unit = %atomic_unit,
            "Quantization unit conversion failed"
        );
        SettlementRoundingError::OutOfRange
    })
}
