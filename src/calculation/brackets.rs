//! Bracket table calculation operations.
//!
//! Two models are supported. *Progressive accumulation* (social
//! contributions): marginal rates accumulate across every bracket the
//! value passes through. *Flat deduction* (withholding income tax): the
//! containing bracket's rate applies to the whole value, less that
//! bracket's flat deduction. Both clamp negative inputs and never return
//! a negative amount.
//!
//! Callers must validate a table (see
//! [`crate::config::validate_bracket_table`]) whenever configuration
//! changes; these operations assume a contiguous, ascending table.

use rust_decimal::Decimal;

use crate::config::BracketTable;

/// Accumulates marginal contributions across the table.
///
/// For each bracket whose lower bound the value exceeds, accumulates
/// `rate × (min(value, max) − min)`, stopping after the bracket that
/// contains the value. There is no flat deduction: the result is a
/// straight sum of marginal rates, the model used by social-contribution
/// tables.
///
/// Negative values contribute nothing. For a valid table the result is
/// monotonically non-decreasing in `value` and never negative.
///
/// # Examples
///
/// ```
/// use paycheck_engine::calculation::apply_progressive;
/// use paycheck_engine::config::BracketTable;
/// use rust_decimal::Decimal;
/// use std::str::FromStr;
///
/// let table: BracketTable = serde_yaml::from_str(
///     "[{min: 0, max: 1412.00, rate: 0.075}, {min: 1412.00, max: 2666.68, rate: 0.09}]",
/// ).unwrap();
/// let contribution = apply_progressive(Decimal::from_str("1800").unwrap(), &table);
/// assert_eq!(contribution, Decimal::from_str("140.82").unwrap());
/// ```
pub fn apply_progressive(value: Decimal, table: &BracketTable) -> Decimal {
    if value <= Decimal::ZERO {
        return Decimal::ZERO;
    }

    let mut total = Decimal::ZERO;
    for bracket in &table.brackets {
        if value > bracket.min {
            let taxable = value.min(bracket.upper()) - bracket.min;
            total += taxable * bracket.rate;
        }
        if value <= bracket.upper() {
            break;
        }
    }
    total
}

/// Applies the containing bracket's rate to the whole value, less that
/// bracket's flat deduction, clamped at zero.
///
/// A value exactly on a boundary belongs to the bracket whose upper bound
/// it equals; published deduction constants are calibrated so the two
/// sides of every boundary agree. Values beyond a bounded table's top
/// fall back to the last bracket, so the result stays monotonic if a
/// configuration caps its top bracket.
pub fn apply_with_deduction(value: Decimal, table: &BracketTable) -> Decimal {
    if value <= Decimal::ZERO {
        return Decimal::ZERO;
    }

    let bracket = match table.containing(value).or_else(|| table.brackets.last()) {
        Some(bracket) => bracket,
        None => return Decimal::ZERO,
    };

    let due = value * bracket.rate - bracket.deduction.unwrap_or_default();
    due.max(Decimal::ZERO)
}
