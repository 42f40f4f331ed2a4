//! Structural validation for bracket tables.
//!
//! Validation runs on the configuration-update path, before a table is
//! trusted: the calculation path assumes every table it receives has
//! already passed. The first violation found is returned; bracket indexes
//! in messages are 1-based, matching how operators see tables in an
//! editing interface.

use rust_decimal::Decimal;
use thiserror::Error;

use super::types::{BracketTable, TableKind};

/// A structural violation found in a bracket table.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BracketValidationError {
    /// The table contains no brackets at all.
    #[error("bracket table must be non-empty")]
    Empty,

    /// A bracket other than the last has no upper bound.
    #[error("bracket {index} has no upper bound; only the last bracket may be unbounded")]
    UnboundedBeforeLast {
        /// 1-based index of the offending bracket.
        index: usize,
    },

    /// A with-deduction table has a bracket without a deduction.
    #[error("bracket {index} is missing its deduction")]
    MissingDeduction {
        /// 1-based index of the offending bracket.
        index: usize,
    },

    /// A bracket's lower bound exceeds its upper bound.
    #[error("bracket {index} has min ({min}) greater than max ({max})")]
    InvertedBounds {
        /// 1-based index of the offending bracket.
        index: usize,
        /// The lower bound.
        min: Decimal,
        /// The upper bound.
        max: Decimal,
    },

    /// A numeric field that must be non-negative is negative.
    #[error("bracket {index} has a negative {field}")]
    NegativeField {
        /// 1-based index of the offending bracket.
        index: usize,
        /// Which field is negative ("min", "max", or "deduction").
        field: &'static str,
    },

    /// A rate lies outside the `0..=1` domain.
    #[error("bracket {index} has rate ({rate}) outside the range 0 to 1")]
    RateOutOfRange {
        /// 1-based index of the offending bracket.
        index: usize,
        /// The offending rate.
        rate: Decimal,
    },

    /// A bracket's lower bound does not meet the previous upper bound.
    #[error("bracket {index} min ({min}) should equal previous bracket max ({previous_max})")]
    NotContiguous {
        /// 1-based index of the offending bracket.
        index: usize,
        /// The offending lower bound.
        min: Decimal,
        /// The upper bound of the preceding bracket.
        previous_max: Decimal,
    },
}

/// Validates the structural invariants of a bracket table.
///
/// Checks, in order, returning the first violation found:
///
/// 1. the table is non-empty;
/// 2. required fields are present for the table kind (every bracket of a
///    with-deduction table carries a deduction; only the last bracket may
///    be unbounded);
/// 3. all numeric fields are within domain range (`min`, `max`, and
///    `deduction` non-negative; `rate` within `0..=1`; `min <= max`);
/// 4. for every bracket after the first, `min` equals the previous
///    bracket's `max` (contiguity).
///
/// # Examples
///
/// ```
/// use paycheck_engine::config::{validate_bracket_table, BracketTable, TableKind};
///
/// let table: BracketTable = serde_yaml::from_str(
///     "[{min: 0, max: 1412.00, rate: 0.075}, {min: 1412.00, max: 2666.68, rate: 0.09}]",
/// ).unwrap();
/// assert!(validate_bracket_table(&table, TableKind::Progressive).is_ok());
/// ```
pub fn validate_bracket_table(
    table: &BracketTable,
    kind: TableKind,
) -> Result<(), BracketValidationError> {
    if table.is_empty() {
        return Err(BracketValidationError::Empty);
    }

    let last = table.len() - 1;
    for (i, bracket) in table.brackets.iter().enumerate() {
        let index = i + 1;

        if bracket.max.is_none() && i != last {
            return Err(BracketValidationError::UnboundedBeforeLast { index });
        }
        if kind == TableKind::WithDeduction && bracket.deduction.is_none() {
            return Err(BracketValidationError::MissingDeduction { index });
        }

        if bracket.min < Decimal::ZERO {
            return Err(BracketValidationError::NegativeField { index, field: "min" });
        }
        if let Some(max) = bracket.max {
            if max < Decimal::ZERO {
                return Err(BracketValidationError::NegativeField { index, field: "max" });
            }
            if bracket.min > max {
                return Err(BracketValidationError::InvertedBounds {
                    index,
                    min: bracket.min,
                    max,
                });
            }
        }
        if let Some(deduction) = bracket.deduction {
            if deduction < Decimal::ZERO {
                return Err(BracketValidationError::NegativeField {
                    index,
                    field: "deduction",
                });
            }
        }
        if bracket.rate < Decimal::ZERO || bracket.rate > Decimal::ONE {
            return Err(BracketValidationError::RateOutOfRange {
                index,
                rate: bracket.rate,
            });
        }

        if i > 0 {
            // Upper bounds are finite here: an unbounded bracket before the
            // last was rejected above, on the previous iteration.
            let previous_max = table.brackets[i - 1].upper();
            if bracket.min != previous_max {
                return Err(BracketValidationError::NotContiguous {
                    index,
                    min: bracket.min,
                    previous_max,
                });
            }
        }
    }

    Ok(())
}
