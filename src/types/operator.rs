use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// Comparison operators a rule can be authored with.
///
/// Which of these are legal for a given rule type is recorded in the
/// [`RuleTypeRegistry`](crate::RuleTypeRegistry).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    EqualTo,
    LessThan,
    LessThanOrEqual,
    GreaterThanOrEqual,
    GreaterThan,
    Between,
    NotBetween,
    AnyInList,
    AllInList,
    NotInList,
    Before,
    After,
}

/// The numeric comparison operators.
pub const NUMERIC_OPERATORS: &[Operator] = &[
    Operator::EqualTo,
    Operator::LessThan,
    Operator::LessThanOrEqual,
    Operator::GreaterThanOrEqual,
    Operator::GreaterThan,
    Operator::Between,
    Operator::NotBetween,
];

/// Membership operators for single-valued facts.
pub const MEMBERSHIP_OPERATORS: &[Operator] = &[Operator::AnyInList, Operator::NotInList];

/// Membership operators for set-valued facts.
pub const SET_OPERATORS: &[Operator] = &[
    Operator::AnyInList,
    Operator::AllInList,
    Operator::NotInList,
];

/// Operators comparing the current instant against reference instants.
pub const TEMPORAL_OPERATORS: &[Operator] = &[
    Operator::Before,
    Operator::After,
    Operator::Between,
    Operator::NotBetween,
];

impl Operator {
    /// The stored identifier, e.g. `"greater_than_or_equal"`.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Operator::EqualTo => "equal_to",
            Operator::LessThan => "less_than",
            Operator::LessThanOrEqual => "less_than_or_equal",
            Operator::GreaterThanOrEqual => "greater_than_or_equal",
            Operator::GreaterThan => "greater_than",
            Operator::Between => "between",
            Operator::NotBetween => "not_between",
            Operator::AnyInList => "any_in_list",
            Operator::AllInList => "all_in_list",
            Operator::NotInList => "not_in_list",
            Operator::Before => "before",
            Operator::After => "after",
        }
    }

    /// Compare `actual` against one threshold, or against the closed range
    /// `[low, high]` for `Between`/`NotBetween`.
    ///
    /// Returns `None` for operators that are not numeric comparisons.
    #[must_use]
    #[allow(clippy::float_cmp)]
    pub fn compare(self, actual: f64, low: f64, high: f64) -> Option<bool> {
        Some(match self {
            Operator::EqualTo => actual == low,
            Operator::LessThan => actual < low,
            Operator::LessThanOrEqual => actual <= low,
            Operator::GreaterThanOrEqual => actual >= low,
            Operator::GreaterThan => actual > low,
            Operator::Between => actual >= low && actual <= high,
            Operator::NotBetween => actual < low || actual > high,
            _ => return None,
        })
    }
}

/// Error returned when an operator identifier is not recognised.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown operator '{0}'")]
pub struct UnknownOperator(pub String);

impl FromStr for Operator {
    type Err = UnknownOperator;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "equal_to" => Operator::EqualTo,
            "less_than" => Operator::LessThan,
            "less_than_or_equal" => Operator::LessThanOrEqual,
            "greater_than_or_equal" => Operator::GreaterThanOrEqual,
            "greater_than" => Operator::GreaterThan,
            "between" => Operator::Between,
            "not_between" => Operator::NotBetween,
            "any_in_list" => Operator::AnyInList,
            "all_in_list" => Operator::AllInList,
            "not_in_list" => Operator::NotInList,
            "before" => Operator::Before,
            "after" => Operator::After,
            other => return Err(UnknownOperator(other.to_owned())),
        })
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
