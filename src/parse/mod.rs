//! Literal grammar for rule parameters stored as text.
//!
//! Thresholds and reference instants arrive from the settings form as plain
//! strings. This module turns them into typed values.

mod error;
mod grammar;

pub use error::ParseError;

use crate::Temporal;

/// Parse a temporal literal: `HH:MM[:SS]`, `YYYY-MM-DD` or
/// `YYYY-MM-DD[T| ]HH:MM[:SS]`. Surrounding blanks are ignored.
///
/// # Errors
///
/// Returns [`ParseError`] if the input is not one of the accepted forms or
/// names a calendar date or clock time that does not exist.
pub fn parse_temporal(input: &str) -> Result<Temporal, ParseError> {
    use winnow::Parser;
    grammar::temporal
        .parse(input)
        .map_err(|e| ParseError::new(e.to_string()))
}

/// Read the leading numeric prefix of `input`, ignoring anything after it.
///
/// Returns `None` when the text does not start with a number.
#[must_use]
pub fn parse_number(input: &str) -> Option<f64> {
    use winnow::Parser;
    let mut rest = input;
    grammar::numeric_prefix
        .parse_next(&mut rest)
        .ok()
        .and_then(|prefix| prefix.parse().ok())
}
