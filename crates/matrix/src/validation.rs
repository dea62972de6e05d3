//! Predicates for user-typed numbers and breakpoint lists.

use crate::error::ValidationError;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

static REAL_NUMBER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[+-]?[0-9]+(\.[0-9]+)?$").expect("real number pattern is valid")
});

/// `true` for an untouched field (`""`) or a real number like `-3`, `0.25`
pub fn is_valid_number(text: &str) -> bool {
    text.is_empty() || REAL_NUMBER.is_match(text)
}

/// `true` when every entry is a number and the parsed list strictly increases.
///
/// An empty list counts as valid; callers tell "nothing typed" apart with
/// [`ListStatus`].
pub fn is_valid_ascending_list<S: AsRef<str>>(values: &[S]) -> bool {
    let mut previous: Option<f64> = None;
    for value in values {
        let text = value.as_ref();
        if text.is_empty() || !REAL_NUMBER.is_match(text) {
            return false;
        }
        let Ok(parsed) = text.parse::<f64>() else {
            return false;
        };
        if previous.is_some_and(|prev| prev >= parsed) {
            return false;
        }
        previous = Some(parsed);
    }
    true
}

/// Comma-separated input split into trimmed entries; blank input gives none
pub fn split_value_list(raw: &str) -> Vec<String> {
    if raw.trim().is_empty() {
        return Vec::new();
    }
    raw.split(',').map(|value| value.trim().to_string()).collect()
}

/// Inline state of a typed breakpoint list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ListStatus {
    /// Nothing typed: no error shown, submit disabled
    Empty,
    /// At least one entry is not a number
    Invalid,
    /// Numbers, but not strictly increasing as typed
    Unordered,
    /// Numbers in strictly increasing order
    Ascending,
}

impl ListStatus {
    pub fn of<S: AsRef<str>>(values: &[S]) -> Self {
        if values.is_empty() {
            Self::Empty
        } else if is_valid_ascending_list(values) {
            Self::Ascending
        } else if values
            .iter()
            .all(|v| !v.as_ref().is_empty() && REAL_NUMBER.is_match(v.as_ref()))
        {
            Self::Unordered
        } else {
            Self::Invalid
        }
    }

    /// Whether the field should render in its error state
    pub const fn shows_error(self) -> bool {
        matches!(self, Self::Invalid)
    }
}

/// Parse typed breakpoints, rejecting blanks, non-numbers and duplicates.
///
/// Order is preserved; sorting is up to the caller.
pub fn parse_breakpoint_list<S: AsRef<str>>(values: &[S]) -> Result<Vec<f64>, ValidationError> {
    if values.is_empty() {
        return Err(ValidationError::Empty);
    }
    let mut parsed: Vec<f64> = Vec::with_capacity(values.len());
    for value in values {
        let text = value.as_ref();
        if text.is_empty() || !REAL_NUMBER.is_match(text) {
            return Err(ValidationError::NotANumber(text.to_string()));
        }
        let number = text
            .parse::<f64>()
            .map_err(|_| ValidationError::NotANumber(text.to_string()))?;
        if parsed.contains(&number) {
            return Err(ValidationError::Duplicate(text.to_string()));
        }
        parsed.push(number);
    }
    Ok(parsed)
}

/// Desired number of candidate breakpoints
pub fn parse_count(text: &str) -> Result<u32, ValidationError> {
    let trimmed = text.trim();
    match trimmed.parse::<u32>() {
        Ok(count) if count > 0 => Ok(count),
        _ => Err(ValidationError::InvalidCount(text.to_string())),
    }
}
