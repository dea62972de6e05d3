use crate::error::{Result, SessionError};
use serde::{Deserialize, Serialize};
use std::fmt;
use wtsplit_matrix::threshold_serde::format_threshold;

/// Side of a confirmed breakpoint to search again
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BoundDirection {
    /// `<`: between the previous confirmed value (or -inf) and this one
    #[serde(rename = "<")]
    Below,
    /// `>`: between this value and the next confirmed one (or +inf)
    #[serde(rename = ">")]
    Above,
}

impl BoundDirection {
    pub const fn symbol(self) -> &'static str {
        match self {
            Self::Below => "<",
            Self::Above => ">",
        }
    }
}

impl fmt::Display for BoundDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// Open interval a bounded search is restricted to
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SearchBounds {
    pub lower: f64,
    pub upper: f64,
}

impl SearchBounds {
    /// `"{lower} < {field} < {upper}"`, infinities spelled `-inf` / `inf`
    pub fn describe(&self, field: &str) -> String {
        format!(
            "{} < {} < {}",
            format_threshold(self.lower),
            field,
            format_threshold(self.upper)
        )
    }
}

/// Bounds around `confirmed[index]`; `confirmed` must be ascending
pub fn compute_bounds(
    confirmed: &[f64],
    index: usize,
    direction: BoundDirection,
) -> Result<SearchBounds> {
    let Some(&pivot) = confirmed.get(index) else {
        return Err(SessionError::IndexOutOfRange {
            index,
            len: confirmed.len(),
        });
    };

    let bounds = match direction {
        BoundDirection::Below => SearchBounds {
            lower: index
                .checked_sub(1)
                .map_or(f64::NEG_INFINITY, |prev| confirmed[prev]),
            upper: pivot,
        },
        BoundDirection::Above => SearchBounds {
            lower: pivot,
            upper: confirmed.get(index + 1).copied().unwrap_or(f64::INFINITY),
        },
    };
    Ok(bounds)
}
