//! # Weather-Type Breakpoint Matrix
//!
//! Immutable model of the threshold grid used to post-process forecasts.
//!
//! ## Layout
//!
//! Every row is one weather type. It carries an optional code and, per
//! predictor level, a `(low, high)` threshold pair:
//!
//! ```text
//! code │ level 0        │ level 1        │ ...
//! ─────┼────────────────┼────────────────┼────
//! 11   │ (-inf,   0.25) │ (-inf,    2.0) │
//! 12   │ (-inf,   0.25) │ ( 2.0,    inf) │
//! 21   │ ( 0.25,  inf ) │ (-inf,    inf) │
//! ```
//!
//! ## Splitting
//!
//! ```text
//! row r: (lo, hi)  ──split_row(v)──>  row r:   (lo, v)
//!                                     row r+1: (v,  hi)
//! ```
//!
//! `apply_splits` repeats this at the same row for a descending list of
//! values, so every insertion happens at `r` and the finished rows come out
//! in ascending order.
//!
//! ## Example
//!
//! ```rust
//! use wtsplit_matrix::{apply_splits, BreakpointMatrix, MatrixRow, ThresholdPair};
//!
//! let matrix = BreakpointMatrix::new(vec![MatrixRow::new(
//!     Some("1".to_string()),
//!     vec![ThresholdPair::new(0.0, 10.0)],
//! )])
//! .unwrap();
//!
//! let (split, inserted) = apply_splits(&matrix, 0, 0, &[7.0, 3.0]).unwrap();
//! assert_eq!(inserted, 2);
//! assert_eq!(split.len(), 3);
//! ```

mod error;
mod levels;
mod matrix;
mod split;
pub mod threshold_serde;
pub mod validation;

pub use error::{MatrixError, Result, ValidationError};
pub use levels::{level_options, LevelOption};
pub use matrix::{BreakpointMatrix, MatrixRow, ThresholdPair};
pub use split::{affected_rows, apply_splits, split_row};
pub use validation::{
    is_valid_ascending_list, is_valid_number, parse_breakpoint_list, parse_count,
    split_value_list, ListStatus,
};
