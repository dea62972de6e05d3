use crate::error::{MatrixError, Result};
use crate::matrix::{BreakpointMatrix, MatrixRow, ThresholdPair};
use std::ops::RangeInclusive;

/// Split one row at `value` on `level`.
///
/// The row keeps `(low, value)`, and a copy holding `(value, high)` is
/// inserted right after it. Every other row is carried over untouched.
pub fn split_row(
    matrix: &BreakpointMatrix,
    row_index: usize,
    level: usize,
    value: f64,
) -> Result<BreakpointMatrix> {
    let pair = matrix.bounds(row_index, level)?;
    if !pair.strictly_contains(value) {
        return Err(MatrixError::InvalidSplitValue {
            value,
            low: pair.low,
            high: pair.high,
        });
    }

    let source = &matrix.rows()[row_index];
    let lower = with_level(source, level, ThresholdPair::new(pair.low, value));
    let upper = with_level(source, level, ThresholdPair::new(value, pair.high));

    let mut rows = Vec::with_capacity(matrix.len() + 1);
    rows.extend_from_slice(&matrix.rows()[..row_index]);
    rows.push(lower);
    rows.push(upper);
    rows.extend_from_slice(&matrix.rows()[row_index + 1..]);

    log::debug!("Split row {row_index} at level {level} on {value}");
    Ok(BreakpointMatrix::from_rows_unchecked(rows))
}

/// Apply several splits to the same row.
///
/// `values` must be in descending order: each split narrows the row at
/// `row_index` to `(low, value)`, so the next (smaller) value still falls
/// inside it and the insertion point never moves. Returns the new matrix and
/// the number of inserted rows.
pub fn apply_splits(
    matrix: &BreakpointMatrix,
    row_index: usize,
    level: usize,
    values: &[f64],
) -> Result<(BreakpointMatrix, usize)> {
    let mut current = matrix.clone();
    for &value in values {
        current = split_row(&current, row_index, level, value)?;
    }
    Ok((current, values.len()))
}

/// Rows touched by `apply_splits`: the original row plus every inserted one
#[must_use]
pub fn affected_rows(row_index: usize, inserted: usize) -> RangeInclusive<usize> {
    row_index..=row_index + inserted
}

fn with_level(source: &MatrixRow, level: usize, pair: ThresholdPair) -> MatrixRow {
    let mut bounds = source.bounds.clone();
    bounds[level] = pair;
    MatrixRow::new(source.code.clone(), bounds)
}
