use crate::error::{MatrixError, Result};
use serde::{Deserialize, Serialize};
use std::ops::RangeInclusive;

/// Lower/upper threshold of one predictor level
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ThresholdPair {
    #[serde(with = "crate::threshold_serde")]
    pub low: f64,
    #[serde(with = "crate::threshold_serde")]
    pub high: f64,
}

impl ThresholdPair {
    #[must_use]
    pub const fn new(low: f64, high: f64) -> Self {
        Self { low, high }
    }

    /// `low < high`; false for NaN on either side
    #[must_use]
    pub fn is_ordered(&self) -> bool {
        self.low < self.high
    }

    /// Strict containment, the condition a split value has to meet
    #[must_use]
    pub fn strictly_contains(&self, value: f64) -> bool {
        self.low < value && value < self.high
    }
}

/// One weather type: an optional code plus one threshold pair per level
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatrixRow {
    /// Weather-type code; `None` until derived by the computation service
    #[serde(default)]
    pub code: Option<String>,

    /// Threshold pairs, indexed by predictor level
    pub bounds: Vec<ThresholdPair>,
}

impl MatrixRow {
    #[must_use]
    pub const fn new(code: Option<String>, bounds: Vec<ThresholdPair>) -> Self {
        Self { code, bounds }
    }

    /// Thresholds flattened to `[l0_low, l0_high, l1_low, l1_high, ...]`
    #[must_use]
    pub fn flat_thresholds(&self) -> Vec<f64> {
        self.bounds
            .iter()
            .flat_map(|pair| [pair.low, pair.high])
            .collect()
    }

    #[must_use]
    pub fn level_count(&self) -> usize {
        self.bounds.len()
    }
}

/// Ordered, validated sequence of weather-type rows.
///
/// Never mutated in place: every transformation hands back a new matrix.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<MatrixRow>", into = "Vec<MatrixRow>")]
pub struct BreakpointMatrix {
    rows: Vec<MatrixRow>,
}

impl BreakpointMatrix {
    /// Build a matrix, checking `low < high` everywhere and a uniform level count
    pub fn new(rows: Vec<MatrixRow>) -> Result<Self> {
        if let Some(first) = rows.first() {
            let expected = first.level_count();
            for (row_idx, row) in rows.iter().enumerate() {
                if row.level_count() != expected {
                    return Err(MatrixError::LevelCountMismatch {
                        row: row_idx,
                        expected,
                        actual: row.level_count(),
                    });
                }
                if let Some((level, pair)) = row
                    .bounds
                    .iter()
                    .enumerate()
                    .find(|(_, pair)| !pair.is_ordered())
                {
                    return Err(MatrixError::InvalidBounds {
                        row: row_idx,
                        level,
                        low: pair.low,
                        high: pair.high,
                    });
                }
            }
        }
        Ok(Self { rows })
    }

    /// Build from flat threshold rows (`[l0_low, l0_high, ...]`) without codes
    pub fn from_flat_rows(rows: &[Vec<f64>]) -> Result<Self> {
        let rows = rows
            .iter()
            .enumerate()
            .map(|(row_idx, flat)| {
                if flat.len() % 2 != 0 {
                    return Err(MatrixError::OddThresholdCount {
                        row: row_idx,
                        len: flat.len(),
                    });
                }
                let bounds = flat
                    .chunks_exact(2)
                    .map(|pair| ThresholdPair::new(pair[0], pair[1]))
                    .collect();
                Ok(MatrixRow::new(None, bounds))
            })
            .collect::<Result<Vec<_>>>()?;
        Self::new(rows)
    }

    /// Rows produced by the split algorithm keep the invariants by construction
    pub(crate) fn from_rows_unchecked(rows: Vec<MatrixRow>) -> Self {
        Self { rows }
    }

    #[must_use]
    pub fn rows(&self) -> &[MatrixRow] {
        &self.rows
    }

    #[must_use]
    pub fn row(&self, index: usize) -> Option<&MatrixRow> {
        self.rows.get(index)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Number of levels shared by all rows (0 for an empty matrix)
    #[must_use]
    pub fn level_count(&self) -> usize {
        self.rows.first().map_or(0, MatrixRow::level_count)
    }

    /// Threshold pair at (`row`, `level`)
    pub fn bounds(&self, row: usize, level: usize) -> Result<ThresholdPair> {
        let target = self.rows.get(row).ok_or(MatrixError::RowOutOfRange {
            row,
            rows: self.rows.len(),
        })?;
        target
            .bounds
            .get(level)
            .copied()
            .ok_or(MatrixError::LevelOutOfRange {
                level,
                levels: target.level_count(),
            })
    }

    /// Thresholds of every row in the flat wire layout
    #[must_use]
    pub fn flat_rows(&self) -> Vec<Vec<f64>> {
        self.rows.iter().map(MatrixRow::flat_thresholds).collect()
    }

    /// Rows in `range`, clamped to the matrix
    #[must_use]
    pub fn row_slice(&self, range: RangeInclusive<usize>) -> &[MatrixRow] {
        if self.rows.is_empty() {
            return &[];
        }
        let start = (*range.start()).min(self.rows.len());
        let end = range.end().saturating_add(1).min(self.rows.len());
        if start >= end {
            return &[];
        }
        &self.rows[start..end]
    }

    /// Copy with one code per row, aligned by position
    pub fn with_codes(&self, codes: Vec<String>) -> Result<Self> {
        if codes.len() != self.rows.len() {
            return Err(MatrixError::CodeCountMismatch {
                expected: self.rows.len(),
                actual: codes.len(),
            });
        }
        let rows = self
            .rows
            .iter()
            .zip(codes)
            .map(|(row, code)| MatrixRow::new(Some(code), row.bounds.clone()))
            .collect();
        Ok(Self { rows })
    }

    /// Copy with the codes in `range` dropped
    #[must_use]
    pub fn without_codes(&self, range: RangeInclusive<usize>) -> Self {
        let rows = self
            .rows
            .iter()
            .enumerate()
            .map(|(idx, row)| {
                if range.contains(&idx) {
                    MatrixRow::new(None, row.bounds.clone())
                } else {
                    row.clone()
                }
            })
            .collect();
        Self { rows }
    }
}

impl TryFrom<Vec<MatrixRow>> for BreakpointMatrix {
    type Error = MatrixError;

    fn try_from(rows: Vec<MatrixRow>) -> Result<Self> {
        Self::new(rows)
    }
}

impl From<BreakpointMatrix> for Vec<MatrixRow> {
    fn from(matrix: BreakpointMatrix) -> Self {
        matrix.rows
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn row(code: &str, bounds: &[(f64, f64)]) -> MatrixRow {
        MatrixRow::new(
            Some(code.to_string()),
            bounds.iter().map(|&(lo, hi)| ThresholdPair::new(lo, hi)).collect(),
        )
    }

    #[test]
    fn rejects_unordered_pair() {
        let err = BreakpointMatrix::new(vec![row("1", &[(5.0, 5.0)])]).unwrap_err();
        assert!(matches!(err, MatrixError::InvalidBounds { row: 0, level: 0, .. }));
    }

    #[test]
    fn rejects_ragged_levels() {
        let err = BreakpointMatrix::new(vec![
            row("1", &[(0.0, 1.0), (0.0, 1.0)]),
            row("2", &[(0.0, 1.0)]),
        ])
        .unwrap_err();
        assert_eq!(
            err,
            MatrixError::LevelCountMismatch {
                row: 1,
                expected: 2,
                actual: 1
            }
        );
    }

    #[test]
    fn infinite_bounds_are_valid() {
        let matrix = BreakpointMatrix::new(vec![row(
            "1",
            &[(f64::NEG_INFINITY, 0.25), (2.0, f64::INFINITY)],
        )])
        .unwrap();
        assert_eq!(
            matrix.flat_rows(),
            vec![vec![f64::NEG_INFINITY, 0.25, 2.0, f64::INFINITY]]
        );
    }

    #[test]
    fn flat_rows_round_trip() {
        let flat = vec![vec![0.0, 1.0, 5.0, 20.0], vec![1.0, 2.0, 5.0, 20.0]];
        let matrix = BreakpointMatrix::from_flat_rows(&flat).unwrap();
        assert_eq!(matrix.level_count(), 2);
        assert_eq!(matrix.flat_rows(), flat);
    }

    #[test]
    fn codes_must_align_with_rows() {
        let matrix = BreakpointMatrix::new(vec![row("1", &[(0.0, 1.0)])]).unwrap();
        let err = matrix.with_codes(vec![]).unwrap_err();
        assert_eq!(err, MatrixError::CodeCountMismatch { expected: 1, actual: 0 });

        let coded = matrix.with_codes(vec!["7".to_string()]).unwrap();
        assert_eq!(coded.rows()[0].code.as_deref(), Some("7"));
    }

    #[test]
    fn row_slice_clamps() {
        let matrix = BreakpointMatrix::new(vec![
            row("1", &[(0.0, 1.0)]),
            row("2", &[(1.0, 2.0)]),
        ])
        .unwrap();
        assert_eq!(matrix.row_slice(1..=5).len(), 1);
        assert!(matrix.row_slice(4..=6).is_empty());
    }

    #[test]
    fn deserialize_validates() {
        let json = r#"[{"code":"1","bounds":[{"low":"-inf","high":3}]}]"#;
        let matrix: BreakpointMatrix = serde_json::from_str(json).unwrap();
        assert_eq!(matrix.bounds(0, 0).unwrap().low, f64::NEG_INFINITY);

        let bad = r#"[{"code":"1","bounds":[{"low":3,"high":1}]}]"#;
        assert!(serde_json::from_str::<BreakpointMatrix>(bad).is_err());
    }
}
