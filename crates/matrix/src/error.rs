use thiserror::Error;

/// Result type for matrix operations
pub type Result<T> = std::result::Result<T, MatrixError>;

/// Errors raised by the matrix model
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MatrixError {
    /// Split value is not strictly inside the targeted threshold pair
    #[error("Invalid split value {value}: must lie strictly between {low} and {high}")]
    InvalidSplitValue { value: f64, low: f64, high: f64 },

    /// Row index outside the matrix
    #[error("Row {row} out of range (matrix has {rows} rows)")]
    RowOutOfRange { row: usize, rows: usize },

    /// Level index outside the row
    #[error("Level {level} out of range (rows have {levels} levels)")]
    LevelOutOfRange { level: usize, levels: usize },

    /// A threshold pair violates `low < high`
    #[error("Invalid bounds at row {row}, level {level}: low={low}, high={high}")]
    InvalidBounds {
        row: usize,
        level: usize,
        low: f64,
        high: f64,
    },

    /// Rows disagree on the number of levels
    #[error("Row {row} has {actual} levels, expected {expected}")]
    LevelCountMismatch {
        row: usize,
        expected: usize,
        actual: usize,
    },

    /// Flat threshold row that cannot be paired up
    #[error("Row {row} has {len} thresholds, expected an even count")]
    OddThresholdCount { row: usize, len: usize },

    /// Derived codes do not line up with the matrix rows
    #[error("Expected {expected} codes, got {actual}")]
    CodeCountMismatch { expected: usize, actual: usize },
}

/// Rejected user input
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Not a number: '{0}'")]
    NotANumber(String),

    #[error("Duplicate breakpoint: {0}")]
    Duplicate(String),

    #[error("No breakpoints given")]
    Empty,

    #[error("Expected a positive whole number, got '{0}'")]
    InvalidCount(String),
}
