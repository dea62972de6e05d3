use serde::{Deserialize, Serialize};

/// The row being split, supplied by the caller for the lifetime of a session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeMeta {
    /// Position of the row in the breakpoint matrix
    pub row_index: usize,
    /// Shallowest level the row may be split on
    pub level: usize,
    /// Weather-type code used in titles
    pub code: String,
}

impl NodeMeta {
    pub fn new(row_index: usize, level: usize, code: impl Into<String>) -> Self {
        Self {
            row_index,
            level,
            code: code.into(),
        }
    }
}

/// One breakpoint proposed by the K-S test
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CandidateBreakpoint {
    pub value: f64,
    /// Natural log of the test p-value
    pub log_p_value: f64,
    pub d_stat: f64,
}

impl CandidateBreakpoint {
    #[must_use]
    pub const fn new(value: f64, log_p_value: f64, d_stat: f64) -> Self {
        Self {
            value,
            log_p_value,
            d_stat,
        }
    }
}

/// What a successful suggestion request brings back
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchOutcome {
    pub candidates: Vec<CandidateBreakpoint>,
    /// Base64 diagnostic plot
    pub diagnostic_image: Option<String>,
}

/// Identifies the session generation a request was issued from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RequestTag(pub(crate) u64);

impl RequestTag {
    #[must_use]
    pub const fn generation(self) -> u64 {
        self.0
    }
}
