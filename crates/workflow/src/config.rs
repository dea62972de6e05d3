use crate::error::{Result, WorkflowError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use wtsplit_matrix::BreakpointMatrix;
use wtsplit_protocol::{FieldRange, PlotOptions};

pub const DEFAULT_SERVICE_URL: &str = "http://127.0.0.1:5000";
pub const SERVICE_URL_ENV: &str = "WTSPLIT_SERVICE_URL";

/// Where the computation service lives
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    pub base_url: String,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_SERVICE_URL.to_string(),
        }
    }
}

impl ServiceConfig {
    /// Defaults, overridden by `WTSPLIT_SERVICE_URL` when set and non-empty
    pub fn from_env() -> Self {
        match std::env::var(SERVICE_URL_ENV) {
            Ok(url) if !url.trim().is_empty() => Self::with_base_url(url.trim()),
            _ => Self::default(),
        }
    }

    pub fn with_base_url(url: impl Into<String>) -> Self {
        Self {
            base_url: url.into(),
        }
    }

    pub fn validate(&self) -> Result<()> {
        let url = self.base_url.trim();
        if url.is_empty() {
            return Err(WorkflowError::invalid_config("base_url must not be empty"));
        }
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(WorkflowError::invalid_config(format!(
                "base_url must start with http:// or https:// (got '{url}')"
            )));
        }
        Ok(())
    }
}

/// Everything about the forecast job a split needs besides the matrix.
///
/// Usually read from a TOML job file:
///
/// ```toml
/// labels = ["CPR_thrL", "CPR_thrH", "TP_thrL", "TP_thrH"]
/// fields = ["CPR", "TP"]
/// path = "/data/pdt"
/// cheaper = true
///
/// [field_ranges]
/// CPR = [0.0, 1.0]
/// TP = [0.0, inf]
///
/// [plot]
/// y_lim = 40.0
/// num_bins = 20
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SplitContext {
    /// Column labels of the threshold grid
    pub labels: Vec<String>,
    /// Predictor name per level
    pub fields: Vec<String>,
    #[serde(default)]
    pub field_ranges: BTreeMap<String, FieldRange>,
    /// Historical observation/prediction data on the service host
    pub path: String,
    /// Ask the service for the cheaper (approximate) computation
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cheaper: Option<bool>,
    #[serde(default)]
    pub plot: PlotOptions,
}

impl SplitContext {
    pub fn from_toml_str(raw: &str) -> Result<Self> {
        let context: Self = toml::from_str(raw)?;
        context.validate()?;
        Ok(context)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        log::debug!("Loading split context from {}", path.display());
        Self::from_toml_str(&raw)
    }

    pub fn validate(&self) -> Result<()> {
        if self.fields.is_empty() {
            return Err(WorkflowError::invalid_config("fields must not be empty"));
        }
        if self.path.trim().is_empty() {
            return Err(WorkflowError::invalid_config("path must not be empty"));
        }
        for (field, range) in &self.field_ranges {
            if range.low.is_nan() || range.high.is_nan() || range.low >= range.high {
                return Err(WorkflowError::invalid_config(format!(
                    "field range of {field} must satisfy low < high"
                )));
            }
        }
        if self.plot.num_bins == Some(0) {
            return Err(WorkflowError::invalid_config("plot.num_bins must be > 0"));
        }
        if let Some(bins) = &self.plot.bins {
            if bins.windows(2).any(|pair| pair[0] >= pair[1]) {
                return Err(WorkflowError::invalid_config(
                    "plot.bins must be strictly ascending",
                ));
            }
        }
        Ok(())
    }

    /// Matrix rows must have one level per field
    pub fn check_matrix(&self, matrix: &BreakpointMatrix) -> Result<()> {
        if !matrix.is_empty() && matrix.level_count() != self.fields.len() {
            return Err(WorkflowError::invalid_config(format!(
                "matrix has {} levels but {} fields are configured",
                matrix.level_count(),
                self.fields.len()
            )));
        }
        Ok(())
    }

    /// Predictor name of `level`
    pub fn field(&self, level: usize) -> Option<&str> {
        self.fields.get(level).map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const JOB: &str = r#"
labels = ["CPR_thrL", "CPR_thrH", "TP_thrL", "TP_thrH"]
fields = ["CPR", "TP"]
path = "/data/pdt"
cheaper = true

[field_ranges]
CPR = [0.0, 1.0]
TP = [0.0, inf]

[plot]
y_lim = 40.0
num_bins = 20
"#;

    #[test]
    fn default_service_config_valid() {
        let config = ServiceConfig::default();
        assert_eq!(config.base_url, DEFAULT_SERVICE_URL);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn service_url_needs_scheme() {
        assert!(ServiceConfig::with_base_url("localhost:5000")
            .validate()
            .is_err());
        assert!(ServiceConfig::with_base_url("").validate().is_err());
        assert!(ServiceConfig::with_base_url("https://pp.example.org")
            .validate()
            .is_ok());
    }

    #[test]
    fn parses_job_file() {
        let context = SplitContext::from_toml_str(JOB).unwrap();
        assert_eq!(context.fields, vec!["CPR", "TP"]);
        assert_eq!(context.cheaper, Some(true));
        assert_eq!(context.plot.num_bins, Some(20));
        assert_eq!(context.field_ranges["TP"].high, f64::INFINITY);
        assert_eq!(context.field(1), Some("TP"));
        assert_eq!(context.field(2), None);
    }

    #[test]
    fn rejects_inverted_field_range() {
        let raw = JOB.replace("CPR = [0.0, 1.0]", "CPR = [1.0, 0.0]");
        let err = SplitContext::from_toml_str(&raw).unwrap_err();
        assert_eq!(err.code(), "invalid_config");
    }

    #[test]
    fn load_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("job.toml");
        std::fs::write(&path, JOB).unwrap();
        assert_eq!(SplitContext::load(&path).unwrap().path, "/data/pdt");
        assert!(SplitContext::load(&dir.path().join("missing.toml")).is_err());
    }

    #[test]
    fn matrix_levels_must_match_fields() {
        let context = SplitContext::from_toml_str(JOB).unwrap();
        let matrix = BreakpointMatrix::from_flat_rows(&[vec![0.0, 1.0]]).unwrap();
        assert!(context.check_matrix(&matrix).is_err());
        let matrix = BreakpointMatrix::from_flat_rows(&[vec![0.0, 1.0, 0.0, 5.0]]).unwrap();
        assert!(context.check_matrix(&matrix).is_ok());
    }
}
