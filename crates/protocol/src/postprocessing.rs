//! Requests and responses of the `/postprocessing/*` endpoints.
//!
//! Field names follow the service (camelCase, `thrWT`, `thrGridOut`);
//! thresholds use [`wtsplit_matrix::threshold_serde`] so infinities survive
//! the JSON hop.

use serde::ser::SerializeSeq;
use serde::{Deserialize, Serialize, Serializer};
use std::collections::BTreeMap;
use wtsplit_matrix::threshold_serde;
use wtsplit_matrix::{BreakpointMatrix, MatrixRow};

pub const SUGGEST_PATH: &str = "/postprocessing/breakpoints/suggest";
pub const CODES_PATH: &str = "/postprocessing/get-wt-codes";
pub const EXPORT_PATH: &str = "/postprocessing/save-wt-histograms";

/// Thresholds of one row in `[l0_low, l0_high, l1_low, ...]` layout
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FlatRow(#[serde(with = "threshold_serde::vec")] pub Vec<f64>);

impl From<&MatrixRow> for FlatRow {
    fn from(row: &MatrixRow) -> Self {
        Self(row.flat_thresholds())
    }
}

/// Valid range of a predictor, `[low, high]` on the wire
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "FlatRow", into = "FlatRow")]
pub struct FieldRange {
    pub low: f64,
    pub high: f64,
}

impl FieldRange {
    pub const UNBOUNDED: Self = Self {
        low: f64::NEG_INFINITY,
        high: f64::INFINITY,
    };
}

impl TryFrom<FlatRow> for FieldRange {
    type Error = String;

    fn try_from(row: FlatRow) -> Result<Self, Self::Error> {
        match row.0.as_slice() {
            [low, high] => Ok(Self {
                low: *low,
                high: *high,
            }),
            other => Err(format!("field range needs 2 values, got {}", other.len())),
        }
    }
}

impl From<FieldRange> for FlatRow {
    fn from(range: FieldRange) -> Self {
        Self(vec![range.low, range.high])
    }
}

/// Histogram rendering options forwarded to the export endpoint
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlotOptions {
    #[serde(default, alias = "y_lim", skip_serializing_if = "Option::is_none")]
    pub y_lim: Option<f64>,
    #[serde(default, alias = "num_bins", skip_serializing_if = "Option::is_none")]
    pub num_bins: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bins: Option<Vec<f64>>,
}

/// One K-S run over the historical data for a single row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SuggestRequest {
    pub labels: Vec<String>,
    #[serde(rename = "thrWT", with = "threshold_serde::vec")]
    pub thresholds: Vec<f64>,
    pub path: String,
    pub predictor: String,
    pub num_breakpoints: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cheaper: Option<bool>,
    #[serde(
        default,
        with = "threshold_serde::option",
        skip_serializing_if = "Option::is_none"
    )]
    pub lower_bound: Option<f64>,
    #[serde(
        default,
        with = "threshold_serde::option",
        skip_serializing_if = "Option::is_none"
    )]
    pub upper_bound: Option<f64>,
}

/// A suggested breakpoint with its test statistics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateRecord {
    #[serde(with = "threshold_serde")]
    pub breakpoint: f64,
    /// Natural log of the p-value
    #[serde(rename = "pValue", with = "threshold_serde")]
    pub p_value: f64,
    #[serde(rename = "dStatValue", with = "threshold_serde")]
    pub d_stat_value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SuggestResponse {
    pub records: Vec<CandidateRecord>,
    /// Base64 JPEG of the diagnostic plot
    #[serde(default)]
    pub figure: Option<String>,
}

/// Derive weather-type codes for a whole matrix
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CodesRequest {
    pub labels: Vec<String>,
    pub field_ranges: BTreeMap<String, FieldRange>,
    pub matrix: Vec<FlatRow>,
}

impl CodesRequest {
    pub fn new(
        labels: Vec<String>,
        field_ranges: BTreeMap<String, FieldRange>,
        matrix: &BreakpointMatrix,
    ) -> Self {
        Self {
            labels,
            field_ranges,
            matrix: matrix.rows().iter().map(FlatRow::from).collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CodesResponse {
    /// One entry per matrix row, aligned by position
    pub codes: Vec<Vec<serde_json::Value>>,
}

impl CodesResponse {
    /// Flatten each entry into the row's code string.
    ///
    /// The service returns each code as a short sequence (strings or
    /// integers); its parts are concatenated in order.
    pub fn row_codes(&self) -> Result<Vec<String>, String> {
        self.codes
            .iter()
            .enumerate()
            .map(|(idx, parts)| {
                if parts.is_empty() {
                    return Err(format!("row {idx} has no code"));
                }
                parts
                    .iter()
                    .map(|part| match part {
                        serde_json::Value::String(text) => Ok(text.clone()),
                        serde_json::Value::Number(number) => Ok(number.to_string()),
                        other => Err(format!("row {idx} has a non-scalar code part: {other}")),
                    })
                    .collect::<Result<String, String>>()
            })
            .collect()
    }
}

/// A coded row in the export layout: `[code, l0_low, l0_high, ...]`
#[derive(Debug, Clone, PartialEq)]
pub struct CodedRow {
    pub code: String,
    pub thresholds: Vec<f64>,
}

impl CodedRow {
    /// Rows without a code cannot be exported
    pub fn from_row(row: &MatrixRow) -> Option<Self> {
        Some(Self {
            code: row.code.clone()?,
            thresholds: row.flat_thresholds(),
        })
    }
}

impl Serialize for CodedRow {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut seq = serializer.serialize_seq(Some(self.thresholds.len() + 1))?;
        seq.serialize_element(&self.code)?;
        for value in &self.thresholds {
            if value.is_finite() {
                seq.serialize_element(value)?;
            } else {
                seq.serialize_element(&threshold_serde::format_threshold(*value))?;
            }
        }
        seq.end()
    }
}

/// Save per-weather-type histograms of the affected rows to disk
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportRequest {
    pub labels: Vec<String>,
    pub thr_grid_out: Vec<CodedRow>,
    pub path: String,
    #[serde(flatten)]
    pub plot: PlotOptions,
    pub destination_dir: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cheaper: Option<bool>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn suggest_request_wire_names() {
        let request = SuggestRequest {
            labels: vec!["CPR_thrL".into(), "CPR_thrH".into()],
            thresholds: vec![f64::NEG_INFINITY, 0.25],
            path: "/data/pdt".into(),
            predictor: "CPR".into(),
            num_breakpoints: 3,
            cheaper: None,
            lower_bound: Some(f64::NEG_INFINITY),
            upper_bound: Some(0.1),
        };

        let value = serde_json::to_value(&request).unwrap();

        assert_eq!(
            value,
            json!({
                "labels": ["CPR_thrL", "CPR_thrH"],
                "thrWT": ["-inf", 0.25],
                "path": "/data/pdt",
                "predictor": "CPR",
                "numBreakpoints": 3,
                "lowerBound": "-inf",
                "upperBound": 0.1
            })
        );
    }

    #[test]
    fn fresh_search_omits_bounds() {
        let request = SuggestRequest {
            labels: vec![],
            thresholds: vec![0.0, 1.0],
            path: String::new(),
            predictor: "TP".into(),
            num_breakpoints: 1,
            cheaper: Some(true),
            lower_bound: None,
            upper_bound: None,
        };
        let value = serde_json::to_value(&request).unwrap();
        assert!(value.get("lowerBound").is_none());
        assert!(value.get("upperBound").is_none());
        assert_eq!(value["cheaper"], json!(true));
    }

    #[test]
    fn suggest_response_accepts_string_breakpoints() {
        let raw = r#"{
            "records": [
                {"breakpoint": "0.5", "pValue": -12.3, "dStatValue": 0.41},
                {"breakpoint": 1.25, "pValue": "-inf", "dStatValue": 0.12}
            ],
            "figure": "aGVsbG8="
        }"#;
        let response: SuggestResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(response.records[0].breakpoint, 0.5);
        assert_eq!(response.records[1].p_value, f64::NEG_INFINITY);
        assert_eq!(response.figure.as_deref(), Some("aGVsbG8="));
    }

    #[test]
    fn codes_are_flattened_per_row() {
        let response: CodesResponse =
            serde_json::from_str(r#"{"codes": [["11"], [1, 2], ["3", 0]]}"#).unwrap();
        assert_eq!(response.row_codes().unwrap(), vec!["11", "12", "30"]);

        let broken: CodesResponse = serde_json::from_str(r#"{"codes": [[]]}"#).unwrap();
        assert!(broken.row_codes().is_err());
    }

    #[test]
    fn field_ranges_are_pairs() {
        let ranges: BTreeMap<String, FieldRange> =
            serde_json::from_str(r#"{"CPR": ["-inf", "inf"], "TP": [0, 50]}"#).unwrap();
        assert_eq!(ranges["CPR"], FieldRange::UNBOUNDED);
        assert_eq!(ranges["TP"].high, 50.0);
        assert!(serde_json::from_str::<FieldRange>("[1]").is_err());
    }

    #[test]
    fn export_rows_lead_with_code() {
        let request = ExportRequest {
            labels: vec![],
            thr_grid_out: vec![CodedRow {
                code: "101".into(),
                thresholds: vec![0.0, f64::INFINITY],
            }],
            path: "/data".into(),
            plot: PlotOptions {
                y_lim: Some(40.0),
                num_bins: Some(20),
                bins: None,
            },
            destination_dir: "/tmp/out".into(),
            cheaper: None,
        };
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["thrGridOut"], json!([["101", 0.0, "inf"]]));
        assert_eq!(value["yLim"], json!(40.0));
        assert_eq!(value["numBins"], json!(20));
        assert_eq!(value["destinationDir"], json!("/tmp/out"));
    }
}
