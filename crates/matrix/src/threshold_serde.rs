//! Serde adapters for threshold values.
//!
//! JSON has no infinities, and the computation service speaks pandas, so
//! thresholds travel as numbers when finite and as `"-inf"` / `"inf"` when
//! not. Numeric strings are accepted on input as well.
//!
//! ```rust
//! #[derive(serde::Serialize, serde::Deserialize)]
//! struct Bound {
//!     #[serde(with = "wtsplit_matrix::threshold_serde")]
//!     value: f64,
//! }
//!
//! let json = serde_json::to_string(&Bound { value: f64::NEG_INFINITY }).unwrap();
//! assert_eq!(json, r#"{"value":"-inf"}"#);
//! ```

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serializer};

#[derive(Deserialize)]
#[serde(untagged)]
enum RawThreshold {
    Number(f64),
    Text(String),
}

/// Parse the textual form of a threshold
pub fn parse_threshold(text: &str) -> Option<f64> {
    let value = match text.trim() {
        "inf" | "+inf" | "Infinity" | "+Infinity" => f64::INFINITY,
        "-inf" | "-Infinity" => f64::NEG_INFINITY,
        other => other.parse::<f64>().ok()?,
    };
    (!value.is_nan()).then_some(value)
}

/// Textual form used on the wire for infinite thresholds
pub fn format_threshold(value: f64) -> String {
    if value == f64::INFINITY {
        "inf".to_string()
    } else if value == f64::NEG_INFINITY {
        "-inf".to_string()
    } else {
        value.to_string()
    }
}

pub fn serialize<S>(value: &f64, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    if value.is_finite() {
        serializer.serialize_f64(*value)
    } else {
        serializer.serialize_str(&format_threshold(*value))
    }
}

pub fn deserialize<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    match RawThreshold::deserialize(deserializer)? {
        RawThreshold::Number(value) => Ok(value),
        RawThreshold::Text(text) => parse_threshold(&text)
            .ok_or_else(|| D::Error::custom(format!("invalid threshold '{text}'"))),
    }
}

/// Same encoding for optional thresholds (`None` ↔ `null`)
pub mod option {
    use super::RawThreshold;
    use serde::de::Error as _;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(value: &Option<f64>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(value) => super::serialize(value, serializer),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Option::<RawThreshold>::deserialize(deserializer)? {
            None => Ok(None),
            Some(RawThreshold::Number(value)) => Ok(Some(value)),
            Some(RawThreshold::Text(text)) => super::parse_threshold(&text)
                .map(Some)
                .ok_or_else(|| D::Error::custom(format!("invalid threshold '{text}'"))),
        }
    }
}

/// Same encoding for sequences of thresholds
pub mod vec {
    use super::RawThreshold;
    use serde::de::Error as _;
    use serde::ser::SerializeSeq;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(values: &[f64], serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut seq = serializer.serialize_seq(Some(values.len()))?;
        for value in values {
            if value.is_finite() {
                seq.serialize_element(value)?;
            } else {
                seq.serialize_element(&super::format_threshold(*value))?;
            }
        }
        seq.end()
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Vec<f64>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Vec::<RawThreshold>::deserialize(deserializer)?
            .into_iter()
            .map(|raw| match raw {
                RawThreshold::Number(value) => Ok(value),
                RawThreshold::Text(text) => super::parse_threshold(&text)
                    .ok_or_else(|| D::Error::custom(format!("invalid threshold '{text}'"))),
            })
            .collect()
    }
}
