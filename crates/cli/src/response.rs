use serde::Serialize;
use serde_json::Value;
use wtsplit_matrix::threshold_serde;
use wtsplit_matrix::{MatrixError, ValidationError};
use wtsplit_protocol::ErrorEnvelope;
use wtsplit_session::SessionError;
use wtsplit_workflow::{ServiceError, WorkflowError};

#[derive(Debug, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CommandStatus {
    Ok,
    Error,
}

/// Envelope printed on stdout for every command
#[derive(Debug, Serialize, Clone)]
pub struct CommandResponse {
    pub status: CommandStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorEnvelope>,
    #[serde(default)]
    pub data: Value,
}

impl CommandResponse {
    pub fn ok(data: Value) -> Self {
        Self {
            status: CommandStatus::Ok,
            message: None,
            error: None,
            data,
        }
    }

    pub fn from_error(err: &anyhow::Error) -> Self {
        let message = format!("{err:#}");
        let mut envelope = ErrorEnvelope::new(classify_error(err), message.clone());
        if let Some(hint) = hint_for(envelope.code.as_str()) {
            envelope = envelope.with_hint(hint);
        }
        if let Some(details) = details_for(err) {
            envelope = envelope.with_details(details);
        }
        Self {
            status: CommandStatus::Error,
            message: Some(message),
            error: Some(envelope),
            data: Value::Null,
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self.status, CommandStatus::Error)
    }
}

/// Stable error code for the first typed error in the chain
pub fn classify_error(err: &anyhow::Error) -> &'static str {
    for cause in err.chain() {
        if let Some(err) = cause.downcast_ref::<WorkflowError>() {
            return err.code();
        }
        if let Some(err) = cause.downcast_ref::<MatrixError>() {
            return WorkflowError::from(err.clone()).code();
        }
        if let Some(err) = cause.downcast_ref::<SessionError>() {
            return WorkflowError::from(err.clone()).code();
        }
        if cause.downcast_ref::<ValidationError>().is_some() {
            return "validation_error";
        }
        if cause.downcast_ref::<ServiceError>().is_some() {
            return "remote_failure";
        }
        if cause.downcast_ref::<serde_json::Error>().is_some() {
            return "invalid_input";
        }
        if cause.downcast_ref::<std::io::Error>().is_some() {
            return "io_error";
        }
    }
    "internal"
}

#[derive(Serialize)]
struct SplitValueDetails {
    #[serde(with = "threshold_serde")]
    value: f64,
    #[serde(with = "threshold_serde")]
    low: f64,
    #[serde(with = "threshold_serde")]
    high: f64,
}

/// Structured payload for errors a caller can act on
fn details_for(err: &anyhow::Error) -> Option<Value> {
    err.chain().find_map(|cause| {
        let matrix = match cause.downcast_ref::<WorkflowError>() {
            Some(WorkflowError::Matrix(inner)) => Some(inner),
            _ => cause.downcast_ref::<MatrixError>(),
        }?;
        match *matrix {
            MatrixError::InvalidSplitValue { value, low, high } => {
                serde_json::to_value(SplitValueDetails { value, low, high }).ok()
            }
            _ => None,
        }
    })
}

fn hint_for(code: &str) -> Option<&'static str> {
    match code {
        "invalid_split_value" => {
            Some("Split values must lie strictly inside the row's threshold pair for that level.")
        }
        "remote_failure" | "code_derivation_failed" => {
            Some("Check that the computation service is reachable (--service-url / WTSPLIT_SERVICE_URL).")
        }
        "invalid_config" => Some("Fix the job file passed with --context."),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Context;

    #[test]
    fn classifies_through_context() {
        let err = Err::<(), _>(MatrixError::InvalidSplitValue {
            value: 12.0,
            low: 0.0,
            high: 10.0,
        })
        .context("Split failed")
        .unwrap_err();
        let response = CommandResponse::from_error(&err);
        let envelope = response.error.unwrap();
        assert_eq!(envelope.code, "invalid_split_value");
        assert!(envelope.hint.is_some());
        assert!(response.message.unwrap().starts_with("Split failed: "));
        assert_eq!(
            envelope.details,
            Some(serde_json::json!({"value": 12.0, "low": 0.0, "high": 10.0}))
        );
    }

    #[test]
    fn split_value_details_survive_workflow_wrapping() {
        let err = anyhow::Error::new(WorkflowError::from(MatrixError::InvalidSplitValue {
            value: -1.0,
            low: 0.0,
            high: f64::INFINITY,
        }));
        let envelope = CommandResponse::from_error(&err).error.unwrap();
        assert_eq!(envelope.code, "invalid_split_value");
        assert_eq!(
            envelope.details,
            Some(serde_json::json!({"value": -1.0, "low": 0.0, "high": "inf"}))
        );
    }

    #[test]
    fn other_errors_carry_no_details() {
        let err = anyhow::Error::new(MatrixError::RowOutOfRange { row: 4, rows: 2 });
        assert_eq!(CommandResponse::from_error(&err).error.unwrap().details, None);
    }

    #[test]
    fn unknown_errors_are_internal() {
        let err = anyhow::anyhow!("boom");
        assert_eq!(classify_error(&err), "internal");
        assert!(CommandResponse::from_error(&err).is_error());
    }
}
