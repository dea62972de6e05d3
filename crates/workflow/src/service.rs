use crate::error::ServiceError;
use async_trait::async_trait;
use std::path::PathBuf;
use wtsplit_protocol::{CodesRequest, CodesResponse, ExportRequest, SuggestRequest, SuggestResponse};

/// Remote computation service backing the suggestion workflow
#[async_trait]
pub trait ComputationService: Send + Sync {
    /// Run the K-S test for one row
    async fn suggest_breakpoints(
        &self,
        request: &SuggestRequest,
    ) -> Result<SuggestResponse, ServiceError>;

    /// Derive a code for every row of a matrix
    async fn derive_codes(&self, request: &CodesRequest) -> Result<CodesResponse, ServiceError>;

    /// Write histograms of the given rows; the acknowledgement is opaque
    async fn export_diagnostics(
        &self,
        request: &ExportRequest,
    ) -> Result<serde_json::Value, ServiceError>;
}

/// Host-side destination chooser
pub trait DirectoryPicker {
    /// `None` when the user backs out
    fn select_directory(&self) -> Option<PathBuf>;
}

/// Picker that always answers with the same directory
#[derive(Debug, Clone, Default)]
pub struct FixedDirectory(pub Option<PathBuf>);

impl DirectoryPicker for FixedDirectory {
    fn select_directory(&self) -> Option<PathBuf> {
        self.0.clone()
    }
}
