use crate::config::SplitContext;
use crate::error::{Result, ServiceError, WorkflowError};
use crate::service::ComputationService;
use std::ops::RangeInclusive;
use wtsplit_matrix::{affected_rows, apply_splits, BreakpointMatrix};
use wtsplit_protocol::CodesRequest;
use wtsplit_session::CommitPlan;

/// A committed split with codes for every row
#[derive(Debug, Clone, PartialEq)]
pub struct CommitOutcome {
    pub matrix: BreakpointMatrix,
    /// The split row and the rows inserted after it
    pub affected: RangeInclusive<usize>,
}

/// A split whose affected rows still lack codes
#[derive(Debug, Clone, PartialEq)]
pub struct PendingCommit {
    pub matrix: BreakpointMatrix,
    pub affected: RangeInclusive<usize>,
}

/// Apply `plan` to `matrix` without touching the service.
///
/// Codes of the affected rows are dropped; they no longer describe the
/// narrowed thresholds.
pub fn split_locally(matrix: &BreakpointMatrix, plan: &CommitPlan) -> Result<PendingCommit> {
    let (split, inserted) = apply_splits(matrix, plan.node.row_index, plan.level, &plan.values)?;
    let affected = affected_rows(plan.node.row_index, inserted);
    Ok(PendingCommit {
        matrix: split.without_codes(affected.clone()),
        affected,
    })
}

/// Turns commit plans into new matrices with derived codes
pub struct SplitCommitter<'a, S> {
    service: &'a S,
    context: &'a SplitContext,
}

impl<'a, S: ComputationService> SplitCommitter<'a, S> {
    pub fn new(service: &'a S, context: &'a SplitContext) -> Self {
        Self { service, context }
    }

    pub async fn commit(&self, matrix: &BreakpointMatrix, plan: &CommitPlan) -> Result<CommitOutcome> {
        let pending = split_locally(matrix, plan)?;
        log::info!(
            "Split row {} on {} value(s), {} rows now",
            plan.node.row_index,
            plan.values.len(),
            pending.matrix.len()
        );
        self.derive_codes(pending).await
    }

    /// Ask the service for codes of the whole matrix and merge them in.
    ///
    /// On failure the pending split comes back inside the error so it can be
    /// retried.
    pub async fn derive_codes(&self, pending: PendingCommit) -> Result<CommitOutcome> {
        match self.fetch_codes(&pending.matrix).await {
            Ok(matrix) => Ok(CommitOutcome {
                matrix,
                affected: pending.affected,
            }),
            Err(source) => {
                log::warn!("Code derivation failed: {source}");
                Err(WorkflowError::CodeDerivation {
                    pending: Box::new(pending),
                    source,
                })
            }
        }
    }

    async fn fetch_codes(
        &self,
        matrix: &BreakpointMatrix,
    ) -> std::result::Result<BreakpointMatrix, ServiceError> {
        let request = CodesRequest::new(
            self.context.labels.clone(),
            self.context.field_ranges.clone(),
            matrix,
        );
        let response = self.service.derive_codes(&request).await?;
        let codes = response.row_codes().map_err(ServiceError::Malformed)?;
        matrix
            .with_codes(codes)
            .map_err(|err| ServiceError::malformed(err.to_string()))
    }
}
