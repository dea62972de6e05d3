use crate::committer::{split_locally, CommitOutcome, PendingCommit, SplitCommitter};
use crate::config::SplitContext;
use crate::error::{Result, ServiceError, WorkflowError};
use crate::service::{ComputationService, DirectoryPicker};
use wtsplit_matrix::{level_options, BreakpointMatrix, LevelOption, ListStatus, MatrixError};
use wtsplit_protocol::{CodedRow, ExportRequest, SuggestRequest, SuggestResponse};
use wtsplit_session::{
    BoundDirection, CandidateBreakpoint, CommitPlan, Effect, ModeKind, NodeMeta, RequestTag,
    SearchOutcome, SearchRequest, SessionError, SessionEvent, SuggestionSession,
};

/// An issued suggestion request awaiting its response
#[derive(Debug, Clone, PartialEq)]
pub struct SearchTicket {
    tag: RequestTag,
    request: SuggestRequest,
}

impl SearchTicket {
    pub fn tag(&self) -> RequestTag {
        self.tag
    }

    /// Body to send to the suggest endpoint
    pub fn request(&self) -> &SuggestRequest {
        &self.request
    }
}

/// Result of a diagnostics export
#[derive(Debug, Clone, PartialEq)]
pub enum ExportOutcome {
    /// No destination was picked
    Aborted,
    /// Service acknowledgement
    Saved(serde_json::Value),
}

/// Drives one suggestion session against a computation service.
///
/// The workflow owns the session value; the matrix stays with the caller and
/// is passed in wherever a row's thresholds are needed.
pub struct Workflow<S, P> {
    service: S,
    picker: P,
    context: SplitContext,
    session: SuggestionSession,
}

impl<S: ComputationService, P: DirectoryPicker> Workflow<S, P> {
    pub fn new(service: S, picker: P, context: SplitContext) -> Self {
        Self {
            service,
            picker,
            context,
            session: SuggestionSession::default(),
        }
    }

    pub fn session(&self) -> &SuggestionSession {
        &self.session
    }

    pub fn context(&self) -> &SplitContext {
        &self.context
    }

    pub fn service(&self) -> &S {
        &self.service
    }

    fn apply(&mut self, event: SessionEvent) -> Result<Effect> {
        let step = self.session.reduce(event)?;
        self.session = step.session;
        Ok(step.effect)
    }

    /// Start splitting `node`, dropping whatever session was open
    pub fn open(&mut self, node: NodeMeta) -> Result<()> {
        let level_count = self.context.fields.len();
        self.apply(SessionEvent::Open { node, level_count })?;
        Ok(())
    }

    pub fn cancel(&mut self) {
        // cancelling never fails
        let _ = self.apply(SessionEvent::Cancel);
    }

    pub fn select_mode(&mut self, kind: ModeKind) -> Result<()> {
        self.apply(SessionEvent::SelectMode(kind)).map(drop)
    }

    pub fn select_level(&mut self, level: usize) -> Result<()> {
        self.apply(SessionEvent::SelectLevel(level)).map(drop)
    }

    pub fn set_manual_values(&mut self, raw: &str) -> Result<()> {
        self.apply(SessionEvent::SetManualValues(raw.to_string()))
            .map(drop)
    }

    pub fn set_desired_count(&mut self, count: &str) -> Result<()> {
        self.apply(SessionEvent::SetDesiredCount(count.to_string()))
            .map(drop)
    }

    pub fn set_bounded_count(&mut self, count: &str) -> Result<()> {
        self.apply(SessionEvent::SetBoundedCount(count.to_string()))
            .map(drop)
    }

    pub fn select_candidate(&mut self, index: usize) -> Result<()> {
        self.apply(SessionEvent::SelectCandidate(index)).map(drop)
    }

    pub fn select_confirmed(&mut self, index: usize) -> Result<()> {
        self.apply(SessionEvent::SelectConfirmed(index)).map(drop)
    }

    pub fn set_bound_direction(&mut self, direction: BoundDirection) -> Result<()> {
        self.apply(SessionEvent::SetBoundDirection(direction))
            .map(drop)
    }

    pub fn edit_confirmed(&mut self, index: usize, value: f64) -> Result<()> {
        self.apply(SessionEvent::EditConfirmed { index, value })
            .map(drop)
    }

    pub fn remove_confirmed(&mut self, index: usize) -> Result<()> {
        self.apply(SessionEvent::RemoveConfirmed(index)).map(drop)
    }

    /// Issue a K-S run over the whole row; `None` while one is in flight
    pub fn begin_search(&mut self, matrix: &BreakpointMatrix) -> Result<Option<SearchTicket>> {
        self.begin(SessionEvent::Submit, matrix)
    }

    /// Issue a K-S run around the selected confirmed breakpoint
    pub fn begin_bounded_search(
        &mut self,
        matrix: &BreakpointMatrix,
    ) -> Result<Option<SearchTicket>> {
        self.begin(SessionEvent::SubmitBounded, matrix)
    }

    fn begin(&mut self, event: SessionEvent, matrix: &BreakpointMatrix) -> Result<Option<SearchTicket>> {
        if self.session.is_pending() {
            log::debug!("Suggestion request already pending");
            return Ok(None);
        }
        let node = self.session.node().ok_or(SessionError::NotOpen)?;
        let row = matrix.row(node.row_index).ok_or(MatrixError::RowOutOfRange {
            row: node.row_index,
            rows: matrix.len(),
        })?;
        let thresholds = row.flat_thresholds();
        let level = self.session.level().unwrap_or(node.level);
        let predictor = self
            .context
            .field(level)
            .ok_or(MatrixError::LevelOutOfRange {
                level,
                levels: self.context.fields.len(),
            })?
            .to_string();

        let Effect::RunSearch(search) = self.apply(event)? else {
            return Ok(None);
        };
        Ok(Some(self.ticket(search, thresholds, predictor)))
    }

    fn ticket(&self, search: SearchRequest, thresholds: Vec<f64>, predictor: String) -> SearchTicket {
        let (lower_bound, upper_bound) = match search.bounds {
            Some(bounds) => (Some(bounds.lower), Some(bounds.upper)),
            None => (None, None),
        };
        SearchTicket {
            tag: search.tag,
            request: SuggestRequest {
                labels: self.context.labels.clone(),
                thresholds,
                path: self.context.path.clone(),
                predictor,
                num_breakpoints: search.desired_count,
                cheaper: self.context.cheaper,
                lower_bound,
                upper_bound,
            },
        }
    }

    /// Feed a suggestion response back into the session.
    ///
    /// Responses for an earlier session are dropped silently. A failed
    /// request is reported after the session has left the running state.
    pub fn complete_search(
        &mut self,
        ticket: SearchTicket,
        result: std::result::Result<SuggestResponse, ServiceError>,
    ) -> Result<()> {
        let (event, failure) = match result {
            Ok(response) => (
                SessionEvent::SearchSucceeded {
                    tag: ticket.tag,
                    outcome: search_outcome(response),
                },
                None,
            ),
            Err(err) => (
                SessionEvent::SearchFailed {
                    tag: ticket.tag,
                    message: err.to_string(),
                },
                Some(err),
            ),
        };

        match self.apply(event) {
            Ok(_) => failure.map_or(Ok(()), |err| Err(err.into())),
            Err(WorkflowError::Session(err)) if err.is_silent() => {
                log::warn!("Discarding response: {err}");
                Ok(())
            }
            Err(err) => Err(err),
        }
    }

    /// Begin, await and complete a whole-row search. `false` when a request
    /// was already in flight.
    pub async fn run_search(&mut self, matrix: &BreakpointMatrix) -> Result<bool> {
        match self.begin_search(matrix)? {
            Some(ticket) => self.run(ticket).await.map(|()| true),
            None => Ok(false),
        }
    }

    pub async fn run_bounded_search(&mut self, matrix: &BreakpointMatrix) -> Result<bool> {
        match self.begin_bounded_search(matrix)? {
            Some(ticket) => self.run(ticket).await.map(|()| true),
            None => Ok(false),
        }
    }

    async fn run(&mut self, ticket: SearchTicket) -> Result<()> {
        let result = self.service.suggest_breakpoints(ticket.request()).await;
        self.complete_search(ticket, result)
    }

    /// Split `matrix` with the session's breakpoints and derive new codes.
    ///
    /// The split is checked before the session closes, so an out-of-range
    /// value leaves everything as it was. A code derivation failure comes
    /// back as [`WorkflowError::CodeDerivation`] holding the split matrix.
    pub async fn commit(&mut self, matrix: &BreakpointMatrix) -> Result<CommitOutcome> {
        let step = self.session.reduce(SessionEvent::Commit)?;
        let Effect::Commit(plan) = step.effect else {
            return Err(SessionError::NotOpen.into());
        };
        let pending = split_locally(matrix, &plan)?;
        self.session = step.session;

        log::info!(
            "Committed {} breakpoint(s) into row {}",
            plan.values.len(),
            plan.node.row_index
        );
        SplitCommitter::new(&self.service, &self.context)
            .derive_codes(pending)
            .await
    }

    pub async fn retry_code_derivation(&self, pending: PendingCommit) -> Result<CommitOutcome> {
        SplitCommitter::new(&self.service, &self.context)
            .derive_codes(pending)
            .await
    }

    /// Save histograms of the rows the confirmed breakpoints would create.
    ///
    /// Leaves the session untouched.
    pub async fn export_diagnostics(&self, matrix: &BreakpointMatrix) -> Result<ExportOutcome> {
        let search = self
            .session
            .auto()
            .ok_or_else(|| WorkflowError::NothingToExport("not in automatic mode".into()))?;
        if search.confirmed().is_empty() {
            return Err(WorkflowError::NothingToExport(
                "no confirmed breakpoints".into(),
            ));
        }
        let (Some(node), Some(level)) = (self.session.node(), self.session.level()) else {
            return Err(SessionError::NotOpen.into());
        };

        let Some(destination) = self.picker.select_directory() else {
            log::info!("Export aborted, no directory selected");
            return Ok(ExportOutcome::Aborted);
        };

        let plan = CommitPlan {
            node: node.clone(),
            level,
            values: search.confirmed().descending(),
        };
        let pending = split_locally(matrix, &plan)?;
        let coded = SplitCommitter::new(&self.service, &self.context)
            .derive_codes(pending)
            .await?;

        let request = ExportRequest {
            labels: self.context.labels.clone(),
            thr_grid_out: coded
                .matrix
                .row_slice(coded.affected.clone())
                .iter()
                .filter_map(CodedRow::from_row)
                .collect(),
            path: self.context.path.clone(),
            plot: self.context.plot.clone(),
            destination_dir: destination.display().to_string(),
            cheaper: self.context.cheaper,
        };
        log::info!(
            "Exporting {} row histogram(s) to {}",
            request.thr_grid_out.len(),
            request.destination_dir
        );
        let ack = self.service.export_diagnostics(&request).await?;
        Ok(ExportOutcome::Saved(ack))
    }

    /// Levels the open node may be split on
    pub fn level_options(&self) -> Vec<LevelOption> {
        self.session
            .node()
            .map(|node| level_options(&self.context.fields, node.level))
            .unwrap_or_default()
    }

    pub fn manual_status(&self) -> Option<ListStatus> {
        self.session.manual().map(|entry| entry.status())
    }

    pub fn title(&self) -> Option<String> {
        self.session.title()
    }

    /// `"{lower} < {field} < {upper}"` for the pending bounded search
    pub fn bounds_label(&self) -> Option<String> {
        let bounds = self.session.auto()?.pending_bounds()?;
        let field = self.context.field(self.session.level()?)?;
        Some(bounds.describe(field))
    }
}

fn search_outcome(response: SuggestResponse) -> SearchOutcome {
    SearchOutcome {
        candidates: response
            .records
            .into_iter()
            .map(|record| {
                CandidateBreakpoint::new(record.breakpoint, record.p_value, record.d_stat_value)
            })
            .collect(),
        diagnostic_image: response.figure,
    }
}
