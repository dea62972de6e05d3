use crate::bounds::{compute_bounds, BoundDirection, SearchBounds};
use crate::error::{Result, SessionError};
use crate::state::{
    AutoSearch, ManualEntry, Mode, ModeKind, OpenSession, Phase, SearchScope, SuggestionSession,
};
use crate::types::{NodeMeta, RequestTag, SearchOutcome};
use wtsplit_matrix::{parse_breakpoint_list, parse_count, split_value_list, ValidationError};

/// Everything that can happen to a session
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    /// Start splitting `node`; rows carry `level_count` threshold pairs
    Open { node: NodeMeta, level_count: usize },
    SelectMode(ModeKind),
    SelectLevel(usize),
    /// Raw comma-separated manual breakpoints
    SetManualValues(String),
    SetDesiredCount(String),
    SetBoundedCount(String),
    /// Run the K-S test over the whole row
    Submit,
    SelectCandidate(usize),
    SelectConfirmed(usize),
    SetBoundDirection(BoundDirection),
    /// Run the K-S test between the selected confirmed value and its neighbour
    SubmitBounded,
    EditConfirmed { index: usize, value: f64 },
    RemoveConfirmed(usize),
    SearchSucceeded { tag: RequestTag, outcome: SearchOutcome },
    SearchFailed { tag: RequestTag, message: String },
    Commit,
    Cancel,
}

/// A suggestion request the caller has to send
#[derive(Debug, Clone, PartialEq)]
pub struct SearchRequest {
    pub tag: RequestTag,
    pub row_index: usize,
    pub level: usize,
    pub desired_count: u32,
    /// `None` searches the whole row
    pub bounds: Option<SearchBounds>,
}

/// Breakpoints ready for the split committer
#[derive(Debug, Clone, PartialEq)]
pub struct CommitPlan {
    pub node: NodeMeta,
    pub level: usize,
    /// Highest first
    pub values: Vec<f64>,
}

/// Side effect requested by a transition
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    None,
    RunSearch(SearchRequest),
    Commit(CommitPlan),
}

/// Result of a transition
#[derive(Debug, Clone, PartialEq)]
pub struct Step {
    pub session: SuggestionSession,
    pub effect: Effect,
}

impl Step {
    fn quiet(session: SuggestionSession) -> Self {
        Self {
            session,
            effect: Effect::None,
        }
    }
}

impl SuggestionSession {
    /// Apply `event` and return the next session.
    ///
    /// Never mutates `self`; on error the caller keeps the current value.
    pub fn reduce(&self, event: SessionEvent) -> Result<Step> {
        match event {
            SessionEvent::Open { node, level_count } => self.open_node(node, level_count),
            SessionEvent::Cancel => {
                log::debug!("Session {} cancelled", self.generation);
                Ok(Step::quiet(self.reset()))
            }
            SessionEvent::SearchSucceeded { tag, outcome } => self.search_succeeded(tag, outcome),
            SessionEvent::SearchFailed { tag, message } => self.search_failed(tag, &message),
            SessionEvent::Commit => self.commit(),
            SessionEvent::Submit => self.submit(SearchScope::Fresh),
            SessionEvent::SubmitBounded => self.submit(SearchScope::Bounded),
            SessionEvent::SelectMode(kind) => self.edit(|next| select_mode(next, kind)),
            SessionEvent::SelectLevel(level) => self.edit(|next| select_level(next, level)),
            SessionEvent::SetManualValues(raw) => self.edit(|next| {
                let phase = next.phase;
                match &mut next.mode {
                    Mode::Manual(entry) => {
                        entry.values = split_value_list(&raw);
                        Ok(())
                    }
                    Mode::Automatic(_) => {
                        Err(SessionError::invalid_state("enter manual values", phase))
                    }
                }
            }),
            SessionEvent::SetDesiredCount(text) => self.edit(|next| {
                let configuring = next.phase == Phase::Configuring;
                let search = auto_mut(next, "set the breakpoint count")?;
                if configuring {
                    search.bounded_count = text.clone();
                }
                search.desired_count = text;
                Ok(())
            }),
            SessionEvent::SetBoundedCount(text) => self.edit(|next| {
                auto_mut(next, "set the breakpoint count")?.bounded_count = text;
                Ok(())
            }),
            SessionEvent::SelectCandidate(index) => self.edit(|next| {
                select_candidate(auto_mut(next, "select a candidate")?, index)
            }),
            SessionEvent::SelectConfirmed(index) => self.edit(|next| {
                let search = auto_mut(next, "select a confirmed breakpoint")?;
                if index >= search.confirmed.len() {
                    return Err(SessionError::IndexOutOfRange {
                        index,
                        len: search.confirmed.len(),
                    });
                }
                search.selected_confirmed = Some(index);
                Ok(())
            }),
            SessionEvent::SetBoundDirection(direction) => self.edit(|next| {
                let search = auto_mut(next, "choose a search direction")?;
                if search.selected_confirmed.is_none() {
                    return Err(SessionError::NoBoundSelected);
                }
                search.bound = Some(direction);
                Ok(())
            }),
            SessionEvent::EditConfirmed { index, value } => self.edit(|next| {
                edit_confirmed(auto_mut(next, "edit a confirmed breakpoint")?, index, value)
            }),
            SessionEvent::RemoveConfirmed(index) => self.edit(|next| {
                remove_confirmed(auto_mut(next, "remove a confirmed breakpoint")?, index)
            }),
        }
    }

    fn open_node(&self, node: NodeMeta, level_count: usize) -> Result<Step> {
        if node.level >= level_count {
            return Err(SessionError::LevelNotSelectable {
                level: node.level,
                min: node.level,
                count: level_count,
            });
        }
        let generation = self.generation + 1;
        log::debug!(
            "Opening session {generation} for row {} (WT{})",
            node.row_index,
            node.code
        );
        Ok(Step::quiet(Self {
            generation,
            open: Some(OpenSession::new(node, level_count)),
        }))
    }

    fn open_ref(&self) -> Result<&OpenSession> {
        self.open.as_ref().ok_or(SessionError::NotOpen)
    }

    fn submit(&self, scope: SearchScope) -> Result<Step> {
        let open = self.open_ref()?;
        if open.phase == Phase::Running {
            log::debug!("Suggestion request already pending, ignoring submit");
            return Ok(Step::quiet(self.clone()));
        }
        let Mode::Automatic(search) = &open.mode else {
            return Err(SessionError::invalid_state("run the K-S test in manual mode", open.phase));
        };

        let mut next_search = search.clone();
        let (desired_count, bounds) = match scope {
            SearchScope::Fresh => (parse_count(&search.desired_count)?, None),
            SearchScope::Bounded => {
                if open.phase != Phase::Reviewing {
                    return Err(SessionError::invalid_state("run a bounded search", open.phase));
                }
                let (Some(index), Some(direction)) = (search.selected_confirmed, search.bound)
                else {
                    return Err(SessionError::NoBoundSelected);
                };
                let bounds = compute_bounds(search.confirmed.as_slice(), index, direction)?;
                let count = parse_count(&search.bounded_count)?;
                next_search.iteration += 1;
                next_search.slot = None;
                next_search.selected_candidate = None;
                next_search.selected_confirmed = None;
                next_search.bound = None;
                (count, Some(bounds))
            }
        };
        next_search.in_flight = Some(scope);

        let request = SearchRequest {
            tag: RequestTag(self.generation),
            row_index: open.node.row_index,
            level: open.level,
            desired_count,
            bounds,
        };
        log::debug!("Session {} submitting {:?}", self.generation, request);

        let mut next = open.clone();
        next.phase = Phase::Running;
        next.mode = Mode::Automatic(next_search);
        Ok(Step {
            session: self.with_open(next),
            effect: Effect::RunSearch(request),
        })
    }

    /// The open session a response may be applied to
    fn accept_response(&self, tag: RequestTag) -> Result<(&OpenSession, &AutoSearch)> {
        let stale = SessionError::StaleResponse {
            current: self.generation,
            received: tag.0,
        };
        if tag.0 != self.generation {
            return Err(stale);
        }
        match &self.open {
            Some(open) if open.phase == Phase::Running => match &open.mode {
                Mode::Automatic(search) => Ok((open, search)),
                Mode::Manual(_) => Err(stale),
            },
            _ => Err(stale),
        }
    }

    fn search_succeeded(&self, tag: RequestTag, outcome: SearchOutcome) -> Result<Step> {
        let (open, search) = self.accept_response(tag)?;

        let mut next_search = search.clone();
        let before = outcome.candidates.len();
        next_search.candidates = outcome
            .candidates
            .into_iter()
            .filter(|candidate| !candidate.value.is_nan())
            .collect();
        if next_search.candidates.len() != before {
            log::warn!(
                "Dropped {} candidate(s) without a numeric breakpoint",
                before - next_search.candidates.len()
            );
        }
        next_search.diagnostic_image = outcome.diagnostic_image;
        next_search.selected_candidate = None;
        next_search.selected_confirmed = None;
        next_search.bound = None;
        if next_search.in_flight.take() == Some(SearchScope::Fresh) {
            next_search.confirmed = Default::default();
            next_search.iteration = 0;
            next_search.slot = None;
        }

        let mut next = open.clone();
        next.phase = if next_search.candidates.is_empty() && next_search.confirmed.is_empty() {
            Phase::Configuring
        } else {
            Phase::Reviewing
        };
        log::debug!(
            "Session {} received {} candidate(s)",
            self.generation,
            next_search.candidates.len()
        );
        next.mode = Mode::Automatic(next_search);
        Ok(Step::quiet(self.with_open(next)))
    }

    fn search_failed(&self, tag: RequestTag, message: &str) -> Result<Step> {
        let (open, search) = self.accept_response(tag)?;
        log::warn!("Suggestion request failed: {message}");

        let mut next_search = search.clone();
        next_search.in_flight = None;
        let mut next = open.clone();
        next.phase = if next_search.candidates.is_empty() {
            Phase::Configuring
        } else {
            Phase::Reviewing
        };
        next.mode = Mode::Automatic(next_search);
        Ok(Step::quiet(self.with_open(next)))
    }

    fn commit(&self) -> Result<Step> {
        let open = self.open_ref()?;
        if open.phase == Phase::Running {
            return Err(SessionError::RequestPending);
        }

        let values = match &open.mode {
            Mode::Manual(entry) => {
                let mut values = parse_breakpoint_list(&entry.values)?;
                values.sort_by(|a, b| b.total_cmp(a));
                values
            }
            Mode::Automatic(search) => {
                if search.confirmed.is_empty() {
                    return Err(ValidationError::Empty.into());
                }
                search.confirmed.descending()
            }
        };

        let plan = CommitPlan {
            node: open.node.clone(),
            level: open.level,
            values,
        };
        log::info!(
            "Committing {} breakpoint(s) for WT{} at level {}",
            plan.values.len(),
            plan.node.code,
            plan.level
        );
        Ok(Step {
            session: self.reset(),
            effect: Effect::Commit(plan),
        })
    }

    /// Events that only rearrange local state
    fn edit(&self, apply: impl FnOnce(&mut OpenSession) -> Result<()>) -> Result<Step> {
        let open = self.open_ref()?;
        if open.phase == Phase::Running {
            return Err(SessionError::RequestPending);
        }
        let mut next = open.clone();
        apply(&mut next)?;
        Ok(Step::quiet(self.with_open(next)))
    }

    fn with_open(&self, open: OpenSession) -> Self {
        Self {
            generation: self.generation,
            open: Some(open),
        }
    }
}

fn auto_mut<'a>(open: &'a mut OpenSession, action: &'static str) -> Result<&'a mut AutoSearch> {
    let phase = open.phase;
    match &mut open.mode {
        Mode::Automatic(search) => Ok(search),
        Mode::Manual(_) => Err(SessionError::invalid_state(action, phase)),
    }
}

fn select_mode(open: &mut OpenSession, kind: ModeKind) -> Result<()> {
    if kind == open.mode.kind() {
        return Ok(());
    }
    if let Mode::Automatic(search) = &open.mode {
        if !search.candidates.is_empty() {
            return Err(SessionError::invalid_state("switch mode", open.phase));
        }
    }
    open.mode = match kind {
        ModeKind::Manual => Mode::Manual(ManualEntry::default()),
        ModeKind::Automatic => Mode::Automatic(AutoSearch::default()),
    };
    Ok(())
}

/// Candidates and confirmations belong to the level they were searched on;
/// moving to another level drops them and keeps the typed counts.
fn select_level(open: &mut OpenSession, level: usize) -> Result<()> {
    let level = level.max(open.node.level);
    if level >= open.level_count {
        return Err(SessionError::LevelNotSelectable {
            level,
            min: open.node.level,
            count: open.level_count,
        });
    }
    if level == open.level {
        return Ok(());
    }
    open.level = level;
    if let Mode::Automatic(search) = &mut open.mode {
        if !search.candidates.is_empty() || !search.confirmed.is_empty() {
            log::debug!("Level changed to {level}, dropping earlier search results");
        }
        *search = AutoSearch {
            desired_count: std::mem::take(&mut search.desired_count),
            bounded_count: std::mem::take(&mut search.bounded_count),
            ..AutoSearch::default()
        };
        open.phase = Phase::Configuring;
    }
    Ok(())
}

fn select_candidate(search: &mut AutoSearch, index: usize) -> Result<()> {
    let candidate = search
        .candidates
        .get(index)
        .copied()
        .ok_or(SessionError::IndexOutOfRange {
            index,
            len: search.candidates.len(),
        })?;

    if search.slot != Some(candidate.value) {
        if search.confirmed.contains(candidate.value) {
            return Err(SessionError::AlreadyConfirmed(candidate.value));
        }
        if let Some(previous) = search.slot.take() {
            search.confirmed.remove(previous);
        }
        search.confirmed.insert(candidate.value);
        search.slot = Some(candidate.value);
    }
    search.selected_candidate = Some(index);
    search.selected_confirmed = None;
    search.bound = None;
    Ok(())
}

fn edit_confirmed(search: &mut AutoSearch, index: usize, value: f64) -> Result<()> {
    let Some(old) = search.confirmed.get(index) else {
        return Err(SessionError::IndexOutOfRange {
            index,
            len: search.confirmed.len(),
        });
    };
    if value.is_nan() {
        return Err(ValidationError::NotANumber(value.to_string()).into());
    }
    if value == old {
        return Ok(());
    }
    if search.confirmed.contains(value) {
        return Err(SessionError::AlreadyConfirmed(value));
    }
    search.confirmed.remove(old);
    search.confirmed.insert(value);
    if search.slot == Some(old) {
        search.slot = Some(value);
        search.selected_candidate = None;
    }
    search.selected_confirmed = None;
    search.bound = None;
    Ok(())
}

fn remove_confirmed(search: &mut AutoSearch, index: usize) -> Result<()> {
    if index >= search.confirmed.len() {
        return Err(SessionError::IndexOutOfRange {
            index,
            len: search.confirmed.len(),
        });
    }
    if search.confirmed.len() == 1 {
        return Err(SessionError::LastConfirmed);
    }
    let removed = search.confirmed.remove_at(index);
    if removed.is_some() && search.slot == removed {
        search.slot = None;
        search.selected_candidate = None;
    }
    search.selected_confirmed = None;
    search.bound = None;
    Ok(())
}
