use crate::bounds::{compute_bounds, BoundDirection, SearchBounds};
use crate::confirmed::ConfirmedBreakpoints;
use crate::types::{CandidateBreakpoint, NodeMeta};
use serde::{Deserialize, Serialize};
use std::fmt;
use wtsplit_matrix::ListStatus;

/// Where a session stands in the suggestion workflow
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Idle,
    Configuring,
    Running,
    Reviewing,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::Configuring => "configuring",
            Self::Running => "running",
            Self::Reviewing => "reviewing",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModeKind {
    Manual,
    Automatic,
}

/// Breakpoints typed by hand, kept as entered until commit
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ManualEntry {
    pub(crate) values: Vec<String>,
}

impl ManualEntry {
    pub fn values(&self) -> &[String] {
        &self.values
    }

    pub fn status(&self) -> ListStatus {
        ListStatus::of(&self.values)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SearchScope {
    Fresh,
    Bounded,
}

/// K-S driven search state
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AutoSearch {
    pub(crate) desired_count: String,
    pub(crate) bounded_count: String,
    pub(crate) candidates: Vec<CandidateBreakpoint>,
    pub(crate) confirmed: ConfirmedBreakpoints,
    pub(crate) selected_candidate: Option<usize>,
    pub(crate) selected_confirmed: Option<usize>,
    pub(crate) bound: Option<BoundDirection>,
    pub(crate) iteration: usize,
    /// Value confirmed during the current iteration, replaced on reselection
    pub(crate) slot: Option<f64>,
    pub(crate) diagnostic_image: Option<String>,
    pub(crate) in_flight: Option<SearchScope>,
}

impl AutoSearch {
    pub fn desired_count(&self) -> &str {
        &self.desired_count
    }

    pub fn bounded_count(&self) -> &str {
        &self.bounded_count
    }

    pub fn candidates(&self) -> &[CandidateBreakpoint] {
        &self.candidates
    }

    pub fn confirmed(&self) -> &ConfirmedBreakpoints {
        &self.confirmed
    }

    pub fn selected_candidate(&self) -> Option<usize> {
        self.selected_candidate
    }

    pub fn selected_confirmed(&self) -> Option<usize> {
        self.selected_confirmed
    }

    pub fn bound(&self) -> Option<BoundDirection> {
        self.bound
    }

    pub fn iteration(&self) -> usize {
        self.iteration
    }

    pub fn diagnostic_image(&self) -> Option<&str> {
        self.diagnostic_image.as_deref()
    }

    /// Candidates that can still be picked in this iteration
    pub fn is_selectable(&self, candidate: usize) -> bool {
        self.candidates.get(candidate).is_some_and(|c| {
            self.slot == Some(c.value) || !self.confirmed.contains(c.value)
        })
    }

    /// Bounds the next bounded search would use, once index and direction are picked
    pub fn pending_bounds(&self) -> Option<SearchBounds> {
        let index = self.selected_confirmed?;
        let direction = self.bound?;
        compute_bounds(self.confirmed.as_slice(), index, direction).ok()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Mode {
    Manual(ManualEntry),
    Automatic(AutoSearch),
}

impl Mode {
    pub const fn kind(&self) -> ModeKind {
        match self {
            Self::Manual(_) => ModeKind::Manual,
            Self::Automatic(_) => ModeKind::Automatic,
        }
    }
}

/// A session bound to one node
#[derive(Debug, Clone, PartialEq)]
pub struct OpenSession {
    pub(crate) node: NodeMeta,
    pub(crate) level: usize,
    pub(crate) level_count: usize,
    pub(crate) phase: Phase,
    pub(crate) mode: Mode,
}

impl OpenSession {
    pub(crate) fn new(node: NodeMeta, level_count: usize) -> Self {
        Self {
            level: node.level,
            node,
            level_count,
            phase: Phase::Configuring,
            mode: Mode::Manual(ManualEntry::default()),
        }
    }

    pub fn node(&self) -> &NodeMeta {
        &self.node
    }

    /// Level the split applies to
    pub fn level(&self) -> usize {
        self.level
    }

    pub fn level_count(&self) -> usize {
        self.level_count
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn mode(&self) -> &Mode {
        &self.mode
    }
}

/// Everything decided so far about splitting one node.
///
/// A plain value: events produce new sessions via
/// [`SuggestionSession::reduce`]. The generation survives resets so responses
/// to requests from earlier sessions can be told apart.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SuggestionSession {
    pub(crate) generation: u64,
    pub(crate) open: Option<OpenSession>,
}

impl SuggestionSession {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn is_open(&self) -> bool {
        self.open.is_some()
    }

    pub fn open_session(&self) -> Option<&OpenSession> {
        self.open.as_ref()
    }

    pub fn phase(&self) -> Phase {
        self.open.as_ref().map_or(Phase::Idle, |open| open.phase)
    }

    /// A request is in flight
    pub fn is_pending(&self) -> bool {
        self.phase() == Phase::Running
    }

    pub fn node(&self) -> Option<&NodeMeta> {
        self.open.as_ref().map(|open| &open.node)
    }

    pub fn level(&self) -> Option<usize> {
        self.open.as_ref().map(|open| open.level)
    }

    pub fn mode_kind(&self) -> Option<ModeKind> {
        self.open.as_ref().map(|open| open.mode.kind())
    }

    pub fn manual(&self) -> Option<&ManualEntry> {
        match &self.open.as_ref()?.mode {
            Mode::Manual(entry) => Some(entry),
            Mode::Automatic(_) => None,
        }
    }

    pub fn auto(&self) -> Option<&AutoSearch> {
        match &self.open.as_ref()?.mode {
            Mode::Automatic(search) => Some(search),
            Mode::Manual(_) => None,
        }
    }

    pub fn candidates(&self) -> &[CandidateBreakpoint] {
        self.auto().map(AutoSearch::candidates).unwrap_or_default()
    }

    pub fn confirmed(&self) -> &[f64] {
        self.auto()
            .map(|search| search.confirmed.as_slice())
            .unwrap_or_default()
    }

    pub fn iteration(&self) -> usize {
        self.auto().map_or(0, AutoSearch::iteration)
    }

    /// Heading for the split dialog
    pub fn title(&self) -> Option<String> {
        let open = self.open.as_ref()?;
        let reviewing = matches!(&open.mode, Mode::Automatic(search) if !search.candidates.is_empty());
        Some(if reviewing {
            format!("K-S test for WT{}", open.node.code)
        } else {
            format!("Computing Breakpoints for WT{}", open.node.code)
        })
    }

    /// Back to idle, keeping the generation counter
    pub(crate) fn reset(&self) -> Self {
        Self {
            generation: self.generation,
            open: None,
        }
    }
}
