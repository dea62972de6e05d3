//! # Breakpoint Suggestion Session
//!
//! The state a user builds up while splitting one weather type, kept as a
//! plain value and advanced by a pure reducer.
//!
//! ## States
//!
//! ```text
//! Idle ──Open──> Configuring ──Submit──> Running ──ok──> Reviewing
//!                    ▲                      │              │
//!                    └──────failed──────────┘              │
//!                                                          ├─SelectCandidate
//!                                                          ├─SelectConfirmed + SetBoundDirection
//!                                                          │     └─SubmitBounded──> Running
//!                                                          └─Commit──> Idle (+ Effect::Commit)
//! ```
//!
//! `Running` is the only state with a request in flight; submitting again
//! there is a no-op. Every request is tagged with the session generation and
//! responses carrying another tag are refused as stale.
//!
//! ## Example
//!
//! ```rust
//! use wtsplit_session::{Effect, NodeMeta, SessionEvent, SuggestionSession};
//!
//! let node = NodeMeta::new(0, 0, "1");
//! let session = SuggestionSession::default()
//!     .reduce(SessionEvent::Open { node, level_count: 1 })
//!     .unwrap()
//!     .session;
//! let step = session
//!     .reduce(SessionEvent::SetManualValues("7, 3".into()))
//!     .unwrap()
//!     .session
//!     .reduce(SessionEvent::Commit)
//!     .unwrap();
//!
//! match step.effect {
//!     Effect::Commit(plan) => assert_eq!(plan.values, vec![7.0, 3.0]),
//!     other => panic!("unexpected effect {other:?}"),
//! }
//! assert!(!step.session.is_open());
//! ```

mod bounds;
mod confirmed;
mod error;
mod reducer;
mod state;
mod types;

pub use bounds::{compute_bounds, BoundDirection, SearchBounds};
pub use confirmed::ConfirmedBreakpoints;
pub use error::{Result, SessionError};
pub use reducer::{CommitPlan, Effect, SearchRequest, SessionEvent, Step};
pub use state::{AutoSearch, ManualEntry, Mode, ModeKind, OpenSession, Phase, SuggestionSession};
pub use types::{CandidateBreakpoint, NodeMeta, RequestTag, SearchOutcome};
