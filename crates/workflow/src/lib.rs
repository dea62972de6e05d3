//! # Split Workflow
//!
//! Ties the suggestion session to the remote computation service and turns
//! confirmed breakpoints into a new breakpoint matrix.
//!
//! ## Architecture
//!
//! ```text
//! caller ──events──> Workflow ──reduce──> SuggestionSession
//!                       │
//!                       ├── begin_search ──> SearchTicket ──> ComputationService::suggest_breakpoints
//!                       │                                        │
//!                       │<──────── complete_search <─────────────┘
//!                       │
//!                       └── commit ──> SplitCommitter
//!                                        ├── apply_splits (local)
//!                                        └── ComputationService::derive_codes
//! ```
//!
//! Every request carries the session generation; responses that arrive after
//! the session was cancelled or reopened are dropped.
//!
//! ## Example
//!
//! ```rust,no_run
//! use wtsplit_matrix::BreakpointMatrix;
//! use wtsplit_session::{ModeKind, NodeMeta};
//! use wtsplit_workflow::{
//!     FixedDirectory, HttpComputationService, ServiceConfig, SplitContext, Workflow,
//! };
//!
//! # async fn demo(matrix: BreakpointMatrix, context: SplitContext) -> wtsplit_workflow::Result<()> {
//! let service = HttpComputationService::new(&ServiceConfig::from_env())?;
//! let mut workflow = Workflow::new(service, FixedDirectory::default(), context);
//!
//! workflow.open(NodeMeta::new(0, 0, "1"))?;
//! workflow.select_mode(ModeKind::Automatic)?;
//! workflow.set_desired_count("3")?;
//! workflow.run_search(&matrix).await?;
//! workflow.select_candidate(0)?;
//!
//! let outcome = workflow.commit(&matrix).await?;
//! println!("{} rows, affected {:?}", outcome.matrix.len(), outcome.affected);
//! # Ok(())
//! # }
//! ```

mod committer;
mod config;
mod error;
mod http;
mod service;
mod workflow;

pub use committer::{split_locally, CommitOutcome, PendingCommit, SplitCommitter};
pub use config::{ServiceConfig, SplitContext, DEFAULT_SERVICE_URL, SERVICE_URL_ENV};
pub use error::{Result, ServiceError, WorkflowError};
pub use http::HttpComputationService;
pub use service::{ComputationService, DirectoryPicker, FixedDirectory};
pub use workflow::{ExportOutcome, SearchTicket, Workflow};
