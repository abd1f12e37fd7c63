//! pir workflow - document approval engine
//!
//! Documents move `draft -> on-approval -> approved | rejected` through
//! named multi-step processes:
//! 1. **Catalog and access**: which processes a company may start
//! 2. **Engine**: starts runs, advances steps, evaluates step rules
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use pir_workflow::prelude::*;
//!
//! # async fn demo() -> Result<(), WorkflowError> {
//! let engine = ApprovalEngine::from_seed(Seed::demo()?, &PirConfig::new())?;
//!
//! let doc = DocumentId::new("doc-9")?;
//! let process = ProcessId::new("proc-1")?;
//! engine.start_process(Some("setlgroup"), &process, &[doc.clone()]).await?;
//!
//! while engine.advance(&doc).await? != AdvanceOutcome::Approved {}
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

pub mod access;
pub mod capabilities;
pub mod catalog;
pub mod config;
pub mod engine;
pub mod error;
pub mod journal;
pub mod monitor;
pub mod rules;
pub mod seed;
pub mod state_machine;
pub mod store;

pub use access::{AccessResolver, CompanyGrants};
pub use capabilities::{CapabilityResolver, CapabilitySet};
pub use catalog::ProcessCatalog;
pub use config::PirConfig;
pub use engine::{AdvanceOutcome, ApprovalEngine, RespondOutcome, StartReport};
pub use error::WorkflowError;
pub use journal::{Journal, JournalAction, JournalEntry};
pub use monitor::{MonitorBoard, MonitorHandle, MonitoredRun, RunCondition};
pub use seed::Seed;
pub use store::{DocumentStore, NewDocument};

/// Applied transition as delivered to [`ApprovalEngine::subscribe`] receivers
pub type ApprovalEvent = JournalEntry;

/// Common imports
pub mod prelude {
    pub use crate::access::{AccessResolver, CompanyGrants};
    pub use crate::capabilities::{CapabilityResolver, CapabilitySet};
    pub use crate::config::PirConfig;
    pub use crate::engine::{AdvanceOutcome, ApprovalEngine, RespondOutcome, StartReport};
    pub use crate::error::WorkflowError;
    pub use crate::seed::Seed;
    pub use crate::store::{DocumentStore, NewDocument};
    pub use pir_model::{
        Decision, Document, DocumentId, DocumentStatus, Process, ProcessId, ProcessRef,
        ProjectId, Role,
    };
}

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Check if running with strict debugging enabled
#[must_use]
pub const fn strict_debug() -> bool {
    cfg!(feature = "strict-debug")
}
