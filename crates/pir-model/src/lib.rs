//! pir model - typed domain for construction-project documents
//!
//! # Core Concepts
//!
//! - [`Document`]: a project document whose [`DocumentState`] carries approval progress
//! - [`ProcessInfo`]: 1-based step counter of a running approval
//! - [`Process`]: catalog definition of an approval process
//! - [`ProcessRef`]: process snapshot assigned to documents when a run starts
//! - [`StepPolicy`] / [`StepRule`]: per-step participants and completion rules
//! - [`Role`] / [`NavItem`]: user roles and the sections they navigate
//!
//! # Example
//!
//! ```rust
//! use pir_model::{Document, DocumentId, DocumentStatus, ProcessRef, ProjectId};
//!
//! let mut doc = Document::draft(
//!     DocumentId::new("doc-1").unwrap(),
//!     ProjectId::new("prj-1").unwrap(),
//!     "Site plan",
//!     "Ivanov",
//! );
//! doc.begin_approval(&ProcessRef::new("Design review", 2).unwrap());
//! assert_eq!(doc.status(), DocumentStatus::OnApproval);
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

mod document;
mod error;
mod ids;
mod process;
mod role;
mod rule;

pub use document::{Document, DocumentState, DocumentStatus, ProcessInfo};
pub use error::ModelError;
pub use ids::{DocumentId, ProcessId, ProjectId};
pub use process::{Process, ProcessRef, ProcessStatus};
pub use role::{NavItem, Role};
pub use rule::{Decision, Response, StepPolicy, StepRule, Verdict};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
