//! Error types for the workflow engine
//!
//! The lenient operations ([`crate::ApprovalEngine::start_approval`],
//! [`crate::ApprovalEngine::advance`]) only fail if their background task
//! dies: misses are skipped or reported as no-ops. The strict variants
//! surface the same situations as [`WorkflowError`] values:
//! - unknown document or process ids
//! - processes that are not runnable or not granted to a company
//! - acting on a document that is not on approval
//! - illegal lifecycle transitions

use pir_model::{DocumentId, DocumentStatus, ModelError, ProcessId};

/// Main workflow error type
#[derive(Debug, thiserror::Error)]
pub enum WorkflowError {
    /// Document id does not resolve in the store
    #[error("unknown document: {0}")]
    UnknownDocument(DocumentId),

    /// Document id already present in the store
    #[error("duplicate document: {0}")]
    DuplicateDocument(DocumentId),

    /// Process id does not resolve in the catalog
    #[error("unknown process: {0}")]
    UnknownProcess(ProcessId),

    /// Process id appears twice in the catalog
    #[error("duplicate process in catalog: {0}")]
    DuplicateProcess(ProcessId),

    /// Process exists but is not active
    #[error("process {0} is not active")]
    ProcessNotRunnable(ProcessId),

    /// Company may not initiate the process
    #[error("process {process} is not available to {company}")]
    NotGranted {
        /// Requesting company
        company: String,
        /// Requested process
        process: ProcessId,
    },

    /// Document has no running approval
    #[error("document {id} is not on approval (status: {status})")]
    NotOnApproval {
        /// Document id
        id: DocumentId,
        /// Current status
        status: DocumentStatus,
    },

    /// Participant is not expected on the current step
    #[error("{participant} is not a participant of step {step} for document {id}")]
    NotAParticipant {
        /// Document id
        id: DocumentId,
        /// Current step
        step: u32,
        /// Responding participant
        participant: String,
    },

    /// Lifecycle transition is not allowed
    #[error("illegal transition {from} -> {to}")]
    IllegalTransition {
        /// Status before
        from: DocumentStatus,
        /// Requested status
        to: DocumentStatus,
    },

    /// Invalid model value
    #[error("model error: {0}")]
    Model(#[from] ModelError),

    /// Journal chain is broken
    #[error("journal integrity violation at entry {index}")]
    JournalIntegrity {
        /// Position of the first bad entry
        index: usize,
    },

    /// Seed or config could not be read
    #[error("configuration error: {0}")]
    Config(String),

    /// Background task died before finishing its mutation
    #[error("engine task failed: {0}")]
    TaskFailed(String),
}

impl WorkflowError {
    /// Lookup misses (document or process)
    #[inline]
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::UnknownDocument(_) | Self::UnknownProcess(_))
    }

    /// Request refused by process availability rules
    #[inline]
    #[must_use]
    pub fn is_access_denied(&self) -> bool {
        matches!(self, Self::NotGranted { .. } | Self::ProcessNotRunnable(_))
    }

    /// Request conflicts with the document's current lifecycle state
    #[inline]
    #[must_use]
    pub fn is_state_conflict(&self) -> bool {
        matches!(
            self,
            Self::NotOnApproval { .. }
                | Self::IllegalTransition { .. }
                | Self::NotAParticipant { .. }
        )
    }
}
