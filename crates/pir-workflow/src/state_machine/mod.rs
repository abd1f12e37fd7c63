//! Document lifecycle transitions

use crate::error::WorkflowError;
use pir_model::DocumentStatus;

/// Validates a document status transition.
///
/// Starting a run is allowed from any status, including a run already in
/// flight (the run is replaced). Only an on-approval document may finish.
/// With the `strict-debug` feature an illegal transition panics instead.
pub fn validate_transition(from: DocumentStatus, to: DocumentStatus) -> Result<(), WorkflowError> {
    if allowed(from, to) {
        Ok(())
    } else {
        #[cfg(feature = "strict-debug")]
        panic!("Illegal document transition attempted: {from} -> {to}");

        #[cfg(not(feature = "strict-debug"))]
        Err(WorkflowError::IllegalTransition { from, to })
    }
}

/// Statuses reachable from `from`
#[must_use]
pub fn allowed_transitions(from: DocumentStatus) -> Vec<DocumentStatus> {
    use DocumentStatus::*;
    match from {
        Draft => vec![OnApproval],
        OnApproval => vec![OnApproval, Approved, Rejected],
        Approved => vec![OnApproval],
        Rejected => vec![OnApproval],
    }
}

fn allowed(from: DocumentStatus, to: DocumentStatus) -> bool {
    allowed_transitions(from).into_iter().any(|s| s == to)
}
