//! Error types for the domain model

/// Errors raised while constructing model values
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ModelError {
    /// Identifier was blank
    #[error("empty {kind} identifier")]
    EmptyIdentifier {
        /// Identifier kind (document, project, process)
        kind: &'static str,
    },

    /// A process must have at least one step
    #[error("invalid step count {0}: a process needs at least one step")]
    InvalidStepCount(u32),

    /// Process name was blank
    #[error("process name must not be empty")]
    EmptyProcessName,

    /// Role name did not match any known role
    #[error("unknown role: {0}")]
    UnknownRole(String),

    /// Quorum rule asks for zero approvals
    #[error("quorum must require at least one approval")]
    ZeroQuorum,

    /// Quorum asks for more approvals than the step has participants
    #[error("quorum of {approvals} exceeds the {participants} named participants")]
    QuorumExceedsParticipants {
        /// Approvals required
        approvals: u32,
        /// Participants named on the step
        participants: usize,
    },

    /// `CanFinish` names someone who is not a participant of the step
    #[error("finishing participant {0} is not listed on the step")]
    UnknownFinisher(String),

    /// More step policies than the process has steps
    #[error("{policies} step policies for a process of {steps} steps")]
    TooManyPolicies {
        /// Policies supplied
        policies: usize,
        /// Steps in the process
        steps: u32,
    },
}
