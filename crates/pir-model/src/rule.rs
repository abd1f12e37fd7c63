//! Step rule data
//!
//! Each process step may name its participants and a list of rules deciding
//! when the step is done. Evaluation lives in `pir-workflow`; this module only
//! defines the shapes.

use crate::error::ModelError;
use serde::{Deserialize, Serialize};

/// A participant's answer on the current step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Decision {
    /// Approve the document
    Approve,
    /// Reject the document
    Reject,
}

/// Recorded response of one participant
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Response {
    /// Who answered
    pub participant: String,
    /// What they answered
    pub decision: Decision,
}

impl Response {
    /// Approval from `participant`
    #[must_use]
    pub fn approve(participant: impl Into<String>) -> Self {
        Self {
            participant: participant.into(),
            decision: Decision::Approve,
        }
    }

    /// Rejection from `participant`
    #[must_use]
    pub fn reject(participant: impl Into<String>) -> Self {
        Self {
            participant: participant.into(),
            decision: Decision::Reject,
        }
    }
}

/// Rule attached to a step
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "rule", rename_all = "snake_case")]
pub enum StepRule {
    /// Every participant must approve
    AllRequired,
    /// A single approval completes the step
    AnyApproves,
    /// At least `approvals` approvals complete the step
    Quorum {
        /// Approvals needed
        approvals: u32,
    },
    /// Any rejection rejects the whole document
    AutoReject,
    /// This participant's approval finishes the whole process
    CanFinish {
        /// Participant allowed to finish
        participant: String,
    },
}

impl StepRule {
    /// Quorum rule
    ///
    /// # Errors
    /// Returns [`ModelError::ZeroQuorum`] when `approvals` is zero
    pub fn quorum(approvals: u32) -> Result<Self, ModelError> {
        if approvals == 0 {
            return Err(ModelError::ZeroQuorum);
        }
        Ok(StepRule::Quorum { approvals })
    }

    /// Whether the rule decides step completion (as opposed to an override)
    #[inline]
    #[must_use]
    pub fn is_completion_rule(&self) -> bool {
        matches!(
            self,
            StepRule::AllRequired | StepRule::AnyApproves | StepRule::Quorum { .. }
        )
    }
}

/// Participants and rules of one step
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepPolicy {
    /// Participants expected to respond
    pub participants: Vec<String>,
    /// Rules, evaluated together
    pub rules: Vec<StepRule>,
}

impl StepPolicy {
    /// New step policy
    #[must_use]
    pub fn new(participants: Vec<String>, rules: Vec<StepRule>) -> Self {
        Self {
            participants,
            rules,
        }
    }

    /// Whether `participant` is expected on this step
    #[must_use]
    pub fn includes(&self, participant: &str) -> bool {
        self.participants.iter().any(|p| p == participant)
    }

    /// Open steps name no participants and accept anyone
    #[inline]
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.participants.is_empty()
    }

    /// Check the rules against the participant list
    ///
    /// Deserialized rules never went through [`StepRule::quorum`].
    ///
    /// # Errors
    /// - [`ModelError::ZeroQuorum`] for a quorum of zero
    /// - [`ModelError::QuorumExceedsParticipants`] when a named participant
    ///   list is too short to ever reach the quorum
    /// - [`ModelError::UnknownFinisher`] when `CanFinish` names someone
    ///   outside a named participant list
    pub fn validate(&self) -> Result<(), ModelError> {
        for rule in &self.rules {
            match rule {
                StepRule::Quorum { approvals: 0 } => return Err(ModelError::ZeroQuorum),
                StepRule::Quorum { approvals }
                    if !self.is_open() && *approvals as usize > self.participants.len() =>
                {
                    return Err(ModelError::QuorumExceedsParticipants {
                        approvals: *approvals,
                        participants: self.participants.len(),
                    });
                }
                StepRule::CanFinish { participant }
                    if !self.is_open() && !self.includes(participant) =>
                {
                    return Err(ModelError::UnknownFinisher(participant.clone()));
                }
                _ => {}
            }
        }
        Ok(())
    }
}

/// Outcome of evaluating a step against its responses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Verdict {
    /// Waiting for more responses
    Pending,
    /// Step complete, move on
    Continue,
    /// Document rejected
    Reject,
    /// Whole process finished as approved
    Finish,
}
