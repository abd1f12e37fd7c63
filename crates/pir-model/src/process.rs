//! Approval process definitions

use crate::error::ModelError;
use crate::ids::ProcessId;
use crate::rule::StepPolicy;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Publication status of a process definition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProcessStatus {
    /// Published, may be started
    Active,
    /// Being edited
    Draft,
    /// Retired
    Archived,
}

impl fmt::Display for ProcessStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(match self {
            ProcessStatus::Active => "active",
            ProcessStatus::Draft => "draft",
            ProcessStatus::Archived => "archived",
        })
    }
}

/// Named approval process from the catalog
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Process {
    /// Process id
    pub id: ProcessId,
    /// Display name
    pub name: String,
    /// Publication status
    pub status: ProcessStatus,
    /// Template processes are not offered globally
    #[serde(default)]
    pub is_template: bool,
    /// Number of sequential steps (>= 1)
    pub steps: u32,
    /// Optional per-step participant rules
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub step_policies: Vec<StepPolicy>,
}

impl Process {
    /// New active, non-template process
    #[must_use]
    pub fn new(id: ProcessId, name: impl Into<String>, steps: u32) -> Self {
        Self {
            id,
            name: name.into(),
            status: ProcessStatus::Active,
            is_template: false,
            steps,
            step_policies: Vec::new(),
        }
    }

    /// With status
    #[inline]
    #[must_use]
    pub fn with_status(mut self, status: ProcessStatus) -> Self {
        self.status = status;
        self
    }

    /// Mark as template
    #[inline]
    #[must_use]
    pub fn as_template(mut self) -> Self {
        self.is_template = true;
        self
    }

    /// With step policies
    #[inline]
    #[must_use]
    pub fn with_policies(mut self, policies: Vec<StepPolicy>) -> Self {
        self.step_policies = policies;
        self
    }

    /// Only active processes may be started
    #[inline]
    #[must_use]
    pub fn is_runnable(&self) -> bool {
        self.status == ProcessStatus::Active
    }

    /// Offered to every company (active and not a template)
    #[inline]
    #[must_use]
    pub fn is_globally_available(&self) -> bool {
        self.is_runnable() && !self.is_template
    }

    /// Snapshot handed to an approval run
    ///
    /// # Errors
    /// Same as [`ProcessRef::new`] and [`ProcessRef::with_policies`]
    pub fn to_ref(&self) -> Result<ProcessRef, ModelError> {
        ProcessRef::new(self.name.clone(), self.steps)?.with_policies(self.step_policies.clone())
    }
}

/// Process snapshot assigned to documents when a run starts
///
/// The step count is copied here once; later catalog edits do not reach
/// documents already in flight.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "RawProcessRef")]
pub struct ProcessRef {
    name: String,
    total_steps: u32,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    step_policies: Vec<StepPolicy>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawProcessRef {
    name: String,
    total_steps: u32,
    #[serde(default)]
    step_policies: Vec<StepPolicy>,
}

impl TryFrom<RawProcessRef> for ProcessRef {
    type Error = ModelError;

    fn try_from(raw: RawProcessRef) -> Result<Self, Self::Error> {
        ProcessRef::new(raw.name, raw.total_steps)?.with_policies(raw.step_policies)
    }
}

impl ProcessRef {
    /// Create a process reference
    ///
    /// # Errors
    /// - [`ModelError::EmptyProcessName`] for a blank name
    /// - [`ModelError::InvalidStepCount`] when `total_steps` is zero
    pub fn new(name: impl Into<String>, total_steps: u32) -> Result<Self, ModelError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(ModelError::EmptyProcessName);
        }
        if total_steps == 0 {
            return Err(ModelError::InvalidStepCount(total_steps));
        }
        Ok(Self {
            name,
            total_steps,
            step_policies: Vec::new(),
        })
    }

    /// With step policies, one per step from the first
    ///
    /// # Errors
    /// - [`ModelError::TooManyPolicies`] when there are more policies than steps
    /// - any error of [`StepPolicy::validate`]
    pub fn with_policies(mut self, policies: Vec<StepPolicy>) -> Result<Self, ModelError> {
        if policies.len() > self.total_steps as usize {
            return Err(ModelError::TooManyPolicies {
                policies: policies.len(),
                steps: self.total_steps,
            });
        }
        policies.iter().try_for_each(StepPolicy::validate)?;
        self.step_policies = policies;
        Ok(self)
    }

    /// Process name
    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Step count
    #[inline]
    #[must_use]
    pub fn total_steps(&self) -> u32 {
        self.total_steps
    }

    /// Policy for a 1-based step, if configured
    #[must_use]
    pub fn policy_for(&self, step: u32) -> Option<&StepPolicy> {
        step.checked_sub(1)
            .and_then(|idx| self.step_policies.get(idx as usize))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rule::StepRule;

    fn pid(s: &str) -> ProcessId {
        ProcessId::new(s).unwrap()
    }

    #[test]
    fn process_ref_rejects_zero_steps() {
        assert_eq!(
            ProcessRef::new("p", 0).unwrap_err(),
            ModelError::InvalidStepCount(0)
        );
        assert_eq!(ProcessRef::new(" ", 2).unwrap_err(), ModelError::EmptyProcessName);
    }

    #[test]
    fn runnable_only_when_active() {
        let p = Process::new(pid("p1"), "Review", 2);
        assert!(p.is_runnable());
        assert!(!p.clone().with_status(ProcessStatus::Draft).is_runnable());
        assert!(!p.with_status(ProcessStatus::Archived).is_runnable());
    }

    #[test]
    fn templates_are_not_globally_available() {
        let p = Process::new(pid("p1"), "Review", 2).as_template();
        assert!(p.is_runnable());
        assert!(!p.is_globally_available());
    }

    #[test]
    fn to_ref_copies_steps_and_policies() {
        let policy = StepPolicy::new(vec!["chief".into()], vec![StepRule::AllRequired]);
        let p = Process::new(pid("p1"), "Review", 2).with_policies(vec![policy.clone()]);
        let r = p.to_ref().unwrap();

        assert_eq!(r.name(), "Review");
        assert_eq!(r.total_steps(), 2);
        assert_eq!(r.policy_for(1), Some(&policy));
        assert_eq!(r.policy_for(2), None);
        assert_eq!(r.policy_for(0), None);
    }

    #[test]
    fn to_ref_rejects_surplus_policies() {
        let policy = StepPolicy::new(vec![], vec![StepRule::AnyApproves]);
        let p = Process::new(pid("p1"), "Review", 1).with_policies(vec![policy.clone(), policy]);
        assert_eq!(
            p.to_ref().unwrap_err(),
            ModelError::TooManyPolicies {
                policies: 2,
                steps: 1
            }
        );
    }

    #[test]
    fn to_ref_validates_each_policy() {
        let policy = StepPolicy::new(vec!["a".into()], vec![StepRule::Quorum { approvals: 2 }]);
        let p = Process::new(pid("p1"), "Review", 2).with_policies(vec![policy]);
        assert!(matches!(
            p.to_ref(),
            Err(ModelError::QuorumExceedsParticipants { .. })
        ));
    }

    #[test]
    fn process_ref_json_is_validated() {
        let raw = serde_json::json!({
            "name": "Review",
            "totalSteps": 1,
            "stepPolicies": [{
                "participants": [],
                "rules": [{ "rule": "quorum", "approvals": 0 }],
            }],
        });
        let err = serde_json::from_value::<ProcessRef>(raw).unwrap_err();
        assert!(err.to_string().contains("quorum"));
    }

    #[test]
    fn process_deserializes_from_catalog_json() {
        let p: Process = serde_json::from_str(
            r#"{"id":"proc-1","name":"Estimate review","status":"active",
                "isTemplate":true,"steps":2}"#,
        )
        .unwrap();
        assert!(p.is_template);
        assert_eq!(p.status, ProcessStatus::Active);
        assert!(p.step_policies.is_empty());
    }
}
