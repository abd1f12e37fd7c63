//! Project documents and their approval lifecycle
//!
//! A document's lifecycle is carried by [`DocumentState`]. Process progress
//! only exists inside the `OnApproval` variant, so a draft, approved or
//! rejected document cannot hold a step counter.

use crate::error::ModelError;
use crate::ids::{DocumentId, ProjectId};
use crate::process::ProcessRef;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Coarse document status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DocumentStatus {
    /// Uploaded, not yet sent for approval
    Draft,
    /// Moving through an approval process
    OnApproval,
    /// Approval finished successfully
    Approved,
    /// Approval ended with a rejection
    Rejected,
}

impl DocumentStatus {
    /// All statuses, in lifecycle order
    pub const ALL: [DocumentStatus; 4] = [
        DocumentStatus::Draft,
        DocumentStatus::OnApproval,
        DocumentStatus::Approved,
        DocumentStatus::Rejected,
    ];

    /// Wire name (`on-approval`, ...)
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentStatus::Draft => "draft",
            DocumentStatus::OnApproval => "on-approval",
            DocumentStatus::Approved => "approved",
            DocumentStatus::Rejected => "rejected",
        }
    }

    /// Approved and rejected end an approval run
    #[inline]
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, DocumentStatus::Approved | DocumentStatus::Rejected)
    }
}

impl fmt::Display for DocumentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// Progress of a document through its assigned process
///
/// Steps are 1-based and `1 <= current_step <= total_steps` always holds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "RawProcessInfo")]
pub struct ProcessInfo {
    process_name: String,
    current_step: u32,
    total_steps: u32,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawProcessInfo {
    process_name: String,
    current_step: u32,
    total_steps: u32,
}

impl TryFrom<RawProcessInfo> for ProcessInfo {
    type Error = ModelError;

    fn try_from(raw: RawProcessInfo) -> Result<Self, Self::Error> {
        if raw.total_steps == 0 {
            return Err(ModelError::InvalidStepCount(0));
        }
        if raw.current_step == 0 || raw.current_step > raw.total_steps {
            return Err(ModelError::InvalidStepCount(raw.current_step));
        }
        Ok(Self {
            process_name: raw.process_name,
            current_step: raw.current_step,
            total_steps: raw.total_steps,
        })
    }
}

impl ProcessInfo {
    /// Progress at step 1 of a fresh run
    #[must_use]
    pub fn start(process: &ProcessRef) -> Self {
        Self {
            process_name: process.name().to_string(),
            current_step: 1,
            total_steps: process.total_steps(),
        }
    }

    /// Name of the assigned process
    #[inline]
    #[must_use]
    pub fn process_name(&self) -> &str {
        &self.process_name
    }

    /// Current step (1-based)
    #[inline]
    #[must_use]
    pub fn current_step(&self) -> u32 {
        self.current_step
    }

    /// Step count fixed when the run started
    #[inline]
    #[must_use]
    pub fn total_steps(&self) -> u32 {
        self.total_steps
    }

    /// Whether the run is on its last step
    #[inline]
    #[must_use]
    pub fn is_final_step(&self) -> bool {
        self.current_step == self.total_steps
    }

    /// Move to the next step
    ///
    /// Returns `false` without changing anything when already on the last step.
    pub fn step_forward(&mut self) -> bool {
        if self.is_final_step() {
            return false;
        }
        self.current_step += 1;
        true
    }
}

/// Lifecycle state of a document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "kebab-case")]
pub enum DocumentState {
    /// Not yet submitted
    Draft,
    /// Under approval
    OnApproval {
        /// Run progress
        #[serde(rename = "processInfo")]
        process_info: ProcessInfo,
    },
    /// Approved (terminal)
    Approved,
    /// Rejected (terminal)
    Rejected,
}

impl DocumentState {
    /// Coarse status of this state
    #[must_use]
    pub fn status(&self) -> DocumentStatus {
        match self {
            DocumentState::Draft => DocumentStatus::Draft,
            DocumentState::OnApproval { .. } => DocumentStatus::OnApproval,
            DocumentState::Approved => DocumentStatus::Approved,
            DocumentState::Rejected => DocumentStatus::Rejected,
        }
    }
}

/// A project document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    /// Document id
    pub id: DocumentId,
    /// Owning project
    pub project_id: ProjectId,
    /// Display name
    pub name: String,
    /// Free-form description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Document kind (drawing, estimate, act, ...)
    #[serde(rename = "type")]
    pub doc_type: String,
    /// Size in bytes
    pub size: u64,
    /// Version label
    pub version: String,
    /// Uploader
    pub author: String,
    /// Upload time
    pub upload_date: DateTime<Utc>,
    #[serde(flatten)]
    state: DocumentState,
}

impl Document {
    /// New draft document uploaded now
    #[must_use]
    pub fn draft(
        id: DocumentId,
        project_id: ProjectId,
        name: impl Into<String>,
        author: impl Into<String>,
    ) -> Self {
        Self {
            id,
            project_id,
            name: name.into(),
            description: None,
            doc_type: "other".to_string(),
            size: 0,
            version: "1.0".to_string(),
            author: author.into(),
            upload_date: Utc::now(),
            state: DocumentState::Draft,
        }
    }

    /// With description
    #[inline]
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// With document kind
    #[inline]
    #[must_use]
    pub fn with_type(mut self, doc_type: impl Into<String>) -> Self {
        self.doc_type = doc_type.into();
        self
    }

    /// With size in bytes
    #[inline]
    #[must_use]
    pub fn with_size(mut self, size: u64) -> Self {
        self.size = size;
        self
    }

    /// With version label
    #[inline]
    #[must_use]
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    /// With upload time
    #[inline]
    #[must_use]
    pub fn with_upload_date(mut self, upload_date: DateTime<Utc>) -> Self {
        self.upload_date = upload_date;
        self
    }

    /// With lifecycle state (seeding)
    #[inline]
    #[must_use]
    pub fn with_state(mut self, state: DocumentState) -> Self {
        self.state = state;
        self
    }

    /// Lifecycle state
    #[inline]
    #[must_use]
    pub fn state(&self) -> &DocumentState {
        &self.state
    }

    /// Coarse status
    #[inline]
    #[must_use]
    pub fn status(&self) -> DocumentStatus {
        self.state.status()
    }

    /// Process progress, present only while on approval
    #[inline]
    #[must_use]
    pub fn process_info(&self) -> Option<&ProcessInfo> {
        match &self.state {
            DocumentState::OnApproval { process_info } => Some(process_info),
            _ => None,
        }
    }

    /// Mutable process progress, present only while on approval
    #[inline]
    pub fn process_info_mut(&mut self) -> Option<&mut ProcessInfo> {
        match &mut self.state {
            DocumentState::OnApproval { process_info } => Some(process_info),
            _ => None,
        }
    }

    /// Put the document on approval at step 1, replacing any run in flight
    ///
    /// Returns the status held before the call.
    pub fn begin_approval(&mut self, process: &ProcessRef) -> DocumentStatus {
        let previous = self.status();
        self.state = DocumentState::OnApproval {
            process_info: ProcessInfo::start(process),
        };
        previous
    }

    /// Finish as approved, clearing process progress
    pub fn mark_approved(&mut self) {
        self.state = DocumentState::Approved;
    }

    /// Finish as rejected, clearing process progress
    pub fn mark_rejected(&mut self) {
        self.state = DocumentState::Rejected;
    }
}
