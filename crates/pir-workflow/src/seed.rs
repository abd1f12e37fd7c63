//! Seed data: catalog, company grants and initial documents
//!
//! Seeds are read from TOML or JSON (picked by file extension). [`Seed::demo`]
//! returns the built-in data set used by the CLI when no seed file is given.

use crate::access::CompanyGrants;
use crate::catalog::ProcessCatalog;
use crate::error::WorkflowError;
use crate::store::DocumentStore;
use chrono::{DateTime, TimeZone, Utc};
use pir_model::{
    Document, DocumentId, DocumentState, Process, ProcessId, ProcessStatus, ProjectId, StepPolicy,
    StepRule,
};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Initial state of the system
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Seed {
    /// Process catalog, in order
    pub processes: Vec<Process>,
    /// Company -> granted process ids
    pub grants: CompanyGrants,
    /// Documents, in insertion order
    pub documents: Vec<Document>,
}

impl Seed {
    /// Load a seed file (`.json`, otherwise TOML)
    ///
    /// # Errors
    /// Returns [`WorkflowError::Config`] if the file cannot be read or parsed
    pub fn load_from_file(path: &Path) -> Result<Self, WorkflowError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| WorkflowError::Config(format!("{}: {e}", path.display())))?;

        let is_json = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
        let seed = if is_json {
            serde_json::from_str(&content).map_err(|e| WorkflowError::Config(e.to_string()))?
        } else {
            toml::from_str(&content).map_err(|e| WorkflowError::Config(e.to_string()))?
        };
        tracing::debug!(path = %path.display(), "seed loaded");
        Ok(seed)
    }

    /// Build the catalog and document store
    ///
    /// # Errors
    /// Propagates catalog and store validation errors
    pub fn into_parts(
        self,
    ) -> Result<(ProcessCatalog, CompanyGrants, DocumentStore), WorkflowError> {
        let catalog = ProcessCatalog::new(self.processes)?;
        let store = DocumentStore::with_documents(self.documents)?;
        Ok((catalog, self.grants, store))
    }

    /// Built-in demo data
    ///
    /// # Errors
    /// Only if one of the built-in literals were invalid
    pub fn demo() -> Result<Self, WorkflowError> {
        let processes = vec![
            Process::new(pid("proc-1")?, "Estimate approval", 2).as_template(),
            Process::new(pid("proc-2")?, "Working documentation review", 3).with_policies(vec![
                StepPolicy::new(
                    vec!["designer".into(), "gip".into()],
                    vec![StepRule::AllRequired, StepRule::AutoReject],
                ),
                StepPolicy::new(
                    vec!["expert-1".into(), "expert-2".into(), "expert-3".into()],
                    vec![StepRule::quorum(2)?],
                ),
                StepPolicy::new(
                    vec!["customer".into(), "director".into()],
                    vec![
                        StepRule::AnyApproves,
                        StepRule::CanFinish {
                            participant: "director".into(),
                        },
                    ],
                ),
            ]),
            Process::new(pid("proc-3")?, "Design documentation approval", 2),
            Process::new(pid("proc-4")?, "Executive documentation acceptance", 3)
                .with_status(ProcessStatus::Draft),
            Process::new(pid("proc-5")?, "Legacy contract approval", 1)
                .with_status(ProcessStatus::Archived),
        ];

        let grants = CompanyGrants::new()
            .with_grant("setlgroup", pid("proc-1")?)
            .with_grant("setlgroup", pid("proc-4")?)
            .with_grant("pik", pid("proc-5")?);

        let mut in_review = demo_doc(
            "doc-2",
            "prj-1",
            "Foundation working drawings",
            "drawing",
            12_400_120,
            day(5)?,
        )?
        .with_version("2.1");
        in_review.begin_approval(&processes[1].to_ref()?);
        if let Some(info) = in_review.process_info_mut() {
            info.step_forward();
        }

        let documents = vec![
            demo_doc("doc-1", "prj-1", "General site plan", "drawing", 4_812_331, day(3)?)?,
            in_review,
            demo_doc("doc-3", "prj-1", "Local estimate no. 12", "estimate", 381_004, day(8)?)?
                .with_state(DocumentState::Approved),
            demo_doc("doc-4", "prj-2", "Hidden works act", "act", 95_200, day(10)?)?
                .with_state(DocumentState::Rejected),
            demo_doc("doc-5", "prj-2", "Facade color scheme", "drawing", 2_045_000, day(12)?)?,
            demo_doc("doc-9", "prj-3", "Utility networks estimate", "estimate", 512_770, day(15)?)?
                .with_description("Stage 2, external networks"),
        ];

        Ok(Self {
            processes,
            grants,
            documents,
        })
    }
}

fn pid(s: &str) -> Result<ProcessId, WorkflowError> {
    Ok(ProcessId::new(s)?)
}

fn day(d: u32) -> Result<DateTime<Utc>, WorkflowError> {
    Utc.with_ymd_and_hms(2024, 3, d, 9, 30, 0)
        .single()
        .ok_or_else(|| WorkflowError::Config(format!("invalid demo date: 2024-03-{d}")))
}

fn demo_doc(
    id: &str,
    project: &str,
    name: &str,
    doc_type: &str,
    size: u64,
    uploaded: DateTime<Utc>,
) -> Result<Document, WorkflowError> {
    Ok(Document::draft(DocumentId::new(id)?, ProjectId::new(project)?, name, "A. Kuznetsov")
        .with_type(doc_type)
        .with_size(size)
        .with_upload_date(uploaded))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pir_model::DocumentStatus;
    use std::io::Write;

    #[test]
    fn demo_builds() {
        let (catalog, grants, store) = Seed::demo().unwrap().into_parts().unwrap();
        assert_eq!(catalog.len(), 5);
        assert_eq!(grants.for_company("setlgroup").len(), 2);
        assert_eq!(store.len(), 6);

        let doc2 = store.get(&DocumentId::new("doc-2").unwrap()).unwrap();
        assert_eq!(doc2.process_info().unwrap().current_step(), 2);
        assert_eq!(doc2.version, "2.1");
    }

    #[test]
    fn demo_dates_must_exist() {
        assert_eq!(day(5).unwrap().to_rfc3339(), "2024-03-05T09:30:00+00:00");
        assert!(matches!(day(32), Err(WorkflowError::Config(_))));
    }

    #[test]
    fn seed_toml_roundtrip_through_file() {
        let toml_text = r#"
            [[processes]]
            id = "p1"
            name = "Review"
            status = "active"
            steps = 2

            [grants]
            acme = ["p1"]

            [[documents]]
            id = "d1"
            projectId = "prj-1"
            name = "Plan"
            type = "drawing"
            size = 10
            version = "1.0"
            author = "Ivanov"
            uploadDate = "2024-03-01T10:00:00Z"
            status = "draft"
        "#;
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        file.write_all(toml_text.as_bytes()).unwrap();

        let seed = Seed::load_from_file(file.path()).unwrap();
        assert_eq!(seed.processes.len(), 1);
        assert_eq!(seed.documents[0].status(), DocumentStatus::Draft);
        assert_eq!(seed.grants.for_company("acme").len(), 1);
    }

    #[test]
    fn seed_json_is_detected_by_extension() {
        let json = serde_json::to_string(&Seed::demo().unwrap()).unwrap();
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        file.write_all(json.as_bytes()).unwrap();

        let seed = Seed::load_from_file(file.path()).unwrap();
        assert_eq!(seed.documents.len(), 6);
        assert_eq!(seed.processes[1].step_policies.len(), 3);
    }

    #[test]
    fn missing_seed_is_config_error() {
        let err = Seed::load_from_file(Path::new("/nonexistent/seed.toml")).unwrap_err();
        assert!(matches!(err, WorkflowError::Config(_)));
    }
}
