//! Testing utilities for the pir workspace
//!
//! Shared fixtures for engine, store and catalog tests.

#![allow(missing_docs)]

use chrono::{TimeZone, Utc};
use pir_model::{Document, DocumentId, Process, ProcessId, ProcessRef, ProjectId, StepPolicy};
use pir_workflow::{
    AccessResolver, ApprovalEngine, CompanyGrants, DocumentStore, PirConfig, ProcessCatalog, Seed,
};
use std::sync::Arc;

pub fn doc_id(id: &str) -> DocumentId {
    DocumentId::new(id).unwrap()
}

pub fn process_id(id: &str) -> ProcessId {
    ProcessId::new(id).unwrap()
}

/// Draft document in `project` with a fixed upload date
pub fn draft_doc(id: &str, project: &str) -> Document {
    let project = ProjectId::new(project).unwrap();
    Document::draft(doc_id(id), project, format!("Document {id}"), "Tester")
        .with_type("drawing")
        .with_size(1024)
        .with_upload_date(Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap())
}

pub fn store_with(ids: &[&str]) -> DocumentStore {
    DocumentStore::with_documents(ids.iter().map(|id| draft_doc(id, "prj-1"))).unwrap()
}

pub fn linear_process(name: &str, steps: u32) -> ProcessRef {
    ProcessRef::new(name, steps).unwrap()
}

pub fn policy_process(name: &str, policies: Vec<StepPolicy>) -> ProcessRef {
    let steps = u32::try_from(policies.len()).unwrap().max(1);
    ProcessRef::new(name, steps).unwrap().with_policies(policies).unwrap()
}

/// Config without simulated latency
pub fn fast_config() -> PirConfig {
    PirConfig::new().with_latency_ms(0)
}

/// Engine over the built-in demo seed, no latency
pub fn demo_engine() -> ApprovalEngine {
    ApprovalEngine::from_seed(Seed::demo().unwrap(), &fast_config()).unwrap()
}

/// Engine over drafts `ids` with the given catalog and grants
pub fn engine_with(
    ids: &[&str],
    processes: Vec<Process>,
    grants: CompanyGrants,
    config: &PirConfig,
) -> ApprovalEngine {
    let catalog = ProcessCatalog::new(processes).unwrap();
    let access = AccessResolver::new(Arc::new(catalog), grants);
    ApprovalEngine::new(Arc::new(store_with(ids)), access, config)
}

/// Engine over drafts `ids` with an empty catalog
pub fn simple_engine(ids: &[&str]) -> ApprovalEngine {
    engine_with(ids, Vec::new(), CompanyGrants::new(), &fast_config())
}
