//! Access resolution: which processes a company may initiate
//!
//! A company sees the union of
//! - processes explicitly granted to it (any status, templates included)
//! - every active, non-template process in the catalog
//!
//! deduplicated by id, grants first. Unknown or absent companies see only the
//! global set.

use crate::catalog::ProcessCatalog;
use indexmap::IndexMap;
use pir_model::{Process, ProcessId};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;

/// Static company -> process grants
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CompanyGrants {
    grants: IndexMap<String, Vec<ProcessId>>,
}

impl CompanyGrants {
    /// Empty grant table
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Grant `process` to `company`
    pub fn grant(&mut self, company: impl Into<String>, process: ProcessId) {
        let entry = self.grants.entry(company.into()).or_default();
        if !entry.contains(&process) {
            entry.push(process);
        }
    }

    /// Builder form of [`CompanyGrants::grant`]
    #[inline]
    #[must_use]
    pub fn with_grant(mut self, company: impl Into<String>, process: ProcessId) -> Self {
        self.grant(company, process);
        self
    }

    /// Processes granted to `company`, in grant order
    #[must_use]
    pub fn for_company(&self, company: &str) -> &[ProcessId] {
        self.grants.get(company).map_or(&[], Vec::as_slice)
    }

    /// Companies with at least one grant
    pub fn companies(&self) -> impl Iterator<Item = &str> {
        self.grants.keys().map(String::as_str)
    }
}

/// Resolves accessible processes against a catalog
#[derive(Debug, Clone)]
pub struct AccessResolver {
    catalog: Arc<ProcessCatalog>,
    grants: CompanyGrants,
}

impl AccessResolver {
    /// Create resolver
    #[must_use]
    pub fn new(catalog: Arc<ProcessCatalog>, grants: CompanyGrants) -> Self {
        Self { catalog, grants }
    }

    /// Underlying catalog
    #[inline]
    #[must_use]
    pub fn catalog(&self) -> &ProcessCatalog {
        &self.catalog
    }

    /// Grant table
    #[inline]
    #[must_use]
    pub fn grants(&self) -> &CompanyGrants {
        &self.grants
    }

    /// Processes `company` may initiate
    ///
    /// Grants pointing at ids missing from the catalog are ignored.
    #[must_use]
    pub fn accessible_processes(&self, company: Option<&str>) -> Vec<&Process> {
        let granted = company
            .map(|c| self.grants.for_company(c))
            .unwrap_or_default()
            .iter()
            .filter_map(|id| self.catalog.get(id));

        let global = self
            .catalog
            .list()
            .iter()
            .filter(|p| p.is_globally_available());

        let mut seen = HashSet::new();
        granted
            .chain(global)
            .filter(|&p| seen.insert(&p.id))
            .collect()
    }

    /// Whether `company` may initiate `process`
    #[must_use]
    pub fn can_initiate(&self, company: Option<&str>, process: &ProcessId) -> bool {
        self.accessible_processes(company)
            .iter()
            .any(|p| &p.id == process)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pir_model::ProcessStatus;

    fn pid(s: &str) -> ProcessId {
        ProcessId::new(s).unwrap()
    }

    fn resolver() -> AccessResolver {
        let catalog = ProcessCatalog::new(vec![
            Process::new(pid("active"), "Active", 2),
            Process::new(pid("template"), "Template", 2).as_template(),
            Process::new(pid("draft"), "Draft", 1).with_status(ProcessStatus::Draft),
            Process::new(pid("other"), "Other", 3),
        ])
        .unwrap();
        let grants = CompanyGrants::new()
            .with_grant("acme", pid("template"))
            .with_grant("acme", pid("active"))
            .with_grant("acme", pid("ghost"));
        AccessResolver::new(Arc::new(catalog), grants)
    }

    fn ids(processes: &[&Process]) -> Vec<String> {
        processes.iter().map(|p| p.id.to_string()).collect()
    }

    #[test]
    fn absent_company_sees_global_set() {
        let r = resolver();
        assert_eq!(ids(&r.accessible_processes(None)), ["active", "other"]);
    }

    #[test]
    fn unknown_company_sees_global_set() {
        let r = resolver();
        assert_eq!(ids(&r.accessible_processes(Some("nobody"))), ["active", "other"]);
    }

    #[test]
    fn grants_surface_templates_without_duplicates() {
        let r = resolver();
        assert_eq!(
            ids(&r.accessible_processes(Some("acme"))),
            ["template", "active", "other"]
        );
    }

    #[test]
    fn can_initiate_follows_resolution() {
        let r = resolver();
        assert!(r.can_initiate(Some("acme"), &pid("template")));
        assert!(!r.can_initiate(None, &pid("template")));
        assert!(!r.can_initiate(Some("acme"), &pid("draft")));
    }

    #[test]
    fn grant_is_idempotent() {
        let mut grants = CompanyGrants::new();
        grants.grant("a", pid("p"));
        grants.grant("a", pid("p"));
        assert_eq!(grants.for_company("a").len(), 1);
        assert_eq!(grants.companies().collect::<Vec<_>>(), ["a"]);
    }
}
