//! Process catalog
//!
//! Immutable list of approval process definitions, kept in catalog order.

use crate::error::WorkflowError;
use pir_model::{Process, ProcessId};
use std::collections::HashMap;

/// Read-only catalog of approval processes
#[derive(Debug, Clone, Default)]
pub struct ProcessCatalog {
    processes: Vec<Process>,
    by_id: HashMap<ProcessId, usize>,
}

impl ProcessCatalog {
    /// Build a catalog from definitions
    ///
    /// # Errors
    /// - [`WorkflowError::DuplicateProcess`] if an id repeats
    /// - [`WorkflowError::Model`] if a process has zero steps, a blank name
    ///   or step policies that do not fit its steps
    pub fn new(processes: Vec<Process>) -> Result<Self, WorkflowError> {
        let mut by_id = HashMap::with_capacity(processes.len());
        for (idx, process) in processes.iter().enumerate() {
            process.to_ref()?;
            if by_id.insert(process.id.clone(), idx).is_some() {
                return Err(WorkflowError::DuplicateProcess(process.id.clone()));
            }
        }
        Ok(Self { processes, by_id })
    }

    /// Look up a process by id
    #[inline]
    #[must_use]
    pub fn get(&self, id: &ProcessId) -> Option<&Process> {
        self.by_id.get(id).map(|&idx| &self.processes[idx])
    }

    /// All processes in catalog order
    #[inline]
    #[must_use]
    pub fn list(&self) -> &[Process] {
        &self.processes
    }

    /// Number of processes
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.processes.len()
    }

    /// Whether the catalog is empty
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.processes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pir_model::{ModelError, ProcessStatus, StepPolicy, StepRule};

    fn pid(s: &str) -> ProcessId {
        ProcessId::new(s).unwrap()
    }

    #[test]
    fn catalog_preserves_order() {
        let catalog = ProcessCatalog::new(vec![
            Process::new(pid("b"), "B", 1),
            Process::new(pid("a"), "A", 2),
        ])
        .unwrap();

        let names: Vec<_> = catalog.list().iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, ["B", "A"]);
        assert_eq!(catalog.len(), 2);
    }

    #[test]
    fn catalog_get() {
        let catalog = ProcessCatalog::new(vec![
            Process::new(pid("p1"), "Review", 3).with_status(ProcessStatus::Draft),
        ])
        .unwrap();

        assert_eq!(catalog.get(&pid("p1")).unwrap().steps, 3);
        assert!(catalog.get(&pid("missing")).is_none());
    }

    #[test]
    fn catalog_rejects_duplicates() {
        let err = ProcessCatalog::new(vec![
            Process::new(pid("p1"), "A", 1),
            Process::new(pid("p1"), "B", 1),
        ])
        .unwrap_err();
        assert!(matches!(err, WorkflowError::DuplicateProcess(id) if id == pid("p1")));
    }

    #[test]
    fn catalog_rejects_zero_steps() {
        let err = ProcessCatalog::new(vec![Process::new(pid("p1"), "A", 0)]).unwrap_err();
        assert!(matches!(err, WorkflowError::Model(ModelError::InvalidStepCount(0))));
    }

    #[test]
    fn catalog_rejects_invalid_policies() {
        let policy: StepPolicy = serde_json::from_str(
            r#"{"participants":["a","b"],"rules":[{"rule":"quorum","approvals":0}]}"#,
        )
        .unwrap();
        let err = ProcessCatalog::new(vec![
            Process::new(pid("p1"), "A", 1).with_policies(vec![policy]),
        ])
        .unwrap_err();
        assert!(matches!(err, WorkflowError::Model(ModelError::ZeroQuorum)));

        let any = StepPolicy::new(vec![], vec![StepRule::AnyApproves]);
        let err = ProcessCatalog::new(vec![
            Process::new(pid("p1"), "A", 1).with_policies(vec![any.clone(), any]),
        ])
        .unwrap_err();
        assert!(matches!(err, WorkflowError::Model(ModelError::TooManyPolicies { .. })));
    }

    #[test]
    fn empty_catalog() {
        assert!(ProcessCatalog::default().is_empty());
    }
}
