//! Approval engine
//!
//! Drives documents through `draft -> on-approval -> approved | rejected`.
//!
//! # Entry points
//!
//! - [`ApprovalEngine::start_approval`]: best-effort batch start; unknown ids
//!   are skipped, in-flight runs are replaced
//! - [`ApprovalEngine::advance`]: one step forward; misses are silent no-ops
//! - [`ApprovalEngine::try_advance`] / [`ApprovalEngine::start_process`]:
//!   the same operations with explicit errors
//! - [`ApprovalEngine::respond`]: participant responses evaluated by the
//!   step rules; the only way a document becomes rejected
//!
//! Every operation waits the configured latency and then runs its whole
//! read-modify-write on a spawned task while holding the record lock. A
//! caller dropping the future does not stop the mutation.

use crate::access::AccessResolver;
use crate::catalog::ProcessCatalog;
use crate::config::PirConfig;
use crate::error::WorkflowError;
use crate::journal::{Journal, JournalAction, JournalEntry};
use crate::rules::{linear_verdict, RuleEvaluator, StepContext};
use crate::seed::Seed;
use crate::state_machine::validate_transition;
use crate::store::DocumentStore;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use pir_model::{
    Decision, Document, DocumentId, DocumentStatus, ProcessId, ProcessRef, Response, Verdict,
};
use serde::Serialize;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;

/// Result of [`ApprovalEngine::advance`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AdvanceOutcome {
    /// Moved to the next step (or nothing to do)
    Advanced,
    /// Final step passed, document approved
    Approved,
}

/// Result of [`ApprovalEngine::respond`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "lowercase")]
pub enum RespondOutcome {
    /// Step still waiting for responses
    Pending {
        /// Current step
        step: u32,
    },
    /// Step done, now on `step`
    Advanced {
        /// New current step
        step: u32,
    },
    /// Process finished, document approved
    Approved,
    /// Document rejected
    Rejected,
}

/// Per-id result of a batch start
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StartReport {
    /// Documents put on approval
    pub started: Vec<DocumentId>,
    /// Ids that did not resolve in the store
    pub skipped: Vec<DocumentId>,
}

/// Process snapshot and responses of a document's current run
#[derive(Debug, Clone)]
struct RunState {
    process: ProcessRef,
    responses: Vec<Response>,
}

impl RunState {
    fn new(process: ProcessRef) -> Self {
        Self {
            process,
            responses: Vec::new(),
        }
    }

    fn record(&mut self, participant: &str, decision: Decision) {
        self.responses.retain(|r| r.participant != participant);
        self.responses.push(Response {
            participant: participant.to_string(),
            decision,
        });
    }
}

#[derive(Debug)]
struct EngineInner {
    store: Arc<DocumentStore>,
    access: AccessResolver,
    journal: Journal,
    runs: DashMap<DocumentId, RunState>,
    events: broadcast::Sender<JournalEntry>,
    latency: Duration,
}

/// Approval workflow engine
///
/// Cheap to clone; clones share the same store, journal and event channel.
#[derive(Debug, Clone)]
pub struct ApprovalEngine {
    inner: Arc<EngineInner>,
}

impl ApprovalEngine {
    /// Create engine over an existing store
    #[must_use]
    pub fn new(store: Arc<DocumentStore>, access: AccessResolver, config: &PirConfig) -> Self {
        let (events, _) = broadcast::channel(config.event_buffer.max(1));
        Self {
            inner: Arc::new(EngineInner {
                store,
                access,
                journal: Journal::new(),
                runs: DashMap::new(),
                events,
                latency: config.latency(),
            }),
        }
    }

    /// Build catalog, store and engine from a seed
    ///
    /// # Errors
    /// Propagates seed validation errors
    pub fn from_seed(seed: Seed, config: &PirConfig) -> Result<Self, WorkflowError> {
        let (catalog, grants, store) = seed.into_parts()?;
        let access = AccessResolver::new(Arc::new(catalog), grants);
        Ok(Self::new(Arc::new(store), access, config))
    }

    /// Document store
    #[inline]
    #[must_use]
    pub fn store(&self) -> &Arc<DocumentStore> {
        &self.inner.store
    }

    /// Access resolver
    #[inline]
    #[must_use]
    pub fn access(&self) -> &AccessResolver {
        &self.inner.access
    }

    /// Process catalog
    #[inline]
    #[must_use]
    pub fn catalog(&self) -> &ProcessCatalog {
        self.inner.access.catalog()
    }

    /// Transition journal
    #[inline]
    #[must_use]
    pub fn journal(&self) -> &Journal {
        &self.inner.journal
    }

    /// Subscribe to applied transitions
    ///
    /// Delivery is best-effort: a receiver that falls more than the
    /// configured buffer behind loses the oldest events.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<JournalEntry> {
        self.inner.events.subscribe()
    }

    /// Put documents on approval at step 1
    ///
    /// Ids missing from the store are skipped; the rest are started even if
    /// they were already on approval.
    ///
    /// # Errors
    /// Only [`WorkflowError::TaskFailed`] if the background task died
    pub async fn start_approval(
        &self,
        ids: &[DocumentId],
        process: ProcessRef,
    ) -> Result<StartReport, WorkflowError> {
        let ids = ids.to_vec();
        self.detached(move |inner| inner.apply_start(&ids, &process))
            .await
    }

    /// Start a catalog process on behalf of a company
    ///
    /// # Errors
    /// - [`WorkflowError::UnknownProcess`] if the id is not in the catalog
    /// - [`WorkflowError::ProcessNotRunnable`] if the process is not active
    /// - [`WorkflowError::NotGranted`] if the company may not initiate it
    pub async fn start_process(
        &self,
        company: Option<&str>,
        process_id: &ProcessId,
        ids: &[DocumentId],
    ) -> Result<StartReport, WorkflowError> {
        let process = self
            .catalog()
            .get(process_id)
            .ok_or_else(|| WorkflowError::UnknownProcess(process_id.clone()))?;

        if !process.is_runnable() {
            return Err(WorkflowError::ProcessNotRunnable(process_id.clone()));
        }
        if !self.access().can_initiate(company, process_id) {
            return Err(WorkflowError::NotGranted {
                company: company.unwrap_or("<none>").to_string(),
                process: process_id.clone(),
            });
        }

        let process_ref = process.to_ref()?;
        self.start_approval(ids, process_ref).await
    }

    /// Advance a document by one step
    ///
    /// A missing document or one not on approval is left untouched and
    /// reported as [`AdvanceOutcome::Advanced`].
    ///
    /// # Errors
    /// Only [`WorkflowError::TaskFailed`] if the background task died
    pub async fn advance(&self, id: &DocumentId) -> Result<AdvanceOutcome, WorkflowError> {
        match self.try_advance(id).await {
            Err(e @ (WorkflowError::UnknownDocument(_) | WorkflowError::NotOnApproval { .. })) => {
                tracing::debug!(document = %id, reason = %e, "advance ignored");
                Ok(AdvanceOutcome::Advanced)
            }
            other => other,
        }
    }

    /// Advance a document by one step, reporting misses
    ///
    /// # Errors
    /// - [`WorkflowError::UnknownDocument`] if the id does not resolve
    /// - [`WorkflowError::NotOnApproval`] if the document has no running process
    pub async fn try_advance(&self, id: &DocumentId) -> Result<AdvanceOutcome, WorkflowError> {
        let id = id.clone();
        self.detached(move |inner| inner.apply_advance(&id))
            .await?
    }

    /// Record a participant's response on the current step
    ///
    /// Steps with a policy are judged by its rules; steps without one follow
    /// the linear chain (approve moves on, reject rejects).
    ///
    /// # Errors
    /// - [`WorkflowError::UnknownDocument`] if the id does not resolve
    /// - [`WorkflowError::NotOnApproval`] if the document has no running process
    /// - [`WorkflowError::NotAParticipant`] if the step names participants
    ///   and `participant` is not one of them
    pub async fn respond(
        &self,
        id: &DocumentId,
        participant: &str,
        decision: Decision,
    ) -> Result<RespondOutcome, WorkflowError> {
        let id = id.clone();
        let participant = participant.to_string();
        self.detached(move |inner| inner.apply_respond(&id, &participant, decision))
            .await?
    }

    /// Run `f` on a spawned task after the simulated latency
    async fn detached<T, F>(&self, f: F) -> Result<T, WorkflowError>
    where
        T: Send + 'static,
        F: FnOnce(&EngineInner) -> T + Send + 'static,
    {
        let inner = Arc::clone(&self.inner);
        let handle = tokio::spawn(async move {
            if !inner.latency.is_zero() {
                tokio::time::sleep(inner.latency).await;
            }
            f(&inner)
        });
        handle
            .await
            .map_err(|e| WorkflowError::TaskFailed(e.to_string()))
    }
}

impl EngineInner {
    fn apply_start(&self, ids: &[DocumentId], process: &ProcessRef) -> StartReport {
        let mut report = StartReport::default();
        let mut seen = HashSet::new();

        for id in ids.iter().filter(|id| seen.insert(*id)) {
            let applied = self.store.update(id, |doc| {
                let from = doc.status();
                validate_transition(from, DocumentStatus::OnApproval)?;
                doc.begin_approval(process);
                self.runs.insert(id.clone(), RunState::new(process.clone()));
                self.record(doc, JournalAction::Started, process.name(), from);
                Ok::<_, WorkflowError>(from)
            });

            match applied {
                Some(Ok(from)) => {
                    let verb = if from == DocumentStatus::OnApproval {
                        "restarted"
                    } else {
                        "started"
                    };
                    tracing::info!(document = %id, process = process.name(), "approval run {verb}");
                    report.started.push(id.clone());
                }
                Some(Err(e)) => {
                    tracing::warn!(document = %id, error = %e, "approval start refused");
                    report.skipped.push(id.clone());
                }
                None => {
                    tracing::debug!(document = %id, "approval start skipped: unknown document");
                    report.skipped.push(id.clone());
                }
            }
        }
        report
    }

    fn apply_advance(&self, id: &DocumentId) -> Result<AdvanceOutcome, WorkflowError> {
        self.store
            .update(id, |doc| {
                ensure_on_approval(doc)?;
                self.step_or_finish(doc)
            })
            .ok_or_else(|| WorkflowError::UnknownDocument(id.clone()))?
    }

    fn apply_respond(
        &self,
        id: &DocumentId,
        participant: &str,
        decision: Decision,
    ) -> Result<RespondOutcome, WorkflowError> {
        self.store
            .update(id, |doc| {
                ensure_on_approval(doc)?;
                let step = doc.process_info().map_or(1, |info| info.current_step());
                let verdict = self.judge(doc, step, participant, decision)?;

                match verdict {
                    Verdict::Pending => Ok(RespondOutcome::Pending { step }),
                    Verdict::Continue => match self.step_or_finish(doc)? {
                        AdvanceOutcome::Approved => Ok(RespondOutcome::Approved),
                        AdvanceOutcome::Advanced => Ok(RespondOutcome::Advanced {
                            step: doc.process_info().map_or(step, |info| info.current_step()),
                        }),
                    },
                    Verdict::Finish => {
                        self.finish(doc, DocumentStatus::Approved)?;
                        Ok(RespondOutcome::Approved)
                    }
                    Verdict::Reject => {
                        self.finish(doc, DocumentStatus::Rejected)?;
                        Ok(RespondOutcome::Rejected)
                    }
                }
            })
            .ok_or_else(|| WorkflowError::UnknownDocument(id.clone()))?
    }

    /// Record the response and evaluate the current step
    fn judge(
        &self,
        doc: &Document,
        step: u32,
        participant: &str,
        decision: Decision,
    ) -> Result<Verdict, WorkflowError> {
        let mut run = match self.runs.entry(doc.id.clone()) {
            Entry::Occupied(entry) => entry.into_ref(),
            Entry::Vacant(entry) => match self.recover_run(doc) {
                Some(run) => entry.insert(run),
                None => return Ok(linear_verdict(decision)),
            },
        };

        let Some(policy) = run.process.policy_for(step).cloned() else {
            run.record(participant, decision);
            return Ok(linear_verdict(decision));
        };

        if !policy.is_open() && !policy.includes(participant) {
            return Err(WorkflowError::NotAParticipant {
                id: doc.id.clone(),
                step,
                participant: participant.to_string(),
            });
        }

        run.record(participant, decision);
        let verdict = policy.evaluate(&StepContext::new(&policy.participants, &run.responses));
        tracing::debug!(
            document = %doc.id,
            step,
            participant,
            ?decision,
            ?verdict,
            "step evaluated"
        );
        Ok(verdict)
    }

    /// Run state for a document that went on approval outside this engine
    /// (seeded data): reuse the catalog policies when name and step count match.
    fn recover_run(&self, doc: &Document) -> Option<RunState> {
        let info = doc.process_info()?;
        self.access
            .catalog()
            .list()
            .iter()
            .find(|p| p.name == info.process_name() && p.steps == info.total_steps())
            .and_then(|p| p.to_ref().ok())
            .or_else(|| ProcessRef::new(info.process_name(), info.total_steps()).ok())
            .map(RunState::new)
    }

    /// Move to the next step, or approve on the last one
    fn step_or_finish(&self, doc: &mut Document) -> Result<AdvanceOutcome, WorkflowError> {
        let Some(info) = doc.process_info_mut() else {
            return Err(WorkflowError::NotOnApproval {
                id: doc.id.clone(),
                status: doc.status(),
            });
        };

        if info.is_final_step() {
            self.finish(doc, DocumentStatus::Approved)?;
            return Ok(AdvanceOutcome::Approved);
        }

        info.step_forward();
        let (name, step) = (info.process_name().to_string(), info.current_step());
        if let Some(mut run) = self.runs.get_mut(&doc.id) {
            run.responses.clear();
        }
        self.record(doc, JournalAction::Advanced, &name, DocumentStatus::OnApproval);
        tracing::info!(document = %doc.id, process = %name, step, "approval advanced");
        Ok(AdvanceOutcome::Advanced)
    }

    /// End the run as approved or rejected
    fn finish(&self, doc: &mut Document, to: DocumentStatus) -> Result<(), WorkflowError> {
        let from = doc.status();
        validate_transition(from, to)?;
        let name = doc
            .process_info()
            .map(|info| info.process_name().to_string())
            .unwrap_or_default();

        let action = if to == DocumentStatus::Rejected {
            doc.mark_rejected();
            JournalAction::Rejected
        } else {
            doc.mark_approved();
            JournalAction::Approved
        };
        self.runs.remove(&doc.id);
        self.record(doc, action, &name, from);
        tracing::info!(document = %doc.id, process = %name, status = %to, "approval finished");
        Ok(())
    }

    fn record(
        &self,
        doc: &Document,
        action: JournalAction,
        process_name: &str,
        from: DocumentStatus,
    ) {
        let entry = self.journal.append(JournalEntry::new(
            doc.id.clone(),
            action,
            process_name,
            from,
            doc.status(),
            doc.process_info().map(|info| info.current_step()),
        ));
        // No receivers is fine.
        let _ = self.events.send(entry);
    }
}

fn ensure_on_approval(doc: &Document) -> Result<(), WorkflowError> {
    if doc.process_info().is_some() {
        Ok(())
    } else {
        Err(WorkflowError::NotOnApproval {
            id: doc.id.clone(),
            status: doc.status(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::access::CompanyGrants;
    use pir_model::{Process, ProjectId, StepPolicy, StepRule};

    fn did(s: &str) -> DocumentId {
        DocumentId::new(s).unwrap()
    }

    fn engine_with(docs: &[&str], processes: Vec<Process>) -> ApprovalEngine {
        let store = DocumentStore::with_documents(docs.iter().map(|id| {
            Document::draft(did(id), ProjectId::new("prj-1").unwrap(), *id, "Orlov")
        }))
        .unwrap();
        let catalog = ProcessCatalog::new(processes).unwrap();
        let access = AccessResolver::new(Arc::new(catalog), CompanyGrants::new());
        ApprovalEngine::new(Arc::new(store), access, &PirConfig::new().with_latency_ms(0))
    }

    fn process(steps: u32) -> ProcessRef {
        ProcessRef::new("Review", steps).unwrap()
    }

    #[tokio::test]
    async fn start_sets_step_one() {
        let engine = engine_with(&["d1", "d2"], vec![]);
        let report = engine
            .start_approval(&[did("d1"), did("d2")], process(3))
            .await
            .unwrap();

        assert_eq!(report.started.len(), 2);
        for id in ["d1", "d2"] {
            let doc = engine.store().get(&did(id)).unwrap();
            let info = doc.process_info().unwrap();
            assert_eq!(info.current_step(), 1);
            assert_eq!(info.total_steps(), 3);
            assert_eq!(info.process_name(), "Review");
        }
    }

    #[tokio::test]
    async fn duplicate_ids_in_batch_start_once() {
        let engine = engine_with(&["d1"], vec![]);
        let report = engine
            .start_approval(&[did("d1"), did("d1")], process(2))
            .await
            .unwrap();
        assert_eq!(report.started, vec![did("d1")]);
        assert_eq!(engine.journal().len(), 1);
    }

    #[tokio::test]
    async fn advance_reaches_approved() {
        let engine = engine_with(&["d1"], vec![]);
        engine.start_approval(&[did("d1")], process(2)).await.unwrap();

        assert_eq!(engine.advance(&did("d1")).await.unwrap(), AdvanceOutcome::Advanced);
        assert_eq!(engine.advance(&did("d1")).await.unwrap(), AdvanceOutcome::Approved);

        let doc = engine.store().get(&did("d1")).unwrap();
        assert_eq!(doc.status(), DocumentStatus::Approved);
        assert!(doc.process_info().is_none());
    }

    #[tokio::test]
    async fn try_advance_reports_misses() {
        let engine = engine_with(&["d1"], vec![]);
        assert!(matches!(
            engine.try_advance(&did("d1")).await,
            Err(WorkflowError::NotOnApproval { .. })
        ));
        assert!(matches!(
            engine.try_advance(&did("nope")).await,
            Err(WorkflowError::UnknownDocument(_))
        ));
    }

    #[tokio::test]
    async fn respond_without_policy_is_linear() {
        let engine = engine_with(&["d1"], vec![]);
        engine.start_approval(&[did("d1")], process(2)).await.unwrap();

        let outcome = engine.respond(&did("d1"), "anyone", Decision::Approve).await.unwrap();
        assert_eq!(outcome, RespondOutcome::Advanced { step: 2 });

        let outcome = engine.respond(&did("d1"), "anyone", Decision::Reject).await.unwrap();
        assert_eq!(outcome, RespondOutcome::Rejected);
        assert_eq!(
            engine.store().get(&did("d1")).unwrap().status(),
            DocumentStatus::Rejected
        );
    }

    #[tokio::test]
    async fn respond_follows_policy() {
        let engine = engine_with(&["d1"], vec![]);
        let process = process(2)
            .with_policies(vec![StepPolicy::new(
                vec!["a".into(), "b".into()],
                vec![StepRule::AllRequired],
            )])
            .unwrap();
        engine.start_approval(&[did("d1")], process).await.unwrap();

        assert_eq!(
            engine.respond(&did("d1"), "a", Decision::Approve).await.unwrap(),
            RespondOutcome::Pending { step: 1 }
        );
        assert!(matches!(
            engine.respond(&did("d1"), "stranger", Decision::Approve).await,
            Err(WorkflowError::NotAParticipant { .. })
        ));
        assert_eq!(
            engine.respond(&did("d1"), "b", Decision::Approve).await.unwrap(),
            RespondOutcome::Advanced { step: 2 }
        );
        // step 2 has no policy
        assert_eq!(
            engine.respond(&did("d1"), "c", Decision::Approve).await.unwrap(),
            RespondOutcome::Approved
        );
    }

    #[tokio::test]
    async fn responses_reset_between_steps() {
        let engine = engine_with(&["d1"], vec![]);
        let policy = StepPolicy::new(vec!["a".into(), "b".into()], vec![StepRule::AllRequired]);
        let process = process(3).with_policies(vec![policy.clone(), policy]).unwrap();
        engine.start_approval(&[did("d1")], process).await.unwrap();

        engine.respond(&did("d1"), "a", Decision::Approve).await.unwrap();
        engine.respond(&did("d1"), "b", Decision::Approve).await.unwrap();
        assert_eq!(
            engine.respond(&did("d1"), "a", Decision::Approve).await.unwrap(),
            RespondOutcome::Pending { step: 2 }
        );
    }

    #[tokio::test]
    async fn respond_recovers_policy_for_seeded_run() {
        let policy = StepPolicy::new(vec!["a".into(), "b".into()], vec![StepRule::AllRequired]);
        let catalog_process =
            Process::new(ProcessId::new("p1").unwrap(), "Review", 2).with_policies(vec![policy]);
        let store = DocumentStore::with_documents([{
            let mut doc = Document::draft(did("d1"), ProjectId::new("prj").unwrap(), "x", "y");
            doc.begin_approval(&process(2));
            doc
        }])
        .unwrap();
        let access = AccessResolver::new(
            Arc::new(ProcessCatalog::new(vec![catalog_process]).unwrap()),
            CompanyGrants::new(),
        );
        let config = PirConfig::new().with_latency_ms(0);
        let engine = ApprovalEngine::new(Arc::new(store), access, &config);

        assert_eq!(
            engine.respond(&did("d1"), "a", Decision::Approve).await.unwrap(),
            RespondOutcome::Pending { step: 1 }
        );
    }

    #[tokio::test]
    async fn events_are_broadcast() {
        let engine = engine_with(&["d1"], vec![]);
        let mut rx = engine.subscribe();
        engine.start_approval(&[did("d1")], process(1)).await.unwrap();
        engine.advance(&did("d1")).await.unwrap();

        assert_eq!(rx.recv().await.unwrap().action, JournalAction::Started);
        let approved = rx.recv().await.unwrap();
        assert_eq!(approved.action, JournalAction::Approved);
        assert_eq!(approved.to, DocumentStatus::Approved);
        assert_eq!(approved.step, None);
    }
}
