//! Transition journal
//!
//! Append-only record of every transition the engine applies. Each entry
//! carries the SHA-256 hash of its predecessor, so edits to past entries are
//! detected by [`verify_chain`].

use crate::error::WorkflowError;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use pir_model::{DocumentId, DocumentStatus};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use ulid::Ulid;

/// What the engine did to a document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JournalAction {
    /// Run started (or restarted) at step 1
    Started,
    /// Moved to the next step
    Advanced,
    /// Run finished as approved
    Approved,
    /// Run finished as rejected
    Rejected,
}

impl JournalAction {
    fn as_str(self) -> &'static str {
        match self {
            JournalAction::Started => "started",
            JournalAction::Advanced => "advanced",
            JournalAction::Approved => "approved",
            JournalAction::Rejected => "rejected",
        }
    }
}

/// One applied transition, chained to its predecessor by hash
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JournalEntry {
    /// Unique, time-ordered id
    pub event_id: Ulid,
    /// When the transition was applied
    pub timestamp: DateTime<Utc>,
    /// Affected document
    pub document_id: DocumentId,
    /// What happened
    pub action: JournalAction,
    /// Process of the run
    pub process_name: String,
    /// Status before
    pub from: DocumentStatus,
    /// Status after
    pub to: DocumentStatus,
    /// Step reached after the transition; `None` once the run ended
    pub step: Option<u32>,
    /// Hash of the previous entry (zeros for the first)
    #[serde(with = "hex_bytes")]
    pub prev_hash: [u8; 32],
    /// Hash of this entry
    #[serde(with = "hex_bytes")]
    pub hash: [u8; 32],
}

impl JournalEntry {
    /// Unchained entry; [`Journal::append`] fills in the hashes
    #[must_use]
    pub fn new(
        document_id: DocumentId,
        action: JournalAction,
        process_name: impl Into<String>,
        from: DocumentStatus,
        to: DocumentStatus,
        step: Option<u32>,
    ) -> Self {
        Self {
            event_id: Ulid::new(),
            timestamp: Utc::now(),
            document_id,
            action,
            process_name: process_name.into(),
            from,
            to,
            step,
            prev_hash: [0u8; 32],
            hash: [0u8; 32],
        }
    }

    /// Entry hash as hex
    #[must_use]
    pub fn hash_hex(&self) -> String {
        hex::encode(self.hash)
    }
}

/// In-memory hash-chained journal
#[derive(Debug, Default)]
pub struct Journal {
    inner: Mutex<Vec<JournalEntry>>,
}

impl Journal {
    /// Empty journal
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Chain `entry` to the last one and store it
    pub fn append(&self, mut entry: JournalEntry) -> JournalEntry {
        let mut guard = self.inner.lock();
        entry.prev_hash = guard.last().map(|e| e.hash).unwrap_or([0u8; 32]);
        entry.hash = compute_hash(&entry);
        guard.push(entry.clone());
        entry
    }

    /// Copy of all entries
    #[must_use]
    pub fn entries(&self) -> Vec<JournalEntry> {
        self.inner.lock().clone()
    }

    /// Entries of one document
    #[must_use]
    pub fn entries_for(&self, document_id: &DocumentId) -> Vec<JournalEntry> {
        self.inner
            .lock()
            .iter()
            .filter(|e| &e.document_id == document_id)
            .cloned()
            .collect()
    }

    /// Number of entries
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    /// Whether nothing was recorded yet
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.lock().is_empty()
    }

    /// Check the whole chain
    ///
    /// # Errors
    /// Returns [`WorkflowError::JournalIntegrity`] at the first bad entry
    pub fn verify_integrity(&self) -> Result<(), WorkflowError> {
        verify_chain(&self.inner.lock())
    }
}

/// Check a sequence of entries, e.g. one read back from disk
///
/// # Errors
/// Returns [`WorkflowError::JournalIntegrity`] at the first bad entry
pub fn verify_chain(entries: &[JournalEntry]) -> Result<(), WorkflowError> {
    let mut prev = [0u8; 32];
    for (index, e) in entries.iter().enumerate() {
        if e.prev_hash != prev || e.hash != compute_hash(e) {
            return Err(WorkflowError::JournalIntegrity { index });
        }
        prev = e.hash;
    }
    Ok(())
}

fn compute_hash(entry: &JournalEntry) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(entry.event_id.to_bytes());
    hasher.update(entry.timestamp.timestamp_micros().to_le_bytes());
    hasher.update(entry.document_id.as_str().as_bytes());
    hasher.update([0]);
    hasher.update(entry.action.as_str().as_bytes());
    hasher.update([0]);
    hasher.update(entry.process_name.as_bytes());
    hasher.update([0]);
    hasher.update(entry.from.as_str().as_bytes());
    hasher.update([0]);
    hasher.update(entry.to.as_str().as_bytes());
    hasher.update([0]);
    hasher.update(entry.step.unwrap_or(0).to_le_bytes());
    hasher.update(entry.prev_hash);
    hasher.finalize().into()
}

mod hex_bytes {
    use serde::{de::Error, Deserialize, Deserializer, Serializer};

    pub(super) fn serialize<S: Serializer>(bytes: &[u8; 32], s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&hex::encode(bytes))
    }

    pub(super) fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<[u8; 32], D::Error> {
        let raw = String::deserialize(d)?;
        let mut out = [0u8; 32];
        hex::decode_to_slice(raw, &mut out).map_err(D::Error::custom)?;
        Ok(out)
    }
}
