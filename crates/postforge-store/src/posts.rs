//! Post record store — the durable collection the scheduler drives.
//!
//! All state changes go through [`PostStore::transition`], a guarded
//! compare-and-set: the change applies only if the record is still in the
//! expected prior state. A loser in a race gets `StaleState` and simply
//! skips the record.

use chrono::{DateTime, NaiveDate, Utc};
use std::path::PathBuf;
use std::sync::Mutex;

use postforge_core::error::{PostforgeError, Result};
use postforge_core::types::{PostRecord, PostState};

use crate::file::write_atomic;

pub struct PostStore {
    path: PathBuf,
    records: Mutex<Vec<PostRecord>>,
}

impl PostStore {
    /// Open the store, loading existing records if the file is present.
    ///
    /// A corrupt file is an error rather than a silent reset — post records
    /// are the system's work ledger and must not be dropped.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let records = if path.exists() {
            let content = std::fs::read_to_string(&path)?;
            if content.trim().is_empty() {
                Vec::new()
            } else {
                serde_json::from_str(&content).map_err(|e| {
                    PostforgeError::store(format!("unreadable {}: {e}", path.display()))
                })?
            }
        } else {
            Vec::new()
        };
        tracing::debug!("Post store opened: {} ({} records)", path.display(), records.len());
        Ok(Self {
            path,
            records: Mutex::new(records),
        })
    }

    fn persist(&self, records: &[PostRecord]) -> Result<()> {
        let json = serde_json::to_string_pretty(records)?;
        write_atomic(&self.path, &json)
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Vec<PostRecord>>> {
        self.records
            .lock()
            .map_err(|e| PostforgeError::store(e.to_string()))
    }

    pub fn list(&self) -> Result<Vec<PostRecord>> {
        Ok(self.lock()?.clone())
    }

    pub fn list_by_state(&self, state: PostState) -> Result<Vec<PostRecord>> {
        Ok(self
            .lock()?
            .iter()
            .filter(|r| r.state == state)
            .cloned()
            .collect())
    }

    pub fn list_pending(&self) -> Result<Vec<PostRecord>> {
        self.list_by_state(PostState::Pending)
    }

    pub fn get(&self, id: &str) -> Result<Option<PostRecord>> {
        Ok(self.lock()?.iter().find(|r| r.id == id).cloned())
    }

    /// Create a new `Pending` record.
    pub fn create(
        &self,
        title: impl Into<String>,
        keywords: Vec<String>,
        scheduled_for: Option<DateTime<Utc>>,
        now: DateTime<Utc>,
    ) -> Result<PostRecord> {
        let record = PostRecord::new(title, keywords, scheduled_for, now);
        self.insert(record.clone())?;
        Ok(record)
    }

    /// Insert a pre-built record (used by the bulk planner and tests).
    pub fn insert(&self, record: PostRecord) -> Result<()> {
        let mut records = self.lock()?;
        records.push(record);
        self.persist(&records)
    }

    /// Guarded compare-and-set transition.
    ///
    /// Fails with `StaleState` when the record is no longer in `from`, and
    /// with `Store` when `from → to` is not a legal state machine edge.
    /// `apply` runs only after both guards pass, then the whole collection is
    /// persisted before the new record is returned.
    pub fn transition<F>(
        &self,
        id: &str,
        from: PostState,
        to: PostState,
        apply: F,
    ) -> Result<PostRecord>
    where
        F: FnOnce(&mut PostRecord),
    {
        if !from.can_transition_to(to) {
            return Err(PostforgeError::store(format!(
                "illegal transition {from} -> {to}"
            )));
        }
        let mut records = self.lock()?;
        let record = records
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or_else(|| PostforgeError::RecordNotFound(id.to_string()))?;
        if record.state != from {
            return Err(PostforgeError::StaleState {
                id: id.to_string(),
                expected: from,
                actual: record.state,
            });
        }
        record.state = to;
        apply(record);
        let updated = record.clone();
        self.persist(&records)?;
        Ok(updated)
    }

    /// Move a non-terminal record into `Failed` with a reason.
    /// Generated content is retained so a retry can republish directly.
    pub fn mark_failed(&self, id: &str, reason: &str) -> Result<PostRecord> {
        let mut records = self.lock()?;
        let record = records
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or_else(|| PostforgeError::RecordNotFound(id.to_string()))?;
        if record.state.is_terminal() {
            return Err(PostforgeError::store(format!(
                "cannot fail post {id} in terminal state {}",
                record.state
            )));
        }
        record.state = PostState::Failed;
        record.failure_reason = Some(reason.to_string());
        let updated = record.clone();
        self.persist(&records)?;
        Ok(updated)
    }

    /// Operator retry of a failed record. A record that already has content
    /// goes back to `ReadyToPublish` (no regeneration); otherwise `Pending`.
    pub fn retry(&self, id: &str) -> Result<PostRecord> {
        let mut records = self.lock()?;
        let record = records
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or_else(|| PostforgeError::RecordNotFound(id.to_string()))?;
        if record.state != PostState::Failed {
            return Err(PostforgeError::store(format!(
                "cannot retry post {id} in state {}",
                record.state
            )));
        }
        record.state = if record.content.is_some() {
            PostState::ReadyToPublish
        } else {
            PostState::Pending
        };
        record.failure_reason = None;
        let updated = record.clone();
        self.persist(&records)?;
        Ok(updated)
    }

    /// Restart sweep: any record left `Generating` by a crashed run goes back
    /// to `Pending` so the next tick retries it. Returns the sweep count.
    pub fn recover_in_flight(&self) -> Result<usize> {
        let mut records = self.lock()?;
        let mut swept = 0;
        for record in records.iter_mut() {
            if record.state == PostState::Generating {
                record.state = PostState::Pending;
                swept += 1;
            }
        }
        if swept > 0 {
            self.persist(&records)?;
        }
        Ok(swept)
    }

    /// How many records were published on the given calendar day.
    pub fn count_published_on(&self, day: NaiveDate) -> Result<usize> {
        Ok(self
            .lock()?
            .iter()
            .filter(|r| {
                r.state == PostState::Published
                    && r.published_at.is_some_and(|at| at.date_naive() == day)
            })
            .count())
    }
}
