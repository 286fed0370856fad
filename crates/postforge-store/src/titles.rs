//! Bulk-title queue — FIFO backlog of titles not yet converted to posts.

use chrono::{DateTime, Utc};
use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Mutex;

use postforge_core::error::{PostforgeError, Result};
use postforge_core::types::QueuedTitle;

use crate::file::write_atomic;
use crate::import::ParsedTitle;

pub struct TitleStore {
    path: PathBuf,
    titles: Mutex<Vec<QueuedTitle>>,
}

impl TitleStore {
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let titles = if path.exists() {
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
        Ok(Self {
            path,
            titles: Mutex::new(titles),
        })
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Vec<QueuedTitle>>> {
        self.titles
            .lock()
            .map_err(|e| PostforgeError::store(e.to_string()))
    }

    fn persist(&self, titles: &[QueuedTitle]) -> Result<()> {
        let json = serde_json::to_string_pretty(titles)?;
        write_atomic(&self.path, &json)
    }

    pub fn list(&self) -> Result<Vec<QueuedTitle>> {
        Ok(self.lock()?.clone())
    }

    pub fn len(&self) -> Result<usize> {
        Ok(self.lock()?.len())
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.lock()?.is_empty())
    }

    pub fn add(
        &self,
        title: impl Into<String>,
        keywords: Vec<String>,
        now: DateTime<Utc>,
    ) -> Result<QueuedTitle> {
        let entry = QueuedTitle {
            title: title.into(),
            keywords,
            added_at: now,
        };
        let mut titles = self.lock()?;
        titles.push(entry.clone());
        self.persist(&titles)?;
        Ok(entry)
    }

    /// Append parsed titles, skipping blanks and duplicates — both against
    /// the queue itself and against `taken` (titles already turned into
    /// post records). Returns the number actually added.
    pub fn add_bulk(
        &self,
        parsed: Vec<ParsedTitle>,
        taken: &HashSet<String>,
        now: DateTime<Utc>,
    ) -> Result<usize> {
        let mut titles = self.lock()?;
        let mut seen: HashSet<String> =
            titles.iter().map(|t| t.title.to_lowercase()).collect();
        let mut added = 0;
        for entry in parsed {
            let title = entry.title.trim();
            if title.is_empty() {
                continue;
            }
            let key = title.to_lowercase();
            if seen.contains(&key) || taken.contains(&key) {
                tracing::debug!("Skipping duplicate title: {title}");
                continue;
            }
            seen.insert(key);
            titles.push(QueuedTitle {
                title: title.to_string(),
                keywords: entry.keywords,
                added_at: now,
            });
            added += 1;
        }
        if added > 0 {
            self.persist(&titles)?;
        }
        tracing::info!("Added {added} bulk titles");
        Ok(added)
    }

    /// Pop up to `n` titles from the front of the queue (FIFO).
    pub fn drain(&self, n: usize) -> Result<Vec<QueuedTitle>> {
        let mut titles = self.lock()?;
        let n = n.min(titles.len());
        let drained: Vec<QueuedTitle> = titles.drain(..n).collect();
        if !drained.is_empty() {
            self.persist(&titles)?;
        }
        Ok(drained)
    }
}
