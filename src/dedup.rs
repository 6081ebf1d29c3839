use crate::error::StoreError;
use chrono::{DateTime, NaiveDateTime, Utc};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Persisted set of coupon ids that have already been notified.
///
/// Stored as a JSON object mapping each id to the time it was first marked
/// seen. Entries are never removed.
#[derive(Debug)]
pub struct SeenStore {
    path: PathBuf,
    entries: BTreeMap<String, DateTime<Utc>>,
}

impl SeenStore {
    /// Load the set from `path`. A missing or unreadable file yields an empty set.
    ///
    /// Naive timestamps are read as UTC; an entry whose timestamp cannot be
    /// read at all is kept with the load time.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let entries = match fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str::<BTreeMap<String, Value>>(&contents) {
                Ok(raw) => {
                    let loaded_at = Utc::now();
                    raw.into_iter()
                        .map(|(id, value)| {
                            let at = seen_at(&value).unwrap_or(loaded_at);
                            (id, at)
                        })
                        .collect()
                }
                Err(e) => {
                    tracing::warn!(
                        path = %path.display(),
                        "seen set is corrupted, starting empty: {e}"
                    );
                    BTreeMap::new()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!(path = %path.display(), "no seen set yet, starting empty");
                BTreeMap::new()
            }
            Err(e) => {
                tracing::warn!(
                    path = %path.display(),
                    "seen set unreadable, starting empty: {e}"
                );
                BTreeMap::new()
            }
        };

        tracing::debug!(path = %path.display(), count = entries.len(), "seen set loaded");
        Self { path, entries }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_new(&self, id: &str) -> bool {
        !self.entries.contains_key(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.entries.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Insert `id` and persist. Returns `false` if it was already present.
    ///
    /// On a persist failure the id stays in memory, so the running process
    /// still will not resend it.
    pub fn mark_seen(&mut self, id: &str, at: DateTime<Utc>) -> Result<bool, StoreError> {
        if self.entries.contains_key(id) {
            return Ok(false);
        }
        self.entries.insert(id.to_string(), at);
        self.persist()?;
        Ok(true)
    }

    /// Write the set atomically: temp file next to the target, then rename.
    pub fn persist(&self) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }

        let json = serde_json::to_string_pretty(&self.entries)
            .map_err(|e| StoreError::Serialize(e.to_string()))?;

        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);

        fs::write(&tmp, json)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

/// RFC 3339, or a naive ISO-8601 timestamp read as UTC.
fn seen_at(value: &Value) -> Option<DateTime<Utc>> {
    let text = value.as_str()?.trim();
    DateTime::parse_from_rfc3339(text)
        .map(|dt| dt.with_timezone(&Utc))
        .ok()
        .or_else(|| {
            NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S%.f")
                .ok()
                .map(|naive| naive.and_utc())
        })
}
