//! In-process ledger
//!
//! Same contract as [`super::SqliteLedger`] without durability. Used for
//! dry runs and as a test double.

use super::ledger::{Ledger, LedgerSummary};
use crate::models::{ResolvedRecord, SkipReason, SkippedName};
use async_trait::async_trait;
use profscan_common::{Error, Result};
use std::collections::{BTreeMap, HashMap};
use std::sync::Mutex;

#[derive(Default)]
struct Inner {
    /// id -> (record, write sequence)
    resolved: HashMap<String, (ResolvedRecord, u64)>,
    skipped: BTreeMap<String, SkipReason>,
    /// name -> last error
    pending: BTreeMap<String, String>,
    next_seq: u64,
}

/// Mutex-guarded in-memory ledger
#[derive(Default)]
pub struct MemoryLedger {
    inner: Mutex<Inner>,
}

impl MemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Inner>> {
        self.inner
            .lock()
            .map_err(|_| Error::Internal("memory ledger lock poisoned".to_string()))
    }

    /// All resolved records, oldest write first
    pub fn resolved_records(&self) -> Result<Vec<ResolvedRecord>> {
        let inner = self.lock()?;
        let mut rows: Vec<_> = inner.resolved.values().cloned().collect();
        rows.sort_by_key(|(_, seq)| *seq);
        Ok(rows.into_iter().map(|(record, _)| record).collect())
    }
}

#[async_trait]
impl Ledger for MemoryLedger {
    async fn upsert_resolved(&self, record: &ResolvedRecord) -> Result<()> {
        let mut inner = self.lock()?;
        inner.next_seq += 1;
        let seq = inner.next_seq;
        inner
            .resolved
            .insert(record.id().to_string(), (record.clone(), seq));
        Ok(())
    }

    async fn upsert_skipped(&self, name: &str, reason: SkipReason) -> Result<()> {
        self.lock()?.skipped.insert(name.to_string(), reason);
        Ok(())
    }

    async fn last_processed_name(&self) -> Result<Option<String>> {
        let inner = self.lock()?;
        Ok(inner
            .resolved
            .values()
            .max_by_key(|(_, seq)| *seq)
            .map(|(record, _)| record.lookup_name.clone()))
    }

    async fn load_resolved(&self, lookup_name: &str) -> Result<Option<ResolvedRecord>> {
        let inner = self.lock()?;
        Ok(inner
            .resolved
            .values()
            .filter(|(record, _)| record.lookup_name == lookup_name)
            .max_by_key(|(_, seq)| *seq)
            .map(|(record, _)| record.clone()))
    }

    async fn list_skipped(&self) -> Result<Vec<SkippedName>> {
        let inner = self.lock()?;
        Ok(inner
            .skipped
            .iter()
            .map(|(name, reason)| SkippedName::new(name.clone(), *reason))
            .collect())
    }

    async fn mark_pending(&self, name: &str, last_error: &str) -> Result<()> {
        self.lock()?
            .pending
            .insert(name.to_string(), last_error.to_string());
        Ok(())
    }

    async fn clear_pending(&self, name: &str) -> Result<()> {
        self.lock()?.pending.remove(name);
        Ok(())
    }

    async fn list_pending(&self) -> Result<Vec<String>> {
        Ok(self.lock()?.pending.keys().cloned().collect())
    }

    async fn summary(&self) -> Result<LedgerSummary> {
        let inner = self.lock()?;
        Ok(LedgerSummary {
            resolved: inner.resolved.len() as u64,
            skipped: inner.skipped.len() as u64,
            pending: inner.pending.len() as u64,
        })
    }
}
