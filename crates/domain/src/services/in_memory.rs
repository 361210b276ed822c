//! In-memory collaborator implementations for development and testing.
//!
//! Each one can be switched into a failing mode to exercise error paths.

use async_trait::async_trait;
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use serde_json::Value as JsonValue;
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard};
use uuid::Uuid;

use super::ports::{AuditLogStore, EntityRepository, NetworkOriginLookup, SessionStore};
use crate::errors::{LookupError, StoreError};
use crate::models::{AuditLogCriteria, AuditLogEntry, NewAuditLogEntry, Snapshot};
use shared::pagination::PageRequest;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[derive(Default)]
struct AuditLogState {
    entries: Vec<AuditLogEntry>,
    last_created_at: Option<DateTime<Utc>>,
}

/// Append-only audit log store backed by a vector.
///
/// `created_at` is strictly increasing across inserts so ordering is stable
/// even when entries are written within the same clock tick.
#[derive(Default)]
pub struct InMemoryAuditLogStore {
    state: Mutex<AuditLogState>,
    simulate_failure: AtomicBool,
}

impl InMemoryAuditLogStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store whose every call fails with a backend error.
    pub fn failing() -> Self {
        let store = Self::default();
        store.set_failing(true);
        store
    }

    pub fn set_failing(&self, failing: bool) {
        self.simulate_failure.store(failing, Ordering::SeqCst);
    }

    /// Copy of every stored entry in insertion order.
    pub fn entries(&self) -> Vec<AuditLogEntry> {
        lock(&self.state).entries.clone()
    }

    pub fn len(&self) -> usize {
        lock(&self.state).entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn check_failure(&self) -> Result<(), StoreError> {
        if self.simulate_failure.load(Ordering::SeqCst) {
            tracing::warn!("In-memory audit log store simulating failure");
            return Err(StoreError::Backend("Simulated failure".to_string()));
        }
        Ok(())
    }

    fn matching(&self, organization_id: &str, criteria: &AuditLogCriteria) -> Vec<AuditLogEntry> {
        let mut matching: Vec<AuditLogEntry> = lock(&self.state)
            .entries
            .iter()
            .filter(|e| e.organization_id == organization_id && criteria.matches(e))
            .cloned()
            .collect();
        matching.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        matching
    }
}

#[async_trait]
impl AuditLogStore for InMemoryAuditLogStore {
    async fn insert(&self, entry: NewAuditLogEntry) -> Result<AuditLogEntry, StoreError> {
        self.check_failure()?;

        let mut state = lock(&self.state);
        let now = Utc::now();
        let created_at = match state.last_created_at {
            Some(last) if now <= last => last + ChronoDuration::microseconds(1),
            _ => now,
        };
        state.last_created_at = Some(created_at);

        let stored = AuditLogEntry::from_new(entry, Uuid::new_v4(), created_at);
        state.entries.push(stored.clone());
        Ok(stored)
    }

    async fn query(
        &self,
        organization_id: &str,
        criteria: &AuditLogCriteria,
        page: PageRequest,
    ) -> Result<Vec<AuditLogEntry>, StoreError> {
        self.check_failure()?;

        Ok(self
            .matching(organization_id, criteria)
            .into_iter()
            .skip(page.offset.max(0) as usize)
            .take(page.limit.max(0) as usize)
            .collect())
    }

    async fn count(
        &self,
        organization_id: &str,
        criteria: &AuditLogCriteria,
    ) -> Result<i64, StoreError> {
        self.check_failure()?;
        Ok(self.matching(organization_id, criteria).len() as i64)
    }

    async fn get_by_id(
        &self,
        organization_id: &str,
        id: Uuid,
    ) -> Result<Option<AuditLogEntry>, StoreError> {
        self.check_failure()?;
        Ok(lock(&self.state)
            .entries
            .iter()
            .find(|e| e.id == id && e.organization_id == organization_id)
            .cloned())
    }
}

/// Entity collection keyed by string id.
///
/// Stored snapshots always carry their `id` field. `update` merges the given
/// fields over the stored ones. `create` reuses the payload's `id` when it is
/// a string not already taken.
#[derive(Default)]
pub struct InMemoryEntityRepository {
    rows: Mutex<BTreeMap<String, Snapshot>>,
    calls: AtomicUsize,
    simulate_failure: AtomicBool,
}

impl InMemoryEntityRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds an entity without counting it as a repository call.
    pub fn seed(&self, id: impl Into<String>, mut snapshot: Snapshot) {
        let id = id.into();
        snapshot.insert("id".to_string(), JsonValue::String(id.clone()));
        lock(&self.rows).insert(id, snapshot);
    }

    pub fn set_failing(&self, failing: bool) {
        self.simulate_failure.store(failing, Ordering::SeqCst);
    }

    /// Number of trait calls made so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn contains(&self, id: &str) -> bool {
        lock(&self.rows).contains_key(id)
    }

    pub fn snapshot(&self, id: &str) -> Option<Snapshot> {
        lock(&self.rows).get(id).cloned()
    }

    pub fn all(&self) -> Vec<Snapshot> {
        lock(&self.rows).values().cloned().collect()
    }

    fn begin_call(&self) -> Result<(), StoreError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.simulate_failure.load(Ordering::SeqCst) {
            return Err(StoreError::Backend("Simulated failure".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl EntityRepository for InMemoryEntityRepository {
    async fn get(&self, id: &str) -> Result<Snapshot, StoreError> {
        self.begin_call()?;
        lock(&self.rows).get(id).cloned().ok_or(StoreError::NotFound)
    }

    async fn create(&self, mut snapshot: Snapshot) -> Result<String, StoreError> {
        self.begin_call()?;
        let mut rows = lock(&self.rows);

        let id = match snapshot.get("id").and_then(JsonValue::as_str) {
            Some(existing) if !existing.is_empty() && !rows.contains_key(existing) => {
                existing.to_string()
            }
            _ => Uuid::new_v4().to_string(),
        };
        snapshot.insert("id".to_string(), JsonValue::String(id.clone()));
        rows.insert(id.clone(), snapshot);
        Ok(id)
    }

    async fn update(&self, id: &str, snapshot: Snapshot) -> Result<(), StoreError> {
        self.begin_call()?;
        let mut rows = lock(&self.rows);
        let row = rows.get_mut(id).ok_or(StoreError::NotFound)?;
        for (key, value) in snapshot {
            if key != "id" {
                row.insert(key, value);
            }
        }
        Ok(())
    }

    async fn delete(&self, id: &str) -> Result<(), StoreError> {
        self.begin_call()?;
        lock(&self.rows)
            .remove(id)
            .map(|_| ())
            .ok_or(StoreError::NotFound)
    }
}

/// Session store held in process memory.
#[derive(Debug, Default)]
pub struct InMemorySessionStore {
    tokens: Mutex<HashMap<String, String>>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStore for InMemorySessionStore {
    fn get(&self, session_key: &str) -> Option<String> {
        lock(&self.tokens).get(session_key).cloned()
    }

    fn put(&self, session_key: &str, token: String) {
        lock(&self.tokens).insert(session_key.to_string(), token);
    }
}

/// Origin lookup returning a fixed address, counting calls.
#[derive(Debug)]
pub struct StaticOriginLookup {
    address: String,
    calls: AtomicUsize,
    simulate_failure: AtomicBool,
}

impl StaticOriginLookup {
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            calls: AtomicUsize::new(0),
            simulate_failure: AtomicBool::new(false),
        }
    }

    pub fn set_failing(&self, failing: bool) {
        self.simulate_failure.store(failing, Ordering::SeqCst);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl NetworkOriginLookup for StaticOriginLookup {
    async fn lookup(&self) -> Result<String, LookupError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.simulate_failure.load(Ordering::SeqCst) {
            return Err(LookupError::Failed("Simulated failure".to_string()));
        }
        Ok(self.address.clone())
    }
}
