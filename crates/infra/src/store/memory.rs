//! In-memory store for development (`memory://`) and tests.
//!
//! Each transaction works on a private snapshot taken at `begin`. Commit is
//! optimistic: if any record the transaction read or wrote (or any kind it
//! listed) was committed by someone else after the snapshot was taken, the
//! commit fails with a serialization failure (`40001`), the same way a
//! `SERIALIZABLE` Postgres transaction would. Unique keys are enforced per
//! kind with `23505`.

use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use serde_json::Value;
use uuid::Uuid;

use teatrade_core::{Page, PageRequest};

use super::error::StoreError;
use super::{Database, Filter, RawRecord, Transaction};

type Key = (String, Uuid);

#[derive(Debug, Clone)]
struct Row {
    unique_key: Option<String>,
    data: Value,
    /// Insertion order, for newest-first listing.
    seq: u64,
    /// Commit that last wrote this row.
    version: u64,
}

#[derive(Debug, Default)]
struct Shared {
    rows: BTreeMap<Key, Row>,
    /// Commit that deleted a key, so a delete also conflicts.
    deleted: HashMap<Key, u64>,
    /// Last commit that changed each kind.
    kind_versions: HashMap<String, u64>,
    commits: u64,
    next_seq: u64,
}

/// Where an injected fault fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FaultPoint {
    Begin,
    Commit,
}

#[derive(Debug, Default)]
struct Faults {
    begin: VecDeque<StoreError>,
    commit: VecDeque<StoreError>,
}

/// Process-local [`Database`].
#[derive(Debug, Clone, Default)]
pub struct InMemoryDatabase {
    shared: Arc<Mutex<Shared>>,
    faults: Arc<Mutex<Faults>>,
}

impl InMemoryDatabase {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue an error returned by the next `begin` or `commit`.
    ///
    /// Faults fire once each, in the order they were queued.
    pub fn inject_fault(&self, at: FaultPoint, error: StoreError) {
        if let Ok(mut faults) = self.faults.lock() {
            match at {
                FaultPoint::Begin => faults.begin.push_back(error),
                FaultPoint::Commit => faults.commit.push_back(error),
            }
        }
    }

    fn take_fault(faults: &Mutex<Faults>, at: FaultPoint) -> Option<StoreError> {
        let mut faults = faults.lock().ok()?;
        match at {
            FaultPoint::Begin => faults.begin.pop_front(),
            FaultPoint::Commit => faults.commit.pop_front(),
        }
    }
}

fn lock(shared: &Mutex<Shared>) -> Result<MutexGuard<'_, Shared>, StoreError> {
    shared
        .lock()
        .map_err(|_| StoreError::Connection("in-memory store lock poisoned".into()))
}

#[async_trait]
impl Database for InMemoryDatabase {
    async fn begin(&self) -> Result<Box<dyn Transaction>, StoreError> {
        if let Some(err) = Self::take_fault(&self.faults, FaultPoint::Begin) {
            return Err(err);
        }
        let shared = lock(&self.shared)?;
        Ok(Box::new(InMemoryTransaction {
            shared: Arc::clone(&self.shared),
            faults: Arc::clone(&self.faults),
            view: shared.rows.clone(),
            started_at: shared.commits,
            read: HashSet::new(),
            written: HashSet::new(),
            scanned: HashSet::new(),
            finished: false,
        }))
    }
}

struct InMemoryTransaction {
    shared: Arc<Mutex<Shared>>,
    faults: Arc<Mutex<Faults>>,
    /// Snapshot plus this transaction's own writes.
    view: BTreeMap<Key, Row>,
    started_at: u64,
    read: HashSet<Key>,
    written: HashSet<Key>,
    scanned: HashSet<String>,
    finished: bool,
}

impl InMemoryTransaction {
    fn ensure_open(&self) -> Result<(), StoreError> {
        if self.finished {
            return Err(StoreError::TransactionClosed);
        }
        Ok(())
    }

    fn unique_taken(rows: &BTreeMap<Key, Row>, kind: &str, id: Uuid, unique_key: &Option<String>) -> bool {
        let Some(wanted) = unique_key else {
            return false;
        };
        rows.iter().any(|((k, other), row)| {
            k == kind && *other != id && row.unique_key.as_ref() == Some(wanted)
        })
    }

    fn conflicts(&self, shared: &Shared) -> Option<String> {
        let changed_after_start = |key: &Key| {
            let written = shared.rows.get(key).map(|r| r.version);
            let deleted = shared.deleted.get(key).copied();
            written.max(deleted).is_some_and(|v| v > self.started_at)
        };

        if let Some((kind, id)) = self.read.iter().chain(self.written.iter()).find(|k| changed_after_start(k)) {
            return Some(format!("{kind} {id} was modified by a concurrent transaction"));
        }
        self.scanned
            .iter()
            .find(|kind| shared.kind_versions.get(*kind).is_some_and(|v| *v > self.started_at))
            .map(|kind| format!("{kind} changed under a concurrent list"))
    }
}

#[async_trait]
impl Transaction for InMemoryTransaction {
    async fn insert(&mut self, kind: &str, record: RawRecord) -> Result<(), StoreError> {
        self.ensure_open()?;
        let key = (kind.to_string(), record.id);
        if self.view.contains_key(&key) {
            return Err(StoreError::unique_violation(format!(
                "duplicate key value violates unique constraint \"records_pkey\" ({kind} {})",
                record.id
            )));
        }
        if Self::unique_taken(&self.view, kind, record.id, &record.unique_key) {
            return Err(StoreError::unique_violation(format!(
                "duplicate key value violates unique constraint \"records_kind_unique_key\" ({kind})"
            )));
        }

        self.view.insert(
            key.clone(),
            Row {
                unique_key: record.unique_key,
                data: record.data,
                seq: 0,
                version: 0,
            },
        );
        self.written.insert(key);
        Ok(())
    }

    async fn update(&mut self, kind: &str, record: RawRecord) -> Result<(), StoreError> {
        self.ensure_open()?;
        let key = (kind.to_string(), record.id);
        if !self.view.contains_key(&key) {
            return Err(StoreError::NotFound);
        }
        if Self::unique_taken(&self.view, kind, record.id, &record.unique_key) {
            return Err(StoreError::unique_violation(format!(
                "duplicate key value violates unique constraint \"records_kind_unique_key\" ({kind})"
            )));
        }
        if let Some(row) = self.view.get_mut(&key) {
            row.unique_key = record.unique_key;
            row.data = record.data;
        }
        self.written.insert(key);
        Ok(())
    }

    async fn delete(&mut self, kind: &str, id: Uuid) -> Result<(), StoreError> {
        self.ensure_open()?;
        let key = (kind.to_string(), id);
        if self.view.remove(&key).is_none() {
            return Err(StoreError::NotFound);
        }
        self.written.insert(key);
        Ok(())
    }

    async fn get(&mut self, kind: &str, id: Uuid) -> Result<Option<Value>, StoreError> {
        self.ensure_open()?;
        let key = (kind.to_string(), id);
        let found = self.view.get(&key).map(|row| row.data.clone());
        self.read.insert(key);
        Ok(found)
    }

    async fn list(&mut self, kind: &str, filter: &Filter, page: PageRequest) -> Result<Page<Value>, StoreError> {
        self.ensure_open()?;
        self.scanned.insert(kind.to_string());

        let mut matching: Vec<(&Key, &Row)> = self
            .view
            .iter()
            .filter(|((k, _), row)| k == kind && filter.matches(&row.data))
            .collect();
        // Rows written by this transaction have seq 0 until commit; they are
        // the newest from its own point of view.
        matching.sort_by(|(ka, a), (kb, b)| {
            let a_seq = if a.seq == 0 { u64::MAX } else { a.seq };
            let b_seq = if b.seq == 0 { u64::MAX } else { b.seq };
            b_seq.cmp(&a_seq).then_with(|| kb.1.cmp(&ka.1))
        });

        let total = matching.len() as u64;
        let items = matching
            .into_iter()
            .skip(page.offset() as usize)
            .take(page.limit as usize)
            .map(|(_, row)| row.data.clone())
            .collect();
        Ok(Page::new(items, total, page))
    }

    async fn commit(&mut self) -> Result<(), StoreError> {
        self.ensure_open()?;
        self.finished = true;

        if let Some(err) = InMemoryDatabase::take_fault(&self.faults, FaultPoint::Commit) {
            return Err(err);
        }
        if self.written.is_empty() {
            return Ok(());
        }

        let mut shared = lock(&self.shared)?;
        if let Some(reason) = self.conflicts(&shared) {
            return Err(StoreError::serialization_failure(format!(
                "could not serialize access: {reason}"
            )));
        }
        for key in &self.written {
            let Some(wanted) = self.view.get(key).and_then(|row| row.unique_key.as_ref()) else {
                continue;
            };
            // Rows this transaction rewrote or deleted were already checked
            // against its own view.
            let clash = shared.rows.iter().any(|(other, row)| {
                other.0 == key.0
                    && other.1 != key.1
                    && !self.written.contains(other)
                    && row.unique_key.as_ref() == Some(wanted)
            });
            if clash {
                return Err(StoreError::unique_violation(format!(
                    "duplicate key value violates unique constraint \"records_kind_unique_key\" ({})",
                    key.0
                )));
            }
        }

        shared.commits += 1;
        let version = shared.commits;
        for key in self.written.drain() {
            match self.view.remove(&key) {
                Some(mut row) => {
                    if row.seq == 0 {
                        shared.next_seq += 1;
                        row.seq = shared.next_seq;
                    }
                    row.version = version;
                    shared.deleted.remove(&key);
                    shared.rows.insert(key.clone(), row);
                }
                None => {
                    shared.rows.remove(&key);
                    shared.deleted.insert(key.clone(), version);
                }
            }
            shared.kind_versions.insert(key.0, version);
        }
        Ok(())
    }

    async fn rollback(&mut self) -> Result<(), StoreError> {
        self.ensure_open()?;
        self.finished = true;
        self.view.clear();
        self.written.clear();
        Ok(())
    }
}
