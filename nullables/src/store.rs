//! Nullable store: thread-safe in-memory [`KvBackend`].

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use tessera_store::{KvBackend, KvStore, StoreError, Table, WriteSet};

use crate::lock;

/// In-memory tables with the same atomic-apply contract as LMDB.
/// Thread-safe for use with tokio's multi-threaded runtime.
#[derive(Default)]
pub struct MemoryBackend {
    rows: Mutex<BTreeMap<(Table, Vec<u8>), Vec<u8>>>,
    fail_commits: AtomicBool,
    commits: AtomicUsize,
}

pub type NullStore = KvStore<MemoryBackend>;

pub fn null_store() -> NullStore {
    KvStore::new(MemoryBackend::default())
}

impl MemoryBackend {
    /// Make every subsequent commit fail without applying anything.
    pub fn fail_commits(&self, fail: bool) {
        self.fail_commits.store(fail, Ordering::SeqCst);
    }

    /// Number of successful non-empty commits.
    pub fn commit_count(&self) -> usize {
        self.commits.load(Ordering::SeqCst)
    }

    pub fn row_count(&self, table: Table) -> usize {
        lock(&self.rows).keys().filter(|(t, _)| *t == table).count()
    }
}

impl KvBackend for MemoryBackend {
    fn get(&self, table: Table, key: &[u8]) -> Result<Option<Vec<u8>>, StoreError> {
        Ok(lock(&self.rows).get(&(table, key.to_vec())).cloned())
    }

    fn scan_prefix(
        &self,
        table: Table,
        prefix: &[u8],
    ) -> Result<Vec<(Vec<u8>, Vec<u8>)>, StoreError> {
        let rows = lock(&self.rows);
        Ok(rows
            .range((table, prefix.to_vec())..)
            .take_while(|((t, key), _)| *t == table && key.starts_with(prefix))
            .map(|((_, key), value)| (key.clone(), value.clone()))
            .collect())
    }

    fn apply(&self, writes: WriteSet) -> Result<(), StoreError> {
        if self.fail_commits.load(Ordering::SeqCst) {
            return Err(StoreError::Backend("injected commit failure".into()));
        }
        let mut rows = lock(&self.rows);
        for (key, value) in writes {
            match value {
                Some(v) => {
                    rows.insert(key, v);
                }
                None => {
                    rows.remove(&key);
                }
            }
        }
        self.commits.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
