//! Transaction boundary spanning every repository.
//!
//! A [`StagedTxn`] collects writes in memory, reading through to committed data for keys
//! it has not touched. [`LedgerTxn::commit`] hands the whole write-set to the backend
//! in one atomic apply; dropping or discarding the transaction throws it away. Nothing a
//! transaction writes is visible to other transactions before commit.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tessera_types::BlockHash;

use crate::account::AccountStore;
use crate::backend::{KvBackend, Table, WriteSet};
use crate::block::{BlockStore, GenesisStore};
use crate::meta::ChainStateStore;
use crate::pending::PendingTxStore;
use crate::token::TokenStore;
use crate::StoreError;

/// All repositories behind one atomic boundary.
pub trait LedgerTxn:
    AccountStore + TokenStore + PendingTxStore + GenesisStore + BlockStore + ChainStateStore + Send
{
    /// Make every staged write durable, or none of them.
    fn commit(self) -> Result<(), StoreError>;

    /// Throw the staged writes away.
    fn discard(self);

    /// Number of keys this transaction would write on commit.
    fn pending_writes(&self) -> usize;
}

/// A store that can open [`LedgerTxn`]s.
pub trait LedgerStore: Send + Sync {
    type Txn: LedgerTxn;

    fn begin(&self) -> Result<Self::Txn, StoreError>;
}

/// [`LedgerStore`] over any [`KvBackend`].
pub struct KvStore<B: KvBackend> {
    backend: Arc<B>,
}

impl<B: KvBackend> KvStore<B> {
    pub fn new(backend: B) -> Self {
        Self {
            backend: Arc::new(backend),
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }
}

impl<B: KvBackend> Clone for KvStore<B> {
    fn clone(&self) -> Self {
        Self {
            backend: Arc::clone(&self.backend),
        }
    }
}

impl<B: KvBackend> LedgerStore for KvStore<B> {
    type Txn = StagedTxn<B>;

    fn begin(&self) -> Result<StagedTxn<B>, StoreError> {
        Ok(StagedTxn {
            backend: Arc::clone(&self.backend),
            writes: WriteSet::new(),
        })
    }
}

pub struct StagedTxn<B: KvBackend> {
    backend: Arc<B>,
    writes: WriteSet,
}

impl<B: KvBackend> StagedTxn<B> {
    pub(crate) fn get_raw(&self, table: Table, key: &[u8]) -> Result<Option<Vec<u8>>, StoreError> {
        match self.writes.get(&(table, key.to_vec())) {
            Some(staged) => Ok(staged.clone()),
            None => self.backend.get(table, key),
        }
    }

    /// Committed entries under `prefix`, overlaid with this transaction's own writes.
    pub(crate) fn scan_raw(
        &self,
        table: Table,
        prefix: &[u8],
    ) -> Result<Vec<(Vec<u8>, Vec<u8>)>, StoreError> {
        let mut merged: std::collections::BTreeMap<Vec<u8>, Vec<u8>> =
            self.backend.scan_prefix(table, prefix)?.into_iter().collect();
        let start = (table, prefix.to_vec());
        for ((t, key), value) in self.writes.range(start..) {
            if *t != table || !key.starts_with(prefix) {
                break;
            }
            match value {
                Some(v) => {
                    merged.insert(key.clone(), v.clone());
                }
                None => {
                    merged.remove(key);
                }
            }
        }
        Ok(merged.into_iter().collect())
    }

    pub(crate) fn put_raw(&mut self, table: Table, key: Vec<u8>, value: Vec<u8>) {
        self.writes.insert((table, key), Some(value));
    }

    pub(crate) fn delete_raw(&mut self, table: Table, key: Vec<u8>) {
        self.writes.insert((table, key), None);
    }

    pub(crate) fn get_value<T: DeserializeOwned>(
        &self,
        table: Table,
        key: &[u8],
    ) -> Result<Option<T>, StoreError> {
        match self.get_raw(table, key)? {
            Some(bytes) => decode_record(table, &bytes).map(Some),
            None => Ok(None),
        }
    }

    pub(crate) fn scan_values<T: DeserializeOwned>(
        &self,
        table: Table,
        prefix: &[u8],
    ) -> Result<Vec<T>, StoreError> {
        self.scan_raw(table, prefix)?
            .iter()
            .map(|(_, bytes)| decode_record(table, bytes))
            .collect()
    }

    pub(crate) fn put_value<T: Serialize>(
        &mut self,
        table: Table,
        key: Vec<u8>,
        value: &T,
    ) -> Result<(), StoreError> {
        let bytes = tessera_ledger::encode(value)?;
        self.put_raw(table, key, bytes);
        Ok(())
    }

    /// Blake2b-256 over every record under `prefix` in key order. Empty ⇒ zero hash.
    pub(crate) fn aggregate_hash(&self, table: Table, prefix: &[u8]) -> Result<BlockHash, StoreError> {
        let entries = self.scan_raw(table, prefix)?;
        if entries.is_empty() {
            return Ok(BlockHash::ZERO);
        }
        let lengths: Vec<[u8; 4]> = entries
            .iter()
            .map(|(_, v)| (v.len() as u32).to_be_bytes())
            .collect();
        let mut parts: Vec<&[u8]> = Vec::with_capacity(entries.len() * 3);
        for ((key, value), len) in entries.iter().zip(lengths.iter()) {
            parts.push(key);
            parts.push(len);
            parts.push(value);
        }
        Ok(BlockHash::new(tessera_crypto::blake2b_256_multi(&parts)))
    }
}

fn decode_record<T: DeserializeOwned>(table: Table, bytes: &[u8]) -> Result<T, StoreError> {
    tessera_ledger::decode(bytes)?
        .ok_or_else(|| StoreError::Corruption(format!("empty record in {}", table.name())))
}

impl<B: KvBackend> LedgerTxn for StagedTxn<B> {
    fn commit(self) -> Result<(), StoreError> {
        if self.writes.is_empty() {
            return Ok(());
        }
        let count = self.writes.len();
        self.backend.apply(self.writes)?;
        tracing::trace!(writes = count, "ledger transaction committed");
        Ok(())
    }

    fn discard(self) {
        if !self.writes.is_empty() {
            tracing::debug!(writes = self.writes.len(), "ledger transaction discarded");
        }
    }

    fn pending_writes(&self) -> usize {
        self.writes.len()
    }
}
