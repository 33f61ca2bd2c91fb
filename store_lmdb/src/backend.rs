//! [`KvBackend`] over LMDB.

use std::path::Path;

use tessera_store::{KvBackend, KvStore, StoreError, Table, WriteSet};

use crate::environment::{LmdbEnvironment, DEFAULT_MAP_SIZE};
use crate::LmdbError;

pub struct LmdbBackend {
    env: LmdbEnvironment,
}

pub type LmdbStore = KvStore<LmdbBackend>;

impl LmdbBackend {
    pub fn new(env: LmdbEnvironment) -> Self {
        Self { env }
    }
}

/// Open (or create) the ledger store at `path`.
pub fn open_store(path: &Path, map_size: Option<usize>) -> Result<LmdbStore, StoreError> {
    let env = LmdbEnvironment::open(
        path,
        Table::ALL.len() as u32,
        map_size.unwrap_or(DEFAULT_MAP_SIZE),
    )?;
    Ok(KvStore::new(LmdbBackend::new(env)))
}

impl KvBackend for LmdbBackend {
    fn get(&self, table: Table, key: &[u8]) -> Result<Option<Vec<u8>>, StoreError> {
        let rtxn = self.env.env().read_txn().map_err(LmdbError::from)?;
        let value = self
            .env
            .db(table)
            .get(&rtxn, key)
            .map_err(LmdbError::from)?;
        Ok(value.map(|v| v.to_vec()))
    }

    fn scan_prefix(
        &self,
        table: Table,
        prefix: &[u8],
    ) -> Result<Vec<(Vec<u8>, Vec<u8>)>, StoreError> {
        let rtxn = self.env.env().read_txn().map_err(LmdbError::from)?;
        let iter = self
            .env
            .db(table)
            .prefix_iter(&rtxn, prefix)
            .map_err(LmdbError::from)?;
        let mut results = Vec::new();
        for result in iter {
            let (key, val) = result.map_err(LmdbError::from)?;
            results.push((key.to_vec(), val.to_vec()));
        }
        Ok(results)
    }

    fn apply(&self, writes: WriteSet) -> Result<(), StoreError> {
        let mut wtxn = self.env.env().write_txn().map_err(LmdbError::from)?;
        for ((table, key), value) in &writes {
            let db = self.env.db(*table);
            match value {
                Some(v) => db.put(&mut wtxn, key, v).map_err(LmdbError::from)?,
                None => {
                    db.delete(&mut wtxn, key).map_err(LmdbError::from)?;
                }
            }
        }
        // Dropping `wtxn` on an early return above aborts every write.
        wtxn.commit().map_err(LmdbError::from)?;
        Ok(())
    }
}
