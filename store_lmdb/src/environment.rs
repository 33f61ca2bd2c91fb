//! LMDB environment setup.

use std::path::Path;
use std::sync::Arc;

use heed::types::Bytes;
use heed::{Database, Env, EnvOpenOptions};
use tessera_store::Table;

use crate::LmdbError;

pub const DEFAULT_MAP_SIZE: usize = 1 << 30;

/// Wraps the LMDB environment and one database handle per [`Table`].
pub struct LmdbEnvironment {
    env: Arc<Env>,
    /// Indexed by `Table as usize`, in [`Table::ALL`] order.
    databases: Vec<Database<Bytes, Bytes>>,
}

impl LmdbEnvironment {
    /// Open or create an LMDB environment at the given path, creating every table.
    pub fn open(path: &Path, max_dbs: u32, map_size: usize) -> Result<Self, LmdbError> {
        std::fs::create_dir_all(path)?;
        let max_dbs = max_dbs.max(Table::ALL.len() as u32);
        // SAFETY: the environment is opened once per path by this process and never
        // mapped twice concurrently.
        let env = unsafe {
            EnvOpenOptions::new()
                .map_size(map_size)
                .max_dbs(max_dbs)
                .open(path)?
        };

        let mut wtxn = env.write_txn()?;
        let mut databases = Vec::with_capacity(Table::ALL.len());
        for table in Table::ALL {
            let db: Database<Bytes, Bytes> = env.create_database(&mut wtxn, Some(table.name()))?;
            databases.push(db);
        }
        wtxn.commit()?;

        tracing::info!(path = %path.display(), map_size, "opened LMDB environment");
        Ok(Self {
            env: Arc::new(env),
            databases,
        })
    }

    pub fn env(&self) -> &Env {
        &self.env
    }

    pub(crate) fn db(&self, table: Table) -> Database<Bytes, Bytes> {
        self.databases[table as usize]
    }
}
