//! The key-value seam every persistence engine implements.

use std::collections::BTreeMap;

use crate::StoreError;

/// Logical tables. Each backend maps a table to its own keyspace (one named LMDB
/// database, one in-memory map).
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Table {
    Accounts,
    Tokens,
    Pending,
    Genesis,
    Blocks,
    BlockNumbers,
    ChainState,
}

impl Table {
    pub const ALL: [Table; 7] = [
        Table::Accounts,
        Table::Tokens,
        Table::Pending,
        Table::Genesis,
        Table::Blocks,
        Table::BlockNumbers,
        Table::ChainState,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Table::Accounts => "accounts",
            Table::Tokens => "tokens",
            Table::Pending => "pending",
            Table::Genesis => "genesis",
            Table::Blocks => "blocks",
            Table::BlockNumbers => "block_numbers",
            Table::ChainState => "chain_state",
        }
    }
}

/// Staged mutations: `Some(value)` is a put, `None` a delete.
pub type WriteSet = BTreeMap<(Table, Vec<u8>), Option<Vec<u8>>>;

/// Raw committed storage.
///
/// Implementations must apply a [`WriteSet`] atomically: after `apply` returns `Ok`, every
/// write is durable, and after it returns `Err`, none is.
pub trait KvBackend: Send + Sync + 'static {
    fn get(&self, table: Table, key: &[u8]) -> Result<Option<Vec<u8>>, StoreError>;

    /// All entries whose key starts with `prefix`, in ascending key order.
    fn scan_prefix(&self, table: Table, prefix: &[u8])
        -> Result<Vec<(Vec<u8>, Vec<u8>)>, StoreError>;

    fn apply(&self, writes: WriteSet) -> Result<(), StoreError>;
}
