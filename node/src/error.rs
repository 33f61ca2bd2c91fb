use thiserror::Error;

use tessera_ledger::LedgerError;
use tessera_network::AuthorityError;
use tessera_store::StoreError;
use tessera_types::{Address, Amount, BlockHash, ChainId};

/// Why a sync cycle failed. Any of these discards the cycle's storage transaction.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("chain id must be nonzero")]
    ZeroChainId,

    #[error("asked for chain {expected}, authority answered for chain {actual}")]
    ChainMismatch { expected: ChainId, actual: ChainId },

    #[error("authority has no genesis block for chain {0}")]
    GenesisUnavailable(ChainId),

    #[error("authority has no chain state for chain {0}")]
    StateUnavailable(ChainId),

    #[error("authority advertised head {hash} of chain {chain_id} but cannot serve it")]
    HeadUnavailable { chain_id: ChainId, hash: BlockHash },

    #[error("advertised head {hash} is block {actual}, chain state claims {claimed}")]
    HeadNumberMismatch {
        hash: BlockHash,
        claimed: u64,
        actual: u64,
    },

    #[error("remote chain {chain_id} is at block {remote}, behind local block {local}")]
    RemoteBehind {
        chain_id: ChainId,
        local: u64,
        remote: u64,
    },

    #[error("authority cannot serve block {number} of chain {chain_id}")]
    BlockUnavailable { chain_id: ChainId, number: u64 },

    #[error("asked for block {expected}, authority served block {actual}")]
    UnexpectedBlockNumber { expected: u64, actual: u64 },

    #[error("block {number} links to {actual}, expected {expected}")]
    BrokenHashChain {
        number: u64,
        expected: BlockHash,
        actual: BlockHash,
    },

    #[error("walk ended at {reached}, advertised head is {expected}")]
    HeadNotReached {
        expected: BlockHash,
        reached: BlockHash,
    },

    #[error("invalid block {number}: {source}")]
    InvalidBlock {
        number: u64,
        #[source]
        source: LedgerError,
    },

    #[error("account {address} missing during {operation}")]
    MissingAccount {
        operation: &'static str,
        address: Address,
    },

    #[error("account {address} holds {balance}, cannot cover {needed}")]
    InsufficientBalance {
        address: Address,
        balance: Amount,
        needed: Amount,
    },

    #[error("transfer value {value} does not cover the block fee {fee}")]
    ValueBelowFee { value: Amount, fee: Amount },

    #[error("balance of {0} overflows")]
    BalanceOverflow(Address),

    #[error("local {table} hash {local} differs from the authority's {remote}")]
    StateHashMismatch {
        table: &'static str,
        local: BlockHash,
        remote: BlockHash,
    },

    #[error(transparent)]
    Authority(#[from] AuthorityError),

    #[error("store error during {operation}: {source}")]
    Store {
        operation: &'static str,
        #[source]
        source: StoreError,
    },

    #[error(transparent)]
    Ledger(#[from] LedgerError),
}

impl SyncError {
    /// Whether the next cycle may succeed without intervention.
    pub fn is_transient(&self) -> bool {
        matches!(self, SyncError::Authority(e) if e.is_transient())
    }
}

/// Attach the operation name to a store error.
pub(crate) trait StoreContext<T> {
    fn during(self, operation: &'static str) -> Result<T, SyncError>;
}

impl<T> StoreContext<T> for Result<T, StoreError> {
    fn during(self, operation: &'static str) -> Result<T, SyncError> {
        self.map_err(|source| SyncError::Store { operation, source })
    }
}

#[derive(Debug, Error)]
pub enum NodeError {
    #[error("config error: {0}")]
    Config(String),

    #[error(transparent)]
    Sync(#[from] SyncError),

    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("authority error: {0}")]
    Authority(#[from] AuthorityError),

    #[error("metrics error: {0}")]
    Metrics(#[from] prometheus::Error),

    #[error("metrics server error: {0}")]
    MetricsServer(#[source] std::io::Error),

    #[error("logging error: {0}")]
    Logging(String),
}
