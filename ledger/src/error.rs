use tessera_types::{Address, BlockHash, ChainId};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("chain id mismatch: expected {expected}, got {actual}")]
    ChainMismatch { expected: ChainId, actual: ChainId },

    #[error("invalid chain id 0")]
    ZeroChainId,

    #[error("transaction sender and recipient are the same address {0}")]
    SameAddress(Address),

    #[error("signer mismatch: declared {declared}, recovered {recovered}")]
    SignerMismatch { declared: Address, recovered: Address },

    #[error("signature error: {0}")]
    Signature(#[from] tessera_crypto::CryptoError),

    #[error("block hash mismatch: declared {declared}, computed {computed}")]
    HashMismatch { declared: BlockHash, computed: BlockHash },

    #[error("block validator mismatch: expected {expected}, got {actual}")]
    ValidatorMismatch { expected: Address, actual: Address },

    #[error("malformed genesis block: {0}")]
    MalformedGenesis(String),

    #[error("codec error: {0}")]
    Codec(String),
}
