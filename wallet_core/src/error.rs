use tessera_crypto::CryptoError;
use tessera_ledger::LedgerError;
use tessera_network::AuthorityError;
use tessera_store::StoreError;
use tessera_types::{Address, Amount, ChainId, Nonce, TokenId, TxHash};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum WalletError {
    #[error("invalid chain id 0")]
    ZeroChainId,

    #[error("transaction with nonce {nonce} is already pending")]
    TransactionPending { nonce: Nonce },

    #[error("no local chain state for chain {0}, sync first")]
    NotSynced(ChainId),

    #[error("insufficient balance: need {needed}, have {available}")]
    InsufficientBalance { needed: Amount, available: Amount },

    #[error("value {value} must exceed the transaction fee {fee}")]
    ValueNotAboveFee { value: Amount, fee: Amount },

    #[error("token {0} not found")]
    UnknownToken(TokenId),

    #[error("token {token_id} is owned by {owner}, not this wallet")]
    TokenNotOwned { token_id: TokenId, owner: Address },

    #[error("cannot send to own address {0}")]
    SelfTransfer(Address),

    #[error("no pending transaction")]
    NothingPending,

    #[error("authority rejected {hash}: {reason}")]
    Rejected { hash: TxHash, reason: String },

    #[error("submitting {hash} failed, kept as pending: {source}")]
    Submission {
        hash: TxHash,
        #[source]
        source: AuthorityError,
    },

    #[error("key error: {0}")]
    Key(#[from] CryptoError),

    #[error(transparent)]
    Ledger(#[from] LedgerError),

    #[error("store error during {operation}: {source}")]
    Store {
        operation: &'static str,
        #[source]
        source: StoreError,
    },
}

pub(crate) trait StoreContext<T> {
    fn during(self, operation: &'static str) -> Result<T, WalletError>;
}

impl<T> StoreContext<T> for Result<T, StoreError> {
    fn during(self, operation: &'static str) -> Result<T, WalletError> {
        self.map_err(|source| WalletError::Store { operation, source })
    }
}
