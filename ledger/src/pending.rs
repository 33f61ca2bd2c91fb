//! Submission envelopes: the authority-side mempool record and the local pending record.

use serde::{Deserialize, Serialize};
use tessera_types::{Nonce, Timestamp, TxHash};

use crate::transaction::SignedTransaction;
use crate::LedgerError;

/// Envelope submitted to the authority's mempool.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MempoolTransaction {
    pub id: TxHash,
    pub signed: SignedTransaction,
}

impl MempoolTransaction {
    pub fn new(signed: SignedTransaction) -> Result<Self, LedgerError> {
        Ok(Self {
            id: signed.hash()?,
            signed,
        })
    }
}

/// A locally signed transaction awaiting confirmation, keyed by nonce.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingTransaction {
    pub signed: SignedTransaction,
    pub submitted_at: Timestamp,
}

impl PendingTransaction {
    pub fn new(signed: SignedTransaction) -> Self {
        Self {
            signed,
            submitted_at: Timestamp::now(),
        }
    }

    pub fn nonce(&self) -> &Nonce {
        self.signed.nonce()
    }
}
