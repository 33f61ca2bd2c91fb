//! Unsigned and signed transactions.

use serde::{Deserialize, Serialize};
use tessera_crypto::{recover_address, to_display_bytes, SignatureParts};
use tessera_types::{Address, Amount, ChainId, Nonce, PrivateKey, TokenId, TxHash};

use crate::LedgerError;

/// What a transaction moves.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TxKind {
    /// Coin transfer of `value`.
    Coin,
    /// Ownership transfer (or mint) of `token_id`; `value` carries the fee.
    Token,
}

/// The unsigned payload built by a wallet.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub chain_id: ChainId,
    pub nonce: Nonce,
    pub from: Address,
    pub to: Address,
    pub value: Amount,
    #[serde(default)]
    pub data: Vec<u8>,
    pub kind: TxKind,
    #[serde(default)]
    pub token_id: TokenId,
    #[serde(default)]
    pub token_metadata_uri: String,
    #[serde(default)]
    pub token_nonce: Nonce,
}

impl Transaction {
    /// A coin transfer.
    pub fn coin(chain_id: ChainId, nonce: Nonce, from: Address, to: Address, value: Amount) -> Self {
        Self {
            chain_id,
            nonce,
            from,
            to,
            value,
            data: Vec::new(),
            kind: TxKind::Coin,
            token_id: TokenId::default(),
            token_metadata_uri: String::new(),
            token_nonce: Nonce::zero(),
        }
    }

    /// A token ownership transfer. `fee` is carried in `value`.
    #[allow(clippy::too_many_arguments)]
    pub fn token(
        chain_id: ChainId,
        nonce: Nonce,
        from: Address,
        to: Address,
        fee: Amount,
        token_id: TokenId,
        token_metadata_uri: impl Into<String>,
        token_nonce: Nonce,
    ) -> Self {
        Self {
            chain_id,
            nonce,
            from,
            to,
            value: fee,
            data: Vec::new(),
            kind: TxKind::Token,
            token_id,
            token_metadata_uri: token_metadata_uri.into(),
            token_nonce,
        }
    }

    /// Stamp of the logical content.
    pub fn hash(&self) -> Result<TxHash, LedgerError> {
        Ok(TxHash::new(tessera_crypto::stamp(self)?))
    }

    /// Sign once, producing an immutable [`SignedTransaction`].
    pub fn sign(self, key: &PrivateKey) -> Result<SignedTransaction, LedgerError> {
        let signature = tessera_crypto::sign(&self, key)?;
        Ok(SignedTransaction {
            transaction: self,
            signature,
        })
    }
}

/// A transaction plus its recoverable signature.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedTransaction {
    pub transaction: Transaction,
    pub signature: SignatureParts,
}

impl SignedTransaction {
    /// Identity hash; covers the transaction only, not the signature.
    pub fn hash(&self) -> Result<TxHash, LedgerError> {
        self.transaction.hash()
    }

    pub fn nonce(&self) -> &Nonce {
        &self.transaction.nonce
    }

    pub fn sender(&self) -> Address {
        self.transaction.from
    }

    /// Address recovered from the signature.
    pub fn signer(&self) -> Result<Address, LedgerError> {
        Ok(recover_address(&self.transaction, &self.signature)?)
    }

    /// Check chain id, recovery id range, signer identity, and (unless
    /// `allow_same_address`) that the transaction does not pay its own sender.
    ///
    /// `allow_same_address` is granted to the block beneficiary, which pays itself fees.
    pub fn validate(&self, chain_id: ChainId, allow_same_address: bool) -> Result<(), LedgerError> {
        let tx = &self.transaction;
        if tx.chain_id != chain_id {
            return Err(LedgerError::ChainMismatch {
                expected: chain_id,
                actual: tx.chain_id,
            });
        }
        tessera_crypto::verify(&self.signature)?;
        let recovered = self.signer()?;
        if recovered != tx.from {
            return Err(LedgerError::SignerMismatch {
                declared: tx.from,
                recovered,
            });
        }
        if !allow_same_address && tx.from == tx.to {
            return Err(LedgerError::SameAddress(tx.from));
        }
        Ok(())
    }

    /// De-duplication equality: same nonce and same signature bytes.
    pub fn equals(&self, other: &SignedTransaction) -> bool {
        self.transaction.nonce == other.transaction.nonce
            && to_display_bytes(&self.signature) == to_display_bytes(&other.signature)
    }
}
