//! Blocks as produced by the authority and replayed by replicas.

use serde::{Deserialize, Serialize};
use tessera_crypto::{recover_address, SignatureParts};
use tessera_types::{Address, Amount, BlockHash, ChainId, Nonce, PrivateKey, Timestamp, TokenId};

use crate::transaction::{SignedTransaction, Transaction};
use crate::LedgerError;

/// A transaction as recorded in a block.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockTransaction {
    pub signed: SignedTransaction,
    pub timestamp: Timestamp,
    pub fee: Amount,
}

impl BlockTransaction {
    pub fn new(signed: SignedTransaction, timestamp: Timestamp, fee: Amount) -> Self {
        Self {
            signed,
            timestamp,
            fee,
        }
    }

    pub fn transaction(&self) -> &Transaction {
        &self.signed.transaction
    }
}

/// Header fields covered by the block hash.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockHeader {
    pub chain_id: ChainId,
    pub number: u64,
    pub prev_block_hash: BlockHash,
    pub state_root: BlockHash,
    pub tokens_root: BlockHash,
    pub beneficiary: Address,
    pub transaction_fee: Amount,
    pub latest_token_id: TokenId,
    pub header_nonce: Nonce,
}

impl BlockHeader {
    pub fn hash(&self) -> Result<BlockHash, LedgerError> {
        Ok(BlockHash::new(tessera_crypto::stamp(self)?))
    }
}

/// The unit of synchronization.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockData {
    pub hash: BlockHash,
    pub header: BlockHeader,
    pub header_signature: SignatureParts,
    pub transactions: Vec<BlockTransaction>,
    pub validator: Address,
}

impl BlockData {
    /// Seal a header and its transactions with the validator's key.
    pub fn sign(
        header: BlockHeader,
        transactions: Vec<BlockTransaction>,
        validator_key: &PrivateKey,
    ) -> Result<Self, LedgerError> {
        let hash = header.hash()?;
        let header_signature = tessera_crypto::sign(&header, validator_key)?;
        let public = tessera_crypto::public_from_private(validator_key)?;
        Ok(Self {
            hash,
            header,
            header_signature,
            transactions,
            validator: tessera_crypto::derive_address(&public),
        })
    }

    pub fn number(&self) -> u64 {
        self.header.number
    }

    pub fn prev_hash(&self) -> BlockHash {
        self.header.prev_block_hash
    }

    /// Check chain id, hash consistency, header signature, validator identity (when
    /// `expected_validator` is given), and every contained transaction.
    pub fn validate(
        &self,
        chain_id: ChainId,
        expected_validator: Option<Address>,
    ) -> Result<(), LedgerError> {
        if self.header.chain_id != chain_id {
            return Err(LedgerError::ChainMismatch {
                expected: chain_id,
                actual: self.header.chain_id,
            });
        }
        let computed = self.header.hash()?;
        if computed != self.hash {
            return Err(LedgerError::HashMismatch {
                declared: self.hash,
                computed,
            });
        }
        tessera_crypto::verify(&self.header_signature)?;
        let signer = recover_address(&self.header, &self.header_signature)?;
        if signer != self.validator {
            return Err(LedgerError::ValidatorMismatch {
                expected: self.validator,
                actual: signer,
            });
        }
        if let Some(expected) = expected_validator {
            if expected != self.validator {
                return Err(LedgerError::ValidatorMismatch {
                    expected,
                    actual: self.validator,
                });
            }
        }
        for tx in &self.transactions {
            let allow_same = tx.signed.sender() == self.header.beneficiary;
            tx.signed.validate(chain_id, allow_same)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tessera_crypto::{derive_address, keypair_from_private};

    fn authority() -> (PrivateKey, Address) {
        let kp = keypair_from_private(PrivateKey([0x21; 32])).unwrap();
        let addr = derive_address(&kp.public);
        (kp.private, addr)
    }

    fn header(beneficiary: Address) -> BlockHeader {
        BlockHeader {
            chain_id: ChainId::new(9),
            number: 4,
            prev_block_hash: BlockHash::new([1u8; 32]),
            state_root: BlockHash::ZERO,
            tokens_root: BlockHash::ZERO,
            beneficiary,
            transaction_fee: 2,
            latest_token_id: TokenId::new(0),
            header_nonce: Nonce::zero(),
        }
    }

    #[test]
    fn sealed_block_validates() {
        let (sk, addr) = authority();
        let fee_tx = Transaction::coin(ChainId::new(9), Nonce::zero(), addr, addr, 10)
            .sign(&sk)
            .unwrap();
        let block = BlockData::sign(
            header(addr),
            vec![BlockTransaction::new(fee_tx, Timestamp::new(1), 2)],
            &sk,
        )
        .unwrap();
        assert_eq!(block.validator, addr);
        block.validate(ChainId::new(9), Some(addr)).unwrap();
    }

    #[test]
    fn tampered_header_detected() {
        let (sk, addr) = authority();
        let mut block = BlockData::sign(header(addr), vec![], &sk).unwrap();
        block.header.transaction_fee = 0;
        assert!(matches!(
            block.validate(ChainId::new(9), None),
            Err(LedgerError::HashMismatch { .. })
        ));
    }

    #[test]
    fn foreign_validator_rejected() {
        let (sk, addr) = authority();
        let block = BlockData::sign(header(addr), vec![], &sk).unwrap();
        let other = Address::new([7u8; 20]);
        assert!(matches!(
            block.validate(ChainId::new(9), Some(other)),
            Err(LedgerError::ValidatorMismatch { .. })
        ));
    }

    #[test]
    fn self_transfer_only_for_beneficiary() {
        let (sk, addr) = authority();
        let user = keypair_from_private(PrivateKey([0x22; 32])).unwrap();
        let user_addr = derive_address(&user.public);
        let self_tx = Transaction::coin(ChainId::new(9), Nonce::zero(), user_addr, user_addr, 5)
            .sign(&user.private)
            .unwrap();
        let block = BlockData::sign(
            header(addr),
            vec![BlockTransaction::new(self_tx, Timestamp::new(1), 2)],
            &sk,
        )
        .unwrap();
        assert!(matches!(
            block.validate(ChainId::new(9), None),
            Err(LedgerError::SameAddress(_))
        ));
    }
}
