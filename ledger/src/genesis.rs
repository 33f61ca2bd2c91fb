//! Genesis block: the bootstrap anchor of every chain.
//!
//! The genesis block has number 0, `prev_block_hash: BlockHash::ZERO`, and at least two
//! seed transactions: index 0 mints the coin supply to the coinbase, index 1 mints the
//! genesis token to the coinbase.

use serde::{Deserialize, Serialize};
use tessera_types::{Address, Amount, BlockHash, ChainId, Nonce, PrivateKey, Timestamp, TokenId};

use crate::block::{BlockData, BlockHeader, BlockTransaction};
use crate::transaction::{Transaction, TxKind};
use crate::LedgerError;

/// Parameters for minting a new chain's genesis block.
#[derive(Clone, Debug)]
pub struct GenesisConfig {
    pub chain_id: ChainId,
    /// Coin supply credited to the coinbase.
    pub coinbase_value: Amount,
    /// Metadata URI of token 0.
    pub genesis_token_uri: String,
    /// Fee charged per transaction from block 1 onward.
    pub transaction_fee: Amount,
    pub timestamp: Timestamp,
}

/// A [`BlockData`] known to have the genesis shape.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GenesisBlockData(BlockData);

impl GenesisBlockData {
    pub fn new(block: BlockData) -> Result<Self, LedgerError> {
        let genesis = Self(block);
        genesis.check_shape()?;
        Ok(genesis)
    }

    /// Shape rules. Decoded values bypass [`GenesisBlockData::new`], so consumers
    /// re-check before trusting a genesis received from elsewhere.
    pub fn check_shape(&self) -> Result<(), LedgerError> {
        let block = &self.0;
        if block.header.number != 0 {
            return Err(LedgerError::MalformedGenesis(format!(
                "number is {}",
                block.header.number
            )));
        }
        if !block.header.prev_block_hash.is_zero() {
            return Err(LedgerError::MalformedGenesis(
                "predecessor hash is not the zero hash".into(),
            ));
        }
        if block.transactions.len() < 2 {
            return Err(LedgerError::MalformedGenesis(format!(
                "expected at least 2 seed transactions, found {}",
                block.transactions.len()
            )));
        }
        if block.transactions[0].transaction().kind != TxKind::Coin {
            return Err(LedgerError::MalformedGenesis(
                "transaction 0 is not the coin mint".into(),
            ));
        }
        if block.transactions[1].transaction().kind != TxKind::Token {
            return Err(LedgerError::MalformedGenesis(
                "transaction 1 is not the token mint".into(),
            ));
        }
        Ok(())
    }

    pub fn block(&self) -> &BlockData {
        &self.0
    }

    pub fn into_block(self) -> BlockData {
        self.0
    }

    pub fn hash(&self) -> BlockHash {
        self.0.hash
    }

    pub fn coinbase_mint(&self) -> &Transaction {
        self.0.transactions[0].transaction()
    }

    pub fn token_mint(&self) -> &Transaction {
        self.0.transactions[1].transaction()
    }
}

/// Mint and seal a genesis block whose coinbase is the authority itself.
pub fn build_genesis(
    config: &GenesisConfig,
    authority_key: &PrivateKey,
) -> Result<GenesisBlockData, LedgerError> {
    if !config.chain_id.is_valid() {
        return Err(LedgerError::ZeroChainId);
    }
    let public = tessera_crypto::public_from_private(authority_key)?;
    let coinbase: Address = tessera_crypto::derive_address(&public);

    let coin_mint = Transaction::coin(
        config.chain_id,
        Nonce::zero(),
        coinbase,
        coinbase,
        config.coinbase_value,
    )
    .sign(authority_key)?;
    let token_mint = Transaction::token(
        config.chain_id,
        Nonce::zero(),
        coinbase,
        coinbase,
        0,
        TokenId::GENESIS,
        config.genesis_token_uri.clone(),
        Nonce::zero(),
    )
    .sign(authority_key)?;

    let header = BlockHeader {
        chain_id: config.chain_id,
        number: 0,
        prev_block_hash: BlockHash::ZERO,
        state_root: BlockHash::ZERO,
        tokens_root: BlockHash::ZERO,
        beneficiary: coinbase,
        transaction_fee: config.transaction_fee,
        latest_token_id: TokenId::GENESIS,
        header_nonce: Nonce::zero(),
    };
    let block = BlockData::sign(
        header,
        vec![
            BlockTransaction::new(coin_mint, config.timestamp, 0),
            BlockTransaction::new(token_mint, config.timestamp, 0),
        ],
        authority_key,
    )?;
    GenesisBlockData::new(block)
}
