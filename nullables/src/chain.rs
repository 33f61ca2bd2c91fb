//! Deterministic chain fixtures: a fixed authority key sealing a genesis block and a
//! hash-linked sequence of blocks on top of it.

use tessera_crypto::{derive_address, keypair_from_private};
use tessera_ledger::{
    build_genesis, BlockData, BlockHeader, BlockTransaction, GenesisBlockData, GenesisConfig,
    LedgerError, SignedTransaction, Transaction,
};
use tessera_types::{Address, Amount, BlockHash, ChainId, Nonce, PrivateKey, TokenId};

use crate::NullClock;

pub const AUTHORITY_SEED: u8 = 0xA1;
pub const GENESIS_TIME: u64 = 1_700_000_000;

/// Deterministic key and its address. Every nonzero seed is a valid key.
pub fn test_key(seed: u8) -> Result<(PrivateKey, Address), LedgerError> {
    let pair = keypair_from_private(PrivateKey([seed; 32]))?;
    let address = derive_address(&pair.public);
    Ok((pair.private, address))
}

pub struct ChainBuilder {
    chain_id: ChainId,
    authority_key: PrivateKey,
    authority: Address,
    fee: Amount,
    clock: NullClock,
    genesis: GenesisBlockData,
    head: BlockData,
    latest_token_id: TokenId,
}

impl ChainBuilder {
    pub fn new(chain_id: ChainId, coinbase_value: Amount, fee: Amount) -> Result<Self, LedgerError> {
        let (authority_key, authority) = test_key(AUTHORITY_SEED)?;
        let clock = NullClock::new(GENESIS_TIME);
        let genesis = build_genesis(
            &GenesisConfig {
                chain_id,
                coinbase_value,
                genesis_token_uri: "ipfs://genesis-token".into(),
                transaction_fee: fee,
                timestamp: clock.now(),
            },
            &authority_key,
        )?;
        Ok(Self {
            chain_id,
            authority_key,
            authority,
            fee,
            clock,
            head: genesis.block().clone(),
            genesis,
            latest_token_id: TokenId::GENESIS,
        })
    }

    pub fn chain_id(&self) -> ChainId {
        self.chain_id
    }

    pub fn authority_key(&self) -> &PrivateKey {
        &self.authority_key
    }

    pub fn authority(&self) -> Address {
        self.authority
    }

    pub fn fee(&self) -> Amount {
        self.fee
    }

    pub fn genesis(&self) -> &GenesisBlockData {
        &self.genesis
    }

    pub fn head(&self) -> &BlockData {
        &self.head
    }

    pub fn coin(
        &self,
        key: &PrivateKey,
        nonce: u64,
        to: Address,
        value: Amount,
    ) -> Result<SignedTransaction, LedgerError> {
        let from = address_of(key)?;
        Transaction::coin(self.chain_id, Nonce::from(nonce), from, to, value).sign(key)
    }

    pub fn token(
        &self,
        key: &PrivateKey,
        nonce: u64,
        to: Address,
        token_id: TokenId,
        token_nonce: u64,
    ) -> Result<SignedTransaction, LedgerError> {
        let from = address_of(key)?;
        Transaction::token(
            self.chain_id,
            Nonce::from(nonce),
            from,
            to,
            self.fee,
            token_id,
            format!("ipfs://token/{}", token_id.as_u64()),
            Nonce::from(token_nonce),
        )
        .sign(key)
    }

    /// Seal the next block over `transactions` and make it the head.
    pub fn block(&mut self, transactions: Vec<SignedTransaction>) -> Result<BlockData, LedgerError> {
        self.block_with(transactions, |_| {})
    }

    /// Like [`ChainBuilder::block`], letting the caller adjust the header before sealing.
    pub fn block_with(
        &mut self,
        transactions: Vec<SignedTransaction>,
        adjust: impl FnOnce(&mut BlockHeader),
    ) -> Result<BlockData, LedgerError> {
        self.clock.advance(1);
        for signed in &transactions {
            if signed.transaction.token_id > self.latest_token_id {
                self.latest_token_id = signed.transaction.token_id;
            }
        }
        let mut header = BlockHeader {
            chain_id: self.chain_id,
            number: self.head.number() + 1,
            prev_block_hash: self.head.hash,
            state_root: BlockHash::ZERO,
            tokens_root: BlockHash::ZERO,
            beneficiary: self.authority,
            transaction_fee: self.fee,
            latest_token_id: self.latest_token_id,
            header_nonce: Nonce::zero(),
        };
        adjust(&mut header);
        let transactions = transactions
            .into_iter()
            .map(|signed| BlockTransaction::new(signed, self.clock.now(), self.fee))
            .collect();
        let block = BlockData::sign(header, transactions, &self.authority_key)?;
        self.head = block.clone();
        Ok(block)
    }
}

fn address_of(key: &PrivateKey) -> Result<Address, LedgerError> {
    Ok(derive_address(&tessera_crypto::public_from_private(key)?))
}
