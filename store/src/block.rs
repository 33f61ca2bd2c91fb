//! Genesis and block storage.

use tessera_ledger::{BlockData, GenesisBlockData};
use tessera_types::{BlockHash, ChainId};

use crate::backend::{KvBackend, Table};
use crate::transaction::StagedTxn;
use crate::{keys, StoreError};

pub trait GenesisStore {
    fn get_genesis(&self, chain_id: ChainId) -> Result<Option<GenesisBlockData>, StoreError>;
    fn put_genesis(&mut self, genesis: &GenesisBlockData) -> Result<(), StoreError>;
}

/// Blocks keyed by hash, with a number index.
pub trait BlockStore {
    fn put_block(&mut self, block: &BlockData) -> Result<(), StoreError>;

    fn get_block_by_hash(
        &self,
        chain_id: ChainId,
        hash: &BlockHash,
    ) -> Result<Option<BlockData>, StoreError>;

    fn get_block_by_number(
        &self,
        chain_id: ChainId,
        number: u64,
    ) -> Result<Option<BlockData>, StoreError>;

    /// Highest stored block number, `None` when the chain has no blocks.
    fn latest_block_number(&self, chain_id: ChainId) -> Result<Option<u64>, StoreError>;
}

impl<B: KvBackend> GenesisStore for StagedTxn<B> {
    fn get_genesis(&self, chain_id: ChainId) -> Result<Option<GenesisBlockData>, StoreError> {
        self.get_value(Table::Genesis, &keys::chain(chain_id))
    }

    fn put_genesis(&mut self, genesis: &GenesisBlockData) -> Result<(), StoreError> {
        let key = keys::chain(genesis.block().header.chain_id);
        self.put_value(Table::Genesis, key, genesis)
    }
}

impl<B: KvBackend> BlockStore for StagedTxn<B> {
    fn put_block(&mut self, block: &BlockData) -> Result<(), StoreError> {
        let chain_id = block.header.chain_id;
        self.put_value(Table::Blocks, keys::block(chain_id, &block.hash), block)?;
        self.put_raw(
            Table::BlockNumbers,
            keys::block_number(chain_id, block.number()),
            block.hash.as_bytes().to_vec(),
        );
        Ok(())
    }

    fn get_block_by_hash(
        &self,
        chain_id: ChainId,
        hash: &BlockHash,
    ) -> Result<Option<BlockData>, StoreError> {
        self.get_value(Table::Blocks, &keys::block(chain_id, hash))
    }

    fn get_block_by_number(
        &self,
        chain_id: ChainId,
        number: u64,
    ) -> Result<Option<BlockData>, StoreError> {
        let raw = match self.get_raw(Table::BlockNumbers, &keys::block_number(chain_id, number))? {
            Some(raw) => raw,
            None => return Ok(None),
        };
        let bytes: [u8; 32] = raw.as_slice().try_into().map_err(|_| {
            StoreError::Corruption(format!("block number index {number} holds {} bytes", raw.len()))
        })?;
        let hash = BlockHash::new(bytes);
        match self.get_block_by_hash(chain_id, &hash)? {
            Some(block) => Ok(Some(block)),
            None => Err(StoreError::Corruption(format!(
                "block {number} indexed as {hash} but not stored"
            ))),
        }
    }

    fn latest_block_number(&self, chain_id: ChainId) -> Result<Option<u64>, StoreError> {
        let prefix = keys::chain(chain_id);
        let entries = self.scan_raw(Table::BlockNumbers, &prefix)?;
        let Some((key, _)) = entries.last() else {
            return Ok(None);
        };
        let suffix: [u8; 8] = key[prefix.len()..]
            .try_into()
            .map_err(|_| StoreError::Corruption("malformed block number key".into()))?;
        Ok(Some(u64::from_be_bytes(suffix)))
    }
}
