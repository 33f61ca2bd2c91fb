//! Key layouts. Every key starts with the chain id in big-endian so one chain's records
//! form a contiguous, prefix-scannable range.

use tessera_types::{Address, BlockHash, ChainId, Nonce, TokenId};

pub fn chain(chain_id: ChainId) -> Vec<u8> {
    chain_id.key_prefix().to_vec()
}

pub fn account(chain_id: ChainId, address: &Address) -> Vec<u8> {
    let mut key = chain(chain_id);
    key.extend_from_slice(address.as_bytes());
    key
}

pub fn token(chain_id: ChainId, id: TokenId) -> Vec<u8> {
    let mut key = chain(chain_id);
    key.extend_from_slice(&id.as_u64().to_be_bytes());
    key
}

/// Length-prefixed so keys sort in numeric nonce order.
pub fn pending(chain_id: ChainId, nonce: &Nonce) -> Vec<u8> {
    let bytes = nonce.to_be_bytes();
    let mut key = chain(chain_id);
    key.extend_from_slice(&(bytes.len() as u32).to_be_bytes());
    key.extend_from_slice(&bytes);
    key
}

pub fn block(chain_id: ChainId, hash: &BlockHash) -> Vec<u8> {
    let mut key = chain(chain_id);
    key.extend_from_slice(hash.as_bytes());
    key
}

pub fn block_number(chain_id: ChainId, number: u64) -> Vec<u8> {
    let mut key = chain(chain_id);
    key.extend_from_slice(&number.to_be_bytes());
    key
}
