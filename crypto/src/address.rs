//! Address derivation from public keys.
//!
//! Address = last 20 bytes of Blake2b-256 over the 64-byte public key body
//! (the uncompressed point without its `0x04` tag).

use tessera_types::{Address, PublicKey};

use crate::hash::blake2b_256;

/// Derive the account address controlled by `public_key`.
pub fn derive_address(public_key: &PublicKey) -> Address {
    let digest = blake2b_256(&public_key.0[1..]);
    let mut out = [0u8; 20];
    out.copy_from_slice(&digest[12..]);
    Address::new(out)
}
