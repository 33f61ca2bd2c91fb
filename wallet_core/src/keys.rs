//! Key material for a wallet: generation, hex import and export.

use tessera_crypto::{derive_address, generate_keypair, keypair_from_private, private_key_from_hex};
use tessera_types::{Address, KeyPair, PrivateKey};

use crate::error::WalletError;

/// A fresh key pair from the OS random source.
pub fn generate() -> Result<KeyPair, WalletError> {
    Ok(generate_keypair()?)
}

/// Rebuild a key pair from a hex private key (optionally `0x`-prefixed).
pub fn import_private_key(hex_key: &str) -> Result<KeyPair, WalletError> {
    let private = private_key_from_hex(hex_key)?;
    Ok(keypair_from_private(private)?)
}

pub fn export_private_key(key: &PrivateKey) -> String {
    hex::encode(key.0)
}

pub fn address_of(keys: &KeyPair) -> Address {
    derive_address(&keys.public)
}
