//! secp256k1 key generation.

use secp256k1::{Secp256k1, SecretKey};
use tessera_types::{KeyPair, PrivateKey, PublicKey};

use crate::CryptoError;

/// Parse the secret scalar, rejecting the all-zero ("nil") key and out-of-range values.
pub(crate) fn secret_key(private: &PrivateKey) -> Result<SecretKey, CryptoError> {
    if private.0 == [0u8; 32] {
        return Err(CryptoError::MissingPrivateKey);
    }
    SecretKey::from_slice(&private.0).map_err(|e| CryptoError::InvalidPrivateKey(e.to_string()))
}

/// Generate a new key pair from the operating system's random source.
pub fn generate_keypair() -> Result<KeyPair, CryptoError> {
    loop {
        let mut seed = [0u8; 32];
        getrandom::getrandom(&mut seed).map_err(|e| CryptoError::Entropy(e.to_string()))?;
        match keypair_from_private(PrivateKey(seed)) {
            Ok(kp) => return Ok(kp),
            // Astronomically unlikely: the scalar was zero or not below the curve order.
            Err(CryptoError::InvalidPrivateKey(_)) | Err(CryptoError::MissingPrivateKey) => {
                continue
            }
            Err(e) => return Err(e),
        }
    }
}

/// Derive the uncompressed public key from a private key.
pub fn public_from_private(private: &PrivateKey) -> Result<PublicKey, CryptoError> {
    let secp = Secp256k1::signing_only();
    let secret = secret_key(private)?;
    let public = secp256k1::PublicKey::from_secret_key(&secp, &secret);
    Ok(PublicKey(public.serialize_uncompressed()))
}

/// Reconstruct a full key pair from a private key.
pub fn keypair_from_private(private: PrivateKey) -> Result<KeyPair, CryptoError> {
    let public = public_from_private(&private)?;
    Ok(KeyPair { public, private })
}

/// Parse a hex-encoded (optionally `0x`-prefixed) 32-byte private key.
pub fn private_key_from_hex(s: &str) -> Result<PrivateKey, CryptoError> {
    let raw = s.trim().strip_prefix("0x").unwrap_or(s.trim());
    let bytes = hex::decode(raw).map_err(|e| CryptoError::InvalidPrivateKey(e.to_string()))?;
    let arr: [u8; 32] = bytes
        .try_into()
        .map_err(|_| CryptoError::InvalidPrivateKey("expected 32 bytes".into()))?;
    let key = PrivateKey(arr);
    secret_key(&key)?;
    Ok(key)
}
