//! Signature codec for the Tessera ledger.
//!
//! - **Blake2b-256** for every digest (stamps, aggregate state hashes, addresses)
//! - **Stamp**: canonical, normalized digest of any serializable value
//! - **secp256k1 ECDSA** with recoverable signatures, `v` biased by [`V_BIAS`]
//! - Address derivation from uncompressed public keys

pub mod address;
pub mod error;
pub mod hash;
pub mod keys;
pub mod sign;
pub mod stamp;

pub use address::derive_address;
pub use error::CryptoError;
pub use hash::{blake2b_256, blake2b_256_multi};
pub use keys::{generate_keypair, keypair_from_private, private_key_from_hex, public_from_private};
pub use sign::{
    from_bytes, recover_address, recover_public_key, sign, sign_digest, to_bytes,
    to_display_bytes, verify, SignatureParts, V_BIAS,
};
pub use stamp::{canonical_bytes, stamp, SIGNED_MESSAGE_TAG};
