//! Recoverable secp256k1 signatures over stamps.
//!
//! The recovery id `v` is biased by [`V_BIAS`] so signatures from this chain cannot be
//! confused with the generic 27/28 scheme. Raw 65-byte signatures (`r || s || v`) never
//! carry the bias; [`to_display_bytes`] keeps it for human-facing strings.

use secp256k1::ecdsa::{RecoverableSignature, RecoveryId};
use secp256k1::{Message, Secp256k1};
use serde::{Deserialize, Serialize};
use tessera_types::{Address, PrivateKey, PublicKey};

use crate::address::derive_address;
use crate::keys::secret_key;
use crate::stamp::stamp;
use crate::CryptoError;

/// Application-specific offset added to the recovery id.
pub const V_BIAS: u8 = 35;

/// secp256k1 group order `n`, big-endian.
const CURVE_ORDER: [u8; 32] = secp256k1::constants::CURVE_ORDER;

/// `n / 2`, the largest accepted `s` (low-s rule).
const HALF_CURVE_ORDER: [u8; 32] = [
    0x7f, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff,
    0x5d, 0x57, 0x6e, 0x73, 0x57, 0xa4, 0x50, 0x1d, 0xdf, 0xe9, 0x2f, 0x46, 0x68, 0x1b, 0x20, 0xa0,
];

/// Signature components with `r`/`s` as big-endian arrays and `v` carrying [`V_BIAS`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SignatureParts {
    pub v: u8,
    pub r: [u8; 32],
    pub s: [u8; 32],
}

impl SignatureParts {
    fn compact(&self) -> [u8; 64] {
        let mut out = [0u8; 64];
        out[..32].copy_from_slice(&self.r);
        out[32..].copy_from_slice(&self.s);
        out
    }

    fn recovery_id(&self) -> Result<RecoveryId, CryptoError> {
        let unbiased = self
            .v
            .checked_sub(V_BIAS)
            .filter(|v| *v <= 1)
            .ok_or(CryptoError::InvalidRecoveryId(self.v))?;
        RecoveryId::try_from(i32::from(unbiased))
            .map_err(|_| CryptoError::InvalidRecoveryId(self.v))
    }

    /// Hex string of the display form (bias preserved).
    pub fn to_hex(&self) -> String {
        hex::encode(to_display_bytes(self))
    }
}

/// Stamp `value` and sign the digest.
pub fn sign<T: Serialize + ?Sized>(
    value: &T,
    private_key: &PrivateKey,
) -> Result<SignatureParts, CryptoError> {
    let digest = stamp(value)?;
    sign_digest(&digest, private_key)
}

/// Sign a precomputed 32-byte digest.
///
/// The produced signature is recovered and verified against the signer's key before it is
/// returned; a mismatch fails closed with [`CryptoError::VerificationFailed`].
pub fn sign_digest(
    digest: &[u8; 32],
    private_key: &PrivateKey,
) -> Result<SignatureParts, CryptoError> {
    let secret = secret_key(private_key)?;
    let secp = Secp256k1::new();
    let message = Message::from_digest(*digest);
    let signature = secp.sign_ecdsa_recoverable(&message, &secret);

    let expected = secp256k1::PublicKey::from_secret_key(&secp, &secret);
    let recovered = secp
        .recover_ecdsa(&message, &signature)
        .map_err(|_| CryptoError::VerificationFailed)?;
    if recovered != expected
        || secp
            .verify_ecdsa(&message, &signature.to_standard(), &expected)
            .is_err()
    {
        return Err(CryptoError::VerificationFailed);
    }

    let (recovery_id, compact) = signature.serialize_compact();
    let mut r = [0u8; 32];
    let mut s = [0u8; 32];
    r.copy_from_slice(&compact[..32]);
    s.copy_from_slice(&compact[32..]);
    let parts = SignatureParts {
        v: i32::from(recovery_id) as u8 + V_BIAS,
        r,
        s,
    };
    verify(&parts).map_err(|_| CryptoError::VerificationFailed)?;
    Ok(parts)
}

/// Structural validity: unbiased `v` in {0, 1}, `0 < r < n`, `0 < s <= n/2`.
pub fn verify(parts: &SignatureParts) -> Result<(), CryptoError> {
    parts.recovery_id()?;
    if parts.r == [0u8; 32] || parts.r >= CURVE_ORDER {
        return Err(CryptoError::InvalidSignature("r out of range".into()));
    }
    if parts.s == [0u8; 32] || parts.s > HALF_CURVE_ORDER {
        return Err(CryptoError::InvalidSignature("s out of range or not low-s".into()));
    }
    Ok(())
}

/// Recover the public key that signed `value`.
pub fn recover_public_key<T: Serialize + ?Sized>(
    value: &T,
    parts: &SignatureParts,
) -> Result<PublicKey, CryptoError> {
    let digest = stamp(value)?;
    let raw = to_bytes(parts)?;
    let recovery_id = RecoveryId::try_from(i32::from(raw[64]))
        .map_err(|_| CryptoError::InvalidRecoveryId(parts.v))?;
    let signature = RecoverableSignature::from_compact(&raw[..64], recovery_id)
        .map_err(|e| CryptoError::InvalidSignature(e.to_string()))?;
    let secp = Secp256k1::verification_only();
    let public = secp
        .recover_ecdsa(&Message::from_digest(digest), &signature)
        .map_err(|e| CryptoError::Recovery(e.to_string()))?;
    Ok(PublicKey(public.serialize_uncompressed()))
}

/// Recover the address that signed `value`.
pub fn recover_address<T: Serialize + ?Sized>(
    value: &T,
    parts: &SignatureParts,
) -> Result<Address, CryptoError> {
    recover_public_key(value, parts).map(|pk| derive_address(&pk))
}

/// Raw 65-byte signature `r || s || v` with the bias removed.
pub fn to_bytes(parts: &SignatureParts) -> Result<[u8; 65], CryptoError> {
    let unbiased = parts.recovery_id().map(|_| parts.v - V_BIAS)?;
    let mut out = [0u8; 65];
    out[..64].copy_from_slice(&parts.compact());
    out[64] = unbiased;
    Ok(out)
}

/// Inverse of [`to_bytes`]: re-adds the bias to the last byte.
pub fn from_bytes(bytes: &[u8; 65]) -> SignatureParts {
    let mut r = [0u8; 32];
    let mut s = [0u8; 32];
    r.copy_from_slice(&bytes[..32]);
    s.copy_from_slice(&bytes[32..64]);
    SignatureParts {
        v: bytes[64].wrapping_add(V_BIAS),
        r,
        s,
    }
}

/// 65-byte form that keeps the bias, for display and storage strings.
pub fn to_display_bytes(parts: &SignatureParts) -> [u8; 65] {
    let mut out = [0u8; 65];
    out[..64].copy_from_slice(&parts.compact());
    out[64] = parts.v;
    out
}
