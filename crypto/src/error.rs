use thiserror::Error;

/// Signature codec failures. None of these are retryable with the same inputs.
#[derive(Debug, Error)]
pub enum CryptoError {
    #[error("private key is missing")]
    MissingPrivateKey,

    #[error("invalid private key: {0}")]
    InvalidPrivateKey(String),

    #[error("failed to marshal value for stamping: {0}")]
    Marshal(String),

    #[error("signature failed post-sign verification")]
    VerificationFailed,

    #[error("invalid recovery id: v={0}")]
    InvalidRecoveryId(u8),

    #[error("invalid signature: {0}")]
    InvalidSignature(String),

    #[error("public key recovery failed: {0}")]
    Recovery(String),

    #[error("random source unavailable: {0}")]
    Entropy(String),
}
