//! Content hashes for blocks and transactions.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::TesseraError;

/// A 32-byte block hash.
///
/// [`BlockHash::ZERO`] is the chain's zero-hash sentinel: the predecessor recorded in the
/// genesis header.
#[derive(Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct BlockHash([u8; 32]);

/// A 32-byte transaction hash (the stamp of the transaction's logical content).
#[derive(Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TxHash([u8; 32]);

macro_rules! impl_hash32 {
    ($name:ident) => {
        impl $name {
            pub const ZERO: Self = Self([0u8; 32]);

            pub fn new(bytes: [u8; 32]) -> Self {
                Self(bytes)
            }

            pub fn as_bytes(&self) -> &[u8; 32] {
                &self.0
            }

            pub fn is_zero(&self) -> bool {
                self.0 == [0u8; 32]
            }

            /// Parse from 64 hex characters, with or without a `0x` prefix.
            pub fn from_hex(s: &str) -> Result<Self, TesseraError> {
                let raw = s.strip_prefix("0x").unwrap_or(s);
                let bytes = hex::decode(raw)
                    .map_err(|e| TesseraError::InvalidHash(format!("{s}: {e}")))?;
                let arr: [u8; 32] = bytes
                    .try_into()
                    .map_err(|_| TesseraError::InvalidHash(format!("{s}: expected 32 bytes")))?;
                Ok(Self(arr))
            }

            pub fn to_hex(&self) -> String {
                hex::encode(self.0)
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), hex::encode(&self.0[..4]))
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "0x{}", hex::encode(self.0))
            }
        }

        impl From<[u8; 32]> for $name {
            fn from(bytes: [u8; 32]) -> Self {
                Self(bytes)
            }
        }
    };
}

impl_hash32!(BlockHash);
impl_hash32!(TxHash);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_is_prefixed_hex() {
        let h = BlockHash::new([0xab; 32]);
        assert_eq!(h.to_string(), format!("0x{}", "ab".repeat(32)));
    }

    #[test]
    fn parse_accepts_both_forms() {
        let h = TxHash::new([7u8; 32]);
        assert_eq!(TxHash::from_hex(&h.to_string()).unwrap(), h);
        assert_eq!(TxHash::from_hex(&h.to_hex()).unwrap(), h);
    }

    #[test]
    fn parse_rejects_wrong_length() {
        assert!(BlockHash::from_hex("0xabcd").is_err());
        assert!(BlockHash::from_hex("zz").is_err());
    }

    #[test]
    fn zero_sentinel() {
        assert!(BlockHash::ZERO.is_zero());
        assert_eq!(BlockHash::default(), BlockHash::ZERO);
        assert!(!BlockHash::new([1u8; 32]).is_zero());
    }
}
