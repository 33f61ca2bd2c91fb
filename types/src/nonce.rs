//! Arbitrary-precision replay-protection counter.
//!
//! The domain works with [`Nonce`] as an unbounded unsigned integer. Only the
//! serialization boundary sees it as bytes: minimal big-endian, zero encoded as the empty
//! byte string, so the on-disk and wire forms stay independent of the integer library.

use ibig::UBig;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::cmp::Ordering;
use std::fmt;

#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Nonce(UBig);

impl Nonce {
    pub fn zero() -> Self {
        Self(UBig::from(0u8))
    }

    pub fn is_zero(&self) -> bool {
        self.0 == UBig::from(0u8)
    }

    /// The next counter value.
    pub fn next(&self) -> Self {
        Self(&self.0 + UBig::from(1u8))
    }

    /// Advance in place.
    pub fn increment(&mut self) {
        self.0 = &self.0 + UBig::from(1u8);
    }

    pub fn from_be_bytes(bytes: &[u8]) -> Self {
        Self(UBig::from_be_bytes(bytes))
    }

    /// Minimal big-endian bytes; empty for zero.
    pub fn to_be_bytes(&self) -> Vec<u8> {
        if self.is_zero() {
            return Vec::new();
        }
        let bytes = self.0.to_be_bytes();
        let first = bytes.iter().position(|b| *b != 0).unwrap_or(bytes.len());
        bytes[first..].to_vec()
    }

    pub fn as_ubig(&self) -> &UBig {
        &self.0
    }
}

impl Default for Nonce {
    fn default() -> Self {
        Self::zero()
    }
}

impl From<u64> for Nonce {
    fn from(n: u64) -> Self {
        Self(UBig::from(n))
    }
}

impl From<UBig> for Nonce {
    fn from(n: UBig) -> Self {
        Self(n)
    }
}

impl PartialOrd for Nonce {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Nonce {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.cmp(&other.0)
    }
}

impl fmt::Display for Nonce {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Debug for Nonce {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Nonce({})", self.0)
    }
}

impl Serialize for Nonce {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_bytes(&self.to_be_bytes())
    }
}

impl<'de> Deserialize<'de> for Nonce {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct NonceVisitor;

        impl<'de> serde::de::Visitor<'de> for NonceVisitor {
            type Value = Nonce;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                write!(f, "big-endian nonce bytes")
            }

            fn visit_bytes<E: serde::de::Error>(self, v: &[u8]) -> Result<Self::Value, E> {
                Ok(Nonce::from_be_bytes(v))
            }

            fn visit_byte_buf<E: serde::de::Error>(self, v: Vec<u8>) -> Result<Self::Value, E> {
                Ok(Nonce::from_be_bytes(&v))
            }

            fn visit_seq<A: serde::de::SeqAccess<'de>>(
                self,
                mut seq: A,
            ) -> Result<Self::Value, A::Error> {
                let mut bytes = Vec::new();
                while let Some(b) = seq.next_element::<u8>()? {
                    bytes.push(b);
                }
                Ok(Nonce::from_be_bytes(&bytes))
            }
        }

        deserializer.deserialize_bytes(NonceVisitor)
    }
}
