use proptest::prelude::*;

use tessera_types::{Address, BlockHash, Nonce, Timestamp, TxHash};

proptest! {
    /// BlockHash roundtrip: new -> as_bytes -> new produces identical hash.
    #[test]
    fn block_hash_roundtrip(bytes in prop::array::uniform32(0u8..)) {
        let hash = BlockHash::new(bytes);
        prop_assert_eq!(hash.as_bytes(), &bytes);
    }

    /// BlockHash::is_zero is true only for all-zero bytes.
    #[test]
    fn block_hash_is_zero_correct(bytes in prop::array::uniform32(0u8..)) {
        let hash = BlockHash::new(bytes);
        prop_assert_eq!(hash.is_zero(), bytes == [0u8; 32]);
    }

    /// Display form parses back to the same hash.
    #[test]
    fn tx_hash_hex_roundtrip(bytes in prop::array::uniform32(0u8..)) {
        let hash = TxHash::new(bytes);
        prop_assert_eq!(TxHash::from_hex(&hash.to_string()).unwrap(), hash);
    }

    /// Address display form parses back to the same address.
    #[test]
    fn address_hex_roundtrip(bytes in prop::array::uniform20(0u8..)) {
        let addr = Address::new(bytes);
        prop_assert_eq!(addr.to_string().parse::<Address>().unwrap(), addr);
    }

    /// Nonce byte encoding preserves the integer value and is minimal.
    #[test]
    fn nonce_bytes_roundtrip(n in any::<u64>()) {
        let nonce = Nonce::from(n);
        let bytes = nonce.to_be_bytes();
        prop_assert!(bytes.first() != Some(&0));
        prop_assert_eq!(Nonce::from_be_bytes(&bytes), nonce);
    }

    /// Nonce ordering matches the ordering of the underlying integers.
    #[test]
    fn nonce_ordering(a in any::<u64>(), b in any::<u64>()) {
        prop_assert_eq!(Nonce::from(a) <= Nonce::from(b), a <= b);
        prop_assert_eq!(Nonce::from(a).next() > Nonce::from(a), true);
    }

    /// Timestamp ordering: new(a) <= new(b) iff a <= b.
    #[test]
    fn timestamp_ordering(a in 0u64..u64::MAX, b in 0u64..u64::MAX) {
        let ta = Timestamp::new(a);
        let tb = Timestamp::new(b);
        prop_assert_eq!(ta <= tb, a <= b);
    }
}
