use proptest::prelude::*;

use tessera_crypto::{
    derive_address, from_bytes, keypair_from_private, recover_address, sign, to_bytes, verify,
    SignatureParts, V_BIAS,
};
use tessera_types::PrivateKey;

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    /// Any valid key signs any value into a signature that verifies and recovers the signer.
    #[test]
    fn signature_round_trip(seed in prop::array::uniform32(1u8..0xF0), value in any::<u64>(), memo in ".{0,16}") {
        let kp = keypair_from_private(PrivateKey(seed)).unwrap();
        let payload = (value, memo);
        let parts = sign(&payload, &kp.private).unwrap();
        prop_assert!(verify(&parts).is_ok());
        prop_assert_eq!(recover_address(&payload, &parts).unwrap(), derive_address(&kp.public));
    }

    /// from_bytes(to_bytes(sig)) == sig for every supported recovery id.
    #[test]
    fn signature_byte_round_trip(r in prop::array::uniform32(any::<u8>()), s in prop::array::uniform32(any::<u8>()), rec in 0u8..=1) {
        let parts = SignatureParts { v: V_BIAS + rec, r, s };
        let raw = to_bytes(&parts).unwrap();
        prop_assert_eq!(raw[64], rec);
        prop_assert_eq!(from_bytes(&raw), parts);
    }
}
