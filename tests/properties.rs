//! Property tests over every tier the running CPU supports.

use proptest::prelude::*;
use tiered_adler32::{Adler32, Tier, update, update_and_copy};

const BASE: u32 = 65521;

fn reduced_state() -> impl Strategy<Value = u32> {
    (0..BASE, 0..BASE).prop_map(|(a, b)| (b << 16) | a)
}

fn bytes(max: usize) -> impl Strategy<Value = Vec<u8>> {
    proptest::collection::vec(any::<u8>(), 0..=max)
}

proptest! {
    #[test]
    fn tiers_match_scalar(state in reduced_state(), data in bytes(12_000)) {
        let expected = tiered_adler32::imp::scalar::update_bytewise(state, &data);

        for tier in Tier::available() {
            let imp = tier.get_imp().expect("available tiers resolve");
            prop_assert_eq!(imp(state, &data), expected, "{}", tier);
        }
        prop_assert_eq!(update(state, &data), expected);
    }

    #[test]
    fn matches_reference_crate(data in bytes(20_000)) {
        prop_assert_eq!(update(1, &data), adler::adler32_slice(&data));
    }

    #[test]
    fn split_anywhere(data in bytes(8192), split in any::<usize>()) {
        let split = split % (data.len() + 1);
        let (head, tail) = data.split_at(split);

        for tier in Tier::available() {
            let imp = tier.get_imp().expect("available tiers resolve");
            prop_assert_eq!(imp(imp(1, head), tail), imp(1, &data), "{}", tier);
        }
    }

    #[test]
    fn chunked_hasher(data in bytes(16_384), chunk in 1_usize..=700) {
        for tier in Tier::available() {
            let mut hash = Adler32::with_tier(tier).expect("available tiers bind");
            for part in data.chunks(chunk) {
                hash.write(part);
            }
            prop_assert_eq!(hash.finish(), adler::adler32_slice(&data), "{}", tier);
        }
    }

    #[test]
    fn alignment_independent(data in bytes(2048), offset in 0_usize..64) {
        let mut backing = vec![0_u8; data.len() + 64];
        backing[offset..offset + data.len()].copy_from_slice(&data);
        let window = &backing[offset..offset + data.len()];

        for tier in Tier::available() {
            let imp = tier.get_imp().expect("available tiers resolve");
            prop_assert_eq!(imp(1, window), imp(1, &data), "{}", tier);
        }
    }

    #[test]
    fn fused_copy(state in reduced_state(), data in bytes(12_000), offset in 0_usize..64) {
        let mut backing = vec![0_u8; data.len() + 64];
        let dst = &mut backing[offset..offset + data.len()];

        prop_assert_eq!(update_and_copy(state, &data, dst), update(state, &data));
        prop_assert_eq!(&*dst, &data[..]);

        for tier in Tier::available() {
            if let Some(imp) = tier.get_copy_imp() {
                dst.fill(0);
                prop_assert_eq!(imp(state, &data, dst), update(state, &data), "{}", tier);
                prop_assert_eq!(&*dst, &data[..]);
            }
        }
    }
}
