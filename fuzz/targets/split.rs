//! Splitting the input must not change the checksum, from any seed.

#![no_main]

use libfuzzer_sys::fuzz_target;
use tiered_adler32::Tier;

fuzz_target!(|input: (u16, u16, usize, &[u8])| {
    let (a, b, split, data) = input;
    let seed = (u32::from(b % 65521) << 16) | u32::from(a % 65521);
    let (head, tail) = data.split_at(split % (data.len() + 1));

    for tier in Tier::available() {
        let Some(update) = tier.get_imp() else { continue };
        assert_eq!(
            update(update(seed, head), tail),
            update(seed, data),
            "{tier} seed={seed:#010x} split={} len={}",
            head.len(),
            data.len()
        );
    }
});
