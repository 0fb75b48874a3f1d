//! The fused copy must checksum like `update` and leave `dst == src`.

#![no_main]

use libfuzzer_sys::fuzz_target;
use tiered_adler32::{Tier, update, update_and_copy};

fuzz_target!(|input: (u8, &[u8])| {
    let (offset, data) = input;
    let offset = usize::from(offset % 64);
    let mut backing = vec![0_u8; data.len() + 64];
    let dst = &mut backing[offset..offset + data.len()];

    let expected = update(1, data);
    assert_eq!(update_and_copy(1, data, dst), expected);
    assert_eq!(&*dst, data);

    for tier in Tier::available() {
        let Some(update_and_copy) = tier.get_copy_imp() else { continue };
        dst.fill(0);
        assert_eq!(update_and_copy(1, data, dst), expected, "{tier}");
        assert_eq!(&*dst, data, "{tier}");
    }
});
