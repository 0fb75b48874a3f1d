//! Every available tier against the `adler` crate.

#![no_main]

use libfuzzer_sys::fuzz_target;
use tiered_adler32::{Tier, imp::scalar};

fuzz_target!(|data: &[u8]| {
    let reference = adler::adler32_slice(data);
    assert_eq!(scalar::update_bytewise(1, data), reference, "bytewise len={}", data.len());

    for tier in Tier::available() {
        let Some(update) = tier.get_imp() else { continue };
        let ours = update(1, data);
        assert_eq!(
            ours, reference,
            "{tier} mismatch: ours={ours:#010x}, reference={reference:#010x}, len={}",
            data.len()
        );
    }
});
