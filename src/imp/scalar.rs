//! Portable engine, and the correctness reference for every vector tier.
//!
//! [`update`] folds eight bytes at a time by splitting each little-endian word
//! into even- and odd-positioned bytes held in four 16-bit lanes of a `u64`.
//! Lane sums and lane prefix sums are recombined with closed-form weights
//! before each reduction. [`update_bytewise`] is the plain loop it must agree
//! with.

use super::{Adler32Imp, BASE, NMAX, join, split};

/// Words folded between reductions. Keeps every 16-bit lane of the prefix
/// accumulators below 2^16: `255 * 23 * 22 / 2 = 64515`.
const WORDS_PER_RUN: usize = 23;
const RUN: usize = WORDS_PER_RUN * 8;

/// Selects the even-positioned byte of every 16-bit lane.
const LANES: u64 = 0x00FF_00FF_00FF_00FF;

// Compile-time proofs for the lane arithmetic
const _: () = {
    const MAX_LANE: u64 = (u8::MAX as u64) * (WORDS_PER_RUN as u64);
    assert!(
        MAX_LANE * 10 <= u16::MAX as u64,
        "Could not prove that weighted lane sums stay within 16 bits"
    );
    assert!(
        (u8::MAX as u64) * (WORDS_PER_RUN as u64) * (WORDS_PER_RUN as u64 - 1) / 2
            <= u16::MAX as u64,
        "Could not prove that lane prefix sums stay within 16 bits"
    );
    assert!(RUN < NMAX, "A run must fit within one reduction window");
};

/// Folds `data` into `adler`.
#[must_use]
pub fn update(adler: u32, data: &[u8]) -> u32 {
    let (mut a, mut b) = split(adler);

    match data {
        | [] => return adler,
        | [byte] => return update_byte(a, b, *byte),
        | _ => {},
    }

    for run in data.chunks(RUN) {
        let (words, rest) = run.as_chunks::<8>();
        fold_words(&mut a, &mut b, words);
        fold(&mut a, &mut b, rest);

        a %= BASE;
        b %= BASE;
    }

    join(a, b)
}

/// One byte at a time, reducing every `NMAX` bytes.
#[must_use]
pub fn update_bytewise(adler: u32, data: &[u8]) -> u32 {
    let (mut a, mut b) = split(adler);

    let chunks = data.chunks_exact(NMAX);
    let remainder = chunks.remainder();

    for chunk in chunks {
        fold(&mut a, &mut b, chunk);
        a %= BASE;
        b %= BASE;
    }

    if remainder.is_empty() {
        return join(a, b);
    }

    fold(&mut a, &mut b, remainder);
    join(a % BASE, b % BASE)
}

/// Folds `src` into `adler` while copying it into `dst`.
///
/// # Panics
///
/// Panics if `src` and `dst` differ in length.
#[must_use]
pub fn update_and_copy(adler: u32, src: &[u8], dst: &mut [u8]) -> u32 {
    assert_eq!(
        src.len(),
        dst.len(),
        "source and destination lengths differ ({} != {})",
        src.len(),
        dst.len()
    );

    let (mut a, mut b) = split(adler);

    for (src, dst) in src.chunks(NMAX).zip(dst.chunks_mut(NMAX)) {
        for (byte, out) in src.iter().zip(dst) {
            *out = *byte;
            a += u32::from(*byte);
            b += a;
        }

        a %= BASE;
        b %= BASE;
    }

    join(a, b)
}

/// Applies one byte and reduces.
#[inline]
pub(crate) const fn update_byte(a: u32, b: u32, byte: u8) -> u32 {
    let a = (a + byte as u32) % BASE;
    let b = (b + a) % BASE;
    join(a, b)
}

/// Folds a buffer shorter than `NMAX` and reduces once. Used by the vector
/// tiers for short inputs and remainders.
#[cfg(any(target_arch = "x86", target_arch = "x86_64"))]
#[inline]
pub(crate) fn update_tail(mut a: u32, mut b: u32, data: &[u8]) -> u32 {
    debug_assert!(
        data.len() < NMAX,
        "Unexpected tail size (expected < {}, got {})",
        NMAX,
        data.len()
    );

    if let [byte] = data {
        return update_byte(a, b, *byte);
    }

    fold(&mut a, &mut b, data);
    join(a % BASE, b % BASE)
}

/// The recurrence itself, without reduction.
#[inline(always)]
pub(crate) fn fold(a: &mut u32, b: &mut u32, data: &[u8]) {
    for byte in data {
        *a += u32::from(*byte);
        *b += *a;
    }
}

#[inline(always)]
#[expect(clippy::cast_possible_truncation, reason = "Run length is at most RUN.")]
fn fold_words(a: &mut u32, b: &mut u32, words: &[[u8; 8]]) {
    debug_assert!(words.len() <= WORDS_PER_RUN, "Run too long ({})", words.len());

    let mut even = 0_u64;
    let mut odd = 0_u64;
    let mut even_prefix = 0_u64;
    let mut odd_prefix = 0_u64;

    // Every byte already seen is counted once more per later word.
    *b += *a * (words.len() * 8) as u32;

    for word in words {
        let v = u64::from_le_bytes(*word);

        even_prefix += even;
        odd_prefix += odd;
        even += v & LANES;
        odd += (v >> 8) & LANES;
    }

    *a += dot(even + odd, 0x0001_0001_0001_0001);
    *b += 8 * (lane_sum(even_prefix) + lane_sum(odd_prefix))
        + 2 * dot(even, 0x0004_0003_0002_0001)
        + 2 * dot(odd, 0x0003_0002_0001_0000)
        + dot(odd, 0x0001_0001_0001_0001);
}

/// Weighted sum of the four 16-bit lanes of `lanes`, with lane `i` weighted by
/// the `3 - i`th lane of `weights`. The result lands in the top lane; the
/// callers keep it within 16 bits.
#[inline(always)]
#[expect(clippy::cast_possible_truncation, reason = "Top lane is 16 bits.")]
const fn dot(lanes: u64, weights: u64) -> u32 { (lanes.wrapping_mul(weights) >> 48) as u32 }

/// Plain sum of the four 16-bit lanes.
#[inline(always)]
#[expect(clippy::cast_possible_truncation, reason = "Sum of four 16-bit values.")]
const fn lane_sum(lanes: u64) -> u32 {
    ((lanes & 0xFFFF) + ((lanes >> 16) & 0xFFFF) + ((lanes >> 32) & 0xFFFF) + (lanes >> 48)) as u32
}

/// The scalar engine is always available.
#[must_use]
#[expect(clippy::unnecessary_wraps, reason = "Match API.")]
pub fn get_imp() -> Option<Adler32Imp> { Some(update) }

#[cfg(test)]
mod tests {
    #[cfg(not(feature = "std"))]
    use std::{vec, vec::Vec};

    use super::{update, update_bytewise};
    use crate::imp::testing;

    #[test]
    fn zeroes() {
        assert_eq!(adler32(&[]), 1);
        assert_eq!(adler32(&[0]), 1 | 1 << 16);
        assert_eq!(adler32(&[0, 0]), 1 | 2 << 16);
        assert_eq!(adler32(&[0; 100]), 0x0064_0001);
        assert_eq!(adler32(&[0; 1024]), 0x0400_0001);
        assert_eq!(adler32(&vec![0; 1024 * 1024]), 0x00F0_0001);
    }

    #[test]
    fn ones() {
        assert_eq!(adler32(&[0xFF; 1024]), 0x79A6_FC2E);
        assert_eq!(adler32(&vec![0xFF; 1024 * 1024]), 0x8E88_EF11);
    }

    #[test]
    fn mixed() {
        assert_eq!(adler32(&[1]), 2 | 2 << 16);
        assert_eq!(adler32(&[40]), 41 | 41 << 16);
        assert_eq!(adler32(&vec![0xA5; 1024 * 1024]), 0xD500_9AB1);
    }

    /// Example calculation from <https://en.wikipedia.org/wiki/Adler-32>.
    #[test]
    fn wiki() { assert_eq!(adler32(b"Wikipedia"), 0x11E6_0398); }

    #[test]
    fn single_byte() { assert_eq!(adler32(b"a"), 0x0062_0062); }

    #[test]
    fn empty_keeps_state() {
        for seed in [0, 1, 0xDEAD_BEAF, u32::MAX] {
            assert_eq!(update(seed, &[]), seed);
            assert_eq!(update_bytewise(seed, &[]), seed);
        }
    }

    #[test]
    fn suite() {
        testing::exercise(update);
        testing::exercise(update_bytewise);
        testing::exercise_copy(update, super::update_and_copy);
    }

    /// Distinct values at every byte position, ascending and descending, so a
    /// lane or byte-order mixup in the word path cannot cancel out.
    #[test]
    #[expect(clippy::indexing_slicing, reason = "Test code.")]
    fn word_path_is_position_exact() {
        let ascending: Vec<u8> = (0..2048_u32).map(|i| (i.wrapping_mul(37) + 1) as u8).collect();
        let descending: Vec<u8> = ascending.iter().rev().copied().collect();

        for len in 0..=ascending.len() {
            for data in [&ascending[..len], &descending[..len]] {
                assert_eq!(update(1, data), update_bytewise(1, data), "len({len})");
                assert_eq!(update(1, data), testing::oracle(1, data), "len({len})");
            }
        }
    }

    #[test]
    #[expect(clippy::indexing_slicing, reason = "Test code.")]
    fn single_hot_byte_in_every_position() {
        let mut word_run = [0_u8; 200];
        for pos in 0..word_run.len() {
            word_run.fill(0);
            word_run[pos] = 0xFF;
            assert_eq!(
                update(0x1234_5678, &word_run),
                testing::oracle(0x1234_5678, &word_run),
                "pos({pos})"
            );
        }
    }

    #[test]
    #[cfg(any(target_arch = "x86", target_arch = "x86_64"))]
    fn tail_matches_update() {
        let data = testing::random_bytes(300, 17);
        for len in 0..=data.len() {
            #[expect(clippy::indexing_slicing, reason = "Test code.")]
            let slice = &data[..len];
            for &seed in testing::SEEDS {
                let (a, b) = crate::imp::split(seed);
                assert_eq!(super::update_tail(a, b, slice), testing::oracle(seed, slice), "len({len})");
            }
        }
    }

    fn adler32(data: &[u8]) -> u32 { update(1, data) }
}
