#[cfg(all(
    any(target_arch = "x86", target_arch = "x86_64"),
    any(feature = "std", target_feature = "ssse3")
))]
pub(super) mod kernel {
    #[cfg(target_arch = "x86")]
    use core::arch::x86::{
        __m128i, _mm_add_epi32, _mm_cvtsi32_si128, _mm_cvtsi128_si32,
        _mm_load_si128, _mm_loadu_si128, _mm_madd_epi16, _mm_maddubs_epi16, _mm_sad_epu8,
        _mm_set1_epi16, _mm_setzero_si128, _mm_shuffle_epi32, _mm_slli_epi32, _mm_unpackhi_epi64,
    };
    #[cfg(target_arch = "x86_64")]
    use core::arch::x86_64::{
        __m128i, _mm_add_epi32, _mm_cvtsi32_si128, _mm_cvtsi128_si32,
        _mm_load_si128, _mm_loadu_si128, _mm_madd_epi16, _mm_maddubs_epi16, _mm_sad_epu8,
        _mm_set1_epi16, _mm_setzero_si128, _mm_shuffle_epi32, _mm_slli_epi32, _mm_unpackhi_epi64,
    };

    use crate::imp::{BASE, NMAX, _MM_SHUFFLE, descending_weights, scalar, split};

    const BLOCK_SIZE: usize = 16;
    const WEIGHTS: [u8; 2 * BLOCK_SIZE] = descending_weights();

    // Compile-time proofs that operations cannot overflow
    const _: () = {
        assert!(
            (u8::MAX as usize) * 2 * 32 <= i16::MAX as usize,
            "Could not prove that `maddubs` pairs cannot saturate"
        );
        assert!(NMAX >= 2 * BLOCK_SIZE, "A run must hold at least one block");
    };

    /// Requires SSSE3; only handed out after that has been established.
    pub fn update(adler: u32, data: &[u8]) -> u32 { unsafe { update_imp(adler, data) } }

    #[inline]
    #[target_feature(enable = "ssse3")]
    pub(in crate::imp) unsafe fn update_imp(adler: u32, data: &[u8]) -> u32 {
        let (mut a, mut b) = split(adler);

        match data {
            | [] => return adler,
            | [byte] => return scalar::update_byte(a, b, *byte),
            | _ if data.len() < BLOCK_SIZE => return scalar::update_tail(a, b, data),
            | _ => {},
        }

        let mut rest = data;
        let mut budget = NMAX;

        let misalign = rest.as_ptr().addr() & (BLOCK_SIZE - 1);
        if misalign != 0 {
            let peel = BLOCK_SIZE - misalign;

            if rest.len() < BLOCK_SIZE + peel {
                // Too short to peel and still fill an aligned block.
                let (block, tail) = rest.split_at(BLOCK_SIZE);
                (a, b) = unsafe { accumulate::<false>(a, b, block) };
                return scalar::update_tail(a, b, tail);
            }

            let (head, tail) = rest.split_at(peel);
            scalar::fold(&mut a, &mut b, head);
            budget -= peel;
            rest = tail;
        }

        while rest.len() >= BLOCK_SIZE {
            let take = rest.len().min(budget) & !(BLOCK_SIZE - 1);
            let (run, tail) = rest.split_at(take);

            (a, b) = unsafe { accumulate::<true>(a, b, run) };
            a %= BASE;
            b %= BASE;

            budget = NMAX;
            rest = tail;
        }

        scalar::update_tail(a, b, rest)
    }

    /// Folds `run` into the unreduced sums. `run` is a whole number of blocks
    /// no longer than `NMAX`, and 16-byte aligned when `ALIGNED`.
    #[inline(always)]
    #[expect(clippy::cast_possible_wrap, reason = "Sums stay below 2^32; lanes are reinterpreted.")]
    unsafe fn accumulate<const ALIGNED: bool>(a: u32, b: u32, run: &[u8]) -> (u32, u32) {
        debug_assert!(
            run.len() % BLOCK_SIZE == 0 && run.len() <= NMAX,
            "Unexpected run size ({})",
            run.len()
        );

        unsafe {
            let zero_v = _mm_setzero_si128();
            let one_v = _mm_set1_epi16(1);
            let weight_hi_v = WEIGHTS.as_ptr().cast::<__m128i>().read_unaligned();
            let weight_lo_v = WEIGHTS.as_ptr().add(BLOCK_SIZE).cast::<__m128i>().read_unaligned();

            let mut vs1 = _mm_cvtsi32_si128(a as i32);
            let mut vs2 = _mm_cvtsi32_si128(b as i32);
            let mut vs2_lo = zero_v;
            let mut vs3 = zero_v;
            let mut vs1_prev = vs1;

            let (pairs, single) = run.as_chunks::<{ 2 * BLOCK_SIZE }>();

            for pair in pairs {
                #[expect(clippy::cast_ptr_alignment, reason = "Aligned only after peeling, `loadu` otherwise.")]
                let ptr = pair.as_ptr().cast::<__m128i>();
                let hi_v = load::<ALIGNED>(ptr);
                let lo_v = load::<ALIGNED>(ptr.add(1));

                vs1 = _mm_add_epi32(vs1, _mm_sad_epu8(hi_v, zero_v));
                vs3 = _mm_add_epi32(vs3, vs1_prev);
                vs1 = _mm_add_epi32(vs1, _mm_sad_epu8(lo_v, zero_v));

                vs2 = _mm_add_epi32(vs2, _mm_madd_epi16(_mm_maddubs_epi16(hi_v, weight_hi_v), one_v));
                vs2_lo = _mm_add_epi32(
                    vs2_lo,
                    _mm_madd_epi16(_mm_maddubs_epi16(lo_v, weight_lo_v), one_v),
                );

                vs1_prev = vs1;
            }

            vs2 = _mm_add_epi32(vs2, vs2_lo);
            vs2 = _mm_add_epi32(vs2, _mm_slli_epi32(vs3, 5));

            if !single.is_empty() {
                #[expect(clippy::cast_ptr_alignment, reason = "Aligned only after peeling, `loadu` otherwise.")]
                let block_v = load::<ALIGNED>(single.as_ptr().cast::<__m128i>());

                vs1 = _mm_add_epi32(vs1, _mm_sad_epu8(block_v, zero_v));
                vs2 = _mm_add_epi32(vs2, _mm_slli_epi32(vs1_prev, 4));
                vs2 = _mm_add_epi32(
                    vs2,
                    _mm_madd_epi16(_mm_maddubs_epi16(block_v, weight_lo_v), one_v),
                );
            }

            (reduce_add(vs1), reduce_add(vs2))
        }
    }

    #[inline(always)]
    unsafe fn load<const ALIGNED: bool>(ptr: *const __m128i) -> __m128i {
        unsafe { if ALIGNED { _mm_load_si128(ptr) } else { _mm_loadu_si128(ptr) } }
    }

    #[expect(clippy::cast_sign_loss, reason = "Intended.")]
    #[inline(always)]
    unsafe fn reduce_add(v: __m128i) -> u32 {
        unsafe {
            let hi = _mm_unpackhi_epi64(v, v);
            let sum = _mm_add_epi32(hi, v);
            let hi1 = _mm_shuffle_epi32(sum, _MM_SHUFFLE(2, 3, 0, 1));

            _mm_cvtsi128_si32(_mm_add_epi32(sum, hi1)) as u32
        }
    }
}

use super::Adler32Imp;

/// Resolves update implementation if CPU supports ssse3 instructions.
#[must_use]
pub fn get_imp() -> Option<Adler32Imp> { get_imp_inner() }

#[inline]
#[cfg(all(feature = "std", any(target_arch = "x86", target_arch = "x86_64")))]
fn get_imp_inner() -> Option<Adler32Imp> {
    std::arch::is_x86_feature_detected!("ssse3").then_some(kernel::update as Adler32Imp)
}

#[inline]
#[cfg(all(
    target_feature = "ssse3",
    any(target_arch = "x86", target_arch = "x86_64"),
    not(feature = "std")
))]
fn get_imp_inner() -> Option<Adler32Imp> { Some(kernel::update) }

#[inline]
#[cfg(not(all(
    any(target_arch = "x86", target_arch = "x86_64"),
    any(feature = "std", target_feature = "ssse3")
)))]
fn get_imp_inner() -> Option<Adler32Imp> { None }

#[cfg(test)]
mod tests {
    use crate::imp::testing;

    #[test]
    fn matches_oracle() {
        if let Some(update) = super::get_imp() {
            testing::exercise(update);
        }
    }

    /// Misaligned buffers too short to peel take the single unaligned block.
    #[test]
    fn short_misaligned() {
        if let Some(update) = super::get_imp() {
            let data = testing::random_bytes(64, 19);
            for offset in 1..16 {
                for len in 16..(32 - offset) {
                    #[expect(clippy::indexing_slicing, reason = "Test code.")]
                    let slice = &data[offset..offset + len];
                    assert_matches(update, slice);
                }
            }
        }
    }

    fn assert_matches(update: super::Adler32Imp, data: &[u8]) {
        assert_eq!(update(1, data), testing::oracle(1, data), "len({})", data.len());
    }
}
