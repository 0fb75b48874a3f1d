#[cfg(all(
    any(target_arch = "x86", target_arch = "x86_64"),
    any(feature = "std", target_feature = "avx2")
))]
pub(super) mod kernel {
    #[cfg(target_arch = "x86")]
    use core::arch::x86::{
        __m256i, _mm_add_epi32, _mm_cvtsi128_si32, _mm_shuffle_epi32,
        _mm_unpackhi_epi64, _mm256_add_epi32, _mm256_castsi256_si128, _mm256_extracti128_si256,
        _mm256_loadu_si256, _mm256_madd_epi16, _mm256_maddubs_epi16, _mm256_sad_epu8,
        _mm256_set_epi32, _mm256_set1_epi16, _mm256_setzero_si256, _mm256_slli_epi32,
    };
    #[cfg(target_arch = "x86_64")]
    use core::arch::x86_64::{
        __m256i, _mm_add_epi32, _mm_cvtsi128_si32, _mm_shuffle_epi32,
        _mm_unpackhi_epi64, _mm256_add_epi32, _mm256_castsi256_si128, _mm256_extracti128_si256,
        _mm256_loadu_si256, _mm256_madd_epi16, _mm256_maddubs_epi16, _mm256_sad_epu8,
        _mm256_set_epi32, _mm256_set1_epi16, _mm256_setzero_si256, _mm256_slli_epi32,
    };

    use crate::imp::{BASE, NMAX, _MM_SHUFFLE, descending_weights, join, scalar, split, ssse3};

    const BLOCK_SIZE: usize = 32;
    const WEIGHTS: [u8; 2 * BLOCK_SIZE] = descending_weights();

    // Compile-time proofs that operations cannot overflow
    const _: () = {
        assert!(
            (u8::MAX as usize) * (64 + 63) <= i16::MAX as usize,
            "Could not prove that `maddubs` pairs cannot saturate with weights up to 64"
        );
        assert!(NMAX >= 2 * BLOCK_SIZE, "A run must hold at least one block");
    };

    /// Requires AVX2; only handed out after that has been established.
    pub fn update(adler: u32, data: &[u8]) -> u32 { unsafe { update_imp(adler, data) } }

    #[inline]
    #[target_feature(enable = "avx2")]
    pub(in crate::imp) unsafe fn update_imp(adler: u32, data: &[u8]) -> u32 {
        let (mut a, mut b) = split(adler);
        let mut rest = data;

        loop {
            if rest.is_empty() {
                return join(a, b);
            }
            if rest.len() < 16 {
                return scalar::update_tail(a, b, rest);
            }
            if rest.len() < BLOCK_SIZE {
                return unsafe { ssse3::kernel::update_imp(join(a, b), rest) };
            }

            while rest.len() >= BLOCK_SIZE {
                let take = rest.len().min(NMAX) & !(BLOCK_SIZE - 1);
                let (run, tail) = rest.split_at(take);

                (a, b) = unsafe { accumulate(a, b, run) };
                a %= BASE;
                b %= BASE;

                rest = tail;
            }
        }
    }

    /// Folds `run` into the unreduced sums. `run` is a whole number of blocks
    /// no longer than `NMAX`.
    #[inline(always)]
    #[expect(clippy::cast_possible_wrap, reason = "Sums stay below 2^32; lanes are reinterpreted.")]
    unsafe fn accumulate(a: u32, b: u32, run: &[u8]) -> (u32, u32) {
        debug_assert!(
            run.len() % BLOCK_SIZE == 0 && run.len() <= NMAX,
            "Unexpected run size ({})",
            run.len()
        );

        unsafe {
            let zero_v = _mm256_setzero_si256();
            let one_v = _mm256_set1_epi16(1);
            #[expect(clippy::cast_ptr_alignment, reason = "Unaligned reads used.")]
            let weight_hi_v = _mm256_loadu_si256(WEIGHTS.as_ptr().cast::<__m256i>());
            #[expect(clippy::cast_ptr_alignment, reason = "Unaligned reads used.")]
            let weight_lo_v = _mm256_loadu_si256(WEIGHTS.as_ptr().add(BLOCK_SIZE).cast::<__m256i>());

            let mut vs1 = _mm256_set_epi32(0, 0, 0, 0, 0, 0, 0, a as i32);
            let mut vs2 = _mm256_set_epi32(0, 0, 0, 0, 0, 0, 0, b as i32);
            let mut vs2_lo = zero_v;
            let mut vs3 = zero_v;
            let mut vs1_prev = vs1;

            let (pairs, single) = run.as_chunks::<{ 2 * BLOCK_SIZE }>();

            for pair in pairs {
                #[expect(clippy::cast_ptr_alignment, reason = "Unaligned reads used.")]
                let ptr = pair.as_ptr().cast::<__m256i>();
                let hi_v = _mm256_loadu_si256(ptr);
                let lo_v = _mm256_loadu_si256(ptr.add(1));

                vs1 = _mm256_add_epi32(vs1, _mm256_sad_epu8(hi_v, zero_v));
                vs3 = _mm256_add_epi32(vs3, vs1_prev);
                vs1 = _mm256_add_epi32(vs1, _mm256_sad_epu8(lo_v, zero_v));

                // 32 bytes to 16 shorts, then 16 shorts to 8 ints
                let short_hi = _mm256_maddubs_epi16(hi_v, weight_hi_v);
                let short_lo = _mm256_maddubs_epi16(lo_v, weight_lo_v);
                vs2 = _mm256_add_epi32(vs2, _mm256_madd_epi16(short_hi, one_v));
                vs2_lo = _mm256_add_epi32(vs2_lo, _mm256_madd_epi16(short_lo, one_v));

                vs1_prev = vs1;
            }

            vs2 = _mm256_add_epi32(vs2, vs2_lo);
            vs2 = _mm256_add_epi32(vs2, _mm256_slli_epi32(vs3, 6));

            if !single.is_empty() {
                #[expect(clippy::cast_ptr_alignment, reason = "Unaligned reads used.")]
                let block_v = _mm256_loadu_si256(single.as_ptr().cast::<__m256i>());

                vs1 = _mm256_add_epi32(vs1, _mm256_sad_epu8(block_v, zero_v));
                vs2 = _mm256_add_epi32(vs2, _mm256_slli_epi32(vs1_prev, 5));
                vs2 = _mm256_add_epi32(
                    vs2,
                    _mm256_madd_epi16(_mm256_maddubs_epi16(block_v, weight_lo_v), one_v),
                );
            }

            (reduce_add(vs1), reduce_add(vs2))
        }
    }

    #[expect(clippy::cast_sign_loss, reason = "Safe.")]
    #[inline(always)]
    unsafe fn reduce_add(v: __m256i) -> u32 {
        unsafe {
            let sum = _mm_add_epi32(_mm256_castsi256_si128(v), _mm256_extracti128_si256(v, 1));
            let hi = _mm_unpackhi_epi64(sum, sum);

            let sum1 = _mm_add_epi32(hi, sum);
            let hi1 = _mm_shuffle_epi32(sum1, _MM_SHUFFLE(2, 3, 0, 1));

            _mm_cvtsi128_si32(_mm_add_epi32(sum1, hi1)) as u32
        }
    }
}

use super::Adler32Imp;

/// Resolves update implementation if CPU supports avx2 instructions.
#[must_use]
pub fn get_imp() -> Option<Adler32Imp> { get_imp_inner() }

#[inline]
#[cfg(all(feature = "std", any(target_arch = "x86", target_arch = "x86_64")))]
fn get_imp_inner() -> Option<Adler32Imp> {
    std::arch::is_x86_feature_detected!("avx2").then_some(kernel::update as Adler32Imp)
}

#[inline]
#[cfg(all(
    target_feature = "avx2",
    any(target_arch = "x86", target_arch = "x86_64"),
    not(feature = "std")
))]
fn get_imp_inner() -> Option<Adler32Imp> { Some(kernel::update) }

#[inline]
#[cfg(not(all(
    any(target_arch = "x86", target_arch = "x86_64"),
    any(feature = "std", target_feature = "avx2")
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

    /// Every length that lands in the 16..32 delegation band after whole runs.
    #[test]
    fn delegates_remainders() {
        if let Some(update) = super::get_imp() {
            let data = testing::random_bytes(crate::imp::NMAX + 96, 23);
            for len in (crate::imp::NMAX - 40)..data.len() {
                #[expect(clippy::indexing_slicing, reason = "Test code.")]
                let slice = &data[..len];
                assert_eq!(update(1, slice), testing::oracle(1, slice), "len({len})");
            }
        }
    }
}
