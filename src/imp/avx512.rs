#[cfg(all(
    any(target_arch = "x86", target_arch = "x86_64"),
    any(
        feature = "std",
        all(target_feature = "avx512f", target_feature = "avx512bw", target_feature = "avx512vnni")
    )
))]
pub(super) mod kernel {
    #[cfg(target_arch = "x86")]
    use core::arch::x86::{
        __m512i, _mm_cvtsi32_si128, _mm512_add_epi32, _mm512_dpbusd_epi32, _mm512_reduce_add_epi32,
        _mm512_sad_epu8, _mm512_setzero_si512, _mm512_slli_epi32, _mm512_zextsi128_si512,
    };
    #[cfg(target_arch = "x86_64")]
    use core::arch::x86_64::{
        __m512i, _mm_cvtsi32_si128, _mm512_add_epi32, _mm512_dpbusd_epi32, _mm512_reduce_add_epi32,
        _mm512_sad_epu8, _mm512_setzero_si512, _mm512_slli_epi32, _mm512_zextsi128_si512,
    };

    use crate::imp::{BASE, NMAX, avx2, descending_weights, join, split, ssse3};

    const BLOCK_SIZE: usize = 64;
    const WEIGHTS: [u8; BLOCK_SIZE] = descending_weights();

    // Compile-time proofs that operations cannot overflow
    const _: () = {
        assert!(
            BLOCK_SIZE <= i8::MAX as usize,
            "Weights must fit the signed operand of `vpdpbusd`"
        );
        assert!(NMAX >= 2 * BLOCK_SIZE, "A run must hold at least one pair of blocks");
    };

    /// Requires AVX-512F, AVX-512BW and AVX-512VNNI; only handed out after that
    /// has been established.
    pub fn update(adler: u32, data: &[u8]) -> u32 { unsafe { update_imp(adler, data) } }

    #[inline]
    #[target_feature(enable = "avx512f,avx512bw,avx512vnni")]
    unsafe fn update_imp(adler: u32, data: &[u8]) -> u32 {
        let (mut a, mut b) = split(adler);
        let mut rest = data;

        loop {
            if rest.len() < 32 {
                return unsafe { ssse3::kernel::update_imp(join(a, b), rest) };
            }
            if rest.len() < BLOCK_SIZE {
                return unsafe { avx2::kernel::update_imp(join(a, b), rest) };
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
    #[expect(
        clippy::cast_possible_wrap,
        clippy::cast_sign_loss,
        reason = "Sums stay below 2^32; lanes are reinterpreted."
    )]
    unsafe fn accumulate(a: u32, b: u32, run: &[u8]) -> (u32, u32) {
        debug_assert!(
            run.len() % BLOCK_SIZE == 0 && run.len() <= NMAX,
            "Unexpected run size ({})",
            run.len()
        );

        unsafe {
            let zero_v = _mm512_setzero_si512();
            let weight_v = WEIGHTS.as_ptr().cast::<__m512i>().read_unaligned();

            let mut vs1 = _mm512_zextsi128_si512(_mm_cvtsi32_si128(a as i32));
            let mut vs2 = _mm512_zextsi128_si512(_mm_cvtsi32_si128(b as i32));
            let mut vs2_odd = zero_v;
            let mut vs3 = zero_v;
            let mut vs1_prev = vs1;

            let (blocks, _) = run.as_chunks::<BLOCK_SIZE>();
            let (lead, pairs) = blocks.split_at(blocks.len() % 2);

            // An odd block count leaves one block ahead of the pairs
            for block in lead {
                let block_v = block.as_ptr().cast::<__m512i>().read_unaligned();

                vs1 = _mm512_add_epi32(vs1, _mm512_sad_epu8(block_v, zero_v));
                vs3 = _mm512_add_epi32(vs3, vs1_prev);
                vs2 = _mm512_dpbusd_epi32(vs2, block_v, weight_v);
                vs1_prev = vs1;
            }

            for pair in pairs.chunks_exact(2) {
                let (even, odd) = (pair.as_ptr(), pair.as_ptr().add(1));
                let even_v = even.cast::<__m512i>().read_unaligned();
                let odd_v = odd.cast::<__m512i>().read_unaligned();

                vs1 = _mm512_add_epi32(vs1, _mm512_sad_epu8(even_v, zero_v));
                vs3 = _mm512_add_epi32(vs3, vs1_prev);
                vs2 = _mm512_dpbusd_epi32(vs2, even_v, weight_v);

                vs3 = _mm512_add_epi32(vs3, vs1);
                vs1 = _mm512_add_epi32(vs1, _mm512_sad_epu8(odd_v, zero_v));
                vs2_odd = _mm512_dpbusd_epi32(vs2_odd, odd_v, weight_v);

                vs1_prev = vs1;
            }

            vs2 = _mm512_add_epi32(vs2, _mm512_slli_epi32(vs3, 6));
            vs2 = _mm512_add_epi32(vs2, vs2_odd);

            (
                _mm512_reduce_add_epi32(vs1) as u32,
                _mm512_reduce_add_epi32(vs2) as u32,
            )
        }
    }
}

use super::Adler32Imp;

/// Resolves update implementation if CPU supports avx512 with vnni.
#[must_use]
pub fn get_imp() -> Option<Adler32Imp> { get_imp_inner() }

#[inline]
#[cfg(all(feature = "std", any(target_arch = "x86", target_arch = "x86_64")))]
fn get_imp_inner() -> Option<Adler32Imp> {
    (std::arch::is_x86_feature_detected!("avx512f")
        && std::arch::is_x86_feature_detected!("avx512bw")
        && std::arch::is_x86_feature_detected!("avx512vnni"))
    .then_some(kernel::update as Adler32Imp)
}

#[inline]
#[cfg(all(
    target_feature = "avx512f",
    target_feature = "avx512bw",
    target_feature = "avx512vnni",
    any(target_arch = "x86", target_arch = "x86_64"),
    not(feature = "std")
))]
fn get_imp_inner() -> Option<Adler32Imp> { Some(kernel::update) }

#[inline]
#[cfg(not(all(
    any(target_arch = "x86", target_arch = "x86_64"),
    any(
        feature = "std",
        all(target_feature = "avx512f", target_feature = "avx512bw", target_feature = "avx512vnni")
    )
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

    /// Odd and even block counts per run, and every delegation band.
    #[test]
    fn block_parity_and_delegation() {
        if let Some(update) = super::get_imp() {
            let data = testing::random_bytes(5 * 64 + 63, 29);
            for len in 0..=data.len() {
                #[expect(clippy::indexing_slicing, reason = "Test code.")]
                let slice = &data[..len];
                assert_eq!(update(7, slice), testing::oracle(7, slice), "len({len})");
            }
        }
    }
}
