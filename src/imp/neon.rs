//! aarch64 NEON tier.
//!
//! Works on 64-byte superblocks of four registers. Byte sums are folded with
//! pairwise widening adds; every byte column gets its own 16-bit accumulator
//! which is weighted against [`TAPS`](kernel) once per run. The fused variant
//! stores each loaded register to the destination as it goes.

#[cfg(all(target_arch = "aarch64", any(feature = "std", target_feature = "neon")))]
pub(super) mod kernel {
    use core::{
        arch::aarch64::{
            uint16x8_t, uint32x4_t, vaddq_u32, vaddvq_u32, vaddw_high_u8, vaddw_u8, vdupq_n_u16,
            vdupq_n_u32, vget_low_u8, vget_low_u16, vld1q_u8, vld1q_u16, vld1q_u32,
            vmlal_high_u16, vmlal_u16, vpadalq_u8, vpadalq_u16, vpaddlq_u8, vshlq_n_u32, vst1q_u8,
        },
        ptr,
    };

    use crate::imp::{BASE, NMAX, join, scalar, split};

    const BLOCK_SIZE: usize = 16;
    const SUPERBLOCK_SIZE: usize = 4 * BLOCK_SIZE;
    /// Peeling target; the main loop starts on this boundary when it can.
    const ALIGN: usize = 32;

    #[expect(clippy::cast_possible_truncation, reason = "Values are at most 64.")]
    #[expect(clippy::indexing_slicing, reason = "Const, cannot panic.")]
    static TAPS: [u16; SUPERBLOCK_SIZE] = {
        let mut taps = [0; SUPERBLOCK_SIZE];
        let mut i = 0;
        while i < SUPERBLOCK_SIZE {
            taps[i] = (SUPERBLOCK_SIZE - i) as u16;
            i += 1;
        }
        taps
    };

    // Compile-time proofs that operations cannot overflow
    #[expect(
        clippy::integer_division,
        clippy::integer_division_remainder_used,
        reason = "Intended."
    )]
    const _: () = {
        const MAX_SUPERBLOCKS: usize = NMAX / SUPERBLOCK_SIZE;
        assert!(
            (u8::MAX as usize) * (MAX_SUPERBLOCKS + 3) <= u16::MAX as usize,
            "Could not prove that the 16-bit column accumulators cannot overflow"
        );
        assert!(
            (u16::MAX as usize) * SUPERBLOCK_SIZE <= u32::MAX as usize,
            "Could not prove that weighting a column cannot overflow"
        );
    };

    /// Requires NEON; only handed out after that has been established.
    pub fn update(adler: u32, data: &[u8]) -> u32 {
        unsafe { update_imp::<false>(adler, data, ptr::null_mut()) }
    }

    /// Folds `src` into `adler` and copies it into `dst` in the same pass.
    /// Requires NEON; only handed out after that has been established.
    ///
    /// # Panics
    ///
    /// Panics if `src` and `dst` differ in length.
    pub fn update_and_copy(adler: u32, src: &[u8], dst: &mut [u8]) -> u32 {
        assert_eq!(
            src.len(),
            dst.len(),
            "source and destination lengths differ ({} != {})",
            src.len(),
            dst.len()
        );

        unsafe { update_imp::<true>(adler, src, dst.as_mut_ptr()) }
    }

    /// With `COPY`, `dst` must be valid for `src.len()` writes; otherwise it is
    /// never touched.
    #[inline]
    #[target_feature(enable = "neon")]
    unsafe fn update_imp<const COPY: bool>(adler: u32, src: &[u8], dst: *mut u8) -> u32 {
        let (mut a, mut b) = split(adler);

        match src {
            | [] => return adler,
            | [byte] => {
                if COPY {
                    unsafe { dst.write(*byte) };
                }
                return scalar::update_byte(a, b, *byte);
            },
            | _ if src.len() < BLOCK_SIZE => {
                unsafe { fold::<COPY>(&mut a, &mut b, src, dst) };
                return join(a % BASE, b % BASE);
            },
            | _ => {},
        }

        let mut rest = src;
        let mut out = dst;
        let mut budget = NMAX;

        let misalign = rest.as_ptr().addr() & (ALIGN - 1);
        if misalign != 0 && rest.len() >= BLOCK_SIZE + ALIGN - misalign {
            let (head, tail) = rest.split_at(ALIGN - misalign);
            unsafe { fold::<COPY>(&mut a, &mut b, head, out) };

            budget -= head.len();
            out = out.wrapping_add(head.len());
            rest = tail;
        }

        while rest.len() >= BLOCK_SIZE {
            let take = rest.len().min(budget) & !(BLOCK_SIZE - 1);
            let (run, tail) = rest.split_at(take);

            (a, b) = unsafe { accumulate::<COPY>(a, b, run, out) };
            a %= BASE;
            b %= BASE;

            budget = NMAX;
            out = out.wrapping_add(take);
            rest = tail;
        }

        unsafe { fold::<COPY>(&mut a, &mut b, rest, out) };
        join(a % BASE, b % BASE)
    }

    /// The scalar recurrence, copying each byte when `COPY`.
    #[inline(always)]
    unsafe fn fold<const COPY: bool>(a: &mut u32, b: &mut u32, src: &[u8], dst: *mut u8) {
        if COPY {
            unsafe { ptr::copy_nonoverlapping(src.as_ptr(), dst, src.len()) };
        }
        scalar::fold(a, b, src);
    }

    /// Folds `run` into the unreduced sums, storing it to `dst` when `COPY`.
    /// `run` is a whole number of 16-byte blocks no longer than `NMAX`.
    #[inline(always)]
    unsafe fn accumulate<const COPY: bool>(
        a: u32,
        b: u32,
        run: &[u8],
        dst: *mut u8,
    ) -> (u32, u32) {
        debug_assert!(
            run.len() % BLOCK_SIZE == 0 && run.len() <= NMAX,
            "Unexpected run size ({})",
            run.len()
        );

        unsafe {
            let mut vs1: uint32x4_t = vld1q_u32([a, 0, 0, 0].as_ptr());
            let mut vs1_prev = vs1;
            let mut vs3 = vdupq_n_u32(0);
            let mut columns: [uint16x8_t; 8] = [vdupq_n_u16(0); 8];
            let mut out = dst;

            let (superblocks, blocks) = run.as_chunks::<SUPERBLOCK_SIZE>();

            for superblock in superblocks {
                let ptr = superblock.as_ptr();
                let d0 = vld1q_u8(ptr);
                let d1 = vld1q_u8(ptr.add(BLOCK_SIZE));
                let d2 = vld1q_u8(ptr.add(2 * BLOCK_SIZE));
                let d3 = vld1q_u8(ptr.add(3 * BLOCK_SIZE));

                if COPY {
                    vst1q_u8(out, d0);
                    vst1q_u8(out.add(BLOCK_SIZE), d1);
                    vst1q_u8(out.add(2 * BLOCK_SIZE), d2);
                    vst1q_u8(out.add(3 * BLOCK_SIZE), d3);
                    out = out.add(SUPERBLOCK_SIZE);
                }

                // 64 bytes into 16 shorts, then into the 4 ints of vs1
                let fold_02 = vpadalq_u8(vpaddlq_u8(d0), d2);
                let fold_13 = vpadalq_u8(vpaddlq_u8(d1), d3);
                vs1 = vpadalq_u16(vs1, fold_02);
                vs3 = vaddq_u32(vs3, vs1_prev);
                vs1 = vpadalq_u16(vs1, fold_13);

                columns[0] = vaddw_u8(columns[0], vget_low_u8(d0));
                columns[1] = vaddw_high_u8(columns[1], d0);
                columns[2] = vaddw_u8(columns[2], vget_low_u8(d1));
                columns[3] = vaddw_high_u8(columns[3], d1);
                columns[4] = vaddw_u8(columns[4], vget_low_u8(d2));
                columns[5] = vaddw_high_u8(columns[5], d2);
                columns[6] = vaddw_u8(columns[6], vget_low_u8(d3));
                columns[7] = vaddw_high_u8(columns[7], d3);

                vs1_prev = vs1;
            }

            vs3 = vshlq_n_u32(vs3, 6);

            // Trailing blocks sit in the last register's columns, weighted 16..1
            let mut vs3_tail = vdupq_n_u32(0);
            for block in blocks.as_chunks::<BLOCK_SIZE>().0 {
                let d = vld1q_u8(block.as_ptr());

                if COPY {
                    vst1q_u8(out, d);
                    out = out.add(BLOCK_SIZE);
                }

                vs1 = vpadalq_u16(vs1, vpaddlq_u8(d));
                vs3_tail = vaddq_u32(vs3_tail, vs1_prev);
                columns[6] = vaddw_u8(columns[6], vget_low_u8(d));
                columns[7] = vaddw_high_u8(columns[7], d);

                vs1_prev = vs1;
            }
            vs3 = vaddq_u32(vs3, vshlq_n_u32(vs3_tail, 4));

            let mut vs2_lo: uint32x4_t = vld1q_u32([b, 0, 0, 0].as_ptr());
            let mut vs2_hi = vdupq_n_u32(0);
            for (column, taps) in columns.iter().zip(TAPS.as_chunks::<8>().0) {
                let taps_v = vld1q_u16(taps.as_ptr());
                vs2_lo = vmlal_u16(vs2_lo, vget_low_u16(taps_v), vget_low_u16(*column));
                vs2_hi = vmlal_high_u16(vs2_hi, taps_v, *column);
            }

            let vs2 = vaddq_u32(vaddq_u32(vs2_lo, vs2_hi), vs3);

            (vaddvq_u32(vs1), vaddvq_u32(vs2))
        }
    }
}

#[cfg(all(target_arch = "aarch64", target_feature = "neon"))]
pub use kernel::{update, update_and_copy};

use super::{Adler32CopyImp, Adler32Imp};

/// Resolves update implementation for aarch64 NEON.
#[must_use]
pub fn get_imp() -> Option<Adler32Imp> { get_imp_inner() }

/// Resolves the fused copy-and-checksum implementation for aarch64 NEON.
#[must_use]
pub fn get_copy_imp() -> Option<Adler32CopyImp> { get_copy_imp_inner() }

#[inline]
#[cfg(all(feature = "std", target_arch = "aarch64"))]
fn get_imp_inner() -> Option<Adler32Imp> {
    std::arch::is_aarch64_feature_detected!("neon").then_some(kernel::update as Adler32Imp)
}

#[inline]
#[cfg(all(feature = "std", target_arch = "aarch64"))]
fn get_copy_imp_inner() -> Option<Adler32CopyImp> {
    std::arch::is_aarch64_feature_detected!("neon")
        .then_some(kernel::update_and_copy as Adler32CopyImp)
}

#[inline]
#[cfg(all(target_arch = "aarch64", target_feature = "neon", not(feature = "std")))]
fn get_imp_inner() -> Option<Adler32Imp> { Some(kernel::update) }

#[inline]
#[cfg(all(target_arch = "aarch64", target_feature = "neon", not(feature = "std")))]
fn get_copy_imp_inner() -> Option<Adler32CopyImp> { Some(kernel::update_and_copy) }

#[inline]
#[cfg(not(all(target_arch = "aarch64", any(feature = "std", target_feature = "neon"))))]
fn get_imp_inner() -> Option<Adler32Imp> { None }

#[inline]
#[cfg(not(all(target_arch = "aarch64", any(feature = "std", target_feature = "neon"))))]
fn get_copy_imp_inner() -> Option<Adler32CopyImp> { None }

#[cfg(test)]
mod tests {
    use crate::imp::testing;

    #[test]
    fn matches_oracle() {
        if let Some(update) = super::get_imp() {
            testing::exercise(update);
        }
    }

    #[test]
    fn copy_matches_plain() {
        if let (Some(update), Some(update_and_copy)) = (super::get_imp(), super::get_copy_imp()) {
            testing::exercise_copy(update, update_and_copy);
        }
    }

    /// Runs ending in 0 to 3 trailing blocks after the superblocks.
    #[test]
    fn trailing_blocks() {
        if let Some(update) = super::get_imp() {
            let data = testing::random_bytes(4 * 64 + 63, 31);
            for len in 0..=data.len() {
                #[expect(clippy::indexing_slicing, reason = "Test code.")]
                let slice = &data[..len];
                assert_eq!(update(3, slice), testing::oracle(3, slice), "len({len})");
            }
        }
    }
}
