//! Checksum engines and tier selection.
//!
//! Every tier exposes the same [`Adler32Imp`] signature and returns results
//! bit-identical to [`scalar::update`]. The [`update`] entry point is bound to
//! exactly one of them when the crate is compiled; [`Tier`] enumerates all of
//! them for callers that want to pick one at runtime instead.

use core::{fmt, str::FromStr};

pub mod avx2;
pub mod avx512;
pub mod neon;
pub mod scalar;
pub mod ssse3;

/// Signature shared by every tier: `(checksum, data) -> checksum`.
pub type Adler32Imp = fn(u32, &[u8]) -> u32;

/// Signature of the fused copy-and-checksum variants: `(checksum, src, dst) -> checksum`.
pub type Adler32CopyImp = fn(u32, &[u8], &mut [u8]) -> u32;

/// Largest prime below 2^16.
#[expect(clippy::decimal_literal_representation, reason = "Readability.")]
pub const BASE: u32 = 65521;

/// Most bytes that can be folded into `s1`/`s2` before a reduction is due.
pub const NMAX: usize = 5552;

// Compile-time proofs that a run of NMAX bytes cannot overflow u32
#[expect(
    clippy::integer_division,
    clippy::integer_division_remainder_used,
    reason = "Intended."
)]
const _: () = {
    const MAX_A: u64 = BASE as u64 - 1;
    const MAX_BYTE: u64 = u8::MAX as u64;
    const N: u64 = NMAX as u64;

    assert!(
        MAX_A + MAX_BYTE * N <= u32::MAX as u64,
        "Could not prove that accumulating NMAX bytes into `a` cannot overflow"
    );
    assert!(
        MAX_BYTE * N * (N + 1) / 2 + (N + 1) * MAX_A <= u32::MAX as u64,
        "Could not prove that accumulating NMAX bytes into `b` cannot overflow"
    );
    assert!(
        MAX_BYTE * (N + 1) * (N + 2) / 2 + (N + 2) * MAX_A > u32::MAX as u64,
        "NMAX is no longer the largest safe run"
    );
};

/// Splits a packed checksum into its `(s1, s2)` halves.
#[inline(always)]
pub(crate) const fn split(adler: u32) -> (u32, u32) { (adler & 0xFFFF, adler >> 16) }

/// Packs `(s1, s2)` into a checksum. Both halves must already be reduced.
#[inline(always)]
pub(crate) const fn join(a: u32, b: u32) -> u32 { (b << 16) | a }

/// Immediate for the `pshufd` family selecting lanes `(z, y, x, w)`, high to
/// low.
#[cfg(any(target_arch = "x86", target_arch = "x86_64"))]
#[expect(non_snake_case, reason = "Mirrors the C intrinsic macro.")]
#[expect(clippy::cast_possible_wrap, reason = "Result fits in 8 bits.")]
#[inline(always)]
pub(crate) const fn _MM_SHUFFLE(z: u32, y: u32, x: u32, w: u32) -> i32 {
    ((z << 6) | (y << 4) | (x << 2) | w) as i32
}

/// Position weights `N, N - 1, ..., 1` as consumed by the x86 multiply-add
/// instructions.
#[cfg(any(target_arch = "x86", target_arch = "x86_64"))]
#[expect(clippy::cast_possible_truncation, reason = "N never exceeds 64.")]
#[expect(clippy::indexing_slicing, reason = "Const, cannot panic.")]
pub(crate) const fn descending_weights<const N: usize>() -> [u8; N] {
    let mut weights = [0; N];
    let mut i = 0;
    while i < N {
        weights[i] = (N - i) as u8;
        i += 1;
    }
    weights
}

/// Checksum entry point for this build.
///
/// The body is exactly one tier, chosen from the `target_feature`s the crate
/// was compiled with (see [`Tier::COMPILED`]). No CPU probing happens here.
#[inline]
#[must_use]
pub fn update(adler: u32, data: &[u8]) -> u32 { compiled::update(adler, data) }

/// Fused checksum entry point: folds `src` into `adler` while copying it into
/// `dst`.
///
/// Uses the NEON fused kernel when compiled for aarch64 with `neon`, and the
/// scalar fused loop otherwise.
///
/// # Panics
///
/// Panics if `src` and `dst` differ in length.
#[inline]
#[must_use]
pub fn update_and_copy(adler: u32, src: &[u8], dst: &mut [u8]) -> u32 {
    #[cfg(all(target_arch = "aarch64", target_feature = "neon"))]
    {
        neon::kernel::update_and_copy(adler, src, dst)
    }

    #[cfg(not(all(target_arch = "aarch64", target_feature = "neon")))]
    {
        scalar::update_and_copy(adler, src, dst)
    }
}

#[cfg(all(
    any(target_arch = "x86", target_arch = "x86_64"),
    target_feature = "avx512f",
    target_feature = "avx512bw",
    target_feature = "avx512vnni"
))]
use avx512::kernel as compiled;

#[cfg(all(
    any(target_arch = "x86", target_arch = "x86_64"),
    target_feature = "avx2",
    not(all(
        target_feature = "avx512f",
        target_feature = "avx512bw",
        target_feature = "avx512vnni"
    ))
))]
use avx2::kernel as compiled;

#[cfg(all(
    any(target_arch = "x86", target_arch = "x86_64"),
    target_feature = "ssse3",
    not(target_feature = "avx2")
))]
use ssse3::kernel as compiled;

#[cfg(all(target_arch = "aarch64", target_feature = "neon"))]
use neon::kernel as compiled;

#[cfg(not(any(
    all(any(target_arch = "x86", target_arch = "x86_64"), target_feature = "ssse3"),
    all(target_arch = "aarch64", target_feature = "neon")
)))]
use scalar as compiled;

/// An implementation strategy, bound to one vector instruction set.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum Tier {
    /// Portable reference engine. Always available.
    Scalar,
    /// 128-bit x86 SSSE3.
    Ssse3,
    /// 256-bit x86 AVX2.
    Avx2,
    /// 512-bit x86 AVX-512 with VNNI dot products.
    Avx512Vnni,
    /// 128-bit aarch64 NEON, with a fused copy-and-checksum variant.
    Neon,
}

impl Tier {
    /// Every tier, widest first.
    pub const ALL: [Self; 5] = [Self::Avx512Vnni, Self::Avx2, Self::Ssse3, Self::Neon, Self::Scalar];
    /// The tier [`update`] is compiled to.
    pub const COMPILED: Self = if cfg!(all(
        any(target_arch = "x86", target_arch = "x86_64"),
        target_feature = "avx512f",
        target_feature = "avx512bw",
        target_feature = "avx512vnni"
    )) {
        Self::Avx512Vnni
    } else if cfg!(all(any(target_arch = "x86", target_arch = "x86_64"), target_feature = "avx2")) {
        Self::Avx2
    } else if cfg!(all(any(target_arch = "x86", target_arch = "x86_64"), target_feature = "ssse3")) {
        Self::Ssse3
    } else if cfg!(all(target_arch = "aarch64", target_feature = "neon")) {
        Self::Neon
    } else {
        Self::Scalar
    };

    /// Short lowercase name, accepted back by [`FromStr`].
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            | Self::Scalar => "scalar",
            | Self::Ssse3 => "ssse3",
            | Self::Avx2 => "avx2",
            | Self::Avx512Vnni => "avx512-vnni",
            | Self::Neon => "neon",
        }
    }

    /// Resolves the tier's update function if the CPU supports it.
    ///
    /// With `std` enabled this performs a runtime capability check; without
    /// it, availability follows the compile-time `target_feature`s.
    #[must_use]
    pub fn get_imp(self) -> Option<Adler32Imp> {
        match self {
            | Self::Scalar => Some(scalar::update as Adler32Imp),
            | Self::Ssse3 => ssse3::get_imp(),
            | Self::Avx2 => avx2::get_imp(),
            | Self::Avx512Vnni => avx512::get_imp(),
            | Self::Neon => neon::get_imp(),
        }
    }

    /// Resolves the tier's fused copy-and-checksum function, if it has one and
    /// the CPU supports it.
    #[must_use]
    pub fn get_copy_imp(self) -> Option<Adler32CopyImp> {
        match self {
            | Self::Scalar => Some(scalar::update_and_copy as Adler32CopyImp),
            | Self::Neon => neon::get_copy_imp(),
            | Self::Ssse3 | Self::Avx2 | Self::Avx512Vnni => None,
        }
    }

    /// Whether this tier can run on the current CPU.
    #[must_use]
    pub fn is_available(self) -> bool { self.get_imp().is_some() }

    /// Iterates over the tiers that can run on the current CPU, widest first.
    pub fn available() -> impl Iterator<Item = Self> {
        Self::ALL.into_iter().filter(|tier| tier.is_available())
    }

    /// Picks the widest tier the current CPU supports.
    ///
    /// This is the caller-side capability check: run it once and hand the
    /// result to [`crate::Adler32::with_tier`] or [`Tier::get_imp`].
    #[must_use]
    pub fn detect() -> Self {
        let tier = Self::available().next().unwrap_or(Self::Scalar);

        #[cfg(feature = "tracing")]
        tracing::debug!(tier = tier.name(), compiled = Self::COMPILED.name(), "resolved adler32 tier");

        tier
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.name()) }
}

/// Error returned when parsing a [`Tier`] from a string fails.
#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ParseTierError {
    /// The input was empty or only whitespace.
    #[error("empty adler32 tier name")]
    Empty,
    /// The input named no known tier.
    #[error("unknown adler32 tier (expected one of: scalar, ssse3, avx2, avx512-vnni, neon)")]
    Unknown,
}

impl FromStr for Tier {
    type Err = ParseTierError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim();
        if name.is_empty() {
            return Err(ParseTierError::Empty);
        }

        if name.eq_ignore_ascii_case("avx512vnni") || name.eq_ignore_ascii_case("avx512") {
            return Ok(Self::Avx512Vnni);
        }

        Self::ALL
            .into_iter()
            .find(|tier| tier.name().eq_ignore_ascii_case(name))
            .ok_or(ParseTierError::Unknown)
    }
}
