//! # tiered-adler32
//!
//! Adler-32 checksums with interchangeable scalar and SIMD engines.
//!
//! ## Features
//!
//! - Support `no_std` (with `default-features = false`)
//! - A compile-time selected [`update`] entry point with no runtime probing
//! - Runtime tier selection through [`Tier`] (when `std` enabled)
//! - A fused copy-and-checksum path, [`update_and_copy`]
//! - Every tier is bit-identical to the portable scalar engine
//!
//! ## Quick start
//!
//! > Cargo.toml
//!
//! ```toml
//! [dependencies]
//! tiered-adler32 = "*"
//! ```
//!
//! > example.rs
//!
//! ```rust
//! use tiered_adler32::Adler32;
//!
//! let mut adler = Adler32::new();
//! adler.write(b"rust is pretty cool, man");
//! let hash = adler.finish();
//!
//! println!("{}", hash);
//! // 1921255656
//! ```
//!
//! Or drive the state directly:
//!
//! ```rust
//! let mut state = 1;
//! state = tiered_adler32::update(state, b"Wiki");
//! state = tiered_adler32::update(state, b"pedia");
//! assert_eq!(state, 0x11E6_0398);
//! ```
//!
//! ## Feature flags
//!
//! * `std` - Enabled by default
//!
//! Enables runtime CPU feature detection for [`Tier`] and the [`read`] and
//! [`bufread`] adapters.
//!
//! * `const-generics` - Enabled by default
//!
//! Enables [`Adler32Hash`] for byte arrays by value.
//!
//! * `tracing`
//!
//! Emits a debug event whenever a tier is resolved.
//!
//! ## Support
//!
//! | tier          | arch             | feature                            |
//! | ------------- | ---------------- | ---------------------------------- |
//! | `avx512-vnni` | `x86`, `x86_64`  | avx512f, avx512bw, avx512vnni      |
//! | `avx2`        | `x86`, `x86_64`  | avx2                               |
//! | `ssse3`       | `x86`, `x86_64`  | ssse3                              |
//! | `neon`        | `aarch64`        | neon                               |
//! | `scalar`      | any              |                                    |
//!
//! **MSRV** `1.89.0`
//!
//! ## CPU Feature Detection
//!
//! [`update`] is bound to one tier from the `target-feature` or `target-cpu`
//! flags supplied to rustc, reported as [`Tier::COMPILED`]. [`Adler32::new`]
//! instead asks [`Tier::detect`] for the widest tier the running CPU supports,
//! using `std::arch::is_x86_feature_detected` or
//! `std::arch::is_aarch64_feature_detected`. Without `std` it falls back to
//! [`Tier::COMPILED`].

#![warn(
    clippy::all,
    clippy::cargo,
    clippy::complexity,
    clippy::correctness,
    clippy::nursery,
    clippy::pedantic,
    clippy::perf,
    clippy::restriction,
    clippy::style,
    clippy::suspicious
)]
#![allow(clippy::as_conversions, reason = "Redundant with specific checks.")]
#![allow(
    clippy::blanket_clippy_restriction_lints,
    reason = "Overly verbose to individually enable."
)]
#![allow(clippy::similar_names, reason = "Convention.")]
#![allow(clippy::implicit_return, reason = "Follow Rust idiomatic returns.")]
#![allow(clippy::inline_always, reason = "Intended.")]
#![allow(clippy::large_stack_arrays, reason = "Used only in tests.")]
#![allow(clippy::large_stack_frames, reason = "Used only in tests.")]
#![allow(clippy::min_ident_chars, reason = "Convention.")]
#![allow(clippy::missing_inline_in_public_items, reason = "Not beneficial.")]
#![allow(clippy::mod_module_files, reason = "Maintain existing layout.")]
#![allow(clippy::multiple_unsafe_ops_per_block, reason = "Readability.")]
#![allow(clippy::undocumented_unsafe_blocks, reason = "Intrinsics.")]
#![allow(
    clippy::single_call_fn,
    reason = "Single use functions are used for clarity and composability."
)]
#![allow(clippy::separated_literal_suffix, reason = "Desired style.")]
#![allow(clippy::single_char_lifetime_names, reason = "Convention.")]
#![allow(clippy::arithmetic_side_effects, reason = "Bounds are proven in const blocks.")]
#![allow(clippy::integer_division_remainder_used, reason = "Modular arithmetic.")]
#![allow(clippy::pub_use, reason = "Flat public API.")]
#![allow(clippy::exhaustive_enums, reason = "Error enums are matched exhaustively.")]
#![allow(clippy::missing_trait_methods, reason = "Defaults are fine.")]
#![allow(clippy::std_instead_of_core, reason = "Adapters are std-only.")]
#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(all(test, not(feature = "std")))]
extern crate std;

#[doc(hidden)]
pub mod hash;
#[doc(hidden)]
pub mod imp;

use core::fmt;

pub use hash::Adler32Hash;
pub use imp::{Adler32CopyImp, Adler32Imp, ParseTierError, Tier, update, update_and_copy};

#[cfg(feature = "std")]
pub mod bufread {
    //! BufRead-based hashing.
    //!
    //! Separate `BufRead` trait implemented to allow for custom buffer size
    //! optimization.
    //!
    //! # Example
    //! ```rust
    //! use std::io::{BufReader, Cursor};
    //!
    //! use tiered_adler32::bufread::adler32;
    //!
    //! let mut reader = Cursor::new(b"Hello there");
    //! let mut reader = BufReader::new(reader);
    //! let hash = adler32(&mut reader).unwrap();
    //!
    //! println!("{}", hash) // 409338925
    //! ```
    use std::io::{BufRead, ErrorKind, Result};

    use crate::Adler32;

    /// Compute Adler-32 hash on buf reader until EOF.
    ///
    /// # Errors
    ///
    /// Returns a non-recoverable IO error; that is, not:
    /// - `ErrorKind::Interrupted`
    /// - `ErrorKind::UnexpectedEof`
    pub fn adler32<R: BufRead>(reader: &mut R) -> Result<u32> {
        let mut hash = Adler32::new();

        loop {
            let consumed = match reader.fill_buf() {
                | Ok(buf) => {
                    if buf.is_empty() {
                        return Ok(hash.finish());
                    }

                    hash.write(buf);
                    buf.len()
                },
                | Err(err) => match err.kind() {
                    | ErrorKind::Interrupted => continue,
                    | ErrorKind::UnexpectedEof => return Ok(hash.finish()),
                    | _ => return Err(err),
                },
            };

            reader.consume(consumed);
        }
    }
}

#[cfg(feature = "std")]
pub mod read {
    //! Reader-based hashing.
    //!
    //! # Example
    //! ```rust
    //! use std::io::Cursor;
    //!
    //! use tiered_adler32::read::adler32;
    //!
    //! let mut reader = Cursor::new(b"Hello there");
    //! let hash = adler32(&mut reader).unwrap();
    //!
    //! println!("{}", hash) // 409338925
    //! ```
    use std::io::{ErrorKind, Read, Result};

    use crate::Adler32;

    /// Read size per call; a multiple of every tier's block width.
    const CHUNK: usize = 4096;

    /// Compute Adler-32 hash on reader until EOF.
    ///
    /// # Errors
    ///
    /// Returns the first IO error other than `ErrorKind::Interrupted`.
    pub fn adler32<R: Read>(reader: &mut R) -> Result<u32> {
        let mut hash = Adler32::new();
        let mut buf = [0; CHUNK];

        loop {
            match reader.read(&mut buf) {
                | Ok(0) => return Ok(hash.finish()),
                | Ok(n) => {
                    #[expect(
                        clippy::indexing_slicing,
                        reason = "A panic would mean the Read trait has been implemented \
                                  incorrectly."
                    )]
                    hash.write(&buf[..n]);
                },
                | Err(err) if err.kind() == ErrorKind::Interrupted => {},
                | Err(err) => return Err(err),
            }
        }
    }
}

/// An adler32 hash generator type, bound to one [`Tier`].
#[derive(Clone, Copy)]
pub struct Adler32 {
    /// Packed `s1 | s2 << 16`, always reduced.
    state: u32,
    tier: Tier,
    update: Adler32Imp,
}

impl Adler32 {
    /// Return the hash value for the values written so far.
    ///
    /// Despite its name, the method does not reset the hasher’s internal state.
    /// Additional writes will continue from the current value. If you need
    /// to start a fresh hash value, you will have to use `reset`.
    #[must_use]
    pub const fn finish(&self) -> u32 { self.state }

    /// Construct a new `Adler32` using existing checksum.
    ///
    /// Runs on [`Tier::COMPILED`] without probing the CPU. Use
    /// [`with_tier`](Self::with_tier) and [`resume`](Self::resume) to continue
    /// on a detected tier instead.
    ///
    /// # Examples
    /// ```rust
    /// use tiered_adler32::Adler32;
    ///
    /// let mut adler = Adler32::from_checksum(0xDEAD_BEAF);
    /// ```
    #[must_use]
    pub const fn from_checksum(checksum: u32) -> Self {
        Self {
            state: checksum,
            tier: Tier::COMPILED,
            update: imp::update,
        }
    }

    /// Replaces the running checksum, keeping the tier.
    ///
    /// # Examples
    /// ```rust
    /// use tiered_adler32::{Adler32, Tier};
    ///
    /// let adler = Adler32::with_tier(Tier::Scalar).unwrap().resume(0x11E6_0398);
    /// assert_eq!(adler.finish(), 0x11E6_0398);
    /// ```
    #[must_use]
    pub const fn resume(mut self, checksum: u32) -> Self {
        self.state = checksum;
        self
    }

    /// Construct a new `Adler32` on the widest tier the CPU supports.
    ///
    /// Without `std` this is the tier [`update`] is compiled to.
    ///
    /// # Examples
    /// ```rust
    /// use tiered_adler32::Adler32;
    ///
    /// let mut adler = Adler32::new();
    /// ```
    #[must_use]
    pub fn new() -> Self {
        #[cfg(feature = "std")]
        let tier = Tier::detect();
        #[cfg(not(feature = "std"))]
        let tier = Tier::COMPILED;

        Self::with_tier(tier).unwrap_or_else(Self::scalar)
    }

    /// Construct a new `Adler32` on a specific tier, or `None` if the CPU
    /// cannot run it.
    ///
    /// # Examples
    /// ```rust
    /// use tiered_adler32::{Adler32, Tier};
    ///
    /// let adler = Adler32::with_tier(Tier::Scalar).unwrap();
    /// assert_eq!(adler.tier(), Tier::Scalar);
    /// ```
    #[must_use]
    pub fn with_tier(tier: Tier) -> Option<Self> {
        let update = tier.get_imp()?;

        #[cfg(feature = "tracing")]
        tracing::debug!(tier = tier.name(), "bound adler32 hasher");

        Some(Self { state: 1, tier, update })
    }

    fn scalar() -> Self {
        Self {
            state: 1,
            tier: Tier::Scalar,
            update: imp::scalar::update,
        }
    }

    /// The tier this hasher runs on.
    #[must_use]
    pub const fn tier(&self) -> Tier { self.tier }

    /// Reset the internal state.
    pub const fn reset(&mut self) { self.state = 1; }

    /// Computes hash for supplied data and store results in an internal state.
    pub fn write(&mut self, data: &[u8]) { self.state = (self.update)(self.state, data); }

    /// Like [`write`](Self::write), also copying `src` into `dst`.
    ///
    /// Uses the tier's fused kernel when it has one; otherwise copies and then
    /// hashes.
    ///
    /// # Panics
    ///
    /// Panics if `src` and `dst` differ in length.
    pub fn write_and_copy(&mut self, src: &[u8], dst: &mut [u8]) {
        if let Some(update_and_copy) = self.tier.get_copy_imp() {
            self.state = update_and_copy(self.state, src, dst);
        } else {
            dst.copy_from_slice(src);
            self.write(src);
        }
    }
}

impl Default for Adler32 {
    fn default() -> Self { Self::new() }
}

impl fmt::Debug for Adler32 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Adler32")
            .field("checksum", &format_args!("{:#010x}", self.state))
            .field("tier", &self.tier)
            .finish()
    }
}

impl PartialEq for Adler32 {
    fn eq(&self, other: &Self) -> bool { self.state == other.state }
}

impl Eq for Adler32 {}

impl core::hash::Hasher for Adler32 {
    fn finish(&self) -> u64 { u64::from(self.state) }

    fn write(&mut self, bytes: &[u8]) { Self::write(self, bytes); }
}

/// Compute Adler-32 hash on `Adler32Hash` type.
///
/// # Arguments
/// * `hash` - A Adler-32 hash-able type.
///
/// # Examples
/// ```rust
/// use tiered_adler32::adler32;
///
/// let hash = adler32(b"Adler-32");
/// println!("{}", hash); // 204735099
/// ```
pub fn adler32<H: Adler32Hash + ?Sized>(hash: &H) -> u32 { hash.hash() }
