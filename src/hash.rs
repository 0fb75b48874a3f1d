//! [`Adler32Hash`] for byte-like types.

#[cfg(feature = "std")]
use std::{string::String, vec::Vec};

use crate::update;

/// An Adler-32 hash-able type.
///
/// Hashing always starts from the canonical seed and goes through the
/// compile-time selected [`update`](crate::update) entry point.
pub trait Adler32Hash {
    /// Feeds this value into `Adler32`.
    fn hash(&self) -> u32;
}

impl Adler32Hash for [u8] {
    fn hash(&self) -> u32 { update(1, self) }
}

impl Adler32Hash for &[u8] {
    fn hash(&self) -> u32 { update(1, self) }
}

impl Adler32Hash for str {
    fn hash(&self) -> u32 { update(1, self.as_bytes()) }
}

impl Adler32Hash for &str {
    fn hash(&self) -> u32 { update(1, self.as_bytes()) }
}

#[cfg(feature = "std")]
impl Adler32Hash for Vec<u8> {
    fn hash(&self) -> u32 { update(1, self) }
}

#[cfg(feature = "std")]
impl Adler32Hash for String {
    fn hash(&self) -> u32 { update(1, self.as_bytes()) }
}

#[cfg(feature = "const-generics")]
impl<const N: usize> Adler32Hash for [u8; N] {
    fn hash(&self) -> u32 { update(1, self) }
}
