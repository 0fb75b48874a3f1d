//! Known vectors, overflow safety and the I/O adapters, through the public API.

#![cfg(feature = "std")]

use std::io::{self, BufReader, Cursor, ErrorKind, Read};

use tiered_adler32::{Adler32, Tier, adler32, bufread, read, update, update_and_copy};

const BASE: u64 = 65521;

fn oracle(data: &[u8]) -> u32 {
    let (mut a, mut b) = (1_u64, 0_u64);
    for &byte in data {
        a = (a + u64::from(byte)) % BASE;
        b = (b + a) % BASE;
    }
    u32::try_from((b << 16) | a).expect("reduced halves fit")
}

fn every_tier() -> impl Iterator<Item = (Tier, tiered_adler32::Adler32Imp)> {
    Tier::available().filter_map(|tier| tier.get_imp().map(|imp| (tier, imp)))
}

#[test]
fn known_vectors() {
    for (tier, imp) in every_tier() {
        assert_eq!(imp(1, b""), 1, "{tier}");
        assert_eq!(imp(1, b"a"), 0x0062_0062, "{tier}");
        assert_eq!(imp(1, b"abc"), 0x024D_0127, "{tier}");
        assert_eq!(imp(1, b"Wikipedia"), 0x11E6_0398, "{tier}");
        assert_eq!(imp(1, b"rust is pretty cool, man"), 1_921_255_656, "{tier}");
    }
    assert_eq!(adler32(b"Wikipedia"), 0x11E6_0398);
}

#[test]
fn ten_million_ff_bytes() {
    let data = vec![0xFF_u8; 10_000_000];
    let expected = oracle(&data);

    assert_eq!(update(1, &data), expected);
    for (tier, imp) in every_tier() {
        assert_eq!(imp(1, &data), expected, "{tier}");
    }
}

#[test]
fn boundary_lengths() {
    let data: Vec<u8> = (0..20_000_u32).map(|i| (i.wrapping_mul(131) >> 3) as u8).collect();

    for len in [0, 1, 2, 15, 16, 17, 31, 32, 33, 63, 64, 65, 5551, 5552, 5553, 11_104, 11_105] {
        let slice = &data[..len];
        let expected = oracle(slice);
        for (tier, imp) in every_tier() {
            assert_eq!(imp(1, slice), expected, "{tier} len({len})");
        }
    }
}

#[test]
fn fused_copy_entry_point() {
    let src: Vec<u8> = (0..70_000_u32).map(|i| (i ^ (i >> 7)) as u8).collect();
    let mut dst = vec![0_u8; src.len()];

    assert_eq!(update_and_copy(1, &src, &mut dst), oracle(&src));
    assert_eq!(dst, src);
}

#[test]
fn streaming_hasher_matches_one_shot() {
    let data: Vec<u8> = (0..100_000_u32).map(|i| (i % 251) as u8).collect();
    let mut hash = Adler32::new();
    for chunk in data.chunks(997) {
        hash.write(chunk);
    }
    assert_eq!(hash.finish(), oracle(&data));
}

#[test]
fn read_adapter() {
    let data = vec![0xA5_u8; 3 * 4096 + 17];
    let hash = read::adler32(&mut Cursor::new(&data)).expect("cursor reads");
    assert_eq!(hash, oracle(&data));
}

#[test]
fn bufread_adapter() {
    let data = vec![0x5A_u8; 100_003];
    let mut reader = BufReader::with_capacity(1000, Cursor::new(&data));
    let hash = bufread::adler32(&mut reader).expect("cursor reads");
    assert_eq!(hash, oracle(&data));
}

/// Fails with `Interrupted` every other call, then with a fatal error at the
/// end if asked to.
struct Flaky<'a> {
    data: &'a [u8],
    calls: usize,
    fail_at_end: bool,
}

impl Read for Flaky<'_> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.calls += 1;
        if self.calls % 2 == 0 {
            return Err(ErrorKind::Interrupted.into());
        }
        if self.data.is_empty() && self.fail_at_end {
            return Err(ErrorKind::BrokenPipe.into());
        }

        let n = self.data.len().min(buf.len()).min(333);
        let (head, tail) = self.data.split_at(n);
        buf[..n].copy_from_slice(head);
        self.data = tail;
        Ok(n)
    }
}

#[test]
fn read_adapter_retries_interrupted() {
    let data = vec![7_u8; 5000];
    let mut reader = Flaky { data: &data, calls: 0, fail_at_end: false };
    assert_eq!(read::adler32(&mut reader).expect("interrupts are retried"), oracle(&data));

    let mut reader = BufReader::new(Flaky { data: &data, calls: 0, fail_at_end: false });
    assert_eq!(bufread::adler32(&mut reader).expect("interrupts are retried"), oracle(&data));
}

#[test]
fn read_adapter_propagates_errors() {
    let data = vec![7_u8; 100];
    let mut reader = Flaky { data: &data, calls: 0, fail_at_end: true };
    let err = read::adler32(&mut reader).expect_err("broken pipe surfaces");
    assert_eq!(err.kind(), ErrorKind::BrokenPipe);

    let mut reader = BufReader::new(Flaky { data: &data, calls: 0, fail_at_end: true });
    let err = bufread::adler32(&mut reader).expect_err("broken pipe surfaces");
    assert_eq!(err.kind(), ErrorKind::BrokenPipe);
}
