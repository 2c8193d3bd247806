//! Fixed-width binary encoding of one corpus entry.
//!
//! Layout of a packed record:
//!
//! - bytes `0..20`: raw digest
//! - byte `20`: `b':'` separator
//! - bytes `21..42`: ASCII decimal occurrence count, remainder filled with
//!   `b'\n'`
//!
//! Every record therefore ends in at least one newline, and a shard blob of N
//! entries is exactly `RECORD_LEN * N` bytes with record i at offset
//! `RECORD_LEN * i`. Changing `RECORD_LEN` invalidates every previously built
//! shard in both directions.

use crate::digest::{DIGEST_LEN, Digest};
use crate::error::Error;

/// Width of one packed record in bytes.
pub const RECORD_LEN: usize = 42;

/// Separator between the digest bytes and the count field.
pub const SEPARATOR: u8 = b':';

/// Fill byte after the count digits.
const FILL: u8 = b'\n';

/// Width of the count field (separator excluded).
const COUNT_FIELD_LEN: usize = RECORD_LEN - DIGEST_LEN - 1;

/// Maximum count digits, leaving room for the newline terminator.
pub const MAX_COUNT_DIGITS: usize = COUNT_FIELD_LEN - 1;

/// Packs one corpus entry into a fixed-width record.
///
/// Fails with `InvalidCount` if `count` is zero or its decimal form exceeds
/// the count field.
pub fn encode(digest: &Digest, count: u64) -> Result<[u8; RECORD_LEN], Error> {
    if count == 0 {
        return Err(Error::InvalidCount { count });
    }
    let digits = count.to_string();
    if digits.len() > MAX_COUNT_DIGITS {
        return Err(Error::InvalidCount { count });
    }

    let mut out = [FILL; RECORD_LEN];
    out[..DIGEST_LEN].copy_from_slice(digest.as_bytes());
    out[DIGEST_LEN] = SEPARATOR;
    out[DIGEST_LEN + 1..DIGEST_LEN + 1 + digits.len()].copy_from_slice(digits.as_bytes());
    Ok(out)
}

/// Unpacks one fixed-width record.
///
/// Fails with `CorruptRecord` if the slice is not exactly one record wide,
/// the separator is missing, or the count field holds no parseable digits.
pub fn decode(raw: &[u8]) -> Result<(Digest, u64), Error> {
    if raw.len() != RECORD_LEN {
        return Err(Error::CorruptRecord { reason: "record is not 42 bytes wide" });
    }
    if raw[DIGEST_LEN] != SEPARATOR {
        return Err(Error::CorruptRecord { reason: "missing ':' separator at offset 20" });
    }

    // count field: decimal digits up to the first fill byte
    let field = &raw[DIGEST_LEN + 1..];
    let digits_len = field.iter().position(|&b| b == FILL).unwrap_or(field.len());
    let digits = &field[..digits_len];
    if digits.is_empty() || !digits.iter().all(u8::is_ascii_digit) {
        return Err(Error::CorruptRecord { reason: "count field is not a decimal integer" });
    }
    let mut count: u64 = 0;
    for &d in digits {
        count = count
            .checked_mul(10)
            .and_then(|c| c.checked_add(u64::from(d - b'0')))
            .ok_or(Error::CorruptRecord { reason: "count field overflows u64" })?;
    }

    let mut digest = [0u8; DIGEST_LEN];
    digest.copy_from_slice(&raw[..DIGEST_LEN]);
    Ok((Digest::from_bytes(digest), count))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip() {
        for count in [1, 2, 7, 100, 2_254_650, u64::MAX] {
            let digest = Digest::of(b"password123");
            let packed = encode(&digest, count).unwrap();
            assert_eq!(decode(&packed).unwrap(), (digest, count));
        }
    }

    #[test]
    fn rejects_zero_count() {
        let digest = Digest::of(b"qwerty");
        assert!(matches!(encode(&digest, 0), Err(Error::InvalidCount { count: 0 })));
    }

    #[test]
    fn record_is_newline_terminated() {
        let packed = encode(&Digest::of(b"dragon"), 12).unwrap();
        assert_eq!(packed.len(), RECORD_LEN);
        assert_eq!(packed[DIGEST_LEN], b':');
        assert_eq!(packed[RECORD_LEN - 1], b'\n');
    }

    #[test]
    fn rejects_missing_separator() {
        let mut packed = encode(&Digest::of(b"abc123"), 3).unwrap();
        packed[DIGEST_LEN] = b' ';
        assert!(matches!(decode(&packed), Err(Error::CorruptRecord { .. })));
    }

    #[test]
    fn rejects_garbage_count() {
        let mut packed = encode(&Digest::of(b"abc123"), 3).unwrap();
        packed[DIGEST_LEN + 1] = b'x';
        assert!(matches!(decode(&packed), Err(Error::CorruptRecord { .. })));

        // all-fill count field
        let mut empty = packed;
        for b in &mut empty[DIGEST_LEN + 1..] {
            *b = b'\n';
        }
        assert!(matches!(decode(&empty), Err(Error::CorruptRecord { .. })));
    }

    #[test]
    fn rejects_wrong_width() {
        assert!(matches!(decode(&[0u8; 41]), Err(Error::CorruptRecord { .. })));
        assert!(matches!(decode(&[0u8; 43]), Err(Error::CorruptRecord { .. })));
    }
}
