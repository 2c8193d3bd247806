use std::fmt;

use sha1::{Digest as _, Sha1};

use crate::error::Error;

/// Length of a raw digest in bytes.
pub const DIGEST_LEN: usize = 20;

/// Length of the canonical uppercase hex form.
pub const HEX_DIGEST_LEN: usize = 2 * DIGEST_LEN;

/// Hex lookup table for digest rendering.
const HEX_CHARS: &[u8; 16] = b"0123456789ABCDEF";

/// A 20-byte SHA-1 digest of one candidate line.
///
/// Byte-wise `Ord` coincides with lexicographic order of the canonical
/// uppercase hex form, so shard blobs sorted by raw digest bytes are also
/// sorted by their text form.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Digest([u8; DIGEST_LEN]);

impl Digest {
    /// Digests a raw candidate line. Total: no input fails.
    pub fn of(line: &[u8]) -> Self {
        let mut hasher = Sha1::new();
        hasher.update(line);
        Self(hasher.finalize().into())
    }

    pub fn from_bytes(bytes: [u8; DIGEST_LEN]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; DIGEST_LEN] {
        &self.0
    }

    /// Canonical text form as a stack array of 40 uppercase hex characters.
    pub fn hex_bytes(&self) -> [u8; HEX_DIGEST_LEN] {
        let mut out = [0u8; HEX_DIGEST_LEN];
        for (i, b) in self.0.iter().enumerate() {
            out[2 * i] = HEX_CHARS[(b >> 4) as usize];
            out[2 * i + 1] = HEX_CHARS[(b & 0x0f) as usize];
        }
        out
    }

    pub fn to_hex(&self) -> String {
        // hex_bytes only emits ASCII
        String::from_utf8_lossy(&self.hex_bytes()).into_owned()
    }

    /// Parses the canonical text form. Accepts either case, exactly 40
    /// characters.
    pub fn from_hex(text: &str) -> Result<Self, Error> {
        let malformed = || Error::MalformedDigest { text: text.to_string() };
        let bytes = text.as_bytes();
        if bytes.len() != HEX_DIGEST_LEN {
            return Err(malformed());
        }
        let mut out = [0u8; DIGEST_LEN];
        for (i, pair) in bytes.chunks_exact(2).enumerate() {
            let hi = hex_nibble(pair[0]).ok_or_else(malformed)?;
            let lo = hex_nibble(pair[1]).ok_or_else(malformed)?;
            out[i] = (hi << 4) | lo;
        }
        Ok(Self(out))
    }
}

/// Hex ASCII character to nibble value, `None` for non-hex input.
#[inline]
fn hex_nibble(c: u8) -> Option<u8> {
    match c {
        b'0'..=b'9' => Some(c - b'0'),
        b'A'..=b'F' => Some(c - b'A' + 10),
        b'a'..=b'f' => Some(c - b'a' + 10),
        _ => None,
    }
}

impl fmt::Display for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for b in &self.hex_bytes() {
            write!(f, "{}", *b as char)?;
        }
        Ok(())
    }
}

impl fmt::Debug for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Digest({self})")
    }
}

#[cfg(test)]
mod tests {
    use hex_literal::hex;

    use super::*;

    #[test]
    fn digests_known_password() {
        // SHA1("password123") = CBFDAC6008F9CAB4083784CBD1874F76618D2A97
        let d = Digest::of(b"password123");
        assert_eq!(d.as_bytes(), &hex!("CBFDAC6008F9CAB4083784CBD1874F76618D2A97"));
        assert_eq!(d.to_hex(), "CBFDAC6008F9CAB4083784CBD1874F76618D2A97");
    }

    #[test]
    fn hex_round_trip() {
        let d = Digest::of(b"monkey");
        let parsed = Digest::from_hex(&d.to_hex()).unwrap();
        assert_eq!(d, parsed);
    }

    #[test]
    fn parses_lowercase() {
        let d = Digest::from_hex("cbfdac6008f9cab4083784cbd1874f76618d2a97").unwrap();
        assert_eq!(d.to_hex(), "CBFDAC6008F9CAB4083784CBD1874F76618D2A97");
    }

    #[test]
    fn rejects_bad_hex() {
        assert!(Digest::from_hex("").is_err());
        assert!(Digest::from_hex("CBFD").is_err());
        assert!(Digest::from_hex(&"G".repeat(40)).is_err());
        // one character short
        assert!(Digest::from_hex(&"A".repeat(39)).is_err());
    }

    #[test]
    fn byte_order_matches_hex_order() {
        let a = Digest::of(b"a");
        let b = Digest::of(b"b");
        assert_eq!(a.cmp(&b), a.to_hex().cmp(&b.to_hex()));
    }
}
