//! Shard key derivation.

use std::fmt;

use crate::digest::Digest;

/// Logical bucket key: the first `prefix_len` uppercase hex characters of a
/// digest's text form.
///
/// Path splitting for the filesystem backend is layered on top via
/// [`ShardKey::segments`] and never changes key identity; the LMDB backend
/// keys on the raw ASCII bytes directly.
#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub struct ShardKey(String);

impl ShardKey {
    pub fn of(digest: &Digest, prefix_len: usize) -> Self {
        let hex = digest.hex_bytes();
        let prefix = &hex[..prefix_len.min(hex.len())];
        // hex_bytes only emits ASCII
        Self(String::from_utf8_lossy(prefix).into_owned())
    }

    /// Builds a key straight from corpus-line text (already uppercase hex).
    pub fn from_prefix(prefix: &str) -> Self {
        Self(prefix.to_ascii_uppercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }

    /// Splits the key into `split_len`-character path segments; the last
    /// segment may be shorter. Filesystem layout only.
    pub fn segments(&self, split_len: usize) -> Vec<&str> {
        let split_len = split_len.max(1);
        self.0
            .as_bytes()
            .chunks(split_len)
            // chunks of an ASCII string are valid UTF-8
            .map(|c| std::str::from_utf8(c).unwrap_or(""))
            .collect()
    }
}

impl fmt::Display for ShardKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
