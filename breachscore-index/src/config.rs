use crate::digest::HEX_DIGEST_LEN;
use crate::error::Error;

/// Build- and query-time index parameters.
///
/// Constructed once at startup and threaded into the builder, the stores and
/// the lookup engine. `prefix_len` and `split_len` are baked into an index
/// when it is built: reading an index with a different `prefix_len` than it
/// was built with resolves no keys at all, and a different `split_len` (the
/// filesystem backend's directory fan-out) points at the wrong paths. Neither
/// mismatch is detected at runtime.
#[derive(Clone, Copy, Debug)]
pub struct IndexConfig {
    /// Shard key width in hex characters (1..=40).
    pub prefix_len: usize,
    /// Path segment length for the filesystem backend.
    pub split_len: usize,
    /// Entries between build throughput reports.
    pub batch_size: u64,
}

impl IndexConfig {
    pub fn new(prefix_len: usize, split_len: usize) -> Result<Self, Error> {
        if prefix_len == 0 || prefix_len > HEX_DIGEST_LEN {
            return Err(Error::InvalidConfig("prefix_len must be between 1 and 40"));
        }
        if split_len == 0 {
            return Err(Error::InvalidConfig("split_len must be at least 1"));
        }
        Ok(Self { prefix_len, split_len, batch_size: Self::DEFAULT_BATCH_SIZE })
    }

    pub const DEFAULT_BATCH_SIZE: u64 = 100_000;

    pub fn with_batch_size(mut self, batch_size: u64) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self { prefix_len: 8, split_len: 2, batch_size: Self::DEFAULT_BATCH_SIZE }
    }
}
