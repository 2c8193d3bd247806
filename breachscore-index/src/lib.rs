//! Prefix-sharded breach-password index.
//!
//! This library builds a hash-ordered on-disk index from a sorted corpus of
//! `<40-hex-sha1>:<occurrence count>` lines and answers point lookups against
//! it with binary search.
//!
//! The index is sharded by a short hex prefix of each digest. Each shard is a
//! single byte blob of fixed 42-byte records (20 digest bytes, a `:`
//! separator, then the ASCII occurrence count padded with newlines), so a
//! shard of N entries is exactly `42 * N` bytes and record N sits at byte
//! offset `42 * N`. Because the corpus is pre-sorted by digest, the builder
//! can stream it once, flush each shard exactly once per run, and still
//! guarantee the in-shard ordering that binary search requires.
//!
//! Two storage backends implement the same [`IndexStore`] capability: a
//! nested directory tree with one blob file per shard, and an LMDB
//! environment keyed by the raw shard-key bytes.

pub mod builder;
pub mod config;
pub mod digest;
pub mod error;
pub mod lookup;
pub mod record;
pub mod shard;
pub mod store;

pub use builder::{BuildStats, Builder};
pub use config::IndexConfig;
pub use digest::Digest;
pub use error::{Error, StoreError};
pub use lookup::lookup;
pub use record::RECORD_LEN;
pub use shard::ShardKey;
pub use store::{FsTreeStore, IndexStore, LmdbStore, MemStore};
