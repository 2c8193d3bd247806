//! Shard-blob persistence.
//!
//! The builder and the lookup engine only ever talk to the [`IndexStore`]
//! capability, so the directory-tree and LMDB backends share all index
//! logic. Both backends guarantee that a reader never observes a torn shard
//! blob: the filesystem backend replaces blobs via tmp-file rename, the LMDB
//! backend writes inside a transaction.

mod fs_tree;
mod lmdb;

use std::collections::HashMap;

pub use fs_tree::FsTreeStore;
pub use lmdb::LmdbStore;

use crate::error::Error;
use crate::shard::ShardKey;

/// Key → byte-blob persistent mapping keyed by shard key.
///
/// Single writer (the builder), any number of concurrent readers (the lookup
/// engine). Concurrent builder invocations against one store are not
/// supported and must be prevented by the operator.
pub trait IndexStore: Send + Sync {
    /// One-time initialization: root directory, database namespace.
    fn ensure_bucket(&mut self) -> Result<(), Error>;

    /// Fetches a shard blob; `Ok(None)` when the shard is absent.
    fn get(&self, key: &ShardKey) -> Result<Option<Vec<u8>>, Error>;

    /// Writes a shard blob, replacing any previous value atomically with
    /// respect to readers.
    fn put(&mut self, key: &ShardKey, blob: &[u8]) -> Result<(), Error>;
}

/// Volatile store for tests and benchmarks.
#[derive(Default)]
pub struct MemStore {
    shards: HashMap<ShardKey, Vec<u8>>,
}

impl MemStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn shard_count(&self) -> usize {
        self.shards.len()
    }
}

impl IndexStore for MemStore {
    fn ensure_bucket(&mut self) -> Result<(), Error> {
        Ok(())
    }

    fn get(&self, key: &ShardKey) -> Result<Option<Vec<u8>>, Error> {
        Ok(self.shards.get(key).cloned())
    }

    fn put(&mut self, key: &ShardKey, blob: &[u8]) -> Result<(), Error> {
        self.shards.insert(key.clone(), blob.to_vec());
        Ok(())
    }
}
