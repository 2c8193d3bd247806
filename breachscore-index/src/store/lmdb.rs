use std::fs;
use std::path::Path;

use heed3::types::Bytes;
use heed3::{Database, Env, EnvOpenOptions};

use crate::error::Error;
use crate::shard::ShardKey;
use crate::store::IndexStore;

/// Named database holding the shard blobs.
const SHARDS_DB: &str = "shards";

/// LMDB map size. Address space reservation, not allocation; a
/// billion-entry corpus at 42 bytes per record stays well under this.
const MAP_SIZE: usize = 64 * 1024 * 1024 * 1024;

/// Embedded key-value backend.
///
/// One LMDB environment with a single named database; keys are the raw ASCII
/// shard-key bytes, values the shard blobs. Unlike the filesystem backend the
/// split length plays no role here. Puts are transactional, so readers see
/// whole blobs only.
pub struct LmdbStore {
    env: Env,
    db: Database<Bytes, Bytes>,
}

impl LmdbStore {
    /// Opens (creating if needed) the environment at `path` and its shard
    /// database.
    pub fn open(path: &Path) -> Result<Self, Error> {
        fs::create_dir_all(path)?;

        // SAFETY: standard single-process open; no other mapping of this
        // environment exists in this process.
        let env = unsafe { EnvOpenOptions::new().map_size(MAP_SIZE).max_dbs(4).open(path)? };

        let mut wtxn = env.write_txn()?;
        let db = env.create_database(&mut wtxn, Some(SHARDS_DB))?;
        wtxn.commit()?;

        Ok(Self { env, db })
    }
}

impl IndexStore for LmdbStore {
    fn ensure_bucket(&mut self) -> Result<(), Error> {
        // The shard database is created when the environment is opened.
        Ok(())
    }

    fn get(&self, key: &ShardKey) -> Result<Option<Vec<u8>>, Error> {
        let rtxn = self.env.read_txn()?;
        let blob = self.db.get(&rtxn, key.as_bytes())?.map(<[u8]>::to_vec);
        Ok(blob)
    }

    fn put(&mut self, key: &ShardKey, blob: &[u8]) -> Result<(), Error> {
        let mut wtxn = self.env.write_txn()?;
        self.db.put(&mut wtxn, key.as_bytes(), blob)?;
        wtxn.commit()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn put_then_get_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = LmdbStore::open(dir.path()).unwrap();
        store.ensure_bucket().unwrap();

        let key = ShardKey::from_prefix("CBFDAC60");
        assert!(store.get(&key).unwrap().is_none());

        store.put(&key, b"blob one").unwrap();
        assert_eq!(store.get(&key).unwrap().unwrap(), b"blob one");

        store.put(&key, b"blob two").unwrap();
        assert_eq!(store.get(&key).unwrap().unwrap(), b"blob two");
    }

    #[test]
    fn survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let key = ShardKey::from_prefix("AB");
        {
            let mut store = LmdbStore::open(dir.path()).unwrap();
            store.put(&key, b"persisted").unwrap();
        }
        let store = LmdbStore::open(dir.path()).unwrap();
        assert_eq!(store.get(&key).unwrap().unwrap(), b"persisted");
    }
}
