use std::fs::{self, File};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use crate::error::Error;
use crate::shard::ShardKey;
use crate::store::IndexStore;

/// Name of the blob file inside each shard directory.
const BLOB_FILE: &str = "v";

/// Staging name used for atomic replacement; same directory as the blob so
/// the rename stays on one filesystem.
const BLOB_TMP_FILE: &str = ".v.tmp";

/// Directory-tree backend.
///
/// A shard key such as `CBFDAC60` with `split_len = 2` lands its blob at
/// `<root>/CB/FD/AC/60/v`. The split bounds per-directory fan-out and is
/// invisible above the store boundary.
///
/// Writes go to a sibling temp file which is fsynced and renamed over the
/// blob, so concurrent readers see either the old blob or the new one, never
/// a partial write.
pub struct FsTreeStore {
    root: PathBuf,
    split_len: usize,
}

impl FsTreeStore {
    pub fn new(root: impl Into<PathBuf>, split_len: usize) -> Self {
        Self { root: root.into(), split_len: split_len.max(1) }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn shard_dir(&self, key: &ShardKey) -> PathBuf {
        let mut dir = self.root.clone();
        for segment in key.segments(self.split_len) {
            dir.push(segment);
        }
        dir
    }
}

impl IndexStore for FsTreeStore {
    fn ensure_bucket(&mut self) -> Result<(), Error> {
        fs::create_dir_all(&self.root)?;
        Ok(())
    }

    fn get(&self, key: &ShardKey) -> Result<Option<Vec<u8>>, Error> {
        match fs::read(self.shard_dir(key).join(BLOB_FILE)) {
            Ok(blob) => Ok(Some(blob)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn put(&mut self, key: &ShardKey, blob: &[u8]) -> Result<(), Error> {
        let dir = self.shard_dir(key);
        fs::create_dir_all(&dir)?;

        let tmp = dir.join(BLOB_TMP_FILE);
        let mut file = File::create(&tmp)?;
        file.write_all(blob)?;
        file.sync_all()?;
        drop(file);
        fs::rename(&tmp, dir.join(BLOB_FILE))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn put_then_get_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = FsTreeStore::new(dir.path().join("data"), 2);
        store.ensure_bucket().unwrap();

        let key = ShardKey::from_prefix("CBFDAC60");
        assert!(store.get(&key).unwrap().is_none());

        store.put(&key, b"hello shard").unwrap();
        assert_eq!(store.get(&key).unwrap().unwrap(), b"hello shard");
    }

    #[test]
    fn lays_out_nested_directories() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = FsTreeStore::new(dir.path(), 2);
        store.ensure_bucket().unwrap();

        store.put(&ShardKey::from_prefix("CBFDAC60"), b"x").unwrap();
        assert!(dir.path().join("CB/FD/AC/60/v").is_file());
    }

    #[test]
    fn replace_leaves_no_staging_file() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = FsTreeStore::new(dir.path(), 4);
        store.ensure_bucket().unwrap();

        let key = ShardKey::from_prefix("CBFDAC60");
        store.put(&key, b"old").unwrap();
        store.put(&key, b"new").unwrap();

        assert_eq!(store.get(&key).unwrap().unwrap(), b"new");
        assert!(!dir.path().join("CBFD/AC60").join(".v.tmp").exists());
    }

    #[test]
    fn distinct_keys_do_not_collide() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = FsTreeStore::new(dir.path(), 2);
        store.ensure_bucket().unwrap();

        store.put(&ShardKey::from_prefix("AAAA"), b"a").unwrap();
        store.put(&ShardKey::from_prefix("AAAB"), b"b").unwrap();
        assert_eq!(store.get(&ShardKey::from_prefix("AAAA")).unwrap().unwrap(), b"a");
        assert_eq!(store.get(&ShardKey::from_prefix("AAAB")).unwrap().unwrap(), b"b");
    }
}
