//! Point lookups against a built index.

use std::cmp::Ordering;

use crate::config::IndexConfig;
use crate::digest::{DIGEST_LEN, Digest};
use crate::error::Error;
use crate::record::{self, RECORD_LEN};
use crate::shard::ShardKey;
use crate::store::IndexStore;

/// Looks up a digest's occurrence count.
///
/// Derives the shard key, fetches the blob and lower-bound binary-searches
/// the fixed-width records on the digest field. `Ok(None)` when the shard or
/// the record is absent; that is the normal unmatched-password outcome, not
/// an error.
///
/// Fails with `CorruptRecord` if the blob length is not a multiple of the
/// record width or the matching record does not decode. Search never touches
/// bytes past `blob.len() / RECORD_LEN` whole records, whatever trails them.
pub fn lookup<S>(store: &S, cfg: &IndexConfig, digest: &Digest) -> Result<Option<u64>, Error>
where
    S: IndexStore + ?Sized,
{
    let key = ShardKey::of(digest, cfg.prefix_len);
    let Some(blob) = store.get(&key)? else {
        return Ok(None);
    };
    if blob.len() % RECORD_LEN != 0 {
        return Err(Error::CorruptRecord { reason: "shard length is not a multiple of the record width" });
    }

    let records = blob.len() / RECORD_LEN;
    let target = &digest.as_bytes()[..];

    // lower bound: first record whose digest field is >= the query
    let mut low = 0usize;
    let mut high = records;
    while low < high {
        let mid = low + (high - low) / 2;
        let field = &blob[mid * RECORD_LEN..mid * RECORD_LEN + DIGEST_LEN];
        match field.cmp(target) {
            Ordering::Less => low = mid + 1,
            Ordering::Equal | Ordering::Greater => high = mid,
        }
    }
    if low == records {
        return Ok(None);
    }

    let raw = &blob[low * RECORD_LEN..(low + 1) * RECORD_LEN];
    if &raw[..DIGEST_LEN] != target {
        return Ok(None);
    }
    let (_, count) = record::decode(raw)?;
    Ok(Some(count))
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;
    use crate::builder::Builder;
    use crate::store::MemStore;

    fn indexed(cfg: IndexConfig, entries: &[(Digest, u64)]) -> MemStore {
        let mut lines: Vec<String> =
            entries.iter().map(|(d, c)| format!("{}:{c}", d.to_hex())).collect();
        lines.sort();
        let text = lines.join("\n");
        let mut store = MemStore::new();
        Builder::new(cfg).build(Cursor::new(text), &mut store).unwrap();
        store
    }

    #[test]
    fn finds_present_digests() {
        let cfg = IndexConfig::new(4, 2).unwrap();
        let entries: Vec<(Digest, u64)> = (0..32u32)
            .map(|i| (Digest::of(format!("candidate-{i}").as_bytes()), u64::from(i) + 1))
            .collect();
        let store = indexed(cfg, &entries);

        for (d, c) in &entries {
            assert_eq!(lookup(&store, &cfg, d).unwrap(), Some(*c), "{d}");
        }
    }

    #[test]
    fn misses_absent_digest_in_present_shard() {
        // Force everything into one shard so the miss exercises the search,
        // not the shard fetch.
        let cfg = IndexConfig::new(1, 1).unwrap();
        let entries: Vec<(Digest, u64)> = (0..64u32)
            .map(|i| (Digest::of(format!("candidate-{i}").as_bytes()), 1))
            .collect();
        let store = indexed(cfg, &entries);

        let absent = Digest::of(b"never-indexed");
        assert_eq!(lookup(&store, &cfg, &absent).unwrap(), None);
    }

    #[test]
    fn misses_absent_shard() {
        let cfg = IndexConfig::new(8, 2).unwrap();
        let store = indexed(cfg, &[(Digest::of(b"only-entry"), 1)]);
        assert_eq!(lookup(&store, &cfg, &Digest::of(b"elsewhere")).unwrap(), None);
    }

    #[test]
    fn rejects_misaligned_blob() {
        let cfg = IndexConfig::new(4, 2).unwrap();
        let d = Digest::of(b"torn");
        let mut store = MemStore::new();
        store.put(&ShardKey::of(&d, 4), &[0u8; RECORD_LEN + 7]).unwrap();

        assert!(matches!(lookup(&store, &cfg, &d), Err(Error::CorruptRecord { .. })));
    }

    #[test]
    fn surfaces_corrupt_matching_record() {
        let cfg = IndexConfig::new(4, 2).unwrap();
        let d = Digest::of(b"mangled");
        let mut raw = crate::record::encode(&d, 3).unwrap();
        raw[crate::digest::DIGEST_LEN] = b' '; // clobber the separator

        let mut store = MemStore::new();
        store.put(&ShardKey::of(&d, 4), &raw).unwrap();
        assert!(matches!(lookup(&store, &cfg, &d), Err(Error::CorruptRecord { .. })));
    }

    #[test]
    fn accreted_duplicate_entries_still_resolve() {
        // Building the same corpus twice doubles the shard; binary search
        // still lands on an equal record. Known footgun, kept as specified.
        let cfg = IndexConfig::new(4, 2).unwrap();
        let d = Digest::of(b"rebuilt");
        let text = format!("{}:6", d.to_hex());

        let mut store = MemStore::new();
        let builder = Builder::new(cfg);
        builder.build(Cursor::new(text.clone()), &mut store).unwrap();
        builder.build(Cursor::new(text), &mut store).unwrap();

        let blob = store.get(&ShardKey::of(&d, 4)).unwrap().unwrap();
        assert_eq!(blob.len(), 2 * RECORD_LEN);
        assert_eq!(lookup(&store, &cfg, &d).unwrap(), Some(6));
    }

    #[test]
    fn boundary_records_are_reachable() {
        let cfg = IndexConfig::new(1, 1).unwrap();
        let mut entries: Vec<(Digest, u64)> = (0..16u32)
            .map(|i| (Digest::of(format!("edge-{i}").as_bytes()), 2))
            .collect();
        entries.sort();
        let store = indexed(cfg, &entries);

        let (first, _) = entries[0];
        let (last, _) = entries[entries.len() - 1];
        assert_eq!(lookup(&store, &cfg, &first).unwrap(), Some(2));
        assert_eq!(lookup(&store, &cfg, &last).unwrap(), Some(2));
    }
}
