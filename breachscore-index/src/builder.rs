//! Streaming index builder.

use std::io::BufRead;
use std::time::Instant;

use crate::config::IndexConfig;
use crate::digest::{Digest, HEX_DIGEST_LEN};
use crate::error::Error;
use crate::record;
use crate::shard::ShardKey;
use crate::store::IndexStore;

/// Counters reported after a completed build.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BuildStats {
    /// Corpus entries packed into the store.
    pub entries: u64,
    /// Shard blobs flushed (one per shard-key run).
    pub shards_flushed: u64,
}

/// Builds the shard index from a corpus stream.
///
/// The corpus must be pre-sorted ascending by digest. That is an external
/// precondition this builder relies on but does not enforce: sortedness makes
/// every shard's entries contiguous in the stream (so each shard is flushed
/// exactly once per run) and keeps them in digest order inside the flushed
/// blob (the binary-search precondition). Feeding an unsorted corpus silently
/// produces an index whose lookups return undefined results.
///
/// Re-running the builder over the same store appends after the existing
/// blobs rather than replacing them. An interrupted or aborted build keeps
/// whatever shards were already flushed; there is no rollback.
pub struct Builder {
    cfg: IndexConfig,
}

impl Builder {
    pub fn new(cfg: IndexConfig) -> Self {
        Self { cfg }
    }

    /// Streams the corpus into `store`.
    ///
    /// A malformed line (bad hex, missing `:`, unparsable or zero count)
    /// aborts the build with its 1-based line number.
    pub fn build<R, S>(&self, reader: R, store: &mut S) -> Result<BuildStats, Error>
    where
        R: BufRead,
        S: IndexStore + ?Sized,
    {
        self.build_with(reader, store, |_| {})
    }

    /// [`build`](Self::build) with a progress callback invoked with the
    /// cumulative entry count after every `batch_size` entries.
    pub fn build_with<R, S>(
        &self,
        reader: R,
        store: &mut S,
        mut on_batch: impl FnMut(u64),
    ) -> Result<BuildStats, Error>
    where
        R: BufRead,
        S: IndexStore + ?Sized,
    {
        store.ensure_bucket()?;

        let mut stats = BuildStats::default();
        let mut current_key: Option<ShardKey> = None;
        let mut buf: Vec<u8> = Vec::new();
        let mut batch_start = Instant::now();

        for (idx, line) in reader.lines().enumerate() {
            let line_no = idx as u64 + 1;
            // a read failure here is a corpus-side problem (bad encoding,
            // truncated file), not a store failure
            let line = line.map_err(|e| Error::MalformedCorpusLine {
                line: line_no,
                reason: e.to_string(),
            })?;
            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            let (digest, count) = parse_corpus_line(line, line_no)?;
            let key = ShardKey::of(&digest, self.cfg.prefix_len);

            if current_key.as_ref().is_some_and(|k| *k != key) {
                self.flush(store, current_key.as_ref(), &mut buf, &mut stats)?;
            }
            current_key = Some(key);

            let packed = record::encode(&digest, count)
                .map_err(|e| Error::MalformedCorpusLine { line: line_no, reason: e.to_string() })?;
            buf.extend_from_slice(&packed);
            stats.entries += 1;

            if stats.entries % self.cfg.batch_size == 0 {
                tracing::info!(
                    entries = stats.entries,
                    batch = self.cfg.batch_size,
                    elapsed = ?batch_start.elapsed(),
                    "indexed batch"
                );
                batch_start = Instant::now();
                on_batch(stats.entries);
            }
        }

        self.flush(store, current_key.as_ref(), &mut buf, &mut stats)?;
        on_batch(stats.entries);
        Ok(stats)
    }

    /// Appends the buffered run after the shard's existing blob, if any.
    fn flush<S>(
        &self,
        store: &mut S,
        key: Option<&ShardKey>,
        buf: &mut Vec<u8>,
        stats: &mut BuildStats,
    ) -> Result<(), Error>
    where
        S: IndexStore + ?Sized,
    {
        let Some(key) = key else { return Ok(()) };
        if buf.is_empty() {
            return Ok(());
        }

        match store.get(key)? {
            Some(mut existing) => {
                existing.extend_from_slice(buf);
                store.put(key, &existing)?;
            }
            None => store.put(key, buf)?,
        }
        buf.clear();
        stats.shards_flushed += 1;
        Ok(())
    }
}

/// Parses one `<40-hex>:<decimal count>` corpus line.
fn parse_corpus_line(line: &str, line_no: u64) -> Result<(Digest, u64), Error> {
    let malformed = |reason: String| Error::MalformedCorpusLine { line: line_no, reason };

    let Some((hex, count)) = line.split_once(':') else {
        return Err(malformed(format!("no \":\" in line {line:?}")));
    };
    if hex.len() != HEX_DIGEST_LEN {
        return Err(malformed(format!("digest field is {} characters, want 40", hex.len())));
    }
    let digest = Digest::from_hex(hex).map_err(|e| malformed(e.to_string()))?;
    let count: u64 = count
        .trim()
        .parse()
        .map_err(|e| malformed(format!("occurrence count {count:?}: {e}")))?;
    if count == 0 {
        return Err(malformed("occurrence count must be positive".to_string()));
    }
    Ok((digest, count))
}
