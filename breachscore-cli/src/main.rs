//! Command-line front-end for the breachscore engine.
//!
//! Two modes: `--update` streams a sorted `hash:count` corpus into the index,
//! anything else scores candidate passwords (stdin, a file, or the `--easy`
//! web form) against an already-built index under a deadline.

mod web;

use std::fs::File;
use std::io::{self, BufRead, BufReader, Write};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use breachscore_index::{
    Builder, Digest, FsTreeStore, IndexConfig, IndexStore, LmdbStore,
};
use breachscore_scorer::{ScoreConfig, Scorer, ScoringPolicy};
use clap::{Parser, ValueEnum};
use indicatif::{ProgressBar, ProgressStyle};
use tracing_subscriber::EnvFilter;

const RULES: &str = "\
The rules are these:
1. -1 for each password missing from the corpus
2. +point for each corpus hit
3. A rarity bonus of point/occurrences for rarely-breached passwords
4. Resubmitting the same password costs points rather than earning them
";

#[derive(Parser, Debug)]
#[command(name = "breachscore")]
#[command(about = "Score candidate passwords against a breach-password corpus index")]
#[command(after_help = RULES)]
struct Args {
    /// Index location: tree root (fs) or environment directory (lmdb)
    #[arg(long, default_value = "./data")]
    data_dir: PathBuf,

    /// Storage backend
    #[arg(long, value_enum, default_value_t = Backend::Fs)]
    backend: Backend,

    /// Build or extend the index from --corpus instead of scoring
    #[arg(long)]
    update: bool,

    /// Sorted hash:count corpus file (build mode)
    #[arg(long)]
    corpus: Option<PathBuf>,

    /// File of passwords to score, one per line; stdin when omitted
    #[arg(long)]
    candidates: Option<PathBuf>,

    /// Shard key width in hex characters (baked into the index at build time)
    #[arg(long, default_value_t = 8)]
    prefix_len: usize,

    /// Path segment length for the fs backend
    #[arg(long, default_value_t = 2)]
    split_len: usize,

    /// Points per corpus hit
    #[arg(long, default_value_t = 1)]
    point: u32,

    /// Scoring deadline in seconds
    #[arg(long, default_value_t = 120)]
    timeout_secs: u64,

    /// Entries between build progress reports
    #[arg(long, default_value_t = IndexConfig::DEFAULT_BATCH_SIZE)]
    batch_size: u64,

    /// Score every line independently instead of per distinct digest
    #[arg(long)]
    per_line: bool,

    /// Easy mode: serve a paste-your-passwords web form
    #[arg(long)]
    easy: bool,

    /// Easy mode listen address
    #[arg(long, default_value = "127.0.0.1:8080")]
    addr: SocketAddr,

    /// Require a password whose SHA-1 matches this hex digest before running
    #[arg(long)]
    access_hash: Option<String>,

    /// Disable the build progress bar
    #[arg(long)]
    no_progress: bool,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Backend {
    /// Nested directory tree, one blob file per shard
    Fs,
    /// Single LMDB environment keyed by shard-key bytes
    Lmdb,
}

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error(transparent)]
    Index(#[from] breachscore_index::Error),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("--update requires --corpus")]
    MissingCorpus,
}

#[tokio::main]
async fn main() -> Result<(), CliError> {
    tracing_subscriber::fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let args = Args::parse();

    let index_cfg =
        IndexConfig::new(args.prefix_len, args.split_len)?.with_batch_size(args.batch_size);

    if let Some(expected) = &args.access_hash {
        if !passes_access_gate(expected)? {
            println!("Access Denied");
            return Ok(());
        }
    }

    if args.update {
        return build_index(&args, index_cfg);
    }

    let store: Arc<dyn IndexStore> = match args.backend {
        Backend::Fs => Arc::new(FsTreeStore::new(&args.data_dir, args.split_len)),
        Backend::Lmdb => Arc::new(LmdbStore::open(&args.data_dir)?),
    };
    let score_cfg = ScoreConfig {
        point_value: args.point,
        deadline: Duration::from_secs(args.timeout_secs),
        policy: if args.per_line { ScoringPolicy::PerLine } else { ScoringPolicy::DedupPenalty },
    };
    let scorer = Arc::new(Scorer::new(index_cfg, score_cfg));

    if args.easy {
        return web::serve(args.addr, scorer, store).await.map_err(Into::into);
    }

    let lines = read_candidates(&args)?;
    let report = scorer.score(lines, store).await;
    if report.partial {
        println!("Time elapsed ({}s)", args.timeout_secs);
    }
    println!("Score is {} ({:.2}).", report.score, report.bonus);
    Ok(())
}

fn build_index(args: &Args, cfg: IndexConfig) -> Result<(), CliError> {
    let corpus = args.corpus.as_ref().ok_or(CliError::MissingCorpus)?;
    let reader = BufReader::new(File::open(corpus)?);

    let mut store: Box<dyn IndexStore> = match args.backend {
        Backend::Fs => Box::new(FsTreeStore::new(&args.data_dir, args.split_len)),
        Backend::Lmdb => Box::new(LmdbStore::open(&args.data_dir)?),
    };

    let bar = (!args.no_progress).then(|| {
        let bar = ProgressBar::new_spinner();
        bar.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.green} [{elapsed_precise}] {pos} entries ({per_sec})")
                .expect("Invalid progress bar template"),
        );
        bar
    });

    let stats = Builder::new(cfg).build_with(reader, store.as_mut(), |entries| {
        if let Some(bar) = &bar {
            bar.set_position(entries);
        }
    })?;

    if let Some(bar) = bar {
        bar.finish_with_message("done");
    }
    println!(
        "Indexed {} entries ({} shard flushes) into {}",
        stats.entries,
        stats.shards_flushed,
        args.data_dir.display()
    );
    Ok(())
}

/// Prompts for a password on stdin and checks its digest against the
/// configured gate hash.
fn passes_access_gate(expected_hex: &str) -> Result<bool, CliError> {
    let expected = Digest::from_hex(expected_hex)?;
    eprint!("Password: ");
    io::stderr().flush()?;

    let mut line = String::new();
    io::stdin().read_line(&mut line)?;
    let candidate = line.trim_end_matches(['\r', '\n']);
    Ok(Digest::of(candidate.as_bytes()) == expected)
}

fn read_candidates(args: &Args) -> Result<Vec<Vec<u8>>, CliError> {
    let lines = match &args.candidates {
        Some(path) => read_candidate_lines(BufReader::new(File::open(path)?))?,
        None => read_candidate_lines(io::stdin().lock())?,
    };
    Ok(lines)
}

/// Reads raw candidate lines, stripping line terminators but preserving every
/// other byte: candidates are hashed as-is, not as text.
fn read_candidate_lines<R: BufRead>(mut reader: R) -> io::Result<Vec<Vec<u8>>> {
    let mut lines = Vec::new();
    let mut buf = Vec::new();
    loop {
        buf.clear();
        if reader.read_until(b'\n', &mut buf)? == 0 {
            break;
        }
        while matches!(buf.last(), Some(b'\n' | b'\r')) {
            buf.pop();
        }
        lines.push(buf.clone());
    }
    Ok(lines)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_terminators_only() {
        let input: &[u8] = b"hunter2\r\npa ss\nlast";
        let lines = read_candidate_lines(input).unwrap();
        assert_eq!(lines, vec![b"hunter2".to_vec(), b"pa ss".to_vec(), b"last".to_vec()]);
    }

    #[test]
    fn keeps_empty_lines_as_candidates() {
        let input: &[u8] = b"\npw\n";
        let lines = read_candidate_lines(input).unwrap();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].is_empty());
    }
}
