//! Deadline-bounded batch scoring against a breachscore index.
//!
//! A scoring run has two phases. Classification digests every candidate line
//! and folds the baseline deltas into the totals up front: each distinct
//! digest starts at −1 (assume missing), and resubmitting the same password
//! is penalized, not ignored. The lookup phase then resolves every distinct
//! digest against the index exactly once, adding the per-match point value
//! and a rarity bonus of `point / occurrence_count` on each hit.
//!
//! The lookup phase races a wall-clock deadline. If the deadline fires first
//! the run returns whatever totals have accumulated, flagged `partial`; since
//! each digest's contribution is applied atomically and hits only ever add,
//! a partial result is internally consistent and never smaller than any
//! earlier snapshot. Deadline expiry is an expected outcome, not an error.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use breachscore_index::{Digest, IndexConfig, IndexStore, lookup};

/// Which lines contribute deltas.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ScoringPolicy {
    /// Canonical policy: score per distinct digest, penalize duplicates.
    #[default]
    DedupPenalty,
    /// Historical variant: score every line independently, no dedup map,
    /// misses cost the full point value. Kept as an explicit configuration,
    /// never merged with the canonical policy.
    PerLine,
}

#[derive(Clone, Copy, Debug)]
pub struct ScoreConfig {
    /// Points awarded per corpus hit.
    pub point_value: u32,
    /// Wall-clock budget for the lookup phase.
    pub deadline: Duration,
    pub policy: ScoringPolicy,
}

impl Default for ScoreConfig {
    fn default() -> Self {
        Self {
            point_value: 1,
            deadline: Duration::from_secs(120),
            policy: ScoringPolicy::DedupPenalty,
        }
    }
}

/// Outcome of one scoring run.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ScoreReport {
    pub score: i64,
    pub bonus: f64,
    /// The deadline elapsed before every digest was looked up.
    pub partial: bool,
}

#[derive(Clone, Copy, Debug, Default)]
struct Totals {
    score: i64,
    bonus: f64,
}

pub struct Scorer {
    index: IndexConfig,
    score: ScoreConfig,
}

impl Scorer {
    pub fn new(index: IndexConfig, score: ScoreConfig) -> Self {
        Self { index, score }
    }

    /// Scores a candidate batch against the index behind `store`.
    ///
    /// The store is only read. Lookups run on the blocking pool and race the
    /// configured deadline; on expiry the in-flight task is told to stop at
    /// its next digest boundary and abandoned.
    pub async fn score<L>(
        &self,
        lines: impl IntoIterator<Item = L>,
        store: Arc<dyn IndexStore>,
    ) -> ScoreReport
    where
        L: AsRef<[u8]>,
    {
        let mut totals = Totals::default();
        let mut work: Vec<Digest> = Vec::new();

        match self.score.policy {
            ScoringPolicy::DedupPenalty => {
                let mut seen: HashSet<Digest> = HashSet::new();
                for line in lines {
                    let digest = Digest::of(line.as_ref());
                    totals.score -= 1;
                    if seen.insert(digest) {
                        work.push(digest);
                    } else {
                        totals.bonus -= 1.0;
                    }
                }
            }
            ScoringPolicy::PerLine => {
                work.extend(lines.into_iter().map(|l| Digest::of(l.as_ref())));
            }
        }

        let point = i64::from(self.score.point_value);
        let point_f = f64::from(self.score.point_value);
        let miss_delta = match self.score.policy {
            ScoringPolicy::DedupPenalty => 0,
            ScoringPolicy::PerLine => -point,
        };

        let totals = Arc::new(Mutex::new(totals));
        let cancel = Arc::new(AtomicBool::new(false));

        let task = {
            let totals = Arc::clone(&totals);
            let cancel = Arc::clone(&cancel);
            let index_cfg = self.index;
            tokio::task::spawn_blocking(move || {
                for digest in work {
                    if cancel.load(Ordering::Relaxed) {
                        return;
                    }
                    let (score_delta, bonus_delta) =
                        match lookup(store.as_ref(), &index_cfg, &digest) {
                            Ok(Some(count)) => (point, point_f / count as f64),
                            Ok(None) => (miss_delta, 0.0),
                            Err(e) => {
                                tracing::warn!(
                                    digest = %digest,
                                    error = %e,
                                    "corrupt shard entry treated as a miss"
                                );
                                (miss_delta, 0.0)
                            }
                        };
                    // one lock acquisition per digest keeps each
                    // contribution atomic; a poisoned lock still holds
                    // consistent totals for the same reason
                    let mut t = totals.lock().unwrap_or_else(|e| e.into_inner());
                    t.score += score_delta;
                    t.bonus += bonus_delta;
                }
            })
        };

        let partial = tokio::select! {
            res = task => {
                if let Err(e) = res {
                    tracing::error!(error = %e, "lookup task failed");
                }
                false
            }
            _ = tokio::time::sleep(self.score.deadline) => {
                cancel.store(true, Ordering::Relaxed);
                true
            }
        };

        let t = totals.lock().unwrap_or_else(|e| e.into_inner());
        ScoreReport { score: t.score, bonus: t.bonus, partial }
    }
}
