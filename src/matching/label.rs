//! Resolve candidate multiplicity into one decision per scoring file row.
//!
//! Labelling runs in a fixed order. Exclusion reasons only ever accumulate.
//!
//! 1. best match by strategy priority
//! 2. ties broken by earliest target row (`duplicate_best_match`)
//! 3. duplicate target IDs across scoring file rows (`duplicate_ID`)
//! 4. ambiguous alleles
//! 5. multiallelic target rows
//! 6. strand flips
//! 7. final status

use std::collections::HashSet;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::core::types::{ExclusionReason, MatchStatus};
use crate::core::variant::{ScoreFile, TargetOrder};
use crate::matching::candidate::{LabeledMatch, MatchCandidate};

/// Caller policy for the labelling steps
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelParams {
    /// Exclude palindromic (A/T, C/G) matches
    pub remove_ambiguous: bool,
    /// Exclude matches to multiallelic target rows
    pub remove_multiallelic: bool,
    /// Exclude strand flipped matches
    pub skip_flip: bool,
    /// Keep the lowest `row_nr` of a duplicate ID group instead of excluding all
    pub keep_first_match: bool,
}

impl Default for LabelParams {
    fn default() -> Self {
        Self {
            remove_ambiguous: true,
            remove_multiallelic: true,
            skip_flip: false,
            keep_first_match: false,
        }
    }
}

/// Label every candidate and add one `unmatched` row for each scoring file row
/// without candidates.
///
/// Output is sorted by accession, `row_nr`, strategy priority and target order.
#[must_use]
pub fn label_matches(
    scorefile: &ScoreFile,
    candidates: Vec<MatchCandidate>,
    params: &LabelParams,
) -> Vec<LabeledMatch> {
    let mut rows: Vec<LabeledMatch> = candidates
        .into_iter()
        .map(LabeledMatch::from_candidate)
        .collect();
    rows.sort_by(|a, b| sort_key(a).cmp(&sort_key(b)));

    label_best_match(&mut rows);
    label_duplicate_id(&mut rows, params.keep_first_match);

    for row in &mut rows {
        label_alleles(row, params);
        row.status = status(row);
    }

    let unmatched: Vec<LabeledMatch> = {
        let seen: HashSet<(&str, u64)> = rows
            .iter()
            .map(|r| (r.score.accession.as_str(), r.score.row_nr))
            .collect();
        scorefile
            .variants
            .iter()
            .filter(|s| !seen.contains(&(s.accession.as_str(), s.row_nr)))
            .map(|s| LabeledMatch::unmatched(Arc::clone(s)))
            .collect()
    };

    info!(
        "Labelled {} candidates, {} scoring file rows without candidates",
        rows.len(),
        unmatched.len()
    );

    rows.extend(unmatched);
    rows.sort_by(|a, b| sort_key(a).cmp(&sort_key(b)));
    rows
}

type SortKey<'a> = (&'a str, u64, Option<u8>, Option<TargetOrder>);

fn sort_key(row: &LabeledMatch) -> SortKey<'_> {
    (
        row.score.accession.as_str(),
        row.score.row_nr,
        row.match_type().map(|m| m.priority()),
        row.candidate.as_ref().map(|c| c.target.order),
    )
}

/// Steps 1 and 2. Rows must be sorted by [`sort_key`], so the first row of
/// each group has the best priority and the earliest target.
fn label_best_match(rows: &mut [LabeledMatch]) {
    let mut n_ties = 0;
    let mut start = 0;
    while start < rows.len() {
        let group = (rows[start].score.accession.clone(), rows[start].score.row_nr);
        let end = start
            + rows[start..]
                .iter()
                .take_while(|r| (r.score.accession.as_str(), r.score.row_nr) == (group.0.as_str(), group.1))
                .count();

        let best_type = rows[start].match_type();
        let n_best = rows[start..end]
            .iter()
            .take_while(|r| r.match_type() == best_type)
            .count();

        for (i, row) in rows[start..end].iter_mut().enumerate() {
            row.best_match = Some(i == 0);
            row.duplicate_best_match = n_best > 1 && i < n_best;
        }
        if n_best > 1 {
            n_ties += 1;
        }
        start = end;
    }

    if n_ties > 0 {
        debug!("{n_ties} scoring file rows had tied best matches, kept the earliest target row");
    }
}

/// Step 3: best matches from different scoring file rows that land on the same target ID
fn label_duplicate_id(rows: &mut [LabeledMatch], keep_first_match: bool) {
    let mut best: Vec<usize> = rows
        .iter()
        .enumerate()
        .filter(|(_, r)| r.is_best())
        .map(|(i, _)| i)
        .collect();

    let key = |r: &LabeledMatch| {
        (
            r.score.accession.clone(),
            r.candidate.as_ref().map(|c| c.target.id.clone()),
        )
    };
    best.sort_by_cached_key(|&i| (key(&rows[i]), rows[i].score.row_nr));

    let mut n_duplicates = 0;
    for group in best.chunk_by_key(|&i| key(&rows[i])) {
        if group.len() < 2 {
            continue;
        }
        n_duplicates += group.len();
        for (rank, &i) in group.iter().enumerate() {
            rows[i].duplicate_id = true;
            if !(keep_first_match && rank == 0) {
                rows[i].exclusions.add(ExclusionReason::DuplicateId);
            }
        }
    }

    if n_duplicates > 0 {
        debug!("{n_duplicates} best matches share a target ID with another scoring file row");
    }
}

/// Steps 4 to 6
fn label_alleles(row: &mut LabeledMatch, params: &LabelParams) {
    let Some(candidate) = &row.candidate else {
        return;
    };

    row.ambiguous = candidate.is_ambiguous();
    if row.ambiguous && params.remove_ambiguous {
        row.exclusions.add(ExclusionReason::Ambiguous);
    }

    if candidate.target.is_multiallelic && params.remove_multiallelic {
        row.exclusions.add(ExclusionReason::Multiallelic);
    }

    row.match_flipped = candidate.match_type.is_flip();
    if row.match_flipped && params.skip_flip {
        row.exclusions.add(ExclusionReason::StrandFlip);
    }
}

/// Step 7
fn status(row: &LabeledMatch) -> MatchStatus {
    match row.best_match {
        None => MatchStatus::Unmatched,
        Some(_) if row.exclude() => MatchStatus::Excluded,
        Some(false) => MatchStatus::NotBest,
        Some(true) => MatchStatus::Matched,
    }
}

/// Contiguous runs of equal keys
trait ChunkByKey<T> {
    fn chunk_by_key<K: PartialEq>(&self, key: impl FnMut(&T) -> K) -> Vec<&[T]>;
}

impl<T> ChunkByKey<T> for [T] {
    fn chunk_by_key<K: PartialEq>(&self, mut key: impl FnMut(&T) -> K) -> Vec<&[T]> {
        let mut chunks = Vec::new();
        let mut start = 0;
        while start < self.len() {
            let k = key(&self[start]);
            let mut end = start + 1;
            while end < self.len() && key(&self[end]) == k {
                end += 1;
            }
            chunks.push(&self[start..end]);
            start = end;
        }
        chunks
    }
}
