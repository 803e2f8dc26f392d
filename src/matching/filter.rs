use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;
use tracing::{error, info};

use crate::core::types::MatchStatus;
use crate::core::variant::ScoreFile;
use crate::matching::candidate::LabeledMatch;
use crate::matching::MatchError;
use crate::utils::validation::count_to_f64;

/// Match rate of one accession
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AccessionRate {
    pub accession: String,
    /// Scoring file rows for this accession
    pub n_variants: usize,
    /// Rows whose best match survived labelling
    pub n_matched: usize,
    pub match_rate: f64,
    pub fail_rate: f64,
    pub score_pass: bool,
}

/// One row of the summary log
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryRow {
    pub dataset: String,
    pub accession: String,
    pub score_pass: bool,
    pub match_rate: f64,
    pub match_status: MatchStatus,
    pub ambiguous: bool,
    pub is_multiallelic: bool,
    pub duplicate_best_match: bool,
    #[serde(rename = "duplicate_ID")]
    pub duplicate_id: bool,
    pub count: usize,
    pub percent: f64,
}

/// Result of applying the minimum overlap
#[derive(Debug, Clone)]
pub struct FilteredMatches {
    /// Best, non-excluded matches of passing accessions
    pub accepted: Vec<LabeledMatch>,
    pub rates: Vec<AccessionRate>,
    pub summary: Vec<SummaryRow>,
    pub min_overlap: f64,
}

impl FilteredMatches {
    /// Accessions that passed, in sorted order
    #[must_use]
    pub fn passing(&self) -> Vec<&str> {
        self.rates
            .iter()
            .filter(|r| r.score_pass)
            .map(|r| r.accession.as_str())
            .collect()
    }

    /// Fail the run when nothing survived filtering
    ///
    /// # Errors
    ///
    /// Returns `MatchError::ZeroMatches` if no accepted match remains.
    pub fn check_any_pass(&self) -> Result<(), MatchError> {
        if self.accepted.is_empty() {
            error!("No scoring files passed matching");
            return Err(MatchError::ZeroMatches {
                min_overlap: self.min_overlap,
            });
        }
        Ok(())
    }
}

/// Compute match rates, keep accepted matches of passing accessions and
/// summarise the labelled rows.
#[must_use]
pub fn filter_matches(
    labeled: &[LabeledMatch],
    scorefile: &ScoreFile,
    dataset: &str,
    min_overlap: f64,
) -> FilteredMatches {
    let rates = match_rates(labeled, scorefile, min_overlap);

    for rate in &rates {
        if rate.score_pass {
            info!(
                "{}: {}/{} variants matched (match rate {:.3})",
                rate.accession, rate.n_matched, rate.n_variants, rate.match_rate
            );
        } else {
            error!(
                "{}: match rate {:.3} is below the minimum overlap {}, dropping scoring file",
                rate.accession, rate.match_rate, min_overlap
            );
        }
    }

    let passing: BTreeSet<&str> = rates
        .iter()
        .filter(|r| r.score_pass)
        .map(|r| r.accession.as_str())
        .collect();

    let accepted: Vec<LabeledMatch> = labeled
        .iter()
        .filter(|r| r.status == MatchStatus::Matched)
        .filter(|r| passing.contains(r.score.accession.as_str()))
        .cloned()
        .collect();

    let summary = summarise(labeled, &rates, dataset);

    FilteredMatches {
        accepted,
        rates,
        summary,
        min_overlap,
    }
}

/// Verify no target ID is matched twice by one accession
///
/// # Errors
///
/// Returns `MatchError::DuplicateMatch` naming the first repeated pair.
pub fn check_unique_matches(labeled: &[LabeledMatch]) -> Result<(), MatchError> {
    let mut seen: BTreeSet<(&str, &str)> = BTreeSet::new();
    for row in labeled.iter().filter(|r| r.status == MatchStatus::Matched) {
        let Some(candidate) = &row.candidate else {
            continue;
        };
        if !seen.insert((row.score.accession.as_str(), candidate.target.id.as_str())) {
            return Err(MatchError::DuplicateMatch(format!(
                "{} matched target variant {} more than once",
                row.score.accession, candidate.target.id
            )));
        }
    }
    Ok(())
}

/// Per-accession match rate over scoring file rows.
///
/// A row counts as matched if it has a candidate with status `matched`.
#[must_use]
pub fn match_rates(
    labeled: &[LabeledMatch],
    scorefile: &ScoreFile,
    min_overlap: f64,
) -> Vec<AccessionRate> {
    let mut matched: BTreeMap<&str, usize> = BTreeMap::new();
    for row in labeled.iter().filter(|r| r.status == MatchStatus::Matched) {
        *matched.entry(row.score.accession.as_str()).or_insert(0) += 1;
    }

    scorefile
        .rows_per_accession()
        .into_iter()
        .map(|(accession, n_variants)| {
            let n_matched = matched.get(accession).copied().unwrap_or(0);
            let match_rate = count_to_f64(n_matched) / count_to_f64(n_variants);
            AccessionRate {
                accession: accession.to_string(),
                n_variants,
                n_matched,
                match_rate,
                fail_rate: 1.0 - match_rate,
                score_pass: match_rate >= min_overlap,
            }
        })
        .collect()
}

/// Count one representative row per scoring file row: its best match, or its
/// unmatched placeholder.
#[must_use]
pub fn summarise(labeled: &[LabeledMatch], rates: &[AccessionRate], dataset: &str) -> Vec<SummaryRow> {
    type Key<'a> = (&'a str, MatchStatus, bool, bool, bool, bool);

    let mut counts: BTreeMap<Key<'_>, usize> = BTreeMap::new();
    for row in labeled
        .iter()
        .filter(|r| r.is_best() || r.status == MatchStatus::Unmatched)
    {
        let key = (
            row.score.accession.as_str(),
            row.status,
            row.ambiguous,
            row.is_multiallelic(),
            row.duplicate_best_match,
            row.duplicate_id,
        );
        *counts.entry(key).or_insert(0) += 1;
    }

    let by_accession: BTreeMap<&str, &AccessionRate> =
        rates.iter().map(|r| (r.accession.as_str(), r)).collect();

    counts
        .into_iter()
        .filter_map(|(key, count)| {
            let (accession, match_status, ambiguous, is_multiallelic, duplicate_best_match, duplicate_id) = key;
            let rate = by_accession.get(accession)?;
            Some(SummaryRow {
                dataset: dataset.to_string(),
                accession: accession.to_string(),
                score_pass: rate.score_pass,
                match_rate: rate.match_rate,
                match_status,
                ambiguous,
                is_multiallelic,
                duplicate_best_match,
                duplicate_id,
                count,
                percent: count_to_f64(count) / count_to_f64(rate.n_variants) * 100.0,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::EffectType;
    use crate::core::variant::{ScoreVariant, TargetOrder, TargetVariant};
    use crate::matching::engine::match_variants;
    use crate::matching::label::{label_matches, LabelParams};

    fn score(accession: &str, row_nr: u64, pos: u64) -> ScoreVariant {
        ScoreVariant {
            accession: accession.to_string(),
            row_nr,
            chr_name: Some("1".to_string()),
            chr_position: Some(pos),
            effect_allele: "A".to_string(),
            other_allele: Some("C".to_string()),
            effect_weight: 1.0,
            effect_type: EffectType::Additive,
        }
    }

    fn target(pos: u64) -> TargetVariant {
        TargetVariant::new("1", pos, format!("1:{pos}:A:C"), "A", "C")
            .with_order(TargetOrder { file: 0, line: pos, allele: 0 })
    }

    fn run(scores: Vec<ScoreVariant>, targets: Vec<TargetVariant>, min_overlap: f64) -> (ScoreFile, FilteredMatches) {
        let scorefile = ScoreFile::new(scores);
        let candidates = match_variants(&scorefile.variants, targets);
        let labeled = label_matches(&scorefile, candidates, &LabelParams::default());
        let filtered = filter_matches(&labeled, &scorefile, "test", min_overlap);
        (scorefile, filtered)
    }

    #[test]
    fn test_all_matched() {
        let scores = vec![score("PGS1", 0, 1), score("PGS1", 1, 2), score("PGS1", 2, 3)];
        let (_, filtered) = run(scores, vec![target(1), target(2), target(3)], 0.9);

        assert_eq!(filtered.rates.len(), 1);
        assert!((filtered.rates[0].match_rate - 1.0).abs() < f64::EPSILON);
        assert!(filtered.rates[0].score_pass);
        assert_eq!(filtered.accepted.len(), 3);
        assert!(filtered.check_any_pass().is_ok());

        assert_eq!(filtered.summary.len(), 1);
        assert_eq!(filtered.summary[0].match_status, MatchStatus::Matched);
        assert_eq!(filtered.summary[0].count, 3);
        assert!((filtered.summary[0].percent - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_failing_accession_is_dropped() {
        let scores = vec![
            score("PGS1", 0, 1),
            score("PGS1", 1, 2),
            score("PGS1", 2, 3),
            score("PGS2", 0, 1),
        ];
        let (_, filtered) = run(scores, vec![target(1)], 0.9);

        let pgs1 = &filtered.rates[0];
        assert_eq!(pgs1.n_matched, 1);
        assert!((pgs1.fail_rate - 2.0 / 3.0).abs() < 1e-9);
        assert!(!pgs1.score_pass);

        assert_eq!(filtered.passing(), vec!["PGS2"]);
        assert!(filtered.accepted.iter().all(|r| r.score.accession == "PGS2"));

        let unmatched = filtered
            .summary
            .iter()
            .find(|s| s.accession == "PGS1" && s.match_status == MatchStatus::Unmatched)
            .unwrap();
        assert_eq!(unmatched.count, 2);
        assert!(!unmatched.score_pass);
    }

    #[test]
    fn test_pass_at_exact_threshold() {
        let scores = vec![score("PGS1", 0, 1), score("PGS1", 1, 2), score("PGS1", 2, 3), score("PGS1", 3, 4)];
        let (_, filtered) = run(scores, vec![target(1), target(2), target(3)], 0.75);
        assert!(filtered.rates[0].score_pass);
    }

    #[test]
    fn test_zero_matches() {
        let (_, filtered) = run(vec![score("PGS1", 0, 1)], vec![target(9)], 0.75);
        assert!(filtered.accepted.is_empty());
        let err = filtered.check_any_pass().unwrap_err();
        assert!(matches!(err, MatchError::ZeroMatches { .. }));
        assert_eq!(err.exit_code(), 15);
    }

    #[test]
    fn test_check_unique_matches() {
        let scorefile = ScoreFile::new(vec![score("PGS1", 0, 1), score("PGS1", 1, 2)]);
        let candidates = match_variants(&scorefile.variants, vec![target(1), target(2)]);
        let mut labeled = label_matches(&scorefile, candidates, &LabelParams::default());
        assert!(check_unique_matches(&labeled).is_ok());

        // force the second row onto the first row's target
        let first = labeled[0].candidate.clone().unwrap();
        labeled[1].candidate.as_mut().unwrap().target = first.target;
        let err = check_unique_matches(&labeled).unwrap_err();
        assert!(matches!(err, MatchError::DuplicateMatch(_)));
    }

    #[test]
    fn test_excluded_rows_count_as_failures() {
        // palindromic target, removed by default
        let scores = vec![ScoreVariant {
            other_allele: Some("T".to_string()),
            ..score("PGS1", 0, 1)
        }];
        let ambiguous = TargetVariant::new("1", 1, "1:1:A:T", "A", "T");
        let (_, filtered) = run(scores, vec![ambiguous], 0.5);
        assert_eq!(filtered.rates[0].n_matched, 0);
        assert_eq!(filtered.summary[0].match_status, MatchStatus::Excluded);
        assert!(filtered.summary[0].ambiguous);
    }
}
