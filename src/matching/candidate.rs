use std::sync::Arc;

use crate::core::types::{Exclusions, MatchStatus, MatchType, TargetAllele};
use crate::core::variant::{ScoreVariant, TargetVariant};

/// One proposed correspondence between a scoring file row and a target row
#[derive(Debug, Clone, PartialEq)]
pub struct MatchCandidate {
    pub score: Arc<ScoreVariant>,
    pub target: Arc<TargetVariant>,
    pub match_type: MatchType,
}

impl MatchCandidate {
    #[must_use]
    pub fn new(score: Arc<ScoreVariant>, target: Arc<TargetVariant>, match_type: MatchType) -> Self {
        Self {
            score,
            target,
            match_type,
        }
    }

    /// Target allele, as named in the target, that the effect allele aligned to
    #[must_use]
    pub fn matched_effect_allele(&self) -> &str {
        match self.match_type.effect_allele_target() {
            TargetAllele::Ref => &self.target.ref_allele,
            TargetAllele::Alt => &self.target.alt,
        }
    }

    /// REF and ALT are complements of each other (A/T, C/G)
    #[must_use]
    pub fn is_ambiguous(&self) -> bool {
        crate::core::allele::is_ambiguous(&self.target.ref_allele, &self.target.alt)
    }
}

/// A scoring file row after labelling: either one of its candidates, or a
/// single placeholder when it had no candidates.
#[derive(Debug, Clone)]
pub struct LabeledMatch {
    pub score: Arc<ScoreVariant>,
    /// `None` for scoring file rows without any candidate
    pub candidate: Option<MatchCandidate>,
    /// `None` when there was no candidate
    pub best_match: Option<bool>,
    pub duplicate_best_match: bool,
    pub duplicate_id: bool,
    pub ambiguous: bool,
    pub match_flipped: bool,
    pub exclusions: Exclusions,
    pub status: MatchStatus,
}

impl LabeledMatch {
    #[must_use]
    pub fn from_candidate(candidate: MatchCandidate) -> Self {
        Self {
            score: Arc::clone(&candidate.score),
            candidate: Some(candidate),
            best_match: Some(false),
            duplicate_best_match: false,
            duplicate_id: false,
            ambiguous: false,
            match_flipped: false,
            exclusions: Exclusions::default(),
            status: MatchStatus::NotBest,
        }
    }

    #[must_use]
    pub fn unmatched(score: Arc<ScoreVariant>) -> Self {
        Self {
            score,
            candidate: None,
            best_match: None,
            duplicate_best_match: false,
            duplicate_id: false,
            ambiguous: false,
            match_flipped: false,
            exclusions: Exclusions::default(),
            status: MatchStatus::Unmatched,
        }
    }

    #[must_use]
    pub fn is_best(&self) -> bool {
        self.best_match == Some(true)
    }

    #[must_use]
    pub fn exclude(&self) -> bool {
        self.exclusions.is_excluded()
    }

    #[must_use]
    pub fn is_multiallelic(&self) -> bool {
        self.candidate
            .as_ref()
            .is_some_and(|c| c.target.is_multiallelic)
    }

    #[must_use]
    pub fn match_type(&self) -> Option<MatchType> {
        self.candidate.as_ref().map(|c| c.match_type)
    }
}
