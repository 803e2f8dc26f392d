use std::collections::BTreeSet;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Allele orientation strategy used to join a scoring file variant to a target variant.
///
/// Variants are declared in priority order, so the derived `Ord` is the
/// best-match priority: `Refalt` (0) wins over everything, `NoOaAltFlip` (7) loses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchType {
    /// effect allele = REF, other allele = ALT
    Refalt,
    /// effect allele = ALT, other allele = REF
    Altref,
    /// effect allele = complement(REF), other allele = complement(ALT)
    RefaltFlip,
    /// effect allele = complement(ALT), other allele = complement(REF)
    AltrefFlip,
    /// effect allele = REF, no other allele
    NoOaRef,
    /// effect allele = ALT, no other allele
    NoOaAlt,
    /// effect allele = complement(REF), no other allele
    NoOaRefFlip,
    /// effect allele = complement(ALT), no other allele
    NoOaAltFlip,
}

/// Which target allele a strategy aligns the effect allele to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetAllele {
    Ref,
    Alt,
}

impl MatchType {
    /// All strategies in priority order
    pub const ALL: [MatchType; 8] = [
        MatchType::Refalt,
        MatchType::Altref,
        MatchType::RefaltFlip,
        MatchType::AltrefFlip,
        MatchType::NoOaRef,
        MatchType::NoOaAlt,
        MatchType::NoOaRefFlip,
        MatchType::NoOaAltFlip,
    ];

    /// Numeric priority, lower wins
    #[must_use]
    pub fn priority(self) -> u8 {
        self as u8
    }

    /// Strategies that join on both effect and other allele
    #[must_use]
    pub fn requires_other_allele(self) -> bool {
        matches!(
            self,
            Self::Refalt | Self::Altref | Self::RefaltFlip | Self::AltrefFlip
        )
    }

    /// Strategies that compare against complemented target alleles
    #[must_use]
    pub fn is_flip(self) -> bool {
        matches!(
            self,
            Self::RefaltFlip | Self::AltrefFlip | Self::NoOaRefFlip | Self::NoOaAltFlip
        )
    }

    #[must_use]
    pub fn effect_allele_target(self) -> TargetAllele {
        match self {
            Self::Refalt | Self::RefaltFlip | Self::NoOaRef | Self::NoOaRefFlip => {
                TargetAllele::Ref
            }
            Self::Altref | Self::AltrefFlip | Self::NoOaAlt | Self::NoOaAltFlip => {
                TargetAllele::Alt
            }
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Refalt => "refalt",
            Self::Altref => "altref",
            Self::RefaltFlip => "refalt_flip",
            Self::AltrefFlip => "altref_flip",
            Self::NoOaRef => "no_oa_ref",
            Self::NoOaAlt => "no_oa_alt",
            Self::NoOaRefFlip => "no_oa_ref_flip",
            Self::NoOaAltFlip => "no_oa_alt_flip",
        }
    }
}

impl std::fmt::Display for MatchType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for MatchType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|m| m.as_str() == s)
            .ok_or_else(|| format!("unknown match type '{s}'"))
    }
}

/// Final decision for a labelled row
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchStatus {
    /// Best match and not excluded
    Matched,
    /// A candidate that lost to a higher priority candidate
    NotBest,
    /// Carries at least one exclusion reason
    Excluded,
    /// The scoring file row had no candidates at all
    Unmatched,
}

impl MatchStatus {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Matched => "matched",
            Self::NotBest => "not_best",
            Self::Excluded => "excluded",
            Self::Unmatched => "unmatched",
        }
    }
}

impl std::fmt::Display for MatchStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Why a candidate was excluded from the output scorefiles
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExclusionReason {
    DuplicateId,
    Ambiguous,
    Multiallelic,
    StrandFlip,
}

impl ExclusionReason {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::DuplicateId => "duplicate_ID",
            Self::Ambiguous => "ambiguous",
            Self::Multiallelic => "multiallelic",
            Self::StrandFlip => "strand_flip",
        }
    }
}

/// Accumulated exclusion reasons. Reasons can only be added.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Exclusions(BTreeSet<ExclusionReason>);

impl Exclusions {
    pub fn add(&mut self, reason: ExclusionReason) {
        self.0.insert(reason);
    }

    #[must_use]
    pub fn is_excluded(&self) -> bool {
        !self.0.is_empty()
    }

    #[must_use]
    pub fn contains(&self, reason: ExclusionReason) -> bool {
        self.0.contains(&reason)
    }

    pub fn iter(&self) -> impl Iterator<Item = ExclusionReason> + '_ {
        self.0.iter().copied()
    }
}

impl std::fmt::Display for Exclusions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let reasons: Vec<&str> = self.iter().map(ExclusionReason::as_str).collect();
        write!(f, "{}", reasons.join(";"))
    }
}

/// How an effect weight contributes to a score
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EffectType {
    Additive,
    Dominant,
    Recessive,
}

impl EffectType {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Additive => "additive",
            Self::Dominant => "dominant",
            Self::Recessive => "recessive",
        }
    }
}

impl std::fmt::Display for EffectType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for EffectType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "additive" => Ok(Self::Additive),
            "dominant" => Ok(Self::Dominant),
            "recessive" => Ok(Self::Recessive),
            other => Err(format!("unknown effect type '{other}'")),
        }
    }
}

/// Target variant table layout
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetFormat {
    /// plink1 .bim: 6 unnamed columns
    Bim,
    /// plink2 .pvar: VCF-like with a `#CHROM` header
    Pvar,
}

impl std::fmt::Display for TargetFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Bim => write!(f, "bim"),
            Self::Pvar => write!(f, "pvar"),
        }
    }
}

/// Genome build of a coordinate system
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GenomeBuild {
    #[serde(rename = "GRCh37")]
    Grch37,
    #[serde(rename = "GRCh38")]
    Grch38,
}

impl std::fmt::Display for GenomeBuild {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Grch37 => write!(f, "GRCh37"),
            Self::Grch38 => write!(f, "GRCh38"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_match_type_priority_order() {
        let priorities: Vec<u8> = MatchType::ALL.iter().map(|m| m.priority()).collect();
        assert_eq!(priorities, vec![0, 1, 2, 3, 4, 5, 6, 7]);
        assert!(MatchType::Refalt < MatchType::Altref);
        assert!(MatchType::AltrefFlip < MatchType::NoOaRef);
        assert_eq!(MatchType::ALL.iter().min(), Some(&MatchType::Refalt));
    }

    #[test]
    fn test_match_type_round_trips_through_str() {
        for m in MatchType::ALL {
            assert_eq!(m.as_str().parse::<MatchType>().unwrap(), m);
        }
        assert!("refalt_flop".parse::<MatchType>().is_err());
    }

    #[test]
    fn test_match_type_properties() {
        assert!(MatchType::RefaltFlip.is_flip());
        assert!(MatchType::NoOaAltFlip.is_flip());
        assert!(!MatchType::Altref.is_flip());
        assert!(MatchType::AltrefFlip.requires_other_allele());
        assert!(!MatchType::NoOaRef.requires_other_allele());
        assert_eq!(MatchType::RefaltFlip.effect_allele_target(), TargetAllele::Ref);
        assert_eq!(MatchType::NoOaAlt.effect_allele_target(), TargetAllele::Alt);
    }

    #[test]
    fn test_exclusions_accumulate() {
        let mut exclusions = Exclusions::default();
        assert!(!exclusions.is_excluded());
        exclusions.add(ExclusionReason::StrandFlip);
        exclusions.add(ExclusionReason::Ambiguous);
        exclusions.add(ExclusionReason::Ambiguous);
        assert!(exclusions.is_excluded());
        assert_eq!(exclusions.to_string(), "ambiguous;strand_flip");
    }

    #[test]
    fn test_effect_type_parse() {
        assert_eq!("dominant".parse::<EffectType>().unwrap(), EffectType::Dominant);
        assert!("multiplicative".parse::<EffectType>().is_err());
    }
}
