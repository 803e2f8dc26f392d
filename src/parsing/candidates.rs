//! Flat record for match candidates staged by `match --only-match`.

use std::path::Path;
use std::sync::Arc;

use csv::ReaderBuilder;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::core::types::{EffectType, MatchType};
use crate::core::variant::{ScoreVariant, TargetOrder, TargetVariant};
use crate::matching::candidate::MatchCandidate;
use crate::parsing::ParseError;
use crate::utils::io::open_text;

/// One candidate as a single tab-separated row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateRecord {
    pub accession: String,
    pub row_nr: u64,
    pub chr_name: String,
    pub chr_position: u64,
    pub effect_allele: String,
    pub other_allele: Option<String>,
    pub effect_weight: f64,
    pub effect_type: EffectType,
    #[serde(rename = "ID")]
    pub id: String,
    #[serde(rename = "REF")]
    pub ref_allele: String,
    #[serde(rename = "ALT")]
    pub alt: String,
    pub is_multiallelic: bool,
    pub target_file: u32,
    pub target_line: u64,
    pub target_allele: u32,
    pub match_type: MatchType,
}

impl From<&MatchCandidate> for CandidateRecord {
    fn from(c: &MatchCandidate) -> Self {
        let s = &c.score;
        let t = &c.target;
        Self {
            accession: s.accession.clone(),
            row_nr: s.row_nr,
            // candidates only exist for rows with coordinates, which equal the target's
            chr_name: t.chrom.clone(),
            chr_position: t.pos,
            effect_allele: s.effect_allele.clone(),
            other_allele: s.other_allele.clone(),
            effect_weight: s.effect_weight,
            effect_type: s.effect_type,
            id: t.id.clone(),
            ref_allele: t.ref_allele.clone(),
            alt: t.alt.clone(),
            is_multiallelic: t.is_multiallelic,
            target_file: t.order.file,
            target_line: t.order.line,
            target_allele: t.order.allele,
            match_type: c.match_type,
        }
    }
}

impl From<CandidateRecord> for MatchCandidate {
    fn from(r: CandidateRecord) -> Self {
        let target = TargetVariant::new(r.chr_name.clone(), r.chr_position, r.id, r.ref_allele, r.alt)
            .with_multiallelic(r.is_multiallelic)
            .with_order(TargetOrder {
                file: r.target_file,
                line: r.target_line,
                allele: r.target_allele,
            });
        let score = ScoreVariant {
            accession: r.accession,
            row_nr: r.row_nr,
            chr_name: Some(r.chr_name),
            chr_position: Some(r.chr_position),
            effect_allele: r.effect_allele,
            other_allele: r.other_allele,
            effect_weight: r.effect_weight,
            effect_type: r.effect_type,
        };
        MatchCandidate::new(Arc::new(score), Arc::new(target), r.match_type)
    }
}

/// Read a candidate file written by `match --only-match`
///
/// # Errors
///
/// Returns `ParseError::Io` if the file cannot be opened, or
/// `ParseError::InvalidCandidates` if a row cannot be decoded.
pub fn read_candidates(path: &Path) -> Result<Vec<MatchCandidate>, ParseError> {
    let reader = open_text(path)?;
    let mut csv_reader = ReaderBuilder::new().delimiter(b'\t').from_reader(reader);

    let mut candidates = Vec::new();
    for result in csv_reader.deserialize::<CandidateRecord>() {
        let record = result.map_err(|e| ParseError::InvalidCandidates {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        candidates.push(MatchCandidate::from(record));
    }

    debug!("Read {} match candidates from {}", candidates.len(), path.display());
    Ok(candidates)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_keeps_target_order() {
        let score = Arc::new(ScoreVariant {
            accession: "PGS000001".to_string(),
            row_nr: 4,
            chr_name: Some("2".to_string()),
            chr_position: Some(20),
            effect_allele: "T".to_string(),
            other_allele: None,
            effect_weight: 0.25,
            effect_type: EffectType::Dominant,
        });
        let order = TargetOrder { file: 1, line: 7, allele: 1 };
        let target = Arc::new(
            TargetVariant::new("2", 20, "2:20:A:C,G", "A", "G")
                .with_multiallelic(true)
                .with_order(order),
        );
        let candidate = MatchCandidate::new(score, target, MatchType::NoOaRefFlip);

        let record = CandidateRecord::from(&candidate);
        assert_eq!(record.target_line, 7);
        assert_eq!(record.id, "2:20:A:C,G");

        let restored = MatchCandidate::from(record);
        assert_eq!(restored.target.order, order);
        assert_eq!(restored.target.ref_flip, "T");
        assert!(restored.target.is_multiallelic);
        assert_eq!(restored.score.other_allele, None);
        assert_eq!(restored.match_type, MatchType::NoOaRefFlip);
    }

    #[test]
    fn test_read_invalid_candidates() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad_matches.tsv");
        std::fs::write(&path, "accession\trow_nr\nPGS000001\tzero\n").unwrap();
        assert!(matches!(
            read_candidates(&path),
            Err(ParseError::InvalidCandidates { .. })
        ));
    }
}
