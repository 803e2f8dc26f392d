//! Match log and summary log.

use std::path::Path;

use csv::WriterBuilder;
use serde::Serialize;
use tracing::info;

use crate::core::types::{EffectType, MatchStatus, MatchType};
use crate::matching::candidate::{LabeledMatch, MatchCandidate};
use crate::matching::filter::SummaryRow;
use crate::matching::MatchError;
use crate::utils::io::create_text;

/// One row of the big match log
#[derive(Debug, Serialize)]
pub struct LogRecord<'a> {
    pub dataset: &'a str,
    pub accession: &'a str,
    pub row_nr: u64,
    pub chr_name: Option<&'a str>,
    pub chr_position: Option<u64>,
    pub effect_allele: &'a str,
    pub other_allele: Option<&'a str>,
    pub effect_weight: f64,
    pub effect_type: EffectType,
    #[serde(rename = "ID")]
    pub id: Option<&'a str>,
    #[serde(rename = "REF")]
    pub ref_allele: Option<&'a str>,
    #[serde(rename = "ALT")]
    pub alt: Option<&'a str>,
    pub matched_effect_allele: Option<&'a str>,
    pub match_type: Option<MatchType>,
    pub is_multiallelic: Option<bool>,
    pub best_match: Option<bool>,
    pub duplicate_best_match: bool,
    #[serde(rename = "duplicate_ID")]
    pub duplicate_id: bool,
    pub ambiguous: bool,
    pub match_flipped: bool,
    pub exclude: bool,
    pub exclusion_reasons: String,
    pub match_status: MatchStatus,
    pub match_candidate: bool,
}

impl<'a> LogRecord<'a> {
    #[must_use]
    pub fn new(dataset: &'a str, row: &'a LabeledMatch) -> Self {
        let s = &row.score;
        let c = row.candidate.as_ref();
        Self {
            dataset,
            accession: &s.accession,
            row_nr: s.row_nr,
            chr_name: s.chr_name.as_deref(),
            chr_position: s.chr_position,
            effect_allele: &s.effect_allele,
            other_allele: s.other_allele.as_deref(),
            effect_weight: s.effect_weight,
            effect_type: s.effect_type,
            id: c.map(|c| c.target.id.as_str()),
            ref_allele: c.map(|c| c.target.ref_allele.as_str()),
            alt: c.map(|c| c.target.alt.as_str()),
            matched_effect_allele: c.map(MatchCandidate::matched_effect_allele),
            match_type: c.map(|c| c.match_type),
            is_multiallelic: c.map(|c| c.target.is_multiallelic),
            best_match: row.best_match,
            duplicate_best_match: row.duplicate_best_match,
            duplicate_id: row.duplicate_id,
            ambiguous: row.ambiguous,
            match_flipped: row.match_flipped,
            exclude: row.exclude(),
            exclusion_reasons: row.exclusions.to_string(),
            match_status: row.status,
            match_candidate: c.is_some(),
        }
    }
}

/// Write every labelled row, one line per candidate or unmatched row
///
/// # Errors
///
/// Returns an I/O or CSV error if the log cannot be written.
pub fn write_match_log(path: &Path, dataset: &str, labeled: &[LabeledMatch]) -> Result<(), MatchError> {
    let mut writer = WriterBuilder::new().from_writer(create_text(path)?);
    for row in labeled {
        writer.serialize(LogRecord::new(dataset, row))?;
    }
    writer.flush()?;
    info!("Wrote match log with {} rows to {}", labeled.len(), path.display());
    Ok(())
}

/// # Errors
///
/// Returns an I/O or CSV error if the summary cannot be written.
pub fn write_summary(path: &Path, summary: &[SummaryRow]) -> Result<(), MatchError> {
    let mut writer = WriterBuilder::new().from_writer(create_text(path)?);
    for row in summary {
        writer.serialize(row)?;
    }
    writer.flush()?;
    info!("Wrote summary log to {}", path.display());
    Ok(())
}
