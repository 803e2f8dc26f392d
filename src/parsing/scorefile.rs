//! Parser for combined long-format scoring files.
//!
//! The file is tab-separated with a header naming at least
//! `chr_name chr_position effect_allele other_allele effect_weight effect_type accession row_nr`.
//! Column order is free and extra columns are ignored.

use std::collections::HashMap;
use std::path::Path;

use csv::{ReaderBuilder, StringRecord};
use tracing::{debug, info};

use crate::core::types::EffectType;
use crate::core::variant::{ScoreFile, ScoreVariant};
use crate::parsing::ParseError;
use crate::utils::io::open_text;

pub const MANDATORY_COLUMNS: [&str; 8] = [
    "chr_name",
    "chr_position",
    "effect_allele",
    "other_allele",
    "effect_weight",
    "effect_type",
    "accession",
    "row_nr",
];

/// Column positions resolved from the header
struct ColumnIndex([usize; 8]);

impl ColumnIndex {
    fn from_headers(headers: &StringRecord) -> Result<Self, ParseError> {
        let mut idx = [0; 8];
        for (slot, name) in idx.iter_mut().zip(MANDATORY_COLUMNS) {
            *slot = headers
                .iter()
                .position(|h| h == name)
                .ok_or_else(|| ParseError::MissingColumn(name.to_string()))?;
        }
        Ok(Self(idx))
    }

    fn get<'r>(&self, record: &'r StringRecord, column: usize) -> &'r str {
        record.get(self.0[column]).unwrap_or("").trim()
    }
}

/// Read a combined scoring file, optionally keeping only one chromosome.
///
/// Rows with an empty `chr_name` or `chr_position` are kept with null
/// coordinates unless a chromosome filter is given.
///
/// # Errors
///
/// Returns `ParseError::MissingColumn` if a mandatory column is absent,
/// `ParseError::InvalidScorefile` for malformed values, and
/// `ParseError::DuplicateEffectWeight` if one variant has two weights.
pub fn read_scorefile(path: &Path, chrom_filter: Option<&str>) -> Result<ScoreFile, ParseError> {
    let reader = open_text(path)?;
    let mut csv_reader = ReaderBuilder::new()
        .delimiter(b'\t')
        .has_headers(true)
        .from_reader(reader);

    let headers = csv_reader.headers()?.clone();
    let columns = ColumnIndex::from_headers(&headers)?;

    let mut variants = Vec::new();
    for (i, result) in csv_reader.records().enumerate() {
        // 1-based, counting the header line
        let line_num = i + 2;
        let record = result.map_err(|e| {
            ParseError::InvalidScorefile(format!("line {line_num}: {e}"))
        })?;

        let variant = parse_record(&columns, &record, line_num)?;
        if let Some(chrom) = chrom_filter {
            if variant.chr_name.as_deref() != Some(chrom) {
                continue;
            }
        }
        variants.push(variant);
    }

    if variants.is_empty() && chrom_filter.is_none() {
        return Err(ParseError::InvalidScorefile(format!(
            "no variants found in {}",
            path.display()
        )));
    }

    validate_effect_weights(&variants)?;

    let scorefile = ScoreFile::new(variants);
    info!(
        "Read {} scoring file rows across {} accessions from {}",
        scorefile.len(),
        scorefile.accessions().len(),
        path.display()
    );
    Ok(scorefile)
}

fn parse_record(
    columns: &ColumnIndex,
    record: &StringRecord,
    line_num: usize,
) -> Result<ScoreVariant, ParseError> {
    let bad = |what: &str, value: &str| {
        ParseError::InvalidScorefile(format!("line {line_num}: invalid {what} '{value}'"))
    };
    let optional = |column: usize| {
        let value = columns.get(record, column);
        (!value.is_empty()).then(|| value.to_string())
    };

    let accession = columns.get(record, 6);
    if accession.is_empty() {
        return Err(bad("accession", accession));
    }

    let effect_allele = columns.get(record, 2);
    if effect_allele.is_empty() {
        return Err(bad("effect_allele", effect_allele));
    }

    let chr_position = match columns.get(record, 1) {
        "" => None,
        value => Some(value.parse::<u64>().map_err(|_| bad("chr_position", value))?),
    };

    let weight = columns.get(record, 4);
    let effect_weight: f64 = weight.parse().map_err(|_| bad("effect_weight", weight))?;
    if !effect_weight.is_finite() {
        return Err(bad("effect_weight", weight));
    }

    let effect_type = columns.get(record, 5);
    let effect_type: EffectType = effect_type
        .parse()
        .map_err(|_| bad("effect_type", effect_type))?;

    let row_nr = columns.get(record, 7);
    let row_nr: u64 = row_nr.parse().map_err(|_| bad("row_nr", row_nr))?;

    let mut chr_name = optional(0);
    let mut chr_position = chr_position;
    if chr_name.is_none() || chr_position.is_none() {
        chr_name = None;
        chr_position = None;
    }

    Ok(ScoreVariant {
        accession: accession.to_string(),
        row_nr,
        chr_name,
        chr_position,
        effect_allele: effect_allele.to_string(),
        other_allele: optional(3),
        effect_weight,
        effect_type,
    })
}

/// Check that every variant of an accession carries a single effect weight.
///
/// Repeated keys with the same weight are allowed. Rows without coordinates
/// are skipped because they never match.
///
/// # Errors
///
/// Returns `ParseError::DuplicateEffectWeight` naming the first conflict.
pub fn validate_effect_weights(variants: &[ScoreVariant]) -> Result<(), ParseError> {
    type Key<'a> = (&'a str, &'a str, u64, &'a str, Option<&'a str>);

    let mut seen: HashMap<Key<'_>, (u64, u64)> = HashMap::with_capacity(variants.len());
    for v in variants {
        let (Some(chrom), Some(pos)) = (v.chr_name.as_deref(), v.chr_position) else {
            continue;
        };
        let key = (
            v.accession.as_str(),
            chrom,
            pos,
            v.effect_allele.as_str(),
            v.other_allele.as_deref(),
        );
        let bits = v.effect_weight.to_bits();
        match seen.get(&key) {
            Some(&(first_row, first_bits)) if first_bits != bits => {
                return Err(ParseError::DuplicateEffectWeight {
                    accession: v.accession.clone(),
                    variant: format!(
                        "{chrom}:{pos}:{}:{}",
                        v.effect_allele,
                        v.other_allele.as_deref().unwrap_or(".")
                    ),
                    first_row,
                    second_row: v.row_nr,
                });
            }
            Some(_) => {}
            None => {
                seen.insert(key, (v.row_nr, bits));
            }
        }
    }

    debug!("Validated effect weights for {} variants", seen.len());
    Ok(())
}
