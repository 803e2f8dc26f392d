//! Wide plink-compatible scoring files.
//!
//! Accepted matches are pivoted to one row per (target ID, effect allele) with
//! one weight column per accession. A target ID can only appear once per file,
//! so IDs matched with several effect alleles are spread over numbered files.

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use csv::WriterBuilder;
use tracing::{debug, info};

use crate::core::types::EffectType;
use crate::core::variant::TargetOrder;
use crate::matching::candidate::LabeledMatch;
use crate::matching::MatchError;
use crate::utils::io::create_text;

/// Pivoted weights ready to be written
#[derive(Debug, Clone, PartialEq)]
pub struct ScoreTable {
    /// Chromosome, or `None` for a table covering all chromosomes
    pub chrom: Option<String>,
    pub effect_type: EffectType,
    /// Sequential split index
    pub index: usize,
    /// Weight column names, sorted
    pub accessions: Vec<String>,
    pub rows: Vec<ScoreTableRow>,
    n_filled: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScoreTableRow {
    pub id: String,
    pub effect_allele: String,
    /// One weight per accession, 0 where the accession has no weight
    pub weights: Vec<f64>,
}

impl ScoreTable {
    /// Number of non-null weights before zero filling
    #[must_use]
    pub fn n_weights(&self) -> usize {
        self.n_filled
    }

    #[must_use]
    pub fn file_name(&self, dataset: &str) -> String {
        format!(
            "{dataset}_{}_{}_{}.scorefile.gz",
            self.chrom.as_deref().unwrap_or("ALL"),
            self.effect_type,
            self.index
        )
    }
}

/// One accepted weight before pivoting
struct Entry<'a> {
    order: TargetOrder,
    id: &'a str,
    effect_allele: &'a str,
    accession: &'a str,
    weight: f64,
}

/// Pivot accepted matches into tables, split by effect type and optionally by chromosome.
///
/// # Errors
///
/// Returns `MatchError::DuplicateMatch` if one accession has two weights for the
/// same ID and effect allele, or if splitting did not conserve every weight.
pub fn pivot_tables(accepted: &[LabeledMatch], split_chromosomes: bool) -> Result<Vec<ScoreTable>, MatchError> {
    type GroupKey<'a> = (EffectType, Option<&'a str>);

    let mut groups: BTreeMap<GroupKey<'_>, Vec<Entry<'_>>> = BTreeMap::new();
    for row in accepted {
        let Some(candidate) = &row.candidate else {
            continue;
        };
        let chrom = split_chromosomes.then_some(candidate.target.chrom.as_str());
        groups
            .entry((row.score.effect_type, chrom))
            .or_default()
            .push(Entry {
                order: candidate.target.order,
                id: &candidate.target.id,
                effect_allele: candidate.matched_effect_allele(),
                accession: &row.score.accession,
                weight: row.score.effect_weight,
            });
    }

    let mut tables = Vec::new();
    for ((effect_type, chrom), mut entries) in groups {
        entries.sort_by(|a, b| (a.order, a.effect_allele).cmp(&(b.order, b.effect_allele)));
        let n_entries = entries.len();
        let split = split_duplicate_ids(entries);

        let mut n_written = 0;
        for (index, entries) in split.into_iter().enumerate() {
            let table = pivot(chrom, effect_type, index, entries)?;
            n_written += table.n_weights();
            tables.push(table);
        }

        if n_written != n_entries {
            return Err(MatchError::DuplicateMatch(format!(
                "{n_entries} {effect_type} weights split into tables holding {n_written}"
            )));
        }
    }

    Ok(tables)
}

/// Give each effect allele of an ID its own table: the n-th distinct effect
/// allele seen for an ID goes to table n.
fn split_duplicate_ids(entries: Vec<Entry<'_>>) -> Vec<Vec<Entry<'_>>> {
    let mut alleles_per_id: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
    let mut split: Vec<Vec<Entry<'_>>> = Vec::new();

    for entry in entries {
        let alleles = alleles_per_id.entry(entry.id).or_default();
        let index = match alleles.iter().position(|a| *a == entry.effect_allele) {
            Some(i) => i,
            None => {
                alleles.push(entry.effect_allele);
                alleles.len() - 1
            }
        };
        if split.len() <= index {
            split.resize_with(index + 1, Vec::new);
        }
        split[index].push(entry);
    }

    if split.len() > 1 {
        debug!("Split variants with several effect alleles over {} tables", split.len());
    }
    split
}

fn pivot(
    chrom: Option<&str>,
    effect_type: EffectType,
    index: usize,
    entries: Vec<Entry<'_>>,
) -> Result<ScoreTable, MatchError> {
    let accessions: Vec<String> = entries
        .iter()
        .map(|e| e.accession)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .map(str::to_string)
        .collect();

    let mut filled: Vec<(String, String, Vec<Option<f64>>)> = Vec::new();
    let mut row_of: BTreeMap<(&str, &str), usize> = BTreeMap::new();

    for entry in entries {
        let column = accessions
            .iter()
            .position(|a| a == entry.accession)
            .unwrap_or_default();
        let row = *row_of.entry((entry.id, entry.effect_allele)).or_insert_with(|| {
            filled.push((
                entry.id.to_string(),
                entry.effect_allele.to_string(),
                vec![None; accessions.len()],
            ));
            filled.len() - 1
        });

        let weight = &mut filled[row].2[column];
        if weight.is_some() {
            return Err(MatchError::DuplicateMatch(format!(
                "{} has more than one weight for {} effect allele {}",
                entry.accession, entry.id, entry.effect_allele
            )));
        }
        *weight = Some(entry.weight);
    }

    let n_filled = filled
        .iter()
        .map(|(_, _, weights)| weights.iter().filter(|w| w.is_some()).count())
        .sum();
    let rows = filled
        .into_iter()
        .map(|(id, effect_allele, weights)| ScoreTableRow {
            id,
            effect_allele,
            weights: weights.into_iter().map(|w| w.unwrap_or(0.0)).collect(),
        })
        .collect();

    Ok(ScoreTable {
        chrom: chrom.map(str::to_string),
        effect_type,
        index,
        accessions,
        rows,
        n_filled,
    })
}

/// Writes pivoted tables as gzipped tab-separated files
pub struct ScorefileWriter {
    outdir: PathBuf,
    dataset: String,
    split_chromosomes: bool,
}

impl ScorefileWriter {
    #[must_use]
    pub fn new(outdir: &Path, dataset: &str, split_chromosomes: bool) -> Self {
        Self {
            outdir: outdir.to_path_buf(),
            dataset: dataset.to_string(),
            split_chromosomes,
        }
    }

    /// Pivot and write accepted matches, returning the written paths
    ///
    /// # Errors
    ///
    /// Returns `MatchError::DuplicateMatch` from [`pivot_tables`] or an I/O error.
    pub fn write(&self, accepted: &[LabeledMatch]) -> Result<Vec<PathBuf>, MatchError> {
        let tables = pivot_tables(accepted, self.split_chromosomes)?;

        let mut paths = Vec::with_capacity(tables.len());
        for table in &tables {
            let path = self.outdir.join(table.file_name(&self.dataset));
            write_table(&path, table)?;
            debug!(
                "Wrote {} variants x {} scores to {}",
                table.rows.len(),
                table.accessions.len(),
                path.display()
            );
            paths.push(path);
        }

        info!("Wrote {} scoring files to {}", paths.len(), self.outdir.display());
        Ok(paths)
    }
}

fn write_table(path: &Path, table: &ScoreTable) -> Result<(), MatchError> {
    let mut writer = WriterBuilder::new()
        .delimiter(b'\t')
        .from_writer(create_text(path)?);

    let mut header = vec!["ID".to_string(), "effect_allele".to_string()];
    header.extend(table.accessions.iter().cloned());
    writer.write_record(&header)?;

    for row in &table.rows {
        let mut record = vec![row.id.clone(), row.effect_allele.clone()];
        record.extend(row.weights.iter().map(f64::to_string));
        writer.write_record(&record)?;
    }
    writer.flush()?;
    Ok(())
}
