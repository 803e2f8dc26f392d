//! Readers for the inputs of a matching run.
//!
//! This module provides parsers for:
//!
//! - **Target variant tables**: plink1 `.bim` and plink2 `.pvar` files, optionally gzipped
//! - **Combined scoring files**: long-format TSV, one row per variant per accession
//! - **Match candidate files**: candidates staged by `match --only-match`
//!
//! ## Example
//!
//! ```rust,no_run
//! use pgs_match::parsing::{scorefile, target};
//! use std::path::Path;
//!
//! let scores = scorefile::read_scorefile(Path::new("combined.txt"), None).unwrap();
//! let header = target::detect_format(Path::new("genome.pvar")).unwrap();
//! let variants = target::read_target(Path::new("genome.pvar"), 0, false, Some("22")).unwrap();
//! ```
//!
//! ## Target formats
//!
//! | Format | Header | Columns used |
//! |--------|--------|--------------|
//! | bim    | none   | chrom, id, (cm), pos, allele1, allele2 |
//! | pvar   | `#CHROM` | CHROM, POS, ID, REF, ALT (comma-separated) |

use std::path::PathBuf;

use thiserror::Error;

pub mod candidates;
pub mod scorefile;
pub mod target;

#[derive(Error, Debug)]
pub enum ParseError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Invalid target format in {path}: {reason}")]
    InvalidTargetFormat { path: String, reason: String },

    #[error("Scoring file is missing mandatory column '{0}'")]
    MissingColumn(String),

    #[error("Invalid scoring file: {0}")]
    InvalidScorefile(String),

    #[error(
        "Duplicate effect weights for {accession} variant {variant} (row_nr {first_row} and {second_row})"
    )]
    DuplicateEffectWeight {
        accession: String,
        variant: String,
        first_row: u64,
        second_row: u64,
    },

    #[error("Invalid match candidate file {path}: {reason}")]
    InvalidCandidates { path: String, reason: String },

    #[error("No files match '{0}'")]
    NoMatchingFiles(String),

    #[error("Invalid file pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: String },
}

impl ParseError {
    /// Process exit code for orchestration tooling
    #[must_use]
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::MissingColumn(_) | Self::InvalidScorefile(_) => 9,
            Self::DuplicateEffectWeight { .. } => 13,
            Self::InvalidTargetFormat { .. } => 17,
            _ => 1,
        }
    }
}

/// Expand paths and glob patterns into files, each pattern's matches sorted
///
/// # Errors
///
/// Returns `ParseError::InvalidPattern` for malformed patterns and
/// `ParseError::NoMatchingFiles` if a pattern matches nothing.
pub fn expand_paths(patterns: &[String]) -> Result<Vec<PathBuf>, ParseError> {
    let mut paths = Vec::new();
    for pattern in patterns {
        let entries = glob::glob(pattern).map_err(|e| ParseError::InvalidPattern {
            pattern: pattern.clone(),
            reason: e.to_string(),
        })?;

        let mut matched: Vec<PathBuf> = entries
            .map(|entry| {
                entry.map_err(|e| ParseError::InvalidPattern {
                    pattern: pattern.clone(),
                    reason: e.to_string(),
                })
            })
            .collect::<Result<_, _>>()?;

        if matched.is_empty() {
            return Err(ParseError::NoMatchingFiles(pattern.clone()));
        }
        matched.sort();
        paths.extend(matched);
    }
    Ok(paths)
}
