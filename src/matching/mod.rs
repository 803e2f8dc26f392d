//! Variant matching, labelling and match-rate filtering.
//!
//! This module provides the core matching pipeline:
//!
//! - [`MatchEngine`](engine::MatchEngine): Generates candidates across the eight orientation strategies
//! - [`label_matches`](label::label_matches): Resolves candidates into one decision per scoring file row
//! - [`filter_matches`](filter::filter_matches): Applies the minimum overlap per accession
//!
//! ## Matching Algorithm
//!
//! 1. **Candidate generation**: every strategy is tried for every scoring file row,
//!    results are unioned (see [`MatchType`](crate::core::types::MatchType))
//! 2. **Best match**: lowest strategy priority wins, ties go to the earliest target row
//! 3. **Duplicate IDs**: two scoring file rows picking the same target ID are excluded
//! 4. **Ambiguous / multiallelic / strand flip**: labelled and optionally excluded
//! 5. **Match rate**: accessions below the minimum overlap are dropped
//!
//! ## Example
//!
//! ```rust,no_run
//! use pgs_match::matching::engine::{MatchEngine, MatchMode};
//! use pgs_match::matching::label::{label_matches, LabelParams};
//! use pgs_match::matching::filter::filter_matches;
//! use pgs_match::parsing::scorefile::read_scorefile;
//! use std::path::{Path, PathBuf};
//!
//! let scorefile = read_scorefile(Path::new("combined.txt"), None).unwrap();
//! let engine = MatchEngine::new(vec![PathBuf::from("genome.pvar")], MatchMode::Fast);
//! let candidates = engine.find_candidates(&scorefile).unwrap();
//!
//! let labeled = label_matches(&scorefile, candidates, &LabelParams::default());
//! let filtered = filter_matches(&labeled, &scorefile, "cohort", 0.75);
//! filtered.check_any_pass().unwrap();
//!
//! for row in &filtered.summary {
//!     println!("{} {} {}", row.accession, row.match_status, row.count);
//! }
//! ```

use thiserror::Error;

use crate::parsing::ParseError;

pub mod candidate;
pub mod engine;
pub mod filter;
pub mod label;

pub use candidate::{LabeledMatch, MatchCandidate};

/// Default minimum fraction of scoring file rows that must match
pub const DEFAULT_MIN_OVERLAP: f64 = 0.75;

#[derive(Error, Debug)]
pub enum MatchError {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("No scoring file passed the minimum overlap of {min_overlap}. Check the target genome build and sample set")]
    ZeroMatches { min_overlap: f64 },

    #[error("Partition for chromosome {expected} contains variants on chromosome {found}")]
    ChromosomeMismatch { expected: String, found: String },

    #[error("Duplicate match: {0}")]
    DuplicateMatch(String),

    #[error("Refusing to overwrite existing file {0}")]
    OutputExists(String),

    #[error("Too many target files across candidate files to keep a global target order")]
    TargetOrderOverflow,

    #[error("Failed to build thread pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

impl MatchError {
    /// Process exit code for orchestration tooling
    #[must_use]
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::Parse(e) => e.exit_code(),
            Self::DuplicateMatch(_) => 13,
            Self::ZeroMatches { .. } => 15,
            Self::ChromosomeMismatch { .. } => 16,
            _ => 1,
        }
    }
}
