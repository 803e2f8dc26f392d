//! # pgs-match
//!
//! A library for matching polygenic score (PGS) variants against target genomes.
//!
//! Scoring files describe variants by position and alleles, while target genomes
//! (plink `.bim`/`.pvar` tables) may list the same variant with swapped alleles,
//! on the opposite strand, split over several ALT alleles, or not at all.
//!
//! `pgs-match` reconciles the two and writes scoring files that plink can use directly.
//!
//! ## Features
//!
//! - **Orientation-aware matching**: REF/ALT order, strand flips and missing other alleles
//! - **Priority-based selection**: one deterministic best match per scoring file row
//! - **Duplicate detection**: target variants claimed by several scoring file rows
//! - **Ambiguous and multiallelic handling**: labelled, excluded by default
//! - **Match-rate filtering**: scores with too little overlap are dropped
//! - **Partitioned matching**: by chromosome or target file, in parallel
//!
//! ## Example
//!
//! ```rust,no_run
//! use pgs_match::{label_matches, LabelParams, MatchEngine, MatchMode};
//! use pgs_match::parsing::scorefile::read_scorefile;
//! use std::path::{Path, PathBuf};
//!
//! let scorefile = read_scorefile(Path::new("combined.txt.gz"), None).unwrap();
//!
//! let engine = MatchEngine::new(vec![PathBuf::from("genome.pvar")], MatchMode::Single);
//! let candidates = engine.find_candidates(&scorefile).unwrap();
//! let labeled = label_matches(&scorefile, candidates, &LabelParams::default());
//!
//! for row in labeled.iter().filter(|r| r.is_best()) {
//!     println!("{} row {}: {}", row.score.accession, row.score.row_nr, row.status);
//! }
//! ```
//!
//! ## Modules
//!
//! - [`core`]: Variant types, match strategies and allele complements
//! - [`parsing`]: Readers for scoring files, target tables and staged candidates
//! - [`matching`]: Candidate generation, labelling and match-rate filtering
//! - [`output`]: Scoring file, log and summary writers
//! - [`cli`]: Command-line interface implementation

pub mod cli;
pub mod core;
pub mod matching;
pub mod output;
pub mod parsing;
pub mod utils;

// Re-export commonly used types for convenience
pub use crate::core::liftover::Liftover;
pub use crate::core::types::*;
pub use crate::core::variant::{ScoreFile, ScoreVariant, TargetOrder, TargetVariant};
pub use crate::matching::candidate::{LabeledMatch, MatchCandidate};
pub use crate::matching::engine::{MatchEngine, MatchMode};
pub use crate::matching::filter::{filter_matches, FilteredMatches};
pub use crate::matching::label::{label_matches, LabelParams};
