//! Command-line interface for pgs-match.
//!
//! This module implements the CLI using clap. Available commands:
//!
//! - **match**: Match a combined scoring file against target variant tables
//! - **combine**: Label, filter and write candidates staged by `match --only-match`
//!
//! ## Usage
//!
//! ```text
//! # Match against a single pvar, reading one chromosome at a time
//! pgs-match match -s combined.txt.gz -t genome.pvar -d cohort -o out/
//!
//! # One target file per chromosome, matched two at a time
//! pgs-match match -s combined.txt.gz -t 'chr*.bim' --mode multi --threads 2 -d cohort
//!
//! # Split matching across jobs, then combine
//! pgs-match match -s combined.txt.gz -t chr1.pvar -d cohort -o out/ --only-match
//! pgs-match match -s combined.txt.gz -t chr2.pvar -d cohort -o out/ --only-match
//! pgs-match combine -s combined.txt.gz -m 'out/matches/*.tsv.gz' -d cohort -o out/
//!
//! # JSON summary for scripting
//! pgs-match --format json match -s combined.txt -t genome.bim -d cohort
//! ```

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::matching::label::LabelParams;
use crate::matching::DEFAULT_MIN_OVERLAP;

pub mod combine;
pub mod match_variants;
pub mod report;

#[derive(Parser)]
#[command(name = "pgs-match")]
#[command(version)]
#[command(about = "Match polygenic score variants against target genomes")]
#[command(
    long_about = "pgs-match finds the variants of combined polygenic scoring files in plink .bim/.pvar target genomes.\n\nIt tries every allele orientation and strand, picks the best match per variant, labels ambiguous, multiallelic and duplicated matches, and writes plink-compatible scoring files for every score with enough overlap."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output format for the match summary
    #[arg(short, long, global = true, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Match scoring file variants against target variant tables
    Match(match_variants::MatchArgs),

    /// Combine candidates from `match --only-match` runs
    Combine(combine::CombineArgs),
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
    Tsv,
}

/// Options shared by every command that labels and writes matches
#[derive(Args, Debug, Clone)]
pub struct RunArgs {
    /// Label for the target genomes, used in output file names
    #[arg(short, long)]
    pub dataset: String,

    /// Output directory
    #[arg(short, long, default_value = ".")]
    pub outdir: PathBuf,

    /// Minimum fraction of a scoring file's variants that must match
    #[arg(long, default_value_t = DEFAULT_MIN_OVERLAP)]
    pub min_overlap: f64,

    /// Keep ambiguous (A/T, C/G) matches
    #[arg(long)]
    pub keep_ambiguous: bool,

    /// Keep matches to multiallelic target variants
    #[arg(long)]
    pub keep_multiallelic: bool,

    /// Exclude strand flipped matches
    #[arg(long)]
    pub ignore_strand_flips: bool,

    /// Keep the first scoring file row when several match the same target variant
    #[arg(long)]
    pub keep_first_match: bool,

    /// Write one scoring file per chromosome
    #[arg(long)]
    pub split: bool,
}

impl RunArgs {
    #[must_use]
    pub fn label_params(&self) -> LabelParams {
        LabelParams {
            remove_ambiguous: !self.keep_ambiguous,
            remove_multiallelic: !self.keep_multiallelic,
            skip_flip: self.ignore_strand_flips,
            keep_first_match: self.keep_first_match,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_label_params() {
        let cli = Cli::try_parse_from([
            "pgs-match", "match", "-s", "scores.txt", "-t", "target.bim", "-d", "cohort",
        ])
        .unwrap();
        let Commands::Match(args) = cli.command else {
            panic!("expected match command");
        };
        assert_eq!(args.run.label_params(), LabelParams::default());
        assert!((args.run.min_overlap - DEFAULT_MIN_OVERLAP).abs() < f64::EPSILON);
    }

    #[test]
    fn test_policy_flags() {
        let cli = Cli::try_parse_from([
            "pgs-match",
            "--verbose",
            "combine",
            "-s",
            "scores.txt",
            "-m",
            "matches.tsv.gz",
            "-d",
            "cohort",
            "--keep-ambiguous",
            "--keep-multiallelic",
            "--ignore-strand-flips",
            "--keep-first-match",
        ])
        .unwrap();
        assert!(cli.verbose);
        let Commands::Combine(args) = cli.command else {
            panic!("expected combine command");
        };
        let params = args.run.label_params();
        assert!(!params.remove_ambiguous);
        assert!(!params.remove_multiallelic);
        assert!(params.skip_flip);
        assert!(params.keep_first_match);
    }
}
