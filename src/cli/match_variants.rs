use std::path::PathBuf;

use clap::Args;
use tracing::{debug, info};

use crate::cli::report::finish_run;
use crate::cli::{OutputFormat, RunArgs};
use crate::matching::engine::{MatchEngine, MatchMode};
use crate::output::candidates::write_candidates;
use crate::output::{candidates_path, target_tag};
use crate::parsing::expand_paths;
use crate::parsing::scorefile::read_scorefile;
use crate::parsing::target::detect_format;
use crate::utils::validation::{validate_dataset, validate_min_overlap, validate_threads};

#[derive(Args)]
pub struct MatchArgs {
    /// Combined long-format scoring file (tab-separated, optionally gzipped)
    #[arg(short, long)]
    pub scorefile: PathBuf,

    /// Target .bim/.pvar files or glob patterns (optionally gzipped)
    #[arg(short, long, required = true, num_args = 1..)]
    pub target: Vec<String>,

    /// How target files are partitioned while matching
    #[arg(long, value_enum, default_value = "single")]
    pub mode: MatchMode,

    /// Number of partitions matched at the same time
    #[arg(long, default_value = "1")]
    pub threads: usize,

    /// Only write match candidates, to be labelled later with `combine`.
    /// Runs over different targets can share an output directory.
    #[arg(long)]
    pub only_match: bool,

    #[command(flatten)]
    pub run: RunArgs,
}

/// Execute match subcommand
///
/// # Errors
///
/// Returns an error if an input cannot be read, matching fails, or no
/// scoring file passes the minimum overlap.
#[allow(clippy::needless_pass_by_value)] // CLI entry point, values from clap
pub fn run(args: MatchArgs, format: OutputFormat, verbose: bool) -> anyhow::Result<()> {
    let dataset = validate_dataset(&args.run.dataset)?;
    let min_overlap = validate_min_overlap(args.run.min_overlap)?;
    let threads = validate_threads(args.threads)?;

    let targets = expand_paths(&args.target)?;
    for path in &targets {
        let header = detect_format(path)?;
        if verbose {
            eprintln!("{}: {} format", path.display(), header.format);
        }
    }

    let scorefile = read_scorefile(&args.scorefile, None)?;
    let tag = target_tag(&targets);
    let engine = MatchEngine::new(targets, args.mode).with_threads(threads);

    if args.only_match {
        let by_partition = engine.find_candidates_by_partition(&scorefile)?;
        let matches_dir = args.run.outdir.join("matches");
        std::fs::create_dir_all(&matches_dir)?;

        let mut n_written = 0;
        for (partition, candidates) in &by_partition {
            if candidates.is_empty() {
                debug!("No candidates for partition {partition}, nothing staged");
                continue;
            }
            let path = candidates_path(&args.run.outdir, &dataset, &tag, &partition.to_string());
            write_candidates(&path, candidates)?;
            n_written += 1;
        }
        info!(
            "Wrote candidates for {n_written} of {} partitions to {}",
            by_partition.len(),
            matches_dir.display()
        );
        return Ok(());
    }

    let candidates = engine.find_candidates(&scorefile)?;
    finish_run(&scorefile, candidates, &args.run, &dataset, min_overlap, format)
}
