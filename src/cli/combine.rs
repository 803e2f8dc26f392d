use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use std::sync::Arc;

use clap::Args;
use tracing::{info, warn};

use crate::cli::report::finish_run;
use crate::cli::{OutputFormat, RunArgs};
use crate::core::types::MatchType;
use crate::core::variant::ScoreFile;
use crate::matching::candidate::MatchCandidate;
use crate::matching::MatchError;
use crate::parsing::candidates::read_candidates;
use crate::parsing::expand_paths;
use crate::parsing::scorefile::read_scorefile;
use crate::utils::validation::{validate_dataset, validate_min_overlap};

#[derive(Args)]
pub struct CombineArgs {
    /// The combined scoring file used for matching
    #[arg(short, long)]
    pub scorefile: PathBuf,

    /// Candidate files written by `match --only-match`, or glob patterns
    #[arg(short, long, required = true, num_args = 1..)]
    pub matches: Vec<String>,

    #[command(flatten)]
    pub run: RunArgs,
}

/// Execute combine subcommand
///
/// # Errors
///
/// Returns an error if an input cannot be read, a candidate appears in more
/// than one file, or no scoring file passes the minimum overlap.
#[allow(clippy::needless_pass_by_value)] // CLI entry point, values from clap
pub fn run(args: CombineArgs, format: OutputFormat, verbose: bool) -> anyhow::Result<()> {
    let dataset = validate_dataset(&args.run.dataset)?;
    let min_overlap = validate_min_overlap(args.run.min_overlap)?;

    let scorefile = read_scorefile(&args.scorefile, None)?;
    let paths = expand_paths(&args.matches)?;

    let mut per_file = Vec::with_capacity(paths.len());
    for path in &paths {
        let candidates = read_candidates(path)?;
        if verbose {
            eprintln!("{}: {} candidates", path.display(), candidates.len());
        }
        per_file.push(candidates);
    }

    let candidates = merge_candidates(&scorefile, per_file)?;
    info!("Combined {} candidates from {} files", candidates.len(), paths.len());

    finish_run(&scorefile, candidates, &args.run, &dataset, min_overlap, format)
}

/// Concatenate candidate files, re-attaching each candidate to its scoring file row.
///
/// Every staged run numbers its own target files from 0, so target file indices
/// are rebased to `position of candidate file * stride + index`. Ties between
/// runs then go to the earlier candidate file. Candidates for rows missing from
/// the scoring file are dropped with a warning.
///
/// # Errors
///
/// Returns `MatchError::DuplicateMatch` if the same candidate appears in two files,
/// or `MatchError::TargetOrderOverflow` if rebased indices do not fit.
pub fn merge_candidates(
    scorefile: &ScoreFile,
    per_file: Vec<Vec<MatchCandidate>>,
) -> Result<Vec<MatchCandidate>, MatchError> {
    let rows: HashMap<(&str, u64), &Arc<_>> = scorefile
        .variants
        .iter()
        .map(|v| ((v.accession.as_str(), v.row_nr), v))
        .collect();

    let stride = per_file
        .iter()
        .flatten()
        .map(|c| u64::from(c.target.order.file))
        .max()
        .map_or(1, |max| max + 1);

    let mut seen: HashMap<(String, u64, String, MatchType), usize> = HashMap::new();
    let mut unknown: HashSet<(String, u64)> = HashSet::new();
    let mut merged = Vec::new();

    for (file, candidates) in per_file.into_iter().enumerate() {
        let offset = u64::try_from(file)
            .ok()
            .and_then(|f| f.checked_mul(stride))
            .ok_or(MatchError::TargetOrderOverflow)?;

        for mut candidate in candidates {
            let key = (candidate.score.accession.as_str(), candidate.score.row_nr);
            let Some(row) = rows.get(&key) else {
                unknown.insert((key.0.to_string(), key.1));
                continue;
            };

            let id = (
                candidate.score.accession.clone(),
                candidate.score.row_nr,
                candidate.target.id.clone(),
                candidate.match_type,
            );
            if let Some(&first) = seen.get(&id) {
                if first != file {
                    return Err(MatchError::DuplicateMatch(format!(
                        "{} row {} matched {} ({}) in more than one candidate file",
                        id.0, id.1, id.2, id.3
                    )));
                }
            } else {
                seen.insert(id, file);
            }

            if offset > 0 {
                let rebased = u32::try_from(offset + u64::from(candidate.target.order.file))
                    .map_err(|_| MatchError::TargetOrderOverflow)?;
                Arc::make_mut(&mut candidate.target).order.file = rebased;
            }
            candidate.score = Arc::clone(row);
            merged.push(candidate);
        }
    }

    if !unknown.is_empty() {
        warn!(
            "Dropped candidates for {} rows that are not in the scoring file",
            unknown.len()
        );
    }
    Ok(merged)
}
