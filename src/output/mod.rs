//! Writers for the files a matching run produces.
//!
//! | File | Writer |
//! |------|--------|
//! | `{dataset}_log.csv.gz` | [`log::write_match_log`] |
//! | `{dataset}_summary.csv` | [`log::write_summary`] |
//! | `{dataset}_{chrom}_{effect_type}_{i}.scorefile.gz` | [`scorefile::ScorefileWriter`] |
//! | `matches/{dataset}_{targets}_{partition}_matches.tsv.gz` | [`candidates::write_candidates`] |
//!
//! `{targets}` is [`target_tag`] of the run's target files, so staged runs over
//! different targets can share one output directory.

use std::path::{Path, PathBuf};

pub mod candidates;
pub mod log;
pub mod scorefile;

#[must_use]
pub fn log_path(outdir: &Path, dataset: &str) -> PathBuf {
    outdir.join(format!("{dataset}_log.csv.gz"))
}

#[must_use]
pub fn summary_path(outdir: &Path, dataset: &str) -> PathBuf {
    outdir.join(format!("{dataset}_summary.csv"))
}

#[must_use]
pub fn candidates_path(outdir: &Path, dataset: &str, targets: &str, partition: &str) -> PathBuf {
    outdir
        .join("matches")
        .join(format!("{dataset}_{targets}_{partition}_matches.tsv.gz"))
}

/// File name label for a set of target files: the first file's stem, plus the
/// number of further files.
///
/// Compression and `.bim`/`.pvar` extensions are dropped and `_` becomes `-`.
#[must_use]
pub fn target_tag(targets: &[PathBuf]) -> String {
    let stem = targets.first().map_or_else(
        || "targets".to_string(),
        |path| {
            let name = path
                .file_name()
                .map_or_else(String::new, |n| n.to_string_lossy().into_owned());
            let name = name.strip_suffix(".gz").unwrap_or(&name);
            let name = [".bim", ".pvar"]
                .iter()
                .find_map(|ext| name.strip_suffix(*ext))
                .unwrap_or(name);
            name.replace('_', "-")
        },
    );

    match targets.len() {
        0 | 1 => stem,
        n => format!("{stem}+{}", n - 1),
    }
}
