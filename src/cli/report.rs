use std::path::Path;

use crate::cli::{OutputFormat, RunArgs};
use crate::core::variant::ScoreFile;
use crate::matching::candidate::MatchCandidate;
use crate::matching::filter::{check_unique_matches, filter_matches, SummaryRow};
use crate::matching::label::label_matches;
use crate::output::log::{write_match_log, write_summary};
use crate::output::scorefile::ScorefileWriter;
use crate::output::{log_path, summary_path};

/// Label, filter and write the outputs of one run.
///
/// Logs and the summary are written before the zero-match check so a failed
/// run can still be inspected.
///
/// # Errors
///
/// Returns an error if an output cannot be written, if a target variant is
/// matched twice, or if no scoring file passed the minimum overlap.
pub fn finish_run(
    scorefile: &ScoreFile,
    candidates: Vec<MatchCandidate>,
    run: &RunArgs,
    dataset: &str,
    min_overlap: f64,
    format: OutputFormat,
) -> anyhow::Result<()> {
    let labeled = label_matches(scorefile, candidates, &run.label_params());

    std::fs::create_dir_all(&run.outdir)?;
    write_match_log(&log_path(&run.outdir, dataset), dataset, &labeled)?;

    let filtered = filter_matches(&labeled, scorefile, dataset, min_overlap);
    write_summary(&summary_path(&run.outdir, dataset), &filtered.summary)?;
    print_summary(&filtered.summary, format)?;

    filtered.check_any_pass()?;
    check_unique_matches(&filtered.accepted)?;

    let paths = ScorefileWriter::new(&run.outdir, dataset, run.split).write(&filtered.accepted)?;
    print_written(&paths, format);
    Ok(())
}

fn print_summary(summary: &[SummaryRow], format: OutputFormat) -> anyhow::Result<()> {
    match format {
        OutputFormat::Text => print_text_summary(summary),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(summary)?),
        OutputFormat::Tsv => print_tsv_summary(summary),
    }
    Ok(())
}

fn print_text_summary(summary: &[SummaryRow]) {
    let mut current: Option<&str> = None;
    for row in summary {
        if current != Some(row.accession.as_str()) {
            current = Some(row.accession.as_str());
            let verdict = if row.score_pass { "PASS" } else { "FAIL" };
            println!();
            println!(
                "{} [{verdict}] match rate {:.1}%",
                row.accession,
                row.match_rate * 100.0
            );
        }

        let mut flags = Vec::new();
        if row.ambiguous {
            flags.push("ambiguous");
        }
        if row.is_multiallelic {
            flags.push("multiallelic");
        }
        if row.duplicate_best_match {
            flags.push("duplicate best match");
        }
        if row.duplicate_id {
            flags.push("duplicate ID");
        }
        let flags = if flags.is_empty() {
            String::new()
        } else {
            format!(" ({})", flags.join(", "))
        };

        println!(
            "  {:<10} {:>8} {:>6.1}%{flags}",
            row.match_status.as_str(),
            row.count,
            row.percent
        );
    }
}

fn print_tsv_summary(summary: &[SummaryRow]) {
    println!(
        "dataset\taccession\tscore_pass\tmatch_rate\tmatch_status\tambiguous\tis_multiallelic\tduplicate_best_match\tduplicate_ID\tcount\tpercent"
    );
    for row in summary {
        println!(
            "{}\t{}\t{}\t{:.4}\t{}\t{}\t{}\t{}\t{}\t{}\t{:.2}",
            row.dataset,
            row.accession,
            row.score_pass,
            row.match_rate,
            row.match_status,
            row.ambiguous,
            row.is_multiallelic,
            row.duplicate_best_match,
            row.duplicate_id,
            row.count,
            row.percent,
        );
    }
}

fn print_written(paths: &[std::path::PathBuf], format: OutputFormat) {
    if matches!(format, OutputFormat::Text) {
        println!();
        for path in paths {
            println!("Wrote {}", display_name(path));
        }
    }
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map_or_else(|| path.display().to_string(), |n| n.to_string_lossy().into_owned())
}
