//! End-to-end tests driving the `pgs-match` binary.

use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};

use assert_cmd::Command;
use flate2::read::MultiGzDecoder;
use predicates::prelude::*;
use tempfile::TempDir;

const SCOREFILE_HEADER: &str =
    "chr_name\tchr_position\teffect_allele\tother_allele\teffect_weight\teffect_type\taccession\trow_nr\n";

fn write_scorefile(dir: &Path, rows: &[&str]) -> PathBuf {
    let path = dir.join("combined.txt");
    let mut content = SCOREFILE_HEADER.to_string();
    for row in rows {
        content.push_str(row);
        content.push('\n');
    }
    fs::write(&path, content).unwrap();
    path
}

fn write_file(dir: &Path, name: &str, rows: &[&str]) -> PathBuf {
    let path = dir.join(name);
    let mut content = String::new();
    for row in rows {
        content.push_str(row);
        content.push('\n');
    }
    fs::write(&path, content).unwrap();
    path
}

fn read_gz(path: &Path) -> String {
    let mut text = String::new();
    MultiGzDecoder::new(fs::File::open(path).unwrap())
        .read_to_string(&mut text)
        .unwrap();
    text
}

/// (accession, match_status, count, match_rate, score_pass) per summary row
fn read_summary(path: &Path) -> Vec<(String, String, usize, f64, bool)> {
    let mut reader = csv::Reader::from_path(path).unwrap();
    let headers = reader.headers().unwrap().clone();
    let col = |name: &str| headers.iter().position(|h| h == name).unwrap();
    let (acc, status, count, rate, pass) = (
        col("accession"),
        col("match_status"),
        col("count"),
        col("match_rate"),
        col("score_pass"),
    );
    reader
        .records()
        .map(|r| {
            let r = r.unwrap();
            (
                r[acc].to_string(),
                r[status].to_string(),
                r[count].parse().unwrap(),
                r[rate].parse().unwrap(),
                r[pass].parse().unwrap(),
            )
        })
        .collect()
}

fn pgs_match() -> Command {
    Command::cargo_bin("pgs-match").unwrap()
}

fn three_variant_scorefile(dir: &Path) -> PathBuf {
    write_scorefile(
        dir,
        &[
            "1\t100\tA\tG\t0.1\tadditive\tPGS000001\t0",
            "1\t200\tC\tT\t0.2\tadditive\tPGS000001\t1",
            "2\t300\tG\tA\t0.3\tadditive\tPGS000001\t2",
        ],
    )
}

#[test]
fn test_all_variants_matched() {
    let dir = TempDir::new().unwrap();
    let scorefile = three_variant_scorefile(dir.path());
    let target = write_file(
        dir.path(),
        "target.bim",
        &[
            "1\t1:100:A:G\t0\t100\tA\tG",
            "1\t1:200:T:C\t0\t200\tT\tC",
            "2\t2:300:A:G\t0\t300\tA\tG",
        ],
    );
    let outdir = dir.path().join("out");

    pgs_match()
        .args(["match", "-s"])
        .arg(&scorefile)
        .arg("-t")
        .arg(&target)
        .args(["-d", "test_set", "--min-overlap", "0.9", "-o"])
        .arg(&outdir)
        .assert()
        .success()
        .stdout(predicate::str::contains("PGS000001 [PASS]"));

    let summary = read_summary(&outdir.join("test-set_summary.csv"));
    assert_eq!(summary.len(), 1);
    let (accession, status, count, rate, pass) = &summary[0];
    assert_eq!(accession, "PGS000001");
    assert_eq!(status, "matched");
    assert_eq!(*count, 3);
    assert!((rate - 1.0).abs() < 1e-9);
    assert!(*pass);

    let scores = read_gz(&outdir.join("test-set_ALL_additive_0.scorefile.gz"));
    let lines: Vec<&str> = scores.lines().collect();
    assert_eq!(lines[0], "ID\teffect_allele\tPGS000001");
    assert_eq!(lines.len(), 4);
    assert!(lines.contains(&"1:200:T:C\tC\t0.2"));
    assert!(lines.contains(&"2:300:A:G\tG\t0.3"));

    assert!(outdir.join("test-set_log.csv.gz").exists());
}

#[test]
fn test_failing_accession_dropped_run_continues() {
    let dir = TempDir::new().unwrap();
    let scorefile = write_scorefile(
        dir.path(),
        &[
            "1\t100\tA\tG\t0.1\tadditive\tPGS000001\t0",
            "1\t200\tC\tT\t0.2\tadditive\tPGS000001\t1",
            "2\t300\tG\tA\t0.3\tadditive\tPGS000001\t2",
            "1\t100\tG\tA\t0.5\tadditive\tPGS000002\t0",
        ],
    );
    let target = write_file(dir.path(), "target.bim", &["1\t1:100:A:G\t0\t100\tA\tG"]);
    let outdir = dir.path().join("out");

    pgs_match()
        .args(["match", "--mode", "fast", "-s"])
        .arg(&scorefile)
        .arg("-t")
        .arg(&target)
        .args(["-d", "cohort", "--min-overlap", "0.9", "-o"])
        .arg(&outdir)
        .assert()
        .success()
        .stderr(predicate::str::contains("PGS000001: match rate 0.333"));

    let summary = read_summary(&outdir.join("cohort_summary.csv"));
    let failed: Vec<_> = summary.iter().filter(|s| s.0 == "PGS000001").collect();
    assert!(failed.iter().all(|s| !s.4));
    assert!((failed[0].3 - 1.0 / 3.0).abs() < 1e-9);

    let scores = read_gz(&outdir.join("cohort_ALL_additive_0.scorefile.gz"));
    assert_eq!(scores, "ID\teffect_allele\tPGS000002\n1:100:A:G\tG\t0.5\n");
}

#[test]
fn test_zero_matches_exit_code() {
    let dir = TempDir::new().unwrap();
    let scorefile = three_variant_scorefile(dir.path());
    let target = write_file(dir.path(), "target.bim", &["5\t5:1:A:G\t0\t1\tA\tG"]);
    let outdir = dir.path().join("out");

    pgs_match()
        .args(["match", "-s"])
        .arg(&scorefile)
        .arg("-t")
        .arg(&target)
        .args(["-d", "cohort", "-o"])
        .arg(&outdir)
        .assert()
        .code(15)
        .stderr(predicate::str::contains("No scoring file passed"));

    // logs are still written for inspection
    assert!(outdir.join("cohort_log.csv.gz").exists());
    assert!(outdir.join("cohort_summary.csv").exists());
}

#[test]
fn test_missing_scorefile_column_exit_code() {
    let dir = TempDir::new().unwrap();
    let scorefile = write_file(
        dir.path(),
        "combined.txt",
        &["chr_name\tchr_position\teffect_allele\teffect_weight", "1\t100\tA\t0.1"],
    );
    let target = write_file(dir.path(), "target.bim", &["1\t1:100:A:G\t0\t100\tA\tG"]);

    pgs_match()
        .args(["match", "-s"])
        .arg(&scorefile)
        .arg("-t")
        .arg(&target)
        .args(["-d", "cohort", "-o"])
        .arg(dir.path())
        .assert()
        .code(9)
        .stderr(predicate::str::contains("other_allele"));
}

#[test]
fn test_duplicate_effect_weight_exit_code() {
    let dir = TempDir::new().unwrap();
    let scorefile = write_scorefile(
        dir.path(),
        &[
            "1\t100\tA\tG\t0.1\tadditive\tPGS000001\t0",
            "1\t100\tA\tG\t0.9\tadditive\tPGS000001\t1",
        ],
    );
    let target = write_file(dir.path(), "target.bim", &["1\t1:100:A:G\t0\t100\tA\tG"]);

    pgs_match()
        .args(["match", "-s"])
        .arg(&scorefile)
        .arg("-t")
        .arg(&target)
        .args(["-d", "cohort", "-o"])
        .arg(dir.path())
        .assert()
        .code(13);
}

#[test]
fn test_invalid_target_format_exit_code() {
    let dir = TempDir::new().unwrap();
    let scorefile = three_variant_scorefile(dir.path());
    let target = write_file(dir.path(), "target.pvar", &["#CHROM\tID\tREF", "1\trs1\tA"]);

    pgs_match()
        .args(["match", "-s"])
        .arg(&scorefile)
        .arg("-t")
        .arg(&target)
        .args(["-d", "cohort", "-o"])
        .arg(dir.path())
        .assert()
        .code(17);
}

#[test]
fn test_invalid_min_overlap() {
    let dir = TempDir::new().unwrap();
    let scorefile = three_variant_scorefile(dir.path());
    let target = write_file(dir.path(), "target.bim", &["1\t1:100:A:G\t0\t100\tA\tG"]);

    pgs_match()
        .args(["match", "-s"])
        .arg(&scorefile)
        .arg("-t")
        .arg(&target)
        .args(["-d", "cohort", "--min-overlap", "1.5"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Minimum overlap"));
}

#[test]
fn test_multi_mode_with_glob_and_pvar() {
    let dir = TempDir::new().unwrap();
    let scorefile = three_variant_scorefile(dir.path());
    write_file(
        dir.path(),
        "chr1.pvar",
        &[
            "##fileformat=VCFv4.2",
            "#CHROM\tPOS\tID\tREF\tALT",
            "1\t100\t1:100:A:G\tA\tG",
            "1\t200\t1:200:T:C,G\tT\tC,G",
        ],
    );
    write_file(
        dir.path(),
        "chr2.pvar",
        &["#CHROM\tPOS\tID\tREF\tALT", "2\t300\t2:300:A:G\tA\tG"],
    );
    let pattern = dir.path().join("chr*.pvar").display().to_string();
    let outdir = dir.path().join("out");

    pgs_match()
        .args(["--format", "json", "match", "--mode", "multi", "--threads", "2", "-s"])
        .arg(&scorefile)
        .args(["-t", &pattern])
        .args(["-d", "cohort", "--min-overlap", "0.5", "-o"])
        .arg(&outdir)
        .assert()
        .success();

    // the multiallelic row is excluded by default, 2 of 3 still pass 0.5
    let summary = read_summary(&outdir.join("cohort_summary.csv"));
    let excluded = summary.iter().find(|s| s.1 == "excluded").unwrap();
    assert_eq!(excluded.2, 1);
    assert!((excluded.3 - 2.0 / 3.0).abs() < 1e-9);

    let scores = read_gz(&outdir.join("cohort_ALL_additive_0.scorefile.gz"));
    assert_eq!(scores.lines().count(), 3);
    assert!(!scores.contains("1:200:T:C,G"));
}

#[test]
fn test_json_summary_output() {
    let dir = TempDir::new().unwrap();
    let scorefile = three_variant_scorefile(dir.path());
    let target = write_file(
        dir.path(),
        "target.bim",
        &[
            "1\t1:100:A:G\t0\t100\tA\tG",
            "1\t1:200:T:C\t0\t200\tT\tC",
            "2\t2:300:A:G\t0\t300\tA\tG",
        ],
    );

    let output = pgs_match()
        .args(["--format", "json", "match", "-s"])
        .arg(&scorefile)
        .arg("-t")
        .arg(&target)
        .args(["-d", "cohort", "-o"])
        .arg(dir.path())
        .output()
        .unwrap();
    assert!(output.status.success());

    let summary: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let rows = summary.as_array().unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["match_status"], "matched");
    assert_eq!(rows[0]["count"], 3);
    assert_eq!(rows[0]["score_pass"], true);
    assert_eq!(rows[0]["duplicate_ID"], false);
}

#[test]
fn test_only_match_then_combine() {
    let dir = TempDir::new().unwrap();
    let scorefile = three_variant_scorefile(dir.path());
    let target = write_file(
        dir.path(),
        "target.bim",
        &[
            "1\t1:100:A:G\t0\t100\tA\tG",
            "1\t1:200:T:C\t0\t200\tT\tC",
            "2\t2:300:A:G\t0\t300\tA\tG",
        ],
    );
    let staged = dir.path().join("staged");

    pgs_match()
        .args(["match", "--only-match", "-s"])
        .arg(&scorefile)
        .arg("-t")
        .arg(&target)
        .args(["-d", "cohort", "-o"])
        .arg(&staged)
        .assert()
        .success();

    // single mode stages one file per chromosome
    assert!(staged.join("matches/cohort_target_1_matches.tsv.gz").exists());
    assert!(staged.join("matches/cohort_target_2_matches.tsv.gz").exists());
    assert!(!staged.join("cohort_summary.csv").exists());

    let combined = dir.path().join("combined");
    let pattern = staged.join("matches/*.tsv.gz").display().to_string();
    pgs_match()
        .args(["combine", "-s"])
        .arg(&scorefile)
        .args(["-m", &pattern])
        .args(["-d", "cohort", "-o"])
        .arg(&combined)
        .assert()
        .success();

    let direct = dir.path().join("direct");
    pgs_match()
        .args(["match", "-s"])
        .arg(&scorefile)
        .arg("-t")
        .arg(&target)
        .args(["-d", "cohort", "-o"])
        .arg(&direct)
        .assert()
        .success();

    let name = "cohort_ALL_additive_0.scorefile.gz";
    assert_eq!(read_gz(&combined.join(name)), read_gz(&direct.join(name)));
}

#[test]
fn test_combine_rejects_repeated_candidate_files() {
    let dir = TempDir::new().unwrap();
    let scorefile = three_variant_scorefile(dir.path());
    let target = write_file(dir.path(), "target.bim", &["1\t1:100:A:G\t0\t100\tA\tG"]);
    let staged = dir.path().join("staged");

    pgs_match()
        .args(["match", "--only-match", "--mode", "fast", "-s"])
        .arg(&scorefile)
        .arg("-t")
        .arg(&target)
        .args(["-d", "cohort", "-o"])
        .arg(&staged)
        .assert()
        .success();

    let staged_file = staged.join("matches/cohort_target_ALL_matches.tsv.gz");
    let copy = staged.join("copy_matches.tsv.gz");
    fs::copy(&staged_file, &copy).unwrap();

    pgs_match()
        .args(["combine", "-s"])
        .arg(&scorefile)
        .arg("-m")
        .arg(&staged_file)
        .arg(&copy)
        .args(["-d", "cohort", "-o"])
        .arg(dir.path())
        .assert()
        .code(13);
}

#[test]
fn test_per_chromosome_staging_jobs_share_outdir() {
    let dir = TempDir::new().unwrap();
    let scorefile = three_variant_scorefile(dir.path());
    let chr1 = write_file(
        dir.path(),
        "chr1.bim",
        &["1\t1:100:A:G\t0\t100\tA\tG", "1\t1:200:T:C\t0\t200\tT\tC"],
    );
    let chr2 = write_file(dir.path(), "chr2.bim", &["2\t2:300:A:G\t0\t300\tA\tG"]);
    let staged = dir.path().join("staged");

    for target in [&chr1, &chr2] {
        pgs_match()
            .args(["match", "--only-match", "-s"])
            .arg(&scorefile)
            .arg("-t")
            .arg(target)
            .args(["-d", "cohort", "-o"])
            .arg(&staged)
            .assert()
            .success();
    }

    // chromosomes a job's target does not cover stage nothing
    assert!(staged.join("matches/cohort_chr1_1_matches.tsv.gz").exists());
    assert!(staged.join("matches/cohort_chr2_2_matches.tsv.gz").exists());
    assert!(!staged.join("matches/cohort_chr1_2_matches.tsv.gz").exists());
    assert!(!staged.join("matches/cohort_chr2_1_matches.tsv.gz").exists());

    let pattern = staged.join("matches/*.tsv.gz").display().to_string();
    let outdir = dir.path().join("out");
    pgs_match()
        .args(["combine", "-s"])
        .arg(&scorefile)
        .args(["-m", &pattern])
        .args(["-d", "cohort", "-o"])
        .arg(&outdir)
        .assert()
        .success();

    let summary = read_summary(&outdir.join("cohort_summary.csv"));
    assert_eq!(summary.len(), 1);
    assert_eq!(summary[0].1, "matched");
    assert_eq!(summary[0].2, 3);
    assert!((summary[0].3 - 1.0).abs() < 1e-9);
}

#[test]
fn test_repeated_staging_job_does_not_overwrite() {
    let dir = TempDir::new().unwrap();
    let scorefile = three_variant_scorefile(dir.path());
    let target = write_file(dir.path(), "chr1.bim", &["1\t1:100:A:G\t0\t100\tA\tG"]);
    let staged = dir.path().join("staged");
    let staged_file = staged.join("matches/cohort_chr1_1_matches.tsv.gz");

    let stage = || {
        pgs_match()
            .args(["match", "--only-match", "-s"])
            .arg(&scorefile)
            .arg("-t")
            .arg(&target)
            .args(["-d", "cohort", "-o"])
            .arg(&staged)
            .assert()
    };

    stage().success();
    let first = read_gz(&staged_file);

    stage()
        .code(1)
        .stderr(predicate::str::contains("Refusing to overwrite"));
    assert_eq!(read_gz(&staged_file), first);
}
