use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;
use std::sync::Arc;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::core::types::MatchType;
use crate::core::variant::{ScoreFile, ScoreVariant, TargetVariant};
use crate::matching::candidate::MatchCandidate;
use crate::matching::MatchError;
use crate::parsing::target::{read_target, read_targets};

/// How target files are split into independently matched partitions.
///
/// Every mode yields the same candidates. Modes only trade memory for speed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum MatchMode {
    /// Read targets one chromosome at a time.
    ///
    /// Memory is bounded by the largest chromosome, but every target file is
    /// decompressed and scanned once per scoring file chromosome. Use `multi`
    /// with per-chromosome target files, or `fast`, when a single large target
    /// fits in memory.
    #[default]
    Single,
    /// Read and match each target file on its own
    Multi,
    /// Read every target at once
    Fast,
}

/// A unit of independent matching work
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Partition {
    Chromosome(String),
    TargetFile(u32),
    All,
}

impl std::fmt::Display for Partition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Chromosome(chrom) => write!(f, "{chrom}"),
            Self::TargetFile(i) => write!(f, "file{i}"),
            Self::All => write!(f, "ALL"),
        }
    }
}

/// Candidate generator over a set of target files
pub struct MatchEngine {
    targets: Vec<PathBuf>,
    mode: MatchMode,
    threads: usize,
}

impl MatchEngine {
    #[must_use]
    pub fn new(targets: Vec<PathBuf>, mode: MatchMode) -> Self {
        Self {
            targets,
            mode,
            threads: 1,
        }
    }

    /// Number of partitions matched concurrently
    #[must_use]
    pub fn with_threads(mut self, threads: usize) -> Self {
        self.threads = threads.max(1);
        self
    }

    /// Plan the partitions for a scoring file
    #[must_use]
    pub fn partitions(&self, scorefile: &ScoreFile) -> Vec<Partition> {
        match self.mode {
            MatchMode::Single => scorefile
                .chromosomes()
                .into_iter()
                .map(|c| Partition::Chromosome(c.to_string()))
                .collect(),
            MatchMode::Multi => (0..self.targets.len())
                .filter_map(|i| u32::try_from(i).ok())
                .map(Partition::TargetFile)
                .collect(),
            MatchMode::Fast => vec![Partition::All],
        }
    }

    /// Generate candidates for every partition, concatenated in partition order
    ///
    /// # Errors
    ///
    /// Returns `MatchError::Parse` if a target file cannot be read, or
    /// `MatchError::ChromosomeMismatch` if a chromosome partition is inconsistent.
    pub fn find_candidates(&self, scorefile: &ScoreFile) -> Result<Vec<MatchCandidate>, MatchError> {
        Ok(self
            .find_candidates_by_partition(scorefile)?
            .into_iter()
            .flat_map(|(_, candidates)| candidates)
            .collect())
    }

    /// Generate candidates, keeping each partition's candidates apart
    ///
    /// # Errors
    ///
    /// See [`MatchEngine::find_candidates`].
    pub fn find_candidates_by_partition(
        &self,
        scorefile: &ScoreFile,
    ) -> Result<Vec<(Partition, Vec<MatchCandidate>)>, MatchError> {
        let partitions = self.partitions(scorefile);
        info!(
            "Matching {} scoring file rows against {} target file(s) in {:?} mode ({} partitions, {} threads)",
            scorefile.len(),
            self.targets.len(),
            self.mode,
            partitions.len(),
            self.threads
        );

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.threads)
            .build()?;

        let results = pool.install(|| {
            partitions
                .par_iter()
                .map(|p| {
                    self.match_partition(scorefile, p)
                        .map(|candidates| (p.clone(), candidates))
                })
                .collect::<Result<Vec<_>, MatchError>>()
        })?;

        let total: usize = results.iter().map(|(_, c)| c.len()).sum();
        info!("Found {total} match candidates");
        Ok(results)
    }

    fn match_partition(
        &self,
        scorefile: &ScoreFile,
        partition: &Partition,
    ) -> Result<Vec<MatchCandidate>, MatchError> {
        let (scores, targets) = match partition {
            Partition::Chromosome(chrom) => {
                let scores = scorefile.on_chromosome(chrom);
                // one scan of every target file per scoring file chromosome
                let targets = read_targets(&self.targets, false, Some(chrom))?;
                check_single_chromosome(chrom, &scores, &targets)?;
                (scores, targets)
            }
            Partition::TargetFile(i) => {
                let path = &self.targets[*i as usize];
                (scorefile.variants.clone(), read_target(path, *i, false, None)?)
            }
            Partition::All => (
                scorefile.variants.clone(),
                read_targets(&self.targets, false, None)?,
            ),
        };

        debug!(
            "Partition {partition}: {} scoring file rows, {} target variants",
            scores.len(),
            targets.len()
        );
        Ok(match_variants(&scores, targets))
    }
}

/// Verify a chromosome partition only holds variants from that chromosome
///
/// # Errors
///
/// Returns `MatchError::ChromosomeMismatch` naming the first foreign chromosome.
pub fn check_single_chromosome(
    expected: &str,
    scores: &[Arc<ScoreVariant>],
    targets: &[TargetVariant],
) -> Result<(), MatchError> {
    let foreign = scores
        .iter()
        .map(|s| s.chr_name.as_deref().unwrap_or("NA"))
        .chain(targets.iter().map(|t| t.chrom.as_str()))
        .find(|chrom| *chrom != expected);

    match foreign {
        Some(found) => Err(MatchError::ChromosomeMismatch {
            expected: expected.to_string(),
            found: found.to_string(),
        }),
        None => Ok(()),
    }
}

/// Join scoring file rows to target rows under all eight strategies.
///
/// Candidates come out grouped by strategy priority, then scoring file row
/// order, then target order. Rows without coordinates never match.
#[must_use]
pub fn match_variants(
    scores: &[Arc<ScoreVariant>],
    targets: Vec<TargetVariant>,
) -> Vec<MatchCandidate> {
    let mut targets: Vec<Arc<TargetVariant>> = targets.into_iter().map(Arc::new).collect();
    targets.sort_by_key(|t| t.order);

    let mut index: HashMap<(&str, u64), Vec<&Arc<TargetVariant>>> = HashMap::new();
    for target in &targets {
        index
            .entry((target.chrom.as_str(), target.pos))
            .or_default()
            .push(target);
    }

    let (with_oa, no_oa): (Vec<&Arc<ScoreVariant>>, Vec<&Arc<ScoreVariant>>) = scores
        .iter()
        .filter(|s| s.has_coordinates())
        .partition(|s| s.other_allele.is_some());

    let mut candidates = Vec::new();
    let mut per_type: BTreeMap<MatchType, usize> = BTreeMap::new();
    for match_type in MatchType::ALL {
        let rows = if match_type.requires_other_allele() {
            &with_oa
        } else {
            &no_oa
        };

        let before = candidates.len();
        for score in rows {
            let (Some(chrom), Some(pos)) = (score.chr_name.as_deref(), score.chr_position) else {
                continue;
            };
            let Some(bucket) = index.get(&(chrom, pos)) else {
                continue;
            };
            for target in bucket {
                if joins(score, target, match_type) {
                    candidates.push(MatchCandidate::new(
                        Arc::clone(score),
                        Arc::clone(target),
                        match_type,
                    ));
                }
            }
        }
        per_type.insert(match_type, candidates.len() - before);
    }

    for (match_type, n) in per_type.iter().filter(|(_, n)| **n > 0) {
        debug!("{n} {match_type} candidates");
    }
    candidates
}

/// Allele equality for one strategy, positions already agree
fn joins(score: &ScoreVariant, target: &TargetVariant, match_type: MatchType) -> bool {
    let (effect, other) = match match_type {
        MatchType::Refalt | MatchType::NoOaRef => (&target.ref_allele, &target.alt),
        MatchType::Altref | MatchType::NoOaAlt => (&target.alt, &target.ref_allele),
        MatchType::RefaltFlip | MatchType::NoOaRefFlip => (&target.ref_flip, &target.alt_flip),
        MatchType::AltrefFlip | MatchType::NoOaAltFlip => (&target.alt_flip, &target.ref_flip),
    };

    if score.effect_allele != *effect {
        return false;
    }
    match (&score.other_allele, match_type.requires_other_allele()) {
        (Some(oa), true) => oa == other,
        (None, false) => true,
        _ => false,
    }
}
