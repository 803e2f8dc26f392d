use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::core::allele::complement;
use crate::core::types::EffectType;

/// One row of the combined long-format scoring file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreVariant {
    /// Scoring file identifier
    pub accession: String,

    /// Line index assigned upstream. Never renumbered.
    pub row_nr: u64,

    /// Chromosome, `None` when the row has no usable coordinates
    pub chr_name: Option<String>,

    pub chr_position: Option<u64>,

    pub effect_allele: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub other_allele: Option<String>,

    pub effect_weight: f64,

    pub effect_type: EffectType,
}

impl ScoreVariant {
    /// Both coordinates are present, so the row can take part in matching
    #[must_use]
    pub fn has_coordinates(&self) -> bool {
        self.chr_name.is_some() && self.chr_position.is_some()
    }
}

/// Position of a target row in load order, used as a deterministic tie-break
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct TargetOrder {
    /// Index of the target file in load order
    pub file: u32,
    /// 0-based data line within the file
    pub line: u64,
    /// ALT index after multiallelic expansion
    pub allele: u32,
}

/// One (biallelic) row of a target variant table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetVariant {
    pub chrom: String,
    pub pos: u64,
    pub id: String,
    pub ref_allele: String,
    pub alt: String,
    pub ref_flip: String,
    pub alt_flip: String,
    /// Source row had comma-separated ALT alleles
    pub is_multiallelic: bool,
    pub order: TargetOrder,
}

impl TargetVariant {
    /// Build a target row, computing complement alleles
    pub fn new(
        chrom: impl Into<String>,
        pos: u64,
        id: impl Into<String>,
        ref_allele: impl Into<String>,
        alt: impl Into<String>,
    ) -> Self {
        let ref_allele = ref_allele.into();
        let alt = alt.into();
        Self {
            chrom: chrom.into(),
            pos,
            id: id.into(),
            ref_flip: complement(&ref_allele),
            alt_flip: complement(&alt),
            ref_allele,
            alt,
            is_multiallelic: false,
            order: TargetOrder::default(),
        }
    }

    #[must_use]
    pub fn with_multiallelic(mut self, is_multiallelic: bool) -> Self {
        self.is_multiallelic = is_multiallelic;
        self
    }

    #[must_use]
    pub fn with_order(mut self, order: TargetOrder) -> Self {
        self.order = order;
        self
    }
}

/// All scoring file rows loaded for one run
#[derive(Debug, Clone, Default)]
pub struct ScoreFile {
    pub variants: Vec<Arc<ScoreVariant>>,
}

impl ScoreFile {
    #[must_use]
    pub fn new(variants: Vec<ScoreVariant>) -> Self {
        Self {
            variants: variants.into_iter().map(Arc::new).collect(),
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.variants.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.variants.is_empty()
    }

    /// Distinct accessions in sorted order
    #[must_use]
    pub fn accessions(&self) -> BTreeSet<&str> {
        self.variants.iter().map(|v| v.accession.as_str()).collect()
    }

    /// Number of scoring file rows per accession
    #[must_use]
    pub fn rows_per_accession(&self) -> BTreeMap<&str, usize> {
        let mut counts = BTreeMap::new();
        for v in &self.variants {
            *counts.entry(v.accession.as_str()).or_insert(0) += 1;
        }
        counts
    }

    /// Distinct chromosomes with coordinates, in sorted order
    #[must_use]
    pub fn chromosomes(&self) -> BTreeSet<&str> {
        self.variants
            .iter()
            .filter_map(|v| v.chr_name.as_deref())
            .collect()
    }

    /// Rows on one chromosome (rows without coordinates never match and are skipped)
    #[must_use]
    pub fn on_chromosome(&self, chrom: &str) -> Vec<Arc<ScoreVariant>> {
        self.variants
            .iter()
            .filter(|v| v.chr_name.as_deref() == Some(chrom))
            .cloned()
            .collect()
    }
}
