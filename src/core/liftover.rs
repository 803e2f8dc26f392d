//! Coordinate remapping between genome builds.
//!
//! Chain-file handling lives outside this crate. A [`Liftover`] implementation
//! only has to replace `chr_name`/`chr_position` on each row, setting both to
//! `None` when a row cannot be lifted.

use std::sync::Arc;

use tracing::{info, warn};

use crate::core::types::GenomeBuild;
use crate::core::variant::{ScoreFile, ScoreVariant};
use crate::parsing::scorefile::validate_effect_weights;
use crate::parsing::ParseError;

pub trait Liftover {
    fn lift(
        &self,
        variants: Vec<ScoreVariant>,
        source: GenomeBuild,
        target: GenomeBuild,
    ) -> Vec<ScoreVariant>;
}

impl ScoreFile {
    /// Remap coordinates with `liftover`.
    ///
    /// Rows keep their `row_nr`. Lifting can collapse two source positions onto
    /// one, so effect weights are validated again afterwards.
    ///
    /// # Errors
    ///
    /// Returns `ParseError::DuplicateEffectWeight` if lifted rows now share a
    /// variant key with conflicting weights.
    pub fn lift(
        self,
        liftover: &impl Liftover,
        source: GenomeBuild,
        target: GenomeBuild,
    ) -> Result<ScoreFile, ParseError> {
        if source == target {
            info!("Scoring file already in {target}, skipping liftover");
            return Ok(self);
        }

        let variants: Vec<ScoreVariant> = self
            .variants
            .into_iter()
            .map(|v| Arc::try_unwrap(v).unwrap_or_else(|shared| (*shared).clone()))
            .collect();
        let n_before = variants.len();

        let lifted = liftover.lift(variants, source, target);
        let failed = lifted.iter().filter(|v| !v.has_coordinates()).count();
        if failed > 0 {
            warn!("{failed} of {n_before} variants failed to lift from {source} to {target}");
        }

        validate_effect_weights(&lifted)?;
        Ok(ScoreFile::new(lifted))
    }
}
