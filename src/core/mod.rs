//! Core data types for variant matching.
//!
//! This module provides the fundamental types used throughout the library:
//!
//! - [`ScoreVariant`](variant::ScoreVariant): One row of a combined scoring file
//! - [`TargetVariant`](variant::TargetVariant): One biallelic row of a target `.bim`/`.pvar`
//! - [`MatchType`](types::MatchType): The eight allele-orientation strategies, in priority order
//! - [`MatchStatus`](types::MatchStatus), [`Exclusions`](types::Exclusions): Labelling outcomes
//! - [`complement`](allele::complement): DNA strand complement of an allele
//!
//! ## Allele orientation
//!
//! A scoring file variant can line up with a target variant in several ways:
//!
//! | Scoring file | Target REF/ALT | Match type |
//! |--------------|----------------|------------|
//! | A / C        | A / C          | refalt     |
//! | C / A        | A / C          | altref     |
//! | T / G        | A / C          | refalt_flip|
//! | G / T        | A / C          | altref_flip|
//!
//! Scoring file rows without an other allele only compare the effect allele.

pub mod allele;
pub mod liftover;
pub mod types;
pub mod variant;
