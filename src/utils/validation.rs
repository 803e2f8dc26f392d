//! Centralized validation and helper functions.

/// Maximum length of a dataset label
pub const MAX_DATASET_LENGTH: usize = 255;

/// Validation error types
#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    #[error("Empty dataset label provided")]
    EmptyDataset,
    #[error("Dataset label too long: exceeds {MAX_DATASET_LENGTH} characters")]
    DatasetTooLong,
    #[error("Invalid dataset label '{0}': contains path separators or control characters")]
    InvalidDataset(String),
    #[error("Minimum overlap must be between 0 and 1, got {0}")]
    InvalidMinOverlap(f64),
    #[error("Thread count must be at least 1")]
    InvalidThreads,
}

/// Validate a dataset label and make it safe to embed in output file names.
///
/// `_` separates fields in output file names, so it is replaced with `-`.
///
/// # Examples
///
/// ```
/// use pgs_match::utils::validation::validate_dataset;
///
/// assert_eq!(validate_dataset("my_cohort").unwrap(), "my-cohort");
/// assert!(validate_dataset("../etc").is_err());
/// ```
///
/// # Errors
///
/// Returns `ValidationError::EmptyDataset` if the label is blank,
/// `ValidationError::DatasetTooLong` if it exceeds the limit, or
/// `ValidationError::InvalidDataset` if it contains path separators.
pub fn validate_dataset(dataset: &str) -> Result<String, ValidationError> {
    let dataset = dataset.trim();
    if dataset.is_empty() {
        return Err(ValidationError::EmptyDataset);
    }

    if dataset.len() > MAX_DATASET_LENGTH {
        return Err(ValidationError::DatasetTooLong);
    }

    if dataset.contains("..")
        || dataset.contains('/')
        || dataset.contains('\\')
        || dataset.chars().any(char::is_control)
    {
        return Err(ValidationError::InvalidDataset(dataset.to_string()));
    }

    Ok(dataset.replace('_', "-"))
}

/// Check that a minimum overlap is a fraction in `[0, 1]`
///
/// # Errors
///
/// Returns `ValidationError::InvalidMinOverlap` otherwise (including NaN).
pub fn validate_min_overlap(min_overlap: f64) -> Result<f64, ValidationError> {
    if (0.0..=1.0).contains(&min_overlap) {
        Ok(min_overlap)
    } else {
        Err(ValidationError::InvalidMinOverlap(min_overlap))
    }
}

/// # Errors
///
/// Returns `ValidationError::InvalidThreads` for zero.
pub fn validate_threads(threads: usize) -> Result<usize, ValidationError> {
    if threads == 0 {
        Err(ValidationError::InvalidThreads)
    } else {
        Ok(threads)
    }
}

/// Convert a count to f64 for ratio calculations.
/// Precision loss only occurs above 2^52 (~4.5 quadrillion).
#[inline]
#[must_use]
pub fn count_to_f64(count: usize) -> f64 {
    #[allow(clippy::cast_precision_loss)]
    {
        count as f64
    }
}
