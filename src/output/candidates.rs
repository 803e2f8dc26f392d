use std::io;
use std::path::Path;

use csv::WriterBuilder;
use tracing::debug;

use crate::matching::candidate::MatchCandidate;
use crate::matching::MatchError;
use crate::parsing::candidates::CandidateRecord;
use crate::utils::io::create_new_text;

/// Write raw candidates for a later `combine` run. Existing files are never replaced.
///
/// # Errors
///
/// Returns `MatchError::OutputExists` if `path` already exists, or an I/O or
/// CSV error if the file cannot be written.
pub fn write_candidates(path: &Path, candidates: &[MatchCandidate]) -> Result<(), MatchError> {
    let file = create_new_text(path).map_err(|e| match e.kind() {
        io::ErrorKind::AlreadyExists => MatchError::OutputExists(path.display().to_string()),
        _ => MatchError::Io(e),
    })?;
    let mut writer = WriterBuilder::new().delimiter(b'\t').from_writer(file);
    for candidate in candidates {
        writer.serialize(CandidateRecord::from(candidate))?;
    }
    writer.flush()?;
    debug!("Wrote {} candidates to {}", candidates.len(), path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::{EffectType, MatchType};
    use crate::core::variant::{ScoreVariant, TargetOrder, TargetVariant};
    use crate::parsing::candidates::read_candidates;
    use std::sync::Arc;

    #[test]
    fn test_candidates_survive_staging() {
        let score = Arc::new(ScoreVariant {
            accession: "PGS000001".to_string(),
            row_nr: 11,
            chr_name: Some("X".to_string()),
            chr_position: Some(100),
            effect_allele: "C".to_string(),
            other_allele: Some("A".to_string()),
            effect_weight: -0.125,
            effect_type: EffectType::Additive,
        });
        let target = Arc::new(
            TargetVariant::new("X", 100, "X:100:A:C", "A", "C")
                .with_order(TargetOrder { file: 2, line: 40, allele: 0 }),
        );
        let candidates = vec![MatchCandidate::new(score, target, MatchType::Altref)];

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("test_X_matches.tsv.gz");
        write_candidates(&path, &candidates).unwrap();

        let restored = read_candidates(&path).unwrap();
        assert_eq!(restored, candidates);
    }

    #[test]
    fn test_staged_file_is_never_overwritten() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("test_chr1_1_matches.tsv.gz");
        write_candidates(&path, &[]).unwrap();

        let err = write_candidates(&path, &[]).unwrap_err();
        assert!(matches!(err, MatchError::OutputExists(_)));
        assert_eq!(err.exit_code(), 1);
    }
}
