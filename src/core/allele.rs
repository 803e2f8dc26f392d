//! DNA strand complements for allele strings.
//!
//! Only alleles made entirely of `A`, `C`, `G` and `T` are complemented. Anything
//! else (indel codes like `I`/`D`, `N`, `.`, lowercase bases) is returned unchanged,
//! which keeps [`complement`] an involution over every possible string.

/// True if the allele is a non-empty run of uppercase `ACGT` bases
#[must_use]
pub fn is_valid_dna(allele: &str) -> bool {
    !allele.is_empty() && allele.bytes().all(|b| matches!(b, b'A' | b'C' | b'G' | b'T'))
}

/// Complement every base of an allele (A<->T, C<->G)
///
/// # Examples
///
/// ```
/// use pgs_match::core::allele::complement;
///
/// assert_eq!(complement("ACGT"), "TGCA");
/// assert_eq!(complement("D"), "D");
/// ```
#[must_use]
pub fn complement(allele: &str) -> String {
    if !is_valid_dna(allele) {
        return allele.to_string();
    }

    allele
        .bytes()
        .map(|b| match b {
            b'A' => 'T',
            b'T' => 'A',
            b'C' => 'G',
            // only G remains after validation
            _ => 'C',
        })
        .collect()
}

/// A biallelic pair is ambiguous (palindromic) when the complement of REF is ALT
#[must_use]
pub fn is_ambiguous(ref_allele: &str, alt_allele: &str) -> bool {
    complement(ref_allele) == alt_allele
}
