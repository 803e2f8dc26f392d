//! Parser for plink target variant tables.
//!
//! Two layouts are supported:
//!
//! - `.bim`: six whitespace-separated columns, no header
//!   (`chrom id cm pos allele1 allele2`). allele1 is read as REF, allele2 as ALT.
//! - `.pvar`: tab-separated, optional `##` meta lines, then a `#CHROM` header.
//!   Only the first five columns are read. ALT may list several alleles.
//!
//! The format is taken from the first non-blank line: `#` means pvar, anything else bim.

use std::io::BufRead;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::core::types::TargetFormat;
use crate::core::variant::{TargetOrder, TargetVariant};
use crate::parsing::ParseError;
use crate::utils::io::open_text;

/// Mandatory leading pvar columns
const PVAR_COLUMNS: [&str; 5] = ["#CHROM", "POS", "ID", "REF", "ALT"];

/// Detected layout of a target file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetHeader {
    pub format: TargetFormat,
    /// Column names from the `#CHROM` line (empty for bim)
    pub columns: Vec<String>,
}

/// Cheaply detect the target format by reading header lines only
///
/// # Errors
///
/// Returns `ParseError::Io` if the file cannot be read, or
/// `ParseError::InvalidTargetFormat` if the file is empty or has a bad header.
pub fn detect_format(path: &Path) -> Result<TargetHeader, ParseError> {
    let mut reader = open_text(path)?;
    let (header, _) = read_header(&mut reader, path)?;
    debug!("{} format detected for {}", header.format, path.display());
    Ok(header)
}

/// Read a target file into biallelic rows.
///
/// `file_index` is recorded in each row's [`TargetOrder`]. Rows on other
/// chromosomes are skipped when `chrom_filter` is set. Multiallelic pvar rows are
/// dropped when `remove_multiallelic` is set, otherwise split into one row per ALT.
///
/// # Errors
///
/// Returns `ParseError::Io` on read failures and `ParseError::InvalidTargetFormat`
/// if the header or any row is malformed.
pub fn read_target(
    path: &Path,
    file_index: u32,
    remove_multiallelic: bool,
    chrom_filter: Option<&str>,
) -> Result<Vec<TargetVariant>, ParseError> {
    let mut reader = open_text(path)?;
    let (header, first_data_line) = read_header(&mut reader, path)?;

    if remove_multiallelic && header.format == TargetFormat::Bim {
        warn!(
            "Removing multiallelic variants requested for bim format {}, which only contains biallelic variants",
            path.display()
        );
    }

    let mut parser = RowParser {
        path,
        format: header.format,
        file_index,
        remove_multiallelic,
        chrom_filter,
        line: 0,
        variants: Vec::new(),
        n_multiallelic: 0,
    };

    if let Some(line) = first_data_line {
        parser.push_line(&line)?;
    }

    let mut buf = String::new();
    loop {
        buf.clear();
        if reader.read_line(&mut buf)? == 0 {
            break;
        }
        parser.push_line(&buf)?;
    }

    if parser.n_multiallelic > 0 {
        if remove_multiallelic {
            debug!("Dropped {} multiallelic rows", parser.n_multiallelic);
        } else {
            debug!("Split {} multiallelic rows into biallelic rows", parser.n_multiallelic);
        }
    }

    debug!(
        "Read {} target variants from {}{}",
        parser.variants.len(),
        path.display(),
        chrom_filter.map(|c| format!(" (chromosome {c})")).unwrap_or_default()
    );

    Ok(parser.variants)
}

/// Read several target files, concatenated in the order given
///
/// # Errors
///
/// Propagates the first error from [`read_target`].
pub fn read_targets(
    paths: &[PathBuf],
    remove_multiallelic: bool,
    chrom_filter: Option<&str>,
) -> Result<Vec<TargetVariant>, ParseError> {
    let mut variants = Vec::new();
    for (i, path) in paths.iter().enumerate() {
        let file_index = u32::try_from(i).map_err(|_| ParseError::InvalidTargetFormat {
            path: path.display().to_string(),
            reason: "too many target files".to_string(),
        })?;
        variants.extend(read_target(path, file_index, remove_multiallelic, chrom_filter)?);
    }
    Ok(variants)
}

/// Consume header lines. Returns the header and, for bim, the first data line.
fn read_header(
    reader: &mut dyn BufRead,
    path: &Path,
) -> Result<(TargetHeader, Option<String>), ParseError> {
    let mut buf = String::new();
    loop {
        buf.clear();
        if reader.read_line(&mut buf)? == 0 {
            return Err(invalid(path, "file is empty"));
        }
        let line = buf.trim_end_matches(['\n', '\r']);
        if line.trim().is_empty() {
            continue;
        }

        if !line.starts_with('#') {
            let header = TargetHeader {
                format: TargetFormat::Bim,
                columns: Vec::new(),
            };
            return Ok((header, Some(line.to_string())));
        }

        if line.starts_with("##") {
            // pvar meta lines precede the #CHROM header
            continue;
        }

        let columns: Vec<String> = line.split('\t').map(str::to_string).collect();
        let leading: Vec<&str> = columns.iter().take(5).map(String::as_str).collect();
        if leading != PVAR_COLUMNS {
            return Err(invalid(
                path,
                &format!(
                    "pvar header must start with {}, found '{}'",
                    PVAR_COLUMNS.join(" "),
                    line
                ),
            ));
        }

        let header = TargetHeader {
            format: TargetFormat::Pvar,
            columns,
        };
        return Ok((header, None));
    }
}

fn invalid(path: &Path, reason: &str) -> ParseError {
    ParseError::InvalidTargetFormat {
        path: path.display().to_string(),
        reason: reason.to_string(),
    }
}

/// Accumulates rows from successive data lines
struct RowParser<'a> {
    path: &'a Path,
    format: TargetFormat,
    file_index: u32,
    remove_multiallelic: bool,
    chrom_filter: Option<&'a str>,
    /// 0-based index of the next data line
    line: u64,
    variants: Vec<TargetVariant>,
    n_multiallelic: usize,
}

impl RowParser<'_> {
    fn push_line(&mut self, raw: &str) -> Result<(), ParseError> {
        let line = raw.trim_end_matches(['\n', '\r']);
        if line.trim().is_empty() {
            return Ok(());
        }

        let line_nr = self.line;
        self.line += 1;

        let (chrom, pos, id, ref_allele, alts) = match self.format {
            TargetFormat::Bim => {
                let fields: Vec<&str> = line.split_whitespace().collect();
                if fields.len() != 6 {
                    return Err(self.bad_row(line_nr, &format!("expected 6 columns, found {}", fields.len())));
                }
                (fields[0], fields[3], fields[1], fields[4], fields[5])
            }
            TargetFormat::Pvar => {
                let fields: Vec<&str> = line.split('\t').collect();
                if fields.len() < 5 {
                    return Err(self.bad_row(line_nr, &format!("expected at least 5 columns, found {}", fields.len())));
                }
                (fields[0], fields[1], fields[2], fields[3], fields[4])
            }
        };

        if self.chrom_filter.is_some_and(|c| c != chrom) {
            return Ok(());
        }

        let pos: u64 = pos
            .parse()
            .map_err(|_| self.bad_row(line_nr, &format!("invalid position '{pos}'")))?;

        let is_multiallelic = alts.contains(',');
        if is_multiallelic {
            self.n_multiallelic += 1;
            if self.remove_multiallelic {
                return Ok(());
            }
        }

        for (allele_idx, alt) in alts.split(',').enumerate() {
            let order = TargetOrder {
                file: self.file_index,
                line: line_nr,
                allele: u32::try_from(allele_idx).unwrap_or(u32::MAX),
            };
            self.variants.push(
                TargetVariant::new(chrom, pos, id, ref_allele, alt)
                    .with_multiallelic(is_multiallelic)
                    .with_order(order),
            );
        }

        Ok(())
    }

    fn bad_row(&self, line_nr: u64, reason: &str) -> ParseError {
        invalid(self.path, &format!("data line {}: {reason}", line_nr + 1))
    }
}
