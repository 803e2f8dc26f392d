//! Plain or gzip-compressed text files.

use std::fs::{File, OpenOptions};
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use flate2::read::MultiGzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;

/// Check if a path looks gzip-compressed
#[must_use]
pub fn is_gzipped(path: &Path) -> bool {
    let path_str = path.to_string_lossy().to_lowercase();
    path_str.ends_with(".gz") || path_str.ends_with(".bgz")
}

/// Open a text file for buffered reading, decompressing `.gz` files
///
/// # Errors
///
/// Returns an I/O error if the file cannot be opened.
pub fn open_text(path: &Path) -> io::Result<Box<dyn BufRead>> {
    let file = File::open(path)?;
    if is_gzipped(path) {
        Ok(Box::new(BufReader::new(MultiGzDecoder::new(file))))
    } else {
        Ok(Box::new(BufReader::new(file)))
    }
}

/// Create a text file for buffered writing, compressing `.gz` files
///
/// The returned writer must be dropped (or flushed) to finish the gzip stream.
///
/// # Errors
///
/// Returns an I/O error if the file cannot be created.
pub fn create_text(path: &Path) -> io::Result<Box<dyn Write>> {
    Ok(text_writer(File::create(path)?, path))
}

/// Like [`create_text`], but never replaces an existing file
///
/// # Errors
///
/// Returns an `AlreadyExists` I/O error if `path` exists.
pub fn create_new_text(path: &Path) -> io::Result<Box<dyn Write>> {
    let file = OpenOptions::new().write(true).create_new(true).open(path)?;
    Ok(text_writer(file, path))
}

fn text_writer(file: File, path: &Path) -> Box<dyn Write> {
    if is_gzipped(path) {
        Box::new(BufWriter::new(GzEncoder::new(file, Compression::default())))
    } else {
        Box::new(BufWriter::new(file))
    }
}
