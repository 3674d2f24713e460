//! The [`TfBinsError`] `enum` definition and error messages.
//!
use crate::Position;
use genomap::GenomeMapError;
use std::num::ParseIntError;
use std::path::PathBuf;
use std::string::FromUtf8Error;
use thiserror::Error;

/// The [`TfBinsError`] defines the standard set of errors that should
/// be passed to the user.
#[derive(Debug, Error)]
pub enum TfBinsError {
    // IO related errors
    #[error("File reading error: {0}")]
    IOError(#[from] std::io::Error),
    #[error("TSV reading/writing error: {0}")]
    CsvError(#[from] csv::Error),
    #[error("FAI index file not found: {}", .0.display())]
    MissingFaiFile(PathBuf),

    // File parsing related errors
    #[error("Integer parsing error: {0}")]
    ParseIntError(#[from] ParseIntError),
    #[error("Could not convert bytes to a UTF8 string: {0}")]
    FromUtf8Error(#[from] FromUtf8Error),
    #[error("Bed-like file has too few columns. The first three columns must be sequence name, and start and end positions.\nLine: {0}")]
    BedlikeTooFewColumns(String),
    #[error("File has invalid column type entry: {0}")]
    InvalidColumnType(String),
    #[error("Genome file is invalid: {0}")]
    InvalidGenomeFile(String),
    #[error("Labeled table is missing required column '{0}'")]
    MissingColumn(String),
    #[error("Invalid label value '{0}': labels must be 0 or 1")]
    InvalidLabel(u8),

    // Invalid genomic range errors
    #[error("Range invalid: start ({0}) must be less than or equal to end ({1})")]
    InvalidGenomicRange(Position, Position),
    #[error("Position {0} is too large for the interval tree index")]
    PositionTooLarge(Position),
    #[error("Window width must be greater than zero")]
    ZeroWindowWidth,
    #[error("Sequence name '{0}' is not in the ranges container")]
    MissingSequence(String),
    #[error("Error encountered in genomap::GenomeMap")]
    GenomeMapError(#[from] GenomeMapError),
    #[error("Internal length mismatch: {0} != {1}")]
    LengthMismatch(usize, usize),

    // Sequence extraction errors
    #[error("Chunk size must be greater than zero")]
    ZeroChunkSize,
}
