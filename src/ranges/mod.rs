//! Range and Range Containers.
//!
//! All ranges are 0-indexed and right-exclusive, i.e. `[start, end)`.

use crate::{
    error::TfBinsError,
    traits::{GenericRange, GenomicInterval, TsvSerialize},
    Position,
};

pub mod coitrees;
pub mod vec;

/// A range without a sequence name or any associated data, as stored
/// in per-sequence range containers.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RangeEmpty {
    pub start: Position,
    pub end: Position,
}

impl RangeEmpty {
    /// Create a new 0-indexed right-exclusive range.
    pub fn new(start: Position, end: Position) -> Self {
        Self { start, end }
    }
}

impl GenericRange for RangeEmpty {
    fn start(&self) -> Position {
        self.start
    }
    fn end(&self) -> Position {
        self.end
    }
}

/// Represents a parsed range entry, possibly containing some data.
#[derive(Debug, Clone, PartialEq)]
pub struct GenomicRangeRecord<U> {
    pub seqname: String,
    pub start: Position,
    pub end: Position,
    pub data: U,
}

/// A genomic interval with no associated data, e.g. a BED3 row or a genome bin.
pub type GenomicRangeEmptyRecord = GenomicRangeRecord<()>;

impl<U> GenomicRangeRecord<U> {
    pub fn new(seqname: String, start: Position, end: Position, data: U) -> Self {
        Self {
            seqname,
            start,
            end,
            data,
        }
    }
}

impl GenomicRangeEmptyRecord {
    pub fn new_empty(seqname: impl Into<String>, start: Position, end: Position) -> Self {
        Self {
            seqname: seqname.into(),
            start,
            end,
            data: (),
        }
    }
}

impl<U: Clone> GenericRange for GenomicRangeRecord<U> {
    fn start(&self) -> Position {
        self.start
    }
    fn end(&self) -> Position {
        self.end
    }
}

impl<U: Clone> GenomicInterval for GenomicRangeRecord<U> {
    fn seqname(&self) -> &str {
        &self.seqname
    }
}

impl TsvSerialize for GenomicRangeRecord<()> {
    fn to_tsv(&self) -> String {
        format!("{}\t{}\t{}", self.seqname, self.start, self.end)
    }
}

/// Represents a range entry yielded by the range iterators, with an
/// index to its sequence name rather than an owned `String`.
#[derive(Debug, Clone, PartialEq)]
pub struct RangeEmptyRecord {
    pub seqname_index: usize,
    pub start: Position,
    pub end: Position,
}

impl RangeEmptyRecord {
    pub fn new(seqname_index: usize, start: Position, end: Position) -> Self {
        Self {
            seqname_index,
            start,
            end,
        }
    }

    /// Resolve the sequence name index into a [`GenomicRangeEmptyRecord`].
    pub fn to_record(self, seqnames: &[String]) -> GenomicRangeEmptyRecord {
        GenomicRangeRecord {
            seqname: seqnames[self.seqname_index].clone(),
            start: self.start,
            end: self.end,
            data: (),
        }
    }
}

impl GenericRange for RangeEmptyRecord {
    fn start(&self) -> Position {
        self.start
    }
    fn end(&self) -> Position {
        self.end
    }
}

/// Validates that `start <= end`.
///
/// Zero-width ranges are allowed; they are kept in containers but never overlap
/// anything.
pub fn validate_range(start: Position, end: Position) -> Result<(), TfBinsError> {
    if start > end {
        return Err(TfBinsError::InvalidGenomicRange(start, end));
    }
    Ok(())
}
