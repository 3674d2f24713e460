//! The [`GenomicRanges<C>`] container: ranges grouped by sequence name.
//!
//! # Design
//!
//! [`GenomicRanges<C>`] is generic over its per-sequence **range container** (`C`),
//! because different operations need different data structures:
//!
//!  - [`VecRanges`] is used when ranges are being generated (e.g. genome bins)
//!    or loaded from a file, and when they need to be iterated over in order.
//!
//!  - [`COITrees`] is used when ranges need to be queried for overlaps (e.g.
//!    peak sets). Conversion is done with [`GenomicRanges::into_coitrees()`].
//!
//! Sequences are kept in insertion order (via [`genomap::GenomeMap`]), so iterating
//! over ranges follows chromosome order, then range order within a chromosome.

use std::io::Write;
use std::path::PathBuf;

use genomap::GenomeMap;
use indexmap::IndexMap;

use crate::{
    error::TfBinsError,
    io::OutputFile,
    iterators::GRangesIterator,
    ranges::{
        coitrees::COITrees,
        validate_range,
        vec::{VecRanges, VecRangesEmpty},
        GenomicRangeEmptyRecord, RangeEmpty,
    },
    traits::{IterableRangeContainer, RangeContainer, TsvSerialize},
    Position,
};

#[derive(Clone, Debug)]
pub struct GenomicRanges<C> {
    pub(crate) ranges: GenomeMap<C>,
}

impl<C> GenomicRanges<C>
where
    C: RangeContainer,
{
    /// Get the total number of ranges.
    pub fn len(&self) -> usize {
        self.ranges.values().map(|ranges| ranges.len()).sum()
    }

    /// Return whether the [`GenomicRanges`] object is empty (contains no ranges).
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Get the raw range container.
    pub fn get_ranges(&self, seqname: &str) -> Option<&C> {
        self.ranges.get(seqname)
    }

    /// Get the sequence names.
    pub fn seqnames(&self) -> Vec<String> {
        self.ranges.names()
    }
}

impl GenomicRanges<VecRangesEmpty> {
    /// Create a new [`GenomicRanges`] object with vector storage, and an empty range
    /// container for each of the sequences in `seqlens`.
    pub fn new_vec(seqlens: &IndexMap<String, Position>) -> Self {
        let mut ranges = GenomeMap::new();
        for seqname in seqlens.keys() {
            // this should never happen because the error is only if
            // insert encounters a seqname that's already been inserted -- that
            // cannot happen with IndexMap keys.
            ranges
                .insert(seqname, VecRanges::new())
                .expect(crate::INTERNAL_ERROR_MESSAGE);
        }
        Self { ranges }
    }

    /// Create a new empty [`GenomicRanges`] object with no sequences. Sequences
    /// are added in the order they are first seen by [`GenomicRanges::push_range()`].
    pub fn new_empty() -> Self {
        Self {
            ranges: GenomeMap::new(),
        }
    }

    /// Push a range to the container for sequence `seqname`, creating the container
    /// if this sequence hasn't been seen yet.
    pub fn push_range(
        &mut self,
        seqname: &str,
        start: Position,
        end: Position,
    ) -> Result<(), TfBinsError> {
        validate_range(start, end)?;
        let range = RangeEmpty::new(start, end);
        match self.ranges.get_mut(seqname) {
            Some(range_container) => range_container.push_range(range),
            None => {
                let mut range_container = VecRanges::new();
                range_container.push_range(range);
                self.ranges.insert(seqname, range_container)?;
            }
        }
        Ok(())
    }

    /// Create a new [`GenomicRanges`] object from an iterator over
    /// [`GenomicRangeEmptyRecord`] records, keeping the file order.
    pub fn from_iter<I>(iter: I) -> Result<Self, TfBinsError>
    where
        I: Iterator<Item = Result<GenomicRangeEmptyRecord, TfBinsError>>,
    {
        let mut gr = GenomicRanges::new_empty();
        for possible_entry in iter {
            let entry = possible_entry?;
            gr.push_range(&entry.seqname, entry.start, entry.end)?;
        }
        Ok(gr)
    }

    /// Make a [`GenomicRanges<VecRangesEmpty>`] with ranges from (possibly overlapping) windows.
    ///
    /// # Arguments
    ///  * `seqlens`: the sequence (e.g. chromosome) lengths.
    ///  * `width`: the window width, in basepairs.
    ///  * `step`: the step length, in basepairs; if None, step is `width`.
    ///  * `chop`: whether to cut off the last window, if there is a remainder less than the width.
    ///
    /// # Examples
    ///
    /// ```
    /// use tfbins::prelude::*;
    ///
    /// let sl = seqlens!("chr1" => 11);
    ///
    /// // no step don't chop off remainder
    /// let gr = GenomicRanges::from_windows(&sl, 5, None, false).unwrap();
    ///
    /// let mut range_iter = gr.iter_ranges();
    /// assert_eq!(range_iter.next().unwrap().as_tuple(), (0, 5));
    /// assert_eq!(range_iter.next().unwrap().as_tuple(), (5, 10));
    /// assert_eq!(range_iter.next().unwrap().as_tuple(), (10, 11));
    ///
    /// // no step do chop off remainder
    /// let gr = GenomicRanges::from_windows(&sl, 5, None, true).unwrap();
    /// assert_eq!(gr.len(), 2);
    /// ```
    pub fn from_windows(
        seqlens: &IndexMap<String, Position>,
        width: Position,
        step: Option<Position>,
        chop: bool,
    ) -> Result<Self, TfBinsError> {
        let step = step.unwrap_or(width);
        if width == 0 || step == 0 {
            return Err(TfBinsError::ZeroWindowWidth);
        }
        let mut gr = GenomicRanges::new_vec(seqlens);

        // iterate over each chromosome and create windows
        for (seqname, len) in seqlens {
            let mut start: Position = 0;
            while start < *len {
                let mut end = start.saturating_add(width);
                if end > *len {
                    if chop {
                        break;
                    }
                    end = *len;
                }
                gr.push_range(seqname, start, end)?;
                if end == *len {
                    break;
                }
                start = start.saturating_add(step);
            }
        }
        Ok(gr)
    }

    /// Convert the [`VecRangesEmpty`] range containers in this [`GenomicRanges`] to a
    /// cache-oblivious interval tree range container, [`COITrees`]. This is
    /// done using the [`coitrees`] library by Daniel C. Jones.
    pub fn into_coitrees(self) -> Result<GenomicRanges<COITrees>, TfBinsError> {
        let mut new_ranges = GenomeMap::new();
        for (seqname, vec_ranges) in self.ranges.into_iter() {
            let trees = COITrees::try_from(vec_ranges)?;
            new_ranges.insert(&seqname, trees)?;
        }
        Ok(GenomicRanges { ranges: new_ranges })
    }

    /// Create a new [`GRangesIterator`] to iterate through all the ranges in this
    /// [`GenomicRanges`] object, in sequence order.
    pub fn iter_ranges(&self) -> GRangesIterator<'_, VecRangesEmpty> {
        GRangesIterator::new(&self.ranges)
    }

    /// Iterate through all ranges as owned [`GenomicRangeEmptyRecord`] records.
    pub fn iter_records(&self) -> impl Iterator<Item = GenomicRangeEmptyRecord> + '_ {
        let seqnames = self.seqnames();
        self.iter_ranges()
            .map(move |range| range.to_record(&seqnames))
    }

    /// Write these ranges as a headerless BED3 TSV file, or to standard output
    /// if `output` is `None`.
    pub fn to_tsv(&self, output: Option<impl Into<PathBuf>>) -> Result<(), TfBinsError> {
        let output = output.map_or(OutputFile::new_stdout(None), |file| {
            OutputFile::new(file, None)
        });
        let mut writer = output.writer()?;

        for record in self.iter_records() {
            writeln!(writer, "{}", record.to_tsv())?;
        }
        writer.flush()?;
        Ok(())
    }
}

impl GenomicRanges<COITrees> {
    /// Count the number of ranges on `seqname` that overlap `[start, end)`. Sequences
    /// not present in this container have no overlaps.
    pub fn count_overlaps(&self, seqname: &str, start: Position, end: Position) -> usize {
        self.ranges
            .get(seqname)
            .map_or(0, |trees| trees.count_overlaps(start, end))
    }

    /// Return whether any range on `seqname` overlaps `[start, end)`.
    pub fn has_overlaps(&self, seqname: &str, start: Position, end: Position) -> bool {
        self.count_overlaps(seqname, start, end) > 0
    }
}

impl<C: IterableRangeContainer + PartialEq> PartialEq for GenomicRanges<C> {
    fn eq(&self, other: &Self) -> bool {
        self.seqnames() == other.seqnames()
            && self
                .ranges
                .values()
                .zip(other.ranges.values())
                .all(|(a, b)| a == b)
    }
}
