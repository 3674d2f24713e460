//! Traits used by the tfbins library.
//!

use crate::{error::TfBinsError, sequences::nucleotide::Nucleotides, Position};

/// The [`GenericRange`] trait defines common functionality for all range types.
pub trait GenericRange: Clone {
    fn start(&self) -> Position;
    fn end(&self) -> Position;
    fn width(&self) -> Position {
        self.end() - self.start()
    }

    /// Calculate how many basepairs overlap this range and other.
    fn overlap_width<R: GenericRange>(&self, other: &R) -> Position {
        let overlap_start = std::cmp::max(self.start(), other.start());
        let overlap_end = std::cmp::min(self.end(), other.end());
        if overlap_start >= overlap_end {
            return 0;
        }
        overlap_end.saturating_sub(overlap_start)
    }

    /// Return a tuple version of this range.
    fn as_tuple(&self) -> (Position, Position) {
        (self.start(), self.end())
    }
}

/// A [`GenericRange`] that also knows which sequence (i.e. chromosome) it is on.
///
/// This is what the sequence extractor needs from a row: any table whose rows
/// implement [`GenomicInterval`] can have sequences attached.
pub trait GenomicInterval: GenericRange {
    fn seqname(&self) -> &str;
}

/// Defines functionality common to all range containers, e.g. [`VecRanges<R>`] and
/// [`COITrees`].
///
/// [`VecRanges<R>`]: crate::ranges::vec::VecRanges
/// [`COITrees`]: crate::ranges::coitrees::COITrees
pub trait RangeContainer {
    fn len(&self) -> usize;
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// The [`IterableRangeContainer`] trait defines common functionality for iterating over
/// the range types in range containers.
pub trait IterableRangeContainer: RangeContainer {
    type RangeType: GenericRange;
    fn iter_ranges(&self) -> Box<dyn Iterator<Item = Self::RangeType> + '_>;
}

/// Defines how to serialize something to TSV.
pub trait TsvSerialize {
    // Serialize something to a TSV [`String`].
    fn to_tsv(&self) -> String;
}

/// A source of reference nucleotide sequence that can be sliced by region.
///
/// Implementations own whatever handle they need (e.g. an open indexed FASTA reader),
/// which is why fetching takes `&mut self`.
pub trait SequenceSource {
    /// Fetch the raw (not normalized) 0-based, right-exclusive region `[start, end)` of
    /// sequence `seqname`. An `end` past the sequence length is clamped to the length.
    fn fetch(
        &mut self,
        seqname: &str,
        start: Position,
        end: Position,
    ) -> Result<Nucleotides, TfBinsError>;
}

/// Opens new, independent [`SequenceSource`] handles.
///
/// An opener is shared across worker threads (hence `Sync`), but the sources it
/// opens are not: each worker opens its own.
pub trait SourceOpener: Sync {
    type Source: SequenceSource;
    fn open(&self) -> Result<Self::Source, TfBinsError>;
}
