use crate::traits::{GenericRange, IterableRangeContainer, RangeContainer};

use super::RangeEmpty;

pub type VecRangesEmpty = VecRanges<RangeEmpty>;

/// A [`Vec`]-backed range container for a single sequence, used while
/// ranges are being loaded or generated.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct VecRanges<R: Clone> {
    pub(crate) ranges: Vec<R>,
}

impl<R: Clone> VecRanges<R> {
    /// Create a new empty [`VecRanges`] container.
    pub fn new() -> Self {
        Self { ranges: Vec::new() }
    }

    /// Add a new range to the [`VecRanges`] container.
    pub fn push_range(&mut self, range: R) {
        self.ranges.push(range)
    }

    /// Return the number of ranges in this [`VecRanges`] container.
    pub fn len(&self) -> usize {
        self.ranges.len()
    }

    /// Return whether the [`VecRanges`] object is empty (contains no ranges).
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<R: GenericRange> VecRanges<R> {
    /// Sort the ranges by start, then end.
    pub fn sort(&mut self) {
        self.ranges
            .sort_by(|a, b| a.start().cmp(&b.start()).then(a.end().cmp(&b.end())));
    }
}

impl<R: Clone> RangeContainer for VecRanges<R> {
    fn len(&self) -> usize {
        self.ranges.len()
    }
}

impl IterableRangeContainer for VecRanges<RangeEmpty> {
    type RangeType = RangeEmpty;
    fn iter_ranges(&self) -> Box<dyn Iterator<Item = RangeEmpty> + '_> {
        Box::new(self.ranges.iter().cloned())
    }
}
