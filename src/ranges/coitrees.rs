use coitrees::{BasicCOITree, GenericInterval, IntervalTree};

use crate::{error::TfBinsError, traits::RangeContainer, Position};

use super::{vec::VecRanges, RangeEmpty};

/// The largest position that can be stored in a [`COITrees`] container,
/// since [`coitrees`] uses `i32` coordinates internally.
pub const MAX_COITREES_POSITION: Position = i32::MAX as Position;

// NOTE: coitrees intervals are end-inclusive ("last"), so the exclusive
// end is converted here. Positions are checked against MAX_COITREES_POSITION
// before any RangeEmpty is put into a tree.
impl GenericInterval<()> for RangeEmpty {
    fn first(&self) -> i32 {
        self.start as i32
    }
    fn last(&self) -> i32 {
        self.end as i32 - 1
    }
    fn metadata(&self) -> &() {
        &()
    }
}

/// A [`coitrees::BasicCOITree`] interval tree for a single sequence's ranges.
///
/// These are only used for overlap queries (e.g. against peak sets), so ranges carry
/// no metadata.
pub struct COITrees {
    pub(crate) ranges: BasicCOITree<(), usize>,
}

impl std::fmt::Debug for COITrees {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("COITrees")
            .field("number of ranges:", &self.ranges.len())
            .finish()
    }
}

impl COITrees {
    /// Count the number of ranges in this container that overlap the 0-indexed,
    /// right-exclusive range `[start, end)`.
    ///
    /// Zero-width query ranges overlap nothing.
    pub fn count_overlaps(&self, start: Position, end: Position) -> usize {
        if end <= start {
            return 0;
        }
        // positions past the tree's coordinate space cannot overlap anything in it
        let first = i32::try_from(start).unwrap_or(i32::MAX);
        let last = i32::try_from(end).unwrap_or(i32::MAX) - 1;
        self.ranges.query_count(first, last)
    }

    /// Return whether any range in this container overlaps `[start, end)`.
    pub fn has_overlaps(&self, start: Position, end: Position) -> bool {
        self.count_overlaps(start, end) > 0
    }

    /// Return the number of ranges in this [`COITrees`] container.
    pub fn len(&self) -> usize {
        self.ranges.len()
    }

    /// Return whether the [`COITrees`] object is empty (contains no ranges).
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Convert a [`VecRanges`] range container to a [`COITrees`] range container.
///
/// # Errors
/// Returns [`TfBinsError::PositionTooLarge`] if any range end exceeds
/// [`MAX_COITREES_POSITION`].
impl TryFrom<VecRanges<RangeEmpty>> for COITrees {
    type Error = TfBinsError;

    fn try_from(value: VecRanges<RangeEmpty>) -> Result<Self, Self::Error> {
        if let Some(range) = value
            .ranges
            .iter()
            .find(|range| range.end > MAX_COITREES_POSITION)
        {
            return Err(TfBinsError::PositionTooLarge(range.end));
        }
        let ranges = BasicCOITree::new(&value.ranges);
        Ok(Self { ranges })
    }
}

impl RangeContainer for COITrees {
    fn len(&self) -> usize {
        self.ranges.len()
    }
}
