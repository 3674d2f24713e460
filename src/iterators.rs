use genomap::GenomeMap;

use crate::{
    ranges::{RangeEmpty, RangeEmptyRecord},
    traits::IterableRangeContainer,
};

/// An iterator over [`RangeEmptyRecord`], which store
/// indices to the sequence names.
///
/// # Developer Notes
/// Using indices, rather than references to `&str` directly,
/// prevents lifetime complexity.
pub struct GRangesIterator<'a, R> {
    ranges: &'a GenomeMap<R>,
    current_seqname_index: usize,
    current_range_iter: Option<Box<dyn Iterator<Item = RangeEmpty> + 'a>>,
}

impl<'a, R> GRangesIterator<'a, R>
where
    R: IterableRangeContainer<RangeType = RangeEmpty>,
{
    pub fn new(ranges: &'a GenomeMap<R>) -> Self {
        let current_range_iter = ranges.get_by_index(0).map(|ranges| ranges.iter_ranges());
        Self {
            ranges,
            current_seqname_index: 0,
            current_range_iter,
        }
    }
}

impl<'a, R> Iterator for GRangesIterator<'a, R>
where
    R: IterableRangeContainer<RangeType = RangeEmpty>,
{
    type Item = RangeEmptyRecord;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            // no sequences at all, or we're out of range container iterators
            let range_iter = self.current_range_iter.as_mut()?;
            if let Some(next_range) = range_iter.next() {
                return Some(RangeEmptyRecord {
                    seqname_index: self.current_seqname_index,
                    start: next_range.start,
                    end: next_range.end,
                });
            }
            // try to load another sequence's set of ranges.
            self.current_seqname_index += 1;
            self.current_range_iter = self
                .ranges
                .get_by_index(self.current_seqname_index)
                .map(|ranges| ranges.iter_ranges());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::GRangesIterator;
    use crate::{
        granges::GenomicRanges, ranges::RangeEmptyRecord, test_utilities::granges_test_case_01,
    };

    #[test]
    fn test_genomic_ranges_iterator() {
        let gr = granges_test_case_01();
        let mut iter = GRangesIterator::new(&gr.ranges);
        assert_eq!(iter.next().unwrap(), RangeEmptyRecord::new(0, 0, 5));
        assert_eq!(iter.count(), 4);
    }

    #[test]
    fn test_empty_iterator() {
        let gr = GenomicRanges::new_empty();
        let mut iter = GRangesIterator::new(&gr.ranges);
        assert_eq!(iter.next(), None);
    }

    #[test]
    fn test_iterator_skips_empty_sequences() {
        let seqlens = crate::seqlens!("chr1" => 100, "chr2" => 100, "chr3" => 100);
        let mut gr = GenomicRanges::new_vec(&seqlens);
        gr.push_range("chr1", 0, 10).unwrap();
        gr.push_range("chr3", 0, 10).unwrap();
        let indices: Vec<_> = GRangesIterator::new(&gr.ranges)
            .map(|r| r.seqname_index)
            .collect();
        assert_eq!(indices, vec![0, 2]);
    }
}
