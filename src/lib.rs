//! # tfbins
//!
//! Preparation of labeled genomic training data for transcription-factor binding
//! classifiers. The pipeline has three stages:
//!
//!  1. [`bins`]: tile the autosomes of a reference genome into fixed-width bins
//!     ([`BIN_WIDTH`] basepairs), reading chromosome lengths from a FASTA index.
//!
//!  2. [`labels`]: classify every bin against three ChIP-seq peak files (two replicates
//!     and a combined set) as positive, negative, or ambiguous, and write the shuffled
//!     positive and negative bins to a labeled TSV.
//!
//!  3. [`extract`]: attach the reference nucleotide sequence of each interval, in
//!     chunks, over a pool of worker threads that each hold their own indexed FASTA
//!     handle, with a sequential fallback when the pool cannot do the work.
//!
//! The first two stages are build-or-skip: existing output files are reused and never
//! rewritten by the labeler.

pub use indexmap;

pub mod bins;
pub mod commands;
pub mod error;
pub mod extract;
pub mod genome;
pub mod granges;
pub mod io;
pub mod iterators;
pub mod labels;
pub mod ranges;
pub mod reporting;
pub mod sequences;
pub mod test_utilities;
pub mod traits;

/// Genomic coordinates, 0-based.
pub type Position = u32;

/// The width of every genome bin, in basepairs.
pub const BIN_WIDTH: Position = 200;

/// The seed used to shuffle the labeled dataset.
pub const LABEL_SEED: u64 = 42;

/// The default number of rows fetched per chunk during sequence extraction.
pub const DEFAULT_CHUNK_SIZE: usize = 20_000;

/// The default number of worker threads used during parallel sequence extraction.
pub const DEFAULT_NUM_WORKERS: usize = 8;

/// The default indexed reference genome.
pub const DEFAULT_GENOME_PATH: &str = "genome/hg19.fa";

/// The file name of the genome bins BED file inside an output folder.
pub const GENOME_BINS_FILENAME: &str = "genome_bins.bed";

pub const INTERNAL_ERROR_MESSAGE: &str = "
tfbins internal error: this should never happen.
Please file an issue with a minimal reproducible example.";

/// Create an [`IndexMap`] of sequence names and their lengths.
///
/// # Examples
///
/// ```
/// use tfbins::seqlens;
///
/// let sl = seqlens!("chr1" => 650, "chr2" => 400);
/// assert_eq!(sl.get("chr1"), Some(&650));
/// ```
///
/// [`IndexMap`]: indexmap::IndexMap
#[macro_export]
macro_rules! seqlens {
    ($($key:expr => $value:expr),* $(,)?) => {
        $crate::indexmap::indexmap!($($key.to_string() => $value),*)
    };
}

/// Check two lengths (or other values) are equal, returning a
/// [`TfBinsError::LengthMismatch`] if not.
///
/// [`TfBinsError::LengthMismatch`]: crate::error::TfBinsError::LengthMismatch
#[macro_export]
macro_rules! ensure_eq {
    ($left:expr, $right:expr $(,)?) => {
        if $left != $right {
            return Err($crate::error::TfBinsError::LengthMismatch($left, $right));
        }
    };
}

pub mod prelude {
    pub use crate::bins::{load_or_make_bins, make_genome_bins};
    pub use crate::error::TfBinsError;
    pub use crate::extract::{ExtractOptions, Extraction, ParallelFailure, SequenceExtractor};
    pub use crate::genome::{genome_sizes, is_autosome};
    pub use crate::granges::GenomicRanges;
    pub use crate::io::{read_labeled_bins, read_seqlens, Bed3Iterator, InputFile, OutputFile};
    pub use crate::labels::{
        create_labeled_data, create_labeled_data_with_peaks, BinClass, Label, LabeledBin,
        LabelingOutcome, PeakFiles, PeakSets,
    };
    pub use crate::ranges::{
        coitrees::COITrees, vec::VecRanges, GenomicRangeEmptyRecord, GenomicRangeRecord,
        RangeEmpty,
    };
    pub use crate::sequences::nucleotide::{
        normalize_bases, GenomeOpener, IndexedGenome, Nucleotides, NucleotideSequences,
    };
    pub use crate::traits::{
        GenericRange, GenomicInterval, RangeContainer, SequenceSource, SourceOpener,
        TsvSerialize,
    };
    pub use crate::Position;

    pub use crate::seqlens;
}
