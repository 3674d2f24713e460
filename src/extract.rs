//! Chunked, parallel extraction of reference sequences for tables of genomic intervals.
//!
//! Rows are split into contiguous chunks of [`ExtractOptions::chunk_size`]. Each chunk is
//! fetched over a fresh [`rayon`] thread pool, where every worker opens its own
//! [`SequenceSource`] through the shared [`SourceOpener`]. If the pool cannot do the work
//! (it fails to start, or a worker cannot open or read the genome, or a worker panics),
//! that chunk alone is re-run sequentially on the calling thread. Errors in the data itself, e.g. an
//! interval on an unknown chromosome, are never retried.
//!
//! Output is always in input row order.

use indicatif::{ProgressBar, ProgressStyle};
use log::{debug, warn};
use rayon::prelude::*;
use rayon::ThreadPoolBuilder;
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use thiserror::Error;

use crate::{
    ensure_eq,
    error::TfBinsError,
    sequences::fetch_normalized,
    traits::{GenomicInterval, SourceOpener, TsvSerialize},
    DEFAULT_CHUNK_SIZE, DEFAULT_NUM_WORKERS,
};

/// Settings for [`SequenceExtractor`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExtractOptions {
    /// Worker threads per chunk. Zero is accepted, but no pool can start with it, so
    /// every chunk falls back to sequential extraction.
    pub num_workers: usize,
    /// Rows per chunk; must be greater than zero.
    pub chunk_size: usize,
    /// Whether to try the worker pool at all.
    pub use_parallel: bool,
    /// Whether to draw a progress bar over chunks.
    pub progress: bool,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            num_workers: DEFAULT_NUM_WORKERS,
            chunk_size: DEFAULT_CHUNK_SIZE,
            use_parallel: true,
            progress: true,
        }
    }
}

/// Why a parallel attempt at a chunk failed.
///
/// All kinds except [`ParallelFailure::Row`] are failures of the execution environment,
/// and are recovered from by re-running the chunk sequentially.
#[derive(Debug, Error)]
pub enum ParallelFailure {
    #[error("could not start the worker pool: {0}")]
    PoolStart(String),
    #[error("a worker could not open the sequence source: {0}")]
    WorkerInit(String),
    #[error("a worker panicked: {0}")]
    WorkerPanic(String),
    #[error("a worker could not read from the sequence source: {0}")]
    WorkerIo(String),
    #[error(transparent)]
    Row(#[from] TfBinsError),
}

impl ParallelFailure {
    /// Whether a sequential retry could succeed where the parallel attempt failed.
    pub fn is_environmental(&self) -> bool {
        !matches!(self, ParallelFailure::Row(_))
    }

    /// Classify an error from fetching a row inside a worker. I/O errors come from the
    /// worker's file handle, not from the row, so they are environmental.
    fn from_fetch(error: TfBinsError) -> Self {
        match error {
            TfBinsError::IOError(e) => ParallelFailure::WorkerIo(e.to_string()),
            other => ParallelFailure::Row(other),
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

/// The normalized sequences of a [`SequenceExtractor::extract()`] run, in row order, and
/// the indices of the chunks that had to fall back to sequential extraction.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Extraction {
    pub sequences: Vec<String>,
    pub fallback_chunks: Vec<usize>,
}

/// A row with its reference sequence attached.
#[derive(Clone, Debug, PartialEq)]
pub struct SequencedRecord<R> {
    pub record: R,
    pub seq: String,
}

impl<R: TsvSerialize> TsvSerialize for SequencedRecord<R> {
    fn to_tsv(&self) -> String {
        format!("{}\t{}", self.record.to_tsv(), self.seq)
    }
}

/// The rows of a [`SequenceExtractor::attach()`] run, with their sequences.
#[derive(Clone, Debug, PartialEq)]
pub struct SequencedTable<R> {
    pub rows: Vec<SequencedRecord<R>>,
    pub fallback_chunks: Vec<usize>,
}

/// Fetches normalized reference sequences for any table of [`GenomicInterval`] rows.
#[derive(Debug)]
pub struct SequenceExtractor<O> {
    opener: O,
    options: ExtractOptions,
}

impl<O: SourceOpener> SequenceExtractor<O> {
    pub fn new(opener: O, options: ExtractOptions) -> Self {
        Self { opener, options }
    }

    /// Fetch all rows in order on the calling thread, through one source.
    pub fn extract_sequential<R: GenomicInterval>(
        &self,
        rows: &[R],
    ) -> Result<Vec<String>, TfBinsError> {
        let mut source = self.opener.open()?;
        rows.iter()
            .map(|row| fetch_normalized(&mut source, row.seqname(), row.start(), row.end()))
            .collect()
    }

    /// Fetch all rows over a new pool of [`ExtractOptions::num_workers`] threads. The rows
    /// are split into one contiguous slice per worker, and each slice is fetched in order
    /// through its own source, so at most `num_workers` sources are opened. The output is
    /// in row order.
    pub fn extract_parallel<R: GenomicInterval + Sync>(
        &self,
        rows: &[R],
    ) -> Result<Vec<String>, ParallelFailure> {
        let num_workers = self.options.num_workers;
        if num_workers == 0 {
            return Err(ParallelFailure::PoolStart(
                "zero workers requested".to_string(),
            ));
        }
        let pool = ThreadPoolBuilder::new()
            .num_threads(num_workers)
            .build()
            .map_err(|e| ParallelFailure::PoolStart(e.to_string()))?;

        let opener = &self.opener;
        let slice_len = rows.len().div_ceil(num_workers).max(1);
        let fetch_all = || {
            rows.par_chunks(slice_len)
                .map(|slice| {
                    let mut source = opener
                        .open()
                        .map_err(|e| ParallelFailure::WorkerInit(e.to_string()))?;
                    slice
                        .iter()
                        .map(|row| {
                            fetch_normalized(&mut source, row.seqname(), row.start(), row.end())
                                .map_err(ParallelFailure::from_fetch)
                        })
                        .collect::<Result<Vec<_>, _>>()
                })
                .collect::<Result<Vec<_>, _>>()
                .map(|slices| slices.into_iter().flatten().collect())
        };

        panic::catch_unwind(AssertUnwindSafe(|| pool.install(fetch_all)))
            .map_err(|payload| ParallelFailure::WorkerPanic(panic_message(&*payload)))?
    }

    /// Fetch one chunk, falling back to sequential extraction on environmental failures.
    /// Returns the sequences and whether the fallback was used.
    fn extract_chunk<R: GenomicInterval + Sync>(
        &self,
        index: usize,
        chunk: &[R],
    ) -> Result<(Vec<String>, bool), TfBinsError> {
        if !self.options.use_parallel {
            return Ok((self.extract_sequential(chunk)?, false));
        }
        match self.extract_parallel(chunk) {
            Ok(sequences) => Ok((sequences, false)),
            Err(ParallelFailure::Row(e)) => Err(e),
            Err(failure) => {
                warn!(
                    "Parallel extraction of chunk {} failed ({}), retrying sequentially",
                    index, failure
                );
                Ok((self.extract_sequential(chunk)?, true))
            }
        }
    }

    /// Fetch the normalized sequence of every row, chunk by chunk.
    pub fn extract<R: GenomicInterval + Sync>(
        &self,
        rows: &[R],
    ) -> Result<Extraction, TfBinsError> {
        let chunk_size = self.options.chunk_size;
        if chunk_size == 0 {
            return Err(TfBinsError::ZeroChunkSize);
        }
        let num_chunks = rows.len().div_ceil(chunk_size);
        debug!(
            "extracting {} rows in {} chunks of up to {} rows",
            rows.len(),
            num_chunks,
            chunk_size
        );

        let progress = if self.options.progress {
            let pb = ProgressBar::new(num_chunks as u64);
            pb.set_style(
                ProgressStyle::with_template(
                    "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} chunks ({eta})",
                )
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("#>-"),
            );
            pb
        } else {
            ProgressBar::hidden()
        };

        let mut extraction = Extraction {
            sequences: Vec::with_capacity(rows.len()),
            fallback_chunks: Vec::new(),
        };
        for (index, chunk) in rows.chunks(chunk_size).enumerate() {
            let (sequences, fell_back) = self.extract_chunk(index, chunk)?;
            ensure_eq!(sequences.len(), chunk.len());
            if fell_back {
                extraction.fallback_chunks.push(index);
            }
            extraction.sequences.extend(sequences);
            progress.inc(1);
        }
        progress.finish_and_clear();
        Ok(extraction)
    }

    /// Attach the normalized sequence to every row, keeping row order.
    pub fn attach<R: GenomicInterval + Sync>(
        &self,
        rows: Vec<R>,
    ) -> Result<SequencedTable<R>, TfBinsError> {
        let Extraction {
            sequences,
            fallback_chunks,
        } = self.extract(&rows)?;
        let rows = rows
            .into_iter()
            .zip(sequences)
            .map(|(record, seq)| SequencedRecord { record, seq })
            .collect();
        Ok(SequencedTable {
            rows,
            fallback_chunks,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prelude::*;
    use crate::test_utilities::{random_intervals, random_sequence, write_indexed_fasta};
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn quiet(num_workers: usize, chunk_size: usize) -> ExtractOptions {
        ExtractOptions {
            num_workers,
            chunk_size,
            use_parallel: true,
            progress: false,
        }
    }

    fn test_genome() -> NucleotideSequences {
        NucleotideSequences::from_pairs([
            ("chr1", "ACGTacgtRYryNNNNAAAACCCCGGGGTTTT"),
            ("chr2", "ggggccccaaaattttGATTACAGATTACA"),
        ])
        .unwrap()
    }

    fn expected(genome: &NucleotideSequences, rows: &[GenomicRangeEmptyRecord]) -> Vec<String> {
        rows.iter()
            .map(|row| {
                genome
                    .get_sequence(&row.seqname)
                    .unwrap()
                    .slice_clamped(row.start, row.end)
                    .normalized()
            })
            .collect()
    }

    /// Fails to open on rayon worker threads, but not on the caller's thread.
    struct WorkerHostileOpener<'a>(&'a NucleotideSequences);

    impl<'a> SourceOpener for WorkerHostileOpener<'a> {
        type Source = &'a NucleotideSequences;

        fn open(&self) -> Result<Self::Source, TfBinsError> {
            if rayon::current_thread_index().is_some() {
                return Err(TfBinsError::MissingSequence("worker genome".to_string()));
            }
            Ok(self.0)
        }
    }

    /// Panics while fetching on rayon worker threads.
    struct PanickingSource<'a>(&'a NucleotideSequences);

    impl<'a> SequenceSource for PanickingSource<'a> {
        fn fetch(
            &mut self,
            seqname: &str,
            start: Position,
            end: Position,
        ) -> Result<Nucleotides, TfBinsError> {
            if rayon::current_thread_index().is_some() {
                panic!("worker lost its genome handle");
            }
            let mut genome = self.0;
            genome.fetch(seqname, start, end)
        }
    }

    struct PanickingOpener<'a>(&'a NucleotideSequences);

    impl<'a> SourceOpener for PanickingOpener<'a> {
        type Source = PanickingSource<'a>;

        fn open(&self) -> Result<Self::Source, TfBinsError> {
            Ok(PanickingSource(self.0))
        }
    }

    /// Counts how many sources have been opened.
    struct CountingOpener<'a> {
        genome: &'a NucleotideSequences,
        opened: AtomicUsize,
    }

    impl<'a> SourceOpener for CountingOpener<'a> {
        type Source = &'a NucleotideSequences;

        fn open(&self) -> Result<Self::Source, TfBinsError> {
            self.opened.fetch_add(1, Ordering::SeqCst);
            Ok(self.genome)
        }
    }

    /// Fails with an I/O error when read from rayon worker threads.
    struct FlakySource<'a>(&'a NucleotideSequences);

    impl<'a> SequenceSource for FlakySource<'a> {
        fn fetch(
            &mut self,
            seqname: &str,
            start: Position,
            end: Position,
        ) -> Result<Nucleotides, TfBinsError> {
            if rayon::current_thread_index().is_some() {
                return Err(std::io::Error::new(
                    std::io::ErrorKind::UnexpectedEof,
                    "truncated read",
                )
                .into());
            }
            let mut genome = self.0;
            genome.fetch(seqname, start, end)
        }
    }

    struct FlakyOpener<'a>(&'a NucleotideSequences);

    impl<'a> SourceOpener for FlakyOpener<'a> {
        type Source = FlakySource<'a>;

        fn open(&self) -> Result<Self::Source, TfBinsError> {
            Ok(FlakySource(self.0))
        }
    }

    #[test]
    fn test_parallel_opens_once_per_worker() {
        let genome = test_genome();
        let rows = random_intervals(&genome.seqlens(), 20_000);
        for num_workers in [1, 3, 4] {
            let opener = CountingOpener {
                genome: &genome,
                opened: AtomicUsize::new(0),
            };
            let extractor = SequenceExtractor::new(opener, quiet(num_workers, 20_000));
            let sequences = extractor.extract_parallel(&rows).unwrap();
            assert_eq!(sequences, expected(&genome, &rows));
            let opened = extractor.opener.opened.load(Ordering::SeqCst);
            assert!((1..=num_workers).contains(&opened), "{} opens", opened);
        }
    }

    #[test]
    fn test_parallel_fewer_rows_than_workers() {
        let genome = test_genome();
        let rows = random_intervals(&genome.seqlens(), 3);
        let extractor = SequenceExtractor::new(&genome, quiet(8, 10));
        assert_eq!(
            extractor.extract_parallel(&rows).unwrap(),
            expected(&genome, &rows)
        );
        let none: Vec<GenomicRangeEmptyRecord> = Vec::new();
        assert!(extractor.extract_parallel(&none).unwrap().is_empty());
    }

    #[test]
    fn test_worker_io_error_falls_back() {
        let genome = test_genome();
        let rows = random_intervals(&genome.seqlens(), 30);
        let extractor = SequenceExtractor::new(FlakyOpener(&genome), quiet(2, 30));
        let failure = extractor.extract_parallel(&rows).unwrap_err();
        assert!(matches!(failure, ParallelFailure::WorkerIo(ref msg) if msg.contains("truncated")));
        assert!(failure.is_environmental());

        let extraction = extractor.extract(&rows).unwrap();
        assert_eq!(extraction.sequences, expected(&genome, &rows));
        assert_eq!(extraction.fallback_chunks, vec![0]);
    }

    #[test]
    fn test_parallel_preserves_order() {
        let genome = test_genome();
        let rows = random_intervals(&genome.seqlens(), 500);
        let extractor = SequenceExtractor::new(&genome, quiet(4, 37));

        let expected = expected(&genome, &rows);
        assert_eq!(extractor.extract_sequential(&rows).unwrap(), expected);
        assert_eq!(extractor.extract_parallel(&rows).unwrap(), expected);

        let extraction = extractor.extract(&rows).unwrap();
        assert_eq!(extraction.sequences, expected);
        assert!(extraction.fallback_chunks.is_empty());
    }

    #[test]
    fn test_parallel_indexed_genome() {
        let dir = tempfile::tempdir().unwrap();
        let chr1 = random_sequence(1000);
        let chr2 = random_sequence(333);
        let fasta = write_indexed_fasta(dir.path(), &[("chr1", chr1.as_str()), ("chr2", chr2.as_str())]);
        let in_memory = NucleotideSequences::from_pairs([("chr1", chr1.as_str()), ("chr2", chr2.as_str())])
                .unwrap();

        let rows = random_intervals(&in_memory.seqlens(), 300);
        let extractor = SequenceExtractor::new(GenomeOpener::new(&fasta), quiet(3, 64));
        let extraction = extractor.extract(&rows).unwrap();
        assert_eq!(extraction.sequences, expected(&in_memory, &rows));
        assert!(extraction.fallback_chunks.is_empty());
    }

    #[test]
    fn test_normalized_output() {
        let genome = test_genome();
        let rows = vec![
            GenomicRangeEmptyRecord::new_empty("chr1", 0, 16),
            GenomicRangeEmptyRecord::new_empty("chr2", 0, 8),
        ];
        let extractor = SequenceExtractor::new(&genome, quiet(2, 1));
        let sequences = extractor.extract(&rows).unwrap().sequences;
        assert_eq!(sequences, vec!["ACGTACGTNNNNNNNN", "GGGGCCCC"]);
        for seq in sequences {
            assert!(!seq.contains(|c: char| c.is_ascii_lowercase() || c == 'R' || c == 'Y'));
        }
    }

    #[test]
    fn test_zero_workers_falls_back() {
        let genome = test_genome();
        let rows = random_intervals(&genome.seqlens(), 25);
        let extractor = SequenceExtractor::new(&genome, quiet(0, 10));
        assert!(matches!(
            extractor.extract_parallel(&rows),
            Err(ParallelFailure::PoolStart(_))
        ));

        let extraction = extractor.extract(&rows).unwrap();
        assert_eq!(extraction.sequences, expected(&genome, &rows));
        assert_eq!(extraction.fallback_chunks, vec![0, 1, 2]);
    }

    #[test]
    fn test_worker_open_failure_falls_back() {
        let genome = test_genome();
        let rows = random_intervals(&genome.seqlens(), 40);
        let extractor = SequenceExtractor::new(WorkerHostileOpener(&genome), quiet(2, 15));
        assert!(matches!(
            extractor.extract_parallel(&rows),
            Err(ParallelFailure::WorkerInit(_))
        ));

        let extraction = extractor.extract(&rows).unwrap();
        assert_eq!(extraction.sequences, expected(&genome, &rows));
        assert_eq!(extraction.fallback_chunks, vec![0, 1, 2]);
    }

    #[test]
    fn test_worker_panic_falls_back() {
        let genome = test_genome();
        let rows = random_intervals(&genome.seqlens(), 20);
        let extractor = SequenceExtractor::new(PanickingOpener(&genome), quiet(2, 20));
        let failure = extractor.extract_parallel(&rows).unwrap_err();
        assert!(matches!(failure, ParallelFailure::WorkerPanic(ref msg) if msg.contains("genome handle")));
        assert!(failure.is_environmental());

        let extraction = extractor.extract(&rows).unwrap();
        assert_eq!(extraction.sequences, expected(&genome, &rows));
        assert_eq!(extraction.fallback_chunks, vec![0]);
    }

    #[test]
    fn test_row_errors_are_not_retried() {
        let genome = test_genome();
        let rows = vec![
            GenomicRangeEmptyRecord::new_empty("chr1", 0, 10),
            GenomicRangeEmptyRecord::new_empty("chrUn", 0, 10),
        ];
        let extractor = SequenceExtractor::new(&genome, quiet(2, 10));
        let failure = extractor.extract_parallel(&rows).unwrap_err();
        assert!(!failure.is_environmental());
        assert!(matches!(
            extractor.extract(&rows),
            Err(TfBinsError::MissingSequence(name)) if name == "chrUn"
        ));
    }

    #[test]
    fn test_sequential_only() {
        let genome = test_genome();
        let rows = random_intervals(&genome.seqlens(), 30);
        let options = ExtractOptions {
            use_parallel: false,
            ..quiet(0, 7)
        };
        let extraction = SequenceExtractor::new(&genome, options).extract(&rows).unwrap();
        assert_eq!(extraction.sequences, expected(&genome, &rows));
        assert!(extraction.fallback_chunks.is_empty());
    }

    #[test]
    fn test_empty_and_zero_chunk_size() {
        let genome = test_genome();
        let extractor = SequenceExtractor::new(&genome, quiet(2, 10));
        let rows: Vec<GenomicRangeEmptyRecord> = Vec::new();
        assert_eq!(extractor.extract(&rows).unwrap(), Extraction::default());

        let extractor = SequenceExtractor::new(&genome, quiet(2, 0));
        assert!(matches!(
            extractor.extract(&rows),
            Err(TfBinsError::ZeroChunkSize)
        ));
    }

    #[test]
    fn test_attach() {
        let genome = test_genome();
        let rows = vec![
            LabeledBin::new("chr2", 16, 23, Label::Positive),
            LabeledBin::new("chr1", 28, 32, Label::Negative),
        ];
        let table = SequenceExtractor::new(&genome, quiet(2, 1)).attach(rows).unwrap();
        let lines: Vec<_> = table.rows.iter().map(|row| row.to_tsv()).collect();
        assert_eq!(lines, vec!["chr2\t16\t23\t1\tGATTACA", "chr1\t28\t32\t0\tTTTT"]);
    }
}
