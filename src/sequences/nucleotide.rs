//! Types and methods for working with per-basepair nucleotide sequence data.
//!
//! Currently this requires the [`noodles::fasta`] module, but their API is unstable
//! and may be a source of future pain.

use bytes::Bytes;
use genomap::GenomeMap;
use indexmap::IndexMap;
use noodles::core::{Position as NoodlesPosition, Region};
use noodles::fasta::indexed_reader;
use noodles::fasta::{io::BufReadSeek, reader, record::Sequence, IndexedReader};
use std::fmt;
use std::ops::Deref;
use std::path::PathBuf;
use std::str;

use crate::error::TfBinsError;
use crate::traits::{SequenceSource, SourceOpener};
use crate::Position;

/// A newtype around raw nucleotide [`Bytes`], for making it more
/// display and other operations more convenient.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Nucleotides(Bytes);

impl fmt::Display for Nucleotides {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match str::from_utf8(&self.0) {
            Ok(s) => write!(f, "{}", s),
            Err(_) => Err(fmt::Error),
        }
    }
}

impl Deref for Nucleotides {
    type Target = Bytes;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl From<&Sequence> for Nucleotides {
    fn from(sequence: &Sequence) -> Self {
        let seq = Bytes::from(sequence.as_ref().to_vec());
        Nucleotides(seq)
    }
}

impl From<String> for Nucleotides {
    fn from(s: String) -> Self {
        let bytes = Bytes::from(s.into_bytes());
        Nucleotides(bytes)
    }
}

impl<'a> From<&'a str> for Nucleotides {
    fn from(s: &'a str) -> Self {
        let bytes = Bytes::from(s.as_bytes().to_vec());
        Nucleotides(bytes)
    }
}

impl Nucleotides {
    /// Get the length of the nucleotide sequence.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Return whether this is an empty object.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Get the subsequence `[start, end)`, clamped to the sequence length. This is
    /// cheap, as [`Bytes`] slices share the underlying buffer.
    pub fn slice_clamped(&self, start: Position, end: Position) -> Nucleotides {
        let end = (end as usize).min(self.len());
        let start = (start as usize).min(end);
        Nucleotides(self.0.slice(start..end))
    }

    /// Upper-case these nucleotides and mask `R` and `Y` as `N`, see [`normalize_bases()`].
    pub fn normalized(&self) -> String {
        normalize_bases(&self.0)
    }
}

/// Normalize raw FASTA bases: upper-case everything, then replace the purine (`R`)
/// and pyrimidine (`Y`) ambiguity codes with `N`. Other IUPAC codes are kept.
pub fn normalize_bases(seq: &[u8]) -> String {
    seq.iter()
        .map(|base| match base.to_ascii_uppercase() {
            b'R' | b'Y' => 'N',
            base => char::from(base),
        })
        .collect()
}

/// Fetch the region `[start, end)` of `seqname` from a [`SequenceSource`], and
/// normalize it with [`normalize_bases()`].
pub fn fetch_normalized<S: SequenceSource>(
    source: &mut S,
    seqname: &str,
    start: Position,
    end: Position,
) -> Result<String, TfBinsError> {
    Ok(source.fetch(seqname, start, end)?.normalized())
}

/// An open indexed FASTA file, for querying regions without loading whole
/// sequences into memory.
///
/// The reader holds a file handle and is not shared between threads; use a
/// [`GenomeOpener`] to give each worker its own.
pub struct IndexedGenome {
    seqlens: IndexMap<String, Position>,
    reader: IndexedReader<Box<dyn BufReadSeek>>,
}

impl fmt::Debug for IndexedGenome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IndexedGenome")
            .field("seqlens", &self.seqlens)
            .finish_non_exhaustive()
    }
}

impl IndexedGenome {
    /// Open an indexed FASTA file. The index must be next to it, at `<filepath>.fai`.
    pub fn open(filepath: impl Into<PathBuf>) -> Result<Self, TfBinsError> {
        let filepath = filepath.into();
        let reader = indexed_reader::Builder::default().build_from_path(filepath)?;

        let mut seqlens = IndexMap::new();
        for record in reader.index().iter() {
            let name = String::from_utf8(record.name().to_vec())?;
            #[allow(clippy::useless_conversion)] // the length type differs between noodles versions
            let length: Position = record
                .length()
                .try_into()
                .map_err(|_| {
                    TfBinsError::InvalidGenomeFile(format!("sequence '{}' is too long", name))
                })?;
            seqlens.insert(name, length);
        }
        Ok(Self { seqlens, reader })
    }

    /// Get an [`IndexMap`] of the sequence names and their lengths.
    pub fn seqlens(&self) -> &IndexMap<String, Position> {
        &self.seqlens
    }
}

impl SequenceSource for IndexedGenome {
    fn fetch(
        &mut self,
        seqname: &str,
        start: Position,
        end: Position,
    ) -> Result<Nucleotides, TfBinsError> {
        let length = *self
            .seqlens
            .get(seqname)
            .ok_or_else(|| TfBinsError::MissingSequence(seqname.to_string()))?;
        let end = end.min(length);
        if start >= end {
            return Ok(Nucleotides::default());
        }

        // noodles regions are 1-based and right-inclusive
        let invalid = || TfBinsError::InvalidGenomicRange(start, end);
        let region_start = NoodlesPosition::new(start as usize + 1).ok_or_else(invalid)?;
        let region_end = NoodlesPosition::new(end as usize).ok_or_else(invalid)?;
        let region = Region::new(seqname.as_bytes().to_vec(), region_start..=region_end);

        let record = self.reader.query(&region)?;
        Ok(record.sequence().into())
    }
}

/// Opens [`IndexedGenome`] handles on an indexed FASTA file. Only the path is
/// held, so this can be shared freely between threads.
#[derive(Clone, Debug, PartialEq)]
pub struct GenomeOpener {
    pub filepath: PathBuf,
}

impl GenomeOpener {
    pub fn new(filepath: impl Into<PathBuf>) -> Self {
        Self {
            filepath: filepath.into(),
        }
    }
}

impl SourceOpener for GenomeOpener {
    type Source = IndexedGenome;

    fn open(&self) -> Result<Self::Source, TfBinsError> {
        IndexedGenome::open(&self.filepath)
    }
}

/// [`NucleotideSequences`] for storing a whole genome's nucleotide sequence
/// data in-memory.
#[derive(Clone, Debug)]
pub struct NucleotideSequences {
    data: GenomeMap<Nucleotides>,
}

impl NucleotideSequences {
    /// Load an entire FASTA file into memory, into a [`NucleotideSequences`] object.
    pub fn from_fasta(filepath: impl Into<PathBuf>) -> Result<Self, TfBinsError> {
        let mut reader = reader::Builder.build_from_path(filepath.into())?;
        let mut data = GenomeMap::new();
        for result in reader.records() {
            let record = result?;
            let name = String::from_utf8(record.definition().name().to_vec())?;
            data.insert(&name, record.sequence().into())?;
        }
        Ok(Self { data })
    }

    /// Build a [`NucleotideSequences`] from `(name, sequence)` pairs.
    pub fn from_pairs<'a>(
        pairs: impl IntoIterator<Item = (&'a str, &'a str)>,
    ) -> Result<Self, TfBinsError> {
        let mut data = GenomeMap::new();
        for (name, seq) in pairs {
            data.insert(name, Nucleotides::from(seq))?;
        }
        Ok(Self { data })
    }

    /// Retrieve an [`IndexMap`] of the sequence names and their lengths.
    pub fn seqlens(&self) -> IndexMap<String, Position> {
        self.data
            .iter()
            .map(|(k, v)| (k.clone(), v.len() as Position))
            .collect()
    }

    /// Retrieve the [`Nucleotides`] for a particular sequence name.
    pub fn get_sequence(&self, seqname: &str) -> Result<&Nucleotides, TfBinsError> {
        self.data
            .get(seqname)
            .ok_or_else(|| TfBinsError::MissingSequence(seqname.to_string()))
    }
}

impl SequenceSource for NucleotideSequences {
    fn fetch(
        &mut self,
        seqname: &str,
        start: Position,
        end: Position,
    ) -> Result<Nucleotides, TfBinsError> {
        Ok(self.get_sequence(seqname)?.slice_clamped(start, end))
    }
}

impl<'a> SequenceSource for &'a NucleotideSequences {
    fn fetch(
        &mut self,
        seqname: &str,
        start: Position,
        end: Position,
    ) -> Result<Nucleotides, TfBinsError> {
        Ok(self.get_sequence(seqname)?.slice_clamped(start, end))
    }
}

/// Every "opened" handle on an in-memory genome is just a shared reference.
impl<'a> SourceOpener for &'a NucleotideSequences {
    type Source = &'a NucleotideSequences;

    fn open(&self) -> Result<Self::Source, TfBinsError> {
        Ok(*self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utilities::write_indexed_fasta;

    // wraps over three lines of the FASTA
    const CHR1: &str = "ACGTACGTACacgtacgtacNNNNNRRYYTTGGCCAAGGTTCCAAGGTTCCAATTGGCCAATTGGCCAAGGTTACGTACGTACGTACGTACGTACGTACGTACGTACGTACGTACGTACGTACGTACGTAC";
    const CHR2: &str = "ggggccccaaaattttrykm";

    #[test]
    fn test_normalize_bases() {
        assert_eq!(normalize_bases(b"acgtnACGTN"), "ACGTNACGTN");
        assert_eq!(normalize_bases(b"RrYyNn"), "NNNNNN");
        // other IUPAC codes are only upper-cased
        assert_eq!(normalize_bases(b"kmswbdhv"), "KMSWBDHV");
        assert_eq!(normalize_bases(b""), "");
    }

    #[test]
    fn test_indexed_genome_fetch() {
        let dir = tempfile::tempdir().unwrap();
        let fasta = write_indexed_fasta(dir.path(), &[("chr1", CHR1), ("chr2", CHR2)]);
        let mut genome = IndexedGenome::open(&fasta).unwrap();
        assert_eq!(genome.seqlens().get("chr1"), Some(&(CHR1.len() as Position)));
        assert_eq!(genome.seqlens().get("chr2"), Some(&20));

        let seq = genome.fetch("chr1", 0, 10).unwrap();
        assert_eq!(seq, Nucleotides::from("ACGTACGTAC"));

        // across line boundaries
        let seq = genome.fetch("chr1", 55, 125).unwrap();
        assert_eq!(seq.to_string(), &CHR1[55..125]);

        let seq = genome.fetch("chr2", 12, 20).unwrap();
        assert_eq!(seq.to_string(), "ttttrykm");
    }

    #[test]
    fn test_indexed_genome_clamps_and_empty() {
        let dir = tempfile::tempdir().unwrap();
        let fasta = write_indexed_fasta(dir.path(), &[("chr2", CHR2)]);
        let mut genome = IndexedGenome::open(&fasta).unwrap();
        assert_eq!(genome.fetch("chr2", 16, 1000).unwrap().to_string(), "rykm");
        assert!(genome.fetch("chr2", 20, 40).unwrap().is_empty());
        assert!(genome.fetch("chr2", 5, 5).unwrap().is_empty());
    }

    #[test]
    fn test_indexed_genome_unknown_sequence() {
        let dir = tempfile::tempdir().unwrap();
        let fasta = write_indexed_fasta(dir.path(), &[("chr2", CHR2)]);
        let mut genome = GenomeOpener::new(&fasta).open().unwrap();
        assert!(matches!(
            genome.fetch("chr7", 0, 10),
            Err(TfBinsError::MissingSequence(name)) if name == "chr7"
        ));
    }

    #[test]
    fn test_open_missing_genome() {
        let dir = tempfile::tempdir().unwrap();
        let opener = GenomeOpener::new(dir.path().join("missing.fa"));
        assert!(matches!(opener.open(), Err(TfBinsError::IOError(_))));
    }

    #[test]
    fn test_fetch_normalized() {
        let dir = tempfile::tempdir().unwrap();
        let fasta = write_indexed_fasta(dir.path(), &[("chr1", CHR1), ("chr2", CHR2)]);
        let mut genome = IndexedGenome::open(&fasta).unwrap();
        assert_eq!(
            fetch_normalized(&mut genome, "chr1", 10, 30).unwrap(),
            "ACGTACGTACNNNNNNNNNT"
        );
        assert_eq!(
            fetch_normalized(&mut genome, "chr2", 0, 20).unwrap(),
            "GGGGCCCCAAAATTTTNNKM"
        );
    }

    #[test]
    fn test_in_memory_matches_indexed() {
        let dir = tempfile::tempdir().unwrap();
        let pairs = [("chr1", CHR1), ("chr2", CHR2)];
        let fasta = write_indexed_fasta(dir.path(), &pairs);
        let mut indexed = IndexedGenome::open(&fasta).unwrap();
        let from_file = NucleotideSequences::from_fasta(&fasta).unwrap();
        let mut in_memory = NucleotideSequences::from_pairs(pairs).unwrap();
        assert_eq!(from_file.seqlens(), in_memory.seqlens());
        let opener = &from_file;
        let mut shared = opener.open().unwrap();

        for (seqname, start, end) in [("chr1", 0, 130), ("chr1", 61, 62), ("chr2", 3, 500)] {
            let expected = indexed.fetch(seqname, start, end).unwrap();
            assert_eq!(in_memory.fetch(seqname, start, end).unwrap(), expected);
            assert_eq!(shared.fetch(seqname, start, end).unwrap(), expected);
        }
    }
}
