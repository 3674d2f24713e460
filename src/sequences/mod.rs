//! Reference nucleotide sequence access.
//!
//! Sequences are read through the [`SequenceSource`] trait, which has two implementations:
//!
//!  - [`IndexedGenome`]: region queries against an indexed FASTA file on disk (`.fa` with
//!    its `.fa.fai`), through [`noodles::fasta`]. This is what extraction workers use; each
//!    worker opens its own through a [`GenomeOpener`].
//!
//!  - [`NucleotideSequences`]: a whole genome held in memory.
//!
//! [`SequenceSource`]: crate::traits::SequenceSource
//! [`IndexedGenome`]: crate::sequences::nucleotide::IndexedGenome
//! [`GenomeOpener`]: crate::sequences::nucleotide::GenomeOpener
//! [`NucleotideSequences`]: crate::sequences::nucleotide::NucleotideSequences

pub mod nucleotide;

pub use nucleotide::{fetch_normalized, normalize_bases};
