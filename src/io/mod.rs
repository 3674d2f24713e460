//! Types and methods for reading and parsing input and writing output.

pub mod file;
pub mod parsers;
pub mod tsv;

pub use file::{read_seqlens, InputFile, OutputFile};
pub use parsers::{build_tsv_reader, Bed3Iterator};
pub use tsv::{read_labeled_bins, write_labeled_bins, write_sequenced_tsv};
