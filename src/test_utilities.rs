//! Test cases and test utility functions.
//!

use rand::{seq::SliceRandom, thread_rng, Rng};
use std::fs;
use std::path::{Path, PathBuf};

use indexmap::IndexMap;

use crate::{
    granges::GenomicRanges,
    ranges::{vec::VecRangesEmpty, GenomicRangeEmptyRecord},
    Position,
};

/// Line width of test FASTA files, as written by most tools.
pub const FASTA_LINE_BASES: usize = 60;

/// The nucleotide alphabet of random test sequences, with some soft-masked bases and
/// the ambiguity codes that get normalized.
const RANDOM_BASES: &[u8] = b"ACGTACGTACGTacgtNRY";

/// Build a random range start/end on a sequence of `chrom_len`, 0-indexed and right
/// exclusive. Ends may run up to 10 bp past the sequence end, and starts may lie past it.
pub fn random_range(chrom_len: Position) -> (Position, Position) {
    let mut rng = thread_rng();
    let start = rng.gen_range(0..=chrom_len + 5);
    let end = rng.gen_range(start..=chrom_len + 10);
    (start, end)
}

/// Build `n` random intervals over the sequences in `seqlens`.
pub fn random_intervals(
    seqlens: &IndexMap<String, Position>,
    n: usize,
) -> Vec<GenomicRangeEmptyRecord> {
    let mut rng = thread_rng();
    let seqnames: Vec<_> = seqlens.keys().collect();
    (0..n)
        .map(|_| {
            let seqname = seqnames.choose(&mut rng).expect("seqlens is empty");
            let (start, end) = random_range(seqlens[seqname.as_str()]);
            GenomicRangeEmptyRecord::new_empty(seqname.as_str(), start, end)
        })
        .collect()
}

/// Build a random nucleotide sequence.
pub fn random_sequence(len: usize) -> String {
    let mut rng = thread_rng();
    (0..len)
        .map(|_| char::from(*RANDOM_BASES.choose(&mut rng).expect("alphabet is empty")))
        .collect()
}

/// Write a FASTA index (`genome.fa.fai`) into `dir`, for sequences that are not
/// actually written.
pub fn write_fai(dir: &Path, seqlens: &[(&str, Position)]) -> PathBuf {
    let path = dir.join("genome.fa.fai");
    let mut offset = 0;
    let mut contents = String::new();
    for (seqname, length) in seqlens {
        contents.push_str(&format!("{}\t{}\t{}\t60\t61\n", seqname, length, offset));
        offset += *length as usize + 100;
    }
    fs::write(&path, contents).expect("could not write test FASTA index");
    path
}

/// Write a line-wrapped FASTA file (`genome.fa`) into `dir`, with its index next to it.
pub fn write_indexed_fasta(dir: &Path, sequences: &[(&str, &str)]) -> PathBuf {
    let path = dir.join("genome.fa");
    let mut fasta = String::new();
    let mut index = String::new();
    for (seqname, seq) in sequences {
        fasta.push_str(&format!(">{}\n", seqname));
        let offset = fasta.len();
        for line in seq.as_bytes().chunks(FASTA_LINE_BASES) {
            fasta.push_str(std::str::from_utf8(line).expect("sequence is not ASCII"));
            fasta.push('\n');
        }
        index.push_str(&format!(
            "{}\t{}\t{}\t{}\t{}\n",
            seqname,
            seq.len(),
            offset,
            FASTA_LINE_BASES,
            FASTA_LINE_BASES + 1
        ));
    }
    fs::write(&path, fasta).expect("could not write test FASTA");
    fs::write(dir.join("genome.fa.fai"), index).expect("could not write test FASTA index");
    path
}

/// Write a headerless BED3 file.
pub fn write_bed(dir: &Path, filename: &str, ranges: &[(&str, Position, Position)]) -> PathBuf {
    let path = dir.join(filename);
    let contents: String = ranges
        .iter()
        .map(|(seqname, start, end)| format!("{}\t{}\t{}\n", seqname, start, end))
        .collect();
    fs::write(&path, contents).expect("could not write test BED file");
    path
}

/// Write the three peak files of transcription factor `tf` in the standard layout under
/// `peaks_dir`, i.e. `<tf>-bed/<tf>-bed_{combined,1,2}.bed`.
pub fn write_peaks(
    peaks_dir: &Path,
    tf: &str,
    combined: &[(&str, Position, Position)],
    replicate_1: &[(&str, Position, Position)],
    replicate_2: &[(&str, Position, Position)],
) -> PathBuf {
    let tf_dir = peaks_dir.join(format!("{}-bed", tf));
    fs::create_dir_all(&tf_dir).expect("could not create test peaks directory");
    for (suffix, peaks) in [("combined", combined), ("1", replicate_1), ("2", replicate_2)] {
        write_bed(&tf_dir, &format!("{}-bed_{}.bed", tf, suffix), peaks);
    }
    tf_dir
}

/// Range test case #1.
///
/// Ranges:
///   - chr1:
///     (0, 5), (4, 7), (10, 17)
///   - chr2:
///     (10, 20), (18, 32)
pub fn granges_test_case_01() -> GenomicRanges<VecRangesEmpty> {
    let mut gr = GenomicRanges::new_empty();
    for (seqname, start, end) in [
        ("chr1", 0, 5),
        ("chr1", 4, 7),
        ("chr1", 10, 17),
        ("chr2", 10, 20),
        ("chr2", 18, 32),
    ] {
        gr.push_range(seqname, start, end)
            .expect("invalid test range");
    }
    gr
}
