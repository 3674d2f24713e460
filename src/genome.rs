//! Reading chromosome lengths from a FASTA index.

use indexmap::IndexMap;
use std::path::Path;

use crate::{error::TfBinsError, io::read_seqlens, Position};

/// The number of autosomes kept from the genome index (`chr1` through `chr22`).
pub const NUM_AUTOSOMES: u8 = 22;

/// Return whether a sequence name is a human autosome, i.e. matches
/// `^chr([1-9]|1[0-9]|2[0-2])$`.
///
/// Sex chromosomes, the mitochondrial genome, unplaced and alternate contigs, and
/// zero-padded names like `chr01` are all rejected.
pub fn is_autosome(seqname: &str) -> bool {
    let Some(number) = seqname.strip_prefix("chr") else {
        return false;
    };
    if number.is_empty() || number.starts_with('0') || !number.bytes().all(|b| b.is_ascii_digit())
    {
        return false;
    }
    number
        .parse::<u8>()
        .map_or(false, |n| (1..=NUM_AUTOSOMES).contains(&n))
}

/// Read the autosome lengths from a FASTA index (`.fai`) file.
///
/// The returned map is in the order of the index file.
///
/// # Errors
/// Returns [`TfBinsError::MissingFaiFile`] if `fai_path` does not exist, and a
/// parsing error if the index is malformed.
pub fn genome_sizes(fai_path: impl AsRef<Path>) -> Result<IndexMap<String, Position>, TfBinsError> {
    let fai_path = fai_path.as_ref();
    if !fai_path.exists() {
        return Err(TfBinsError::MissingFaiFile(fai_path.to_path_buf()));
    }
    let mut seqlens = read_seqlens(fai_path)?;
    seqlens.retain(|seqname, _| is_autosome(seqname));
    Ok(seqlens)
}
