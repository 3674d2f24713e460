//! Tiling the genome into fixed-width bins.

use log::{debug, info};
use std::fs;
use std::path::{Path, PathBuf};

use crate::{
    error::TfBinsError,
    genome::genome_sizes,
    granges::GenomicRanges,
    io::Bed3Iterator,
    ranges::vec::VecRangesEmpty,
    BIN_WIDTH, GENOME_BINS_FILENAME,
};

/// The path of the genome bins BED file inside `out_folder`.
pub fn genome_bins_path(out_folder: impl AsRef<Path>) -> PathBuf {
    out_folder.as_ref().join(GENOME_BINS_FILENAME)
}

/// Tile every autosome in the FASTA index into contiguous [`BIN_WIDTH`] bins,
/// dropping the trailing partial bin of each chromosome, and write them to
/// `<out_folder>/genome_bins.bed`.
///
/// The output folder is created if needed. An existing bins file is always
/// overwritten; use [`load_or_make_bins()`] to reuse one.
pub fn make_genome_bins(
    fai_path: impl AsRef<Path>,
    out_folder: impl AsRef<Path>,
) -> Result<GenomicRanges<VecRangesEmpty>, TfBinsError> {
    let seqlens = genome_sizes(fai_path)?;
    debug!("tiling {} autosomes into {} bp bins", seqlens.len(), BIN_WIDTH);
    let bins = GenomicRanges::from_windows(&seqlens, BIN_WIDTH, None, true)?;

    fs::create_dir_all(out_folder.as_ref())?;
    let out_path = genome_bins_path(out_folder);
    bins.to_tsv(Some(&out_path))?;

    info!("Bins generated: {} bins written to {}", bins.len(), out_path.display());
    Ok(bins)
}

/// Read a genome bins BED file back into memory, keeping the file order.
pub fn read_genome_bins(
    bins_path: impl Into<PathBuf>,
) -> Result<GenomicRanges<VecRangesEmpty>, TfBinsError> {
    GenomicRanges::from_iter(Bed3Iterator::new(bins_path)?)
}

/// Load `<out_folder>/genome_bins.bed` if it exists, or create it with
/// [`make_genome_bins()`] otherwise.
pub fn load_or_make_bins(
    fai_path: impl AsRef<Path>,
    out_folder: impl AsRef<Path>,
) -> Result<GenomicRanges<VecRangesEmpty>, TfBinsError> {
    let bins_path = genome_bins_path(&out_folder);
    if bins_path.exists() {
        info!("Using existing bins file {}", bins_path.display());
        read_genome_bins(bins_path)
    } else {
        make_genome_bins(fai_path, out_folder)
    }
}
