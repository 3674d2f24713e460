//! The `tfbins` command line subcommands, as library functions.

use log::info;
use std::path::{Path, PathBuf};

use crate::{
    bins::make_genome_bins,
    extract::{ExtractOptions, SequenceExtractor, SequencedTable},
    io::{
        tsv::{BED3_COLUMNS, LABELED_COLUMNS, SEQUENCE_COLUMN},
        write_sequenced_tsv,
    },
    labels::{create_labeled_data_with_peaks, LabelingOutcome, PeakFiles},
    prelude::*,
    reporting::{CommandOutput, Report},
    traits::TsvSerialize,
};

/// The kinds of interval table `tfbins extract` can read.
#[derive(Clone, Debug, PartialEq)]
pub enum IntervalTableFile {
    /// A headerless BED file; only the first three columns are used.
    Bed3(PathBuf),
    /// A labeled dataset TSV with a header, as written by `tfbins labels`.
    Labeled(PathBuf),
}

impl IntervalTableFile {
    /// Detect the table kind from the file name: `.bed` and `.bed.gz` files are BED,
    /// anything else is a labeled TSV.
    pub fn detect(filepath: impl Into<PathBuf>) -> Self {
        let filepath = filepath.into();
        let name = filepath
            .file_name()
            .map(|name| name.to_string_lossy().to_lowercase())
            .unwrap_or_default();
        if name.ends_with(".bed") || name.ends_with(".bed.gz") {
            IntervalTableFile::Bed3(filepath)
        } else {
            IntervalTableFile::Labeled(filepath)
        }
    }
}

/// Tile the genome into bins, always (re)writing `<out_folder>/genome_bins.bed`.
pub fn tfbins_bins(fai: &Path, out_folder: &Path) -> Result<CommandOutput<usize>, TfBinsError> {
    let bins = make_genome_bins(fai, out_folder)?;
    let mut report = Report::new();
    if bins.is_empty() {
        report.add_issue(format!(
            "no bins were made: {} has no autosomes of at least {} bp",
            fai.display(),
            crate::BIN_WIDTH
        ));
    }
    Ok(CommandOutput::new(bins.len(), report))
}

/// Build (or reuse) the labeled dataset for transcription factor `tf`.
pub fn tfbins_labels(
    tf: &str,
    fai: &Path,
    out_folder: &Path,
    peaks_dir: &Path,
) -> Result<CommandOutput<LabelingOutcome>, TfBinsError> {
    let peak_files = PeakFiles::for_tf(tf, peaks_dir);
    let outcome = create_labeled_data_with_peaks(tf, fai, out_folder, &peak_files)?;

    let mut report = Report::new();
    match &outcome {
        LabelingOutcome::Created { summary, .. } if summary.ambiguous > 0 => {
            report.add_issue(format!(
                "{} bins overlapped only replicate peaks and were excluded as ambiguous",
                summary.ambiguous
            ));
        }
        LabelingOutcome::AlreadyExists(path) => {
            report.add_issue(format!(
                "{} already exists and was not rebuilt; delete it to relabel",
                path.display()
            ));
        }
        _ => {}
    }
    Ok(CommandOutput::new(outcome, report))
}

fn write_table<R: TsvSerialize>(
    table: &SequencedTable<R>,
    input_columns: &[&str],
    output: Option<&PathBuf>,
    report: &mut Report,
) -> Result<usize, TfBinsError> {
    let mut columns = input_columns.to_vec();
    columns.push(SEQUENCE_COLUMN);
    write_sequenced_tsv(output, &columns, &table.rows)?;

    if !table.fallback_chunks.is_empty() {
        report.add_issue(format!(
            "{} chunk(s) fell back to sequential extraction: {:?}",
            table.fallback_chunks.len(),
            table.fallback_chunks
        ));
    }
    Ok(table.rows.len())
}

/// Attach reference sequences to every row of a BED or labeled table, and write the
/// result as a TSV with the input columns followed by `seq` (to standard output if
/// `output` is `None`).
pub fn tfbins_extract(
    genome: &Path,
    input: &Path,
    output: Option<&PathBuf>,
    options: ExtractOptions,
) -> Result<CommandOutput<usize>, TfBinsError> {
    let extractor = SequenceExtractor::new(GenomeOpener::new(genome), options);
    let mut report = Report::new();

    let num_rows = match IntervalTableFile::detect(input) {
        IntervalTableFile::Bed3(path) => {
            let rows = Bed3Iterator::new(path)?.collect::<Result<Vec<_>, _>>()?;
            info!("Extracting sequences for {} BED intervals", rows.len());
            let table = extractor.attach(rows)?;
            write_table(&table, &BED3_COLUMNS, output, &mut report)?
        }
        IntervalTableFile::Labeled(path) => {
            let rows = read_labeled_bins(path)?;
            info!("Extracting sequences for {} labeled bins", rows.len());
            let table = extractor.attach(rows)?;
            write_table(&table, &LABELED_COLUMNS, output, &mut report)?
        }
    };
    Ok(CommandOutput::new(num_rows, report))
}
