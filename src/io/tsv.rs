//! TSV serializing helpers for the labeled and sequence-augmented tables.
//!
//! Unlike BED files, these tables have a header row, so column order is
//! checked by name when reading.

use csv::WriterBuilder;
use std::io::Write;
use std::path::PathBuf;

use crate::{
    error::TfBinsError,
    io::{file::OutputFile, parsers::build_tsv_reader},
    labels::LabeledBin,
    traits::TsvSerialize,
};

/// The header of the labeled dataset TSV.
pub const LABELED_COLUMNS: [&str; 4] = ["Chromosome", "Start", "End", "label"];

/// The header of a BED3 table once it has a header, e.g. when sequences are attached.
pub const BED3_COLUMNS: [&str; 3] = ["Chromosome", "Start", "End"];

/// The name of the column holding the extracted sequence.
pub const SEQUENCE_COLUMN: &str = "seq";

/// Write a labeled dataset as a TSV with header, in the row order given.
///
/// The header is written even if there are no rows.
pub fn write_labeled_bins(
    filepath: impl Into<PathBuf>,
    bins: &[LabeledBin],
) -> Result<(), TfBinsError> {
    let output = OutputFile::new(filepath, None).writer()?;
    let mut writer = WriterBuilder::new()
        .delimiter(b'\t')
        .has_headers(false)
        .from_writer(output);
    writer.write_record(LABELED_COLUMNS)?;
    for bin in bins {
        writer.serialize(bin)?;
    }
    writer.flush()?;
    Ok(())
}

/// Read a labeled dataset TSV (as written by [`write_labeled_bins()`]) back
/// into memory, in file order.
pub fn read_labeled_bins(filepath: impl Into<PathBuf>) -> Result<Vec<LabeledBin>, TfBinsError> {
    let mut reader = build_tsv_reader(filepath, true)?;
    let headers = reader.headers()?.clone();
    for column in LABELED_COLUMNS {
        if !headers.iter().any(|header| header == column) {
            return Err(TfBinsError::MissingColumn(column.to_string()));
        }
    }
    let mut bins = Vec::new();
    for result in reader.deserialize() {
        let bin: LabeledBin = result?;
        bins.push(bin);
    }
    Ok(bins)
}

/// Write TSV-serializable rows under the given column header, to a file or
/// to standard output if `output` is `None`.
pub fn write_sequenced_tsv<T: TsvSerialize>(
    output: Option<impl Into<PathBuf>>,
    columns: &[&str],
    rows: &[T],
) -> Result<(), TfBinsError> {
    let output = output.map_or(OutputFile::new_stdout(None), |file| {
        OutputFile::new(file, None)
    });
    let mut writer = output.writer()?;
    writeln!(writer, "{}", columns.join("\t"))?;
    for row in rows {
        writeln!(writer, "{}", row.to_tsv())?;
    }
    writer.flush()?;
    Ok(())
}
