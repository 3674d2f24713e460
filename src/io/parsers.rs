//! BED3 parsing iterators.
//!
//! Under the hood, this uses the [`csv`] crate. Only the first three columns of a
//! BED file (sequence name, start, and end) are parsed; any remaining columns (e.g.
//! the score and signal columns of a narrowPeak file) are ignored.

use csv::{Reader, ReaderBuilder, StringRecord, StringRecordsIntoIter};
use std::io::Read;
use std::path::PathBuf;

use crate::error::TfBinsError;
use crate::io::file::InputFile;
use crate::ranges::GenomicRangeEmptyRecord;
use crate::Position;

/// BED header lines that are not comments, but are not ranges either.
const BED_HEADER_PREFIXES: [&str; 2] = ["track", "browser"];

/// Build a TSV reader which ignores comment lines, works on gzip-compressed
/// files, and tolerates ragged rows.
pub fn build_tsv_reader(
    filepath: impl Into<PathBuf>,
    has_headers: bool,
) -> Result<Reader<Box<dyn Read>>, TfBinsError> {
    let stream = InputFile::new(filepath).stream()?;
    let reader = ReaderBuilder::new()
        .delimiter(b'\t')
        .has_headers(has_headers)
        .flexible(true)
        .comment(Some(b'#'))
        .from_reader(stream);
    Ok(reader)
}

/// Parse a single column, returning a [`TfBinsError::InvalidColumnType`] that
/// includes the full line on failure.
pub fn parse_column<T: std::str::FromStr>(column: &str, line: &str) -> Result<T, TfBinsError>
where
    <T as std::str::FromStr>::Err: std::fmt::Debug,
{
    column
        .trim()
        .parse::<T>()
        .map_err(|_| TfBinsError::InvalidColumnType(format!("column '{}' in '{}'", column, line)))
}

/// Parse the first three columns of a BED record.
fn parse_bed3(record: &StringRecord) -> Result<GenomicRangeEmptyRecord, TfBinsError> {
    let line = || record.iter().collect::<Vec<_>>().join("\t");
    if record.len() < 3 {
        return Err(TfBinsError::BedlikeTooFewColumns(line()));
    }
    let seqname = record[0].to_string();
    let start: Position = parse_column(&record[1], &line())?;
    let end: Position = parse_column(&record[2], &line())?;
    Ok(GenomicRangeEmptyRecord::new_empty(seqname, start, end))
}

/// An iterator over BED3 entries (which just contain ranges no data).
pub struct Bed3Iterator {
    inner: StringRecordsIntoIter<Box<dyn Read>>,
}

impl std::fmt::Debug for Bed3Iterator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Bed3Iterator").finish_non_exhaustive()
    }
}

impl Bed3Iterator {
    /// Creates a parsing iterator over a (possibly gzip-compressed) BED file.
    pub fn new(filepath: impl Into<PathBuf>) -> Result<Self, TfBinsError> {
        let reader = build_tsv_reader(filepath, false)?;
        Ok(Self {
            inner: reader.into_records(),
        })
    }
}

impl Iterator for Bed3Iterator {
    type Item = Result<GenomicRangeEmptyRecord, TfBinsError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let record = match self.inner.next()? {
                Ok(record) => record,
                Err(e) => return Some(Err(e.into())),
            };
            let first = record.get(0).unwrap_or("");
            let is_header = BED_HEADER_PREFIXES
                .iter()
                .any(|prefix| first.starts_with(prefix));
            if is_header || (record.len() == 1 && first.trim().is_empty()) {
                continue;
            }
            return Some(parse_bed3(&record));
        }
    }
}
