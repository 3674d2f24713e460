//! Input/Output file handling with [`InputFile`] and [`OutputFile`].
//!
//! These types abstract over reading/writing both plaintext and gzip-compressed
//! input/output.

use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use indexmap::IndexMap;
use std::fs::File;
use std::io::Write;
use std::io::{self, BufWriter};
use std::io::{BufRead, BufReader, Read};
use std::path::PathBuf;

use crate::error::TfBinsError;
use crate::Position;

/// Read a tab-delimited *genome file* of sequence (i.e. chromosome) names and their
/// lengths, such as a FASTA index (`.fai`). Only the first two columns are used.
pub fn read_seqlens(
    filepath: impl Into<PathBuf>,
) -> Result<IndexMap<String, Position>, TfBinsError> {
    let input_file = InputFile::new(filepath);
    let reader = input_file.reader()?;

    let mut seqlens = IndexMap::new();
    for result in reader.lines() {
        let line = result?;
        if line.trim().is_empty() {
            continue;
        }
        let mut columns = line.split('\t');
        // split() always yields at least one item
        let seqname = columns.next().unwrap_or_default();
        let length: Position = columns
            .next()
            .ok_or_else(|| {
                TfBinsError::InvalidGenomeFile(format!(
                    "sequence '{}' has no length column",
                    seqname
                ))
            })?
            .trim()
            .parse()?;
        if seqlens.contains_key(seqname) {
            return Err(TfBinsError::InvalidGenomeFile(format!(
                "sequence '{}' is duplicated",
                seqname
            )));
        }
        seqlens.insert(seqname.to_string(), length);
    }
    Ok(seqlens)
}

/// Check if a file is a gzipped by looking for the magic numbers.
///
/// Files shorter than two bytes (e.g. empty files) are not gzipped.
pub fn is_gzipped_file(file_path: impl Into<PathBuf>) -> io::Result<bool> {
    let file = File::open(file_path.into())?;
    let mut buffer = Vec::with_capacity(2);
    file.take(2).read_to_end(&mut buffer)?;
    Ok(buffer == [0x1f, 0x8b])
}

/// Represents an input file.
///
/// This struct is used to handle operations on an input file, such as reading from the file.
/// This abstracts how data is read in, allowing for both plaintext and gzip-compressed input
/// to be read through a common interface.
#[derive(Clone, Debug)]
pub struct InputFile {
    pub filepath: PathBuf,
}

impl InputFile {
    /// Constructs a new `InputFile`.
    ///
    /// # Arguments
    ///
    /// * `filepath` - A string slice that holds the path to the file. If the file is
    /// gzip-compressed, `InputFile` will automatically uncompress the input.
    pub fn new(filepath: impl Into<PathBuf>) -> Self {
        Self {
            filepath: filepath.into(),
        }
    }

    /// Opens the file and returns a reader over the (possibly decompressed) stream.
    pub fn stream(&self) -> io::Result<Box<dyn Read>> {
        let file = File::open(&self.filepath)?;
        let is_gzipped = is_gzipped_file(&self.filepath)?;
        let stream: Box<dyn Read> = if is_gzipped {
            Box::new(GzDecoder::new(file))
        } else {
            Box::new(file)
        };
        Ok(stream)
    }

    /// Opens the file and returns a buffered reader.
    ///
    /// If the file is gzip-compressed (detected by its magic number), this method will
    /// automatically handle the decompression.
    pub fn reader(&self) -> io::Result<BufReader<Box<dyn Read>>> {
        Ok(BufReader::new(self.stream()?))
    }
}

enum OutputDestination {
    File(PathBuf),
    Stdout,
}

/// Represents an output file.
///
/// This struct is used to handle operations on an output file, such as writing to the file.
/// This abstracts writing both plaintext and gzip-compressed files.
pub struct OutputFile {
    destination: OutputDestination,
    pub header: Option<Vec<String>>,
}

impl OutputFile {
    /// Constructs a new `OutputFile`.
    ///
    /// # Arguments
    ///
    /// * `filepath` - A string slice that holds the path to the file. If the file extension is
    /// `.gz`, `OutputFile` will automatically write gzip-compressed output.
    /// * `header` - An optional vector of strings representing commented header lines to be written to the file.
    pub fn new(filepath: impl Into<PathBuf>, header: Option<Vec<String>>) -> Self {
        Self {
            destination: OutputDestination::File(filepath.into()),
            header,
        }
    }

    /// Constructs a new [`OutputFile`] for standard output.
    pub fn new_stdout(header: Option<Vec<String>>) -> Self {
        Self {
            destination: OutputDestination::Stdout,
            header,
        }
    }

    /// Opens the file and returns a writer.
    ///
    /// If the file path ends with ".gz", the file is treated as gzip-compressed, and the
    /// function will handle compression automatically. If a header is set, it will be written
    /// to the file.
    pub fn writer(&self) -> io::Result<Box<dyn Write>> {
        let mut writer: Box<dyn Write> = match &self.destination {
            OutputDestination::File(path) => {
                let is_gzip = path.extension().map_or(false, |ext| ext == "gz");
                if is_gzip {
                    Box::new(BufWriter::new(GzEncoder::new(
                        File::create(path)?,
                        Compression::default(),
                    )))
                } else {
                    Box::new(BufWriter::new(File::create(path)?))
                }
            }
            OutputDestination::Stdout => Box::new(BufWriter::new(io::stdout())),
        };
        // write header if one is set
        if let Some(entries) = &self.header {
            for entry in entries {
                writeln!(writer, "#{}", entry)?;
            }
        }
        Ok(writer)
    }
}

#[cfg(test)]
mod tests {
    use super::{is_gzipped_file, read_seqlens, InputFile, OutputFile};
    use crate::prelude::*;
    use std::io::{Read, Write};

    #[test]
    fn test_read_seqlens() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("genome.fa.fai");
        std::fs::write(&path, "chr1\t650\t6\t60\t61\nchr2\t400\t700\t60\t61\n").unwrap();
        let seqlens = read_seqlens(&path).unwrap();
        assert_eq!(seqlens, seqlens!("chr1" => 650, "chr2" => 400));
    }

    #[test]
    fn test_read_seqlens_duplicate() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("genome.tsv");
        std::fs::write(&path, "chr1\t650\nchr1\t400\n").unwrap();
        assert!(matches!(
            read_seqlens(&path),
            Err(TfBinsError::InvalidGenomeFile(_))
        ));
    }

    #[test]
    fn test_read_seqlens_missing_length() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("genome.tsv");
        std::fs::write(&path, "chr1\n").unwrap();
        assert!(matches!(
            read_seqlens(&path),
            Err(TfBinsError::InvalidGenomeFile(_))
        ));
    }

    #[test]
    fn test_gzip_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.tsv.gz");
        {
            let mut writer = OutputFile::new(&path, None).writer().unwrap();
            writeln!(writer, "chr1\t0\t200").unwrap();
        }
        assert!(is_gzipped_file(&path).unwrap());
        let mut contents = String::new();
        InputFile::new(&path)
            .reader()
            .unwrap()
            .read_to_string(&mut contents)
            .unwrap();
        assert_eq!(contents, "chr1\t0\t200\n");
    }

    #[test]
    fn test_empty_file_not_gzipped() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.bed");
        std::fs::write(&path, "").unwrap();
        assert!(!is_gzipped_file(&path).unwrap());
    }
}
