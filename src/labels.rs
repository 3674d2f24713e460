//! Labeling genome bins against transcription-factor ChIP-seq peaks.
//!
//! Every bin is classified against three peak sets: two replicates and a combined
//! (consensus) set.
//!
//!  - [`BinClass::Positive`]: the bin overlaps the combined peaks (label 1).
//!  - [`BinClass::Negative`]: the bin overlaps none of the three peak sets (label 0).
//!  - [`BinClass::Ambiguous`]: the bin overlaps a replicate but not the combined
//!    peaks. These are excluded from the labeled dataset.

use log::{debug, info};
use rand::{rngs::StdRng, seq::SliceRandom, SeedableRng};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::{
    bins::load_or_make_bins,
    error::TfBinsError,
    granges::GenomicRanges,
    io::{write_labeled_bins, Bed3Iterator},
    ranges::{coitrees::COITrees, vec::VecRangesEmpty, GenomicRangeEmptyRecord},
    traits::{GenericRange, GenomicInterval, TsvSerialize},
    Position, LABEL_SEED,
};

/// A binary training label.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum Label {
    Negative,
    Positive,
}

impl From<Label> for u8 {
    fn from(label: Label) -> Self {
        match label {
            Label::Negative => 0,
            Label::Positive => 1,
        }
    }
}

impl TryFrom<u8> for Label {
    type Error = TfBinsError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Label::Negative),
            1 => Ok(Label::Positive),
            _ => Err(TfBinsError::InvalidLabel(value)),
        }
    }
}

impl std::fmt::Display for Label {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", u8::from(*self))
    }
}

/// The three-way classification of a bin against a set of peaks.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BinClass {
    Positive,
    Ambiguous,
    Negative,
}

impl BinClass {
    /// Classify a bin from whether it overlaps the combined peaks and each replicate.
    pub fn from_overlaps(combined: bool, replicate_1: bool, replicate_2: bool) -> Self {
        if combined {
            BinClass::Positive
        } else if replicate_1 || replicate_2 {
            BinClass::Ambiguous
        } else {
            BinClass::Negative
        }
    }

    /// The training label for this class; `None` for ambiguous bins.
    pub fn label(&self) -> Option<Label> {
        match self {
            BinClass::Positive => Some(Label::Positive),
            BinClass::Negative => Some(Label::Negative),
            BinClass::Ambiguous => None,
        }
    }
}

/// A genome bin with its training label, i.e. one row of the labeled dataset.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LabeledBin {
    #[serde(rename = "Chromosome")]
    pub seqname: String,
    #[serde(rename = "Start")]
    pub start: Position,
    #[serde(rename = "End")]
    pub end: Position,
    pub label: Label,
}

impl LabeledBin {
    pub fn new(seqname: impl Into<String>, start: Position, end: Position, label: Label) -> Self {
        Self {
            seqname: seqname.into(),
            start,
            end,
            label,
        }
    }
}

impl GenericRange for LabeledBin {
    fn start(&self) -> Position {
        self.start
    }
    fn end(&self) -> Position {
        self.end
    }
}

impl GenomicInterval for LabeledBin {
    fn seqname(&self) -> &str {
        &self.seqname
    }
}

impl TsvSerialize for LabeledBin {
    fn to_tsv(&self) -> String {
        format!(
            "{}\t{}\t{}\t{}",
            self.seqname, self.start, self.end, self.label
        )
    }
}

/// The paths of the three peak files for one transcription factor.
#[derive(Clone, Debug, PartialEq)]
pub struct PeakFiles {
    pub combined: PathBuf,
    pub replicate_1: PathBuf,
    pub replicate_2: PathBuf,
}

impl PeakFiles {
    /// The standard layout of peak files for transcription factor `tf`, under `peaks_dir`:
    /// `<tf>-bed/<tf>-bed_combined.bed`, `<tf>-bed/<tf>-bed_1.bed`, and `<tf>-bed/<tf>-bed_2.bed`.
    pub fn for_tf(tf: &str, peaks_dir: impl AsRef<Path>) -> Self {
        let tf_dir = peaks_dir.as_ref().join(format!("{}-bed", tf));
        let peak_file = |suffix: &str| tf_dir.join(format!("{}-bed_{}.bed", tf, suffix));
        Self {
            combined: peak_file("combined"),
            replicate_1: peak_file("1"),
            replicate_2: peak_file("2"),
        }
    }
}

/// Read a peak BED file into an overlap-queryable [`GenomicRanges<COITrees>`].
pub fn read_peaks(filepath: impl Into<PathBuf>) -> Result<GenomicRanges<COITrees>, TfBinsError> {
    let filepath = filepath.into();
    let peaks = GenomicRanges::from_iter(Bed3Iterator::new(&filepath)?)?;
    debug!("read {} peaks from {}", peaks.len(), filepath.display());
    peaks.into_coitrees()
}

/// The three peak sets of one transcription factor, ready for overlap queries.
#[derive(Debug)]
pub struct PeakSets {
    pub combined: GenomicRanges<COITrees>,
    pub replicate_1: GenomicRanges<COITrees>,
    pub replicate_2: GenomicRanges<COITrees>,
}

impl PeakSets {
    /// Load all three peak files. Any missing or malformed file is an error.
    pub fn from_files(files: &PeakFiles) -> Result<Self, TfBinsError> {
        Ok(Self {
            combined: read_peaks(&files.combined)?,
            replicate_1: read_peaks(&files.replicate_1)?,
            replicate_2: read_peaks(&files.replicate_2)?,
        })
    }

    /// Classify a single bin.
    pub fn classify(&self, seqname: &str, start: Position, end: Position) -> BinClass {
        BinClass::from_overlaps(
            self.combined.has_overlaps(seqname, start, end),
            self.replicate_1.has_overlaps(seqname, start, end),
            self.replicate_2.has_overlaps(seqname, start, end),
        )
    }

    /// Classify every bin, in bin order.
    pub fn classify_bins(
        &self,
        bins: &GenomicRanges<VecRangesEmpty>,
    ) -> Vec<(GenomicRangeEmptyRecord, BinClass)> {
        bins.iter_records()
            .map(|bin| {
                let class = self.classify(&bin.seqname, bin.start, bin.end);
                (bin, class)
            })
            .collect()
    }
}

/// Counts of each bin class from a labeling run.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LabelSummary {
    pub positive: usize,
    pub negative: usize,
    pub ambiguous: usize,
}

impl LabelSummary {
    fn add(&mut self, class: BinClass) {
        match class {
            BinClass::Positive => self.positive += 1,
            BinClass::Negative => self.negative += 1,
            BinClass::Ambiguous => self.ambiguous += 1,
        }
    }
}

/// Turn classified bins into the labeled dataset: positives first, then negatives
/// (each in bin order), with ambiguous bins dropped. The dataset is *not* shuffled.
pub fn labeled_bins(classified: Vec<(GenomicRangeEmptyRecord, BinClass)>) -> (Vec<LabeledBin>, LabelSummary) {
    let mut summary = LabelSummary::default();
    let mut positives = Vec::new();
    let mut negatives = Vec::new();
    for (bin, class) in classified {
        summary.add(class);
        let Some(label) = class.label() else {
            continue;
        };
        let row = LabeledBin::new(bin.seqname, bin.start, bin.end, label);
        match label {
            Label::Positive => positives.push(row),
            Label::Negative => negatives.push(row),
        }
    }
    positives.append(&mut negatives);
    (positives, summary)
}

/// Shuffle rows with a fixed seed, so a labeled dataset is reproducible.
pub fn shuffle_rows<T>(rows: &mut [T], seed: u64) {
    let mut rng = StdRng::seed_from_u64(seed);
    rows.shuffle(&mut rng);
}

/// The path of the labeled dataset for transcription factor `tf` inside `out_folder`.
pub fn labels_path(tf: &str, out_folder: impl AsRef<Path>) -> PathBuf {
    out_folder.as_ref().join(format!("{}_labels.tsv", tf))
}

/// The result of [`create_labeled_data()`].
#[derive(Clone, Debug, PartialEq)]
pub enum LabelingOutcome {
    /// The labeled dataset was built and written to `path`.
    Created { path: PathBuf, summary: LabelSummary },
    /// A labeled dataset already existed at this path and was left untouched.
    AlreadyExists(PathBuf),
}

/// Build the labeled dataset for transcription factor `tf`, with peak files read
/// from the standard layout relative to the working directory (see [`PeakFiles::for_tf()`]).
///
/// This is build-or-skip: the genome bins are loaded from `<out_folder>/genome_bins.bed`
/// (or created from `fai_path`), and if `<out_folder>/<tf>_labels.tsv` already exists,
/// nothing else is done.
pub fn create_labeled_data(
    tf: &str,
    fai_path: impl AsRef<Path>,
    out_folder: impl AsRef<Path>,
) -> Result<LabelingOutcome, TfBinsError> {
    let peaks = PeakFiles::for_tf(tf, ".");
    create_labeled_data_with_peaks(tf, fai_path, out_folder, &peaks)
}

/// Like [`create_labeled_data()`], but with explicit peak file paths.
pub fn create_labeled_data_with_peaks(
    tf: &str,
    fai_path: impl AsRef<Path>,
    out_folder: impl AsRef<Path>,
    peak_files: &PeakFiles,
) -> Result<LabelingOutcome, TfBinsError> {
    let bins = load_or_make_bins(fai_path, &out_folder)?;

    let label_path = labels_path(tf, &out_folder);
    if label_path.exists() {
        info!("{} labeled file already exists, skipping...", tf);
        return Ok(LabelingOutcome::AlreadyExists(label_path));
    }

    let peaks = PeakSets::from_files(peak_files)?;
    let (mut labeled, summary) = labeled_bins(peaks.classify_bins(&bins));
    shuffle_rows(&mut labeled, LABEL_SEED);
    write_labeled_bins(&label_path, &labeled)?;

    info!(
        "Labels generated: {} positive, {} negative, {} ambiguous bins excluded",
        summary.positive, summary.negative, summary.ambiguous
    );
    Ok(LabelingOutcome::Created {
        path: label_path,
        summary,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utilities::write_bed;

    #[test]
    fn test_bin_class_from_overlaps() {
        // (combined, rep1, rep2)
        let cases = [
            ((true, false, false), BinClass::Positive),
            ((true, true, true), BinClass::Positive),
            ((false, true, false), BinClass::Ambiguous),
            ((false, false, true), BinClass::Ambiguous),
            ((false, true, true), BinClass::Ambiguous),
            ((false, false, false), BinClass::Negative),
        ];
        for ((combined, rep1, rep2), expected) in cases {
            assert_eq!(BinClass::from_overlaps(combined, rep1, rep2), expected);
        }
        assert_eq!(BinClass::Ambiguous.label(), None);
        assert_eq!(BinClass::Positive.label(), Some(Label::Positive));
        assert_eq!(BinClass::Negative.label(), Some(Label::Negative));
    }

    #[test]
    fn test_label_conversions() {
        assert_eq!(u8::from(Label::Positive), 1);
        assert_eq!(u8::from(Label::Negative), 0);
        assert_eq!(Label::try_from(1).unwrap(), Label::Positive);
        assert!(matches!(
            Label::try_from(3),
            Err(TfBinsError::InvalidLabel(3))
        ));
        assert_eq!(Label::Positive.to_string(), "1");
    }

    #[test]
    fn test_peak_files_layout() {
        let files = PeakFiles::for_tf("CTCF", "peaks");
        assert_eq!(files.combined, PathBuf::from("peaks/CTCF-bed/CTCF-bed_combined.bed"));
        assert_eq!(files.replicate_1, PathBuf::from("peaks/CTCF-bed/CTCF-bed_1.bed"));
        assert_eq!(files.replicate_2, PathBuf::from("peaks/CTCF-bed/CTCF-bed_2.bed"));
    }

    #[test]
    fn test_classify_scenarios() {
        let dir = tempfile::tempdir().unwrap();
        let files = PeakFiles {
            combined: write_bed(dir.path(), "combined.bed", &[("chr1", 50, 150)]),
            replicate_1: write_bed(dir.path(), "rep1.bed", &[("chr1", 1050, 1100)]),
            replicate_2: write_bed(dir.path(), "rep2.bed", &[("chr2", 0, 10)]),
        };
        let peaks = PeakSets::from_files(&files).unwrap();
        assert_eq!(peaks.classify("chr1", 0, 200), BinClass::Positive);
        assert_eq!(peaks.classify("chr1", 1000, 1200), BinClass::Ambiguous);
        assert_eq!(peaks.classify("chr1", 5000, 5200), BinClass::Negative);
        assert_eq!(peaks.classify("chr2", 0, 200), BinClass::Ambiguous);
        assert_eq!(peaks.classify("chr3", 0, 200), BinClass::Negative);
    }

    #[test]
    fn test_missing_peak_file() {
        let dir = tempfile::tempdir().unwrap();
        let files = PeakFiles::for_tf("CTCF", dir.path());
        assert!(matches!(
            PeakSets::from_files(&files),
            Err(TfBinsError::IOError(_))
        ));
    }

    #[test]
    fn test_labeled_bins_excludes_ambiguous() {
        let classified = vec![
            (GenomicRangeEmptyRecord::new_empty("chr1", 0, 200), BinClass::Negative),
            (GenomicRangeEmptyRecord::new_empty("chr1", 200, 400), BinClass::Positive),
            (GenomicRangeEmptyRecord::new_empty("chr1", 400, 600), BinClass::Ambiguous),
            (GenomicRangeEmptyRecord::new_empty("chr1", 600, 800), BinClass::Negative),
        ];
        let (labeled, summary) = labeled_bins(classified);
        assert_eq!(
            summary,
            LabelSummary {
                positive: 1,
                negative: 2,
                ambiguous: 1
            }
        );
        assert_eq!(
            labeled,
            vec![
                LabeledBin::new("chr1", 200, 400, Label::Positive),
                LabeledBin::new("chr1", 0, 200, Label::Negative),
                LabeledBin::new("chr1", 600, 800, Label::Negative),
            ]
        );
    }

    #[test]
    fn test_shuffle_rows_reproducible() {
        let mut a: Vec<usize> = (0..100).collect();
        let mut b: Vec<usize> = (0..100).collect();
        shuffle_rows(&mut a, LABEL_SEED);
        shuffle_rows(&mut b, LABEL_SEED);
        assert_eq!(a, b);
        assert_ne!(a, (0..100).collect::<Vec<_>>());
        let mut sorted = a.clone();
        sorted.sort();
        assert_eq!(sorted, (0..100).collect::<Vec<_>>());
    }
}
