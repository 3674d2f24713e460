use std::path::PathBuf;

use clap::{Parser, Subcommand};
use log::{info, warn, LevelFilter};
use tfbins::{
    commands::{tfbins_bins, tfbins_extract, tfbins_labels},
    prelude::*,
    reporting::Report,
    DEFAULT_CHUNK_SIZE, DEFAULT_GENOME_PATH, DEFAULT_NUM_WORKERS,
};

const INFO: &str = "\
tfbins: labeled genome bins and their sequences for transcription-factor binding models
usage: tfbins [--help] <subcommand>

Subcommands:

  bins: tile the autosomes of a genome into 200 bp bins.
  labels: label bins by overlap with a transcription factor's ChIP-seq peaks.
  extract: attach reference sequences to a table of intervals.

";

#[derive(Parser)]
#[clap(name = "tfbins")]
#[clap(about = INFO)]
struct Cli {
    /// increase logging verbosity (-d for debug, -dd for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    debug: u8,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Tile every autosome into 200 bp bins, (re)writing <out>/genome_bins.bed.
    Bins {
        /// the FASTA index (.fai) of the reference genome
        #[arg(long, required = true)]
        fai: PathBuf,

        /// the output folder
        #[arg(long, required = true)]
        out: PathBuf,
    },
    /// Build <out>/<tf>_labels.tsv, unless it already exists.
    Labels {
        /// the transcription factor name, e.g. CTCF
        #[arg(long, required = true)]
        tf: String,

        /// the FASTA index (.fai) of the reference genome
        #[arg(long, required = true)]
        fai: PathBuf,

        /// the output folder
        #[arg(long, required = true)]
        out: PathBuf,

        /// the folder containing the <tf>-bed/ peak files folder
        #[arg(long, default_value = ".")]
        peaks_dir: PathBuf,
    },
    /// Attach the reference sequence of each interval in a BED or labeled TSV file.
    Extract {
        /// the indexed reference FASTA (its .fai must be next to it)
        #[arg(long, default_value = DEFAULT_GENOME_PATH)]
        genome: PathBuf,

        /// a BED file (.bed or .bed.gz), or a labeled TSV file
        #[arg(long, required = true)]
        input: PathBuf,

        /// an optional output file (standard output will be used if not specified)
        #[arg(long)]
        output: Option<PathBuf>,

        /// number of worker threads
        #[arg(long, default_value_t = DEFAULT_NUM_WORKERS)]
        workers: usize,

        /// number of rows per chunk
        #[arg(long, default_value_t = DEFAULT_CHUNK_SIZE)]
        chunk_size: usize,

        /// do not use the worker pool
        #[arg(long)]
        sequential: bool,

        /// do not show a progress bar
        #[arg(long)]
        no_progress: bool,
    },
}

fn init_logging(debug: u8) {
    let level = match debug {
        0 => LevelFilter::Info,
        1 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();
}

fn log_report(report: &Report) {
    for entry in report.entries() {
        warn!("{}", entry);
    }
}

fn run() -> Result<(), TfBinsError> {
    let cli = Cli::parse();
    init_logging(cli.debug);

    match &cli.command {
        Some(Commands::Bins { fai, out }) => {
            let output = tfbins_bins(fai, out)?;
            log_report(output.report());
        }
        Some(Commands::Labels {
            tf,
            fai,
            out,
            peaks_dir,
        }) => {
            let output = tfbins_labels(tf, fai, out, peaks_dir)?;
            if let LabelingOutcome::Created { path, .. } = output.value() {
                info!("Labeled bins written to {}", path.display());
            }
            log_report(output.report());
        }
        Some(Commands::Extract {
            genome,
            input,
            output,
            workers,
            chunk_size,
            sequential,
            no_progress,
        }) => {
            let options = ExtractOptions {
                num_workers: *workers,
                chunk_size: *chunk_size,
                use_parallel: !*sequential,
                progress: !*no_progress,
            };
            let result = tfbins_extract(genome, input, output.as_ref(), options)?;
            info!("Sequences extracted for {} rows", result.value());
            log_report(result.report());
        }
        None => {
            println!("{}\n", INFO);
            std::process::exit(1);
        }
    }
    Ok(())
}

fn main() {
    match run() {
        Ok(_) => {}
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}
