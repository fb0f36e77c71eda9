use clap::Parser;
use protinfer::InferenceMethod;
use protinfer::fdr::DecoyStrategy;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to the JSON configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// NDJSON file of PSM records, one per input file (will over-write the config file)
    #[arg(short, long)]
    pub input: Vec<PathBuf>,

    /// Path to the output directory
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,

    /// Protein inference method: report_all or spectrum_extractor
    #[arg(short, long)]
    pub method: Option<InferenceMethod>,

    /// Decoy strategy for PSMs and proteins: search-engine or accession-pattern:<regex>
    #[arg(short, long)]
    pub decoy_strategy: Option<DecoyStrategy>,

    /// Protein level FDR threshold
    #[arg(long)]
    pub fdr_threshold: Option<f64>,

    /// Also write the complete report, with all handles, as JSON
    #[arg(short, long)]
    pub full_output: bool,
}
