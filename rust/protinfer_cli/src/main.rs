mod cli;
mod config;
mod errors;
mod processing;

use clap::Parser;
use protinfer::{
    Compiler,
    run_analysis,
};
use tracing::info;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

use cli::Cli;
use config::Config;

fn main() -> std::result::Result<(), errors::CliError> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .from_env_lossy(),
        ) // This uses RUST_LOG environment variable
        .init();

    let args = Cli::parse();

    let config = match &args.config {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };
    let config = config.with_cli_args(&args)?;
    let output_config = match config.output {
        Some(ref x) => x.clone(),
        None => {
            return Err(errors::CliError::Config {
                source: "No output directory provided".to_string(),
            });
        }
    };
    info!("Parsed configuration: {:#?}", config.clone());

    std::fs::create_dir_all(&output_config.directory).map_err(|e| errors::CliError::Io {
        source: e.to_string(),
        path: Some(output_config.directory.to_string_lossy().to_string()),
    })?;

    let mut compiler = Compiler::new();
    let ingest = processing::load_inputs(&mut compiler, &config.inputs)?;
    let report = run_analysis(&mut compiler, &config.analysis)?;

    processing::write_outputs(
        &compiler,
        &config.analysis,
        &ingest,
        &report,
        &output_config,
        args.full_output,
    )?;

    let passing = report
        .proteins
        .iter()
        .filter(|p| !p.is_decoy())
        .filter(|p| {
            p.q_value()
                .is_some_and(|q| q <= config.analysis.protein.fdr_threshold)
        })
        .count();
    println!(
        "Reported {} proteins, {} targets at q <= {}",
        report.proteins.len(),
        passing,
        config.analysis.protein.fdr_threshold
    );
    Ok(())
}
