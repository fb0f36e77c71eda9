use super::config::{
    InputConfig,
    OutputConfig,
};
use crate::errors::CliError;
use csv::WriterBuilder;
use indicatif::{
    ProgressBar,
    ProgressIterator,
    ProgressStyle,
};
use protinfer::errors::CompilerError;
use protinfer::fdr::{
    FdrSummary,
    FileFdrSummary,
};
use protinfer::{
    AnalysisConfig,
    AnalysisReport,
    Compiler,
    IngestSummary,
    InputSource,
    PsmRecord,
    ReportProtein,
    ingest_sources,
};
use serde::Serialize;
use std::fs::File;
use std::io::{
    BufRead,
    BufReader,
};
use std::path::Path;
use std::time::Instant;
use tracing::{
    debug,
    info,
};

fn parse_line(
    line: std::io::Result<String>,
    line_no: usize,
) -> Option<Result<PsmRecord, CompilerError>> {
    let line = match line {
        Ok(x) => x,
        Err(e) => {
            return Some(Err(CompilerError::MalformedRecord {
                reason: "unreadable line",
                context: format!("line {}: {}", line_no, e),
            }));
        }
    };
    if line.trim().is_empty() {
        return None;
    }
    Some(
        serde_json::from_str::<PsmRecord>(&line).map_err(|e| CompilerError::MalformedRecord {
            reason: "unparsable record",
            context: format!("line {}: {}", line_no, e),
        }),
    )
}

/// Lazily reads one PSM record per line, blank lines are skipped.
fn read_records(
    path: &Path,
) -> Result<impl Iterator<Item = Result<PsmRecord, CompilerError>> + Send, CliError> {
    let file = File::open(path).map_err(|e| CliError::Io {
        source: e.to_string(),
        path: Some(path.to_string_lossy().to_string()),
    })?;
    Ok(BufReader::new(file)
        .lines()
        .enumerate()
        .filter_map(|(i, line)| parse_line(line, i + 1)))
}

pub fn load_inputs(
    compiler: &mut Compiler,
    inputs: &[InputConfig],
) -> Result<IngestSummary, CliError> {
    let start = Instant::now();
    let template = "{spinner:.green} [{elapsed_precise}] {pos} records ({per_sec})";
    let style =
        ProgressStyle::with_template(template).unwrap_or_else(|_| ProgressStyle::default_spinner());
    let bar = ProgressBar::new_spinner().with_style(style);

    let mut sources = Vec::with_capacity(inputs.len());
    for input in inputs {
        info!("Reading {} from {:?}", input.display_name(), input.path);
        let records = read_records(&input.path)?.progress_with(bar.clone());
        sources.push(InputSource::new(input.display_name(), &input.file_type, records));
    }

    let summary = ingest_sources(compiler, sources)?;
    bar.finish_and_clear();
    info!(
        "Loaded {} PSMs ({} rejected) from {} files in {:?}",
        summary.accepted,
        summary.rejected,
        inputs.len(),
        start.elapsed()
    );
    Ok(summary)
}

/// One row of the protein table. Sub-set proteins are listed by accession only.
#[derive(Debug, Serialize)]
struct ProteinRow {
    group: usize,
    accessions: String,
    score: f64,
    decoy: bool,
    fdr: Option<f64>,
    q_value: Option<f64>,
    nr_peptides: usize,
    nr_unique_peptides: usize,
    nr_psms: usize,
    nr_spectra: usize,
    peptides: String,
    subsets: String,
}

impl ProteinRow {
    fn new(compiler: &Compiler, protein: &ReportProtein) -> Self {
        let peptides: Vec<&str> = protein
            .peptides()
            .iter()
            .map(|&pep| compiler.peptide(pep).sequence())
            .collect();
        let subsets: Vec<String> = protein.subsets().iter().map(|s| s.accession_label()).collect();
        Self {
            group: protein.group().index(),
            accessions: protein.accession_label(),
            score: protein.score(),
            decoy: protein.is_decoy(),
            fdr: protein.fdr(),
            q_value: protein.q_value(),
            nr_peptides: protein.nr_peptides(),
            nr_unique_peptides: protein.nr_unique_peptides(),
            nr_psms: protein.nr_psms(),
            nr_spectra: protein.nr_spectra(),
            peptides: peptides.join(";"),
            subsets: subsets.join(";"),
        }
    }
}

#[derive(Debug, Serialize)]
struct RunSummary<'a> {
    analysis: &'a AnalysisConfig,
    accepted_records: usize,
    rejected_records: usize,
    nr_groups: usize,
    nr_proteins: usize,
    psm_fdr: &'a [FileFdrSummary],
    psm_set_fdr: Option<FdrSummary>,
    protein_fdr: FdrSummary,
    warnings: &'a [String],
}

fn write_protein_table(
    compiler: &Compiler,
    proteins: &[ReportProtein],
    path: &Path,
) -> Result<(), CliError> {
    let start = Instant::now();
    let mut writer = WriterBuilder::default().has_headers(true).from_path(path)?;
    for protein in proteins {
        writer.serialize(ProteinRow::new(compiler, protein))?;
    }
    writer.flush().map_err(|e| CliError::Io {
        source: e.to_string(),
        path: Some(path.to_string_lossy().to_string()),
    })?;
    debug!("Writing {:?} took {:?}", path, start.elapsed());
    Ok(())
}

fn write_json<T: Serialize>(value: &T, path: &Path) -> Result<(), CliError> {
    let file = File::create(path).map_err(|e| CliError::Io {
        source: e.to_string(),
        path: Some(path.to_string_lossy().to_string()),
    })?;
    serde_json::to_writer_pretty(file, value)?;
    Ok(())
}

pub fn write_outputs(
    compiler: &Compiler,
    config: &AnalysisConfig,
    ingest: &IngestSummary,
    report: &AnalysisReport,
    output: &OutputConfig,
    full_output: bool,
) -> Result<(), CliError> {
    let proteins_path = output.directory.join("proteins.csv");
    write_protein_table(compiler, &report.proteins, &proteins_path)?;

    let summary = RunSummary {
        analysis: config,
        accepted_records: ingest.accepted,
        rejected_records: report.rejected_records,
        nr_groups: compiler.groups().len(),
        nr_proteins: report.proteins.len(),
        psm_fdr: &report.psm_fdr,
        psm_set_fdr: report.psm_set_fdr,
        protein_fdr: report.protein_fdr,
        warnings: &report.warnings,
    };
    write_json(&summary, &output.directory.join("summary.json"))?;

    if full_output {
        write_json(report, &output.directory.join("report.json"))?;
    }
    info!("Wrote results to {:?}", output.directory);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_line() {
        let line = serde_json::json!({
            "sequence": "PEPTIDEK",
            "charge": 2,
            "precursor_mz": 464.7,
            "spectrum_ref": "scan=1",
            "accessions": [{"accession": "P1"}],
            "scores": [{"kind": "mascot_score", "value": 31.5}]
        })
        .to_string();
        let record = parse_line(Ok(line), 1).unwrap().unwrap();
        let mut compiler = Compiler::new();
        let file = compiler.insert_file("run1", "ndjson").unwrap();
        compiler.add_psm(file, record).unwrap();
        assert_eq!(compiler.accessions()[0].name(), "P1");

        assert!(parse_line(Ok("   ".to_string()), 2).is_none());
        let bad = parse_line(Ok("{not json".to_string()), 3).unwrap();
        assert!(matches!(bad, Err(CompilerError::MalformedRecord { .. })));
    }
}
