//! One complete analysis over a filled [`Compiler`]: PSM-level FDR, PSM sets,
//! protein inference and protein-level FDR, in that order.

use crate::compiler::Compiler;
use crate::config::AnalysisConfig;
use crate::errors::{
    ConfigError,
    Result,
};
use crate::fdr::{
    FdrSummary,
    FileFdrSummary,
    compute_combined_fdr,
    compute_protein_fdr,
    compute_psm_fdr,
};
use crate::filter::{
    AnyFilter,
    Filter,
    ItemKind,
    build_filters,
};
use crate::inference::{
    InferenceParams,
    filter_report,
};
use crate::models::ReportProtein;
use serde::Serialize;
use std::collections::BTreeSet;
use std::time::Instant;
use tracing::{
    info,
    warn,
};

#[derive(Debug, Clone, Serialize)]
pub struct AnalysisReport {
    pub proteins: Vec<ReportProtein>,
    pub psm_fdr: Vec<FileFdrSummary>,
    /// Missing when PSM sets are not merged across files.
    pub psm_set_fdr: Option<FdrSummary>,
    pub protein_fdr: FdrSummary,
    pub rejected_records: usize,
    pub warnings: Vec<String>,
}

fn check_score_kinds(
    filters: &[AnyFilter],
    present: &BTreeSet<String>,
    context: &str,
) -> std::result::Result<(), ConfigError> {
    for filter in filters {
        if let Some(kind) = filter.score_kind() {
            if !present.contains(kind) {
                return Err(ConfigError::UnresolvableScoreKind {
                    kind: kind.to_string(),
                    context: format!("{} {}", context, filter.name()),
                });
            }
        }
    }
    Ok(())
}

/// Filters that would drop every item they are applied to.
fn unsupported_filters(filters: &[AnyFilter], kind: ItemKind, context: &str) -> Vec<String> {
    filters
        .iter()
        .filter(|f| !f.supports(kind))
        .map(|f| {
            format!(
                "{} filter '{}' cannot be applied to {:?} items, it removes all of them",
                context, f, kind
            )
        })
        .collect()
}

/// Runs the whole analysis. Builds the groups if that did not happen yet,
/// after this the compiler is closed for inserts.
pub fn run_analysis(compiler: &mut Compiler, config: &AnalysisConfig) -> Result<AnalysisReport> {
    let start = Instant::now();
    let psm_matcher = config.psm.decoy_strategy.compile()?;
    let protein_matcher = config.protein.decoy_strategy.compile()?;
    let inference_filters = build_filters(&config.inference.filters)?;
    let protein_filters = build_filters(&config.protein.filters)?;

    let groups = compiler.build_groups()?.len();
    info!(
        "{} groups from {} accessions, {} peptides and {} PSMs",
        groups,
        compiler.accessions().len(),
        compiler.peptides().len(),
        compiler.psms().len()
    );

    let psm_fdr = compute_psm_fdr(
        compiler,
        &psm_matcher,
        &config.psm.preferred_scores,
        config.psm.fdr_threshold,
    )?;
    let nr_sets = compiler.build_psm_sets(config.psm.create_psm_sets).len();
    info!("Built {} PSM sets", nr_sets);
    let psm_set_fdr = if config.psm.create_psm_sets {
        Some(compute_combined_fdr(
            compiler,
            &psm_matcher,
            config.psm.fdr_threshold,
        ))
    } else {
        None
    };

    if !compiler.psms().is_empty() {
        let present = compiler.score_kinds_present();
        check_score_kinds(&inference_filters, &present, "inference filter")?;
        check_score_kinds(&protein_filters, &present, "protein filter")?;
        let scoring_kind = &config.inference.scoring.score;
        if !present.contains(scoring_kind) {
            return Err(ConfigError::UnresolvableScoreKind {
                kind: scoring_kind.clone(),
                context: "protein scoring".to_string(),
            }
            .into());
        }
    }

    let mut warnings = unsupported_filters(&inference_filters, ItemKind::PsmSet, "Inference");
    warnings.extend(unsupported_filters(
        &protein_filters,
        ItemKind::Protein,
        "Protein",
    ));
    for w in warnings.iter() {
        warn!("{}", w);
    }

    let strategy = config.inference.method.strategy();
    let scoring = config.inference.scoring.strategy();
    info!(
        "Inferring proteins with {} and {} scoring on {}",
        strategy.name(),
        scoring.name(),
        scoring.score_kind()
    );
    let params = InferenceParams {
        filters: &inference_filters,
        scoring: scoring.as_ref(),
        policy: config.inference.scoring.spectra,
        consider_modifications: config.inference.consider_modifications,
    };
    let mut proteins = strategy.infer(compiler, &params)?;

    let protein_fdr = compute_protein_fdr(
        compiler,
        &mut proteins,
        &protein_matcher,
        config.protein.fdr_threshold,
    );
    let inferred = proteins.len();
    let proteins = filter_report(compiler, proteins, &protein_filters);
    info!(
        "Reporting {} of {} inferred proteins, analysis took {:?}",
        proteins.len(),
        inferred,
        start.elapsed()
    );

    Ok(AnalysisReport {
        proteins,
        psm_fdr,
        psm_set_fdr,
        protein_fdr,
        rejected_records: compiler.rejected_records(),
        warnings,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::PsmRecord;
    use crate::errors::ProtInferError;
    use crate::filter::{
        FilterComparator,
        FilterSpec,
        FilterValue,
    };

    #[test]
    fn test_unknown_scoring_kind_is_fatal() {
        let mut compiler = Compiler::new();
        let file = compiler.insert_file("run1", "engine").unwrap();
        compiler
            .add_psm(
                file,
                PsmRecord::new("PEPTIDE", 2, 400.0, "s1")
                    .with_score("mascot_score", 30.0, None)
                    .with_accession("P1"),
            )
            .unwrap();
        let mut config = AnalysisConfig::default();
        config.inference.scoring.score = "comet_xcorr".to_string();
        let out = run_analysis(&mut compiler, &config);
        assert!(matches!(
            out,
            Err(ProtInferError::Config(ConfigError::UnresolvableScoreKind { .. }))
        ));
    }

    #[test]
    fn test_protein_filter_in_inference_list_warns() {
        let mut compiler = Compiler::new();
        let file = compiler.insert_file("run1", "engine").unwrap();
        compiler
            .add_psm(
                file,
                PsmRecord::new("PEPTIDE", 2, 400.0, "s1")
                    .with_score("mascot_score", 30.0, None)
                    .with_accession("P1"),
            )
            .unwrap();
        let mut config = AnalysisConfig::default();
        config.inference.scoring.score = "mascot_score".to_string();
        config.inference.filters.push(FilterSpec::new(
            "nr_peptides_per_protein_filter",
            FilterComparator::GreaterEqual,
            FilterValue::Number(1.0),
        ));
        let report = run_analysis(&mut compiler, &config).unwrap();
        assert_eq!(report.warnings.len(), 1);
        assert!(report.proteins.is_empty());
    }

    #[test]
    fn test_empty_compiler() {
        let mut compiler = Compiler::new();
        let report = run_analysis(&mut compiler, &AnalysisConfig::default()).unwrap();
        assert!(report.proteins.is_empty());
        assert!(report.psm_fdr.is_empty());
        assert_eq!(report.rejected_records, 0);
    }
}
